use keyscan_core::{key::PartitionKey, token::Token};
use ulid::Ulid;
use xxhash_rust::xxh3::xxh3_64;

///
/// StoredKey
///
/// Partition key with a canonical byte encoding. The partitioner hashes
/// these bytes; the store also uses them to order keys sharing a token.
///

pub trait StoredKey: PartitionKey {
    fn key_bytes(&self) -> Vec<u8>;
}

impl StoredKey for Ulid {
    fn key_bytes(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }
}

impl StoredKey for u64 {
    fn key_bytes(&self) -> Vec<u8> {
        self.to_be_bytes().to_vec()
    }
}

impl StoredKey for i64 {
    // Sign bit flipped so byte order matches numeric order.
    fn key_bytes(&self) -> Vec<u8> {
        (self.cast_unsigned() ^ (1 << 63)).to_be_bytes().to_vec()
    }
}

impl StoredKey for String {
    fn key_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

///
/// Partitioner
///
/// Maps encoded partition keys onto the token ring.
///

pub trait Partitioner: Send + Sync + 'static {
    fn token(&self, key_bytes: &[u8]) -> Token;
}

///
/// Xxh3Partitioner
///
/// Uniform hash partitioner; the default.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Partitioner;

impl Partitioner for Xxh3Partitioner {
    fn token(&self, key_bytes: &[u8]) -> Token {
        Token::new(xxh3_64(key_bytes).cast_signed())
    }
}

///
/// OrderPreservingPartitioner
///
/// Token is the first eight key bytes read big-endian, shifted onto the
/// signed ring. Sequential keys pile up in one narrow band of the ring,
/// which is the worst case for sub-range splitting.
///
/// Keys longer than eight bytes that share a prefix share a token.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct OrderPreservingPartitioner;

impl Partitioner for OrderPreservingPartitioner {
    fn token(&self, key_bytes: &[u8]) -> Token {
        let mut prefix = [0_u8; 8];
        let len = key_bytes.len().min(prefix.len());
        prefix[..len].copy_from_slice(&key_bytes[..len]);

        Token::new((u64::from_be_bytes(prefix) ^ (1 << 63)).cast_signed())
    }
}

///
/// TESTS
///
