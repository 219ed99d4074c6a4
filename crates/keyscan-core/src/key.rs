use std::fmt::Debug;

///
/// PartitionKey
///
/// Value type of the partition key column being scanned.
///
/// The core never inspects a key. It keeps the last key of each page and
/// hands it back to the store adapter as the `:cursor` bind value, so any
/// cloneable, comparable value qualifies.
///

pub trait PartitionKey: Clone + Debug + Eq + Send + Sync + 'static {}

impl<T> PartitionKey for T where T: Clone + Debug + Eq + Send + Sync + 'static {}
