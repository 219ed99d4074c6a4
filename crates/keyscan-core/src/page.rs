use crate::key::PartitionKey;

///
/// Page
///
/// One bounded batch of distinct partition keys returned by a single fetch,
/// ordered by ascending token. The last key is the token-maximal one.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Page<K> {
    keys: Vec<K>,
}

impl<K: PartitionKey> Page<K> {
    #[must_use]
    pub const fn new(keys: Vec<K>) -> Self {
        Self { keys }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self { keys: Vec::new() }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Token-maximal key of the page.
    #[must_use]
    pub fn last(&self) -> Option<&K> {
        self.keys.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, K> {
        self.keys.iter()
    }

    #[must_use]
    pub fn into_keys(self) -> Vec<K> {
        self.keys
    }
}

impl<K: PartitionKey> From<Vec<K>> for Page<K> {
    fn from(keys: Vec<K>) -> Self {
        Self::new(keys)
    }
}

impl<K> IntoIterator for Page<K> {
    type Item = K;
    type IntoIter = std::vec::IntoIter<K>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}

impl<'a, K> IntoIterator for &'a Page<K> {
    type Item = &'a K;
    type IntoIter = std::slice::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
