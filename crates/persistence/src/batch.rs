/// Writes staged by [`put_to_batch`](crate::KeyValueStore::put_to_batch),
/// applied together on `commit_batch`.
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl WriteBatch {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a write; a later write to the same key wins when applied.
    #[inline]
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.push((key, value));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Staged writes in staging order.
    #[inline]
    pub fn into_entries(self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
    }
}
