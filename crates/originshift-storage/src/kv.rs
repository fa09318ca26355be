//! Ordered byte-keyed store abstraction

use crate::Result;

/// A `(key, value)` pair as stored on disk.
pub type Record = (Vec<u8>, Vec<u8>);

/// Forward scan over every record, in key order.
pub type Records<'a> = Box<dyn Iterator<Item = Result<Record>> + 'a>;

/// Operations the localStorage migration needs from a key-value engine.
///
/// Implementations must apply a [`WriteBatch`] atomically: either every
/// staged put becomes visible or none does.
pub trait KeyValueStore {
    fn contains(&mut self, key: &[u8]) -> Result<bool>;

    /// Iterate all records starting from the first key.
    fn records(&mut self) -> Result<Records<'_>>;

    fn write(&mut self, batch: WriteBatch) -> Result<()>;

    /// Release the handle. Calling `close` twice is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// Puts staged for a single atomic commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    puts: Vec<Record>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.puts.push((key, value));
    }

    pub fn len(&self) -> usize {
        self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.puts.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

impl IntoIterator for WriteBatch {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.puts.into_iter()
    }
}
