//! Object-key interning

use ahash::AHashMap;

use crate::node::KeyId;

/// Bijection between object keys and small integer ids.
///
/// Ids are handed out in first-use order starting at 0 and are only
/// meaningful for one build cycle. [`keys`](Self::keys) is the reverse
/// mapping in id order and becomes the `strings` section of a batch.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    ids: AHashMap<Box<str>, KeyId>,
    keys: Vec<Box<str>>,
}

impl StringTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with room for `capacity` distinct keys
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: AHashMap::with_capacity(capacity),
            keys: Vec::with_capacity(capacity),
        }
    }

    /// Id of `key`, assigning the next one if it was not seen this cycle
    pub fn intern(&mut self, key: &str) -> KeyId {
        if let Some(&id) = self.ids.get(key) {
            return id;
        }
        let id = KeyId::new(Self::next_id(self.keys.len()));
        let owned: Box<str> = key.into();
        self.ids.insert(owned.clone(), id);
        self.keys.push(owned);
        id
    }

    /// Id of `key` without interning it
    pub fn id_of(&self, key: &str) -> Option<KeyId> {
        self.ids.get(key).copied()
    }

    /// Key for `id`, if this table produced it
    pub fn get(&self, id: KeyId) -> Option<&str> {
        self.keys.get(id.index()).map(|k| &**k)
    }

    /// Whether `id` belongs to this table's id space
    pub fn contains_id(&self, id: KeyId) -> bool {
        id.index() < self.keys.len()
    }

    /// Keys in id order
    pub fn keys(&self) -> &[Box<str>] {
        &self.keys
    }

    /// Number of distinct keys interned
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing has been interned
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Forget every key, keeping the allocated capacity
    pub fn reset(&mut self) {
        self.ids.clear();
        self.keys.clear();
    }

    fn next_id(len: usize) -> u32 {
        match u32::try_from(len) {
            Ok(id) => id,
            Err(_) => panic!("StringTable: more than u32::MAX distinct keys in one cycle"),
        }
    }
}
