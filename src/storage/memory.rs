use dashmap::DashMap;

/// The node-local table the router reads and writes.
///
/// Injected into the router so the backing table can be swapped; every
/// method acts on this node's entries only and never touches the network.
pub trait LocalStore: Send + Sync {
    fn put(&self, key: String, value: String);

    fn get(&self, key: &str) -> Option<String>;

    /// Returns whether an entry was removed.
    fn delete(&self, key: &str) -> bool;

    /// Every local entry, sorted by key.
    fn scan_all(&self) -> Vec<(String, String)>;

    /// Removes every local entry and returns how many were removed.
    fn delete_all(&self) -> u64;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory `LocalStore` backed by a sharded concurrent map.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl LocalStore for MemoryStore {
    fn put(&self, key: String, value: String) {
        self.entries.insert(key, value);
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn scan_all(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    fn delete_all(&self) -> u64 {
        // Count inside retain so a concurrent put is either removed and
        // counted, or left in place.
        let mut removed = 0u64;
        self.entries.retain(|_, _| {
            removed += 1;
            false
        });
        removed
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
