use std::collections::HashMap;

/// Key under which a game's in-progress build board is persisted.
pub fn storage_id(game_id: &str) -> String {
    format!("{game_id}_board")
}

/// Storage seam for in-progress build snapshots (browser local storage, a
/// file, or nothing at all).
pub trait BoardStore {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory store for tests and storage-less embeddings.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl BoardStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn save(&mut self, key: &str, value: &str) {
        self.entries.insert(key.into(), value.into());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}
