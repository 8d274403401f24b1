//! Key/value preference persistence.

use std::collections::HashMap;

use thiserror::Error;

/// Key under which the runtime stores the last selected room.
pub const LAST_ROOM_KEY: &str = "last_room";

/// Preference persistence errors.
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// Backing storage failed.
    #[error("preference storage failed: {0}")]
    Storage(String),
}

/// Small string key/value store injected into the runtime.
pub trait PreferenceStore: Send {
    /// Read a value.
    fn read(&self, key: &str) -> Option<String>;

    /// Persist a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError`] if the backing storage fails.
    fn persist(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl MemoryPreferences {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn persist(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn persisted_value_is_read_back() {
        let mut store = MemoryPreferences::new();
        assert_eq!(store.read(LAST_ROOM_KEY), None);

        store.persist(LAST_ROOM_KEY, "random").unwrap();
        store.persist(LAST_ROOM_KEY, "rust").unwrap();
        assert_eq!(store.read(LAST_ROOM_KEY).as_deref(), Some("rust"));
    }
}
