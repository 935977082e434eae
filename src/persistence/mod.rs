//! Persistence port for state that outlives a run
//!
//! The simulation never talks to a concrete storage backend. It is handed a
//! [`KvStore`] at construction and reads/writes numeric values by key; the
//! host decides whether that is UserDefaults-style app storage, a file, or
//! the in-memory stand-in used by tests and the demo binary.

use std::collections::HashMap;

/// Storage key for the best survival time, versioned so a future format
/// change can start fresh.
pub const BEST_TIME_KEY: &str = "hatchfall.best_time.v2";

/// Minimal key/value port injected into the game state machine.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<f64>;
    fn set(&mut self, key: &str, value: f64);
}

/// In-memory store for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, f64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    fn set(&mut self, key: &str, value: f64) {
        log::debug!("persisted {key} = {value}");
        self.values.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_values() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(BEST_TIME_KEY), None);
        store.set(BEST_TIME_KEY, 45.5);
        assert_eq!(store.get(BEST_TIME_KEY), Some(45.5));
        store.set(BEST_TIME_KEY, 60.0);
        assert_eq!(store.get(BEST_TIME_KEY), Some(60.0));
    }
}
