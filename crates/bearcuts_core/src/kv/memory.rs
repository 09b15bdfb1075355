//! In-memory key-value store.

use super::{KeyValueStore, KvError, KvResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Process-local key-value store.
///
/// Reads and writes can be switched to fail with
/// [`MemoryKeyValueStore::fail_reads`] and [`MemoryKeyValueStore::fail_writes`]
/// to exercise storage failure paths.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `get` return an error while `enabled` is true.
    pub fn fail_reads(&self, enabled: bool) {
        self.fail_reads.store(enabled, Ordering::SeqCst);
    }

    /// Makes every following `set` return an error while `enabled` is true.
    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Raw value under `key`, bypassing the failure switch.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(KvError::Backend(format!("read of `{key}` refused")));
        }
        let entries = self
            .entries
            .lock()
            .map_err(|_| KvError::Backend("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> KvResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KvError::Backend(format!("write to `{key}` refused")));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| KvError::Backend("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
