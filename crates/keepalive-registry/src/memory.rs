//! In-process registry. Lost on restart; used for tests and throwaway runs.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use keepalive_core::error::{KeepaliveError, Result};
use keepalive_core::traits::Registry;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Keys are listed in ascending order from a snapshot taken at call time.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| KeepaliveError::Registry(format!("Lock poisoned: {e}")))
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    fn name(&self) -> &str {
        "memory"
    }

    fn keys(&self) -> BoxStream<'_, Result<String>> {
        match self.lock() {
            Ok(map) => {
                let snapshot: Vec<String> = map.keys().cloned().collect();
                stream::iter(snapshot.into_iter().map(Ok)).boxed()
            }
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
