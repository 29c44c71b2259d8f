//! # Keepalive Registry
//! Storage for registered endpoint URLs.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryRegistry;
pub use sqlite::SqliteRegistry;

use keepalive_core::config::{RegistryBackend, RegistryConfig};
use keepalive_core::error::Result;
use keepalive_core::traits::Registry;
use std::sync::Arc;

/// Create the configured registry backend.
pub fn create_registry(config: &RegistryConfig) -> Result<Arc<dyn Registry>> {
    match config.backend {
        RegistryBackend::Memory => {
            tracing::warn!("⚠️ Using in-memory registry: endpoints are lost on restart");
            Ok(Arc::new(MemoryRegistry::new()))
        }
        RegistryBackend::Sqlite => {
            let path = config.resolved_path();
            let registry = SqliteRegistry::open(&path, config.page_size)?;
            tracing::info!("🗄️ Registry: {}", path.display());
            Ok(Arc::new(registry))
        }
    }
}
