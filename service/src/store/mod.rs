use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::StoreConfig;

pub use file::*;
pub use memory::*;

mod file;
mod memory;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Key {0:?} cannot be stored")]
    InvalidKey(String),
}

/// Persistence port keyed by entity id. Implementations only store values, serializing access per id is the
/// caller's job.
pub trait Store<T>: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<T>, StoreError>;
    fn put(&self, id: &str, value: &T) -> Result<(), StoreError>;
    /// Whether something was removed.
    fn delete(&self, id: &str) -> Result<bool, StoreError>;
    fn ids(&self) -> Result<Vec<String>, StoreError>;
}

/// Opens the configured backend. File stores keep each entity kind in its own subdirectory.
pub fn open_store<T>(config: &StoreConfig, kind: &str) -> Result<Arc<dyn Store<T>>, StoreError>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let store: Arc<dyn Store<T>> = match config {
        StoreConfig::Memory => Arc::new(MemoryStore::<T>::new()),
        StoreConfig::File { path } => Arc::new(FileStore::<T>::open(path.join(kind))?),
    };
    Ok(store)
}
