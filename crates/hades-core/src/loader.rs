//! Impulse-response set loaders.

use crate::ir::ImpulseResponseSet;
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source of impulse-response sets, called from the background build task.
pub trait IrLoader: Send + Sync {
    /// Load the set stored at `path`. No partial data on failure.
    fn load(&self, path: &Path) -> Result<ImpulseResponseSet>;
}

/// Reads sets serialized as JSON (see [`ImpulseResponseSet`] field layout).
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonIrLoader;

impl IrLoader for JsonIrLoader {
    fn load(&self, path: &Path) -> Result<ImpulseResponseSet> {
        let file = File::open(path).map_err(|e| Error::IrLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let set: ImpulseResponseSet =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::IrLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        set.validate().map_err(|e| Error::IrLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(set)
    }
}

impl JsonIrLoader {
    /// Write `set` in the format [`JsonIrLoader`] reads.
    pub fn save(set: &ImpulseResponseSet, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(file, set)?;
        Ok(())
    }
}

/// In-memory sets keyed by path, for embedded resources and tests.
#[derive(Default)]
pub struct MemoryIrLoader {
    sets: RwLock<HashMap<PathBuf, Arc<ImpulseResponseSet>>>,
}

impl MemoryIrLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, set: ImpulseResponseSet) -> &Self {
        self.sets.write().insert(path.into(), Arc::new(set));
        self
    }

    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.sets.write().remove(path.as_ref()).is_some()
    }
}

impl IrLoader for MemoryIrLoader {
    fn load(&self, path: &Path) -> Result<ImpulseResponseSet> {
        self.sets
            .read()
            .get(path)
            .map(|set| set.as_ref().clone())
            .ok_or_else(|| Error::IrLoad {
                path: path.to_path_buf(),
                reason: "not registered".into(),
            })
    }
}
