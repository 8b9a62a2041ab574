//! Persistence for the `{sourceUri, fileName}` snapshot taken before every
//! suspension, so a recreated process can pick the copy up again.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::OperationSnapshot;
use crate::Result;

pub trait SnapshotStore: Send {
  fn save(&self, snapshot: &OperationSnapshot) -> Result<()>;
  fn load(&self) -> Result<Option<OperationSnapshot>>;
  fn clear(&self) -> Result<()>;
}

/// Lives as long as the process. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  slot: Arc<Mutex<Option<OperationSnapshot>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl SnapshotStore for MemoryStore {
  fn save(&self, snapshot: &OperationSnapshot) -> Result<()> {
    *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
    Ok(())
  }

  fn load(&self) -> Result<Option<OperationSnapshot>> {
    Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
  }

  fn clear(&self) -> Result<()> {
    *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    Ok(())
  }
}

/// One JSON file, removed once the operation is done.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
  path: PathBuf,
}

impl JsonFileStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }
}

impl SnapshotStore for JsonFileStore {
  fn save(&self, snapshot: &OperationSnapshot) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(snapshot)?;
    fs::write(&self.path, content)?;
    Ok(())
  }

  fn load(&self) -> Result<Option<OperationSnapshot>> {
    let content = match fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&content)?))
  }

  fn clear(&self) -> Result<()> {
    match fs::remove_file(&self.path) {
      Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
      _ => Ok(()),
    }
  }
}
