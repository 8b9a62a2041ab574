//! In-memory [`StorageHost`] for unit tests. Files still go to a scratch
//! directory so the direct-write path touches a real filesystem.

use std::collections::{HashMap, HashSet};
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::host::{ByteReader, ByteWriter, Capabilities, StorageHost};

pub(crate) struct FakeHost {
  pub capabilities: Capabilities,
  pub permission_granted: bool,
  pub scratch: TempDir,
  pub path_lookups: AtomicUsize,
  content: Mutex<HashMap<String, Vec<u8>>>,
  empty_content: Mutex<HashSet<String>>,
  assets: Mutex<HashMap<String, Vec<u8>>>,
  real_paths: Mutex<HashMap<String, PathBuf>>,
  written: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl FakeHost {
  fn new(capabilities: Capabilities, permission_granted: bool) -> Self {
    let scratch = tempfile::tempdir().unwrap();
    std::fs::create_dir(scratch.path().join("Download")).unwrap();
    Self {
      capabilities,
      permission_granted,
      scratch,
      path_lookups: AtomicUsize::new(0),
      content: Mutex::default(),
      empty_content: Mutex::default(),
      assets: Mutex::default(),
      real_paths: Mutex::default(),
      written: Arc::default(),
    }
  }

  pub fn legacy(permission_granted: bool) -> Self {
    Self::new(Capabilities::LEGACY, permission_granted)
  }

  pub fn scoped(permission_granted: bool) -> Self {
    Self::new(Capabilities::SCOPED, permission_granted)
  }

  pub fn downloads(&self) -> PathBuf {
    self.scratch.path().join("Download")
  }

  pub fn add_content(&self, uri: &str, data: &[u8]) {
    self.content.lock().unwrap().insert(uri.to_string(), data.to_vec());
  }

  pub fn add_empty_content(&self, uri: &str) {
    self.empty_content.lock().unwrap().insert(uri.to_string());
  }

  pub fn add_asset(&self, path: &str, data: &[u8]) {
    self.assets.lock().unwrap().insert(path.to_string(), data.to_vec());
  }

  pub fn map_real_path(&self, uri: &str, path: &Path) {
    self.real_paths.lock().unwrap().insert(uri.to_string(), path.to_path_buf());
  }

  pub fn written(&self, uri: &str) -> Option<Vec<u8>> {
    self.written.lock().unwrap().get(uri).cloned()
  }

  pub fn downloaded_files(&self) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(self.downloads())
      .unwrap()
      .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
      .collect();
    names.sort();
    names
  }
}

struct ContentSink {
  uri: String,
  written: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl Write for ContentSink {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self
      .written
      .lock()
      .unwrap()
      .entry(self.uri.clone())
      .or_default()
      .extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl StorageHost for FakeHost {
  fn capabilities(&self) -> Capabilities {
    self.capabilities
  }

  fn has_permission(&self, _name: &str) -> bool {
    self.permission_granted
  }

  fn downloads_dir(&self) -> io::Result<PathBuf> {
    Ok(self.downloads())
  }

  fn open_content(&self, uri: &str) -> io::Result<Option<ByteReader>> {
    if self.empty_content.lock().unwrap().contains(uri) {
      return Ok(None);
    }
    match self.content.lock().unwrap().get(uri) {
      Some(data) => Ok(Some(Box::new(Cursor::new(data.clone())))),
      None => Err(io::Error::new(io::ErrorKind::NotFound, format!("no provider for {}", uri))),
    }
  }

  fn create_content(&self, uri: &str) -> io::Result<ByteWriter> {
    if uri.starts_with("content://readonly") {
      return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only document"));
    }
    self.written.lock().unwrap().insert(uri.to_string(), Vec::new());
    Ok(Box::new(ContentSink {
      uri: uri.to_string(),
      written: self.written.clone(),
    }))
  }

  fn open_asset(&self, relative_path: &str) -> io::Result<ByteReader> {
    match self.assets.lock().unwrap().get(relative_path) {
      Some(data) => Ok(Box::new(Cursor::new(data.clone()))),
      None => Err(io::Error::new(io::ErrorKind::NotFound, relative_path.to_string())),
    }
  }

  fn resolve_real_path(&self, uri: &str) -> io::Result<PathBuf> {
    self.path_lookups.fetch_add(1, Ordering::SeqCst);
    self
      .real_paths
      .lock()
      .unwrap()
      .get(uri)
      .cloned()
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no real path for {}", uri)))
  }
}
