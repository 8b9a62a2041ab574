//! Outbound collaborators of the copy flow: content resolver, asset store,
//! path helper, permission check and plain filesystem primitives.
//!
//! Android implements this through the native plugin class (see `mobile.rs`);
//! every other target uses [`DesktopHost`].

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

pub type ByteReader = Box<dyn Read + Send>;
pub type ByteWriter = Box<dyn Write + Send>;

/// What the platform can do for storage. `scoped_storage` means writes go
/// through the document-creation prompt and no permission is consulted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
  pub scoped_storage: bool,
}

impl Capabilities {
  pub const LEGACY: Self = Self {
    scoped_storage: false,
  };
  pub const SCOPED: Self = Self {
    scoped_storage: true,
  };
}

pub trait StorageHost: Send {
  fn capabilities(&self) -> Capabilities;

  fn has_permission(&self, name: &str) -> bool;

  /// Public Downloads directory used by the direct-write path.
  fn downloads_dir(&self) -> io::Result<PathBuf>;

  /// Opens a content-addressed URI for reading. `Ok(None)` when the provider
  /// answers but hands back no stream.
  fn open_content(&self, uri: &str) -> io::Result<Option<ByteReader>>;

  fn create_content(&self, uri: &str) -> io::Result<ByteWriter>;

  fn open_asset(&self, relative_path: &str) -> io::Result<ByteReader>;

  fn resolve_real_path(&self, uri: &str) -> io::Result<PathBuf>;

  fn file_exists(&self, path: &Path) -> bool {
    path.exists()
  }

  fn open_file(&self, path: &Path) -> io::Result<ByteReader> {
    Ok(Box::new(File::open(path)?))
  }

  /// Never truncates: the name was picked so that nothing lives there yet.
  fn create_file(&self, path: &Path) -> io::Result<ByteWriter> {
    let file = OpenOptions::new().write(true).create_new(true).open(path)?;
    Ok(Box::new(file))
  }
}

/// Legacy-only host backed by `std::fs`: no content provider, permission
/// always granted, Downloads from `dirs` unless overridden.
#[cfg(not(target_os = "android"))]
#[derive(Debug, Clone, Default)]
pub struct DesktopHost {
  downloads_dir: Option<PathBuf>,
  assets_dir: Option<PathBuf>,
}

#[cfg(not(target_os = "android"))]
impl DesktopHost {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_downloads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.downloads_dir = Some(dir.into());
    self
  }

  /// Directory standing in for the bundled asset store.
  pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.assets_dir = Some(dir.into());
    self
  }
}

#[cfg(not(target_os = "android"))]
impl StorageHost for DesktopHost {
  fn capabilities(&self) -> Capabilities {
    Capabilities::LEGACY
  }

  fn has_permission(&self, _name: &str) -> bool {
    true
  }

  fn downloads_dir(&self) -> io::Result<PathBuf> {
    self
      .downloads_dir
      .clone()
      .or_else(dirs::download_dir)
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no Downloads directory on this system"))
  }

  fn open_content(&self, _uri: &str) -> io::Result<Option<ByteReader>> {
    Ok(None)
  }

  fn create_content(&self, uri: &str) -> io::Result<ByteWriter> {
    Err(io::Error::new(
      io::ErrorKind::Unsupported,
      format!("content uri {} cannot be written on this platform", uri),
    ))
  }

  fn open_asset(&self, relative_path: &str) -> io::Result<ByteReader> {
    let root = self
      .assets_dir
      .as_ref()
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no asset store configured"))?;
    self.open_file(&root.join(relative_path))
  }

  fn resolve_real_path(&self, uri: &str) -> io::Result<PathBuf> {
    let parsed = url::Url::parse(uri).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    parsed
      .to_file_path()
      .map_err(|()| io::Error::new(io::ErrorKind::InvalidInput, format!("{} is not a local file uri", uri)))
  }
}
