//! Picks where the copy goes: straight into the Downloads directory, or into a
//! document the user creates through the system prompt.

use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::host::StorageHost;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
  /// Legacy storage with write permission; the path does not exist yet.
  DirectWrite(PathBuf),
  RequestUserDocument,
  /// Legacy storage without write permission. Ask, then decide again.
  NeedsPermission,
}

pub struct DestinationStrategy<'a, H: StorageHost + ?Sized> {
  host: &'a H,
  write_permission: &'a str,
  assume_granted: bool,
}

impl<'a, H: StorageHost + ?Sized> DestinationStrategy<'a, H> {
  pub fn new(host: &'a H, write_permission: &'a str) -> Self {
    Self {
      host,
      write_permission,
      assume_granted: false,
    }
  }

  /// Treats the write permission as granted, e.g. right after the user allowed it.
  pub fn granted(mut self) -> Self {
    self.assume_granted = true;
    self
  }

  pub fn choose(&self, file_name: &str) -> io::Result<Decision> {
    // scoped storage 下完全不检查权限
    if self.host.capabilities().scoped_storage {
      return Ok(Decision::RequestUserDocument);
    }
    if !self.assume_granted && !self.host.has_permission(self.write_permission) {
      return Ok(Decision::NeedsPermission);
    }
    ensure_stays_inside(file_name)?;
    let dir = self.host.downloads_dir()?;
    let path = unique_destination(&dir, file_name, |candidate| self.host.file_exists(candidate));
    debug!(path = %path.display(), "direct write destination");
    Ok(Decision::DirectWrite(path))
  }
}

/// Splits at the last dot that follows the last `/`.
/// `("archive.tar", Some("gz"))` for `archive.tar.gz`, `("v1.2/README", None)` for `v1.2/README`.
pub fn split_file_name(name: &str) -> (&str, Option<&str>) {
  let base_start = name.rfind('/').map_or(0, |idx| idx + 1);
  match name[base_start..].rfind('.') {
    Some(offset) => {
      let dot = base_start + offset;
      (&name[..dot], Some(&name[dot + 1..]))
    }
    None => (name, None),
  }
}

fn with_suffix(stem: &str, extension: Option<&str>, n: u64) -> String {
  match extension {
    Some(ext) => format!("{}-{}.{}", stem, n, ext),
    None => format!("{}-{}", stem, n),
  }
}

/// First of `name`, `stem-1.ext`, `stem-2.ext`, ... under `dir` for which
/// `exists` says no. Sequential scan; a concurrent writer can still win the race.
pub fn unique_destination<F>(dir: &Path, name: &str, exists: F) -> PathBuf
where
  F: Fn(&Path) -> bool,
{
  let candidate = dir.join(name);
  if !exists(&candidate) {
    return candidate;
  }
  let (stem, extension) = split_file_name(name);
  let mut n = 1u64;
  loop {
    let candidate = dir.join(with_suffix(stem, extension, n));
    if !exists(&candidate) {
      return candidate;
    }
    n += 1;
  }
}

fn ensure_stays_inside(file_name: &str) -> io::Result<()> {
  let escapes = file_name.is_empty()
    || Path::new(file_name)
      .components()
      .any(|c| !matches!(c, Component::Normal(_)));
  if escapes {
    return Err(io::Error::new(
      io::ErrorKind::InvalidInput,
      format!("file name {:?} does not name a file inside Downloads", file_name),
    ));
  }
  Ok(())
}
