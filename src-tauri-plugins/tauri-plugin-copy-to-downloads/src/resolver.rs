//! Classifies a source URI string and opens a readable stream for it.
//!
//! A string alone does not reliably tell a content provider handle from a
//! file on disk, so `file://` URIs are first tried as content and only then
//! mapped to a real path. Only the failure of that last step is reported.

use std::io;
use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::host::{ByteReader, StorageHost};
use crate::{Error, Result};

const CONTENT_SCHEME: &str = "content";
const FILE_SCHEME: &str = "file://";
const ASSET_PREFIX: &str = "file:///android_asset/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriClassification {
  ContentAddressed(String),
  /// Path relative to the bundled asset store.
  FileAsset(String),
  FileOnDisk(PathBuf),
  /// `file://` URI that some platforms alias to a content provider.
  FileMaybeContent(String),
  PlainPath(PathBuf),
}

/// Classifies `uri` from the string alone. Never yields [`UriClassification::FileOnDisk`];
/// that only comes out of the fallback in [`UriResolver::resolve`].
pub fn classify(uri: &str) -> UriClassification {
  if uri.starts_with(CONTENT_SCHEME) {
    return UriClassification::ContentAddressed(uri.to_string());
  }
  if uri.starts_with(FILE_SCHEME) {
    let without_query = match uri.find('?') {
      Some(idx) => &uri[..idx],
      None => uri,
    };
    if let Some(relative) = without_query.strip_prefix(ASSET_PREFIX) {
      let decoded = percent_decode_str(relative).decode_utf8_lossy().into_owned();
      return UriClassification::FileAsset(decoded);
    }
    return UriClassification::FileMaybeContent(without_query.to_string());
  }
  UriClassification::PlainPath(PathBuf::from(uri))
}

pub struct UriResolver<'a, H: StorageHost + ?Sized> {
  host: &'a H,
}

impl<'a, H: StorageHost + ?Sized> UriResolver<'a, H> {
  pub fn new(host: &'a H) -> Self {
    Self { host }
  }

  pub fn resolve(&self, uri: &str) -> Result<ByteReader> {
    self.open(classify(uri))
  }

  pub fn open(&self, classification: UriClassification) -> Result<ByteReader> {
    match classification {
      UriClassification::ContentAddressed(uri) => match self.host.open_content(&uri)? {
        Some(stream) => Ok(stream),
        None => Err(Error::Io(io::Error::new(
          io::ErrorKind::NotFound,
          format!("content provider returned no stream for {}", uri),
        ))),
      },
      UriClassification::FileAsset(relative) => Ok(self.host.open_asset(&relative)?),
      UriClassification::FileMaybeContent(uri) => {
        match self.host.open_content(&uri) {
          Ok(Some(stream)) => return Ok(stream),
          Ok(None) => debug!(uri = %uri, "content provider yielded nothing, falling back to real path"),
          Err(e) => debug!(uri = %uri, error = %e, "not openable as content, falling back to real path"),
        }
        let path = self
          .host
          .resolve_real_path(&uri)
          .map_err(|e| Error::UnresolvableUri {
            uri: uri.clone(),
            reason: e.to_string(),
          })?;
        self.open(UriClassification::FileOnDisk(path))
      }
      UriClassification::FileOnDisk(path) | UriClassification::PlainPath(path) => {
        Ok(self.host.open_file(&path)?)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::FakeHost;
  use std::io::Read;
  use std::sync::atomic::Ordering;

  fn read_all(mut stream: ByteReader) -> Vec<u8> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).unwrap();
    buf
  }

  #[test]
  fn test_classify() {
    assert_eq!(
      classify("content://media/external/file/12"),
      UriClassification::ContentAddressed("content://media/external/file/12".into())
    );
    assert_eq!(
      classify("file:///android_asset/www/img%20one.png?v=3"),
      UriClassification::FileAsset("www/img one.png".into())
    );
    assert_eq!(
      classify("file:///storage/emulated/0/a.pdf?token=1?x"),
      UriClassification::FileMaybeContent("file:///storage/emulated/0/a.pdf".into())
    );
    assert_eq!(
      classify("/sdcard/a.pdf"),
      UriClassification::PlainPath(PathBuf::from("/sdcard/a.pdf"))
    );
  }

  #[test]
  fn test_plain_and_file_paths_read_disk_bytes() {
    let host = FakeHost::legacy(true);
    let path = host.scratch.path().join("source.bin");
    std::fs::write(&path, b"on disk").unwrap();
    host.map_real_path("file:///source.bin", &path);

    let resolver = UriResolver::new(&host);
    assert_eq!(read_all(resolver.resolve(path.to_str().unwrap()).unwrap()), b"on disk");
    assert_eq!(read_all(resolver.resolve("file:///source.bin?cache=no").unwrap()), b"on disk");
  }

  #[test]
  fn test_content_uri_never_falls_back() {
    let host = FakeHost::legacy(true);
    host.add_content("content://docs/7", b"provided");

    let resolver = UriResolver::new(&host);
    assert_eq!(read_all(resolver.resolve("content://docs/7").unwrap()), b"provided");
    assert_eq!(host.path_lookups.load(Ordering::SeqCst), 0);

    assert!(matches!(resolver.resolve("content://docs/missing"), Err(Error::Io(_))));
    assert_eq!(host.path_lookups.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn test_file_uri_prefers_content_alias() {
    let host = FakeHost::legacy(true);
    host.add_content("file:///aliased.txt", b"via provider");

    let stream = UriResolver::new(&host).resolve("file:///aliased.txt").unwrap();
    assert_eq!(read_all(stream), b"via provider");
    assert_eq!(host.path_lookups.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn test_file_uri_empty_provider_falls_back() {
    let host = FakeHost::legacy(true);
    let path = host.scratch.path().join("real.txt");
    std::fs::write(&path, b"real").unwrap();
    host.add_empty_content("file:///real.txt");
    host.map_real_path("file:///real.txt", &path);

    let stream = UriResolver::new(&host).resolve("file:///real.txt").unwrap();
    assert_eq!(read_all(stream), b"real");
    assert_eq!(host.path_lookups.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn test_unresolvable_file_uri() {
    let host = FakeHost::legacy(true);
    let err = UriResolver::new(&host).resolve("file:///nowhere.txt").err().unwrap();
    assert!(matches!(err, Error::UnresolvableUri { ref uri, .. } if uri == "file:///nowhere.txt"));
  }

  #[test]
  fn test_file_uri_real_path_open_failure_is_io() {
    let host = FakeHost::legacy(true);
    host.map_real_path("file:///gone.txt", &host.scratch.path().join("gone.txt"));

    let err = UriResolver::new(&host).resolve("file:///gone.txt").err().unwrap();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    assert_eq!(host.path_lookups.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn test_asset_uri_reads_asset_store() {
    let host = FakeHost::legacy(true);
    host.add_asset("www/manual.pdf", b"%PDF");

    let stream = UriResolver::new(&host).resolve("file:///android_asset/www/manual.pdf").unwrap();
    assert_eq!(read_all(stream), b"%PDF");
  }
}
