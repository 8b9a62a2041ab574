use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DEFAULT_WRITE_PERMISSION: &str = "android.permission.WRITE_EXTERNAL_STORAGE";

/// Downloads root in the external storage documents provider.
pub const DEFAULT_INITIAL_LOCATION: &str =
  "content://com.android.externalstorage.documents/document/primary%3ADownload";

pub const DEFAULT_SNAPSHOT_FILE: &str = "copy-to-downloads.json";

/// `plugins.copy-to-downloads` in the app config. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
  /// Overrides the platform's public Downloads directory for direct writes.
  pub downloads_dir: Option<PathBuf>,
  pub write_permission: Option<String>,
  /// Where the document-creation prompt opens.
  pub initial_location: Option<String>,
  /// Snapshot file name, relative to the app cache directory.
  pub snapshot_file: Option<PathBuf>,
}

impl Config {
  pub fn write_permission(&self) -> &str {
    self.write_permission.as_deref().unwrap_or(DEFAULT_WRITE_PERMISSION)
  }

  pub fn initial_location(&self) -> &str {
    self.initial_location.as_deref().unwrap_or(DEFAULT_INITIAL_LOCATION)
  }

  pub fn snapshot_file(&self) -> &Path {
    self
      .snapshot_file
      .as_deref()
      .unwrap_or_else(|| Path::new(DEFAULT_SNAPSHOT_FILE))
  }
}
