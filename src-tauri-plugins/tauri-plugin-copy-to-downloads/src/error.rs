use serde::{ser::Serializer, Serialize};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// open/read/write failure on either end of the copy.
  #[error("failed to copy: {0}")]
  Io(#[from] std::io::Error),
  #[error("permission denied")]
  PermissionDenied,
  #[error("user cancelled")]
  UserCancelled,
  /// Every classification fallback for the source URI was exhausted.
  #[error("unable to resolve {uri}: {reason}")]
  UnresolvableUri { uri: String, reason: String },
  #[error("another copy is already in progress")]
  Busy,
  #[error("no pending copy to resume")]
  NoPendingOperation,
  #[error("copy aborted: {0}")]
  Aborted(String),
  #[error("invalid snapshot: {0}")]
  Snapshot(#[from] serde_json::Error),
  #[cfg(target_os = "android")]
  #[error(transparent)]
  PluginInvoke(#[from] tauri::plugin::mobile::PluginInvokeError),
  #[cfg(target_os = "android")]
  #[error(transparent)]
  Tauri(#[from] tauri::Error),
}

impl Serialize for Error {
  fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(self.to_string().as_ref())
  }
}
