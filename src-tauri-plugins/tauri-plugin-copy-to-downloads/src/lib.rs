//! Copies a file addressed by URI into the public Downloads directory.
//!
//! On legacy storage the file is written straight into Downloads once the
//! write permission is held. On scoped storage the user creates the target
//! document through the system prompt and the bytes go into that handle.
//! The state machine ([`Orchestrator`]) is host-agnostic; Android drives it
//! through the Kotlin plugin class, other targets through [`DesktopHost`].

pub use models::*;

mod config;
mod copier;
mod destination;
mod driver;
mod error;
mod host;
mod models;
mod operation;
mod resolver;
mod snapshot;

#[cfg(test)]
mod testing;

#[cfg(target_os = "android")]
mod commands;
#[cfg(target_os = "android")]
mod mobile;

pub use config::Config;
pub use copier::{copy_into, copy_stream};
pub use destination::{split_file_name, unique_destination, Decision, DestinationStrategy};
pub use driver::{copy_to_downloads, drive, resume_pending, Prompter};
pub use error::{Error, Result};
#[cfg(not(target_os = "android"))]
pub use host::DesktopHost;
pub use host::{ByteReader, ByteWriter, Capabilities, StorageHost};
pub use operation::{Awaiting, CopyOperation, Orchestrator, Phase, Prompt, Resume, ResultChannel, Step};
pub use resolver::{classify, UriClassification, UriResolver};
pub use snapshot::{JsonFileStore, MemoryStore, SnapshotStore};

#[cfg(target_os = "android")]
pub use android::*;
#[cfg(target_os = "android")]
pub use mobile::{AndroidHost, AndroidPrompter, CopyToDownloads};

#[cfg(target_os = "android")]
mod android {
  use tauri::{
    plugin::{Builder, TauriPlugin},
    Manager, Runtime,
  };

  use crate::mobile::{self, CopyToDownloads};
  use crate::Config;

  /// Extensions to [`tauri::App`], [`tauri::AppHandle`] and [`tauri::Window`] to access the copy-to-downloads APIs.
  pub trait CopyToDownloadsExt<R: Runtime> {
    fn copy_to_downloads(&self) -> &CopyToDownloads<R>;
  }

  impl<R: Runtime, T: Manager<R>> CopyToDownloadsExt<R> for T {
    fn copy_to_downloads(&self) -> &CopyToDownloads<R> {
      self.state::<CopyToDownloads<R>>().inner()
    }
  }

  /// Initializes the plugin.
  pub fn init<R: Runtime>() -> TauriPlugin<R, Config> {
    Builder::<R, Config>::new("copy-to-downloads")
      .invoke_handler(tauri::generate_handler![
        crate::commands::copy_to_downloads,
        crate::commands::resume_pending_copy,
      ])
      .setup(|app, api| {
        let plugin = mobile::init(app, api)?;
        app.manage(plugin);
        Ok(())
      })
      .build()
  }
}
