use std::io::{self, Cursor, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tauri::{
  plugin::{mobile::PluginInvokeError, PluginApi, PluginHandle},
  AppHandle, Manager, Runtime,
};
use tracing::{info, warn};

use crate::models::*;
use crate::{
  driver, ByteReader, ByteWriter, Capabilities, Config, JsonFileStore, Orchestrator, Prompter, StorageHost,
};

const PLUGIN_IDENTIFIER: &str = "app.kabegame.plugin.downloads";

// initializes the Kotlin plugin class
pub fn init<R: Runtime>(app: &AppHandle<R>, api: PluginApi<R, Config>) -> crate::Result<CopyToDownloads<R>> {
  let config = api.config().clone();
  let handle = api.register_android_plugin(PLUGIN_IDENTIFIER, "CopyToDownloadsPlugin")?;
  let storage: StorageInfoResponse = handle.run_mobile_plugin("getStorageInfo", ())?;

  let downloads_dir = config
    .downloads_dir
    .clone()
    .unwrap_or_else(|| PathBuf::from(&storage.downloads_dir));
  let snapshot_path = app.path().app_cache_dir()?.join(config.snapshot_file());
  info!(
    scoped_storage = storage.scoped_storage,
    downloads_dir = %downloads_dir.display(),
    "copy-to-downloads ready"
  );

  let host = AndroidHost {
    handle: handle.clone(),
    capabilities: Capabilities {
      scoped_storage: storage.scoped_storage,
    },
    downloads_dir,
  };
  let machine = Orchestrator::new(host, &config, Box::new(JsonFileStore::new(snapshot_path)));
  match machine.pending_snapshot() {
    Ok(Some(pending)) => info!(
      source = %pending.source_uri,
      file_name = %pending.file_name,
      "found an interrupted copy, waiting for resumePendingCopy"
    ),
    Ok(None) => {}
    Err(e) => warn!(error = %e, "unreadable copy snapshot"),
  }

  Ok(CopyToDownloads {
    machine: Mutex::new(machine),
    prompter: AndroidPrompter(handle),
  })
}

/// Access to the copy-to-downloads APIs.
pub struct CopyToDownloads<R: Runtime> {
  machine: Mutex<Orchestrator<AndroidHost<R>>>,
  prompter: AndroidPrompter<R>,
}

impl<R: Runtime> CopyToDownloads<R> {
  pub async fn copy(&self, request: CopyRequest) -> crate::Result<()> {
    driver::copy_to_downloads(&self.machine, &self.prompter, request).await
  }

  /// Finishes a copy interrupted by process death, with the document the prompt returned.
  pub async fn resume_pending(&self, document_uri: Option<String>) -> crate::Result<()> {
    driver::resume_pending(&self.machine, &self.prompter, document_uri).await
  }
}

fn bridge_io(e: PluginInvokeError) -> io::Error {
  io::Error::new(io::ErrorKind::Other, e.to_string())
}

fn decode(data: &str) -> io::Result<Vec<u8>> {
  STANDARD
    .decode(data)
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// ContentResolver / AssetManager / permission checks through the Kotlin side.
/// Bytes cross the bridge base64-encoded.
pub struct AndroidHost<R: Runtime> {
  handle: PluginHandle<R>,
  capabilities: Capabilities,
  downloads_dir: PathBuf,
}

impl<R: Runtime> StorageHost for AndroidHost<R> {
  fn capabilities(&self) -> Capabilities {
    self.capabilities
  }

  fn has_permission(&self, name: &str) -> bool {
    let checked: Result<PermissionResponse, _> = self.handle.run_mobile_plugin(
      "checkPermission",
      PermissionArgs {
        permission: name.to_string(),
      },
    );
    match checked {
      Ok(response) => response.granted,
      Err(e) => {
        warn!(permission = name, error = %e, "permission check failed, treating as not granted");
        false
      }
    }
  }

  fn downloads_dir(&self) -> io::Result<PathBuf> {
    Ok(self.downloads_dir.clone())
  }

  fn open_content(&self, uri: &str) -> io::Result<Option<ByteReader>> {
    let response: ReadBytesResponse = self
      .handle
      .run_mobile_plugin("readContent", UriArgs { uri: uri.to_string() })
      .map_err(bridge_io)?;
    match response.data {
      Some(data) => Ok(Some(Box::new(Cursor::new(decode(&data)?)))),
      None => Ok(None),
    }
  }

  fn create_content(&self, uri: &str) -> io::Result<ByteWriter> {
    Ok(Box::new(ContentWriter {
      handle: self.handle.clone(),
      uri: uri.to_string(),
      buf: Vec::new(),
      dirty: true,
    }))
  }

  fn open_asset(&self, relative_path: &str) -> io::Result<ByteReader> {
    let response: ReadBytesResponse = self
      .handle
      .run_mobile_plugin(
        "readAsset",
        OpenAssetArgs {
          path: relative_path.to_string(),
        },
      )
      .map_err(bridge_io)?;
    let data = response
      .data
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("asset {} not found", relative_path)))?;
    Ok(Box::new(Cursor::new(decode(&data)?)))
  }

  fn resolve_real_path(&self, uri: &str) -> io::Result<PathBuf> {
    let response: ResolveRealPathResponse = self
      .handle
      .run_mobile_plugin("resolveRealPath", UriArgs { uri: uri.to_string() })
      .map_err(bridge_io)?;
    response
      .path
      .map(PathBuf::from)
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no real path for {}", uri)))
  }
}

/// Collects the copy and hands it to the document in one `writeContent` call on flush.
struct ContentWriter<R: Runtime> {
  handle: PluginHandle<R>,
  uri: String,
  buf: Vec<u8>,
  // 空文件也要写一次，把文档截断为 0 字节
  dirty: bool,
}

impl<R: Runtime> Write for ContentWriter<R> {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.buf.extend_from_slice(buf);
    self.dirty = true;
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    if !self.dirty {
      return Ok(());
    }
    let _: serde_json::Value = self
      .handle
      .run_mobile_plugin(
        "writeContent",
        WriteContentArgs {
          uri: self.uri.clone(),
          data: STANDARD.encode(&self.buf),
        },
      )
      .map_err(bridge_io)?;
    self.dirty = false;
    Ok(())
  }
}

pub struct AndroidPrompter<R: Runtime>(PluginHandle<R>);

#[async_trait]
impl<R: Runtime> Prompter for AndroidPrompter<R> {
  async fn request_permission(&self, name: &str) -> crate::Result<bool> {
    let response: PermissionResponse = self
      .0
      .run_mobile_plugin_async(
        "requestPermission",
        PermissionArgs {
          permission: name.to_string(),
        },
      )
      .await?;
    Ok(response.granted)
  }

  async fn create_document(&self, prompt: &DocumentPrompt) -> crate::Result<Option<String>> {
    let response: CreateDocumentResponse = self
      .0
      .run_mobile_plugin_async("createDocument", prompt.clone())
      .await?;
    Ok(response.uri)
  }
}
