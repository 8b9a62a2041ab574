use serde::{Deserialize, Serialize};

/// 一次复制请求：来源 URI、目标文件名、MIME 类型。创建后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyRequest {
  pub source_uri: String,
  pub file_name: String,
  pub mime_type: String,
}

impl CopyRequest {
  pub fn new(
    source_uri: impl Into<String>,
    file_name: impl Into<String>,
    mime_type: impl Into<String>,
  ) -> Self {
    Self {
      source_uri: source_uri.into(),
      file_name: file_name.into(),
      mime_type: mime_type.into(),
    }
  }
}

/// What survives a process recreation while a prompt is on screen.
/// The result channel is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSnapshot {
  pub source_uri: String,
  pub file_name: String,
}

/// Arguments of the document-creation prompt. Also sent verbatim to the native side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPrompt {
  pub suggested_name: String,
  pub mime_type: String,
  pub initial_location: Option<String>,
}

#[cfg(target_os = "android")]
pub(crate) use bridge::*;

#[cfg(target_os = "android")]
mod bridge {
  use serde::{Deserialize, Serialize};

  #[derive(Debug, Deserialize)]
  #[serde(rename_all = "camelCase")]
  pub struct StorageInfoResponse {
    pub scoped_storage: bool,
    pub downloads_dir: String,
  }

  #[derive(Debug, Serialize)]
  #[serde(rename_all = "camelCase")]
  pub struct UriArgs {
    pub uri: String,
  }

  #[derive(Debug, Serialize)]
  #[serde(rename_all = "camelCase")]
  pub struct OpenAssetArgs {
    pub path: String,
  }

  /// base64 内容；provider 没有返回流时为 None。
  #[derive(Debug, Deserialize)]
  #[serde(rename_all = "camelCase")]
  pub struct ReadBytesResponse {
    pub data: Option<String>,
  }

  #[derive(Debug, Serialize)]
  #[serde(rename_all = "camelCase")]
  pub struct WriteContentArgs {
    pub uri: String,
    pub data: String,
  }

  #[derive(Debug, Deserialize)]
  #[serde(rename_all = "camelCase")]
  pub struct ResolveRealPathResponse {
    pub path: Option<String>,
  }

  #[derive(Debug, Serialize)]
  #[serde(rename_all = "camelCase")]
  pub struct PermissionArgs {
    pub permission: String,
  }

  #[derive(Debug, Deserialize)]
  #[serde(rename_all = "camelCase")]
  pub struct PermissionResponse {
    pub granted: bool,
  }

  /// uri 为 None 表示用户取消了创建文档。
  #[derive(Debug, Deserialize)]
  #[serde(rename_all = "camelCase")]
  pub struct CreateDocumentResponse {
    pub uri: Option<String>,
  }
}
