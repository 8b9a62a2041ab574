use tauri::{command, AppHandle, Runtime};

use crate::models::*;
use crate::CopyToDownloadsExt;

#[command(rename = "copyToDownloads")]
pub(crate) async fn copy_to_downloads<R: Runtime>(
  app: AppHandle<R>,
  source_uri: String,
  file_name: String,
  mime_type: String,
) -> crate::Result<()> {
  app
    .copy_to_downloads()
    .copy(CopyRequest::new(source_uri, file_name, mime_type))
    .await
}

/// 进程在文档选择器打开期间被回收后，由前端带着选择结果重新发起。
#[command(rename = "resumePendingCopy")]
pub(crate) async fn resume_pending_copy<R: Runtime>(
  app: AppHandle<R>,
  document_uri: Option<String>,
) -> crate::Result<()> {
  app.copy_to_downloads().resume_pending(document_uri).await
}
