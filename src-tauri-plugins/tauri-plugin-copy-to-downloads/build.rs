const COMMANDS: &[&str] = &["copyToDownloads", "resumePendingCopy"];

fn main() {
  // 桌面端没有 Tauri 依赖，只在 Android 目标上生成插件权限与 cfg 别名
  if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("android") {
    tauri_plugin::Builder::new(COMMANDS).build();
  }
}
