//! The copy state machine.
//!
//! [`Orchestrator`] owns at most one [`CopyOperation`]. Feeding it a request
//! or a [`Resume`] message returns a [`Step`]: either the copy finished (the
//! result channel has fired), or it is suspended on a [`Prompt`] that the
//! caller must show and answer with another [`Resume`].
//!
//! ```text
//! Idle ─┬─ RequestUserDocument ─> AwaitingUserDocument ─┬─ chosen ──> Copying ─> Done
//!       │                                               └─ cancel ──────────────> Done
//!       ├─ NeedsPermission ─────> AwaitingPermission ───┬─ granted ─> Copying ─> Done
//!       │                                               └─ denied ──────────────> Done
//!       └─ DirectWrite ─────────────────────────────────────────────> Copying ─> Done
//! ```

use std::path::PathBuf;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::copier;
use crate::destination::{Decision, DestinationStrategy};
use crate::host::StorageHost;
use crate::models::{CopyRequest, DocumentPrompt, OperationSnapshot};
use crate::resolver::UriResolver;
use crate::snapshot::SnapshotStore;
use crate::{Error, Result};

/// MIME type used when a copy is rebuilt from a snapshot, which does not carry one.
const RESTORED_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Idle,
  AwaitingPermission,
  AwaitingUserDocument,
  Copying,
  Done,
}

/// The two prompts a copy can be suspended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Awaiting {
  Permission,
  UserDocument,
}

impl Awaiting {
  const fn phase(self) -> Phase {
    match self {
      Self::Permission => Phase::AwaitingPermission,
      Self::UserDocument => Phase::AwaitingUserDocument,
    }
  }
}

/// Something the host must show the user before the copy can continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
  Permission { name: String },
  CreateDocument(DocumentPrompt),
}

/// Result of a prompt, delivered back into the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resume {
  Permission { granted: bool },
  DocumentChosen(String),
  DocumentCancelled,
  /// The prompt could not be shown or answered at all.
  Aborted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
  Suspended(Prompt),
  Finished,
  /// Nothing happened: busy, or the signal did not match the phase.
  Ignored,
}

/// Where the caller hears back. Fires exactly once per request.
pub trait ResultChannel: Send {
  fn complete(self: Box<Self>, outcome: Result<()>);
}

impl ResultChannel for oneshot::Sender<Result<()>> {
  fn complete(self: Box<Self>, outcome: Result<()>) {
    if (*self).send(outcome).is_err() {
      debug!("copy result receiver already dropped");
    }
  }
}

enum Target {
  File(PathBuf),
  Document(String),
}

pub struct CopyOperation {
  request: CopyRequest,
  channel: Option<Box<dyn ResultChannel>>,
  phase: Phase,
}

impl CopyOperation {
  fn new(request: CopyRequest, channel: Box<dyn ResultChannel>) -> Self {
    Self {
      request,
      channel: Some(channel),
      phase: Phase::Idle,
    }
  }

  pub fn request(&self) -> &CopyRequest {
    &self.request
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn has_channel(&self) -> bool {
    self.channel.is_some()
  }

  pub fn snapshot(&self) -> OperationSnapshot {
    OperationSnapshot {
      source_uri: self.request.source_uri.clone(),
      file_name: self.request.file_name.clone(),
    }
  }

  fn in_flight(&self) -> bool {
    self.phase != Phase::Done
  }
}

pub struct Orchestrator<H: StorageHost> {
  host: H,
  write_permission: String,
  initial_location: String,
  store: Box<dyn SnapshotStore>,
  current: Option<CopyOperation>,
}

impl<H: StorageHost> Orchestrator<H> {
  pub fn new(host: H, config: &Config, store: Box<dyn SnapshotStore>) -> Self {
    Self {
      host,
      write_permission: config.write_permission().to_string(),
      initial_location: config.initial_location().to_string(),
      store,
      current: None,
    }
  }

  pub fn host(&self) -> &H {
    &self.host
  }

  pub fn current(&self) -> Option<&CopyOperation> {
    self.current.as_ref()
  }

  pub fn phase(&self) -> Phase {
    self.current.as_ref().map_or(Phase::Idle, CopyOperation::phase)
  }

  /// Snapshot of the in-flight copy, if any.
  pub fn snapshot(&self) -> Option<OperationSnapshot> {
    self
      .current
      .as_ref()
      .filter(|op| op.in_flight())
      .map(CopyOperation::snapshot)
  }

  /// Starts a copy. A second request while one is in flight is rejected with
  /// [`Error::Busy`] on its own channel and leaves the running one alone.
  pub fn submit(&mut self, request: CopyRequest, channel: Box<dyn ResultChannel>) -> Step {
    if let Some(op) = self.current.as_ref().filter(|op| op.in_flight()) {
      warn!(
        in_flight = %op.request.source_uri,
        rejected = %request.source_uri,
        "copy already in progress, rejecting request"
      );
      channel.complete(Err(Error::Busy));
      return Step::Ignored;
    }
    info!(
      source = %request.source_uri,
      file_name = %request.file_name,
      mime_type = %request.mime_type,
      "copy to downloads requested"
    );
    self.current = Some(CopyOperation::new(request, channel));
    self.decide(false)
  }

  /// Feeds the answer to the prompt the copy is suspended on.
  pub fn resume(&mut self, signal: Resume) -> Step {
    match (self.phase(), signal) {
      (Phase::AwaitingPermission, Resume::Permission { granted: true }) => {
        info!("write permission granted");
        self.decide(true)
      }
      (Phase::AwaitingPermission, Resume::Permission { granted: false }) => {
        self.finish(Err(Error::PermissionDenied))
      }
      (Phase::AwaitingUserDocument, Resume::DocumentChosen(uri)) => {
        info!(document = %uri, "user picked a document");
        self.copy_to(Target::Document(uri))
      }
      (Phase::AwaitingUserDocument, Resume::DocumentCancelled) => self.finish(Err(Error::UserCancelled)),
      (Phase::AwaitingPermission | Phase::AwaitingUserDocument, Resume::Aborted(reason)) => {
        self.finish(Err(Error::Aborted(reason)))
      }
      (phase, signal) => {
        warn!(?phase, ?signal, "ignoring resumption that does not match the current phase");
        Step::Ignored
      }
    }
  }

  /// Rebuilds a suspended copy after the process was recreated. The old
  /// channel died with the old process; `channel` replaces it.
  pub fn restore(
    &mut self,
    snapshot: OperationSnapshot,
    awaiting: Awaiting,
    channel: Box<dyn ResultChannel>,
  ) -> Result<()> {
    if self.current.as_ref().is_some_and(CopyOperation::in_flight) {
      return Err(Error::Busy);
    }
    info!(
      source = %snapshot.source_uri,
      file_name = %snapshot.file_name,
      ?awaiting,
      "restoring suspended copy"
    );
    let request = CopyRequest::new(snapshot.source_uri, snapshot.file_name, RESTORED_MIME_TYPE);
    let mut op = CopyOperation::new(request, channel);
    op.phase = awaiting.phase();
    self.current = Some(op);
    Ok(())
  }

  /// [`Self::restore`] from whatever the snapshot store holds.
  pub fn restore_from_store(&mut self, awaiting: Awaiting, channel: Box<dyn ResultChannel>) -> Result<()> {
    let snapshot = self.store.load()?.ok_or(Error::NoPendingOperation)?;
    self.restore(snapshot, awaiting, channel)
  }

  pub fn pending_snapshot(&self) -> Result<Option<OperationSnapshot>> {
    self.store.load()
  }

  fn decide(&mut self, permission_granted: bool) -> Step {
    let Some(op) = self.current.as_ref() else {
      return Step::Ignored;
    };
    let request = op.request.clone();
    let mut strategy = DestinationStrategy::new(&self.host, &self.write_permission);
    if permission_granted {
      strategy = strategy.granted();
    }
    match strategy.choose(&request.file_name) {
      Err(e) => self.finish(Err(e.into())),
      Ok(Decision::DirectWrite(path)) => self.copy_to(Target::File(path)),
      Ok(Decision::NeedsPermission) => self.suspend(
        Awaiting::Permission,
        Prompt::Permission {
          name: self.write_permission.clone(),
        },
      ),
      Ok(Decision::RequestUserDocument) => {
        let prompt = DocumentPrompt {
          suggested_name: request.file_name,
          mime_type: request.mime_type,
          initial_location: Some(self.initial_location.clone()),
        };
        self.suspend(Awaiting::UserDocument, Prompt::CreateDocument(prompt))
      }
    }
  }

  fn suspend(&mut self, awaiting: Awaiting, prompt: Prompt) -> Step {
    let Some(op) = self.current.as_mut() else {
      return Step::Ignored;
    };
    op.phase = awaiting.phase();
    // 快照写失败不致命：只是进程被回收后无法续传
    if let Err(e) = self.store.save(&op.snapshot()) {
      warn!(error = %e, "failed to persist copy snapshot");
    }
    debug!(phase = ?op.phase, "copy suspended");
    Step::Suspended(prompt)
  }

  fn copy_to(&mut self, target: Target) -> Step {
    let Some(op) = self.current.as_mut() else {
      return Step::Ignored;
    };
    op.phase = Phase::Copying;
    let source_uri = op.request.source_uri.clone();
    let outcome = self.transfer(&source_uri, &target).map(|copied| {
      info!(bytes = copied, "copy finished");
    });
    self.finish(outcome)
  }

  fn transfer(&self, source_uri: &str, target: &Target) -> Result<u64> {
    // 先打开来源：来源不可读时不在 Downloads 留下空文件
    let source = UriResolver::new(&self.host).resolve(source_uri)?;
    let copied = match target {
      Target::File(path) => copier::copy_into(source, || self.host.create_file(path))?,
      Target::Document(uri) => copier::copy_into(source, || self.host.create_content(uri))?,
    };
    Ok(copied)
  }

  fn finish(&mut self, outcome: Result<()>) -> Step {
    let Some(op) = self.current.as_mut() else {
      return Step::Ignored;
    };
    op.phase = Phase::Done;
    if let Err(e) = self.store.clear() {
      warn!(error = %e, "failed to clear copy snapshot");
    }
    match &outcome {
      Ok(()) => info!(file_name = %op.request.file_name, "copied to downloads"),
      Err(e) => warn!(file_name = %op.request.file_name, error = %e, "copy to downloads failed"),
    }
    match op.channel.take() {
      Some(channel) => channel.complete(outcome),
      None => debug!("no result channel attached, outcome dropped"),
    }
    Step::Finished
  }
}
