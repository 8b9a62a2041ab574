//! Runs the state machine against real, asynchronous prompts.
//!
//! The machine sits behind a `std::sync::Mutex`; the lock is only taken to feed
//! it a message and is never held while a prompt is on screen.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::warn;

use crate::host::StorageHost;
use crate::models::{CopyRequest, DocumentPrompt};
use crate::operation::{Awaiting, Orchestrator, Prompt, Resume, Step};
use crate::{Error, Result};

/// Shows the two prompts a copy can wait on.
#[async_trait]
pub trait Prompter: Send + Sync {
  async fn request_permission(&self, name: &str) -> Result<bool>;

  /// `Ok(None)` when the user backed out.
  async fn create_document(&self, prompt: &DocumentPrompt) -> Result<Option<String>>;
}

fn lock<H: StorageHost>(machine: &Mutex<Orchestrator<H>>) -> MutexGuard<'_, Orchestrator<H>> {
  machine.lock().unwrap_or_else(PoisonError::into_inner)
}

fn abort_reason(e: Error) -> String {
  match e {
    Error::Aborted(reason) => reason,
    other => other.to_string(),
  }
}

/// Answers prompts until the machine stops asking.
pub async fn drive<H, P>(machine: &Mutex<Orchestrator<H>>, prompter: &P, mut step: Step)
where
  H: StorageHost,
  P: Prompter + ?Sized,
{
  loop {
    let signal = match step {
      Step::Suspended(Prompt::Permission { name }) => match prompter.request_permission(&name).await {
        Ok(granted) => Resume::Permission { granted },
        Err(e) => {
          warn!(error = %e, "permission prompt failed");
          Resume::Aborted(abort_reason(e))
        }
      },
      Step::Suspended(Prompt::CreateDocument(prompt)) => match prompter.create_document(&prompt).await {
        Ok(Some(uri)) => Resume::DocumentChosen(uri),
        Ok(None) => Resume::DocumentCancelled,
        Err(e) => {
          warn!(error = %e, "document prompt failed");
          Resume::Aborted(abort_reason(e))
        }
      },
      Step::Finished | Step::Ignored => return,
    };
    step = lock(machine).resume(signal);
  }
}

async fn outcome(rx: oneshot::Receiver<Result<()>>) -> Result<()> {
  rx.await
    .unwrap_or_else(|_| Err(Error::Aborted("copy dropped without a result".to_string())))
}

/// Submits `request` and waits for its single result.
pub async fn copy_to_downloads<H, P>(machine: &Mutex<Orchestrator<H>>, prompter: &P, request: CopyRequest) -> Result<()>
where
  H: StorageHost,
  P: Prompter + ?Sized,
{
  let (tx, rx) = oneshot::channel();
  let step = lock(machine).submit(request, Box::new(tx));
  drive(machine, prompter, step).await;
  outcome(rx).await
}

/// Picks up a copy whose process died while the document prompt was open.
/// `document_uri` is what the prompt eventually returned; `None` means cancelled.
pub async fn resume_pending<H, P>(
  machine: &Mutex<Orchestrator<H>>,
  prompter: &P,
  document_uri: Option<String>,
) -> Result<()>
where
  H: StorageHost,
  P: Prompter + ?Sized,
{
  let (tx, rx) = oneshot::channel();
  let step = {
    let mut guard = lock(machine);
    guard.restore_from_store(Awaiting::UserDocument, Box::new(tx))?;
    guard.resume(match document_uri {
      Some(uri) => Resume::DocumentChosen(uri),
      None => Resume::DocumentCancelled,
    })
  };
  drive(machine, prompter, step).await;
  outcome(rx).await
}
