use std::sync::Arc;
use std::time::{Duration, Instant};

use deskhand_core::{Action, ActionKind, DeskError, Key};
use thiserror::Error;
use tracing::{debug, info_span, warn, Instrument};

use crate::backend::InputBackend;

// ─── ActionError ──────────────────────────────────────────────────────────

/// The first failing action of a batch. Actions before `index` have already
/// taken effect; actions after it were not attempted.
#[derive(Debug, Error)]
#[error("action {index} ({kind}) failed: {source}")]
pub struct ActionError {
    pub index: usize,
    pub kind: ActionKind,
    #[source]
    pub source: DeskError,
}

// ─── BatchReport ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub executed: usize,
    pub elapsed: Duration,
}

// ─── Interpreter ──────────────────────────────────────────────────────────

/// Replays action batches against an [`InputBackend`].
///
/// Actions run strictly in order and each backend call is awaited before the
/// next is issued. The first failure stops the batch; nothing is retried or
/// undone, except that keys held by a failed combination are let go.
#[derive(Clone)]
pub struct Interpreter {
    backend: Arc<dyn InputBackend>,
}

impl Interpreter {
    pub fn new(backend: Arc<dyn InputBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn execute(&self, batch: &[Action]) -> Result<BatchReport, ActionError> {
        let start = Instant::now();
        for (index, action) in batch.iter().enumerate() {
            let kind = action.kind();
            self.execute_one(action)
                .instrument(info_span!("action", index, kind = %kind))
                .await
                .map_err(|source| ActionError {
                    index,
                    kind,
                    source,
                })?;
        }
        Ok(BatchReport {
            executed: batch.len(),
            elapsed: start.elapsed(),
        })
    }

    async fn execute_one(&self, action: &Action) -> deskhand_core::Result<()> {
        match action {
            Action::Key { key } => {
                let key = Key::from_name(key)?;
                debug!(%key, "key");
                self.backend.press_key(key).await?;
                self.backend.release_key(key).await
            }
            Action::Click { x, y, button } => {
                debug!(x, y, %button, "click");
                self.backend.move_to(*x, *y).await?;
                self.backend.click(*button).await
            }
            Action::Wait { ms } => {
                debug!(ms, "wait");
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                Ok(())
            }
            Action::Type { text } => {
                debug!(chars = text.chars().count(), "type");
                self.backend.type_text(text).await
            }
            Action::KeyCombination { keys } => {
                let keys = keys
                    .iter()
                    .map(|name| Key::from_name(name))
                    .collect::<deskhand_core::Result<Vec<Key>>>()?;
                debug!(?keys, "key combination");
                for (held, key) in keys.iter().enumerate() {
                    if let Err(e) = self.backend.press_key(*key).await {
                        self.release_held(&keys[..held]).await;
                        return Err(e);
                    }
                }
                for key in keys.iter().rev() {
                    self.backend.release_key(*key).await?;
                }
                Ok(())
            }
        }
    }

    /// Best-effort release after a failed press, so no modifier stays down.
    async fn release_held(&self, held: &[Key]) {
        for key in held.iter().rev() {
            if let Err(e) = self.backend.release_key(*key).await {
                warn!(%key, error = %e, "failed to release key after aborted combination");
            }
        }
    }
}
