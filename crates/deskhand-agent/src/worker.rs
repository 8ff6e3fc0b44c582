use deskhand_core::ActionBatch;
use deskhand_input::{ActionError, BatchReport, Interpreter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// A decoded `execute_actions` request waiting for the worker.
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: Uuid,
    pub user_id: String,
    pub actions: ActionBatch,
}

impl Batch {
    pub fn new(user_id: impl Into<String>, actions: ActionBatch) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            actions,
        }
    }
}

/// Sending half of the batch queue. Batches are executed one at a time in
/// the order they were submitted.
#[derive(Clone)]
pub struct BatchQueue {
    tx: mpsc::UnboundedSender<Batch>,
}

impl BatchQueue {
    /// Queue a batch. Returns `false` only if the worker has stopped.
    pub fn submit(&self, batch: Batch) -> bool {
        let id = batch.id;
        match self.tx.send(batch) {
            Ok(()) => true,
            Err(_) => {
                error!(batch = %id, "batch worker is not running; batch dropped");
                false
            }
        }
    }
}

/// Start the single worker task that owns action execution.
pub fn spawn(interpreter: Interpreter) -> (BatchQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Batch>();
    let handle = tokio::spawn(async move {
        while let Some(batch) = rx.recv().await {
            let _ = execute(&interpreter, batch).await;
        }
    });
    (BatchQueue { tx }, handle)
}

/// Run one batch and log its outcome exactly once.
pub async fn execute(interpreter: &Interpreter, batch: Batch) -> Result<BatchReport, ActionError> {
    let span = info_span!(
        "batch",
        id = %batch.id,
        user = %batch.user_id,
        actions = batch.actions.len(),
        backend = interpreter.backend_name(),
    );
    async {
        info!("executing batch");
        let result = interpreter.execute(&batch.actions).await;
        match &result {
            Ok(report) => info!(
                executed = report.executed,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "batch complete"
            ),
            Err(e) => error!(
                index = e.index,
                kind = %e.kind,
                error = %e.source,
                "batch aborted"
            ),
        }
        result
    }
    .instrument(span)
    .await
}
