//! Per-session persistence task.
//!
//! Mutations hand their patches to an unbounded channel and return at once.
//! A single task drains the channel, so patches reach the store in the order
//! they were produced. A failed patch is kept and merged under the next one;
//! the store converges on the next successful write.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use quizpop_core::{ProfilePatch, UserId};
use quizpop_database::GameStore;

#[derive(Debug)]
enum WriterCommand {
    Patch(ProfilePatch),
    Flush(oneshot::Sender<()>),
}

/// Cloneable handle used to queue patches.
#[derive(Clone, Debug)]
pub struct PatchSender {
    tx: mpsc::UnboundedSender<WriterCommand>,
}

impl PatchSender {
    /// Queue a patch without waiting for it to be written.
    pub fn send(&self, patch: ProfilePatch) {
        if patch.is_empty() {
            return;
        }
        if self.tx.send(WriterCommand::Patch(patch)).is_err() {
            warn!("profile writer is gone; dropping patch");
        }
    }
}

pub struct ProfileWriter {
    sender: PatchSender,
    handle: JoinHandle<()>,
}

impl ProfileWriter {
    pub fn spawn(store: GameStore, user_id: UserId) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(store, user_id, rx));

        Self {
            sender: PatchSender { tx },
            handle,
        }
    }

    pub fn sender(&self) -> PatchSender {
        self.sender.clone()
    }

    /// Wait until every patch queued so far has been attempted.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.sender.tx.send(WriterCommand::Flush(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.await;
    }

    /// Stop accepting patches from this handle and wait for queued ones.
    ///
    /// Clones of the sender keep the task alive until they are dropped.
    pub async fn finish(self) {
        drop(self.sender);
        if let Err(err) = self.handle.await {
            warn!(?err, "profile writer task ended abnormally");
        }
    }

    /// Stop accepting patches from this handle; queued ones still complete.
    pub fn detach(self) {
        drop(self.sender);
    }
}

async fn run(
    store: GameStore,
    user_id: UserId,
    mut rx: mpsc::UnboundedReceiver<WriterCommand>,
) {
    debug!(user_id = %user_id, backend = store.backend_name(), "profile writer started");

    let mut unsaved: Option<ProfilePatch> = None;
    while let Some(command) = rx.recv().await {
        let patch = match command {
            WriterCommand::Patch(patch) => patch,
            WriterCommand::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
        };

        let patch = match unsaved.take() {
            Some(older) => older.merge(patch),
            None => patch,
        };

        match store.update_profile(&user_id, &patch).await {
            Ok(()) => debug!(
                user_id = %user_id,
                fields = ?patch.changed_fields(),
                "profile patch persisted"
            ),
            Err(err) => {
                warn!(
                    ?err,
                    user_id = %user_id,
                    fields = ?patch.changed_fields(),
                    "profile write failed; local state is ahead of the store until the next write"
                );
                unsaved = Some(patch);
            }
        }
    }

    match unsaved {
        Some(patch) => warn!(
            user_id = %user_id,
            fields = ?patch.changed_fields(),
            "profile writer stopped with unsaved fields"
        ),
        None => info!(user_id = %user_id, "profile writer stopped"),
    }
}
