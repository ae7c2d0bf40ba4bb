//! Fire-and-forget audit recording.
//!
//! Handlers hand entries to a bounded queue with `try_send` and move on; a single background
//! task drains the queue into the [`AuditSink`]. A full queue or a failing sink costs an entry and
//! a log line, never a request.

use crate::sink::AuditSink;
use chrono::Utc;
use dfort_domain::audit::{AuditAction, AuditEntry, ResourceRef};
use dfort_kernel::safe_nanoid;
use dfort_kernel::server::RequesterContext;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

#[derive(Debug)]
enum Command {
    Append(AuditEntry),
    /// Acknowledged once every entry queued before it has been handed to the sink.
    Flush(oneshot::Sender<()>),
}

/// Cheap-to-clone handle onto the audit queue.
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    tx: mpsc::Sender<Command>,
}

impl AuditRecorder {
    /// Starts the drain task on the current Tokio runtime.
    ///
    /// # Panics
    /// Outside a Tokio runtime, or with a zero `capacity`.
    #[must_use]
    pub fn spawn(sink: Arc<dyn AuditSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        let worker = tokio::spawn(drain(sink, rx));
        (Self { tx }, worker)
    }

    /// Queues one entry. Never blocks and never fails the caller.
    pub fn record(
        &self,
        user_id: &str,
        action: AuditAction,
        resource: &ResourceRef,
        requester: &RequesterContext,
    ) {
        let entry = AuditEntry {
            id: safe_nanoid!(),
            user_id: user_id.to_owned(),
            action,
            resource: resource.to_string(),
            ip_address: requester.ip_address.clone(),
            user_agent: requester.user_agent.clone(),
            timestamp: Utc::now(),
        };

        match self.tx.try_send(Command::Append(entry)) {
            Ok(()) => {},
            Err(TrySendError::Full(Command::Append(entry))) => {
                warn!(
                    action = %entry.action,
                    resource = %entry.resource,
                    "Audit queue full, entry dropped"
                );
            },
            Err(TrySendError::Closed(_) | TrySendError::Full(_)) => {
                warn!(action = %action, "Audit worker stopped, entry dropped");
            },
        }
    }

    /// Waits until everything recorded so far has reached the sink.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).await.is_ok() {
            let _ = done.await;
        }
    }
}

async fn drain(sink: Arc<dyn AuditSink>, mut rx: mpsc::Receiver<Command>) {
    debug!("Audit worker started");
    while let Some(command) = rx.recv().await {
        match command {
            Command::Append(entry) => {
                let (action, resource) = (entry.action, entry.resource.clone());
                if let Err(e) = sink.append(entry).await {
                    error!(%action, %resource, error = %e, "Failed to write audit entry");
                }
            },
            Command::Flush(ack) => {
                let _ = ack.send(());
            },
        }
    }
    debug!("Audit worker stopped");
}
