//! Conflict report submission — fire-and-forget toward the transaction layer.

use relaymesh_conflict::ConflictReport;
use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Accepts conflict reports for asynchronous on-chain submission.
///
/// Submission is fire-and-forget: the dispatcher never awaits adjudication,
/// and a submitter must never block the request path.
pub trait ConflictSubmitter: Send + Sync {
    fn submit(&self, report: &ConflictReport);
}

/// Queues bincode-encoded reports for the external transaction-submission
/// collaborator, deduplicating by report id.
///
/// Detecting the same disagreement twice must not produce a second
/// transaction, so the seen-set persists for the submitter's lifetime.
pub struct TxQueueSubmitter {
    queue: mpsc::Sender<Vec<u8>>,
    seen: Mutex<HashSet<[u8; 32]>>,
}

impl TxQueueSubmitter {
    /// Create the submitter and the receiving end the transaction layer
    /// drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                queue: tx,
                seen: Mutex::new(HashSet::new()),
            },
            rx,
        )
    }
}

impl ConflictSubmitter for TxQueueSubmitter {
    fn submit(&self, report: &ConflictReport) {
        let id = report.report_id();
        {
            let mut seen = self.seen.lock().expect("submitter seen-set lock poisoned");
            if !seen.insert(id) {
                debug!(report = %report.id_hex(), "duplicate conflict report suppressed");
                return;
            }
        }
        let bytes = match bincode::serialize(report) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(report = %report.id_hex(), error = %e, "failed to encode conflict report");
                return;
            }
        };
        if let Err(e) = self.queue.try_send(bytes) {
            warn!(report = %report.id_hex(), error = %e, "conflict report queue full, dropping");
        }
    }
}
