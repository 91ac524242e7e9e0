use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use crate::Change;

/// A one-way feed of changes to one prefix of a shared backend.
///
/// Keys come back without the prefix; `new_value` is the raw stored string,
/// still enveloped. Changes may arrive after a conflicting local write has
/// already completed, so this is for observation, not coordination.
pub struct Watch {
    rx: broadcast::Receiver<Change>,
    prefix: String,
}

impl Watch {
    pub(crate) fn new(rx: broadcast::Receiver<Change>, prefix: String) -> Self {
        Self { rx, prefix }
    }

    /// Returns the next pending change without waiting.
    pub fn try_next(&mut self) -> Option<Change> {
        loop {
            match self.rx.try_recv() {
                Ok(change) => {
                    if let Some(change) = self.scope(change) {
                        return Some(change);
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => log::warn!("Watcher lagged, {} changes dropped", skipped),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Waits for the next change. `None` once the backend is gone.
    pub async fn next(&mut self) -> Option<Change> {
        loop {
            match self.rx.recv().await {
                Ok(change) => {
                    if let Some(change) = self.scope(change) {
                        return Some(change);
                    }
                }
                Err(RecvError::Lagged(skipped)) => log::warn!("Watcher lagged, {} changes dropped", skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn scope(&self, change: Change) -> Option<Change> {
        match change.key {
            None => Some(change),
            Some(key) => key.strip_prefix(&self.prefix).map(|logical| Change {
                key: Some(logical.to_string()),
                new_value: change.new_value,
            }),
        }
    }
}
