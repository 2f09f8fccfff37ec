//! In-memory board snapshot kept fresh by the change feed.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::model::Board;
use crate::store::WorkOrderStore;

/// Shared view of the full board. Any change reloads everything rather than
/// patching the snapshot.
#[derive(Clone, Default)]
pub struct BoardCache {
    board: Arc<RwLock<Board>>,
}

impl BoardCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Board {
        self.board.read().await.clone()
    }

    /// Replaces the snapshot with a fresh board from the store. Returns the
    /// number of work orders loaded.
    pub async fn reload(&self, store: &WorkOrderStore) -> Result<usize> {
        let store = store.clone();
        let board = match tokio::task::spawn_blocking(move || store.load_board()).await {
            Ok(result) => result?,
            Err(e) => {
                error!("Board reload task failed: {}", e);
                return Ok(self.board.read().await.len());
            }
        };
        let count = board.len();
        *self.board.write().await = board;
        debug!("Board cache holds {} work orders", count);
        Ok(count)
    }

    /// Reloads the board on every change event until the feed closes, which
    /// happens once every store sharing it has been dropped.
    pub fn spawn_reload_on_change(&self, store: &WorkOrderStore) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        let mut change_rx = store.feed().subscribe();
        // The listener must not keep the feed open itself.
        let store = store.detached();
        tokio::spawn(async move {
            loop {
                match change_rx.recv().await {
                    Ok(event) => {
                        debug!("Change event {} for OT {}", event.kind, event.ot);
                        if let Err(e) = cache.reload(&store).await {
                            error!("Failed to reload board after change: {}", e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Board cache lagged by {} events, reloading", n);
                        if let Err(e) = cache.reload(&store).await {
                            error!("Failed to reload board after lag: {}", e);
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Change feed closed, stopping board cache listener");
                        break;
                    }
                }
            }
        })
    }
}
