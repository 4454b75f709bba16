use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::aggregator::ScanOutcome;

/// Shared handle on the latest completed scan.
///
/// Each scan takes a generation number when it starts. Only an outcome from
/// the most recently started generation may be committed, so a rescan
/// silently discards whatever an older in-flight scan produces.
#[derive(Clone, Default)]
pub struct AppState {
    latest: Arc<RwLock<Option<ScanOutcome>>>,
    generation: Arc<AtomicU64>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next generation number.
    pub fn begin_scan(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Publishes an outcome. Returns `false` when it is stale.
    pub async fn commit(&self, outcome: ScanOutcome) -> bool {
        let mut g = self.latest.write().await;

        if outcome.generation != self.current_generation() {
            debug!(
                generation = outcome.generation,
                current = self.current_generation(),
                "discarding stale scan outcome"
            );
            return false;
        }

        info!(
            generation = outcome.generation,
            cells = outcome.matrix.len(),
            "scan outcome published"
        );
        *g = Some(outcome);
        true
    }

    pub async fn latest(&self) -> Option<ScanOutcome> {
        self.latest.read().await.clone()
    }
}
