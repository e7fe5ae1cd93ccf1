use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::domain::EventId;
use super::repository::{ContestRepository, VoteNotifier};
use super::service::RankingService;

/// Table whose insert/update/delete triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    Entries,
    Scores,
    Votes,
    Views,
}

/// "Recompute now" trigger; the payload is never interpreted beyond the event id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub event_id: EventId,
    pub source: ChangeSource,
}

/// Recompute standings for every event named on the change feed.
///
/// Notifications already queued are drained and coalesced so a burst of
/// writes to one event triggers a single recomputation.
pub fn spawn_recompute_worker<R, N>(
    service: Arc<RankingService<R, N>>,
    mut receiver: mpsc::Receiver<ChangeNotification>,
) -> JoinHandle<()>
where
    R: ContestRepository + 'static,
    N: VoteNotifier + 'static,
{
    tokio::spawn(async move {
        while let Some(first) = receiver.recv().await {
            let mut pending = BTreeSet::new();
            pending.insert(first.event_id);
            while let Ok(next) = receiver.try_recv() {
                pending.insert(next.event_id);
            }

            for event_id in pending {
                // Store reads are synchronous and may block.
                let task_service = service.clone();
                let task_event = event_id.clone();
                let outcome =
                    tokio::task::spawn_blocking(move || task_service.refresh(&task_event)).await;
                match outcome {
                    Ok(Ok(standings)) => debug!(
                        event = %event_id,
                        podium = standings.judge.podium.len(),
                        "standings refreshed from change feed"
                    ),
                    Ok(Err(err)) => warn!(event = %event_id, error = %err, "recompute failed"),
                    Err(err) => warn!(event = %event_id, error = %err, "recompute task aborted"),
                }
            }
        }

        info!("change feed closed, recompute worker stopping");
    })
}
