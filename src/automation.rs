//! Background automation: upkeep keeper and randomness responder
//!
//! Local analogs of the off-chain services a live deployment relies on.
//! The keeper polls `check_upkeep` and triggers draws; the responder
//! watches for winner-requested events and fulfills them through the mock
//! coordinator.

use crate::errors::LotteryError;
use crate::events::LotteryEvent;
use crate::lottery::machine::Lottery;
use crate::vrf::coordinator::MockVrfCoordinator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Handle to a running automation task
pub struct AutomationHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl AutomationHandle {
    /// Signal the task to stop and drop it
    pub fn shutdown(self) {
        let _ = self.shutdown.send(true);
        self.task.abort();
    }
}

/// Spawn a keeper polling upkeep at `poll_interval`
pub fn spawn_keeper(lottery: Arc<Lottery>, poll_interval: Duration) -> AutomationHandle {
    let (shutdown, mut stop) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            tokio::select! {
                _ = stop.changed() => break,
                _ = ticker.tick() => {
                    if !lottery.check_upkeep().upkeep_needed() {
                        continue;
                    }
                    match lottery.perform_upkeep().await {
                        Ok(request_id) => {
                            info!(lottery = %lottery.id(), request_id, "keeper triggered draw");
                        }
                        // another keeper won the race between check and perform
                        Err(LotteryError::UpkeepNotNeeded { .. }) => {
                            debug!(lottery = %lottery.id(), "upkeep already handled");
                        }
                        Err(e) => {
                            warn!(lottery = %lottery.id(), error = %e, "upkeep failed");
                        }
                    }
                }
            }
        }
    });
    AutomationHandle { shutdown, task }
}

/// Spawn a responder fulfilling every winner-requested event
pub fn spawn_vrf_responder(
    coordinator: Arc<MockVrfCoordinator>,
    lottery: Arc<Lottery>,
) -> AutomationHandle {
    let (shutdown, mut stop) = watch::channel(false);
    let mut events = lottery.subscribe();
    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop.changed() => break,
                event = events.recv() => match event {
                    Ok(LotteryEvent::WinnerRequested { request_id }) => {
                        match coordinator
                            .fulfill_random_words(request_id, lottery.as_ref())
                            .await
                        {
                            Ok(()) => {
                                info!(request_id, "responder fulfilled randomness");
                            }
                            Err(e) => {
                                warn!(request_id, error = %e, "fulfillment failed");
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "responder lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    });
    AutomationHandle { shutdown, task }
}
