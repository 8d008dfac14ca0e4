//! Lottery event bus
//!
//! Observable state transitions are published on a broadcast channel so
//! tests and background services can subscribe the way the deployment
//! scripts attached `lottery.once(...)` handlers.

use serde::Serialize;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Observable lottery state transitions
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LotteryEvent {
    /// A player's entry was recorded
    Entered { player: String, value_wei: u128 },
    /// Upkeep fired and a randomness request is in flight
    WinnerRequested { request_id: u64 },
    /// Randomness arrived, the winner was paid and the lottery reset
    WinnerPicked {
        winner: String,
        payout_wei: u128,
        request_id: u64,
    },
}

/// Broadcast bus for [`LotteryEvent`]s
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LotteryEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LotteryEvent> {
        self.sender.subscribe()
    }

    /// Publish an event; a bus with no subscribers drops it silently
    pub fn publish(&self, event: LotteryEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
