//! The lottery state machine
//!
//! Players enter while the lottery is `Open`; once the draw interval has
//! elapsed with a funded pot, upkeep flips it to `Calculating` and submits a
//! randomness request. The fulfillment callback picks the winner, pays out
//! the pot and reopens the lottery.

use crate::chain::LocalChain;
use crate::errors::LotteryError;
use crate::events::{EventBus, LotteryEvent};
use crate::lottery::types::{
    DrawParams, LotteryState, UpkeepStatus, NUM_WORDS, REQUEST_CONFIRMATIONS,
};
use crate::vrf::coordinator::{RandomnessConsumer, RandomnessCoordinator, RandomnessRequest};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

struct DrawState {
    state: LotteryState,
    players: Vec<String>,
    pot_wei: u128,
    recent_winner: Option<String>,
    /// Chain time of the last draw (or of construction)
    last_draw_time: u64,
    last_request_id: Option<u64>,
}

/// A deployed lottery instance
pub struct Lottery {
    id: String,
    params: DrawParams,
    chain: Arc<LocalChain>,
    coordinator: Arc<dyn RandomnessCoordinator>,
    events: EventBus,
    inner: RwLock<DrawState>,
}

impl Lottery {
    pub fn new(
        params: DrawParams,
        chain: Arc<LocalChain>,
        coordinator: Arc<dyn RandomnessCoordinator>,
    ) -> Self {
        let last_draw_time = chain.now();
        Self {
            id: format!("lottery-{}", Uuid::new_v4()),
            params,
            chain,
            coordinator,
            events: EventBus::new(),
            inner: RwLock::new(DrawState {
                state: LotteryState::Open,
                players: Vec::new(),
                pot_wei: 0,
                recent_winner: None,
                last_draw_time,
                last_request_id: None,
            }),
        }
    }

    /// Buy into the current round
    ///
    /// The full `value_wei` joins the pot; overpaying is allowed, paying
    /// less than the entrance fee is not.
    pub fn enter(&self, player: &str, value_wei: u128) -> Result<(), LotteryError> {
        if value_wei < self.params.entrance_fee_wei {
            return Err(LotteryError::EntranceFeeNotMet {
                sent: value_wei,
                required: self.params.entrance_fee_wei,
            });
        }

        let mut inner = self.inner.write().unwrap();
        if inner.state != LotteryState::Open {
            return Err(LotteryError::NotOpen(inner.state));
        }

        self.chain.withdraw(player, value_wei)?;
        inner.players.push(player.to_string());
        inner.pot_wei += value_wei;
        debug!(
            lottery = %self.id,
            player,
            value_wei,
            players = inner.players.len(),
            "entry recorded"
        );
        drop(inner);

        self.events.publish(LotteryEvent::Entered {
            player: player.to_string(),
            value_wei,
        });
        Ok(())
    }

    /// Read-only upkeep eligibility check
    pub fn check_upkeep(&self) -> UpkeepStatus {
        let inner = self.inner.read().unwrap();
        self.upkeep_status(&inner)
    }

    fn upkeep_status(&self, inner: &DrawState) -> UpkeepStatus {
        let elapsed = self.chain.now().saturating_sub(inner.last_draw_time);
        UpkeepStatus {
            is_open: inner.state == LotteryState::Open,
            interval_elapsed: elapsed > self.params.interval.as_secs(),
            has_players: !inner.players.is_empty(),
            is_funded: inner.pot_wei > 0,
        }
    }

    /// Trigger a draw: transition to `Calculating` and request randomness
    ///
    /// Returns the request id carried by the winner-requested event. If the
    /// coordinator rejects the request the lottery reopens.
    pub async fn perform_upkeep(&self) -> Result<u64, LotteryError> {
        {
            let mut inner = self.inner.write().unwrap();
            let status = self.upkeep_status(&inner);
            if !status.upkeep_needed() {
                return Err(LotteryError::UpkeepNotNeeded {
                    pot: inner.pot_wei,
                    players: inner.players.len(),
                    state: inner.state,
                });
            }
            inner.state = LotteryState::Calculating;
        }

        let request = RandomnessRequest {
            gas_lane: self.params.gas_lane.clone(),
            subscription_id: self.params.subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit: self.params.callback_gas_limit,
            num_words: NUM_WORDS,
            consumer: self.id.clone(),
        };

        match self.coordinator.request_random_words(request).await {
            Ok(request_id) => {
                self.inner.write().unwrap().last_request_id = Some(request_id);
                info!(lottery = %self.id, request_id, "winner requested");
                self.events
                    .publish(LotteryEvent::WinnerRequested { request_id });
                Ok(request_id)
            }
            Err(e) => {
                self.inner.write().unwrap().state = LotteryState::Open;
                Err(e.into())
            }
        }
    }

    // Accessors mirror the read surface the deployment scripts query.

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn entrance_fee(&self) -> u128 {
        self.params.entrance_fee_wei
    }

    pub fn interval(&self) -> Duration {
        self.params.interval
    }

    pub fn subscription_id(&self) -> u64 {
        self.params.subscription_id
    }

    pub fn state(&self) -> LotteryState {
        self.inner.read().unwrap().state
    }

    pub fn recent_winner(&self) -> Option<String> {
        self.inner.read().unwrap().recent_winner.clone()
    }

    pub fn player(&self, index: usize) -> Result<String, LotteryError> {
        self.inner
            .read()
            .unwrap()
            .players
            .get(index)
            .cloned()
            .ok_or(LotteryError::PlayerIndexOutOfBounds(index))
    }

    pub fn num_players(&self) -> usize {
        self.inner.read().unwrap().players.len()
    }

    pub fn latest_timestamp(&self) -> u64 {
        self.inner.read().unwrap().last_draw_time
    }

    pub fn pot(&self) -> u128 {
        self.inner.read().unwrap().pot_wei
    }

    pub fn last_request_id(&self) -> Option<u64> {
        self.inner.read().unwrap().last_request_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LotteryEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl RandomnessConsumer for Lottery {
    fn consumer_id(&self) -> &str {
        &self.id
    }

    /// Randomness fulfillment callback: pick the winner, pay the pot,
    /// reset for the next round
    async fn raw_fulfill_random_words(
        &self,
        request_id: u64,
        words: Vec<u64>,
    ) -> Result<(), LotteryError> {
        let word = *words.first().ok_or(LotteryError::NoRandomWords)?;

        let (winner, payout_wei) = {
            let mut inner = self.inner.write().unwrap();
            if inner.players.is_empty() {
                return Err(LotteryError::NoPlayers);
            }
            let index = (word as usize) % inner.players.len();
            let winner = inner.players[index].clone();
            let payout_wei = inner.pot_wei;

            inner.players.clear();
            inner.pot_wei = 0;
            inner.state = LotteryState::Open;
            inner.recent_winner = Some(winner.clone());
            inner.last_draw_time = self.chain.now();
            (winner, payout_wei)
        };

        self.chain.deposit(&winner, payout_wei);
        info!(
            lottery = %self.id,
            request_id,
            winner = %winner,
            payout_wei,
            "winner picked"
        );
        self.events.publish(LotteryEvent::WinnerPicked {
            winner,
            payout_wei,
            request_id,
        });
        Ok(())
    }
}
