//! Mock randomness coordinator
//!
//! Local stand-in for the off-chain randomness service the lottery bills
//! its requests against: funded subscriptions, registered consumers, and
//! explicit fulfillment so tests control exactly when randomness lands.

use crate::errors::{CoordinatorError, LotteryError};
use crate::vrf::engine::VrfEngine;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Flat fee charged to the subscription per fulfilled request (0.025 ether)
pub const FULFILLMENT_FEE_WEI: u128 = 25_000_000_000_000_000;

/// A randomness request as submitted by a consumer
#[derive(Debug, Clone)]
pub struct RandomnessRequest {
    pub gas_lane: String,
    pub subscription_id: u64,
    pub request_confirmations: u32,
    pub callback_gas_limit: u64,
    pub num_words: u32,
    /// Consumer id the fulfillment callback is destined for
    pub consumer: String,
}

/// Source of verifiable randomness, billed per subscription
#[async_trait]
pub trait RandomnessCoordinator: Send + Sync {
    /// Submit a request; returns the request id (always > 0)
    async fn request_random_words(
        &self,
        request: RandomnessRequest,
    ) -> Result<u64, CoordinatorError>;
}

/// Receiver of randomness fulfillment callbacks
#[async_trait]
pub trait RandomnessConsumer: Send + Sync {
    fn consumer_id(&self) -> &str;

    async fn raw_fulfill_random_words(
        &self,
        request_id: u64,
        words: Vec<u64>,
    ) -> Result<(), LotteryError>;
}

/// Funded account billed for randomness requests
#[derive(Debug, Clone, Default)]
pub struct Subscription {
    pub balance_wei: u128,
    pub consumers: Vec<String>,
}

/// In-process coordinator with explicit fulfillment
pub struct MockVrfCoordinator {
    engine: VrfEngine,
    subscriptions: DashMap<u64, Subscription>,
    pending: DashMap<u64, RandomnessRequest>,
    next_subscription_id: AtomicU64,
    next_request_id: AtomicU64,
}

impl MockVrfCoordinator {
    pub fn new(engine: VrfEngine) -> Self {
        Self {
            engine,
            subscriptions: DashMap::new(),
            pending: DashMap::new(),
            next_subscription_id: AtomicU64::new(1),
            next_request_id: AtomicU64::new(1),
        }
    }

    /// Coordinator with a freshly generated VRF keypair
    pub fn new_random() -> Self {
        Self::new(VrfEngine::new_random())
    }

    /// Create an empty subscription and return its id
    pub fn create_subscription(&self) -> u64 {
        let id = self.next_subscription_id.fetch_add(1, Ordering::SeqCst);
        self.subscriptions.insert(id, Subscription::default());
        debug!(subscription_id = id, "subscription created");
        id
    }

    pub fn fund_subscription(
        &self,
        subscription_id: u64,
        amount_wei: u128,
    ) -> Result<(), CoordinatorError> {
        let mut subscription = self
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(CoordinatorError::UnknownSubscription(subscription_id))?;
        subscription.balance_wei += amount_wei;
        debug!(
            subscription_id,
            balance_wei = subscription.balance_wei,
            "subscription funded"
        );
        Ok(())
    }

    /// Register a consumer so its requests bill against the subscription
    pub fn add_consumer(
        &self,
        subscription_id: u64,
        consumer: &str,
    ) -> Result<(), CoordinatorError> {
        let mut subscription = self
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(CoordinatorError::UnknownSubscription(subscription_id))?;
        if !subscription.consumers.iter().any(|c| c == consumer) {
            subscription.consumers.push(consumer.to_string());
        }
        Ok(())
    }

    pub fn subscription_balance(&self, subscription_id: u64) -> Result<u128, CoordinatorError> {
        self.subscriptions
            .get(&subscription_id)
            .map(|s| s.balance_wei)
            .ok_or(CoordinatorError::UnknownSubscription(subscription_id))
    }

    pub fn pending_request_count(&self) -> usize {
        self.pending.len()
    }

    /// Deliver randomness for a pending request to the given consumer.
    ///
    /// Unknown request ids fail with [`CoordinatorError::NonexistentRequest`];
    /// an underfunded subscription leaves the request pending.
    pub async fn fulfill_random_words(
        &self,
        request_id: u64,
        consumer: &dyn RandomnessConsumer,
    ) -> Result<(), CoordinatorError> {
        let request = self
            .pending
            .get(&request_id)
            .map(|r| r.value().clone())
            .ok_or(CoordinatorError::NonexistentRequest(request_id))?;

        {
            let mut subscription = self
                .subscriptions
                .get_mut(&request.subscription_id)
                .ok_or(CoordinatorError::UnknownSubscription(request.subscription_id))?;
            if subscription.balance_wei < FULFILLMENT_FEE_WEI {
                return Err(CoordinatorError::InsufficientSubscriptionBalance {
                    subscription_id: request.subscription_id,
                    balance: subscription.balance_wei,
                    fee: FULFILLMENT_FEE_WEI,
                });
            }
            subscription.balance_wei -= FULFILLMENT_FEE_WEI;
        }

        self.pending.remove(&request_id);

        let (words, proof) = self.engine.random_words(
            request_id,
            &request.gas_lane,
            request.subscription_id,
            request.num_words,
        );
        debug!(
            request_id,
            output = %proof.output,
            "randomness derived"
        );

        consumer
            .raw_fulfill_random_words(request_id, words)
            .await
            .map_err(|e| CoordinatorError::ConsumerRejected {
                request_id,
                reason: e.to_string(),
            })?;

        info!(
            request_id,
            consumer = consumer.consumer_id(),
            "request fulfilled"
        );
        Ok(())
    }
}

#[async_trait]
impl RandomnessCoordinator for MockVrfCoordinator {
    async fn request_random_words(
        &self,
        request: RandomnessRequest,
    ) -> Result<u64, CoordinatorError> {
        let subscription = self
            .subscriptions
            .get(&request.subscription_id)
            .ok_or(CoordinatorError::UnknownSubscription(request.subscription_id))?;
        if !subscription.consumers.iter().any(|c| c == &request.consumer) {
            return Err(CoordinatorError::ConsumerNotRegistered {
                subscription_id: request.subscription_id,
                consumer: request.consumer.clone(),
            });
        }
        drop(subscription);

        let request_id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        debug!(
            request_id,
            subscription_id = request.subscription_id,
            consumer = %request.consumer,
            "randomness requested"
        );
        self.pending.insert(request_id, request);
        Ok(request_id)
    }
}
