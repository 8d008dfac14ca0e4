//! Error types for the Tombola lottery engine
//!
//! Each subsystem owns its error enum; `TombolaError` is the root that
//! binaries and tests can bubble everything into.

use crate::lottery::types::LotteryState;
use thiserror::Error;

/// Root error type for all Tombola operations
#[derive(Debug, Error)]
pub enum TombolaError {
    #[error("lottery error: {0}")]
    Lottery(#[from] LotteryError),

    #[error("coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("deployment error: {0}")]
    Deploy(#[from] DeployError),
}

/// Errors raised by the lottery state machine
#[derive(Debug, Error)]
pub enum LotteryError {
    /// Entry payment below the configured entrance fee
    #[error("entrance fee not met: sent {sent} wei, required {required} wei")]
    EntranceFeeNotMet { sent: u128, required: u128 },

    /// Entry attempted while a draw is in progress
    #[error("lottery is not open (state: {0})")]
    NotOpen(LotteryState),

    /// `perform_upkeep` called while the upkeep conditions do not hold.
    /// Carries the observables so callers can see which leg failed.
    #[error("upkeep not needed (pot {pot} wei, {players} players, state {state})")]
    UpkeepNotNeeded {
        pot: u128,
        players: usize,
        state: LotteryState,
    },

    #[error("fulfillment delivered no random words")]
    NoRandomWords,

    #[error("fulfillment with no registered players")]
    NoPlayers,

    #[error("no player at index {0}")]
    PlayerIndexOutOfBounds(usize),

    #[error("randomness request failed: {0}")]
    Randomness(#[from] CoordinatorError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Errors raised by the randomness coordinator
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("nonexistent request: {0}")]
    NonexistentRequest(u64),

    #[error("unknown subscription: {0}")]
    UnknownSubscription(u64),

    #[error("subscription {subscription_id} underfunded: balance {balance} wei, fee {fee} wei")]
    InsufficientSubscriptionBalance {
        subscription_id: u64,
        balance: u128,
        fee: u128,
    },

    #[error("consumer {consumer} not registered with subscription {subscription_id}")]
    ConsumerNotRegistered {
        subscription_id: u64,
        consumer: String,
    },

    #[error("consumer rejected fulfillment of request {request_id}: {reason}")]
    ConsumerRejected { request_id: u64, reason: String },

    #[error("vrf failure: {0}")]
    Vrf(String),
}

/// Errors raised by the local chain environment
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("insufficient balance for {account}: has {balance} wei, needs {required} wei")]
    InsufficientBalance {
        account: String,
        balance: u128,
        required: u128,
    },
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no network profile for chain id {0}")]
    UnknownChain(u64),

    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("missing required field: {0}")]
    MissingRequired(String),
}

/// Deployment orchestration errors
#[derive(Debug, Error)]
pub enum DeployError {
    /// `deploy` provisions a mock coordinator, which only makes sense on a
    /// dev chain; live chains must attach to an existing coordinator.
    #[error("chain {chain_id} ({network}) is not a dev chain; use deploy_with_coordinator")]
    NotADevChain { chain_id: u64, network: String },

    #[error("profile {network} has no subscription id configured")]
    MissingSubscription { network: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

/// Convenience alias used throughout the crate
pub type TombolaResult<T> = Result<T, TombolaError>;
