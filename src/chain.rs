//! Local chain environment: account balances and a controllable clock
//!
//! Stands in for the node the deployment scripts would otherwise talk to.
//! Tests drive time forward with [`LocalChain::advance_time`] instead of
//! waiting out the draw interval.

use crate::errors::ChainError;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// One ether in wei
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// In-process ledger with a forward-only clock
pub struct LocalChain {
    chain_id: u64,
    balances: DashMap<String, u128>,
    /// Unix seconds; only ever moves forward
    now: AtomicU64,
}

impl LocalChain {
    pub fn new(chain_id: u64) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            chain_id,
            balances: DashMap::new(),
            now: AtomicU64::new(now),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Current chain time in unix seconds
    pub fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    /// Move the clock forward (the `evm_increaseTime` analog)
    pub fn advance_time(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Mint balance into an account (genesis / test funding)
    pub fn fund_account(&self, account: &str, amount: u128) {
        *self.balances.entry(account.to_string()).or_insert(0) += amount;
    }

    /// Balance of an account; unknown accounts hold zero
    pub fn balance(&self, account: &str) -> u128 {
        self.balances.get(account).map(|b| *b).unwrap_or(0)
    }

    pub fn withdraw(&self, account: &str, amount: u128) -> Result<(), ChainError> {
        let mut entry = self.balances.entry(account.to_string()).or_insert(0);
        if *entry < amount {
            return Err(ChainError::InsufficientBalance {
                account: account.to_string(),
                balance: *entry,
                required: amount,
            });
        }
        *entry -= amount;
        Ok(())
    }

    pub fn deposit(&self, account: &str, amount: u128) {
        *self.balances.entry(account.to_string()).or_insert(0) += amount;
    }

    pub fn transfer(&self, from: &str, to: &str, amount: u128) -> Result<(), ChainError> {
        self.withdraw(from, amount)?;
        self.deposit(to, amount);
        Ok(())
    }
}
