use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Words requested per draw; one is enough to pick an index
pub const NUM_WORDS: u32 = 1;

/// Confirmations requested before randomness is considered final
pub const REQUEST_CONFIRMATIONS: u32 = 3;

/// Lottery lifecycle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LotteryState {
    /// Accepting entries
    Open,
    /// Randomness request in flight; entries rejected
    Calculating,
}

impl fmt::Display for LotteryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LotteryState::Open => write!(f, "open"),
            LotteryState::Calculating => write!(f, "calculating"),
        }
    }
}

/// Constructor parameters for a lottery instance
#[derive(Debug, Clone)]
pub struct DrawParams {
    pub entrance_fee_wei: u128,
    pub gas_lane: String,
    pub subscription_id: u64,
    pub callback_gas_limit: u64,
    pub interval: Duration,
}

/// Result of the read-only upkeep eligibility check
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UpkeepStatus {
    pub is_open: bool,
    pub interval_elapsed: bool,
    pub has_players: bool,
    pub is_funded: bool,
}

impl UpkeepStatus {
    /// Upkeep fires only when every leg holds
    pub fn upkeep_needed(&self) -> bool {
        self.is_open && self.interval_elapsed && self.has_players && self.is_funded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_renders_lowercase() {
        assert_eq!(LotteryState::Open.to_string(), "open");
        assert_eq!(LotteryState::Calculating.to_string(), "calculating");
    }

    #[test]
    fn upkeep_needs_every_leg() {
        let all = UpkeepStatus {
            is_open: true,
            interval_elapsed: true,
            has_players: true,
            is_funded: true,
        };
        assert!(all.upkeep_needed());

        for missing in 0..4 {
            let status = UpkeepStatus {
                is_open: missing != 0,
                interval_elapsed: missing != 1,
                has_players: missing != 2,
                is_funded: missing != 3,
            };
            assert!(!status.upkeep_needed());
        }
    }
}
