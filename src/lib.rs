//! Tombola - Provably Fair Interval Lottery
//!
//! Players buy in while the lottery is open; once the draw interval has
//! elapsed with a funded pot, an upkeep trigger requests verifiable
//! randomness and the fulfillment callback pays the pot to the winner.
//! Ships with a local chain environment, a mock randomness coordinator
//! and the deployment orchestration to wire them together.

pub mod automation;
pub mod chain;
pub mod config;
pub mod deploy;
pub mod errors;
pub mod events;
pub mod lottery;
pub mod vrf;

pub use automation::{spawn_keeper, spawn_vrf_responder, AutomationHandle};
pub use chain::{LocalChain, WEI_PER_ETHER};
pub use config::{builtin_profile, ConfigLoader, NetworkProfile, TombolaConfig, DEV_CHAIN_ID};
pub use deploy::{deploy, deploy_with_coordinator, fixture, Deployment, DeploymentRecord};
pub use errors::{
    ChainError, ConfigError, CoordinatorError, DeployError, LotteryError, TombolaError,
    TombolaResult,
};
pub use events::LotteryEvent;
pub use lottery::{DrawParams, Lottery, LotteryState, UpkeepStatus};
pub use vrf::{MockVrfCoordinator, RandomnessConsumer, RandomnessCoordinator, VrfEngine};
