//! Deployment orchestration
//!
//! Mirrors the deploy script flow: on a dev chain, provision a mock
//! coordinator, create and fund a randomness subscription, instantiate the
//! lottery from the network profile and register it as a consumer. Live
//! chains attach to a pre-provisioned coordinator instead.

use crate::chain::{LocalChain, WEI_PER_ETHER};
use crate::config::{builtin_profile, NetworkProfile};
use crate::errors::{DeployError, TombolaResult};
use crate::lottery::machine::Lottery;
use crate::lottery::types::DrawParams;
use crate::vrf::coordinator::MockVrfCoordinator;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Initial funding for a freshly provisioned subscription (0.2 ether)
pub const SUBSCRIPTION_FUND_WEI: u128 = 200_000_000_000_000_000;

/// Deployer account name used by fixtures and the CLI
pub const DEPLOYER: &str = "deployer";

/// Balance minted to each fixture account
pub const FIXTURE_ACCOUNT_BALANCE_WEI: u128 = 10 * WEI_PER_ETHER;

/// Player accounts pre-funded by [`fixture`]
pub const FIXTURE_PLAYER_COUNT: usize = 8;

pub fn player_account(index: usize) -> String {
    format!("player-{}", index)
}

/// Everything a deployment run produces
pub struct Deployment {
    pub lottery: Arc<Lottery>,
    pub coordinator: Arc<MockVrfCoordinator>,
    pub chain: Arc<LocalChain>,
    pub profile: NetworkProfile,
    pub record: DeploymentRecord,
}

impl std::fmt::Debug for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployment")
            .field("profile", &self.profile)
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

/// Serializable summary of a deployment
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentRecord {
    pub network: String,
    pub chain_id: u64,
    pub lottery_id: String,
    pub subscription_id: u64,
    pub entrance_fee_wei: u64,
    pub interval_secs: u64,
    pub deployed_at: DateTime<Utc>,
}

/// Deploy on a dev chain, provisioning coordinator and subscription
pub async fn deploy(
    profile: &NetworkProfile,
    chain: Arc<LocalChain>,
) -> Result<Deployment, DeployError> {
    profile.validate()?;
    if !profile.is_dev() {
        return Err(DeployError::NotADevChain {
            chain_id: profile.chain_id,
            network: profile.name.clone(),
        });
    }

    let coordinator = Arc::new(MockVrfCoordinator::new_random());
    let subscription_id = coordinator.create_subscription();
    coordinator.fund_subscription(subscription_id, SUBSCRIPTION_FUND_WEI)?;
    info!(
        subscription_id,
        fund_wei = SUBSCRIPTION_FUND_WEI,
        "provisioned randomness subscription"
    );

    instantiate(profile, chain, coordinator, subscription_id)
}

/// Deploy against an existing coordinator using the profile's subscription
pub async fn deploy_with_coordinator(
    profile: &NetworkProfile,
    chain: Arc<LocalChain>,
    coordinator: Arc<MockVrfCoordinator>,
) -> Result<Deployment, DeployError> {
    profile.validate()?;
    let subscription_id = profile
        .subscription_id
        .ok_or_else(|| DeployError::MissingSubscription {
            network: profile.name.clone(),
        })?;

    instantiate(profile, chain, coordinator, subscription_id)
}

fn instantiate(
    profile: &NetworkProfile,
    chain: Arc<LocalChain>,
    coordinator: Arc<MockVrfCoordinator>,
    subscription_id: u64,
) -> Result<Deployment, DeployError> {
    let params = DrawParams {
        entrance_fee_wei: profile.entrance_fee_wei as u128,
        gas_lane: profile.gas_lane.clone(),
        subscription_id,
        callback_gas_limit: profile.callback_gas_limit,
        interval: profile.interval(),
    };

    let lottery = Arc::new(Lottery::new(params, chain.clone(), coordinator.clone()));
    coordinator.add_consumer(subscription_id, lottery.id())?;

    let record = DeploymentRecord {
        network: profile.name.clone(),
        chain_id: profile.chain_id,
        lottery_id: lottery.id().to_string(),
        subscription_id,
        entrance_fee_wei: profile.entrance_fee_wei,
        interval_secs: profile.interval_secs,
        deployed_at: Utc::now(),
    };
    info!(
        network = %record.network,
        chain_id = record.chain_id,
        lottery = %record.lottery_id,
        subscription_id,
        "lottery deployed"
    );

    Ok(Deployment {
        lottery,
        coordinator,
        chain,
        profile: profile.clone(),
        record,
    })
}

/// Test fixture: fresh chain, funded deployer and player accounts, full
/// dev deployment
pub async fn fixture(chain_id: u64) -> TombolaResult<Deployment> {
    let profile = builtin_profile(chain_id).map_err(DeployError::Config)?;
    let chain = Arc::new(LocalChain::new(chain_id));

    chain.fund_account(DEPLOYER, FIXTURE_ACCOUNT_BALANCE_WEI);
    for index in 0..FIXTURE_PLAYER_COUNT {
        chain.fund_account(&player_account(index), FIXTURE_ACCOUNT_BALANCE_WEI);
    }

    Ok(deploy(&profile, chain).await?)
}
