//! Lottery state machine flow tests against a full dev deployment
//!
//! Exercises the deployed instance through the same observable surface the
//! deployment scripts use: entries, upkeep checks, draw triggering and
//! randomness fulfillment.

use std::time::Duration;
use tombola::deploy::{player_account, FIXTURE_ACCOUNT_BALANCE_WEI};
use tombola::{
    builtin_profile, fixture, CoordinatorError, Deployment, LotteryError, LotteryEvent,
    LotteryState, DEV_CHAIN_ID,
};

async fn deploy_fixture() -> Deployment {
    fixture(DEV_CHAIN_ID).await.expect("fixture deploys")
}

/// Enter `count` players and move the clock past the draw interval
fn make_upkeep_eligible(deployment: &Deployment, count: usize) {
    let lottery = &deployment.lottery;
    let fee = lottery.entrance_fee();
    for index in 0..count {
        lottery
            .enter(&player_account(index), fee)
            .expect("entry accepted");
    }
    deployment
        .chain
        .advance_time(lottery.interval().as_secs() + 1);
}

#[tokio::test]
async fn initializes_from_network_profile() {
    let deployment = deploy_fixture().await;
    let profile = builtin_profile(DEV_CHAIN_ID).unwrap();
    let lottery = &deployment.lottery;

    assert_eq!(lottery.state(), LotteryState::Open);
    assert_eq!(lottery.interval(), Duration::from_secs(profile.interval_secs));
    assert_eq!(lottery.entrance_fee(), profile.entrance_fee_wei as u128);
    assert_eq!(lottery.num_players(), 0);
    assert_eq!(lottery.pot(), 0);
    assert!(lottery.recent_winner().is_none());
}

#[tokio::test]
async fn rejects_entry_below_entrance_fee() {
    let deployment = deploy_fixture().await;
    let lottery = &deployment.lottery;
    let fee = lottery.entrance_fee();

    let err = lottery.enter(&player_account(0), fee - 1).unwrap_err();
    assert!(matches!(
        err,
        LotteryError::EntranceFeeNotMet { sent, required }
            if sent == fee - 1 && required == fee
    ));
    assert_eq!(lottery.num_players(), 0);
}

#[tokio::test]
async fn records_players_when_they_enter() {
    let deployment = deploy_fixture().await;
    let lottery = &deployment.lottery;
    let fee = lottery.entrance_fee();
    let player = player_account(0);

    lottery.enter(&player, fee).unwrap();

    assert_eq!(lottery.player(0).unwrap(), player);
    assert_eq!(lottery.num_players(), 1);
    assert_eq!(lottery.pot(), fee);
    assert_eq!(
        deployment.chain.balance(&player),
        FIXTURE_ACCOUNT_BALANCE_WEI - fee
    );
}

#[tokio::test]
async fn emits_event_on_enter() {
    let deployment = deploy_fixture().await;
    let lottery = &deployment.lottery;
    let fee = lottery.entrance_fee();
    let mut events = lottery.subscribe();

    lottery.enter(&player_account(0), fee).unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(
        event,
        LotteryEvent::Entered {
            player: player_account(0),
            value_wei: fee,
        }
    );
}

#[tokio::test]
async fn rejects_entry_while_calculating() {
    let deployment = deploy_fixture().await;
    let lottery = &deployment.lottery;
    let fee = lottery.entrance_fee();

    make_upkeep_eligible(&deployment, 1);
    lottery.perform_upkeep().await.unwrap();
    assert_eq!(lottery.state(), LotteryState::Calculating);

    let err = lottery.enter(&player_account(1), fee).unwrap_err();
    assert!(matches!(
        err,
        LotteryError::NotOpen(LotteryState::Calculating)
    ));
}

#[tokio::test]
async fn upkeep_not_needed_without_entries() {
    let deployment = deploy_fixture().await;
    let lottery = &deployment.lottery;

    deployment
        .chain
        .advance_time(lottery.interval().as_secs() + 1);

    let status = lottery.check_upkeep();
    assert!(status.is_open);
    assert!(status.interval_elapsed);
    assert!(!status.has_players);
    assert!(!status.is_funded);
    assert!(!status.upkeep_needed());
}

#[tokio::test]
async fn upkeep_not_needed_while_calculating() {
    let deployment = deploy_fixture().await;
    let lottery = &deployment.lottery;

    make_upkeep_eligible(&deployment, 1);
    lottery.perform_upkeep().await.unwrap();

    assert_eq!(lottery.state(), LotteryState::Calculating);
    let status = lottery.check_upkeep();
    assert!(!status.is_open);
    assert!(!status.upkeep_needed());
}

#[tokio::test]
async fn upkeep_not_needed_before_interval_elapses() {
    let deployment = deploy_fixture().await;
    let lottery = &deployment.lottery;
    let fee = lottery.entrance_fee();

    lottery.enter(&player_account(0), fee).unwrap();

    let status = lottery.check_upkeep();
    assert!(status.is_open);
    assert!(status.has_players);
    assert!(status.is_funded);
    assert!(!status.interval_elapsed);
    assert!(!status.upkeep_needed());
}

#[tokio::test]
async fn perform_upkeep_runs_when_upkeep_needed() {
    let deployment = deploy_fixture().await;

    make_upkeep_eligible(&deployment, 1);
    let request_id = deployment.lottery.perform_upkeep().await.unwrap();
    assert!(request_id > 0);
}

#[tokio::test]
async fn perform_upkeep_rejected_when_not_needed() {
    let deployment = deploy_fixture().await;

    let err = deployment.lottery.perform_upkeep().await.unwrap_err();
    assert!(matches!(
        err,
        LotteryError::UpkeepNotNeeded {
            pot: 0,
            players: 0,
            state: LotteryState::Open,
        }
    ));
    assert_eq!(deployment.lottery.state(), LotteryState::Open);
}

#[tokio::test]
async fn perform_upkeep_sets_calculating_and_emits_request_id() {
    let deployment = deploy_fixture().await;
    let lottery = &deployment.lottery;
    let mut events = lottery.subscribe();

    make_upkeep_eligible(&deployment, 1);
    let request_id = lottery.perform_upkeep().await.unwrap();

    assert_eq!(lottery.state(), LotteryState::Calculating);
    assert_eq!(lottery.last_request_id(), Some(request_id));

    // entry event first, then the draw request
    let entered = events.recv().await.unwrap();
    assert!(matches!(entered, LotteryEvent::Entered { .. }));
    let requested = events.recv().await.unwrap();
    assert_eq!(requested, LotteryEvent::WinnerRequested { request_id });
}

#[tokio::test]
async fn fulfillment_requires_an_existing_request() {
    let deployment = deploy_fixture().await;

    for bogus_id in [0, 1] {
        let err = deployment
            .coordinator
            .fulfill_random_words(bogus_id, deployment.lottery.as_ref())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoordinatorError::NonexistentRequest(id) if id == bogus_id
        ));
    }
}

#[tokio::test]
async fn fulfillment_picks_winner_resets_and_pays() {
    let deployment = deploy_fixture().await;
    let lottery = &deployment.lottery;
    let fee = lottery.entrance_fee();
    let player_count = 4;

    make_upkeep_eligible(&deployment, player_count);
    let start_timestamp = lottery.latest_timestamp();
    let pot = lottery.pot();
    assert_eq!(pot, fee * player_count as u128);

    let request_id = lottery.perform_upkeep().await.unwrap();
    deployment
        .coordinator
        .fulfill_random_words(request_id, lottery.as_ref())
        .await
        .unwrap();

    // lottery reset
    assert_eq!(lottery.state(), LotteryState::Open);
    assert_eq!(lottery.num_players(), 0);
    assert_eq!(lottery.pot(), 0);
    assert!(matches!(
        lottery.player(0).unwrap_err(),
        LotteryError::PlayerIndexOutOfBounds(0)
    ));
    assert!(lottery.latest_timestamp() > start_timestamp);

    // winner got the pot, losers only paid their fee
    let winner = lottery.recent_winner().expect("winner recorded");
    let entrants: Vec<String> = (0..player_count).map(player_account).collect();
    assert!(entrants.contains(&winner));
    for player in &entrants {
        let expected = if player == &winner {
            FIXTURE_ACCOUNT_BALANCE_WEI - fee + pot
        } else {
            FIXTURE_ACCOUNT_BALANCE_WEI - fee
        };
        assert_eq!(deployment.chain.balance(player), expected);
    }
}
