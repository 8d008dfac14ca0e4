//! Tombola CLI
//!
//! Deploys a lottery on the local dev chain, or runs a full demo round
//! with the keeper and VRF responder standing in for the off-chain
//! services.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tombola::deploy::{player_account, FIXTURE_PLAYER_COUNT};
use tombola::{
    builtin_profile, deploy, fixture, spawn_keeper, spawn_vrf_responder, ConfigLoader, LocalChain,
    LotteryEvent, DEV_CHAIN_ID,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tombola", about = "Provably fair interval lottery", version)]
struct Cli {
    /// Path to a TOML profile configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy a lottery and print the deployment record
    Deploy {
        #[arg(long, default_value_t = DEV_CHAIN_ID)]
        chain_id: u64,
    },
    /// Run one full round end-to-end on the dev chain
    Demo {
        /// Number of players entering the round
        #[arg(long, default_value_t = 4)]
        players: usize,
    },
    /// Write the built-in profiles to a TOML file
    SampleConfig { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Deploy { chain_id } => run_deploy(chain_id, cli.config.as_deref()).await,
        Command::Demo { players } => run_demo(players).await,
        Command::SampleConfig { path } => {
            tombola::config::generate_sample_config(&path.to_string_lossy())?;
            println!("sample configuration written to {}", path.display());
            Ok(())
        }
    }
}

async fn run_deploy(
    chain_id: u64,
    config_path: Option<&std::path::Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let profile = match config_path {
        Some(path) => ConfigLoader::new()
            .with_path(path)
            .load()?
            .profile_for_chain(chain_id)?,
        None => builtin_profile(chain_id)?,
    };

    let chain = Arc::new(LocalChain::new(chain_id));
    let deployment = deploy(&profile, chain).await?;

    println!("{}", serde_json::to_string_pretty(&deployment.record)?);
    Ok(())
}

async fn run_demo(players: usize) -> Result<(), Box<dyn std::error::Error>> {
    let deployment = fixture(DEV_CHAIN_ID).await?;
    let lottery = deployment.lottery.clone();
    let fee = lottery.entrance_fee();

    let keeper = spawn_keeper(lottery.clone(), Duration::from_millis(100));
    let responder = spawn_vrf_responder(deployment.coordinator.clone(), lottery.clone());
    let mut events = lottery.subscribe();

    for index in 0..players {
        let player = player_account(index);
        if index >= FIXTURE_PLAYER_COUNT {
            deployment
                .chain
                .fund_account(&player, tombola::WEI_PER_ETHER);
        }
        lottery.enter(&player, fee)?;
        println!("{} entered with {} wei", player, fee);
    }

    deployment
        .chain
        .advance_time(lottery.interval().as_secs() + 1);

    loop {
        let event = tokio::time::timeout(Duration::from_secs(10), events.recv()).await??;
        match event {
            LotteryEvent::WinnerRequested { request_id } => {
                println!("winner requested (request {})", request_id);
            }
            LotteryEvent::WinnerPicked {
                winner, payout_wei, ..
            } => {
                println!("winner: {} paid {} wei", winner, payout_wei);
                break;
            }
            LotteryEvent::Entered { .. } => {}
        }
    }

    keeper.shutdown();
    responder.shutdown();
    Ok(())
}
