// crates/verinet-cli/src/main.rs
//
// CLI entrypoint for VeriNet.
//
// Provides subcommands for key management, signing and revoking accuracy
// claims, aggregating them into published results, administering the
// participant registry, and paying validator rewards.

mod commands;
mod config;
mod context;
mod output;

use clap::{Parser, Subcommand};
use commands::aggregate::AggregateCmd;
use commands::balance::BalanceCmd;
use commands::claim::ClaimCmd;
use commands::fund::FundCmd;
use commands::participant::ParticipantCmd;
use commands::results::ResultsCmd;
use commands::reward::RewardCmd;
use commands::wallet::WalletCmd;

use crate::config::VeriNetConfig;
use crate::context::Context;
use crate::output::OutputFormat;

/// VeriNet CLI: validator consensus on content accuracy.
#[derive(Parser, Debug)]
#[command(
    name = "verinet",
    version = "0.1.0",
    about = "VeriNet CLI: sign accuracy claims, publish aggregated attestations, pay rewards"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "~/.verinet/config.toml")]
    config: String,

    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Key management: create, show.
    #[command(subcommand)]
    Wallet(WalletCmd),

    /// Accuracy claims: sign, verify, revoke.
    #[command(subcommand)]
    Claim(ClaimCmd),

    /// Aggregate claims for a subject and publish the result.
    Aggregate(AggregateCmd),

    /// Participant registry: register, set-active, list.
    #[command(subcommand)]
    Participant(ParticipantCmd),

    /// Pay a validator for a published result.
    Reward(RewardCmd),

    /// Mint VNT into the reward pool (admin only).
    Fund(FundCmd),

    /// Token balance of an address and of the reward pool.
    Balance(BalanceCmd),

    /// List published results or paid rewards.
    Results(ResultsCmd),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Key management works before any configuration exists.
    if let Commands::Wallet(cmd) = &cli.command {
        init_tracing("info");
        return commands::wallet::run(cmd).await;
    }

    let config = VeriNetConfig::load(&cli.config)?;
    init_tracing(&config.log_level);
    let settings = config.validate()?;

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };
    let ctx = Context::open(settings, format).await?;

    match &cli.command {
        Commands::Wallet(_) => Ok(()),
        Commands::Claim(cmd) => commands::claim::run(&ctx, cmd).await,
        Commands::Aggregate(cmd) => commands::aggregate::run(&ctx, cmd).await,
        Commands::Participant(cmd) => commands::participant::run(&ctx, cmd).await,
        Commands::Reward(cmd) => commands::reward::run(&ctx, cmd).await,
        Commands::Fund(cmd) => commands::fund::run(&ctx, cmd).await,
        Commands::Balance(cmd) => commands::balance::run(&ctx, cmd).await,
        Commands::Results(cmd) => commands::results::run(&ctx, cmd).await,
    }
}

/// Logs go to stderr so `--json` output stays parseable.
fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}
