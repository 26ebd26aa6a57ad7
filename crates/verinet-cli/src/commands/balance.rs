// crates/verinet-cli/src/commands/balance.rs

use clap::Args;

use verinet_core::digest::Address;
use verinet_economics::Vnt;

use crate::context::Context;
use crate::output::{format_json, OutputFormat};

#[derive(Debug, Args)]
pub struct BalanceCmd {
    /// Address to query; the operator's own address when omitted.
    #[arg(long)]
    pub address: Option<String>,
}

pub async fn run(ctx: &Context, cmd: &BalanceCmd) -> Result<(), Box<dyn std::error::Error>> {
    let address: Address = match &cmd.address {
        Some(addr) => addr.parse()?,
        None => ctx.load_key()?.address(),
    };
    let engine = ctx.reward_engine();
    let balance = engine.balance_of(address).await?;
    let pool = engine.pool_balance().await?;

    match ctx.format {
        OutputFormat::Json => println!(
            "{}",
            format_json(&serde_json::json!({
                "address": address,
                "balance_wei": balance.to_string(),
                "pool": ctx.publisher.reward_pool(),
                "pool_balance_wei": pool.to_string(),
            }))
        ),
        OutputFormat::Table => {
            println!("{}: {} ({} wei)", address, Vnt::from_wei(balance), balance);
            println!(
                "Reward pool {}: {}",
                ctx.publisher.reward_pool(),
                Vnt::from_wei(pool)
            );
        }
    }
    Ok(())
}
