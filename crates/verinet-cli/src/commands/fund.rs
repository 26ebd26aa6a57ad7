// crates/verinet-cli/src/commands/fund.rs

use clap::Args;

use verinet_economics::Vnt;

use crate::context::Context;

/// Mint VNT into the reward pool. Requires an admin operator key.
#[derive(Debug, Args)]
pub struct FundCmd {
    /// Amount in VNT, e.g. `1000` or `0.5`.
    #[arg(long)]
    pub amount: String,
}

pub async fn run(ctx: &Context, cmd: &FundCmd) -> Result<(), Box<dyn std::error::Error>> {
    let amount: Vnt = cmd.amount.parse()?;
    let requested_by = ctx.load_key()?.address();
    let engine = ctx.reward_engine();

    let confirmation = engine.fund(amount.wei, requested_by).await?;
    let pool = Vnt::from_wei(engine.pool_balance().await?);

    println!(
        "Minted {} into pool {} (tx {}, block {})",
        amount,
        ctx.publisher.reward_pool(),
        confirmation.tx_id,
        confirmation.block
    );
    println!("Pool balance: {}", pool);
    Ok(())
}
