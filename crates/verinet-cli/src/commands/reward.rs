// crates/verinet-cli/src/commands/reward.rs
//
// `verinet reward`: pay a validator for its part in a published result.
//
// Only a registered validator whose claim went into the confirmed result can
// be paid for it. The operator key must belong to an admin.

use clap::Args;

use verinet_core::aggregation::AggregationResult;
use verinet_core::digest::{Address, ResultRef};
use verinet_core::error::VeriNetError;
use verinet_core::participant::ParticipantRole;
use verinet_core::traits::ResultStore;
use verinet_economics::Vnt;

use crate::context::Context;
use crate::output::{format_json, OutputFormat};

#[derive(Debug, Args)]
pub struct RewardCmd {
    #[arg(long)]
    pub validator: String,
    /// Published result the validator contributed to.
    #[arg(long)]
    pub result: String,
    /// Reward tier to pay.
    #[arg(long, conflicts_with = "accuracy", required_unless_present = "accuracy")]
    pub tier: Option<u8>,
    /// Derive the tier from a validator accuracy score instead.
    #[arg(long)]
    pub accuracy: Option<u8>,
}

pub async fn run(ctx: &Context, cmd: &RewardCmd) -> Result<(), Box<dyn std::error::Error>> {
    let validator: Address = cmd.validator.parse()?;
    let result: ResultRef = cmd.result.parse()?;
    let tier = match (cmd.tier, cmd.accuracy) {
        (Some(tier), _) => tier,
        (None, Some(accuracy)) => ctx.settings.tier_policy.tier_for(accuracy),
        (None, None) => {
            return Err(VeriNetError::Validation("pass --tier or --accuracy".to_string()).into())
        }
    };

    qualifying_result(ctx, &validator, &result).await?;
    let admin = ctx.load_key()?;

    let record = ctx
        .reward_engine()
        .reward(validator, tier, result, admin.address())
        .await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&record)),
        OutputFormat::Table => {
            println!(
                "Paid {} to {} (tier {})",
                Vnt::from_wei(record.amount),
                record.validator,
                record.tier
            );
            println!(
                "Transfer {} confirmed in block {}",
                record.confirmation.tx_id, record.confirmation.block
            );
        }
    }
    Ok(())
}

/// The confirmed result `result`, provided `validator` is a registered
/// validator among its contributors.
async fn qualifying_result(
    ctx: &Context,
    validator: &Address,
    result: &ResultRef,
) -> Result<AggregationResult, VeriNetError> {
    let published = ctx
        .store
        .get_result(result)
        .await?
        .ok_or_else(|| VeriNetError::NotFound(format!("no published result {}", result)))?;
    if !published.is_published() {
        return Err(VeriNetError::Validation(format!("result {} is not confirmed", result)));
    }

    match ctx.registry.get(validator).await {
        Some(p) if p.role == ParticipantRole::Validator => {}
        Some(p) => {
            return Err(VeriNetError::Validation(format!(
                "{} is registered as a {}, not a validator",
                validator, p.role
            )))
        }
        None => return Err(VeriNetError::NotFound(format!("no participant {}", validator))),
    }

    if !published.has_contributor(validator) {
        return Err(VeriNetError::Validation(format!(
            "{} has no claim in result {}",
            validator, result
        )));
    }
    Ok(published)
}
