// crates/verinet-cli/src/commands/results.rs
//
// `verinet results`: published aggregation results and paid rewards.

use clap::Args;

use verinet_core::traits::ResultStore;

use crate::commands::resolve_subject;
use crate::context::Context;
use crate::output::{print_rows, ResultRow, RewardRow};

#[derive(Debug, Args)]
pub struct ResultsCmd {
    /// Only results for this subject id.
    #[arg(long, conflicts_with = "content")]
    pub subject: Option<String>,
    /// Only results for the subject this content hashes to.
    #[arg(long)]
    pub content: Option<String>,
    /// Show completed reward payouts instead of results.
    #[arg(long)]
    pub rewards: bool,
}

pub async fn run(ctx: &Context, cmd: &ResultsCmd) -> Result<(), Box<dyn std::error::Error>> {
    if cmd.rewards {
        let records = ctx.reward_engine().records().await?;
        if records.is_empty() {
            println!("No rewards paid.");
        } else {
            print_rows(ctx.format, &records, |r| RewardRow::from(r));
        }
        return Ok(());
    }

    let results = if cmd.subject.is_some() || cmd.content.is_some() {
        let subject = resolve_subject(cmd.subject.as_deref(), cmd.content.as_deref())?;
        ctx.pipeline().results_for(&subject).await?
    } else {
        ctx.store.list_results().await?
    };

    if results.is_empty() {
        println!("No results published.");
    } else {
        print_rows(ctx.format, &results, |r| ResultRow::from(r));
    }
    Ok(())
}
