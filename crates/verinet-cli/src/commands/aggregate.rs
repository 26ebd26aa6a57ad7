// crates/verinet-cli/src/commands/aggregate.rs
//
// `verinet aggregate`: combine validator claims into a published result.

use std::path::PathBuf;

use clap::Args;

use crate::commands::{read_claim, resolve_subject};
use crate::context::Context;
use crate::output::{format_json, OutputFormat};

#[derive(Debug, Args)]
pub struct AggregateCmd {
    #[arg(long, conflicts_with = "content")]
    pub subject: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
    /// Claim documents to aggregate.
    #[arg(long, num_args = 1.., required = true)]
    pub claims: Vec<PathBuf>,
    /// Acceptance threshold; the configured default when omitted.
    #[arg(long)]
    pub threshold: Option<u8>,
}

pub async fn run(ctx: &Context, cmd: &AggregateCmd) -> Result<(), Box<dyn std::error::Error>> {
    let subject = resolve_subject(cmd.subject.as_deref(), cmd.content.as_deref())?;
    let claims = cmd
        .claims
        .iter()
        .map(|path| read_claim(path))
        .collect::<Result<Vec<_>, _>>()?;
    let threshold = cmd.threshold.unwrap_or(ctx.settings.default_threshold);

    let result = ctx.pipeline().run(subject, &claims, threshold).await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&result)),
        OutputFormat::Table => {
            println!("Result:    {}", result.id);
            println!("Subject:   {}", result.subject);
            println!("Claims:    {}", result.claims.len());
            println!("Mean:      {}", result.mean_accuracy);
            println!("Threshold: {}", result.threshold);
            println!(
                "Decision:  {}",
                if result.decision { "accept" } else { "reject" }
            );
            if let Some(confirmation) = &result.confirmation {
                println!(
                    "Attested:  {} (block {})",
                    confirmation.tx_id, confirmation.block
                );
            }
        }
    }
    Ok(())
}
