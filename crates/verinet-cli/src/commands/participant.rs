// crates/verinet-cli/src/commands/participant.rs

use clap::Subcommand;

use verinet_core::digest::Address;
use verinet_core::participant::ParticipantRole;

use crate::context::Context;
use crate::output::{print_rows, ParticipantRow};

/// Participant registry subcommands. Mutations are signed off by the
/// operator key, which must belong to a configured admin.
#[derive(Debug, Subcommand)]
pub enum ParticipantCmd {
    /// Enroll an address as a provider or validator.
    Register {
        #[arg(long)]
        address: String,
        /// `provider` or `validator`.
        #[arg(long)]
        role: String,
    },
    /// Activate or deactivate a registered participant.
    SetActive {
        #[arg(long)]
        address: String,
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// List participants in registration order.
    List,
}

pub async fn run(ctx: &Context, cmd: &ParticipantCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ParticipantCmd::Register { address, role } => {
            let address: Address = address.parse()?;
            let role: ParticipantRole = role.parse()?;
            let requested_by = ctx.load_key()?.address();
            let participant = ctx.registry.register(address, role, requested_by).await?;
            println!("Registered {} as {}", participant.address, participant.role);
        }
        ParticipantCmd::SetActive { address, active } => {
            let address: Address = address.parse()?;
            let requested_by = ctx.load_key()?.address();
            ctx.registry.set_active(address, *active, requested_by).await?;
            println!(
                "{} is now {}",
                address,
                if *active { "active" } else { "inactive" }
            );
        }
        ParticipantCmd::List => {
            let participants = ctx.registry.list().await;
            if participants.is_empty() {
                println!("No participants registered.");
            } else {
                print_rows(ctx.format, &participants, |p| ParticipantRow::from(p));
            }
        }
    }
    Ok(())
}
