// crates/verinet-cli/src/commands/wallet.rs
//
// `verinet wallet {create, show}`: operator key management.

use std::fs;
use std::path::PathBuf;

use clap::Subcommand;

use verinet_core::crypto::Keypair;

use crate::config::expand_tilde;
use crate::context::read_key_file;

const DEFAULT_KEY_PATH: &str = "~/.verinet/keys/signing.key";

/// Wallet management subcommands.
#[derive(Debug, Subcommand)]
pub enum WalletCmd {
    /// Generate a new ed25519 key and print its address.
    Create {
        /// Where to write the hex-encoded secret seed.
        #[arg(long, default_value = DEFAULT_KEY_PATH)]
        key: String,
        /// Overwrite an existing key file.
        #[arg(long)]
        force: bool,
    },
    /// Print the address and public key of a key file.
    Show {
        #[arg(long, default_value = DEFAULT_KEY_PATH)]
        key: String,
    },
}

/// Run the wallet subcommand.
pub async fn run(cmd: &WalletCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        WalletCmd::Create { key, force } => create_wallet(key, *force),
        WalletCmd::Show { key } => show_wallet(key),
    }
}

fn create_wallet(key: &str, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = PathBuf::from(expand_tilde(key));
    if path.exists() && !force {
        return Err(format!(
            "{} already exists; pass --force to replace it",
            path.display()
        )
        .into());
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let keypair = Keypair::generate();
    fs::write(&path, keypair.secret_hex())?;
    tracing::info!("Wrote new signing key to {}", path.display());

    println!("Wallet created successfully.");
    println!("  Address:    {}", keypair.address());
    println!("  Public key: 0x{}", hex_encode(&keypair.public_key_bytes()));
    println!("  Saved to:   {}", path.display());
    println!();
    println!("IMPORTANT: Back up your secret key file securely.");

    Ok(())
}

fn show_wallet(key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = PathBuf::from(expand_tilde(key));
    let keypair = read_key_file(&path)?;
    println!("Address:    {}", keypair.address());
    println!("Public key: 0x{}", hex_encode(&keypair.public_key_bytes()));
    Ok(())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
