// crates/verinet-cli/src/commands/claim.rs
//
// `verinet claim {sign, verify, revoke}`: individual accuracy claims.
// `verinet claim {register-content, verify-content}`: provider content-hash claims.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::Subcommand;

use verinet_core::claim::{ClaimDocument, ClaimOptions, ClaimSigner};
use verinet_core::content::{ContentClaim, ContentClaimDocument};
use verinet_core::digest::{ClaimRef, SubjectId};
use verinet_core::error::VeriNetError;
use verinet_store::{archive_claim, archive_content_claim};

use crate::commands::{read_claim, read_content_claim, resolve_subject};
use crate::context::Context;
use crate::output::{format_json, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ClaimCmd {
    /// Sign an accuracy claim about a piece of content.
    Sign {
        /// Subject id (0x-prefixed SHA-256 of the content).
        #[arg(long, conflicts_with = "content")]
        subject: Option<String>,
        /// The content itself; its SHA-256 becomes the subject id.
        #[arg(long)]
        content: Option<String>,
        /// Accuracy, 0 to 100.
        #[arg(long, allow_negative_numbers = true)]
        accuracy: i64,
        /// Lifetime in seconds; the claim never expires when omitted.
        #[arg(long)]
        expires_in: Option<u64>,
        /// Sign the claim as non-revocable.
        #[arg(long)]
        non_revocable: bool,
        /// Pin the nonce instead of taking the next one.
        #[arg(long)]
        nonce: Option<u64>,
        /// Prior claim this one refines.
        #[arg(long)]
        ref_claim: Option<String>,
        /// Write the claim document here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check a claim document's signature, expiry and revocation.
    Verify {
        #[arg(long)]
        file: PathBuf,
    },
    /// Revoke one of your own claims.
    Revoke {
        #[arg(long)]
        file: PathBuf,
    },
    /// Register the hash of content you are submitting, as a provider.
    RegisterContent {
        #[arg(long, conflicts_with = "content")]
        subject: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check a content claim document's signature and schema.
    VerifyContent {
        #[arg(long)]
        file: PathBuf,
    },
}

pub async fn run(ctx: &Context, cmd: &ClaimCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ClaimCmd::Sign {
            subject,
            content,
            accuracy,
            expires_in,
            non_revocable,
            nonce,
            ref_claim,
            out,
        } => {
            let subject = resolve_subject(subject.as_deref(), content.as_deref())?;
            let ref_claim = ref_claim
                .as_deref()
                .map(str::parse::<ClaimRef>)
                .transpose()?;
            let key = ctx.load_key()?;
            let issuer = key.address();

            let signer =
                ClaimSigner::with_starting_nonce(ctx.settings.accuracy_schema, ctx.next_nonce(&issuer)?);
            let opts = ClaimOptions {
                expiration: expires_in.map(Duration::from_secs),
                revocable: !*non_revocable,
                nonce: *nonce,
                ref_claim,
                issued_at: None,
            };
            let claim = signer.sign(subject, *accuracy, issuer, &key, opts)?;
            ctx.record_nonce(&issuer, claim.nonce)?;
            tracing::info!("Signed claim {} (nonce {})", claim.uid(), claim.nonce);

            if let Some(archive) = &ctx.archive {
                if let Some(cid) = archive_claim(archive.as_ref(), &claim).await {
                    eprintln!("Archived at {}", cid);
                }
            }

            let document = format_json(&ClaimDocument::from(claim.clone()));
            match out {
                Some(path) => {
                    fs::write(path, document)?;
                    println!("Claim {} written to {}", claim.uid(), path.display());
                }
                None => println!("{}", document),
            }
            Ok(())
        }

        ClaimCmd::Verify { file } => {
            let claim = read_claim(file)?;
            let uid = claim.uid();
            let valid = claim.verify();
            let expired = claim.is_expired(Utc::now().timestamp().max(0) as u64);
            let revoked = ctx.revocations().is_revoked(&uid).await?;

            match ctx.format {
                OutputFormat::Json => println!(
                    "{}",
                    format_json(&serde_json::json!({
                        "uid": uid,
                        "issuer": claim.issuer,
                        "accuracy": claim.accuracy,
                        "valid": valid,
                        "expired": expired,
                        "revoked": revoked,
                    }))
                ),
                OutputFormat::Table => {
                    println!("Claim:     {}", uid);
                    println!("Issuer:    {}", claim.issuer);
                    println!("Subject:   {}", claim.subject);
                    println!("Accuracy:  {}", claim.accuracy);
                    println!("Signature: {}", if valid { "valid" } else { "INVALID" });
                    println!("Expired:   {}", expired);
                    println!("Revoked:   {}", revoked);
                }
            }

            if !valid {
                return Err(VeriNetError::Validation(format!("claim {} does not verify", uid)).into());
            }
            Ok(())
        }

        ClaimCmd::Revoke { file } => {
            let claim = read_claim(file)?;
            let key = ctx.load_key()?;
            if ctx.revocations().revoke(&claim, key.address()).await? {
                println!("Revoked claim {}", claim.uid());
            } else {
                println!("Claim {} was already revoked", claim.uid());
            }
            Ok(())
        }

        ClaimCmd::RegisterContent {
            subject,
            content,
            out,
        } => {
            let subject = resolve_subject(subject.as_deref(), content.as_deref())?;
            let claim = register_content(ctx, subject).await?;

            if let Some(archive) = &ctx.archive {
                if let Some(cid) = archive_content_claim(archive.as_ref(), &claim).await {
                    eprintln!("Archived at {}", cid);
                }
            }

            let document = format_json(&ContentClaimDocument::from(claim.clone()));
            match out {
                Some(path) => {
                    fs::write(path, document)?;
                    println!("Content claim {} written to {}", claim.uid(), path.display());
                }
                None => println!("{}", document),
            }
            Ok(())
        }

        ClaimCmd::VerifyContent { file } => {
            let claim = read_content_claim(file)?;
            let uid = claim.uid();
            let valid = claim.verify();
            let schema_matches = ctx.settings.hash_schema == Some(claim.schema);

            match ctx.format {
                OutputFormat::Json => println!(
                    "{}",
                    format_json(&serde_json::json!({
                        "uid": uid,
                        "issuer": claim.issuer,
                        "hash": claim.subject,
                        "valid": valid,
                        "schemaMatches": schema_matches,
                    }))
                ),
                OutputFormat::Table => {
                    println!("Content claim: {}", uid);
                    println!("Provider:      {}", claim.issuer);
                    println!("Hash:          {}", claim.subject);
                    println!("Signature:     {}", if valid { "valid" } else { "INVALID" });
                    println!("Schema:        {}", if schema_matches { "ok" } else { "FOREIGN" });
                }
            }

            if !valid {
                return Err(VeriNetError::Validation(format!(
                    "content claim {} does not verify",
                    uid
                ))
                .into());
            }
            Ok(())
        }
    }
}

/// Sign a content claim for `subject` with the operator key, which must
/// belong to an active provider.
async fn register_content(ctx: &Context, subject: SubjectId) -> Result<ContentClaim, VeriNetError> {
    let schema = ctx.settings.hash_schema.ok_or_else(|| {
        VeriNetError::Configuration(
            "hash_schema_id is not configured; content registration is off".to_string(),
        )
    })?;
    let key = ctx.load_key()?;
    let issuer = key.address();
    if !ctx.registry.is_active_provider(&issuer).await {
        return Err(VeriNetError::Validation(format!(
            "{} is not an active provider",
            issuer
        )));
    }

    let signer = ClaimSigner::with_starting_nonce(schema, ctx.next_nonce(&issuer)?);
    let claim = signer.sign_content(subject, issuer, &key, ClaimOptions::default())?;
    ctx.record_nonce(&issuer, claim.nonce)?;
    tracing::info!("Registered content {} as {} (nonce {})", subject, claim.uid(), claim.nonce);
    Ok(claim)
}
