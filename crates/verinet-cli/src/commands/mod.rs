// crates/verinet-cli/src/commands/mod.rs
//
// One module per `verinet` subcommand.

pub mod aggregate;
pub mod balance;
pub mod claim;
pub mod fund;
pub mod participant;
pub mod results;
pub mod reward;
pub mod wallet;

use std::fs;
use std::path::Path;

use verinet_core::claim::{Claim, ClaimDocument};
use verinet_core::content::{ContentClaim, ContentClaimDocument};
use verinet_core::digest::SubjectId;
use verinet_core::error::VeriNetError;

/// Resolve a subject from either an explicit id or the content it hashes.
pub(crate) fn resolve_subject(
    subject: Option<&str>,
    content: Option<&str>,
) -> Result<SubjectId, VeriNetError> {
    match (subject, content) {
        (Some(id), None) => id.parse(),
        (None, Some(text)) => Ok(SubjectId::from_content(text.as_bytes())),
        _ => Err(VeriNetError::Validation(
            "pass exactly one of --subject or --content".to_string(),
        )),
    }
}

/// Read a claim document written by `verinet claim sign`.
pub(crate) fn read_claim(path: &Path) -> Result<Claim, VeriNetError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        VeriNetError::NotFound(format!("cannot read claim {}: {}", path.display(), e))
    })?;
    let document: ClaimDocument = serde_json::from_str(&contents)?;
    Ok(Claim::try_from(document)?)
}

/// Read a content claim document written by `verinet claim register-content`.
pub(crate) fn read_content_claim(path: &Path) -> Result<ContentClaim, VeriNetError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        VeriNetError::NotFound(format!("cannot read content claim {}: {}", path.display(), e))
    })?;
    let document: ContentClaimDocument = serde_json::from_str(&contents)?;
    Ok(ContentClaim::try_from(document)?)
}
