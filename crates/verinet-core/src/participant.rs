// crates/verinet-core/src/participant.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::Address;
use crate::error::VeriNetError;

/// Role a participant is enrolled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    /// Submits content for validation.
    Provider,
    /// Signs accuracy claims about content.
    Validator,
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantRole::Provider => write!(f, "provider"),
            ParticipantRole::Validator => write!(f, "validator"),
        }
    }
}

impl FromStr for ParticipantRole {
    type Err = VeriNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "provider" | "contributor" => Ok(ParticipantRole::Provider),
            "validator" => Ok(ParticipantRole::Validator),
            other => Err(VeriNetError::Validation(format!(
                "unknown participant role '{}'",
                other
            ))),
        }
    }
}

/// An address enrolled as a content provider or validator.
///
/// Participants are never removed; they are deactivated instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub address: Address,
    pub role: ParticipantRole,
    pub active: bool,
    pub registered_at: DateTime<Utc>,
}

impl Participant {
    pub fn is_active_validator(&self) -> bool {
        self.active && self.role == ParticipantRole::Validator
    }

    pub fn is_active_provider(&self) -> bool {
        self.active && self.role == ParticipantRole::Provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("Validator".parse::<ParticipantRole>().unwrap(), ParticipantRole::Validator);
        assert_eq!("provider".parse::<ParticipantRole>().unwrap(), ParticipantRole::Provider);
        assert_eq!("contributor".parse::<ParticipantRole>().unwrap(), ParticipantRole::Provider);
        assert!("admin".parse::<ParticipantRole>().is_err());
    }

    #[test]
    fn test_only_active_validators_qualify() {
        let mut p = Participant {
            address: Address([1u8; 20]),
            role: ParticipantRole::Validator,
            active: true,
            registered_at: Utc::now(),
        };
        assert!(p.is_active_validator());
        p.active = false;
        assert!(!p.is_active_validator());
        p.active = true;
        p.role = ParticipantRole::Provider;
        assert!(!p.is_active_validator());
    }
}
