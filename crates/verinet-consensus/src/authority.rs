// crates/verinet-consensus/src/authority.rs
//
// Role capabilities for privileged operations.

use std::collections::HashSet;

use verinet_core::digest::Address;
use verinet_core::error::VeriNetError;

/// Capabilities an address may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// May enroll participants, toggle their active flag and fund the reward pool.
    Admin,
}

/// Answers "does `who` hold `role`?".
pub trait Authority: Send + Sync {
    fn has_role(&self, who: &Address, role: Role) -> bool;
}

/// A fixed admin set loaded from configuration.
///
/// Addresses are compared as bytes, so `0xABCD…` and `0xabcd…` name the
/// same admin.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthority {
    admins: HashSet<Address>,
}

impl StaticAuthority {
    pub fn new(admins: impl IntoIterator<Item = Address>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    /// Parse admin addresses from their hex form.
    pub fn from_hex<S: AsRef<str>>(admins: &[S]) -> Result<Self, VeriNetError> {
        let parsed = admins
            .iter()
            .map(|s| {
                s.as_ref().parse::<Address>().map_err(|e| {
                    VeriNetError::Configuration(format!(
                        "admin address '{}' is invalid: {}",
                        s.as_ref(),
                        e
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(parsed))
    }

    pub fn admins(&self) -> impl Iterator<Item = &Address> {
        self.admins.iter()
    }
}

impl Authority for StaticAuthority {
    fn has_role(&self, who: &Address, role: Role) -> bool {
        match role {
            Role::Admin => self.admins.contains(who),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_match_ignores_case() {
        let lower = "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd";
        let authority = StaticAuthority::from_hex(&[lower.to_uppercase()]).unwrap();
        let who: Address = lower.parse().unwrap();
        assert!(authority.has_role(&who, Role::Admin));
        assert!(!authority.has_role(&Address([1; 20]), Role::Admin));
    }

    #[test]
    fn test_bad_admin_address_is_configuration_error() {
        let err = StaticAuthority::from_hex(&["0x1234"]).unwrap_err();
        assert!(matches!(err, VeriNetError::Configuration(_)));
    }
}
