// crates/verinet-economics/src/token.rs
//
// VNT reward token amounts.
//
// The smallest unit is the wei; 1 VNT = 10^18 wei, matching the ledger's
// 18-decimal token. Amounts are parsed and printed as exact decimals, never
// through floating point.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use verinet_core::error::VeriNetError;

/// Decimal places of the token.
pub const DECIMALS: u32 = 18;

/// Number of wei in one VNT.
pub const WEI_PER_VNT: u128 = 1_000_000_000_000_000_000;

/// Type alias for wei, the smallest unit of VNT.
pub type Wei = u128;

/// A VNT amount, held in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Vnt {
    pub wei: Wei,
}

impl Vnt {
    pub fn from_wei(wei: Wei) -> Self {
        Self { wei }
    }

    /// A whole number of tokens.
    pub fn from_tokens(tokens: u64) -> Self {
        Self {
            wei: u128::from(tokens) * WEI_PER_VNT,
        }
    }

    pub fn zero() -> Self {
        Self { wei: 0 }
    }
}

impl Add for Vnt {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            wei: self.wei.saturating_add(rhs.wei),
        }
    }
}

impl Sub for Vnt {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            wei: self.wei.saturating_sub(rhs.wei),
        }
    }
}

impl fmt::Display for Vnt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.wei / WEI_PER_VNT;
        let frac = self.wei % WEI_PER_VNT;
        if frac == 0 {
            write!(f, "{} VNT", whole)
        } else {
            let frac_str = format!("{:018}", frac);
            write!(f, "{}.{} VNT", whole, frac_str.trim_end_matches('0'))
        }
    }
}

/// Parses a token amount such as `"25"`, `"0.5"` or `"1.25 VNT"`.
impl FromStr for Vnt {
    type Err = VeriNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VeriNetError::Validation(format!("invalid token amount '{}'", s));

        let body = s.trim();
        let body = body.strip_suffix("VNT").unwrap_or(body).trim();
        let (whole, frac) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac.len() > DECIMALS as usize {
            return Err(VeriNetError::Validation(format!(
                "token amount '{}' has more than {} decimals",
                s, DECIMALS
            )));
        }

        let whole_wei = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<u128>()
                .ok()
                .and_then(|w| w.checked_mul(WEI_PER_VNT))
                .ok_or_else(invalid)?
        };
        let frac_wei = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = DECIMALS as usize);
            padded.parse::<u128>().map_err(|_| invalid())?
        };

        whole_wei
            .checked_add(frac_wei)
            .map(Vnt::from_wei)
            .ok_or_else(invalid)
    }
}
