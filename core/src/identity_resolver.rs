//! Identity Resolver: derive a grouping key for "probably the same person"
//! from one accused row, absent a normalised person table.
//!
//! Fallback chain, first non-blank wins:
//!   1. mobile number, trimmed
//!   2. national ID number, trimmed
//!   3. name, exactly as entered (case-sensitive)
//!
//! Known weaknesses, kept on purpose:
//!   - Trimming is the only normalisation. "+91 9990001111" and "9990001111"
//!     are different people here.
//!   - Rows with no mobile, no national ID and a blank name all share the
//!     single blank fingerprint.
//!
//! A fingerprint is a grouping key only. It is not a verified person
//! identifier and must not be stored as one.

use crate::{model::AccusedRecord, types::non_blank};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which link of the fallback chain produced a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityBasis {
    Mobile,
    NationalId,
    Name,
    Blank,
}

impl IdentityBasis {
    fn prefix(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::NationalId => "national_id",
            Self::Name => "name",
            Self::Blank => "blank",
        }
    }
}

/// Never empty: the basis prefix is always present.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    key: String,
    basis: IdentityBasis,
}

impl Fingerprint {
    fn new(basis: IdentityBasis, value: &str) -> Self {
        Self {
            key: format!("{}:{value}", basis.prefix()),
            basis,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn basis(&self) -> IdentityBasis {
        self.basis
    }

    pub fn is_blank(&self) -> bool {
        self.basis == IdentityBasis::Blank
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Compute the identity fingerprint of one accused row. Total and pure.
pub fn fingerprint(accused: &AccusedRecord) -> Fingerprint {
    if let Some(mobile) = non_blank(accused.mobile.as_deref()) {
        return Fingerprint::new(IdentityBasis::Mobile, mobile);
    }
    if let Some(national_id) = non_blank(accused.national_id.as_deref()) {
        return Fingerprint::new(IdentityBasis::NationalId, national_id);
    }
    match accused.name.as_deref() {
        Some(name) if !name.trim().is_empty() => Fingerprint::new(IdentityBasis::Name, name),
        _ => Fingerprint::new(IdentityBasis::Blank, ""),
    }
}
