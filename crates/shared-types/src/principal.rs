//! # Contract Principal
//!
//! `address.contract-name` pair uniquely identifying a deployed contract.
//! This is the primary join key for webhook dispatch: extensions are looked
//! up by the principal of the contract a transaction calls.

use crate::errors::PrincipalError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A fully-qualified contract identifier (`address.contract-name`).
///
/// Stored in canonical string form; the two components are validated to be
/// non-empty at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContractPrincipal(String);

impl ContractPrincipal {
    /// Parse and validate a principal from its canonical form.
    pub fn parse(raw: &str) -> Result<Self, PrincipalError> {
        let Some((address, name)) = raw.split_once('.') else {
            return Err(PrincipalError::MissingSeparator(raw.to_string()));
        };
        if address.is_empty() {
            return Err(PrincipalError::EmptyAddress(raw.to_string()));
        }
        if name.is_empty() || name.contains('.') {
            return Err(PrincipalError::InvalidContractName(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// The standard principal (address) component.
    #[must_use]
    pub fn address(&self) -> &str {
        // Validated at construction: a separator is always present.
        self.0.split_once('.').map(|(a, _)| a).unwrap_or(&self.0)
    }

    /// The contract name component.
    #[must_use]
    pub fn contract_name(&self) -> &str {
        self.0.split_once('.').map(|(_, n)| n).unwrap_or("")
    }

    /// Canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContractPrincipal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContractPrincipal {
    type Error = PrincipalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContractPrincipal> for String {
    fn from(value: ContractPrincipal) -> Self {
        value.0
    }
}
