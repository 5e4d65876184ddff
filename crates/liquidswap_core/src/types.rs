//! Ledger identifiers: account addresses, coin types and transaction hashes

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::SwapError;

/// Hex account address, normalised to lowercase with a `0x` prefix
///
/// Leading zeros are dropped, so `0x01` and `0x1` are the same account. The
/// fullnode accepts the short form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct AccountAddress(String);

impl AccountAddress {
    /// Wrap a compile-time constant known to be valid hex
    pub(crate) fn from_trusted(address: &str) -> Self {
        Self::canonical(address.strip_prefix("0x").unwrap_or(address))
    }

    fn canonical(hex: &str) -> Self {
        let digits = hex.trim_start_matches('0');
        let digits = if digits.is_empty() { "0" } else { digits };
        Self(format!("0x{}", digits.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountAddress {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("0x")
            .ok_or_else(|| SwapError::InvalidAddress(s.to_string()))?;
        if hex.is_empty() || hex.len() > 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SwapError::InvalidAddress(s.to_string()));
        }
        Ok(Self::canonical(hex))
    }
}

impl TryFrom<String> for AccountAddress {
    type Error = SwapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully-qualified Move struct path, e.g. `0x1::aptos_coin::AptosCoin`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoinType {
    address: AccountAddress,
    path: String,
}

impl CoinType {
    /// Account that published the coin module (holds its `CoinInfo`)
    pub fn address(&self) -> &AccountAddress {
        &self.address
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl FromStr for CoinType {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SwapError::InvalidTypeTag(s.to_string());
        let s = s.trim();

        let (address, rest) = s.split_once("::").ok_or_else(invalid)?;
        let address: AccountAddress = address.parse().map_err(|_| invalid())?;

        // Generic arguments are kept verbatim but must be balanced
        let (head, generics) = match rest.find('<') {
            Some(idx) => (&rest[..idx], Some(&rest[idx..])),
            None => (rest, None),
        };
        if let Some(g) = generics {
            let opens = g.matches('<').count();
            let closes = g.matches('>').count();
            if !g.ends_with('>') || opens != closes {
                return Err(invalid());
            }
        }

        let (module, name) = head.split_once("::").ok_or_else(invalid)?;
        if !is_identifier(module) || !is_identifier(name) {
            return Err(invalid());
        }

        Ok(Self {
            address,
            path: rest.to_string(),
        })
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.address, self.path)
    }
}

/// Hash of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionHash(pub String);

impl TransactionHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
