//! Typed token registry keyed by symbol

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::error::SwapError;
use crate::types::CoinType;

/// A tradeable coin: user-facing symbol plus its on-chain type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    symbol: String,
    coin_type: CoinType,
}

impl Token {
    pub fn new(symbol: impl Into<String>, coin_type: CoinType) -> Self {
        Self {
            symbol: symbol.into(),
            coin_type,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn coin_type(&self) -> &CoinType {
        &self.coin_type
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Symbol -> token table, validated when it is built
///
/// Every entry's type identifier has been parsed, so later lookups only fail
/// for symbols that were never configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>")]
pub struct TokenRegistry {
    tokens: BTreeMap<String, Token>,
}

impl TokenRegistry {
    pub fn from_mapping<I, S, T>(mapping: I) -> Result<Self, SwapError>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: AsRef<str>,
    {
        let mut tokens = BTreeMap::new();
        for (symbol, type_tag) in mapping {
            let symbol: String = symbol.into();
            if symbol.is_empty() || symbol.chars().any(char::is_whitespace) {
                return Err(SwapError::Config(format!("invalid token symbol `{symbol}`")));
            }
            let coin_type: CoinType = type_tag.as_ref().parse()?;
            tokens.insert(symbol.clone(), Token::new(symbol, coin_type));
        }
        Ok(Self { tokens })
    }

    /// Look up a configured token, rejecting unknown symbols
    pub fn get(&self, symbol: &str) -> Result<&Token, SwapError> {
        self.tokens
            .get(symbol)
            .ok_or_else(|| SwapError::UnknownToken(symbol.to_string()))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.tokens.contains_key(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TryFrom<BTreeMap<String, String>> for TokenRegistry {
    type Error = SwapError;

    fn try_from(value: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_mapping(value)
    }
}

/// Two distinct tokens in the caller's trade direction
///
/// The pair says nothing about how the pool orders the coins on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    from: Token,
    to: Token,
}

impl TokenPair {
    pub fn new(from: Token, to: Token) -> Result<Self, SwapError> {
        if from.coin_type() == to.coin_type() {
            return Err(SwapError::InvalidPair(format!(
                "{} and {} are the same coin",
                from.symbol(),
                to.symbol()
            )));
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> &Token {
        &self.from
    }

    pub fn to(&self) -> &Token {
        &self.to
    }

    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}
