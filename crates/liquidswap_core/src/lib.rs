//! Liquidswap Core - Quoting and swap orchestration for Liquidswap pools
//!
//! Prices trades against Liquidswap's uncorrelated constant-product pools and
//! drives the swap transaction flow for a single account:
//!
//! - Pool discovery with explicit `(X, Y)` / `(Y, X)` orientation probing
//! - Decimal conversion from on-chain `CoinInfo` precision, cached per coin
//! - Coin registration before the first receipt of a token
//! - Quote, register, build, submit and confirm, with the minimum output
//!   enforced on-chain
//!
//! Transport and key custody live behind [`LedgerClient`] and [`Signer`];
//! this crate performs no I/O of its own.

pub mod config;
pub mod decimals;
pub mod error;
pub mod ledger;
pub mod pool;
pub mod registration;
pub mod swap;
pub mod tokens;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::SwapConfig;
pub use decimals::DecimalConverter;
pub use error::{LedgerError, SignerError, SwapError, SwapFailure, SwapStep};
pub use ledger::{
    EntryFunction, LedgerClient, RawTransaction, SignedTransaction, Signer, TransactionPayload,
    TransactionStatus,
};
pub use pool::{Orientation, PoolLookup, PoolResolver, PoolSnapshot};
pub use registration::RegistrationGuard;
pub use swap::{SwapClient, SwapQuote, SwapRequest};
pub use tokens::{Token, TokenPair, TokenRegistry};
pub use types::{AccountAddress, CoinType, TransactionHash};
