//! Error types for quoting and swap orchestration

use std::fmt;

use amm_model::AmmError;
use thiserror::Error;

/// Abort code Liquidswap raises when the output falls below the caller's minimum
pub const ERR_OUTPUT_BELOW_MINIMUM: &str = "ERR_COIN_OUT_NUM_LESS_THAN_EXPECTED_MINIMUM";

/// Failures reported by a [`crate::LedgerClient`] implementation
///
/// These are passed through to callers unmodified inside [`SwapError::Ledger`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("ledger returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected ledger response: {0}")]
    Decode(String),

    #[error("timed out waiting for transaction {0}")]
    Timeout(String),
}

/// Failure reported by a [`crate::Signer`] implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("signing failed: {0}")]
pub struct SignerError(pub String);

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("invalid pair: {0}")]
    InvalidPair(String),

    #[error("pool reserves must be positive")]
    InvalidReserves,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("fee numerator must be below a non-zero fee denominator")]
    InvalidFee,

    #[error("unknown token symbol: {0}")]
    UnknownToken(String),

    #[error("invalid coin type `{0}`")]
    InvalidTypeTag(String),

    #[error("invalid account address `{0}`")]
    InvalidAddress(String),

    #[error("no liquidity pool found for {from}/{to}")]
    PoolNotFound { from: String, to: String },

    #[error("decimal metadata unavailable for {coin}: {reason}")]
    MetadataUnavailable { coin: String, reason: String },

    #[error("expected output {expected} is below the declared minimum {minimum}")]
    MinimumNotMet { expected: f64, minimum: f64 },

    #[error("registration of {symbol} failed: {reason}")]
    RegistrationFailed { symbol: String, reason: String },

    #[error("swap rejected by the ledger: {reason}")]
    SwapRejected { reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Signer(#[from] SignerError),
}

impl SwapError {
    /// True for failures a caller may retry without re-validating input
    ///
    /// Metadata reads and transport hiccups are transient. Pool absence,
    /// input errors and on-chain rejections are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SwapError::MetadataUnavailable { .. }
                | SwapError::Ledger(LedgerError::Transport(_))
                | SwapError::Ledger(LedgerError::Timeout(_))
        )
    }

    /// True when the chain aborted the swap because of the minimum-output guard
    pub fn is_slippage_violation(&self) -> bool {
        match self {
            SwapError::SwapRejected { reason } => reason.contains(ERR_OUTPUT_BELOW_MINIMUM),
            _ => false,
        }
    }
}

impl From<AmmError> for SwapError {
    fn from(err: AmmError) -> Self {
        match err {
            AmmError::InvalidReserves => SwapError::InvalidReserves,
            AmmError::InvalidAmount => SwapError::InvalidAmount(err.to_string()),
            AmmError::InvalidFee => SwapError::InvalidFee,
            AmmError::Overflow => SwapError::InvalidAmount(err.to_string()),
        }
    }
}

/// Stage of the swap flow at which a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapStep {
    Quote,
    Register,
    Build,
    Submit,
    Confirm,
}

impl fmt::Display for SwapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwapStep::Quote => "quote",
            SwapStep::Register => "register",
            SwapStep::Build => "build",
            SwapStep::Submit => "submit",
            SwapStep::Confirm => "confirm",
        };
        f.write_str(name)
    }
}

/// Error returned by [`crate::SwapClient::swap`], tagged with the failing step
#[derive(Debug, Error)]
#[error("{step} failed: {error}")]
pub struct SwapFailure {
    pub step: SwapStep,
    #[source]
    pub error: SwapError,
}

impl SwapFailure {
    pub fn new(step: SwapStep, error: impl Into<SwapError>) -> Self {
        Self {
            step,
            error: error.into(),
        }
    }

    /// Whether a swap transaction may have reached the ledger
    ///
    /// Failures during submission or confirmation leave the outcome unknown;
    /// callers must check the chain before swapping again.
    pub fn may_have_executed(&self) -> bool {
        matches!(self.step, SwapStep::Submit | SwapStep::Confirm)
    }
}
