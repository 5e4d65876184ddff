//! Collaborator interfaces: the ledger transport and the transaction signer
//!
//! The swap logic never talks to a node directly. It reads resources,
//! prepares, submits and confirms transactions through [`LedgerClient`], and
//! signs through [`Signer`]. Both are object-safe so a client can hold them as
//! `Arc<dyn ..>` and tests can substitute in-memory doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LedgerError, SignerError};
use crate::types::{AccountAddress, TransactionHash};

/// Call to a Move entry function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryFunction {
    /// `<address>::<module>::<function>`
    pub function: String,
    pub type_arguments: Vec<String>,
    /// JSON-encoded positional arguments; u64 values travel as decimal strings
    pub arguments: Vec<Value>,
}

impl EntryFunction {
    pub fn new(function: impl Into<String>, type_arguments: Vec<String>) -> Self {
        Self {
            function: function.into(),
            type_arguments,
            arguments: Vec::new(),
        }
    }

    pub fn arg_u64(mut self, value: u64) -> Self {
        self.arguments.push(Value::String(value.to_string()));
        self
    }
}

/// Transaction payload in the fullnode's JSON representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionPayload {
    EntryFunctionPayload(EntryFunction),
}

impl TransactionPayload {
    pub fn entry_function(&self) -> &EntryFunction {
        match self {
            TransactionPayload::EntryFunctionPayload(f) => f,
        }
    }
}

/// Unsigned transaction as prepared by the ledger for a sender
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    pub sender: AccountAddress,
    pub sequence_number: u64,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    pub expiration_timestamp_secs: u64,
    pub payload: TransactionPayload,
    /// Bytes the sender's key must sign
    pub signing_message: Vec<u8>,
}

/// Transaction with an Ed25519 authenticator attached
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    pub raw: RawTransaction,
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Final outcome of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Committed { hash: TransactionHash, version: u64 },
    Failed { hash: TransactionHash, vm_status: String },
}

/// Read a u64 at a JSON pointer; the fullnode encodes u64 as strings
pub(crate) fn json_u64(data: &Value, pointer: &str) -> Option<u64> {
    match data.pointer(pointer)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Read/write access to the ledger
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Read a resource's `data` by owner and fully-qualified type
    ///
    /// A resource that does not exist is `Ok(None)`, not an error.
    async fn read_resource(
        &self,
        address: &AccountAddress,
        resource_type: &str,
    ) -> Result<Option<Value>, LedgerError>;

    /// Fill in sequence number, gas and expiry and obtain the signing message
    async fn prepare_transaction(
        &self,
        sender: &AccountAddress,
        payload: &TransactionPayload,
    ) -> Result<RawTransaction, LedgerError>;

    async fn submit_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<TransactionHash, LedgerError>;

    /// Block until the transaction is committed or rejected
    ///
    /// Implementations bound the wait and report [`LedgerError::Timeout`];
    /// callers must not resubmit on timeout.
    async fn wait_for_confirmation(
        &self,
        hash: &TransactionHash,
    ) -> Result<TransactionStatus, LedgerError>;

    /// Native gas-coin balance in base units
    async fn native_balance(&self, address: &AccountAddress) -> Result<u64, LedgerError>;
}

/// Holder of the account key
pub trait Signer: Send + Sync {
    fn address(&self) -> &AccountAddress;

    fn sign(&self, transaction: RawTransaction) -> Result<SignedTransaction, SignerError>;
}
