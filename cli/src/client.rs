//! Aptos fullnode REST client and output helpers

use async_trait::async_trait;
use colored::Colorize;
use liquidswap_core::config::{COIN_STORE, NATIVE_COIN};
use liquidswap_core::{
    AccountAddress, LedgerClient, LedgerError, RawTransaction, SignedTransaction,
    TransactionHash, TransactionPayload, TransactionStatus,
};
use log::{debug, info};
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use url::Url;

use crate::config::{GasConfig, NetworkConfig, Timeouts};

/// Seconds a prepared transaction stays valid
const EXPIRATION_SECS: u64 = 600;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// [`LedgerClient`] over the fullnode's JSON REST API
pub struct AptosRestClient {
    http: Client,
    base_url: Url,
    gas: GasConfig,
    confirmation_timeout: Duration,
}

impl AptosRestClient {
    pub fn new(base_url: Url, gas: GasConfig, timeouts: Timeouts) -> Result<Self, LedgerError> {
        let http = ClientBuilder::new()
            .timeout(timeouts.request)
            .connect_timeout(timeouts.connect)
            .user_agent(concat!("liquidswap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;

        Ok(Self {
            http,
            base_url,
            gas,
            confirmation_timeout: timeouts.confirmation,
        })
    }

    pub fn from_config(config: &NetworkConfig) -> Result<Self, LedgerError> {
        Self::new(config.node_url.clone(), config.gas, config.timeouts)
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url, LedgerError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LedgerError::Transport(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Response, LedgerError> {
        debug!("GET {}", url);
        self.http.get(url).send().await.map_err(transport)
    }

    async fn post_json(&self, url: Url, body: &Value) -> Result<Value, LedgerError> {
        debug!("POST {}", url);
        let response = self.http.post(url).json(body).send().await.map_err(transport)?;
        read_json(response).await
    }

    /// One look at a submitted transaction; `None` while it is pending or not yet indexed
    async fn poll_status(
        &self,
        url: &Url,
        hash: &TransactionHash,
    ) -> Result<Option<TransactionStatus>, LedgerError> {
        let response = self.get(url.clone()).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let txn = read_json(response).await?;
        parse_status(hash, &txn)
    }
}

fn transport(err: reqwest::Error) -> LedgerError {
    LedgerError::Transport(err.to_string())
}

/// Decode a success body or turn the fullnode's error body into [`LedgerError::Http`]
async fn read_json(response: Response) -> Result<Value, LedgerError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| LedgerError::Decode(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    Err(LedgerError::Http {
        status: status.as_u16(),
        message,
    })
}

fn u64_field(value: &Value, pointer: &str) -> Result<u64, LedgerError> {
    match value.pointer(pointer) {
        Some(Value::String(s)) => s.parse().ok(),
        Some(Value::Number(n)) => n.as_u64(),
        _ => None,
    }
    .ok_or_else(|| LedgerError::Decode(format!("missing or non-numeric {pointer}")))
}

/// Unsigned transaction in the shape `/transactions` and `encode_submission` expect
fn transaction_body(
    sender: &AccountAddress,
    sequence_number: u64,
    gas: &GasConfig,
    expiration_timestamp_secs: u64,
    payload: &TransactionPayload,
) -> Value {
    json!({
        "sender": sender.as_str(),
        "sequence_number": sequence_number.to_string(),
        "max_gas_amount": gas.max_gas_amount.to_string(),
        "gas_unit_price": gas.gas_unit_price.to_string(),
        "expiration_timestamp_secs": expiration_timestamp_secs.to_string(),
        "payload": payload,
    })
}

fn submission_body(transaction: &SignedTransaction) -> Value {
    let raw = &transaction.raw;
    let gas = GasConfig {
        max_gas_amount: raw.max_gas_amount,
        gas_unit_price: raw.gas_unit_price,
    };
    let mut body = transaction_body(
        &raw.sender,
        raw.sequence_number,
        &gas,
        raw.expiration_timestamp_secs,
        &raw.payload,
    );
    body["signature"] = json!({
        "type": "ed25519_signature",
        "public_key": format!("0x{}", hex::encode(&transaction.public_key)),
        "signature": format!("0x{}", hex::encode(&transaction.signature)),
    });
    body
}

/// `None` while the transaction is still pending
fn parse_status(
    hash: &TransactionHash,
    txn: &Value,
) -> Result<Option<TransactionStatus>, LedgerError> {
    if txn.get("type").and_then(Value::as_str) == Some("pending_transaction") {
        return Ok(None);
    }
    let success = txn
        .get("success")
        .and_then(Value::as_bool)
        .ok_or_else(|| LedgerError::Decode(format!("transaction {hash} has no success flag")))?;

    if success {
        Ok(Some(TransactionStatus::Committed {
            hash: hash.clone(),
            version: u64_field(txn, "/version")?,
        }))
    } else {
        let vm_status = txn
            .get("vm_status")
            .and_then(Value::as_str)
            .unwrap_or("unknown VM status")
            .to_string();
        Ok(Some(TransactionStatus::Failed {
            hash: hash.clone(),
            vm_status,
        }))
    }
}

#[async_trait]
impl LedgerClient for AptosRestClient {
    async fn read_resource(
        &self,
        address: &AccountAddress,
        resource_type: &str,
    ) -> Result<Option<Value>, LedgerError> {
        let url = self.endpoint(&["accounts", address.as_str(), "resource", resource_type])?;
        let response = self.get(url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let mut resource = read_json(response).await?;
        match resource.get_mut("data") {
            Some(data) => Ok(Some(data.take())),
            None => Err(LedgerError::Decode(format!("resource {resource_type} has no data"))),
        }
    }

    async fn prepare_transaction(
        &self,
        sender: &AccountAddress,
        payload: &TransactionPayload,
    ) -> Result<RawTransaction, LedgerError> {
        let account_url = self.endpoint(&["accounts", sender.as_str()])?;
        let account = read_json(self.get(account_url).await?).await?;
        let sequence_number = u64_field(&account, "/sequence_number")?;

        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
        let expiration_timestamp_secs = now + EXPIRATION_SECS;

        let body = transaction_body(
            sender,
            sequence_number,
            &self.gas,
            expiration_timestamp_secs,
            payload,
        );
        let encoded = self
            .post_json(self.endpoint(&["transactions", "encode_submission"])?, &body)
            .await?;
        let encoded = encoded
            .as_str()
            .ok_or_else(|| {
                LedgerError::Decode("encode_submission did not return a string".into())
            })?;
        let signing_message = hex::decode(encoded.trim_start_matches("0x"))
            .map_err(|e| LedgerError::Decode(format!("signing message: {e}")))?;

        Ok(RawTransaction {
            sender: sender.clone(),
            sequence_number,
            max_gas_amount: self.gas.max_gas_amount,
            gas_unit_price: self.gas.gas_unit_price,
            expiration_timestamp_secs,
            payload: payload.clone(),
            signing_message,
        })
    }

    async fn submit_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<TransactionHash, LedgerError> {
        let response = self
            .post_json(self.endpoint(&["transactions"])?, &submission_body(transaction))
            .await?;
        let hash = response
            .get("hash")
            .and_then(Value::as_str)
            .ok_or_else(|| LedgerError::Decode("submission response has no hash".into()))?;
        info!("submitted transaction {}", hash);
        Ok(TransactionHash(hash.to_string()))
    }

    async fn wait_for_confirmation(
        &self,
        hash: &TransactionHash,
    ) -> Result<TransactionStatus, LedgerError> {
        let deadline = Instant::now() + self.confirmation_timeout;
        let url = self.endpoint(&["transactions", "by_hash", hash.as_str()])?;

        loop {
            // A hung request must not outlive the confirmation deadline
            let remaining = deadline.saturating_duration_since(Instant::now());
            let polled = timeout(remaining, self.poll_status(&url, hash))
                .await
                .map_err(|_| LedgerError::Timeout(hash.to_string()))??;
            if let Some(status) = polled {
                return Ok(status);
            }

            if Instant::now() + POLL_INTERVAL > deadline {
                return Err(LedgerError::Timeout(hash.to_string()));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn native_balance(&self, address: &AccountAddress) -> Result<u64, LedgerError> {
        let store = format!("{COIN_STORE}<{NATIVE_COIN}>");
        match self.read_resource(address, &store).await? {
            Some(data) => u64_field(&data, "/coin/value"),
            None => Ok(0),
        }
    }
}

fn shorten(s: &str) -> String {
    if s.len() <= 18 {
        return s.to_string();
    }
    format!("{}...{}", &s[0..10], &s[s.len() - 6..])
}

/// Pretty print a transaction hash as a shortened explorer link
pub fn format_hash(hash: &TransactionHash, network: &str) -> String {
    let hash = hash.as_str();
    let explorer_url = match network {
        "mainnet" | "testnet" | "devnet" => {
            format!("https://explorer.aptoslabs.com/txn/{}?network={}", hash, network)
        }
        "local" | "localnet" => {
            format!("https://explorer.aptoslabs.com/txn/{}?network=local", hash)
        }
        _ => hash.to_string(),
    };

    format!("{} ({})", shorten(hash).bright_blue(), explorer_url.dimmed())
}

/// Pretty print an account address in shortened form
pub fn format_address(address: &AccountAddress) -> String {
    shorten(address.as_str()).bright_yellow().to_string()
}
