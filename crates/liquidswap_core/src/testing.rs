//! In-memory ledger and signer for exercising the swap flow without a node

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{coin_info_type, coin_store_type, SwapConfig, REGISTER_FUNCTION};
use crate::error::{LedgerError, SignerError};
use crate::ledger::{
    LedgerClient, RawTransaction, SignedTransaction, Signer, TransactionPayload, TransactionStatus,
};
use crate::types::{AccountAddress, CoinType, TransactionHash};

pub const USER: &str = "0xa11ce";
pub const APT: &str = "0x1::aptos_coin::AptosCoin";
pub const USDT: &str =
    "0x43417434fd869edee76cca2a4d2301e528a1551b1d719b75c350c3c97d15b8b9::coins::USDT";
pub const BTC: &str =
    "0x43417434fd869edee76cca2a4d2301e528a1551b1d719b75c350c3c97d15b8b9::coins::BTC";

pub fn coin(s: &str) -> CoinType {
    s.parse().unwrap()
}

pub fn user() -> AccountAddress {
    USER.parse().unwrap()
}

#[derive(Default)]
struct State {
    resources: HashMap<(AccountAddress, String), Value>,
    failing_types: HashSet<String>,
    stalled_types: HashSet<String>,
    rejections: HashMap<String, String>,
    reads: Vec<(AccountAddress, String)>,
    /// Ordered log of prepare/submit/confirm calls
    events: Vec<String>,
    submitted: Vec<SignedTransaction>,
    next_hash: u64,
    native_balance: u64,
    confirm_timeout: bool,
}

#[derive(Default)]
pub struct MockLedger {
    state: Mutex<State>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_resource(&self, owner: &AccountAddress, resource_type: String, data: Value) {
        let mut state = self.state.lock().unwrap();
        state.resources.insert((owner.clone(), resource_type), data);
    }

    pub fn with_coin_info(self, coin_type: &str, decimals: u8) -> Self {
        let c = coin(coin_type);
        self.put_resource(c.address(), coin_info_type(&c), json!({ "decimals": decimals }));
        self
    }

    /// Pool stored on-chain as `LiquidityPool<x, y, curve>` with the 30 bps fee
    pub fn with_pool(
        self,
        config: &SwapConfig,
        x: &str,
        y: &str,
        reserve_x: u64,
        reserve_y: u64,
    ) -> Self {
        self.with_pool_fee(config, x, y, reserve_x, reserve_y, Some(30))
    }

    /// Pool with an explicit on-chain fee, or no `fee` field at all
    pub fn with_pool_fee(
        self,
        config: &SwapConfig,
        x: &str,
        y: &str,
        reserve_x: u64,
        reserve_y: u64,
        fee: Option<u64>,
    ) -> Self {
        let pool_type = config.pool_type(&coin(x), &coin(y));
        let mut data = json!({
            "coin_x_reserve": { "value": reserve_x.to_string() },
            "coin_y_reserve": { "value": reserve_y.to_string() },
            "last_block_timestamp": "1690000000",
        });
        if let Some(fee) = fee {
            data["fee"] = Value::String(fee.to_string());
        }
        self.put_resource(&config.resources_account, pool_type, data);
        self
    }

    pub fn with_coin_store(self, owner: &AccountAddress, coin_type: &str, value: u64) -> Self {
        self.put_resource(
            owner,
            coin_store_type(&coin(coin_type)),
            json!({ "coin": { "value": value.to_string() }, "frozen": false }),
        );
        self
    }

    pub fn with_native_balance(self, value: u64) -> Self {
        self.state.lock().unwrap().native_balance = value;
        self
    }

    /// Reads of this resource type fail with a transport error
    pub fn fail_reads_of(self, resource_type: String) -> Self {
        self.state.lock().unwrap().failing_types.insert(resource_type);
        self
    }

    /// Reads of this resource type never complete
    pub fn stall_reads_of(self, resource_type: String) -> Self {
        self.state.lock().unwrap().stalled_types.insert(resource_type);
        self
    }

    /// Transactions calling `function` abort with `vm_status`
    pub fn reject_function(
        self,
        function: impl Into<String>,
        vm_status: impl Into<String>,
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .rejections
            .insert(function.into(), vm_status.into());
        self
    }

    pub fn time_out_confirmations(self) -> Self {
        self.state.lock().unwrap().confirm_timeout = true;
        self
    }

    pub fn reads_of(&self, resource_type: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.reads.iter().filter(|(_, t)| t == resource_type).count()
    }

    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.state.lock().unwrap().submitted.clone()
    }
}

fn function_of(payload: &TransactionPayload) -> &str {
    &payload.entry_function().function
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn read_resource(
        &self,
        address: &AccountAddress,
        resource_type: &str,
    ) -> Result<Option<Value>, LedgerError> {
        let stalled = {
            let mut state = self.state.lock().unwrap();
            state.reads.push((address.clone(), resource_type.to_string()));
            if state.failing_types.contains(resource_type) {
                return Err(LedgerError::Transport("connection reset".into()));
            }
            state.stalled_types.contains(resource_type)
        };
        if stalled {
            std::future::pending::<()>().await;
        }

        let state = self.state.lock().unwrap();
        Ok(state
            .resources
            .get(&(address.clone(), resource_type.to_string()))
            .cloned())
    }

    async fn prepare_transaction(
        &self,
        sender: &AccountAddress,
        payload: &TransactionPayload,
    ) -> Result<RawTransaction, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.events.push(format!("prepare {}", function_of(payload)));
        let sequence_number = state.submitted.len() as u64;
        Ok(RawTransaction {
            sender: sender.clone(),
            sequence_number,
            max_gas_amount: 100_000,
            gas_unit_price: 100,
            expiration_timestamp_secs: 1_700_000_000,
            payload: payload.clone(),
            signing_message: function_of(payload).as_bytes().to_vec(),
        })
    }

    async fn submit_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<TransactionHash, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.next_hash += 1;
        let hash = TransactionHash(format!("0x{:064x}", state.next_hash));
        state
            .events
            .push(format!("submit {}", function_of(&transaction.raw.payload)));
        state.submitted.push(transaction.clone());
        Ok(hash)
    }

    async fn wait_for_confirmation(
        &self,
        hash: &TransactionHash,
    ) -> Result<TransactionStatus, LedgerError> {
        let mut state = self.state.lock().unwrap();
        if state.confirm_timeout {
            return Err(LedgerError::Timeout(hash.to_string()));
        }
        let index = usize::from_str_radix(hash.as_str().trim_start_matches("0x"), 16).unwrap() - 1;
        let txn = state.submitted[index].clone();
        let function = function_of(&txn.raw.payload).to_string();
        state.events.push(format!("confirm {function}"));

        if let Some(vm_status) = state.rejections.get(&function) {
            return Ok(TransactionStatus::Failed {
                hash: hash.clone(),
                vm_status: vm_status.clone(),
            });
        }

        // A committed registration creates the receiving store
        if function == REGISTER_FUNCTION {
            let coin_type = coin(&txn.raw.payload.entry_function().type_arguments[0]);
            state.resources.insert(
                (txn.raw.sender.clone(), coin_store_type(&coin_type)),
                json!({ "coin": { "value": "0" }, "frozen": false }),
            );
        }

        Ok(TransactionStatus::Committed {
            hash: hash.clone(),
            version: 1_000 + index as u64,
        })
    }

    async fn native_balance(&self, _address: &AccountAddress) -> Result<u64, LedgerError> {
        Ok(self.state.lock().unwrap().native_balance)
    }
}

pub struct MockSigner {
    address: AccountAddress,
}

impl MockSigner {
    pub fn new(address: AccountAddress) -> Self {
        Self { address }
    }
}

impl Signer for MockSigner {
    fn address(&self) -> &AccountAddress {
        &self.address
    }

    fn sign(&self, transaction: RawTransaction) -> Result<SignedTransaction, SignerError> {
        if transaction.sender != self.address {
            return Err(SignerError(format!("cannot sign for {}", transaction.sender)));
        }
        Ok(SignedTransaction {
            signature: vec![0xAB; 64],
            public_key: vec![0xCD; 32],
            raw: transaction,
        })
    }
}
