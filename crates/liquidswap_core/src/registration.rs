//! Coin registration: an account needs a `CoinStore<T>` before it can hold `T`

use std::sync::Arc;

use log::{info, warn};

use crate::config::{coin_store_type, REGISTER_FUNCTION};
use crate::error::SwapError;
use crate::ledger::{EntryFunction, LedgerClient, Signer, TransactionPayload, TransactionStatus};
use crate::tokens::Token;
use crate::types::{AccountAddress, TransactionHash};

pub struct RegistrationGuard {
    ledger: Arc<dyn LedgerClient>,
    signer: Arc<dyn Signer>,
}

impl RegistrationGuard {
    pub fn new(ledger: Arc<dyn LedgerClient>, signer: Arc<dyn Signer>) -> Self {
        Self { ledger, signer }
    }

    /// Whether `account` holds a receiving store for `token`
    ///
    /// A missing store is `false`, not an error.
    pub async fn is_registered(
        &self,
        account: &AccountAddress,
        token: &Token,
    ) -> Result<bool, SwapError> {
        let store = self
            .ledger
            .read_resource(account, &coin_store_type(token.coin_type()))
            .await?;
        Ok(store.is_some())
    }

    /// Register `token` for the signer's account and wait for the result
    pub async fn register(&self, token: &Token) -> Result<TransactionHash, SwapError> {
        let payload = TransactionPayload::EntryFunctionPayload(EntryFunction::new(
            REGISTER_FUNCTION,
            vec![token.coin_type().to_string()],
        ));

        let raw = self
            .ledger
            .prepare_transaction(self.signer.address(), &payload)
            .await?;
        let signed = self.signer.sign(raw)?;
        let hash = self.ledger.submit_transaction(&signed).await?;

        match self.ledger.wait_for_confirmation(&hash).await? {
            TransactionStatus::Committed { version, .. } => {
                info!("registered {} at version {}, tx: {}", token.symbol(), version, hash);
                Ok(hash)
            }
            TransactionStatus::Failed { vm_status, .. } => {
                warn!("registration of {} rejected: {}", token.symbol(), vm_status);
                Err(SwapError::RegistrationFailed {
                    symbol: token.symbol().to_string(),
                    reason: vm_status,
                })
            }
        }
    }

    /// Register `token` only if the signer cannot receive it yet
    pub async fn ensure_registered(
        &self,
        token: &Token,
    ) -> Result<Option<TransactionHash>, SwapError> {
        if self.is_registered(self.signer.address(), token).await? {
            return Ok(None);
        }
        self.register(token).await.map(Some)
    }
}
