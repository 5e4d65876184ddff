//! Swap orchestration: quote, register, build, submit, confirm

use std::sync::Arc;

use amm_model::FEE_SCALE;
use log::{debug, info, warn};

use crate::config::{coin_store_type, SwapConfig, NATIVE_COIN};
use crate::decimals::DecimalConverter;
use crate::error::{LedgerError, SwapError, SwapFailure, SwapStep};
use crate::ledger::{
    json_u64, EntryFunction, LedgerClient, RawTransaction, Signer, TransactionPayload,
    TransactionStatus,
};
use crate::pool::PoolResolver;
use crate::registration::RegistrationGuard;
use crate::tokens::{Token, TokenPair, TokenRegistry};
use crate::types::{AccountAddress, TransactionHash};

/// Expected result of selling `amount_in` at the reserves read for the quote
#[derive(Debug, Clone, PartialEq)]
pub struct SwapQuote {
    pub from_token: Token,
    pub to_token: Token,
    pub amount_in: f64,
    pub amount_out: f64,
}

/// A caller's intent: sell `amount_in`, accept no less than `min_amount_out`
#[derive(Debug, Clone, PartialEq)]
pub struct SwapRequest {
    pub from_symbol: String,
    pub to_symbol: String,
    pub amount_in: f64,
    pub min_amount_out: f64,
    /// Output from an earlier quote; skips the reserve read when set
    pub expected_out: Option<f64>,
}

impl SwapRequest {
    pub fn new(
        from_symbol: impl Into<String>,
        to_symbol: impl Into<String>,
        amount_in: f64,
        min_amount_out: f64,
    ) -> Self {
        Self {
            from_symbol: from_symbol.into(),
            to_symbol: to_symbol.into(),
            amount_in,
            min_amount_out,
            expected_out: None,
        }
    }

    pub fn with_expected_out(mut self, expected_out: f64) -> Self {
        self.expected_out = Some(expected_out);
        self
    }
}

fn check_amount(name: &str, amount: f64, allow_zero: bool) -> Result<(), SwapError> {
    let ok = amount.is_finite() && (amount > 0.0 || (allow_zero && amount == 0.0));
    if ok {
        Ok(())
    } else {
        let expected = if allow_zero { "non-negative" } else { "positive" };
        Err(SwapError::InvalidAmount(format!("{name} must be {expected}, got {amount}")))
    }
}

/// Client facade over one account and one Liquidswap deployment
pub struct SwapClient {
    config: Arc<SwapConfig>,
    ledger: Arc<dyn LedgerClient>,
    signer: Arc<dyn Signer>,
    decimals: DecimalConverter,
    pools: PoolResolver,
    registration: RegistrationGuard,
}

impl SwapClient {
    pub fn new(
        config: SwapConfig,
        ledger: Arc<dyn LedgerClient>,
        signer: Arc<dyn Signer>,
    ) -> Result<Self, SwapError> {
        config.validate()?;
        let config = Arc::new(config);
        Ok(Self {
            decimals: DecimalConverter::new(ledger.clone()),
            pools: PoolResolver::new(ledger.clone(), config.clone()),
            registration: RegistrationGuard::new(ledger.clone(), signer.clone()),
            config,
            ledger,
            signer,
        })
    }

    pub fn config(&self) -> &SwapConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.config.tokens
    }

    pub fn address(&self) -> &AccountAddress {
        self.signer.address()
    }

    fn pair(&self, from_symbol: &str, to_symbol: &str) -> Result<TokenPair, SwapError> {
        let tokens = &self.config.tokens;
        TokenPair::new(tokens.get(from_symbol)?.clone(), tokens.get(to_symbol)?.clone())
    }

    async fn quote_pair(&self, pair: &TokenPair, amount_in: f64) -> Result<SwapQuote, SwapError> {
        check_amount("amount_in", amount_in, false)?;

        let snapshot = self.pools.resolve(pair.from(), pair.to()).await?;
        let from_reserve = self.decimals.to_decimal(snapshot.from_reserve(), pair.from()).await?;
        let to_reserve = self.decimals.to_decimal(snapshot.to_reserve(), pair.to()).await?;

        // Pool-reported fees are always on the protocol's own scale
        let (fee_numerator, fee_denominator) = match snapshot.fee {
            Some(fee) => (fee, FEE_SCALE),
            None => (self.config.fee_numerator, self.config.fee_denominator),
        };
        let amount_out = amm_model::quote_out(
            amount_in,
            from_reserve,
            to_reserve,
            fee_numerator,
            fee_denominator,
        )?;

        debug!(
            "quote {} {} -> {} {} (reserves {} / {}, fee {}/{})",
            amount_in,
            pair.from(),
            amount_out,
            pair.to(),
            from_reserve,
            to_reserve,
            fee_numerator,
            fee_denominator
        );
        Ok(SwapQuote {
            from_token: pair.from().clone(),
            to_token: pair.to().clone(),
            amount_in,
            amount_out,
        })
    }

    /// Quote selling `amount_in` of `from_symbol` for `to_symbol`
    pub async fn quote(
        &self,
        from_symbol: &str,
        to_symbol: &str,
        amount_in: f64,
    ) -> Result<SwapQuote, SwapError> {
        let pair = self.pair(from_symbol, to_symbol)?;
        self.quote_pair(&pair, amount_in).await
    }

    /// Expected output amount for selling `amount_in`
    pub async fn calculate_rate(
        &self,
        from_symbol: &str,
        to_symbol: &str,
        amount_in: f64,
    ) -> Result<f64, SwapError> {
        Ok(self.quote(from_symbol, to_symbol, amount_in).await?.amount_out)
    }

    async fn quote_step(&self, request: &SwapRequest) -> Result<(TokenPair, f64), SwapError> {
        check_amount("amount_in", request.amount_in, false)?;
        check_amount("min_amount_out", request.min_amount_out, true)?;
        let pair = self.pair(&request.from_symbol, &request.to_symbol)?;

        let expected = match request.expected_out {
            Some(expected) => {
                check_amount("expected_out", expected, true)?;
                expected
            }
            None => self.quote_pair(&pair, request.amount_in).await?.amount_out,
        };
        if request.min_amount_out > expected {
            return Err(SwapError::MinimumNotMet {
                expected,
                minimum: request.min_amount_out,
            });
        }
        Ok((pair, expected))
    }

    async fn build_step(
        &self,
        pair: &TokenPair,
        request: &SwapRequest,
    ) -> Result<RawTransaction, SwapError> {
        let amount_in = self.decimals.to_base_units(request.amount_in, pair.from()).await?;
        if amount_in == 0 {
            return Err(SwapError::InvalidAmount(format!(
                "{} {} is below the smallest unit",
                request.amount_in,
                pair.from()
            )));
        }
        let min_amount_out = self
            .decimals
            .to_base_units(request.min_amount_out, pair.to())
            .await?;

        let call = EntryFunction::new(
            self.config.swap_function(),
            vec![
                pair.from().coin_type().to_string(),
                pair.to().coin_type().to_string(),
                self.config.curve_type(),
            ],
        )
        .arg_u64(amount_in)
        .arg_u64(min_amount_out);
        debug!("swap payload: {:?}", call);

        let payload = TransactionPayload::EntryFunctionPayload(call);
        Ok(self
            .ledger
            .prepare_transaction(self.signer.address(), &payload)
            .await?)
    }

    /// Execute a swap and wait for it to be committed
    ///
    /// The minimum output is passed to the on-chain swap call, which enforces
    /// it atomically; the reserves read while quoting may be stale by the time
    /// the transaction executes. Nothing is retried.
    pub async fn swap(&self, request: &SwapRequest) -> Result<TransactionHash, SwapFailure> {
        info!(
            "swapping {} {} for at least {} {}",
            request.amount_in, request.from_symbol, request.min_amount_out, request.to_symbol
        );

        let (pair, expected) = self
            .quote_step(request)
            .await
            .map_err(|e| SwapFailure::new(SwapStep::Quote, e))?;
        info!("expected output {} {}", expected, pair.to());

        if let Some(tx) = self
            .registration
            .ensure_registered(pair.to())
            .await
            .map_err(|e| SwapFailure::new(SwapStep::Register, e))?
        {
            info!("registered {} before swapping, tx: {}", pair.to(), tx);
        }

        let raw = self
            .build_step(&pair, request)
            .await
            .map_err(|e| SwapFailure::new(SwapStep::Build, e))?;

        let signed = self
            .signer
            .sign(raw)
            .map_err(|e| SwapFailure::new(SwapStep::Submit, e))?;
        let hash = self
            .ledger
            .submit_transaction(&signed)
            .await
            .map_err(|e| SwapFailure::new(SwapStep::Submit, e))?;
        info!("swap submitted, tx: {}", hash);

        let status = self
            .ledger
            .wait_for_confirmation(&hash)
            .await
            .map_err(|e| SwapFailure::new(SwapStep::Confirm, e))?;
        match status {
            TransactionStatus::Committed { version, .. } => {
                info!("swap committed at version {}, tx: {}", version, hash);
                Ok(hash)
            }
            TransactionStatus::Failed { vm_status, .. } => {
                warn!("swap {} rejected: {}", hash, vm_status);
                Err(SwapFailure::new(
                    SwapStep::Confirm,
                    SwapError::SwapRejected { reason: vm_status },
                ))
            }
        }
    }

    /// Quote, apply the configured slippage tolerance, then swap
    pub async fn swap_with_slippage(
        &self,
        from_symbol: &str,
        to_symbol: &str,
        amount_in: f64,
    ) -> Result<(SwapQuote, TransactionHash), SwapFailure> {
        let quote = self
            .quote(from_symbol, to_symbol, amount_in)
            .await
            .map_err(|e| SwapFailure::new(SwapStep::Quote, e))?;
        let min_amount_out = self.config.min_amount_out(quote.amount_out);

        let request = SwapRequest::new(from_symbol, to_symbol, amount_in, min_amount_out)
            .with_expected_out(quote.amount_out);
        let hash = self.swap(&request).await?;
        Ok((quote, hash))
    }

    /// Balance of a configured token; zero when the account has no store for it
    pub async fn get_token_balance(&self, symbol: &str) -> Result<f64, SwapError> {
        let token = self.config.tokens.get(symbol)?;
        let store = self
            .ledger
            .read_resource(self.signer.address(), &coin_store_type(token.coin_type()))
            .await?;
        let Some(store) = store else {
            return Ok(0.0);
        };

        let raw = json_u64(&store, "/coin/value").ok_or_else(|| {
            LedgerError::Decode(format!("CoinStore<{}> has no coin.value", token.coin_type()))
        })?;
        self.decimals.to_decimal(raw, token).await
    }

    /// Native gas-coin balance as a decimal amount
    pub async fn native_balance(&self) -> Result<f64, SwapError> {
        let native = Token::new("APT", NATIVE_COIN.parse()?);
        let raw = self.ledger.native_balance(self.signer.address()).await?;
        self.decimals.to_decimal(raw, &native).await
    }

    pub async fn is_registered(&self, symbol: &str) -> Result<bool, SwapError> {
        let token = self.config.tokens.get(symbol)?;
        self.registration
            .is_registered(self.signer.address(), token)
            .await
    }

    pub async fn register(&self, symbol: &str) -> Result<TransactionHash, SwapError> {
        let token = self.config.tokens.get(symbol)?;
        self.registration.register(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::REGISTER_FUNCTION;
    use crate::error::ERR_OUTPUT_BELOW_MINIMUM;
    use crate::testing::{user, MockLedger, MockSigner, APT, BTC, USDT};

    fn config() -> SwapConfig {
        SwapConfig::with_tokens(
            TokenRegistry::from_mapping([("APTOS", APT), ("USDT", USDT), ("BTC", BTC)]).unwrap(),
        )
    }

    /// APT (8 decimals) / USDT (6 decimals) pool stored as <USDT, APT>
    fn ledger() -> MockLedger {
        MockLedger::new()
            .with_coin_info(APT, 8)
            .with_coin_info(USDT, 6)
            .with_coin_info(BTC, 8)
            .with_pool(&config(), USDT, APT, 2_000 * 1_000_000, 1_000 * 100_000_000)
            .with_coin_store(&user(), APT, 50 * 100_000_000)
            .with_native_balance(50 * 100_000_000)
    }

    fn client(ledger: Arc<MockLedger>) -> SwapClient {
        SwapClient::new(config(), ledger, Arc::new(MockSigner::new(user()))).unwrap()
    }

    fn swap_count(ledger: &MockLedger, function: &str) -> usize {
        ledger
            .submitted()
            .iter()
            .filter(|t| t.raw.payload.entry_function().function == function)
            .count()
    }

    #[tokio::test]
    async fn test_reference_rate_through_reversed_pool() {
        // sell 10 APT into 1000 APT / 2000 USDT at 0.3%
        let client = client(Arc::new(ledger()));
        let out = client.calculate_rate("APTOS", "USDT", 10.0).await.unwrap();
        assert_eq!((out * 1e4).round(), 197_432.0);
    }

    #[tokio::test]
    async fn test_quote_both_directions() {
        let client = client(Arc::new(ledger()));
        let usdt_out = client.calculate_rate("APTOS", "USDT", 1.0).await.unwrap();
        let apt_out = client.calculate_rate("USDT", "APTOS", 1.0).await.unwrap();

        // 1 APT ~ 2 USDT before fees and impact
        assert!(usdt_out < 2.0 * 0.997 && usdt_out > 1.98);
        assert!(apt_out < 0.5 * 0.997 && apt_out > 0.49);
    }

    #[tokio::test]
    async fn test_configured_fee_applies_when_pool_reports_none() {
        let cfg = SwapConfig {
            fee_numerator: 3,
            fee_denominator: 1_000,
            ..config()
        };
        let ledger = Arc::new(ledger().with_pool_fee(
            &cfg,
            BTC,
            APT,
            10 * 100_000_000,
            1_000 * 100_000_000,
            None,
        ));
        let client = SwapClient::new(cfg, ledger, Arc::new(MockSigner::new(user()))).unwrap();

        let out = client.calculate_rate("BTC", "APTOS", 1.0).await.unwrap();
        let expected = amm_model::quote_out(1.0, 10.0, 1_000.0, 3, 1_000).unwrap();
        let at_default = amm_model::quote_out(1.0, 10.0, 1_000.0, 30, FEE_SCALE).unwrap();
        assert!((out - expected).abs() < 1e-9);
        assert!((out - at_default).abs() > 1e-6);
    }

    #[tokio::test]
    async fn test_pool_fee_overrides_configured_fee() {
        let cfg = SwapConfig {
            fee_numerator: 3,
            fee_denominator: 1_000,
            ..config()
        };
        let ledger = Arc::new(ledger().with_pool_fee(
            &cfg,
            USDT,
            APT,
            2_000 * 1_000_000,
            1_000 * 100_000_000,
            Some(100),
        ));
        let client = SwapClient::new(cfg, ledger, Arc::new(MockSigner::new(user()))).unwrap();

        // 1% on the pool's scale, not 0.3% from config
        let out = client.calculate_rate("APTOS", "USDT", 10.0).await.unwrap();
        let expected = amm_model::quote_out(10.0, 1_000.0, 2_000.0, 100, FEE_SCALE).unwrap();
        let at_config = amm_model::quote_out(10.0, 1_000.0, 2_000.0, 3, 1_000).unwrap();
        assert!((out - expected).abs() < 1e-9);
        assert!(out < at_config);
    }

    #[tokio::test]
    async fn test_quote_input_errors_before_network() {
        let ledger = Arc::new(ledger());
        let client = client(ledger.clone());

        assert!(matches!(
            client.quote("APTOS", "USDT", 0.0).await,
            Err(SwapError::InvalidAmount(_))
        ));
        assert!(matches!(
            client.quote("APTOS", "DOGE", 1.0).await,
            Err(SwapError::UnknownToken(_))
        ));
        assert!(matches!(
            client.quote("APTOS", "APTOS", 1.0).await,
            Err(SwapError::InvalidPair(_))
        ));
        let pool = config().pool_type(&APT.parse().unwrap(), &USDT.parse().unwrap());
        assert_eq!(ledger.reads_of(&pool), 0);
    }

    #[tokio::test]
    async fn test_empty_pool_is_invalid_reserves() {
        let ledger = Arc::new(ledger().with_pool(&config(), BTC, APT, 0, 100));
        let client = client(ledger);
        assert!(matches!(
            client.quote("BTC", "APTOS", 1.0).await,
            Err(SwapError::InvalidReserves)
        ));
    }

    #[tokio::test]
    async fn test_swap_registers_unregistered_destination_once() {
        let ledger = Arc::new(ledger());
        let client = client(ledger.clone());

        let request = SwapRequest::new("APTOS", "USDT", 1.0, 1.5);
        client.swap(&request).await.unwrap();

        let swap_fn = config().swap_function();
        let events = ledger.events();
        assert_eq!(
            events,
            vec![
                format!("prepare {REGISTER_FUNCTION}"),
                format!("submit {REGISTER_FUNCTION}"),
                format!("confirm {REGISTER_FUNCTION}"),
                format!("prepare {swap_fn}"),
                format!("submit {swap_fn}"),
                format!("confirm {swap_fn}"),
            ]
        );

        // second swap: store now exists, no further registration
        client.swap(&request).await.unwrap();
        assert_eq!(swap_count(&ledger, REGISTER_FUNCTION), 1);
        assert_eq!(swap_count(&ledger, &swap_fn), 2);
    }

    #[tokio::test]
    async fn test_swap_to_registered_destination_never_registers() {
        let ledger = Arc::new(ledger());
        let client = client(ledger.clone());

        client
            .swap(&SwapRequest::new("USDT", "APTOS", 2.0, 0.9))
            .await
            .unwrap();
        assert_eq!(swap_count(&ledger, REGISTER_FUNCTION), 0);
    }

    #[tokio::test]
    async fn test_swap_payload() {
        let ledger = Arc::new(ledger());
        let client = client(ledger.clone());

        client
            .swap(&SwapRequest::new("USDT", "APTOS", 2.5, 1.2))
            .await
            .unwrap();

        let submitted = ledger.submitted();
        let call = submitted.last().unwrap().raw.payload.entry_function();
        let cfg = config();
        assert_eq!(call.function, cfg.swap_function());
        assert_eq!(
            call.type_arguments,
            vec![USDT.to_string(), APT.to_string(), cfg.curve_type()]
        );
        assert_eq!(
            call.arguments,
            vec![
                serde_json::Value::String("2500000".into()),
                serde_json::Value::String("120000000".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_minimum_above_quote_fails_at_quote_step() {
        let ledger = Arc::new(ledger());
        let client = client(ledger.clone());

        let failure = client
            .swap(&SwapRequest::new("APTOS", "USDT", 1.0, 5.0))
            .await
            .unwrap_err();
        assert_eq!(failure.step, SwapStep::Quote);
        assert!(matches!(failure.error, SwapError::MinimumNotMet { .. }));
        assert!(ledger.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_precomputed_quote_skips_reserve_read() {
        let ledger = Arc::new(ledger());
        let client = client(ledger.clone());
        let cfg = config();

        let request = SwapRequest::new("USDT", "APTOS", 2.0, 0.9).with_expected_out(0.99);
        client.swap(&request).await.unwrap();

        let usdt_apt = cfg.pool_type(&USDT.parse().unwrap(), &APT.parse().unwrap());
        assert_eq!(ledger.reads_of(&usdt_apt), 0);
    }

    #[tokio::test]
    async fn test_slippage_rejection_is_reported_at_confirm() {
        let cfg = config();
        let status = format!(
            "Move abort in {}::router: {}(0x3ea)",
            cfg.modules_account, ERR_OUTPUT_BELOW_MINIMUM
        );
        let ledger = Arc::new(ledger().reject_function(cfg.swap_function(), status));
        let client = client(ledger);

        let failure = client
            .swap(&SwapRequest::new("USDT", "APTOS", 2.0, 0.9))
            .await
            .unwrap_err();
        assert_eq!(failure.step, SwapStep::Confirm);
        assert!(failure.error.is_slippage_violation());
        assert!(failure.to_string().starts_with("confirm failed: swap rejected"));
    }

    #[tokio::test]
    async fn test_registration_failure_stops_swap() {
        let ledger = Arc::new(ledger().reject_function(REGISTER_FUNCTION, "OUT_OF_GAS"));
        let client = client(ledger.clone());

        let failure = client
            .swap(&SwapRequest::new("APTOS", "USDT", 1.0, 1.0))
            .await
            .unwrap_err();
        assert_eq!(failure.step, SwapStep::Register);
        assert!(matches!(failure.error, SwapError::RegistrationFailed { .. }));
        assert_eq!(swap_count(&ledger, &config().swap_function()), 0);
    }

    #[tokio::test]
    async fn test_confirmation_timeout_is_not_retried() {
        let ledger = Arc::new(ledger().time_out_confirmations());
        let client = client(ledger.clone());

        let failure = client
            .swap(&SwapRequest::new("USDT", "APTOS", 2.0, 0.9))
            .await
            .unwrap_err();
        assert_eq!(failure.step, SwapStep::Confirm);
        assert!(matches!(failure.error, SwapError::Ledger(LedgerError::Timeout(_))));
        assert!(failure.may_have_executed());
        assert_eq!(ledger.submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_dust_amount_fails_at_build() {
        let ledger = Arc::new(ledger());
        let client = client(ledger);

        let failure = client
            .swap(&SwapRequest::new("USDT", "APTOS", 0.000_000_1, 0.0).with_expected_out(0.0))
            .await
            .unwrap_err();
        assert_eq!(failure.step, SwapStep::Build);
        assert!(matches!(failure.error, SwapError::InvalidAmount(_)));
    }

    #[tokio::test]
    async fn test_swap_with_slippage_applies_tolerance() {
        let ledger = Arc::new(ledger());
        let client = client(ledger.clone());

        let (quote, _hash) = client.swap_with_slippage("USDT", "APTOS", 2.0).await.unwrap();
        let min = quote.amount_out * 0.95;

        let call = ledger.submitted().last().unwrap().raw.payload.entry_function().clone();
        let min_raw: u64 = call.arguments[1].as_str().unwrap().parse().unwrap();
        assert_eq!(min_raw, amm_model::to_base_units(min, 8).unwrap());
    }

    #[tokio::test]
    async fn test_balances() {
        let client = client(Arc::new(ledger()));

        assert_eq!(client.get_token_balance("APTOS").await.unwrap(), 50.0);
        assert_eq!(client.get_token_balance("USDT").await.unwrap(), 0.0);
        assert_eq!(client.native_balance().await.unwrap(), 50.0);
        assert!(matches!(
            client.get_token_balance("DOGE").await,
            Err(SwapError::UnknownToken(_))
        ));
    }

    #[tokio::test]
    async fn test_register_by_symbol() {
        let ledger = Arc::new(ledger());
        let client = client(ledger);

        assert!(!client.is_registered("BTC").await.unwrap());
        client.register("BTC").await.unwrap();
        assert!(client.is_registered("BTC").await.unwrap());
    }
}
