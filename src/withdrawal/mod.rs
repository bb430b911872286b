//! Withdrawal of in-game token balance back to the connected wallet.
//!
//! The flow validates the typed amount locally, resolves the token address
//! from the platform's supported token list and submits the request through a
//! [`WithdrawalBackend`]. It never touches the betting board.

use crate::wallets::AccountAddress;
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;
use tracing::{
    error,
    info,
    warn,
};

pub mod amount;
pub mod api;
pub mod receipts;

pub use amount::{
    TokenAmount,
    is_amount_input,
    usd_estimate,
};
pub use api::{
    ApiClient,
    BalanceSource,
    CoingeckoClient,
    PriceFeed,
    SupportedToken,
    WithdrawalBackend,
    WithdrawalReceipt,
    WithdrawalRequest,
};

pub const ZERO_AMOUNT_WARNING: &str = "Cannot perform transaction";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Token {
    #[default]
    Strk,
    Eth,
}

impl Token {
    pub fn symbol(self) -> &'static str {
        match self {
            Token::Strk => "STRK",
            Token::Eth => "ETH",
        }
    }

    pub fn coingecko_id(self) -> &'static str {
        match self {
            Token::Strk => "starknet",
            Token::Eth => "ethereum",
        }
    }

    /// Position of the token in the platform's supported token list.
    pub fn list_index(self) -> usize {
        match self {
            Token::Strk => 0,
            Token::Eth => 1,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Token::Strk => Token::Eth,
            Token::Eth => Token::Strk,
        }
    }

    /// Finds this token in `tokens`, by symbol first and by list position
    /// when the platform sends unlabeled entries.
    pub fn resolve<'a>(self, tokens: &'a [SupportedToken]) -> Option<&'a SupportedToken> {
        tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(self.symbol()))
            .or_else(|| {
                tokens
                    .get(self.list_index())
                    .filter(|t| t.symbol.trim().is_empty())
            })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WithdrawalError {
    #[error("Connect a wallet before withdrawing")]
    WalletNotConnected,

    #[error("Cannot perform transaction")]
    EmptyAmount,

    #[error("Cannot perform transaction")]
    ZeroAmount,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("{0} is not supported for withdrawal")]
    UnsupportedToken(Token),

    #[error("{0}")]
    Remote(String),

    #[error("Withdrawal service unreachable: {0}")]
    Transport(String),
}

impl WithdrawalError {
    /// Validation failures are detected before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            WithdrawalError::WalletNotConnected
                | WithdrawalError::EmptyAmount
                | WithdrawalError::ZeroAmount
                | WithdrawalError::InvalidAmount(_)
                | WithdrawalError::UnsupportedToken(_)
        )
    }
}

impl From<reqwest::Error> for WithdrawalError {
    fn from(err: reqwest::Error) -> Self {
        WithdrawalError::Transport(err.to_string())
    }
}

/// What the player is shown after a successful withdrawal.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub transaction_hash: String,
    pub receiver: AccountAddress,
    pub amount: String,
    pub token: Token,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WithdrawOutcome {
    /// No wallet connected; the connect prompt should open.
    ConnectWallet,
    /// Rejected locally; nothing was sent.
    Warning(String),
    Submitted(TransactionSummary),
    Failed(String),
}

#[derive(Clone, Debug, Default)]
pub struct WithdrawalForm {
    pub token: Token,
    pub amount: String,
    pub loading: bool,
    pub price: f64,
    pub platform_balance: Option<TokenAmount>,
    pub wallet_balance: Option<TokenAmount>,
}

/// State of the withdrawal form plus the submission logic.
#[derive(Debug, Default)]
pub struct WithdrawalFlow {
    form: WithdrawalForm,
    supported_tokens: Vec<SupportedToken>,
}

impl WithdrawalFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &WithdrawalForm {
        &self.form
    }

    pub fn token(&self) -> Token {
        self.form.token
    }

    pub fn amount(&self) -> &str {
        &self.form.amount
    }

    pub fn is_loading(&self) -> bool {
        self.form.loading
    }

    pub fn supported_tokens(&self) -> &[SupportedToken] {
        &self.supported_tokens
    }

    pub fn set_supported_tokens(&mut self, tokens: Vec<SupportedToken>) {
        self.supported_tokens = tokens;
    }

    /// Switches token. Balances and price belong to the previous token and
    /// are dropped until refreshed.
    pub fn select_token(&mut self, token: Token) {
        if self.form.token != token {
            self.form.token = token;
            self.form.price = 0.0;
            self.form.platform_balance = None;
            self.form.wallet_balance = None;
        }
    }

    /// Replaces the amount text if it is acceptable input. Returns whether it
    /// was taken.
    pub fn set_amount(&mut self, input: &str) -> bool {
        if is_amount_input(input) {
            self.form.amount = input.to_string();
            true
        } else {
            false
        }
    }

    pub fn push_amount_char(&mut self, c: char) -> bool {
        let mut next = self.form.amount.clone();
        next.push(c);
        self.set_amount(&next)
    }

    pub fn pop_amount_char(&mut self) {
        self.form.amount.pop();
    }

    pub fn set_price(&mut self, token: Token, price: f64) {
        if token == self.form.token {
            self.form.price = price;
        }
    }

    pub fn set_balances(
        &mut self,
        token: Token,
        platform: Option<TokenAmount>,
        wallet: Option<TokenAmount>,
    ) {
        if token == self.form.token {
            self.form.platform_balance = platform;
            self.form.wallet_balance = wallet;
        }
    }

    pub fn usd_value(&self) -> f64 {
        usd_estimate(&self.form.amount, self.form.price)
    }

    /// True when the typed amount exceeds the known platform balance.
    pub fn insufficient_balance(&self) -> bool {
        let Some(balance) = self.form.platform_balance else {
            return false;
        };
        TokenAmount::parse_decimal(&self.form.amount)
            .map(|amount| amount > balance)
            .unwrap_or(false)
    }

    /// Builds the request for `wallet`, or the validation error that stops
    /// the submission before any network call.
    pub fn prepare(
        &self,
        wallet: Option<&AccountAddress>,
    ) -> Result<WithdrawalRequest, WithdrawalError> {
        let wallet = wallet.ok_or(WithdrawalError::WalletNotConnected)?;
        let amount = TokenAmount::parse_decimal(&self.form.amount)?;
        if amount.is_zero() {
            return Err(WithdrawalError::ZeroAmount);
        }
        let token = self
            .form
            .token
            .resolve(&self.supported_tokens)
            .ok_or(WithdrawalError::UnsupportedToken(self.form.token))?;
        Ok(WithdrawalRequest::new(
            wallet.clone(),
            amount,
            token.address.clone(),
        ))
    }

    pub async fn submit<B: WithdrawalBackend>(
        &mut self,
        backend: &B,
        wallet: Option<&AccountAddress>,
    ) -> WithdrawOutcome {
        self.form.loading = true;
        let request = match self.prepare(wallet) {
            Ok(request) => request,
            Err(WithdrawalError::WalletNotConnected) => {
                self.form.loading = false;
                info!("withdrawal requested without a connected wallet");
                return WithdrawOutcome::ConnectWallet;
            }
            Err(err) => {
                self.form.loading = false;
                warn!(error = %err, amount = %self.form.amount, "withdrawal rejected");
                return WithdrawOutcome::Warning(err.to_string());
            }
        };
        let typed_amount = self.form.amount.clone();
        let result = backend.withdraw(&request).await;
        self.form.loading = false;
        self.form.amount.clear();
        match result {
            Ok(receipt) => {
                info!(
                    tx = %receipt.transaction_hash,
                    token = %self.form.token,
                    "withdrawal submitted"
                );
                WithdrawOutcome::Submitted(TransactionSummary {
                    transaction_hash: receipt.transaction_hash,
                    receiver: request.account_address,
                    amount: typed_amount,
                    token: self.form.token,
                })
            }
            Err(err) => {
                error!(error = %err, "withdrawal failed");
                WithdrawOutcome::Failed(err.to_string())
            }
        }
    }
}
