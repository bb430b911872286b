use super::{
    Token,
    TokenAmount,
    WithdrawalError,
};
use crate::wallets::AccountAddress;
use reqwest::StatusCode;
use serde::{
    Deserialize,
    Serialize,
    de::DeserializeOwned,
};
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_PRICE_API_URL: &str = "https://api.coingecko.com/api/v3";
pub const GENERIC_WITHDRAWAL_FAILURE: &str = "Withdrawal failed";

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SupportedToken {
    pub symbol: String,
    pub address: AccountAddress,
}

/// Body of a withdrawal submission. `amount` is the decimal string of
/// 18-decimal base units.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub account_address: AccountAddress,
    pub amount: String,
    pub token_address: AccountAddress,
}

impl WithdrawalRequest {
    pub fn new(
        account_address: AccountAddress,
        amount: TokenAmount,
        token_address: AccountAddress,
    ) -> Self {
        Self {
            account_address,
            amount: amount.base_units().to_string(),
            token_address,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub transaction_hash: String,
}

/// Platform service that holds the player's in-game balance and executes
/// withdrawals.
pub trait WithdrawalBackend {
    fn withdraw(
        &self,
        request: &WithdrawalRequest,
    ) -> impl Future<Output = Result<WithdrawalReceipt, WithdrawalError>>;

    fn supported_tokens(
        &self,
    ) -> impl Future<Output = Result<Vec<SupportedToken>, WithdrawalError>>;
}

pub trait BalanceSource {
    fn balance(
        &self,
        address: &AccountAddress,
        token: &SupportedToken,
    ) -> impl Future<Output = Result<TokenAmount, WithdrawalError>>;
}

/// Source of USD quotes. Polled from a spawned task, hence `Send`.
pub trait PriceFeed {
    fn usd_price(
        &self,
        token: Token,
    ) -> impl Future<Output = Result<f64, WithdrawalError>> + Send;
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfoDto {
    account_address: AccountAddress,
}

#[derive(Debug, Deserialize)]
struct BalanceDto {
    balance: String,
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, WithdrawalError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().build()?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Address of the platform account whose balance the player withdraws.
    pub async fn platform_account(&self) -> Result<AccountAddress, WithdrawalError> {
        let url = format!("{}/user/info", self.base_url);
        let res = self.http.get(url).send().await?;
        let info: UserInfoDto = read_data(res).await?;
        Ok(info.account_address)
    }

    async fn fetch_balance(
        &self,
        address: &AccountAddress,
        token: &SupportedToken,
    ) -> Result<TokenAmount, WithdrawalError> {
        let url = format!("{}/balance", self.base_url);
        let res = self
            .http
            .get(url)
            .query(&[("address", address.as_str()), ("token", token.address.as_str())])
            .send()
            .await?;
        let dto: BalanceDto = read_data(res).await?;
        parse_balance(&token.symbol, &dto.balance)
    }
}

impl WithdrawalBackend for ApiClient {
    async fn withdraw(
        &self,
        request: &WithdrawalRequest,
    ) -> Result<WithdrawalReceipt, WithdrawalError> {
        let url = format!("{}/withdraw", self.base_url);
        debug!(account = %request.account_address, amount = %request.amount, "submitting withdrawal");
        let res = self.http.post(url).json(request).send().await?;
        read_data(res).await
    }

    async fn supported_tokens(&self) -> Result<Vec<SupportedToken>, WithdrawalError> {
        let url = format!("{}/supported-tokens", self.base_url);
        let res = self.http.get(url).send().await?;
        read_data(res).await
    }
}

impl BalanceSource for ApiClient {
    async fn balance(
        &self,
        address: &AccountAddress,
        token: &SupportedToken,
    ) -> Result<TokenAmount, WithdrawalError> {
        self.fetch_balance(address, token).await
    }
}

async fn read_json<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, WithdrawalError> {
    let status = res.status();
    let bytes = res.bytes().await?;
    decode_json(status, &bytes)
}

async fn read_data<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, WithdrawalError> {
    let status = res.status();
    let bytes = res.bytes().await?;
    decode_data(status, &bytes)
}

/// Decodes a platform reply: failures go through [`remote_failure`], a
/// successful body must be JSON of type `T`.
pub fn decode_json<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
) -> Result<T, WithdrawalError> {
    if !status.is_success() {
        return Err(remote_failure(status, body));
    }
    serde_json::from_slice(body)
        .map_err(|e| WithdrawalError::Remote(format!("unexpected response payload: {e}")))
}

/// Like [`decode_json`] for replies wrapped in `{"data": ...}`.
pub fn decode_data<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
) -> Result<T, WithdrawalError> {
    decode_json::<DataEnvelope<T>>(status, body).map(|envelope| envelope.data)
}

/// Balances travel as decimal strings of base units.
pub fn parse_balance(symbol: &str, raw: &str) -> Result<TokenAmount, WithdrawalError> {
    raw.trim()
        .parse::<u128>()
        .map(TokenAmount::from_base_units)
        .map_err(|_| {
            WithdrawalError::Remote(format!("balance for {symbol} is not a number: {raw}"))
        })
}

/// Maps a failed response to the message shown to the player: the server's
/// `message` when it sent one, otherwise a generic text.
pub fn remote_failure(status: StatusCode, body: &[u8]) -> WithdrawalError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty());
    match message {
        Some(message) => WithdrawalError::Remote(message),
        None => {
            debug!(%status, "remote failure without message");
            WithdrawalError::Remote(GENERIC_WITHDRAWAL_FAILURE.to_string())
        }
    }
}

/// Price quotes in CoinGecko's `simple/price` format.
#[derive(Clone)]
pub struct CoingeckoClient {
    base_url: String,
    http: reqwest::Client,
}

impl CoingeckoClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, WithdrawalError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().build()?;
        Ok(Self { base_url, http })
    }

    pub async fn fetch_usd_price(&self, token: Token) -> Result<f64, WithdrawalError> {
        let url = format!("{}/simple/price", self.base_url);
        let res = self
            .http
            .get(url)
            .query(&[("ids", token.coingecko_id()), ("vs_currencies", "usd")])
            .send()
            .await?;
        let quotes: HashMap<String, HashMap<String, f64>> = read_json(res).await?;
        parse_usd_quote(&quotes, token)
    }
}

impl PriceFeed for CoingeckoClient {
    async fn usd_price(&self, token: Token) -> Result<f64, WithdrawalError> {
        self.fetch_usd_price(token).await
    }
}

fn parse_usd_quote(
    quotes: &HashMap<String, HashMap<String, f64>>,
    token: Token,
) -> Result<f64, WithdrawalError> {
    quotes
        .get(token.coingecko_id())
        .and_then(|q| q.get("usd"))
        .copied()
        .ok_or_else(|| {
            WithdrawalError::Remote(format!("no USD quote for {}", token.symbol()))
        })
}
