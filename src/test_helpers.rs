use crate::{
    board::{
        Board,
        ClickMode,
        apply_click,
    },
    slot::{
        ChipValue,
        SlotId,
    },
    wallets::AccountAddress,
    withdrawal::{
        PriceFeed,
        SupportedToken,
        Token,
        WithdrawalBackend,
        WithdrawalError,
        WithdrawalReceipt,
        WithdrawalRequest,
    },
};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
    },
};
use tokio::{
    io::{
        AsyncReadExt,
        AsyncWriteExt,
    },
    net::{
        TcpListener,
        TcpStream,
    },
};

pub const STRK_ADDRESS: &str =
    "0x04718f5a0fc34cc1af16a1cdee98ffb20c31f5cd61d6ab07201858f4287c938d";
pub const ETH_ADDRESS: &str =
    "0x049d36570d4e46f48e99674bd3fcc84644ddd6b96f7c741b1562b82f9e004dc7";

pub fn chip(value: u64) -> ChipValue {
    ChipValue::new(value).unwrap()
}

pub fn address(raw: &str) -> AccountAddress {
    AccountAddress::parse(raw).unwrap()
}

/// Roulette board with `placements` applied in order.
pub fn board_with(placements: &[(u8, u64)]) -> Board {
    placements
        .iter()
        .fold(Board::roulette(), |board, (id, value)| {
            apply_click(&board, SlotId(*id), Some(chip(*value)), ClickMode::Place)
                .unwrap()
        })
}

pub fn coins_at(board: &Board, id: u8) -> Vec<u64> {
    board
        .get(SlotId(id))
        .unwrap()
        .coins
        .iter()
        .map(|c| c.get())
        .collect()
}

pub fn supported_tokens() -> Vec<SupportedToken> {
    vec![
        SupportedToken {
            symbol: "STRK".to_string(),
            address: address(STRK_ADDRESS),
        },
        SupportedToken {
            symbol: "ETH".to_string(),
            address: address(ETH_ADDRESS),
        },
    ]
}

/// In-memory platform backend recording every request it receives.
#[derive(Clone)]
pub struct FakeBackend {
    response: Result<WithdrawalReceipt, WithdrawalError>,
    requests: Arc<Mutex<Vec<WithdrawalRequest>>>,
}

impl FakeBackend {
    pub fn succeeding(transaction_hash: &str) -> Self {
        Self::with_response(Ok(WithdrawalReceipt {
            transaction_hash: transaction_hash.to_string(),
        }))
    }

    pub fn failing(error: WithdrawalError) -> Self {
        Self::with_response(Err(error))
    }

    fn with_response(response: Result<WithdrawalReceipt, WithdrawalError>) -> Self {
        Self {
            response,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<WithdrawalRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl WithdrawalBackend for FakeBackend {
    async fn withdraw(
        &self,
        request: &WithdrawalRequest,
    ) -> Result<WithdrawalReceipt, WithdrawalError> {
        self.requests.lock().unwrap().push(request.clone());
        self.response.clone()
    }

    async fn supported_tokens(&self) -> Result<Vec<SupportedToken>, WithdrawalError> {
        Ok(supported_tokens())
    }
}

/// Quotes from a fixed table. Tokens without an entry fail.
pub struct FixedPrices {
    prices: HashMap<Token, f64>,
}

impl FixedPrices {
    pub fn new(prices: &[(Token, f64)]) -> Self {
        Self {
            prices: prices.iter().copied().collect(),
        }
    }
}

impl PriceFeed for FixedPrices {
    async fn usd_price(&self, token: Token) -> Result<f64, WithdrawalError> {
        self.prices
            .get(&token)
            .copied()
            .ok_or_else(|| WithdrawalError::Remote(format!("no price for {token}")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    /// Path plus query string, as sent on the request line.
    pub target: String,
    pub body: String,
}

/// Loopback HTTP/1.1 server answering each route (matched on the path
/// without query) with a fixed status and JSON body. Unknown paths get 404.
pub struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start(routes: &[(&str, u16, &str)]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let routes: HashMap<String, (u16, String)> = routes
            .iter()
            .map(|(path, status, body)| (path.to_string(), (*status, body.to_string())))
            .collect();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                respond(stream, &routes, &recorded).await;
            }
        });
        Self { base_url, requests }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn respond(
    mut stream: TcpStream,
    routes: &HashMap<String, (u16, String)>,
    recorded: &Mutex<Vec<RecordedRequest>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let body_end = buf.len().min(head_end + content_length);
    let mut request_line = head.split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or("/").to_string();
    let path = target.split('?').next().unwrap_or_default().to_string();
    recorded.lock().unwrap().push(RecordedRequest {
        method,
        target,
        body: String::from_utf8_lossy(&buf[head_end..body_end]).into_owned(),
    });

    let (status, payload) = routes
        .get(&path)
        .cloned()
        .unwrap_or((404, String::from(r#"{"message":"not found"}"#)));
    let response = format!(
        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
