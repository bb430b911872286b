use roulette_table::{
    test_helpers::{
        ETH_ADDRESS,
        STRK_ADDRESS,
        StubServer,
        address,
        supported_tokens,
    },
    withdrawal::{
        ApiClient,
        BalanceSource,
        CoingeckoClient,
        PriceFeed,
        Token,
        TokenAmount,
        WithdrawOutcome,
        WithdrawalBackend,
        WithdrawalError,
        WithdrawalFlow,
        api::GENERIC_WITHDRAWAL_FAILURE,
    },
};

const PLAYER: &str = "0x0123456789abcdef";

fn tokens_body() -> String {
    format!(
        r#"{{"data":[{{"symbol":"STRK","address":"{STRK_ADDRESS}"}},{{"symbol":"ETH","address":"{ETH_ADDRESS}"}}]}}"#
    )
}

#[tokio::test]
async fn supported_tokens__unwraps_data_envelope() {
    // given
    let body = tokens_body();
    let server = StubServer::start(&[("/supported-tokens", 200, body.as_str())]).await;
    let api = ApiClient::new(server.base_url()).unwrap();

    // when
    let tokens = api.supported_tokens().await.unwrap();

    // then
    assert_eq!(tokens, supported_tokens());
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].target, "/supported-tokens");
}

#[tokio::test]
async fn platform_account__reads_user_info() {
    let server = StubServer::start(&[(
        "/user/info",
        200,
        r#"{"data":{"account_address":"0xFEE"}}"#,
    )])
    .await;
    let api = ApiClient::new(format!("{}/", server.base_url())).unwrap();
    assert_eq!(api.platform_account().await.unwrap(), address("0xfee"));
}

#[tokio::test]
async fn balance__queries_holder_and_token_address() {
    // given
    let server = StubServer::start(&[(
        "/balance",
        200,
        r#"{"data":{"balance":"2500000000000000000"}}"#,
    )])
    .await;
    let api = ApiClient::new(server.base_url()).unwrap();
    let tokens = supported_tokens();

    // when
    let balance = api.balance(&address(PLAYER), &tokens[1]).await.unwrap();

    // then
    assert_eq!(balance, TokenAmount::parse_decimal("2.5").unwrap());
    assert_eq!(
        server.requests()[0].target,
        format!("/balance?address={PLAYER}&token={ETH_ADDRESS}")
    );
}

#[tokio::test]
async fn balance__rejects_non_numeric_value() {
    let server =
        StubServer::start(&[("/balance", 200, r#"{"data":{"balance":"0x10"}}"#)]).await;
    let api = ApiClient::new(server.base_url()).unwrap();
    let result = api.balance(&address(PLAYER), &supported_tokens()[0]).await;
    assert_eq!(
        result,
        Err(WithdrawalError::Remote(
            "balance for STRK is not a number: 0x10".to_string()
        ))
    );
}

#[tokio::test]
async fn withdraw__rejects_success_without_envelope() {
    // given
    let server = StubServer::start(&[("/withdraw", 200, r#"{"transaction_hash":"0x1"}"#)]).await;
    let api = ApiClient::new(server.base_url()).unwrap();
    let mut flow = WithdrawalFlow::new();
    flow.set_supported_tokens(supported_tokens());
    flow.set_amount("1");

    // when
    let outcome = flow.submit(&api, Some(&address(PLAYER))).await;

    // then
    let WithdrawOutcome::Failed(message) = outcome else {
        panic!("expected a failed withdrawal, got {outcome:?}");
    };
    assert!(message.starts_with("unexpected response payload"), "{message}");
}

#[tokio::test]
async fn withdraw__posts_request_and_returns_transaction_hash() {
    // given
    let server = StubServer::start(&[(
        "/withdraw",
        200,
        r#"{"data":{"transaction_hash":"0x5eed"}}"#,
    )])
    .await;
    let api = ApiClient::new(server.base_url()).unwrap();
    let mut flow = WithdrawalFlow::new();
    flow.set_supported_tokens(supported_tokens());
    flow.select_token(Token::Eth);
    flow.set_amount("0.75");

    // when
    let outcome = flow.submit(&api, Some(&address(PLAYER))).await;

    // then
    let WithdrawOutcome::Submitted(summary) = outcome else {
        panic!("expected a submitted withdrawal, got {outcome:?}");
    };
    assert_eq!(summary.transaction_hash, "0x5eed");
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].target, "/withdraw");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "account_address": PLAYER,
            "amount": "750000000000000000",
            "token_address": ETH_ADDRESS,
        })
    );
}

#[tokio::test]
async fn withdraw__surfaces_server_message_on_failure() {
    // given
    let server = StubServer::start(&[
        ("/withdraw", 400, r#"{"message":"Daily limit reached"}"#),
        ("/supported-tokens", 503, "Service Unavailable"),
    ])
    .await;
    let api = ApiClient::new(server.base_url()).unwrap();
    let mut flow = WithdrawalFlow::new();
    flow.set_supported_tokens(supported_tokens());
    flow.set_amount("3");

    // when
    let outcome = flow.submit(&api, Some(&address(PLAYER))).await;
    let tokens = api.supported_tokens().await;

    // then
    assert_eq!(outcome, WithdrawOutcome::Failed("Daily limit reached".to_string()));
    assert_eq!(flow.amount(), "");
    assert_eq!(
        tokens,
        Err(WithdrawalError::Remote(GENERIC_WITHDRAWAL_FAILURE.to_string()))
    );
}

#[tokio::test]
async fn usd_price__queries_simple_price_by_coingecko_id() {
    // given
    let server = StubServer::start(&[(
        "/simple/price",
        200,
        r#"{"starknet":{"usd":0.42}}"#,
    )])
    .await;
    let prices = CoingeckoClient::new(server.base_url()).unwrap();

    // when
    let strk = prices.usd_price(Token::Strk).await;
    let eth = prices.usd_price(Token::Eth).await;

    // then
    assert_eq!(strk, Ok(0.42));
    assert_eq!(
        eth,
        Err(WithdrawalError::Remote("no USD quote for ETH".to_string()))
    );
    let targets: Vec<String> = server.requests().into_iter().map(|r| r.target).collect();
    assert_eq!(
        targets,
        vec![
            "/simple/price?ids=starknet&vs_currencies=usd".to_string(),
            "/simple/price?ids=ethereum&vs_currencies=usd".to_string(),
        ]
    );
}
