use roulette_table::{
    test_helpers::{
        ETH_ADDRESS,
        FakeBackend,
        address,
    },
    withdrawal::{
        Token,
        WithdrawOutcome,
        WithdrawalBackend,
        WithdrawalError,
        WithdrawalFlow,
        ZERO_AMOUNT_WARNING,
        api::{
            GENERIC_WITHDRAWAL_FAILURE,
            remote_failure,
        },
    },
};

const PLAYER: &str = "0x0123456789abcdef";

async fn flow_with_tokens(backend: &FakeBackend) -> WithdrawalFlow {
    let mut flow = WithdrawalFlow::new();
    flow.set_supported_tokens(backend.supported_tokens().await.unwrap());
    flow
}

#[tokio::test]
async fn submit__without_wallet_asks_to_connect() {
    // given
    let backend = FakeBackend::succeeding("0xabc");
    let mut flow = flow_with_tokens(&backend).await;
    flow.set_amount("3");

    // when
    let outcome = flow.submit(&backend, None).await;

    // then
    assert_eq!(outcome, WithdrawOutcome::ConnectWallet);
    assert_eq!(flow.amount(), "3");
    assert!(backend.requests().is_empty());
    assert!(!flow.is_loading());
}

#[tokio::test]
async fn submit__zero_amount_warns_without_request() {
    let backend = FakeBackend::succeeding("0xabc");
    let wallet = address(PLAYER);
    for amount in ["", "0", "0.0", "00.000"] {
        let mut flow = flow_with_tokens(&backend).await;
        flow.set_amount(amount);
        let outcome = flow.submit(&backend, Some(&wallet)).await;
        assert_eq!(
            outcome,
            WithdrawOutcome::Warning(ZERO_AMOUNT_WARNING.to_string()),
            "amount {amount:?}"
        );
        assert_eq!(flow.amount(), amount);
    }
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn submit__sends_scaled_amount_and_token_address() {
    // given
    let backend = FakeBackend::succeeding("0xfeed");
    let wallet = address(PLAYER);
    let mut flow = flow_with_tokens(&backend).await;
    flow.select_token(Token::Eth);
    flow.set_amount("1.5");

    // when
    let outcome = flow.submit(&backend, Some(&wallet)).await;

    // then
    let WithdrawOutcome::Submitted(summary) = outcome else {
        panic!("expected a submitted withdrawal, got {outcome:?}");
    };
    assert_eq!(summary.transaction_hash, "0xfeed");
    assert_eq!(summary.receiver, wallet);
    assert_eq!(summary.amount, "1.5");
    assert_eq!(summary.token, Token::Eth);
    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount, "1500000000000000000");
    assert_eq!(requests[0].token_address, address(ETH_ADDRESS));
    assert_eq!(requests[0].account_address, wallet);
    assert_eq!(flow.amount(), "");
}

#[tokio::test]
async fn submit__remote_failure_clears_amount_and_reports_message() {
    // given
    let backend = FakeBackend::failing(WithdrawalError::Remote("Daily limit reached".into()));
    let wallet = address(PLAYER);
    let mut flow = flow_with_tokens(&backend).await;
    flow.set_amount("2");

    // when
    let outcome = flow.submit(&backend, Some(&wallet)).await;

    // then
    assert_eq!(outcome, WithdrawOutcome::Failed("Daily limit reached".to_string()));
    assert_eq!(flow.amount(), "");
    assert_eq!(backend.requests().len(), 1);
}

#[test]
fn remote_failure__falls_back_to_generic_message() {
    let status = reqwest::StatusCode::BAD_REQUEST;
    assert_eq!(
        remote_failure(status, br#"{"message":"Not enough balance"}"#),
        WithdrawalError::Remote("Not enough balance".to_string())
    );
    assert_eq!(
        remote_failure(status, b"<html>oops</html>"),
        WithdrawalError::Remote(GENERIC_WITHDRAWAL_FAILURE.to_string())
    );
}

#[test]
fn usd_value__uses_quote_for_selected_token() {
    let mut flow = WithdrawalFlow::new();
    flow.set_amount("2.5");
    flow.set_price(Token::Strk, 0.4);
    flow.set_price(Token::Eth, 2000.0);
    assert!((flow.usd_value() - 1.0).abs() < 1e-9);
    flow.select_token(Token::Eth);
    assert_eq!(flow.usd_value(), 0.0);
    flow.set_price(Token::Eth, 2000.0);
    assert!((flow.usd_value() - 5000.0).abs() < 1e-9);
}
