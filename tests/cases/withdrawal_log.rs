use roulette_table::{
    test_helpers::{
        FakeBackend,
        address,
    },
    withdrawal::{
        WithdrawOutcome,
        WithdrawalBackend,
        WithdrawalFlow,
        receipts::{
            NetworkEnv,
            WithdrawalLog,
            WithdrawalRecord,
        },
    },
};
use tempdir::TempDir;

#[tokio::test]
async fn record__logs_submitted_withdrawal_per_network() {
    // given
    let root = TempDir::new("withdrawal-log").unwrap();
    let backend = FakeBackend::succeeding("0x5eed");
    let wallet = address("0xbeef");
    let mut flow = WithdrawalFlow::new();
    flow.set_supported_tokens(backend.supported_tokens().await.unwrap());
    flow.set_amount("0.25");
    let WithdrawOutcome::Submitted(summary) = flow.submit(&backend, Some(&wallet)).await
    else {
        panic!("withdrawal was not submitted");
    };

    // when
    let mainnet = WithdrawalLog::open(root.path(), NetworkEnv::Mainnet).unwrap();
    let added = mainnet
        .record(WithdrawalRecord::from_summary(&summary, Some("http://api.test")))
        .unwrap();
    let local = WithdrawalLog::open(root.path(), NetworkEnv::Local).unwrap();

    // then
    assert!(added);
    let records = mainnet.load().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].transaction_hash, "0x5eed");
    assert_eq!(records[0].receiver, "0xbeef");
    assert_eq!(records[0].amount, "0.25");
    assert_eq!(records[0].token, "STRK");
    assert_eq!(records[0].api_url.as_deref(), Some("http://api.test"));
    assert!(chrono::DateTime::parse_from_rfc3339(&records[0].submitted_at).is_ok());
    assert!(local.load().unwrap().is_empty());
    assert_eq!(local.find("0x5eed").unwrap(), None);
    assert_eq!(mainnet.find("0x5eed").unwrap().as_ref(), records.first());
    assert!(mainnet.path().ends_with("mainnet/withdrawals.json"));
}
