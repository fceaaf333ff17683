//! Transaction pipeline behaviour against the in-memory chain.

use alloy::primitives::TxHash;
use std::time::Duration;
use token_gateway::blockchain::types::{ConfirmationStatus, ReceiptView};
use token_gateway::GatewayError;

mod common;

#[tokio::test]
async fn test_invalid_amount_makes_no_remote_calls() {
    let chain = common::chain();
    let pipeline = common::pipeline(&chain, true);

    for bad in ["-1", "1.5e3", "abc", "0.0000000000000000001", ""] {
        let err = pipeline
            .transfer_with_details(common::RECIPIENT, bad, "memo")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidAmount(_)), "{bad}: {err}");
    }
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_address_makes_no_remote_calls() {
    let chain = common::chain();
    let pipeline = common::pipeline(&chain, true);

    let err = pipeline.mint("0x1234", "1").await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidAddress(_)));
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn test_transfer_submits_one_signed_transaction() {
    let chain = common::chain();
    chain.set_mined_nonce(7);
    let pipeline = common::pipeline(&chain, true);

    let pending = pipeline
        .transfer_with_details(common::RECIPIENT, "2.5", "rent")
        .await
        .unwrap();

    assert_eq!(pending.nonce, 7);
    assert_eq!(pending.from, common::wallet().address());
    let submitted = chain.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].tx_hash, pending.transaction_hash);
    assert_eq!(
        chain.calls(),
        [
            "eth_estimateGas",
            "eth_gasPrice",
            "eth_getTransactionCount",
            "eth_sendRawTransaction"
        ]
    );
}

#[tokio::test]
async fn test_would_revert_never_signs_or_consumes_nonce() {
    let chain = common::chain();
    chain.set_revert("ERC20: transfer amount exceeds balance");
    let pipeline = common::pipeline(&chain, true);

    let err = pipeline
        .transfer_with_details(common::RECIPIENT, "1000000", "")
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::WouldRevert(_)));
    assert_eq!(chain.call_count("eth_getTransactionCount"), 0);
    assert_eq!(chain.call_count("eth_sendRawTransaction"), 0);
    assert!(chain.submitted().is_empty());
}

#[tokio::test]
async fn test_unavailable_chain() {
    let chain = common::chain();
    chain.set_unavailable(true);
    let pipeline = common::pipeline(&chain, true);

    let err = pipeline.burn("1").await.unwrap_err();
    assert!(matches!(err, GatewayError::ChainUnavailable(_)));
    // One attempt, no retry.
    assert_eq!(chain.calls(), ["eth_estimateGas"]);
}

#[tokio::test]
async fn test_concurrent_transfers_conflict_without_serialization() {
    let chain = common::chain();
    let pipeline = common::pipeline(&chain, false);

    let (a, b) = tokio::join!(
        pipeline.transfer_with_details(common::RECIPIENT, "1", "a"),
        pipeline.transfer_with_details(common::RECIPIENT, "1", "b"),
    );

    let results = [a, b];
    let ok = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(GatewayError::NonceConflict(_))))
        .count();
    assert_eq!(ok, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(chain.submitted().len(), 1);
}

#[tokio::test]
async fn test_concurrent_transfers_succeed_with_serialization() {
    let chain = common::chain();
    chain.set_mined_nonce(3);
    let pipeline = common::pipeline(&chain, true);

    let (a, b) = tokio::join!(
        pipeline.transfer_with_details(common::RECIPIENT, "1", "a"),
        pipeline.transfer_with_details(common::RECIPIENT, "1", "b"),
    );

    let mut nonces = vec![a.unwrap().nonce, b.unwrap().nonce];
    nonces.sort_unstable();
    assert_eq!(nonces, [3, 4]);
}

#[tokio::test]
async fn test_local_nonce_follows_chain_when_ahead() {
    let chain = common::chain();
    let pipeline = common::pipeline(&chain, true);

    assert_eq!(pipeline.burn("1").await.unwrap().nonce, 0);
    assert_eq!(pipeline.burn("1").await.unwrap().nonce, 1);

    // Another signer used the same key; the chain is now at 5.
    chain.set_mined_nonce(5);
    assert_eq!(pipeline.burn("1").await.unwrap().nonce, 5);
}

#[tokio::test]
async fn test_rejected_submission_resets_local_nonce() {
    let chain = common::chain();
    let pipeline = common::pipeline(&chain, true);

    assert_eq!(pipeline.burn("1").await.unwrap().nonce, 0);

    chain.reject_next_submission("replacement transaction underpriced");
    let err = pipeline.burn("1").await.unwrap_err();
    assert!(matches!(err, GatewayError::NonceConflict(_)));

    // The pool dropped nonce 0; the chain still reports 0.
    chain.evict_pending();
    assert_eq!(pipeline.burn("1").await.unwrap().nonce, 0);
}

#[tokio::test]
async fn test_dropped_request_still_records_submitted_nonce() {
    let chain = common::chain();
    chain.set_submit_delay(Duration::from_millis(200));
    let pipeline = common::pipeline(&chain, true);

    // The caller gives up while the node is still answering.
    let first = tokio::time::timeout(Duration::from_millis(50), pipeline.burn("1")).await;
    assert!(first.is_err());
    assert_eq!(chain.submitted().len(), 1);

    chain.set_submit_delay(Duration::ZERO);
    let second = pipeline.burn("1").await.unwrap();
    assert_eq!(second.nonce, 1);
    let nonces: Vec<_> = chain.submitted().iter().map(|s| s.nonce).collect();
    assert_eq!(nonces, [0, 1]);
}

#[tokio::test]
async fn test_busy_sender_times_out_in_queue() {
    let chain = common::chain();
    chain.set_submit_delay(Duration::from_millis(200));
    let pipeline = common::pipeline(&chain, true).with_nonce_wait(Duration::from_millis(20));

    let (a, b) = tokio::join!(pipeline.burn("1"), pipeline.burn("1"));

    assert_eq!(a.unwrap().nonce, 0);
    let err = b.unwrap_err();
    assert!(matches!(err, GatewayError::NonceConflict(_)), "{err}");
    assert!(err.to_string().contains("still busy"));
    assert_eq!(chain.submitted().len(), 1);
}

#[tokio::test]
async fn test_await_confirmation_reaches_depth() {
    let chain = common::chain();
    let pipeline = common::pipeline(&chain, true);
    let pending = pipeline.burn("1").await.unwrap();

    chain.insert_receipt(ReceiptView {
        transaction_hash: pending.transaction_hash,
        block_number: Some(10),
        success: true,
        logs: vec![],
    });
    chain.set_block_number(11);

    let status = pipeline
        .await_confirmation(pending.transaction_hash, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(status, ConfirmationStatus::Confirmed { block_number: 10 });
}

#[tokio::test]
async fn test_await_confirmation_reports_revert() {
    let chain = common::chain();
    let pipeline = common::pipeline(&chain, true);
    let tx = TxHash::repeat_byte(0x42);

    chain.insert_receipt(ReceiptView {
        transaction_hash: tx,
        block_number: Some(4),
        success: false,
        logs: vec![],
    });
    chain.set_block_number(4);

    let status = pipeline
        .await_confirmation(tx, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(status, ConfirmationStatus::Reverted { block_number: 4 });
}

#[tokio::test]
async fn test_await_confirmation_deadline_returns_last_status() {
    let chain = common::chain();
    let pipeline = common::pipeline(&chain, true);
    let tx = TxHash::repeat_byte(0x43);

    let status = pipeline
        .await_confirmation(tx, Duration::from_millis(50))
        .await
        .unwrap();
    assert_eq!(status, ConfirmationStatus::Pending);

    // Mined but one block short of the required depth of 2.
    chain.insert_receipt(ReceiptView {
        transaction_hash: tx,
        block_number: Some(8),
        success: true,
        logs: vec![],
    });
    chain.set_block_number(8);

    let status = pipeline
        .await_confirmation(tx, Duration::from_millis(50))
        .await
        .unwrap();
    assert_eq!(
        status,
        ConfirmationStatus::Confirming {
            block_number: 8,
            current: 1,
            required: 2
        }
    );
}
