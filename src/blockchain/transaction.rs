//! Transaction building, signing, submission and optional confirmation.
//!
//! # Responsibilities
//! - Validate and convert the caller's intent before any remote call
//! - Estimate gas by simulation; never sign a call that would revert
//! - Read gas price and nonce, sign once, submit once
//! - Report submission, not finality; confirmation is a separate call
//! - Once signing starts, finish the submission even if the caller goes away
//!
//! # Ordering
//! ```text
//! amount → call data → eth_estimateGas → [nonce slot] eth_gasPrice, eth_getTransactionCount
//!     → sign → eth_sendRawTransaction → PendingTransfer
//! ```

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol_types::SolCall;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::abi::ITCoin;
use crate::blockchain::client::ChainClient;
use crate::blockchain::nonce::NonceManager;
use crate::blockchain::parse_address;
use crate::blockchain::types::{
    CallRequest, ConfirmationStatus, PendingTransfer, UnsignedTxDescriptor,
};
use crate::blockchain::wallet::Wallet;
use crate::error::{GatewayError, GatewayResult};
use crate::numeric::NumericCodec;
use crate::observability::metrics;

/// A state-changing contract call the gateway can submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenIntent {
    TransferWithDetails {
        to: Address,
        amount: U256,
        message: String,
    },
    Mint {
        to: Address,
        amount: U256,
    },
    Burn {
        amount: U256,
    },
}

impl TokenIntent {
    /// Label used in logs and metrics.
    pub fn operation(&self) -> &'static str {
        match self {
            TokenIntent::TransferWithDetails { .. } => "transferWithDetails",
            TokenIntent::Mint { .. } => "mintTokens",
            TokenIntent::Burn { .. } => "burnTokens",
        }
    }

    /// ABI-encoded call data. Same intent, same bytes.
    pub fn call_data(&self) -> Bytes {
        match self {
            TokenIntent::TransferWithDetails {
                to,
                amount,
                message,
            } => ITCoin::transferWithDetailsCall {
                to: *to,
                amount: *amount,
                message: message.clone(),
            }
            .abi_encode(),
            TokenIntent::Mint { to, amount } => ITCoin::mintTokensCall {
                to: *to,
                amount: *amount,
            }
            .abi_encode(),
            TokenIntent::Burn { amount } => ITCoin::burnTokensCall { amount: *amount }.abi_encode(),
        }
        .into()
    }
}

/// Runs the estimate → sign → submit sequence for one custodial sender.
pub struct TransactionPipeline {
    client: Arc<dyn ChainClient>,
    wallet: Arc<Wallet>,
    nonces: NonceManager,
    contract: Address,
    codec: NumericCodec,
    confirmation_blocks: u32,
    poll_interval: Duration,
    nonce_wait: Duration,
}

impl TransactionPipeline {
    pub fn new(
        client: Arc<dyn ChainClient>,
        wallet: Arc<Wallet>,
        nonces: NonceManager,
        contract: Address,
        codec: NumericCodec,
    ) -> Self {
        Self {
            client,
            wallet,
            nonces,
            contract,
            codec,
            confirmation_blocks: 1,
            poll_interval: Duration::from_secs(2),
            nonce_wait: Duration::from_secs(30),
        }
    }

    /// Longest a request queues behind earlier submissions from the same sender.
    pub fn with_nonce_wait(mut self, wait: Duration) -> Self {
        self.nonce_wait = wait;
        self
    }

    /// Depth and polling cadence used by [`TransactionPipeline::await_confirmation`].
    pub fn with_confirmation_policy(mut self, confirmation_blocks: u32, poll_interval: Duration) -> Self {
        self.confirmation_blocks = confirmation_blocks.max(1);
        self.poll_interval = poll_interval;
        self
    }

    /// Address every transaction is sent from.
    pub fn sender(&self) -> Address {
        self.wallet.address()
    }

    pub fn codec(&self) -> NumericCodec {
        self.codec
    }

    /// `transferWithDetails(to, amount, message)` from the custodial sender.
    pub async fn transfer_with_details(
        &self,
        to: &str,
        amount: &str,
        message: &str,
    ) -> GatewayResult<PendingTransfer> {
        let intent = TokenIntent::TransferWithDetails {
            to: parse_address(to)?,
            amount: self.codec.to_base_units(amount)?,
            message: message.to_string(),
        };
        self.submit(intent).await
    }

    /// `mintTokens(to, amount)`; the sender must own the contract.
    pub async fn mint(&self, to: &str, amount: &str) -> GatewayResult<PendingTransfer> {
        let intent = TokenIntent::Mint {
            to: parse_address(to)?,
            amount: self.codec.to_base_units(amount)?,
        };
        self.submit(intent).await
    }

    /// `burnTokens(amount)` from the sender's balance.
    pub async fn burn(&self, amount: &str) -> GatewayResult<PendingTransfer> {
        let intent = TokenIntent::Burn {
            amount: self.codec.to_base_units(amount)?,
        };
        self.submit(intent).await
    }

    /// Submit a validated intent and return as soon as the node accepts it.
    pub async fn submit(&self, intent: TokenIntent) -> GatewayResult<PendingTransfer> {
        let operation = intent.operation();
        let result = self.run(intent).await;
        match &result {
            Ok(pending) => {
                metrics::record_submission(operation, "submitted");
                tracing::info!(
                    operation,
                    tx_hash = %pending.transaction_hash,
                    nonce = pending.nonce,
                    "Transaction submitted"
                );
            }
            Err(e) => {
                metrics::record_submission(operation, e.kind().as_str());
                tracing::warn!(operation, kind = %e.kind(), error = %e, "Transaction not submitted");
            }
        }
        result
    }

    async fn run(&self, intent: TokenIntent) -> GatewayResult<PendingTransfer> {
        let from = self.wallet.address();
        let call = CallRequest {
            from: Some(from),
            to: self.contract,
            data: intent.call_data(),
        };

        let gas_limit = self.client.estimate_gas(&call).await?;

        let mut slot = timeout(self.nonce_wait, self.nonces.acquire(from))
            .await
            .map_err(|_| {
                GatewayError::NonceConflict(format!(
                    "sender {} still busy after {:?}",
                    from, self.nonce_wait
                ))
            })?;
        let gas_price = self.client.gas_price().await?;
        let chain_nonce = self.client.transaction_count(from).await?;
        let nonce = slot.next(chain_nonce);

        tracing::debug!(
            operation = intent.operation(),
            gas_limit,
            gas_price,
            chain_nonce,
            nonce,
            "Signing transaction"
        );

        let descriptor = UnsignedTxDescriptor {
            from,
            to: call.to,
            call_data: call.data,
            gas_limit,
            gas_price,
            nonce,
            chain_id: self.wallet.chain_id(),
        };
        let client = self.client.clone();
        let wallet = self.wallet.clone();

        // Detached so a dropped request cannot stop between send and commit.
        let submission: JoinHandle<GatewayResult<PendingTransfer>> = tokio::spawn(async move {
            let payload = wallet.sign_transaction(descriptor)?;
            let local_hash = payload.tx_hash();

            slot.begin_submit();
            match client.send_raw_transaction(payload).await {
                Ok(node_hash) => {
                    slot.commit(nonce);
                    if node_hash != local_hash {
                        tracing::warn!(
                            local = %local_hash,
                            node = %node_hash,
                            "Node reported a different transaction hash"
                        );
                    }
                    Ok(PendingTransfer {
                        transaction_hash: local_hash,
                        from,
                        nonce,
                    })
                }
                Err(e) => {
                    slot.invalidate();
                    Err(e)
                }
            }
        });

        submission
            .await
            .map_err(|e| GatewayError::Rpc(format!("submission task failed: {}", e)))?
    }

    /// Poll for the receipt of `tx_hash` until it is deep enough, reverted,
    /// or `wait` elapses. On deadline the last observed status is returned.
    pub async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        wait: Duration,
    ) -> GatewayResult<ConfirmationStatus> {
        let mut last = ConfirmationStatus::Pending;
        let polled = timeout(wait, self.poll_confirmation(tx_hash, &mut last)).await;

        match polled {
            Ok(result) => result,
            Err(_) => Ok(last),
        }
    }

    async fn poll_confirmation(
        &self,
        tx_hash: TxHash,
        last: &mut ConfirmationStatus,
    ) -> GatewayResult<ConfirmationStatus> {
        let required = self.confirmation_blocks;
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let receipt = match self.client.transaction_receipt(tx_hash).await? {
                Some(r) => r,
                None => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    *last = ConfirmationStatus::Pending;
                    continue;
                }
            };

            let current_block = self.client.block_number().await?;
            let tx_block = receipt.block_number.unwrap_or(current_block);

            if !receipt.success {
                return Ok(ConfirmationStatus::Reverted {
                    block_number: tx_block,
                });
            }

            let depth = current_block.saturating_sub(tx_block).saturating_add(1);
            let depth = u32::try_from(depth).unwrap_or(u32::MAX);
            if depth >= required {
                return Ok(ConfirmationStatus::Confirmed {
                    block_number: tx_block,
                });
            }

            tracing::debug!(
                tx_hash = %tx_hash,
                confirmations = depth,
                required,
                "Waiting for confirmations"
            );
            *last = ConfirmationStatus::Confirming {
                block_number: tx_block,
                current: depth,
                required,
            };
        }
    }
}

impl std::fmt::Debug for TransactionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionPipeline")
            .field("sender", &self.wallet.address())
            .field("contract", &self.contract)
            .field("serialize_nonces", &self.nonces.is_enabled())
            .finish()
    }
}
