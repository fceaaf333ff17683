//! Read-only token queries.

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolCall;
use serde::Serialize;
use std::sync::Arc;

use crate::blockchain::abi::ITCoin;
use crate::blockchain::client::ChainClient;
use crate::blockchain::parse_address;
use crate::blockchain::types::CallRequest;
use crate::error::{GatewayError, GatewayResult};
use crate::numeric::{wire, NumericCodec, TokenAmount};

/// Token metadata and supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetails {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: TokenAmount,
}

/// One entry of the contract's own transfer bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedTransfer {
    pub tx_hash: B256,
    pub from: Address,
    pub to: Address,
    pub amount: TokenAmount,
    pub message: String,
    #[serde(with = "wire::u256_string")]
    pub timestamp: U256,
}

/// Contract state reads through [`ChainClient::call`].
pub struct TokenReader {
    client: Arc<dyn ChainClient>,
    contract: Address,
    codec: NumericCodec,
}

impl TokenReader {
    pub fn new(client: Arc<dyn ChainClient>, contract: Address, codec: NumericCodec) -> Self {
        Self {
            client,
            contract,
            codec,
        }
    }

    async fn read<C: SolCall>(&self, call: C) -> GatewayResult<C::Return> {
        let request = CallRequest {
            from: None,
            to: self.contract,
            data: call.abi_encode().into(),
        };
        let output = self.client.call(&request).await?;
        C::abi_decode_returns(&output).map_err(|e| {
            GatewayError::Rpc(format!("{}: undecodable return data: {}", C::SIGNATURE, e))
        })
    }

    /// Name, symbol and total supply.
    pub async fn token_details(&self) -> GatewayResult<TokenDetails> {
        let name = self.read(ITCoin::nameCall {}).await?;
        let symbol = self.read(ITCoin::symbolCall {}).await?;
        let supply = self.read(ITCoin::totalSupplyCall {}).await?;
        Ok(TokenDetails {
            name,
            symbol,
            decimals: self.codec.decimals(),
            total_supply: self.codec.amount(supply),
        })
    }

    /// Balance of `account`, validated before any remote call.
    pub async fn balance_of(&self, account: &str) -> GatewayResult<TokenAmount> {
        let account = parse_address(account)?;
        let balance = self.read(ITCoin::balanceOfCall { account }).await?;
        Ok(self.codec.amount(balance))
    }

    /// Number of entries in the contract's transfer bookkeeping.
    pub async fn recorded_transaction_count(&self) -> GatewayResult<u64> {
        let count = self.read(ITCoin::getTotalTransactionDetailsCountCall {}).await?;
        u64::try_from(count)
            .map_err(|_| GatewayError::Rpc(format!("transaction count {} out of range", count)))
    }

    /// Entry `index` of the contract's transfer bookkeeping.
    pub async fn recorded_transaction(&self, index: u64) -> GatewayResult<RecordedTransfer> {
        let details = self
            .read(ITCoin::getTransactionDetailsByIndexCall {
                index: U256::from(index),
            })
            .await?;
        Ok(self.to_recorded(details))
    }

    /// Every entry, one `eth_call` per index.
    pub async fn recorded_transactions_by_index(&self) -> GatewayResult<Vec<RecordedTransfer>> {
        let count = self.recorded_transaction_count().await?;
        let mut transfers = Vec::with_capacity(count.min(1024) as usize);
        for index in 0..count {
            transfers.push(self.recorded_transaction(index).await?);
        }
        Ok(transfers)
    }

    /// Every entry in a single `eth_call`.
    pub async fn all_recorded_transactions(&self) -> GatewayResult<Vec<RecordedTransfer>> {
        let all = self.read(ITCoin::getAllTransactionDetailsCall {}).await?;
        Ok(all.into_iter().map(|d| self.to_recorded(d)).collect())
    }

    fn to_recorded(&self, details: ITCoin::TransactionDetails) -> RecordedTransfer {
        RecordedTransfer {
            tx_hash: details.txHash,
            from: details.from,
            to: details.to,
            amount: self.codec.amount(details.value),
            message: details.message,
            timestamp: details.timestamp,
        }
    }
}
