//! Custodial key and transaction signing.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized; `Debug` prints the address only
//! - Signing is a pure function of key + descriptor

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::types::{SignedTxPayload, UnsignedTxDescriptor};
use crate::error::{GatewayError, GatewayResult};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "GATEWAY_PRIVATE_KEY";

/// Holds the custodial signing key for one sender.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Chain ID for EIP-155 replay protection
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> GatewayResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|_| GatewayError::Signing("Invalid private key format".to_string()))?;

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id,
            "Wallet initialized"
        );

        Ok(Self { signer, chain_id })
    }

    /// Load wallet from environment variable.
    ///
    /// Reads `GATEWAY_PRIVATE_KEY` from environment.
    pub fn from_env(chain_id: u64) -> GatewayResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            GatewayError::Signing(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })?;

        Self::from_private_key(&private_key, chain_id)
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get the chain ID this wallet is configured for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign a fully populated descriptor.
    ///
    /// The descriptor is consumed; the returned payload is bound to its exact
    /// nonce and gas values.
    pub fn sign_transaction(&self, descriptor: UnsignedTxDescriptor) -> GatewayResult<SignedTxPayload> {
        if descriptor.from != self.address() {
            return Err(GatewayError::Signing(format!(
                "descriptor sender {} does not match signing key {}",
                descriptor.from,
                self.address()
            )));
        }
        if descriptor.chain_id != self.chain_id {
            return Err(GatewayError::Signing(format!(
                "descriptor chain {} does not match wallet chain {}",
                descriptor.chain_id, self.chain_id
            )));
        }

        let nonce = descriptor.nonce;
        let mut tx = TxLegacy {
            chain_id: Some(descriptor.chain_id),
            nonce,
            gas_price: descriptor.gas_price,
            gas_limit: descriptor.gas_limit,
            to: TxKind::Call(descriptor.to),
            value: U256::ZERO,
            input: descriptor.call_data,
        };

        let signature = self
            .signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| GatewayError::Signing(format!("Signing failed: {}", e)))?;

        let envelope = TxEnvelope::from(tx.into_signed(signature));
        let tx_hash = *envelope.tx_hash();
        Ok(SignedTxPayload::new(envelope.encoded_2718().into(), tx_hash, nonce))
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}
