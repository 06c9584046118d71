use crate::blockchain::models::{extract_parsed_transaction, ParsedTransaction, SignatureInfo};
use crate::config::Config;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::UiTransactionEncoding;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("RPC error: {0}")]
    RpcError(#[from] solana_client::client_error::ClientError),

    #[error("Invalid signature: {0}")]
    SignatureError(String),

    #[error("Invalid public key: {0}")]
    PubkeyError(String),
}

/// The two read operations the indexer needs from the chain
#[async_trait]
pub trait BridgeRpc: Send + Sync {
    /// One page of signatures, newest first. `before` and `until` are exclusive.
    async fn get_signatures_for_address(
        &self,
        address: &str,
        before: Option<&str>,
        until: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, ClientError>;

    /// The parsed transaction, or `None` when its shape cannot be read
    async fn get_parsed_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, ClientError>;
}

pub struct SolanaClient {
    rpc_client: RpcClient,
    commitment: CommitmentConfig,
    rate_limiter: Option<DefaultDirectRateLimiter>,
}

fn parse_commitment(level: &str) -> CommitmentConfig {
    match level {
        "processed" => CommitmentConfig::processed(),
        "confirmed" => CommitmentConfig::confirmed(),
        "finalized" => CommitmentConfig::finalized(),
        _ => CommitmentConfig::confirmed(),
    }
}

fn parse_signature(sig: &str) -> Result<Signature, ClientError> {
    Signature::from_str(sig).map_err(|_| ClientError::SignatureError(sig.to_string()))
}

impl SolanaClient {
    pub fn new(config: &Config) -> Self {
        let rpc_url = &config.solana_rpc_url;
        let timeout = Duration::from_secs(config.rpc_timeout_secs);
        let commitment = parse_commitment(&config.solana_commitment_level);

        info!(
            "Initializing Solana client with RPC endpoint: {}, commitment: {:?}",
            rpc_url, commitment
        );

        let rpc_client = RpcClient::new_with_timeout_and_commitment(
            rpc_url.clone(),
            timeout,
            commitment,
        );

        let rate_limiter = config
            .rpc_rate_limit
            .and_then(NonZeroU32::new)
            .map(|per_second| {
                info!("Limiting RPC calls to {} per second", per_second);
                RateLimiter::direct(Quota::per_second(per_second))
            });

        Self {
            rpc_client,
            commitment,
            rate_limiter,
        }
    }

    async fn throttle(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }
}

#[async_trait]
impl BridgeRpc for SolanaClient {
    async fn get_signatures_for_address(
        &self,
        address: &str,
        before: Option<&str>,
        until: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, ClientError> {
        let pubkey = Pubkey::from_str(address)
            .map_err(|_| ClientError::PubkeyError(address.to_string()))?;

        let before_sig = before.map(parse_signature).transpose()?;
        let until_sig = until.map(parse_signature).transpose()?;

        self.throttle().await;
        let signatures = self
            .rpc_client
            .get_signatures_for_address_with_config(
                &pubkey,
                GetConfirmedSignaturesForAddress2Config {
                    before: before_sig,
                    until: until_sig,
                    limit: Some(limit),
                    commitment: Some(self.commitment),
                },
            )
            .await?;

        debug!("Fetched {} signatures for {}", signatures.len(), address);
        Ok(signatures.into_iter().map(SignatureInfo::from).collect())
    }

    async fn get_parsed_transaction(
        &self,
        signature_str: &str,
    ) -> Result<Option<ParsedTransaction>, ClientError> {
        let signature = parse_signature(signature_str)?;

        // Parsed encoding exposes system instructions as typed JSON
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        };

        self.throttle().await;
        let tx = self
            .rpc_client
            .get_transaction_with_config(&signature, config)
            .await?;

        Ok(extract_parsed_transaction(signature_str, &tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_commitment_falls_back_to_confirmed() {
        assert_eq!(parse_commitment("bogus"), CommitmentConfig::confirmed());
        assert_eq!(parse_commitment("finalized"), CommitmentConfig::finalized());
    }

    #[test]
    fn rejects_malformed_signature() {
        assert!(matches!(
            parse_signature("not-a-signature"),
            Err(ClientError::SignatureError(_))
        ));
    }
}
