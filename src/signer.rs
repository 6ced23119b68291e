//! Wallet-backed implementation of [`ChainSigner`].

use std::str::FromStr;
use std::time::Duration;

use alloy::signers::local::LocalSigner;
use alloy::signers::Signer;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::error::SignerError;
use crate::gateway::ChainSigner;
use crate::order::OrderRequest;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Signs order payloads with a local private key and manages allowances
/// through the CLOB allowance endpoints.
#[derive(Debug)]
pub struct LocalWalletSigner {
    signer: LocalSigner<alloy::signers::k256::ecdsa::SigningKey>,
    address: String,
    http: Client,
    clob_url: String,
}

#[derive(Debug, Deserialize)]
struct AllowanceResponse {
    allowance: String,
}

impl LocalWalletSigner {
    pub fn new(private_key: &str, chain_id: u64, clob_url: &str) -> Result<Self, SignerError> {
        let signer = LocalSigner::from_str(private_key)
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?
            .with_chain_id(Some(chain_id));
        let address = signer.address().to_string();
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SignerError::Transport(e.to_string()))?;

        tracing::info!(address = address.as_str(), chain_id, "Wallet signer ready");

        Ok(Self {
            signer,
            address,
            http,
            clob_url: clob_url.trim_end_matches('/').to_string(),
        })
    }

    /// Canonical payload the venue expects signatures over.
    fn payload(request: &OrderRequest) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            request.client_id,
            request.token_id,
            request.side.as_str(),
            request.size,
            request
                .price
                .map(|p| p.to_string())
                .unwrap_or_else(|| "MARKET".to_string())
        )
    }
}

#[async_trait]
impl ChainSigner for LocalWalletSigner {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn sign(&self, request: &OrderRequest) -> Result<String, SignerError> {
        let payload = Self::payload(request);
        let signature = self
            .signer
            .sign_message(payload.as_bytes())
            .await
            .map_err(|e| SignerError::Signing(e.to_string()))?;
        Ok(hex::encode(signature.as_bytes()))
    }

    async fn check_allowance(&self, token: &str) -> Result<Decimal, SignerError> {
        let url = format!(
            "{}/allowance?address={}&token={}",
            self.clob_url, self.address, token
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SignerError::Allowance(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SignerError::Allowance(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body: AllowanceResponse = response
            .json()
            .await
            .map_err(|e| SignerError::Allowance(e.to_string()))?;
        Decimal::from_str(&body.allowance).map_err(|e| SignerError::Allowance(e.to_string()))
    }

    async fn set_allowance(&self, token: &str, amount: Decimal) -> Result<(), SignerError> {
        let url = format!("{}/allowance", self.clob_url);
        let response = self
            .http
            .post(&url)
            .json(&json!({
                "address": self.address,
                "token": token,
                "amount": amount.to_string(),
            }))
            .send()
            .await
            .map_err(|e| SignerError::Allowance(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SignerError::Allowance(format!(
                "HTTP {}",
                response.status()
            )));
        }

        tracing::info!(token, amount = %amount, "Allowance updated");
        Ok(())
    }
}
