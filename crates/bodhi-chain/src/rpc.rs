//! JSON-RPC balance reader.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use ethereum_types::{H160, U256};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use bodhi_core::defaults::{BODHI_CONTRACT, CHAIN_RPC_URL};
use bodhi_core::{Error, Result};

use crate::abi::{decode_uint256, encode_balance_of};
use crate::gate::BalanceReader;
use crate::signature::parse_address;

/// Default timeout for a single `eth_call`.
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Serialize)]
struct RpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

/// Reads ERC-1155 balances with `eth_call` against a JSON-RPC endpoint.
#[derive(Clone)]
pub struct JsonRpcBalanceReader {
    client: Client,
    url: String,
    contract: H160,
}

impl JsonRpcBalanceReader {
    pub fn new(url: impl Into<String>, contract: H160) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            contract,
        })
    }

    /// Reader for the Bodhi share contract on Optimism mainnet.
    pub fn bodhi() -> Result<Self> {
        Self::new(CHAIN_RPC_URL, parse_address(BODHI_CONTRACT)?)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn contract(&self) -> H160 {
        self.contract
    }
}

#[async_trait]
impl BalanceReader for JsonRpcBalanceReader {
    async fn balance_of(&self, owner: &H160, id: U256) -> Result<U256> {
        let start = Instant::now();
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_call",
            params: json!([
                {
                    "to": format!("{:#x}", self.contract),
                    "data": encode_balance_of(owner, id),
                },
                "latest"
            ]),
        };

        let resp = self.client.post(&self.url).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Chain(format!("RPC endpoint returned {}", status)));
        }
        let body: RpcResponse = resp.json().await?;

        if let Some(err) = body.error {
            return Err(Error::Chain(format!(
                "eth_call failed ({}): {}",
                err.code, err.message
            )));
        }
        let result = body
            .result
            .ok_or_else(|| Error::Chain("eth_call returned no result".to_string()))?;
        let balance = decode_uint256(&result)?;

        debug!(
            subsystem = "chain",
            component = "rpc",
            op = "balance_of",
            duration_ms = start.elapsed().as_millis() as u64,
            "eth_call complete"
        );
        Ok(balance)
    }
}
