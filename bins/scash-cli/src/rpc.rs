//! SCASH node JSON-RPC client.
//!
//! Implements the wallet's node-facing traits over a bitcoind-style
//! interface: `estimatesmartfee`, `scantxoutset`, `sendrawtransaction` and
//! `getrawtransaction`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use jsonrpsee::core::client::{ClientT, Error as ClientError};
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use scash_core::error::{BroadcastError, SourceError};
use scash_core::traits::{BroadcastSink, FeeRateSource, UtxoSource};
use scash_core::types::Utxo;

/// bitcoind's generic `RPC_MISC_ERROR`, used when no node error object is
/// available.
const RPC_MISC_ERROR: i64 = -1;

#[derive(Debug, Deserialize)]
struct SmartFee {
    feerate: Option<f64>,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ScanResult {
    success: bool,
    #[serde(default)]
    unspents: Vec<Utxo>,
}

#[derive(Debug, Deserialize)]
struct RawTransaction {
    blockhash: Option<String>,
}

/// HTTP JSON-RPC connection to a SCASH node.
pub struct NodeRpc {
    client: HttpClient,
}

impl NodeRpc {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = HttpClientBuilder::default()
            .request_timeout(timeout)
            .build(url)
            .context("Failed to build RPC client")?;
        Ok(Self { client })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: ArrayParams,
    ) -> Result<T, ClientError> {
        tracing::debug!(method, "rpc request");
        self.client.request(method, params).await
    }

    /// Block hash containing `txid`, or `None` while it is unconfirmed.
    pub async fn blockhash(&self, txid: &str) -> Result<Option<String>, SourceError> {
        let raw: RawTransaction = self
            .call("getrawtransaction", params(|p| {
                p.insert(txid)?;
                p.insert(true)
            })?)
            .await
            .map_err(source_error)?;
        Ok(raw.blockhash.filter(|h| !h.is_empty()))
    }
}

fn params(
    fill: impl FnOnce(&mut ArrayParams) -> Result<(), serde_json::Error>,
) -> Result<ArrayParams, SourceError> {
    let mut p = ArrayParams::new();
    fill(&mut p).map_err(|e| SourceError::Malformed(e.to_string()))?;
    Ok(p)
}

fn source_error(e: ClientError) -> SourceError {
    match e {
        ClientError::Call(obj) => SourceError::Rpc {
            code: i64::from(obj.code()),
            message: obj.message().to_string(),
        },
        ClientError::ParseError(e) => SourceError::Malformed(e.to_string()),
        other => SourceError::Transport(other.to_string()),
    }
}

fn broadcast_error(e: ClientError) -> BroadcastError {
    match e {
        ClientError::Call(obj) => BroadcastError {
            code: i64::from(obj.code()),
            message: obj.message().to_string(),
        },
        other => BroadcastError {
            code: RPC_MISC_ERROR,
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl FeeRateSource for NodeRpc {
    async fn fee_rate_per_kb(&self, conf_target: u16) -> Result<f64, SourceError> {
        let fee: SmartFee = self
            .call("estimatesmartfee", params(|p| p.insert(conf_target))?)
            .await
            .map_err(source_error)?;
        fee.feerate.ok_or_else(|| {
            SourceError::Malformed(if fee.errors.is_empty() {
                "no fee estimate available".to_string()
            } else {
                fee.errors.join("; ")
            })
        })
    }
}

#[async_trait]
impl UtxoSource for NodeRpc {
    async fn unspent(&self, address: &str) -> Result<Vec<Utxo>, SourceError> {
        let descriptor = format!("addr({address})");
        let scan: ScanResult = self
            .call("scantxoutset", params(|p| {
                p.insert("start")?;
                p.insert([descriptor])
            })?)
            .await
            .map_err(source_error)?;
        if !scan.success {
            return Err(SourceError::Malformed("scantxoutset did not complete".into()));
        }
        // Scan results are confirmed outputs.
        Ok(scan
            .unspents
            .into_iter()
            .map(|u| Utxo {
                usable: true,
                in_mempool: false,
                ..u
            })
            .collect())
    }
}

#[async_trait]
impl BroadcastSink for NodeRpc {
    async fn broadcast(&self, raw_hex: &str) -> Result<String, BroadcastError> {
        let mut p = ArrayParams::new();
        p.insert(raw_hex).map_err(|e| BroadcastError {
            code: RPC_MISC_ERROR,
            message: e.to_string(),
        })?;
        self.call("sendrawtransaction", p)
            .await
            .map_err(broadcast_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpsee::core::async_trait as rpc_async_trait;
    use jsonrpsee::proc_macros::rpc;
    use jsonrpsee::server::{Server, ServerHandle};
    use jsonrpsee::types::ErrorObjectOwned;
    use serde_json::{Value, json};

    const ADDRESS: &str = "scash1qcr8te4kr609gcawutmrza0j4xv80jy8zls9d4y";
    const TXID: &str = "5e1c8f0a7c1b2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f708192a3b4c5d6e7f80910";

    #[rpc(server)]
    trait FakeNode {
        #[method(name = "estimatesmartfee")]
        async fn estimate_smart_fee(&self, conf_target: u16) -> Result<Value, ErrorObjectOwned>;

        #[method(name = "scantxoutset")]
        async fn scan_tx_out_set(
            &self,
            action: String,
            descriptors: Vec<String>,
        ) -> Result<Value, ErrorObjectOwned>;

        #[method(name = "sendrawtransaction")]
        async fn send_raw_transaction(&self, hex: String) -> Result<String, ErrorObjectOwned>;

        #[method(name = "getrawtransaction")]
        async fn get_raw_transaction(
            &self,
            txid: String,
            verbose: bool,
        ) -> Result<Value, ErrorObjectOwned>;
    }

    struct FakeNodeImpl;

    #[rpc_async_trait]
    impl FakeNodeServer for FakeNodeImpl {
        async fn estimate_smart_fee(&self, conf_target: u16) -> Result<Value, ErrorObjectOwned> {
            if conf_target > 100 {
                return Ok(json!({ "errors": ["Insufficient data or no feerate found"], "blocks": 0 }));
            }
            Ok(json!({ "feerate": 0.0001, "blocks": conf_target }))
        }

        async fn scan_tx_out_set(
            &self,
            action: String,
            descriptors: Vec<String>,
        ) -> Result<Value, ErrorObjectOwned> {
            assert_eq!(action, "start");
            assert_eq!(descriptors, vec![format!("addr({ADDRESS})")]);
            Ok(json!({
                "success": true,
                "unspents": [{
                    "txid": TXID,
                    "vout": 1,
                    "scriptPubKey": "0014c0cebcd6c3d3ca8c75dc5ec62ebe55330ef910e2",
                    "desc": format!("addr({ADDRESS})"),
                    "amount": 1.5,
                    "height": 1200
                }],
                "total_amount": 1.5
            }))
        }

        async fn send_raw_transaction(&self, hex: String) -> Result<String, ErrorObjectOwned> {
            if hex == "bad" {
                return Err(ErrorObjectOwned::owned(
                    -26,
                    "min relay fee not met",
                    None::<()>,
                ));
            }
            Ok(TXID.to_string())
        }

        async fn get_raw_transaction(
            &self,
            txid: String,
            verbose: bool,
        ) -> Result<Value, ErrorObjectOwned> {
            assert!(verbose);
            if txid == TXID {
                Ok(json!({ "txid": txid, "blockhash": "00".repeat(32), "confirmations": 3 }))
            } else {
                Ok(json!({ "txid": txid }))
            }
        }
    }

    async fn serve() -> (NodeRpc, ServerHandle) {
        let server = Server::builder().build("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        let handle = server.start(FakeNodeImpl.into_rpc());
        let rpc = NodeRpc::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();
        (rpc, handle)
    }

    #[tokio::test]
    async fn fee_rate_and_missing_estimate() {
        let (rpc, _handle) = serve().await;
        assert_eq!(rpc.fee_rate_per_kb(6).await.unwrap(), 0.0001);
        assert!(matches!(
            rpc.fee_rate_per_kb(500).await,
            Err(SourceError::Malformed(m)) if m.contains("no feerate")
        ));
    }

    #[tokio::test]
    async fn unspent_parses_scan() {
        let (rpc, _handle) = serve().await;
        let utxos = rpc.unspent(ADDRESS).await.unwrap();
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].amount, 150_000_000);
        assert_eq!(utxos[0].vout, 1);
        assert!(utxos[0].is_spendable());
    }

    #[tokio::test]
    async fn broadcast_maps_node_errors() {
        let (rpc, _handle) = serve().await;
        assert_eq!(rpc.broadcast("0200").await.unwrap(), TXID);
        let err = rpc.broadcast("bad").await.unwrap_err();
        assert_eq!(err.code, -26);
        assert_eq!(err.message, "min relay fee not met");
    }

    #[tokio::test]
    async fn blockhash_only_when_mined() {
        let (rpc, _handle) = serve().await;
        assert_eq!(rpc.blockhash(TXID).await.unwrap(), Some("00".repeat(32)));
        assert_eq!(rpc.blockhash(&"11".repeat(32)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreachable_node_is_transport_error() {
        let rpc = NodeRpc::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        assert!(matches!(
            rpc.fee_rate_per_kb(6).await,
            Err(SourceError::Transport(_))
        ));
        let err = rpc.broadcast("0200").await.unwrap_err();
        assert_eq!(err.code, RPC_MISC_ERROR);
    }
}
