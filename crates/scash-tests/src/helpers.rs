//! Shared test helpers: an in-memory node and a toy payload codec.

use std::sync::Mutex;

use async_trait::async_trait;
use bitcoin::hashes::Hash;
use bitcoin::{ScriptBuf, Transaction, Txid};

use scash_core::address::Address;
use scash_core::error::{BroadcastError, PayloadError, SourceError};
use scash_core::network::NetworkParams;
use scash_core::traits::{BroadcastSink, FeeRateSource, PayloadCodec, UtxoSource};
use scash_core::types::{PayloadOutput, Utxo};

/// BIP-84 reference mnemonic.
pub const ABANDON: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// Its mainnet address.
pub const ABANDON_ADDRESS: &str = "scash1qcr8te4kr609gcawutmrza0j4xv80jy8zls9d4y";

pub const PASSWORD: &str = "hunter2";

/// Deterministic txid from a seed byte.
pub fn txid(seed: u8) -> Txid {
    Txid::from_byte_array([seed; 32])
}

/// A confirmed UTXO paying `script`.
pub fn make_utxo(seed: u8, vout: u32, amount: u64, script: &ScriptBuf) -> Utxo {
    Utxo {
        txid: txid(seed),
        vout,
        amount,
        script_pubkey: script.clone(),
        height: 100,
        usable: true,
        in_mempool: false,
    }
}

#[derive(Default)]
struct NodeState {
    utxos: Vec<Utxo>,
    mempool: Vec<Transaction>,
    height: u64,
}

/// In-memory node: serves a UTXO set, accepts broadcasts into a mempool and
/// mines them on demand.
pub struct MockNode {
    state: Mutex<NodeState>,
    fee_rate: f64,
    reject: Mutex<Option<BroadcastError>>,
}

impl MockNode {
    /// Node with a fee rate in coins per kilobyte.
    pub fn new(fee_rate: f64, utxos: Vec<Utxo>) -> Self {
        Self {
            state: Mutex::new(NodeState {
                utxos,
                mempool: Vec::new(),
                height: 100,
            }),
            fee_rate,
            reject: Mutex::new(None),
        }
    }

    /// Reject the next broadcast with `error`.
    pub fn reject_next(&self, error: BroadcastError) {
        *self.reject.lock().unwrap() = Some(error);
    }

    pub fn mempool_len(&self) -> usize {
        self.state.lock().unwrap().mempool.len()
    }

    /// Mine every mempool transaction: spent outputs leave the UTXO set and
    /// new outputs join it.
    pub fn mine(&self) -> Vec<Txid> {
        let mut state = self.state.lock().unwrap();
        state.height += 1;
        let height = state.height;
        let mined: Vec<Transaction> = std::mem::take(&mut state.mempool);
        let mut ids = Vec::new();
        for tx in mined {
            let spent: Vec<_> = tx.input.iter().map(|i| i.previous_output).collect();
            state.utxos.retain(|u| !spent.contains(&u.outpoint()));
            let id = tx.compute_txid();
            for (vout, out) in tx.output.iter().enumerate() {
                state.utxos.push(Utxo {
                    txid: id,
                    vout: vout as u32,
                    amount: out.value.to_sat(),
                    script_pubkey: out.script_pubkey.clone(),
                    height,
                    usable: true,
                    in_mempool: false,
                });
            }
            ids.push(id);
        }
        ids
    }
}

#[async_trait]
impl FeeRateSource for MockNode {
    async fn fee_rate_per_kb(&self, _conf_target: u16) -> Result<f64, SourceError> {
        Ok(self.fee_rate)
    }
}

#[async_trait]
impl UtxoSource for MockNode {
    /// Confirmed outputs only, like `scantxoutset`.
    async fn unspent(&self, _address: &str) -> Result<Vec<Utxo>, SourceError> {
        Ok(self.state.lock().unwrap().utxos.clone())
    }
}

#[async_trait]
impl BroadcastSink for MockNode {
    async fn broadcast(&self, raw_hex: &str) -> Result<String, BroadcastError> {
        if let Some(e) = self.reject.lock().unwrap().take() {
            return Err(e);
        }
        let decode_failed = |message: String| BroadcastError { code: -22, message };
        let bytes = hex::decode(raw_hex).map_err(|e| decode_failed(e.to_string()))?;
        let tx: Transaction = bitcoin::consensus::deserialize::<Transaction>(&bytes)
            .map_err(|e| decode_failed(format!("TX decode failed: {e}")))?;
        let id = tx.compute_txid();
        self.state.lock().unwrap().mempool.push(tx);
        Ok(id.to_string())
    }
}

/// Marker byte identifying a data-carrying witness program.
const PAYLOAD_MARKER: u8 = 0xda;
/// Text bytes carried per output.
const CHUNK: usize = 30;
/// Value attached to each data output.
pub const PAYLOAD_OUTPUT_VALUE: u64 = 546;

/// Toy codec packing text into 32-byte v0 witness programs:
/// `marker || len || data || zero padding`.
pub struct ChunkCodec {
    params: &'static NetworkParams,
}

impl ChunkCodec {
    pub fn new(params: &'static NetworkParams) -> Self {
        Self { params }
    }

    fn chunk_of(&self, address: &str) -> Option<Vec<u8>> {
        let script = Address::parse(address, self.params).ok()?.script_pubkey();
        let bytes = script.as_bytes();
        if bytes.len() != 34 || bytes[0] != 0x00 || bytes[1] != 0x20 || bytes[2] != PAYLOAD_MARKER {
            return None;
        }
        let len = usize::from(bytes[3]);
        (len <= CHUNK).then(|| bytes[4..4 + len].to_vec())
    }
}

impl PayloadCodec for ChunkCodec {
    fn encode(&self, text: &str) -> Result<Vec<PayloadOutput>, PayloadError> {
        text.as_bytes()
            .chunks(CHUNK)
            .map(|chunk| {
                let mut script = vec![0x00, 0x20, PAYLOAD_MARKER, chunk.len() as u8];
                script.extend_from_slice(chunk);
                script.resize(34, 0);
                let address = Address::from_script(&ScriptBuf::from_bytes(script), self.params)
                    .map_err(|e| PayloadError::Encoding(e.to_string()))?;
                Ok(PayloadOutput {
                    address: address.to_string(),
                    value: PAYLOAD_OUTPUT_VALUE,
                })
            })
            .collect()
    }

    fn is_payload_address(&self, address: &str) -> bool {
        self.chunk_of(address).is_some()
    }

    fn decode(&self, outputs: &[PayloadOutput]) -> Option<String> {
        let mut bytes = Vec::new();
        for o in outputs {
            if let Some(chunk) = self.chunk_of(&o.address) {
                bytes.extend(chunk);
            }
        }
        if bytes.is_empty() {
            return None;
        }
        String::from_utf8(bytes).ok()
    }
}
