//! Trait interfaces between the wallet engine and its collaborators.
//!
//! - [`InputSigner`]: key capability used to sign transaction inputs
//!   (scash-wallet's `SigningKey` implements)
//! - [`PayloadCodec`]: third-party data-anchoring codec (injected by the host)
//! - [`FeeRateSource`], [`UtxoSource`], [`BroadcastSink`]: node-facing
//!   collaborators (scash-cli's RPC client implements)

use async_trait::async_trait;
use bitcoin::CompressedPublicKey;
use bitcoin::secp256k1::ecdsa::Signature;

use crate::error::{BroadcastError, CryptoError, PayloadError, SourceError};
use crate::types::{PayloadOutput, Utxo};

/// Narrow signing capability for single-key P2WPKH inputs.
///
/// Keeps transaction assembly independent of how the key was derived or
/// where the secret lives.
pub trait InputSigner: Send + Sync {
    /// Compressed public key matching the signing secret.
    fn public_key(&self) -> CompressedPublicKey;

    /// Sign a 32-byte sighash digest, returning a low-S ECDSA signature.
    fn sign_digest(&self, digest: [u8; 32]) -> Result<Signature, CryptoError>;
}

/// External codec that turns text into value-bearing data outputs and back.
///
/// The wire format is opaque to the wallet; only this contract is fixed.
/// Implementations are constructed once at start-up and passed by reference.
pub trait PayloadCodec: Send + Sync {
    /// Encode `text` as an ordered list of outputs. The sum of their values is
    /// the data cost of the message.
    fn encode(&self, text: &str) -> Result<Vec<PayloadOutput>, PayloadError>;

    /// Whether `address` is one of the codec's data-carrying addresses.
    fn is_payload_address(&self, address: &str) -> bool;

    /// Recover the text carried by a transaction's outputs, if any.
    fn decode(&self, outputs: &[PayloadOutput]) -> Option<String>;
}

/// Network fee-rate estimator.
#[async_trait]
pub trait FeeRateSource: Send + Sync {
    /// Fee rate in whole coins per kilobyte for confirmation within
    /// `conf_target` blocks. A point-in-time value; callers re-fetch per flow.
    async fn fee_rate_per_kb(&self, conf_target: u16) -> Result<f64, SourceError>;
}

/// Snapshot provider of the wallet address's unspent outputs.
#[async_trait]
pub trait UtxoSource: Send + Sync {
    async fn unspent(&self, address: &str) -> Result<Vec<Utxo>, SourceError>;
}

/// Accepts signed raw transactions for relay.
#[async_trait]
pub trait BroadcastSink: Send + Sync {
    /// Submit `raw_hex`, returning the txid reported by the node.
    async fn broadcast(&self, raw_hex: &str) -> Result<String, BroadcastError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSink {
        seen: Mutex<Vec<String>>,
        reject: Option<BroadcastError>,
    }

    #[async_trait]
    impl BroadcastSink for RecordingSink {
        async fn broadcast(&self, raw_hex: &str) -> Result<String, BroadcastError> {
            self.seen.lock().unwrap().push(raw_hex.to_string());
            match &self.reject {
                Some(e) => Err(e.clone()),
                None => Ok("00".repeat(32)),
            }
        }
    }

    struct FixedRate(f64);

    #[async_trait]
    impl FeeRateSource for FixedRate {
        async fn fee_rate_per_kb(&self, _conf_target: u16) -> Result<f64, SourceError> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn sink_as_trait_object() {
        let sink = RecordingSink {
            seen: Mutex::new(Vec::new()),
            reject: None,
        };
        let dyn_sink: &dyn BroadcastSink = &sink;
        let txid = dyn_sink.broadcast("0200").await.unwrap();
        assert_eq!(txid.len(), 64);
        assert_eq!(sink.seen.lock().unwrap().as_slice(), ["0200".to_string()]);
    }

    #[tokio::test]
    async fn sink_rejection_is_structured() {
        let sink = RecordingSink {
            seen: Mutex::new(Vec::new()),
            reject: Some(BroadcastError {
                code: -25,
                message: "bad-txns-inputs-missingorspent".into(),
            }),
        };
        let err = sink.broadcast("0200").await.unwrap_err();
        assert_eq!(err.code, -25);
    }

    #[tokio::test]
    async fn fee_source_as_trait_object() {
        let src: Box<dyn FeeRateSource> = Box::new(FixedRate(0.0001));
        assert_eq!(src.fee_rate_per_kb(6).await.unwrap(), 0.0001);
    }
}
