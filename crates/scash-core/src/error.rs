//! Error types shared across the SCASH crates.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is negative")] Negative,
    #[error("amount is not a finite number")] NotFinite,
    #[error("amount overflow")] Overflow,
    #[error("malformed amount: {0}")] Malformed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("bech32 decode: {0}")] Bech32(String),
    #[error("wrong network prefix: expected {expected}, got {got}")] WrongNetwork { expected: String, got: String },
    #[error("invalid witness version: {0}")] InvalidVersion(u8),
    #[error("invalid witness program length: {0}")] InvalidProgramLength(usize),
    #[error("not a witness script")] NotWitnessScript,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid secret key bytes")] InvalidSecretKey,
    #[error("signing failed: {0}")] Signing(String),
}

/// Structured rejection returned by a broadcast sink (node RPC error object).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("broadcast rejected ({code}): {message}")]
pub struct BroadcastError {
    pub code: i64,
    pub message: String,
}

/// Failure of an external data source (fee estimator, UTXO scanner).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("rpc error ({code}): {message}")] Rpc { code: i64, message: String },
    #[error("transport: {0}")] Transport(String),
    #[error("unexpected response: {0}")] Malformed(String),
}

/// Failure of a payload codec to encode a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("message too long: {len} bytes, limit {max}")] TooLong { len: usize, max: usize },
    #[error("cannot encode payload: {0}")] Encoding(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_error_display_is_verbatim() {
        let e = BroadcastError {
            code: -26,
            message: "min relay fee not met".into(),
        };
        assert_eq!(e.to_string(), "broadcast rejected (-26): min relay fee not met");
    }

    #[test]
    fn payload_error_display() {
        let e = PayloadError::TooLong { len: 90, max: 80 };
        assert_eq!(e.to_string(), "message too long: 90 bytes, limit 80");
    }

    #[test]
    fn wrong_network_display() {
        let e = AddressError::WrongNetwork {
            expected: "scash".into(),
            got: "bc".into(),
        };
        assert_eq!(e.to_string(), "wrong network prefix: expected scash, got bc");
    }
}
