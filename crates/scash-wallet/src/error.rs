//! Wallet error types.

use scash_core::error::{AddressError, AmountError, CryptoError};
use thiserror::Error;

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Mnemonic is not 12 valid BIP-39 English words.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Wallet blob could not be opened with the given password.
    ///
    /// Covers authentication failure and every form of corrupt payload alike.
    #[error("invalid password")]
    WrongPassword,

    /// Fee rate is zero, negative or not a number.
    #[error("invalid fee rate: {0}")]
    InvalidFeeRate(String),

    /// Insufficient funds to cover outputs plus fees.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Spendable value in satoshis.
        have: u64,
        /// Required value in satoshis.
        need: u64,
    },

    /// Signing or finalizing an input failed; the attempt is abandoned.
    #[error("signing failed: {0}")]
    SigningFailure(String),

    /// The node refused the transaction. Surfaced verbatim, never retried.
    #[error("broadcast rejected ({code}): {message}")]
    BroadcastRejected {
        code: i64,
        message: String,
    },

    /// No UTXOs available for spending.
    #[error("no UTXOs available")]
    NoUtxos,

    /// Invalid monetary amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid address string.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// BIP-32 derivation failure.
    #[error("key derivation: {0}")]
    KeyDerivation(String),

    /// Wallet file is corrupted or has invalid format.
    #[error("corrupted file: {0}")]
    CorruptedFile(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serialization error.
    #[error("serialization: {0}")]
    Serialization(String),

    /// Transaction build error.
    #[error("build error: {0}")]
    BuildError(String),

    /// Payload codec failure.
    #[error("payload: {0}")]
    Payload(String),

    /// External data source failure (fee estimator, UTXO scan).
    #[error("source: {0}")]
    Source(String),

    /// Address error from scash-core.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Amount conversion error from scash-core.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Cryptographic error from scash-core.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
