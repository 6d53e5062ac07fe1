//! # scash-wallet: single-address HD wallet engine for SCASH.
//!
//! Derives one P2WPKH key from a 12-word mnemonic, keeps it in a
//! password-encrypted record, plans and signs spends from caller-supplied
//! UTXOs, and tracks broadcast transactions until they confirm.
//!
//! # Modules
//!
//! - [`error`]: `WalletError` enum
//! - [`mnemonic`]: BIP-39 generation and parsing
//! - [`keys`]: BIP-32 derivation of the signing key at `m/84'/0'/0'/0/0`
//! - [`encryption`]: AES-256-GCM record encryption
//! - [`wallet_file`]: encrypted record and portable backup file
//! - [`fee`]: vsize fee estimate and platform fee schedule
//! - [`coin_selection`]: greedy in-order UTXO selection
//! - [`builder`]: transaction assembly and signing
//! - [`payload`]: data-anchoring message parsing
//! - [`history`]: explorer record classification
//! - [`pending`]: ledger of broadcast, unconfirmed transactions
//! - [`wallet`]: high-level wallet composition

pub mod builder;
pub mod coin_selection;
pub mod encryption;
pub mod error;
pub mod fee;
pub mod history;
pub mod keys;
pub mod mnemonic;
pub mod payload;
pub mod pending;
pub mod wallet;
pub mod wallet_file;

// Re-exports for convenient access
pub use builder::{FeeBudget, SignedTransaction, TransactionBuilder, UnsignedTransaction};
pub use coin_selection::{CoinSelection, CoinSelector};
pub use error::WalletError;
pub use fee::{FeeEstimate, FeeRate, estimate_fee, platform_fee};
pub use history::{classify, classify_all};
pub use keys::SigningKey;
pub use payload::{PayloadMessage, parse_payload_message};
pub use pending::{PendingLedger, PendingStatus, PendingTransaction};
pub use wallet::{SpendPlan, Wallet};
pub use wallet_file::{EncryptedWallet, WalletFile, WalletRecord, default_file_name};
