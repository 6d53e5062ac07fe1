//! The wallet record, its encrypted blob, and the portable wallet file.
//!
//! # File format
//! ```json
//! { "version": "0.1.0", "encrypted": true, "data": "<hex blob>", "timestamp": 1700000000000 }
//! ```
//! `data` is the hex of [`encryption::encrypt`] over the record's JSON. This
//! file is the only portable artifact and must stay readable across versions.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use scash_core::constants::DERIVATION_PATH;
use scash_core::network::{Network, NetworkParams};

use crate::encryption::{self, password_hash};
use crate::error::WalletError;
use crate::keys::SigningKey;

/// Current wallet file format version.
pub const WALLET_FILE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Plaintext key material sealed inside [`EncryptedWallet`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub mnemonic: String,
    #[serde(alias = "derivationPath")]
    pub path: String,
    pub address: String,
    /// WIF private key.
    pub private_key: String,
    /// Lowercase hex MD5 of the wallet password.
    pub password_hash: String,
}

impl WalletRecord {
    /// Build the record for `mnemonic`, deriving its key and address.
    pub fn new(mnemonic: &str, password: &str, params: &NetworkParams) -> Result<Self, WalletError> {
        let key = SigningKey::derive(mnemonic, params)?;
        Ok(Self {
            mnemonic: crate::mnemonic::normalize_phrase(mnemonic).to_string(),
            path: DERIVATION_PATH.to_string(),
            address: key.address().to_string(),
            private_key: key.to_wif().to_string(),
            password_hash: password_hash(password).to_string(),
        })
    }
}

impl fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRecord")
            .field("path", &self.path)
            .field("address", &self.address)
            .field("mnemonic", &"[REDACTED]")
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Hex-encoded, password-encrypted [`WalletRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedWallet(String);

impl EncryptedWallet {
    /// Encrypt `record` under `password`.
    pub fn seal(record: &WalletRecord, password: &str) -> Result<Self, WalletError> {
        let json = Zeroizing::new(
            serde_json::to_vec(record).map_err(|e| WalletError::Serialization(e.to_string()))?,
        );
        let encrypted = encryption::encrypt(&json, password)?;
        Ok(Self(hex::encode(encrypted)))
    }

    /// Decrypt with `password`.
    ///
    /// Every failure (bad hex, tag mismatch, malformed JSON, password hash
    /// mismatch) is reported as [`WalletError::WrongPassword`].
    pub fn open(&self, password: &str) -> Result<WalletRecord, WalletError> {
        let bytes = hex::decode(self.0.trim()).map_err(|_| WalletError::WrongPassword)?;
        let json = encryption::decrypt(&bytes, password)?;
        let record: WalletRecord =
            serde_json::from_slice(&json).map_err(|_| WalletError::WrongPassword)?;
        if record.password_hash != *password_hash(password) {
            return Err(WalletError::WrongPassword);
        }
        Ok(record)
    }

    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

/// Portable wallet backup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletFile {
    pub version: String,
    pub encrypted: bool,
    pub data: EncryptedWallet,
    /// Creation time in Unix milliseconds.
    pub timestamp: i64,
}

impl WalletFile {
    pub fn new(data: EncryptedWallet) -> Self {
        Self {
            version: WALLET_FILE_VERSION.to_string(),
            encrypted: true,
            data,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Reject files that cannot hold a restorable wallet.
    pub fn validate(&self) -> Result<(), WalletError> {
        if !self.encrypted {
            return Err(WalletError::CorruptedFile("wallet file is not encrypted".into()));
        }
        if self.data.as_hex().trim().is_empty() {
            return Err(WalletError::CorruptedFile("wallet data is empty".into()));
        }
        if self.timestamp == 0 {
            return Err(WalletError::CorruptedFile("missing timestamp".into()));
        }
        Ok(())
    }

    /// Parse and validate a wallet file from JSON text.
    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        let file: Self = serde_json::from_str(json)
            .map_err(|e| WalletError::CorruptedFile(format!("invalid wallet file: {e}")))?;
        file.validate()?;
        Ok(file)
    }

    pub fn to_json(&self) -> Result<String, WalletError> {
        serde_json::to_string_pretty(self).map_err(|e| WalletError::Serialization(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        std::fs::write(path, self.to_json()?).map_err(|e| WalletError::IoError(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let json = std::fs::read_to_string(path).map_err(|e| WalletError::IoError(e.to_string()))?;
        Self::from_json(&json)
    }
}

/// Conventional backup file name for a network.
pub fn default_file_name(params: &NetworkParams) -> &'static str {
    match params.network {
        Network::Mainnet => "scash-wallet.json",
        Network::Testnet => "scash-wallet-testnet.json",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scash_core::network::{MAINNET, TESTNET};

    const ABANDON: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn record() -> WalletRecord {
        WalletRecord::new(ABANDON, "hunter2", &MAINNET).unwrap()
    }

    #[test]
    fn record_fields() {
        let r = record();
        assert_eq!(r.path, "m/84'/0'/0'/0/0");
        assert_eq!(r.address, "scash1qcr8te4kr609gcawutmrza0j4xv80jy8zls9d4y");
        assert_eq!(r.private_key, "KyZpNDKnfs94vbrwhJneDi77V6jF64PWPF8x5cdJb8ifgg2DUc9d");
        assert_eq!(r.password_hash, *password_hash("hunter2"));
    }

    #[test]
    fn record_json_uses_camel_case() {
        let json = serde_json::to_value(record()).unwrap();
        assert!(json.get("privateKey").is_some());
        assert!(json.get("passwordHash").is_some());
        assert!(json.get("path").is_some());
    }

    #[test]
    fn record_accepts_derivation_path_alias() {
        let mut json = serde_json::to_value(record()).unwrap();
        let obj = json.as_object_mut().unwrap();
        let path = obj.remove("path").unwrap();
        obj.insert("derivationPath".into(), path);
        let parsed: WalletRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record());
    }

    #[test]
    fn seal_open_roundtrip() {
        let sealed = EncryptedWallet::seal(&record(), "hunter2").unwrap();
        assert_eq!(sealed.open("hunter2").unwrap(), record());
    }

    #[test]
    fn open_wrong_password() {
        let sealed = EncryptedWallet::seal(&record(), "hunter2").unwrap();
        assert_eq!(sealed.open("hunter3").unwrap_err(), WalletError::WrongPassword);
    }

    #[test]
    fn open_non_hex_is_wrong_password() {
        let blob = EncryptedWallet::from_hex("zz-not-hex");
        assert_eq!(blob.open("pw").unwrap_err(), WalletError::WrongPassword);
    }

    /// Correctly encrypted bytes that are not a wallet record.
    #[test]
    fn open_garbage_plaintext_is_wrong_password() {
        let bytes = encryption::encrypt(b"{\"not\":\"a record\"}", "pw").unwrap();
        let blob = EncryptedWallet::from_hex(hex::encode(bytes));
        assert_eq!(blob.open("pw").unwrap_err(), WalletError::WrongPassword);
    }

    /// A record whose stored hash disagrees with the key that opened it.
    #[test]
    fn open_hash_mismatch_is_wrong_password() {
        let mut r = record();
        r.password_hash = password_hash("other").to_string();
        let blob = EncryptedWallet::seal(&r, "hunter2").unwrap();
        assert_eq!(blob.open("hunter2").unwrap_err(), WalletError::WrongPassword);
    }

    #[test]
    fn record_debug_redacts() {
        let debug = format!("{:?}", record());
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("abandon"));
    }

    #[test]
    fn file_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(default_file_name(&MAINNET));
        let file = WalletFile::new(EncryptedWallet::seal(&record(), "hunter2").unwrap());
        file.save(&path).unwrap();

        let loaded = WalletFile::load(&path).unwrap();
        assert_eq!(loaded, file);
        assert_eq!(loaded.data.open("hunter2").unwrap().address, record().address);
    }

    #[test]
    fn file_rejects_unencrypted() {
        let json = r#"{"version":"0.1.0","encrypted":false,"data":"00","timestamp":1}"#;
        assert!(matches!(WalletFile::from_json(json), Err(WalletError::CorruptedFile(_))));
    }

    #[test]
    fn file_rejects_empty_data() {
        let json = r#"{"version":"0.1.0","encrypted":true,"data":"","timestamp":1}"#;
        assert!(matches!(WalletFile::from_json(json), Err(WalletError::CorruptedFile(_))));
    }

    #[test]
    fn file_rejects_zero_timestamp() {
        let json = r#"{"version":"0.1.0","encrypted":true,"data":"00","timestamp":0}"#;
        assert!(matches!(WalletFile::from_json(json), Err(WalletError::CorruptedFile(_))));
    }

    #[test]
    fn file_rejects_garbage() {
        assert!(matches!(WalletFile::from_json("garbage"), Err(WalletError::CorruptedFile(_))));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = WalletFile::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, WalletError::IoError(_)));
    }

    #[test]
    fn file_names_per_network() {
        assert_eq!(default_file_name(&MAINNET), "scash-wallet.json");
        assert_eq!(default_file_name(&TESTNET), "scash-wallet-testnet.json");
    }
}
