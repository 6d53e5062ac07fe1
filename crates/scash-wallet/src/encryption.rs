//! AES-256-GCM encryption of the wallet record.
//!
//! The key is the lowercase hex MD5 digest of the password, whose 32 ASCII
//! characters are used directly as the AES-256 key. MD5 is fast and unsalted;
//! it is kept only so existing wallet files stay importable.
//!
//! # Wire format
//! ```text
//! hex( nonce (12 bytes) || ciphertext + auth_tag (16 bytes) )
//! ```

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use md5::{Digest, Md5};
use zeroize::Zeroizing;

use crate::error::WalletError;

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

/// Lowercase hex MD5 of the password, as stored in the record's
/// `passwordHash` field.
pub fn password_hash(password: &str) -> Zeroizing<String> {
    Zeroizing::new(hex::encode(Md5::digest(password.as_bytes())))
}

fn cipher_for(password: &str) -> Result<Aes256Gcm, WalletError> {
    let key = password_hash(password);
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| WalletError::WrongPassword)
}

/// Encrypt `plaintext` under `password` with a fresh random nonce.
///
/// Returns `nonce || ciphertext+tag`.
pub fn encrypt(plaintext: &[u8], password: &str) -> Result<Vec<u8>, WalletError> {
    use rand::RngCore;
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let cipher = cipher_for(password)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| WalletError::BuildError(format!("encryption: {e}")))?;

    let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Decrypt data produced by [`encrypt`].
///
/// Truncated input and tag mismatch both report
/// [`WalletError::WrongPassword`]; callers learn nothing about which check
/// failed.
pub fn decrypt(encrypted: &[u8], password: &str) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    if encrypted.len() < NONCE_LEN + TAG_LEN {
        return Err(WalletError::WrongPassword);
    }
    let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_LEN);
    let cipher = cipher_for(password)?;
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| WalletError::WrongPassword)
}
