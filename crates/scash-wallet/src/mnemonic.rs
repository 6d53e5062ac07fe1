//! BIP-39 mnemonic generation and parsing.

use bip39::{Language, Mnemonic};
use zeroize::Zeroizing;

use scash_core::constants::MNEMONIC_WORD_COUNT;

use crate::error::WalletError;

/// Entropy length of a 12-word mnemonic.
const ENTROPY_LEN: usize = 16;

/// Generate a fresh 12-word English mnemonic from OS randomness.
pub fn generate_mnemonic() -> Result<Zeroizing<String>, WalletError> {
    use rand::RngCore;
    let mut entropy = Zeroizing::new([0u8; ENTROPY_LEN]);
    rand::rngs::OsRng.fill_bytes(entropy.as_mut());
    let m = Mnemonic::from_entropy_in(Language::English, entropy.as_ref())
        .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
    Ok(Zeroizing::new(m.to_string()))
}

/// Normalize whitespace and case the way users tend to mangle phrases.
pub fn normalize_phrase(phrase: &str) -> Zeroizing<String> {
    Zeroizing::new(
        phrase
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    )
}

/// Parse a 12-word BIP-39 mnemonic.
///
/// Rejects any other word count before the wordlist and checksum checks.
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, WalletError> {
    let normalized = normalize_phrase(phrase);
    let words = normalized.split(' ').filter(|w| !w.is_empty()).count();
    if words != MNEMONIC_WORD_COUNT {
        return Err(WalletError::InvalidMnemonic(format!(
            "expected {MNEMONIC_WORD_COUNT} words, got {words}"
        )));
    }
    Mnemonic::parse_in(Language::English, normalized.as_str())
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}

/// BIP-39 seed (empty passphrase) of a 12-word mnemonic.
pub fn mnemonic_to_seed(phrase: &str) -> Result<Zeroizing<[u8; 64]>, WalletError> {
    let m = parse_mnemonic(phrase)?;
    Ok(Zeroizing::new(m.to_seed("")))
}
