//! Deterministic derivation of the wallet's single signing key.
//!
//! mnemonic → BIP-39 seed → BIP-32 master → `m/84'/0'/0'/0/0`. The same
//! mnemonic always yields the same key and address for a given
//! [`NetworkParams`].

use std::fmt;
use std::str::FromStr;

use bitcoin::CompressedPublicKey;
use bitcoin::NetworkKind;
use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv, Xpub};
use bitcoin::secp256k1::ecdsa::Signature;
use bitcoin::secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use zeroize::Zeroizing;

use scash_core::address::Address;
use scash_core::constants::DERIVATION_PATH;
use scash_core::error::CryptoError;
use scash_core::network::NetworkParams;
use scash_core::traits::InputSigner;

use crate::error::WalletError;
use crate::mnemonic::mnemonic_to_seed;

/// Depth of the account node within [`DERIVATION_PATH`].
const ACCOUNT_DEPTH: usize = 3;

/// WIF suffix marking a compressed public key.
const WIF_COMPRESSED: u8 = 0x01;

/// The wallet's signing key.
///
/// Owned by a single signing flow and dropped afterwards; the secret is
/// erased on drop.
pub struct SigningKey {
    secret: SecretKey,
    public: CompressedPublicKey,
    address: Address,
    account_xpub: Xpub,
    params: NetworkParams,
}

impl SigningKey {
    /// Derive the key for a 12-word mnemonic.
    pub fn derive(mnemonic: &str, params: &NetworkParams) -> Result<Self, WalletError> {
        let seed = mnemonic_to_seed(mnemonic)?;
        Self::from_seed(seed.as_ref(), params)
    }

    /// Derive the key from a raw BIP-39 seed.
    pub fn from_seed(seed: &[u8], params: &NetworkParams) -> Result<Self, WalletError> {
        let secp = Secp256k1::new();
        let path = DerivationPath::from_str(DERIVATION_PATH)
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        let children: &[ChildNumber] = path.as_ref();
        let (account_path, leaf_path) = children.split_at(ACCOUNT_DEPTH);

        let mut master = Xpriv::new_master(NetworkKind::Main, seed)
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        let mut account = master
            .derive_priv(&secp, &account_path)
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        let mut leaf = account
            .derive_priv(&secp, &leaf_path)
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;

        let account_xpub = Xpub::from_priv(&secp, &account);
        let secret = leaf.private_key;
        let public = CompressedPublicKey(PublicKey::from_secret_key(&secp, &secret));
        let address = Address::p2wpkh(&public, params)?;

        master.private_key.non_secure_erase();
        account.private_key.non_secure_erase();
        leaf.private_key.non_secure_erase();

        Ok(Self {
            secret,
            public,
            address,
            account_xpub,
            params: params.clone(),
        })
    }

    /// Compressed public key.
    pub fn public_key(&self) -> CompressedPublicKey {
        self.public
    }

    /// P2WPKH receive address.
    pub fn address(&self) -> Address {
        self.address.clone()
    }

    /// Wallet import format string, using the network's WIF version byte.
    pub fn to_wif(&self) -> Zeroizing<String> {
        let mut payload = Zeroizing::new(Vec::with_capacity(34));
        payload.push(self.params.wif);
        payload.extend_from_slice(&self.secret.secret_bytes());
        payload.push(WIF_COMPRESSED);
        Zeroizing::new(bs58::encode(payload.as_slice()).with_check().into_string())
    }

    /// Base58 account-level (`m/84'/0'/0'`) extended public key, using the
    /// network's BIP-32 public version bytes.
    pub fn account_xpub(&self) -> String {
        let mut bytes = self.account_xpub.encode();
        bytes[..4].copy_from_slice(&self.params.bip32.public.to_be_bytes());
        bs58::encode(bytes).with_check().into_string()
    }

    /// Sign a 32-byte digest.
    pub fn sign(&self, digest: [u8; 32]) -> Signature {
        let secp = Secp256k1::signing_only();
        secp.sign_ecdsa(&Message::from_digest(digest), &self.secret)
    }
}

impl InputSigner for SigningKey {
    fn public_key(&self) -> CompressedPublicKey {
        self.public
    }

    fn sign_digest(&self, digest: [u8; 32]) -> Result<Signature, CryptoError> {
        Ok(self.sign(digest))
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("network", &self.params.network)
            .field("public", &self.public)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
