//! Chain parameters for SCASH mainnet and testnet.
//!
//! The testnet profile is the regtest-style chain the public test nodes run;
//! it shares every version byte with mainnet and differs only in the bech32
//! prefix and the platform fee address.

use serde::{Deserialize, Serialize};

/// Which SCASH chain a wallet talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Select the network from an "is test network" flag.
    pub fn from_testnet_flag(is_testnet: bool) -> Self {
        if is_testnet {
            Network::Testnet
        } else {
            Network::Mainnet
        }
    }

    /// The immutable parameter set for this network.
    pub fn params(&self) -> &'static NetworkParams {
        match self {
            Network::Mainnet => &MAINNET,
            Network::Testnet => &TESTNET,
        }
    }
}

/// BIP-32 extended key version bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bip32Versions {
    pub public: u32,
    pub private: u32,
}

/// Immutable chain constants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkParams {
    pub network: Network,
    /// Prefix prepended when hashing signed messages.
    pub message_prefix: &'static str,
    /// Bech32 human-readable part of segwit addresses.
    pub bech32_hrp: &'static str,
    pub bip32: Bip32Versions,
    /// Legacy P2PKH address version byte.
    pub pubkey_hash: u8,
    /// Legacy P2SH address version byte.
    pub script_hash: u8,
    /// WIF private key version byte.
    pub wif: u8,
    /// Destination of the platform fee output.
    pub platform_fee_address: &'static str,
}

pub const MAINNET: NetworkParams = NetworkParams {
    network: Network::Mainnet,
    message_prefix: "\x18Scash Signed Message:\n",
    bech32_hrp: "scash",
    bip32: Bip32Versions {
        public: 0x0488_b21e,
        private: 0x0488_ade4,
    },
    pubkey_hash: 0x3c,
    script_hash: 0x7d,
    wif: 0x80,
    platform_fee_address: "scash1qdq0sa4wxav36k7a4gwxq3k6dk0ahpqfsz8xpvg",
};

pub const TESTNET: NetworkParams = NetworkParams {
    network: Network::Testnet,
    message_prefix: "\x18Scash Signed Message:\n",
    bech32_hrp: "bcrt",
    bip32: Bip32Versions {
        public: 0x0488_b21e,
        private: 0x0488_ade4,
    },
    pubkey_hash: 0x3c,
    script_hash: 0x7d,
    wif: 0x80,
    platform_fee_address: "bcrt1q8zlevurcf7ht49v7m83jz9v8uvqyturrg2w96t",
};
