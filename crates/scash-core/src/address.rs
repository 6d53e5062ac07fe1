//! Segwit address encoding for SCASH.
//!
//! Addresses are BIP-173/BIP-350 bech32 strings whose human-readable part
//! comes from [`NetworkParams`]: `scash1...` on mainnet, `bcrt1...` on
//! testnet. Only witness programs are supported; legacy base58 addresses are
//! rejected.

use std::fmt;

use bech32::{Fe32, Hrp, segwit};
use bitcoin::{CompressedPublicKey, Script, ScriptBuf, WitnessProgram, WitnessVersion};

use crate::error::AddressError;
use crate::network::NetworkParams;

/// A validated segwit address bound to a network prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    encoded: String,
    program: WitnessProgram,
}

impl Address {
    /// Parse and validate an address for the given network.
    ///
    /// Checks the bech32 checksum variant for the witness version, the
    /// human-readable prefix, and the witness program length.
    pub fn parse(s: &str, params: &NetworkParams) -> Result<Self, AddressError> {
        let (hrp, version, program) =
            segwit::decode(s.trim()).map_err(|e| AddressError::Bech32(e.to_string()))?;

        let hrp = hrp.to_lowercase();
        if hrp != params.bech32_hrp {
            return Err(AddressError::WrongNetwork {
                expected: params.bech32_hrp.to_string(),
                got: hrp,
            });
        }

        let version = WitnessVersion::try_from(version.to_u8())
            .map_err(|_| AddressError::InvalidVersion(version.to_u8()))?;
        let program = WitnessProgram::new(version, &program)
            .map_err(|_| AddressError::InvalidProgramLength(program.len()))?;

        Self::from_program(program, params)
    }

    /// The native segwit (P2WPKH) address of a compressed public key.
    ///
    /// Fails only when `params` carries a malformed HRP.
    pub fn p2wpkh(
        public_key: &CompressedPublicKey,
        params: &NetworkParams,
    ) -> Result<Self, AddressError> {
        Self::from_program(WitnessProgram::p2wpkh(public_key), params)
    }

    /// Recover the address paying to a witness `script_pubkey`.
    pub fn from_script(script: &Script, params: &NetworkParams) -> Result<Self, AddressError> {
        let version = script.witness_version().ok_or(AddressError::NotWitnessScript)?;
        let bytes = script.as_bytes();
        if bytes.len() < 4 {
            return Err(AddressError::NotWitnessScript);
        }
        let program = WitnessProgram::new(version, &bytes[2..])
            .map_err(|_| AddressError::InvalidProgramLength(bytes.len() - 2))?;
        Self::from_program(program, params)
    }

    fn from_program(program: WitnessProgram, params: &NetworkParams) -> Result<Self, AddressError> {
        let hrp = Hrp::parse(params.bech32_hrp).map_err(|e| AddressError::Bech32(e.to_string()))?;
        let version = Fe32::try_from(program.version().to_num())
            .map_err(|_| AddressError::InvalidVersion(program.version().to_num()))?;
        let encoded = segwit::encode(hrp, version, program.program().as_bytes())
            .map_err(|e| AddressError::Bech32(e.to_string()))?;
        Ok(Self { encoded, program })
    }

    /// The locking script paying to this address.
    pub fn script_pubkey(&self) -> ScriptBuf {
        ScriptBuf::new_witness_program(&self.program)
    }

    /// The witness version of the program.
    pub fn witness_version(&self) -> WitnessVersion {
        self.program.version()
    }

    /// Canonical lowercase string form.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

/// Whether `s` is a valid address on the given network.
pub fn validate_address(s: &str, params: &NetworkParams) -> bool {
    Address::parse(s, params).is_ok()
}
