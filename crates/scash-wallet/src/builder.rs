//! Transaction assembly and signing.
//!
//! 1. Add payment and payload outputs (address + amount)
//! 2. Build the unsigned transaction from pre-selected UTXOs, adding the
//!    platform-fee output and the change output
//! 3. Sign every input with the wallet's single key
//!
//! Output order is fixed: payment/payload outputs, then the platform fee,
//! then change. Explorers and history classification rely on it.

use bitcoin::consensus::encode::serialize_hex;
use bitcoin::hashes::Hash;
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness, absolute, ecdsa,
};
use serde::{Deserialize, Serialize};

use scash_core::address::Address;
use scash_core::network::NetworkParams;
use scash_core::traits::InputSigner;
use scash_core::types::{PayloadOutput, SpendOutput, Utxo};

use crate::error::WalletError;

/// How the fee passed to [`TransactionBuilder::build`] relates to the
/// platform fee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeBudget {
    /// Miner fee only; the platform fee is charged on top.
    Miner(u64),
    /// Miner fee plus platform fee. The miner receives the remainder.
    Combined(u64),
}

impl FeeBudget {
    /// Miner fee left after the platform fee is accounted for.
    pub fn network_fee(&self, platform_fee: u64) -> Result<u64, WalletError> {
        match *self {
            FeeBudget::Miner(fee) => Ok(fee),
            FeeBudget::Combined(total) => total.checked_sub(platform_fee).ok_or_else(|| {
                WalletError::InvalidAmount(format!(
                    "combined fee {total} is below platform fee {platform_fee}"
                ))
            }),
        }
    }
}

/// A transaction with inputs and outputs in place but no witnesses.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    pub tx: Transaction,
    /// The UTXOs spent, one per input in order.
    pub inputs: Vec<Utxo>,
    pub total_input: u64,
    /// Payment and payload outputs only.
    pub total_output: u64,
    pub platform_fee: u64,
    pub network_fee: u64,
    pub change: u64,
    /// Every output in transaction order, including platform fee and change.
    pub outputs: Vec<SpendOutput>,
}

/// A fully signed transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub raw_hex: String,
    pub txid: Txid,
    pub total_input: u64,
    /// Payment and payload outputs only.
    pub total_output: u64,
    pub change: u64,
    pub network_fee: u64,
    pub platform_fee: u64,
    /// Every output in transaction order, including platform fee and change.
    pub outputs: Vec<SpendOutput>,
    /// The UTXOs this transaction spends.
    pub consumed: Vec<Utxo>,
}

impl SignedTransaction {
    /// `total_input == total_output + platform_fee + network_fee + change`.
    pub fn is_balanced(&self) -> bool {
        self.total_output
            .checked_add(self.platform_fee)
            .and_then(|v| v.checked_add(self.network_fee))
            .and_then(|v| v.checked_add(self.change))
            == Some(self.total_input)
    }
}

/// Builder for constructing and signing wallet transactions.
///
/// # Example
/// ```ignore
/// let mut builder = TransactionBuilder::new(&MAINNET);
/// builder.add_output(recipient, 5 * COIN).set_platform_fee(platform_fee(5 * COIN));
/// let unsigned = builder.build(&selection.selected, &own_address, FeeBudget::Miner(fee))?;
/// let signed = TransactionBuilder::sign(unsigned, &signing_key)?;
/// ```
pub struct TransactionBuilder<'a> {
    params: &'a NetworkParams,
    outputs: Vec<SpendOutput>,
    platform_fee: u64,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(params: &'a NetworkParams) -> Self {
        Self {
            params,
            outputs: Vec::new(),
            platform_fee: 0,
        }
    }

    /// Add a payment output.
    pub fn add_output(&mut self, address: impl Into<String>, amount: u64) -> &mut Self {
        self.outputs.push(SpendOutput::new(address, amount));
        self
    }

    /// Add payment outputs in order.
    pub fn add_outputs(&mut self, outputs: &[SpendOutput]) -> &mut Self {
        self.outputs.extend_from_slice(outputs);
        self
    }

    /// Add data-carrying outputs in codec order.
    pub fn add_payload_outputs(&mut self, outputs: &[PayloadOutput]) -> &mut Self {
        self.outputs.extend(
            outputs
                .iter()
                .map(|o| SpendOutput::new(o.address.clone(), o.value)),
        );
        self
    }

    /// Charge a platform fee paid to the network's fee address. Zero disables
    /// the platform-fee output.
    pub fn set_platform_fee(&mut self, fee: u64) -> &mut Self {
        self.platform_fee = fee;
        self
    }

    /// Assemble inputs and outputs from already-selected UTXOs.
    ///
    /// Change goes to `change_address` when positive. A negative change is
    /// rejected as [`WalletError::InsufficientFunds`] before anything is
    /// signed.
    pub fn build(
        &self,
        utxos: &[Utxo],
        change_address: &Address,
        fee: FeeBudget,
    ) -> Result<UnsignedTransaction, WalletError> {
        if utxos.is_empty() {
            return Err(WalletError::NoUtxos);
        }
        if self.outputs.is_empty() {
            return Err(WalletError::BuildError("no outputs".into()));
        }

        let mut output = Vec::with_capacity(self.outputs.len() + 2);
        let mut listed = self.outputs.clone();
        let mut total_output: u64 = 0;
        for (i, o) in self.outputs.iter().enumerate() {
            if o.amount == 0 {
                return Err(WalletError::InvalidAmount(format!("output {i} is zero")));
            }
            let address = Address::parse(&o.address, self.params)
                .map_err(|e| WalletError::InvalidAddress(format!("{}: {e}", o.address)))?;
            total_output = total_output
                .checked_add(o.amount)
                .ok_or_else(|| WalletError::InvalidAmount("total output overflow".into()))?;
            output.push(TxOut {
                value: Amount::from_sat(o.amount),
                script_pubkey: address.script_pubkey(),
            });
        }

        if self.platform_fee > 0 {
            let fee_address = Address::parse(self.params.platform_fee_address, self.params)?;
            output.push(TxOut {
                value: Amount::from_sat(self.platform_fee),
                script_pubkey: fee_address.script_pubkey(),
            });
            listed.push(SpendOutput::new(fee_address.as_str(), self.platform_fee));
        }

        let network_fee = fee.network_fee(self.platform_fee)?;
        let total_input = utxos
            .iter()
            .try_fold(0u64, |acc, u| acc.checked_add(u.amount))
            .ok_or_else(|| WalletError::InvalidAmount("total input overflow".into()))?;
        let need = total_output
            .checked_add(self.platform_fee)
            .and_then(|v| v.checked_add(network_fee))
            .ok_or_else(|| WalletError::InvalidAmount("total spend overflow".into()))?;
        let change = total_input
            .checked_sub(need)
            .ok_or(WalletError::InsufficientFunds {
                have: total_input,
                need,
            })?;

        if change > 0 {
            output.push(TxOut {
                value: Amount::from_sat(change),
                script_pubkey: change_address.script_pubkey(),
            });
            listed.push(SpendOutput::new(change_address.as_str(), change));
        }

        let input = utxos
            .iter()
            .map(|u| TxIn {
                previous_output: u.outpoint(),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
            .collect();

        let tx = Transaction {
            version: Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input,
            output,
        };

        tracing::debug!(
            inputs = utxos.len(),
            outputs = tx.output.len(),
            total_input,
            total_output,
            platform_fee = self.platform_fee,
            network_fee,
            change,
            "built unsigned transaction"
        );

        Ok(UnsignedTransaction {
            tx,
            inputs: utxos.to_vec(),
            total_input,
            total_output,
            platform_fee: self.platform_fee,
            network_fee,
            change,
            outputs: listed,
        })
    }

    /// Sign every input with `signer` and serialize.
    ///
    /// All inputs must pay to the signer's own P2WPKH script. Any failure is
    /// reported as [`WalletError::SigningFailure`] and nothing is returned
    /// for broadcast.
    pub fn sign(
        unsigned: UnsignedTransaction,
        signer: &dyn InputSigner,
    ) -> Result<SignedTransaction, WalletError> {
        let UnsignedTransaction {
            mut tx,
            inputs,
            total_input,
            total_output,
            platform_fee,
            network_fee,
            change,
            outputs,
        } = unsigned;

        let public_key = signer.public_key();
        let own_script = ScriptBuf::new_p2wpkh(&public_key.wpubkey_hash());

        let mut witnesses = Vec::with_capacity(inputs.len());
        let mut cache = SighashCache::new(&tx);
        for (i, utxo) in inputs.iter().enumerate() {
            if utxo.script_pubkey != own_script {
                return Err(WalletError::SigningFailure(format!(
                    "input {i} ({}) does not pay to the signing key",
                    utxo.outpoint()
                )));
            }
            let sighash = cache
                .p2wpkh_signature_hash(
                    i,
                    &utxo.script_pubkey,
                    Amount::from_sat(utxo.amount),
                    EcdsaSighashType::All,
                )
                .map_err(|e| WalletError::SigningFailure(format!("input {i}: {e}")))?;
            let signature = signer
                .sign_digest(sighash.to_byte_array())
                .map_err(|e| WalletError::SigningFailure(format!("input {i}: {e}")))?;
            let signature = ecdsa::Signature {
                signature,
                sighash_type: EcdsaSighashType::All,
            };

            let mut witness = Witness::new();
            witness.push(signature.serialize());
            witness.push(public_key.to_bytes());
            witnesses.push(witness);
        }

        for (txin, witness) in tx.input.iter_mut().zip(witnesses) {
            txin.witness = witness;
        }

        let txid = tx.compute_txid();
        let raw_hex = serialize_hex(&tx);

        tracing::info!(
            %txid,
            inputs = inputs.len(),
            outputs = tx.output.len(),
            network_fee,
            platform_fee,
            change,
            "signed transaction"
        );

        Ok(SignedTransaction {
            raw_hex,
            txid,
            total_input,
            total_output,
            change,
            network_fee,
            platform_fee,
            outputs,
            consumed: inputs,
        })
    }
}
