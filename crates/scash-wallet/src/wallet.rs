//! Wallet composition: encrypted key storage, spend planning, signing and
//! submission.
//!
//! A [`Wallet`] holds only the address and the encrypted record. The
//! signing key is derived from the password on demand for a single
//! [`Wallet::sign`] call and dropped afterwards.

use std::fmt;

use zeroize::Zeroizing;

use scash_core::address::Address;
use scash_core::network::NetworkParams;
use scash_core::traits::{BroadcastSink, FeeRateSource, PayloadCodec, UtxoSource};
use scash_core::types::{SpendOutput, Utxo};

use crate::builder::{FeeBudget, SignedTransaction, TransactionBuilder};
use crate::coin_selection::{CoinSelection, CoinSelector};
use crate::error::WalletError;
use crate::fee::{ENGRAVE_PLATFORM_FEE, FeeEstimate, FeeRate, estimate_fee, platform_fee};
use crate::keys::SigningKey;
use crate::mnemonic::generate_mnemonic;
use crate::payload::data_cost;
use crate::pending::{PendingLedger, PendingTransaction};
use crate::wallet_file::{EncryptedWallet, WalletFile, WalletRecord};

/// A fully costed spend, ready to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendPlan {
    /// Payment or payload outputs, in transaction order.
    pub outputs: Vec<SpendOutput>,
    pub selection: CoinSelection,
    /// Size estimate the network fee was computed from.
    pub fee: FeeEstimate,
    pub network_fee: u64,
    pub platform_fee: u64,
}

impl SpendPlan {
    /// Sum of `outputs`.
    pub fn output_total(&self) -> u64 {
        self.outputs.iter().map(|o| o.amount).sum()
    }

    /// Everything leaving the wallet: outputs plus both fees.
    pub fn total_cost(&self) -> u64 {
        self.output_total() + self.platform_fee + self.network_fee
    }

    /// Value returned to the wallet address.
    pub fn change(&self) -> u64 {
        self.selection.total.saturating_sub(self.total_cost())
    }
}

/// Single-address SCASH wallet.
pub struct Wallet {
    params: NetworkParams,
    address: Address,
    encrypted: EncryptedWallet,
}

impl Wallet {
    /// Create a wallet with a fresh mnemonic.
    ///
    /// The mnemonic is returned once for the user to back up; the wallet
    /// itself keeps it only inside the encrypted record.
    pub fn create(
        params: &NetworkParams,
        password: &str,
    ) -> Result<(Self, Zeroizing<String>), WalletError> {
        let mnemonic = generate_mnemonic()?;
        let wallet = Self::restore(&mnemonic, password, params)?;
        Ok((wallet, mnemonic))
    }

    /// Restore a wallet from an existing 12-word mnemonic.
    pub fn restore(
        mnemonic: &str,
        password: &str,
        params: &NetworkParams,
    ) -> Result<Self, WalletError> {
        let record = WalletRecord::new(mnemonic, password, params)?;
        let address = Address::parse(&record.address, params)?;
        let encrypted = EncryptedWallet::seal(&record, password)?;
        tracing::info!(%address, "wallet restored");
        Ok(Self {
            params: params.clone(),
            address,
            encrypted,
        })
    }

    /// Open a wallet backup file.
    ///
    /// Fails with [`WalletError::WrongPassword`] when the password does not
    /// open the blob, and with an address error when the record belongs to
    /// another network.
    pub fn from_file(
        file: &WalletFile,
        password: &str,
        params: &NetworkParams,
    ) -> Result<Self, WalletError> {
        file.validate()?;
        let record = file.data.open(password)?;
        let address = Address::parse(&record.address, params)?;

        let key = SigningKey::derive(&record.mnemonic, params)?;
        if key.address() != address {
            return Err(WalletError::CorruptedFile(
                "stored address does not match mnemonic".into(),
            ));
        }

        Ok(Self {
            params: params.clone(),
            address,
            encrypted: file.data.clone(),
        })
    }

    /// Export as a portable backup file.
    pub fn to_file(&self) -> WalletFile {
        WalletFile::new(self.encrypted.clone())
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    /// Decrypt the stored record (mnemonic, WIF) for display or export.
    pub fn unlock(&self, password: &str) -> Result<WalletRecord, WalletError> {
        self.encrypted.open(password)
    }

    /// Current fee rate from `source`.
    pub async fn fee_rate(
        &self,
        source: &dyn FeeRateSource,
        conf_target: u16,
    ) -> Result<FeeRate, WalletError> {
        let rate = source
            .fee_rate_per_kb(conf_target)
            .await
            .map_err(|e| WalletError::Source(e.to_string()))?;
        FeeRate::from_coin_per_kb(rate)
    }

    /// Snapshot of the address's UTXOs with pending spends flagged.
    pub async fn unspent(
        &self,
        source: &dyn UtxoSource,
        ledger: &PendingLedger,
    ) -> Result<Vec<Utxo>, WalletError> {
        let mut utxos = source
            .unspent(self.address.as_str())
            .await
            .map_err(|e| WalletError::Source(e.to_string()))?;
        let flagged = ledger.apply_mempool_flags(&mut utxos);
        tracing::debug!(utxos = utxos.len(), flagged, "fetched unspent outputs");
        Ok(utxos)
    }

    /// Plan an ordinary payment to `outputs`.
    pub fn prepare_send(
        &self,
        utxos: &[Utxo],
        outputs: &[SpendOutput],
        rate: FeeRate,
    ) -> Result<SpendPlan, WalletError> {
        if outputs.is_empty() {
            return Err(WalletError::BuildError("no recipients".into()));
        }
        for o in outputs {
            if o.amount == 0 {
                return Err(WalletError::InvalidAmount(format!("zero amount to {}", o.address)));
            }
            Address::parse(&o.address, &self.params)
                .map_err(|e| WalletError::InvalidAddress(format!("{}: {e}", o.address)))?;
        }
        let total = outputs
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.amount))
            .ok_or_else(|| WalletError::InvalidAmount("total output overflow".into()))?;

        self.plan(utxos, outputs.to_vec(), total, platform_fee(total), rate)
    }

    /// Plan a data-anchoring transaction carrying `text`.
    pub fn prepare_engrave(
        &self,
        codec: &dyn PayloadCodec,
        text: &str,
        utxos: &[Utxo],
        rate: FeeRate,
    ) -> Result<SpendPlan, WalletError> {
        if text.trim().is_empty() {
            return Err(WalletError::Payload("message is empty".into()));
        }
        let payload = codec
            .encode(text)
            .map_err(|e| WalletError::Payload(e.to_string()))?;
        if payload.is_empty() {
            return Err(WalletError::Payload("codec produced no outputs".into()));
        }
        let cost = data_cost(&payload);
        let outputs = payload
            .into_iter()
            .map(|p| SpendOutput::new(p.address, p.value))
            .collect();

        self.plan(utxos, outputs, cost, ENGRAVE_PLATFORM_FEE, rate)
    }

    /// Select inputs and cost the network fee, re-estimating until the
    /// selected input count no longer changes.
    fn plan(
        &self,
        utxos: &[Utxo],
        outputs: Vec<SpendOutput>,
        output_total: u64,
        platform_fee: u64,
        rate: FeeRate,
    ) -> Result<SpendPlan, WalletError> {
        // Outputs plus the platform fee output plus change.
        let output_count = outputs.len() + usize::from(platform_fee > 0) + 1;
        let mut inputs = 1;

        for _ in 0..=utxos.len() {
            let fee = estimate_fee(inputs, output_count, rate);
            let required = output_total
                .checked_add(platform_fee)
                .and_then(|v| v.checked_add(fee.fee_sat))
                .ok_or_else(|| WalletError::InvalidAmount("total spend overflow".into()))?;
            let selection = CoinSelector::select(utxos, required)?;

            if selection.len() <= inputs {
                tracing::debug!(
                    inputs = selection.len(),
                    outputs = output_count,
                    network_fee = fee.fee_sat,
                    platform_fee,
                    "spend planned"
                );
                return Ok(SpendPlan {
                    outputs,
                    selection,
                    fee,
                    network_fee: fee.fee_sat,
                    platform_fee,
                });
            }
            inputs = selection.len();
        }

        Err(WalletError::BuildError("fee estimate did not converge".into()))
    }

    /// Decrypt the key with `password` and sign `plan`.
    pub fn sign(&self, plan: &SpendPlan, password: &str) -> Result<SignedTransaction, WalletError> {
        let record = self.unlock(password)?;
        let key = SigningKey::derive(&record.mnemonic, &self.params)?;
        drop(record);
        if key.address() != self.address {
            return Err(WalletError::SigningFailure(
                "derived key does not match wallet address".into(),
            ));
        }

        let budget = plan
            .network_fee
            .checked_add(plan.platform_fee)
            .map(FeeBudget::Combined)
            .ok_or_else(|| WalletError::InvalidAmount("fee overflow".into()))?;

        let mut builder = TransactionBuilder::new(&self.params);
        builder
            .add_outputs(&plan.outputs)
            .set_platform_fee(plan.platform_fee);
        let unsigned = builder.build(&plan.selection.selected, &self.address, budget)?;
        TransactionBuilder::sign(unsigned, &key)
    }

    /// Broadcast `signed` and record it in `ledger`.
    ///
    /// A node rejection is returned verbatim as
    /// [`WalletError::BroadcastRejected`] and is not retried.
    pub async fn submit(
        &self,
        sink: &dyn BroadcastSink,
        signed: &SignedTransaction,
        ledger: &mut PendingLedger,
        now_ms: i64,
    ) -> Result<String, WalletError> {
        let txid = match sink.broadcast(&signed.raw_hex).await {
            Ok(txid) => txid,
            Err(e) => {
                tracing::warn!(txid = %signed.txid, code = e.code, reason = %e.message, "broadcast rejected");
                return Err(WalletError::BroadcastRejected {
                    code: e.code,
                    message: e.message,
                });
            }
        };

        if txid != signed.txid.to_string() {
            tracing::warn!(local = %signed.txid, node = %txid, "node reported a different txid");
        }
        tracing::info!(%txid, "transaction broadcast");

        ledger.record(PendingTransaction::from_signed(txid.clone(), signed, now_ms));
        Ok(txid)
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("network", &self.params.network)
            .field("address", &self.address.as_str())
            .finish()
    }
}
