//! Locally broadcast transactions awaiting confirmation.
//!
//! The node's UTXO scan only sees confirmed outputs, so outputs already spent
//! by a broadcast transaction would otherwise be selected again. The ledger
//! remembers what was consumed until the node reports a block for it.

use std::path::Path;

use bitcoin::OutPoint;
use serde::{Deserialize, Serialize};

use scash_core::types::{SpendOutput, Utxo};

use crate::builder::SignedTransaction;
use crate::error::WalletError;

/// Conventional ledger file name inside the data directory.
pub const PENDING_FILE_NAME: &str = "pending.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingStatus {
    Pending,
    Confirmed,
}

/// A broadcast transaction and what it spent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    /// Transaction id as returned by the node.
    pub id: String,
    pub raw_hex: String,
    pub total_input: u64,
    pub total_output: u64,
    pub change: u64,
    pub network_fee: u64,
    pub platform_fee: u64,
    pub consumed: Vec<OutPoint>,
    pub outputs: Vec<SpendOutput>,
    /// Unix milliseconds.
    pub created_at: i64,
    pub status: PendingStatus,
}

impl PendingTransaction {
    pub fn from_signed(id: impl Into<String>, signed: &SignedTransaction, created_at: i64) -> Self {
        Self {
            id: id.into(),
            raw_hex: signed.raw_hex.clone(),
            total_input: signed.total_input,
            total_output: signed.total_output,
            change: signed.change,
            network_fee: signed.network_fee,
            platform_fee: signed.platform_fee,
            consumed: signed.consumed.iter().map(Utxo::outpoint).collect(),
            outputs: signed.outputs.clone(),
            created_at,
            status: PendingStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == PendingStatus::Pending
    }
}

/// Ordered record of broadcast transactions. Entries are never removed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLedger {
    transactions: Vec<PendingTransaction>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry`. Returns `false` when an entry with the same id exists.
    pub fn record(&mut self, entry: PendingTransaction) -> bool {
        if self.get(&entry.id).is_some() {
            tracing::debug!(txid = %entry.id, "pending entry already recorded");
            return false;
        }
        self.transactions.push(entry);
        true
    }

    /// Flip `txid` to confirmed. Returns `true` if the status changed.
    pub fn mark_confirmed(&mut self, txid: &str) -> bool {
        match self.transactions.iter_mut().find(|t| t.id == txid) {
            Some(t) if t.is_pending() => {
                t.status = PendingStatus::Confirmed;
                tracing::info!(%txid, "pending transaction confirmed");
                true
            }
            _ => false,
        }
    }

    /// Entries still awaiting confirmation, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &PendingTransaction> {
        self.transactions.iter().filter(|t| t.is_pending())
    }

    pub fn get(&self, txid: &str) -> Option<&PendingTransaction> {
        self.transactions.iter().find(|t| t.id == txid)
    }

    pub fn all(&self) -> &[PendingTransaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Mark every UTXO consumed by a still-pending entry as in-mempool.
    /// Returns the number of UTXOs flagged.
    pub fn apply_mempool_flags(&self, utxos: &mut [Utxo]) -> usize {
        let mut flagged = 0;
        for utxo in utxos.iter_mut() {
            let outpoint = utxo.outpoint();
            if self.pending().any(|t| t.consumed.contains(&outpoint)) {
                utxo.in_mempool = true;
                flagged += 1;
            }
        }
        flagged
    }

    /// Load a ledger from `path`. A missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(WalletError::IoError(e.to_string())),
        };
        serde_json::from_str(&json)
            .map_err(|e| WalletError::CorruptedFile(format!("pending ledger: {e}")))
    }

    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WalletError::IoError(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| WalletError::Serialization(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| WalletError::IoError(e.to_string()))
    }
}
