//! Shared data types for the SCASH wallet engine.
//!
//! Amounts are integer satoshis everywhere. Fields that travel as whole-coin
//! decimals on the wire (node RPC, explorer JSON) use the
//! [`as_coin`](crate::constants::as_coin) serde adapter.

use std::fmt;

use bitcoin::{OutPoint, ScriptBuf, Txid};
use serde::{Deserialize, Serialize};

use crate::constants::{as_coin, format_coin};

/// An unspent output paying to the wallet address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    /// Value in satoshis.
    #[serde(with = "as_coin")]
    pub amount: u64,
    #[serde(rename = "scriptPubKey")]
    pub script_pubkey: ScriptBuf,
    /// Confirmation height reported by the node.
    pub height: u64,
    /// Chain-confirmed and not referenced by a pending spend.
    #[serde(default = "default_true")]
    pub usable: bool,
    /// Already consumed by a broadcast transaction still in the mempool.
    #[serde(default)]
    pub in_mempool: bool,
}

fn default_true() -> bool {
    true
}

impl Utxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }

    /// Whether coin selection may spend this output.
    pub fn is_spendable(&self) -> bool {
        self.usable && !self.in_mempool
    }
}

/// An ordinary payment destination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendOutput {
    pub address: String,
    /// Amount in satoshis.
    #[serde(with = "as_coin")]
    pub amount: u64,
}

impl SpendOutput {
    pub fn new(address: impl Into<String>, amount: u64) -> Self {
        Self {
            address: address.into(),
            amount,
        }
    }
}

/// A data-carrying output produced by the payload codec.
///
/// The value only pays for carrying data; it is not a payment intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadOutput {
    pub address: String,
    /// Value in satoshis.
    #[serde(with = "as_coin")]
    pub value: u64,
}

/// One address/amount line of an explorer transaction record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxParty {
    pub address: String,
    /// Amount in satoshis.
    pub amount: u64,
}

/// A historical transaction as reported by the block explorer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecord {
    pub txid: String,
    #[serde(default)]
    pub block_height: u64,
    #[serde(default)]
    pub senders: Vec<TxParty>,
    #[serde(default)]
    pub receivers: Vec<TxParty>,
    #[serde(default)]
    pub change_outputs: Vec<TxParty>,
    /// Unix seconds.
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub confirmations: u64,
}

/// Direction of a historical transaction relative to the wallet address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Income,
    Expense,
    #[serde(rename = "self")]
    SelfTransfer,
    Mining,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxKind::Income => "income",
            TxKind::Expense => "expense",
            TxKind::SelfTransfer => "self",
            TxKind::Mining => "mining",
        };
        f.write_str(s)
    }
}

/// A transaction classified for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedTransaction {
    pub kind: TxKind,
    /// Absolute value of `net_amount`, in satoshis.
    pub amount: u64,
    /// Signed balance change of the wallet address, in satoshis.
    pub net_amount: i64,
    pub txid: String,
    pub timestamp: u64,
    pub confirmations: u64,
}

impl ClassifiedTransaction {
    pub fn is_positive(&self) -> bool {
        self.net_amount >= 0
    }

    /// Signed display string, e.g. `-0.14000000`.
    pub fn display_net(&self) -> String {
        let sign = if self.is_positive() { "+" } else { "-" };
        format!("{sign}{}", format_coin(self.amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const TXID: &str = "5e1c8f0a7c1b2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f708192a3b4c5d6e7f80910";

    #[test]
    fn utxo_from_node_json() {
        let json = format!(
            r#"{{"txid":"{TXID}","vout":1,"amount":0.5,
                "scriptPubKey":"0014c0cebcd6c3d3ca8c75dc5ec62ebe55330ef910e2","height":120}}"#
        );
        let utxo: Utxo = serde_json::from_str(&json).unwrap();
        assert_eq!(utxo.amount, 50_000_000);
        assert_eq!(utxo.vout, 1);
        assert!(utxo.usable);
        assert!(!utxo.in_mempool);
        assert!(utxo.script_pubkey.is_p2wpkh());
        assert_eq!(utxo.outpoint(), OutPoint::new(Txid::from_str(TXID).unwrap(), 1));
    }

    #[test]
    fn spendable_flags() {
        let mut utxo = Utxo {
            txid: Txid::from_str(TXID).unwrap(),
            vout: 0,
            amount: 1,
            script_pubkey: ScriptBuf::new(),
            height: 1,
            usable: true,
            in_mempool: false,
        };
        assert!(utxo.is_spendable());
        utxo.in_mempool = true;
        assert!(!utxo.is_spendable());
        utxo.in_mempool = false;
        utxo.usable = false;
        assert!(!utxo.is_spendable());
    }

    #[test]
    fn tx_kind_serde_names() {
        assert_eq!(serde_json::to_string(&TxKind::SelfTransfer).unwrap(), r#""self""#);
        assert_eq!(serde_json::to_string(&TxKind::Mining).unwrap(), r#""mining""#);
        assert_eq!(TxKind::Expense.to_string(), "expense");
    }

    #[test]
    fn tx_record_defaults_missing_lists() {
        let rec: TxRecord = serde_json::from_str(r#"{"txid":"ab"}"#).unwrap();
        assert!(rec.senders.is_empty());
        assert!(rec.change_outputs.is_empty());
        assert_eq!(rec.confirmations, 0);
    }

    #[test]
    fn classified_display_net() {
        let c = ClassifiedTransaction {
            kind: TxKind::Expense,
            amount: 14_000_000,
            net_amount: -14_000_000,
            txid: "ab".into(),
            timestamp: 0,
            confirmations: 3,
        };
        assert!(!c.is_positive());
        assert_eq!(c.display_net(), "-0.14000000");
    }
}
