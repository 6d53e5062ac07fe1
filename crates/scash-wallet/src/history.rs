//! Classification of explorer transaction records relative to the wallet
//! address.

use scash_core::types::{ClassifiedTransaction, TxKind, TxParty, TxRecord};

fn own_total(parties: &[TxParty], own: &str) -> u64 {
    parties
        .iter()
        .filter(|p| p.address == own)
        .fold(0u64, |acc, p| acc.saturating_add(p.amount))
}

fn clamp_i64(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Classify one transaction from the point of view of `own`.
///
/// Rules apply in order:
/// - no senders and something received: mining, net = received
/// - sent and received: self, net = received - sent
/// - sent only: expense, net = -(sent - change)
/// - received only: income, net = received
/// - anything else: self with net zero (logged as a data-quality issue)
pub fn classify(tx: &TxRecord, own: &str) -> ClassifiedTransaction {
    let sent = own_total(&tx.senders, own);
    let received = own_total(&tx.receivers, own);
    let change = own_total(&tx.change_outputs, own);

    let (kind, net) = if tx.senders.is_empty() && received > 0 {
        (TxKind::Mining, i128::from(received))
    } else if sent > 0 && received > 0 {
        (TxKind::SelfTransfer, i128::from(received) - i128::from(sent))
    } else if sent > 0 {
        (TxKind::Expense, -(i128::from(sent) - i128::from(change)))
    } else if received > 0 {
        (TxKind::Income, i128::from(received))
    } else {
        tracing::warn!(txid = %tx.txid, "transaction does not involve wallet address");
        (TxKind::SelfTransfer, 0)
    };

    let net_amount = clamp_i64(net);
    ClassifiedTransaction {
        kind,
        amount: net_amount.unsigned_abs(),
        net_amount,
        txid: tx.txid.clone(),
        timestamp: tx.timestamp,
        confirmations: tx.confirmations,
    }
}

/// Classify a page of records, preserving order.
pub fn classify_all(txs: &[TxRecord], own: &str) -> Vec<ClassifiedTransaction> {
    txs.iter().map(|tx| classify(tx, own)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWN: &str = "scash1qcr8te4kr609gcawutmrza0j4xv80jy8zls9d4y";
    const OTHER: &str = "scash1qother";

    fn party(address: &str, amount: u64) -> TxParty {
        TxParty {
            address: address.into(),
            amount,
        }
    }

    fn record(senders: Vec<TxParty>, receivers: Vec<TxParty>, change: Vec<TxParty>) -> TxRecord {
        TxRecord {
            txid: "ab".repeat(32),
            block_height: 10,
            senders,
            receivers,
            change_outputs: change,
            timestamp: 1_700_000_000,
            confirmations: 4,
        }
    }

    #[test]
    fn coinbase_is_mining() {
        let c = classify(&record(vec![], vec![party(OWN, 5_000)], vec![]), OWN);
        assert_eq!(c.kind, TxKind::Mining);
        assert_eq!(c.net_amount, 5_000);
        assert_eq!(c.amount, 5_000);
        assert_eq!(c.confirmations, 4);
    }

    #[test]
    fn sent_and_received_is_self() {
        let tx = record(
            vec![party(OWN, 10_000)],
            vec![party(OWN, 6_000), party(OTHER, 3_000)],
            vec![party(OWN, 6_000)],
        );
        let c = classify(&tx, OWN);
        assert_eq!(c.kind, TxKind::SelfTransfer);
        assert_eq!(c.net_amount, -4_000);
        assert_eq!(c.amount, 4_000);
        assert!(!c.is_positive());
    }

    #[test]
    fn sent_only_is_expense_net_of_change() {
        let tx = record(
            vec![party(OWN, 10_000)],
            vec![party(OTHER, 7_000)],
            vec![party(OWN, 2_500)],
        );
        let c = classify(&tx, OWN);
        assert_eq!(c.kind, TxKind::Expense);
        assert_eq!(c.net_amount, -7_500);
        assert_eq!(c.amount, 7_500);
    }

    #[test]
    fn received_only_is_income() {
        let tx = record(vec![party(OTHER, 9_000)], vec![party(OWN, 8_000)], vec![]);
        let c = classify(&tx, OWN);
        assert_eq!(c.kind, TxKind::Income);
        assert_eq!(c.net_amount, 8_000);
        assert!(c.is_positive());
    }

    #[test]
    fn unrelated_record_is_degenerate_self() {
        let tx = record(vec![party(OTHER, 1)], vec![party(OTHER, 1)], vec![]);
        let c = classify(&tx, OWN);
        assert_eq!(c.kind, TxKind::SelfTransfer);
        assert_eq!(c.net_amount, 0);
        assert_eq!(c.amount, 0);
    }

    #[test]
    fn address_match_is_exact() {
        let upper = OWN.to_uppercase();
        let tx = record(vec![party(OTHER, 1)], vec![party(&upper, 8_000)], vec![]);
        assert_eq!(classify(&tx, OWN).net_amount, 0);
    }

    #[test]
    fn classify_all_keeps_order() {
        let txs = vec![
            record(vec![], vec![party(OWN, 1)], vec![]),
            record(vec![party(OTHER, 2)], vec![party(OWN, 2)], vec![]),
        ];
        let kinds: Vec<_> = classify_all(&txs, OWN).into_iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![TxKind::Mining, TxKind::Income]);
    }
}
