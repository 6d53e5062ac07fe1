//! Greedy in-order coin selection.
//!
//! Walks the UTXOs in the caller's order, skipping any that are unusable or
//! already spent by a pending transaction, and stops at the first prefix
//! whose total covers the requirement. Not a minimal-waste selector: the
//! result is deterministic for a fixed ordering and never reorders.

use scash_core::types::Utxo;

use crate::error::WalletError;

/// Result of coin selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinSelection {
    /// Selected UTXOs, in input order.
    pub selected: Vec<Utxo>,
    /// Total value of the selected UTXOs in satoshis.
    pub total: u64,
}

impl CoinSelection {
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Greedy prefix coin selector.
pub struct CoinSelector;

impl CoinSelector {
    /// Select spendable UTXOs until their total reaches `required` satoshis.
    pub fn select(utxos: &[Utxo], required: u64) -> Result<CoinSelection, WalletError> {
        if required == 0 {
            return Err(WalletError::InvalidAmount("required amount must be non-zero".into()));
        }

        let mut selected = Vec::new();
        let mut total: u64 = 0;

        for utxo in utxos.iter().filter(|u| u.is_spendable()) {
            selected.push(utxo.clone());
            total = total.saturating_add(utxo.amount);
            if total >= required {
                tracing::debug!(inputs = selected.len(), total, required, "coins selected");
                return Ok(CoinSelection { selected, total });
            }
        }

        Err(WalletError::InsufficientFunds {
            have: total,
            need: required,
        })
    }

    /// Total spendable value in `utxos`.
    pub fn spendable_balance(utxos: &[Utxo]) -> u64 {
        utxos
            .iter()
            .filter(|u| u.is_spendable())
            .fold(0u64, |acc, u| acc.saturating_add(u.amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;
    use bitcoin::{ScriptBuf, Txid};
    use scash_core::constants::COIN;

    fn make_utxo(index: u8, amount: u64) -> Utxo {
        Utxo {
            txid: Txid::from_byte_array([index; 32]),
            vout: 0,
            amount,
            script_pubkey: ScriptBuf::new(),
            height: 100,
            usable: true,
            in_mempool: false,
        }
    }

    fn coins(values: &[u64]) -> Vec<Utxo> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| make_utxo(i as u8 + 1, v * COIN))
            .collect()
    }

    #[test]
    fn takes_prefix_not_minimal_set() {
        let utxos = coins(&[2, 3, 5]);
        let result = CoinSelector::select(&utxos, 4 * COIN).unwrap();
        assert_eq!(result.selected, utxos[..2].to_vec());
        assert_eq!(result.total, 5 * COIN);
    }

    #[test]
    fn insufficient_funds() {
        let utxos = coins(&[1, 1]);
        let err = CoinSelector::select(&utxos, 5 * COIN).unwrap_err();
        assert_eq!(
            err,
            WalletError::InsufficientFunds {
                have: 2 * COIN,
                need: 5 * COIN
            }
        );
    }

    #[test]
    fn exact_match_stops() {
        let utxos = coins(&[1, 2, 3]);
        let result = CoinSelector::select(&utxos, 3 * COIN).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.total, 3 * COIN);
    }

    #[test]
    fn skips_mempool_and_unusable() {
        let mut utxos = coins(&[5, 5, 1]);
        utxos[0].in_mempool = true;
        utxos[1].usable = false;
        let result = CoinSelector::select(&utxos, COIN).unwrap();
        assert_eq!(result.selected, vec![utxos[2].clone()]);
    }

    #[test]
    fn all_skipped_is_insufficient() {
        let mut utxos = coins(&[5]);
        utxos[0].in_mempool = true;
        assert_eq!(
            CoinSelector::select(&utxos, COIN).unwrap_err(),
            WalletError::InsufficientFunds { have: 0, need: COIN }
        );
    }

    #[test]
    fn empty_set_is_insufficient_funds() {
        assert_eq!(
            CoinSelector::select(&[], 5 * COIN).unwrap_err(),
            WalletError::InsufficientFunds { have: 0, need: 5 * COIN }
        );
    }

    #[test]
    fn zero_required_rejected() {
        let err = CoinSelector::select(&coins(&[1]), 0).unwrap_err();
        assert!(matches!(err, WalletError::InvalidAmount(_)));
    }

    #[test]
    fn preserves_caller_order() {
        let utxos = coins(&[5, 2, 3]);
        let result = CoinSelector::select(&utxos, 6 * COIN).unwrap();
        let amounts: Vec<u64> = result.selected.iter().map(|u| u.amount / COIN).collect();
        assert_eq!(amounts, vec![5, 2]);
    }

    #[test]
    fn spendable_balance_ignores_flagged() {
        let mut utxos = coins(&[1, 2, 3]);
        utxos[1].in_mempool = true;
        assert_eq!(CoinSelector::spendable_balance(&utxos), 4 * COIN);
    }
}
