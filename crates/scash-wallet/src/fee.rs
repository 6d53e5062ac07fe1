//! Network fee estimation and the platform fee schedule.
//!
//! Sizes use fixed single-key segwit constants:
//! `vsize = 10 + 68 * inputs + 31 * outputs`. The fee is always rounded up;
//! underpaying risks relay rejection.

use std::fmt;

use serde::{Deserialize, Serialize};

use scash_core::constants::{
    COIN, P2WPKH_INPUT_VBYTES, P2WPKH_OUTPUT_VBYTES, TX_OVERHEAD_VBYTES, coin_to_sat, format_coin,
    sat_to_coin,
};

use crate::error::WalletError;

/// Flat platform fee charged by the engrave flow: 0.05 coin.
pub const ENGRAVE_PLATFORM_FEE: u64 = 5_000_000;

/// Platform fee brackets as `(lower bound inclusive, fee)` in satoshis,
/// ascending. Each bracket ends where the next begins; the last is open.
const PLATFORM_FEE_BRACKETS: [(u64, u64); 9] = [
    (0, 10_000),
    (COIN, 1_000_000),
    (10 * COIN, 5_000_000),
    (50 * COIN, 10_000_000),
    (100 * COIN, 20_000_000),
    (500 * COIN, 40_000_000),
    (1_000 * COIN, 80_000_000),
    (5_000 * COIN, 100_000_000),
    (10_000 * COIN, 130_000_000),
];

/// Millisatoshis per satoshi; fee rates keep this much sub-satoshi precision.
const MSAT_PER_SAT: u64 = 1000;

/// A fee rate quote, stored as millisatoshis per 1000 vbytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeeRate(u64);

impl FeeRate {
    /// Convert a node quote in whole coins per kilobyte.
    ///
    /// Precision below one millisatoshi per kilobyte is rounded up, so the
    /// stored rate never undercuts the quote. Zero, negative and non-finite
    /// rates are rejected.
    pub fn from_coin_per_kb(rate: f64) -> Result<Self, WalletError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(WalletError::InvalidFeeRate(format!("{rate} coin/kB")));
        }
        let scaled = rate * (COIN * MSAT_PER_SAT) as f64;
        if scaled >= u64::MAX as f64 {
            return Err(WalletError::InvalidFeeRate(format!("{rate} coin/kB is out of range")));
        }
        // Absorb binary noise such as 0.1 * 1e11 landing a hair above the integer.
        let nearest = scaled.round();
        let msat = if (scaled - nearest).abs() <= nearest * 1e-12 {
            nearest
        } else {
            scaled.ceil()
        };
        Self::from_msat_per_kb(msat as u64)
    }

    pub fn from_sat_per_kb(sat_per_kb: u64) -> Result<Self, WalletError> {
        let msat = sat_per_kb
            .checked_mul(MSAT_PER_SAT)
            .ok_or_else(|| WalletError::InvalidFeeRate(format!("{sat_per_kb} sat/kB is out of range")))?;
        Self::from_msat_per_kb(msat)
    }

    pub fn from_msat_per_kb(msat_per_kb: u64) -> Result<Self, WalletError> {
        if msat_per_kb == 0 {
            return Err(WalletError::InvalidFeeRate("rate is zero".into()));
        }
        Ok(Self(msat_per_kb))
    }

    pub fn msat_per_kb(&self) -> u64 {
        self.0
    }

    /// Whole satoshis per kilobyte, rounded up.
    pub fn sat_per_kb(&self) -> u64 {
        self.0.div_ceil(MSAT_PER_SAT)
    }

    /// Whole coins per kilobyte (display helper).
    pub fn coin_per_kb(&self) -> f64 {
        self.0 as f64 / (COIN * MSAT_PER_SAT) as f64
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} /kB", format_coin(self.sat_per_kb()))
    }
}

/// Estimated size and fee of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
    /// Virtual size in vbytes.
    pub vsize: u64,
    /// Fee in satoshis.
    pub fee_sat: u64,
}

impl FeeEstimate {
    /// Fee in whole coins (display helper).
    pub fn fee_coin(&self) -> f64 {
        sat_to_coin(self.fee_sat)
    }
}

/// Estimated virtual size of a P2WPKH transaction.
pub fn estimate_vsize(inputs: usize, outputs: usize) -> u64 {
    TX_OVERHEAD_VBYTES
        + P2WPKH_INPUT_VBYTES * inputs as u64
        + P2WPKH_OUTPUT_VBYTES * outputs as u64
}

/// Fee for a transaction with `inputs` and `outputs` at `rate`.
///
/// `fee = ceil(vsize * rate / 1000)`, computed over the millisatoshi rate.
pub fn estimate_fee(inputs: usize, outputs: usize, rate: FeeRate) -> FeeEstimate {
    let vsize = estimate_vsize(inputs, outputs);
    let numerator = u128::from(vsize) * u128::from(rate.msat_per_kb());
    let fee = numerator.div_ceil(u128::from(1000 * MSAT_PER_SAT));
    let fee_sat = u64::try_from(fee).unwrap_or(u64::MAX);
    tracing::debug!(inputs, outputs, vsize, fee_sat, rate = %rate, "estimated fee");
    FeeEstimate { vsize, fee_sat }
}

/// Platform fee for a spend of `amount` satoshis.
pub fn platform_fee(amount: u64) -> u64 {
    PLATFORM_FEE_BRACKETS
        .iter()
        .rev()
        .find(|(lower, _)| amount >= *lower)
        .map(|(_, fee)| *fee)
        .unwrap_or(0)
}

/// Platform fee for a whole-coin amount, rejecting negative or non-finite
/// input.
pub fn platform_fee_for_coins(amount: f64) -> Result<u64, WalletError> {
    let sats = coin_to_sat(amount).map_err(|e| WalletError::InvalidAmount(e.to_string()))?;
    Ok(platform_fee(sats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(coin_per_kb: f64) -> FeeRate {
        FeeRate::from_coin_per_kb(coin_per_kb).unwrap()
    }

    #[test]
    fn one_in_two_out_at_one_coin_per_kb() {
        let est = estimate_fee(1, 2, rate(1.0));
        assert_eq!(est.vsize, 140);
        assert_eq!(est.fee_sat, 14_000_000);
        assert!((est.fee_coin() - 0.14).abs() < 1e-12);
    }

    #[test]
    fn fee_rounds_up() {
        // 140 vB at 1 sat/kB is 0.14 sat, paid as 1 sat.
        let est = estimate_fee(1, 2, FeeRate::from_sat_per_kb(1).unwrap());
        assert_eq!(est.fee_sat, 1);
        // 109 vB at 0.00001 coin/kB = 1000 sat/kB is exactly 109 sat.
        assert_eq!(estimate_fee(1, 1, rate(0.00001)).fee_sat, 109);
        // 1001 sat/kB: 109.109 sat, rounded up.
        assert_eq!(estimate_fee(1, 1, FeeRate::from_sat_per_kb(1001).unwrap()).fee_sat, 110);
    }

    #[test]
    fn vsize_constants() {
        assert_eq!(estimate_vsize(0, 0), 10);
        assert_eq!(estimate_vsize(2, 3), 10 + 136 + 93);
    }

    #[test]
    fn rejects_bad_rates() {
        for bad in [0.0, -0.0001, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1e12] {
            assert!(
                matches!(FeeRate::from_coin_per_kb(bad), Err(WalletError::InvalidFeeRate(_))),
                "accepted {bad}"
            );
        }
        assert!(FeeRate::from_sat_per_kb(0).is_err());
    }

    #[test]
    fn rate_conversion() {
        assert_eq!(rate(0.0001).sat_per_kb(), 10_000);
        assert_eq!(rate(0.0001).to_string(), "0.00010000 /kB");
        assert_eq!(rate(0.1).msat_per_kb(), 10_000_000_000);
        assert_eq!(rate(0.00001234).sat_per_kb(), 1_234);
    }

    #[test]
    fn sub_satoshi_quote_is_not_truncated() {
        // 1000.49 sat/kB: 140 vB costs 140.07 sat, paid as 141.
        let quote = rate(0.0000100049);
        assert_eq!(quote.msat_per_kb(), 1_000_490);
        assert_eq!(quote.sat_per_kb(), 1_001);
        assert_eq!(estimate_fee(1, 2, quote).fee_sat, 141);
    }

    #[test]
    fn tiny_quote_still_charges_a_satoshi() {
        let quote = rate(1e-14);
        assert_eq!(quote.msat_per_kb(), 1);
        assert_eq!(estimate_fee(1, 2, quote).fee_sat, 1);
    }

    #[test]
    fn platform_fee_brackets() {
        assert_eq!(platform_fee_for_coins(0.5).unwrap(), 10_000);
        assert_eq!(platform_fee_for_coins(1.0).unwrap(), 1_000_000);
        assert_eq!(platform_fee_for_coins(10_000.0).unwrap(), 130_000_000);
    }

    #[test]
    fn platform_fee_edges_are_half_open() {
        assert_eq!(platform_fee(0), 10_000);
        assert_eq!(platform_fee(COIN - 1), 10_000);
        assert_eq!(platform_fee(10 * COIN - 1), 1_000_000);
        assert_eq!(platform_fee(10 * COIN), 5_000_000);
        assert_eq!(platform_fee(49 * COIN), 5_000_000);
        assert_eq!(platform_fee(50 * COIN), 10_000_000);
        assert_eq!(platform_fee(499 * COIN), 20_000_000);
        assert_eq!(platform_fee(999 * COIN), 40_000_000);
        assert_eq!(platform_fee(4_999 * COIN), 80_000_000);
        assert_eq!(platform_fee(9_999 * COIN), 100_000_000);
        assert_eq!(platform_fee(u64::MAX), 130_000_000);
    }

    #[test]
    fn platform_fee_rejects_negative() {
        assert!(matches!(platform_fee_for_coins(-1.0), Err(WalletError::InvalidAmount(_))));
        assert!(platform_fee_for_coins(f64::NAN).is_err());
    }

    #[test]
    fn engrave_fee_is_five_hundredths() {
        assert_eq!(format_coin(ENGRAVE_PLATFORM_FEE), "0.05000000");
    }
}
