//! Protocol constants. All monetary values in satoshis (1 SCASH = 10^8 sat).

use crate::error::AmountError;

pub const COIN: u64 = 100_000_000;

/// BIP-32 path of the single receive key (BIP-84 account 0, first address).
pub const DERIVATION_PATH: &str = "m/84'/0'/0'/0/0";

/// Number of words in wallet mnemonics.
pub const MNEMONIC_WORD_COUNT: usize = 12;

/// Token ticker used in display strings.
pub const TICKER: &str = "SCASH";

/// Fixed transaction overhead in vbytes (version, locktime, counts, segwit marker).
pub const TX_OVERHEAD_VBYTES: u64 = 10;

/// Virtual size of one signed P2WPKH input.
pub const P2WPKH_INPUT_VBYTES: u64 = 68;

/// Virtual size of one P2WPKH output.
pub const P2WPKH_OUTPUT_VBYTES: u64 = 31;

/// Convert a whole-coin decimal to satoshis, rounding to the nearest satoshi.
///
/// Rejects negative, NaN, infinite, and out-of-range values.
pub fn coin_to_sat(coins: f64) -> Result<u64, AmountError> {
    if !coins.is_finite() {
        return Err(AmountError::NotFinite);
    }
    if coins < 0.0 {
        return Err(AmountError::Negative);
    }
    let sats = (coins * COIN as f64).round();
    if sats > u64::MAX as f64 {
        return Err(AmountError::Overflow);
    }
    Ok(sats as u64)
}

/// Satoshis as a whole-coin value (display helper, not for accounting).
pub fn sat_to_coin(sats: u64) -> f64 {
    sats as f64 / COIN as f64
}

/// Parse a decimal coin string ("1.5", "0.00000001") exactly into satoshis.
pub fn parse_coin_str(s: &str) -> Result<u64, AmountError> {
    let s = s.trim();
    if s.starts_with('-') {
        return Err(AmountError::Negative);
    }
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if (whole.is_empty() && frac.is_empty())
        || frac.len() > 8
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
    {
        return Err(AmountError::Malformed(s.to_string()));
    }
    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| AmountError::Malformed(s.to_string()))?
    };
    let frac_sats: u64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<8}");
        padded
            .parse()
            .map_err(|_| AmountError::Malformed(s.to_string()))?
    };
    whole
        .checked_mul(COIN)
        .and_then(|w| w.checked_add(frac_sats))
        .ok_or(AmountError::Overflow)
}

/// Format satoshis as a fixed 8-decimal coin string.
pub fn format_coin(sats: u64) -> String {
    format!("{}.{:08}", sats / COIN, sats % COIN)
}

/// Serde adapter for amounts carried as whole-coin JSON numbers.
///
/// Node RPC and explorer payloads express amounts as decimals (`0.5`);
/// internally the field is satoshis.
pub mod as_coin {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(sats: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(super::sat_to_coin(*sats))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let coins = f64::deserialize(d)?;
        super::coin_to_sat(coins).map_err(serde::de::Error::custom)
    }
}
