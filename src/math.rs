//! Fixed-point arithmetic for the two Nacre scales.
//!
//! - motes: U512, 9 decimals (chain-native CSPR)
//! - wad:   U256, 18 decimals (sCSPR and the exchange rate)
//!
//! All divisions truncate (floor). The truncation bias always favors the
//! protocol: a staker can never mint more sCSPR, and a withdrawer can never
//! receive more motes, than the exact ratio allows.

use odra::casper_types::{U256, U512};

/// 1 CSPR = 1e9 motes
pub const MOTES_PER_CSPR: u64 = 1_000_000_000;
/// Conversion factor from motes (9 dec) to wad (18 dec) = 1e9
pub const MOTES_TO_WAD_FACTOR: u128 = 1_000_000_000;
/// 1 wad = 1e18; also the fixed-point unit of the exchange rate (rate 1.0)
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Convert motes (U512, 9 decimals) to wad (U256, 18 decimals).
/// 1 CSPR (1e9 motes) = 1e18 wad
pub fn motes_to_wad(motes: U512) -> U256 {
    let motes_u128 = motes.as_u128();
    U256::from(motes_u128) * U256::from(MOTES_TO_WAD_FACTOR)
}

/// Convert wad (U256, 18 decimals) to motes (U512, 9 decimals).
/// Rounds down (conservative for the protocol).
pub fn wad_to_motes(wad: U256) -> U512 {
    let motes_u256 = wad / U256::from(MOTES_TO_WAD_FACTOR);
    U512::from(motes_u256.as_u128())
}

/// Fixed-point multiply: `a * b / 1e18`, truncating.
/// Returns `None` on overflow of the intermediate product.
pub fn wad_mul(a: U256, b: U256) -> Option<U256> {
    a.checked_mul(b).map(|p| p / U256::from(WAD))
}

/// Fixed-point divide: `a * 1e18 / b`, truncating.
/// Returns `None` if `b` is zero or the intermediate product overflows.
pub fn wad_div(a: U256, b: U256) -> Option<U256> {
    if b.is_zero() {
        return None;
    }
    a.checked_mul(U256::from(WAD)).map(|p| p / b)
}

/// Current exchange rate as 18-decimal fixed point.
///
/// Zero receipt supply means nothing has been staked (or everything has been
/// redeemed), so the rate is the starting rate 1.0 regardless of pool value.
/// Otherwise `pool_value_wad / supply_wad`, floor-divided - recomputed from
/// scratch on every call, never cached.
pub fn exchange_rate(pool_value_wad: U256, supply_wad: U256) -> Option<U256> {
    if supply_wad.is_zero() {
        return Some(U256::from(WAD));
    }
    wad_div(pool_value_wad, supply_wad)
}
