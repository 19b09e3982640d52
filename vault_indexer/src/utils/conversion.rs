//! Share and asset conversions under a vault's floating share price.
//!
//! ```plain
//! amount = shares * totalAssets / totalSupply
//! shares = amount * totalSupply / totalAssets
//! ```
//!
//! Products are taken exactly as big integers before dividing. A quotient
//! wider than 256 bits saturates to `U256::MAX`. A zero denominator is not an
//! error. Each conversion has a defined result for it, see the individual
//! functions.

use alloy_primitives::U256;

use super::common::{big_int_to_u256, u256_to_big_int};

/// Asset value of `shares` at the live ratio.
///
/// Returns zero when `total_supply` is zero: the price per share of an empty
/// vault is undefined, so freshly minted bootstrap shares are valued at zero.
pub fn shares_to_assets(shares: U256, total_assets: U256, total_supply: U256) -> U256 {
    if total_supply.is_zero() {
        return U256::ZERO;
    }
    mul_div(shares, total_assets, total_supply)
}

/// Shares burnt for withdrawing `amount` at the live ratio.
///
/// Falls back to one share per asset unit when `total_assets` is zero
/// (complete drain of the vault).
pub fn assets_to_shares(amount: U256, total_assets: U256, total_supply: U256) -> U256 {
    if total_assets.is_zero() {
        return amount;
    }
    mul_div(amount, total_supply, total_assets)
}

/// `value * numerator / denominator` with a full-width intermediate product.
/// `denominator` must be non-zero.
fn mul_div(value: U256, numerator: U256, denominator: U256) -> U256 {
    let quotient =
        u256_to_big_int(&value) * u256_to_big_int(&numerator) / u256_to_big_int(&denominator);
    big_int_to_u256(&quotient).unwrap_or(U256::MAX)
}

/// `numerator / denominator`, or zero when the denominator is zero
pub fn guarded_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}
