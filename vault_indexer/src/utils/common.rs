//! Common utility and helper functions that are used across the project

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;

use super::error::*;

/// Lowercase, `0x`-prefixed hex id of an address
pub fn address_id(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Returns `T` from the ABI-encoded return data of `F`.
pub fn decode_abi_response<T, F: SolCall<Return = T>>(data: &[u8]) -> IndexerResult<T> {
    F::abi_decode_returns(data, false).map_err(|err| read_err(err.to_string()))
}

/// Converts a block timestamp in seconds to milliseconds
pub fn get_time_in_millis(timestamp_secs: u64) -> u64 {
    timestamp_secs.saturating_mul(1_000)
}

/// Signed big integer view of a `U256`
pub fn u256_to_big_int(value: &U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

/// Narrows a big integer back to a `U256`. `None` if negative or wider than
/// 256 bits.
pub fn big_int_to_u256(value: &BigInt) -> Option<U256> {
    match value.to_bytes_be() {
        (Sign::Minus, _) => None,
        (_, bytes) => U256::try_from_be_slice(&bytes),
    }
}

/// Lossy float view of a signed big integer. Saturates to infinity.
pub fn big_int_to_f64(value: &BigInt) -> f64 {
    value.to_f64().unwrap_or(match value.sign() {
        Sign::Minus => f64::NEG_INFINITY,
        _ => f64::INFINITY,
    })
}

/// Lossy float view of a `U256`
pub fn u256_to_f64(value: &U256) -> f64 {
    big_int_to_f64(&u256_to_big_int(value))
}

/// Returns `true` while `block_number` is below the deployment's cutover.
/// A deployment without a cutover always processes.
pub fn is_event_block_number_lt(
    event_name: &str,
    block_number: u64,
    cutover: Option<u64>,
) -> bool {
    match cutover {
        Some(end_block) if block_number >= end_block => {
            tracing::debug!(
                event = event_name,
                block_number,
                end_block,
                "input is past the deployment cutover"
            );
            false
        }
        _ => true,
    }
}
