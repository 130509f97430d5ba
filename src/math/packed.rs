//! Multi-lane price words.
//!
//! A pool with `N` coins stores `N - 1` prices (coin `k + 1` against coin 0)
//! in one 256-bit word, 128 bits per lane, lane 0 in the low bits.

use crate::error::StateError;
use alloy_primitives::U256;

/// Width of one lane in bits.
pub const PRICE_SIZE: usize = 128;
/// Mask selecting lane 0.
pub const PRICE_MASK: U256 = U256::from_limbs([u64::MAX, u64::MAX, 0, 0]);
/// Lanes that fit in one word.
pub const MAX_LANES: usize = 256 / PRICE_SIZE;

/// Packs `lanes` into one word; `lanes[0]` ends up in the lowest 128 bits.
pub fn pack(lanes: &[U256]) -> Result<U256, StateError> {
    if lanes.len() > MAX_LANES {
        return Err(StateError::CoinCount(lanes.len() + 1));
    }
    let mut packed = U256::ZERO;
    for (lane, &price) in lanes.iter().enumerate().rev() {
        if price > PRICE_MASK {
            return Err(StateError::LaneOverflow { lane });
        }
        packed = (packed << PRICE_SIZE) | price;
    }
    Ok(packed)
}

/// Splits `packed` into its first `n_lanes` lanes.
pub fn unpack(mut packed: U256, n_lanes: usize) -> Vec<U256> {
    debug_assert!(n_lanes <= MAX_LANES);
    let mut lanes = Vec::with_capacity(n_lanes);
    for _ in 0..n_lanes {
        lanes.push(packed & PRICE_MASK);
        packed >>= PRICE_SIZE;
    }
    lanes
}

/// Reads lane `k` of `packed`.
#[inline]
pub fn lane(packed: U256, k: usize) -> U256 {
    debug_assert!(k < MAX_LANES);
    (packed >> (k * PRICE_SIZE)) & PRICE_MASK
}
