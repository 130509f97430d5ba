use crate::error::{MathError, StateError, UnsafeValue};
use crate::math::math_helpers::unlikely;
use alloy_primitives::U256;

/// `A` is stored multiplied by `N^N` and by this factor.
pub const A_MULTIPLIER: U256 = U256::from_limbs([10_000, 0, 0, 0]);

pub const MIN_GAMMA: U256 = U256::from_limbs([10_000_000_000, 0, 0, 0]);

/// Smallest invariant the y-solver accepts (`1e17`).
pub const MIN_D: U256 = U256::from_limbs([100_000_000_000_000_000, 0, 0, 0]);
/// Largest invariant the y-solver accepts (`1e15 * 1e18`).
pub const MAX_D: U256 = crate::E33;

/// Validated input ranges of the solvers for one pool variant.
///
/// The two-coin and the three-coin contracts ship different constants, so
/// every solver call carries the range of the pool it prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeRange {
    pub n_coins: usize,
    pub min_a: U256,
    pub max_a: U256,
    pub min_gamma: U256,
    pub max_gamma: U256,
}

/// Two-coin pools: `MIN_A = N^N * A_MULTIPLIER / 10`,
/// `MAX_A = N^N * A_MULTIPLIER * 100_000`, `MAX_GAMMA = 2e16`.
pub const TWO_COINS: SafeRange = SafeRange {
    n_coins: 2,
    min_a: U256::from_limbs([4_000, 0, 0, 0]),
    max_a: U256::from_limbs([4_000_000_000, 0, 0, 0]),
    min_gamma: MIN_GAMMA,
    max_gamma: U256::from_limbs([20_000_000_000_000_000, 0, 0, 0]),
};

/// Three-coin pools: `MIN_A = N^N * A_MULTIPLIER / 100`,
/// `MAX_A = N^N * A_MULTIPLIER * 1_000`, `MAX_GAMMA = 5e16`.
pub const THREE_COINS: SafeRange = SafeRange {
    n_coins: 3,
    min_a: U256::from_limbs([2_700, 0, 0, 0]),
    max_a: U256::from_limbs([270_000_000, 0, 0, 0]),
    min_gamma: MIN_GAMMA,
    max_gamma: U256::from_limbs([50_000_000_000_000_000, 0, 0, 0]),
};

impl SafeRange {
    /// Returns the range for a pool with `n_coins` coins.
    pub fn for_coins(n_coins: usize) -> Result<Self, StateError> {
        match n_coins {
            2 => Ok(TWO_COINS),
            3 => Ok(THREE_COINS),
            other => Err(StateError::CoinCount(other)),
        }
    }

    /// Rejects a balance vector that does not hold one entry per coin.
    #[inline]
    pub(crate) fn check_balances(&self, x: &[U256]) -> Result<(), MathError> {
        if unlikely(x.len() != self.n_coins) {
            return Err(MathError::BalanceCount {
                expected: self.n_coins,
                actual: x.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn check_gamma(&self, gamma: U256) -> Result<(), MathError> {
        if unlikely(gamma < self.min_gamma || gamma > self.max_gamma) {
            return Err(MathError::UnsafeValues(UnsafeValue::Gamma));
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn check_ann(&self, ann: U256) -> Result<(), MathError> {
        if unlikely(ann < self.min_a || ann > self.max_a) {
            return Err(MathError::UnsafeValues(UnsafeValue::Amplification));
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn check_d(&self, d: U256) -> Result<(), MathError> {
        if unlikely(d < MIN_D || d > MAX_D) {
            return Err(MathError::UnsafeValues(UnsafeValue::Invariant));
        }
        Ok(())
    }
}
