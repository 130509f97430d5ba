//! 18-decimal fixed-point kernels shared by the solvers and the repeg engine.
//!
//! All values are scaled by [`PRECISION`] (`1e18`). Iteration budgets and
//! tolerances are those of the mirrored contract, so results are bit-exact.

use crate::error::{MathError, Routine};
use crate::math::checked::{add, div, mul, sub};
use crate::math::math_helpers::{abs_diff, unlikely};
use crate::{PRECISION, U256_2};
use alloy_primitives::U256;

const MAX_ITERATIONS: usize = 255;
const HALF: U256 = U256::from_limbs([500_000_000_000_000_000, 0, 0, 0]);
const HALFPOW_MAX_EXPONENT: u64 = 59;

/// Insertion sort from high to low.
///
/// The largest value ends up at index 0. The solvers rely on this exact
/// ordering: it fixes the order in which balances are folded into the
/// iteration and therefore the rounding path.
pub fn sort_array(x: &[U256]) -> Vec<U256> {
    let mut sorted = x.to_vec();
    for i in 1..sorted.len() {
        let value = sorted[i];
        let mut cur = i;
        while cur > 0 && sorted[cur - 1] <= value {
            sorted[cur] = sorted[cur - 1];
            cur -= 1;
        }
        sorted[cur] = value;
    }
    sorted
}

/// Fixed-point geometric mean of `unsorted_x`.
///
/// Iterates `D = D * ((N - 1) + prod(x_i / D)) / N` from `D = x[0]` until
/// two iterates differ by at most 1 or by less than `D / 1e18`.
/// An empty input is a `BalanceCount` error.
pub fn geometric_mean(unsorted_x: &[U256], sort: bool) -> Result<U256, MathError> {
    if unlikely(unsorted_x.is_empty()) {
        return Err(MathError::BalanceCount {
            expected: 1,
            actual: 0,
        });
    }
    let x = if sort {
        sort_array(unsorted_x)
    } else {
        unsorted_x.to_vec()
    };
    let n_coins = U256::from(x.len());
    let n_minus_one = U256::from(x.len() - 1);

    let mut d = x[0];
    for iteration in 0..MAX_ITERATIONS {
        let d_prev = d;
        let mut tmp = PRECISION;
        for &x_i in &x {
            tmp = div(mul(tmp, x_i)?, d)?;
        }
        d = div(
            mul(d, add(mul(n_minus_one, PRECISION)?, tmp)?)?,
            mul(n_coins, PRECISION)?,
        )?;
        let diff = abs_diff(d, d_prev);
        if diff <= U256::ONE || mul(diff, PRECISION)? < d {
            tracing::trace!(iteration, %d, "geometric mean converged");
            return Ok(d);
        }
    }
    Err(MathError::ConvergenceFailure(Routine::GeometricMean))
}

/// Square root of an 18-decimal value: returns `sqrt(x * 1e18)`.
pub fn sqrt_int(x: U256) -> Result<U256, MathError> {
    if x.is_zero() {
        return Ok(U256::ZERO);
    }
    let mut z = div(add(x, PRECISION)?, U256_2)?;
    let mut y = x;
    for _ in 0..256 {
        if z == y {
            return Ok(y);
        }
        y = z;
        z = div(add(div(mul(x, PRECISION)?, z)?, z)?, U256_2)?;
    }
    Err(MathError::ConvergenceFailure(Routine::Sqrt))
}

/// `0.5 ^ (power / 1e18)` in 18-decimal fixed point.
///
/// The fractional part is expanded as a binomial series that stops once a
/// term drops below `precision`. Exponents with an integer part above 59
/// underflow to zero.
pub fn halfpow(power: U256, precision: U256) -> Result<U256, MathError> {
    let intpow = power / PRECISION;
    let otherpow = power - intpow * PRECISION;
    if intpow > U256::from(HALFPOW_MAX_EXPONENT) {
        return Ok(U256::ZERO);
    }
    let result = PRECISION >> intpow.to::<usize>();
    if otherpow.is_zero() {
        return Ok(result);
    }

    let mut term = PRECISION;
    let mut sum = PRECISION;
    let mut neg = false;
    for i in 1..256u64 {
        let k = mul(U256::from(i), PRECISION)?;
        let mut c = sub(k, PRECISION)?;
        if otherpow > c {
            c = otherpow - c;
            neg = !neg;
        } else {
            c -= otherpow;
        }
        term = div(mul(term, div(mul(c, HALF)?, PRECISION)?)?, k)?;
        sum = if neg { sub(sum, term)? } else { add(sum, term)? };
        if term < precision {
            return div(mul(result, sum)?, PRECISION);
        }
    }
    Err(MathError::ConvergenceFailure(Routine::HalfPow))
}
