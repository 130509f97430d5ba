use crate::error::{MathError, Routine, UnsafeValue};
use crate::math::checked::{add, div, mul};
use crate::math::fixed_point::sort_array;
use crate::math::math_helpers::{abs_diff, unlikely};
use crate::math::newton_d::g1k0;
use crate::math::safe_range::{A_MULTIPLIER, SafeRange};
use crate::{E14, E16, E20, PRECISION, U256_2};
use alloy_primitives::U256;

const MAX_ITERATIONS: usize = 255;
const MIN_CONVERGENCE_LIMIT: U256 = U256::from_limbs([100, 0, 0, 0]);
const TWO_PRECISION: U256 = U256::from_limbs([2_000_000_000_000_000_000, 0, 0, 0]);

/// Solves balance `x[i]` so that the pool keeps invariant `d`.
///
/// The current value of `x[i]` is ignored. The remaining balances are
/// sorted largest first and folded into the seed `y = D / N`, after which a
/// guarded Newton iteration runs. A step whose denominator would turn
/// non-positive, or whose numerator would go negative, halves `y` instead.
///
/// # Errors
/// * `UnsafeValues` for `ann`, `gamma` or `d` outside the safe range, or a
///   solved `y / D` outside `[0.01, 100]`.
/// * `DenominatorZero` when one of the other balances is zero, or when
///   `y` or the derivative reach zero mid-iteration.
/// * `ConvergenceFailure(NewtonY)` after 255 iterations.
/// * `BalanceCount` / `IndexOutOfRange` when `x` or `i` do not fit `range`.
pub fn newton_y(
    ann: U256,
    gamma: U256,
    x: &[U256],
    d: U256,
    i: usize,
    range: &SafeRange,
) -> Result<U256, MathError> {
    range.check_balances(x)?;
    if unlikely(i >= x.len()) {
        return Err(MathError::IndexOutOfRange {
            index: i,
            n_coins: x.len(),
        });
    }
    range.check_ann(ann)?;
    range.check_gamma(gamma)?;
    range.check_d(d)?;

    let n = x.len();
    let n_coins = U256::from(n);

    let mut x_sorted = x.to_vec();
    x_sorted[i] = U256::ZERO;
    let x_sorted = sort_array(&x_sorted);

    let convergence_limit = (x_sorted[0] / E14).max(d / E14).max(MIN_CONVERGENCE_LIMIT);

    let mut y = d / n_coins;
    let mut s_i = U256::ZERO;
    for j in 2..=n {
        let x_j = x_sorted[n - j];
        if unlikely(x_j.is_zero()) {
            return Err(MathError::DenominatorZero);
        }
        y = div(mul(y, d)?, mul(x_j, n_coins)?)?;
        s_i = add(s_i, x_j)?;
    }

    let mut k0_i = PRECISION;
    for &x_j in &x_sorted[..n - 1] {
        k0_i = div(mul(mul(k0_i, x_j)?, n_coins)?, d)?;
    }

    for iteration in 0..MAX_ITERATIONS {
        let y_prev = y;

        let k0 = div(mul(mul(k0_i, y)?, n_coins)?, d)?;
        let s = add(s_i, y)?;
        let g1k0 = g1k0(gamma, k0);

        let mut mul1 = div(mul(PRECISION, d)?, gamma)?;
        mul1 = div(mul(mul1, g1k0)?, gamma)?;
        mul1 = div(mul(mul1, mul(g1k0, A_MULTIPLIER)?)?, ann)?;

        let mul2 = add(div(mul(TWO_PRECISION, k0)?, g1k0)?, PRECISION)?;

        let mut yfprime = add(add(mul(PRECISION, y)?, mul(s, mul2)?)?, mul1)?;
        let dyfprime = mul(d, mul2)?;
        if yfprime < dyfprime {
            y = y_prev / U256_2;
            continue;
        }
        yfprime -= dyfprime;

        if unlikely(y.is_zero()) {
            return Err(MathError::DenominatorZero);
        }
        let fprime = yfprime / y;
        if unlikely(fprime.is_zero()) {
            return Err(MathError::DenominatorZero);
        }

        let mut y_minus = mul1 / fprime;
        let y_plus = add(
            div(add(yfprime, mul(PRECISION, d)?)?, fprime)?,
            div(mul(y_minus, PRECISION)?, k0)?,
        )?;
        y_minus = add(y_minus, mul(PRECISION, s)? / fprime)?;

        y = if y_plus < y_minus {
            y_prev / U256_2
        } else {
            y_plus - y_minus
        };

        let diff = abs_diff(y, y_prev);
        if diff < convergence_limit.max(y / E14) {
            let frac = div(mul(y, PRECISION)?, d)?;
            if unlikely(frac < E16 || frac > E20) {
                return Err(MathError::UnsafeValues(UnsafeValue::SolvedBalance));
            }
            tracing::trace!(iteration, i, %y, "newton_y converged");
            return Ok(y);
        }
    }

    Err(MathError::ConvergenceFailure(Routine::NewtonY))
}
