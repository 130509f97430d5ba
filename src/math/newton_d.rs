use crate::error::{MathError, Routine, UnsafeValue};
use crate::math::checked::{add, div, mul, sub};
use crate::math::fixed_point::{geometric_mean, sort_array};
use crate::math::math_helpers::{abs_diff, unlikely};
use crate::math::safe_range::{A_MULTIPLIER, SafeRange};
use crate::{E9, E11, E14, E16, E20, E33, PRECISION, U256_2};
use alloy_primitives::U256;

const MAX_ITERATIONS: usize = 255;
const TWO_PRECISION: U256 = U256::from_limbs([2_000_000_000_000_000_000, 0, 0, 0]);

/// `|gamma + 1 - K0| + 1` in 18 decimals.
#[inline(always)]
pub(crate) fn g1k0(gamma: U256, k0: U256) -> U256 {
    let g1 = gamma + PRECISION;
    if g1 > k0 {
        g1 - k0 + U256::ONE
    } else {
        k0 - g1 + U256::ONE
    }
}

/// Solves the cryptoswap invariant `D` for the scaled balances `x_unsorted`.
///
/// `ann` is `A * N^N * A_MULTIPLIER`. Balances must already be expressed in
/// the common 18-decimal base (precision multiplier and price scale
/// applied). The result is bit-identical to the on-chain `newton_D`.
///
/// # Errors
/// * `UnsafeValues` when `gamma`, the largest balance, a balance ratio or the
///   converged `x[i] / D` falls outside the contract's safe range.
/// * `ConvergenceFailure(NewtonD)` after 255 iterations.
/// * `Overflow` / `Underflow` / `DivisionByZero` where the contract reverts.
pub fn newton_d(
    ann: U256,
    gamma: U256,
    x_unsorted: &[U256],
    range: &SafeRange,
) -> Result<U256, MathError> {
    range.check_balances(x_unsorted)?;
    range.check_gamma(gamma)?;

    let n_coins = U256::from(x_unsorted.len());
    let x = sort_array(x_unsorted);

    if unlikely(x[0] < E9 || x[0] > E33) {
        return Err(MathError::UnsafeValues(UnsafeValue::LargestBalance));
    }
    for (index, &x_i) in x.iter().enumerate().skip(1) {
        if unlikely(div(mul(x_i, PRECISION)?, x[0])? < E11) {
            return Err(MathError::UnsafeValues(UnsafeValue::BalanceRatio { index }));
        }
    }

    let mut d = mul(n_coins, geometric_mean(&x, false)?)?;
    let s = x.iter().try_fold(U256::ZERO, |acc, &x_i| add(acc, x_i))?;

    for iteration in 0..MAX_ITERATIONS {
        let d_prev = d;

        let mut k0 = PRECISION;
        for &x_i in &x {
            k0 = div(mul(mul(k0, x_i)?, n_coins)?, d)?;
        }
        let g1k0 = g1k0(gamma, k0);

        // mul1 = 1e18 * D / gamma * g1k0 / gamma * g1k0 * A_MULTIPLIER / ANN
        let mut mul1 = div(mul(PRECISION, d)?, gamma)?;
        mul1 = div(mul(mul1, g1k0)?, gamma)?;
        mul1 = div(mul(mul(mul1, g1k0)?, A_MULTIPLIER)?, ann)?;

        // mul2 = 2 * 1e18 * N * K0 / g1k0
        let mul2 = div(mul(mul(TWO_PRECISION, n_coins)?, k0)?, g1k0)?;

        let neg_fprime = sub(
            add(
                add(s, div(mul(s, mul2)?, PRECISION)?)?,
                div(mul(mul1, n_coins)?, k0)?,
            )?,
            div(mul(mul2, d)?, PRECISION)?,
        )?;

        let d_plus = div(mul(d, add(neg_fprime, s)?)?, neg_fprime)?;
        let mut d_minus = div(mul(d, d)?, neg_fprime)?;
        let correction = div(mul(d, div(mul1, neg_fprime)?)?, PRECISION)?;
        if PRECISION > k0 {
            d_minus = add(d_minus, div(mul(correction, PRECISION - k0)?, k0)?)?;
        } else {
            d_minus = sub(d_minus, div(mul(correction, k0 - PRECISION)?, k0)?)?;
        }

        d = if d_plus > d_minus {
            d_plus - d_minus
        } else {
            (d_minus - d_plus) / U256_2
        };

        let diff = abs_diff(d, d_prev);
        if mul(diff, E14)? < d.max(E16) {
            for (index, &x_i) in x.iter().enumerate() {
                let frac = div(mul(x_i, PRECISION)?, d)?;
                if unlikely(frac < E16 || frac > E20) {
                    return Err(MathError::UnsafeValues(UnsafeValue::BalanceToInvariant {
                        index,
                    }));
                }
            }
            tracing::trace!(iteration, %d, "newton_d converged");
            return Ok(d);
        }
    }

    Err(MathError::ConvergenceFailure(Routine::NewtonD))
}
