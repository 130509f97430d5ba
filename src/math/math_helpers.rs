use crate::error::MathError;
use alloy_primitives::U256;

const U256_TWO: U256 = U256::from_limbs([2, 0, 0, 0]);
const U256_THREE: U256 = U256::from_limbs([3, 0, 0, 0]);

#[inline(always)]
#[cold]
fn cold_path() {}

/// Branch hint for error exits on the solver hot paths.
#[inline(always)]
pub(crate) fn unlikely(b: bool) -> bool {
    if b {
        cold_path();
    }
    b
}

/// Computes `a * b / denominator` with a full 512‑bit intermediate
/// product, flooring the result.
///
/// Returns `MathError::DivisionByZero` for a zero denominator and
/// `MathError::Overflow` when the quotient itself does not fit in 256 bits.
#[inline(always)]
pub fn mul_div(a: U256, b: U256, mut denominator: U256) -> Result<U256, MathError> {
    if unlikely(denominator.is_zero()) {
        return Err(MathError::DivisionByZero);
    }

    // [prod1 prod0] = a * b as a 512-bit number
    let mm = a.mul_mod(b, U256::MAX);
    let mut prod0 = a.wrapping_mul(b);

    let (mut prod1, borrow1) = mm.overflowing_sub(prod0);
    if borrow1 {
        prod1 = prod1.wrapping_sub(U256::ONE);
    }

    if prod1.is_zero() {
        return Ok(prod0.wrapping_div(denominator));
    }

    if unlikely(denominator <= prod1) {
        return Err(MathError::Overflow);
    }

    let remainder = a.mul_mod(b, denominator);
    let (prod0_new, borrow2) = prod0.overflowing_sub(remainder);
    prod0 = prod0_new;
    if borrow2 {
        prod1 = prod1.wrapping_sub(U256::ONE);
    }

    let twos = denominator & denominator.wrapping_neg();
    denominator = denominator.wrapping_div(twos);
    prod0 = prod0.wrapping_div(twos);

    let flip = twos
        .wrapping_neg()
        .wrapping_div(twos)
        .wrapping_add(U256::ONE);
    prod0 |= prod1.wrapping_mul(flip);

    // modular inverse of the odd denominator, doubling correct bits each step
    let mut inv = U256_THREE.wrapping_mul(denominator) ^ U256_TWO;
    for _ in 0..6 {
        inv = inv.wrapping_mul(U256_TWO.wrapping_sub(denominator.wrapping_mul(inv)));
    }

    Ok(prod0.wrapping_mul(inv))
}

/// Absolute difference of two unsigned values.
#[inline(always)]
pub fn abs_diff(a: U256, b: U256) -> U256 {
    if a > b { a - b } else { b - a }
}
