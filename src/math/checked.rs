//! Reverting `U256` arithmetic.
//!
//! The mirrored contract computes in 256-bit words and reverts on any
//! overflow, underflow or division by zero. `alloy_primitives` operators
//! wrap instead, so every solver step goes through these helpers to keep
//! the failure behaviour identical.

use crate::error::MathError;
use alloy_primitives::U256;

#[inline(always)]
pub fn add(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

#[inline(always)]
pub fn sub(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_sub(b).ok_or(MathError::Underflow)
}

#[inline(always)]
pub fn mul(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_mul(b).ok_or(MathError::Overflow)
}

/// Floor division.
#[inline(always)]
pub fn div(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_div(b).ok_or(MathError::DivisionByZero)
}

/// `a * b / c`, each step reverting like the contract's `a * b / c`.
///
/// Unlike [`mul_div`](crate::math::math_helpers::mul_div) the product is
/// bounded by 256 bits, which is what the on-chain expression does.
#[inline(always)]
pub fn mul_then_div(a: U256, b: U256, c: U256) -> Result<U256, MathError> {
    div(mul(a, b)?, c)
}
