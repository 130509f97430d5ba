use crate::error::MathError;
use crate::math::checked::{add, div, mul, sub};
use crate::PRECISION;
use alloy_primitives::U256;

/// Fees are expressed in parts per `1e10`.
pub const FEE_DENOMINATOR: U256 = U256::from_limbs([10_000_000_000, 0, 0, 0]);

/// Imbalance statistic of the scaled balances `x`, in 18 decimals.
///
/// `K = prod(N * x_i / sum(x))` equals `1e18` for a perfectly balanced pool
/// and falls towards zero as it skews. A non-zero `fee_gamma` reshapes it to
/// `fee_gamma / (fee_gamma + 1 - K)`.
pub fn reduction_coefficient(x: &[U256], fee_gamma: U256) -> Result<U256, MathError> {
    let n_coins = U256::from(x.len());
    let s = x.iter().try_fold(U256::ZERO, |acc, &x_i| add(acc, x_i))?;

    let mut k = PRECISION;
    for &x_i in x {
        k = div(mul(mul(k, n_coins)?, x_i)?, s)?;
    }
    if !fee_gamma.is_zero() {
        k = div(
            mul(fee_gamma, PRECISION)?,
            sub(add(fee_gamma, PRECISION)?, k)?,
        )?;
    }
    Ok(k)
}

/// Dynamic fee parameters of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParams {
    /// Fee charged when the pool is balanced, parts per `1e10`.
    pub mid_fee: U256,
    /// Fee charged when the pool is fully imbalanced, parts per `1e10`.
    pub out_fee: U256,
    pub fee_gamma: U256,
}

impl FeeParams {
    /// Fee rate for the post-trade scaled balances `xp`, parts per `1e10`.
    ///
    /// Blends `mid_fee` and `out_fee` by the reduction coefficient, so the
    /// result always lies between the two.
    pub fn fee(&self, xp: &[U256]) -> Result<U256, MathError> {
        let f = reduction_coefficient(xp, self.fee_gamma)?;
        div(
            add(
                mul(self.mid_fee, f)?,
                mul(self.out_fee, sub(PRECISION, f)?)?,
            )?,
            PRECISION,
        )
    }

    /// Fee taken out of `dy`: `fee(xp) * dy / 1e10`.
    pub fn fee_amount(&self, xp: &[U256], dy: U256) -> Result<U256, MathError> {
        div(mul(self.fee(xp)?, dy)?, FEE_DENOMINATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn u(s: &str) -> U256 {
        U256::from_str(s).unwrap()
    }

    fn params() -> FeeParams {
        FeeParams {
            mid_fee: U256::from(3_000_000u64),
            out_fee: U256::from(30_000_000u64),
            fee_gamma: u("500000000000000"),
        }
    }

    // ------------------------- reduction_coefficient tests -------------------------

    #[test]
    fn balanced_pool_has_unit_coefficient() {
        let x = [PRECISION; 3];
        assert_eq!(reduction_coefficient(&x, U256::ZERO).unwrap(), PRECISION);
        // with fee_gamma the reshaped value is still exactly 1.0
        assert_eq!(
            reduction_coefficient(&x, u("500000000000000")).unwrap(),
            PRECISION
        );
    }

    #[test]
    fn skew_lowers_coefficient() {
        // 2 * 1 / 4 * 2 * 3 / 4 = 0.75
        let x = [PRECISION, u("3000000000000000000")];
        assert_eq!(
            reduction_coefficient(&x, U256::ZERO).unwrap(),
            u("750000000000000000")
        );
        // 5e14 * 1e18 / (5e14 + 1e18 - 7.5e17)
        assert_eq!(
            reduction_coefficient(&x, u("500000000000000")).unwrap(),
            u("1996007984031936")
        );
    }

    #[test]
    fn empty_pool_divides_by_zero() {
        let x = [U256::ZERO, U256::ZERO];
        assert_eq!(
            reduction_coefficient(&x, U256::ZERO),
            Err(MathError::DivisionByZero)
        );
    }

    // ------------------------- fee tests -------------------------

    #[test]
    fn balanced_pool_pays_mid_fee() {
        let p = params();
        assert_eq!(p.fee(&[PRECISION; 2]).unwrap(), p.mid_fee);
    }

    #[test]
    fn fee_amount_scales_with_dy() {
        let p = params();
        // 3e6 / 1e10 of 1e12
        assert_eq!(
            p.fee_amount(&[PRECISION; 2], U256::from(1_000_000_000_000u64))
                .unwrap(),
            U256::from(300_000_000u64)
        );
    }

    proptest! {
        #[test]
        fn fee_stays_between_mid_and_out(
            a in 1u128..1_000_000_000_000_000_000_000_000u128,
            b in 1u128..1_000_000_000_000_000_000_000_000u128,
            c in 1u128..1_000_000_000_000_000_000_000_000u128,
            mid in 0u64..100_000_000u64,
            out in 0u64..100_000_000u64,
            fee_gamma in 0u64..1_000_000_000_000_000_000u64,
        ) {
            let p = FeeParams {
                mid_fee: U256::from(mid),
                out_fee: U256::from(out),
                fee_gamma: U256::from(fee_gamma),
            };
            let fee = p.fee(&[U256::from(a), U256::from(b), U256::from(c)]).unwrap();
            prop_assert!(fee >= p.mid_fee.min(p.out_fee));
            prop_assert!(fee <= p.mid_fee.max(p.out_fee));
        }
    }
}
