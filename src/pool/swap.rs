use crate::E5;
use crate::PRECISION;
use crate::error::{Error, MathError, SwapError};
use crate::math::checked::{add, div, mul, mul_then_div, sub};
use crate::math::math_helpers::unlikely;
use crate::math::newton_d::newton_d;
use crate::math::newton_y::newton_y;
use crate::math::packed::{lane, unpack};
use crate::pool::clock::Clock;
use crate::pool::crypto_pool::CryptoPool;
use alloy_primitives::U256;

impl<C: Clock> CryptoPool<C> {
    /// `(A, gamma)` in force at the clock's current time.
    ///
    /// While a ramp is running both values move linearly from the initial
    /// pair to the future pair.
    pub fn a_gamma(&self) -> Result<(U256, U256), MathError> {
        let ramp = &self.params().ramp;
        let (mut a, mut gamma) = ramp.future();

        let t1 = self.state().future_a_gamma_time;
        let now = self.clock().now();
        if now < t1 {
            let (a0, gamma0) = ramp.initial();
            let t0 = ramp.initial_a_gamma_time;
            let span = U256::from(t1.saturating_sub(t0));
            let elapsed = U256::from(now.saturating_sub(t0));
            let remaining = sub(span, elapsed)?;

            a = div(add(mul(a0, remaining)?, mul(a, elapsed)?)?, span)?;
            gamma = div(add(mul(gamma0, remaining)?, mul(gamma, elapsed)?)?, span)?;
        }
        Ok((a, gamma))
    }

    /// Lifts raw balances to 18 decimals and prices them in coin 0.
    pub(crate) fn scale_balances(
        &self,
        reserves: &[U256],
        price_scale: &[U256],
    ) -> Result<Vec<U256>, MathError> {
        reserves
            .iter()
            .enumerate()
            .map(|(k, &balance)| self.scale_balance(balance, k, price_scale))
            .collect()
    }

    fn scale_balance(&self, balance: U256, k: usize, price_scale: &[U256]) -> Result<U256, MathError> {
        let scaled = mul(balance, self.params().precisions[k])?;
        if k == 0 {
            return Ok(scaled);
        }
        mul_then_div(scaled, price_scale[k - 1], PRECISION)
    }

    /// Inverse of [`scale_balance`](Self::scale_balance), rounding down.
    fn unscale_amount(&self, amount: U256, k: usize, price_scale: &[U256]) -> Result<U256, MathError> {
        let amount = if k > 0 {
            mul_then_div(amount, PRECISION, price_scale[k - 1])?
        } else {
            amount
        };
        div(amount, self.params().precisions[k])
    }

    /// Quotes selling `dx` of coin `i` for coin `j`.
    ///
    /// Returns `(dy, fee)`: the amount received after the fee and the fee
    /// itself, both in coin `j`'s raw units. Leaves the pool untouched.
    pub fn get_dy(&self, i: usize, j: usize, dx: U256) -> Result<(U256, U256), Error> {
        self.check_indices(i, j)?;

        let (a, gamma) = self.a_gamma()?;
        let state = self.state();
        let price_scale = unpack(state.price_scale_packed, self.n_coins() - 1);

        let mut reserves = state.reserves.clone();
        reserves[i] = add(reserves[i], dx)?;
        let mut xp = self.scale_balances(&reserves, &price_scale)?;

        let y = newton_y(a, gamma, &xp, state.d, j, self.range())?;
        let dy = sub(sub(xp[j], y)?, U256::ONE)?;
        xp[j] = y;

        let dy = self.unscale_amount(dy, j, &price_scale)?;
        let fee = self.params().fee.fee_amount(&xp, dy)?;
        Ok((sub(dy, fee)?, fee))
    }

    /// Sells `dx` of coin `i` for coin `j` and returns the amount received.
    ///
    /// Reproduces the contract's `exchange` step for step, including the
    /// oracle and price-scale update that follows the trade. On any error the
    /// pool is left exactly as it was.
    pub fn exchange(&mut self, i: usize, j: usize, dx: U256) -> Result<U256, Error> {
        self.check_indices(i, j)?;
        if unlikely(dx.is_zero()) {
            return Err(SwapError::AmountIsZero.into());
        }

        let (a, gamma) = self.a_gamma()?;
        let now = self.clock().now();
        let price_scale = unpack(self.state().price_scale_packed, self.n_coins() - 1);

        let mut state = self.state().clone();
        let x0 = state.reserves[i];
        let y0 = state.reserves[j];
        state.reserves[i] = add(x0, dx)?;
        let mut xp = self.scale_balances(&state.reserves, &price_scale)?;

        // mid-ramp the stored D belongs to the old A/gamma
        if state.future_a_gamma_time > 0 {
            let x1 = xp[i];
            xp[i] = self.scale_balance(x0, i, &price_scale)?;
            state.d = newton_d(a, gamma, &xp, self.range())?;
            xp[i] = x1;
            if now >= state.future_a_gamma_time {
                state.future_a_gamma_time = 1;
            }
        }

        let y = newton_y(a, gamma, &xp, state.d, j, self.range())?;
        let dy = sub(sub(xp[j], y)?, U256::ONE)?;
        xp[j] = y;

        let dy = self.unscale_amount(dy, j, &price_scale)?;
        let dy = sub(dy, self.params().fee.fee_amount(&xp, dy)?)?;

        let y_new = sub(y0, dy)?;
        state.reserves[j] = y_new;
        xp[j] = self.scale_balance(y_new, j, &price_scale)?;

        // only trades above dust carry a usable price
        let mut ix = j;
        let mut p = U256::ZERO;
        if dx > E5 && dy > E5 {
            let precisions = &self.params().precisions;
            let dx_scaled = mul(dx, precisions[i])?;
            let dy_scaled = mul(dy, precisions[j])?;
            if i != 0 && j != 0 {
                p = mul_then_div(lane(state.last_prices_packed, i - 1), dx_scaled, dy_scaled)?;
            } else if i == 0 {
                p = mul_then_div(dx_scaled, PRECISION, dy_scaled)?;
            } else {
                p = mul_then_div(dy_scaled, PRECISION, dx_scaled)?;
                ix = i;
            }
        }

        self.tweak_price(&mut state, (a, gamma), &xp, ix, p, U256::ZERO)?;

        tracing::debug!(
            pool = %self.address(),
            i,
            j,
            %dx,
            %dy,
            virtual_price = %state.virtual_price,
            "exchange"
        );
        self.commit(state);
        Ok(dy)
    }
}
