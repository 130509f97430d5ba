use crate::error::{Error, MathError, StateError};
use crate::math::checked::{add, div, mul, sub};
use crate::math::fixed_point::{geometric_mean, halfpow, sqrt_int};
use crate::math::math_helpers::{abs_diff, unlikely};
use crate::math::newton_d::newton_d;
use crate::math::newton_y::newton_y;
use crate::math::packed::{pack, unpack};
use crate::pool::clock::Clock;
use crate::pool::crypto_pool::{CryptoPool, PoolState};
use crate::{E6, E10, PRECISION, U256_2};
use alloy_primitives::U256;

/// Balanced balances implied by invariant `d` at `price_scale`:
/// `xp[0] = D / N`, `xp[k + 1] = D * 1e18 / (N * price_scale[k])`.
fn balanced_xp(d: U256, price_scale: &[U256]) -> Result<Vec<U256>, MathError> {
    let n_coins = U256::from(price_scale.len() + 1);
    let mut xp = Vec::with_capacity(price_scale.len() + 1);
    xp.push(div(d, n_coins)?);
    for &p in price_scale {
        xp.push(div(mul(d, PRECISION)?, mul(n_coins, p)?)?);
    }
    Ok(xp)
}

/// `1e18 * geometric_mean(xp) / lp_supply`.
fn virtual_price(xp: &[U256], lp_supply: U256) -> Result<U256, MathError> {
    div(mul(PRECISION, geometric_mean(xp, true)?)?, lp_supply)
}

impl<C: Clock> CryptoPool<C> {
    /// Post-trade bookkeeping: oracle EMA, last prices, profit and the
    /// conditional move of the price scale.
    ///
    /// Runs against `state`, a working copy the caller commits only when
    /// this returns `Ok`. `xp` are the post-trade scaled balances, `p_i` the
    /// observed price of coin `i` (zero when none was observed) and `new_d`
    /// an already known invariant (zero to recompute it).
    pub(crate) fn tweak_price(
        &self,
        state: &mut PoolState,
        (a, gamma): (U256, U256),
        xp: &[U256],
        i: usize,
        p_i: U256,
        new_d: U256,
    ) -> Result<(), Error> {
        let n_lanes = xp.len() - 1;
        let range = self.range();
        let repeg = &self.params().repeg;
        let lp_supply = self.params().lp_supply;

        let mut price_oracle = unpack(state.price_oracle_packed, n_lanes);
        let mut last_prices = unpack(state.last_prices_packed, n_lanes);
        let price_scale = unpack(state.price_scale_packed, n_lanes);

        let now = self.clock().now();
        if state.last_prices_timestamp < now {
            let elapsed = U256::from(now - state.last_prices_timestamp);
            let alpha = halfpow(div(mul(elapsed, PRECISION)?, repeg.ma_half_time)?, E10)?;
            for (oracle, &last) in price_oracle.iter_mut().zip(&last_prices) {
                *oracle = div(
                    add(mul(last, sub(PRECISION, alpha)?)?, mul(*oracle, alpha)?)?,
                    PRECISION,
                )?;
            }
            state.price_oracle_packed = pack(&price_oracle)?;
            state.last_prices_timestamp = now;
            tracing::debug!(%alpha, ?price_oracle, "price oracle updated");
        }

        let d_unadjusted = if new_d.is_zero() {
            newton_d(a, gamma, xp, range)?
        } else {
            new_d
        };

        if !p_i.is_zero() {
            if i > 0 {
                last_prices[i - 1] = p_i;
            } else {
                // coin 0 moved against every other coin
                for last in last_prices.iter_mut() {
                    *last = div(mul(*last, PRECISION)?, p_i)?;
                }
            }
        } else {
            // no trade price: sample the curve with a 1e-6 nudge of coin 0
            let mut nudged = xp.to_vec();
            let dx_price = nudged[0] / E6;
            nudged[0] = add(nudged[0], dx_price)?;
            for k in 0..n_lanes {
                let y = newton_y(a, gamma, &nudged, d_unadjusted, k + 1, range)?;
                last_prices[k] = div(mul(price_scale[k], dx_price)?, sub(xp[k + 1], y)?)?;
            }
        }
        state.last_prices_packed = pack(&last_prices)?;

        let old_xcp_profit = state.xcp_profit;
        let old_virtual_price = state.virtual_price;

        let mut xcp_profit = PRECISION;
        let mut vp = PRECISION;
        if !old_virtual_price.is_zero() {
            vp = virtual_price(&balanced_xp(d_unadjusted, &price_scale)?, lp_supply)?;
            xcp_profit = div(mul(old_xcp_profit, vp)?, old_virtual_price)?;

            if unlikely(vp < old_virtual_price && state.future_a_gamma_time == 0) {
                tracing::warn!(
                    virtual_price = %vp,
                    old_virtual_price = %old_virtual_price,
                    "virtual price would decrease"
                );
                return Err(StateError::Loss {
                    virtual_price: vp,
                    old_virtual_price,
                }
                .into());
            }
            if state.future_a_gamma_time == 1 {
                state.future_a_gamma_time = 0;
            }
        }
        state.xcp_profit = xcp_profit;

        // 2 * vp - 1 > xcp_profit + 2 * allowed_extra_profit
        let mut needs_adjustment = state.not_adjusted;
        if mul(vp, U256_2)? > add(add(xcp_profit, mul(U256_2, repeg.allowed_extra_profit)?)?, PRECISION)? {
            needs_adjustment = true;
            state.not_adjusted = true;
        }

        if needs_adjustment {
            let step = repeg.adjustment_step;
            let mut norm = U256::ZERO;
            for (&oracle, &scale) in price_oracle.iter().zip(&price_scale) {
                let ratio = abs_diff(div(mul(oracle, PRECISION)?, scale)?, PRECISION);
                norm = add(norm, mul(ratio, ratio)?)?;
            }

            if norm > mul(step, step)? && !old_virtual_price.is_zero() {
                let norm = sqrt_int(norm / PRECISION)?;
                let mut p_new = Vec::with_capacity(n_lanes);
                for (&scale, &oracle) in price_scale.iter().zip(&price_oracle) {
                    p_new.push(div(
                        add(mul(scale, sub(norm, step)?)?, mul(step, oracle)?)?,
                        norm,
                    )?);
                }

                let mut xp_adjusted = xp.to_vec();
                for k in 0..n_lanes {
                    xp_adjusted[k + 1] = div(mul(xp[k + 1], p_new[k])?, price_scale[k])?;
                }
                let d = newton_d(a, gamma, &xp_adjusted, range)?;
                let new_vp = virtual_price(&balanced_xp(d, &p_new)?, lp_supply)?;

                if new_vp > PRECISION && mul(U256_2, new_vp)? - PRECISION > xcp_profit {
                    state.price_scale_packed = pack(&p_new)?;
                    state.d = d;
                    state.virtual_price = new_vp;
                    tracing::debug!(price_scale = ?p_new, %d, virtual_price = %new_vp, "price scale adjusted");
                    return Ok(());
                }
                state.not_adjusted = false;
                tracing::warn!(
                    virtual_price = %new_vp,
                    %xcp_profit,
                    "price scale adjustment skipped"
                );
            }
        }

        state.d = d_unadjusted;
        state.virtual_price = vp;
        Ok(())
    }

    /// Runs the post-liquidity-event repeg with no trade price.
    ///
    /// Recomputes `D` from the current balances, updates the oracle and
    /// derives last prices from the curve itself. All-or-nothing like
    /// [`exchange`](Self::exchange).
    pub fn reprice(&mut self) -> Result<(), Error> {
        let a_gamma = self.a_gamma()?;
        let price_scale = unpack(self.state().price_scale_packed, self.n_coins() - 1);
        let xp = self.scale_balances(&self.state().reserves, &price_scale)?;

        let mut state = self.state().clone();
        self.tweak_price(&mut state, a_gamma, &xp, 0, U256::ZERO, U256::ZERO)?;
        self.commit(state);
        Ok(())
    }
}
