//! Token-addressed swap interface used by routers.
//!
//! Routers work with token addresses and never see coin indices. Every
//! [`CryptoPool`] implements [`SwapSimulator`], translating addresses to
//! indices and delegating to [`CryptoPool::get_dy`] and
//! [`CryptoPool::exchange`].

use crate::error::{Error, SwapError};
use crate::math::math_helpers::unlikely;
use crate::pool::clock::Clock;
use crate::pool::crypto_pool::CryptoPool;
use alloy_primitives::{Address, U256};

/// Result of a simulated swap, in the output token's raw units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub amount_out: U256,
    pub fee: U256,
}

/// Coin indices a router passes along with an executed swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapMeta {
    pub token_in_index: usize,
    pub token_out_index: usize,
}

pub trait SwapSimulator {
    /// Simulates selling `amount_in` of `token_in` for `token_out`.
    ///
    /// # Errors
    ///
    /// - [`SwapError::UnknownToken`] if either token is not in the pool.
    /// - [`SwapError::AmountIsZero`] / [`SwapError::OutputIsZero`] for empty
    ///   trades.
    /// - Any [`MathError`](crate::error::MathError) from the solvers.
    fn quote(&self, token_in: Address, amount_in: U256, token_out: Address) -> Result<Quote, Error>;

    /// Applies a swap a router decided to take.
    ///
    /// The pool re-runs the trade itself; `amount_out` is what the caller
    /// expected and only serves as a cross-check.
    fn apply_swap(
        &mut self,
        token_in: Address,
        amount_in: U256,
        token_out: Address,
        amount_out: U256,
    ) -> Result<(), Error>;

    fn meta_info(&self, token_in: Address, token_out: Address) -> Result<SwapMeta, Error>;
}

impl<C: Clock> SwapSimulator for CryptoPool<C> {
    fn quote(&self, token_in: Address, amount_in: U256, token_out: Address) -> Result<Quote, Error> {
        let meta = self.meta_info(token_in, token_out)?;
        if unlikely(amount_in.is_zero()) {
            return Err(SwapError::AmountIsZero.into());
        }

        let (amount_out, fee) = self.get_dy(meta.token_in_index, meta.token_out_index, amount_in)?;
        if unlikely(amount_out.is_zero()) {
            return Err(SwapError::OutputIsZero.into());
        }
        Ok(Quote { amount_out, fee })
    }

    fn apply_swap(
        &mut self,
        token_in: Address,
        amount_in: U256,
        token_out: Address,
        amount_out: U256,
    ) -> Result<(), Error> {
        let meta = self.meta_info(token_in, token_out)?;
        let received = self.exchange(meta.token_in_index, meta.token_out_index, amount_in)?;
        if received != amount_out {
            tracing::debug!(
                pool = %self.address(),
                expected = %amount_out,
                %received,
                "applied swap differs from caller's amount"
            );
        }
        Ok(())
    }

    fn meta_info(&self, token_in: Address, token_out: Address) -> Result<SwapMeta, Error> {
        let token_in_index = self.token_index(token_in)?;
        let token_out_index = self.token_index(token_out)?;
        self.check_indices(token_in_index, token_out_index)?;
        Ok(SwapMeta {
            token_in_index,
            token_out_index,
        })
    }
}
