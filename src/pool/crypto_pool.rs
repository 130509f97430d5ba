use crate::error::{StateError, SwapError};
use crate::math::fee::FeeParams;
use crate::math::packed::{PRICE_MASK, PRICE_SIZE, lane, unpack};
use crate::math::safe_range::SafeRange;
use crate::pool::clock::{Clock, SystemClock};
use alloy_primitives::{Address, U256};

/// Tunables of the re-peg engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepegParams {
    /// Profit headroom kept before the price scale is moved, 18 decimals.
    pub allowed_extra_profit: U256,
    /// Largest normalized move of the price scale per re-peg, 18 decimals.
    pub adjustment_step: U256,
    /// Half-life of the price oracle EMA, in seconds.
    pub ma_half_time: U256,
}

/// A/gamma ramp as stored by the contract.
///
/// Both words pack `A << 128 | gamma`. The end time of the ramp is part of
/// [`PoolState`] because swaps rewrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AGammaRamp {
    pub initial_a_gamma: U256,
    pub initial_a_gamma_time: u64,
    pub future_a_gamma: U256,
}

impl AGammaRamp {
    /// A ramp that has already ended at `(a, gamma)`.
    pub fn settled(a: U256, gamma: U256) -> Result<Self, StateError> {
        if a > PRICE_MASK {
            return Err(StateError::LaneOverflow { lane: 1 });
        }
        if gamma > PRICE_MASK {
            return Err(StateError::LaneOverflow { lane: 0 });
        }
        let a_gamma = (a << PRICE_SIZE) | gamma;
        Ok(Self {
            initial_a_gamma: a_gamma,
            initial_a_gamma_time: 0,
            future_a_gamma: a_gamma,
        })
    }

    /// `(A, gamma)` the ramp is heading to.
    pub fn future(&self) -> (U256, U256) {
        (self.future_a_gamma >> PRICE_SIZE, lane(self.future_a_gamma, 0))
    }

    /// `(A, gamma)` the ramp started from.
    pub fn initial(&self) -> (U256, U256) {
        (self.initial_a_gamma >> PRICE_SIZE, lane(self.initial_a_gamma, 0))
    }
}

/// Static description of a pool. Nothing here changes during a swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolParams {
    pub address: Address,
    pub tokens: Vec<Address>,
    /// Multipliers lifting each raw balance to 18 decimals.
    pub precisions: Vec<U256>,
    pub fee: FeeParams,
    pub repeg: RepegParams,
    /// Circulating LP token supply.
    pub lp_supply: U256,
    pub ramp: AGammaRamp,
}

/// Everything a swap may rewrite.
///
/// Packed words hold `N - 1` lanes, lane `k` being coin `k + 1` priced in
/// coin 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub reserves: Vec<U256>,
    pub d: U256,
    pub price_scale_packed: U256,
    pub price_oracle_packed: U256,
    pub last_prices_packed: U256,
    pub last_prices_timestamp: u64,
    pub xcp_profit: U256,
    pub virtual_price: U256,
    pub not_adjusted: bool,
    /// `0` no ramp, `1` ramp finished during the last swap, otherwise the
    /// ramp end timestamp.
    pub future_a_gamma_time: u64,
}

/// In-memory cryptoswap pool.
///
/// Reads (`get_dy`) borrow the pool; `exchange` is the only mutation and
/// is all-or-nothing. Callers exploring several hypothetical trades clone
/// the pool per branch.
#[derive(Debug, Clone)]
pub struct CryptoPool<C = SystemClock> {
    params: PoolParams,
    state: PoolState,
    range: SafeRange,
    clock: C,
}

impl CryptoPool<SystemClock> {
    /// Builds a pool priced against wall-clock time.
    pub fn new(params: PoolParams, state: PoolState) -> Result<Self, StateError> {
        Self::with_clock(params, state, SystemClock)
    }
}

impl<C: Clock> CryptoPool<C> {
    /// Builds a pool priced against `clock`, validating the layout of
    /// `params` and `state`.
    pub fn with_clock(params: PoolParams, state: PoolState, clock: C) -> Result<Self, StateError> {
        let n_coins = params.tokens.len();
        let range = SafeRange::for_coins(n_coins)?;

        check_len("reserves", n_coins, state.reserves.len())?;
        check_len("precisions", n_coins, params.precisions.len())?;
        if params.precisions.iter().any(|p| p.is_zero()) {
            return Err(StateError::PrecisionIsZero);
        }
        if params.lp_supply.is_zero() {
            return Err(StateError::LpSupplyIsZero);
        }
        if params.repeg.ma_half_time.is_zero() {
            return Err(StateError::MaHalfTimeIsZero);
        }

        let n_lanes = n_coins - 1;
        for word in [
            state.price_scale_packed,
            state.price_oracle_packed,
            state.last_prices_packed,
        ] {
            if !(word >> (n_lanes * PRICE_SIZE)).is_zero() {
                return Err(StateError::LaneOverflow { lane: n_lanes });
            }
        }
        if unpack(state.price_scale_packed, n_lanes)
            .iter()
            .any(|p| p.is_zero())
        {
            return Err(StateError::PriceScaleIsZero);
        }

        tracing::debug!(
            pool = %params.address,
            n_coins,
            d = %state.d,
            virtual_price = %state.virtual_price,
            "pool loaded"
        );

        Ok(Self {
            params,
            state,
            range,
            clock,
        })
    }

    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn range(&self) -> &SafeRange {
        &self.range
    }

    pub fn address(&self) -> Address {
        self.params.address
    }

    pub fn tokens(&self) -> &[Address] {
        &self.params.tokens
    }

    pub fn n_coins(&self) -> usize {
        self.params.tokens.len()
    }

    /// Index of `token` in the pool's coin order.
    pub fn token_index(&self, token: Address) -> Result<usize, SwapError> {
        self.params
            .tokens
            .iter()
            .position(|&t| t == token)
            .ok_or(SwapError::UnknownToken(token))
    }

    /// Re-targets the pool at another clock, keeping its state.
    pub fn with_new_clock<D: Clock>(self, clock: D) -> CryptoPool<D> {
        CryptoPool {
            params: self.params,
            state: self.state,
            range: self.range,
            clock,
        }
    }

    pub(crate) fn check_indices(&self, i: usize, j: usize) -> Result<(), SwapError> {
        let n_coins = self.n_coins();
        if i == j {
            return Err(SwapError::IdenticalTokens);
        }
        for index in [i, j] {
            if index >= n_coins {
                return Err(SwapError::IndexOutOfRange { index, n_coins });
            }
        }
        Ok(())
    }

    /// Swaps in a new state after a successful operation.
    pub(crate) fn commit(&mut self, state: PoolState) {
        self.state = state;
    }
}

pub(crate) fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<(), StateError> {
    if expected != actual {
        return Err(StateError::LengthMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}
