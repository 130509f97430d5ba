use alloy_primitives::{Address, U256};
use thiserror::Error;

/// The bound a solver input or output fell outside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsafeValue {
    Amplification,
    Gamma,
    Invariant,
    LargestBalance,
    BalanceRatio { index: usize },
    BalanceToInvariant { index: usize },
    SolvedBalance,
}

/// The iterative routine that ran out of its step budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routine {
    GeometricMean,
    Sqrt,
    HalfPow,
    NewtonD,
    NewtonY,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MathError {
    #[error("Math error - overflow")]
    Overflow,
    #[error("Math error - underflow")]
    Underflow,
    #[error("Math error - division by zero")]
    DivisionByZero,
    #[error("Math error - unsafe values ({0:?})")]
    UnsafeValues(UnsafeValue),
    #[error("Math error - {0:?} did not converge")]
    ConvergenceFailure(Routine),
    #[error("Math error - denominator is 0")]
    DenominatorZero,
    #[error("Math error - got {actual} balances, expected {expected}")]
    BalanceCount { expected: usize, actual: usize },
    #[error("Math error - coin index {index} is out of range for {n_coins} coins")]
    IndexOutOfRange { index: usize, n_coins: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("State error - virtual price would drop from {old_virtual_price} to {virtual_price}")]
    Loss {
        virtual_price: U256,
        old_virtual_price: U256,
    },
    #[error("State error - unsupported coin count {0}")]
    CoinCount(usize),
    #[error("State error - {field} has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("State error - lane {lane} does not fit in 128 bits")]
    LaneOverflow { lane: usize },
    #[error("State error - price scale is 0")]
    PriceScaleIsZero,
    #[error("State error - lp supply is 0")]
    LpSupplyIsZero,
    #[error("State error - precision multiplier is 0")]
    PrecisionIsZero,
    #[error("State error - oracle half-life is 0")]
    MaHalfTimeIsZero,
    #[error("State error - unsupported snapshot version {0}")]
    UnsupportedVersion(u8),
    #[error("State error - malformed snapshot: {0}")]
    Encoding(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SwapError {
    #[error("Swap error - tokenIn and tokenOut must not be the same")]
    IdenticalTokens,
    #[error("Swap error - coin index {index} is out of range for {n_coins} coins")]
    IndexOutOfRange { index: usize, n_coins: usize },
    #[error("Swap error - token {0} is not part of the pool")]
    UnknownToken(Address),
    #[error("Swap error - amount in is 0")]
    AmountIsZero,
    #[error("Swap error - amount out is 0")]
    OutputIsZero,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] crate::error::MathError),

    #[error(transparent)]
    StateError(#[from] crate::error::StateError),

    #[error(transparent)]
    SwapError(#[from] crate::error::SwapError),
}

impl Error {
    /// `true` when the pool state cannot price this trade at all
    /// (unsafe solver range, exhausted iterations or a zero divisor).
    ///
    /// Callers treat these as "not quotable against the current state";
    /// refreshing the state is the only remedy.
    pub fn is_unquotable(&self) -> bool {
        matches!(
            self,
            Error::MathError(
                MathError::UnsafeValues(_)
                    | MathError::ConvergenceFailure(_)
                    | MathError::DenominatorZero
            )
        )
    }
}
