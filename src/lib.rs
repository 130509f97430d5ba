//! Curve cryptoswap invariant math and swap simulation in pure Rust.
//!
//! This crate exposes:
//! - Fixed-point solvers (`math::*`) for the invariant `D`, a missing balance
//!   `y`, the dynamic fee and the packed price words.
//! - An in-memory `CryptoPool` for two-coin and three-coin ("tricrypto")
//!   pools that quotes and executes swaps bit-for-bit like the contract,
//!   including the oracle / re-peg step that follows every trade.
//! - A versioned `PoolSnapshot` codec and the `SwapSimulator` routing trait.
//!
//! # Examples
//!
//! ## Pure math
//! ```no_run
//! use cryptoswap_math::{math::newton_d::newton_d, math::safe_range::THREE_COINS, U256};
//!
//! let x = [U256::from(10u64).pow(U256::from(24u8)); 3];
//! let d = newton_d(U256::from(1_707_629u64), U256::from(11_809_167_828_997u64), &x, &THREE_COINS)
//!     .unwrap();
//! assert_eq!(d, x[0] * U256::from(3u8));
//! ```
//!
//! ## Quoting and executing against a snapshot
//! ```no_run
//! use cryptoswap_math::{CryptoPool, FixedClock, PoolSnapshot, U256};
//!
//! # let json = "";
//! let snapshot = PoolSnapshot::from_json(json).unwrap();
//! let mut pool = CryptoPool::from_snapshot(snapshot, FixedClock(1_700_000_000)).unwrap();
//!
//! let (dy, fee) = pool.get_dy(0, 1, U256::from(1_000_000u64)).unwrap();
//! println!("out: {dy}, fee: {fee}");
//!
//! // branch before mutating if the current state must survive
//! let mut branch = pool.clone();
//! let received = branch.exchange(0, 1, U256::from(1_000_000u64)).unwrap();
//! assert_eq!(received, dy);
//! ```

pub use alloy_primitives::{Address, U256};

pub mod error;
pub mod math;
pub mod pool;
pub mod simulator;

pub use error::Error;
pub use math::fee::FeeParams;
pub use math::packed::{PRICE_MASK, PRICE_SIZE};
pub use math::safe_range::{A_MULTIPLIER, SafeRange};
pub use pool::clock::{Clock, FixedClock, SystemClock};
pub use pool::crypto_pool::{AGammaRamp, CryptoPool, PoolParams, PoolState, RepegParams};
pub use pool::snapshot::PoolSnapshot;
pub use simulator::{Quote, SwapMeta, SwapSimulator};

/// 18-decimal fixed-point unit (`1e18`).
pub const PRECISION: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

const U256_2: U256 = U256::from_limbs([2, 0, 0, 0]);

const E5: U256 = U256::from_limbs([100_000, 0, 0, 0]);
const E6: U256 = U256::from_limbs([1_000_000, 0, 0, 0]);
const E9: U256 = U256::from_limbs([1_000_000_000, 0, 0, 0]);
const E10: U256 = U256::from_limbs([10_000_000_000, 0, 0, 0]);
const E11: U256 = U256::from_limbs([100_000_000_000, 0, 0, 0]);
const E14: U256 = U256::from_limbs([100_000_000_000_000, 0, 0, 0]);
const E16: U256 = U256::from_limbs([10_000_000_000_000_000, 0, 0, 0]);
const E20: U256 = U256::from_limbs([7766279631452241920, 5, 0, 0]);
const E33: U256 = U256::from_limbs([4089650035136921600, 54210108624275, 0, 0]);
