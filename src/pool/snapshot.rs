use crate::error::StateError;
use crate::math::fee::FeeParams;
use crate::math::packed::{pack, unpack};
use crate::pool::clock::Clock;
use crate::pool::crypto_pool::{AGammaRamp, CryptoPool, PoolParams, PoolState, RepegParams, check_len};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Version written by [`CryptoPool::snapshot`].
pub const SNAPSHOT_VERSION: u8 = 1;

/// Flat, persisted form of a pool.
///
/// Big integers travel as decimal strings, timestamps as plain integers.
/// Price vectors hold one entry per non-base coin and are packed on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub version: u8,
    pub address: Address,
    pub tokens: Vec<Address>,
    #[serde(with = "decimal_vec")]
    pub precisions: Vec<U256>,
    #[serde(with = "decimal_vec")]
    pub reserves: Vec<U256>,
    #[serde(with = "decimal")]
    pub lp_supply: U256,

    /// Used to seed the ramp when `future_a_gamma` is zero.
    #[serde(with = "decimal")]
    pub a: U256,
    #[serde(with = "decimal")]
    pub gamma: U256,

    #[serde(with = "decimal")]
    pub mid_fee: U256,
    #[serde(with = "decimal")]
    pub out_fee: U256,
    #[serde(with = "decimal")]
    pub fee_gamma: U256,
    #[serde(with = "decimal")]
    pub allowed_extra_profit: U256,
    #[serde(with = "decimal")]
    pub adjustment_step: U256,
    #[serde(with = "decimal")]
    pub ma_half_time: U256,

    #[serde(with = "decimal")]
    pub d: U256,
    #[serde(with = "decimal_vec")]
    pub price_scale: Vec<U256>,
    #[serde(with = "decimal_vec")]
    pub price_oracle: Vec<U256>,
    #[serde(with = "decimal_vec")]
    pub last_prices: Vec<U256>,
    pub last_prices_timestamp: u64,
    #[serde(with = "decimal")]
    pub xcp_profit: U256,
    #[serde(with = "decimal")]
    pub virtual_price: U256,
    pub not_adjusted: bool,

    #[serde(with = "decimal")]
    pub initial_a_gamma: U256,
    pub initial_a_gamma_time: u64,
    #[serde(with = "decimal")]
    pub future_a_gamma: U256,
    pub future_a_gamma_time: u64,
}

impl PoolSnapshot {
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| StateError::Encoding(e.to_string()))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, StateError> {
        serde_json::to_string(self).map_err(|e| StateError::Encoding(e.to_string()))
    }

    fn check_version(&self) -> Result<(), StateError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(StateError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

impl<C: Clock> CryptoPool<C> {
    /// Rebuilds a pool from its persisted form.
    pub fn from_snapshot(snapshot: PoolSnapshot, clock: C) -> Result<Self, StateError> {
        snapshot.check_version()?;

        let n_lanes = snapshot.tokens.len().saturating_sub(1);
        check_len("price_scale", n_lanes, snapshot.price_scale.len())?;
        check_len("price_oracle", n_lanes, snapshot.price_oracle.len())?;
        check_len("last_prices", n_lanes, snapshot.last_prices.len())?;

        let ramp = if snapshot.future_a_gamma.is_zero() {
            AGammaRamp::settled(snapshot.a, snapshot.gamma)?
        } else {
            AGammaRamp {
                initial_a_gamma: snapshot.initial_a_gamma,
                initial_a_gamma_time: snapshot.initial_a_gamma_time,
                future_a_gamma: snapshot.future_a_gamma,
            }
        };

        let params = PoolParams {
            address: snapshot.address,
            tokens: snapshot.tokens,
            precisions: snapshot.precisions,
            fee: FeeParams {
                mid_fee: snapshot.mid_fee,
                out_fee: snapshot.out_fee,
                fee_gamma: snapshot.fee_gamma,
            },
            repeg: RepegParams {
                allowed_extra_profit: snapshot.allowed_extra_profit,
                adjustment_step: snapshot.adjustment_step,
                ma_half_time: snapshot.ma_half_time,
            },
            lp_supply: snapshot.lp_supply,
            ramp,
        };
        let state = PoolState {
            reserves: snapshot.reserves,
            d: snapshot.d,
            price_scale_packed: pack(&snapshot.price_scale)?,
            price_oracle_packed: pack(&snapshot.price_oracle)?,
            last_prices_packed: pack(&snapshot.last_prices)?,
            last_prices_timestamp: snapshot.last_prices_timestamp,
            xcp_profit: snapshot.xcp_profit,
            virtual_price: snapshot.virtual_price,
            not_adjusted: snapshot.not_adjusted,
            future_a_gamma_time: snapshot.future_a_gamma_time,
        };
        Self::with_clock(params, state, clock)
    }

    /// Persisted form of the current pool. `a`/`gamma` carry the ramp target.
    pub fn snapshot(&self) -> PoolSnapshot {
        let params = self.params();
        let state = self.state();
        let n_lanes = self.n_coins() - 1;
        let (a, gamma) = params.ramp.future();

        PoolSnapshot {
            version: SNAPSHOT_VERSION,
            address: params.address,
            tokens: params.tokens.clone(),
            precisions: params.precisions.clone(),
            reserves: state.reserves.clone(),
            lp_supply: params.lp_supply,
            a,
            gamma,
            mid_fee: params.fee.mid_fee,
            out_fee: params.fee.out_fee,
            fee_gamma: params.fee.fee_gamma,
            allowed_extra_profit: params.repeg.allowed_extra_profit,
            adjustment_step: params.repeg.adjustment_step,
            ma_half_time: params.repeg.ma_half_time,
            d: state.d,
            price_scale: unpack(state.price_scale_packed, n_lanes),
            price_oracle: unpack(state.price_oracle_packed, n_lanes),
            last_prices: unpack(state.last_prices_packed, n_lanes),
            last_prices_timestamp: state.last_prices_timestamp,
            xcp_profit: state.xcp_profit,
            virtual_price: state.virtual_price,
            not_adjusted: state.not_adjusted,
            initial_a_gamma: params.ramp.initial_a_gamma,
            initial_a_gamma_time: params.ramp.initial_a_gamma_time,
            future_a_gamma: params.ramp.future_a_gamma,
            future_a_gamma_time: state.future_a_gamma_time,
        }
    }
}

mod decimal {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10).map_err(D::Error::custom)
    }
}

mod decimal_vec {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(values: &[U256], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(values.iter().map(|v| v.to_string()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<U256>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| U256::from_str_radix(s, 10).map_err(D::Error::custom))
            .collect()
    }
}
