#![allow(dead_code)]

use criterion::{BenchmarkId, Criterion};
use cryptoswap_math::math::fee::FeeParams;
use cryptoswap_math::math::fixed_point::{geometric_mean, halfpow, sqrt_int};
use cryptoswap_math::math::newton_d::newton_d;
use cryptoswap_math::math::newton_y::newton_y;
use cryptoswap_math::math::packed::pack;
use cryptoswap_math::math::safe_range::THREE_COINS;
use cryptoswap_math::{
    AGammaRamp, Address, CryptoPool, FixedClock, PRECISION, PoolParams, PoolState, RepegParams, U256,
};
use std::hint::black_box;
use std::str::FromStr;

pub const NOW: u64 = 1_700_000_000;

pub fn u(s: &str) -> U256 {
    U256::from_str(s).unwrap()
}

fn ann() -> U256 {
    U256::from(1_707_629u64)
}

fn gamma() -> U256 {
    U256::from(11_809_167_828_997u64)
}

fn skewed_balances() -> Vec<U256> {
    vec![
        u("1000000000000000000000000"),
        u("2000000000000000000000000"),
        u("500000000000000000000000"),
    ]
}

/// Balanced three-coin pool, 1M of each coin.
pub fn three_coin_pool() -> CryptoPool<FixedClock> {
    let ones = pack(&[PRECISION, PRECISION]).unwrap();
    let params = PoolParams {
        address: Address::with_last_byte(0x10),
        tokens: (1..=3).map(Address::with_last_byte).collect(),
        precisions: vec![U256::ONE; 3],
        fee: FeeParams {
            mid_fee: U256::from(3_000_000u64),
            out_fee: U256::from(30_000_000u64),
            fee_gamma: u("500000000000000"),
        },
        repeg: RepegParams {
            allowed_extra_profit: U256::from(2_000_000_000_000u64),
            adjustment_step: u("490000000000000"),
            ma_half_time: U256::from(600u64),
        },
        lp_supply: u("1000000000000000000000000"),
        ramp: AGammaRamp::settled(ann(), gamma()).unwrap(),
    };
    let state = PoolState {
        reserves: vec![u("1000000000000000000000000"); 3],
        d: u("3000000000000000000000000"),
        price_scale_packed: ones,
        price_oracle_packed: ones,
        last_prices_packed: ones,
        last_prices_timestamp: NOW,
        xcp_profit: PRECISION,
        virtual_price: PRECISION,
        not_adjusted: false,
        future_a_gamma_time: 0,
    };
    CryptoPool::with_clock(params, state, FixedClock(NOW)).unwrap()
}

pub fn bench_fixed_point(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixed_point");
    let x = skewed_balances();

    group.bench_function("geometric_mean", |b| {
        b.iter(|| geometric_mean(black_box(&x), true).unwrap())
    });
    group.bench_function("sqrt_int", |b| {
        b.iter(|| sqrt_int(black_box(u("2000000000000000000"))).unwrap())
    });
    for power in ["500000000000000000", "3500000000000000000"] {
        group.bench_with_input(BenchmarkId::new("halfpow", power), &u(power), |b, &p| {
            b.iter(|| halfpow(black_box(p), U256::from(10_000_000_000u64)).unwrap())
        });
    }
    group.finish();
}

pub fn bench_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("solvers");
    let x = skewed_balances();
    let d = newton_d(ann(), gamma(), &x, &THREE_COINS).unwrap();

    group.bench_function("newton_d", |b| {
        b.iter(|| newton_d(black_box(ann()), black_box(gamma()), black_box(&x), &THREE_COINS).unwrap())
    });
    for i in 0..3 {
        group.bench_with_input(BenchmarkId::new("newton_y", i), &i, |b, &i| {
            b.iter(|| newton_y(ann(), gamma(), black_box(&x), black_box(d), i, &THREE_COINS).unwrap())
        });
    }
    group.finish();
}

pub fn bench_fee(c: &mut Criterion) {
    let fee = FeeParams {
        mid_fee: U256::from(3_000_000u64),
        out_fee: U256::from(30_000_000u64),
        fee_gamma: u("500000000000000"),
    };
    let x = skewed_balances();
    c.bench_function("fee", |b| b.iter(|| fee.fee(black_box(&x)).unwrap()));
}

pub fn bench_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool");
    let pool = three_coin_pool();
    let dx = u("1000000000000000000000");

    group.bench_function("get_dy", |b| {
        b.iter(|| pool.get_dy(black_box(0), black_box(1), black_box(dx)).unwrap())
    });
    group.bench_function("exchange", |b| {
        b.iter_batched(
            || pool.clone(),
            |mut branch| branch.exchange(0, 1, dx).unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });
    group.bench_function("snapshot_json", |b| {
        b.iter(|| black_box(&pool).snapshot().to_json().unwrap())
    });
    group.finish();
}
