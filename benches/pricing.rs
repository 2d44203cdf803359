use std::hint::black_box;

use bsm_options::prelude::*;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn atm_call() -> OptionParameters {
    OptionParameters::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.20, OptionType::Call)
        .expect("benchmark parameters should be valid")
}

fn bench_price(c: &mut Criterion) {
    let params = atm_call();
    c.bench_function("bsm_price_call", |b| {
        b.iter(|| {
            let px = bs_price(black_box(&params))
                .expect("pricing should succeed")
                .price;
            black_box(px)
        })
    });
}

fn bench_value(c: &mut Criterion) {
    let params = atm_call();
    c.bench_function("bsm_price_and_greeks", |b| {
        b.iter(|| black_box(bs_value(black_box(&params)).expect("valuation should succeed")))
    });
}

fn bench_implied_vol(c: &mut Criterion) {
    let mut group = c.benchmark_group("implied_volatility");
    for vol in [0.05, 0.20, 1.50] {
        let unpriced = OptionParameters::without_volatility(100.0, 110.0, 0.5, 0.03, 0.01, OptionType::Call)
            .expect("benchmark parameters should be valid");
        let market = bs_price(&unpriced.with_volatility(vol).expect("valid vol"))
            .expect("pricing should succeed")
            .price;
        group.bench_with_input(BenchmarkId::from_parameter(vol), &market, |b, &market| {
            b.iter(|| {
                black_box(
                    implied_volatility(black_box(market), &unpriced, 1e-8, 100)
                        .expect("solve should succeed"),
                )
            })
        });
    }
    group.finish();
}

fn bench_ladder(c: &mut Criterion) {
    let params = atm_call();
    let config = LadderConfig::default();
    c.bench_function("spot_ladder_50", |b| {
        b.iter(|| black_box(spot_ladder(black_box(&params), &config).expect("ladder should succeed")))
    });
}

criterion_group!(benches, bench_price, bench_value, bench_implied_vol, bench_ladder);
criterion_main!(benches);
