use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ql_marketmodels::prelude::*;
use ql_math::{Matrix, SequenceStatistics};
use std::hint::black_box;
use std::sync::Arc;

// Path throughput of the evolvers and the accounting engine.

fn rate_times(n: usize) -> Vec<f64> {
    (0..=n).map(|i| 0.5 + 0.5 * i as f64).collect()
}

fn market_model(n: usize, factors: usize) -> Arc<dyn MarketModel> {
    let times = rate_times(n);
    let evolution = EvolutionDescription::from_rate_times(times.clone()).expect("valid rate times");
    let correlation = exponential_forward_correlation(&times, 0.5, 0.2).expect("valid correlation");
    Arc::new(
        FlatVol::new(&vec![0.2; n], &correlation, evolution, factors, vec![0.04; n], vec![0.0; n])
            .expect("valid flat vol model"),
    )
}

fn run_paths(evolver: &mut dyn MarketModelEvolver, steps: usize, paths: usize) -> f64 {
    let mut acc = 0.0;
    for _ in 0..paths {
        evolver.start_new_path();
        for _ in 0..steps {
            evolver.advance_step().expect("step within path");
        }
        acc += evolver.current_state().forward_rate(steps - 1).expect("alive rate");
    }
    acc
}

fn bench_evolver_schemes(c: &mut Criterion) {
    let n = 20;
    let model = market_model(n, 3);
    let numeraires = terminal_measure(model.evolution());
    let factory = MtBrownianGeneratorFactory::new(42);
    let config = SimulationConfig::default();
    let mut group = c.benchmark_group("evolver_schemes");

    let pc = ForwardRatePcEvolver::new(model.clone(), &factory, numeraires.clone(), 0, &config).expect("pc");
    let ipc = ForwardRateIpcEvolver::new(model.clone(), &factory, numeraires.clone(), 0, &config).expect("ipc");
    let euler = ForwardRateEulerEvolver::new(model.clone(), &factory, numeraires.clone(), 0, &config).expect("euler");
    let normal = ForwardRateNormalPcEvolver::new(model, &factory, numeraires, 0, &config).expect("normal pc");
    let mut evolvers: Vec<(&str, Box<dyn MarketModelEvolver>)> = vec![
        ("pc", Box::new(pc) as Box<dyn MarketModelEvolver>),
        ("ipc", Box::new(ipc) as Box<dyn MarketModelEvolver>),
        ("euler", Box::new(euler) as Box<dyn MarketModelEvolver>),
        ("normal_pc", Box::new(normal) as Box<dyn MarketModelEvolver>),
    ];

    for (name, evolver) in evolvers.iter_mut() {
        group.bench_function(*name, |b| b.iter(|| black_box(run_paths(evolver.as_mut(), n, 100))));
    }
    group.finish();
}

fn bench_factor_count(c: &mut Criterion) {
    let n = 20;
    let factory = MtBrownianGeneratorFactory::new(42);
    let config = SimulationConfig::default();
    let mut group = c.benchmark_group("evolver_factors");

    for factors in [1usize, 3, 10, 20].iter() {
        let model = market_model(n, *factors);
        let numeraires = terminal_measure(model.evolution());
        let mut evolver = ForwardRatePcEvolver::new(model, &factory, numeraires, 0, &config).expect("pc");
        group.bench_with_input(BenchmarkId::from_parameter(factors), factors, |b, _| {
            b.iter(|| black_box(run_paths(&mut evolver, n, 100)))
        });
    }
    group.finish();
}

fn bench_drift_computation(c: &mut Criterion) {
    let n = 40;
    let forwards: Vec<f64> = (0..n).map(|i| 0.03 + 0.0005 * i as f64).collect();
    let mut drifts = vec![0.0; n];
    let mut group = c.benchmark_group("drift_computation");

    for factors in [3usize, 40].iter() {
        let root = Matrix::from_fn(n, *factors, |i, j| 0.1 / (1.0 + (i + j) as f64));
        let mut calc =
            LmmDriftCalculator::new(&root, &vec![0.0; n], &vec![0.5; n], n, 0).expect("valid drift calculator");
        group.bench_with_input(BenchmarkId::new("plain", factors), factors, |b, _| {
            b.iter(|| calc.compute_plain(black_box(&forwards), &mut drifts).expect("drifts"))
        });
        group.bench_with_input(BenchmarkId::new("reduced", factors), factors, |b, _| {
            b.iter(|| calc.compute_reduced(black_box(&forwards), &mut drifts).expect("drifts"))
        });
    }
    group.finish();
}

fn bench_accounting_engine(c: &mut Criterion) {
    let n = 10;
    let times = rate_times(n);
    let config = SimulationConfig::default();
    let mut group = c.benchmark_group("accounting_engine");
    group.sample_size(20);

    let make_worker = |seed: u64| -> ql_core::errors::Result<AccountingEngine> {
        let product = MultiStepForwards::new(times.clone(), vec![0.5; n], times[1..].to_vec(), vec![0.04; n])?;
        let numeraires = product.suggested_numeraires();
        let model = market_model(n, 3);
        let factory = MtBrownianGeneratorFactory::new(seed);
        let evolver = ForwardRatePcEvolver::new(model, &factory, numeraires, 0, &config)?;
        AccountingEngine::new(Box::new(evolver), Box::new(product), 0.95, &config)
    };

    group.bench_function("serial_10k", |b| {
        b.iter(|| {
            let mut engine = make_worker(config.seed()).expect("engine");
            let mut stats = SequenceStatistics::new(n);
            engine.multiple_path_values(&mut stats, 10_000).expect("paths");
            black_box(stats.mean())
        })
    });
    group.bench_function("parallel_10k", |b| {
        b.iter(|| {
            let mut stats = SequenceStatistics::new(n);
            AccountingEngine::multiple_path_values_parallel(make_worker, &mut stats, 10_000, &config).expect("paths");
            black_box(stats.mean())
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_evolver_schemes,
    bench_factor_count,
    bench_drift_computation,
    bench_accounting_engine
);
criterion_main!(benches);
