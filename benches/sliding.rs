use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::{concatenate, Array, Array2, Axis};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;
use wingp::calib::CalibrationObjective;
use wingp::gp::{Hyperparameters, Normalizer, SlidingWindowGp, WindowedGpParams};
use wingp::ParamGuard;

/// Two noisy sensor features driving a sinusoidal target
fn dataset(n: usize) -> Array2<f64> {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let t = Array::linspace(0., (n - 1) as f64, n).insert_axis(Axis(1));
    let noise = Array::random_using((n, 1), Normal::new(0., 0.05).unwrap(), &mut rng);
    let x2 = t.mapv(|v: f64| (v / 7.).cos()) + noise;
    let y = t.mapv(|v: f64| (v / 5.).sin());
    let raw = concatenate![Axis(1), t, x2, y];
    Normalizer::fit(&raw).unwrap().transform(&raw).unwrap()
}

fn criterion_sliding(c: &mut Criterion) {
    let mut group = c.benchmark_group("sliding");
    group.sample_size(20);
    for (n, window_size) in [(200, 10), (500, 30)] {
        let data = dataset(n);
        let gp = SlidingWindowGp::params(window_size)
            .hyperparameters(Hyperparameters::new(1., 1., 1e-2))
            .build()
            .unwrap();
        group.bench_function(format!("pass n={n} m={window_size}"), |b| {
            b.iter(|| std::hint::black_box(gp.predict(&data).unwrap()))
        });

        let params = WindowedGpParams::new(window_size).check().unwrap();
        let objective = CalibrationObjective::new(data.view(), params);
        group.bench_function(format!("objective n={n} m={window_size}"), |b| {
            b.iter(|| std::hint::black_box(objective.value(&[1., 1., 1e-2])))
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_sliding);
criterion_main!(benches);
