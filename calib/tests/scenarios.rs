use approx::assert_abs_diff_eq;
use linfa::ParamGuard;
use ndarray::{concatenate, s, Array, Array2, Axis};
use wingp_calib::{Algorithm, CalibError, CalibrationObjective, Calibrator};
use wingp_gp::{metrics, GpError, Hyperparameters, Normalizer, SlidingWindowGp, WindowedGpParams};

fn init_logger() {
    let env = env_logger::Env::new().filter_or("WINGP_LOG", "info");
    let mut builder = env_logger::Builder::from_env(env);
    let builder = builder.target(env_logger::Target::Stdout);
    builder.try_init().ok();
}

/// `t = 0..n-1` feature with `sin(t/5)` target
fn sinus_dataset(n: usize) -> Array2<f64> {
    let t = Array::linspace(0., (n - 1) as f64, n).insert_axis(Axis(1));
    let y = t.mapv(|v: f64| (v / 5.).sin());
    concatenate![Axis(1), t, y]
}

/// `t` feature with a sinusoid and a linear trend as targets, every row duplicated
fn duplicated_two_targets_dataset(n: usize) -> Array2<f64> {
    let t = Array::linspace(0., (n - 1) as f64, n).insert_axis(Axis(1));
    let y1 = t.mapv(|v: f64| (v / 5.).sin());
    let y2 = t.mapv(|v: f64| 0.1 * v + 1.);
    let data = concatenate![Axis(1), t, y1, y2];
    let rows: Vec<usize> = (0..n).flat_map(|i| [i, i]).collect();
    data.select(Axis(0), &rows)
}

#[test]
fn test_sinus_held_out_tail() {
    init_logger();
    let raw = sinus_dataset(100);
    let normalizer = Normalizer::fit(&raw.slice(s![..70, ..])).unwrap();
    let data = normalizer.transform(&raw).unwrap();
    let train = data.slice(s![..70, ..]);
    // test windows start with the last training rows to predict the 30 held-out rows
    let test = data.slice(s![60.., ..]);

    let params = WindowedGpParams::new(10).check().unwrap();
    let calibration = Calibrator::new(params.clone()).calibrate(&train).unwrap();
    assert!(calibration.sse < calibration.initial_sse);

    let gp = SlidingWindowGp::new(
        params
            .with_hyperparameters(calibration.hyperparameters)
            .unwrap(),
    );
    let prediction = gp.predict(&test).unwrap();
    assert_eq!(prediction.predictions().dim(), (30, 1));
    let actual = gp.targets_of(&test, &prediction).unwrap();
    let rmse = metrics::rmse(prediction.predictions(), &actual).unwrap();
    assert!(rmse[0] < 0.1, "held-out rmse {} too large", rmse[0]);
}

#[test]
fn test_window_as_long_as_dataset() {
    let data = sinus_dataset(20);
    let gp = SlidingWindowGp::params(20).build().unwrap();
    assert!(matches!(
        gp.predict(&data),
        Err(GpError::NoPredictionError(_))
    ));

    let params = WindowedGpParams::new(20).check().unwrap();
    assert!(matches!(
        Calibrator::new(params).calibrate(&data),
        Err(CalibError::InvalidConfigError(_))
    ));
}

#[test]
fn test_duplicated_rows_two_targets() {
    let raw = duplicated_two_targets_dataset(30);
    let data = Normalizer::fit(&raw).unwrap().transform(&raw).unwrap();
    for hp in [
        Hyperparameters::new(1., 1., 1e-3),
        Hyperparameters::new(1., 1., 1e-4),
        Hyperparameters::new(0.5, 1., 1e-5),
    ] {
        let gp = SlidingWindowGp::params(8)
            .n_targets(2)
            .hyperparameters(hp)
            .build()
            .unwrap();
        let res = gp.predict(&data).unwrap();
        assert_eq!(res.predictions().dim(), (60 - 8, 2));
        assert_eq!(res.std_devs().dim(), (60 - 8, 2));
        assert!(res.std_devs().iter().all(|s| *s >= 0.));
    }
}

#[test]
fn test_calibration_is_deterministic() {
    let raw = sinus_dataset(40);
    let data = Normalizer::fit(&raw).unwrap().transform(&raw).unwrap();
    let params = WindowedGpParams::new(6).check().unwrap();
    for algo in [Algorithm::Slsqp, Algorithm::Cobyla] {
        let calibrate = || {
            Calibrator::new(params.clone())
                .configure(|config| config.algorithm(algo).max_eval(50))
                .calibrate(&data)
                .unwrap()
        };
        let first = calibrate();
        let second = calibrate();
        assert_eq!(first.hyperparameters, second.hyperparameters);
        assert_eq!(first.sse, second.sse);
        assert_eq!(first.converged, second.converged);
    }
}

#[test]
fn test_prediction_count() {
    let data = sinus_dataset(25);
    for window_size in [1, 5, 24] {
        let gp = SlidingWindowGp::params(window_size).build().unwrap();
        let res = gp.predict(&data).unwrap();
        assert_eq!(res.predictions().nrows(), 25 - window_size);
        assert_eq!(res.indices().first(), Some(&window_size));
    }
}

#[test]
fn test_objective_zero_for_exact_predictions() {
    // zero targets are predicted exactly whatever the hyperparameters
    let t = Array::linspace(0., 1., 15).insert_axis(Axis(1));
    let data = concatenate![Axis(1), t, Array2::zeros((15, 1))];
    let params = WindowedGpParams::new(4).check().unwrap();
    let objective = CalibrationObjective::new(data.view(), params.clone());
    assert_abs_diff_eq!(objective.sse(&Hyperparameters::default()).unwrap(), 0.);

    let data = sinus_dataset(15);
    let objective = CalibrationObjective::new(data.view(), params);
    for hp in [
        Hyperparameters::default(),
        Hyperparameters::new(0.1, 3., 1e-2),
        Hyperparameters::new(10., 0.5, 1.),
    ] {
        assert!(objective.sse(&hp).unwrap() > 0.);
    }
}

#[test]
fn test_calibrated_hyperparameters_lower_bound() {
    let raw = sinus_dataset(30);
    let data = Normalizer::fit(&raw).unwrap().transform(&raw).unwrap();
    let params = WindowedGpParams::new(5).check().unwrap();
    for algo in [Algorithm::Slsqp, Algorithm::Cobyla] {
        let res = Calibrator::new(params.clone())
            .configure(|config| config.algorithm(algo).max_eval(60))
            .calibrate(&data)
            .unwrap();
        assert!(res
            .hyperparameters
            .to_array()
            .iter()
            .all(|v| *v >= Hyperparameters::<f64>::LOWER_BOUND));
    }
}
