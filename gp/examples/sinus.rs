use ndarray::{concatenate, Array, Axis};
use wingp_gp::{metrics, Hyperparameters, Normalizer, SlidingWindowGp};

fn main() {
    let n = 100;
    let t = Array::linspace(0., (n - 1) as f64, n).insert_axis(Axis(1));
    let y = t.mapv(|v: f64| (v / 5.).sin());
    let raw = concatenate![Axis(1), t, y];

    let normalizer = Normalizer::fit(&raw).expect("normalizer fitted");
    let data = normalizer.transform(&raw).expect("normalized data");

    for sigma_y in [1e-1, 1e-2, 1e-3] {
        let gp = SlidingWindowGp::params(10)
            .hyperparameters(Hyperparameters::new(1., 1., sigma_y))
            .build()
            .expect("valid parameters");
        let res = gp.predict(&data).expect("sliding-window predictions");
        let actual = gp.targets_of(&data, &res).expect("targets");
        let rmse = metrics::rmse(res.predictions(), &actual).expect("rmse");
        println!(
            "{}: rmse={:.4}, last std={:.4}",
            gp.hyperparameters(),
            rmse[0],
            res.std_devs()[[res.std_devs().nrows() - 1, 0]]
        );
    }
}
