use crate::calibrator::{CalibrationConfig, CalibrationResult, Calibrator};
use crate::errors::Result;

use log::info;
use ndarray::{s, Array2, ArrayBase, Axis, Data, Ix2};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use wingp_gp::kernels::{Kernel, SquaredExponentialLinearKernel};
use wingp_gp::{Hyperparameters, Normalizer, SlidingWindowGp, WindowedGpValidParams};

/// Sliding-window predictions in original data units
#[derive(Clone, Debug)]
pub struct ModelPrediction {
    /// Posterior means (n_predicted, n_targets)
    pub means: Array2<f64>,
    /// Posterior standard deviations (n_predicted, n_targets)
    pub std_devs: Array2<f64>,
    /// Actual targets of predicted rows
    pub actual: Array2<f64>,
    /// Dataset row index of each prediction row
    pub indices: Vec<usize>,
}

/// A sliding-window GP with calibrated hyperparameters working on raw data:
/// normalization transforms fitted on training data are applied on the way in
/// and reverted on the way out.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "K: Serialize", deserialize = "K: Deserialize<'de>"))]
pub struct CalibratedModel<K: Kernel<f64> = SquaredExponentialLinearKernel> {
    /// Window parameters holding calibrated hyperparameters
    params: WindowedGpValidParams<f64, K>,
    /// Column-wise scaling of datasets (features and targets)
    data_normalizer: Normalizer<f64>,
    /// Scaling of target columns
    target_normalizer: Normalizer<f64>,
    /// Calibration outcome when hyperparameters were optimized
    calibration: Option<CalibrationResult>,
}

impl<K: Kernel<f64>> CalibratedModel<K> {
    fn normalizers(
        data: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        n_targets: usize,
    ) -> Result<(Normalizer<f64>, Normalizer<f64>)> {
        let data_normalizer = Normalizer::fit(data)?;
        let target_normalizer = data_normalizer.tail(n_targets)?;
        Ok((data_normalizer, target_normalizer))
    }

    /// Fit normalizers on raw training data then calibrate hyperparameters
    /// on normalized training data
    pub fn fit(
        data: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        params: WindowedGpValidParams<f64, K>,
        config: CalibrationConfig,
    ) -> Result<Self> {
        let (data_normalizer, target_normalizer) = Self::normalizers(data, params.n_targets())?;
        let normalized = data_normalizer.transform(data)?;
        let calibration = Calibrator::new(params.clone())
            .configure(|_| config)
            .calibrate(&normalized)?;
        let params = params.with_hyperparameters(calibration.hyperparameters)?;
        Ok(CalibratedModel {
            params,
            data_normalizer,
            target_normalizer,
            calibration: Some(calibration),
        })
    }

    /// Fit normalizers on raw training data and use given hyperparameters as is
    pub fn from_hyperparameters(
        data: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        params: WindowedGpValidParams<f64, K>,
        hyperparameters: Hyperparameters<f64>,
    ) -> Result<Self> {
        let (data_normalizer, target_normalizer) = Self::normalizers(data, params.n_targets())?;
        Ok(CalibratedModel {
            params: params.with_hyperparameters(hyperparameters)?,
            data_normalizer,
            target_normalizer,
            calibration: None,
        })
    }

    /// Calibrated hyperparameters
    pub fn hyperparameters(&self) -> &Hyperparameters<f64> {
        self.params.hyperparameters()
    }

    /// Window parameters
    pub fn params(&self) -> &WindowedGpValidParams<f64, K> {
        &self.params
    }

    /// Calibration outcome, None when built from given hyperparameters
    pub fn calibration(&self) -> Option<&CalibrationResult> {
        self.calibration.as_ref()
    }

    /// Dataset normalizer
    pub fn data_normalizer(&self) -> &Normalizer<f64> {
        &self.data_normalizer
    }

    /// Target normalizer
    pub fn target_normalizer(&self) -> &Normalizer<f64> {
        &self.target_normalizer
    }

    /// Sliding-window predictions over raw `data` in original units
    pub fn predict(&self, data: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<ModelPrediction> {
        let normalized = self.data_normalizer.transform(data)?;
        let gp = SlidingWindowGp::new(self.params.clone());
        let res = gp.predict(&normalized)?;
        let nf = data.ncols() - self.params.n_targets();
        let actual = data.slice(s![.., nf..]).select(Axis(0), res.indices());
        let means = self.target_normalizer.inverse_transform(res.predictions())?;
        let std_devs = self.target_normalizer.inverse_transform_std(res.std_devs())?;
        Ok(ModelPrediction {
            means,
            std_devs,
            actual,
            indices: res.indices().to_vec(),
        })
    }
}

impl<K: Kernel<f64> + Serialize> CalibratedModel<K> {
    /// Save the model as json
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(writer, self)?;
        info!("Model saved in {}", path.as_ref().display());
        Ok(())
    }
}

impl<K: Kernel<f64> + DeserializeOwned> CalibratedModel<K> {
    /// Load a model saved as json
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use linfa::ParamGuard;
    use ndarray::{concatenate, Array};
    use wingp_gp::WindowedGpParams;

    fn raw_data() -> Array2<f64> {
        let t = Array::linspace(0., 39., 40).insert_axis(Axis(1));
        let y = t.mapv(|v: f64| 20. + 5. * (v / 5.).sin());
        concatenate![Axis(1), t, y]
    }

    #[test]
    fn test_predict_in_original_units() {
        let data = raw_data();
        let params = WindowedGpParams::new(8).check().unwrap();
        let model = CalibratedModel::from_hyperparameters(
            &data,
            params,
            Hyperparameters::new(1., 1., 1e-3),
        )
        .unwrap();
        assert!(model.calibration().is_none());
        let res = model.predict(&data).unwrap();
        assert_eq!(res.means.dim(), (32, 1));
        assert_eq!(res.std_devs.dim(), (32, 1));
        assert_eq!(res.indices[0], 8);
        assert_abs_diff_eq!(res.actual[[0, 0]], data[[8, 1]]);
        // predictions live around the raw target level
        let mean = res.means.mean().unwrap();
        assert!((mean - 20.).abs() < 5.);
        assert!(res.std_devs.iter().all(|s| *s >= 0.));
    }

    #[test]
    fn test_predict_with_missing_target() {
        let mut data = raw_data();
        data[[20, 1]] = f64::NAN;
        let params = WindowedGpParams::new(8).check().unwrap();
        let model = CalibratedModel::from_hyperparameters(
            &data,
            params,
            Hyperparameters::new(1., 1., 1e-3),
        )
        .unwrap();
        assert!(model.data_normalizer().mean().iter().all(|v| v.is_finite()));
        let res = model.predict(&data).unwrap();
        // windows of rows 21 to 28 contain row 20
        assert_eq!(res.means.nrows(), 32 - 8);
        assert!(res.indices.contains(&20));
        assert!(!res.indices.iter().any(|i| (21..29).contains(i)));
        assert!(res.means.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_save_load() {
        let data = raw_data();
        let params = WindowedGpParams::new(8).check().unwrap();
        let model = CalibratedModel::fit(
            &data.slice(s![..30, ..]),
            params,
            CalibrationConfig::default().max_eval(20),
        )
        .unwrap();
        assert!(model.calibration().is_some());

        let path = std::env::temp_dir().join("wingp_test_save_load.json");
        model.save(&path).unwrap();
        let loaded: CalibratedModel = CalibratedModel::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_abs_diff_eq!(
            loaded.hyperparameters().to_array(),
            model.hyperparameters().to_array(),
            epsilon = 1e-12
        );
        assert_eq!(loaded.params().window_size(), 8);
        assert_abs_diff_eq!(
            *loaded.data_normalizer().std(),
            *model.data_normalizer().std(),
            epsilon = 1e-12
        );
        let expected = model.predict(&data).unwrap();
        let actual = loaded.predict(&data).unwrap();
        assert_abs_diff_eq!(expected.means, actual.means, epsilon = 1e-12);
    }
}
