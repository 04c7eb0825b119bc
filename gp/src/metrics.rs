//! Prediction quality metrics computed per target column.

use crate::errors::{GpError, Result};
use linfa::Float;
use ndarray::{Array1, ArrayBase, ArrayView1, Data, Ix2, Zip};
use ndarray_stats::{errors::MultiInputError, DeviationExt};

fn check_shapes<F: Float>(
    predicted: &ArrayBase<impl Data<Elem = F>, Ix2>,
    actual: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<()> {
    if predicted.dim() != actual.dim() {
        return Err(GpError::InvalidValueError(format!(
            "Predicted and actual shapes differ: {:?} vs {:?}",
            predicted.dim(),
            actual.dim()
        )));
    }
    if predicted.nrows() == 0 {
        return Err(GpError::InvalidValueError(
            "Metrics need at least one row".to_string(),
        ));
    }
    Ok(())
}

fn to_f64<F: Float>(column: ArrayView1<F>) -> Array1<f64> {
    column.mapv(|v| v.to_f64().unwrap_or(f64::NAN))
}

fn per_column<F: Float>(
    predicted: &ArrayBase<impl Data<Elem = F>, Ix2>,
    actual: &ArrayBase<impl Data<Elem = F>, Ix2>,
    metric: impl Fn(&Array1<f64>, &Array1<f64>) -> std::result::Result<f64, MultiInputError>,
) -> Result<Array1<F>> {
    check_shapes(predicted, actual)?;
    predicted
        .columns()
        .into_iter()
        .zip(actual.columns())
        .map(|(p, a)| {
            metric(&to_f64(p), &to_f64(a))
                .map(F::cast)
                .map_err(|e| GpError::InvalidValueError(e.to_string()))
        })
        .collect::<Result<Vec<F>>>()
        .map(Array1::from)
}

/// Root mean squared error of each target column
pub fn rmse<F: Float>(
    predicted: &ArrayBase<impl Data<Elem = F>, Ix2>,
    actual: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array1<F>> {
    per_column(predicted, actual, |p, a| p.root_mean_sq_err(a))
}

/// Mean absolute error of each target column
pub fn mae<F: Float>(
    predicted: &ArrayBase<impl Data<Elem = F>, Ix2>,
    actual: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array1<F>> {
    per_column(predicted, actual, |p, a| p.mean_abs_err(a))
}

/// Sum of squared errors over all cells
pub fn sse<F: Float>(
    predicted: &ArrayBase<impl Data<Elem = F>, Ix2>,
    actual: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<F> {
    check_shapes(predicted, actual)?;
    Ok(Zip::from(predicted)
        .and(actual)
        .fold(F::zero(), |acc, &p, &a| acc + (p - a) * (p - a)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_metrics() {
        let predicted = array![[1., 0.], [2., 0.], [3., 4.]];
        let actual = array![[1., 0.], [4., 0.], [3., 0.]];
        assert_abs_diff_eq!(
            rmse(&predicted, &actual).unwrap(),
            array![(4f64 / 3.).sqrt(), (16f64 / 3.).sqrt()],
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            mae(&predicted, &actual).unwrap(),
            array![2. / 3., 4. / 3.],
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(sse(&predicted, &actual).unwrap(), 20.);
        assert_abs_diff_eq!(sse(&actual, &actual).unwrap(), 0.);
    }

    #[test]
    fn test_metrics_shape_mismatch() {
        let predicted = array![[1.], [2.]];
        let actual = array![[1., 0.], [4., 0.]];
        assert!(matches!(
            rmse(&predicted, &actual),
            Err(GpError::InvalidValueError(_))
        ));
        assert!(sse(&predicted, &actual).is_err());
    }
}
