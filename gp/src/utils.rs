use crate::errors::{GpError, Result};
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Column-wise standard scaling `(x - mean) / std`.
///
/// Standard deviation is the unbiased estimate, a zero standard deviation is replaced by one
/// so that constant columns are only centered.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub struct Normalizer<F: Float> {
    /// mean vector computed from data
    mean: Array1<F>,
    /// standard deviation vector computed from data
    std: Array1<F>,
}

impl<F: Float> Normalizer<F> {
    /// Fit mean and standard deviation of each column of `x`.
    ///
    /// Rows holding non finite values are left out of the statistics.
    pub fn fit(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Self> {
        let rows: Vec<usize> = x
            .outer_iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(|v| v.is_finite()))
            .map(|(i, _)| i)
            .collect();
        let x = x.select(Axis(0), &rows);
        let mean = x.mean_axis(Axis(0)).ok_or_else(|| {
            GpError::InvalidValueError(
                "Cannot fit a normalizer without any finite row".to_string(),
            )
        })?;
        let ddof = if x.nrows() > 1 { F::one() } else { F::zero() };
        let mut std = x.std_axis(Axis(0), ddof);
        std.mapv_inplace(|v| if v == F::zero() { F::one() } else { v });
        Ok(Normalizer { mean, std })
    }

    /// Mean per column
    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    /// Standard deviation per column
    pub fn std(&self) -> &Array1<F> {
        &self.std
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.mean.len()
    }

    fn check_ncols(&self, ncols: usize) -> Result<()> {
        if ncols != self.ncols() {
            return Err(GpError::InvalidValueError(format!(
                "Normalizer fitted on {} columns, got {}",
                self.ncols(),
                ncols
            )));
        }
        Ok(())
    }

    /// Scale `x` columns
    pub fn transform(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        self.check_ncols(x.ncols())?;
        Ok((x - &self.mean) / &self.std)
    }

    /// Map scaled values back to the original units
    pub fn inverse_transform(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        self.check_ncols(x.ncols())?;
        Ok(x * &self.std + &self.mean)
    }

    /// Map scaled standard deviations back to the original units
    pub fn inverse_transform_std(
        &self,
        std_devs: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<Array2<F>> {
        self.check_ncols(std_devs.ncols())?;
        Ok(std_devs * &self.std)
    }

    /// Normalizer restricted to the given columns
    pub fn select(&self, columns: &[usize]) -> Result<Self> {
        if let Some(c) = columns.iter().find(|&&c| c >= self.ncols()) {
            return Err(GpError::InvalidValueError(format!(
                "Column {} out of range for a normalizer of {} columns",
                c,
                self.ncols()
            )));
        }
        Ok(Normalizer {
            mean: self.mean.select(Axis(0), columns),
            std: self.std.select(Axis(0), columns),
        })
    }

    /// Normalizer restricted to the `n` trailing columns
    pub fn tail(&self, n: usize) -> Result<Self> {
        let ncols = self.ncols();
        if n > ncols {
            return Err(GpError::InvalidValueError(format!(
                "Cannot take {} trailing columns of a normalizer of {} columns",
                n, ncols
            )));
        }
        self.select(&(ncols - n..ncols).collect::<Vec<_>>())
    }
}
