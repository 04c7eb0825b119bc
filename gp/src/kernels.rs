//! A module for covariance kernels used by the windowed GP posterior.
//!
//! The following kernels are implemented:
//! * squared exponential plus linear (default),
//! * squared exponential.

use crate::parameters::Hyperparameters;
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

/// A trait for using a covariance kernel in windowed GP regression
pub trait Kernel<F: Float>: Clone + Copy + Default + fmt::Display + Sync {
    /// Compute the covariance matrix `k(x1, x2)` (n1 x n2) between rows of `x1` (n1 x d)
    /// and rows of `x2` (n2 x d) given kernel hyperparameters.
    ///
    /// Noise `sigma_y` is not part of the kernel value, it is added by the posterior
    /// computation on the training covariance diagonal.
    fn value(
        &self,
        x1: &ArrayBase<impl Data<Elem = F>, Ix2>,
        x2: &ArrayBase<impl Data<Elem = F>, Ix2>,
        hyperparameters: &Hyperparameters<F>,
    ) -> Array2<F>;
}

/// Squared euclidean distances between rows of `x1` and rows of `x2`
/// computed as `|a|² + |b|² - 2 a.b`, negative rounding residues are clipped to zero.
fn sq_distances<F: Float>(
    x1: &ArrayBase<impl Data<Elem = F>, Ix2>,
    x2: &ArrayBase<impl Data<Elem = F>, Ix2>,
    dot: &Array2<F>,
) -> Array2<F> {
    let n1: Array1<F> = x1.map_axis(Axis(1), |r| r.dot(&r));
    let n2: Array1<F> = x2.map_axis(Axis(1), |r| r.dot(&r));
    Array2::from_shape_fn((x1.nrows(), x2.nrows()), |(i, j)| {
        let d = n1[i] + n2[j] - F::cast(2.) * dot[[i, j]];
        if d > F::zero() {
            d
        } else {
            F::zero()
        }
    })
}

fn squared_exponential<F: Float>(sqdist: Array2<F>, hyperparameters: &Hyperparameters<F>) -> Array2<F> {
    let ls = hyperparameters.length_scale();
    let sf2 = hyperparameters.sigma_f() * hyperparameters.sigma_f();
    let coef = F::cast(-0.5) / (ls * ls);
    sqdist.mapv_into(|d| sf2 * F::exp(coef * d))
}

/// Squared exponential plus linear kernel
///
/// `k(a, b) = sigma_f² exp(-|a - b|² / (2 length_scale²)) + a.b`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(into = "String"),
    serde(try_from = "String")
)]
pub struct SquaredExponentialLinearKernel();

impl From<SquaredExponentialLinearKernel> for String {
    fn from(_item: SquaredExponentialLinearKernel) -> String {
        "SquaredExponentialLinear".to_string()
    }
}

impl TryFrom<String> for SquaredExponentialLinearKernel {
    type Error = &'static str;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s == "SquaredExponentialLinear" {
            Ok(Self::default())
        } else {
            Err("Bad string value for SquaredExponentialLinearKernel, should be \'SquaredExponentialLinear\'")
        }
    }
}

impl<F: Float> Kernel<F> for SquaredExponentialLinearKernel {
    fn value(
        &self,
        x1: &ArrayBase<impl Data<Elem = F>, Ix2>,
        x2: &ArrayBase<impl Data<Elem = F>, Ix2>,
        hyperparameters: &Hyperparameters<F>,
    ) -> Array2<F> {
        let dot = x1.dot(&x2.t());
        let sqdist = sq_distances(x1, x2, &dot);
        squared_exponential(sqdist, hyperparameters) + dot
    }
}

impl fmt::Display for SquaredExponentialLinearKernel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SquaredExponentialLinear")
    }
}

/// Squared exponential kernel
///
/// `k(a, b) = sigma_f² exp(-|a - b|² / (2 length_scale²))`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(into = "String"),
    serde(try_from = "String")
)]
pub struct SquaredExponentialKernel();

impl From<SquaredExponentialKernel> for String {
    fn from(_item: SquaredExponentialKernel) -> String {
        "SquaredExponential".to_string()
    }
}

impl TryFrom<String> for SquaredExponentialKernel {
    type Error = &'static str;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s == "SquaredExponential" {
            Ok(Self::default())
        } else {
            Err("Bad string value for SquaredExponentialKernel, should be \'SquaredExponential\'")
        }
    }
}

impl<F: Float> Kernel<F> for SquaredExponentialKernel {
    fn value(
        &self,
        x1: &ArrayBase<impl Data<Elem = F>, Ix2>,
        x2: &ArrayBase<impl Data<Elem = F>, Ix2>,
        hyperparameters: &Hyperparameters<F>,
    ) -> Array2<F> {
        let dot = x1.dot(&x2.t());
        squared_exponential(sq_distances(x1, x2, &dot), hyperparameters)
    }
}

impl fmt::Display for SquaredExponentialKernel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SquaredExponential")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use paste::paste;

    #[test]
    fn test_squared_exponential_linear_values() {
        let a = array![[1., 0.], [0., 2.]];
        let b = array![[1., 1.]];
        let hp = Hyperparameters::new(0.5, 2., 0.1);
        let k = SquaredExponentialLinearKernel::default().value(&a, &b, &hp);
        // |a0 - b|² = 1, |a1 - b|² = 2
        let expected = array![
            [4. * f64::exp(-0.5 * 1. / 0.25) + 1.],
            [4. * f64::exp(-0.5 * 2. / 0.25) + 2.]
        ];
        assert_abs_diff_eq!(k, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_squared_exponential_values() {
        let a = array![[0.], [1.], [3.]];
        let hp = Hyperparameters::new(1., 1., 0.1);
        let k = SquaredExponentialKernel::default().value(&a, &a, &hp);
        let expected = array![
            [1., f64::exp(-0.5), f64::exp(-4.5)],
            [f64::exp(-0.5), 1., f64::exp(-2.)],
            [f64::exp(-4.5), f64::exp(-2.), 1.]
        ];
        assert_abs_diff_eq!(k, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_sq_distances_clipped() {
        let a = array![[1e8, 1e8 + 1.]];
        let dot = a.dot(&a.t());
        let d = sq_distances(&a, &a, &dot);
        assert!(d[[0, 0]] >= 0.);
    }

    #[test]
    fn test_kernel_display() {
        assert_eq!(
            SquaredExponentialLinearKernel::default().to_string(),
            "SquaredExponentialLinear"
        );
        assert_eq!(
            SquaredExponentialKernel::default().to_string(),
            "SquaredExponential"
        );
    }

    macro_rules! test_kernel {
        ($kernel:ident, $linear:expr) => {
            paste! {
                #[test]
                fn [<test_ $kernel:snake _symmetry_and_diagonal>]() {
                    let x = array![
                        [0.2, -1.3, 0.5],
                        [1.1, 0.4, -0.7],
                        [-0.6, 2.2, 0.1],
                        [0.0, 0.0, 0.0],
                    ];
                    let hp = Hyperparameters::new(0.7, 1.5, 0.1);
                    let k = $kernel::default().value(&x, &x, &hp);
                    assert_eq!(k.dim(), (4, 4));
                    assert_abs_diff_eq!(k, k.t(), epsilon = 1e-12);
                    for (i, row) in x.outer_iter().enumerate() {
                        let lin = if $linear { row.dot(&row) } else { 0. };
                        assert_abs_diff_eq!(k[[i, i]], 1.5 * 1.5 + lin, epsilon = 1e-12);
                    }
                }
            }
        };
    }

    test_kernel!(SquaredExponentialLinearKernel, true);
    test_kernel!(SquaredExponentialKernel, false);

    #[cfg(feature = "serializable")]
    #[test]
    fn test_kernel_serde() {
        let s = serde_json::to_string(&SquaredExponentialLinearKernel::default()).unwrap();
        assert_eq!(s, "\"SquaredExponentialLinear\"");
        let k: SquaredExponentialLinearKernel = serde_json::from_str(&s).unwrap();
        assert_eq!(k, SquaredExponentialLinearKernel::default());
        assert!(serde_json::from_str::<SquaredExponentialKernel>(&s).is_err());
    }
}
