//! A module for the choice of the squared exponential kernel bandwidth.
//!
//! The bandwidth is either given or derived from training inputs with the median heuristic:
//! the median of the squared euclidean distances between all pairs of training points.
//!
//! The median is taken over the *full* (n, n) distance matrix, zero self-distances
//! on the diagonal included, and not over the upper triangle only. For distinct points
//! this lowers the median compared to the median of positive distances. This convention
//! is kept to reproduce existing results.

use crate::errors::{GpError, Result};
use crate::kernel::{self_sq_distances, KernelMethod};
use linfa::Float;
use log::debug;
use ndarray::{ArrayBase, Data, Ix2};
use std::cmp::Ordering;

/// Policy used to set the bandwidth `sigma2` of the kernel when fitting a GP
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum BandwidthPolicy<F: Float> {
    /// Given bandwidth value
    Fixed(F),
    /// Median of pairwise squared distances between training inputs
    #[default]
    MedianHeuristic,
}

impl<F: Float> BandwidthPolicy<F> {
    /// Get the bandwidth value to be used with `x` training inputs
    pub fn resolve(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<F> {
        match self {
            BandwidthPolicy::Fixed(bandwidth) => {
                if *bandwidth > F::zero() && bandwidth.is_finite() {
                    Ok(*bandwidth)
                } else {
                    Err(GpError::DegenerateBandwidth(format!(
                        "fixed bandwidth should be strictly positive, got {bandwidth}"
                    )))
                }
            }
            BandwidthPolicy::MedianHeuristic => median_heuristic(x),
        }
    }
}

/// Median of squared euclidean distances over all (n x n) pairs of `x` (n, d) points,
/// self-distances included.
///
/// Returns [`GpError::DegenerateBandwidth`] when the median is zero which happens
/// when all points are identical (or at least when more than half of the pairs are
/// made of identical points).
pub fn median_heuristic<F: Float>(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<F> {
    if x.nrows() == 0 {
        return Err(GpError::InvalidValue(
            "bandwidth heuristic requires at least one point".to_string(),
        ));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(GpError::InvalidValue(
            "bandwidth heuristic requires finite point values".to_string(),
        ));
    }
    let mut sq_dists = self_sq_distances(x, KernelMethod::Direct).into_raw_vec();
    sq_dists.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let n = sq_dists.len();
    let median = if n % 2 == 1 {
        sq_dists[n / 2]
    } else {
        (sq_dists[n / 2 - 1] + sq_dists[n / 2]) / F::cast(2.)
    };
    debug!("Median heuristic bandwidth = {median} over {} points", x.nrows());

    if median > F::zero() {
        Ok(median)
    } else {
        Err(GpError::DegenerateBandwidth(format!(
            "median of pairwise squared distances is {median} for {} points (identical inputs?)",
            x.nrows()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_median_over_full_matrix() {
        // full matrix: [0, 1, 9, 1, 0, 4, 9, 4, 0] -> median 1
        // (upper triangle only would give [1, 4, 9] -> 4)
        let x = array![[0.], [1.], [3.]];
        assert_abs_diff_eq!(median_heuristic(&x).unwrap(), 1.);
    }

    #[test]
    fn test_median_even_count() {
        // full matrix: [0, 1, 1, 0] -> (0 + 1) / 2
        let x = array![[0.], [1.]];
        assert_abs_diff_eq!(median_heuristic(&x).unwrap(), 0.5);
    }

    #[test]
    fn test_median_multi_dimensional() {
        let x = array![[-5., 0.], [0., 0.], [5., 0.]];
        assert_abs_diff_eq!(median_heuristic(&x).unwrap(), 25.);
    }

    #[test]
    fn test_identical_points_degenerate() {
        let x = array![[0.], [0.], [0.]];
        assert!(matches!(
            median_heuristic(&x),
            Err(GpError::DegenerateBandwidth(_))
        ));
    }

    #[test]
    fn test_empty_points() {
        let x = ndarray::Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            median_heuristic(&x),
            Err(GpError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_policy() {
        let x = array![[0.], [1.], [3.]];
        assert_eq!(BandwidthPolicy::Fixed(2.).resolve(&x).unwrap(), 2.);
        assert_eq!(BandwidthPolicy::MedianHeuristic.resolve(&x).unwrap(), 1.);
        assert!(matches!(
            BandwidthPolicy::Fixed(0.).resolve(&x),
            Err(GpError::DegenerateBandwidth(_))
        ));
    }
}
