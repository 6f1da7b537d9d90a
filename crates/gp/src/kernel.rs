//! A module for the squared exponential kernel used to model the covariance of the GP.
//!
//! ```text
//!     k(a, b) = exp( - |a - b|^2 / sigma2 )
//! ```
//!
//! where `sigma2` is the bandwidth of the kernel.
//!
//! Squared distances between two point sets can be computed either directly, pair by pair,
//! or in a vectorized way using the expansion `|a - b|^2 = a.a - 2 a.b + b.b` where the cross
//! term is obtained by a single matrix product. Points are first translated by the mean of `a`
//! to limit cancellation on data far from the origin. Both methods give the same values up to
//! floating point rounding.

use crate::errors::{check_dim, GpError, Result};
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix1, Ix2, Zip};
use std::fmt;

/// Strategy used to compute pairwise squared distances
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KernelMethod {
    /// Loop over each pair of points, O(n.m.d)
    Direct,
    /// Expand the squared norm and compute the cross term with one matrix product
    #[default]
    Vectorized,
}

impl fmt::Display for KernelMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KernelMethod::Direct => write!(f, "Direct"),
            KernelMethod::Vectorized => write!(f, "Vectorized"),
        }
    }
}

/// Computes squared euclidean distances between each row of `a` (n, d) and each row of `b` (m, d)
/// resulting in a (n, m) matrix.
pub fn pairwise_sq_distances<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
    method: KernelMethod,
) -> Result<Array2<F>> {
    check_dim("point components", a.ncols(), b.ncols())?;
    let (a, b) = (a.view(), b.view());
    Ok(match method {
        KernelMethod::Direct => direct_sq_distances(a, b),
        KernelMethod::Vectorized => vectorized_sq_distances(a, b),
    })
}

/// Computes squared euclidean distances between each pair of rows of `a` (n, d).
///
/// The result is symmetric with an exactly zero diagonal whatever the method.
pub fn self_sq_distances<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    method: KernelMethod,
) -> Array2<F> {
    let a = a.view();
    let mut d = match method {
        KernelMethod::Direct => direct_sq_distances(a, a),
        KernelMethod::Vectorized => vectorized_sq_distances(a, a),
    };
    let n = d.nrows();
    for i in 0..n {
        d[[i, i]] = F::zero();
        for j in (i + 1)..n {
            d[[j, i]] = d[[i, j]];
        }
    }
    d
}

fn direct_sq_distances<F: Float>(a: ArrayView2<F>, b: ArrayView2<F>) -> Array2<F> {
    let mut d = Array2::zeros((a.nrows(), b.nrows()));
    Zip::from(d.rows_mut())
        .and(a.rows())
        .par_for_each(|d_i, a_i| {
            Zip::from(d_i).and(b.rows()).for_each(|d_ij, b_j| {
                *d_ij = a_i
                    .iter()
                    .zip(b_j.iter())
                    .fold(F::zero(), |acc, (&u, &v)| acc + (u - v) * (u - v));
            });
        });
    d
}

fn vectorized_sq_distances<F: Float>(a: ArrayView2<F>, b: ArrayView2<F>) -> Array2<F> {
    // distances are translation invariant
    let shift = a
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(a.ncols()));
    let (a, b) = (&a - &shift, &b - &shift);
    let a_sq = a.mapv(|v| v * v).sum_axis(Axis(1)).insert_axis(Axis(1));
    let b_sq = b.mapv(|v| v * v).sum_axis(Axis(1)).insert_axis(Axis(0));
    let cross = a.dot(&b.t());
    let mut d = &a_sq + &b_sq - cross.mapv(|v| v + v);
    // cancellation may give tiny negative values
    d.mapv_inplace(|v| if v < F::zero() { F::zero() } else { v });
    d
}

/// Squared exponential kernel `k(a, b) = exp(-|a - b|^2 / sigma2)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SquaredExponentialKernel<F: Float> {
    /// Bandwidth `sigma2` of the kernel (> 0)
    bandwidth: F,
}

impl<F: Float> SquaredExponentialKernel<F> {
    /// Create a squared exponential kernel with the given bandwidth.
    ///
    /// Returns [`GpError::DegenerateBandwidth`] when bandwidth is not strictly positive and finite
    /// as it would lead to a division by zero in kernel evaluations.
    pub fn new(bandwidth: F) -> Result<Self> {
        if bandwidth > F::zero() && bandwidth.is_finite() {
            Ok(Self { bandwidth })
        } else {
            Err(GpError::DegenerateBandwidth(format!(
                "kernel bandwidth should be strictly positive, got {bandwidth}"
            )))
        }
    }

    /// Bandwidth of the kernel
    pub fn bandwidth(&self) -> F {
        self.bandwidth
    }

    /// Kernel value between two points
    pub fn value(
        &self,
        a: &ArrayBase<impl Data<Elem = F>, Ix1>,
        b: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<F> {
        check_dim("point components", a.len(), b.len())?;
        let d = a
            .iter()
            .zip(b.iter())
            .fold(F::zero(), |acc, (&u, &v)| acc + (u - v) * (u - v));
        Ok(self.similarity(d))
    }

    /// Kernel matrix (n, m) between `a` (n, d) and `b` (m, d) points
    pub fn matrix(
        &self,
        a: &ArrayBase<impl Data<Elem = F>, Ix2>,
        b: &ArrayBase<impl Data<Elem = F>, Ix2>,
        method: KernelMethod,
    ) -> Result<Array2<F>> {
        let d = pairwise_sq_distances(a, b, method)?;
        Ok(d.mapv_into(|v| self.similarity(v)))
    }

    /// Symmetric kernel matrix (n, n) of `a` (n, d) points with itself.
    /// The diagonal is exactly one.
    pub fn self_matrix(
        &self,
        a: &ArrayBase<impl Data<Elem = F>, Ix2>,
        method: KernelMethod,
    ) -> Array2<F> {
        self_sq_distances(a, method).mapv_into(|v| self.similarity(v))
    }

    /// Kernel vector (m,) between the point `x` (d,) and `b` (m, d) points
    pub fn vector(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        b: &ArrayBase<impl Data<Elem = F>, Ix2>,
        method: KernelMethod,
    ) -> Result<Array1<F>> {
        let x = x.view().insert_axis(Axis(0));
        let k = self.matrix(&x, b, method)?;
        Ok(k.index_axis_move(Axis(0), 0))
    }

    fn similarity(&self, sq_dist: F) -> F {
        F::exp(-sq_dist / self.bandwidth)
    }
}

impl<F: Float> fmt::Display for SquaredExponentialKernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SquaredExponential(bandwidth={})", self.bandwidth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use paste::paste;
    use rand_xoshiro::Xoshiro256Plus;

    macro_rules! test_self_kernel {
        ($method:ident) => {
            paste! {
                #[test]
                fn [<test_self_kernel_ $method:snake>]() {
                    let mut rng = Xoshiro256Plus::seed_from_u64(42);
                    let x = Array::random_using((12, 3), Uniform::new(-10., 10.), &mut rng);
                    let kernel = SquaredExponentialKernel::new(4.).unwrap();
                    let k = kernel.self_matrix(&x, KernelMethod::$method);

                    assert_eq!(k.dim(), (12, 12));
                    for i in 0..12 {
                        assert_eq!(k[[i, i]], 1.0);
                        for j in 0..12 {
                            assert_eq!(k[[i, j]], k[[j, i]]);
                            assert!(k[[i, j]] > 0. && k[[i, j]] <= 1.);
                        }
                    }
                }

                #[test]
                fn [<test_kernel_values_ $method:snake>]() {
                    let a = array![[0.], [1.], [3.]];
                    let b = array![[0.], [2.]];
                    let kernel = SquaredExponentialKernel::new(2.).unwrap();
                    let k = kernel.matrix(&a, &b, KernelMethod::$method).unwrap();
                    let expected = array![
                        [1., f64::exp(-2.)],
                        [f64::exp(-0.5), f64::exp(-0.5)],
                        [f64::exp(-4.5), f64::exp(-0.5)]
                    ];
                    assert_abs_diff_eq!(expected, k, epsilon = 1e-12);
                }
            }
        };
    }

    test_self_kernel!(Direct);
    test_self_kernel!(Vectorized);

    #[test]
    fn test_direct_vectorized_agree() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let a = Array::random_using((20, 4), Uniform::new(-3., 3.), &mut rng);
        let b = Array::random_using((15, 4), Uniform::new(-3., 3.), &mut rng);
        for bandwidth in [0.1, 1., 25.] {
            let kernel = SquaredExponentialKernel::new(bandwidth).unwrap();
            let kd = kernel.matrix(&a, &b, KernelMethod::Direct).unwrap();
            let kv = kernel.matrix(&a, &b, KernelMethod::Vectorized).unwrap();
            assert_abs_diff_eq!(kd, kv, epsilon = 1e-9);

            let kd = kernel.self_matrix(&a, KernelMethod::Direct);
            let kv = kernel.self_matrix(&a, KernelMethod::Vectorized);
            assert_abs_diff_eq!(kd, kv, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_direct_vectorized_agree_offset_data() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        for offset in [1e2, 1e3, 1e4] {
            let a = Array::random_using((20, 2), Uniform::new(-1., 1.), &mut rng) + offset;
            let b = Array::random_using((15, 2), Uniform::new(-1., 1.), &mut rng) + offset;
            let kernel = SquaredExponentialKernel::new(0.5).unwrap();
            let kd = kernel.matrix(&a, &b, KernelMethod::Direct).unwrap();
            let kv = kernel.matrix(&a, &b, KernelMethod::Vectorized).unwrap();
            assert_abs_diff_eq!(kd, kv, epsilon = 1e-9);

            let kd = kernel.self_matrix(&a, KernelMethod::Direct);
            let kv = kernel.self_matrix(&a, KernelMethod::Vectorized);
            assert_abs_diff_eq!(kd, kv, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_sq_distances() {
        let a = array![[0., 0.], [1., 2.]];
        let b = array![[3., 4.]];
        let d = pairwise_sq_distances(&a, &b, KernelMethod::Direct).unwrap();
        assert_eq!(array![[25.], [8.]], d);
        let d = pairwise_sq_distances(&a, &b, KernelMethod::Vectorized).unwrap();
        assert_abs_diff_eq!(array![[25.], [8.]], d, epsilon = 1e-12);
    }

    #[test]
    fn test_kernel_vector() {
        let xt = array![[-5.], [0.], [5.]];
        let kernel = SquaredExponentialKernel::new(1.).unwrap();
        let k = kernel
            .vector(&array![0.], &xt, KernelMethod::Vectorized)
            .unwrap();
        assert_eq!(k.len(), 3);
        assert_eq!(k[1], 1.);
        assert_abs_diff_eq!(k[0], f64::exp(-25.), epsilon = 1e-15);
        assert_abs_diff_eq!(
            kernel.value(&array![0.], &array![5.]).unwrap(),
            f64::exp(-25.),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = array![[0., 1.]];
        let b = array![[0.]];
        let kernel = SquaredExponentialKernel::new(1.).unwrap();
        assert!(matches!(
            kernel.matrix(&a, &b, KernelMethod::Direct),
            Err(GpError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_degenerate_bandwidth() {
        assert!(matches!(
            SquaredExponentialKernel::new(0.),
            Err(GpError::DegenerateBandwidth(_))
        ));
        assert!(SquaredExponentialKernel::new(-1.).is_err());
        assert!(SquaredExponentialKernel::new(f64::NAN).is_err());
    }
}
