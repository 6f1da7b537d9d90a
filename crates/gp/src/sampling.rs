//! Draw trajectories from a multivariate normal distribution `N(mean, cov)`.
//!
//! Trajectories are computed as `mean + C z` where `z ~ N(0, I)` and `C C^t = cov`.
//! The random generator is always given by the caller.

use crate::cholesky::CholeskyFactor;
use crate::errors::{check_dim, Result};
use linfa::Float;
use linfa_linalg::eigh::EighInto;
use ndarray::{Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;

/// Jitter added to the covariance diagonal before Cholesky decomposition
pub const SAMPLING_JITTER: f64 = 1e-10;
/// Eigenvalues below this threshold are considered as zero
pub const EIGENVALUE_THRESHOLD: f64 = 1e-9;

/// Decomposition used to get `C` such that `C C^t = cov`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SamplingMethod {
    /// Cholesky decomposition of `cov + jitter I`
    Cholesky,
    /// Eigen decomposition, better suited to ill-conditioned covariance matrices
    #[default]
    EigenValues,
}

/// Sample `n_traj` trajectories of the multivariate normal distribution
/// with given `mean` (n,) and `cov` (n, n). Returns a (n, n_traj) matrix.
pub fn sample_multivariate_normal<F: Float, R: Rng + ?Sized>(
    mean: &ArrayBase<impl Data<Elem = F>, Ix1>,
    cov: &ArrayBase<impl Data<Elem = F>, Ix2>,
    n_traj: usize,
    method: SamplingMethod,
    rng: &mut R,
) -> Result<Array2<F>> {
    let n = mean.len();
    check_dim("covariance rows", n, cov.nrows())?;
    check_dim("covariance columns", n, cov.ncols())?;

    let c = match method {
        SamplingMethod::Cholesky => {
            let jittered = cov.to_owned() + Array2::eye(n) * F::cast(SAMPLING_JITTER);
            CholeskyFactor::new(&jittered)?.upper().t().to_owned()
        }
        SamplingMethod::EigenValues => {
            let (vals, vecs) = cov.to_owned().eigh_into()?;
            let sqrt_vals = vals.mapv(|v| {
                if v < F::cast(EIGENVALUE_THRESHOLD) {
                    F::zero()
                } else {
                    v.sqrt()
                }
            });
            vecs * &sqrt_vals
        }
    };
    let z = Array2::<f64>::random_using((n, n_traj), StandardNormal, rng).mapv(F::cast);
    Ok(mean.to_owned().insert_axis(Axis(1)) + c.dot(&z))
}
