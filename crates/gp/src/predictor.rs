//! Posterior predictors of a fitted [`GaussianProcess`].
//!
//! Two strategies are available which give the same results up to floating point rounding:
//! * [`BatchPredictor`] processes all test points at once and returns the full posterior covariance,
//! * [`OnlinePredictor`] processes test points one at a time reusing the training Cholesky factor
//!   and returns posterior variances.

use crate::algorithm::GaussianProcess;
use crate::errors::{check_dim, GpError, Result};
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Data, Ix1, Ix2};
use ndarray_stats::errors::MinMaxError;
use ndarray_stats::QuantileExt;

/// Tolerance under which a negative posterior variance is considered as a numerical error
pub const NEGATIVE_VARIANCE_TOLERANCE: f64 = 1e-9;

/// Posterior (co)variance at test points
#[derive(Clone, Debug, PartialEq)]
pub enum Covariance<F: Float> {
    /// Full (n, n) covariance matrix
    Full(Array2<F>),
    /// Variances only (n,)
    Diagonal(Array1<F>),
}

impl<F: Float> Covariance<F> {
    /// Posterior variances, ie the diagonal of the covariance
    pub fn variances(&self) -> Array1<F> {
        match self {
            Covariance::Full(cov) => cov.diag().to_owned(),
            Covariance::Diagonal(var) => var.to_owned(),
        }
    }
}

/// Posterior mean and (co)variance of the GP at test points
#[derive(Clone, Debug, PartialEq)]
pub struct Posterior<F: Float> {
    /// Posterior mean (n,)
    pub mean: Array1<F>,
    /// Posterior (co)variance
    pub covariance: Covariance<F>,
}

impl<F: Float> Posterior<F> {
    /// Posterior variances (n,)
    pub fn variances(&self) -> Array1<F> {
        self.covariance.variances()
    }
}

/// A trait for GP posterior prediction strategies
pub trait PosteriorPredictor<F: Float> {
    /// Posterior mean and (co)variance at `x` test points given as a (n, nx) matrix
    fn posterior(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Posterior<F>>;
}

/// Predictor computing posterior mean and full covariance for all test points at once
#[derive(Clone, Copy, Debug)]
pub struct BatchPredictor<'a, F: Float>(pub(crate) &'a GaussianProcess<F>);

impl<F: Float> PosteriorPredictor<F> for BatchPredictor<'_, F> {
    fn posterior(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Posterior<F>> {
        let (mean, cov) = self.0.mean_and_cov(x)?;
        Ok(Posterior {
            mean,
            covariance: Covariance::Full(cov),
        })
    }
}

/// Predictor processing test points one at a time
#[derive(Clone, Copy, Debug)]
pub struct OnlinePredictor<'a, F: Float>(pub(crate) &'a GaussianProcess<F>);

impl<'a, F: Float> OnlinePredictor<'a, F> {
    /// Posterior mean and variance at a single test point `x` (nx,)
    ///
    /// With `k*` the kernel vector between `x` and training points:
    /// * mean = `k*^t alpha`
    /// * variance = `1 - |L^-t k*|^2` as `k(x, x) = 1`
    pub fn predict_point(&self, x: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<(F, F)> {
        let gp = self.0;
        let xt = gp.training_inputs();
        check_dim("test point components", xt.ncols(), x.len())?;
        let kstar = gp.kernel().vector(x, xt, gp.kernel_method())?;
        let mean = kstar.dot(gp.alpha());
        let w = gp.cholesky().whiten_vec(&kstar)?;
        let var = F::one() - w.dot(&w);
        check_variance(var)?;
        Ok((mean, var))
    }

    /// Stream posterior (mean, variance) at each row of `x`
    pub fn iter(&self, x: ArrayView2<'a, F>) -> impl Iterator<Item = Result<(F, F)>> + 'a {
        let predictor = *self;
        (0..x.nrows()).map(move |i| predictor.predict_point(&x.row(i)))
    }
}

impl<F: Float> PosteriorPredictor<F> for OnlinePredictor<'_, F> {
    fn posterior(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Posterior<F>> {
        check_dim(
            "test point components",
            self.0.training_inputs().ncols(),
            x.ncols(),
        )?;
        let mut mean = Array1::zeros(x.nrows());
        let mut var = Array1::zeros(x.nrows());
        for (i, x_i) in x.rows().into_iter().enumerate() {
            (mean[i], var[i]) = self.predict_point(&x_i)?;
        }
        Ok(Posterior {
            mean,
            covariance: Covariance::Diagonal(var),
        })
    }
}

/// Check variance is non negative up to [`NEGATIVE_VARIANCE_TOLERANCE`]
pub(crate) fn check_variance<F: Float>(var: F) -> Result<()> {
    if var.is_nan() || var < -F::cast(NEGATIVE_VARIANCE_TOLERANCE) {
        Err(GpError::Numerical(format!(
            "negative posterior variance {var} beyond tolerance {NEGATIVE_VARIANCE_TOLERANCE}"
        )))
    } else {
        Ok(())
    }
}

/// Check all variances are non negative up to [`NEGATIVE_VARIANCE_TOLERANCE`]
pub(crate) fn check_variances<F: Float>(var: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<()> {
    match var.min() {
        Ok(&min) => check_variance(min),
        Err(MinMaxError::EmptyInput) => Ok(()),
        Err(MinMaxError::UndefinedOrder) => Err(GpError::Numerical(
            "undefined posterior variance (NaN)".to_string(),
        )),
    }
}
