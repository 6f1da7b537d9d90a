use crate::cholesky::CholeskyFactor;
use crate::errors::{check_dim, GpError, Result};
use crate::kernel::{KernelMethod, SquaredExponentialKernel};
use crate::parameters::{GpParams, GpValidParams};
use crate::predictor::{check_variances, BatchPredictor, OnlinePredictor};
use crate::sampling::{sample_multivariate_normal, SamplingMethod};

use linfa::prelude::{DatasetBase, Fit, Float, PredictInplace};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use log::{debug, warn};
use std::fmt;

/// A GP regression is an interpolation method where the interpolated values
/// are modeled by a zero mean Gaussian process governed by a prior covariance kernel.
///
/// Observations are modeled as:
///
/// `y = f(x) + e`
///
/// where:
/// * `f ~ GP(0, k(x, x'))` with the squared exponential kernel `k(x, x') = exp(-|x - x'|^2 / sigma2)`
/// * `e ~ Normal(0, sigma_n^2)` is the observation noise
///
/// Fitting computes once the Cholesky factor `L` of `K + sigma_n^2 I` where `K` is the kernel matrix
/// of training inputs, and the weights `alpha = (K + sigma_n^2 I)^-1 y` obtained by two triangular
/// substitutions. Both are reused by every prediction.
///
/// # Example
///
/// ```no_run
/// use gpr_core::{GaussianProcess, KernelMethod, PosteriorPredictor};
/// use linfa::prelude::*;
/// use ndarray::{arr2, Array, Axis};
///
/// let xt = arr2(&[[-5.0], [0.0], [5.0]]);
/// let yt = xt.column(0).mapv(|v: f64| v.cos());
///
/// let gp = GaussianProcess::<f64>::params()
///     .fixed_bandwidth(1.0)
///     .noise_variance(0.01)
///     .kernel_method(KernelMethod::Vectorized)
///     .fit(&Dataset::new(xt, yt))
///     .expect("GP fitted");
///
/// let xtest = Array::linspace(-6., 6., 100).insert_axis(Axis(1));
/// // all test points at once with full covariance
/// let posterior = gp.batch().posterior(&xtest).expect("GP prediction");
/// // one test point at a time
/// let (mean, var) = gp.online().predict_point(&xtest.row(0)).expect("GP prediction");
/// ```
#[derive(Clone, Debug)]
pub struct GaussianProcess<F: Float> {
    /// Kernel with the bandwidth fitted on training inputs
    kernel: SquaredExponentialKernel<F>,
    /// Cholesky factor of the regularized training kernel matrix
    chol: CholeskyFactor<F>,
    /// Solution of `(K + sigma_n^2 I) alpha = y`
    alpha: Array1<F>,
    /// Training dataset (input, output)
    pub(crate) training_data: (Array2<F>, Array1<F>),
    /// Parameters used to fit this model
    pub(crate) params: GpValidParams<F>,
}

impl<F: Float> fmt::Display for GaussianProcess<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "GP(kernel={}, noise_variance={}, method={}, n_train={})",
            self.kernel,
            self.params.noise_variance,
            self.params.kernel_method,
            self.training_data.0.nrows(),
        )
    }
}

impl<F: Float> GaussianProcess<F> {
    /// Gp parameters contructor
    pub fn params() -> GpParams<F> {
        GpParams::new()
    }

    /// Predictor computing all test points at once with full covariance
    pub fn batch(&self) -> BatchPredictor<'_, F> {
        BatchPredictor(self)
    }

    /// Predictor computing test points one at a time
    pub fn online(&self) -> OnlinePredictor<'_, F> {
        OnlinePredictor(self)
    }

    /// Predict output values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n scalar output values as a vector (n,).
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        let ks = self.cross_kernel(x)?;
        Ok(ks.dot(&self.alpha))
    }

    /// Predict variance values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n variance values as (n,) column vector.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        let ks = self.cross_kernel(x)?;
        self.variances(&ks)
    }

    /// Predict both output values and variances at n given `x` points of nx components
    pub fn predict_valvar(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(Array1<F>, Array1<F>)> {
        let ks = self.cross_kernel(x)?;
        Ok((ks.dot(&self.alpha), self.variances(&ks)?))
    }

    /// Predict posterior covariance matrix (n, n) at n given `x` points of nx components
    pub fn predict_cov(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        Ok(self.mean_and_cov(x)?.1)
    }

    /// Posterior mean `Ks alpha` and covariance `Kss - Ks (K + sigma_n^2 I)^-1 Ks^t`
    /// where the second term is computed as `V^t V` with `L^t V = Ks^t`
    pub(crate) fn mean_and_cov(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(Array1<F>, Array2<F>)> {
        let ks = self.cross_kernel(x)?;
        let mean = ks.dot(&self.alpha);
        let v = self.chol.whiten(&ks.t())?;
        let kss = self.kernel.self_matrix(x, self.params.kernel_method);
        let cov = kss - v.t().dot(&v);
        check_variances(&cov.diag())?;
        Ok((mean, cov))
    }

    /// Variances `1 - |L^-t k*|^2` for each row `k*` of the `ks` cross kernel matrix
    fn variances(&self, ks: &Array2<F>) -> Result<Array1<F>> {
        let v = self.chol.whiten(&ks.t())?;
        let var = v.mapv(|v| v * v).sum_axis(Axis(0)).mapv(|v| F::one() - v);
        check_variances(&var)?;
        Ok(var)
    }

    /// Kernel matrix (n, nt) between `x` (n, nx) test points and training points
    fn cross_kernel(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        check_dim(
            "test point components",
            self.training_data.0.ncols(),
            x.ncols(),
        )?;
        self.kernel
            .matrix(x, &self.training_data.0, self.params.kernel_method)
    }

    /// Log marginal likelihood of training outputs
    /// `-1/2 y^t alpha - 1/2 log|K + sigma_n^2 I| - n/2 log(2 pi)`
    pub fn log_marginal_likelihood(&self) -> F {
        let y = &self.training_data.1;
        let n = F::cast(y.len());
        let two = F::cast(2.);
        -y.dot(&self.alpha) / two
            - self.chol.log_det() / two
            - n * F::cast(std::f64::consts::TAU).ln() / two
    }

    /// Sample the gaussian process posterior at `x` points for `n_traj` trajectories
    /// using the given random generator. Returns a (n, n_traj) matrix.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_traj: usize,
        method: SamplingMethod,
        rng: &mut R,
    ) -> Result<Array2<F>> {
        let (mean, cov) = self.mean_and_cov(x)?;
        sample_multivariate_normal(&mean, &cov, n_traj, method, rng)
    }

    /// Sample the gaussian process posterior at `x` points for `n_traj` trajectories
    /// using a generator seeded with `seed`.
    pub fn sample_with_seed(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_traj: usize,
        method: SamplingMethod,
        seed: u64,
    ) -> Result<Array2<F>> {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        self.sample(x, n_traj, method, &mut rng)
    }

    /// Kernel with fitted bandwidth
    pub fn kernel(&self) -> &SquaredExponentialKernel<F> {
        &self.kernel
    }

    /// Fitted kernel bandwidth `sigma2`
    pub fn bandwidth(&self) -> F {
        self.kernel.bandwidth()
    }

    /// Noise variance `sigma_n^2`
    pub fn noise_variance(&self) -> F {
        self.params.noise_variance
    }

    /// Kernel matrices computation method
    pub fn kernel_method(&self) -> KernelMethod {
        self.params.kernel_method
    }

    /// Cholesky factor of `K + sigma_n^2 I`
    pub fn cholesky(&self) -> &CholeskyFactor<F> {
        &self.chol
    }

    /// Weights `alpha` solving `(K + sigma_n^2 I) alpha = y`
    pub fn alpha(&self) -> &Array1<F> {
        &self.alpha
    }

    /// Training inputs (nt, nx)
    pub fn training_inputs(&self) -> &Array2<F> {
        &self.training_data.0
    }

    /// Training dataset (inputs, outputs)
    pub fn training_data(&self) -> &(Array2<F>, Array1<F>) {
        &self.training_data
    }

    /// Retrieve input and output dimensions
    pub fn dims(&self) -> (usize, usize) {
        (self.training_data.0.ncols(), 1)
    }

    /// Parameters used to fit this model
    pub fn params_used(&self) -> &GpValidParams<F> {
        &self.params
    }
}

impl<F, D> PredictInplace<ArrayBase<D, Ix2>, Array1<F>> for GaussianProcess<F>
where
    F: Float,
    D: Data<Elem = F>,
{
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        let values = self.predict(x).expect("GP Prediction");
        *y = values;
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros((x.nrows(),))
    }
}

/// Gausssian Process adaptator to implement `linfa::Predict` trait for variance prediction.
pub struct GpVariancePredictor<'a, F: Float>(pub &'a GaussianProcess<F>);

impl<F, D> PredictInplace<ArrayBase<D, Ix2>, Array1<F>> for GpVariancePredictor<'_, F>
where
    F: Float,
    D: Data<Elem = F>,
{
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        let values = self.0.predict_var(x).expect("GP Prediction");
        *y = values;
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros(x.nrows())
    }
}

impl<F: Float> GpValidParams<F> {
    /// Fit GP on `x` (nt, nx) training inputs and `y` (nt,) training outputs
    pub fn fit_arrays(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<GaussianProcess<F>> {
        let (nt, nx) = x.dim();
        check_dim("training outputs", nt, y.len())?;
        if nt == 0 {
            return Err(GpError::InvalidValue(
                "GP fit requires at least one training point".to_string(),
            ));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(GpError::InvalidValue(
                "GP training data should be finite".to_string(),
            ));
        }

        let bandwidth = self.bandwidth.resolve(x)?;
        let kernel = SquaredExponentialKernel::new(bandwidth)?;
        let mut k = kernel.self_matrix(x, self.kernel_method);

        if self.noise_variance == F::zero() && has_duplicated_rows(x) {
            warn!(
                "Duplicated training inputs without noise: kernel matrix is singular \
                (set a positive noise variance)"
            );
        }
        k.diag_mut().mapv_inplace(|v| v + self.noise_variance);

        let chol = CholeskyFactor::new(&k)?;
        let alpha = chol.solve_vec(y)?;
        debug!(
            "GP fitted on {nt} points of dim {nx} with bandwidth = {bandwidth}, noise variance = {}",
            self.noise_variance
        );

        Ok(GaussianProcess {
            kernel,
            chol,
            alpha,
            training_data: (x.to_owned(), y.to_owned()),
            params: self.clone(),
        })
    }
}

/// Whether two rows of `x` are exactly equal
fn has_duplicated_rows<F: Float>(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> bool {
    x.rows()
        .into_iter()
        .enumerate()
        .any(|(i, xi)| x.rows().into_iter().skip(i + 1).any(|xj| xi == xj))
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, GpError>
    for GpValidParams<F>
{
    type Object = GaussianProcess<F>;

    /// Fit GP kernel bandwidth, Cholesky factor and weights on training data
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>,
    ) -> Result<Self::Object> {
        self.fit_arrays(dataset.records(), dataset.targets())
    }
}
