//! This library implements [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process) regression
//! with a squared exponential kernel `k(x, x') = exp(-|x - x'|^2 / sigma2)`.
//!
//! The regression is built from the following pieces:
//! * [kernel] matrices between point sets computed either directly or in a vectorized way,
//! * a [bandwidth] heuristic deriving `sigma2` from training inputs,
//! * a [cholesky] solver using triangular substitutions instead of matrix inversion,
//! * [predictor]s giving the posterior mean and (co)variance either for all test points
//!   at once ([BatchPredictor]) or one test point at a time ([OnlinePredictor]).
//!
//! GP models are implemented by [GaussianProcess] parameterized by [GpParams].
//!
//! ```no_run
//! use gpr_core::{GaussianProcess, PosteriorPredictor};
//! use linfa::prelude::*;
//! use ndarray::{arr1, arr2};
//!
//! let xt = arr2(&[[-5.0], [0.0], [5.0]]);
//! let yt = arr1(&[1.0, -1.0, 1.0]);
//! let gp = GaussianProcess::<f64>::params()
//!     .fixed_bandwidth(1.0)
//!     .noise_variance(0.01)
//!     .fit(&Dataset::new(xt, yt))
//!     .expect("GP fitted");
//! let posterior = gp.online().posterior(&arr2(&[[0.0], [100.0]])).expect("GP prediction");
//! println!("mean = {}, variance = {}", posterior.mean, posterior.variances());
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
pub mod bandwidth;
pub mod cholesky;
mod errors;
pub mod kernel;
mod parameters;
pub mod predictor;
pub mod sampling;

pub use algorithm::*;
pub use bandwidth::{median_heuristic, BandwidthPolicy};
pub use cholesky::{cholesky_solve, CholeskyFactor};
pub use errors::*;
pub use kernel::{KernelMethod, SquaredExponentialKernel};
pub use parameters::*;
pub use predictor::{
    BatchPredictor, Covariance, OnlinePredictor, Posterior, PosteriorPredictor,
    NEGATIVE_VARIANCE_TOLERANCE,
};
pub use sampling::{sample_multivariate_normal, SamplingMethod};
