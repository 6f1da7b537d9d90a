use thiserror::Error;

/// A result type for GP regression algorithm
pub type Result<T> = std::result::Result<T, GpError>;

/// An error when fitting or using a [`GaussianProcess`](crate::GaussianProcess)
#[derive(Error, Debug)]
pub enum GpError {
    /// When the bandwidth of the kernel is zero or negative (ie all training inputs identical)
    #[error("Degenerate bandwidth: {0}")]
    DegenerateBandwidth(String),
    /// When the regularized kernel matrix is not positive definite
    /// or when a prediction shows a negative variance beyond tolerance
    #[error("Numerical error: {0}")]
    Numerical(String),
    /// When shapes of inputs do not agree
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Name of the mismatching quantity
        what: &'static str,
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },
    /// When error due to a bad value
    #[error("InvalidValue error: {0}")]
    InvalidValue(String),
    /// When a linfa error occurs
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
}

impl From<linfa_linalg::LinalgError> for GpError {
    fn from(err: linfa_linalg::LinalgError) -> GpError {
        GpError::Numerical(err.to_string())
    }
}

/// Check that `x` points have `expected` components.
pub(crate) fn check_dim(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        Err(GpError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    } else {
        Ok(())
    }
}
