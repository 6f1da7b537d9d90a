//! Solve symmetric positive definite linear systems `M X = Y` with a Cholesky factorization.
//!
//! `M` is factorized once as `M = L^t L` with `L` upper triangular, then each system is solved
//! with two triangular substitutions: forward substitution `L^t W = Y` followed by
//! back substitution `L X = W`. The inverse of `M` is never formed.

use crate::errors::{check_dim, GpError, Result};
use linfa::Float;
use linfa_linalg::cholesky::Cholesky;
use linfa_linalg::triangular::*;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};

/// Upper triangular Cholesky factor `L` of a symmetric positive definite matrix `M = L^t L`
#[derive(Clone, Debug, PartialEq)]
pub struct CholeskyFactor<F: Float> {
    upper: Array2<F>,
}

impl<F: Float> CholeskyFactor<F> {
    /// Factorize the symmetric positive definite matrix `m`.
    ///
    /// Returns [`GpError::Numerical`] when `m` is not positive definite.
    pub fn new(m: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Self> {
        check_dim("square matrix columns", m.nrows(), m.ncols())?;
        if m.nrows() == 0 {
            return Err(GpError::InvalidValue(
                "cannot factorize an empty matrix".to_string(),
            ));
        }
        let lower = m.cholesky().map_err(|err| {
            GpError::Numerical(format!("Cholesky factorization failed: {err}"))
        })?;
        // a zero pivot is not always reported by the factorization itself
        if lower.iter().any(|v| !v.is_finite()) || lower.diag().iter().any(|&v| v <= F::zero())
        {
            return Err(GpError::Numerical(
                "Cholesky factorization failed: matrix is not positive definite".to_string(),
            ));
        }
        Ok(CholeskyFactor {
            upper: lower.reversed_axes(),
        })
    }

    /// Size of the factorized matrix
    pub fn dim(&self) -> usize {
        self.upper.nrows()
    }

    /// Upper triangular factor `L` such that `L^t L = M`
    pub fn upper(&self) -> &Array2<F> {
        &self.upper
    }

    /// Solve `L^t W = Y` by forward substitution
    pub fn whiten(&self, y: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        check_dim("right-hand side rows", self.dim(), y.nrows())?;
        Ok(self.upper.t().solve_triangular(y, UPLO::Lower)?)
    }

    /// Solve `L^t w = y` by forward substitution
    pub fn whiten_vec(&self, y: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<Array1<F>> {
        let w = self.whiten(&y.view().insert_axis(Axis(1)))?;
        Ok(w.remove_axis(Axis(1)))
    }

    /// Solve `M X = Y`
    pub fn solve(&self, y: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        let w = self.whiten(y)?;
        Ok(self.upper.solve_triangular_into(w, UPLO::Upper)?)
    }

    /// Solve `M x = y`
    pub fn solve_vec(&self, y: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<Array1<F>> {
        let x = self.solve(&y.view().insert_axis(Axis(1)))?;
        Ok(x.remove_axis(Axis(1)))
    }

    /// Natural logarithm of the determinant of `M`
    pub fn log_det(&self) -> F {
        self.upper.diag().mapv(|v| v.ln()).sum() * F::cast(2.)
    }
}

/// Solve `M X = Y` for a symmetric positive definite matrix `M`
pub fn cholesky_solve<F: Float>(
    m: &ArrayBase<impl Data<Elem = F>, Ix2>,
    y: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array2<F>> {
    CholeskyFactor::new(m)?.solve(y)
}
