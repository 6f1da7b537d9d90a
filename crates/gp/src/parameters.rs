use crate::bandwidth::BandwidthPolicy;
use crate::errors::{GpError, Result};
use crate::kernel::KernelMethod;
use linfa::{Float, ParamGuard};

/// Default noise variance added to the diagonal of the training kernel matrix
pub const GP_DEFAULT_NOISE_VARIANCE: f64 = 1e-2;

/// A set of validated GP parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct GpValidParams<F: Float> {
    /// Variance of the observation noise `sigma_n^2`
    pub(crate) noise_variance: F,
    /// How the kernel bandwidth `sigma^2` is set
    pub(crate) bandwidth: BandwidthPolicy<F>,
    /// How kernel matrices are computed
    pub(crate) kernel_method: KernelMethod,
}

impl<F: Float> Default for GpValidParams<F> {
    fn default() -> GpValidParams<F> {
        GpValidParams {
            noise_variance: F::cast(GP_DEFAULT_NOISE_VARIANCE),
            bandwidth: BandwidthPolicy::default(),
            kernel_method: KernelMethod::default(),
        }
    }
}

impl<F: Float> GpValidParams<F> {
    /// Get noise variance
    pub fn noise_variance(&self) -> F {
        self.noise_variance
    }

    /// Get bandwidth policy
    pub fn bandwidth(&self) -> &BandwidthPolicy<F> {
        &self.bandwidth
    }

    /// Get kernel computation method
    pub fn kernel_method(&self) -> KernelMethod {
        self.kernel_method
    }
}

#[derive(Clone, Debug, Default)]
/// The set of hyperparameters that can be specified for the execution of
/// the [GP algorithm](struct.GaussianProcess.html).
pub struct GpParams<F: Float>(GpValidParams<F>);

impl<F: Float> GpParams<F> {
    /// A constructor for GP parameters with default values
    pub fn new() -> GpParams<F> {
        Self(GpValidParams::default())
    }

    /// A constructor for GP parameters from validated parameters
    pub fn new_from_valid(params: &GpValidParams<F>) -> Self {
        Self(params.clone())
    }

    /// Set the noise variance `sigma_n^2` (>= 0).
    ///
    /// A zero noise variance makes the GP interpolate training outputs
    /// and fitting fails when training inputs are duplicated.
    pub fn noise_variance(mut self, noise_variance: F) -> Self {
        self.0.noise_variance = noise_variance;
        self
    }

    /// Set the kernel bandwidth policy
    pub fn bandwidth(mut self, bandwidth: BandwidthPolicy<F>) -> Self {
        self.0.bandwidth = bandwidth;
        self
    }

    /// Set a constant kernel bandwidth
    pub fn fixed_bandwidth(mut self, bandwidth: F) -> Self {
        self.0.bandwidth = BandwidthPolicy::Fixed(bandwidth);
        self
    }

    /// Set the kernel matrices computation method
    pub fn kernel_method(mut self, kernel_method: KernelMethod) -> Self {
        self.0.kernel_method = kernel_method;
        self
    }
}

impl<F: Float> From<GpValidParams<F>> for GpParams<F> {
    fn from(valid: GpValidParams<F>) -> Self {
        GpParams(valid)
    }
}

impl<F: Float> ParamGuard for GpParams<F> {
    type Checked = GpValidParams<F>;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let noise = self.0.noise_variance;
        if !noise.is_finite() || noise < F::zero() {
            return Err(GpError::InvalidValue(format!(
                "`noise_variance` should be positive or zero, got {noise}"
            )));
        }
        if let BandwidthPolicy::Fixed(bandwidth) = self.0.bandwidth {
            if !bandwidth.is_finite() || bandwidth <= F::zero() {
                return Err(GpError::DegenerateBandwidth(format!(
                    "fixed bandwidth should be strictly positive, got {bandwidth}"
                )));
            }
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
