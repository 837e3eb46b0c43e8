//! Pressure Transient Analysis Module
//!
//! Deterministic calculations for well test interpretation.
//! Every stage is a pure transform producing a new immutable artifact:
//!
//! raw samples → windows → prepared series → derivative series → estimate
//!
//! ## Stages
//! - `build_windows()` - draw-down / build-up period selection
//! - `prepare()` - elapsed time, delta pressure, effective time, tp, pwf
//! - `bourdet_derivative()` - smoothed log-time derivative
//! - `estimate_parameters()` - permeability, skin, wellbore storage

pub mod bourdet;
pub mod estimator;
pub mod normalizer;
pub mod search;
pub mod windowing;

pub use bourdet::bourdet_derivative;
pub use estimator::{
    estimate_parameters, flat_band_fit, permeability, skin, wellbore_storage,
};
pub use normalizer::{hours_between, prepare, window_duration_hours};
pub use search::{predecessor, predecessor_index, predecessor_value};
pub use windowing::build_windows;

use tracing::info;

use crate::error::AnalysisResult;
use crate::types::{
    DerivativeSeries, FitInputs, ParameterEstimate, PeriodBoundaries, PreparedParameters,
    PreparedSeries, Sample, TestParameters, WindowedSeries,
};

// ============================================================================
// Pipeline
// ============================================================================

/// Artifacts of one analysis run.
///
/// The prepared series is fixed for a given window; the derivative is
/// recomputed with [`AnalysisRun::with_smoothing`] when L changes.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRun {
    pub windows: WindowedSeries,
    pub prepared: PreparedSeries,
    pub params: PreparedParameters,
    pub derivative: DerivativeSeries,
}

impl AnalysisRun {
    /// Same run with the derivative recomputed at a new smoothing width.
    pub fn with_smoothing(&self, smoothing_l: f64) -> Self {
        let params = PreparedParameters {
            test: self.params.test.with_smoothing(smoothing_l),
            ..self.params.clone()
        };
        Self {
            windows: self.windows.clone(),
            prepared: self.prepared.clone(),
            derivative: bourdet_derivative(&self.prepared, smoothing_l),
            params,
        }
    }

    /// Estimate parameters from externally fitted values.
    pub fn estimate(&self, fit: &FitInputs) -> ParameterEstimate {
        estimate_parameters(&self.params, &self.derivative, fit)
    }
}

/// Window, normalize and differentiate in one call.
pub fn run_analysis(
    samples: &[Sample],
    boundaries: &PeriodBoundaries,
    params: &TestParameters,
) -> AnalysisResult<AnalysisRun> {
    let windows = build_windows(samples, boundaries)?;
    let (prepared, prepared_params) = prepare(&windows, params)?;
    let derivative = bourdet_derivative(&prepared, params.smoothing_l);

    info!(
        test = %params.test_type,
        samples = samples.len(),
        records = prepared.len(),
        defined_derivatives = derivative.defined().count(),
        smoothing_l = params.smoothing_l,
        "Analysis run complete"
    );

    Ok(AnalysisRun {
        windows,
        prepared,
        params: prepared_params,
        derivative,
    })
}
