//! Fit Session - caller-owned state for interactive curve fitting
//!
//! An interactive layer (plot with draggable lines, CLI prompt, web form)
//! records the semilog slope and unit-slope intercept it reads off the
//! derivative plot into a `FitSession`. The session hands an immutable
//! [`FitInputs`] snapshot to the estimator; the core never reads back into
//! the interactive layer.
//!
//! ```ignore
//! let mut session = FitSession::new();
//! session.set_slope(50.0);
//! session.set_unit_slope_through(0.01, 2.5, 1e-4);
//! let estimate = session.estimate(&run);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::AnalysisRun;
use crate::types::{FitInputs, ParameterEstimate};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FitSession {
    slope: Option<f64>,
    unit_slope_intercept: Option<f64>,
}

impl FitSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the level m of the flat (radial flow) derivative line.
    pub fn set_slope(&mut self, m: f64) {
        debug!(m, "Semilog slope set");
        self.slope = Some(m);
    }

    /// Record the unit-slope intercept Der at the reference time.
    pub fn set_unit_slope_intercept(&mut self, der: f64) {
        debug!(der, "Unit-slope intercept set");
        self.unit_slope_intercept = Some(der);
    }

    /// Record the unit-slope line passing through `(te, derv)`.
    ///
    /// A unit-slope line on log-log axes is derv ∝ te, so its value at the
    /// reference time is derv·t_ref/te.
    pub fn set_unit_slope_through(&mut self, te: f64, derv: f64, reference_time_hr: f64) {
        if let Some(der) = unit_slope_intercept_at(te, derv, reference_time_hr) {
            self.set_unit_slope_intercept(der);
        }
    }

    /// Forget all fitted values.
    pub fn clear(&mut self) {
        self.slope = None;
        self.unit_slope_intercept = None;
    }

    /// Immutable snapshot of the current fit.
    pub fn inputs(&self) -> FitInputs {
        FitInputs::new(self.slope, self.unit_slope_intercept)
    }

    /// Estimate parameters for `run` from the current fit.
    pub fn estimate(&self, run: &AnalysisRun) -> ParameterEstimate {
        run.estimate(&self.inputs())
    }
}

/// Value at `reference_time_hr` of the unit-slope line through `(te, derv)`.
///
/// `None` for a non-positive `te` or a non-finite result.
pub fn unit_slope_intercept_at(te: f64, derv: f64, reference_time_hr: f64) -> Option<f64> {
    if te <= 0.0 {
        return None;
    }
    let der = derv * reference_time_hr / te;
    der.is_finite().then_some(der)
}
