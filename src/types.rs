//! Shared data structures for pressure transient analysis
//!
//! This module defines the records that flow through the analysis pipeline:
//! - Stage 1: Sample, PeriodBoundaries (raw gauge data + selected periods)
//! - Stage 2: PreparedSeries (elapsed time, delta pressure, effective time)
//! - Stage 3: DerivativeSeries (Bourdet derivative aligned with stage 2)
//! - Stage 4: FitInputs, ParameterEstimate (externally fitted values → k, s, C)

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::{EstimatorConfig, ReservoirConfig, WellConfig};
use crate::error::AnalysisError;

// ============================================================================
// Stage 1: Raw Gauge Data
// ============================================================================

/// A single gauge reading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    /// Gauge timestamp
    pub timestamp: NaiveDateTime,
    /// Bottom-hole pressure (psi)
    pub pressure: f64,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, pressure: f64) -> Self {
        Self { timestamp, pressure }
    }
}

/// Boundaries of the draw-down and build-up periods.
///
/// Draw-down is `[dd_start, dd_end]`, build-up is `[dd_end, bu_end]`; both
/// inclusive, so the shut-in sample belongs to both windows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodBoundaries {
    pub dd_start: NaiveDateTime,
    pub dd_end: NaiveDateTime,
    pub bu_end: NaiveDateTime,
}

impl PeriodBoundaries {
    /// Build boundaries, rejecting sets that are not monotonically non-decreasing.
    pub fn new(
        dd_start: NaiveDateTime,
        dd_end: NaiveDateTime,
        bu_end: NaiveDateTime,
    ) -> Result<Self, AnalysisError> {
        let boundaries = Self { dd_start, dd_end, bu_end };
        boundaries.validate()?;
        Ok(boundaries)
    }

    /// Build boundaries from sample indices into `samples`.
    ///
    /// Interactive pickers usually work in sample-index space; this maps
    /// the picked indices back onto timestamps.
    pub fn from_indices(
        samples: &[Sample],
        dd_start: usize,
        dd_end: usize,
        bu_end: usize,
    ) -> Result<Self, AnalysisError> {
        let lookup = |idx: usize, name: &str| {
            samples
                .get(idx)
                .map(|s| s.timestamp)
                .ok_or_else(|| AnalysisError::InvalidWindow {
                    reason: format!(
                        "{name} index {idx} is out of range for {} samples",
                        samples.len()
                    ),
                })
        };
        Self::new(
            lookup(dd_start, "dd_start")?,
            lookup(dd_end, "dd_end")?,
            lookup(bu_end, "bu_end")?,
        )
    }

    /// Check `dd_start ≤ dd_end ≤ bu_end`.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.dd_start > self.dd_end {
            return Err(AnalysisError::InvalidWindow {
                reason: format!(
                    "dd_start ({}) is after dd_end ({})",
                    self.dd_start, self.dd_end
                ),
            });
        }
        if self.dd_end > self.bu_end {
            return Err(AnalysisError::InvalidWindow {
                reason: format!(
                    "dd_end ({}) is after bu_end ({})",
                    self.dd_end, self.bu_end
                ),
            });
        }
        Ok(())
    }
}

/// Draw-down and build-up sub-series cut from the raw gauge record.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedSeries {
    pub drawdown: Vec<Sample>,
    pub buildup: Vec<Sample>,
}

// ============================================================================
// Test Type & Parameters
// ============================================================================

/// Which flow period is being analysed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    /// Shut-in period following the draw-down
    #[default]
    Buildup,
    /// Constant-rate flow period
    Drawdown,
}

impl TestType {
    /// Short code for logging
    pub fn short_code(&self) -> &'static str {
        match self {
            TestType::Buildup => "BU",
            TestType::Drawdown => "DD",
        }
    }
}

impl std::fmt::Display for TestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestType::Buildup => write!(f, "Build-up"),
            TestType::Drawdown => write!(f, "Draw-down"),
        }
    }
}

impl std::str::FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bu" | "buildup" | "build-up" => Ok(TestType::Buildup),
            "dd" | "drawdown" | "draw-down" => Ok(TestType::Drawdown),
            other => Err(format!(
                "unknown test type '{other}' (expected 'buildup' or 'drawdown')"
            )),
        }
    }
}

/// Immutable parameter bag for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestParameters {
    /// Physical constants of the well and reservoir
    pub reservoir: ReservoirConfig,
    /// Analysed flow period
    pub test_type: TestType,
    /// Bourdet smoothing half-width L (natural-log cycles)
    pub smoothing_l: f64,
    /// Relative half-width of the band around m used for draw-down skin fitting
    pub flat_band_fraction: f64,
    /// Closed-form estimator constants
    pub estimator: EstimatorConfig,
}

impl TestParameters {
    pub fn from_config(config: &WellConfig) -> Self {
        Self {
            reservoir: config.reservoir.clone(),
            test_type: config.analysis.test_type,
            smoothing_l: config.analysis.smoothing_l,
            flat_band_fraction: config.analysis.flat_band_fraction,
            estimator: config.estimator.clone(),
        }
    }

    /// Same parameters with a different test type.
    pub fn with_test_type(&self, test_type: TestType) -> Self {
        Self { test_type, ..self.clone() }
    }

    /// Same parameters with a different smoothing width.
    pub fn with_smoothing(&self, smoothing_l: f64) -> Self {
        Self { smoothing_l, ..self.clone() }
    }
}

impl Default for TestParameters {
    fn default() -> Self {
        Self::from_config(&WellConfig::default())
    }
}

/// Test parameters extended with the scalars derived during preparation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreparedParameters {
    #[serde(flatten)]
    pub test: TestParameters,
    /// Prior flow (draw-down) duration tp, hours
    pub tp: f64,
    /// Build-up duration, hours
    pub buildup_duration: f64,
    /// Initial flowing pressure pwf, psi
    pub pwf: f64,
}

// ============================================================================
// Stage 2: Prepared Series
// ============================================================================

/// One normalized record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PreparedRecord {
    /// Elapsed hours since the window's first sample
    pub t: f64,
    /// Raw pressure (psi)
    pub p: f64,
    /// Delta pressure relative to flow initiation (psi)
    pub dp: f64,
    /// Effective (superposition) time, hours
    pub te: f64,
}

/// Normalized series, ordered by strictly increasing `t`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PreparedSeries {
    pub records: Vec<PreparedRecord>,
}

impl PreparedSeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Largest elapsed time in the series (0 for an empty series)
    pub fn max_t(&self) -> f64 {
        self.records.iter().map(|r| r.t).fold(0.0, f64::max)
    }
}

// ============================================================================
// Stage 3: Derivative Series
// ============================================================================

/// One derivative record, aligned with the prepared record of the same index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DerivativeRecord {
    pub t: f64,
    pub p: f64,
    pub dp: f64,
    /// Bourdet derivative t·d(Δp)/dt; `None` where undefined or trimmed
    pub derv: Option<f64>,
}

/// Bourdet derivative of a prepared series.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DerivativeSeries {
    /// Smoothing half-width the series was computed with
    pub smoothing_l: f64,
    pub records: Vec<DerivativeRecord>,
}

impl DerivativeSeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with a defined derivative
    pub fn defined(&self) -> impl Iterator<Item = (&DerivativeRecord, f64)> {
        self.records
            .iter()
            .filter_map(|r| r.derv.map(|d| (r, d)))
    }
}

// ============================================================================
// Stage 4: Fit Inputs & Estimates
// ============================================================================

/// Values read off the diagnostic plot by an external fitting step.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct FitInputs {
    /// Semilog slope m: level of the flat (radial flow) derivative line
    pub slope: Option<f64>,
    /// Der: unit-slope line value at the configured reference time
    pub unit_slope_intercept: Option<f64>,
}

impl FitInputs {
    pub fn new(slope: Option<f64>, unit_slope_intercept: Option<f64>) -> Self {
        Self { slope, unit_slope_intercept }
    }
}

/// A single estimated quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Estimate {
    Estimated { value: f64 },
    NotEstimated { reason: String },
}

impl Estimate {
    pub fn value(&self) -> Option<f64> {
        match self {
            Estimate::Estimated { value } => Some(*value),
            Estimate::NotEstimated { .. } => None,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, Estimate::Estimated { .. })
    }
}

impl From<Result<f64, AnalysisError>> for Estimate {
    fn from(result: Result<f64, AnalysisError>) -> Self {
        match result {
            Ok(value) => Estimate::Estimated { value },
            Err(e) => Estimate::NotEstimated { reason: e.to_string() },
        }
    }
}

/// Estimated reservoir parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterEstimate {
    /// Permeability k, md
    pub permeability: Estimate,
    /// Skin factor s, dimensionless
    pub skin: Estimate,
    /// Wellbore storage C, bbl/psi
    pub wellbore_storage: Estimate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn test_boundaries_must_be_ordered() {
        assert!(PeriodBoundaries::new(ts(1), ts(2), ts(3)).is_ok());
        assert!(PeriodBoundaries::new(ts(1), ts(1), ts(1)).is_ok());
        assert!(matches!(
            PeriodBoundaries::new(ts(3), ts(2), ts(4)),
            Err(AnalysisError::InvalidWindow { .. })
        ));
        assert!(matches!(
            PeriodBoundaries::new(ts(1), ts(5), ts(4)),
            Err(AnalysisError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_boundaries_from_indices() {
        let samples: Vec<Sample> = (0..5).map(|h| Sample::new(ts(h), 5000.0)).collect();
        let b = PeriodBoundaries::from_indices(&samples, 0, 2, 4).expect("valid indices");
        assert_eq!(b.dd_end, ts(2));

        let err = PeriodBoundaries::from_indices(&samples, 0, 2, 9).unwrap_err();
        assert!(err.to_string().contains("bu_end index 9"));
    }

    #[test]
    fn test_test_type_parsing() {
        assert_eq!("BU".parse::<TestType>(), Ok(TestType::Buildup));
        assert_eq!("draw-down".parse::<TestType>(), Ok(TestType::Drawdown));
        assert!("injection".parse::<TestType>().is_err());
    }

    #[test]
    fn test_estimate_from_result() {
        let ok: Estimate = Ok(1.5).into();
        assert_eq!(ok.value(), Some(1.5));

        let err: Estimate = Err(AnalysisError::EstimationUnavailable {
            parameter: "skin",
            reason: "no data".to_string(),
        })
        .into();
        assert!(!err.is_estimated());
    }
}
