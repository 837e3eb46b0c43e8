//! Synthetic Well Test Generator
//!
//! Produces a gauge record for an infinite-acting radial reservoir: a static
//! period at Pi, a constant-rate draw-down, then a build-up obtained by
//! superposition of the draw-down response.
//!
//! Draw-down:  p(t)  = Pi − m·ln(1 + t/ε)
//! Build-up:   p(Δt) = Pi − m·ln((tp + Δt + ε) / (Δt + ε))
//!
//! ε is a short storage-like time constant that keeps the response finite at
//! t = 0. Both periods show a flat Bourdet derivative at level m once
//! t ≫ ε, which makes the generator a convenient end-to-end check.

use chrono::{Duration, NaiveDateTime};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{PeriodBoundaries, Sample};

/// Upper bound on generated samples per log.
pub const MAX_SAMPLES: i64 = 5_000_000;

/// Upper bound on the time span of a generated log (about 100 years).
pub const MAX_SPAN_HOURS: f64 = 876_000.0;

/// Generator settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyntheticTest {
    /// Timestamp of the first sample
    pub start: NaiveDateTime,
    /// Initial reservoir pressure Pi (psi)
    pub initial_pressure_psi: f64,
    /// Semilog slope m (psi per natural-log cycle)
    pub slope_psi: f64,
    /// Storage-like time constant ε (hours)
    pub early_time_constant_hr: f64,
    /// Static period before the draw-down (hours)
    pub pre_flow_hours: f64,
    /// Draw-down duration tp (hours)
    pub drawdown_hours: f64,
    /// Build-up duration (hours)
    pub buildup_hours: f64,
    /// Sampling interval (minutes)
    pub step_minutes: f64,
    /// Gaussian gauge noise standard deviation (psi); 0 disables noise
    pub noise_psi: f64,
    /// Noise seed; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for SyntheticTest {
    fn default() -> Self {
        Self {
            start: NaiveDateTime::default(),
            initial_pressure_psi: crate::config::defaults::INITIAL_PRESSURE_PSI,
            slope_psi: 50.0,
            early_time_constant_hr: 0.01,
            pre_flow_hours: 1.0,
            drawdown_hours: 12.0,
            buildup_hours: 24.0,
            step_minutes: 5.0,
            noise_psi: 0.0,
            seed: Some(7),
        }
    }
}

/// Generated gauge record and the true period boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticLog {
    pub samples: Vec<Sample>,
    pub boundaries: PeriodBoundaries,
}

impl SyntheticTest {
    /// Generate the gauge record.
    pub fn generate(&self) -> AnalysisResult<SyntheticLog> {
        self.validate()?;

        let step_ms = self.step_ms()?;
        let step_hr = step_ms as f64 / 3_600_000.0;
        let steps = |hours: f64| (hours / step_hr).round();
        let (pre, dd, bu) = (
            steps(self.pre_flow_hours),
            steps(self.drawdown_hours).max(1.0),
            steps(self.buildup_hours).max(1.0),
        );
        // Checked in f64 so that no integer conversion below can overflow
        if pre + dd + bu >= MAX_SAMPLES as f64 {
            return Err(AnalysisError::InvalidWindow {
                reason: format!(
                    "synthetic log would hold more than {MAX_SAMPLES} samples at a {} minute step",
                    self.step_minutes
                ),
            });
        }
        if (pre + dd + bu) * step_hr > MAX_SPAN_HOURS {
            return Err(AnalysisError::InvalidWindow {
                reason: format!("synthetic log would span more than {MAX_SPAN_HOURS} hours"),
            });
        }
        let (n_pre, n_dd, n_bu) = (pre as i64, dd as i64, bu as i64);
        let tp = n_dd as f64 * step_hr;

        let noise = if self.noise_psi > 0.0 {
            Normal::new(0.0, self.noise_psi).ok()
        } else {
            None
        };
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let pi = self.initial_pressure_psi;
        let m = self.slope_psi;
        let eps = self.early_time_constant_hr;

        let at = |i: i64| {
            self.start
                .checked_add_signed(Duration::milliseconds(i * step_ms))
                .ok_or_else(|| AnalysisError::InvalidWindow {
                    reason: format!("synthetic timestamp {i} steps after {} is out of range", self.start),
                })
        };

        let samples = (0..=(n_pre + n_dd + n_bu))
            .map(|i| {
                let flow_t = (i - n_pre) as f64 * step_hr;
                let clean = if i <= n_pre {
                    pi
                } else if i <= n_pre + n_dd {
                    pi - m * (1.0 + flow_t / eps).ln()
                } else {
                    let dt = flow_t - tp;
                    pi - m * ((tp + dt + eps) / (dt + eps)).ln()
                };
                let jitter = noise.map_or(0.0, |n| n.sample(&mut rng));
                Ok(Sample::new(at(i)?, clean + jitter))
            })
            .collect::<AnalysisResult<Vec<Sample>>>()?;

        let boundaries = PeriodBoundaries::new(at(n_pre)?, at(n_pre + n_dd)?, at(n_pre + n_dd + n_bu)?)?;

        info!(
            samples = samples.len(),
            tp_hr = tp,
            slope_psi = m,
            noise_psi = self.noise_psi,
            "Synthetic well test generated"
        );
        Ok(SyntheticLog { samples, boundaries })
    }

    /// Sampling interval in whole milliseconds, rejecting steps that round to zero.
    fn step_ms(&self) -> AnalysisResult<i64> {
        let step_ms = (self.step_minutes * 60_000.0).round();
        if step_ms < 1.0 {
            return Err(AnalysisError::InvalidWindow {
                reason: format!(
                    "synthetic step_minutes ({}) is below the 1 ms timestamp resolution",
                    self.step_minutes
                ),
            });
        }
        Ok(step_ms as i64)
    }

    fn validate(&self) -> AnalysisResult<()> {
        let checks = [
            ("step_minutes", self.step_minutes),
            ("drawdown_hours", self.drawdown_hours),
            ("buildup_hours", self.buildup_hours),
            ("early_time_constant_hr", self.early_time_constant_hr),
        ];
        for (name, value) in checks {
            if !(value > 0.0 && value.is_finite()) {
                return Err(AnalysisError::InvalidWindow {
                    reason: format!("synthetic {name} must be > 0 (got {value})"),
                });
            }
        }
        if !(self.pre_flow_hours >= 0.0 && self.pre_flow_hours.is_finite())
            || !(self.noise_psi >= 0.0 && self.noise_psi.is_finite())
        {
            return Err(AnalysisError::InvalidWindow {
                reason: format!(
                    "synthetic pre_flow_hours ({}) and noise_psi ({}) must be finite and >= 0",
                    self.pre_flow_hours, self.noise_psi
                ),
            });
        }
        Ok(())
    }
}
