//! Analysis report
//!
//! Summary of one interpreted test: period durations, rate, the analysed
//! test type and the three estimates. `Display` renders the operator-facing
//! text block; serde renders the same content as JSON.

use serde::Serialize;
use std::fmt;
use std::io::Write;

use crate::analysis::AnalysisRun;
use crate::config::WellInfo;
use crate::types::{DerivativeSeries, Estimate, FitInputs, ParameterEstimate, TestType};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalysisReport {
    pub well: String,
    pub field: String,
    pub test_type: TestType,
    /// Draw-down duration tp, hours
    pub drawdown_hours: f64,
    /// Build-up duration, hours
    pub buildup_hours: f64,
    /// Flow rate q, STB/D
    pub flow_rate_stb_d: f64,
    /// Initial flowing pressure pwf, psi
    pub pwf_psi: f64,
    pub smoothing_l: f64,
    pub defined_derivatives: usize,
    pub fit: FitInputs,
    pub estimate: ParameterEstimate,
}

impl AnalysisReport {
    pub fn new(well: &WellInfo, run: &AnalysisRun, fit: FitInputs, estimate: ParameterEstimate) -> Self {
        Self {
            well: well.name.clone(),
            field: well.field.clone(),
            test_type: run.params.test.test_type,
            drawdown_hours: run.params.tp,
            buildup_hours: run.params.buildup_duration,
            flow_rate_stb_d: run.params.test.reservoir.flow_rate_stb_d,
            pwf_psi: run.params.pwf,
            smoothing_l: run.derivative.smoothing_l,
            defined_derivatives: run.derivative.defined().count(),
            fit,
            estimate,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn write_estimate(f: &mut fmt::Formatter<'_>, label: &str, unit: &str, e: &Estimate) -> fmt::Result {
    match e {
        Estimate::Estimated { value } => writeln!(f, "  {label:<22} {value:.4} {unit}"),
        Estimate::NotEstimated { reason } => writeln!(f, "  {label:<22} n/a ({reason})"),
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "━━━ {} Analysis: {} ━━━", self.test_type, self.well)?;
        if !self.field.is_empty() {
            writeln!(f, "  Field:                 {}", self.field)?;
        }
        writeln!(f, "  Draw-down duration:    {:.2} hr", self.drawdown_hours)?;
        writeln!(f, "  Flow rate:             {:.1} STB/D", self.flow_rate_stb_d)?;
        writeln!(f, "  Build-up duration:     {:.2} hr", self.buildup_hours)?;
        writeln!(f, "  Flowing pressure pwf:  {:.2} psi", self.pwf_psi)?;
        writeln!(
            f,
            "  Smoothing L:           {} ({} derivative points)",
            self.smoothing_l, self.defined_derivatives
        )?;
        writeln!(f)?;
        write_estimate(f, "Permeability k:", "md", &self.estimate.permeability)?;
        write_estimate(f, "Skin s:", "", &self.estimate.skin)?;
        write_estimate(f, "Wellbore storage C:", "bbl/psi", &self.estimate.wellbore_storage)
    }
}

/// Write the derivative table as `t_hr,p_psi,dp_psi,derivative_psi` CSV.
///
/// Undefined derivative cells are left empty.
pub fn write_derivative_csv<W: Write>(writer: W, derivative: &DerivativeSeries) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["t_hr", "p_psi", "dp_psi", "derivative_psi"])?;
    for r in &derivative.records {
        wtr.write_record([
            r.t.to_string(),
            r.p.to_string(),
            r.dp.to_string(),
            r.derv.map(|d| d.to_string()).unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DerivativeRecord;

    fn estimate() -> ParameterEstimate {
        ParameterEstimate {
            permeability: Estimate::Estimated { value: 14.826 },
            skin: Estimate::Estimated { value: -1.25 },
            wellbore_storage: Estimate::NotEstimated {
                reason: "wellbore storage not estimated: unit-slope intercept Der not supplied".into(),
            },
        }
    }

    fn report() -> AnalysisReport {
        AnalysisReport {
            well: "W-1".into(),
            field: String::new(),
            test_type: TestType::Buildup,
            drawdown_hours: 12.0,
            buildup_hours: 24.0,
            flow_rate_stb_d: 800.0,
            pwf_psi: 4900.0,
            smoothing_l: 0.5,
            defined_derivatives: 40,
            fit: FitInputs::new(Some(50.0), None),
            estimate: estimate(),
        }
    }

    #[test]
    fn test_text_summary() {
        let text = report().to_string();
        assert!(text.contains("Build-up Analysis: W-1"));
        assert!(text.contains("Draw-down duration:    12.00 hr"));
        assert!(text.contains("14.8260 md"));
        assert!(text.contains("n/a (wellbore storage not estimated"));
        assert!(!text.contains("Field:"));
    }

    #[test]
    fn test_json_marks_missing_estimates() {
        let json: serde_json::Value = serde_json::from_str(&report().to_json().unwrap()).unwrap();
        assert_eq!(json["test_type"], "buildup");
        assert_eq!(json["estimate"]["permeability"]["status"], "estimated");
        assert_eq!(json["estimate"]["wellbore_storage"]["status"], "not_estimated");
    }

    #[test]
    fn test_derivative_csv_leaves_undefined_blank() {
        let series = DerivativeSeries {
            smoothing_l: 0.5,
            records: vec![
                DerivativeRecord { t: 0.0, p: 4900.0, dp: 0.0, derv: None },
                DerivativeRecord { t: 1.0, p: 4950.0, dp: 50.0, derv: Some(48.5) },
            ],
        };
        let mut buf = Vec::new();
        write_derivative_csv(&mut buf, &series).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "t_hr,p_psi,dp_psi,derivative_psi");
        assert_eq!(lines[1], "0,4900,0,");
        assert_eq!(lines[2], "1,4950,50,48.5");
    }
}
