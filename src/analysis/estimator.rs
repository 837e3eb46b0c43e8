//! Radial-flow parameter estimation
//!
//! Closed-form field-unit equations applied to the externally fitted
//! semilog slope m and unit-slope intercept Der.
//!
//! Formula: k = 70.6 × q × B × μ / (h × m)
//!
//! Skin (build-up):
//!   s = 1.151 × ((Pi − pwf)/(2.303·m) − log₁₀(k / (φ·μ·ct·rw²)) + 3.23 − log₁₀(tp))
//!
//! Skin (draw-down), with t_fit, p_fit the medians of t and p over the flat
//! derivative band around m:
//!   s = 1.151 × ((Pi − p_fit)/(2.303·m) − log₁₀(k·t_fit / (φ·μ·ct·rw²)) + 3.23)
//!
//! Wellbore storage: C = q × B × t_ref / (24 × Der)

use statrs::statistics::{Data, Median};
use tracing::{info, warn};

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{
    DerivativeSeries, FitInputs, ParameterEstimate, PreparedParameters, TestParameters,
    TestType,
};

/// Permeability k (md) from the semilog slope m.
pub fn permeability(params: &TestParameters, m: f64) -> AnalysisResult<f64> {
    if m == 0.0 {
        return Err(unavailable("permeability", "semilog slope m is zero"));
    }
    let r = &params.reservoir;
    let k = params.estimator.permeability_coefficient
        * r.flow_rate_stb_d
        * r.formation_volume_factor
        * r.viscosity_cp
        / (r.net_thickness_ft * m);
    finite("permeability", k)
}

/// Median elapsed time and pressure of the records whose derivative lies
/// within `±band·|m|` of m.
///
/// Returns `None` when no derivative record falls inside the band.
pub fn flat_band_fit(derivative: &DerivativeSeries, m: f64, band: f64) -> Option<(f64, f64)> {
    let half_width = band * m.abs();
    let (times, pressures): (Vec<f64>, Vec<f64>) = derivative
        .defined()
        .filter(|(_, d)| (d - m).abs() <= half_width)
        .map(|(r, _)| (r.t, r.p))
        .unzip();

    if times.is_empty() {
        return None;
    }
    Some((Data::new(times).median(), Data::new(pressures).median()))
}

/// Skin factor from the semilog slope m and permeability k.
pub fn skin(
    params: &PreparedParameters,
    derivative: &DerivativeSeries,
    m: f64,
    k: f64,
) -> AnalysisResult<f64> {
    if m == 0.0 {
        return Err(unavailable("skin", "semilog slope m is zero"));
    }
    let test = &params.test;
    let r = &test.reservoir;
    let e = &test.estimator;
    let diffusivity = r.porosity * r.viscosity_cp * r.total_compressibility * r.wellbore_radius_ft.powi(2);

    let s = match test.test_type {
        TestType::Buildup => {
            e.skin_coefficient
                * ((r.initial_pressure_psi - params.pwf) / (e.ln10 * m)
                    - (k / diffusivity).log10()
                    + e.skin_offset
                    - params.tp.log10())
        }
        TestType::Drawdown => {
            let (t_fit, p_fit) = flat_band_fit(derivative, m, test.flat_band_fraction)
                .ok_or_else(|| {
                    unavailable(
                        "skin",
                        &format!(
                            "no derivative value within ±{:.0}% of m = {m}",
                            test.flat_band_fraction * 100.0
                        ),
                    )
                })?;
            e.skin_coefficient
                * ((r.initial_pressure_psi - p_fit) / (e.ln10 * m)
                    - (k * t_fit / diffusivity).log10()
                    + e.skin_offset)
        }
    };
    finite("skin", s)
}

/// Wellbore storage constant C (bbl/psi) from the unit-slope intercept Der.
pub fn wellbore_storage(params: &TestParameters, der: f64) -> AnalysisResult<f64> {
    if der == 0.0 {
        return Err(unavailable("wellbore storage", "unit-slope intercept Der is zero"));
    }
    let r = &params.reservoir;
    let e = &params.estimator;
    let rate_term = if e.storage_includes_rate {
        r.flow_rate_stb_d * r.formation_volume_factor
    } else {
        1.0
    };
    let c = rate_term * e.unit_slope_reference_time_hr / (e.storage_time_factor * der);
    finite("wellbore storage", c)
}

/// Estimate permeability, skin and wellbore storage.
///
/// Each quantity is reported independently; skin additionally needs a
/// permeability estimate.
pub fn estimate_parameters(
    params: &PreparedParameters,
    derivative: &DerivativeSeries,
    fit: &FitInputs,
) -> ParameterEstimate {
    let k = fit
        .slope
        .ok_or_else(|| unavailable("permeability", "semilog slope m not supplied"))
        .and_then(|m| permeability(&params.test, m));

    let s = match (fit.slope, &k) {
        (Some(m), Ok(k)) => skin(params, derivative, m, *k),
        (None, _) => Err(unavailable("skin", "semilog slope m not supplied")),
        (Some(_), Err(_)) => Err(unavailable("skin", "permeability not available")),
    };

    let c = fit
        .unit_slope_intercept
        .ok_or_else(|| unavailable("wellbore storage", "unit-slope intercept Der not supplied"))
        .and_then(|der| wellbore_storage(&params.test, der));

    for err in [&k, &s, &c].into_iter().filter_map(|r| r.as_ref().err()) {
        warn!(error = %err, "Parameter not estimated");
    }

    let estimate = ParameterEstimate {
        permeability: k.into(),
        skin: s.into(),
        wellbore_storage: c.into(),
    };
    info!(
        test = %params.test.test_type,
        k_md = ?estimate.permeability.value(),
        skin = ?estimate.skin.value(),
        c_bbl_psi = ?estimate.wellbore_storage.value(),
        "Parameter estimation complete"
    );
    estimate
}

fn unavailable(parameter: &'static str, reason: &str) -> AnalysisError {
    AnalysisError::EstimationUnavailable {
        parameter,
        reason: reason.to_string(),
    }
}

fn finite(parameter: &'static str, value: f64) -> AnalysisResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(unavailable(parameter, &format!("result is not finite ({value})")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DerivativeRecord;

    fn prepared(test_type: TestType) -> PreparedParameters {
        PreparedParameters {
            test: TestParameters::default().with_test_type(test_type),
            tp: 12.0,
            buildup_duration: 24.0,
            pwf: 4800.0,
        }
    }

    fn flat_derivative(m: f64) -> DerivativeSeries {
        DerivativeSeries {
            smoothing_l: 0.5,
            records: vec![
                DerivativeRecord { t: 0.5, p: 5000.0, dp: 410.0, derv: Some(3.0 * m) },
                DerivativeRecord { t: 2.0, p: 4900.0, dp: 510.0, derv: Some(1.05 * m) },
                DerivativeRecord { t: 4.0, p: 4880.0, dp: 530.0, derv: Some(0.95 * m) },
                DerivativeRecord { t: 8.0, p: 4860.0, dp: 550.0, derv: Some(m) },
                DerivativeRecord { t: 10.0, p: 4850.0, dp: 560.0, derv: Some(1.5 * m) },
                DerivativeRecord { t: 12.0, p: 4845.0, dp: 565.0, derv: None },
            ],
        }
    }

    #[test]
    fn test_permeability_reference_value() {
        let k = permeability(&TestParameters::default(), 50.0).unwrap();
        let expected = 70.6 * 800.0 * 1.5 * 0.35 / (40.0 * 50.0);
        assert!((k - expected).abs() < 1e-12);
        assert!((k - 14.826).abs() < 1e-3, "k = {k}");
    }

    #[test]
    fn test_zero_slope_is_unavailable() {
        assert!(matches!(
            permeability(&TestParameters::default(), 0.0),
            Err(AnalysisError::EstimationUnavailable { parameter: "permeability", .. })
        ));
    }

    #[test]
    fn test_buildup_skin() {
        let p = prepared(TestType::Buildup);
        let m = 50.0;
        let k = permeability(&p.test, m).unwrap();
        let s = skin(&p, &DerivativeSeries::default(), m, k).unwrap();

        let diffusivity = 0.12 * 0.35 * 1e-5 * 0.3 * 0.3;
        let expected = 1.151
            * ((5410.0 - 4800.0) / (2.303 * m) - (k / diffusivity).log10() + 3.23 - 12f64.log10());
        assert!((s - expected).abs() < 1e-9);
    }

    #[test]
    fn test_flat_band_fit_uses_medians() {
        let (t_fit, p_fit) = flat_band_fit(&flat_derivative(40.0), 40.0, 0.10).unwrap();
        // In band: t = 2, 4, 8
        assert!((t_fit - 4.0).abs() < 1e-9, "t_fit = {t_fit}");
        assert!((p_fit - 4880.0).abs() < 1e-9, "p_fit = {p_fit}");
    }

    #[test]
    fn test_drawdown_skin_uses_flat_band() {
        let p = prepared(TestType::Drawdown);
        let m = 40.0;
        let k = permeability(&p.test, m).unwrap();
        let s = skin(&p, &flat_derivative(m), m, k).unwrap();

        let diffusivity = 0.12 * 0.35 * 1e-5 * 0.3 * 0.3;
        let expected =
            1.151 * ((5410.0 - 4880.0) / (2.303 * m) - (k * 4.0 / diffusivity).log10() + 3.23);
        assert!((s - expected).abs() < 1e-9);
    }

    #[test]
    fn test_drawdown_skin_without_band_match_is_unavailable() {
        let p = prepared(TestType::Drawdown);
        let err = skin(&p, &flat_derivative(40.0), 400.0, 10.0).unwrap_err();
        assert!(err.to_string().contains("±10%"));
    }

    #[test]
    fn test_wellbore_storage() {
        let params = TestParameters::default();
        let c = wellbore_storage(&params, 0.01).unwrap();
        assert!((c - 800.0 * 1.5 * 1e-4 / (24.0 * 0.01)).abs() < 1e-15);

        let mut without_rate = params.clone();
        without_rate.estimator.storage_includes_rate = false;
        without_rate.estimator.unit_slope_reference_time_hr = 1e-6;
        let c = wellbore_storage(&without_rate, 0.01).unwrap();
        assert!((c - 1e-6 / 0.24).abs() < 1e-18);
    }

    #[test]
    fn test_zero_der_is_unavailable_not_inf() {
        let result = wellbore_storage(&TestParameters::default(), 0.0);
        assert!(matches!(
            result,
            Err(AnalysisError::EstimationUnavailable { parameter: "wellbore storage", .. })
        ));
    }

    #[test]
    fn test_estimates_are_independent() {
        let p = prepared(TestType::Buildup);
        let est = estimate_parameters(
            &p,
            &DerivativeSeries::default(),
            &FitInputs::new(Some(50.0), Some(0.0)),
        );
        assert!(est.permeability.is_estimated());
        assert!(est.skin.is_estimated());
        assert!(!est.wellbore_storage.is_estimated());

        let est = estimate_parameters(&p, &DerivativeSeries::default(), &FitInputs::new(None, Some(0.02)));
        assert!(!est.permeability.is_estimated());
        assert!(!est.skin.is_estimated());
        assert!(est.wellbore_storage.is_estimated());
    }

    #[test]
    fn test_nothing_supplied() {
        let est = estimate_parameters(
            &prepared(TestType::Drawdown),
            &DerivativeSeries::default(),
            &FitInputs::default(),
        );
        assert!(est.permeability.value().is_none());
        assert!(est.skin.value().is_none());
        assert!(est.wellbore_storage.value().is_none());
    }
}
