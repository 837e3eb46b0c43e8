//! Pipeline Regression Tests
//!
//! Exercises the full pipeline (windowing → normalization → Bourdet
//! derivative → estimation) on hand-built and synthetic gauge records.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use welltest_pta::analysis::run_analysis;
use welltest_pta::error::AnalysisError;
use welltest_pta::session::FitSession;
use welltest_pta::synthetic::SyntheticTest;
use welltest_pta::types::{FitInputs, PeriodBoundaries, Sample, TestParameters, TestType};

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid base timestamp")
}

fn at(hours: f64) -> NaiveDateTime {
    base() + Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

const SLOPE: f64 = 50.0;
const TP: f64 = 12.0;
const PWF: f64 = 4900.0;

/// Draw-down over [0, 12] h, then a build-up sampled at Δt = 0, 1, 2, 4, 8, 16, 32 h
/// whose Δp is exactly m·ln(te) + C.
fn log_linear_buildup() -> (Vec<Sample>, PeriodBoundaries) {
    let mut samples = vec![
        Sample::new(at(0.0), 5410.0),
        Sample::new(at(6.0), 4950.0),
        Sample::new(at(TP), PWF),
    ];
    for dt in [1.0, 2.0, 4.0, 8.0, 16.0, 32.0] {
        let te: f64 = dt * TP / (dt + TP);
        samples.push(Sample::new(at(TP + dt), PWF + SLOPE * te.ln() + 200.0));
    }
    let boundaries = PeriodBoundaries::new(at(0.0), at(TP), at(TP + 32.0)).expect("ordered");
    (samples, boundaries)
}

// ============================================================================
// Hand-built build-up
// ============================================================================

#[test]
fn buildup_flat_derivative_matches_slope() {
    let (samples, boundaries) = log_linear_buildup();
    let params = TestParameters::default().with_smoothing(0.5);
    let run = run_analysis(&samples, &boundaries, &params).unwrap();

    assert!((run.params.tp - TP).abs() < 1e-9);
    assert_eq!(run.params.pwf, PWF);
    assert_eq!(run.derivative.len(), 7);

    let defined: Vec<(f64, f64)> = run.derivative.defined().map(|(r, d)| (r.t, d)).collect();
    let times: Vec<f64> = defined.iter().map(|(t, _)| *t).collect();
    assert_eq!(times, vec![2.0, 4.0, 8.0, 16.0]);
    for (t, d) in defined {
        assert!((d - SLOPE).abs() / SLOPE < 0.01, "derivative at t = {t}: {d}");
    }

    // Shut-in record (t = 0), first record (no left neighbor) and trimmed tail
    assert_eq!(run.derivative.records[0].derv, None);
    assert_eq!(run.derivative.records[1].derv, None);
    assert_eq!(run.derivative.records[6].derv, None);
}

#[test]
fn buildup_permeability_reference_value() {
    let (samples, boundaries) = log_linear_buildup();
    let run = run_analysis(&samples, &boundaries, &TestParameters::default()).unwrap();
    let est = run.estimate(&FitInputs::new(Some(SLOPE), None));

    let k = est.permeability.value().unwrap();
    assert!((k - 14.826).abs() < 1e-3, "k = {k}");
    assert!(est.skin.is_estimated());
    assert!(!est.wellbore_storage.is_estimated());
}

#[test]
fn zero_unit_slope_intercept_is_not_estimated() {
    let (samples, boundaries) = log_linear_buildup();
    let run = run_analysis(&samples, &boundaries, &TestParameters::default()).unwrap();
    let est = run.estimate(&FitInputs::new(Some(SLOPE), Some(0.0)));

    assert!(est.permeability.is_estimated());
    assert!(!est.wellbore_storage.is_estimated());
}

#[test]
fn single_sample_buildup_is_degenerate() {
    let (samples, _) = log_linear_buildup();
    let boundaries = PeriodBoundaries::new(at(0.0), at(TP), at(TP)).unwrap();
    let err = run_analysis(&samples, &boundaries, &TestParameters::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::DegenerateSeries { .. }), "got {err:?}");
}

#[test]
fn misordered_boundaries_are_invalid() {
    assert!(matches!(
        PeriodBoundaries::new(at(TP), at(0.0), at(TP + 32.0)),
        Err(AnalysisError::InvalidWindow { .. })
    ));
}

#[test]
fn window_without_samples_is_invalid() {
    let (samples, _) = log_linear_buildup();
    let boundaries = PeriodBoundaries::new(at(100.0), at(110.0), at(120.0)).unwrap();
    let err = run_analysis(&samples, &boundaries, &TestParameters::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidWindow { .. }), "got {err:?}");
}

#[test]
fn changing_smoothing_keeps_prepared_series() {
    let (samples, boundaries) = log_linear_buildup();
    let run = run_analysis(&samples, &boundaries, &TestParameters::default().with_smoothing(0.5)).unwrap();
    let wider = run.with_smoothing(0.9);

    assert_eq!(wider.prepared, run.prepared);
    assert_eq!(wider.derivative.smoothing_l, 0.9);
    assert_eq!(wider.params.test.smoothing_l, 0.9);
    assert!(wider.derivative.defined().count() <= run.derivative.defined().count());

    let none = run.with_smoothing(0.0);
    assert_eq!(none.derivative.defined().count(), 0);
    assert_eq!(none.derivative.len(), run.derivative.len());
}

// ============================================================================
// Synthetic radial-flow test
// ============================================================================

#[test]
fn synthetic_buildup_recovers_slope() {
    let log = SyntheticTest::default().generate().unwrap();
    let run = run_analysis(&log.samples, &log.boundaries, &TestParameters::default()).unwrap();

    let late: Vec<f64> = run
        .derivative
        .defined()
        .filter(|(r, _)| r.t >= 1.0)
        .map(|(_, d)| d)
        .collect();
    assert!(late.len() > 100, "only {} late derivative points", late.len());
    for d in late {
        assert!((d - 50.0).abs() / 50.0 < 0.03, "derivative {d}");
    }

    let mut session = FitSession::new();
    session.set_slope(50.0);
    let est = session.estimate(&run);
    assert!((est.permeability.value().unwrap() - 14.826).abs() < 1e-3);
    assert!(est.skin.value().unwrap().is_finite());
}

#[test]
fn synthetic_drawdown_estimates_skin_from_flat_band() {
    let log = SyntheticTest { noise_psi: 0.05, seed: Some(3), ..Default::default() }
        .generate()
        .unwrap();
    let params = TestParameters::default().with_test_type(TestType::Drawdown);
    let run = run_analysis(&log.samples, &log.boundaries, &params).unwrap();

    assert_eq!(run.params.test.test_type, TestType::Drawdown);
    let mut session = FitSession::new();
    session.set_slope(50.0);
    session.set_unit_slope_intercept(0.01);
    let est = session.estimate(&run);

    assert!(est.permeability.is_estimated());
    assert!(est.skin.is_estimated(), "skin: {:?}", est.skin);
    let c = est.wellbore_storage.value().unwrap();
    assert!((c - 800.0 * 1.5 * 1e-4 / (24.0 * 0.01)).abs() < 1e-12);
}
