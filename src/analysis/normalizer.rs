//! Effective-time normalization
//!
//! Converts a windowed gauge record into elapsed time, delta pressure and
//! effective time.
//!
//! - Build-up: Δp = p − p(Δt=0), te = Δt·tp / (Δt + tp) (superposition time
//!   for one constant-rate period followed by shut-in)
//! - Draw-down: Δp = Pi − p, te = t

use chrono::NaiveDateTime;
use statrs::statistics::Statistics;
use tracing::{debug, info};

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{
    PreparedParameters, PreparedRecord, PreparedSeries, Sample, TestParameters, TestType,
    WindowedSeries,
};

const MICROS_PER_HOUR: f64 = 3_600_000_000.0;
const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Hours elapsed from `from` to `to`, at microsecond resolution.
///
/// Spans too long for a microsecond count fall back to milliseconds.
pub fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    let span = to - from;
    match span.num_microseconds() {
        Some(us) => us as f64 / MICROS_PER_HOUR,
        None => span.num_milliseconds() as f64 / MILLIS_PER_HOUR,
    }
}

/// Duration of a window in hours (0 for fewer than 2 samples).
pub fn window_duration_hours(samples: &[Sample]) -> f64 {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => hours_between(first.timestamp, last.timestamp),
        _ => 0.0,
    }
}

/// Normalize the analysed window and derive tp, build-up duration and pwf.
///
/// The window analysed is chosen by `params.test_type`; the draw-down window
/// always supplies tp.
pub fn prepare(
    windows: &WindowedSeries,
    params: &TestParameters,
) -> AnalysisResult<(PreparedSeries, PreparedParameters)> {
    let tp = window_duration_hours(&windows.drawdown);
    let buildup_duration = window_duration_hours(&windows.buildup);

    let (series_name, raw) = match params.test_type {
        TestType::Buildup => ("build-up", &windows.buildup),
        TestType::Drawdown => ("draw-down", &windows.drawdown),
    };
    check_samples(series_name, raw)?;

    let t0 = raw[0].timestamp;
    let p0 = raw[0].pressure;
    let pi = params.reservoir.initial_pressure_psi;

    let (records, pwf): (Vec<PreparedRecord>, f64) = match params.test_type {
        TestType::Buildup => {
            let records = raw
                .iter()
                .map(|s| {
                    let t = hours_between(t0, s.timestamp);
                    PreparedRecord {
                        t,
                        p: s.pressure,
                        dp: s.pressure - p0,
                        te: t * tp / (t + tp),
                    }
                })
                .collect();
            (records, p0)
        }
        TestType::Drawdown => {
            let records = raw
                .iter()
                .map(|s| {
                    let t = hours_between(t0, s.timestamp);
                    PreparedRecord {
                        t,
                        p: s.pressure,
                        dp: pi - s.pressure,
                        te: t,
                    }
                })
                .collect();
            let mean_p = Statistics::mean(raw.iter().map(|s| s.pressure));
            (records, mean_p)
        }
    };

    // te must be strictly positive after the flow-initiation record
    if let Some((i, r)) = records
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, r)| !(r.te > 0.0))
    {
        return Err(AnalysisError::DegenerateSeries {
            series: series_name,
            reason: format!(
                "effective time at record {i} is {} (t = {} hr, tp = {tp} hr); must be > 0",
                r.te, r.t
            ),
        });
    }

    debug!(
        test = params.test_type.short_code(),
        records = records.len(),
        tp,
        pwf,
        "Series normalized"
    );
    info!(
        test = %params.test_type,
        records = records.len(),
        tp_hr = tp,
        buildup_hr = buildup_duration,
        "Prepared series ready"
    );

    let prepared_params = PreparedParameters {
        test: params.clone(),
        tp,
        buildup_duration,
        pwf,
    };
    Ok((PreparedSeries { records }, prepared_params))
}

/// At least two samples with strictly increasing timestamps.
fn check_samples(series: &'static str, samples: &[Sample]) -> AnalysisResult<()> {
    if samples.len() < 2 {
        return Err(AnalysisError::DegenerateSeries {
            series,
            reason: format!("{} sample(s), need at least 2", samples.len()),
        });
    }
    if let Some(i) = samples
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        return Err(AnalysisError::DegenerateSeries {
            series,
            reason: format!(
                "timestamps not strictly increasing at record {} ({} then {})",
                i + 1,
                samples[i].timestamp,
                samples[i + 1].timestamp
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn series(hours: &[i64], pressures: &[f64]) -> Vec<Sample> {
        hours
            .iter()
            .zip(pressures)
            .map(|(&h, &p)| Sample::new(base() + Duration::hours(h), p))
            .collect()
    }

    fn windows() -> WindowedSeries {
        WindowedSeries {
            // 12-hour draw-down
            drawdown: series(&[0, 4, 8, 12], &[5410.0, 5100.0, 5050.0, 5020.0]),
            buildup: series(&[12, 13, 14, 16, 20], &[5020.0, 5200.0, 5260.0, 5300.0, 5330.0]),
        }
    }

    #[test]
    fn test_buildup_normalization() {
        let params = TestParameters::default();
        let (prepared, derived) = prepare(&windows(), &params).unwrap();

        assert_eq!(derived.tp, 12.0);
        assert_eq!(derived.buildup_duration, 8.0);
        assert_eq!(derived.pwf, 5020.0);

        let r = &prepared.records;
        assert_eq!(r[0].t, 0.0);
        assert_eq!(r[0].dp, 0.0);
        assert_eq!(r[0].te, 0.0);
        assert_eq!(r[1].t, 1.0);
        assert_eq!(r[1].dp, 180.0);
        assert!((r[1].te - 12.0 / 13.0).abs() < 1e-12);
        assert!((r[4].te - 8.0 * 12.0 / 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_drawdown_normalization() {
        let params = TestParameters::default().with_test_type(TestType::Drawdown);
        let (prepared, derived) = prepare(&windows(), &params).unwrap();

        let r = &prepared.records;
        assert_eq!(r.len(), 4);
        assert_eq!(r[1].te, 4.0);
        assert_eq!(r[1].dp, 5410.0 - 5100.0);
        let mean = (5410.0 + 5100.0 + 5050.0 + 5020.0) / 4.0;
        assert!((derived.pwf - mean).abs() < 1e-9);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let params = TestParameters::default();
        let first = prepare(&windows(), &params).unwrap();
        let second = prepare(&windows(), &params).unwrap();
        assert_eq!(first, second);
        for (a, b) in first.0.records.iter().zip(&second.0.records) {
            assert_eq!(a.te.to_bits(), b.te.to_bits());
            assert_eq!(a.dp.to_bits(), b.dp.to_bits());
        }
    }

    #[test]
    fn test_single_sample_buildup_is_degenerate() {
        let mut w = windows();
        w.buildup.truncate(1);
        let err = prepare(&w, &TestParameters::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateSeries { series: "build-up", .. }));
    }

    #[test]
    fn test_zero_length_drawdown_is_degenerate() {
        // tp = 0 collapses every build-up effective time to zero
        let mut w = windows();
        w.drawdown.truncate(1);
        let err = prepare(&w, &TestParameters::default()).unwrap_err();
        assert!(err.to_string().contains("effective time"));
    }

    #[test]
    fn test_sub_millisecond_spacing_keeps_distinct_times() {
        let t0 = base();
        let t1 = t0 + Duration::microseconds(250);
        let t2 = t0 + Duration::microseconds(500);
        assert!(hours_between(t0, t1) > 0.0);
        assert!(hours_between(t0, t1) < hours_between(t0, t2));

        let w = WindowedSeries {
            drawdown: vec![Sample::new(t0, 5410.0), Sample::new(t1, 5409.0), Sample::new(t2, 5408.0)],
            buildup: vec![Sample::new(t2, 5408.0)],
        };
        let params = TestParameters::default().with_test_type(TestType::Drawdown);
        let (prepared, _) = prepare(&w, &params).unwrap();
        let te: Vec<f64> = prepared.records.iter().map(|r| r.te).collect();
        assert!(te[0] < te[1] && te[1] < te[2], "te = {te:?}");
    }

    #[test]
    fn test_repeated_timestamp_is_degenerate() {
        let mut w = windows();
        w.buildup[2].timestamp = w.buildup[1].timestamp;
        assert!(matches!(
            prepare(&w, &TestParameters::default()),
            Err(AnalysisError::DegenerateSeries { .. })
        ));
    }
}
