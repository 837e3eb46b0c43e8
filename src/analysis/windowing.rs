//! Period windowing
//!
//! Cuts the draw-down and build-up periods out of the full gauge record.

use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{PeriodBoundaries, Sample, WindowedSeries};

/// Slice `samples` into draw-down `[dd_start, dd_end]` and build-up
/// `[dd_end, bu_end]` windows (inclusive), each re-indexed from zero.
///
/// Fails with `InvalidWindow` if the boundaries are out of order or if
/// either window holds no samples.
pub fn build_windows(
    samples: &[Sample],
    boundaries: &PeriodBoundaries,
) -> AnalysisResult<WindowedSeries> {
    boundaries.validate()?;

    let drawdown = select_range(samples, boundaries.dd_start, boundaries.dd_end);
    let buildup = select_range(samples, boundaries.dd_end, boundaries.bu_end);

    if drawdown.is_empty() {
        return Err(AnalysisError::InvalidWindow {
            reason: format!(
                "draw-down window [{}, {}] contains no samples",
                boundaries.dd_start, boundaries.dd_end
            ),
        });
    }
    if buildup.is_empty() {
        return Err(AnalysisError::InvalidWindow {
            reason: format!(
                "build-up window [{}, {}] contains no samples",
                boundaries.dd_end, boundaries.bu_end
            ),
        });
    }

    debug!(
        drawdown = drawdown.len(),
        buildup = buildup.len(),
        "Period windows selected"
    );

    Ok(WindowedSeries { drawdown, buildup })
}

fn select_range(
    samples: &[Sample],
    start: chrono::NaiveDateTime,
    end: chrono::NaiveDateTime,
) -> Vec<Sample> {
    samples
        .iter()
        .filter(|s| s.timestamp >= start && s.timestamp <= end)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn samples(n: i64) -> Vec<Sample> {
        (0..n)
            .map(|i| Sample::new(base() + Duration::hours(i), 5000.0 - i as f64))
            .collect()
    }

    #[test]
    fn test_windows_are_inclusive_and_share_shut_in_sample() {
        let data = samples(10);
        let b = PeriodBoundaries::from_indices(&data, 2, 5, 8).unwrap();
        let w = build_windows(&data, &b).unwrap();

        assert_eq!(w.drawdown.len(), 4);
        assert_eq!(w.buildup.len(), 4);
        assert_eq!(w.drawdown[0], data[2]);
        assert_eq!(w.drawdown.last(), w.buildup.first());
        assert_eq!(w.buildup.last(), Some(&data[8]));
    }

    #[test]
    fn test_out_of_order_boundaries_rejected() {
        let data = samples(10);
        let b = PeriodBoundaries {
            dd_start: base() + Duration::hours(5),
            dd_end: base() + Duration::hours(2),
            bu_end: base() + Duration::hours(8),
        };
        assert!(matches!(
            build_windows(&data, &b),
            Err(AnalysisError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_empty_window_rejected() {
        let data = samples(5);
        let b = PeriodBoundaries {
            dd_start: base() - Duration::hours(10),
            dd_end: base() - Duration::hours(5),
            bu_end: base() + Duration::hours(2),
        };
        let err = build_windows(&data, &b).unwrap_err();
        assert!(err.to_string().contains("draw-down window"));
    }

    #[test]
    fn test_boundaries_between_samples() {
        let data = samples(6);
        let b = PeriodBoundaries {
            dd_start: base() + Duration::minutes(30),
            dd_end: base() + Duration::minutes(150),
            bu_end: base() + Duration::hours(10),
        };
        let w = build_windows(&data, &b).unwrap();
        assert_eq!(w.drawdown.len(), 2); // hours 1, 2
        assert_eq!(w.buildup.len(), 3); // hours 3, 4, 5
    }
}
