//! Bourdet derivative engine
//!
//! Computes the smoothed logarithmic derivative t·d(Δp)/dt of a prepared
//! series. For each record at x = ln(te):
//!
//! 1. Left neighbor: last sample with x_L ≤ x − L
//! 2. Right neighbor: last sample with x_R ≤ x + L
//! 3. One-sided slopes s_L = (Δp − Δp_L)/(x − x_L), s_R = (Δp_R − Δp)/(x_R − x)
//! 4. s_R falls back to s_L when no right neighbor lies inside the window
//! 5. derv = ((x_R − x)·s_L + (x − x_L)·s_R) / (x_R − x_L)
//! 6. Records within L hours of the end of the series are discarded
//!
//! Neighbor lookup is a predecessor search over the sorted log-times, so the
//! whole series costs O(n log n). Records are independent and are evaluated
//! in parallel.

use rayon::prelude::*;
use tracing::{debug, warn};

use super::search::predecessor_index;
use crate::types::{DerivativeRecord, DerivativeSeries, PreparedSeries};

/// Compute the Bourdet derivative of `prepared` with smoothing half-width `smoothing_l`.
///
/// `prepared` must have non-decreasing effective time (as produced by
/// [`super::normalizer::prepare`]). Records with `te ≤ 0` (the shut-in
/// record of a build-up) take no part in the neighbor search and receive an
/// undefined derivative. A non-positive or non-finite `smoothing_l` yields a
/// series with every derivative undefined.
pub fn bourdet_derivative(prepared: &PreparedSeries, smoothing_l: f64) -> DerivativeSeries {
    let records = &prepared.records;
    let mut derv: Vec<Option<f64>> = vec![None; records.len()];

    if smoothing_l > 0.0 && smoothing_l.is_finite() {
        // Search keys: records with a usable logarithm
        let keyed: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.te > 0.0 && r.te.is_finite())
            .map(|(i, _)| i)
            .collect();
        let log_te: Vec<f64> = keyed.iter().map(|&i| records[i].te.ln()).collect();
        let dp: Vec<f64> = keyed.iter().map(|&i| records[i].dp).collect();

        let computed: Vec<Option<f64>> = (0..keyed.len())
            .into_par_iter()
            .map(|k| centered_derivative(&log_te, &dp, k, smoothing_l))
            .collect();

        // Tail trimming: the window would run past the last sample
        let cutoff = prepared.max_t() - smoothing_l;
        for (&i, value) in keyed.iter().zip(computed) {
            if records[i].t <= cutoff {
                derv[i] = value;
            }
        }
    } else {
        warn!(smoothing_l, "Smoothing width is not positive; derivative undefined everywhere");
    }

    let out: Vec<DerivativeRecord> = records
        .iter()
        .zip(derv)
        .map(|(r, derv)| DerivativeRecord {
            t: r.t,
            p: r.p,
            dp: r.dp,
            derv,
        })
        .collect();

    debug!(
        records = out.len(),
        defined = out.iter().filter(|r| r.derv.is_some()).count(),
        smoothing_l,
        "Bourdet derivative computed"
    );

    DerivativeSeries {
        smoothing_l,
        records: out,
    }
}

/// Three-point weighted derivative at key `k`.
///
/// Returns `None` when there is no left neighbor at least `l` log-units
/// back, or when the arithmetic is not finite.
fn centered_derivative(x: &[f64], dp: &[f64], k: usize, l: f64) -> Option<f64> {
    let xc = x[k];
    let pc = dp[k];

    let left = predecessor_index(x, xc - l)?;
    let (xl, pl) = (x[left], dp[left]);
    let sl = slope(pc - pl, xc - xl)?;

    let right = predecessor_index(x, xc + l)?;
    let (xr, pr) = (x[right], dp[right]);
    let sr = slope(pr - pc, xr - xc).unwrap_or(sl);

    let d = ((xr - xc) * sl + (xc - xl) * sr) / (xr - xl);
    d.is_finite().then_some(d)
}

/// dy/dx, undefined for a zero-width or non-finite interval.
fn slope(dy: f64, dx: f64) -> Option<f64> {
    if dx == 0.0 {
        return None;
    }
    let s = dy / dx;
    s.is_finite().then_some(s)
}
