//! Predecessor search over sorted keys
//!
//! The Bourdet window edges are found by asking, for a query x, which sample
//! is the last one whose log-time does not exceed x. Keys are sorted, so this
//! is a right-biased binary search: O(log n) per query.

/// Index of the greatest element `≤ x` in `sorted`, or `None` if `x < sorted[0]`.
///
/// `sorted` must be non-decreasing. Equal keys resolve to the rightmost one.
/// A NaN query has no predecessor.
pub fn predecessor_index(sorted: &[f64], x: f64) -> Option<usize> {
    if x.is_nan() {
        return None;
    }
    // partition_point = number of leading elements ≤ x
    match sorted.partition_point(|&v| v <= x) {
        0 => None,
        n => Some(n - 1),
    }
}

/// Value of the greatest element `≤ x` in `sorted`.
pub fn predecessor(sorted: &[f64], x: f64) -> Option<f64> {
    predecessor_index(sorted, x).map(|i| sorted[i])
}

/// Value in `values` co-located with the predecessor of `x` in `keys`.
///
/// `keys` and `values` must be the same length.
pub fn predecessor_value(keys: &[f64], values: &[f64], x: f64) -> Option<f64> {
    predecessor_index(keys, x).and_then(|i| values.get(i).copied())
}
