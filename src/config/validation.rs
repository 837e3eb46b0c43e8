//! Config validation: unknown-key detection with Levenshtein suggestions
//! and plausibility checks on reservoir constants.
//!
//! The raw TOML is first parsed into a `toml::Value`, its key tree compared
//! against the known field names, and a warning with a "did you mean?"
//! suggestion emitted for each stranger. Normal serde deserialization runs
//! afterwards. Warnings never break a config.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for WellConfig.
///
/// Must be kept in step with the struct hierarchy in well_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [well]
        "well",
        "well.name",
        "well.field",
        // [reservoir]
        "reservoir",
        "reservoir.formation_volume_factor",
        "reservoir.viscosity_cp",
        "reservoir.flow_rate_stb_d",
        "reservoir.net_thickness_ft",
        "reservoir.porosity",
        "reservoir.initial_pressure_psi",
        "reservoir.total_compressibility",
        "reservoir.wellbore_radius_ft",
        // [analysis]
        "analysis",
        "analysis.test_type",
        "analysis.smoothing_l",
        "analysis.flat_band_fraction",
        // [estimator]
        "estimator",
        "estimator.permeability_coefficient",
        "estimator.skin_coefficient",
        "estimator.ln10",
        "estimator.skin_offset",
        "estimator.unit_slope_reference_time_hr",
        "estimator.storage_time_factor",
        "estimator.storage_includes_rate",
        // [ingest]
        "ingest",
        "ingest.timestamp_column",
        "ingest.date_column",
        "ingest.time_column",
        "ingest.pressure_column",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1)
                .min(curr[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties are broken alphabetically so the suggestion is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let mut warnings = Vec::new();

    for key in walk_toml_keys(&value, "") {
        if !known.contains(key.as_str()) {
            let suggestion = suggest_correction(&key, &known);
            let message = format!("Unknown config key '{key}'");
            warnings.push(ValidationWarning {
                field: key,
                message,
                suggestion,
            });
        }
    }

    warnings
}

// ============================================================================
// Physical Range Warnings
// ============================================================================

/// Flag values that are legal but unusual for an oil well test.
///
/// Hard errors (non-positive, non-finite) are raised by `WellConfig::validate`.
pub fn validate_physical_ranges(config: &super::WellConfig) -> Vec<ValidationWarning> {
    let r = &config.reservoir;
    let l = config.analysis.smoothing_l;

    let mut warnings: Vec<ValidationWarning> = [
        range_warning("reservoir.formation_volume_factor", r.formation_volume_factor, 1.0, 3.0, " rb/STB"),
        range_warning("reservoir.viscosity_cp", r.viscosity_cp, 0.05, 1000.0, " cp"),
        range_warning("reservoir.porosity", r.porosity, 0.01, 0.45, ""),
        range_warning("reservoir.total_compressibility", r.total_compressibility, 1e-7, 1e-3, " 1/psi"),
        range_warning("reservoir.wellbore_radius_ft", r.wellbore_radius_ft, 0.1, 1.0, " ft"),
        range_warning("reservoir.initial_pressure_psi", r.initial_pressure_psi, 100.0, 30_000.0, " psi"),
    ]
    .into_iter()
    .flatten()
    .collect();

    if l.is_finite() && l <= 0.0 {
        warnings.push(ValidationWarning {
            field: "analysis.smoothing_l".to_string(),
            message: format!(
                "analysis.smoothing_l = {l} is not positive; nearly every derivative value will be undefined"
            ),
            suggestion: None,
        });
    } else {
        warnings.extend(range_warning("analysis.smoothing_l", l, 0.01, 1.0, " log cycles"));
    }

    warnings
}

fn range_warning(field: &str, value: f64, lo: f64, hi: f64, unit: &str) -> Option<ValidationWarning> {
    if value.is_finite() && (value < lo || value > hi) {
        Some(ValidationWarning {
            field: field.to_string(),
            message: format!("{field} = {value} is outside typical range ({lo}-{hi}{unit})"),
            suggestion: None,
        })
    } else {
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
