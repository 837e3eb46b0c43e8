//! Built-in default constants.
//!
//! Values used when `well_test.toml` leaves a key unset. Grouped by the
//! config section they seed.

// ============================================================================
// Reservoir & Fluid
// ============================================================================

/// Oil formation volume factor Bo (rb/STB).
pub const FORMATION_VOLUME_FACTOR: f64 = 1.5;

/// Oil viscosity μo (cp).
pub const VISCOSITY_CP: f64 = 0.35;

/// Stabilised draw-down rate qo (STB/D).
pub const FLOW_RATE_STB_D: f64 = 800.0;

/// Net pay thickness h (ft).
pub const NET_THICKNESS_FT: f64 = 40.0;

/// Effective porosity φ (fraction).
pub const POROSITY: f64 = 0.12;

/// Initial reservoir pressure Pi (psi).
pub const INITIAL_PRESSURE_PSI: f64 = 5410.0;

/// Total compressibility ct (1/psi).
pub const TOTAL_COMPRESSIBILITY: f64 = 1e-5;

/// Wellbore radius rw (ft).
pub const WELLBORE_RADIUS_FT: f64 = 0.3;

// ============================================================================
// Analysis
// ============================================================================

/// Bourdet smoothing half-width L (natural-log cycles).
pub const SMOOTHING_L: f64 = 0.5;

/// Relative band around m used to pick flat derivative points for draw-down skin.
///
/// 0.10 = records whose derivative is within ±10% of m.
pub const FLAT_BAND_FRACTION: f64 = 0.10;

// ============================================================================
// Estimator (field units)
// ============================================================================

/// Radial flow constant in k = 70.6·q·B·μ / (h·m) (natural-log slope).
pub const PERMEABILITY_COEFFICIENT: f64 = 70.6;

/// Leading factor of the skin equation.
pub const SKIN_COEFFICIENT: f64 = 1.151;

/// ln(10), as written in the field-unit skin equation.
pub const LN10: f64 = 2.303;

/// Constant term of the skin equation.
pub const SKIN_OFFSET: f64 = 3.23;

/// Effective time (hours) at which the unit-slope intercept Der is read.
pub const UNIT_SLOPE_REFERENCE_TIME_HR: f64 = 1e-4;

/// Hours per day, converting STB/D to STB/hr in the storage equation.
pub const STORAGE_TIME_FACTOR: f64 = 24.0;

// ============================================================================
// Ingest
// ============================================================================

/// Combined timestamp column name.
pub const TIMESTAMP_COLUMN: &str = "DateTime";

/// Date column name (used with `TIME_COLUMN` when no combined column exists).
pub const DATE_COLUMN: &str = "Date";

/// Time-of-day column name.
pub const TIME_COLUMN: &str = "Time";

/// Pressure column name.
pub const PRESSURE_COLUMN: &str = "Press";
