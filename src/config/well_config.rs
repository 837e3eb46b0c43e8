//! Well Test Configuration - reservoir constants and analysis settings as TOML values
//!
//! Each section struct implements `Default` with the values in
//! [`super::defaults`], so an empty or missing file yields a complete config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::types::TestType;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "WELLTEST_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "well_test.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a well test analysis.
///
/// Load with `WellConfig::load()` which searches:
/// 1. `$WELLTEST_CONFIG` env var
/// 2. `./well_test.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WellConfig {
    /// Well identification
    #[serde(default)]
    pub well: WellInfo,

    /// Reservoir, fluid and completion constants
    #[serde(default)]
    pub reservoir: ReservoirConfig,

    /// Analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Closed-form estimator constants
    #[serde(default)]
    pub estimator: EstimatorConfig,

    /// Pressure log column names
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl WellConfig {
    /// Load configuration using the standard search order:
    /// 1. `$WELLTEST_CONFIG` environment variable
    /// 2. `./well_test.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), well = %config.well.name, "Loaded well test config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./well_test.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(well = %config.well.name, "Loaded well test config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are reported as warnings, never as errors.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in &super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Well test config saved");
        Ok(())
    }

    /// Validate all values for physical plausibility.
    ///
    /// Rules:
    /// - Rate, viscosity, thickness, FVF, compressibility, radius must be > 0
    /// - Porosity must lie in (0, 1]
    /// - Estimator divisors must be > 0
    /// - Band fraction must lie in (0, 1)
    /// - Every value must be finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let r = &self.reservoir;
        Self::check_positive(r.formation_volume_factor, "reservoir.formation_volume_factor", &mut errors);
        Self::check_positive(r.viscosity_cp, "reservoir.viscosity_cp", &mut errors);
        Self::check_positive(r.flow_rate_stb_d, "reservoir.flow_rate_stb_d", &mut errors);
        Self::check_positive(r.net_thickness_ft, "reservoir.net_thickness_ft", &mut errors);
        Self::check_positive(r.total_compressibility, "reservoir.total_compressibility", &mut errors);
        Self::check_positive(r.wellbore_radius_ft, "reservoir.wellbore_radius_ft", &mut errors);
        Self::check_positive(r.initial_pressure_psi, "reservoir.initial_pressure_psi", &mut errors);
        if !(r.porosity > 0.0 && r.porosity <= 1.0) {
            errors.push(format!(
                "reservoir.porosity ({}) must be in (0, 1]",
                r.porosity
            ));
        }

        let a = &self.analysis;
        if !a.smoothing_l.is_finite() {
            errors.push(format!("analysis.smoothing_l must be finite (got {})", a.smoothing_l));
        }
        if !(a.flat_band_fraction > 0.0 && a.flat_band_fraction < 1.0) {
            errors.push(format!(
                "analysis.flat_band_fraction ({}) must be in (0, 1)",
                a.flat_band_fraction
            ));
        }

        let e = &self.estimator;
        Self::check_positive(e.permeability_coefficient, "estimator.permeability_coefficient", &mut errors);
        Self::check_positive(e.skin_coefficient, "estimator.skin_coefficient", &mut errors);
        Self::check_positive(e.ln10, "estimator.ln10", &mut errors);
        Self::check_positive(e.unit_slope_reference_time_hr, "estimator.unit_slope_reference_time_hr", &mut errors);
        Self::check_positive(e.storage_time_factor, "estimator.storage_time_factor", &mut errors);
        if !e.skin_offset.is_finite() {
            errors.push(format!("estimator.skin_offset must be finite (got {})", e.skin_offset));
        }

        // Physical range warnings
        for w in &super::validation::validate_physical_ranges(self) {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        // NaN comparisons silently pass, so check finiteness first
        if !value.is_finite() {
            errors.push(format!("{name} must be finite (got {value})"));
            return;
        }
        if value <= 0.0 {
            errors.push(format!("{name} ({value}) must be > 0"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Well Info
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WellInfo {
    #[serde(default = "default_well_name")]
    pub name: String,
    #[serde(default)]
    pub field: String,
}

fn default_well_name() -> String {
    "Unnamed-Well".to_string()
}

impl Default for WellInfo {
    fn default() -> Self {
        Self {
            name: default_well_name(),
            field: String::new(),
        }
    }
}

// ============================================================================
// Reservoir
// ============================================================================

/// Reservoir, fluid and completion constants (field units).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservoirConfig {
    /// Formation volume factor B (rb/STB)
    #[serde(default = "default_fvf")]
    pub formation_volume_factor: f64,

    /// Fluid viscosity μ (cp)
    #[serde(default = "default_viscosity")]
    pub viscosity_cp: f64,

    /// Draw-down rate q (STB/D)
    #[serde(default = "default_rate")]
    pub flow_rate_stb_d: f64,

    /// Net thickness h (ft)
    #[serde(default = "default_thickness")]
    pub net_thickness_ft: f64,

    /// Porosity φ (fraction)
    #[serde(default = "default_porosity")]
    pub porosity: f64,

    /// Initial reservoir pressure Pi (psi)
    #[serde(default = "default_initial_pressure")]
    pub initial_pressure_psi: f64,

    /// Total compressibility ct (1/psi)
    #[serde(default = "default_compressibility")]
    pub total_compressibility: f64,

    /// Wellbore radius rw (ft)
    #[serde(default = "default_wellbore_radius")]
    pub wellbore_radius_ft: f64,
}

fn default_fvf() -> f64 { defaults::FORMATION_VOLUME_FACTOR }
fn default_viscosity() -> f64 { defaults::VISCOSITY_CP }
fn default_rate() -> f64 { defaults::FLOW_RATE_STB_D }
fn default_thickness() -> f64 { defaults::NET_THICKNESS_FT }
fn default_porosity() -> f64 { defaults::POROSITY }
fn default_initial_pressure() -> f64 { defaults::INITIAL_PRESSURE_PSI }
fn default_compressibility() -> f64 { defaults::TOTAL_COMPRESSIBILITY }
fn default_wellbore_radius() -> f64 { defaults::WELLBORE_RADIUS_FT }

impl Default for ReservoirConfig {
    fn default() -> Self {
        Self {
            formation_volume_factor: default_fvf(),
            viscosity_cp: default_viscosity(),
            flow_rate_stb_d: default_rate(),
            net_thickness_ft: default_thickness(),
            porosity: default_porosity(),
            initial_pressure_psi: default_initial_pressure(),
            total_compressibility: default_compressibility(),
            wellbore_radius_ft: default_wellbore_radius(),
        }
    }
}

// ============================================================================
// Analysis
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Flow period to analyse
    #[serde(default)]
    pub test_type: TestType,

    /// Bourdet smoothing half-width L (natural-log cycles)
    #[serde(default = "default_smoothing_l")]
    pub smoothing_l: f64,

    /// Band around m (fraction) for draw-down skin fitting
    #[serde(default = "default_flat_band_fraction")]
    pub flat_band_fraction: f64,
}

fn default_smoothing_l() -> f64 { defaults::SMOOTHING_L }
fn default_flat_band_fraction() -> f64 { defaults::FLAT_BAND_FRACTION }

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            test_type: TestType::default(),
            smoothing_l: default_smoothing_l(),
            flat_band_fraction: default_flat_band_fraction(),
        }
    }
}

// ============================================================================
// Estimator
// ============================================================================

/// Constants of the closed-form parameter equations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EstimatorConfig {
    /// k = coefficient·q·B·μ / (h·m)
    #[serde(default = "default_permeability_coefficient")]
    pub permeability_coefficient: f64,

    /// Leading factor of the skin equation
    #[serde(default = "default_skin_coefficient")]
    pub skin_coefficient: f64,

    /// ln(10) as used in the skin equation
    #[serde(default = "default_ln10")]
    pub ln10: f64,

    /// Constant term of the skin equation
    #[serde(default = "default_skin_offset")]
    pub skin_offset: f64,

    /// Effective time (hr) at which Der is read off the unit-slope line.
    /// C = q·B·t_ref / (24·Der).
    #[serde(default = "default_reference_time")]
    pub unit_slope_reference_time_hr: f64,

    /// Hours per day in the storage equation
    #[serde(default = "default_storage_time_factor")]
    pub storage_time_factor: f64,

    /// Include q·B in the storage equation
    #[serde(default = "default_storage_includes_rate")]
    pub storage_includes_rate: bool,
}

fn default_permeability_coefficient() -> f64 { defaults::PERMEABILITY_COEFFICIENT }
fn default_skin_coefficient() -> f64 { defaults::SKIN_COEFFICIENT }
fn default_ln10() -> f64 { defaults::LN10 }
fn default_skin_offset() -> f64 { defaults::SKIN_OFFSET }
fn default_reference_time() -> f64 { defaults::UNIT_SLOPE_REFERENCE_TIME_HR }
fn default_storage_time_factor() -> f64 { defaults::STORAGE_TIME_FACTOR }
fn default_storage_includes_rate() -> bool { true }

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            permeability_coefficient: default_permeability_coefficient(),
            skin_coefficient: default_skin_coefficient(),
            ln10: default_ln10(),
            skin_offset: default_skin_offset(),
            unit_slope_reference_time_hr: default_reference_time(),
            storage_time_factor: default_storage_time_factor(),
            storage_includes_rate: default_storage_includes_rate(),
        }
    }
}

// ============================================================================
// Ingest
// ============================================================================

/// Column names of the delimited pressure log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestConfig {
    /// Combined date-time column (preferred when present)
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,

    /// Date column, combined with `time_column`
    #[serde(default = "default_date_column")]
    pub date_column: String,

    /// Time-of-day column
    #[serde(default = "default_time_column")]
    pub time_column: String,

    /// Pressure column
    #[serde(default = "default_pressure_column")]
    pub pressure_column: String,
}

fn default_timestamp_column() -> String { defaults::TIMESTAMP_COLUMN.to_string() }
fn default_date_column() -> String { defaults::DATE_COLUMN.to_string() }
fn default_time_column() -> String { defaults::TIME_COLUMN.to_string() }
fn default_pressure_column() -> String { defaults::PRESSURE_COLUMN.to_string() }

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            timestamp_column: default_timestamp_column(),
            date_column: default_date_column(),
            time_column: default_time_column(),
            pressure_column: default_pressure_column(),
        }
    }
}
