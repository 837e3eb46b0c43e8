//! Well Test Configuration Module
//!
//! Provides per-test configuration loaded from TOML files: reservoir and
//! fluid constants, analysis settings, estimator constants and input column
//! names.
//!
//! ## Loading Order
//!
//! 1. `WELLTEST_CONFIG` environment variable (path to TOML file)
//! 2. `well_test.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The configuration is an ordinary value owned by the caller and passed
//! explicitly into each analysis run:
//!
//! ```ignore
//! let config = WellConfig::load();
//! let params = TestParameters::from_config(&config);
//! let run = analysis::run_analysis(&samples, &boundaries, &params)?;
//! ```

mod well_config;
pub mod defaults;
pub mod validation;

pub use well_config::*;
