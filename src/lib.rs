//! welltest-pta: Well Test Pressure Transient Analysis
//!
//! Interprets a constant-rate draw-down followed by a shut-in build-up from a
//! bottom-hole gauge record.
//!
//! ## Architecture
//!
//! - **Analysis**: windowing, effective-time normalization, Bourdet
//!   derivative and closed-form parameter estimation
//! - **Session**: caller-owned state for the externally fitted slope and
//!   unit-slope intercept
//! - **Ingest / Report**: CSV gauge logs in, text/JSON/CSV results out
//! - **Synthetic**: radial-flow test generator for demos and regression runs

pub mod analysis;
pub mod config;
pub mod error;
pub mod ingest;
pub mod report;
pub mod session;
pub mod synthetic;
pub mod types;

// Re-export well configuration
pub use config::WellConfig;

// Re-export commonly used types
pub use types::{
    DerivativeRecord, DerivativeSeries, Estimate, FitInputs, ParameterEstimate, PeriodBoundaries,
    PreparedParameters, PreparedRecord, PreparedSeries, Sample, TestParameters, TestType,
    WindowedSeries,
};

pub use analysis::{run_analysis, AnalysisRun};
pub use error::{AnalysisError, AnalysisResult};
pub use report::AnalysisReport;
pub use session::FitSession;
pub use synthetic::{SyntheticLog, SyntheticTest};
