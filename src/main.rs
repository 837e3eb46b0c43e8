//! welltest-pta - Well Test Pressure Transient Analysis
//!
//! Command-line front end for draw-down / build-up interpretation.
//!
//! # Usage
//!
//! ```bash
//! # Generate a synthetic test log
//! welltest-pta simulate --out test.csv --slope 50 --noise-psi 0.2
//!
//! # Interpret it (boundaries as sample indices or timestamps)
//! welltest-pta analyze --csv test.csv --dd-start 12 --dd-end 156 --bu-end 444 \
//!     --slope 50 --unit-slope-intercept 0.01 --derivative-out derivative.csv
//!
//! # Print the effective configuration
//! welltest-pta show-config
//! ```
//!
//! # Environment Variables
//!
//! - `WELLTEST_CONFIG`: Path to the well test TOML config
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use welltest_pta::analysis::run_analysis;
use welltest_pta::config::WellConfig;
use welltest_pta::ingest::{parse_timestamp, read_pressure_log, write_pressure_log};
use welltest_pta::report::{write_derivative_csv, AnalysisReport};
use welltest_pta::session::FitSession;
use welltest_pta::synthetic::SyntheticTest;
use welltest_pta::types::{PeriodBoundaries, Sample, TestParameters, TestType};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "welltest-pta")]
#[command(about = "Well test pressure transient analysis")]
#[command(version)]
struct CliArgs {
    /// Path to a well test TOML config (overrides WELLTEST_CONFIG / ./well_test.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Interpret a draw-down / build-up pressure log
    Analyze {
        /// Pressure log CSV
        #[arg(long)]
        csv: PathBuf,
        /// Draw-down start (sample index or timestamp)
        #[arg(long)]
        dd_start: Boundary,
        /// Draw-down end / shut-in (sample index or timestamp)
        #[arg(long)]
        dd_end: Boundary,
        /// Build-up end (sample index or timestamp)
        #[arg(long)]
        bu_end: Boundary,
        /// Analysed period (buildup | drawdown); defaults to the config value
        #[arg(long)]
        test_type: Option<TestType>,
        /// Bourdet smoothing half-width L; defaults to the config value
        #[arg(long)]
        smoothing_l: Option<f64>,
        /// Semilog slope m read off the derivative plot
        #[arg(long)]
        slope: Option<f64>,
        /// Unit-slope line value Der at the reference time
        #[arg(long)]
        unit_slope_intercept: Option<f64>,
        /// Write the derivative table to this CSV file
        #[arg(long)]
        derivative_out: Option<PathBuf>,
        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Generate a synthetic radial-flow test log
    Simulate {
        /// Output CSV path
        #[arg(long, short)]
        out: PathBuf,
        /// Semilog slope m (psi per natural-log cycle)
        #[arg(long, default_value = "50")]
        slope: f64,
        /// Draw-down duration (hours)
        #[arg(long, default_value = "12")]
        drawdown_hours: f64,
        /// Build-up duration (hours)
        #[arg(long, default_value = "24")]
        buildup_hours: f64,
        /// Sampling interval (minutes)
        #[arg(long, default_value = "5")]
        step_minutes: f64,
        /// Gaussian gauge noise (psi)
        #[arg(long, default_value = "0")]
        noise_psi: f64,
        /// Random seed for reproducible noise
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

/// A period boundary given either as a sample index or a timestamp.
#[derive(Debug, Clone, Copy)]
enum Boundary {
    Index(usize),
    Timestamp(NaiveDateTime),
}

impl FromStr for Boundary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(idx) = s.trim().parse::<usize>() {
            return Ok(Self::Index(idx));
        }
        parse_timestamp(s)
            .map(Self::Timestamp)
            .ok_or_else(|| format!("'{s}' is neither a sample index nor a timestamp"))
    }
}

impl Boundary {
    fn resolve(self, samples: &[Sample], name: &str) -> Result<NaiveDateTime> {
        match self {
            Self::Timestamp(ts) => Ok(ts),
            Self::Index(idx) => samples
                .get(idx)
                .map(|s| s.timestamp)
                .with_context(|| format!("{name} index {idx} is out of range for {} samples", samples.len())),
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<WellConfig> {
    match path {
        Some(p) => WellConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(WellConfig::load()),
    }
}

#[allow(clippy::too_many_arguments)]
fn analyze(
    config: &WellConfig,
    csv: &Path,
    bounds: [Boundary; 3],
    test_type: Option<TestType>,
    smoothing_l: Option<f64>,
    slope: Option<f64>,
    unit_slope_intercept: Option<f64>,
    derivative_out: Option<&Path>,
    json: bool,
) -> Result<()> {
    let mut params = TestParameters::from_config(config);
    if let Some(t) = test_type {
        params = params.with_test_type(t);
    }
    if let Some(l) = smoothing_l {
        params = params.with_smoothing(l);
    }

    let samples = read_pressure_log(csv, &config.ingest)
        .with_context(|| format!("Failed to read pressure log {}", csv.display()))?;

    let [dd_start, dd_end, bu_end] = bounds;
    let boundaries = PeriodBoundaries::new(
        dd_start.resolve(&samples, "dd_start")?,
        dd_end.resolve(&samples, "dd_end")?,
        bu_end.resolve(&samples, "bu_end")?,
    )?;

    let run = run_analysis(&samples, &boundaries, &params).context("Analysis failed")?;

    let mut session = FitSession::new();
    if let Some(m) = slope {
        session.set_slope(m);
    }
    if let Some(der) = unit_slope_intercept {
        session.set_unit_slope_intercept(der);
    }
    if slope.is_none() && unit_slope_intercept.is_none() {
        warn!("No --slope or --unit-slope-intercept given; only the derivative is computed");
    }

    if let Some(path) = derivative_out {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_derivative_csv(BufWriter::new(file), &run.derivative)
            .with_context(|| format!("Failed to write derivative table {}", path.display()))?;
        info!(path = %path.display(), records = run.derivative.len(), "Derivative table written");
    }

    let report = AnalysisReport::new(&config.well, &run, session.inputs(), session.estimate(&run));
    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{report}");
    }
    Ok(())
}

fn simulate(config: &WellConfig, generator: SyntheticTest, out: &Path) -> Result<()> {
    let generator = SyntheticTest {
        initial_pressure_psi: config.reservoir.initial_pressure_psi,
        ..generator
    };
    let log = generator.generate()?;

    let file = File::create(out).with_context(|| format!("Failed to create {}", out.display()))?;
    write_pressure_log(BufWriter::new(file), &log.samples)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    let index_of = |ts: NaiveDateTime| log.samples.iter().position(|s| s.timestamp == ts);
    let b = log.boundaries;
    println!("Wrote {} samples to {}", log.samples.len(), out.display());
    for (name, ts) in [("dd-start", b.dd_start), ("dd-end", b.dd_end), ("bu-end", b.bu_end)] {
        match index_of(ts) {
            Some(i) => println!("  --{name} {i}    ({ts})"),
            None => println!("  --{name} \"{ts}\""),
        }
    }
    Ok(())
}

// ============================================================================
// Entry Point
// ============================================================================

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if args.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    }

    let config = load_config(args.config.as_deref())?;

    match args.command {
        SubCommand::Analyze {
            csv,
            dd_start,
            dd_end,
            bu_end,
            test_type,
            smoothing_l,
            slope,
            unit_slope_intercept,
            derivative_out,
            json,
        } => analyze(
            &config,
            &csv,
            [dd_start, dd_end, bu_end],
            test_type,
            smoothing_l,
            slope,
            unit_slope_intercept,
            derivative_out.as_deref(),
            json,
        ),
        SubCommand::Simulate {
            out,
            slope,
            drawdown_hours,
            buildup_hours,
            step_minutes,
            noise_psi,
            seed,
        } => simulate(
            &config,
            SyntheticTest {
                slope_psi: slope,
                drawdown_hours,
                buildup_hours,
                step_minutes,
                noise_psi,
                seed,
                ..SyntheticTest::default()
            },
            &out,
        ),
        SubCommand::ShowConfig => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
