/*!
 * Quench CLI - replay governor timelines and pool scripts
 *
 * Author: Shane Wall <shaneawall@gmail.com>
 */

use clap::{Parser, Subcommand, ValueEnum};
use quench::{
    config::{LogLevel, QuenchConfig},
    error::{QuenchError, Result, EXIT_SUCCESS},
    governor::{GovernorConfig, GovernorMode},
    logging,
    simulate::{replay_governor, run_pool_script, PoolOp},
};
use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

#[derive(Parser)]
#[command(name = "quench")]
#[command(version, about = "Object pooling and debounce/throttle governors", long_about = None)]
struct Cli {
    /// Load settings from a TOML file (CLI flags override it)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging (same as --log-level debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Write JSON logs to this file instead of stderr
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay trigger offsets through a debounce or throttle governor
    Governor {
        /// Governor mode
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Interval in milliseconds
        #[arg(short, long, value_name = "MS")]
        interval: Option<u64>,

        /// Debounce only: also fire on the first trigger of a burst
        #[arg(long)]
        immediate: bool,

        /// Trigger offsets in milliseconds, non-decreasing (e.g. 0,30,60)
        #[arg(long, value_delimiter = ',', required = true, value_name = "MS,...")]
        at: Vec<u64>,

        /// Cancel at this offset
        #[arg(long, value_name = "MS")]
        cancel_at: Option<u64>,
    },

    /// Run an acquire/release script against a pool
    Pool {
        /// Maximum objects the pool may construct (default: from config, else unbounded)
        #[arg(short, long)]
        capacity: Option<usize>,

        /// Objects to construct up front
        #[arg(long)]
        prewarm: Option<usize>,

        /// Script: a = acquire, r<n> = release ticket n, f = release a foreign handle
        #[arg(long, value_delimiter = ',', required = true, value_name = "OP,...")]
        ops: Vec<PoolOp>,
    },

    /// Print a configuration preset as TOML
    Config {
        /// Preset name
        #[arg(long, value_enum, default_value = "default")]
        preset: PresetArg,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Debounce,
    Throttle,
}

impl From<ModeArg> for GovernorMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Debounce => GovernorMode::Debounce,
            ModeArg::Throttle => GovernorMode::Throttle,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PresetArg {
    Default,
    UiInput,
    Burst,
}

impl From<PresetArg> for QuenchConfig {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Default => QuenchConfig::default(),
            PresetArg::UiInput => QuenchConfig::ui_input_preset(),
            PresetArg::Burst => QuenchConfig::burst_preset(),
        }
    }
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => QuenchConfig::from_file(path)?,
        None => QuenchConfig::default(),
    };

    // CLI flags override config file
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if cli.verbose {
        config.verbose = true;
    }
    if cli.log_file.is_some() {
        config.log_file = cli.log_file.clone();
    }

    logging::init_logging(&config)?;
    debug!(config_file = ?cli.config, "configuration loaded");

    match cli.command {
        Commands::Governor {
            mode,
            interval,
            immediate,
            at,
            cancel_at,
        } => {
            let mut governor = config.governor.clone();
            if let Some(mode) = mode {
                governor.mode = mode.into();
            }
            if let Some(ms) = interval {
                governor.interval = Duration::from_millis(ms);
            }
            if immediate {
                governor.immediate = true;
            }
            run_governor(&governor, &at, cancel_at, cli.json)
        }
        Commands::Pool {
            capacity,
            prewarm,
            ops,
        } => {
            let mut pool = config.pool.clone();
            if capacity.is_some() {
                pool.capacity = capacity;
            }
            if let Some(n) = prewarm {
                pool.prewarm = n;
            }
            pool.validate()
                .map_err(|e| QuenchError::Config(e.to_string()))?;
            let report = run_pool_script(&pool, &ops)?;
            emit(&report, cli.json)
        }
        Commands::Config { preset } => {
            let preset = QuenchConfig::from(preset);
            print!("{}", preset.to_toml()?);
            Ok(())
        }
    }
}

fn run_governor(
    config: &GovernorConfig,
    at: &[u64],
    cancel_at: Option<u64>,
    json: bool,
) -> Result<()> {
    config
        .validate()
        .map_err(|e| QuenchError::Config(e.to_string()))?;
    let report = replay_governor(config, at, cancel_at)?;
    emit(&report, json)
}

fn emit<R: Serialize + Display>(report: &R, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}
