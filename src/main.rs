//! Horizon viewer.
//!
//! ```bash
//! # Default scene, or ./config.json when present
//! horizon
//!
//! # Custom scene with debug logging mirrored to a file
//! horizon --config scenes/binary.json --log-level debug --log-file horizon.log
//!
//! # Write the default configuration and exit
//! horizon --save-config config.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use horizon::app::App;
use horizon::config::Config;
use horizon::logging::{self, parse_level, LogSettings};

#[derive(Parser, Debug)]
#[command(name = "horizon")]
#[command(version, about = "Black hole N-body simulation with a GPU ray tracer", long_about = None)]
struct Cli {
    /// JSON scene configuration
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Logging verbosity level, overriding the configuration
    #[arg(short, long)]
    log_level: Option<String>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the default configuration to this path and exit
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(path) = &cli.save_config {
        return match Config::default().save(path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    // Read before logging starts so the configured level applies, and
    // report any problem once the subscriber is up.
    let loaded = Config::from_file(&cli.config);
    let config_logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();

    let level_name = cli.log_level.as_deref().unwrap_or(&config_logging.level);
    let level = parse_level(level_name);
    let settings = LogSettings {
        level: level.unwrap_or(LogSettings::default().level),
        file: cli.log_file.clone().or_else(|| config_logging.file.clone()),
    };
    if let Err(e) = logging::init(&settings) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }
    if level.is_none() {
        warn!("Unknown log level '{}', using info", level_name);
    }

    let config = match loaded {
        Ok(config) => {
            info!("Loaded configuration from {}", cli.config.display());
            config
        }
        Err(e) => {
            warn!("{}; using defaults", e);
            Config::default()
        }
    };

    match App::new(config).run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
