//! BMI Studio CLI.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Result, bail};
use bmi_cli::logging::{LogConfig, LogFormat, init_logging};
use bmi_core::{Session, SessionConfig};
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{
    report_persist_error, run_calc, run_config, run_consent, run_history, run_key, run_locale, run_settings,
    run_shortcuts, run_tour,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let (config, config_path) = match load_config(&cli) {
        Ok(loaded) => loaded,
        Err(error) => {
            tracing::error!(%error, "unusable configuration");
            eprintln!("error: {error}");
            std::process::exit(2);
        }
    };

    let result = if let Command::Config = cli.command {
        run_config(&config, config_path.as_deref())
    } else {
        let mut session = Session::from_config(&config);
        for warning in session.startup_warnings() {
            report_persist_error(warning);
        }
        run_command(&mut session, &cli.command).await
    };

    let exit_code = match result {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error}");
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run_command(session: &mut Session, command: &Command) -> Result<()> {
    match command {
        Command::Calc(args) => run_calc(session, args).await,
        Command::History(args) => run_history(session, args),
        Command::Settings { action } => run_settings(session, action.as_ref()),
        Command::Locale { action } => run_locale(session, action.as_ref()),
        Command::Consent { action } => run_consent(session, action.as_ref()),
        Command::Tour { action } => run_tour(session, action.as_ref()),
        Command::Key(args) => run_key(session, args),
        Command::Shortcuts => run_shortcuts(session),
        Command::Config => Ok(()),
    }
}

/// Load the config file and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<(SessionConfig, Option<PathBuf>)> {
    let (mut config, path) = match &cli.config {
        Some(path) => {
            if !path.is_file() {
                bail!("config file not found: {}", path.display());
            }
            (SessionConfig::load_from(path), Some(path.clone()))
        }
        None => (SessionConfig::load(), SessionConfig::config_path()),
    };
    if let Some(dir) = &cli.data_dir {
        config.storage_dir = Some(dir.clone());
    }
    if cli.no_delay {
        config.compute_delay_ms = 0;
    }
    Ok((config, path))
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
