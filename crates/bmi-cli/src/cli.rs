//! CLI argument definitions for BMI Studio.

use std::path::PathBuf;

use bmi_core::{Locale, Setting};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "bmi",
    version,
    about = "BMI Studio - Calculate BMI and keep a short history",
    long_about = "Calculate body-mass index from weight and height.\n\n\
                  Keeps the last five results, accessibility preferences,\n\
                  language and onboarding state between runs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Directory holding stored state (overrides the config file).
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (default: platform config dir).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Skip the simulated calculation latency.
    #[arg(long = "no-delay", global = true)]
    pub no_delay: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Calculate BMI and add it to the history.
    Calc(CalcArgs),

    /// Show the previous results.
    History(HistoryArgs),

    /// Show or change accessibility settings.
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Show or change the interface language.
    Locale {
        #[command(subcommand)]
        action: Option<LocaleAction>,
    },

    /// Show or record the cookie-consent decision.
    Consent {
        #[command(subcommand)]
        action: Option<ConsentAction>,
    },

    /// Walk through the guided tour.
    Tour {
        #[command(subcommand)]
        action: Option<TourAction>,
    },

    /// Press a keyboard shortcut (L, A or ?).
    Key(KeyArgs),

    /// List keyboard shortcuts.
    Shortcuts,

    /// Show the effective configuration.
    Config,
}

#[derive(Args)]
pub struct CalcArgs {
    /// Weight in kilograms.
    #[arg(long = "weight", short = 'w', value_name = "KG", allow_negative_numbers = true)]
    pub weight: String,

    /// Height in centimeters.
    #[arg(long = "height", short = 'H', value_name = "CM", allow_negative_numbers = true)]
    pub height: String,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Delete every stored result.
    #[arg(long = "clear")]
    pub clear: bool,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show every setting.
    Show,

    /// Flip a boolean setting.
    Toggle {
        /// Setting name (e.g. dark-mode, highlight-links).
        #[arg(value_name = "SETTING")]
        setting: Setting,
    },

    /// Move the text size by a number of steps.
    TextSize {
        #[arg(value_name = "DELTA", allow_negative_numbers = true)]
        delta: i8,
    },

    /// Show the applied display attributes.
    Env,
}

#[derive(Subcommand)]
pub enum LocaleAction {
    /// Show the current language and direction.
    Show,

    /// Switch to the other language.
    Toggle,

    /// Choose a language.
    Set {
        #[arg(value_name = "CODE")]
        locale: Locale,
    },
}

#[derive(Subcommand)]
pub enum ConsentAction {
    Show,
    Accept,
    Reject,
}

#[derive(Subcommand)]
pub enum TourAction {
    /// Show the current step.
    Status,

    /// Go to the next step.
    Next,

    /// End the tour.
    Skip,
}

#[derive(Args)]
pub struct KeyArgs {
    #[arg(value_name = "KEY")]
    pub key: char,

    /// Treat the key as typed into an input field.
    #[arg(long = "typing")]
    pub typing: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
