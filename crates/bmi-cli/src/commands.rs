use std::path::Path;

use anyhow::{Context, Result, anyhow};
use bmi_core::{
    ComputeError, ConsentDecision, HELP_LINES, Intent, PersistenceError, Session, SessionConfig,
    TextKey, TourStep, Updated, ValidationErrors,
};
use chrono::Utc;
use tracing::{debug, info};

use crate::cli::{
    CalcArgs, ConsentAction, HistoryArgs, KeyArgs, LocaleAction, SettingsAction, TourAction,
};
use bmi_cli::summary::{environment_table, history_table, result_line, settings_table};

pub async fn run_calc(session: &mut Session, args: &CalcArgs) -> Result<()> {
    debug!(weight = %args.weight, height = %args.height, "calculating");
    let calculation = match session.calculate(&args.weight, &args.height).await {
        Ok(calculation) => calculation,
        Err(ComputeError::Invalid(errors)) => {
            return Err(anyhow!(invalid_input_message(session, &errors)));
        }
        Err(error) => return Err(error.into()),
    };
    if let Some(error) = &calculation.persist_error {
        report_persist_error(error);
    }
    println!(
        "{}",
        result_line(session, calculation.result.value, calculation.result.category)
    );
    Ok(())
}

fn invalid_input_message(session: &Session, errors: &ValidationErrors) -> String {
    errors
        .iter()
        .map(|error| {
            let text = session
                .field_error_text(error.field)
                .unwrap_or_else(|| error.to_string());
            format!("{text} ({error})")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn run_history(session: &mut Session, args: &HistoryArgs) -> Result<()> {
    if args.clear {
        report_unsaved(&session.clear_history());
        println!("History cleared.");
        return Ok(());
    }
    if session.history().is_empty() {
        println!("{}", session.text(TextKey::NoResultsYet));
        return Ok(());
    }
    println!("{}", session.text(TextKey::LastResults));
    println!("{}", history_table(session, Utc::now()));
    Ok(())
}

pub fn run_settings(session: &mut Session, action: Option<&SettingsAction>) -> Result<()> {
    match action {
        None | Some(SettingsAction::Show) => {}
        Some(SettingsAction::Toggle { setting }) => {
            let updated = session.toggle_setting(*setting);
            report_unsaved(&updated);
            info!(%setting, enabled = updated.value.flag(*setting), "setting changed");
        }
        Some(SettingsAction::TextSize { delta }) => {
            report_unsaved(&session.set_text_size(*delta));
        }
        Some(SettingsAction::Env) => {
            println!("{}", environment_table(session.environment()));
            return Ok(());
        }
    }
    println!("{}", settings_table(session));
    Ok(())
}

pub fn run_locale(session: &mut Session, action: Option<&LocaleAction>) -> Result<()> {
    match action {
        None | Some(LocaleAction::Show) => {}
        Some(LocaleAction::Toggle) => report_unsaved(&session.toggle_locale()),
        Some(LocaleAction::Set { locale }) => report_unsaved(&session.set_locale(*locale)),
    }
    println!(
        "{} ({}) - {}",
        session.locale(),
        session.direction(),
        session.text(TextKey::Title)
    );
    Ok(())
}

pub fn run_consent(session: &mut Session, action: Option<&ConsentAction>) -> Result<()> {
    let decision = match action {
        None | Some(ConsentAction::Show) => None,
        Some(ConsentAction::Accept) => Some(ConsentDecision::Accepted),
        Some(ConsentAction::Reject) => Some(ConsentDecision::Rejected),
    };
    if let Some(decision) = decision {
        report_unsaved(&session.record_consent(decision));
    }
    match session.consent() {
        Some(decision) => println!("Cookie consent: {decision}"),
        None => {
            println!("{}", session.text(TextKey::CookieMessage));
            println!(
                "Run `bmi consent accept` ({}) or `bmi consent reject` ({}).",
                session.text(TextKey::AcceptCookies),
                session.text(TextKey::RejectCookies)
            );
        }
    }
    Ok(())
}

pub fn run_tour(session: &mut Session, action: Option<&TourAction>) -> Result<()> {
    match action {
        None | Some(TourAction::Status) => {}
        Some(TourAction::Next) => {
            let _ = session.tour_mut().advance();
        }
        Some(TourAction::Skip) => session.tour_mut().skip(),
    }

    let tour = session.tour();
    match (tour.current(), tour.position()) {
        (Some(step), Some(position)) => {
            let next = if tour.is_last_step() {
                TextKey::FinishTour
            } else {
                TextKey::NextStep
            };
            println!(
                "[{}/{}] {}",
                position + 1,
                TourStep::ALL.len(),
                session.text(step.title_key())
            );
            println!("{}", session.text(step.body_key()));
            println!(
                "`bmi tour next` ({}) or `bmi tour skip` ({})",
                session.text(next),
                session.text(TextKey::SkipTour)
            );
        }
        _ => println!("Tour completed."),
    }
    Ok(())
}

pub fn run_key(session: &mut Session, args: &KeyArgs) -> Result<()> {
    match session.handle_key(args.key, args.typing) {
        Some(Intent::ToggleLocale) => {
            println!("{} ({})", session.locale(), session.direction());
        }
        Some(Intent::OpenAccessibilityPanel) => {
            println!("{}", settings_table(session));
        }
        Some(Intent::ShowHelp) => print_shortcuts(session),
        None => println!("No shortcut for '{}'.", args.key),
    }
    session.close_overlays();
    Ok(())
}

pub fn run_shortcuts(session: &Session) -> Result<()> {
    print_shortcuts(session);
    Ok(())
}

fn print_shortcuts(session: &Session) {
    println!("{}", session.text(TextKey::KeyboardShortcuts));
    for key in HELP_LINES {
        println!("  {}", session.text(key));
    }
}

pub fn run_config(config: &SessionConfig, path: Option<&Path>) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("render configuration")?;
    if let Some(path) = path {
        println!("# {}", path.display());
    }
    println!("# storage: {}", config.resolved_storage_dir().display());
    print!("{rendered}");
    Ok(())
}

fn report_unsaved<T>(updated: &Updated<T>) {
    if let Some(error) = &updated.persist_error {
        report_persist_error(error);
    }
}

pub fn report_persist_error(error: &PersistenceError) {
    eprintln!("warning: {}", error.user_message());
    if let Some(suggestion) = error.suggestion() {
        eprintln!("  hint: {suggestion}");
    }
}
