//! CLI command handling
//!
//! Builds the session, collects and runs it, and formats output.

use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::bdd::Feature;
use crate::commands::{Commands, SelectArgs};
use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::demo;
use crate::engine::{
    collect, collect::unregistered_tags, run, CollectOptions, Collection, ExitStatus, RunOptions,
    Selection, Session, Silent, TerminalReporter,
};

/// Dispatch a CLI command and return the process exit status
///
/// `Err` means the command could not start at all (bad configuration,
/// unreadable directories); the caller maps it to a usage error.
pub fn dispatch(command: Commands, config_path: Option<&Path>) -> Result<ExitStatus> {
    let cwd = std::env::current_dir()?;
    let config = Config::load(config_path, &cwd)?;

    match command {
        Commands::Run {
            select,
            exit_first,
            json,
            verbose,
        } => {
            let Some(session) = build_session(&config, &select, &cwd)? else {
                return Ok(ExitStatus::CollectionFailed);
            };
            let collection = collect(&session, &collect_options(&config, &select));
            if let Some(status) = check_collection(&collection) {
                return Ok(status);
            }

            let options = RunOptions {
                exit_first: exit_first || config.run.exit_first,
            };
            if json || config.run.json {
                let report = run(session.steps(), &collection, &options, &mut Silent);
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(report.exit_status())
            } else {
                let mut reporter = TerminalReporter::new(verbose);
                let report = run(session.steps(), &collection, &options, &mut reporter);
                Ok(report.exit_status())
            }
        }

        Commands::Collect { select, json } => {
            let Some(session) = build_session(&config, &select, &cwd)? else {
                return Ok(ExitStatus::CollectionFailed);
            };
            let collection = collect(&session, &collect_options(&config, &select));
            if let Some(status) = check_collection(&collection) {
                return Ok(status);
            }

            if !config.markers.strict {
                let unknown = unregistered_tags(
                    collection
                        .items()
                        .flat_map(|item| item.marks.names.iter().map(String::as_str)),
                    &config.markers.registered,
                );
                for name in unknown {
                    tracing::warn!(mark = %name, "unregistered mark");
                }
            }

            if json {
                let ids: Vec<&str> = collection.items().map(|item| item.nodeid.as_str()).collect();
                println!("{}", serde_json::to_string_pretty(&ids)?);
            } else {
                print_collection(&collection);
            }
            Ok(ExitStatus::Ok)
        }

        Commands::Steps => {
            let session = demo::session(&config.data_dir())?;
            print_steps(&session);
            Ok(ExitStatus::Ok)
        }
    }
}

/// Demo session plus the feature files of the selected directory
///
/// Returns `None` after printing the error when a feature file does not
/// parse.
fn build_session(config: &Config, select: &SelectArgs, cwd: &Path) -> Result<Option<Session>> {
    let mut session = demo::session(&config.data_dir())?;

    let features = match features_dir(config, select, cwd) {
        Some(dir) => dir,
        None => return Ok(Some(session)),
    };
    match Feature::load_dir(&features) {
        Ok(loaded) => {
            tracing::debug!(dir = %features.display(), count = loaded.len(), "loaded features");
            for feature in loaded {
                session.add_feature(feature);
            }
            Ok(Some(session))
        }
        Err(e @ Error::FeatureParse { .. }) => {
            print_error(&e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// The features directory to scan, if any
///
/// An explicit `--features` must exist. The configured default is skipped
/// with a warning when it is missing.
fn features_dir(config: &Config, select: &SelectArgs, cwd: &Path) -> Option<PathBuf> {
    if let Some(dir) = &select.features {
        return Some(paths::resolve_against(cwd, dir));
    }
    let dir = config.features_dir();
    if dir.is_dir() {
        Some(dir)
    } else {
        tracing::warn!(dir = %dir.display(), "features directory not found, running code tests only");
        None
    }
}

fn collect_options(config: &Config, select: &SelectArgs) -> CollectOptions {
    CollectOptions {
        selection: Selection {
            keyword: select.keyword.clone(),
            marks: select.marks.clone(),
        },
        strict_markers: config.markers.strict,
        registered_markers: config.markers.registered.clone(),
        ..CollectOptions::default()
    }
}

/// Exit early on collection errors or an empty collection
fn check_collection(collection: &Collection<'_>) -> Option<ExitStatus> {
    if !collection.errors.is_empty() {
        for error in &collection.errors {
            print_error(error);
        }
        eprintln!(
            "{}",
            format!("{} errors during collection", collection.errors.len())
                .red()
                .bold()
        );
        return Some(ExitStatus::CollectionFailed);
    }
    if collection.is_empty() {
        println!(
            "{}",
            format!("no tests collected ({} deselected)", collection.deselected).yellow()
        );
        return Some(ExitStatus::NoTestsCollected);
    }
    None
}

fn print_error(error: &Error) {
    eprintln!("{} {}", "error:".red().bold(), error);
}

fn print_collection(collection: &Collection<'_>) {
    for module in &collection.modules {
        if module.items.is_empty() {
            continue;
        }
        println!("{}", module.name.white().bold());
        for item in &module.items {
            if item.marks.names.is_empty() {
                println!("  {}", item.nodeid);
            } else {
                println!(
                    "  {} {}",
                    item.nodeid,
                    format!("[{}]", item.marks.names.join(", ")).dimmed()
                );
            }
        }
    }

    let mut line = format!("{} items collected", collection.len());
    if collection.deselected > 0 {
        line.push_str(&format!(", {} deselected", collection.deselected));
    }
    println!("\n{}", line.green().bold());
}

fn print_steps(session: &Session) {
    if session.steps().is_empty() {
        println!("No steps registered");
        return;
    }

    println!("Steps:");
    for def in session.steps().iter() {
        let keyword = format!("{:<5}", def.keyword().to_string());
        let mut line = format!("  {} {}", keyword.cyan(), def.pattern().as_str());
        if let Some(target) = def.target() {
            line.push_str(&format!(" {}", format!("-> {target}").green()));
        }
        if !def.used().is_empty() {
            line.push_str(&format!(" {}", format!("(uses {})", def.used().join(", ")).dimmed()));
        }
        println!("{line}");
    }
}
