use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use comfy_table::{Cell, ContentArrangement, Table};
use tracing::debug;
use unenroll_core::config::{
    UnenrollConfig, default_store_path, load_config_or_default, resolve_config_path,
};
use unenroll_core::{EnrollmentStore, ReasonCatalog};
use unenroll_tui::UiExit;

use crate::cli::{Cli, Command};

pub fn run_with_deps(cli: Cli, config_path: &Path) -> Result<()> {
    let config = load_config_or_default(config_path).map_err(|error| {
        anyhow!(
            "{error}\nFix the config at {} and retry.",
            config_path.display()
        )
    })?;
    let store = EnrollmentStore::open(resolve_store_path(cli.store, &config)?);
    let catalog = ReasonCatalog::from_config(&config);
    debug!(store = %store.path().display(), reasons = catalog.len(), "resolved settings");

    match cli.command {
        None => run_dashboard_command(store, catalog),
        Some(Command::Reasons) => {
            print_reasons(&catalog);
            Ok(())
        }
        Some(Command::List) => run_list_command(&store),
        Some(Command::Enroll { course_id, title }) => {
            run_enroll_command(&store, &course_id, &title)
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    resolve_config_path().context("failed to resolve config path")
}

fn resolve_store_path(flag: Option<PathBuf>, config: &UnenrollConfig) -> Result<PathBuf> {
    if let Some(path) = flag.or_else(|| config.store.clone()) {
        return Ok(path);
    }
    default_store_path().context("failed to resolve enrollment store path")
}

fn run_dashboard_command(store: EnrollmentStore, catalog: ReasonCatalog) -> Result<()> {
    let exit = unenroll_tui::run_dashboard(store, catalog)?;
    debug!(?exit, "dashboard finished");
    if let Some(message) = dashboard_exit_message(exit) {
        eprintln!("{message}");
    }
    Ok(())
}

fn dashboard_exit_message(exit: UiExit) -> Option<&'static str> {
    match exit {
        UiExit::Completed => None,
        UiExit::Canceled => {
            Some("Interrupted. A reason still open in the unenroll dialog was not saved.")
        }
    }
}

fn run_list_command(store: &EnrollmentStore) -> Result<()> {
    let rows = store.list().with_context(|| {
        format!(
            "failed to load enrollments from {}",
            store.path().display()
        )
    })?;

    if rows.is_empty() {
        println!("No enrollments in {}", store.path().display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Course", "Title", "Enrolled"]);
    for row in &rows {
        table.add_row(vec![
            Cell::new(row.course_id.as_str()),
            Cell::new(row.title.as_str()),
            Cell::new(row.enrolled_at.as_str()),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn run_enroll_command(store: &EnrollmentStore, course_id: &str, title: &str) -> Result<()> {
    let course_id = course_id.trim();
    if course_id.is_empty() {
        return Err(anyhow!("course id must be non-empty"));
    }

    store
        .enroll(course_id, title.trim())
        .with_context(|| format!("failed to enroll in '{course_id}'"))?;
    println!("Enrolled in '{}' ({course_id}).", title.trim());
    Ok(())
}

fn print_reasons(catalog: &ReasonCatalog) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Key", "Reason"]);
    for option in catalog.options() {
        table.add_row(vec![
            Cell::new(option.key.as_str()),
            Cell::new(option.label.as_str()),
        ]);
    }

    println!("{table}");
}
