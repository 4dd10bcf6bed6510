pub mod cli;
pub mod diagnostics;
pub mod dispatch;

use anyhow::Result;
use clap::Parser;

use crate::cli::Cli;
use crate::diagnostics::DiagnosticsSession;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let diagnostics = DiagnosticsSession::initialize(cli.diagnostics)?;
    let config_path = dispatch::default_config_path()?;

    let result = dispatch::run_with_deps(cli, &config_path);
    if let (Err(error), Some(path)) = (&result, diagnostics.path()) {
        tracing::error!("command failed: {error:#}");
        eprintln!("Diagnostics written to {}", path.display());
    }
    result
}
