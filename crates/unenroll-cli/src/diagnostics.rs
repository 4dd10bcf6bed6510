use std::backtrace::Backtrace;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, Once};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "UNENROLL_LOG";

static HOOK_ONCE: Once = Once::new();

/// Log routing for one process run.
///
/// Without `--diagnostics`, events go to stderr filtered by `UNENROLL_LOG`
/// (errors only by default, so the dashboard screen stays clean). With it,
/// every debug event is appended to `<config dir>/diagnostics/<epoch-ms>.log`.
pub struct DiagnosticsSession {
    path: Option<PathBuf>,
}

impl DiagnosticsSession {
    pub fn initialize(enabled: bool) -> Result<Self> {
        if !enabled {
            install_subscriber(env_filter("error"), None)?;
            install_panic_hook(None);
            return Ok(Self { path: None });
        }

        let path = create_diagnostics_log_path()?;
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("failed to create diagnostics log at {}", path.display()))?;

        writeln!(
            file,
            "unenroll diagnostics start\nversion={}\nstart_epoch_ms={}\npid={}\nargv={:?}",
            env!("CARGO_PKG_VERSION"),
            epoch_millis(),
            std::process::id(),
            std::env::args().collect::<Vec<String>>()
        )
        .with_context(|| format!("failed to write diagnostics header to {}", path.display()))?;

        install_subscriber(env_filter("debug"), Some(file))?;
        install_panic_hook(Some(path.clone()));
        tracing::info!(path = %path.display(), "diagnostics enabled");

        Ok(Self { path: Some(path) })
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}

fn install_subscriber(filter: EnvFilter, file: Option<File>) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match file {
        Some(file) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}

fn install_panic_hook(path: Option<PathBuf>) {
    HOOK_ONCE.call_once(|| {
        std::panic::set_hook(Box::new(move |panic_info| {
            let location = panic_info
                .location()
                .map(|value| format!("{}:{}:{}", value.file(), value.line(), value.column()))
                .unwrap_or_else(|| "unknown".to_string());
            tracing::error!(
                panic_message = %panic_payload(panic_info),
                panic_location = %location,
                panic_backtrace = ?Backtrace::force_capture(),
                "panic captured"
            );

            eprintln!("Fatal internal error in unenroll.");
            match &path {
                Some(path) => eprintln!("Diagnostics written to {}", path.display()),
                None => eprintln!("Run `unenroll --diagnostics` to capture a diagnostics log."),
            }
        }));
    });
}

fn panic_payload(panic_info: &std::panic::PanicHookInfo<'_>) -> String {
    if let Some(payload) = panic_info.payload().downcast_ref::<&str>() {
        return (*payload).to_string();
    }
    if let Some(payload) = panic_info.payload().downcast_ref::<String>() {
        return payload.clone();
    }
    "unknown panic payload".to_string()
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

fn create_diagnostics_log_path() -> Result<PathBuf> {
    let config_dir = unenroll_core::config::resolve_config_dir()
        .context("failed to resolve unenroll config directory for diagnostics")?;

    let diagnostics_dir = config_dir.join("diagnostics");
    fs::create_dir_all(&diagnostics_dir).with_context(|| {
        format!(
            "failed to create diagnostics directory {}",
            diagnostics_dir.display()
        )
    })?;

    Ok(diagnostics_dir.join(format!("{}.log", epoch_millis())))
}
