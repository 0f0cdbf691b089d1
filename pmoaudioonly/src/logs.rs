//! Logging setup
//!
//! One `tracing` subscriber per process: a reloadable level filter followed
//! by an optional console layer, both driven by `host.logger.*`.

use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use pmoconfig::Config;
use tracing::Level;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, reload, util::SubscriberInitExt, Registry,
};

static LOG_HANDLE: OnceCell<LogHandle> = OnceCell::new();

/// Handle kept by the host to change the level at runtime
#[derive(Clone)]
pub struct LogHandle {
    reload_handle: reload::Handle<LevelFilter, Registry>,
}

impl LogHandle {
    /// Change the minimum level (`ERROR`, `WARN`, `INFO`, `DEBUG`, `TRACE`)
    pub fn set_level(&self, level: &str) -> Result<()> {
        let level = string_to_level(level).ok_or_else(|| anyhow!("Unknown log level {}", level))?;
        self.reload_handle
            .reload(LevelFilter::from_level(level))
            .map_err(|e| anyhow!("Failed to reload log level filter: {}", e))
    }

    pub fn current_level(&self) -> Option<LevelFilter> {
        self.reload_handle.clone_current()
    }
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle")
            .field("level", &self.current_level())
            .finish()
    }
}

/// Install the global subscriber from the logger settings
///
/// Idempotent: later calls return the handle of the first one and ignore
/// `config`. Fails only when a subscriber not installed here is already set.
///
/// ```rust,no_run
/// use pmoaudioonly::logs::init_logging;
///
/// let handle = init_logging(&pmoconfig::get_config()).unwrap();
/// handle.set_level("DEBUG").unwrap();
/// ```
pub fn init_logging(config: &Config) -> Result<LogHandle> {
    LOG_HANDLE.get_or_try_init(|| install(config)).cloned()
}

fn install(config: &Config) -> Result<LogHandle> {
    let log_level = config
        .get_log_min_level()
        .ok()
        .and_then(|l| string_to_level(&l))
        .map(LevelFilter::from_level)
        .unwrap_or(LevelFilter::INFO);

    let (filter, reload_handle) = reload::Layer::new(log_level);

    let enable_console = config.get_log_enable_console().unwrap_or(true);
    let console = enable_console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(true)
    });

    Registry::default()
        .with(filter)
        .with(console)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(LogHandle { reload_handle })
}

fn string_to_level(s: &str) -> Option<Level> {
    match s.to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}
