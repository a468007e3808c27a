// src/logging.rs

//! Log output of the `runasd` daemon.
//!
//! The daemon has two kinds of output to report on stderr: its own
//! supervision decisions (process started, exit hooks applied, restart
//! budget spent), and the lines the supervised program writes to its
//! stdout and stderr. The latter are emitted at debug level under the
//! [`CHILD_OUTPUT_TARGET`] target, so they can be switched on without
//! turning on the daemon's own debug chatter:
//!
//! ```text
//! RUNASD_LOG="info,runasd::child=debug" runasd --config /etc/runasd.toml
//! ```
//!
//! `--log-level` wins over `RUNASD_LOG`; both fall back to `info`. Stdout
//! is left alone, it carries the `--dry-run` report.

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable holding filter directives for the daemon.
pub const LOG_ENV: &str = "RUNASD_LOG";

/// Target of the lines forwarded from the supervised program.
pub const CHILD_OUTPUT_TARGET: &str = "runasd::child";

/// Install the global subscriber. Call once, before the service starts.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let directives = filter_directives(cli_level, env.as_deref());
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid {LOG_ENV} directives {directives:?}"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("cannot install the log subscriber: {e}"))
}

/// Filter directives for the given CLI level and `RUNASD_LOG` value.
///
/// A bare `warning` is accepted as an alias for `warn`, on its own or as
/// the level of a `target=level` directive.
pub fn filter_directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    if let Some(level) = cli_level {
        return level_name(level).to_string();
    }

    let directives: Vec<String> = env
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(normalize_directive)
        .collect();

    if directives.is_empty() {
        "info".to_string()
    } else {
        directives.join(",")
    }
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

fn normalize_directive(directive: &str) -> String {
    let (target, level) = match directive.rsplit_once('=') {
        Some((target, level)) => (Some(target), level),
        None => (None, directive),
    };

    let level = if level.eq_ignore_ascii_case("warning") {
        "warn".to_string()
    } else {
        level.to_lowercase()
    };

    match target {
        Some(target) => format!("{target}={level}"),
        None => level,
    }
}
