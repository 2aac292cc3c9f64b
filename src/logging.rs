//! Tracing setup with a filter that can be swapped at runtime.

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

use crate::error::Error;

/// Filter used when nothing else asks for one.
const DEFAULT_DIRECTIVE: &str = "info";

/// Handle to the installed filter, used by `set_logging_level`.
#[derive(Debug, Clone)]
pub struct LogHandle {
    /// Reload handle of the global filter layer.
    handle: reload::Handle<EnvFilter, Registry>,
}

impl LogHandle {
    /// The active filter, rendered as directives.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the subscriber owning the filter is gone.
    pub fn current(&self) -> Result<String, Error> {
        return self
            .handle
            .with_current(ToString::to_string)
            .map_err(|e| return Error::Io(std::io::Error::other(e)));
    }

    /// Replace the active filter with `level`.
    ///
    /// # Errors
    ///
    /// Returns `Error::LogFilter` if `level` is not a level name or filter
    /// directive, or `Error::Io` if the subscriber is gone.
    pub fn set_level(&self, level: &str) -> Result<(), Error> {
        let filter = build_filter(&filter_directive(level))?;
        let previous = self.current()?;
        self.handle
            .reload(filter)
            .map_err(|e| return Error::Io(std::io::Error::other(e)))?;
        tracing::info!(from = %previous, to = level, "log filter changed");
        return Ok(());
    }
}

/// Parse a directive into a filter.
///
/// # Errors
///
/// Returns `Error::LogFilter` if the directive does not parse.
fn build_filter(directive: &str) -> Result<EnvFilter, Error> {
    return EnvFilter::try_new(directive).map_err(|e| {
        return Error::LogFilter { directive: directive.to_string(), reason: e.to_string() };
    });
}

/// Map a level name, in any case, to a tracing directive. Names tracing does
/// not know (`WARNING`, `CRITICAL`) map to their nearest level; anything else
/// passes through as a filter directive.
pub fn filter_directive(level: &str) -> String {
    return match level.to_ascii_uppercase().as_str() {
        "CRITICAL" | "ERROR" => "error".to_string(),
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "TRACE" => "trace".to_string(),
        "WARN" | "WARNING" => "warn".to_string(),
        _ => level.to_string(),
    };
}

/// Install the global subscriber, logging to stderr.
///
/// The starting filter is the first of: `flag_level`, `RUST_LOG`,
/// `config_level`, `info`.
///
/// # Errors
///
/// Returns `Error::LogFilter` if the chosen level does not parse, or
/// `Error::Io` if a global subscriber is already installed.
pub fn init(no_color: bool, flag_level: Option<&str>, config_level: Option<&str>) -> Result<LogHandle, Error> {
    let filter = match flag_level {
        Some(level) => build_filter(&filter_directive(level))?,
        None => match EnvFilter::try_from_default_env() {
            Ok(env) => env,
            Err(_) => build_filter(&config_level.map_or_else(|| return DEFAULT_DIRECTIVE.to_string(), filter_directive))?,
        },
    };

    let (filter_layer, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(!no_color))
        .try_init()
        .map_err(|e| return Error::Io(std::io::Error::other(e)))?;

    return Ok(LogHandle { handle });
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::{EnvFilter, reload};

    use super::{LogHandle, filter_directive};
    use crate::error::Error;

    #[test]
    fn level_names_map_to_tracing() {
        assert_eq!(filter_directive("WARNING"), "warn");
        assert_eq!(filter_directive("critical"), "error");
        assert_eq!(filter_directive("Debug"), "debug");
        assert_eq!(filter_directive("nodescope=trace"), "nodescope=trace");
    }

    #[test]
    fn handle_swaps_the_filter() {
        let (layer, handle) = reload::Layer::new(EnvFilter::new("info"));
        let _subscriber = tracing_subscriber::registry().with(layer);
        let logs = LogHandle { handle };

        logs.set_level("DEBUG").unwrap();
        assert_eq!(logs.current().unwrap(), "debug");
    }

    #[test]
    fn bad_directive_is_rejected() {
        let (layer, handle) = reload::Layer::new(EnvFilter::new("info"));
        let _subscriber = tracing_subscriber::registry().with(layer);
        let logs = LogHandle { handle };

        let err = logs.set_level("nodescope=loud").err().unwrap();
        assert!(matches!(err, Error::LogFilter { .. }));
        assert_eq!(logs.current().unwrap(), "info");
    }
}
