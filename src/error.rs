//! Crate-level error types for nodescope diagnostics.

/// All errors in nodescope carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the method, source, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A request carried parameters the method cannot use.
    #[error("invalid params for `{method}`: {reason}")]
    InvalidParams {
        /// Method that rejected the parameters.
        method: String,
        /// Description of what was wrong.
        reason: String,
    },

    /// Underlying I/O error from the filesystem or a socket.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON encoding or decoding failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// A log level or filter directive could not be parsed.
    #[error("invalid log filter `{directive}`: {reason}")]
    LogFilter {
        /// The directive as given.
        directive: String,
        /// Why the filter rejected it.
        reason: String,
    },

    /// The tree broke a structural invariant: a parent cycle, a node that
    /// cannot reach the root, or a container whose index disagrees with its items.
    #[error("malformed tree: {reason}")]
    MalformedTree {
        /// Which invariant was violated.
        reason: String,
    },

    /// Tree-sitter could not produce an error-free tree for the source.
    #[error("parse failed: {origin}: {reason}")]
    ParseFailed {
        /// File path or `<source>` for buffers received over the wire.
        origin: String,
        /// Description of the parse failure.
        reason: String,
    },

    /// Source exceeds the configured size limit.
    #[error("source too large ({size_bytes} bytes, max {max_bytes}): {origin}")]
    SourceTooLarge {
        /// Maximum allowed source size in bytes.
        max_bytes: u64,
        /// File path or `<source>`.
        origin: String,
        /// Actual source size in bytes.
        size_bytes: u64,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// No registered method has this name.
    #[error("unknown method: `{name}`")]
    UnknownMethod {
        /// Registered method names, sorted.
        available: Vec<String>,
        /// The requested name.
        name: String,
    },

    /// No tree-sitter grammar registered for this extension or language name.
    #[error("unsupported language: `{name}`")]
    UnsupportedLanguage {
        /// Extension (without the dot) or language name that was requested.
        name: String,
    },

    /// A validator rejected the source handed to a method.
    #[error("validation failed: {reason}")]
    Validation {
        /// Why the source was rejected.
        reason: String,
    },
}

impl Error {
    /// Short machine-readable name used in wire responses.
    pub const fn kind(&self) -> &'static str {
        return match self {
            Self::InvalidParams { .. } => "invalid_params",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::LogFilter { .. } => "invalid_params",
            Self::MalformedTree { .. } => "malformed_tree",
            Self::ParseFailed { .. } => "parse_failed",
            Self::SourceTooLarge { .. } => "source_too_large",
            Self::TomlDe(_) => "config",
            Self::UnknownMethod { .. } => "unknown_method",
            Self::UnsupportedLanguage { .. } => "unsupported_language",
            Self::Validation { .. } => "validation",
        };
    }

    /// Shorthand for a `MalformedTree` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        return Self::MalformedTree { reason: reason.into() };
    }
}
