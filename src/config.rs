use std::collections::HashMap;
use std::path::Path;

use crate::error::Error;
use crate::tree::{MAX_FILE_SIZE, ParseOptions};

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".nodescope.toml";

/// Default number of parsed snapshots kept in the parse cache.
const DEFAULT_CACHE_SIZE: usize = 32;

/// Runtime configuration loaded from `.nodescope.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Parse cache capacity, `0` disables caching.
    pub cache_size: usize,
    /// Extra ordered-container node kinds per language name.
    pub containers: HashMap<String, Vec<String>>,
    /// Whether the values came from a file rather than defaults.
    pub from_file: bool,
    /// Default tracing filter directive.
    pub log_level: Option<String>,
    /// Sources above this many bytes are rejected.
    pub max_file_size: u64,
}

/// Raw TOML structure for `.nodescope.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct NodescopeTomlConfig {
    /// See `Config::cache_size`.
    cache_size: Option<usize>,
    /// See `Config::containers`.
    #[serde(default)]
    containers: HashMap<String, Vec<String>>,
    /// See `Config::log_level`.
    log_level: Option<String>,
    /// See `Config::max_file_size`.
    max_file_size: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            cache_size: DEFAULT_CACHE_SIZE,
            containers: HashMap::new(),
            from_file: false,
            log_level: None,
            max_file_size: MAX_FILE_SIZE,
        };
    }
}

impl Config {
    /// Load `.nodescope.toml` from `root`.
    /// A missing file yields the defaults. A file that exists but does not
    /// parse is an error, never a silent fallback.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: NodescopeTomlConfig = toml::from_str(&content)?;
        let defaults = Self::default();
        return Ok(Self {
            cache_size: raw.cache_size.unwrap_or(defaults.cache_size),
            containers: raw.containers,
            from_file: true,
            log_level: raw.log_level,
            max_file_size: raw.max_file_size.unwrap_or(defaults.max_file_size),
        });
    }

    /// Parse options for a grammar, merging in its configured extra containers.
    pub fn parse_options(&self, language: &str) -> ParseOptions<'_> {
        let extra_containers = self.containers.get(language).map_or(&[][..], Vec::as_slice);
        return ParseOptions { extra_containers, max_bytes: self.max_file_size };
    }
}
