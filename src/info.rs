use serde::Serialize;

use crate::config::{CONFIG_FILE, Config};
use crate::grammar::SUPPORTED;
use crate::provider;

/// Root of the JSON document.
#[derive(Serialize)]
struct InfoJson {
    /// Current configuration.
    current_state: StateJson,
    /// Exit code table.
    exit_codes: Vec<ExitCodeInfo>,
    /// Registered method names.
    methods: Vec<&'static str>,
    /// Supported grammars.
    supported_languages: Vec<LanguageInfo>,
    /// Crate version.
    version: String,
}

/// One grammar.
#[derive(Serialize)]
struct LanguageInfo {
    /// Extensions with leading dots.
    extensions: Vec<String>,
    /// Name accepted by `--language` and the `language` parameter.
    language: String,
}

/// One exit code.
#[derive(Serialize)]
struct ExitCodeInfo {
    /// Process exit status.
    code: u8,
    /// What it signals.
    meaning: String,
}

/// Configuration in effect.
#[derive(Serialize)]
struct StateJson {
    /// Parse cache capacity.
    cache_size: usize,
    /// Whether `.nodescope.toml` was found.
    config_found: bool,
    /// Extra container kinds per language.
    containers: std::collections::BTreeMap<String, Vec<String>>,
    /// Size limit in bytes.
    max_file_size: u64,
}

/// Output the nodescope reference document.
pub fn run(json: bool, config: &Config) {
    if json {
        print_json(config);
    } else {
        print_markdown(config);
    }
}

// ── Markdown output ───────────────────────────────────────────────────

/// Full markdown document.
fn print_markdown(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    print_markdown_header(version);
    print_markdown_languages();
    print_markdown_methods();
    print_markdown_state(config);
    println!();
    print_markdown_exit_codes();
}

/// Title and command overview.
fn print_markdown_header(version: &str) {
    print!(
        "\
# nodescope {version}

Resolve cursor positions and selections to syntax tree nodes, and list the
scopes enclosing them. Rows and columns are one-based; columns count characters.

## Commands

    nodescope point <file> <ROW:COL>               innermost node at a position
    nodescope region <file> <ROW:COL> <ROW:COL>    node or sibling run covering a selection
    nodescope scopes <file> <ROW:COL>              enclosing scopes, innermost first
    nodescope analyze <file> [--depth N]           indented dump of the top-level nodes
    nodescope args <file>                          arguments of a single function definition
    nodescope methods [file] [--describe NAME]     callable methods, or one method's help
    nodescope serve [--port N]                     JSON lines over stdio, or TCP with --port

"
    );
}

/// Supported grammars.
fn print_markdown_languages() {
    println!("## Supported Languages\n");
    println!("| Language   | Extensions |");
    println!("|------------|------------|");
    for (language, extensions) in SUPPORTED {
        let exts = extensions.iter().map(|e| return format!(".{e}")).collect::<Vec<_>>().join(" ");
        println!("| {language:<10} | {exts} |");
    }
    println!();
}

/// Registered method names.
fn print_markdown_methods() {
    println!("## Methods\n");
    for name in provider::method_names(None) {
        println!("- `{name}`");
    }
    println!();
}

/// Configuration in effect.
fn print_markdown_state(config: &Config) {
    println!("## Current State\n");
    if config.from_file {
        println!("Config:         {CONFIG_FILE} (found)");
    } else {
        println!("Config:         {CONFIG_FILE} (not found, defaults)");
    }
    println!("Max file size:  {} bytes", config.max_file_size);
    println!("Cache size:     {}", config.cache_size);

    let mut extra: Vec<String> = config
        .containers
        .iter()
        .map(|(language, kinds)| return format!("{language}: {}", kinds.join(", ")))
        .collect();
    extra.sort();
    if extra.is_empty() {
        println!("Containers:     (grammar defaults)");
    } else {
        println!("Containers:     {}", extra.join("; "));
    }
}

/// Exit code table.
fn print_markdown_exit_codes() {
    print!(
        "\
## Exit Codes

| Code | Meaning |
|------|---------|
| 0    | Success |
| 2    | Source rejected by a validator |
| 3    | Runtime error |
"
    );
}

// ── JSON output ───────────────────────────────────────────────────────

/// JSON document on stdout.
fn print_json(config: &Config) {
    let info = InfoJson {
        current_state: StateJson {
            cache_size: config.cache_size,
            config_found: config.from_file,
            containers: config.containers.iter().map(|(k, v)| return (k.clone(), v.clone())).collect(),
            max_file_size: config.max_file_size,
        },
        exit_codes: vec![
            ExitCodeInfo { code: 0, meaning: "Success".to_string() },
            ExitCodeInfo { code: 2, meaning: "Source rejected by a validator".to_string() },
            ExitCodeInfo { code: 3, meaning: "Runtime error".to_string() },
        ],
        methods: provider::method_names(None),
        supported_languages: SUPPORTED
            .iter()
            .map(|(language, extensions)| {
                return LanguageInfo {
                    extensions: extensions.iter().map(|e| return format!(".{e}")).collect(),
                    language: (*language).to_string(),
                };
            })
            .collect(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    // serde_json::to_string_pretty won't fail on this structure.
    let json = serde_json::to_string_pretty(&info).unwrap_or_default();
    println!("{json}");
}
