use std::fmt::Write as _;

use crate::error::Error;
use crate::grammar::SUPPORTED;

/// ANSI bold, used for headings on a terminal.
const BOLD: &str = "\x1b[1m";
/// ANSI attribute reset.
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error, color: bool) {
    let md = render_error(e);
    for line in md.lines() {
        if color && line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::MalformedTree { reason } => render_malformed_tree(reason),
        Error::ParseFailed { origin, reason } => render_parse_failed(origin, reason),
        Error::SourceTooLarge { max_bytes, origin, size_bytes } => {
            render_source_too_large(origin, *size_bytes, *max_bytes)
        }
        Error::UnknownMethod { available, name } => render_unknown_method(name, available),
        Error::UnsupportedLanguage { name } => render_unsupported_language(name),
        _ => render_generic(e),
    };
}

/// Variants that need no more than a heading and the message.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::InvalidParams { method, reason } => format!(
            "\
# Error: Invalid Parameters

`{method}` rejected its parameters: {reason}

## Fix

    nodescope methods --describe {method}
"
        ),
        Error::Io(err) => format!(
            "\
# Error: I/O

{err}
"
        ),
        Error::LogFilter { directive, reason } => format!(
            "\
# Error: Invalid Log Level

`{directive}` is not a level or filter directive: {reason}

Use one of DEBUG, INFO, WARNING, ERROR, CRITICAL, or a `RUST_LOG` style directive.
"
        ),
        Error::TomlDe(err) => format!(
            "\
# Error: Invalid TOML

{err}

## Fix

Correct `.nodescope.toml` or remove it to use the defaults.
"
        ),
        Error::Validation { reason } => format!(
            "\
# Error: Validation Failed

{reason}
"
        ),
        _ => format!(
            "\
# Error

{e}
"
        ),
    };
}

/// Tree invariant violations.
fn render_malformed_tree(reason: &str) -> String {
    return format!(
        "\
# Error: Malformed Tree

{reason}

The parser produced a tree that breaks parent or container invariants, so no
result was returned.
"
    );
}

/// Tree-sitter failures and syntax errors.
fn render_parse_failed(origin: &str, reason: &str) -> String {
    return format!(
        "\
# Error: Parse Failed

Could not parse `{origin}`: {reason}

## Fix

Only sources without syntax errors can be resolved. Check the language
(`--language`) and fix the reported position.
"
    );
}

/// Oversized sources.
fn render_source_too_large(origin: &str, size_bytes: u64, max_bytes: u64) -> String {
    return format!(
        "\
# Error: Source Too Large

`{origin}` is {size_bytes} bytes (max {max_bytes}).

## Fix

Raise `max_file_size` in `.nodescope.toml`.
"
    );
}

/// Unknown method names, with what is registered.
fn render_unknown_method(name: &str, available: &[String]) -> String {
    let mut out = format!(
        "\
# Error: Unknown Method

No method named `{name}`.

## Available methods

"
    );
    for method in available {
        let _ = writeln!(out, "- `{method}`");
    }
    return out;
}

/// Unknown extensions or language names, with the supported table.
fn render_unsupported_language(name: &str) -> String {
    let mut out = format!(
        "\
# Error: Unsupported Language

No tree-sitter grammar for `{name}`.

## Supported languages

"
    );
    for (language, extensions) in SUPPORTED {
        let exts = extensions.iter().map(|e| return format!("`.{e}`")).collect::<Vec<_>>().join(", ");
        let _ = writeln!(out, "- {language}: {exts}");
    }
    return out;
}

#[cfg(test)]
mod tests {
    use super::render_error;
    use crate::error::Error;

    #[test]
    fn unsupported_language_lists_grammars() {
        let md = render_error(&Error::UnsupportedLanguage { name: "txt".to_string() });
        assert!(md.starts_with("# Error: Unsupported Language"));
        assert!(md.contains("- python: `.py`, `.pyi`"));
    }

    #[test]
    fn unknown_method_lists_available() {
        let md = render_error(&Error::UnknownMethod {
            available: vec!["echo".to_string(), "version".to_string()],
            name: "rename_arg".to_string(),
        });
        assert!(md.contains("`rename_arg`"));
        assert!(md.contains("- `echo`\n- `version`\n"));
    }

    #[test]
    fn every_heading_is_markdown() {
        let errors = [
            Error::malformed("cycle"),
            Error::ParseFailed { origin: "a.py".to_string(), reason: "syntax error".to_string() },
            Error::SourceTooLarge { max_bytes: 1, origin: "a.py".to_string(), size_bytes: 2 },
            Error::Validation { reason: "expected function_definition".to_string() },
        ];
        for e in &errors {
            assert!(render_error(e).starts_with("# Error"), "{e}");
        }
    }
}
