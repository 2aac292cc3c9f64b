//! One-shot CLI commands: point, region, scopes, analyze, args, methods, info, serve.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::error;
use crate::grammar;
use crate::inspect;
use crate::provider::{self, Provider};
use crate::server;
use crate::tree::SyntaxTree;
use crate::types::{NodeSummary, Position};

/// Print the analysis dump of a file.
///
/// # Errors
///
/// Returns errors from reading or parsing the file.
pub fn analyze(provider: &Provider, file: &Path, language: Option<&str>, depth: usize, json: bool) -> Result<(), error::Error> {
    let tree = read_tree(provider, file, language)?;
    let dump = inspect::analyze(&tree, depth);
    if json {
        return print_json(&dump);
    }
    println!("{dump}");
    return Ok(());
}

/// Print the arguments of the single function definition in a file.
///
/// # Errors
///
/// Returns `Error::Validation` unless the file holds exactly one function
/// definition, and errors from reading or parsing it.
pub fn args(provider: &Provider, file: &Path, language: Option<&str>, json: bool) -> Result<(), error::Error> {
    let tree = read_tree(provider, file, language)?;
    let arguments = provider::function_args(&tree)?;
    if json {
        return print_json(&arguments);
    }
    for (name, default) in &arguments {
        match default {
            None => println!("{name}"),
            Some(value) => println!("{name}={value}"),
        }
    }
    return Ok(());
}

/// Output the reference document.
pub fn info(json: bool, config: &Config) {
    return crate::info::run(json, config);
}

/// List callable methods, optionally only those accepting a file, or print
/// one method's help text.
///
/// # Errors
///
/// Returns `Error::UnknownMethod` for an unknown `describe` name, and errors
/// from reading or parsing `file`.
pub fn methods(
    provider: &Provider,
    file: Option<&Path>,
    language: Option<&str>,
    describe: Option<&str>,
    json: bool,
) -> Result<(), error::Error> {
    if let Some(name) = describe {
        let text = provider::help_text(name)?;
        if json {
            return print_json(&text);
        }
        println!("{text}");
        return Ok(());
    }

    let names = match file {
        None => provider::method_names(None),
        Some(path) => {
            let tree = read_tree(provider, path, language)?;
            provider::method_names(Some(&tree))
        }
    };
    if json {
        return print_json(&names);
    }
    for name in names {
        println!("{name}");
    }
    return Ok(());
}

/// Print the innermost node at a position.
///
/// # Errors
///
/// Returns errors from reading, parsing, or resolution.
pub fn point(provider: &Provider, file: &Path, language: Option<&str>, pos: Position, json: bool) -> Result<(), error::Error> {
    let tree = read_tree(provider, file, language)?;
    let node = provider::node_at(&tree, pos)?;
    if json {
        return print_json(&node);
    }
    print_node(&node);
    println!("{}", node.text);
    return Ok(());
}

/// Print a node summary line.
fn print_node(node: &NodeSummary) {
    println!("{} [{}]", node.type_tag, node.span);
}

/// Pretty JSON on stdout.
///
/// # Errors
///
/// Returns `Error::Json` if `value` cannot be encoded.
fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), error::Error> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    return Ok(());
}

/// Read and parse a file, picking the grammar from `language` or the extension.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read, `Error::UnsupportedLanguage`
/// if no grammar applies, and any parse error.
fn read_tree(provider: &Provider, file: &Path, language: Option<&str>) -> Result<Arc<SyntaxTree>, error::Error> {
    let name = match language {
        Some(name) => grammar::grammar_for_name(name)?.name,
        None => grammar::grammar_for_path(file)?.name,
    };
    let source = std::fs::read_to_string(file)?;
    return provider.parse(&file.display().to_string(), &source, name);
}

/// Print the node or sibling run covering a selection.
///
/// # Errors
///
/// Returns errors from reading, parsing, or resolution.
pub fn region(
    provider: &Provider,
    file: &Path,
    language: Option<&str>,
    start: Position,
    end: Position,
    json: bool,
) -> Result<(), error::Error> {
    let tree = read_tree(provider, file, language)?;
    let report = provider::region_at(&tree, start, end)?;
    if json {
        return print_json(&report);
    }
    for node in &report.nodes {
        print_node(node);
    }
    println!("---");
    println!("{}", report.text);
    return Ok(());
}

/// Print the scopes enclosing a position, innermost first.
///
/// # Errors
///
/// Returns errors from reading, parsing, or the parent walk.
pub fn scopes(provider: &Provider, file: &Path, language: Option<&str>, pos: Position, json: bool) -> Result<(), error::Error> {
    let tree = read_tree(provider, file, language)?;
    let chain = provider::scopes_at(&tree, pos)?;
    if json {
        return print_json(&chain);
    }
    for scope in &chain {
        println!("{} [{}]", scope.type_tag, scope.span);
    }
    return Ok(());
}

/// Serve requests over stdio, or over TCP when a port is given.
///
/// # Errors
///
/// Returns errors from the transport.
pub fn serve(provider: Provider, port: Option<u16>) -> Result<(), error::Error> {
    return match port {
        None => server::serve_stdio(&provider),
        Some(p) => server::serve_tcp(provider, p),
    };
}
