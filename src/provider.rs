//! Named, remotely callable methods over parsed sources.
//!
//! Every method takes its parameters as a JSON object and answers with a JSON
//! value. The same typed operations back the one-shot CLI commands.

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::ParseCache;
use crate::config::Config;
use crate::error::Error;
use crate::grammar::grammar_for_name;
use crate::inspect;
use crate::logging::LogHandle;
use crate::resolver::{Region, resolve_point, resolve_region};
use crate::scope::scope_chain;
use crate::tree::SyntaxTree;
use crate::types::{NodeSummary, Position, Scope};
use crate::validators::TypeValidator;

/// Language used when a request does not name one.
pub const DEFAULT_LANGUAGE: &str = "python";

/// Origin label for sources received in a request.
const WIRE_ORIGIN: &str = "<source>";

/// Only a single function definition is accepted.
const FUNCTION_DEFINITION: TypeValidator = TypeValidator::single(&["function_definition"]);

/// Method table, sorted by name.
const METHODS: &[Method] = &[
    Method {
        handler: analyze,
        help: "analyze(source, language?, depth?) -> indented dump of the top-level nodes, `depth` levels deep (default 2)",
        name: "analyze",
        validator: None,
    },
    Method {
        handler: echo,
        help: "echo(echo) -> the value unchanged",
        name: "echo",
        validator: None,
    },
    Method {
        handler: get_args,
        help: "get_args(source, language?) -> [[name, default or null], ...] for a single function definition",
        name: "get_args",
        validator: Some(FUNCTION_DEFINITION),
    },
    Method {
        handler: get_current,
        help: "get_current(source, language?, row, column) -> {type_tag, span, text} of the innermost node at the position",
        name: "get_current",
        validator: None,
    },
    Method {
        handler: get_parents,
        help: "get_parents(source, language?, row, column) -> enclosing scopes, innermost first",
        name: "get_parents",
        validator: None,
    },
    Method {
        handler: get_region,
        help: "get_region(source, language?, start, end) -> {kind, nodes, text} of the node or sibling run covering the selection",
        name: "get_region",
        validator: None,
    },
    Method {
        handler: help,
        help: "help(name) -> help text of a method",
        name: "help",
        validator: None,
    },
    Method {
        handler: list_methods,
        help: "list_methods(source?, language?) -> method names; with a source, only methods that accept it",
        name: "list_methods",
        validator: None,
    },
    Method {
        handler: set_logging_level,
        help: "set_logging_level(level) -> null; level is DEBUG, INFO, WARNING, ERROR, CRITICAL or a filter directive",
        name: "set_logging_level",
        validator: None,
    },
    Method {
        handler: version,
        help: "version() -> server version",
        name: "version",
        validator: None,
    },
];

/// Signature shared by every method.
type Handler = fn(&Provider, &Value) -> Result<Value, Error>;

/// One entry of the method table.
struct Method {
    /// Implementation.
    handler: Handler,
    /// Text returned by `help`.
    help: &'static str,
    /// Name requests use.
    name: &'static str,
    /// Shape the source must have, if the method takes one.
    validator: Option<TypeValidator>,
}

/// Parameters shared by every method that reads a source.
#[derive(Debug, Deserialize)]
struct SourceParams {
    /// Grammar name, `python` when absent.
    #[serde(default)]
    language: Option<String>,
    /// Full source text.
    source: String,
}

/// Parameters of `analyze`.
#[derive(Debug, Deserialize)]
struct AnalyzeParams {
    /// Nesting depth of the dump.
    #[serde(default)]
    depth: Option<usize>,
    /// The source.
    #[serde(flatten)]
    source: SourceParams,
}

/// Parameters of `echo`.
#[derive(Debug, Deserialize)]
struct EchoParams {
    /// Returned as is.
    echo: Value,
}

/// Parameters of `help`.
#[derive(Debug, Deserialize)]
struct HelpParams {
    /// Method to describe.
    name: String,
}

/// Parameters of `list_methods`.
#[derive(Debug, Deserialize)]
struct ListParams {
    /// Grammar name of `source`.
    #[serde(default)]
    language: Option<String>,
    /// Optional source to filter methods by.
    #[serde(default)]
    source: Option<String>,
}

/// Parameters of `set_logging_level`.
#[derive(Debug, Deserialize)]
struct LevelParams {
    /// Level name or filter directive.
    level: String,
}

/// Parameters of `get_current` and `get_parents`.
#[derive(Debug, Deserialize)]
struct PointParams {
    /// One-based column.
    column: u32,
    /// One-based row.
    row: u32,
    /// The source.
    #[serde(flatten)]
    source: SourceParams,
}

/// Parameters of `get_region`.
#[derive(Debug, Deserialize)]
struct RegionParams {
    /// Last position of the selection.
    end: Position,
    /// The source.
    #[serde(flatten)]
    source: SourceParams,
    /// First position of the selection.
    start: Position,
}

/// Answer of `get_region`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RegionReport {
    /// `node` for a single node, `siblings` for a run of container items.
    pub kind: &'static str,
    /// The covered nodes in source order.
    pub nodes: Vec<NodeSummary>,
    /// Source text from the first node's start to the last node's end.
    pub text: String,
}

/// Method registry bound to one configuration and parse cache.
#[derive(Debug)]
pub struct Provider {
    /// Parsed snapshots shared across calls.
    cache: ParseCache,
    /// Loaded configuration.
    config: Config,
    /// Filter handle when this process installed the global subscriber.
    logging: Option<LogHandle>,
}

impl Provider {
    /// Dispatch `method` with `params`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownMethod` for names not in the table, and any
    /// error the method itself raises.
    pub fn call(&self, method: &str, params: &Value) -> Result<Value, Error> {
        let entry = lookup(method)?;
        tracing::debug!(method, "dispatch");
        let result = (entry.handler)(self, params);
        if let Err(e) = &result {
            tracing::debug!(method, kind = e.kind(), error = %e, "method failed");
        }
        return result;
    }

    /// The loaded configuration.
    pub const fn config(&self) -> &Config {
        return &self.config;
    }

    /// A registry with an empty parse cache sized from `config`.
    pub fn new(config: Config, logging: Option<LogHandle>) -> Self {
        return Self { cache: ParseCache::new(config.cache_size), config, logging };
    }

    /// Parse `source` as `language`, through the cache.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedLanguage` for unknown languages and any
    /// parse error.
    pub fn parse(&self, origin: &str, source: &str, language: &str) -> Result<Arc<SyntaxTree>, Error> {
        let grammar = grammar_for_name(language)?;
        return self.cache.parse(origin, source, &grammar, self.config.parse_options(grammar.name));
    }

    /// Parse the source carried by a request.
    ///
    /// # Errors
    ///
    /// See `parse`.
    fn parse_params(&self, params: &SourceParams) -> Result<Arc<SyntaxTree>, Error> {
        let language = params.language.as_deref().unwrap_or(DEFAULT_LANGUAGE);
        return self.parse(WIRE_ORIGIN, &params.source, language);
    }
}

/// Help text of `name`.
///
/// # Errors
///
/// Returns `Error::UnknownMethod` for names not in the table.
pub fn help_text(name: &str) -> Result<&'static str, Error> {
    return lookup(name).map(|m| return m.help);
}

/// Names of every method, or with a tree, only those whose validator accepts it.
pub fn method_names(tree: Option<&SyntaxTree>) -> Vec<&'static str> {
    return METHODS
        .iter()
        .filter(|m| {
            return match (tree, m.validator) {
                (Some(t), Some(validator)) => validator.validate(t).is_ok(),
                _ => true,
            };
        })
        .map(|m| return m.name)
        .collect();
}

/// Innermost node at `pos`.
///
/// # Errors
///
/// Returns `Error::MalformedTree` if resolution fails.
pub fn node_at(tree: &SyntaxTree, pos: Position) -> Result<NodeSummary, Error> {
    let node = resolve_point(tree, pos)?;
    return Ok(tree.summary(node));
}

/// Node or sibling run covering `start..=end`.
///
/// # Errors
///
/// Returns `Error::MalformedTree` if resolution fails.
pub fn region_at(tree: &SyntaxTree, start: Position, end: Position) -> Result<RegionReport, Error> {
    let region = resolve_region(tree, start, end)?;
    let kind = match region {
        Region::Node(_) => "node",
        Region::Siblings(_) => "siblings",
    };
    return Ok(RegionReport {
        kind,
        nodes: region.nodes().iter().map(|n| return tree.summary(*n)).collect(),
        text: tree.serialize(&region).to_string(),
    });
}

/// Enclosing scopes of the node at `pos`, innermost first.
///
/// # Errors
///
/// Returns `Error::MalformedTree` if resolution or the parent walk fails.
pub fn scopes_at(tree: &SyntaxTree, pos: Position) -> Result<Vec<Scope>, Error> {
    let node = resolve_point(tree, pos)?;
    return scope_chain(tree, node);
}

/// Argument names and defaults of the single function in `tree`.
///
/// # Errors
///
/// Returns `Error::Validation` unless the source is exactly one function definition.
pub fn function_args(tree: &SyntaxTree) -> Result<Vec<(String, Option<String>)>, Error> {
    let nodes = FUNCTION_DEFINITION.validate(tree)?;
    return Ok(nodes.first().map(|f| return inspect::function_args(tree, *f)).unwrap_or_default());
}

/// Method table entry for `name`.
///
/// # Errors
///
/// Returns `Error::UnknownMethod` listing the registered names.
fn lookup(name: &str) -> Result<&'static Method, Error> {
    return METHODS.iter().find(|m| return m.name == name).ok_or_else(|| {
        return Error::UnknownMethod {
            available: METHODS.iter().map(|m| return m.name.to_string()).collect(),
            name: name.to_string(),
        };
    });
}

/// Decode the parameters of `method`, treating absent params as `{}`.
///
/// # Errors
///
/// Returns `Error::InvalidParams` describing the first mismatch.
fn params<T: DeserializeOwned>(method: &str, raw: &Value) -> Result<T, Error> {
    let raw = if raw.is_null() { Value::Object(serde_json::Map::new()) } else { raw.clone() };
    return serde_json::from_value(raw).map_err(|e| {
        return Error::InvalidParams { method: method.to_string(), reason: e.to_string() };
    });
}

/// `analyze` method.
fn analyze(provider: &Provider, raw: &Value) -> Result<Value, Error> {
    let p: AnalyzeParams = params("analyze", raw)?;
    let tree = provider.parse_params(&p.source)?;
    let dump = inspect::analyze(&tree, p.depth.unwrap_or(inspect::DEFAULT_DEPTH));
    return Ok(Value::String(dump));
}

/// `echo` method.
fn echo(_provider: &Provider, raw: &Value) -> Result<Value, Error> {
    let p: EchoParams = params("echo", raw)?;
    return Ok(p.echo);
}

/// `get_args` method.
fn get_args(provider: &Provider, raw: &Value) -> Result<Value, Error> {
    let p: SourceParams = params("get_args", raw)?;
    let tree = provider.parse_params(&p)?;
    return Ok(serde_json::to_value(function_args(&tree)?)?);
}

/// `get_current` method.
fn get_current(provider: &Provider, raw: &Value) -> Result<Value, Error> {
    let p: PointParams = params("get_current", raw)?;
    let tree = provider.parse_params(&p.source)?;
    return Ok(serde_json::to_value(node_at(&tree, Position::new(p.row, p.column))?)?);
}

/// `get_parents` method.
fn get_parents(provider: &Provider, raw: &Value) -> Result<Value, Error> {
    let p: PointParams = params("get_parents", raw)?;
    let tree = provider.parse_params(&p.source)?;
    return Ok(serde_json::to_value(scopes_at(&tree, Position::new(p.row, p.column))?)?);
}

/// `get_region` method.
fn get_region(provider: &Provider, raw: &Value) -> Result<Value, Error> {
    let p: RegionParams = params("get_region", raw)?;
    let tree = provider.parse_params(&p.source)?;
    return Ok(serde_json::to_value(region_at(&tree, p.start, p.end)?)?);
}

/// `help` method.
fn help(_provider: &Provider, raw: &Value) -> Result<Value, Error> {
    let p: HelpParams = params("help", raw)?;
    return Ok(Value::String(help_text(&p.name)?.to_string()));
}

/// `list_methods` method.
fn list_methods(provider: &Provider, raw: &Value) -> Result<Value, Error> {
    let p: ListParams = params("list_methods", raw)?;
    let names = match p.source {
        None => method_names(None),
        Some(source) => {
            let tree = provider.parse_params(&SourceParams { language: p.language, source })?;
            method_names(Some(&tree))
        }
    };
    return Ok(serde_json::to_value(names)?);
}

/// `set_logging_level` method.
fn set_logging_level(provider: &Provider, raw: &Value) -> Result<Value, Error> {
    let p: LevelParams = params("set_logging_level", raw)?;
    let Some(logging) = &provider.logging else {
        return Err(Error::InvalidParams {
            method: "set_logging_level".to_string(),
            reason: "logging was not initialised by this process".to_string(),
        });
    };
    logging.set_level(&p.level)?;
    return Ok(Value::Null);
}

/// `version` method.
fn version(_provider: &Provider, _raw: &Value) -> Result<Value, Error> {
    return Ok(Value::String(env!("CARGO_PKG_VERSION").to_string()));
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use serde_json::{Value, json};

    use super::{METHODS, Provider};
    use crate::config::Config;
    use crate::error::Error;

    fn provider() -> Provider {
        return Provider::new(Config::default(), None);
    }

    #[test]
    fn table_is_sorted_and_unique() {
        let names: Vec<&str> = METHODS.iter().map(|m| return m.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn unknown_method_lists_available() {
        let err = provider().call("rename_arg", &Value::Null).err().unwrap();
        let Error::UnknownMethod { available, name } = err else {
            panic!("expected unknown method, got {err:?}");
        };
        assert_eq!(name, "rename_arg");
        assert!(available.contains(&"get_region".to_string()));
    }

    #[test]
    fn echo_and_version() {
        let p = provider();
        assert_eq!(p.call("echo", &json!({"echo": [1, "two"]})).unwrap(), json!([1, "two"]));
        assert_eq!(p.call("version", &Value::Null).unwrap(), json!(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn missing_params_are_invalid() {
        let err = provider().call("get_current", &json!({"source": "x = 1"})).err().unwrap();
        assert!(matches!(err, Error::InvalidParams { ref method, .. } if method == "get_current"));
    }

    #[test]
    fn get_current_returns_the_innermost_node() {
        let result = provider()
            .call("get_current", &json!({"source": "x = [1, 2]", "row": 1, "column": 9}))
            .unwrap();
        assert_eq!(result["type_tag"], "integer");
        assert_eq!(result["text"], "2");
        assert_eq!(result["span"]["top_left"], json!({"column": 9, "row": 1}));
    }

    #[test]
    fn get_region_reports_siblings() {
        let source = indoc! {"
            for i in range(10):
                a = 1 + 2
                b = 4
                c = 5
                d = 7
        "};
        let result = provider()
            .call(
                "get_region",
                &json!({
                    "source": source,
                    "start": {"row": 3, "column": 7},
                    "end": {"row": 5, "column": 8},
                }),
            )
            .unwrap();
        assert_eq!(result["kind"], "siblings");
        assert_eq!(result["text"], "b = 4\n    c = 5\n    d = 7");
        assert_eq!(result["nodes"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn get_parents_walks_outward() {
        let result = provider()
            .call("get_parents", &json!({"source": "def f():\n    return g(1)\n", "row": 2, "column": 14}))
            .unwrap();
        let tags: Vec<&str> = result.as_array().unwrap().iter().map(|s| return s["type_tag"].as_str().unwrap()).collect();
        assert_eq!(tags.first(), Some(&"integer"));
        assert_eq!(tags.last(), Some(&"function_definition"));
    }

    #[test]
    fn get_args_requires_one_function() {
        let p = provider();
        let args = p.call("get_args", &json!({"source": "def foo(a, b=2): pass\n"})).unwrap();
        assert_eq!(args, json!([["a", null], ["b", "2"]]));

        let err = p.call("get_args", &json!({"source": "x = 1\n"})).err().unwrap();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn list_methods_filters_by_source() {
        let p = provider();
        let all = p.call("list_methods", &Value::Null).unwrap();
        assert!(all.as_array().unwrap().contains(&json!("get_args")));

        let for_assignment = p.call("list_methods", &json!({"source": "x = 1\n"})).unwrap();
        assert!(!for_assignment.as_array().unwrap().contains(&json!("get_args")));
        assert!(for_assignment.as_array().unwrap().contains(&json!("get_region")));

        let for_function = p.call("list_methods", &json!({"source": "def f(): pass\n"})).unwrap();
        assert!(for_function.as_array().unwrap().contains(&json!("get_args")));
    }

    #[test]
    fn help_describes_methods() {
        let p = provider();
        let text = p.call("help", &json!({"name": "get_region"})).unwrap();
        assert!(text.as_str().unwrap().starts_with("get_region("));
        assert!(p.call("help", &json!({"name": "nope"})).is_err());
    }

    #[test]
    fn analyze_uses_language_and_depth() {
        let result = provider()
            .call("analyze", &json!({"source": "fn main() {}\n", "language": "rust", "depth": 0}))
            .unwrap();
        assert_eq!(result, json!("function_item [1:1-1:12] ..."));
    }

    #[test]
    fn unsupported_language_is_reported() {
        let err = provider()
            .call("analyze", &json!({"source": "x", "language": "cobol"}))
            .err()
            .unwrap();
        assert!(matches!(err, Error::UnsupportedLanguage { .. }));
    }

    #[test]
    fn set_logging_level_without_subscriber_fails() {
        let err = provider().call("set_logging_level", &json!({"level": "DEBUG"})).err().unwrap();
        assert!(matches!(err, Error::InvalidParams { .. }));
    }
}
