/// Tree-sitter grammar resolution by file extension or language name.
use std::path::Path;

use tree_sitter::Language;

use crate::error::Error;

/// Language names accepted by `grammar_for_name`, with their extensions.
pub const SUPPORTED: &[(&str, &[&str])] = &[
    ("bash", &["sh", "bash"]),
    ("go", &["go"]),
    ("python", &["py", "pyi"]),
    ("rust", &["rs"]),
    ("tsx", &["tsx", "jsx"]),
    ("typescript", &["ts", "js"]),
];

const BASH_CONTAINERS: &[&str] = &["compound_statement", "do_group", "program"];

const GO_CONTAINERS: &[&str] = &[
    "argument_list",
    "block",
    "field_declaration_list",
    "import_spec_list",
    "literal_value",
    "parameter_list",
    "source_file",
];

const PYTHON_CONTAINERS: &[&str] = &[
    "argument_list",
    "block",
    "dictionary",
    "expression_list",
    "list",
    "module",
    "parameters",
    "set",
    "tuple",
];

const RUST_CONTAINERS: &[&str] = &[
    "arguments",
    "array_expression",
    "block",
    "declaration_list",
    "enum_variant_list",
    "field_declaration_list",
    "match_block",
    "parameters",
    "source_file",
    "tuple_expression",
    "use_list",
];

const TYPESCRIPT_CONTAINERS: &[&str] = &[
    "arguments",
    "array",
    "class_body",
    "enum_body",
    "formal_parameters",
    "object",
    "program",
    "statement_block",
];

/// A tree-sitter language plus the node kinds that act as ordered containers.
pub struct Grammar {
    /// Node kinds whose named children form an index-addressable sequence.
    pub containers: &'static [&'static str],
    /// The tree-sitter language handle.
    pub language: Language,
    /// Canonical language name, also used as the config and cache key.
    pub name: &'static str,
}

/// Map a file extension to its grammar.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` for unknown extensions.
pub fn grammar_for_path(path: &Path) -> Result<Grammar, Error> {
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");

    let name = SUPPORTED
        .iter()
        .find(|(_, exts)| return exts.contains(&ext))
        .map(|(name, _)| return *name)
        .ok_or_else(|| return Error::UnsupportedLanguage { name: ext.to_string() })?;

    return grammar_for_name(name);
}

/// Look up a grammar by its canonical language name.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` for unknown names.
pub fn grammar_for_name(name: &str) -> Result<Grammar, Error> {
    return match name {
        "bash" => Ok(Grammar {
            containers: BASH_CONTAINERS,
            language: tree_sitter_bash::LANGUAGE.into(),
            name: "bash",
        }),
        "go" => Ok(Grammar {
            containers: GO_CONTAINERS,
            language: tree_sitter_go::LANGUAGE.into(),
            name: "go",
        }),
        "python" => Ok(Grammar {
            containers: PYTHON_CONTAINERS,
            language: tree_sitter_python::LANGUAGE.into(),
            name: "python",
        }),
        "rust" => Ok(Grammar {
            containers: RUST_CONTAINERS,
            language: tree_sitter_rust::LANGUAGE.into(),
            name: "rust",
        }),
        "tsx" => Ok(Grammar {
            containers: TYPESCRIPT_CONTAINERS,
            language: tree_sitter_typescript::LANGUAGE_TSX.into(),
            name: "tsx",
        }),
        "typescript" => Ok(Grammar {
            containers: TYPESCRIPT_CONTAINERS,
            language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            name: "typescript",
        }),
        _ => Err(Error::UnsupportedLanguage { name: name.to_string() }),
    };
}
