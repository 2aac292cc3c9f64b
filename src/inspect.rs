//! Read-only views over a parsed source: indented node dumps and function arguments.

use crate::adapter::TreeAdapter as _;
use crate::tree::{NodeId, SyntaxTree};

/// Default nesting depth for `analyze`.
pub const DEFAULT_DEPTH: usize = 2;

/// Indented dump of every top-level node, `depth` levels deep.
///
/// Each line reads `kind [span]`, prefixed by `field -> ` when the node fills
/// a field of its parent. Leaves end with their quoted text; a node cut off by
/// the depth limit ends with `...`.
pub fn analyze(tree: &SyntaxTree, depth: usize) -> String {
    let mut lines = Vec::new();
    for node in tree.top_level() {
        dump(tree, *node, 0, depth, &mut lines);
    }
    return lines.join("\n");
}

/// Append the dump of `node` and its descendants to `lines`.
fn dump(tree: &SyntaxTree, node: NodeId, level: usize, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(level);
    let field = tree.field_name(node).map(|f| return format!("{f} -> ")).unwrap_or_default();
    let head = format!("{indent}{field}{} [{}]", tree.type_tag(node), tree.span(node));

    let children = tree.children(node);
    if children.is_empty() {
        lines.push(format!("{head} {:?}", tree.text(node)));
        return;
    }
    if level >= depth {
        lines.push(format!("{head} ..."));
        return;
    }

    lines.push(head);
    for child in children {
        dump(tree, *child, level.saturating_add(1), depth, lines);
    }
}

/// Arguments of a function definition as `(name, default)` pairs in order.
///
/// Splat parameters keep their stars (`*args`, `**kwargs`). Bare `*` and `/`
/// separators are not arguments and are skipped.
pub fn function_args(tree: &SyntaxTree, function: NodeId) -> Vec<(String, Option<String>)> {
    let Some(parameters) = tree.child_by_field(function, "parameters") else {
        return Vec::new();
    };

    return tree
        .children(parameters)
        .iter()
        .filter_map(|param| return argument(tree, *param))
        .collect();
}

/// Name and default of one entry of a parameter list.
fn argument(tree: &SyntaxTree, param: NodeId) -> Option<(String, Option<String>)> {
    let field_text = |field: &str| return tree.child_by_field(param, field).map(|n| return tree.text(n).to_string());

    return match tree.type_tag(param) {
        "keyword_separator" | "positional_separator" => None,
        "default_parameter" | "typed_default_parameter" => {
            Some((field_text("name").unwrap_or_default(), field_text("value")))
        }
        "typed_parameter" => {
            let name = tree.children(param).first().map(|n| return tree.text(*n).to_string());
            Some((name.unwrap_or_default(), None))
        }
        _ => Some((tree.text(param).to_string(), None)),
    };
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::{analyze, function_args};
    use crate::tree::tests::python;

    fn args_of(source: &str) -> Vec<(String, Option<String>)> {
        let tree = python(source);
        return function_args(&tree, tree.top_level()[0]);
    }

    fn pair(name: &str, default: Option<&str>) -> (String, Option<String>) {
        return (name.to_string(), default.map(str::to_string));
    }

    #[test]
    fn analyze_stops_at_depth() {
        let tree = python("a = 1+1");
        let expected = indoc! {r#"
            expression_statement [1:1-1:7]
              assignment [1:1-1:7]
                left -> identifier [1:1-1:1] "a"
                right -> binary_operator [1:5-1:7] ..."#};
        assert_eq!(analyze(&tree, 2), expected);
    }

    #[test]
    fn analyze_depth_zero_lists_top_level() {
        let tree = python("x = 1\npass\n");
        assert_eq!(analyze(&tree, 0), "expression_statement [1:1-1:5] ...\npass_statement [2:1-2:4] \"pass\"");
    }

    #[test]
    fn positional_and_keyword_args() {
        let got = args_of("def foo(arg1, arg2, *args, kwarg1=1, kwarg2=3, kwarg3=None): pass\n");
        assert_eq!(
            got,
            [
                pair("arg1", None),
                pair("arg2", None),
                pair("*args", None),
                pair("kwarg1", Some("1")),
                pair("kwarg2", Some("3")),
                pair("kwarg3", Some("None")),
            ]
        );
    }

    #[test]
    fn annotated_args_and_separators() {
        let got = args_of("def f(a: int, /, b: str = 'x', *, c, **kw) -> None: pass\n");
        assert_eq!(
            got,
            [pair("a", None), pair("b", Some("'x'")), pair("c", None), pair("**kw", None)]
        );
    }

    #[test]
    fn no_args() {
        assert!(args_of("def f(): pass\n").is_empty());
    }
}
