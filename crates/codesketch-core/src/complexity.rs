//! Cyclomatic complexity of Python snippets via tree-sitter.
//!
//! Each function scores 1 + decision points. Nested functions are scored on
//! their own and do not add to their parent. A snippet that does not parse
//! cleanly as Python scores 0.0.

use tree_sitter::{Node, Parser};

/// Mean per-function complexity, or 0.0 if there are no functions or the
/// snippet is not valid Python.
pub fn average_complexity(code: &str) -> f64 {
    let scores = function_scores(code);
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<u32>() as f64 / scores.len() as f64
}

fn function_scores(code: &str) -> Vec<u32> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&tree_sitter_python::LANGUAGE.into()) {
        tracing::warn!(target: "codesketch::analyzer", "Python grammar unavailable: {}", e);
        return Vec::new();
    }

    let Some(tree) = parser.parse(code, None) else {
        return Vec::new();
    };

    let root = tree.root_node();
    if root.has_error() {
        tracing::debug!(
            target: "codesketch::analyzer",
            "Snippet is not valid Python, complexity degraded to 0"
        );
        return Vec::new();
    }

    let mut scores = Vec::new();
    collect_functions(root, &mut scores);
    scores
}

fn collect_functions(node: Node<'_>, scores: &mut Vec<u32>) {
    if node.kind() == "function_definition" {
        scores.push(1 + count_decision_points(node));
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_functions(child, scores);
    }
}

fn count_decision_points(node: Node<'_>) -> u32 {
    let mut count = 0;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "function_definition" {
            continue;
        }
        count += decision_weight(&child) + count_decision_points(child);
    }
    count
}

fn decision_weight(node: &Node<'_>) -> u32 {
    match node.kind() {
        "if_statement"
        | "elif_clause"
        | "for_statement"
        | "while_statement"
        | "except_clause"
        | "except_group_clause"
        | "boolean_operator"
        | "conditional_expression"
        | "for_in_clause"
        | "if_clause"
        | "assert_statement"
        | "case_clause" => 1,
        // Loop and try `else` branches add a path; an `if` else does not.
        "else_clause" => match node.parent().map(|p| p.kind()) {
            Some("for_statement" | "while_statement" | "try_statement") => 1,
            _ => 0,
        },
        _ => 0,
    }
}
