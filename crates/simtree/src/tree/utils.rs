//! Read-only utility queries over parse trees.
//!
//! Everything here is a pure recursive function of the tree: finite,
//! restartable, and tolerant of nodes with no children.

use crate::token::Token;
use crate::tree::context::RuleNode;
use crate::tree::node::ParseTree;

/// Render `tree` in parenthesized LISP form.
///
/// Leaves render as their escaped text; inner nodes as
/// `(label child child ...)` where the label comes from [`node_text`].
#[must_use]
pub fn to_string_tree<T: Token>(tree: &ParseTree<T>, rule_names: Option<&[&str]>) -> String {
    let label = escape_whitespace(&node_text(tree, rule_names), false);
    let children = tree.children();
    if children.is_empty() {
        return label;
    }
    let mut out = String::new();
    out.push('(');
    out.push_str(&label);
    out.push(' ');
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&to_string_tree(child, rule_names));
    }
    out.push(')');
    out
}

/// Human-readable label for one node.
///
/// With a rule-name table: the rule name (suffixed `:alt` once a non-zero
/// alternative is recorded) for rule nodes, the rendered form for error
/// leaves, the raw token text for terminals. Without one, the token text
/// or the rule index.
#[must_use]
pub fn node_text<T: Token>(tree: &ParseTree<T>, rule_names: Option<&[&str]>) -> String {
    if let Some(names) = rule_names {
        match tree {
            ParseTree::Rule(ctx) => {
                let name = names[ctx.rule_index()];
                let alt = ctx.alt_number();
                if alt == 0 {
                    name.to_string()
                } else {
                    format!("{name}:{alt}")
                }
            }
            ParseTree::Token(node) if node.is_error() => node.to_string(),
            ParseTree::Token(node) => node.token().text().into(),
        }
    } else {
        match tree {
            ParseTree::Token(node) => node.token().text().into(),
            ParseTree::Rule(ctx) => ctx.rule_index().to_string(),
        }
    }
}

/// Escape `\n`, `\r` and `\t`; with `escape_spaces`, spaces become `·`.
#[must_use]
pub fn escape_whitespace(text: &str, escape_spaces: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' ' if escape_spaces => out.push('\u{00B7}'),
            _ => out.push(c),
        }
    }
    out
}

/// Chain of rule ancestors, root first, immediate parent last. Empty for
/// a root node.
#[must_use]
pub fn ancestors<T: Token>(tree: &ParseTree<T>) -> Vec<RuleNode<T>> {
    let mut chain = Vec::new();
    let mut current = tree.parent();
    while let Some(node) = current {
        current = node.parent();
        chain.push(node);
    }
    chain.reverse();
    chain
}

/// Collect every node satisfying `predicate` — the node itself included —
/// depth-first, pre-order.
#[must_use]
pub fn find_all_nodes<T, F>(tree: &ParseTree<T>, predicate: F) -> Vec<ParseTree<T>>
where
    T: Token,
    F: Fn(&ParseTree<T>) -> bool,
{
    let mut found = Vec::new();
    collect_matching(tree, &predicate, &mut found);
    found
}

fn collect_matching<T, F>(tree: &ParseTree<T>, predicate: &F, found: &mut Vec<ParseTree<T>>)
where
    T: Token,
    F: Fn(&ParseTree<T>) -> bool,
{
    if predicate(tree) {
        found.push(tree.clone());
    }
    for child in tree.children() {
        collect_matching(&child, predicate, found);
    }
}

/// Every terminal node of `kind`, pre-order.
#[must_use]
pub fn find_all_token_nodes<T: Token>(tree: &ParseTree<T>, kind: T::Kind) -> Vec<ParseTree<T>> {
    find_all_nodes(tree, |node| {
        node.as_token().is_some_and(|t| t.token().kind() == kind)
    })
}

/// Every rule node with `rule_index`, pre-order.
#[must_use]
pub fn find_all_rule_nodes<T: Token>(tree: &ParseTree<T>, rule_index: usize) -> Vec<ParseTree<T>> {
    find_all_nodes(tree, |node| {
        node.as_rule().is_some_and(|r| r.rule_index() == rule_index)
    })
}

/// The node itself followed by all descendants, pre-order.
#[must_use]
pub fn descendants<T: Token>(tree: &ParseTree<T>) -> Vec<ParseTree<T>> {
    find_all_nodes(tree, |_| true)
}
