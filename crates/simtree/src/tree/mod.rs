//! Parse-tree node model, construction and traversal.
//!
//! The parser driver builds trees out of two node shapes: [`RuleNode`],
//! the mutable record of one rule invocation, and [`TokenNode`], an
//! immutable leaf for a consumed token (tagged when the token was eaten
//! during error resynchronization). [`ParseTree`] is the polymorphic
//! element joining them.
//!
//! Finished or in-progress trees are observed through
//! [`ParseTreeWalker`]/[`ParseTreeListener`] events, pulled through a
//! [`ParseTreeVisitor`], or queried with the free functions in this
//! module ([`to_string_tree`], [`find_all_rule_nodes`], …).

mod context;
mod interval;
mod node;
mod utils;
mod visitor;

pub use context::RuleNode;
pub use interval::Interval;
pub use node::{ParseTree, TokenNode};
pub use utils::{
    ancestors, descendants, escape_whitespace, find_all_nodes, find_all_rule_nodes,
    find_all_token_nodes, node_text, to_string_tree,
};
pub use visitor::{ParseTreeListener, ParseTreeVisitor, ParseTreeWalker};
