use crate::token::{Token, TokenKind};
use crate::tree::context::{RuleData, RuleNode};
use crate::tree::interval::Interval;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Leaf node wrapping one consumed token.
///
/// A leaf with the error tag set marks input consumed during
/// resynchronization rather than a successful match; walkers dispatch it
/// to the dedicated error callback, and child queries that look for
/// matched terminals skip it. The parent back-reference is weak: the
/// parent owns the child list, never the other way around.
#[derive(Clone)]
pub struct TokenNode<T: Token> {
    inner: Rc<TokenData<T>>,
}

struct TokenData<T: Token> {
    token: T,
    error: bool,
    parent: RefCell<Option<Weak<RefCell<RuleData<T>>>>>,
}

impl<T: Token> TokenNode<T> {
    #[must_use]
    pub fn new(token: T) -> Self {
        Self::with_error_tag(token, false)
    }

    /// Leaf for a token consumed during error resynchronization.
    #[must_use]
    pub fn new_error(token: T) -> Self {
        Self::with_error_tag(token, true)
    }

    fn with_error_tag(token: T, error: bool) -> Self {
        Self {
            inner: Rc::new(TokenData {
                token,
                error,
                parent: RefCell::new(None),
            }),
        }
    }

    #[must_use]
    pub fn token(&self) -> &T {
        &self.inner.token
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.inner.error
    }

    #[must_use]
    pub fn parent(&self) -> Option<RuleNode<T>> {
        self.inner
            .parent
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(RuleNode::from_rc)
    }

    pub(crate) fn set_parent(&self, parent: Option<&RuleNode<T>>) {
        *self.inner.parent.borrow_mut() = parent.map(RuleNode::downgrade);
    }

    /// Single-token span, or [`Interval::INVALID`] for a token that never
    /// entered a stream.
    #[must_use]
    pub fn source_interval(&self) -> Interval {
        self.inner.token.index().map_or(Interval::INVALID, |i| {
            Interval::point(i64::try_from(i).unwrap_or(i64::MAX))
        })
    }

    /// Node identity: whether two handles refer to the same leaf.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Token> fmt::Display for TokenNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.token.kind().is_eof() {
            f.write_str("<EOF>")
        } else {
            f.write_str(self.inner.token.text().as_str())
        }
    }
}

impl<T: Token> fmt::Debug for TokenNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenNode")
            .field("token", &self.inner.token)
            .field("error", &self.inner.error)
            .finish()
    }
}

/// A node of the parse tree: an inner rule-invocation record or a leaf.
#[derive(Debug, Clone)]
pub enum ParseTree<T: Token> {
    Rule(RuleNode<T>),
    Token(TokenNode<T>),
}

impl<T: Token> ParseTree<T> {
    #[must_use]
    pub fn parent(&self) -> Option<RuleNode<T>> {
        match self {
            Self::Rule(node) => node.parent(),
            Self::Token(node) => node.parent(),
        }
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Option<Self> {
        match self {
            Self::Rule(node) => node.child(index),
            Self::Token(_) => None,
        }
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        match self {
            Self::Rule(node) => node.child_count(),
            Self::Token(_) => 0,
        }
    }

    /// Ordered snapshot of the children; empty for leaves.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        match self {
            Self::Rule(node) => node.children(),
            Self::Token(_) => Vec::new(),
        }
    }

    /// Concatenated text of every token under this node.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Token(node) => out.push_str(node.token().text().as_str()),
            Self::Rule(node) => {
                for child in node.children() {
                    child.collect_text(out);
                }
            }
        }
    }

    #[must_use]
    pub fn source_interval(&self) -> Interval {
        match self {
            Self::Rule(node) => node.source_interval(),
            Self::Token(node) => node.source_interval(),
        }
    }

    #[must_use]
    pub const fn as_rule(&self) -> Option<&RuleNode<T>> {
        match self {
            Self::Rule(node) => Some(node),
            Self::Token(_) => None,
        }
    }

    #[must_use]
    pub const fn as_token(&self) -> Option<&TokenNode<T>> {
        match self {
            Self::Rule(_) => None,
            Self::Token(node) => Some(node),
        }
    }

    /// True for an error leaf.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Token(node) if node.is_error())
    }

    /// Node identity: whether two handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Rule(a), Self::Rule(b)) => a.ptr_eq(b),
            (Self::Token(a), Self::Token(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl<T: Token> From<RuleNode<T>> for ParseTree<T> {
    fn from(node: RuleNode<T>) -> Self {
        Self::Rule(node)
    }
}

impl<T: Token> From<TokenNode<T>> for ParseTree<T> {
    fn from(node: TokenNode<T>) -> Self {
        Self::Token(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compact_str::CompactString;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestKind {
        Number,
        Eof,
    }

    impl TokenKind for TestKind {
        fn is_eof(self) -> bool {
            matches!(self, Self::Eof)
        }
    }

    #[derive(Debug, Clone)]
    struct TestToken {
        kind: TestKind,
        text: &'static str,
        index: Option<usize>,
    }

    impl Token for TestToken {
        type Kind = TestKind;

        fn kind(&self) -> TestKind {
            self.kind
        }

        fn text(&self) -> CompactString {
            self.text.into()
        }

        fn index(&self) -> Option<usize> {
            self.index
        }
    }

    fn number(text: &'static str, index: usize) -> TestToken {
        TestToken {
            kind: TestKind::Number,
            text,
            index: Some(index),
        }
    }

    #[test]
    fn test_leaf_display() {
        let node = TokenNode::new(number("42", 0));
        assert_eq!(node.to_string(), "42");
    }

    #[test]
    fn test_eof_display() {
        let node = TokenNode::new(TestToken {
            kind: TestKind::Eof,
            text: "",
            index: Some(3),
        });
        assert_eq!(node.to_string(), "<EOF>");
    }

    #[test]
    fn test_leaf_source_interval() {
        let node = TokenNode::new(number("42", 5));
        assert_eq!(node.source_interval(), Interval::point(5));
    }

    #[test]
    fn test_detached_token_interval_is_invalid() {
        let node = TokenNode::new(TestToken {
            kind: TestKind::Number,
            text: "42",
            index: None,
        });
        assert_eq!(node.source_interval(), Interval::INVALID);
    }

    #[test]
    fn test_leaf_has_no_children() {
        let tree: ParseTree<TestToken> = TokenNode::new(number("42", 0)).into();
        assert_eq!(tree.child_count(), 0);
        assert!(tree.child(0).is_none());
        assert!(tree.children().is_empty());
    }

    #[test]
    fn test_error_tag() {
        let ok: ParseTree<TestToken> = TokenNode::new(number("1", 0)).into();
        let bad: ParseTree<TestToken> = TokenNode::new_error(number("1", 0)).into();
        assert!(!ok.is_error());
        assert!(bad.is_error());
    }
}
