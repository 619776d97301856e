//! Listener and visitor dispatch over parse trees.

use crate::token::Token;
use crate::tree::context::RuleNode;
use crate::tree::node::{ParseTree, TokenNode};

/// Callbacks fired while a tree is walked.
///
/// `enter_rule`/`exit_rule` are the rule-specific half of the double
/// dispatch: implementations branch on [`RuleNode::rule_index`] to reach
/// their per-rule handlers, the role generated node subclasses play in
/// runtimes with inheritance. The walker guarantees the ordering:
/// generic before specific on enter, specific before generic on exit.
pub trait ParseTreeListener<T: Token> {
    /// A matched terminal was reached.
    fn visit_terminal(&mut self, node: &TokenNode<T>) {
        let _ = node;
    }

    /// An error leaf — input consumed during resynchronization — was
    /// reached.
    fn visit_error_node(&mut self, node: &TokenNode<T>) {
        let _ = node;
    }

    /// Fired for every rule node, before the rule-specific event.
    fn enter_every_rule(&mut self, ctx: &RuleNode<T>) {
        let _ = ctx;
    }

    /// Fired for every rule node, after the rule-specific event.
    fn exit_every_rule(&mut self, ctx: &RuleNode<T>) {
        let _ = ctx;
    }

    /// Rule-specific enter event, fired after [`enter_every_rule`].
    ///
    /// [`enter_every_rule`]: ParseTreeListener::enter_every_rule
    fn enter_rule(&mut self, ctx: &RuleNode<T>) {
        let _ = ctx;
    }

    /// Rule-specific exit event, fired before [`exit_every_rule`].
    ///
    /// [`exit_every_rule`]: ParseTreeListener::exit_every_rule
    fn exit_rule(&mut self, ctx: &RuleNode<T>) {
        let _ = ctx;
    }
}

/// Stateless depth-first walker.
///
/// The walker carries no state across calls: the same instance can drive
/// the same listener over independent trees with no reset. Each rule node
/// produces the symmetric event sequence
/// `enter_every_rule`, `enter_rule`, …children…, `exit_rule`,
/// `exit_every_rule`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParseTreeWalker;

impl ParseTreeWalker {
    /// Walk `tree` depth-first, left to right, firing `listener`.
    pub fn walk<T, L>(&self, listener: &mut L, tree: &ParseTree<T>)
    where
        T: Token,
        L: ParseTreeListener<T> + ?Sized,
    {
        match tree {
            ParseTree::Token(node) if node.is_error() => listener.visit_error_node(node),
            ParseTree::Token(node) => listener.visit_terminal(node),
            ParseTree::Rule(ctx) => {
                self.enter_rule(listener, ctx);
                for child in ctx.children() {
                    self.walk(listener, &child);
                }
                self.exit_rule(listener, ctx);
            }
        }
    }

    // Generic event first, then the rule-specific one.
    fn enter_rule<T, L>(&self, listener: &mut L, ctx: &RuleNode<T>)
    where
        T: Token,
        L: ParseTreeListener<T> + ?Sized,
    {
        listener.enter_every_rule(ctx);
        listener.enter_rule(ctx);
    }

    // Mirror of enter: rule-specific event first, then the generic one.
    fn exit_rule<T, L>(&self, listener: &mut L, ctx: &RuleNode<T>)
    where
        T: Token,
        L: ParseTreeListener<T> + ?Sized,
    {
        listener.exit_rule(ctx);
        listener.exit_every_rule(ctx);
    }
}

/// Result-aggregating traversal, the pull-style counterpart of the
/// listener walk.
///
/// The default [`visit_rule`] visits all children and folds their results
/// with [`aggregate_result`], stopping early when
/// [`should_visit_next_child`] says so.
///
/// [`visit_rule`]: ParseTreeVisitor::visit_rule
/// [`aggregate_result`]: ParseTreeVisitor::aggregate_result
/// [`should_visit_next_child`]: ParseTreeVisitor::should_visit_next_child
pub trait ParseTreeVisitor<T: Token> {
    type Output;

    /// Result for nodes the visitor does not handle and for empty rules.
    fn default_result(&mut self) -> Self::Output;

    /// Fold a child's result into the running aggregate. The default
    /// keeps the latest result.
    fn aggregate_result(&mut self, aggregate: Self::Output, next: Self::Output) -> Self::Output {
        let _ = aggregate;
        next
    }

    /// Checked before each child visit; returning `false` stops the
    /// children loop and keeps the current aggregate.
    fn should_visit_next_child(&mut self, ctx: &RuleNode<T>, current: &Self::Output) -> bool {
        let _ = (ctx, current);
        true
    }

    /// Dispatch on the node kind.
    fn visit(&mut self, tree: &ParseTree<T>) -> Self::Output {
        match tree {
            ParseTree::Rule(ctx) => self.visit_rule(ctx),
            ParseTree::Token(node) if node.is_error() => self.visit_error_node(node),
            ParseTree::Token(node) => self.visit_terminal(node),
        }
    }

    fn visit_rule(&mut self, ctx: &RuleNode<T>) -> Self::Output {
        self.visit_children(ctx)
    }

    fn visit_children(&mut self, ctx: &RuleNode<T>) -> Self::Output {
        let mut result = self.default_result();
        for child in ctx.children() {
            if !self.should_visit_next_child(ctx, &result) {
                return result;
            }
            let next = self.visit(&child);
            result = self.aggregate_result(result, next);
        }
        result
    }

    fn visit_terminal(&mut self, node: &TokenNode<T>) -> Self::Output {
        let _ = node;
        self.default_result()
    }

    fn visit_error_node(&mut self, node: &TokenNode<T>) -> Self::Output {
        let _ = node;
        self.default_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;
    use compact_str::CompactString;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[allow(dead_code)]
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
            None
        }
    }

    fn number(text: &'static str) -> TestToken {
        TestToken {
            kind: TestKind::Number,
            text,
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ParseTreeListener<TestToken> for Recorder {
        fn visit_terminal(&mut self, node: &TokenNode<TestToken>) {
            self.events.push(format!("terminal:{node}"));
        }

        fn visit_error_node(&mut self, node: &TokenNode<TestToken>) {
            self.events.push(format!("error:{node}"));
        }

        fn enter_every_rule(&mut self, ctx: &RuleNode<TestToken>) {
            self.events.push(format!("enter-generic:{}", ctx.rule_index()));
        }

        fn exit_every_rule(&mut self, ctx: &RuleNode<TestToken>) {
            self.events.push(format!("exit-generic:{}", ctx.rule_index()));
        }

        fn enter_rule(&mut self, ctx: &RuleNode<TestToken>) {
            self.events.push(format!("enter-specific:{}", ctx.rule_index()));
        }

        fn exit_rule(&mut self, ctx: &RuleNode<TestToken>) {
            self.events.push(format!("exit-specific:{}", ctx.rule_index()));
        }
    }

    #[test]
    fn test_event_order_for_one_rule() {
        let rule = RuleNode::new(0);
        rule.add_token(number("1"));
        rule.add_error_node(number("2"));

        let mut recorder = Recorder::default();
        ParseTreeWalker.walk(&mut recorder, &ParseTree::Rule(rule));
        assert_eq!(
            recorder.events,
            vec![
                "enter-generic:0",
                "enter-specific:0",
                "terminal:1",
                "error:2",
                "exit-specific:0",
                "exit-generic:0",
            ]
        );
    }

    #[test]
    fn test_walk_on_bare_leaf() {
        let mut recorder = Recorder::default();
        ParseTreeWalker.walk(
            &mut recorder,
            &ParseTree::Token(TokenNode::new(number("7"))),
        );
        assert_eq!(recorder.events, vec!["terminal:7"]);
    }

    struct Summer;

    impl ParseTreeVisitor<TestToken> for Summer {
        type Output = i64;

        fn default_result(&mut self) -> i64 {
            0
        }

        fn aggregate_result(&mut self, aggregate: i64, next: i64) -> i64 {
            aggregate + next
        }

        fn visit_terminal(&mut self, node: &TokenNode<TestToken>) -> i64 {
            node.token().text.parse().unwrap_or(0)
        }
    }

    #[test]
    fn test_visitor_aggregates_over_nested_rules() {
        let root = RuleNode::new(0);
        root.add_token(number("1"));
        let inner = RuleNode::with_parent(1, &root, 0);
        inner.add_token(number("2"));
        inner.add_token(number("3"));
        root.add_child(ParseTree::Rule(inner));

        let mut visitor = Summer;
        assert_eq!(visitor.visit(&ParseTree::Rule(root)), 6);
    }

    struct FirstOnly;

    impl ParseTreeVisitor<TestToken> for FirstOnly {
        type Output = Vec<String>;

        fn default_result(&mut self) -> Vec<String> {
            Vec::new()
        }

        fn aggregate_result(&mut self, mut aggregate: Vec<String>, next: Vec<String>) -> Vec<String> {
            aggregate.extend(next);
            aggregate
        }

        fn should_visit_next_child(
            &mut self,
            _ctx: &RuleNode<TestToken>,
            current: &Vec<String>,
        ) -> bool {
            current.is_empty()
        }

        fn visit_terminal(&mut self, node: &TokenNode<TestToken>) -> Vec<String> {
            vec![node.to_string()]
        }
    }

    #[test]
    fn test_visitor_early_stop() {
        let rule = RuleNode::new(0);
        rule.add_token(number("1"));
        rule.add_token(number("2"));

        let mut visitor = FirstOnly;
        assert_eq!(visitor.visit(&ParseTree::Rule(rule)), vec!["1"]);
    }
}
