use crate::error::RecognitionError;
use crate::token::Token;
use crate::tree::interval::Interval;
use crate::tree::node::{ParseTree, TokenNode};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Rule-invocation record built while a rule is matched.
///
/// A `RuleNode` is a shared handle; clones refer to the same underlying
/// record. Children accumulate as matching proceeds, `start`/`stop` are
/// set once consumption begins/ends, and a [`RecognitionError`] is
/// attached when error recovery aborts the rule. The parent link is weak:
/// the parent owns its child list, the child never keeps the parent alive.
///
/// Records are confined to a single parse in progress; handles are not
/// thread-safe.
pub struct RuleNode<T: Token> {
    data: Rc<RefCell<RuleData<T>>>,
}

pub(crate) struct RuleData<T: Token> {
    parent: Option<Weak<RefCell<RuleData<T>>>>,
    invoking_state: Option<usize>,
    rule_index: usize,
    alt_number: u32,
    children: SmallVec<[ParseTree<T>; 4]>,
    start: Option<T>,
    stop: Option<T>,
    failure: Option<RecognitionError>,
}

impl<T: Token> RuleNode<T> {
    /// Root record for an invocation of the rule with `rule_index`.
    #[must_use]
    pub fn new(rule_index: usize) -> Self {
        Self::from_data(RuleData {
            parent: None,
            invoking_state: None,
            rule_index,
            alt_number: 0,
            children: SmallVec::new(),
            start: None,
            stop: None,
            failure: None,
        })
    }

    /// Record nested under `parent`, remembering the automaton state the
    /// invocation was made from. The parent link is fixed for the lifetime
    /// of this record (re-typing via [`RuleNode::copy_from`] creates a new
    /// record instead of rewriting an existing one).
    #[must_use]
    pub fn with_parent(rule_index: usize, parent: &Self, invoking_state: usize) -> Self {
        Self::from_data(RuleData {
            parent: Some(Rc::downgrade(&parent.data)),
            invoking_state: Some(invoking_state),
            rule_index,
            alt_number: 0,
            children: SmallVec::new(),
            start: None,
            stop: None,
            failure: None,
        })
    }

    fn from_data(data: RuleData<T>) -> Self {
        Self {
            data: Rc::new(RefCell::new(data)),
        }
    }

    pub(crate) fn from_rc(data: Rc<RefCell<RuleData<T>>>) -> Self {
        Self { data }
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<RuleData<T>>> {
        Rc::downgrade(&self.data)
    }

    #[must_use]
    pub fn rule_index(&self) -> usize {
        self.data.borrow().rule_index
    }

    /// Resolved alternative number, `0` while undecided.
    #[must_use]
    pub fn alt_number(&self) -> u32 {
        self.data.borrow().alt_number
    }

    pub fn set_alt_number(&self, alt: u32) {
        self.data.borrow_mut().alt_number = alt;
    }

    /// Automaton state in the caller this rule was invoked from.
    #[must_use]
    pub fn invoking_state(&self) -> Option<usize> {
        self.data.borrow().invoking_state
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.data
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Self::from_rc)
    }

    #[must_use]
    pub fn start(&self) -> Option<T> {
        self.data.borrow().start.clone()
    }

    #[must_use]
    pub fn stop(&self) -> Option<T> {
        self.data.borrow().stop.clone()
    }

    /// First token consumed under this rule.
    pub fn set_start(&self, token: T) {
        self.data.borrow_mut().start = Some(token);
    }

    /// Last token consumed under this rule.
    pub fn set_stop(&self, token: T) {
        self.data.borrow_mut().stop = Some(token);
    }

    /// The failure that forced this rule to return, if it did not complete
    /// normally.
    #[must_use]
    pub fn failure(&self) -> Option<RecognitionError> {
        self.data.borrow().failure.clone()
    }

    pub fn set_failure(&self, failure: RecognitionError) {
        self.data.borrow_mut().failure = Some(failure);
    }

    /// Node identity: whether two handles refer to the same record.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Append a child. The caller stays responsible for the child's own
    /// parent link; the token helpers below set it.
    pub fn add_child(&self, child: ParseTree<T>) {
        self.data.borrow_mut().children.push(child);
    }

    /// Wrap `token` in a terminal leaf, append it and point it back here.
    pub fn add_token(&self, token: T) -> TokenNode<T> {
        self.attach_leaf(TokenNode::new(token))
    }

    /// Wrap a token consumed during resynchronization in an error leaf,
    /// append it and point it back here.
    pub fn add_error_node(&self, token: T) -> TokenNode<T> {
        self.attach_leaf(TokenNode::new_error(token))
    }

    fn attach_leaf(&self, node: TokenNode<T>) -> TokenNode<T> {
        node.set_parent(Some(self));
        self.add_child(ParseTree::Token(node.clone()));
        node
    }

    /// Drop the most recently appended child. Does nothing on a record
    /// with no children; used to undo a speculative generic child before
    /// re-typing.
    pub fn remove_last_child(&self) {
        self.data.borrow_mut().children.pop();
    }

    /// Re-typing support: absorb `source`'s parent, invoking state and
    /// token bounds, dropping any children accumulated here. Only
    /// `source`'s error leaves carry over — they are re-parented onto this
    /// record so resynchronization artifacts survive the swap; all other
    /// children belong to the generic shape and are left behind.
    pub fn copy_from(&self, source: &Self) {
        {
            let src = source.data.borrow();
            let mut dst = self.data.borrow_mut();
            dst.parent = src.parent.clone();
            dst.invoking_state = src.invoking_state;
            dst.start = src.start.clone();
            dst.stop = src.stop.clone();
            dst.children.clear();
        }
        let error_leaves: Vec<TokenNode<T>> = source
            .data
            .borrow()
            .children
            .iter()
            .filter_map(|child| match child {
                ParseTree::Token(node) if node.is_error() => Some(node.clone()),
                _ => None,
            })
            .collect();
        for node in error_leaves {
            node.set_parent(Some(self));
            self.add_child(ParseTree::Token(node));
        }
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.data.borrow().children.len()
    }

    /// Child at `index`, or `None` when the record has no child there.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<ParseTree<T>> {
        self.data.borrow().children.get(index).cloned()
    }

    /// Ordered snapshot of the children.
    #[must_use]
    pub fn children(&self) -> Vec<ParseTree<T>> {
        self.data.borrow().children.to_vec()
    }

    /// Zero-based `index`-th child among those matching `filter`. Returns
    /// `None` both for an out-of-range index and for a record that never
    /// received children.
    #[must_use]
    pub fn nth_child_matching<F>(&self, index: usize, filter: F) -> Option<ParseTree<T>>
    where
        F: Fn(&ParseTree<T>) -> bool,
    {
        self.data
            .borrow()
            .children
            .iter()
            .filter(|child| filter(child))
            .nth(index)
            .cloned()
    }

    /// Zero-based `index`-th terminal child of `kind`, scanning left to
    /// right and skipping error and rule children.
    #[must_use]
    pub fn token(&self, kind: T::Kind, index: usize) -> Option<TokenNode<T>> {
        self.data
            .borrow()
            .children
            .iter()
            .filter_map(|child| match child {
                ParseTree::Token(node) if !node.is_error() && node.token().kind() == kind => {
                    Some(node.clone())
                }
                _ => None,
            })
            .nth(index)
    }

    /// Every matched terminal child of `kind`, in order.
    #[must_use]
    pub fn tokens(&self, kind: T::Kind) -> Vec<TokenNode<T>> {
        self.data
            .borrow()
            .children
            .iter()
            .filter_map(|child| match child {
                ParseTree::Token(node) if !node.is_error() && node.token().kind() == kind => {
                    Some(node.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Zero-based `index`-th nested rule child with `rule_index`.
    #[must_use]
    pub fn rule_child(&self, rule_index: usize, index: usize) -> Option<Self> {
        self.data
            .borrow()
            .children
            .iter()
            .filter_map(|child| match child {
                ParseTree::Rule(node) if node.rule_index() == rule_index => Some(node.clone()),
                _ => None,
            })
            .nth(index)
    }

    /// Every nested rule child with `rule_index`, in order.
    #[must_use]
    pub fn rule_children(&self, rule_index: usize) -> Vec<Self> {
        self.data
            .borrow()
            .children
            .iter()
            .filter_map(|child| match child {
                ParseTree::Rule(node) if node.rule_index() == rule_index => Some(node.clone()),
                _ => None,
            })
            .collect()
    }

    /// Token-index span consumed by this rule, or [`Interval::INVALID`]
    /// while either bound is unset.
    #[must_use]
    pub fn source_interval(&self) -> Interval {
        let data = self.data.borrow();
        match (&data.start, &data.stop) {
            (Some(start), Some(stop)) => match (start.index(), stop.index()) {
                (Some(a), Some(b)) => Interval::new(
                    i64::try_from(a).unwrap_or(i64::MAX),
                    i64::try_from(b).unwrap_or(i64::MAX),
                ),
                _ => Interval::INVALID,
            },
            _ => Interval::INVALID,
        }
    }
}

impl<T: Token> Clone for RuleNode<T> {
    fn clone(&self) -> Self {
        Self {
            data: Rc::clone(&self.data),
        }
    }
}

impl<T: Token> fmt::Debug for RuleNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("RuleNode")
            .field("rule_index", &data.rule_index)
            .field("alt_number", &data.alt_number)
            .field("children", &data.children.len())
            .finish()
    }
}
