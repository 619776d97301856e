use crate::automaton::set::SetIdentity;
use crate::automaton::{AutomatonState, SemanticContext};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// One hypothesis tracked during automaton simulation: the reached state,
/// the predicted alternative, the rule-invocation context and the
/// predicates still pending.
///
/// Configurations are values. Everything that participates in identity is
/// fixed at construction; derived hypotheses come out of the `successor*`
/// constructors, which carry the bookkeeping fields forward. Two identity
/// regimes coexist:
///
/// - **full** ([`PartialEq`]/[`Hash`]): state number, alternative, context
///   (by value, even when storage is shared), semantic context, and the
///   precedence-filter flag;
/// - **reduced** ([`SetIdentity`]): state number, alternative and semantic
///   context only. Dropping the context lets a [`ConfigSet`] collapse
///   hypotheses that reached the same decision through different call
///   histories.
///
/// [`ConfigSet`]: crate::automaton::ConfigSet
#[derive(Debug)]
pub struct Config<S, C, P>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
{
    state: Arc<S>,
    alt: Option<u32>,
    context: Option<Arc<C>>,
    semantic: Arc<P>,
    /// How deep simulation has dipped into caller context past the entry
    /// rule. Predicates that depend on local context are unsafe to
    /// evaluate once this is non-zero. Never decremented.
    pub reaches_into_outer_context: u32,
    /// Set when left-recursion precedence filtering must leave this
    /// hypothesis alone.
    pub precedence_filter_suppressed: bool,
}

impl<S, C, P> Config<S, C, P>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
{
    /// New hypothesis with no pending predicate.
    #[must_use]
    pub fn new(state: Arc<S>, alt: Option<u32>, context: Option<Arc<C>>) -> Self {
        Self::with_semantic(state, alt, context, P::none())
    }

    /// New hypothesis gated by `semantic`.
    #[must_use]
    pub fn with_semantic(
        state: Arc<S>,
        alt: Option<u32>,
        context: Option<Arc<C>>,
        semantic: Arc<P>,
    ) -> Self {
        Self {
            state,
            alt,
            context,
            semantic,
            reaches_into_outer_context: 0,
            precedence_filter_suppressed: false,
        }
    }

    /// Derived hypothesis at `state`, keeping everything else.
    #[must_use]
    pub fn successor(&self, state: Arc<S>) -> Self {
        let mut next = self.clone();
        next.state = state;
        next
    }

    /// Derived hypothesis at `state` with a replaced invocation context.
    #[must_use]
    pub fn successor_with_context(&self, state: Arc<S>, context: Option<Arc<C>>) -> Self {
        let mut next = self.clone();
        next.state = state;
        next.context = context;
        next
    }

    /// Derived hypothesis at `state` with a replaced predicate tree.
    #[must_use]
    pub fn successor_with_semantic(&self, state: Arc<S>, semantic: Arc<P>) -> Self {
        let mut next = self.clone();
        next.state = state;
        next.semantic = semantic;
        next
    }

    #[must_use]
    pub fn state(&self) -> &Arc<S> {
        &self.state
    }

    /// Predicted alternative (or lexer rule), if this hypothesis has
    /// committed to one.
    #[must_use]
    pub const fn alt(&self) -> Option<u32> {
        self.alt
    }

    /// Graph-structured stack of rule invocations leading to the state.
    #[must_use]
    pub const fn context(&self) -> Option<&Arc<C>> {
        self.context.as_ref()
    }

    #[must_use]
    pub fn semantic_context(&self) -> &Arc<P> {
        &self.semantic
    }

    /// Context comparison: pointer identity as a shortcut, structural
    /// equality as the contract. Shared storage must never be required for
    /// two configurations to compare equal.
    fn context_eq(a: Option<&Arc<C>>, b: Option<&Arc<C>>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(x), Some(y)) => Arc::ptr_eq(x, y) || **x == **y,
            _ => false,
        }
    }

    fn semantic_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.semantic, &other.semantic) || *self.semantic == *other.semantic
    }
}

impl<S, C, P> Clone for Config<S, C, P>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            alt: self.alt,
            context: self.context.clone(),
            semantic: Arc::clone(&self.semantic),
            reaches_into_outer_context: self.reaches_into_outer_context,
            precedence_filter_suppressed: self.precedence_filter_suppressed,
        }
    }
}

impl<S, C, P> PartialEq for Config<S, C, P>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
{
    fn eq(&self, other: &Self) -> bool {
        self.state.state_number() == other.state.state_number()
            && self.alt == other.alt
            && Self::context_eq(self.context.as_ref(), other.context.as_ref())
            && self.semantic_eq(other)
            && self.precedence_filter_suppressed == other.precedence_filter_suppressed
    }
}

impl<S, C, P> Eq for Config<S, C, P>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
{
}

impl<S, C, P> Hash for Config<S, C, P>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.state.state_number().hash(state);
        self.alt.hash(state);
        self.context.as_deref().hash(state);
        self.semantic.hash(state);
    }
}

impl<S, C, P> SetIdentity for Config<S, C, P>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
{
    fn set_hash<H: Hasher>(&self, hasher: &mut H) {
        self.state.state_number().hash(hasher);
        self.alt.hash(hasher);
        self.semantic.hash(hasher);
    }

    fn set_eq(&self, other: &Self) -> bool {
        self.state.state_number() == other.state.state_number()
            && self.alt == other.alt
            && self.semantic_eq(other)
    }
}

impl<S, C, P> fmt::Display for Config<S, C, P>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.state.state_number())?;
        match self.alt {
            Some(alt) => write!(f, ",{alt}")?,
            None => f.write_str(",?")?,
        }
        if let Some(context) = &self.context {
            write!(f, ",[{context:?}]")?;
        }
        if !self.semantic.is_none() {
            write!(f, ",{:?}", self.semantic)?;
        }
        if self.reaches_into_outer_context > 0 {
            write!(f, ",up={}", self.reaches_into_outer_context)?;
        }
        f.write_str(")")
    }
}

/// Lexer-mode hypothesis: a [`Config`] plus the ordered action list to run
/// if this hypothesis wins and the sticky non-greedy marker.
///
/// Both identity regimes additionally include the executor and the marker.
/// The reduced key therefore equals the full key: a lexer must never merge
/// hypotheses that would fire different actions, so lexer sets gain
/// nothing from context-free collapsing — this is intentional, not a
/// missed optimization.
#[derive(Debug)]
pub struct LexerConfig<S, C, P, E>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
    E: fmt::Debug + Eq + Hash,
{
    config: Config<S, C, P>,
    executor: Option<Arc<E>>,
    passed_through_nongreedy: bool,
}

impl<S, C, P, E> LexerConfig<S, C, P, E>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
    E: fmt::Debug + Eq + Hash,
{
    /// New hypothesis with no pending actions.
    #[must_use]
    pub fn new(state: Arc<S>, alt: Option<u32>, context: Option<Arc<C>>) -> Self {
        Self {
            config: Config::new(state, alt, context),
            executor: None,
            passed_through_nongreedy: false,
        }
    }

    /// New hypothesis carrying an action list.
    #[must_use]
    pub fn with_executor(
        state: Arc<S>,
        alt: Option<u32>,
        context: Option<Arc<C>>,
        executor: Arc<E>,
    ) -> Self {
        Self {
            config: Config::new(state, alt, context),
            executor: Some(executor),
            passed_through_nongreedy: false,
        }
    }

    /// Derived hypothesis at `state`, keeping the action list.
    ///
    /// The non-greedy marker is resolved here, once, from the parent's
    /// already-sticky flag; it is never recomputed transitively later.
    #[must_use]
    pub fn successor(&self, state: Arc<S>) -> Self {
        let passed = self.check_nongreedy_decision(&state);
        Self {
            config: self.config.successor(state),
            executor: self.executor.clone(),
            passed_through_nongreedy: passed,
        }
    }

    /// Derived hypothesis at `state` with a replaced invocation context.
    #[must_use]
    pub fn successor_with_context(&self, state: Arc<S>, context: Option<Arc<C>>) -> Self {
        let passed = self.check_nongreedy_decision(&state);
        Self {
            config: self.config.successor_with_context(state, context),
            executor: self.executor.clone(),
            passed_through_nongreedy: passed,
        }
    }

    /// Derived hypothesis at `state` with a replaced action list.
    #[must_use]
    pub fn successor_with_executor(&self, state: Arc<S>, executor: Arc<E>) -> Self {
        let passed = self.check_nongreedy_decision(&state);
        Self {
            config: self.config.successor(state),
            executor: Some(executor),
            passed_through_nongreedy: passed,
        }
    }

    fn check_nongreedy_decision(&self, target: &S) -> bool {
        self.passed_through_nongreedy || target.is_nongreedy_decision()
    }

    #[must_use]
    pub const fn config(&self) -> &Config<S, C, P> {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &Arc<S> {
        self.config.state()
    }

    #[must_use]
    pub const fn alt(&self) -> Option<u32> {
        self.config.alt()
    }

    #[must_use]
    pub const fn context(&self) -> Option<&Arc<C>> {
        self.config.context()
    }

    #[must_use]
    pub fn semantic_context(&self) -> &Arc<P> {
        self.config.semantic_context()
    }

    /// Ordered action list to run if this hypothesis wins, if any.
    #[must_use]
    pub const fn executor(&self) -> Option<&Arc<E>> {
        self.executor.as_ref()
    }

    /// True once any configuration on the derivation path crossed a
    /// non-greedy decision point.
    #[must_use]
    pub const fn passed_through_nongreedy(&self) -> bool {
        self.passed_through_nongreedy
    }

    fn executor_eq(&self, other: &Self) -> bool {
        match (&self.executor, &other.executor) {
            (None, None) => true,
            (Some(x), Some(y)) => Arc::ptr_eq(x, y) || **x == **y,
            _ => false,
        }
    }
}

impl<S, C, P, E> Clone for LexerConfig<S, C, P, E>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
    E: fmt::Debug + Eq + Hash,
{
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            executor: self.executor.clone(),
            passed_through_nongreedy: self.passed_through_nongreedy,
        }
    }
}

impl<S, C, P, E> PartialEq for LexerConfig<S, C, P, E>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
    E: fmt::Debug + Eq + Hash,
{
    fn eq(&self, other: &Self) -> bool {
        self.passed_through_nongreedy == other.passed_through_nongreedy
            && self.executor_eq(other)
            && self.config == other.config
    }
}

impl<S, C, P, E> Eq for LexerConfig<S, C, P, E>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
    E: fmt::Debug + Eq + Hash,
{
}

impl<S, C, P, E> Hash for LexerConfig<S, C, P, E>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
    E: fmt::Debug + Eq + Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.config.hash(state);
        self.passed_through_nongreedy.hash(state);
        self.executor.as_deref().hash(state);
    }
}

impl<S, C, P, E> SetIdentity for LexerConfig<S, C, P, E>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
    E: fmt::Debug + Eq + Hash,
{
    // Reduced key == complete key: action metadata must never merge away.
    fn set_hash<H: Hasher>(&self, hasher: &mut H) {
        self.hash(hasher);
    }

    fn set_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl<S, C, P, E> fmt::Display for LexerConfig<S, C, P, E>
where
    S: AutomatonState,
    C: fmt::Debug + Eq + Hash,
    P: SemanticContext,
    E: fmt::Debug + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.config.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    #[derive(Debug)]
    struct TestState {
        number: usize,
        nongreedy: bool,
    }

    impl TestState {
        fn plain(number: usize) -> Arc<Self> {
            Arc::new(Self {
                number,
                nongreedy: false,
            })
        }

        fn nongreedy(number: usize) -> Arc<Self> {
            Arc::new(Self {
                number,
                nongreedy: true,
            })
        }
    }

    impl AutomatonState for TestState {
        fn state_number(&self) -> usize {
            self.number
        }

        fn is_nongreedy_decision(&self) -> bool {
            self.nongreedy
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct CallStack(Vec<usize>);

    #[derive(Debug, PartialEq, Eq, Hash)]
    enum Pred {
        None,
        Gate(u32),
    }

    impl SemanticContext for Pred {
        fn none() -> Arc<Self> {
            Arc::new(Self::None)
        }

        fn is_none(&self) -> bool {
            matches!(self, Self::None)
        }
    }

    #[derive(Debug, PartialEq, Eq, Hash)]
    struct Actions(Vec<&'static str>);

    type PConfig = Config<TestState, CallStack, Pred>;
    type LConfig = LexerConfig<TestState, CallStack, Pred, Actions>;

    fn full_hash<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    fn reduced_hash<T: SetIdentity>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.set_hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_structurally_equal_contexts_compare_equal() {
        let a = PConfig::new(
            TestState::plain(7),
            Some(1),
            Some(Arc::new(CallStack(vec![3, 4]))),
        );
        let b = PConfig::new(
            TestState::plain(7),
            Some(1),
            Some(Arc::new(CallStack(vec![3, 4]))),
        );
        assert_eq!(a, b);
        assert_eq!(full_hash(&a), full_hash(&b));
    }

    #[test]
    fn test_set_identity_ignores_context() {
        let a = PConfig::new(
            TestState::plain(7),
            Some(1),
            Some(Arc::new(CallStack(vec![3]))),
        );
        let b = PConfig::new(
            TestState::plain(7),
            Some(1),
            Some(Arc::new(CallStack(vec![3, 4]))),
        );
        assert_ne!(a, b);
        assert!(a.set_eq(&b));
        assert_eq!(reduced_hash(&a), reduced_hash(&b));
    }

    #[test]
    fn test_precedence_flag_in_full_identity_only() {
        let a = PConfig::new(TestState::plain(7), Some(1), None);
        let mut b = a.clone();
        b.precedence_filter_suppressed = true;
        assert_ne!(a, b);
        assert!(a.set_eq(&b));
    }

    #[test]
    fn test_semantic_context_in_both_identities() {
        let a = PConfig::new(TestState::plain(7), Some(1), None);
        let b = PConfig::with_semantic(
            TestState::plain(7),
            Some(1),
            None,
            Arc::new(Pred::Gate(2)),
        );
        assert_ne!(a, b);
        assert!(!a.set_eq(&b));
    }

    #[test]
    fn test_successor_carries_bookkeeping() {
        let mut config = PConfig::new(
            TestState::plain(1),
            Some(2),
            Some(Arc::new(CallStack(vec![9]))),
        );
        config.reaches_into_outer_context = 3;
        config.precedence_filter_suppressed = true;

        let next = config.successor(TestState::plain(2));
        assert_eq!(next.state().state_number(), 2);
        assert_eq!(next.alt(), Some(2));
        assert_eq!(next.context(), config.context());
        assert_eq!(next.reaches_into_outer_context, 3);
        assert!(next.precedence_filter_suppressed);
    }

    #[test]
    fn test_display() {
        let mut config = PConfig::with_semantic(
            TestState::plain(5),
            Some(2),
            Some(Arc::new(CallStack(vec![1]))),
            Arc::new(Pred::Gate(7)),
        );
        config.reaches_into_outer_context = 1;
        assert_eq!(
            format!("{config}"),
            "(5,2,[CallStack([1])],Gate(7),up=1)"
        );
    }

    #[test]
    fn test_display_omits_unset_parts() {
        let config = PConfig::new(TestState::plain(5), Some(2), None);
        assert_eq!(format!("{config}"), "(5,2)");
    }

    #[test]
    fn test_lexer_executor_blocks_both_identities() {
        let a = LConfig::with_executor(
            TestState::plain(4),
            Some(1),
            None,
            Arc::new(Actions(vec!["skip"])),
        );
        let b = LConfig::with_executor(
            TestState::plain(4),
            Some(1),
            None,
            Arc::new(Actions(vec!["more"])),
        );
        assert_ne!(a, b);
        assert!(!a.set_eq(&b));
    }

    #[test]
    fn test_lexer_reduced_key_equals_full_key() {
        let config = LConfig::with_executor(
            TestState::plain(4),
            Some(1),
            Some(Arc::new(CallStack(vec![2]))),
            Arc::new(Actions(vec!["skip"])),
        );
        assert_eq!(reduced_hash(&config), full_hash(&config));
    }

    #[test]
    fn test_nongreedy_marker_set_on_crossing() {
        let start = LConfig::new(TestState::plain(0), Some(1), None);
        assert!(!start.passed_through_nongreedy());

        let crossed = start.successor(TestState::nongreedy(1));
        assert!(crossed.passed_through_nongreedy());
    }

    #[test]
    fn test_nongreedy_marker_is_sticky() {
        let start = LConfig::new(TestState::plain(0), Some(1), None);
        let crossed = start.successor(TestState::nongreedy(1));
        let after = crossed.successor(TestState::plain(2));
        assert!(after.passed_through_nongreedy());
    }

    #[test]
    fn test_initial_lexer_config_never_marked() {
        // The marker comes from crossing a decision, not from starting on one.
        let start = LConfig::new(TestState::nongreedy(0), Some(1), None);
        assert!(!start.passed_through_nongreedy());
    }

    #[test]
    fn test_nongreedy_marker_in_identity() {
        let start = LConfig::new(TestState::plain(0), Some(1), None);
        let plain = start.successor(TestState::plain(3));
        let marked = start.successor(TestState::nongreedy(1)).successor(TestState::plain(3));
        assert_ne!(plain, marked);
        assert!(!plain.set_eq(&marked));
    }
}
