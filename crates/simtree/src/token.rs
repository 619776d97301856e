use compact_str::CompactString;
use std::fmt;
use std::hash::Hash;

/// Kind of a lexed token.
///
/// Kinds are small copyable values (typically a fieldless enum) compared
/// and hashed when querying tree nodes for terminals of a given kind.
pub trait TokenKind: fmt::Debug + Copy + PartialEq + Eq + Hash {
    /// True for the end-of-input sentinel kind.
    fn is_eof(self) -> bool;
}

/// A token consumed from the input stream.
///
/// Tokens are owned by the stream layer; tree nodes store clones. The
/// runtime only needs the kind, the source text and the token's position
/// in its stream.
pub trait Token: fmt::Debug + Clone {
    /// Kind of this token.
    type Kind: TokenKind;

    /// Kind of this token.
    fn kind(&self) -> Self::Kind;

    /// Source text of this token.
    fn text(&self) -> CompactString;

    /// Position of this token in the token stream, or `None` when the
    /// token was never attached to a stream.
    fn index(&self) -> Option<usize>;
}
