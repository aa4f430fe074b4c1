//! # Parser Events
//!
//! Events are the intermediate representation between parsing and tree
//! building. Instead of building the tree directly, the parser emits a **flat
//! sequence** of events that describe the tree structure.
//!
//! ```text
//! Start(CODE_EXPRESSION)  ← Begin a CODE_EXPRESSION node
//!   Token(LPAREN, 1)      ← Add a 1-byte LPAREN token
//!   Token(CODE, 5)
//!   Token(RPAREN, 1)
//! Finish                  ← End the node
//! ```
//!
//! Tokens carry a byte length rather than a count of lexer tokens. The code
//! parser measures embedded code in bytes, and those lengths do not have to
//! line up with lexer token boundaries, so the [`Sink`](super::sink::Sink)
//! slices token text straight out of the source.

use crate::syntax_kind::SyntaxKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin a new composite node.
    Start { kind: SyntaxKind },

    /// Add a token of `len` bytes, starting where the previous token ended.
    Token { kind: SyntaxKind, len: u32 },

    /// Finish the current node.
    Finish,

    /// A reserved slot. `marker.complete()` replaces it with a `Start`; the
    /// Sink ignores any that remain.
    Placeholder,
}

impl Event {
    pub fn start(kind: SyntaxKind) -> Self {
        Event::Start { kind }
    }

    pub fn token(kind: SyntaxKind, len: usize) -> Self {
        Event::Token {
            kind,
            len: len as u32,
        }
    }
}
