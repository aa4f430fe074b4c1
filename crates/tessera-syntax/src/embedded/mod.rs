//! # Embedded Code
//!
//! The template parser does not understand the embedded language. It asks an
//! [`EmbeddedCodeParser`] how much of the source, starting at some offset,
//! belongs to one expression or statement, and where markup takes over again.
//!
//! ```text
//! @{ var items = Load(); <ul> ... </ul> Log(items); }
//!    ^ Block mode      ^ reentry: Tag
//!                                    ^ resume, Block mode, brace depth 0
//!                                                  ^ stop: BlockEnd
//! ```
//!
//! The caller bumps code up to each reentry point in turn and parses the
//! markup there. Code between the end of that markup and the next point (or
//! the end of the measured code) is taken from the same result. Once markup
//! runs past the measured code, the caller asks again from where the markup
//! ended, passing back the brace depth it was given so a `}` inside the markup
//! is never mistaken for the end of the block.
//!
//! [`BraceScanner`] stops at the first reentry point, so every result it
//! returns holds at most one, at its end. A host grammar may instead measure
//! a whole statement and list every reentry point inside it.
//!
//! [`BraceScanner`] is the default implementation, a balancing scanner for
//! C-family code. Hosts with a real grammar for their language implement the
//! trait themselves and pass it to [`parse_with`](crate::parse_with).

mod scanner;

pub use scanner::BraceScanner;

use crate::diagnostics::Diagnostic;

/// What kind of code to measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeMode {
    /// `name.Member(args)[index]` directly after `@`.
    ImplicitExpression,
    /// The inside of `@( ... )`; stops before the matching `)`.
    ExplicitExpression,
    /// The inside of a `{ ... }` block; stops before the unmatched `}`.
    Block { brace_depth: u32 },
    /// A control statement from its keyword through its last `}` (or `;`),
    /// continuations such as `else` and `catch` included. `after_do` lets a
    /// trailing `while (...);` continue a `do` body.
    Statement { brace_depth: u32, after_do: bool },
}

/// Where markup resumes inside code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReentryKind {
    /// `<tag` at the start of a statement.
    Tag,
    /// `<text>`, the pseudo element.
    TextTag,
    /// `@:` markup up to the end of the line.
    LineMarkup,
    /// `@* ... *@`.
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReentryPoint {
    pub offset: usize,
    pub kind: ReentryKind,
}

/// Why scanning stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeStop {
    /// The expression or statement is complete.
    Complete,
    /// Stopped before the `}` closing a [`CodeMode::Block`].
    BlockEnd,
    /// Stopped at a reentry point, which ends the measured code.
    Reentry,
    /// Ran out of input while something was still open.
    EndOfInput,
}

/// Result of measuring embedded code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedParse {
    /// Bytes of code consumed from the start offset.
    pub len: usize,
    /// Problems inside the code, with absolute ranges.
    pub diagnostics: Vec<Diagnostic>,
    /// Offsets where markup resumes, each within `offset..=offset + len`.
    /// Points outside that range are ignored with a warning.
    pub reentry_points: Vec<ReentryPoint>,
    /// Open braces at the stop point, to be passed back on resume.
    pub brace_depth: u32,
    pub stop: CodeStop,
}

/// The embedded-language capability.
pub trait EmbeddedCodeParser {
    fn parse(&self, source: &str, offset: usize, mode: CodeMode) -> EmbeddedParse;
}

impl<T: EmbeddedCodeParser + ?Sized> EmbeddedCodeParser for &T {
    fn parse(&self, source: &str, offset: usize, mode: CodeMode) -> EmbeddedParse {
        (**self).parse(source, offset, mode)
    }
}
