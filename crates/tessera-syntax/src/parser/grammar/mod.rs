//! # Grammar - The Frame Stack
//!
//! The document is parsed by a single loop over an explicit stack of
//! [`Frame`]s. The top frame owns control: it consumes some input and either
//! continues, pushes a child frame, or asks to be popped.
//!
//! ```text
//! <ul>@foreach (var i in items) { <li>@i</li> }</ul>
//! ^ Markup(Document)
//!      ^ Code(Statement)          ^ Markup(Element)
//!                                 (implicit expressions parse flat)
//! ```
//!
//! Frames replace language-level recursion, so element nesting and
//! markup/code ping-pong are bounded by heap, not by the call stack:
//!
//! - [`markup`]: markup content up to the frame's end condition (end of input,
//!   close of a re-entered root element, `</text>`, end of line, or the `}` of
//!   a section body). Each frame keeps its own open-element stack.
//! - [`code`]: a `{ ... }` block or control statement, measured by the
//!   embedded-code parser and interrupted by markup re-entry points.
//!
//! Constructs that cannot contain markup (expressions, comments, single-line
//! directives, end tags) parse flat without a frame.

mod code;
mod markup;

use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

use code::{CodeFrame, SectionFrame};
use markup::MarkupFrame;

/// Consecutive iterations allowed without the cursor moving.
const STALL_LIMIT: u32 = 32;

enum Frame {
    Markup(MarkupFrame),
    Code(CodeFrame),
    /// A markup-block directive waiting for its closing `}`.
    Section(SectionFrame),
}

impl Frame {
    fn name(&self) -> &'static str {
        match self {
            Frame::Markup(_) => "markup",
            Frame::Code(_) => "code",
            Frame::Section(_) => "section",
        }
    }
}

enum Step {
    Continue,
    Push(Frame),
    Pop,
}

/// Parse the whole document.
pub(crate) fn root(p: &mut Parser<'_>) {
    let doc = p.start();
    let mut stack = vec![Frame::Markup(MarkupFrame::document())];
    let mut last_pos = p.pos();
    let mut stalls = 0;

    while let Some(frame) = stack.last_mut() {
        let step = match frame {
            Frame::Markup(f) => markup::step(p, f),
            Frame::Code(f) => code::step(p, f),
            Frame::Section(f) => code::section_step(p, f),
        };
        match step {
            Step::Continue => {}
            Step::Push(frame) => {
                log::trace!("push {} frame at {}", frame.name(), p.pos());
                stack.push(frame);
            }
            Step::Pop => {
                if let Some(frame) = stack.pop() {
                    log::trace!("pop {} frame at {}", frame.name(), p.pos());
                    close(p, frame);
                }
            }
        }

        if p.pos() != last_pos || p.at_end() {
            last_pos = p.pos();
            stalls = 0;
        } else {
            stalls += 1;
            if stalls > STALL_LIMIT {
                log::warn!(
                    "no progress at offset {} after {} steps; treating one character as text",
                    p.pos(),
                    stalls
                );
                p.bump_char_text();
                stalls = 0;
            }
        }
    }

    if p.source().is_empty() {
        p.bump_bytes(0, SyntaxKind::TEXT);
    }
    doc.complete(p, SyntaxKind::DOCUMENT);
}

fn close(p: &mut Parser<'_>, frame: Frame) {
    match frame {
        Frame::Markup(f) => markup::close(p, f),
        Frame::Code(f) => code::close(p, f),
        Frame::Section(f) => code::close_section(p, f),
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// ASCII whitespace the lexer emits as `WHITESPACE` or `NEWLINE`.
fn is_trivia(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

/// Bump `len` bytes of trivia as `WHITESPACE`/`NEWLINE` tokens.
fn bump_trivia(p: &mut Parser<'_>, len: usize) {
    let end = p.pos() + len;
    while p.pos() < end && !p.at_end() {
        p.bump();
    }
}
