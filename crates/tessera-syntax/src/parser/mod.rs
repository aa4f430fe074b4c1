//! # Parser - Event-Based Tree Construction
//!
//! This module implements the core parsing logic, transforming template
//! source into a syntax tree using the **event-based** architecture from
//! rust-analyzer.
//!
//! The parser emits a flat list of **events** ([`Event`]) that describe the
//! tree structure. The [`Sink`] then builds the actual Rowan tree from events.
//! Nothing in the grammar recurses on nesting depth: markup and code nest
//! through an explicit frame stack (see [`grammar`]), and open nodes are
//! [`Marker`]s held by those frames.
//!
//! ## Reading the Source
//!
//! Unlike a classic token-slice parser, [`Parser`] keeps a byte offset into
//! the source and re-lexes lazily from there with
//! [`tokens_at`](crate::lexer::tokens_at). Embedded code is measured in bytes
//! by an [`EmbeddedCodeParser`], so the next markup token can start anywhere.
//!
//! ## Text Runs
//!
//! Literal markup is accumulated with [`Parser::bump_text`] and flushed as a
//! single `TEXT` token the next time any other event is pushed, so adjacent
//! text, whitespace and line breaks in markup become one leaf.
//!
//! ## The Marker System
//!
//! When you call `parser.start()`, you get a [`Marker`]. It **must** be
//! completed with `marker.complete(parser, KIND)`. Dropping it without doing
//! so panics, which catches frames that forget to close their nodes.
//!
//! ```ignore
//! let m = p.start();
//! p.bump();
//! m.complete(p, SyntaxKind::CODE_EXPRESSION);
//! ```
//!
//! ## Public API
//!
//! ```
//! use tessera_syntax::{parse, FileContext};
//!
//! let parse = parse("<p>@name</p>", &FileContext::default());
//! println!("{}", parse.debug_tree());
//! ```

pub mod event;
pub mod sink;

mod grammar;

use rowan::{TextRange, TextSize};

use crate::diagnostics::{self, Diagnostic, DiagnosticKind};
use crate::directives::FileContext;
use crate::embedded::{BraceScanner, EmbeddedCodeParser};
use crate::lexer::{Token, token_at};
use crate::syntax_kind::SyntaxKind;
use crate::tree::{Parse, TagLink};
use event::Event;
use sink::Sink;

/// The parser state machine.
///
/// Holds the source, the current byte offset, and accumulated events,
/// diagnostics and tag links. Grammar functions receive `&mut Parser` and use
/// its methods to:
///
/// - Inspect input: `current()`, `at()`, `at_end()`, `byte()`, `rest()`
/// - Consume input: `bump()`, `bump_as()`, `bump_bytes()`, `bump_text()`
/// - Build structure: `start()` → `Marker` → `complete()`
pub struct Parser<'a> {
    source: &'a str,
    pos: usize,
    /// Start of the pending markup text run, if any.
    text_start: Option<usize>,
    events: Vec<Event>,
    diagnostics: Vec<Diagnostic>,
    tag_links: Vec<TagLink>,
    context: &'a FileContext,
    code: &'a dyn EmbeddedCodeParser,
}

impl<'a> Parser<'a> {
    pub fn new(
        source: &'a str,
        context: &'a FileContext,
        code: &'a dyn EmbeddedCodeParser,
    ) -> Self {
        Self {
            source,
            pos: 0,
            text_start: None,
            events: Vec::new(),
            diagnostics: Vec::new(),
            tag_links: Vec::new(),
            context,
            code,
        }
    }

    /// Parse the whole source.
    pub fn parse(mut self) -> Parse {
        grammar::root(&mut self);
        self.flush_text();

        let Parser {
            source,
            events,
            mut diagnostics,
            tag_links,
            ..
        } = self;
        diagnostics::sort(&mut diagnostics);
        log::debug!(
            "parsed {} bytes: {} events, {} diagnostics, {} tag links",
            source.len(),
            events.len(),
            diagnostics.len(),
            tag_links.len()
        );
        let tree = Sink::new(source, events).finish();
        Parse::new(tree.green().into_owned(), diagnostics, tag_links)
    }

    // === Events ===

    fn push(&mut self, event: Event) {
        self.flush_text();
        self.events.push(event);
    }

    fn flush_text(&mut self) {
        if let Some(start) = self.text_start.take() {
            self.events
                .push(Event::token(SyntaxKind::TEXT, self.pos - start));
        }
    }

    /// Start a new node and return a marker.
    pub fn start(&mut self) -> Marker {
        self.flush_text();
        let pos = self.events.len();
        self.events.push(Event::Placeholder);
        Marker {
            pos,
            completed: false,
        }
    }

    // === Inspection ===

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn context(&self) -> &'a FileContext {
        self.context
    }

    pub fn code_parser(&self) -> &'a dyn EmbeddedCodeParser {
        self.code
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn offset(&self) -> TextSize {
        TextSize::from(self.pos as u32)
    }

    /// The token starting at the current offset.
    pub fn current_token(&self) -> Token<'a> {
        token_at(self.source, self.pos)
    }

    /// Current token kind, or EOF at the end.
    pub fn current(&self) -> SyntaxKind {
        self.current_token().kind
    }

    pub fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Unconsumed source.
    pub fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    pub fn at_str(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Byte `n` positions ahead of the cursor.
    pub fn byte(&self, n: usize) -> Option<u8> {
        self.source.as_bytes().get(self.pos + n).copied()
    }

    /// Char just before the cursor.
    pub fn prev_char(&self) -> Option<char> {
        self.source[..self.pos].chars().next_back()
    }

    pub fn current_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Length of the longest prefix of the rest whose chars satisfy `pred`.
    pub fn len_while(&self, pred: impl Fn(char) -> bool) -> usize {
        self.rest()
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(self.rest().len(), |(i, _)| i)
    }

    /// Clamp a length reported from outside to the source and a char boundary.
    pub fn clamp_len(&self, len: usize) -> usize {
        let mut end = (self.pos + len).min(self.source.len());
        while !self.source.is_char_boundary(end) {
            end -= 1;
        }
        end - self.pos
    }

    // === Consumption ===

    /// Consume the current token unconditionally.
    pub fn bump(&mut self) {
        let token = self.current_token();
        if token.kind != SyntaxKind::EOF {
            self.bump_bytes(token.len(), token.kind);
        }
    }

    /// Consume the current token under a different kind.
    pub fn bump_as(&mut self, kind: SyntaxKind) {
        let len = self.current_token().len();
        if len > 0 {
            self.bump_bytes(len, kind);
        }
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume `len` bytes as one token of `kind`. Zero-length tokens are
    /// allowed.
    pub fn bump_bytes(&mut self, len: usize, kind: SyntaxKind) {
        self.push(Event::token(kind, len));
        self.pos += len;
    }

    /// Consume `len` bytes into the pending markup text run.
    pub fn bump_text(&mut self, len: usize) {
        if self.text_start.is_none() {
            self.text_start = Some(self.pos);
        }
        self.pos += len;
    }

    /// Consume the current character into the pending text run.
    pub fn bump_char_text(&mut self) {
        if let Some(c) = self.current_char() {
            self.bump_text(c.len_utf8());
        }
    }

    // === Side tables ===

    pub fn error(&mut self, kind: DiagnosticKind, range: TextRange) {
        self.diagnostics.push(Diagnostic::new(kind, range));
    }

    /// Diagnostic from `start` to the cursor.
    pub fn error_from(&mut self, kind: DiagnosticKind, start: usize) {
        let range = range(start, self.pos);
        self.error(kind, range);
    }

    pub fn extend_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn link_tags(&mut self, link: TagLink) {
        self.tag_links.push(link);
    }
}

pub(crate) fn range(start: usize, end: usize) -> TextRange {
    TextRange::new(TextSize::from(start as u32), TextSize::from(end as u32))
}

/// A marker for a node being constructed.
///
/// When you call `parser.start()`, a `Placeholder` event is pushed and you
/// get a `Marker` pointing to it. Completing it replaces the placeholder with
/// a `Start` event and pushes a `Finish`.
///
/// Frames on the grammar's explicit stack own the markers of the nodes they
/// have open, so the `Drop` check also catches a frame popped without
/// closing its nodes.
#[must_use = "Markers must be completed, dropping them is a bug"]
pub struct Marker {
    /// Position in the events vector where our Placeholder lives
    pos: usize,
    completed: bool,
}

impl Marker {
    /// Complete this marker, creating a node of the given kind.
    pub fn complete(mut self, p: &mut Parser<'_>, kind: SyntaxKind) {
        self.completed = true;
        p.flush_text();
        let event_at_pos = &mut p.events[self.pos];
        assert!(matches!(event_at_pos, Event::Placeholder));
        *event_at_pos = Event::start(kind);
        p.events.push(Event::Finish);
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        if !self.completed && !std::thread::panicking() {
            panic!("Marker must be completed");
        }
    }
}

/// Parse template source with the default [`BraceScanner`] for embedded code.
pub fn parse(source: &str, context: &FileContext) -> Parse {
    parse_with(source, context, &BraceScanner)
}

/// Parse template source, delegating embedded code to `code`.
pub fn parse_with(source: &str, context: &FileContext, code: &dyn EmbeddedCodeParser) -> Parse {
    Parser::new(source, context, code).parse()
}
