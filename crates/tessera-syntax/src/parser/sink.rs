//! Sink for converting parser events into a Rowan green tree.

use rowan::GreenNodeBuilder;

use crate::parser::event::Event;
use crate::syntax_kind::{SyntaxKind, SyntaxNode};

/// Converts parser events into a Rowan syntax tree, taking token text from
/// the source.
pub struct Sink<'input> {
    builder: GreenNodeBuilder<'static>,
    source: &'input str,
    cursor: usize,
    events: Vec<Event>,
}

impl<'input> Sink<'input> {
    pub fn new(source: &'input str, events: Vec<Event>) -> Self {
        Self {
            builder: GreenNodeBuilder::new(),
            source,
            cursor: 0,
            events,
        }
    }

    /// Consume the sink and build the syntax tree.
    pub fn finish(mut self) -> SyntaxNode {
        for event in std::mem::take(&mut self.events) {
            match event {
                Event::Start { kind } => self.builder.start_node(kind.into()),
                Event::Token { kind, len } => self.token(kind, len as usize),
                Event::Finish => self.builder.finish_node(),
                Event::Placeholder => {}
            }
        }
        debug_assert_eq!(self.cursor, self.source.len(), "source not fully consumed");
        SyntaxNode::new_root(self.builder.finish())
    }

    fn token(&mut self, kind: SyntaxKind, len: usize) {
        let start = self.cursor;
        self.cursor += len;
        self.builder
            .token(kind.into(), &self.source[start..self.cursor]);
    }
}
