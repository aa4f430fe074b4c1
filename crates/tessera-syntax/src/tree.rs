//! The result of a parse: an immutable tree plus side tables.
//!
//! Diagnostics and tag links are not stored in the tree. They are side tables
//! keyed by [`TextRange`], sorted by position, and mapped back to nodes on
//! request.

use std::fmt::Write;

use rowan::{GreenNode, NodeOrToken, TextRange, WalkEvent};

use crate::diagnostics::Diagnostic;
use crate::syntax_kind::{SyntaxKind, SyntaxNode, SyntaxToken};

/// A non-owning pairing of a start tag with its end tag.
///
/// Either side may be missing: an element closed implicitly has no `close`,
/// a stray end tag has no `open`. The ranges are those of the `TAG_OPEN` and
/// `TAG_CLOSE` nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagLink {
    pub name: String,
    pub open: Option<TextRange>,
    pub close: Option<TextRange>,
}

/// A parsed document.
///
/// Holds the green tree, so it is `Send + Sync` and cheap to clone; call
/// [`syntax`](Self::syntax) for a navigable root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    green: GreenNode,
    diagnostics: Vec<Diagnostic>,
    tag_links: Vec<TagLink>,
}

impl Parse {
    pub(crate) fn new(green: GreenNode, diagnostics: Vec<Diagnostic>, tag_links: Vec<TagLink>) -> Self {
        Self {
            green,
            diagnostics,
            tag_links,
        }
    }

    /// The `DOCUMENT` node.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Diagnostics ordered by start, then end offset.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == crate::diagnostics::Severity::Error)
    }

    /// Tag pairings in the order they were resolved.
    pub fn tag_links(&self) -> &[TagLink] {
        &self.tag_links
    }

    /// The `TAG_CLOSE` matching a `TAG_OPEN`, or the other way round.
    pub fn partner(&self, tag: &SyntaxNode) -> Option<SyntaxNode> {
        let range = tag.text_range();
        let (other, kind) = match tag.kind() {
            SyntaxKind::TAG_OPEN => (
                self.tag_links
                    .iter()
                    .find(|link| link.open == Some(range))?
                    .close?,
                SyntaxKind::TAG_CLOSE,
            ),
            SyntaxKind::TAG_CLOSE => (
                self.tag_links
                    .iter()
                    .find(|link| link.close == Some(range))?
                    .open?,
                SyntaxKind::TAG_OPEN,
            ),
            _ => return None,
        };
        self.node_at(other, kind)
    }

    /// The narrowest node covering the diagnostic's range.
    pub fn enclosing_node(&self, diagnostic: &Diagnostic) -> SyntaxNode {
        let root = self.syntax();
        if !root.text_range().contains_range(diagnostic.range) {
            return root;
        }
        match root.covering_element(diagnostic.range) {
            NodeOrToken::Node(node) => node,
            NodeOrToken::Token(token) => token.parent().unwrap_or(root),
        }
    }

    /// Every token in document order.
    pub fn leaves(&self) -> Vec<SyntaxToken> {
        self.syntax()
            .descendants_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .collect()
    }

    /// The source with escape markers (the first `@` of `@@`) removed.
    pub fn literal_text(&self) -> String {
        self.leaves()
            .iter()
            .filter(|token| token.kind() != SyntaxKind::TRANSITION_ESCAPE)
            .map(|token| token.text())
            .collect()
    }

    /// Indented dump of the tree, one element per line.
    ///
    /// ```text
    /// DOCUMENT@0..5
    ///   TRANSITION@0..1 "@"
    ///   CODE_EXPRESSION@1..5
    ///     CODE@1..5 "name"
    /// ```
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        let mut depth = 0usize;
        for event in self.syntax().preorder_with_tokens() {
            match event {
                WalkEvent::Enter(NodeOrToken::Node(node)) => {
                    let _ = writeln!(
                        out,
                        "{}{:?}@{:?}",
                        "  ".repeat(depth),
                        node.kind(),
                        node.text_range()
                    );
                    depth += 1;
                }
                WalkEvent::Enter(NodeOrToken::Token(token)) => {
                    let _ = writeln!(
                        out,
                        "{}{:?}@{:?} {:?}",
                        "  ".repeat(depth),
                        token.kind(),
                        token.text_range(),
                        token.text()
                    );
                }
                WalkEvent::Leave(NodeOrToken::Node(_)) => depth -= 1,
                WalkEvent::Leave(NodeOrToken::Token(_)) => {}
            }
        }
        out
    }

    fn node_at(&self, range: TextRange, kind: SyntaxKind) -> Option<SyntaxNode> {
        let root = self.syntax();
        if !root.text_range().contains_range(range) {
            return None;
        }
        let node = match root.covering_element(range) {
            NodeOrToken::Node(node) => node,
            NodeOrToken::Token(token) => token.parent()?,
        };
        node.ancestors()
            .find(|n| n.kind() == kind && n.text_range() == range)
    }
}
