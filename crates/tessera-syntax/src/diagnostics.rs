//! Recovered diagnostics.
//!
//! Diagnostics never stop a parse. Each one names a range of the source; the
//! owning node is the narrowest node covering that range (see
//! [`Parse::enclosing_node`](crate::Parse::enclosing_node)).

use rowan::TextRange;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// What went wrong. The `Display` impl is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum DiagnosticKind {
    // Markup
    #[error("markup comment is missing its closing `-->`")]
    UnterminatedMarkupComment,
    #[error("template comment is missing its closing `*@`")]
    UnterminatedTemplateComment,
    #[error("tag `<{0}` is missing its closing `>`")]
    UnterminatedTag(String),
    #[error("attribute value is missing its closing quote")]
    UnterminatedAttributeValue,
    #[error("element `<{0}>` was not closed")]
    UnclosedElement(String),
    #[error("end tag `</{0}>` has no matching start tag")]
    UnexpectedEndTag(String),

    // Code
    #[error("explicit expression is missing its closing `)`")]
    UnterminatedExplicitExpression,
    #[error("code block is missing its closing `}}`")]
    UnterminatedCodeBlock,
    #[error("whitespace is not allowed directly after `@`")]
    WhitespaceAfterTransition,
    #[error("`@` must be followed by an expression, a block or a directive")]
    ExpectedCodeAfterTransition,
    #[error("unexpected character `{0}` after `@`")]
    UnexpectedCharacterAfterTransition(char),
    #[error("expected a `{{` block after `{0}`")]
    ExpectedBlock(String),

    // Directives
    #[error("directive `{directive}` expects {expected}")]
    DirectiveTokenExpected {
        directive: String,
        expected: &'static str,
    },
    #[error("unexpected content after directive `{0}`")]
    UnexpectedDirectiveContent(String),
    #[error("directive `{0}` expects a `{{` block")]
    DirectiveBlockExpected(String),
    #[error("block of directive `{0}` is missing its closing `}}`")]
    UnterminatedDirectiveBlock(String),

    // Embedded code
    #[error("string literal is missing its closing quote")]
    UnterminatedStringLiteral,
    #[error("character literal is missing its closing quote")]
    UnterminatedCharLiteral,
    #[error("block comment is missing its closing `*/`")]
    UnterminatedBlockComment,
    #[error("expression is missing its closing `{0}`")]
    UnbalancedExpression(char),
}

impl DiagnosticKind {
    /// Stable identifier for tooling.
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::UnterminatedMarkupComment => "TS1001",
            DiagnosticKind::UnterminatedTemplateComment => "TS1002",
            DiagnosticKind::UnterminatedTag(_) => "TS1003",
            DiagnosticKind::UnterminatedAttributeValue => "TS1004",
            DiagnosticKind::UnclosedElement(_) => "TS1005",
            DiagnosticKind::UnexpectedEndTag(_) => "TS1006",
            DiagnosticKind::UnterminatedExplicitExpression => "TS2001",
            DiagnosticKind::UnterminatedCodeBlock => "TS2002",
            DiagnosticKind::WhitespaceAfterTransition => "TS2003",
            DiagnosticKind::ExpectedCodeAfterTransition => "TS2004",
            DiagnosticKind::UnexpectedCharacterAfterTransition(_) => "TS2005",
            DiagnosticKind::ExpectedBlock(_) => "TS2006",
            DiagnosticKind::DirectiveTokenExpected { .. } => "TS3001",
            DiagnosticKind::UnexpectedDirectiveContent(_) => "TS3002",
            DiagnosticKind::DirectiveBlockExpected(_) => "TS3003",
            DiagnosticKind::UnterminatedDirectiveBlock(_) => "TS3004",
            DiagnosticKind::UnterminatedStringLiteral => "TS4001",
            DiagnosticKind::UnterminatedCharLiteral => "TS4002",
            DiagnosticKind::UnterminatedBlockComment => "TS4003",
            DiagnosticKind::UnbalancedExpression(_) => "TS4004",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticKind::UnexpectedDirectiveContent(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub range: TextRange,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, range: TextRange) -> Self {
        let severity = kind.default_severity();
        Self {
            kind,
            severity,
            range,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[{}] {:?}: {}",
            self.severity,
            self.code(),
            self.range,
            self.kind
        )
    }
}

/// Stable sort by start offset, then end offset.
pub(crate) fn sort(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by_key(|d| (d.range.start(), d.range.end()));
}
