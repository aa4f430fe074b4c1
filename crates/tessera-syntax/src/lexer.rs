//! # Lexer - Tokenizing Template Source
//!
//! This module provides the raw lexical layer: breaking source text into
//! tokens using the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! **Every byte in the input appears in exactly one token.** We never skip or
//! discard characters, and no byte sequence makes the lexer fail:
//!
//! ```
//! use tessera_syntax::lexer::lex;
//!
//! let input = "<p>Hello, @name!</p>\n";
//! let tokens = lex(input);
//!
//! // Concatenating all token texts gives back the original
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Restartable
//!
//! The parser never lexes the whole document up front. Embedded code is
//! measured by the embedded-language parser in bytes, and those byte counts do
//! not have to line up with token boundaries. Instead the parser asks for a
//! fresh token sequence at whatever offset it has reached with
//! [`tokens_at`]. The lexer keeps no state besides the source slice, so a
//! restart at any char boundary is always valid.
//!
//! ## Token Design
//!
//! Tokens are **context-free**. The lexer does not know whether `<` opens a tag
//! or is a comparison, or whether `@` is a transition or part of an email
//! address. That is the parser's job.
//!
//! Everything that is not one of the structural characters becomes `TEXT`,
//! grouped into runs. `*` and `-` are single-character `TEXT` tokens so that
//! `*@` and `-->` are always recognised, even glued to a word.

use std::ops::Range;

use logos::Logos;

use crate::syntax_kind::SyntaxKind;

/// Token kinds produced by the Logos lexer.
///
/// This enum exists separately from [`SyntaxKind`] because Logos needs to
/// derive on it. Each variant maps to a corresponding `SyntaxKind` token.
///
/// [`SyntaxKind`]: crate::syntax_kind::SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Horizontal whitespace (spaces, tabs)
    #[regex(r"[ \t]+")]
    Whitespace,

    /// Line ending (LF, CRLF or a lone CR)
    #[regex(r"\r\n|\n|\r")]
    Newline,

    /// `@*`
    #[token("@*")]
    TemplateCommentStart,

    /// `*@`
    #[token("*@")]
    TemplateCommentEnd,

    /// `@`
    #[token("@")]
    Transition,

    /// `<!--`
    #[token("<!--")]
    MarkupCommentStart,

    /// `-->`
    #[token("-->")]
    MarkupCommentEnd,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("/")]
    Slash,

    #[token("=")]
    Eq,

    #[token("\"")]
    DQuote,

    #[token("'")]
    SQuote,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    /// A lone `*` or `-`
    #[regex(r"[*-]")]
    Punct,

    /// Plain text - anything not matched by other rules
    #[regex(r#"[^ \t\r\n@<>/="'{}()*-]+"#)]
    Text,
}

impl TokenKind {
    /// Convert to SyntaxKind.
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            TokenKind::Whitespace => SyntaxKind::WHITESPACE,
            TokenKind::Newline => SyntaxKind::NEWLINE,
            TokenKind::TemplateCommentStart => SyntaxKind::TEMPLATE_COMMENT_START,
            TokenKind::TemplateCommentEnd => SyntaxKind::TEMPLATE_COMMENT_END,
            TokenKind::Transition => SyntaxKind::TRANSITION,
            TokenKind::MarkupCommentStart => SyntaxKind::MARKUP_COMMENT_START,
            TokenKind::MarkupCommentEnd => SyntaxKind::MARKUP_COMMENT_END,
            TokenKind::Lt => SyntaxKind::LT,
            TokenKind::Gt => SyntaxKind::GT,
            TokenKind::Slash => SyntaxKind::SLASH,
            TokenKind::Eq => SyntaxKind::EQ,
            TokenKind::DQuote => SyntaxKind::DQUOTE,
            TokenKind::SQuote => SyntaxKind::SQUOTE,
            TokenKind::LBrace => SyntaxKind::LBRACE,
            TokenKind::RBrace => SyntaxKind::RBRACE,
            TokenKind::LParen => SyntaxKind::LPAREN,
            TokenKind::RParen => SyntaxKind::RPAREN,
            TokenKind::Punct | TokenKind::Text => SyntaxKind::TEXT,
        }
    }
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
}

impl Token<'_> {
    /// Length of the token in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Lazy token sequence starting at an arbitrary offset.
///
/// Spans are absolute offsets into the original source. The sequence ends
/// with exactly one zero-length `EOF` token.
pub struct Tokens<'a> {
    source: &'a str,
    base: usize,
    inner: logos::Lexer<'a, TokenKind>,
    finished: bool,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = (Token<'a>, Range<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.inner.next() {
            Some(result) => {
                let span = self.inner.span();
                let kind = match result {
                    Ok(token_kind) => token_kind.to_syntax_kind(),
                    // Logos error means unrecognized character - treat as TEXT
                    Err(()) => SyntaxKind::TEXT,
                };
                let text = self.inner.slice();
                Some((
                    Token { kind, text },
                    self.base + span.start..self.base + span.end,
                ))
            }
            None => {
                self.finished = true;
                let end = self.source.len();
                Some((
                    Token {
                        kind: SyntaxKind::EOF,
                        text: "",
                    },
                    end..end,
                ))
            }
        }
    }
}

/// Start a token sequence at `offset`.
///
/// Offsets past the end, or inside a multi-byte character, are moved forward
/// to the next char boundary.
pub fn tokens_at(source: &str, offset: usize) -> Tokens<'_> {
    let mut base = offset.min(source.len());
    while !source.is_char_boundary(base) {
        base += 1;
    }
    Tokens {
        source,
        base,
        inner: TokenKind::lexer(&source[base..]),
        finished: false,
    }
}

/// The single token starting at `offset` (`EOF` at the end of input).
pub fn token_at(source: &str, offset: usize) -> Token<'_> {
    tokens_at(source, offset)
        .next()
        .map(|(token, _)| token)
        .unwrap_or(Token {
            kind: SyntaxKind::EOF,
            text: "",
        })
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
/// The trailing `EOF` marker is not included.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    lex_with_spans(input)
        .into_iter()
        .map(|(token, _)| token)
        .collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str) -> Vec<(Token<'_>, Range<usize>)> {
    tokens_at(input, 0)
        .filter(|(token, _)| token.kind != SyntaxKind::EOF)
        .collect()
}
