//! Code after a transition: expressions, blocks, control statements and
//! directives.

use super::markup::{self, MarkupEnd};
use super::{Frame, Step, bump_trivia, is_ident_continue, is_ident_start, is_space, is_trivia};
use crate::diagnostics::DiagnosticKind;
use crate::directives::{Directive, DirectiveShape, DirectiveTokenKind};
use crate::embedded::{CodeMode, CodeStop, EmbeddedParse, ReentryKind, ReentryPoint};
use crate::parser::{Marker, Parser, range};
use crate::syntax_kind::SyntaxKind::*;

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "foreach", "while", "switch", "lock", "try", "do",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum CodeKind {
    /// `@{ ... }`
    Block,
    /// `@if (...) { ... }` and friends.
    Statement { after_do: bool },
    /// The `{ ... }` of a code-block directive.
    Directive(String),
}

/// An open code block or control statement.
pub(super) struct CodeFrame {
    node: Marker,
    kind: CodeKind,
    /// Offset of the transition.
    open: usize,
    brace_depth: u32,
    /// The last content was re-entered markup.
    last_markup: bool,
    unterminated: bool,
    /// The last measurement, while its reentry points are being walked.
    measured: Option<Measured>,
}

/// Code measured by the embedded parser, in absolute offsets.
struct Measured {
    end: usize,
    /// Sorted by offset, all within the measured code.
    points: Vec<ReentryPoint>,
    brace_depth: u32,
    stop: CodeStop,
}

impl CodeFrame {
    fn new(node: Marker, kind: CodeKind, open: usize) -> Self {
        Self {
            node,
            kind,
            open,
            brace_depth: 0,
            last_markup: false,
            unterminated: false,
            measured: None,
        }
    }
}

/// A markup-block directive (`@section Name { ... }`) past its `{`.
pub(super) struct SectionFrame {
    node: Marker,
    name: String,
    open: usize,
    entered: bool,
}

/// Dispatch on what follows a transition. The `TRANSITION` token has been
/// bumped. Directives are only recognised outside tags.
pub(super) fn after_transition(p: &mut Parser<'_>, in_tag: bool) -> Option<Frame> {
    let at = p.pos() - 1;
    match p.current_char() {
        None => {
            empty_expression(p);
            None
        }
        Some('(') => {
            explicit_expression(p, at);
            None
        }
        Some('{') => {
            let m = p.start();
            p.bump();
            Some(Frame::Code(CodeFrame::new(m, CodeKind::Block, at)))
        }
        Some(c) if is_ident_start(c) => keyword_or_expression(p, at, in_tag),
        Some(c) => {
            let kind = match c {
                '\r' | '\n' => DiagnosticKind::ExpectedCodeAfterTransition,
                c if c.is_whitespace() => DiagnosticKind::WhitespaceAfterTransition,
                c => DiagnosticKind::UnexpectedCharacterAfterTransition(c),
            };
            p.error(kind, range(at, at + 1));
            empty_expression(p);
            None
        }
    }
}

fn empty_expression(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump_bytes(0, CODE);
    m.complete(p, CODE_EXPRESSION);
}

/// Ask the embedded-code parser to measure from the cursor, and bump what it
/// consumed as one `CODE` token.
fn embedded(p: &mut Parser<'_>, mode: CodeMode) -> EmbeddedParse {
    let mut result = p.code_parser().parse(p.source(), p.pos(), mode);
    result.len = p.clamp_len(result.len);
    p.extend_diagnostics(std::mem::take(&mut result.diagnostics));
    result
}

/// `@( ... )`
fn explicit_expression(p: &mut Parser<'_>, at: usize) {
    let m = p.start();
    p.bump(); // (
    let result = embedded(p, CodeMode::ExplicitExpression);
    if result.len > 0 {
        p.bump_bytes(result.len, CODE);
    }
    if result.stop == CodeStop::Complete && p.at(RPAREN) {
        p.bump();
    } else {
        p.error_from(DiagnosticKind::UnterminatedExplicitExpression, at);
    }
    m.complete(p, CODE_EXPRESSION);
}

fn implicit_expression(p: &mut Parser<'_>) {
    let m = p.start();
    let result = embedded(p, CodeMode::ImplicitExpression);
    p.bump_bytes(result.len, CODE);
    m.complete(p, CODE_EXPRESSION);
}

fn keyword_or_expression(p: &mut Parser<'_>, at: usize, in_tag: bool) -> Option<Frame> {
    let rest = p.rest();
    let word = &rest[..p.len_while(is_ident_continue)];
    let using_statement = word == "using"
        && rest[word.len()..]
            .trim_start_matches([' ', '\t'])
            .starts_with('(');

    if !in_tag && !using_statement {
        if let Some(directive) = p.context().directives.get(word) {
            return directive_start(p, at, directive);
        }
    }
    if using_statement || CONTROL_KEYWORDS.contains(&word) {
        let m = p.start();
        let kind = CodeKind::Statement {
            after_do: word == "do",
        };
        return Some(Frame::Code(CodeFrame::new(m, kind, at)));
    }
    implicit_expression(p);
    None
}

// === Code frames ===

pub(super) fn step(p: &mut Parser<'_>, f: &mut CodeFrame) -> Step {
    // Markup that ran past the measured code invalidates the measurement.
    let mut measured = match f.measured.take() {
        Some(measured) if p.pos() <= measured.end => measured,
        _ => measure(p, f),
    };
    let pos = p.pos();
    measured.points.retain(|point| point.offset >= pos);
    let next = measured.points.first().copied();

    let len = next.map_or(measured.end, |point| point.offset) - pos;
    if len > 0 {
        let code = &p.rest()[..len];
        // Closing braces alone do not hide the markup before them.
        if !code.chars().all(|c| c.is_whitespace() || c == '}') {
            f.last_markup = false;
        }
        p.bump_bytes(len, CODE);
    }
    f.brace_depth = measured.brace_depth;

    if let Some(point) = next {
        measured.points.remove(0);
        f.measured = Some(measured);
        return reenter(p, f, point.kind);
    }
    match measured.stop {
        CodeStop::Reentry | CodeStop::EndOfInput => {
            f.unterminated = true;
            Step::Pop
        }
        CodeStop::Complete | CodeStop::BlockEnd => {
            if !matches!(f.kind, CodeKind::Statement { .. }) && !p.eat(RBRACE) {
                f.unterminated = true;
            }
            Step::Pop
        }
    }
}

/// Run the embedded parser from the cursor. Reentry points outside the
/// measured code, or not on a char boundary, are dropped.
fn measure(p: &mut Parser<'_>, f: &CodeFrame) -> Measured {
    let mode = match f.kind {
        CodeKind::Statement { after_do } => CodeMode::Statement {
            brace_depth: f.brace_depth,
            after_do,
        },
        _ => CodeMode::Block {
            brace_depth: f.brace_depth,
        },
    };
    let result = embedded(p, mode);
    let source = p.source();
    let start = p.pos();
    let end = start + result.len;
    let mut points: Vec<ReentryPoint> = result
        .reentry_points
        .into_iter()
        .filter(|point| {
            let valid =
                (start..=end).contains(&point.offset) && source.is_char_boundary(point.offset);
            if !valid {
                log::warn!(
                    "ignoring reentry point at {} outside code {start}..{end}",
                    point.offset
                );
            }
            valid
        })
        .collect();
    points.sort_by_key(|point| point.offset);
    Measured {
        end,
        points,
        brace_depth: result.brace_depth,
        stop: result.stop,
    }
}

/// Hand a re-entry point to the markup parser.
fn reenter(p: &mut Parser<'_>, f: &mut CodeFrame, kind: ReentryKind) -> Step {
    let open = p.pos();
    match kind {
        ReentryKind::Comment if p.at_str("@*") => {
            markup::template_comment(p);
            Step::Continue
        }
        ReentryKind::LineMarkup if p.at_str("@:") => {
            f.last_markup = true;
            let m = p.start();
            p.bump_bytes(1, TRANSITION);
            p.bump_bytes(1, COLON);
            Step::Push(markup::reentry_frame(MarkupEnd::Line, m, open))
        }
        ReentryKind::TextTag if p.at_str("<text>") => {
            f.last_markup = true;
            let m = p.start();
            p.bump_bytes("<text>".len(), MARKUP_TRANSITION);
            Step::Push(markup::reentry_frame(MarkupEnd::TextTag, m, open))
        }
        _ => {
            f.last_markup = true;
            let m = p.start();
            Step::Push(markup::reentry_frame(MarkupEnd::Element, m, open))
        }
    }
}

pub(super) fn close(p: &mut Parser<'_>, f: CodeFrame) {
    match f.kind {
        CodeKind::Directive(name) => {
            if f.unterminated {
                p.error_from(DiagnosticKind::UnterminatedDirectiveBlock(name), f.open);
            }
            f.node.complete(p, DIRECTIVE);
        }
        _ => {
            if f.unterminated {
                p.error_from(DiagnosticKind::UnterminatedCodeBlock, f.open);
            } else if f.last_markup {
                keep_trailing_newline(p);
            }
            f.node.complete(p, CODE_STATEMENT_BLOCK);
        }
    }
}

/// A block whose last content was markup keeps the rest of its closing line.
fn keep_trailing_newline(p: &mut Parser<'_>) {
    let ws = p.len_while(is_space);
    let newline = match (p.byte(ws), p.byte(ws + 1)) {
        (Some(b'\r'), Some(b'\n')) => 2,
        (Some(b'\r' | b'\n'), _) => 1,
        _ => 0,
    };
    if newline > 0 {
        if ws > 0 {
            p.bump_bytes(ws, WHITESPACE);
        }
        p.bump_bytes(newline, NEWLINE);
    }
}

// === Directives ===

fn directive_start(p: &mut Parser<'_>, at: usize, directive: &Directive) -> Option<Frame> {
    let m = p.start();
    let keyword = directive.keyword.as_str();
    p.bump_bytes(keyword.len(), DIRECTIVE_KEYWORD);
    let tokens_ok = directive_tokens(p, at, directive);

    if directive.shape == DirectiveShape::SingleLine {
        line_end(p, keyword, tokens_ok);
        m.complete(p, DIRECTIVE);
        return None;
    }

    let ws = p.len_while(is_trivia);
    if p.byte(ws) != Some(b'{') {
        p.error(
            DiagnosticKind::DirectiveBlockExpected(keyword.to_string()),
            range(at, p.pos()),
        );
        m.complete(p, DIRECTIVE);
        return None;
    }
    bump_trivia(p, ws);
    p.bump(); // {
    let name = keyword.to_string();
    match directive.shape {
        DirectiveShape::CodeBlock => Some(Frame::Code(CodeFrame::new(
            m,
            CodeKind::Directive(name),
            at,
        ))),
        _ => Some(Frame::Section(SectionFrame {
            node: m,
            name,
            open: at,
            entered: false,
        })),
    }
}

/// The directive's arguments. Returns false if a required one is missing.
fn directive_tokens(p: &mut Parser<'_>, at: usize, directive: &Directive) -> bool {
    for token in &directive.tokens {
        let ws = p.len_while(is_space);
        match directive_token_len(&p.rest()[ws..], token.kind) {
            Some(len) => {
                if ws > 0 {
                    p.bump_bytes(ws, WHITESPACE);
                }
                p.bump_bytes(len, DIRECTIVE_TOKEN);
            }
            None if token.optional => break,
            None => {
                p.error(
                    DiagnosticKind::DirectiveTokenExpected {
                        directive: directive.keyword.clone(),
                        expected: token.kind.describe(),
                    },
                    range(at, p.pos()),
                );
                return false;
            }
        }
    }
    true
}

/// Rest of a single-line directive's line, line break included.
fn line_end(p: &mut Parser<'_>, keyword: &str, warn: bool) {
    let line = p.rest().split(['\r', '\n']).next().unwrap_or("");
    let content = line.trim_end_matches([' ', '\t']);
    let ws = content.len() - content.trim_start_matches([' ', '\t']).len();
    if ws > 0 {
        p.bump_bytes(ws, WHITESPACE);
    }
    if content.len() > ws {
        let start = p.pos();
        p.bump_bytes(content.len() - ws, TEXT);
        if warn {
            p.error_from(
                DiagnosticKind::UnexpectedDirectiveContent(keyword.to_string()),
                start,
            );
        }
    }
    if line.len() > content.len() {
        p.bump_bytes(line.len() - content.len(), WHITESPACE);
    }
    p.eat(NEWLINE);
}

/// Length of a directive argument of `kind` at the start of `text`.
fn directive_token_len(text: &str, kind: DirectiveTokenKind) -> Option<usize> {
    let line = text.split(['\r', '\n']).next().unwrap_or("");
    let ident = |s: &str| -> usize {
        match s.chars().next() {
            Some(c) if is_ident_start(c) => s
                .char_indices()
                .find(|&(_, c)| !is_ident_continue(c))
                .map_or(s.len(), |(i, _)| i),
            _ => 0,
        }
    };
    let len = match kind {
        DirectiveTokenKind::Member => ident(line),
        DirectiveTokenKind::Namespace => {
            let mut len = ident(line);
            while len > 0 && line[len..].starts_with('.') {
                let next = ident(&line[len + 1..]);
                if next == 0 {
                    break;
                }
                len += 1 + next;
            }
            len
        }
        DirectiveTokenKind::Type => type_len(line),
        DirectiveTokenKind::String => {
            if line.starts_with('"') {
                line[1..].find('"').map_or(0, |i| i + 2)
            } else {
                0
            }
        }
        DirectiveTokenKind::Attribute => bracketed_len(line),
        DirectiveTokenKind::Boolean => ["true", "false"]
            .into_iter()
            .find(|b| line.starts_with(b) && ident(line) == b.len())
            .map_or(0, str::len),
        DirectiveTokenKind::LineText => line.trim_end_matches([' ', '\t']).len(),
    };
    (len > 0).then_some(len)
}

/// `Foo.Bar<Baz, (int, string)>[]?`
fn type_len(line: &str) -> usize {
    match line.chars().next() {
        Some(c) if is_ident_start(c) || c == '(' => {}
        _ => return 0,
    }
    let mut depth = 0u32;
    for (i, c) in line.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => {
                if depth == 0 {
                    return i;
                }
                depth -= 1;
            }
            c if depth == 0 && (c.is_whitespace() || matches!(c, '{' | ';' | ',')) => {
                return i;
            }
            _ => {}
        }
    }
    if depth == 0 { line.len() } else { 0 }
}

/// `[...]` with nested brackets.
fn bracketed_len(line: &str) -> usize {
    if !line.starts_with('[') {
        return 0;
    }
    let mut depth = 0u32;
    for (i, c) in line.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
    }
    0
}

// === Section bodies ===

pub(super) fn section_step(p: &mut Parser<'_>, f: &mut SectionFrame) -> Step {
    if f.entered {
        return Step::Pop;
    }
    f.entered = true;
    let m = p.start();
    Step::Push(markup::reentry_frame(MarkupEnd::Section, m, p.pos()))
}

pub(super) fn close_section(p: &mut Parser<'_>, f: SectionFrame) {
    if !p.eat(RBRACE) {
        p.error_from(DiagnosticKind::UnterminatedDirectiveBlock(f.name), f.open);
    }
    f.node.complete(p, DIRECTIVE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Foo.Bar rest", DirectiveTokenKind::Type, Some(7))]
    #[case("List<Dictionary<int, string>> x", DirectiveTokenKind::Type, Some(29))]
    #[case("(int, string) x", DirectiveTokenKind::Type, Some(13))]
    #[case("Foo<Bar\n", DirectiveTokenKind::Type, None)]
    #[case("1Foo", DirectiveTokenKind::Type, None)]
    #[case("Scripts {", DirectiveTokenKind::Member, Some(7))]
    #[case("My.App.Pages\n", DirectiveTokenKind::Namespace, Some(12))]
    #[case("My.App.\n", DirectiveTokenKind::Namespace, Some(6))]
    #[case("\"/counter\" x", DirectiveTokenKind::String, Some(10))]
    #[case("\"open", DirectiveTokenKind::String, None)]
    #[case("[Authorize(Roles = \"a[]\")]", DirectiveTokenKind::Attribute, Some(26))]
    #[case("true", DirectiveTokenKind::Boolean, Some(4))]
    #[case("trueish", DirectiveTokenKind::Boolean, None)]
    #[case("*, MyTagHelpers  \r\n", DirectiveTokenKind::LineText, Some(15))]
    #[case("\n", DirectiveTokenKind::LineText, None)]
    fn directive_token_lengths(
        #[case] text: &str,
        #[case] kind: DirectiveTokenKind,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(directive_token_len(text, kind), expected);
    }
}
