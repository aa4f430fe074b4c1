//! Markup content: text, elements, tags, attributes and comments.

use rowan::TextRange;

use super::{Frame, Step, bump_trivia, code, is_ident_start, is_trivia};
use crate::diagnostics::DiagnosticKind;
use crate::parser::{Marker, Parser, range};
use crate::syntax_kind::SyntaxKind::{self, *};
use crate::tree::TagLink;

/// HTML elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const TEXT_TAG_OPEN: &str = "<text>";
const TEXT_TAG_CLOSE: &str = "</text>";

/// What ends a markup frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MarkupEnd {
    /// End of input.
    Document,
    /// The close of the first element, re-entered from code.
    Element,
    /// `</text>`.
    TextTag,
    /// The next line break, which is included (`@:`).
    Line,
    /// An unbalanced `}` (body of a markup-block directive).
    Section,
}

/// Open element on the tag context stack.
struct OpenElement {
    name: String,
    marker: Marker,
    /// Range of the start tag.
    open: TextRange,
}

/// A start tag whose `>` has not been seen yet.
struct OpenTag {
    name: String,
    start: usize,
    element: Marker,
    tag: Marker,
    value: Option<OpenValue>,
}

/// An attribute value being scanned. `quote` is `None` for unquoted values.
struct OpenValue {
    attribute: Marker,
    marker: Marker,
    quote: Option<u8>,
    start: usize,
}

impl OpenValue {
    fn close(self, p: &mut Parser<'_>) {
        self.marker.complete(p, ATTRIBUTE_VALUE);
        self.attribute.complete(p, ATTRIBUTE);
    }
}

pub(super) struct MarkupFrame {
    end: MarkupEnd,
    /// The `MARKUP_BLOCK` wrapping re-entered markup.
    node: Option<Marker>,
    open: usize,
    elements: Vec<OpenElement>,
    tag: Option<OpenTag>,
    /// Unmatched `{` seen in section text.
    brace_depth: u32,
    /// Nested `<text>` tags inside a text-tag frame.
    text_depth: u32,
    /// Something tag-like has been parsed (element frames end after one).
    started: bool,
    /// The frame's own terminator was consumed.
    closed: bool,
}

impl MarkupFrame {
    pub(super) fn document() -> Self {
        Self::new(MarkupEnd::Document, None, 0)
    }

    pub(super) fn new(end: MarkupEnd, node: Option<Marker>, open: usize) -> Self {
        Self {
            end,
            node,
            open,
            elements: Vec::new(),
            tag: None,
            brace_depth: 0,
            text_depth: 0,
            started: false,
            closed: false,
        }
    }
}

pub(super) fn step(p: &mut Parser<'_>, f: &mut MarkupFrame) -> Step {
    if let Some(tag) = f.tag.take() {
        return tag_step(p, f, tag);
    }
    if f.end == MarkupEnd::Element {
        if f.started && f.elements.is_empty() {
            return Step::Pop;
        }
        if !f.started && !p.at(LT) && !p.at(MARKUP_COMMENT_START) {
            return Step::Pop;
        }
    }
    content_step(p, f)
}

fn content_step(p: &mut Parser<'_>, f: &mut MarkupFrame) -> Step {
    let token = p.current_token();
    match token.kind {
        EOF => return Step::Pop,
        NEWLINE => {
            p.bump_text(token.len());
            if f.end == MarkupEnd::Line {
                f.closed = true;
                return Step::Pop;
            }
        }
        LBRACE => {
            if f.end == MarkupEnd::Section {
                f.brace_depth += 1;
            }
            p.bump_text(1);
        }
        RBRACE => {
            if f.end == MarkupEnd::Section {
                if f.brace_depth == 0 {
                    f.closed = true;
                    return Step::Pop;
                }
                f.brace_depth -= 1;
            }
            p.bump_text(1);
        }
        TEMPLATE_COMMENT_START => template_comment(p),
        // Only the `*`; the `@` may start something.
        TEMPLATE_COMMENT_END => p.bump_text(1),
        MARKUP_COMMENT_START => {
            f.started = true;
            markup_comment(p);
        }
        TRANSITION => {
            if escape_or_literal(p) {
                return Step::Continue;
            }
            p.bump();
            if let Some(frame) = code::after_transition(p, false) {
                return Step::Push(frame);
            }
        }
        LT => return angle(p, f),
        _ => p.bump_text(token.len()),
    }
    Step::Continue
}

/// Handle `@@` and `name@host` at the cursor. Returns false if the `@` is a
/// transition.
fn escape_or_literal(p: &mut Parser<'_>) -> bool {
    if p.byte(1) == Some(b'@') {
        p.bump_bytes(1, TRANSITION_ESCAPE);
        p.bump_text(1);
        return true;
    }
    let alnum = |c: Option<char>| c.is_some_and(char::is_alphanumeric);
    if alnum(p.prev_char()) && alnum(p.rest()[1..].chars().next()) {
        p.bump_text(1);
        return true;
    }
    false
}

fn angle(p: &mut Parser<'_>, f: &mut MarkupFrame) -> Step {
    if p.at_str(TEXT_TAG_OPEN) {
        if f.end == MarkupEnd::TextTag {
            f.text_depth += 1;
        }
        p.bump_bytes(TEXT_TAG_OPEN.len(), MARKUP_TRANSITION);
        return Step::Continue;
    }
    if p.at_str(TEXT_TAG_CLOSE) {
        p.bump_bytes(TEXT_TAG_CLOSE.len(), MARKUP_TRANSITION);
        if f.end == MarkupEnd::TextTag {
            if f.text_depth == 0 {
                f.closed = true;
                return Step::Pop;
            }
            f.text_depth -= 1;
        }
        return Step::Continue;
    }
    match (p.byte(1), p.byte(2)) {
        (Some(b'/'), Some(c)) if c.is_ascii_alphabetic() => {
            f.started = true;
            end_tag(p, f);
        }
        (Some(c), _) if c.is_ascii_alphabetic() => {
            f.started = true;
            start_tag(p, f);
        }
        (Some(b'!' | b'?'), _) => {
            f.started = true;
            declaration(p);
        }
        _ => p.bump_text(1),
    }
    Step::Continue
}

fn is_tag_name_char(c: char) -> bool {
    !(is_trivia(c) || matches!(c, '/' | '>' | '<' | '"' | '\'' | '=' | '@'))
}

fn is_attr_name_char(c: char) -> bool {
    !(is_trivia(c) || matches!(c, '/' | '>' | '<' | '"' | '\'' | '='))
}

// === Start tags ===

fn start_tag(p: &mut Parser<'_>, f: &mut MarkupFrame) {
    let start = p.pos();
    let element = p.start();
    let tag = p.start();
    p.bump(); // <
    let len = p.len_while(is_tag_name_char);
    let name = p.rest()[..len].to_string();
    p.bump_bytes(len, TAG_NAME);
    f.tag = Some(OpenTag {
        name,
        start,
        element,
        tag,
        value: None,
    });
}

fn tag_step(p: &mut Parser<'_>, f: &mut MarkupFrame, mut tag: OpenTag) -> Step {
    if let Some(value) = tag.value.take() {
        let (step, value) = attribute_value(p, value);
        tag.value = value;
        f.tag = Some(tag);
        return step;
    }

    let step = match p.current() {
        WHITESPACE | NEWLINE => {
            p.bump();
            Step::Continue
        }
        GT => {
            p.bump();
            finish_start_tag(p, f, tag, true);
            return Step::Continue;
        }
        SLASH if p.byte(1) == Some(b'>') => {
            p.bump();
            p.bump();
            tag.tag.complete(p, TAG_OPEN);
            tag.element.complete(p, ELEMENT);
            return Step::Continue;
        }
        // Stray punctuation between attributes.
        SLASH | EQ | DQUOTE | SQUOTE => {
            p.bump();
            Step::Continue
        }
        LT | MARKUP_COMMENT_START | EOF => {
            p.error_from(DiagnosticKind::UnterminatedTag(tag.name.clone()), tag.start);
            finish_start_tag(p, f, tag, false);
            return Step::Continue;
        }
        TEMPLATE_COMMENT_START => {
            template_comment(p);
            Step::Continue
        }
        TRANSITION => tag_transition(p, &mut tag),
        _ => {
            attribute(p, &mut tag);
            Step::Continue
        }
    };
    f.tag = Some(tag);
    step
}

/// `@` where an attribute name could start.
fn tag_transition(p: &mut Parser<'_>, tag: &mut OpenTag) -> Step {
    if p.byte(1) == Some(b'@') {
        p.bump_bytes(1, TRANSITION_ESCAPE);
        p.bump_bytes(1, TEXT);
        return Step::Continue;
    }
    let next = p.rest()[1..].chars().next();
    let ident = next.is_some_and(is_ident_start);
    if ident && p.context().kind == crate::directives::FileKind::Component {
        // Directive attribute such as `@bind-Value` or `@onclick`.
        attribute(p, tag);
        return Step::Continue;
    }
    if ident || matches!(next, Some('(' | '{')) {
        p.bump();
        return match code::after_transition(p, true) {
            Some(frame) => Step::Push(frame),
            None => Step::Continue,
        };
    }
    attribute(p, tag);
    Step::Continue
}

/// Attribute name, `=`, and the start of the value.
fn attribute(p: &mut Parser<'_>, tag: &mut OpenTag) {
    let attribute = p.start();
    let len = p.len_while(is_attr_name_char);
    p.bump_bytes(len, ATTR_NAME);

    let ws = p.len_while(is_trivia);
    if p.byte(ws) != Some(b'=') {
        attribute.complete(p, ATTRIBUTE);
        return;
    }
    bump_trivia(p, ws);
    p.bump(); // =

    let ws = p.len_while(is_trivia);
    let quote = match p.byte(ws) {
        None | Some(b'>') => {
            attribute.complete(p, ATTRIBUTE);
            return;
        }
        Some(q @ (b'"' | b'\'')) => Some(q),
        Some(_) => None,
    };
    bump_trivia(p, ws);
    let start = p.pos();
    let marker = p.start();
    if quote.is_some() {
        p.bump();
    }
    tag.value = Some(OpenValue {
        attribute,
        marker,
        quote,
        start,
    });
}

/// Scan an attribute value. Returns the value if it is still open.
fn attribute_value(p: &mut Parser<'_>, value: OpenValue) -> (Step, Option<OpenValue>) {
    let Some(c) = p.current_char() else {
        if value.quote.is_some() {
            p.error_from(DiagnosticKind::UnterminatedAttributeValue, value.start);
        }
        value.close(p);
        return (Step::Continue, None);
    };

    match value.quote {
        Some(q) if c == q as char => {
            p.bump();
            value.close(p);
            return (Step::Continue, None);
        }
        None if is_trivia(c) || c == '>' => {
            value.close(p);
            return (Step::Continue, None);
        }
        _ => {}
    }

    if c == '@' {
        let step = value_transition(p);
        return (step, Some(value));
    }

    let len = p.len_while(|c| match value.quote {
        Some(q) => c != q as char && c != '@',
        None => !(is_trivia(c) || c == '>' || c == '@'),
    });
    p.bump_text(len);
    (Step::Continue, Some(value))
}

/// `@` inside an attribute value. It only switches to code when followed by
/// something that can start code; otherwise it is literal.
fn value_transition(p: &mut Parser<'_>) -> Step {
    if escape_or_literal(p) {
        return Step::Continue;
    }
    match p.rest()[1..].chars().next() {
        Some('*') => {
            template_comment(p);
            Step::Continue
        }
        Some(c) if is_ident_start(c) || c == '(' || c == '{' => {
            p.bump();
            match code::after_transition(p, true) {
                Some(frame) => Step::Push(frame),
                None => Step::Continue,
            }
        }
        _ => {
            p.bump_text(1);
            Step::Continue
        }
    }
}

/// Complete a start tag and open its element. `terminated` is false when the
/// tag ran into the next tag or the end of input.
fn finish_start_tag(p: &mut Parser<'_>, f: &mut MarkupFrame, tag: OpenTag, terminated: bool) {
    let OpenTag {
        name,
        start,
        element,
        tag,
        value,
    } = tag;
    if let Some(value) = value {
        value.close(p);
    }
    tag.complete(p, TAG_OPEN);
    if VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(&name)) {
        element.complete(p, ELEMENT);
        return;
    }
    let open = range(start, p.pos());
    if terminated && p.context().is_raw_text_element(&name) {
        raw_text(p, &name);
    }
    f.elements.push(OpenElement {
        name,
        marker: element,
        open,
    });
}

/// Body of a raw-text element, up to the case-insensitive `</name`.
fn raw_text(p: &mut Parser<'_>, name: &str) {
    let needle = format!("</{name}");
    let rest = p.rest().as_bytes();
    let len = rest
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
        .unwrap_or(rest.len());
    if len > 0 {
        p.bump_bytes(len, TEXT);
    }
}

// === End tags ===

fn end_tag(p: &mut Parser<'_>, f: &mut MarkupFrame) {
    let name: String = p.rest()[2..]
        .chars()
        .take_while(|&c| is_tag_name_char(c))
        .collect();

    let matched = f
        .elements
        .iter()
        .rposition(|e| e.name.eq_ignore_ascii_case(&name));
    let Some(index) = matched else {
        let close = end_tag_node(p, &name);
        if f.end == MarkupEnd::Element && f.elements.is_empty() {
            p.error(DiagnosticKind::UnexpectedEndTag(name.clone()), close);
        }
        p.link_tags(TagLink {
            name,
            open: None,
            close: Some(close),
        });
        return;
    };

    while f.elements.len() > index + 1 {
        if let Some(inner) = f.elements.pop() {
            close_implicitly(p, inner);
        }
    }
    if let Some(element) = f.elements.pop() {
        let close = end_tag_node(p, &name);
        element.marker.complete(p, ELEMENT);
        p.link_tags(TagLink {
            name: element.name,
            open: Some(element.open),
            close: Some(close),
        });
    }
}

fn end_tag_node(p: &mut Parser<'_>, name: &str) -> TextRange {
    let start = p.pos();
    let m = p.start();
    p.bump(); // <
    p.bump(); // /
    p.bump_bytes(name.len(), TAG_NAME);
    loop {
        match p.current() {
            GT => {
                p.bump();
                break;
            }
            WHITESPACE | NEWLINE => p.bump(),
            LT | MARKUP_COMMENT_START | EOF => {
                p.error_from(DiagnosticKind::UnterminatedTag(format!("/{name}")), start);
                break;
            }
            _ => p.bump_as(TEXT),
        }
    }
    m.complete(p, TAG_CLOSE);
    range(start, p.pos())
}

fn close_implicitly(p: &mut Parser<'_>, element: OpenElement) {
    element.marker.complete(p, ELEMENT);
    p.link_tags(TagLink {
        name: element.name,
        open: Some(element.open),
        close: None,
    });
}

// === Comments and declarations ===

/// `<!-- ... -->`, opaque.
fn markup_comment(p: &mut Parser<'_>) {
    delimited(
        p,
        (MARKUP_COMMENT_START, "<!--"),
        (MARKUP_COMMENT_END, "-->"),
        MARKUP_COMMENT,
        DiagnosticKind::UnterminatedMarkupComment,
    );
}

/// `@* ... *@`, opaque.
pub(super) fn template_comment(p: &mut Parser<'_>) {
    delimited(
        p,
        (TEMPLATE_COMMENT_START, "@*"),
        (TEMPLATE_COMMENT_END, "*@"),
        TEMPLATE_COMMENT,
        DiagnosticKind::UnterminatedTemplateComment,
    );
}

fn delimited(
    p: &mut Parser<'_>,
    (open_kind, open): (SyntaxKind, &str),
    (close_kind, close): (SyntaxKind, &str),
    node: SyntaxKind,
    unterminated: DiagnosticKind,
) {
    let start = p.pos();
    let m = p.start();
    p.bump_bytes(open.len(), open_kind);
    match p.rest().find(close) {
        Some(len) => {
            if len > 0 {
                p.bump_bytes(len, TEXT);
            }
            p.bump_bytes(close.len(), close_kind);
        }
        None => {
            let len = p.rest().len();
            if len > 0 {
                p.bump_bytes(len, TEXT);
            }
            p.error_from(unterminated, start);
        }
    }
    m.complete(p, node);
}

/// `<!DOCTYPE ...>` or `<?...?>`, plain text through the next `>`.
fn declaration(p: &mut Parser<'_>) {
    let len = p.rest().find('>').map_or(p.rest().len(), |i| i + 1);
    p.bump_text(len);
}

// === Frame end ===

pub(super) fn close(p: &mut Parser<'_>, mut f: MarkupFrame) {
    if let Some(tag) = f.tag.take() {
        p.error_from(DiagnosticKind::UnterminatedTag(tag.name.clone()), tag.start);
        finish_start_tag(p, &mut f, tag, false);
    }
    while let Some(element) = f.elements.pop() {
        if f.end == MarkupEnd::Element && f.elements.is_empty() {
            p.error(
                DiagnosticKind::UnclosedElement(element.name.clone()),
                element.open,
            );
        }
        close_implicitly(p, element);
    }
    if f.end == MarkupEnd::TextTag && !f.closed {
        p.error(
            DiagnosticKind::UnclosedElement("text".to_string()),
            range(f.open, f.open + TEXT_TAG_OPEN.len()),
        );
    }
    if let Some(node) = f.node {
        node.complete(p, MARKUP_BLOCK);
    }
}

/// Markup frame for a re-entry point. The caller has opened `node`.
pub(super) fn reentry_frame(end: MarkupEnd, node: Marker, open: usize) -> Frame {
    Frame::Markup(MarkupFrame::new(end, Some(node), open))
}
