//! Balancing scanner for C-family embedded code.
//!
//! This is not a grammar. It knows just enough about the language to find
//! where code ends: string, character and comment syntax, bracket balance,
//! and what a statement start looks like. Brackets are tracked on an explicit
//! stack.

use rowan::{TextRange, TextSize};

use super::{CodeMode, CodeStop, EmbeddedCodeParser, EmbeddedParse, ReentryKind, ReentryPoint};
use crate::diagnostics::{Diagnostic, DiagnosticKind};

/// Default [`EmbeddedCodeParser`] for C#-like code.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceScanner;

impl EmbeddedCodeParser for BraceScanner {
    fn parse(&self, source: &str, offset: usize, mode: CodeMode) -> EmbeddedParse {
        let mut scan = Scan::new(source, offset);
        let stop = match mode {
            CodeMode::ImplicitExpression => scan.implicit_expression(),
            CodeMode::ExplicitExpression => scan.explicit_expression(),
            CodeMode::Block { brace_depth } => scan.block(brace_depth),
            CodeMode::Statement {
                brace_depth,
                after_do,
            } => scan.statement(brace_depth, after_do),
        };
        scan.finish(stop)
    }
}

/// Outcome of scanning statements inside braces.
enum Body {
    /// Hit a `}` with no open brace of our own.
    Close,
    /// The brace that opened a statement body was closed.
    Closed,
    Reentry,
    Eof,
}

enum Step {
    Keyword,
    Header,
    OpenBody,
    InBody,
    Continuation,
}

struct Scan<'s> {
    src: &'s str,
    start: usize,
    pos: usize,
    depth: u32,
    diagnostics: Vec<Diagnostic>,
    reentry: Option<ReentryPoint>,
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

impl<'s> Scan<'s> {
    fn new(src: &'s str, offset: usize) -> Self {
        let mut start = offset.min(src.len());
        while !src.is_char_boundary(start) {
            start += 1;
        }
        Self {
            src,
            start,
            pos: start,
            depth: 0,
            diagnostics: Vec::new(),
            reentry: None,
        }
    }

    fn finish(self, stop: CodeStop) -> EmbeddedParse {
        EmbeddedParse {
            len: self.pos - self.start,
            diagnostics: self.diagnostics,
            reentry_points: self.reentry.into_iter().collect(),
            brace_depth: self.depth,
            stop,
        }
    }

    // === Cursor helpers ===

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_byte(&self, n: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + n).copied()
    }

    fn char_at(&self, n: usize) -> Option<char> {
        self.src.get(self.pos + n..)?.chars().next()
    }

    fn bump_char(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn ident_start_at(&self, n: usize) -> bool {
        self.char_at(n).is_some_and(is_ident_start)
    }

    /// Consume an identifier (possibly empty) and return it.
    fn ident(&mut self) -> &'s str {
        let start = self.pos;
        if self.peek().is_some_and(is_ident_start) {
            self.bump_char();
            while self.peek().is_some_and(is_ident_continue) {
                self.bump_char();
            }
        }
        &self.src[start..self.pos]
    }

    fn peek_ident(&mut self) -> &'s str {
        let save = self.pos;
        let word = self.ident();
        self.pos = save;
        word
    }

    fn skip_spaces(&mut self) {
        while matches!(self.peek_byte(0), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    /// Whitespace, line breaks and comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.bump_char(),
                Some('/') if matches!(self.peek_byte(1), Some(b'/' | b'*')) => {
                    self.comment();
                }
                _ => return,
            }
        }
    }

    fn error(&mut self, kind: DiagnosticKind, from: usize) {
        let range = TextRange::new(
            TextSize::from(from as u32),
            TextSize::from(self.pos as u32),
        );
        self.diagnostics.push(Diagnostic::new(kind, range));
    }

    fn reenter(&mut self, kind: ReentryKind) -> Body {
        self.reentry = Some(ReentryPoint {
            offset: self.pos,
            kind,
        });
        Body::Reentry
    }

    // === Literals and comments ===

    /// `//` or `/* */` at the cursor.
    fn comment(&mut self) {
        let from = self.pos;
        if self.rest().starts_with("//") {
            while !matches!(self.peek_byte(0), None | Some(b'\n' | b'\r')) {
                self.bump_char();
            }
        } else {
            self.pos += 2;
            match self.rest().find("*/") {
                Some(end) => self.pos += end + 2,
                None => {
                    self.pos = self.src.len();
                    self.error(DiagnosticKind::UnterminatedBlockComment, from);
                }
            }
        }
    }

    /// Consume a string, character literal or comment at the cursor.
    /// Returns false, consuming nothing, if there is none.
    fn literal_or_comment(&mut self) -> bool {
        let rest = self.rest();
        if rest.starts_with("//") || rest.starts_with("/*") {
            self.comment();
            return true;
        }
        // Prefixes: `@"`, `$"`, `$@"`, `@$"`, `$$"""`.
        let prefix_len = rest
            .bytes()
            .take_while(|b| matches!(b, b'@' | b'$'))
            .count();
        if rest.as_bytes().get(prefix_len) != Some(&b'"') {
            if rest.starts_with('\'') {
                self.char_literal();
                return true;
            }
            return false;
        }
        let prefix = &rest[..prefix_len];
        if prefix_len > 0 && !(prefix.contains('$') || prefix == "@") {
            // `@@"` is not a literal prefix.
            return false;
        }
        let verbatim = prefix.contains('@');
        let interpolated = prefix.contains('$');
        let from = self.pos;
        self.pos += prefix_len;
        if self.rest().starts_with("\"\"\"") {
            self.raw_string(from);
        } else {
            self.string_from(from, verbatim, interpolated);
        }
        true
    }

    fn string(&mut self, verbatim: bool, interpolated: bool) {
        let from = self.pos;
        self.string_from(from, verbatim, interpolated);
    }

    /// The cursor is on the opening quote; `from` is where the prefix began.
    fn string_from(&mut self, from: usize, verbatim: bool, interpolated: bool) {
        self.pos += 1;
        let mut holes = 0u32;
        loop {
            match self.peek() {
                None => {
                    self.error(DiagnosticKind::UnterminatedStringLiteral, from);
                    return;
                }
                Some('\n' | '\r') if !verbatim && holes == 0 => {
                    self.error(DiagnosticKind::UnterminatedStringLiteral, from);
                    return;
                }
                Some('\\') if !verbatim && holes == 0 => {
                    self.pos += 1;
                    self.bump_char();
                }
                Some('"') if holes > 0 => {
                    // A plain string nested in an interpolation hole.
                    self.string(false, false);
                }
                Some('"') => {
                    self.pos += 1;
                    if verbatim && self.peek_byte(0) == Some(b'"') {
                        self.pos += 1;
                    } else {
                        return;
                    }
                }
                Some('{') if interpolated => {
                    if holes == 0 && self.peek_byte(1) == Some(b'{') {
                        self.pos += 2;
                    } else {
                        holes += 1;
                        self.pos += 1;
                    }
                }
                Some('}') if interpolated && holes > 0 => {
                    holes -= 1;
                    self.pos += 1;
                }
                Some(_) => self.bump_char(),
            }
        }
    }

    /// The cursor is on a run of at least three quotes.
    fn raw_string(&mut self, from: usize) {
        let quotes = self.rest().bytes().take_while(|&b| b == b'"').count();
        self.pos += quotes;
        let delimiter = "\"".repeat(quotes);
        match self.rest().find(&delimiter) {
            Some(end) => self.pos += end + quotes,
            None => {
                self.pos = self.src.len();
                self.error(DiagnosticKind::UnterminatedStringLiteral, from);
            }
        }
    }

    fn char_literal(&mut self) {
        let from = self.pos;
        self.pos += 1;
        loop {
            match self.peek() {
                None | Some('\n' | '\r') => {
                    self.error(DiagnosticKind::UnterminatedCharLiteral, from);
                    return;
                }
                Some('\\') => {
                    self.pos += 1;
                    self.bump_char();
                }
                Some('\'') => {
                    self.pos += 1;
                    return;
                }
                Some(_) => self.bump_char(),
            }
        }
    }

    /// Scan to the bracket matching `close`, whose opener is already consumed.
    /// With `consume_close` false the cursor stops on the closer. Returns false
    /// at end of input.
    fn balanced(&mut self, close: char, consume_close: bool) -> bool {
        let mut stack = vec![close];
        while let Some(c) = self.peek() {
            match c {
                '(' => stack.push(')'),
                '[' => stack.push(']'),
                '{' => stack.push('}'),
                ')' | ']' | '}' if stack.last() == Some(&c) => {
                    if stack.len() == 1 {
                        if consume_close {
                            self.pos += 1;
                        }
                        return true;
                    }
                    stack.pop();
                }
                '"' | '\'' | '@' | '$' | '/' if self.literal_or_comment() => continue,
                _ => {}
            }
            self.bump_char();
        }
        false
    }

    // === Modes ===

    fn explicit_expression(&mut self) -> CodeStop {
        if self.balanced(')', false) {
            CodeStop::Complete
        } else {
            CodeStop::EndOfInput
        }
    }

    fn implicit_expression(&mut self) -> CodeStop {
        if !self.peek().is_some_and(is_ident_start) {
            return CodeStop::Complete;
        }
        let mut awaited = false;
        loop {
            let word = self.ident();
            if word == "await" && !awaited {
                let save = self.pos;
                self.skip_spaces();
                if self.peek().is_some_and(is_ident_start) {
                    awaited = true;
                    continue;
                }
                self.pos = save;
            }
            // Suffixes: calls, indexers and member access.
            loop {
                match (self.peek_byte(0), self.peek_byte(1)) {
                    (Some(open @ (b'(' | b'[')), _) => {
                        let from = self.pos;
                        self.pos += 1;
                        let close = if open == b'(' { ')' } else { ']' };
                        if !self.balanced(close, true) {
                            self.error(DiagnosticKind::UnbalancedExpression(close), from);
                            return CodeStop::EndOfInput;
                        }
                    }
                    (Some(b'.'), _) if self.ident_start_at(1) => {
                        self.pos += 1;
                        break;
                    }
                    (Some(b'?' | b'!'), Some(b'.')) if self.ident_start_at(2) => {
                        self.pos += 2;
                        break;
                    }
                    (Some(b'?'), Some(b'[')) => self.pos += 1,
                    // A trailing dot, or anything else, ends the chain.
                    _ => return CodeStop::Complete,
                }
            }
        }
    }

    fn block(&mut self, depth: u32) -> CodeStop {
        self.depth = depth;
        match self.body(false) {
            Body::Close | Body::Closed => CodeStop::BlockEnd,
            Body::Reentry => CodeStop::Reentry,
            Body::Eof => CodeStop::EndOfInput,
        }
    }

    /// Statements inside braces. In statement mode, returns `Closed` once the
    /// depth drops back to zero.
    fn body(&mut self, statement: bool) -> Body {
        let mut at_start = true;
        let mut label = false;
        let mut parens = 0u32;
        while let Some(c) = self.peek() {
            match c {
                c if c.is_whitespace() => self.bump_char(),
                '<' if at_start && parens == 0 && self.tag_follows() => {
                    let kind = if self.rest().starts_with("<text>") {
                        ReentryKind::TextTag
                    } else {
                        ReentryKind::Tag
                    };
                    return self.reenter(kind);
                }
                '@' if self.peek_byte(1) == Some(b'*') => {
                    return self.reenter(ReentryKind::Comment);
                }
                '@' if at_start && parens == 0 && self.peek_byte(1) == Some(b':') => {
                    return self.reenter(ReentryKind::LineMarkup);
                }
                '"' | '\'' | '@' | '$' | '/' if self.literal_or_comment() => {
                    if !matches!(c, '/') {
                        at_start = false;
                    }
                }
                '(' | '[' => {
                    parens += 1;
                    self.pos += 1;
                    at_start = false;
                }
                ')' | ']' => {
                    parens = parens.saturating_sub(1);
                    self.pos += 1;
                    at_start = false;
                }
                '{' => {
                    self.depth += 1;
                    self.pos += 1;
                    at_start = true;
                    label = false;
                }
                '}' => {
                    if self.depth == 0 {
                        return Body::Close;
                    }
                    self.depth -= 1;
                    self.pos += 1;
                    at_start = true;
                    label = false;
                    if statement && self.depth == 0 {
                        return Body::Closed;
                    }
                }
                ';' => {
                    self.pos += 1;
                    if parens == 0 {
                        at_start = true;
                        label = false;
                    }
                }
                ':' => {
                    self.pos += 1;
                    at_start = label && parens == 0;
                    label = false;
                }
                c if is_ident_start(c) => {
                    let word = self.ident();
                    label = at_start && matches!(word, "case" | "default");
                    at_start = false;
                }
                _ => {
                    self.bump_char();
                    at_start = false;
                }
            }
        }
        Body::Eof
    }

    /// `<` followed by something that can only be markup.
    fn tag_follows(&self) -> bool {
        match (self.peek_byte(1), self.peek_byte(2)) {
            (Some(b), _) if b.is_ascii_alphabetic() => true,
            (Some(b'/'), Some(b)) if b.is_ascii_alphabetic() => true,
            (Some(b'!'), _) => true,
            _ => false,
        }
    }

    fn statement(&mut self, depth: u32, mut after_do: bool) -> CodeStop {
        self.depth = depth;
        let mut step = if depth > 0 { Step::InBody } else { Step::Keyword };
        let mut keyword = "";
        let mut do_while = false;
        loop {
            match step {
                Step::Keyword => {
                    keyword = self.ident();
                    match keyword {
                        "" => return CodeStop::Complete,
                        "else" => {
                            let save = self.pos;
                            self.skip_trivia();
                            if self.peek_ident() == "if" {
                                keyword = self.ident();
                                step = Step::Header;
                            } else {
                                self.pos = save;
                                step = Step::OpenBody;
                            }
                        }
                        "try" | "finally" => step = Step::OpenBody,
                        "do" => {
                            after_do = true;
                            step = Step::OpenBody;
                        }
                        "while" if after_do => {
                            do_while = true;
                            step = Step::Header;
                        }
                        _ => step = Step::Header,
                    }
                }
                Step::Header => {
                    let save = self.pos;
                    self.skip_trivia();
                    if self.peek_byte(0) == Some(b'(') {
                        let from = self.pos;
                        self.pos += 1;
                        if !self.balanced(')', true) {
                            self.error(DiagnosticKind::UnbalancedExpression(')'), from);
                            return CodeStop::EndOfInput;
                        }
                    } else {
                        self.pos = save;
                    }
                    if do_while {
                        let save = self.pos;
                        self.skip_spaces();
                        if self.peek_byte(0) == Some(b';') {
                            self.pos += 1;
                        } else {
                            self.pos = save;
                        }
                        return CodeStop::Complete;
                    }
                    step = Step::OpenBody;
                }
                Step::OpenBody => {
                    let save = self.pos;
                    self.skip_trivia();
                    if self.peek_byte(0) == Some(b'{') {
                        self.pos += 1;
                        self.depth = 1;
                        step = Step::InBody;
                    } else {
                        self.pos = save;
                        let from = self.pos;
                        self.error(DiagnosticKind::ExpectedBlock(keyword.to_string()), from);
                        return CodeStop::Complete;
                    }
                }
                Step::InBody => match self.body(true) {
                    Body::Closed => step = Step::Continuation,
                    Body::Reentry => return CodeStop::Reentry,
                    Body::Eof => return CodeStop::EndOfInput,
                    Body::Close => return CodeStop::Complete,
                },
                Step::Continuation => {
                    let save = self.pos;
                    self.skip_trivia();
                    let next = self.peek_ident();
                    let continues = matches!(next, "else" | "catch" | "finally")
                        || (next == "while" && after_do);
                    if !continues {
                        self.pos = save;
                        return CodeStop::Complete;
                    }
                    step = Step::Keyword;
                }
            }
        }
    }
}
