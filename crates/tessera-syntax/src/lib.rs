//! # tessera-syntax
//!
//! A lossless, error-tolerant syntax tree for `@`-transition templates
//! (markup interleaved with embedded code), built with [Rowan] + [Logos] and
//! following the [rust-analyzer] architecture model.
//!
//! [Rowan]: https://docs.rs/rowan
//! [Logos]: https://docs.rs/logos
//! [rust-analyzer]: https://rust-analyzer.github.io/book/contributing/syntax.html
//!
//! ## Full Fidelity
//!
//! Every byte of the input appears in exactly one leaf of the tree, in order.
//! Concatenating the leaves gives back the source, for any input, including
//! half-typed and malformed documents. Problems are reported as
//! [`Diagnostic`]s next to the tree, never by failing the parse.
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Events → Sink → Rowan Tree
//!               (Logos)          (Frames)          (GreenNodeBuilder)
//!                                   ↕
//!                          EmbeddedCodeParser
//! ```
//!
//! - [`lexer`]: context-free tokens, restartable at any offset.
//! - [`parser`]: an explicit stack of markup and code frames. The `@`
//!   transition switches from markup to code; tags, `<text>`, `@:` and
//!   `@* *@` switch back.
//! - [`embedded`]: the embedded language is opaque. An
//!   [`EmbeddedCodeParser`] measures how far code runs and where markup
//!   resumes; [`BraceScanner`] is the default.
//! - [`directives`]: the `@keyword` vocabulary of a dialect.
//! - [`tree`]: the resulting [`Parse`] with diagnostics and tag pairings.
//!
//! ## Module Structure
//!
//! ```text
//! tessera-syntax/
//! ├── lib.rs           # This file - public API and end-to-end tests
//! ├── syntax_kind.rs   # SyntaxKind enum (tokens + nodes) and Rowan integration
//! ├── lexer.rs         # Logos-based tokenizer
//! ├── source.rs        # Line/column mapping
//! ├── diagnostics.rs   # Diagnostic kinds, codes and severities
//! ├── directives.rs    # FileKind, DirectiveTable, FileContext
//! ├── tree.rs          # Parse, TagLink, debug dump
//! ├── embedded/
//! │   ├── mod.rs       # EmbeddedCodeParser capability
//! │   └── scanner.rs   # BraceScanner
//! └── parser/
//!     ├── mod.rs       # Parser struct, Marker system, public parse() function
//!     ├── event.rs     # Event enum (Start, Token, Finish, Placeholder)
//!     ├── sink.rs      # Converts events to Rowan GreenNode
//!     └── grammar/
//!         ├── mod.rs   # Frame stack driver
//!         ├── markup.rs# Text, elements, attributes, comments
//!         └── code.rs  # Expressions, blocks, statements, directives
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use tessera_syntax::{parse, FileContext, SyntaxKind};
//!
//! let input = "<p>Hello, @name!</p>";
//! let parse = parse(input, &FileContext::default());
//!
//! // The tree preserves all text
//! assert_eq!(parse.syntax().text().to_string(), input);
//! assert!(parse.diagnostics().is_empty());
//!
//! let element = parse.syntax().children().next().unwrap();
//! assert_eq!(element.kind(), SyntaxKind::ELEMENT);
//! ```

pub mod diagnostics;
pub mod directives;
pub mod embedded;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod syntax_kind;
pub mod tree;

pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use directives::{
    Directive, DirectiveShape, DirectiveTable, DirectiveToken, DirectiveTokenKind, FileContext,
    FileKind,
};
pub use embedded::{BraceScanner, CodeMode, EmbeddedCodeParser};
pub use parser::{parse, parse_with};
pub use source::{LineCol, SourceText};
pub use syntax_kind::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, TemplateLang};
pub use tree::{Parse, TagLink};

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn legacy(input: &str) -> Parse {
        parse(input, &FileContext::new(FileKind::Legacy))
    }

    fn component(input: &str) -> Parse {
        parse(input, &FileContext::new(FileKind::Component))
    }

    fn range(start: u32, end: u32) -> rowan::TextRange {
        rowan::TextRange::new(start.into(), end.into())
    }

    fn codes(parse: &Parse) -> Vec<&'static str> {
        parse.diagnostics().iter().map(Diagnostic::code).collect()
    }

    fn code_nodes(parse: &Parse) -> usize {
        parse
            .syntax()
            .descendants()
            .filter(|n| n.kind().is_code())
            .count()
    }

    fn token(parse: &Parse, kind: SyntaxKind) -> SyntaxToken {
        parse
            .leaves()
            .into_iter()
            .find(|t| t.kind() == kind)
            .unwrap_or_else(|| panic!("no {kind:?} token in\n{}", parse.debug_tree()))
    }

    /// Run a fixture from tests/fixtures.
    /// Called by generated test functions (see build.rs).
    ///
    /// The first line of a fixture is a template comment naming the expected
    /// diagnostic codes in order: `@* expect: TS1005 TS2002 *@` or
    /// `@* expect: none *@`. The tree is snapshotted as
    /// `snapshots/tessera_syntax__tests__<file>.snap`.
    fn fixture_test(file: &str) {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(file);
        let input = std::fs::read_to_string(&path).unwrap();
        let kind = FileKind::from_path(&path).unwrap_or_default();
        let context = FileContext::new(kind);

        let parse = parse(&input, &context);
        assert_eq!(parse.syntax().text().to_string(), input, "fidelity");
        assert_eq!(parse, super::parse(&input, &context), "determinism");

        let len = rowan::TextSize::of(input.as_str());
        let ranges: Vec<_> = parse.diagnostics().iter().map(|d| d.range).collect();
        assert!(ranges.iter().all(|r| r.end() <= len));
        assert!(
            ranges
                .windows(2)
                .all(|w| (w[0].start(), w[0].end()) <= (w[1].start(), w[1].end()))
        );

        let tag_nodes: Vec<_> = parse
            .syntax()
            .descendants()
            .filter(|n| matches!(n.kind(), SyntaxKind::TAG_OPEN | SyntaxKind::TAG_CLOSE))
            .map(|n| n.text_range())
            .collect();
        for link in parse.tag_links() {
            for range in link.open.iter().chain(link.close.iter()) {
                assert!(tag_nodes.contains(range), "{link:?} is not a tag node");
            }
        }

        let header = input.lines().next().unwrap_or_default();
        let expected = header
            .split("expect:")
            .nth(1)
            .and_then(|rest| rest.split("*@").next())
            .unwrap_or_default()
            .trim();
        let expected: Vec<&str> = match expected {
            "none" => Vec::new(),
            list => list.split_whitespace().collect(),
        };
        assert_eq!(
            codes(&parse),
            expected,
            "{}\n{}",
            parse
                .diagnostics()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
            parse.debug_tree()
        );

        let name = file.replace(['-', '.'], "_");
        assert_snapshot!(name.as_str(), parse.debug_tree());
    }

    // Generated by build.rs - one test per file in tests/fixtures/
    include!(concat!(env!("OUT_DIR"), "/fixture_tests.rs"));

    // === Transitions ===

    #[test]
    fn email_in_text_is_one_text_run() {
        let parse = legacy("example@host.com");
        assert_eq!(
            parse.debug_tree(),
            "DOCUMENT@0..16\n  TEXT@0..16 \"example@host.com\"\n"
        );
        assert!(parse.diagnostics().is_empty());
    }

    #[test]
    fn email_in_attribute_value_is_text() {
        let parse = legacy(r#"<a href="mailto:me@host.com">mail</a>"#);
        assert_eq!(code_nodes(&parse), 0);
        assert!(parse.diagnostics().is_empty());
        let value = parse
            .syntax()
            .descendants()
            .find(|n| n.kind() == SyntaxKind::ATTRIBUTE_VALUE)
            .unwrap();
        assert_eq!(value.text(), r#""mailto:me@host.com""#);
    }

    #[test]
    fn email_with_non_ascii_letters_is_text() {
        for input in ["josé@host.com", "me@hôte.fr", "用户@例子.cn"] {
            let parse = legacy(input);
            assert_eq!(code_nodes(&parse), 0, "{input}");
            assert!(parse.diagnostics().is_empty());
            assert_eq!(parse.leaves().len(), 1);
        }
    }

    #[test]
    fn email_with_non_ascii_letters_in_attribute_value_is_text() {
        let parse = legacy(r#"<a href="mailto:josé@host.com">mail</a>"#);
        assert_eq!(code_nodes(&parse), 0);
        assert!(parse.diagnostics().is_empty());
    }

    #[test]
    fn transition_after_non_ascii_punctuation_starts_code() {
        let parse = legacy("«@name»");
        assert_eq!(code_nodes(&parse), 1);
        assert_eq!(token(&parse, SyntaxKind::CODE).text(), "name");
    }

    #[test]
    fn transition_in_attribute_value_starts_code() {
        let parse = legacy(r#"<a href="/users/@id">x</a>"#);
        assert_eq!(code_nodes(&parse), 1);
        assert_eq!(token(&parse, SyntaxKind::CODE).text(), "id");
    }

    #[test]
    fn transition_at_end_of_input_is_empty_expression() {
        let parse = legacy("@");
        assert_eq!(
            parse.debug_tree(),
            r#"DOCUMENT@0..1
  TRANSITION@0..1 "@"
  CODE_EXPRESSION@1..1
    CODE@1..1 ""
"#
        );
        assert!(parse.diagnostics().is_empty());
    }

    #[test]
    fn empty_and_blank_input() {
        assert_eq!(legacy("").debug_tree(), "DOCUMENT@0..0\n  TEXT@0..0 \"\"\n");
        assert_eq!(
            legacy("  \n").debug_tree(),
            "DOCUMENT@0..3\n  TEXT@0..3 \"  \\n\"\n"
        );
    }

    #[test]
    fn double_transition_escapes() {
        let parse = legacy("a @@ b");
        assert_eq!(
            parse.debug_tree(),
            r#"DOCUMENT@0..6
  TEXT@0..2 "a "
  TRANSITION_ESCAPE@2..3 "@"
  TEXT@3..6 "@ b"
"#
        );
        assert_eq!(parse.literal_text(), "a @ b");
    }

    #[test]
    fn escape_before_expression() {
        let parse = legacy("<p>@@@Model.Price</p>");
        assert_eq!(code_nodes(&parse), 1);
        assert_eq!(token(&parse, SyntaxKind::CODE).text(), "Model.Price");
        assert_eq!(parse.literal_text(), "<p>@@Model.Price</p>");
    }

    #[test]
    fn escape_in_attribute_value() {
        let parse = legacy(r#"<p title="@@home">x</p>"#);
        assert_eq!(code_nodes(&parse), 0);
        assert_eq!(parse.literal_text(), r#"<p title="@home">x</p>"#);
    }

    #[test]
    fn implicit_expression_stops_at_trailing_dot() {
        let parse = legacy("Hi @user.Name.");
        assert_eq!(
            parse.debug_tree(),
            r#"DOCUMENT@0..14
  TEXT@0..3 "Hi "
  TRANSITION@3..4 "@"
  CODE_EXPRESSION@4..13
    CODE@4..13 "user.Name"
  TEXT@13..14 "."
"#
        );
    }

    #[test]
    fn implicit_expression_suffixes() {
        let parse = legacy("@items[0].Format(\"x\")!");
        assert_eq!(token(&parse, SyntaxKind::CODE).text(), "items[0].Format(\"x\")");
    }

    #[test]
    fn explicit_expression() {
        let parse = legacy("@(a + b)");
        assert_eq!(
            parse.debug_tree(),
            r#"DOCUMENT@0..8
  TRANSITION@0..1 "@"
  CODE_EXPRESSION@1..8
    LPAREN@1..2 "("
    CODE@2..7 "a + b"
    RPAREN@7..8 ")"
"#
        );
    }

    #[test]
    fn bad_characters_after_transition() {
        let ws = legacy("@ x");
        assert_eq!(codes(&ws), vec!["TS2003"]);
        assert_eq!(ws.diagnostics()[0].range, range(0, 1));
        assert_eq!(codes(&legacy("@\nx")), vec!["TS2004"]);

        let bang = legacy("@!");
        assert_eq!(
            bang.diagnostics()[0].kind,
            DiagnosticKind::UnexpectedCharacterAfterTransition('!')
        );
        assert_eq!(code_nodes(&bang), 1);
    }

    // === Elements ===

    #[test]
    fn stray_end_tag_in_document_is_tolerated() {
        let input = "Foo <div><p></p></p> Baz";
        let parse = legacy(input);
        assert!(parse.diagnostics().is_empty());
        assert_eq!(parse.syntax().text(), input);

        let links = parse.tag_links();
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].name, "p");
        assert!(links[0].open.is_some() && links[0].close.is_some());
        assert_eq!(links[1].open, None);
        assert_eq!(links[2].name, "div");
        assert_eq!(links[2].close, None);
    }

    #[test]
    fn void_and_self_closing_elements() {
        let parse = legacy("<br><img src=x/><p/>text");
        let elements: Vec<_> = parse
            .syntax()
            .children()
            .filter(|n| n.kind() == SyntaxKind::ELEMENT)
            .map(|n| n.text().to_string())
            .collect();
        assert_eq!(elements, vec!["<br>", "<img src=x/>", "<p/>"]);
    }

    #[test]
    fn implicit_close_links_inner_elements() {
        let parse = legacy("<ul><li>one<li>two</ul>");
        let names: Vec<_> = parse
            .tag_links()
            .iter()
            .map(|l| (l.name.as_str(), l.close.is_some()))
            .collect();
        assert_eq!(names, vec![("li", false), ("li", false), ("ul", true)]);
    }

    #[test]
    fn raw_text_element_body_is_opaque() {
        let parse = legacy("<script>if (a < b) { @x }</script>");
        assert_eq!(code_nodes(&parse), 0);
        let element = parse.syntax().first_child().unwrap();
        let texts: Vec<_> = element
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .map(|t| t.text().to_string())
            .collect();
        assert_eq!(texts, vec!["if (a < b) { @x }"]);
    }

    #[test]
    fn raw_text_body_hides_tags_and_attribute_transitions() {
        let input = "<script>foo<bar baz='@boz'></script>";
        for parse in [legacy(input), component(input)] {
            assert_eq!(code_nodes(&parse), 0);
            assert!(parse.diagnostics().is_empty());
            assert_eq!(
                parse.debug_tree(),
                r#"DOCUMENT@0..36
  ELEMENT@0..36
    TAG_OPEN@0..8
      LT@0..1 "<"
      TAG_NAME@1..7 "script"
      GT@7..8 ">"
    TEXT@8..27 "foo<bar baz='@boz'>"
    TAG_CLOSE@27..36
      LT@27..28 "<"
      SLASH@28..29 "/"
      TAG_NAME@29..35 "script"
      GT@35..36 ">"
"#
            );
        }
    }

    #[test]
    fn raw_text_end_tag_is_case_insensitive() {
        let parse = legacy("<SCRIPT>x</Script>y");
        assert!(parse.diagnostics().is_empty());
        assert_eq!(parse.tag_links().len(), 1);
        assert!(parse.tag_links()[0].close.is_some());
    }

    #[test]
    fn unterminated_attribute_value() {
        let parse = legacy("<a href=\"x");
        assert_eq!(codes(&parse), vec!["TS1003", "TS1004"]);
        assert_eq!(parse.diagnostics()[1].range, range(8, 10));
    }

    #[test]
    fn markup_comment_is_opaque() {
        let parse = legacy("<!-- <p>@x</p> -->");
        assert_eq!(
            parse.debug_tree(),
            r#"DOCUMENT@0..18
  MARKUP_COMMENT@0..18
    MARKUP_COMMENT_START@0..4 "<!--"
    TEXT@4..15 " <p>@x</p> "
    MARKUP_COMMENT_END@15..18 "-->"
"#
        );
    }

    #[test]
    fn unterminated_template_comment() {
        let parse = legacy("a @* b");
        assert_eq!(codes(&parse), vec!["TS1002"]);
        assert_eq!(parse.syntax().text(), "a @* b");
    }

    // === Code blocks ===

    #[test]
    fn code_only_block_leaves_newline_to_markup() {
        let parse = legacy("@{ var x = 1; }\n<p></p>");
        assert!(parse.diagnostics().is_empty());
        let newline = parse
            .leaves()
            .into_iter()
            .find(|t| t.text() == "\n")
            .unwrap();
        assert_eq!(newline.kind(), SyntaxKind::TEXT);
        assert_eq!(newline.parent().unwrap().kind(), SyntaxKind::DOCUMENT);
    }

    #[test]
    fn block_ending_in_markup_keeps_newline() {
        let parse = legacy("@{ <p>a</p> }\n<b></b>");
        assert!(parse.diagnostics().is_empty());
        let newline = token(&parse, SyntaxKind::NEWLINE);
        assert_eq!(newline.text_range(), range(13, 14));
        assert_eq!(
            newline.parent().unwrap().kind(),
            SyntaxKind::CODE_STATEMENT_BLOCK
        );
    }

    #[test]
    fn line_markup_inside_block() {
        let parse = legacy("@{ @:Hello @name\n}");
        assert_eq!(
            parse.debug_tree(),
            r#"DOCUMENT@0..18
  TRANSITION@0..1 "@"
  CODE_STATEMENT_BLOCK@1..18
    LBRACE@1..2 "{"
    CODE@2..3 " "
    MARKUP_BLOCK@3..17
      TRANSITION@3..4 "@"
      COLON@4..5 ":"
      TEXT@5..11 "Hello "
      TRANSITION@11..12 "@"
      CODE_EXPRESSION@12..16
        CODE@12..16 "name"
      TEXT@16..17 "\n"
    RBRACE@17..18 "}"
"#
        );
        assert!(parse.diagnostics().is_empty());
    }

    #[test]
    fn text_tag_inside_block() {
        let parse = legacy("@{ <text>Hi</text> }");
        assert_eq!(
            parse.debug_tree(),
            r#"DOCUMENT@0..20
  TRANSITION@0..1 "@"
  CODE_STATEMENT_BLOCK@1..20
    LBRACE@1..2 "{"
    CODE@2..3 " "
    MARKUP_BLOCK@3..18
      MARKUP_TRANSITION@3..9 "<text>"
      TEXT@9..11 "Hi"
      MARKUP_TRANSITION@11..18 "</text>"
    CODE@18..19 " "
    RBRACE@19..20 "}"
"#
        );
    }

    #[test]
    fn unclosed_text_tag() {
        let parse = legacy("@{ <text>Hi");
        assert_eq!(codes(&parse), vec!["TS2002", "TS1005"]);
        assert_eq!(
            parse.diagnostics()[1].kind,
            DiagnosticKind::UnclosedElement("text".to_string())
        );
    }

    #[test]
    fn unclosed_element_inside_block() {
        let parse = legacy("@{ <p>hi }");
        assert_eq!(codes(&parse), vec!["TS2002", "TS1005"]);
        assert_eq!(parse.diagnostics()[1].range, range(3, 6));
    }

    #[test]
    fn unexpected_end_tag_inside_block() {
        let parse = legacy("@{ </span> }");
        assert_eq!(codes(&parse), vec!["TS1006"]);
    }

    #[test]
    fn brace_in_markup_does_not_close_block() {
        let parse = legacy("@{ <p>}</p> var x = 1; }");
        assert!(parse.diagnostics().is_empty());
        let block = parse.syntax().first_child().unwrap();
        assert_eq!(block.kind(), SyntaxKind::CODE_STATEMENT_BLOCK);
        assert_eq!(block.text_range().end(), rowan::TextSize::of("@{ <p>}</p> var x = 1; }"));
    }

    #[test]
    fn control_statement_with_else() {
        let parse = legacy("@if (a) { <p>x</p> } else { <p>y</p> }\nafter");
        assert!(parse.diagnostics().is_empty());
        let block = parse.syntax().first_child().unwrap();
        assert_eq!(block.kind(), SyntaxKind::CODE_STATEMENT_BLOCK);
        assert_eq!(
            block
                .children()
                .filter(|n| n.kind() == SyntaxKind::MARKUP_BLOCK)
                .count(),
            2
        );
        assert!(block.text().to_string().ends_with("}\n"));
    }

    #[test]
    fn template_comment_inside_block() {
        let parse = legacy("@{ @* note *@ var x = 1; }");
        assert!(parse.diagnostics().is_empty());
        let block = parse.syntax().first_child().unwrap();
        assert!(
            block
                .children()
                .any(|n| n.kind() == SyntaxKind::TEMPLATE_COMMENT)
        );
    }

    #[test]
    fn statement_without_block() {
        let parse = legacy("@if (a) text");
        assert_eq!(codes(&parse), vec!["TS2006"]);
    }

    // === Directives ===

    #[test]
    fn single_line_directive() {
        let parse = legacy("@model Foo.Bar\n<p></p>");
        assert!(parse.diagnostics().is_empty());
        let directive = parse.syntax().first_child().unwrap();
        assert_eq!(directive.kind(), SyntaxKind::DIRECTIVE);
        assert_eq!(directive.text(), "model Foo.Bar\n");
        let kinds: Vec<_> = directive
            .children_with_tokens()
            .map(|e| e.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::DIRECTIVE_KEYWORD,
                SyntaxKind::WHITESPACE,
                SyntaxKind::DIRECTIVE_TOKEN,
                SyntaxKind::NEWLINE,
            ]
        );
    }

    #[test]
    fn directive_missing_token() {
        let parse = legacy("@model\n");
        assert_eq!(codes(&parse), vec!["TS3001"]);
        assert!(parse.has_errors());
    }

    #[test]
    fn directive_extra_content_is_a_warning() {
        let parse = legacy("@inject IFoo Foo extra\n");
        assert_eq!(codes(&parse), vec!["TS3002"]);
        assert_eq!(parse.diagnostics()[0].severity, Severity::Warning);
        assert!(!parse.has_errors());
    }

    #[test]
    fn section_directive_holds_markup() {
        let parse = legacy("@section Foo { <b>x</b> }");
        assert_eq!(
            parse.debug_tree(),
            r#"DOCUMENT@0..25
  TRANSITION@0..1 "@"
  DIRECTIVE@1..25
    DIRECTIVE_KEYWORD@1..8 "section"
    WHITESPACE@8..9 " "
    DIRECTIVE_TOKEN@9..12 "Foo"
    WHITESPACE@12..13 " "
    LBRACE@13..14 "{"
    MARKUP_BLOCK@14..24
      TEXT@14..15 " "
      ELEMENT@15..23
        TAG_OPEN@15..18
          LT@15..16 "<"
          TAG_NAME@16..17 "b"
          GT@17..18 ">"
        TEXT@18..19 "x"
        TAG_CLOSE@19..23
          LT@19..20 "<"
          SLASH@20..21 "/"
          TAG_NAME@21..22 "b"
          GT@22..23 ">"
      TEXT@23..24 " "
    RBRACE@24..25 "}"
"#
        );
    }

    #[test]
    fn section_is_a_legacy_directive_only() {
        let parse = component("@section Foo { }");
        assert!(
            parse
                .syntax()
                .descendants()
                .all(|n| n.kind() != SyntaxKind::DIRECTIVE)
        );
    }

    #[test]
    fn code_directive_in_component() {
        let parse = component("@code {\n    int count;\n}\n");
        assert!(parse.diagnostics().is_empty());
        let directive = parse.syntax().first_child().unwrap();
        assert_eq!(directive.kind(), SyntaxKind::DIRECTIVE);
        assert_eq!(directive.text(), "code {\n    int count;\n}");
    }

    #[test]
    fn unterminated_directive_block() {
        let parse = component("@code { int x;");
        assert_eq!(codes(&parse), vec!["TS3004"]);
    }

    #[test]
    fn using_statement_is_not_a_directive() {
        let parse = legacy("@using (Html.BeginForm()) { <p></p> }");
        let block = parse.syntax().first_child().unwrap();
        assert_eq!(block.kind(), SyntaxKind::CODE_STATEMENT_BLOCK);
        assert!(parse.diagnostics().is_empty());
    }

    #[test]
    fn custom_directive_table() {
        let mut table = DirectiveTable::new();
        table.insert(Directive::new(
            "title",
            DirectiveShape::SingleLine,
            [DirectiveToken::required(DirectiveTokenKind::String)],
        ));
        let context = FileContext::with_directives(FileKind::Legacy, table);
        let parse = parse("@title \"Home\"\n@model X", &context);
        let directives = parse
            .syntax()
            .children()
            .filter(|n| n.kind() == SyntaxKind::DIRECTIVE)
            .count();
        assert_eq!(directives, 1);
    }

    // === Dialects ===

    #[test]
    fn directive_attribute_in_component() {
        let parse = component(r#"<input @bind="value" />"#);
        assert_eq!(code_nodes(&parse), 0);
        assert_eq!(token(&parse, SyntaxKind::ATTR_NAME).text(), "@bind");
    }

    #[test]
    fn transition_in_tag_is_code_in_legacy() {
        let parse = legacy(r#"<input @bind="value" />"#);
        assert_eq!(code_nodes(&parse), 1);
    }

    #[test]
    fn textarea_is_raw_text_in_legacy_only() {
        assert_eq!(code_nodes(&legacy("<textarea>@x</textarea>")), 0);
        assert_eq!(code_nodes(&component("<textarea>@x</textarea>")), 1);
    }

    #[test]
    fn custom_embedded_parser() {
        /// Treats every expression as exactly one byte long.
        struct OneByte;

        impl EmbeddedCodeParser for OneByte {
            fn parse(&self, _: &str, _: usize, _: CodeMode) -> embedded::EmbeddedParse {
                embedded::EmbeddedParse {
                    len: 1,
                    diagnostics: Vec::new(),
                    reentry_points: Vec::new(),
                    brace_depth: 0,
                    stop: embedded::CodeStop::Complete,
                }
            }
        }

        let parse = parse_with("@abc", &FileContext::default(), &OneByte);
        assert_eq!(token(&parse, SyntaxKind::CODE).text(), "a");
        assert_eq!(parse.syntax().text(), "@abc");
    }

    /// Measures a whole `@{ ... }` block in one call and reports a `Tag`
    /// reentry at every `<` followed by a letter, plus any `extra` offsets.
    struct WholeBlock {
        extra: Vec<usize>,
    }

    impl EmbeddedCodeParser for WholeBlock {
        fn parse(&self, source: &str, offset: usize, mode: CodeMode) -> embedded::EmbeddedParse {
            let CodeMode::Block { .. } = mode else {
                unreachable!("only blocks in these tests");
            };
            let len = source.rfind('}').unwrap() - offset;
            let bytes = source.as_bytes();
            let tags = (offset..offset + len)
                .filter(|&i| bytes[i] == b'<' && bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic));
            embedded::EmbeddedParse {
                len,
                diagnostics: Vec::new(),
                reentry_points: tags
                    .chain(self.extra.iter().copied())
                    .map(|offset| embedded::ReentryPoint {
                        offset,
                        kind: embedded::ReentryKind::Tag,
                    })
                    .collect(),
                brace_depth: 0,
                stop: embedded::CodeStop::BlockEnd,
            }
        }
    }

    fn code_texts(parse: &Parse) -> Vec<String> {
        parse
            .leaves()
            .iter()
            .filter(|t| t.kind() == SyntaxKind::CODE)
            .map(|t| t.text().to_string())
            .collect()
    }

    fn count(parse: &Parse, kind: SyntaxKind) -> usize {
        parse.syntax().descendants().filter(|n| n.kind() == kind).count()
    }

    #[test]
    fn host_reentry_points_inside_measured_code() {
        let input = "@{ a(); <p>x</p> b(); }";
        let parse = parse_with(input, &FileContext::default(), &WholeBlock { extra: Vec::new() });
        assert!(parse.diagnostics().is_empty());
        assert_eq!(parse.syntax().text(), input);
        assert_eq!(code_texts(&parse), vec![" a(); ", " b(); "]);
        assert_eq!(count(&parse, SyntaxKind::MARKUP_BLOCK), 1);
        assert_eq!(count(&parse, SyntaxKind::ELEMENT), 1);
        assert_eq!(
            parse.syntax().first_child().unwrap().kind(),
            SyntaxKind::CODE_STATEMENT_BLOCK
        );
    }

    #[test]
    fn host_reentry_points_are_all_walked() {
        let input = "@{ a(); <p>x</p> b(); <i>y</i> c(); }";
        let parse = parse_with(input, &FileContext::default(), &WholeBlock { extra: Vec::new() });
        assert!(parse.diagnostics().is_empty());
        assert_eq!(code_texts(&parse), vec![" a(); ", " b(); ", " c(); "]);
        assert_eq!(count(&parse, SyntaxKind::MARKUP_BLOCK), 2);
    }

    #[test]
    fn host_reentry_points_outside_code_are_ignored() {
        let input = "@{ a(); } <p></p>";
        let parse = parse_with(input, &FileContext::default(), &WholeBlock { extra: vec![10] });
        assert!(parse.diagnostics().is_empty());
        assert_eq!(parse.syntax().text(), input);
        assert_eq!(code_texts(&parse), vec![" a(); "]);
        assert_eq!(count(&parse, SyntaxKind::MARKUP_BLOCK), 0);
    }

    // === Robustness ===

    #[test]
    fn roundtrip_preserves_text() {
        let inputs = [
            "Hello, world!\n",
            "<p class=\"a\">x</p>",
            "@{ var x = \"}\"; }",
            "@foreach (var i in items) { <li>@i</li> }",
            "@(",
            "@{",
            "<",
            "</",
            "<p",
            "<p a=",
            "<p a='",
            "<!--",
            "@*",
            "@section",
            "@section X {",
            "}}}@}{",
            "é@ü<ö>@ä",
            "\r\n@\r\n",
        ];

        for input in inputs {
            for parse in [legacy(input), component(input)] {
                assert_eq!(
                    parse.syntax().text().to_string(),
                    input,
                    "Roundtrip failed for: {:?}",
                    input
                );
            }
        }
    }
}
