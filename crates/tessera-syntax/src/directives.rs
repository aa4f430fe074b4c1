//! # Directive Table and File Context
//!
//! Directives are `@keyword` constructs whose shape the parser cannot guess:
//! `@model Foo` runs to the end of the line, `@section Scripts { ... }` holds
//! markup, `@code { ... }` holds code. The vocabulary differs between
//! dialects, so it is host-supplied configuration rather than hard-coded
//! grammar.
//!
//! A [`FileContext`] bundles the [`FileKind`] (which also decides the raw-text
//! element names) with the [`DirectiveTable`] used for a parse. Both are
//! read-only during parsing.

use std::collections::BTreeMap;
use std::path::Path;

/// The template dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileKind {
    /// Views and pages (`.cshtml`).
    #[default]
    Legacy,
    /// Components (`.razor`).
    Component,
}

impl FileKind {
    /// Guess the dialect from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("cshtml") {
            Some(FileKind::Legacy)
        } else if ext.eq_ignore_ascii_case("razor") {
            Some(FileKind::Component)
        } else {
            None
        }
    }

    /// Elements whose body is opaque to tag and transition scanning.
    pub fn raw_text_elements(self) -> &'static [&'static str] {
        match self {
            FileKind::Legacy => &["script", "style", "textarea"],
            FileKind::Component => &["script", "style"],
        }
    }
}

/// How the parser consumes what follows a directive keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveShape {
    /// Tokens up to the end of the line, line break included.
    SingleLine,
    /// Tokens, then a `{ ... }` block holding markup.
    MarkupBlock,
    /// Tokens, then a `{ ... }` block holding code.
    CodeBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveTokenKind {
    /// `Foo.Bar<Baz>[]?`
    Type,
    /// A single identifier.
    Member,
    /// `Foo.Bar.Baz`
    Namespace,
    /// `"..."`
    String,
    /// `[...]`
    Attribute,
    /// `true` or `false`
    Boolean,
    /// The rest of the line, trimmed.
    LineText,
}

impl DirectiveTokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            DirectiveTokenKind::Type => "a type name",
            DirectiveTokenKind::Member => "a member name",
            DirectiveTokenKind::Namespace => "a namespace",
            DirectiveTokenKind::String => "a quoted string",
            DirectiveTokenKind::Attribute => "an attribute",
            DirectiveTokenKind::Boolean => "`true` or `false`",
            DirectiveTokenKind::LineText => "a value",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectiveToken {
    pub kind: DirectiveTokenKind,
    pub optional: bool,
}

impl DirectiveToken {
    pub fn required(kind: DirectiveTokenKind) -> Self {
        Self {
            kind,
            optional: false,
        }
    }

    pub fn optional(kind: DirectiveTokenKind) -> Self {
        Self {
            kind,
            optional: true,
        }
    }
}

/// One entry of the directive table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Directive {
    pub keyword: String,
    pub shape: DirectiveShape,
    pub tokens: Vec<DirectiveToken>,
}

impl Directive {
    pub fn new(
        keyword: impl Into<String>,
        shape: DirectiveShape,
        tokens: impl IntoIterator<Item = DirectiveToken>,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            shape,
            tokens: tokens.into_iter().collect(),
        }
    }

    fn line(keyword: &str, tokens: &[DirectiveToken]) -> Self {
        Self::new(keyword, DirectiveShape::SingleLine, tokens.iter().copied())
    }
}

/// Keyword → directive mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveTable {
    entries: BTreeMap<String, Directive>,
}

impl DirectiveTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in vocabulary of a dialect.
    pub fn for_kind(kind: FileKind) -> Self {
        use DirectiveTokenKind as K;
        let req = DirectiveToken::required;
        let opt = DirectiveToken::optional;

        let mut table = Self::new();
        // Shared by both dialects.
        table.insert(Directive::line("using", &[req(K::LineText)]));
        table.insert(Directive::line("inherits", &[req(K::Type)]));
        table.insert(Directive::line("inject", &[req(K::Type), req(K::Member)]));
        table.insert(Directive::line("namespace", &[req(K::Namespace)]));
        table.insert(Directive::line("attribute", &[req(K::Attribute)]));
        table.insert(Directive::new("functions", DirectiveShape::CodeBlock, []));

        match kind {
            FileKind::Legacy => {
                table.insert(Directive::line("model", &[req(K::Type)]));
                table.insert(Directive::line("page", &[opt(K::String)]));
                table.insert(Directive::line("addTagHelper", &[req(K::LineText)]));
                table.insert(Directive::line("removeTagHelper", &[req(K::LineText)]));
                table.insert(Directive::line("tagHelperPrefix", &[req(K::LineText)]));
                table.insert(Directive::new(
                    "section",
                    DirectiveShape::MarkupBlock,
                    [req(K::Member)],
                ));
            }
            FileKind::Component => {
                table.insert(Directive::line("page", &[req(K::String)]));
                table.insert(Directive::line("layout", &[req(K::Type)]));
                table.insert(Directive::line("implements", &[req(K::Type)]));
                table.insert(Directive::line("typeparam", &[req(K::LineText)]));
                table.insert(Directive::line("preservewhitespace", &[req(K::Boolean)]));
                table.insert(Directive::line("rendermode", &[req(K::LineText)]));
                table.insert(Directive::new("code", DirectiveShape::CodeBlock, []));
            }
        }
        table
    }

    /// Add or replace a directive.
    pub fn insert(&mut self, directive: Directive) -> Option<Directive> {
        self.entries.insert(directive.keyword.clone(), directive)
    }

    pub fn remove(&mut self, keyword: &str) -> Option<Directive> {
        self.entries.remove(keyword)
    }

    /// Keywords are case-sensitive.
    pub fn get(&self, keyword: &str) -> Option<&Directive> {
        self.entries.get(keyword)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.entries.contains_key(keyword)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything a parse needs to know about the file besides its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContext {
    pub kind: FileKind,
    pub directives: DirectiveTable,
    raw_text_elements: Vec<String>,
}

impl FileContext {
    /// The dialect's default vocabulary.
    pub fn new(kind: FileKind) -> Self {
        Self::with_directives(kind, DirectiveTable::for_kind(kind))
    }

    pub fn with_directives(kind: FileKind, directives: DirectiveTable) -> Self {
        Self {
            kind,
            directives,
            raw_text_elements: kind
                .raw_text_elements()
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }

    /// Replace the raw-text element names chosen by the file kind.
    pub fn with_raw_text_elements<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.raw_text_elements = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn raw_text_elements(&self) -> &[String] {
        &self.raw_text_elements
    }

    /// Element names compare ASCII case-insensitively.
    pub fn is_raw_text_element(&self, name: &str) -> bool {
        self.raw_text_elements
            .iter()
            .any(|raw| raw.eq_ignore_ascii_case(name))
    }
}

impl Default for FileContext {
    fn default() -> Self {
        Self::new(FileKind::default())
    }
}
