//! SyntaxKind enum for all tokens and nodes in the template CST.
//!
//! Following the rust-analyzer model, all tokens and nodes share a single enum.
//! Every byte in the source must appear as a token in the tree.

/// All syntax kinds for the template CST.
///
/// This enum represents both tokens (lexer output, plus a few kinds the parser
/// assigns to byte ranges it groups) and composite nodes (parser output).
/// The `repr(u16)` ensures efficient storage in rowan's green tree.
///
/// We use SCREAMING_CASE following the rust-analyzer convention for SyntaxKind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Tokens (lexer output) ===
    /// Horizontal whitespace (spaces, tabs)
    WHITESPACE,
    /// Line ending
    NEWLINE,
    /// Literal markup text
    TEXT,
    /// `@`, the markup/code transition character
    TRANSITION,
    /// `@*` opening a template comment
    TEMPLATE_COMMENT_START,
    /// `*@` closing a template comment
    TEMPLATE_COMMENT_END,
    /// `<!--`
    MARKUP_COMMENT_START,
    /// `-->`
    MARKUP_COMMENT_END,
    /// `<`
    LT,
    /// `>`
    GT,
    /// `/`
    SLASH,
    /// `=`
    EQ,
    /// `"`
    DQUOTE,
    /// `'`
    SQUOTE,
    /// `{`
    LBRACE,
    /// `}`
    RBRACE,
    /// `(`
    LPAREN,
    /// `)`
    RPAREN,

    // === Tokens assigned by the parser ===
    /// First `@` of an `@@` escape; never rendered
    TRANSITION_ESCAPE,
    /// `:` of an `@:` line-markup transition
    COLON,
    /// Element name inside a start or end tag
    TAG_NAME,
    /// Attribute name inside a start tag
    ATTR_NAME,
    /// `<text>` or `</text>`, the pseudo element that only switches to markup
    MARKUP_TRANSITION,
    /// Opaque embedded-language source
    CODE,
    /// Keyword introducing a directive (`section`, `using`, ...)
    DIRECTIVE_KEYWORD,
    /// One argument of a directive (type, member, string, ...)
    DIRECTIVE_TOKEN,
    /// End of file marker
    EOF,

    // === Composite Nodes (parser output) ===
    /// Root document node
    DOCUMENT,
    /// A start tag together with its content and (optional) end tag
    ELEMENT,
    /// `<name attr=value ...>` or `<name/>`
    TAG_OPEN,
    /// `</name>`
    TAG_CLOSE,
    /// `name`, `name=value`, `name="value"`
    ATTRIBUTE,
    /// Attribute value, quotes included
    ATTRIBUTE_VALUE,
    /// `<!-- ... -->`
    MARKUP_COMMENT,
    /// `@* ... *@`
    TEMPLATE_COMMENT,
    /// Markup re-entered from inside a code region
    MARKUP_BLOCK,
    /// `@expr` or `@(expr)`
    CODE_EXPRESSION,
    /// `@{ ... }` or a control statement such as `@if (...) { ... }`
    CODE_STATEMENT_BLOCK,
    /// `@keyword ...` shaped by the directive table
    DIRECTIVE,

    /// Error recovery node. The parser reports problems as diagnostics and
    /// never emits it; it stays last so it bounds `kind_from_raw`.
    ERROR,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (lexer or parser assigned).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    /// Returns true if this kind represents a composite node.
    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    /// Returns true if this kind is trivia (whitespace/newlines).
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::NEWLINE)
    }

    /// Returns true for nodes that hold embedded code.
    pub fn is_code(self) -> bool {
        matches!(
            self,
            Self::CODE_EXPRESSION | Self::CODE_STATEMENT_BLOCK | Self::DIRECTIVE
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TemplateLang {}

impl rowan::Language for TemplateLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::ERROR as u16);
        // SAFETY: We check bounds above and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type alias for our syntax nodes.
pub type SyntaxNode = rowan::SyntaxNode<TemplateLang>;
/// Type alias for our syntax tokens.
pub type SyntaxToken = rowan::SyntaxToken<TemplateLang>;
/// Type alias for syntax elements (node or token).
pub type SyntaxElement = rowan::SyntaxElement<TemplateLang>;
