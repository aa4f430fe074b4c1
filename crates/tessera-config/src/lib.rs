//! Parse configuration loaded from `~/.config/tessera/config.toml`.
//!
//! ```toml
//! [[files]]
//! pattern = "**/Shared/*.html"
//! kind = "legacy"
//!
//! [dialects.component]
//! raw_text_elements = ["script", "style", "template"]
//!
//! [[directives]]
//! keyword = "title"
//! shape = "single-line"
//! dialects = ["legacy"]
//! tokens = [{ kind = "string" }]
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tessera_syntax::{
    Directive, DirectiveShape, DirectiveTable, DirectiveToken, DirectiveTokenKind, FileContext,
    FileKind,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid file pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },
}

/// Template dialect as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    Legacy,
    Component,
}

impl From<Dialect> for FileKind {
    fn from(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Legacy => FileKind::Legacy,
            Dialect::Component => FileKind::Component,
        }
    }
}

impl From<FileKind> for Dialect {
    fn from(kind: FileKind) -> Self {
        match kind {
            FileKind::Legacy => Dialect::Legacy,
            FileKind::Component => Dialect::Component,
        }
    }
}

/// Files matching `pattern` are parsed as `kind`, whatever their extension.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileRule {
    pub pattern: String,
    pub kind: Dialect,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DialectConfig {
    /// Replaces the dialect's raw-text element names.
    #[serde(default)]
    pub raw_text_elements: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Dialects {
    #[serde(default)]
    pub legacy: Option<DialectConfig>,
    #[serde(default)]
    pub component: Option<DialectConfig>,
}

impl Dialects {
    pub fn get(&self, kind: FileKind) -> Option<&DialectConfig> {
        match kind {
            FileKind::Legacy => self.legacy.as_ref(),
            FileKind::Component => self.component.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeName {
    SingleLine,
    MarkupBlock,
    CodeBlock,
}

impl From<ShapeName> for DirectiveShape {
    fn from(shape: ShapeName) -> Self {
        match shape {
            ShapeName::SingleLine => DirectiveShape::SingleLine,
            ShapeName::MarkupBlock => DirectiveShape::MarkupBlock,
            ShapeName::CodeBlock => DirectiveShape::CodeBlock,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenName {
    Type,
    Member,
    Namespace,
    String,
    Attribute,
    Boolean,
    LineText,
}

impl From<TokenName> for DirectiveTokenKind {
    fn from(token: TokenName) -> Self {
        match token {
            TokenName::Type => DirectiveTokenKind::Type,
            TokenName::Member => DirectiveTokenKind::Member,
            TokenName::Namespace => DirectiveTokenKind::Namespace,
            TokenName::String => DirectiveTokenKind::String,
            TokenName::Attribute => DirectiveTokenKind::Attribute,
            TokenName::Boolean => DirectiveTokenKind::Boolean,
            TokenName::LineText => DirectiveTokenKind::LineText,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenConfig {
    pub kind: TokenName,
    #[serde(default)]
    pub optional: bool,
}

/// An extra directive, or a replacement for a built-in one with the same
/// keyword.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectiveConfig {
    pub keyword: String,
    pub shape: ShapeName,
    /// Dialects the directive applies to; empty means all.
    #[serde(default)]
    pub dialects: Vec<Dialect>,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
}

impl DirectiveConfig {
    pub fn applies_to(&self, kind: FileKind) -> bool {
        self.dialects.is_empty() || self.dialects.contains(&Dialect::from(kind))
    }

    pub fn to_directive(&self) -> Directive {
        Directive::new(
            self.keyword.clone(),
            self.shape.into(),
            self.tokens.iter().map(|token| {
                if token.optional {
                    DirectiveToken::optional(token.kind.into())
                } else {
                    DirectiveToken::required(token.kind.into())
                }
            }),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub files: Vec<FileRule>,
    #[serde(default)]
    pub dialects: Dialects,
    #[serde(default)]
    pub directives: Vec<DirectiveConfig>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in file patterns
        for rule in &mut config.files {
            if let Some(expanded) = Self::expand_path(Path::new(&rule.pattern)) {
                rule.pattern = expanded.to_string_lossy().into_owned();
            }
        }
        log::debug!(
            "loaded {} file rules and {} directives from {}",
            config.files.len(),
            config.directives.len(),
            config_path.display()
        );

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/tessera");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// The dialect for `path`: the first matching file rule, then the
    /// extension, then [`FileKind::Legacy`].
    pub fn file_kind_for(&self, path: &Path) -> Result<FileKind, ConfigError> {
        for rule in &self.files {
            let pattern =
                glob::Pattern::new(&rule.pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: rule.pattern.clone(),
                    source,
                })?;
            if pattern.matches_path(path) {
                return Ok(rule.kind.into());
            }
        }
        Ok(FileKind::from_path(path).unwrap_or_default())
    }

    /// Built-in directives of `kind` with the configured ones layered on top.
    pub fn directive_table(&self, kind: FileKind) -> DirectiveTable {
        let mut table = DirectiveTable::for_kind(kind);
        for directive in self.directives.iter().filter(|d| d.applies_to(kind)) {
            if table.insert(directive.to_directive()).is_some() {
                log::debug!("directive `{}` overridden by config", directive.keyword);
            }
        }
        table
    }

    /// Parse context for a file of `kind`, with every override applied.
    pub fn file_context(&self, kind: FileKind) -> FileContext {
        let context = FileContext::with_directives(kind, self.directive_table(kind));
        match self
            .dialects
            .get(kind)
            .and_then(|d| d.raw_text_elements.as_ref())
        {
            Some(names) => context.with_raw_text_elements(names.iter().cloned()),
            None => context,
        }
    }

    /// Everything needed to parse the file at `path`.
    pub fn file_context_for(&self, path: &Path) -> Result<FileContext, ConfigError> {
        let kind = self.file_kind_for(path)?;
        Ok(self.file_context(kind))
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
