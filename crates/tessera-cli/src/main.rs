use anyhow::{Context, Result};
use std::{env, fs, path::Path, path::PathBuf, process};
use tessera_config::Config;
use tessera_syntax::{Diagnostic, FileContext, FileKind, Severity, SourceText, parse};

const USAGE: &str = "[--tree] [--kind legacy|component] [--config <path>] <file>...";

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    tree: bool,
    kind: Option<FileKind>,
    config_path: Option<PathBuf>,
    files: Vec<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--tree" => options.tree = true,
            "--no-tree" => options.tree = false,
            "--kind" => {
                let value = args.next().ok_or("--kind needs a value")?;
                options.kind = Some(match value.as_str() {
                    "legacy" => FileKind::Legacy,
                    "component" => FileKind::Component,
                    other => return Err(format!("unknown kind `{other}`")),
                });
            }
            "--config" => {
                let value = args.next().ok_or("--config needs a path")?;
                options.config_path = Some(PathBuf::from(value));
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option `{flag}`")),
            file => options.files.push(PathBuf::from(file)),
        }
    }
    if options.files.is_empty() {
        return Err("no template files given".to_string());
    }
    Ok(options)
}

/// `path:line:col: severity[code]: message`, with 1-based positions.
fn format_diagnostic(path: &Path, source: &SourceText, diagnostic: &Diagnostic) -> String {
    format!(
        "{}:{}: {}[{}]: {}",
        path.display(),
        source.line_col(diagnostic.range.start()),
        diagnostic.severity,
        diagnostic.code(),
        diagnostic.message()
    )
}

fn context_for(config: &Config, kind: Option<FileKind>, path: &Path) -> Result<FileContext> {
    Ok(match kind {
        Some(kind) => config.file_context(kind),
        None => config.file_context_for(path)?,
    })
}

/// Parses one file and prints its report. Returns whether it had errors.
fn check_file(config: &Config, options: &Options, path: &Path) -> Result<bool> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let context = context_for(config, options.kind, path)?;
    log::debug!("parsing {} as {:?}", path.display(), context.kind);

    let parse = parse(&text, &context);
    if options.tree {
        print!("{}", parse.debug_tree());
    }

    let source = SourceText::new(&text);
    for diagnostic in parse.diagnostics() {
        println!("{}", format_diagnostic(path, &source, diagnostic));
    }
    Ok(parse
        .diagnostics()
        .iter()
        .any(|d| d.severity == Severity::Error))
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("tessera");

    let options = match parse_args(args.get(1..).unwrap_or_default()) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Usage: {program} {USAGE}");
            process::exit(1);
        }
    };

    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(Config::config_path);
    let config = match Config::load_from_path(&config_path) {
        Ok(Some(config)) => {
            log::info!("using config from {}", config_path.display());
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let mut failed = false;
    for path in &options.files {
        match check_file(&config, &options, path) {
            Ok(has_errors) => failed |= has_errors,
            Err(e) => {
                eprintln!("Error: {e:#}");
                failed = true;
            }
        }
    }

    if failed {
        process::exit(1);
    }
    Ok(())
}
