//! Line-oriented syntax of Strata modules
//!
//! ```text
//! // comment
//! import { area, Shape } from "./shapes"
//! export area = width * height
//! anything else is body text
//! ```

use super::Diagnostic;
use std::path::Path;

pub const SYNTAX_ERROR: &str = "S1001";

/// `import { names } from "specifier"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub names: Vec<String>,
    pub specifier: String,
    pub line: usize,
    /// Column of the opening quote of the specifier
    pub column: usize,
    pub snippet: String,
}

/// `export name` or `export name = ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub line: usize,
    pub column: usize,
    pub snippet: String,
}

/// Parse result of one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSyntax {
    pub imports: Vec<Import>,
    pub exports: Vec<Export>,
    /// Lines that are neither declarations nor comments
    pub body: Vec<String>,
    /// Syntactic diagnostics in source order
    pub errors: Vec<Diagnostic>,
}

/// Parse a module
pub fn parse(path: &Path, text: &str) -> SourceSyntax {
    let mut syntax = SourceSyntax::default();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        let indent = raw.len() - raw.trim_start().len();

        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }

        if let Some(rest) = keyword(trimmed, "import") {
            match parse_import(rest) {
                Some((names, specifier, offset)) => syntax.imports.push(Import {
                    names,
                    specifier,
                    line,
                    column: indent + (trimmed.len() - rest.len()) + offset + 1,
                    snippet: raw.to_string(),
                }),
                None => syntax.errors.push(
                    Diagnostic::syntactic(SYNTAX_ERROR, "Malformed import declaration")
                        .with_file(path)
                        .at(line, indent + 1, trimmed.len())
                        .with_snippet(raw),
                ),
            }
        } else if let Some(rest) = keyword(trimmed, "export") {
            let declaration = rest.trim_start();
            let name_len = declaration
                .find(|c: char| !is_ident_char(c))
                .unwrap_or(declaration.len());
            let name = &declaration[..name_len];
            let tail = declaration[name_len..].trim();

            if is_identifier(name) && (tail.is_empty() || tail.starts_with('=')) {
                syntax.exports.push(Export {
                    name: name.to_string(),
                    line,
                    column: indent + (trimmed.len() - declaration.len()) + 1,
                    snippet: raw.to_string(),
                });
            } else {
                syntax.errors.push(
                    Diagnostic::syntactic(SYNTAX_ERROR, "Malformed export declaration")
                        .with_file(path)
                        .at(line, indent + 1, trimmed.len())
                        .with_snippet(raw),
                );
            }
        } else {
            syntax.body.push(raw.to_string());
        }
    }

    syntax
}

/// Text after `word` when the line starts with it as a whole word
fn keyword<'a>(line: &'a str, word: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(word)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || c == '{' => Some(rest),
        Some(_) => None,
    }
}

/// Names, specifier and the byte offset of the opening quote within `rest`
fn parse_import(rest: &str) -> Option<(Vec<String>, String, usize)> {
    let after_ws = rest.trim_start();
    let inner = after_ws.strip_prefix('{')?;
    let close = inner.find('}')?;

    let names: Vec<String> = inner[..close]
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();
    if !names.iter().all(|n| is_identifier(n)) {
        return None;
    }

    let after_names = &inner[close + 1..];
    let from = keyword(after_names.trim_start(), "from")?;
    let quoted = from.trim_start();
    let quote = quoted.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &quoted[1..];
    let end = body.find(quote)?;
    let specifier = &body[..end];

    let trailing = body[end + 1..].trim();
    if specifier.is_empty() || !(trailing.is_empty() || trailing == ";") {
        return None;
    }

    let offset = rest.len() - quoted.len();
    Some((names, specifier.to_string(), offset))
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if !first.is_ascii_digit() && is_ident_char(first) => chars.all(is_ident_char),
        _ => false,
    }
}
