//! TeX math pass.
//!
//! Delimited TeX in the text of rendered markup is converted to MathML and
//! wrapped in `<span class="math math-inline|math-display">`. The span keeps
//! the original delimited source in `data-math-source`, so a later pass can
//! clear earlier output and typeset again from scratch.
//!
//! Text inside `script`, `noscript`, `style`, `textarea`, `pre` and `code`
//! is never scanned.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use latex2mathml::{DisplayStyle, latex_to_mathml};
use lol_html::html_content::{ContentType, Element};
use lol_html::{RewriteStrSettings, doc_text, element, end_tag, rewrite_str};
use serde::Deserialize;

use crate::consts::{DEFAULT_LOAD_TIMEOUT, DEFAULT_SKIP_TAGS};
use crate::loader::{LazyLibrary, Library, LoadError, LoaderState};
use crate::text::{escape_quote, unescape_html};

/// Maximum nested macro expansions per expression.
const MAX_EXPANSION_PASSES: usize = 16;

/// Opening and closing delimiter strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub inline: Vec<(String, String)>,
    pub display: Vec<(String, String)>,
}

impl Default for Delimiters {
    fn default() -> Self {
        let pair = |open: &str, close: &str| (open.to_owned(), close.to_owned());
        Self {
            inline: vec![pair("$", "$"), pair(r"\(", r"\)")],
            display: vec![pair("$$", "$$"), pair(r"\[", r"\]")],
        }
    }
}

impl Delimiters {
    /// All pairs, longest opener first, display before inline on ties.
    fn ordered(&self) -> Vec<(&str, &str, bool)> {
        let mut pairs: Vec<(&str, &str, bool)> = self
            .display
            .iter()
            .map(|(o, c)| (o.as_str(), c.as_str(), true))
            .chain(self.inline.iter().map(|(o, c)| (o.as_str(), c.as_str(), false)))
            .filter(|(open, close, _)| !open.is_empty() && !close.is_empty())
            .collect();
        pairs.sort_by_key(|(open, _, _)| std::cmp::Reverse(open.len()));
        pairs
    }
}

/// Math pass settings.
#[derive(Debug, Clone)]
pub struct MathConfig {
    /// TOML file with a `[macros]` table of TeX shorthands.
    pub macros_file: Option<PathBuf>,
    pub load_timeout: Duration,
    pub delimiters: Delimiters,
    pub skip_tags: Vec<String>,
}

impl Default for MathConfig {
    fn default() -> Self {
        Self {
            macros_file: None,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            delimiters: Delimiters::default(),
            skip_tags: DEFAULT_SKIP_TAGS.iter().map(|t| (*t).to_owned()).collect(),
        }
    }
}

/// User-defined TeX commands.
///
/// ```toml
/// [macros]
/// R = "\\mathbb{R}"
/// vec = "\\mathbf{#1}"
/// ```
///
/// A body may use `#1` to `#9`; each is filled from a braced argument
/// following the command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TexMacros {
    macros: HashMap<String, String>,
}

#[derive(Deserialize)]
struct MacrosFile {
    #[serde(default)]
    macros: HashMap<String, String>,
}

impl TexMacros {
    pub fn parse(content: &str) -> Result<Self, LoadError> {
        let file: MacrosFile = toml::from_str(content).map_err(|e| LoadError::Invalid {
            what: "macros file".to_owned(),
            reason: e.to_string(),
        })?;

        let mut macros = HashMap::with_capacity(file.macros.len());
        for (name, body) in file.macros {
            let name = name.trim_start_matches('\\').to_owned();
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphabetic()) {
                return Err(LoadError::Invalid {
                    what: format!("macro name {name:?}"),
                    reason: "names are ASCII letters only".to_owned(),
                });
            }
            macros.insert(name, body);
        }
        Ok(Self { macros })
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Expand user commands until none are left (bounded for recursive
    /// definitions).
    pub fn expand(&self, tex: &str) -> String {
        let mut current = tex.to_owned();
        if self.macros.is_empty() {
            return current;
        }
        for _ in 0..MAX_EXPANSION_PASSES {
            let (next, changed) = self.expand_once(&current);
            current = next;
            if !changed {
                break;
            }
        }
        current
    }

    fn expand_once(&self, tex: &str) -> (String, bool) {
        let mut out = String::with_capacity(tex.len());
        let mut changed = false;
        let mut rest = tex;

        while let Some(pos) = rest.find('\\') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let name_len = after
                .bytes()
                .take_while(u8::is_ascii_alphabetic)
                .count();

            if name_len == 0 {
                // `\\`, `\{` and similar: copy the escape and the next char.
                let next_len = after.chars().next().map_or(0, char::len_utf8);
                out.push_str(&rest[pos..pos + 1 + next_len]);
                rest = &after[next_len..];
                continue;
            }

            let name = &after[..name_len];
            let tail = &after[name_len..];
            match self
                .macros
                .get(name)
                .and_then(|body| substitute(body, tail))
            {
                Some((expansion, consumed)) => {
                    out.push_str(&expansion);
                    rest = &tail[consumed..];
                    changed = true;
                }
                None => {
                    out.push('\\');
                    out.push_str(name);
                    rest = tail;
                }
            }
        }
        out.push_str(rest);
        (out, changed)
    }
}

/// Fill `#n` placeholders of `body` from braced groups at the start of
/// `tail`. Returns the expansion and how much of `tail` was consumed.
fn substitute(body: &str, tail: &str) -> Option<(String, usize)> {
    let arity = (1..=9u8)
        .rev()
        .find(|n| body.contains(&format!("#{n}")))
        .unwrap_or(0);

    let mut args = Vec::with_capacity(usize::from(arity));
    let mut consumed = 0;
    for _ in 0..arity {
        let skipped = tail[consumed..].len() - tail[consumed..].trim_start().len();
        let (arg, len) = braced_group(&tail[consumed + skipped..])?;
        args.push(arg);
        consumed += skipped + len;
    }

    let mut expansion = body.to_owned();
    for (i, arg) in args.iter().enumerate().rev() {
        expansion = expansion.replace(&format!("#{}", i + 1), arg);
    }
    Some((expansion, consumed))
}

/// Content and total length of a `{...}` group at the start of `s`.
fn braced_group(s: &str) -> Option<(&str, usize)> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&s[1..i], i + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Loaded TeX-to-MathML converter.
#[derive(Debug, Default)]
pub struct TexEngine {
    macros: TexMacros,
}

impl TexEngine {
    pub fn new(macros: TexMacros) -> Self {
        Self { macros }
    }

    pub fn to_mathml(&self, tex: &str, display: bool) -> Result<String, String> {
        let style = if display {
            DisplayStyle::Block
        } else {
            DisplayStyle::Inline
        };
        latex_to_mathml(&self.macros.expand(tex.trim()), style).map_err(|e| e.to_string())
    }
}

/// Remove typeset output, restoring the delimited source text.
#[must_use]
pub fn clear_typeset(html: &str) -> String {
    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("span.math[data-math-source]", |el| {
                if let Some(source) = el.get_attribute("data-math-source") {
                    el.replace(&source, ContentType::Html);
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    );
    result.unwrap_or_else(|error| {
        tracing::warn!(%error, "Cannot clear typeset math, keeping markup");
        html.to_owned()
    })
}

/// Typeset every delimited expression in text nodes outside the skipped
/// elements. Attribute values are never touched.
#[must_use]
pub fn typeset(html: &str, engine: &TexEngine, delimiters: &Delimiters, skip_tags: &[String]) -> String {
    let pairs = delimiters.ordered();
    // Open skipped elements around the current text.
    let skipped = Rc::new(Cell::new(0usize));
    let mut pending = String::new();

    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", |el: &mut Element<'_, '_>| {
                let name = el.tag_name();
                if !skip_tags.iter().any(|tag| tag.eq_ignore_ascii_case(&name)) {
                    return Ok(());
                }
                if let Some(handlers) = el.end_tag_handlers() {
                    let depth = Rc::clone(&skipped);
                    depth.set(depth.get() + 1);
                    handlers.push(end_tag!(move |_| {
                        depth.set(depth.get().saturating_sub(1));
                        Ok(())
                    }));
                }
                Ok(())
            })],
            document_content_handlers: vec![doc_text!(|chunk| {
                if skipped.get() > 0 {
                    return Ok(());
                }
                // A text node may arrive in several chunks; typeset it whole.
                pending.push_str(chunk.as_str());
                if chunk.last_in_text_node() {
                    let mut out = String::with_capacity(pending.len());
                    typeset_text(&pending, engine, &pairs, &mut out);
                    chunk.replace(&out, ContentType::Html);
                    pending.clear();
                } else {
                    chunk.remove();
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    );
    result.unwrap_or_else(|error| {
        tracing::warn!(%error, "Cannot typeset math, keeping markup");
        html.to_owned()
    })
}

fn typeset_text(text: &str, engine: &TexEngine, pairs: &[(&str, &str, bool)], out: &mut String) {
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with(r"\$") {
            out.push_str(r"\$");
            i += 2;
            continue;
        }

        let found = pairs.iter().find_map(|&(open, close, display)| {
            let body = rest.strip_prefix(open)?;
            let end = body.find(close)?;
            let tex = &body[..end];
            (!tex.trim().is_empty()).then(|| (open.len() + end + close.len(), tex, display))
        });

        let Some((len, tex, display)) = found else {
            let c_len = rest.chars().next().map_or(1, char::len_utf8);
            out.push_str(&rest[..c_len]);
            i += c_len;
            continue;
        };

        let source = &rest[..len];
        match engine.to_mathml(&unescape_html(tex), display) {
            Ok(mathml) => {
                let class = if display { "math-display" } else { "math-inline" };
                write!(
                    out,
                    r#"<span class="math {class}" data-math-source="{}">{mathml}</span>"#,
                    escape_quote(source)
                )
                .unwrap();
            }
            Err(error) => {
                tracing::debug!(%error, source, "Math expression left as source");
                out.push_str(source);
            }
        }
        i += len;
    }
}

/// Loads the TeX engine, reading the macros file if one is configured.
pub struct MathLibrary {
    macros_file: Option<PathBuf>,
}

impl Library for MathLibrary {
    type Instance = TexEngine;
    const NAME: &'static str = "tex";

    async fn load(&self) -> Result<TexEngine, LoadError> {
        let Some(path) = &self.macros_file else {
            return Ok(TexEngine::default());
        };
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoadError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let macros = TexMacros::parse(&content)?;
        tracing::debug!(count = macros.len(), path = %path.display(), "Loaded TeX macros");
        Ok(TexEngine::new(macros))
    }
}

/// The math pass with its lazily loaded engine.
pub struct MathEnricher {
    loader: LazyLibrary<MathLibrary>,
    delimiters: Delimiters,
    skip_tags: Vec<String>,
}

impl MathEnricher {
    pub fn new(config: MathConfig) -> Self {
        let library = MathLibrary {
            macros_file: config.macros_file,
        };
        Self {
            loader: LazyLibrary::new(library, config.load_timeout),
            delimiters: config.delimiters,
            skip_tags: config.skip_tags,
        }
    }

    pub fn state(&self) -> LoaderState {
        self.loader.state()
    }

    /// Clear earlier output, then typeset. Without an engine the markup is
    /// returned unchanged.
    pub async fn apply_to(&self, html: &str) -> String {
        let Some(engine) = self.loader.ensure_ready().await else {
            return html.to_owned();
        };
        let cleared = clear_typeset(html);
        typeset(&cleared, &engine, &self.delimiters, &self.skip_tags)
    }
}
