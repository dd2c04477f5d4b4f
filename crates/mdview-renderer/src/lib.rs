//! Markdown-to-HTML rendering for the documentation viewer.
//!
//! A document goes through three steps here:
//!
//! 1. [`AdmonitionTransformer`] rewrites `!!! kind "title"` callout blocks into
//!    HTML containers, converting their bodies with a [`MarkupConverter`].
//! 2. The text is converted to HTML by [`MarkdownConverter`] (a
//!    [`MarkdownRenderer`] over the [`HtmlBackend`]) or, when Markdown is
//!    disabled, by [`PlainTextConverter`].
//! 3. [`AssetRewriter`] resolves relative `src`/`srcset` references against
//!    the page the markup will be shown on.
//!
//! [`DocPath`] validates the document identifier before any of this runs.
//!
//! # Example
//!
//! ```
//! use mdview_renderer::{AdmonitionTransformer, MarkdownConverter, MarkupConverter};
//!
//! let converter = MarkdownConverter::default();
//! let text = AdmonitionTransformer::default()
//!     .transform("!!! note\n    See **below**.\n\nDone.", &converter);
//! let html = converter.convert(&text);
//! assert!(html.contains("md-admonition-note"));
//! assert!(html.ends_with("<p>Done.</p>"));
//! ```

mod admonition;
mod assets;
mod backend;
mod converter;
mod document;
mod html;
mod labels;
mod renderer;
mod state;
mod util;

pub use admonition::{AdmonitionTransformer, Callout, DEFAULT_MAX_DEPTH};
pub use assets::{AssetRewriter, is_external_like, resolve_asset_url, rewrite_srcset};
pub use backend::{AlertKind, RenderBackend};
pub use converter::{MarkdownConverter, MarkupConverter, PlainTextConverter};
pub use document::{DocPath, DocPathError, doc_href};
pub use html::HtmlBackend;
pub use labels::{AdmonitionLabels, DEFAULT_KIND, Locale};
pub use renderer::{MarkdownRenderer, RenderResult};
pub use state::{TocEntry, escape_html};
pub use util::slugify;
