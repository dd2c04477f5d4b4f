//! Deferred enrichment of rendered documents.
//!
//! Two passes run over the HTML the renderer produced:
//! - [`DiagramEnricher`] turns Mermaid code blocks into inline SVG rendered
//!   by a Kroki server
//! - [`MathEnricher`] converts delimited TeX to MathML
//!
//! Each pass owns a [`LazyLibrary`] that is loaded on first use and shared by
//! every later render. A library that fails to load, or takes longer than its
//! timeout, leaves the markup untouched from then on.
//!
//! # Example
//!
//! ```ignore
//! use mdview_enrich::{DiagramConfig, Enrichers, MathConfig};
//!
//! let enrichers = Enrichers::new(DiagramConfig::default(), Some(MathConfig::default()));
//! let html = enrichers.apply("<p>$e^{i\\pi} = -1$</p>").await;
//! ```

mod consts;
mod diagrams;
mod kroki;
mod loader;
mod math;
mod text;

pub use consts::{DEFAULT_LOAD_TIMEOUT, DEFAULT_SKIP_TAGS, DEFAULT_TIMEOUT};
pub use diagrams::{DiagramConfig, DiagramEnricher, DiagramHosts, DiagramLibrary, mermaid_init_directive};
pub use kroki::{DiagramError, DiagramErrorKind, DiagramRequest, KrokiClient, RenderedSvg};
pub use loader::{LazyLibrary, Library, LoadError, LoaderState};
pub use math::{Delimiters, MathConfig, MathEnricher, MathLibrary, TexEngine, TexMacros, clear_typeset, typeset};

/// All enrichment passes of a viewer.
pub struct Enrichers {
    diagrams: DiagramEnricher,
    math: Option<MathEnricher>,
}

impl Enrichers {
    /// Create the passes. `math` is `None` when math is switched off.
    pub fn new(diagrams: DiagramConfig, math: Option<MathConfig>) -> Self {
        Self {
            diagrams: DiagramEnricher::new(diagrams),
            math: math.map(MathEnricher::new),
        }
    }

    pub fn diagram_state(&self) -> LoaderState {
        self.diagrams.state()
    }

    pub fn math_state(&self) -> Option<LoaderState> {
        self.math.as_ref().map(MathEnricher::state)
    }

    /// Run the diagram pass, then the math pass.
    pub async fn apply(&self, html: &str) -> String {
        let html = self.diagrams.apply_to(html).await;
        match &self.math {
            Some(math) => math.apply_to(&html).await,
            None => html,
        }
    }
}
