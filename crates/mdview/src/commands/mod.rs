//! CLI command implementations.

use std::path::PathBuf;

use clap::Args;

pub(crate) mod render;
pub(crate) mod serve;

pub(crate) use render::RenderArgs;
pub(crate) use serve::ServeArgs;

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct CommonArgs {
    /// Path to configuration file (default: auto-discover mdview.toml).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Documents source directory (overrides config).
    #[arg(short, long)]
    pub source_dir: Option<PathBuf>,

    /// Kroki server URL for diagram rendering (overrides config).
    #[arg(long, env = "MDVIEW_KROKI_URL")]
    pub kroki_url: Option<String>,

    /// Callout label language, `en` or `zh` (overrides config).
    #[arg(long)]
    pub locale: Option<String>,

    /// Disable the math pass.
    #[arg(long)]
    pub no_math: bool,

    /// Enable verbose output (render timing and enrichment warnings).
    #[arg(short, long)]
    pub verbose: bool,
}
