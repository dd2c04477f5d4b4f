//! `mdview render` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use mdview_config::Config;
use mdview_enrich::LoaderState;

use crate::commands::CommonArgs;
use crate::error::CliError;
use crate::output::Output;
use crate::setup::{build_viewer, cli_settings};

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Document path, as it would appear in `?doc=` (default: the configured
    /// default document).
    doc: Option<String>,

    /// Write the HTML to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the path is invalid or the
    /// document cannot be fetched.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let settings = cli_settings(&self.common);
        let config = Config::load(self.common.config.as_deref(), Some(&settings))?;
        let viewer = build_viewer(&config)?;

        let raw = self
            .doc
            .unwrap_or_else(|| config.docs_resolved.default_doc.clone());
        let view = viewer.render(&raw, None).await?;

        if viewer.enrichers().math_state() == Some(LoaderState::Failed) {
            output.warning("Math library failed to load; expressions left as source");
        }

        match &self.output {
            Some(path) => {
                std::fs::write(path, &view.html)?;
                output.info(&format!("Wrote {} to {}", view.doc, path.display()));
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(view.html.as_bytes())?;
                stdout.write_all(b"\n")?;
            }
        }

        Ok(())
    }
}
