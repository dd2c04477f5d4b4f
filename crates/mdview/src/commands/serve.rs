//! `mdview serve` command implementation.

use std::path::Path;
use std::sync::Arc;

use clap::Args;
use mdview_config::{CliSettings, Config, DocSource};
use mdview_server::{ServerConfig, run_server};

use crate::commands::CommonArgs;
use crate::error::CliError;
use crate::output::Output;
use crate::setup::{build_viewer, cli_settings};

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            ..cli_settings(&self.common)
        };
        let config = Config::load(self.common.config.as_deref(), Some(&cli_settings))?;

        output.heading(&format!("mdview {version}"));
        output.field("Viewer", config.server.page_url());
        match &config.docs_resolved.source {
            DocSource::Dir(dir) => output.field("Source directory", dir.display()),
            DocSource::Url(url) => output.field("Documents from", url),
        }
        output.field(
            "Diagrams",
            config
                .diagrams_resolved
                .kroki_url
                .as_deref()
                .unwrap_or("disabled (no kroki_url in config)"),
        );
        output.field(
            "Math",
            if config.math_resolved.enabled { "enabled" } else { "disabled" },
        );

        let viewer = build_viewer(&config)?;
        if viewer.navigation().is_empty() {
            output.warning("Sidebar is empty: no [[nav]] entries and no documents listed");
        }
        if config.docs_resolved.default_doc.is_empty() {
            output.warning("No default_doc configured: `/` without ?doc= shows an error");
        }

        let server_config = ServerConfig {
            host: config.server.host.clone(),
            port: config.server.port,
            static_dir: config.docs_resolved.source_dir().map(Path::to_path_buf),
            site_title: config.server.title.clone(),
            version: version.to_owned(),
        };
        run_server(server_config, Arc::new(viewer)).await?;

        Ok(())
    }
}
