//! Wiring a loaded configuration into a [`Viewer`].

use std::sync::Arc;

use mdview_config::{CliSettings, Config, DiagramsConfig, DocSource, MathSettings};
use mdview_enrich::{DiagramConfig, Enrichers, MathConfig};
use mdview_renderer::{AdmonitionLabels, Locale};
use mdview_site::{Navigation, Viewer, ViewerConfig};
use mdview_storage::{FsStorage, HttpStorage, Storage};
use url::Url;

use crate::commands::CommonArgs;
use crate::error::CliError;

/// Overrides from the shared command-line options.
pub(crate) fn cli_settings(common: &CommonArgs) -> CliSettings {
    CliSettings {
        source_dir: common.source_dir.clone(),
        kroki_url: common.kroki_url.clone(),
        math_enabled: common.no_math.then_some(false),
        locale: common.locale.clone(),
        ..CliSettings::default()
    }
}

/// Build the storage backend, enrichment passes and sidebar.
pub(crate) fn build_viewer(config: &Config) -> Result<Viewer, CliError> {
    let storage: Arc<dyn Storage> = match &config.docs_resolved.source {
        DocSource::Dir(dir) => Arc::new(FsStorage::new(dir.clone())),
        DocSource::Url(url) => Arc::new(HttpStorage::new(url)?),
    };

    let enrichers = Arc::new(Enrichers::new(
        diagram_config(&config.diagrams_resolved),
        math_config(&config.math_resolved),
    ));

    let page_url = config.server.page_url();
    let page_url = Url::parse(&page_url)
        .map_err(|e| CliError::Validation(format!("Invalid page URL {page_url}: {e}")))?;
    let public_url = config.server.public_url.is_some().then(|| page_url.clone());

    let locale = Locale::parse(&config.admonitions.locale).unwrap_or_default();
    let labels = config
        .admonitions
        .labels
        .iter()
        .fold(AdmonitionLabels::new(locale), |labels, (kind, label)| {
            labels.with_override(kind.as_str(), label.as_str())
        });

    let viewer_config = ViewerConfig {
        root: config.docs_resolved.root.clone(),
        default_doc: config.docs_resolved.default_doc.clone(),
        markdown: config.docs_resolved.markdown,
        locale,
        labels,
        max_depth: config.admonitions.max_depth,
        public_url,
        ..ViewerConfig::new(page_url)
    };

    let navigation = navigation(config, storage.as_ref());
    Ok(Viewer::new(storage, enrichers, viewer_config).with_navigation(navigation))
}

/// Configured entries, or every document the storage lists below the root.
fn navigation(config: &Config, storage: &dyn Storage) -> Navigation {
    if !config.nav.is_empty() {
        return Navigation::from_entries(
            config
                .nav
                .iter()
                .map(|entry| (entry.title.as_str(), entry.doc.as_str(), entry.group.clone())),
        );
    }

    let root = &config.docs_resolved.root;
    match storage.list(root) {
        Ok(listings) => Navigation::from_listings(listings, root),
        Err(error) => {
            tracing::warn!(
                %error,
                backend = %storage.describe(),
                "Cannot list documents for the sidebar"
            );
            Navigation::default()
        }
    }
}

fn diagram_config(settings: &DiagramsConfig) -> DiagramConfig {
    DiagramConfig {
        kroki_url: settings.kroki_url.clone(),
        load_timeout: settings.load_timeout,
        request_timeout: settings.request_timeout,
    }
}

fn math_config(settings: &MathSettings) -> Option<MathConfig> {
    if !settings.enabled {
        return None;
    }

    let mut config = MathConfig {
        macros_file: settings.macros_file.clone(),
        load_timeout: settings.load_timeout,
        ..MathConfig::default()
    };
    if let Some(inline) = &settings.inline_delimiters {
        config.delimiters.inline.clone_from(inline);
    }
    if let Some(display) = &settings.display_delimiters {
        config.delimiters.display.clone_from(display);
    }
    if let Some(skip_tags) = &settings.skip_tags {
        config.skip_tags.clone_from(skip_tags);
    }
    Some(config)
}
