//! Configuration management for mdview.
//!
//! Parses `mdview.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `server.public_url`
//! - `docs.base_url`
//! - `diagrams.kroki_url`

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub source_dir: Option<PathBuf>,
    pub kroki_url: Option<String>,
    /// Turn the math pass on or off.
    pub math_enabled: Option<bool>,
    /// Admonition label locale, `en` or `zh`.
    pub locale: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdview.toml";

/// Admonition label locales that ship with mdview.
const LOCALES: [&str; 2] = ["en", "zh"];

/// Default enrichment library load timeout.
const DEFAULT_LOAD_TIMEOUT_MS: u64 = 4000;

/// Default Kroki request timeout.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    /// Document settings (paths are relative strings from TOML).
    docs: DocsConfigRaw,
    pub admonitions: AdmonitionsConfig,
    /// Math settings as written in TOML.
    math: MathConfigRaw,
    /// Diagram settings as written in TOML.
    diagrams: DiagramsConfigRaw,
    /// Sidebar entries, in order.
    pub nav: Vec<NavEntry>,

    /// Resolved docs configuration (set after loading).
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
    /// Resolved math configuration (set after loading).
    #[serde(skip)]
    pub math_resolved: MathSettings,
    /// Resolved diagrams configuration (set after loading).
    #[serde(skip)]
    pub diagrams_resolved: DiagramsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public URL of the viewer page. When set, relative asset references
    /// resolve against it instead of the address a request came in on.
    pub public_url: Option<String>,
    /// Site name shown in page titles.
    pub title: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
            public_url: None,
            title: "mdview".to_owned(),
        }
    }
}

impl ServerConfig {
    /// The viewer page URL, explicit or derived from host and port. Used as
    /// the asset base when there is no request, as in `mdview render`.
    #[must_use]
    pub fn page_url(&self) -> String {
        match &self.public_url {
            Some(url) if url.ends_with('/') => url.clone(),
            Some(url) => format!("{url}/"),
            None => format!("http://{}:{}/", self.host, self.port),
        }
    }
}

/// Raw docs configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    source_dir: Option<String>,
    base_url: Option<String>,
    root: Option<String>,
    default_doc: Option<String>,
    markdown: Option<bool>,
}

/// Where documents are fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocSource {
    /// Local directory, also served as the site root.
    Dir(PathBuf),
    /// Remote web server.
    Url(String),
}

/// Resolved documentation configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsConfig {
    pub source: DocSource,
    /// Document paths must start with this prefix; empty allows any path.
    pub root: String,
    /// Document shown when the request names none.
    pub default_doc: String,
    /// Convert Markdown; when off, documents are shown as escaped text.
    pub markdown: bool,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            source: DocSource::Dir(PathBuf::from(".")),
            root: String::new(),
            default_doc: String::new(),
            markdown: true,
        }
    }
}

impl DocsConfig {
    /// The local source directory, if documents are read from disk.
    #[must_use]
    pub fn source_dir(&self) -> Option<&Path> {
        match &self.source {
            DocSource::Dir(dir) => Some(dir),
            DocSource::Url(_) => None,
        }
    }
}

/// Admonition settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AdmonitionsConfig {
    /// Label locale, `en` or `zh`.
    pub locale: String,
    /// Deepest nesting level still recognised.
    pub max_depth: usize,
    /// Per-kind title overrides.
    pub labels: BTreeMap<String, String>,
}

impl Default for AdmonitionsConfig {
    fn default() -> Self {
        Self {
            locale: "en".to_owned(),
            max_depth: 8,
            labels: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct MathConfigRaw {
    enabled: Option<bool>,
    macros_file: Option<String>,
    load_timeout_ms: Option<u64>,
    inline_delimiters: Option<Vec<[String; 2]>>,
    display_delimiters: Option<Vec<[String; 2]>>,
    skip_tags: Option<Vec<String>>,
}

/// Resolved math configuration.
///
/// `None` fields mean "use the enrichment defaults".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathSettings {
    pub enabled: bool,
    pub macros_file: Option<PathBuf>,
    pub load_timeout: Duration,
    pub inline_delimiters: Option<Vec<(String, String)>>,
    pub display_delimiters: Option<Vec<(String, String)>>,
    pub skip_tags: Option<Vec<String>>,
}

impl Default for MathSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            macros_file: None,
            load_timeout: Duration::from_millis(DEFAULT_LOAD_TIMEOUT_MS),
            inline_delimiters: None,
            display_delimiters: None,
            skip_tags: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DiagramsConfigRaw {
    kroki_url: Option<String>,
    load_timeout_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
}

/// Resolved diagram rendering configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramsConfig {
    /// Kroki server URL; diagrams stay as source text without one.
    pub kroki_url: Option<String>,
    pub load_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            kroki_url: None,
            load_timeout: Duration::from_millis(DEFAULT_LOAD_TIMEOUT_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

/// One sidebar entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NavEntry {
    pub title: String,
    /// Document path the entry opens.
    pub doc: String,
    /// Collapsible group the entry belongs to.
    #[serde(default)]
    pub group: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`diagrams.kroki_url`").
        field: String,
        /// Error message (e.g., "${`KROKI_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn require_positive_timeout(timeout: Duration, field: &str) -> Result<(), ConfigError> {
    if timeout.is_zero() {
        return Err(ConfigError::Validation(format!("{field} must be greater than 0")));
    }
    Ok(())
}

fn delimiter_pairs(pairs: Option<&Vec<[String; 2]>>) -> Option<Vec<(String, String)>> {
    pairs.map(|pairs| {
        pairs
            .iter()
            .map(|[open, close]| (open.clone(), close.clone()))
            .collect()
    })
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdview.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the result does not validate.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(source_dir) = &settings.source_dir {
            self.docs_resolved.source = DocSource::Dir(source_dir.clone());
        }
        if let Some(kroki_url) = &settings.kroki_url {
            self.diagrams_resolved.kroki_url = Some(kroki_url.clone());
        }
        if let Some(enabled) = settings.math_enabled {
            self.math_resolved.enabled = enabled;
        }
        if let Some(locale) = &settings.locale {
            self.admonitions.locale.clone_from(locale);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            docs: DocsConfigRaw::default(),
            admonitions: AdmonitionsConfig::default(),
            math: MathConfigRaw::default(),
            diagrams: DiagramsConfigRaw::default(),
            nav: Vec::new(),
            docs_resolved: DocsConfig {
                source: DocSource::Dir(base.to_path_buf()),
                ..DocsConfig::default()
            },
            math_resolved: MathSettings::default(),
            diagrams_resolved: DiagramsConfig::default(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_docs()?;
        self.validate_admonitions()?;
        self.validate_math()?;
        self.validate_diagrams()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 is technically valid (OS assigns a random port), but it's
        // unlikely to be intentional in a config file
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }
        if let Some(url) = &self.server.public_url {
            require_http_url(url, "server.public_url")?;
        }
        Ok(())
    }

    fn validate_docs(&self) -> Result<(), ConfigError> {
        let docs = &self.docs_resolved;
        if let DocSource::Url(url) = &docs.source {
            require_http_url(url, "docs.base_url")?;
        }
        if docs.root.contains("..") {
            return Err(ConfigError::Validation(
                "docs.root cannot contain '..'".to_owned(),
            ));
        }
        if !docs.default_doc.is_empty() {
            if !docs.default_doc.to_ascii_lowercase().ends_with(".md") {
                return Err(ConfigError::Validation(
                    "docs.default_doc must be a .md path".to_owned(),
                ));
            }
            if !docs.default_doc.starts_with(&docs.root) {
                return Err(ConfigError::Validation(format!(
                    "docs.default_doc must be under docs.root ({})",
                    docs.root
                )));
            }
        }
        for (i, entry) in self.nav.iter().enumerate() {
            require_non_empty(&entry.title, &format!("nav[{i}].title"))?;
            require_non_empty(&entry.doc, &format!("nav[{i}].doc"))?;
        }
        Ok(())
    }

    fn validate_admonitions(&self) -> Result<(), ConfigError> {
        if !LOCALES.contains(&self.admonitions.locale.as_str()) {
            return Err(ConfigError::Validation(format!(
                "admonitions.locale must be one of {}",
                LOCALES.join(", ")
            )));
        }
        if self.admonitions.max_depth == 0 {
            return Err(ConfigError::Validation(
                "admonitions.max_depth must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_math(&self) -> Result<(), ConfigError> {
        let math = &self.math_resolved;
        require_positive_timeout(math.load_timeout, "math.load_timeout_ms")?;

        let pairs = math
            .inline_delimiters
            .iter()
            .chain(math.display_delimiters.iter())
            .flatten();
        for (open, close) in pairs {
            if open.is_empty() || close.is_empty() {
                return Err(ConfigError::Validation(
                    "math delimiters cannot be empty".to_owned(),
                ));
            }
        }
        Ok(())
    }

    fn validate_diagrams(&self) -> Result<(), ConfigError> {
        if let Some(ref kroki_url) = self.diagrams_resolved.kroki_url {
            require_non_empty(kroki_url, "diagrams.kroki_url")?;
            require_http_url(kroki_url, "diagrams.kroki_url")?;
        }
        require_positive_timeout(self.diagrams_resolved.load_timeout, "diagrams.load_timeout_ms")?;
        require_positive_timeout(
            self.diagrams_resolved.request_timeout,
            "diagrams.request_timeout_ms",
        )?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;
        expand::expand_opt(&mut self.server.public_url, "server.public_url")?;
        expand::expand_opt(&mut self.docs.base_url, "docs.base_url")?;
        expand::expand_opt(&mut self.diagrams.kroki_url, "diagrams.kroki_url")?;
        Ok(())
    }

    /// Resolve relative paths against the config directory and fill in
    /// defaults.
    fn resolve_paths(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let source = match (&self.docs.source_dir, &self.docs.base_url) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Validation(
                    "docs.source_dir and docs.base_url are mutually exclusive".to_owned(),
                ));
            }
            (_, Some(url)) => DocSource::Url(url.clone()),
            (Some(dir), None) => DocSource::Dir(config_dir.join(dir)),
            (None, None) => DocSource::Dir(config_dir.to_path_buf()),
        };

        self.docs_resolved = DocsConfig {
            source,
            root: self.docs.root.clone().unwrap_or_default(),
            default_doc: self.docs.default_doc.clone().unwrap_or_default(),
            markdown: self.docs.markdown.unwrap_or(true),
        };

        let defaults = MathSettings::default();
        self.math_resolved = MathSettings {
            enabled: self.math.enabled.unwrap_or(defaults.enabled),
            macros_file: self.math.macros_file.as_ref().map(|f| config_dir.join(f)),
            load_timeout: self
                .math
                .load_timeout_ms
                .map_or(defaults.load_timeout, Duration::from_millis),
            inline_delimiters: delimiter_pairs(self.math.inline_delimiters.as_ref()),
            display_delimiters: delimiter_pairs(self.math.display_delimiters.as_ref()),
            skip_tags: self.math.skip_tags.clone(),
        };

        let defaults = DiagramsConfig::default();
        self.diagrams_resolved = DiagramsConfig {
            kroki_url: self.diagrams.kroki_url.clone(),
            load_timeout: self
                .diagrams
                .load_timeout_ms
                .map_or(defaults.load_timeout, Duration::from_millis),
            request_timeout: self
                .diagrams
                .request_timeout_ms
                .map_or(defaults.request_timeout, Duration::from_millis),
        };

        Ok(())
    }
}
