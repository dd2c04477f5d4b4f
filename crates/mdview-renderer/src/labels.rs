//! Localized default titles for callout kinds.

use std::collections::HashMap;

/// Callout kind used when a marker names an unusable kind.
pub const DEFAULT_KIND: &str = "note";

/// Built-in label sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    /// Parse a locale tag such as `en`, `zh` or `zh-CN`.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag.split(['-', '_']).next().unwrap_or_default();
        match primary.to_ascii_lowercase().as_str() {
            "en" => Some(Self::En),
            "zh" => Some(Self::Zh),
            _ => None,
        }
    }

    /// Primary language tag, as used in `lang` attributes.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }

    fn builtin(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::En => &[
                ("info", "Info"),
                ("note", "Note"),
                ("tip", "Tip"),
                ("warning", "Warning"),
                ("danger", "Danger"),
                ("success", "Success"),
                ("error", "Error"),
            ],
            Self::Zh => &[
                ("info", "信息"),
                ("note", "说明"),
                ("tip", "提示"),
                ("warning", "警告"),
                ("danger", "危险"),
                ("success", "成功"),
                ("error", "错误"),
            ],
        }
    }
}

/// Default callout titles keyed by kind.
///
/// Unknown kinds fall back to the label of [`DEFAULT_KIND`].
///
/// # Example
///
/// ```
/// use mdview_renderer::{AdmonitionLabels, Locale};
///
/// let labels = AdmonitionLabels::new(Locale::Zh).with_override("tip", "小贴士");
/// assert_eq!(labels.label("warning"), "警告");
/// assert_eq!(labels.label("tip"), "小贴士");
/// assert_eq!(labels.label("custom-kind"), "说明");
/// ```
#[derive(Clone, Debug)]
pub struct AdmonitionLabels {
    labels: HashMap<String, String>,
}

impl AdmonitionLabels {
    #[must_use]
    pub fn new(locale: Locale) -> Self {
        let labels = locale
            .builtin()
            .iter()
            .map(|(kind, label)| ((*kind).to_owned(), (*label).to_owned()))
            .collect();
        Self { labels }
    }

    /// Replace the label for one kind.
    #[must_use]
    pub fn with_override(mut self, kind: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels
            .insert(kind.into().to_ascii_lowercase(), label.into());
        self
    }

    /// Label for `kind`, or the default kind's label when unknown.
    #[must_use]
    pub fn label(&self, kind: &str) -> &str {
        self.labels
            .get(kind)
            .or_else(|| self.labels.get(DEFAULT_KIND))
            .map_or(DEFAULT_KIND, String::as_str)
    }
}

impl Default for AdmonitionLabels {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}
