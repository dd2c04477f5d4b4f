//! Internal constants for the enrichment passes.

use std::time::Duration;

/// How long a library load may take before it is treated as failed
/// (forty checks at 100 ms intervals in the page script this replaces).
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_millis(4000);

/// HTTP timeout for a single Kroki request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Elements whose text is never scanned for math.
pub const DEFAULT_SKIP_TAGS: [&str; 6] = ["script", "noscript", "style", "textarea", "pre", "code"];

/// Mermaid theme variables applied to every diagram.
pub const MERMAID_THEME_VARIABLES: [(&str, &str); 18] = [
    ("background", "#ffffff"),
    ("primaryColor", "#e8f3f7"),
    ("primaryTextColor", "#1d2833"),
    ("primaryBorderColor", "#1f6f8b"),
    ("secondaryColor", "#e8eef9"),
    ("secondaryTextColor", "#1d2833"),
    ("secondaryBorderColor", "#2f5ea8"),
    ("tertiaryColor", "#e7f6f1"),
    ("tertiaryTextColor", "#1d2833"),
    ("tertiaryBorderColor", "#2f8f73"),
    ("lineColor", "#4e6273"),
    ("defaultLinkColor", "#4e6273"),
    ("edgeLabelBackground", "#ffffff"),
    ("clusterBkg", "#f8fbff"),
    ("clusterBorder", "#c5882a"),
    ("nodeBorder", "#1f6f8b"),
    ("mainBkg", "#ffffff"),
    ("fontFamily", "HarmonyOS Sans Black, sans-serif"),
];
