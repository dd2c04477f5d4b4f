//! HTTP request handlers.

pub(crate) mod navigation;
pub(crate) mod page;
pub(crate) mod render;

use axum::http::{HeaderMap, header};
use url::Url;

/// Path the viewer page is served at.
pub(crate) const VIEWER_PATH: &str = "/";

/// The URL the browser sees for the viewer page, from the `Host` and
/// `X-Forwarded-Proto` headers.
///
/// Returns `None` when there is no usable `Host` header.
pub(crate) fn page_location(headers: &HeaderMap) -> Option<Url> {
    let host = headers.get(header::HOST)?.to_str().ok()?.trim();
    if host.is_empty() {
        return None;
    }
    let scheme = match headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
    {
        Some(proto) if proto.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    };

    let url = Url::parse(&format!("{scheme}://{host}{VIEWER_PATH}")).ok()?;
    // A Host value carrying a path, query or credentials is not a host.
    (url.path() == VIEWER_PATH
        && url.query().is_none()
        && url.username().is_empty()
        && url.host_str().is_some())
    .then_some(url)
}
