//! Security headers added to every response.

use axum::http::HeaderValue;
use axum::http::header::HeaderName;
use tower_http::set_header::SetResponseHeaderLayer;

/// Diagrams arrive as inline SVG and math as MathML, so inline styles stay
/// allowed. Documents may embed images from anywhere.
pub(crate) const CSP: &str = "default-src 'self'; \
                              script-src 'self'; \
                              style-src 'self' 'unsafe-inline'; \
                              font-src 'self' data:; \
                              img-src 'self' data: https:; \
                              connect-src 'self'; \
                              frame-ancestors 'none'";

/// Headers and their fixed values, in the order they are layered.
pub(crate) const HEADERS: [(&str, &str); 3] = [
    ("content-security-policy", CSP),
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
];

/// Layer that sets `name` on every response, replacing any value a handler
/// produced.
pub(crate) fn header_layer(
    name: &'static str,
    value: &'static str,
) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static(name),
        HeaderValue::from_static(value),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_value() {
        assert!(CSP.contains("script-src 'self'"));
        assert!(CSP.contains("img-src 'self' data: https:"));
        assert!(CSP.contains("frame-ancestors 'none'"));
    }

    #[test]
    fn test_header_names_are_lowercase() {
        // `HeaderName::from_static` panics on uppercase input.
        for (name, _) in HEADERS {
            assert_eq!(name, name.to_ascii_lowercase());
        }
    }
}
