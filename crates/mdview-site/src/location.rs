//! Which document a request asks for.
//!
//! The `doc` query parameter wins, then a legacy `#doc=` fragment, then the
//! configured default document. Values are percent-decoded once more after
//! query decoding, so links that were encoded twice still resolve.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use url::form_urlencoded;

/// The raw document identifier requested by `query` and `fragment`.
///
/// `query` is the part after `?` and `fragment` the part after `#`, both
/// without their leading character. The result still needs validation.
#[must_use]
pub fn requested_doc(query: Option<&str>, fragment: Option<&str>, default_doc: &str) -> String {
    if let Some(doc) = query.and_then(doc_from_query) {
        return doc;
    }
    if let Some(encoded) = fragment.and_then(|f| f.strip_prefix("doc=")) {
        return decode_component(encoded).into_owned();
    }
    default_doc.to_owned()
}

/// First non-empty `doc` parameter of a query string.
fn doc_from_query(query: &str) -> Option<String> {
    let (_, value) = form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == "doc" && !value.is_empty())?;
    Some(decode_component(&value).into_owned())
}

/// Percent-decode, keeping the input when it is not valid UTF-8 afterwards.
fn decode_component(value: &str) -> Cow<'_, str> {
    match percent_decode_str(value).decode_utf8() {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(value),
    }
}
