//! Text helpers for working on rendered markup.

/// Decode the entities the renderer and common HTML produce.
///
/// Named entities beyond the basic five are left as they are.
pub(crate) fn unescape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let decoded = rest
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Escape a value for a double-quoted attribute that already holds markup
/// text: only the quote needs encoding.
pub(crate) fn escape_quote(s: &str) -> String {
    s.replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_named_and_numeric() {
        assert_eq!(unescape_html("a &lt; b &amp;&amp; c&#10;d"), "a < b && c\nd");
        assert_eq!(unescape_html("it&#x27;s &quot;x&quot;"), "it's \"x\"");
    }

    #[test]
    fn test_unescape_leaves_unknown() {
        assert_eq!(unescape_html("&nbsp; & &foo"), "&nbsp; & &foo");
    }

    #[test]
    fn test_escape_quote() {
        assert_eq!(escape_quote(r#"say "hi""#), "say &quot;hi&quot;");
    }
}
