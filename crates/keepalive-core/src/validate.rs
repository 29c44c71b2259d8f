//! Endpoint URL validation.

/// Whether `text` is eligible to be registered as an endpoint.
///
/// Accepts `http://` or `https://` (scheme case-insensitive) followed by one
/// or more non-whitespace characters, and nothing else. No host checks.
/// Whitespace is the ECMAScript `\s` set.
pub fn is_valid_endpoint(text: &str) -> bool {
    let rest = strip_scheme(text, "https://").or_else(|| strip_scheme(text, "http://"));
    match rest {
        Some(rest) => !rest.is_empty() && !rest.chars().any(is_url_whitespace),
        None => false,
    }
}

/// ECMAScript whitespace plus line terminators: Unicode `White_Space` with
/// U+FEFF (BOM) added and U+0085 (NEL) removed.
pub(crate) fn is_url_whitespace(c: char) -> bool {
    c == '\u{FEFF}' || (c != '\u{0085}' && c.is_whitespace())
}

fn strip_scheme<'a>(text: &'a str, scheme: &str) -> Option<&'a str> {
    let head = text.get(..scheme.len())?;
    head.eq_ignore_ascii_case(scheme)
        .then(|| &text[scheme.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(is_valid_endpoint("https://example.com"));
        assert!(is_valid_endpoint("http://example.com/health?x=1"));
        assert!(is_valid_endpoint("http://a"));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert!(is_valid_endpoint("HTTPS://example.com"));
        assert!(is_valid_endpoint("Http://example.com"));
    }

    #[test]
    fn no_host_checks() {
        assert!(is_valid_endpoint("https://not_a_host!!"));
        assert!(is_valid_endpoint("https:///path"));
    }

    #[test]
    fn rejects_bare_scheme() {
        assert!(!is_valid_endpoint("https://"));
        assert!(!is_valid_endpoint("http://"));
    }

    #[test]
    fn rejects_whitespace_anywhere_after_scheme() {
        assert!(!is_valid_endpoint("https://example.com /x"));
        assert!(!is_valid_endpoint("https://example.com\n"));
        assert!(!is_valid_endpoint(" https://example.com"));
    }

    #[test]
    fn whitespace_set_matches_ecmascript() {
        let spaces = [
            '\t', '\u{000B}', '\u{000C}', '\r', '\u{00A0}', '\u{1680}', '\u{2003}', '\u{2028}',
            '\u{2029}', '\u{202F}', '\u{3000}', '\u{FEFF}',
        ];
        for ws in spaces {
            assert!(!is_valid_endpoint(&format!("https://a.test{ws}x")), "{ws:?}");
        }
        assert!(is_valid_endpoint("https://a.test\u{0085}x"));
        assert!(is_valid_endpoint("https://a.test\u{200B}x"));
    }

    #[test]
    fn rejects_other_text() {
        assert!(!is_valid_endpoint(""));
        assert!(!is_valid_endpoint("/list"));
        assert!(!is_valid_endpoint("/check"));
        assert!(!is_valid_endpoint("ftp://example.com"));
        assert!(!is_valid_endpoint("example.com"));
        assert!(!is_valid_endpoint("httpx://example.com"));
    }

    #[test]
    fn multibyte_input_does_not_panic() {
        assert!(!is_valid_endpoint("ｈｔｔｐｓ://例え.jp"));
        assert!(is_valid_endpoint("https://例え.jp"));
    }
}
