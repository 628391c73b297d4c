/*!
 * URL path segment sanitization
 */

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes escaped in a path segment: everything except RFC 3986 `pchar`
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@');

/// Percent-encode everything outside the RFC 3986 `pchar` set
///
/// Unreserved characters, sub-delimiters, `:`, `@` and well-formed `%XX`
/// triplets pass through unchanged. Every other byte (including `/`, a stray
/// `%` and non-ASCII UTF-8) is emitted as `%XX`, so the output is always a
/// clean segment and sanitizing it again returns it as is.
pub fn sanitize_url_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(idx) = rest.find('%') {
        let (head, tail) = rest.split_at(idx);
        out.extend(utf8_percent_encode(head, PATH_SEGMENT));

        if is_pct_triplet(tail) {
            out.push_str(&tail[..3]);
            rest = &tail[3..];
        } else {
            out.push_str("%25");
            rest = &tail[1..];
        }
    }

    out.extend(utf8_percent_encode(rest, PATH_SEGMENT));
    out
}

/// `%` followed by two hex digits
fn is_pct_triplet(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 3 && bytes[1].is_ascii_hexdigit() && bytes[2].is_ascii_hexdigit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_input_unchanged() {
        assert_eq!(sanitize_url_path("my-bucket.logs_2024~"), "my-bucket.logs_2024~");
        assert_eq!(sanitize_url_path("user@host:8080"), "user@host:8080");
        assert_eq!(sanitize_url_path("my%20bucket"), "my%20bucket");
        assert_eq!(sanitize_url_path("a%2fb"), "a%2fb");
        assert_eq!(sanitize_url_path(""), "");
    }

    #[test]
    fn test_reserved_characters_encoded() {
        assert_eq!(sanitize_url_path("a b"), "a%20b");
        assert_eq!(sanitize_url_path("a/b"), "a%2Fb");
        assert_eq!(sanitize_url_path("q?x#y"), "q%3Fx%23y");
    }

    #[test]
    fn test_stray_percent_encoded() {
        assert_eq!(sanitize_url_path("100%"), "100%25");
        assert_eq!(sanitize_url_path("%zz"), "%25zz");
        assert_eq!(sanitize_url_path("5%2"), "5%252");
        assert_eq!(sanitize_url_path("%%41"), "%25%41");
    }

    #[test]
    fn test_non_ascii_encoded_per_byte() {
        assert_eq!(sanitize_url_path("café"), "caf%C3%A9");
        assert_eq!(sanitize_url_path("ü%41"), "%C3%BC%41");
    }

    #[test]
    fn test_idempotent() {
        for raw in ["Weird Name/ünïcode", "100% off", "my%20bucket", "a%zz b", "%%", "plain"] {
            let once = sanitize_url_path(raw);
            assert_eq!(sanitize_url_path(&once), once, "input {:?}", raw);
        }
    }

    #[test]
    fn test_deterministic() {
        let raw = "Weird Name/ünïcode";
        assert_eq!(sanitize_url_path(raw), sanitize_url_path(raw));
    }
}
