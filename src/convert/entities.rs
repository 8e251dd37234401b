//! Character reference decoding
//!
//! Deliberately small: the five XML named references, `&nbsp;`, and
//! semicolon-terminated numeric references. Anything else passes through.

use std::borrow::Cow;

/// Longest reference we look at, `&#x10FFFF;` included
const MAX_REFERENCE_LEN: usize = 12;

/// Decode the supported character references in `s`
///
/// ```
/// use tola_graft::convert::decode_entities;
///
/// assert_eq!(decode_entities("a &amp; b &#x41;"), "a & b A");
/// assert_eq!(decode_entities("&unknown; &amp"), "&unknown; &amp");
/// ```
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match decode_reference(tail) {
            Some((ch, len)) => {
                out.push(ch);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Decode one reference at the start of `tail`, returning it and its length
fn decode_reference(tail: &str) -> Option<(char, usize)> {
    let semi = tail
        .bytes()
        .take(MAX_REFERENCE_LEN)
        .position(|b| b == b';')?;
    let body = &tail[1..semi];

    let ch = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let numeric = body.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => parse_digits(hex, 16)?,
                None => parse_digits(numeric, 10)?,
            };
            char::from_u32(code)?
        }
    };
    Some((ch, semi + 1))
}

fn parse_digits(digits: &str, radix: u32) -> Option<u32> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain", "plain")]
    #[case("&lt;p&gt;", "<p>")]
    #[case("&quot;x&apos;", "\"x'")]
    #[case("a&nbsp;b", "a\u{a0}b")]
    #[case("&#65;&#x42;&#X43;", "ABC")]
    #[case("&#128169;", "\u{1F4A9}")]
    #[case("&amp", "&amp")]
    #[case("&bogus;", "&bogus;")]
    #[case("&#xZZ;", "&#xZZ;")]
    #[case("&#;", "&#;")]
    #[case("&#xD800;", "&#xD800;")]
    #[case("&&amp;", "&&")]
    #[case("é &amp; ü", "é & ü")]
    fn test_decode(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(decode_entities(input), expected);
    }

    #[test]
    fn test_no_reference_borrows() {
        assert!(matches!(decode_entities("nothing here"), Cow::Borrowed(_)));
    }
}
