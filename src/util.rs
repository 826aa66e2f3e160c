//! Text decoding helpers.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<meta charset>` or a
///    `Content-Type` header)
/// 3. Falls back to Windows-1252 (the web's de facto legacy default)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Find the charset declared by a `<meta>` tag near the start of a document.
///
/// Recognizes both `<meta charset="...">` and the
/// `<meta http-equiv="Content-Type" content="text/html; charset=...">` form.
pub fn sniff_html_charset(bytes: &[u8]) -> Option<&str> {
    // Browsers look at the first 1024 bytes
    let check_len = bytes.len().min(1024);
    let prefix = &bytes[..check_len];

    let pos = prefix
        .windows(8)
        .position(|w| w.eq_ignore_ascii_case(b"charset="))?;
    let mut value = &prefix[pos + 8..];

    let quote = match value.first() {
        Some(&q @ (b'"' | b'\'')) => {
            value = &value[1..];
            Some(q)
        }
        _ => None,
    };

    let end = value
        .iter()
        .position(|&b| match quote {
            Some(q) => b == q,
            None => b == b'"' || b == b'\'' || b == b';' || b == b'>' || b.is_ascii_whitespace(),
        })
        .unwrap_or(value.len());

    let label = std::str::from_utf8(&value[..end]).ok()?.trim();
    (!label.is_empty()).then_some(label)
}

/// Charset parameter of a `Content-Type` header value.
#[cfg_attr(not(feature = "http"), allow(dead_code))]
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}
