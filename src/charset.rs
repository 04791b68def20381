//! Character encoding detection and decoding for byte input
//!
//! Saved pages and raw HTTP bodies arrive as bytes. Before the pipeline can
//! look at them they are decoded to UTF-8 using a three-level cascade:
//!
//! 1. **Content-Type header**: `charset` parameter, when the caller has one
//! 2. **HTML meta tags**: `<meta charset>` or `<meta http-equiv="Content-Type">`
//!    within the first 1024 bytes
//! 3. **Default**: UTF-8
//!
//! # Examples
//!
//! ```rust
//! use content_markdown_converter::charset::{decode_html, detect_charset};
//!
//! assert_eq!(detect_charset(Some("text/html; charset=iso-8859-1"), b""), "ISO-8859-1");
//!
//! let text = decode_html(b"<p>Caf\xE9</p>", Some("text/html; charset=ISO-8859-1")).unwrap();
//! assert_eq!(text, "<p>Café</p>");
//! ```

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::DecodeError;

/// Default charset when detection fails
const DEFAULT_CHARSET: &str = "UTF-8";

/// Maximum bytes to scan for meta charset tags
const META_SCAN_LIMIT: usize = 1024;

/// Detect the character encoding of `html`, normalized to uppercase.
///
/// Always returns a label; falls back to UTF-8 when neither the header nor
/// the document declares one.
pub fn detect_charset(content_type: Option<&str>, html: &[u8]) -> String {
    content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(html))
        .map(|charset| charset.to_uppercase())
        .unwrap_or_else(|| DEFAULT_CHARSET.to_string())
}

/// Decode `html` to UTF-8 using the detected charset.
///
/// UTF-8 input is borrowed, everything else is transcoded with `encoding_rs`.
/// Invalid sequences are an error rather than being replaced, so a page that
/// lies about its encoding is reported instead of silently garbled.
pub fn decode_html<'a>(
    html: &'a [u8],
    content_type: Option<&str>,
) -> Result<Cow<'a, str>, DecodeError> {
    let charset = detect_charset(content_type, html);

    if charset == DEFAULT_CHARSET || charset == "UTF8" {
        let html = html.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(html);
        return std::str::from_utf8(html)
            .map(Cow::Borrowed)
            .map_err(|e| DecodeError::InvalidBytes {
                charset,
                position: Some(e.valid_up_to()),
            });
    }

    let encoding = encoding_rs::Encoding::for_label(charset.as_bytes())
        .ok_or_else(|| DecodeError::UnsupportedCharset(charset.clone()))?;

    encoding
        .decode_without_bom_handling_and_without_replacement(html)
        .ok_or(DecodeError::InvalidBytes {
            charset,
            position: None,
        })
}

/// Extract the `charset` parameter of a Content-Type header value.
///
/// Accepts quoted values, missing spaces and trailing parameters:
/// `text/html;charset="UTF-8"; boundary=x`.
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    static CHARSET_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = CHARSET_REGEX
        .get_or_init(|| Regex::new(r#"(?i)charset\s*=\s*"?([^";,\s]+)"?"#).ok())
        .as_ref()?;

    regex
        .captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Scan the start of the document for a meta charset declaration.
pub fn charset_from_meta(html: &[u8]) -> Option<String> {
    let prefix = &html[..html.len().min(META_SCAN_LIMIT)];
    // Lossy is fine here: the declaration itself is ASCII
    let prefix = String::from_utf8_lossy(prefix);

    static HTML5_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    static HTML4_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

    let html5 = HTML5_REGEX
        .get_or_init(|| Regex::new(r#"(?i)<meta\s+charset\s*=\s*"?([^";>\s]+)"?"#).ok())
        .as_ref()?;
    if let Some(m) = html5.captures(&prefix).and_then(|caps| caps.get(1)) {
        return Some(m.as_str().to_string());
    }

    let html4 = HTML4_REGEX
        .get_or_init(|| {
            Regex::new(
                r#"(?i)<meta\s+http-equiv\s*=\s*"?Content-Type"?\s+content\s*=\s*"?[^">]*charset\s*=\s*([^";>\s]+)"?"#,
            )
            .ok()
        })
        .as_ref()?;
    html4
        .captures(&prefix)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
