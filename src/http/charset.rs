// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Character encoding detection for response bodies
//!
//! Detection order: byte order mark, `charset` parameter of the declared
//! content type, `<meta>` prescan of the first 1024 bytes, then a UTF-8
//! validity check falling back to windows-1252.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252, X_USER_DEFINED};
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

const PRESCAN_LIMIT: usize = 1024;

lazy_static! {
    static ref META_CHARSET: Regex =
        Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#).unwrap();
}

/// Best-guess encoding for `content` served with `content_type`
pub fn sniff_encoding(content: &[u8], content_type: &str) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(content) {
        return encoding;
    }

    if let Some(encoding) = charset_param(content_type).and_then(|l| Encoding::for_label(l.as_bytes())) {
        return encoding;
    }

    let head = &content[..content.len().min(PRESCAN_LIMIT)];
    if let Some(encoding) = prescan_meta(head) {
        return encoding;
    }

    if head.iter().any(|b| *b >= 0x80) && is_utf8_prefix(head) {
        UTF_8
    } else {
        WINDOWS_1252
    }
}

/// Decode `content` as `encoding`, failing on malformed sequences.
///
/// A leading byte order mark for the same encoding is stripped.
pub fn decode_text(content: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, had_errors) = encoding.decode_with_bom_removal(content);
    if had_errors {
        return Err(Error::decode(
            label(encoding),
            "byte sequence is not valid for the encoding",
        ));
    }
    Ok(text.into_owned())
}

/// Canonical lowercase label of an encoding
pub fn label(encoding: &'static Encoding) -> String {
    encoding.name().to_ascii_lowercase()
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').trim_matches('\'').to_string())
        } else {
            None
        }
    })
}

fn prescan_meta(head: &[u8]) -> Option<&'static Encoding> {
    let text = String::from_utf8_lossy(head);
    let label = META_CHARSET.captures(&text)?.get(1)?.as_str();
    let encoding = Encoding::for_label(label.as_bytes())?;
    // A meta tag can only be read if the page is ASCII compatible
    if encoding == UTF_16LE || encoding == UTF_16BE {
        Some(UTF_8)
    } else if encoding == X_USER_DEFINED {
        Some(WINDOWS_1252)
    } else {
        Some(encoding)
    }
}

/// Valid UTF-8, ignoring a sequence cut off by the prescan limit
fn is_utf8_prefix(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none() && bytes.len() == PRESCAN_LIMIT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{EUC_JP, SHIFT_JIS};

    #[test]
    fn test_bom_wins() {
        let body = b"\xEF\xBB\xBFhello";
        assert_eq!(sniff_encoding(body, "text/html; charset=shift_jis"), UTF_8);
    }

    #[test]
    fn test_content_type_charset() {
        assert_eq!(sniff_encoding(b"abc", "text/html; charset=Shift_JIS"), SHIFT_JIS);
        assert_eq!(sniff_encoding(b"abc", "text/plain; charset=\"euc-jp\""), EUC_JP);
    }

    #[test]
    fn test_meta_prescan() {
        let body = br#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=euc-jp"></head>"#;
        assert_eq!(sniff_encoding(body, "text/html"), EUC_JP);

        let body = br#"<meta charset="utf-16">"#;
        assert_eq!(sniff_encoding(body, ""), UTF_8);
    }

    #[test]
    fn test_heuristic() {
        assert_eq!(sniff_encoding("héllo".as_bytes(), ""), UTF_8);
        assert_eq!(sniff_encoding(b"h\xe9llo", ""), WINDOWS_1252);
        assert_eq!(sniff_encoding(b"plain ascii", "application/json"), WINDOWS_1252);
    }

    #[test]
    fn test_decode_text() {
        let (bytes, _, _) = SHIFT_JIS.encode("こんにちは");
        assert_eq!(decode_text(&bytes, SHIFT_JIS).unwrap(), "こんにちは");
        assert_eq!(decode_text(b"caf\xe9", WINDOWS_1252).unwrap(), "café");
        assert_eq!(decode_text(b"\xEF\xBB\xBFok", UTF_8).unwrap(), "ok");
    }

    #[test]
    fn test_decode_rejects_invalid_bytes() {
        let err = decode_text(b"bad \xff\xfe bytes", UTF_8).unwrap_err();
        assert!(matches!(err, Error::Decode { ref encoding, .. } if encoding == "utf-8"));
    }

    #[test]
    fn test_label() {
        assert_eq!(label(UTF_8), "utf-8");
        assert_eq!(label(WINDOWS_1252), "windows-1252");
    }
}
