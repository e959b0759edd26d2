// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Query string helper

use std::collections::BTreeMap;

use super::body::{encode_form, FormData};

/// Append form-encoded `params` to `base` as a query string.
///
/// Keys are sorted, so the same parameters always give the same URL.
pub fn make_url<I, K, V>(base: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut data: FormData = BTreeMap::new();
    for (k, v) in params {
        data.entry(k.into()).or_default().push(v.into());
    }
    if data.is_empty() {
        return base.to_string();
    }
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base, separator, encode_form(&data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_make_url() {
        let params: HashMap<&str, &str> = [("hij", "klm"), ("abc", "def")].into_iter().collect();
        assert_eq!(
            make_url("http://example.com/search", params),
            "http://example.com/search?abc=def&hij=klm"
        );
    }

    #[test]
    fn test_make_url_escapes_and_appends() {
        assert_eq!(
            make_url("http://example.com/?page=1", [("q", "a b&c")]),
            "http://example.com/?page=1&q=a+b%26c"
        );
        let empty: [(&str, &str); 0] = [];
        assert_eq!(make_url("http://example.com/", empty), "http://example.com/");
    }
}
