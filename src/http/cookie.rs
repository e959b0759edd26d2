// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cookie jar used as the transport's cookie provider
//!
//! The jar is plugged into `reqwest` through [`CookieStore`], so Set-Cookie
//! headers received during a redirect chain are stored and replayed on the
//! following hops.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use url::Url;

/// A single HTTP cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain the cookie belongs to
    pub domain: String,
    /// Set without a `Domain` attribute: only sent back to the exact host
    #[serde(default)]
    pub host_only: bool,
    /// Path the cookie is valid for
    pub path: String,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// Secure flag (HTTPS only)
    pub secure: bool,
    /// HttpOnly flag
    pub http_only: bool,
    /// SameSite attribute
    pub same_site: SameSite,
}

/// SameSite cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SameSite {
    /// Cookie sent with all requests
    #[default]
    None,
    /// Cookie sent with same-site and top-level navigations
    Lax,
    /// Cookie only sent with same-site requests
    Strict,
}

impl Cookie {
    /// Create a new cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            host_only: false,
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
            same_site: SameSite::default(),
        }
    }

    /// Set the domain; the cookie also matches its subdomains
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self.host_only = false;
        self
    }

    /// Set the path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set expiration time
    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Check if the cookie is expired
    pub fn is_expired(&self) -> bool {
        self.expires.map_or(false, |exp| exp <= Utc::now())
    }

    /// Check if the cookie should be sent to the given URL
    pub fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("");
        if !self.domain_matches(host) {
            return false;
        }

        if !path_matches(url.path(), &self.path) {
            return false;
        }

        if self.secure && url.scheme() != "https" {
            return false;
        }

        !self.is_expired()
    }

    fn domain_matches(&self, host: &str) -> bool {
        if self.domain.is_empty() {
            return true;
        }

        if self.host_only {
            return host.eq_ignore_ascii_case(&self.domain);
        }
        host_in_domain(host, &self.domain)
    }

    /// Parse a Set-Cookie header value received from `url`.
    ///
    /// Returns `None` when the header is malformed or its `Domain` does not
    /// cover the responding host.
    pub fn parse(header: &str, url: &Url) -> Option<Self> {
        let mut parts = header.split(';');
        let first = parts.next()?.trim();

        let (name, value) = first.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut cookie = Cookie::new(name, value.trim().trim_matches('"'));

        let host = url.host_str().unwrap_or("");
        cookie.domain = host.to_ascii_lowercase();
        cookie.host_only = true;
        cookie.path = default_path(url);

        let mut max_age_set = false;
        for part in parts {
            let part = part.trim();
            if let Some((attr, val)) = part.split_once('=') {
                let attr = attr.trim().to_lowercase();
                let val = val.trim();
                match attr.as_str() {
                    "domain" if !val.trim_start_matches('.').is_empty() => {
                        cookie.domain = val.trim_start_matches('.').to_lowercase();
                        cookie.host_only = false;
                    }
                    "path" if val.starts_with('/') => cookie.path = val.to_string(),
                    "expires" if !max_age_set => {
                        if let Ok(dt) = DateTime::parse_from_rfc2822(val) {
                            cookie.expires = Some(dt.with_timezone(&Utc));
                        }
                    }
                    "max-age" => {
                        if let Ok(secs) = val.parse::<i64>() {
                            max_age_set = true;
                            cookie.expires = Some(if secs <= 0 {
                                DateTime::<Utc>::MIN_UTC
                            } else {
                                Utc::now() + chrono::Duration::seconds(secs)
                            });
                        }
                    }
                    "samesite" => {
                        cookie.same_site = match val.to_lowercase().as_str() {
                            "strict" => SameSite::Strict,
                            "lax" => SameSite::Lax,
                            _ => SameSite::None,
                        };
                    }
                    _ => {}
                }
            } else {
                match part.to_lowercase().as_str() {
                    "secure" => cookie.secure = true,
                    "httponly" => cookie.http_only = true,
                    _ => {}
                }
            }
        }

        if !cookie.host_only && !host_in_domain(host, &cookie.domain) {
            tracing::debug!(
                name = %cookie.name,
                domain = %cookie.domain,
                %host,
                "rejecting cookie for foreign domain"
            );
            return None;
        }
        Some(cookie)
    }

    /// Convert to cookie header format
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// `host` equals `domain` or is one of its subdomains
fn host_in_domain(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Directory of the request path, used when Set-Cookie has no Path
fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

/// Thread-safe cookie storage, cheap to clone
#[derive(Debug, Clone)]
pub struct CookieJar {
    /// Cookies stored by domain
    cookies: Arc<DashMap<String, Vec<Cookie>>>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    /// Create a new empty cookie jar
    pub fn new() -> Self {
        Self {
            cookies: Arc::new(DashMap::new()),
        }
    }

    /// Add a cookie, replacing one with the same name and path.
    ///
    /// An already expired cookie only removes its stored counterpart.
    pub fn add(&self, cookie: Cookie) {
        let mut entry = self.cookies.entry(cookie.domain.clone()).or_default();
        entry.retain(|c| c.name != cookie.name || c.path != cookie.path);
        if !cookie.is_expired() {
            entry.push(cookie);
        }
    }

    /// Add a cookie from a Set-Cookie header
    pub fn add_from_header(&self, header: &str, url: &Url) {
        if let Some(cookie) = Cookie::parse(header, url) {
            tracing::debug!(name = %cookie.name, domain = %cookie.domain, "storing cookie");
            self.add(cookie);
        }
    }

    /// Get all cookies for a URL, longest path first
    pub fn get_cookies(&self, url: &Url) -> Vec<Cookie> {
        self.remove_expired();

        let mut result: Vec<Cookie> = self
            .cookies
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|c| c.matches(url))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        result.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        result
    }

    /// Get a cookie value for a URL, matching the name case-insensitively
    pub fn get_value(&self, url: &Url, name: &str) -> Option<String> {
        self.get_cookies(url)
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.value)
    }

    /// Get Cookie header value for a URL
    pub fn get_cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.get_cookies(url);
        if cookies.is_empty() {
            return None;
        }

        Some(
            cookies
                .iter()
                .map(|c| c.to_header_value())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Remove a specific cookie
    pub fn remove(&self, name: &str, domain: &str, path: &str) {
        if let Some(mut cookies) = self.cookies.get_mut(domain) {
            cookies.retain(|c| c.name != name || c.path != path);
        }
    }

    /// Clear all cookies
    pub fn clear(&self) {
        self.cookies.clear();
    }

    fn remove_expired(&self) {
        for mut entry in self.cookies.iter_mut() {
            entry.value_mut().retain(|c| !c.is_expired());
        }
    }

    /// Get total cookie count
    pub fn len(&self) -> usize {
        self.cookies.iter().map(|e| e.value().len()).sum()
    }

    /// Check if jar is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            if let Ok(value) = header.to_str() {
                self.add_from_header(value, url);
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.get_cookie_header(url)
            .and_then(|header| HeaderValue::from_str(&header).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_parsing() {
        let url = Url::parse("https://example.com/path").unwrap();
        let header = "session=abc123; Domain=example.com; Path=/; Secure; HttpOnly; SameSite=Lax";
        let cookie = Cookie::parse(header, &url).unwrap();

        assert_eq!(cookie.name, "session");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.domain, "example.com");
        assert_eq!(cookie.path, "/");
        assert!(cookie.secure);
        assert!(cookie.http_only);
        assert_eq!(cookie.same_site, SameSite::Lax);
    }

    #[test]
    fn test_default_path() {
        let url = Url::parse("http://example.com/a/b/page").unwrap();
        let cookie = Cookie::parse("k=v", &url).unwrap();
        assert_eq!(cookie.path, "/a/b");
        assert!(cookie.matches(&Url::parse("http://example.com/a/b/other").unwrap()));
        assert!(!cookie.matches(&Url::parse("http://example.com/a/bc").unwrap()));
        assert!(!cookie.matches(&Url::parse("http://example.com/").unwrap()));
    }

    #[test]
    fn test_cookie_jar() {
        let jar = CookieJar::new();
        let url = Url::parse("https://example.com/path").unwrap();

        jar.add(Cookie::new("test", "value").domain("example.com"));
        assert_eq!(jar.len(), 1);

        let cookies = jar.get_cookies(&url);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "test");
        assert_eq!(jar.get_value(&url, "TEST").as_deref(), Some("value"));
    }

    #[test]
    fn test_replace_and_expire() {
        let jar = CookieJar::new();
        let url = Url::parse("http://example.com/").unwrap();

        jar.add_from_header("a=1", &url);
        jar.add_from_header("a=2", &url);
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get_cookie_header(&url).as_deref(), Some("a=2"));

        jar.add_from_header("a=gone; Max-Age=0", &url);
        assert!(jar.is_empty());
        assert!(jar.get_cookie_header(&url).is_none());
    }

    #[test]
    fn test_domain_scoping() {
        let jar = CookieJar::new();
        let url = Url::parse("http://www.example.com/").unwrap();
        jar.add_from_header("wide=1; Domain=.example.com", &url);
        jar.add_from_header("narrow=1", &url);

        let api = Url::parse("http://api.example.com/").unwrap();
        let names: Vec<String> = jar.get_cookies(&api).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["wide".to_string()]);

        let other = Url::parse("http://example.org/").unwrap();
        assert!(jar.get_cookies(&other).is_empty());
    }

    #[test]
    fn test_foreign_domain_rejected() {
        let jar = CookieJar::new();
        let evil = Url::parse("http://evil.example/").unwrap();
        jar.add_from_header("sid=attacker; Domain=bank.test", &evil);
        assert!(Cookie::parse("sid=attacker; Domain=bank.test", &evil).is_none());

        let bank = Url::parse("http://bank.test/").unwrap();
        assert!(jar.get_cookie_header(&bank).is_none());
        assert!(jar.is_empty());

        // A parent domain of the responding host is accepted
        let www = Url::parse("http://www.bank.test/").unwrap();
        jar.add_from_header("sid=ok; Domain=bank.test", &www);
        assert_eq!(jar.get_cookie_header(&bank).as_deref(), Some("sid=ok"));
    }

    #[test]
    fn test_host_only_cookie_stays_on_host() {
        let jar = CookieJar::new();
        let url = Url::parse("http://example.com/").unwrap();
        jar.add_from_header("hostonly=1", &url);
        assert!(Cookie::parse("hostonly=1", &url).unwrap().host_only);

        assert_eq!(jar.get_cookie_header(&url).as_deref(), Some("hostonly=1"));
        let sub = Url::parse("http://sub.example.com/").unwrap();
        assert!(jar.get_cookie_header(&sub).is_none());
    }

    #[test]
    fn test_cookie_store_hook() {
        let jar = CookieJar::new();
        let url = Url::parse("http://localhost:8080/").unwrap();
        let headers = [HeaderValue::from_static("a1=b1"), HeaderValue::from_static("c1=d1")];
        jar.set_cookies(&mut headers.iter(), &url);

        let header = CookieStore::cookies(&jar, &url).unwrap();
        let header = header.to_str().unwrap();
        assert!(header.contains("a1=b1"));
        assert!(header.contains("c1=d1"));
    }
}
