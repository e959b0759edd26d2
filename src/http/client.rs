// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Transport wrapper around `reqwest`
//!
//! One [`HttpClient::execute`] call is one logical send. Redirects are
//! followed by `reqwest`; the redirect policy hook records every hop and
//! stops the chain at the configured cap.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use reqwest::cookie::CookieStore;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use url::Url;

use super::cookie::CookieJar;
use super::request::{merge_cookie_header, PreparedRequest};
use super::response::Response;
use crate::config::Config;
use crate::error::{Error, Result};

/// A request that was answered with a redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectHop {
    /// URL that was requested
    pub url: Url,
    /// Redirect status it was answered with
    pub status: StatusCode,
}

/// Error handed to `reqwest` when the redirect cap is reached
#[derive(Debug)]
struct RedirectLimit(usize);

impl fmt::Display for RedirectLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stopped after {} redirects", self.0)
    }
}

impl std::error::Error for RedirectLimit {}

/// Cookie provider for one send.
///
/// Wraps the jar and adds the request's own cookies on every hop whose host
/// is the original host or one of its subdomains. Set-Cookie headers go to
/// the jar only.
#[derive(Debug)]
struct SendCookies {
    jar: CookieJar,
    origin: String,
    cookies: Vec<(String, String)>,
}

impl SendCookies {
    fn new(jar: CookieJar, request: &PreparedRequest) -> Self {
        Self {
            jar,
            origin: request.url.host_str().unwrap_or("").to_ascii_lowercase(),
            cookies: request.cookies.clone(),
        }
    }

    fn forwards_to(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        host == self.origin || host.ends_with(&format!(".{}", self.origin))
    }
}

impl CookieStore for SendCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.jar.set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let own: &[(String, String)] = if self.forwards_to(url) {
            &self.cookies
        } else {
            &[]
        };
        merge_cookie_header(self.jar.get_cookie_header(url), own)
            .and_then(|header| HeaderValue::from_str(&header).ok())
    }
}

/// HTTP client bound to one cookie jar
#[derive(Debug, Clone)]
pub struct HttpClient {
    config: Config,
    cookie_jar: CookieJar,
}

impl HttpClient {
    /// Create a client with a fresh cookie jar
    pub fn new(config: Config) -> Self {
        Self::with_jar(config, CookieJar::new())
    }

    /// Create a client sharing an existing cookie jar
    pub fn with_jar(config: Config, cookie_jar: CookieJar) -> Self {
        Self { config, cookie_jar }
    }

    /// Get the cookie jar
    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookie_jar
    }

    /// Get client configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute a prepared request, following redirects
    pub async fn execute(&self, request: PreparedRequest) -> Result<Response> {
        let start = Instant::now();
        let history = Arc::new(Mutex::new(Vec::new()));
        let client = self.build_client(&request, Arc::clone(&history))?;

        let mut builder = client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            timeout_ms = request.timeout.as_millis() as u64,
            "sending request"
        );

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) if e.is_redirect() => {
                let count = history.lock().len();
                let url = e
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| request.url.to_string());
                tracing::debug!(%url, count, "redirect limit reached");
                return Err(Error::TooManyRedirects { url, count });
            }
            Err(e) => return Err(Error::Transport(e)),
        };

        let history = std::mem::take(&mut *history.lock());
        tracing::debug!(
            status = %response.status(),
            url = %response.url(),
            redirects = history.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "response received"
        );

        Ok(Response::from_transport(response, history))
    }

    fn build_client(
        &self,
        request: &PreparedRequest,
        history: Arc<Mutex<Vec<RedirectHop>>>,
    ) -> Result<Client> {
        let max_redirects = self.config.max_redirects;
        let policy = Policy::custom(move |attempt| {
            let count = attempt.previous().len();
            if let Some(url) = attempt.previous().last() {
                history.lock().push(RedirectHop {
                    url: url.clone(),
                    status: attempt.status(),
                });
            }
            if count >= max_redirects {
                attempt.error(RedirectLimit(count))
            } else {
                tracing::debug!(to = %attempt.url(), hop = count, "following redirect");
                attempt.follow()
            }
        });

        let mut builder = Client::builder()
            .user_agent(self.config.user_agent.as_str())
            .timeout(request.timeout)
            .redirect(policy)
            .danger_accept_invalid_certs(self.config.accept_invalid_certs)
            .default_headers(default_headers(&self.config)?)
            .cookie_provider(Arc::new(SendCookies::new(self.cookie_jar.clone(), request)))
            // Response::content decodes gzip itself
            .no_gzip();

        if let Some(ref proxy_url) = self.config.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy_url)
                    .map_err(|e| Error::config(format!("Invalid proxy URL: {}", e)))?,
            );
        }

        Ok(builder.build()?)
    }
}

fn default_headers(config: &Config) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.default_headers {
        let header_name = HeaderName::try_from(name.as_str())
            .map_err(|e| Error::config(format!("Invalid default header '{}': {}", name, e)))?;
        let header_value = HeaderValue::try_from(value.as_str())
            .map_err(|e| Error::config(format!("Invalid default header '{}': {}", name, e)))?;
        headers.append(header_name, header_value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;
    use std::time::Duration;

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new(Config::default());
        assert_eq!(client.config().max_redirects, 10);
        assert!(client.cookie_jar().is_empty());
    }

    #[test]
    fn test_default_headers() {
        let headers = default_headers(&Config::default().header("x-env", "test")).unwrap();
        assert_eq!(headers.get("accept-encoding").unwrap(), "gzip");
        assert_eq!(headers.get("x-env").unwrap(), "test");

        let err = default_headers(&Config::default().header("bad name", "v")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_send_cookies_stay_with_origin() {
        let jar = CookieJar::new();
        let origin = Url::parse("http://example.com/login").unwrap();
        jar.add_from_header("sid=abc", &origin);
        let request = Request::get(origin.as_str())
            .unwrap()
            .put_cookie("extra", "1")
            .prepare()
            .await
            .unwrap();
        let store = SendCookies::new(jar, &request);

        let home = Url::parse("http://example.com/home").unwrap();
        assert_eq!(store.cookies(&home).unwrap(), "sid=abc; extra=1");
        let sub = Url::parse("http://api.example.com/").unwrap();
        assert_eq!(store.cookies(&sub).unwrap(), "extra=1");
        let other = Url::parse("http://other.test/").unwrap();
        assert!(store.cookies(&other).is_none());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = Config::default().timeout(Duration::from_secs(2));
        let url = format!("http://127.0.0.1:{}/", port);
        let request = Request::new(reqwest::Method::GET, &url, &config)
            .unwrap()
            .prepare()
            .await
            .unwrap();
        let err = HttpClient::new(config).execute(request).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.is_transport());
    }
}
