// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP response decoding
//!
//! The body is pulled from the transport on first access and kept; later
//! reads, text decoding and JSON parsing all work on the buffered bytes.

use std::collections::HashMap;
use std::io::Read;

use bytes::Bytes;
use flate2::read::GzDecoder;
use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use url::Url;

use super::charset;
use super::client::RedirectHop;
use super::cookie::Cookie;
use super::headers::{CONTENT_ENCODING, CONTENT_TYPE, SET_COOKIE};
use crate::error::{Error, Result};

/// Where the body bytes come from before the first read
#[derive(Debug)]
enum RawBody {
    Transport(reqwest::Response),
    Buffered(Bytes),
}

/// HTTP response with lazily buffered body
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    history: Vec<RedirectHop>,
    raw: Mutex<Option<RawBody>>,
    content: OnceCell<Bytes>,
}

impl Response {
    pub(crate) fn from_transport(response: reqwest::Response, history: Vec<RedirectHop>) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            url: response.url().clone(),
            history,
            raw: Mutex::new(Some(RawBody::Transport(response))),
            content: OnceCell::new(),
        }
    }

    /// Create a response from raw (possibly gzip-encoded) body bytes
    pub fn from_bytes(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>, url: Url) -> Self {
        Self {
            status,
            headers,
            url,
            history: Vec::new(),
            raw: Mutex::new(Some(RawBody::Buffered(body.into()))),
            content: OnceCell::new(),
        }
    }

    /// Attach a redirect history
    pub fn with_history(mut self, history: Vec<RedirectHop>) -> Self {
        self.history = history;
        self
    }

    /// Response status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get status code as u16
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Final URL, after redirects
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Requests answered with a redirect before this response, oldest first
    pub fn history(&self) -> &[RedirectHop] {
        &self.history
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header (case-insensitive), or an empty string
    pub fn header_value(&self, name: &str) -> &str {
        self.headers
            .get(name.to_ascii_lowercase().as_str())
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Declared content type, or an empty string
    pub fn content_type(&self) -> &str {
        self.header_value(CONTENT_TYPE)
    }

    /// Body bytes, gunzipped when the server sent `Content-Encoding: gzip`.
    ///
    /// The transport stream is consumed on the first call only.
    pub async fn content(&self) -> Result<&Bytes> {
        self.content.get_or_try_init(|| self.read_body()).await
    }

    async fn read_body(&self) -> Result<Bytes> {
        let raw = self.raw.lock().take();
        let bytes = match raw {
            Some(RawBody::Transport(response)) => response.bytes().await?,
            Some(RawBody::Buffered(bytes)) => bytes,
            None => {
                return Err(Error::decode(
                    "identity",
                    "response body stream was already consumed",
                ))
            }
        };
        // HEAD, 204 and 304 answers may announce gzip without a body
        if !bytes.is_empty()
            && self
                .header_value(CONTENT_ENCODING)
                .trim()
                .eq_ignore_ascii_case("gzip")
        {
            gunzip(&bytes)
        } else {
            Ok(bytes)
        }
    }

    /// Canonical label of the sniffed body encoding
    pub async fn encoding(&self) -> Result<String> {
        let content = self.content().await?;
        Ok(charset::label(charset::sniff_encoding(
            content,
            self.content_type(),
        )))
    }

    /// Body decoded to text using the sniffed encoding
    pub async fn text(&self) -> Result<String> {
        let content = self.content().await?;
        let encoding = charset::sniff_encoding(content, self.content_type());
        charset::decode_text(content, encoding)
    }

    /// Parse body as JSON, whatever the status code
    pub async fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let content = self.content().await?;
        serde_json::from_slice(content).map_err(Error::MalformedJson)
    }

    /// Cookies set by this response (not by earlier redirect hops)
    pub fn cookies(&self) -> Vec<Cookie> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| Cookie::parse(v, &self.url))
            .collect()
    }

    /// Value of a cookie set by this response (case-insensitive name), or an
    /// empty string
    pub fn cookie_value(&self, name: &str) -> String {
        self.cookies()
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.value)
            .unwrap_or_default()
    }

    /// Cookies set by this response, by name
    pub fn cookies_map(&self) -> HashMap<String, String> {
        self.cookies()
            .into_iter()
            .map(|c| (c.name, c.value))
            .collect()
    }
}

fn gunzip(bytes: &[u8]) -> Result<Bytes> {
    let mut out = Vec::with_capacity(bytes.len() * 2);
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| Error::decode("gzip", e.to_string()))?;
    Ok(Bytes::from(out))
}
