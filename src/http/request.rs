// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP request builder
//!
//! A [`Request`] collects method, URL, headers, cookies, payload and file
//! attachments. Nothing is encoded until [`Request::send`] (or
//! [`Request::prepare`]) runs.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use tokio::io::AsyncRead;
use url::Url;

use super::body::{encode_body, Payload};
use super::client::HttpClient;
use super::content_type;
use super::cookie::CookieJar;
use super::headers::{CONTENT_ENCODING, CONTENT_TYPE};
use super::response::Response;
use crate::config::Config;
use crate::error::{Error, Result};

/// A file part for multipart bodies.
///
/// The stream is read to its end once, during encoding, and dropped right
/// after, which closes the underlying handle.
pub struct File {
    /// Content type of the part
    pub content_type: String,
    /// Form field name
    pub field_name: String,
    /// File name announced to the server
    pub file_name: String,
    reader: Box<dyn AsyncRead + Send + Unpin>,
}

impl File {
    /// Create a file part from any async byte stream
    pub fn new(
        content_type: impl Into<String>,
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            field_name: field_name.into(),
            file_name: file_name.into(),
            reader: Box::new(reader),
        }
    }

    /// Open a file on disk; the part is named after the file
    pub async fn open(
        content_type: impl Into<String>,
        field_name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let handle = tokio::fs::File::open(path).await?;
        Ok(Self::new(content_type, field_name, file_name, handle))
    }

    pub(crate) fn reader_mut(&mut self) -> &mut (dyn AsyncRead + Send + Unpin) {
        &mut *self.reader
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("content_type", &self.content_type)
            .field("field_name", &self.field_name)
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

/// HTTP request under construction
#[derive(Debug)]
pub struct Request {
    /// Request method
    pub method: Method,
    /// Request URL
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Timeout for the whole send, redirects included
    pub timeout: Duration,
    /// Data for the body encoder
    pub payload: Option<Payload>,
    /// Compress the encoded body with gzip
    pub gzip: bool,
    cookies: Vec<(String, String)>,
    files: Vec<File>,
    config: Config,
    /// First error raised by a chained setter, returned from `send`
    error: Option<Error>,
}

impl Request {
    /// Create a request with explicit defaults.
    ///
    /// POST and PUT requests get the config's content type.
    pub fn new(method: Method, url: impl AsRef<str>, config: &Config) -> Result<Self> {
        let mut request = Self {
            method,
            url: Url::parse(url.as_ref())?,
            headers: HeaderMap::new(),
            timeout: config.timeout,
            payload: None,
            gzip: false,
            cookies: Vec::new(),
            files: Vec::new(),
            config: config.clone(),
            error: None,
        };
        if request.method == Method::POST || request.method == Method::PUT {
            request = request.set_header(CONTENT_TYPE, &config.content_type);
        }
        Ok(request)
    }

    /// Create a new GET request
    pub fn get(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::GET, url, Config::global())
    }

    /// Create a new POST request
    pub fn post(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::POST, url, Config::global())
    }

    /// Create a new PUT request
    pub fn put(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::PUT, url, Config::global())
    }

    /// Create a new DELETE request
    pub fn delete(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::DELETE, url, Config::global())
    }

    /// Create a new HEAD request
    pub fn head(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::HEAD, url, Config::global())
    }

    /// Create a new OPTIONS request
    pub fn options(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::OPTIONS, url, Config::global())
    }

    /// Set a header, replacing any previous values
    pub fn set_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        match parse_header(name.as_ref(), value.as_ref()) {
            Ok((name, value)) => {
                self.headers.insert(name, value);
            }
            Err(e) => self.fail(e),
        }
        self
    }

    /// Append a header value, keeping previous ones
    pub fn add_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        match parse_header(name.as_ref(), value.as_ref()) {
            Ok((name, value)) => {
                self.headers.append(name, value);
            }
            Err(e) => self.fail(e),
        }
        self
    }

    /// First value of a header, or an empty string
    pub fn header_value(&self, name: &str) -> &str {
        self.headers
            .get(name.to_ascii_lowercase().as_str())
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Remove all values of a header
    pub fn del_header(mut self, name: &str) -> Self {
        self.headers.remove(name.to_ascii_lowercase().as_str());
        self
    }

    /// Attach a cookie to this request only
    pub fn put_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    /// Cookies attached with [`Request::put_cookie`]
    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Declare `application/x-www-form-urlencoded`
    pub fn set_form_urlencoded(self) -> Self {
        self.set_header(CONTENT_TYPE, content_type::FORM_URLENCODED)
    }

    /// Declare `application/json`
    pub fn set_json(self) -> Self {
        self.set_header(CONTENT_TYPE, content_type::JSON)
    }

    /// Declare `multipart/form-data`
    pub fn set_multipart_form_data(self) -> Self {
        self.set_header(CONTENT_TYPE, content_type::MULTIPART_FORM_DATA)
    }

    /// Content type currently declared
    pub fn content_type(&self) -> &str {
        self.header_value(CONTENT_TYPE)
    }

    /// Set the payload, keeping the declared content type
    pub fn payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Set form fields and declare form-urlencoding
    pub fn form<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.payload = Some(Payload::form(pairs));
        self.set_form_urlencoded()
    }

    /// Set a JSON payload and declare `application/json`
    pub fn json<T: Serialize + ?Sized>(mut self, data: &T) -> Result<Self> {
        self.payload = Some(Payload::json(data)?);
        Ok(self.set_json())
    }

    /// Set multipart fields and declare `multipart/form-data`
    pub fn multipart<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.payload = Some(Payload::multipart(fields));
        self.set_multipart_form_data()
    }

    /// Attach a file part
    pub fn add_file(
        mut self,
        content_type: impl Into<String>,
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        self.files
            .push(File::new(content_type, field_name, file_name, reader));
        self
    }

    /// Open a file on disk and attach it
    pub async fn add_file_path(
        mut self,
        content_type: impl Into<String>,
        field_name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        self.files
            .push(File::open(content_type, field_name, path).await?);
        Ok(self)
    }

    /// Attached file parts, in attachment order
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// Compress the body with gzip
    pub fn use_gzip(mut self) -> Self {
        self.gzip = true;
        self
    }

    /// Defaults this request was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the body encoder and freeze the request for the transport
    pub async fn prepare(mut self) -> Result<PreparedRequest> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        let declared = self
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let files = std::mem::take(&mut self.files);
        let encoded = encode_body(
            &self.method,
            declared.as_deref(),
            self.payload.as_ref(),
            files,
            self.gzip,
        )
        .await?;

        let mut body = None;
        if let Some(encoded) = encoded {
            if let Some(ref value) = encoded.content_type {
                let value = HeaderValue::from_str(value)
                    .map_err(|e| Error::invalid_header(CONTENT_TYPE, e))?;
                self.headers.insert(CONTENT_TYPE, value);
            }
            if encoded.gzip {
                self.headers
                    .insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
            }
            body = Some(encoded.bytes);
        }

        Ok(PreparedRequest {
            method: self.method,
            url: self.url,
            headers: self.headers,
            cookies: self.cookies,
            timeout: self.timeout,
            body,
            config: self.config,
        })
    }

    /// Encode and send with a fresh cookie jar
    pub async fn send(self) -> Result<Response> {
        let client = HttpClient::new(self.config.clone());
        client.execute(self.prepare().await?).await
    }

    /// Encode and send through an existing cookie jar
    pub async fn send_with_jar(self, jar: &CookieJar) -> Result<Response> {
        let client = HttpClient::with_jar(self.config.clone(), jar.clone());
        client.execute(self.prepare().await?).await
    }

    fn fail(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::try_from(name).map_err(|e| Error::invalid_header(name, e))?;
    let header_value = HeaderValue::try_from(value).map_err(|e| Error::invalid_header(name, e))?;
    Ok((header_name, header_value))
}

/// Fully encoded request, ready for the transport.
///
/// The body is an immutable buffer, so the transport can resend it on a
/// 307/308 redirect without touching the original file streams.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub cookies: Vec<(String, String)>,
    pub timeout: Duration,
    pub body: Option<Bytes>,
    pub config: Config,
}

impl PreparedRequest {
    /// Encoded body bytes
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// `Cookie` header for this request: jar cookies first, then the
    /// request's own cookies
    pub fn cookie_header(&self, jar: &CookieJar) -> Option<String> {
        merge_cookie_header(jar.get_cookie_header(&self.url), &self.cookies)
    }
}

/// Join stored cookies and request cookies into one `Cookie` header value
pub(crate) fn merge_cookie_header(
    stored: Option<String>,
    cookies: &[(String, String)],
) -> Option<String> {
    let mut pairs: Vec<String> = stored.into_iter().collect();
    pairs.extend(cookies.iter().map(|(k, v)| format!("{}={}", k, v)));
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}
