// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # hrq - fluent HTTP requests
//!
//! A chainable layer over `reqwest` for the common request chores.
//!
//! ## Features
//!
//! - Body encoding picked from the declared content type: form-urlencoded,
//!   JSON, multipart with file parts
//! - Optional gzip compression of request bodies
//! - Per-request cookies and cookie-carrying sessions
//! - Redirect history on every response, with a redirect cap
//! - Charset sniffing and decoding of response text
//! - Lazy, buffered response bodies with transparent gzip decoding
//!
//! ## Example
//!
//! ```rust,no_run
//! use hrq::{make_url, Request};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let url = make_url("https://example.com/search", [("q", "kalamari")]);
//!     let response = Request::get(url)?.set_header("accept", "text/html").send().await?;
//!
//!     println!("{} after {} redirects", response.status(), response.history().len());
//!     println!("{}", response.text().await?);
//!
//!     let response = Request::post("https://example.com/login")?
//!         .form([("user", "kalle"), ("password", "secret")])
//!         .use_gzip()
//!         .send()
//!         .await?;
//!     println!("session = {}", response.cookie_value("session"));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;

pub use config::Config;
pub use error::{Error, Result};
pub use http::{
    make_url, Cookie, CookieJar, File, FormData, HttpClient, Payload, PreparedRequest,
    RedirectHop, Request, Response, Session,
};

/// Create a GET request with the global defaults
pub fn get(url: impl AsRef<str>) -> Result<Request> {
    Request::get(url)
}

/// Create a POST request carrying `payload`
pub fn post(url: impl AsRef<str>, payload: impl Into<Payload>) -> Result<Request> {
    Ok(Request::post(url)?.payload(payload))
}

/// Create a PUT request carrying `payload`
pub fn put(url: impl AsRef<str>, payload: impl Into<Payload>) -> Result<Request> {
    Ok(Request::put(url)?.payload(payload))
}

/// Create a DELETE request with the global defaults
pub fn delete(url: impl AsRef<str>) -> Result<Request> {
    Request::delete(url)
}

/// Create a HEAD request with the global defaults
pub fn head(url: impl AsRef<str>) -> Result<Request> {
    Request::head(url)
}

/// Create an OPTIONS request with the global defaults
pub fn options(url: impl AsRef<str>) -> Result<Request> {
    Request::options(url)
}

/// hrq version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
