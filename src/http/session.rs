// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cookie-carrying session
//!
//! Every send through a [`Session`] uses the same cookie jar, so cookies set
//! by one response are replayed on later requests to matching URLs.
//!
//! The jar is internally synchronized: a session can be cloned and used from
//! several tasks at once. Concurrent sends update the jar in the order their
//! responses arrive.

use url::Url;

use super::cookie::{Cookie, CookieJar};
use super::request::Request;
use super::response::Response;
use crate::error::Result;

/// A persistent cookie store shared by many requests
#[derive(Debug, Clone, Default)]
pub struct Session {
    cookie_jar: CookieJar,
}

impl Session {
    /// Create a session with an empty cookie jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session around an existing jar
    pub fn with_jar(cookie_jar: CookieJar) -> Self {
        Self { cookie_jar }
    }

    /// Encode and send a request through the session jar.
    ///
    /// The request's own timeout applies to the whole exchange.
    pub async fn send(&self, request: Request) -> Result<Response> {
        request.send_with_jar(&self.cookie_jar).await
    }

    /// Value of a stored cookie for `url` (case-insensitive name), or an empty
    /// string
    pub fn cookie_value(&self, url: &str, name: &str) -> String {
        Url::parse(url)
            .ok()
            .and_then(|u| self.cookie_jar.get_value(&u, name))
            .unwrap_or_default()
    }

    /// All stored cookies that would be sent to `url`
    pub fn cookies(&self, url: &str) -> Result<Vec<Cookie>> {
        let url = Url::parse(url)?;
        Ok(self.cookie_jar.get_cookies(&url))
    }

    /// Get the cookie jar
    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookie_jar
    }
}
