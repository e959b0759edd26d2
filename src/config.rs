// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request defaults and transport configuration
//!
//! A [`Config`] is either passed explicitly to [`Request::new`] or installed
//! once per process with [`Config::install`]. The method factories
//! (`Request::get`, `hrq::post`, ...) read [`Config::global`].
//!
//! [`Request::new`]: crate::http::Request::new

use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::http::{content_type, DEFAULT_USER_AGENT};

static GLOBAL: OnceLock<Config> = OnceLock::new();

/// Defaults applied to every request built from this config
#[derive(Debug, Clone)]
pub struct Config {
    /// Default timeout for a whole send, redirects included
    pub timeout: Duration,
    /// Content type given to POST/PUT requests
    pub content_type: String,
    /// User agent string
    pub user_agent: String,
    /// Redirect count at which a send fails
    pub max_redirects: usize,
    /// Accept invalid certificates (dangerous!)
    pub accept_invalid_certs: bool,
    /// Proxy URL
    pub proxy: Option<String>,
    /// Headers added to every request unless the request sets them
    pub default_headers: Vec<(String, String)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            content_type: content_type::FORM_URLENCODED.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: 10,
            accept_invalid_certs: false,
            proxy: None,
            default_headers: vec![("accept-encoding".to_string(), "gzip".to_string())],
        }
    }
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the POST/PUT content type
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the redirect cap
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Accept invalid TLS certificates
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Set proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Add default header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Install this config as the process-wide default.
    ///
    /// Meant to be called once at startup; every later call fails and leaves
    /// the first installed config in place.
    pub fn install(self) -> Result<()> {
        GLOBAL
            .set(self)
            .map_err(|_| Error::config("global config is already installed"))
    }

    /// The installed process-wide config, or the defaults if none was installed
    pub fn global() -> &'static Config {
        GLOBAL.get_or_init(Config::default)
    }
}
