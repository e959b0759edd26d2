// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP layer for hrq
//!
//! Request building and body encoding, the transport wrapper around
//! `reqwest`, response decoding, and cookie-carrying sessions.

mod body;
mod charset;
mod client;
mod cookie;
mod multipart;
mod query;
mod request;
mod response;
mod session;

pub use body::{encode_body, encode_form, EncodedBody, FormData, Payload};
pub use charset::{decode_text, label as encoding_label, sniff_encoding};
pub use client::{HttpClient, RedirectHop};
pub use cookie::{Cookie, CookieJar, SameSite};
pub use multipart::MultipartWriter;
pub use query::make_url;
pub use request::{File, PreparedRequest, Request};
pub use response::Response;
pub use session::Session;

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("hrq/", env!("CARGO_PKG_VERSION"));

/// Content types the body encoder understands
pub mod content_type {
    pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
    pub const JSON: &str = "application/json";
    pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

    /// Media type without parameters, lowercased
    pub fn essence(value: &str) -> String {
        value
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase()
    }
}

/// Common HTTP headers
pub mod headers {
    pub const CONTENT_TYPE: &str = "content-type";
    pub const CONTENT_ENCODING: &str = "content-encoding";
    pub const SET_COOKIE: &str = "set-cookie";
}
