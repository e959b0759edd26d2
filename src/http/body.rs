// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request body encoding
//!
//! Turns a [`Payload`] into wire bytes according to the declared content
//! type and method:
//!
//! - only POST and PUT carry an encoded body
//! - `multipart/form-data` takes string fields plus the attached files
//! - `application/x-www-form-urlencoded` takes string or string-list fields
//! - `application/json` takes anything serializable
//! - any other content type leaves the request without a body
//!
//! Gzip compression, when requested, is applied once to the final bytes.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};

use super::content_type::{self, FORM_URLENCODED, JSON, MULTIPART_FORM_DATA};
use super::multipart::MultipartWriter;
use super::request::File;
use crate::error::{Error, Result};

/// Form fields: each key maps to one or more values
pub type FormData = BTreeMap<String, Vec<String>>;

/// Data to be encoded into the request body
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Fields for form-urlencoding; keys may repeat through the value list
    Form(FormData),
    /// Any JSON document
    Json(Value),
    /// Single-valued fields for a multipart body
    Multipart(BTreeMap<String, String>),
}

impl Payload {
    /// Build a form payload from key/value pairs; repeated keys collect values
    pub fn form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut data = FormData::new();
        for (k, v) in pairs {
            data.entry(k.into()).or_default().push(v.into());
        }
        Payload::Form(data)
    }

    /// Serialize `value` into a JSON payload
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Payload::Json)
            .map_err(|e| Error::encoding(format!("JSON serialization failed: {}", e)))
    }

    /// Build a multipart payload from key/value pairs
    pub fn multipart<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Payload::Multipart(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Form(_) => "form",
            Payload::Json(_) => "json",
            Payload::Multipart(_) => "multipart",
        }
    }

    /// Form fields, if this payload is a string mapping
    fn as_form(&self) -> Option<FormData> {
        match self {
            Payload::Form(data) => Some(data.clone()),
            Payload::Multipart(fields) => Some(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), vec![v.clone()]))
                    .collect(),
            ),
            Payload::Json(_) => None,
        }
    }

    /// Single-valued fields, if this payload is a string-to-string mapping
    fn as_fields(&self) -> Option<BTreeMap<String, String>> {
        match self {
            Payload::Multipart(fields) => Some(fields.clone()),
            Payload::Form(data) => data
                .iter()
                .map(|(k, vs)| match vs.as_slice() {
                    [v] => Some((k.clone(), v.clone())),
                    _ => None,
                })
                .collect(),
            Payload::Json(_) => None,
        }
    }

    fn to_json_value(&self) -> Value {
        match self {
            Payload::Json(value) => value.clone(),
            Payload::Multipart(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect::<Map<_, _>>(),
            ),
            Payload::Form(data) => Value::Object(
                data.iter()
                    .map(|(k, vs)| {
                        let value = match vs.as_slice() {
                            [v] => Value::String(v.clone()),
                            _ => Value::Array(vs.iter().cloned().map(Value::String).collect()),
                        };
                        (k.clone(), value)
                    })
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

impl From<HashMap<String, String>> for Payload {
    fn from(map: HashMap<String, String>) -> Self {
        Payload::form(map)
    }
}

impl From<BTreeMap<String, String>> for Payload {
    fn from(map: BTreeMap<String, String>) -> Self {
        Payload::form(map)
    }
}

impl From<HashMap<String, Vec<String>>> for Payload {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        Payload::Form(map.into_iter().collect())
    }
}

impl From<FormData> for Payload {
    fn from(data: FormData) -> Self {
        Payload::Form(data)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Payload {
    fn from(pairs: [(K, V); N]) -> Self {
        Payload::form(pairs)
    }
}

/// Final request body plus the header changes it implies
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBody {
    /// Wire bytes, compressed when `gzip` is set
    pub bytes: Bytes,
    /// Replacement `Content-Type` (multipart adds the boundary)
    pub content_type: Option<String>,
    /// Whether `Content-Encoding: gzip` must be sent
    pub gzip: bool,
}

/// Form-urlencode fields; keys ascending, values in insertion order
pub fn encode_form(data: &FormData) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, values) in data {
        for value in values {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

/// Compress bytes with gzip framing
pub fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|e| Error::encoding(format!("gzip compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| Error::encoding(format!("gzip compression failed: {}", e)))
}

/// Encode the body for a request.
///
/// `files` is consumed: every attached stream is dropped (closed) when this
/// returns, whether encoding succeeded or not. Returns `Ok(None)` when the
/// request carries no body.
pub async fn encode_body(
    method: &Method,
    declared_type: Option<&str>,
    payload: Option<&Payload>,
    files: Vec<File>,
    compress: bool,
) -> Result<Option<EncodedBody>> {
    if *method != Method::POST && *method != Method::PUT {
        if payload.is_some() || !files.is_empty() {
            tracing::debug!(%method, "method carries no encoded body, payload ignored");
        }
        return Ok(None);
    }

    let declared = declared_type.unwrap_or("");
    let (bytes, content_type) = match content_type::essence(declared).as_str() {
        MULTIPART_FORM_DATA => {
            let fields = match payload {
                Some(p) => p
                    .as_fields()
                    .ok_or_else(|| Error::type_mismatch(declared, p.kind()))?,
                None => BTreeMap::new(),
            };
            let (bytes, content_type) = encode_multipart(&fields, files).await?;
            (bytes, Some(content_type))
        }
        FORM_URLENCODED => match payload {
            Some(p) => {
                let data = p
                    .as_form()
                    .ok_or_else(|| Error::type_mismatch(declared, p.kind()))?;
                (encode_form(&data).into_bytes(), None)
            }
            None => return Ok(None),
        },
        JSON => match payload {
            Some(p) => {
                let bytes = serde_json::to_vec(&p.to_json_value())
                    .map_err(|e| Error::encoding(format!("JSON serialization failed: {}", e)))?;
                (bytes, None)
            }
            None => return Ok(None),
        },
        other => {
            if payload.is_some() {
                tracing::debug!(content_type = other, "no encoder for content type, body left empty");
            }
            return Ok(None);
        }
    };

    let plain_len = bytes.len();
    let bytes = if compress { gzip(&bytes)? } else { bytes };
    tracing::debug!(
        content_type = declared,
        plain_len,
        wire_len = bytes.len(),
        gzip = compress,
        "encoded request body"
    );

    Ok(Some(EncodedBody {
        bytes: Bytes::from(bytes),
        content_type,
        gzip: compress,
    }))
}

async fn encode_multipart(
    fields: &BTreeMap<String, String>,
    files: Vec<File>,
) -> Result<(Vec<u8>, String)> {
    let mut writer = MultipartWriter::new();
    for (name, value) in fields {
        writer.write_field(name, value);
    }
    // Each file is dropped right after it is copied, or with the rest of the
    // vector on the first error.
    for mut file in files {
        let field_name = std::mem::take(&mut file.field_name);
        let file_name = std::mem::take(&mut file.file_name);
        let content_type = std::mem::take(&mut file.content_type);
        writer
            .write_file(&field_name, &file_name, &content_type, file.reader_mut())
            .await?;
    }
    let content_type = writer.content_type();
    Ok((writer.finish(), content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn form_payload() -> Payload {
        Payload::form([("b", "2"), ("a", "hello world"), ("b", "3&4")])
    }

    #[tokio::test]
    async fn test_get_never_encodes() {
        let body = encode_body(
            &Method::GET,
            Some(FORM_URLENCODED),
            Some(&form_payload()),
            Vec::new(),
            false,
        )
        .await
        .unwrap();
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_form_encoding_is_sorted_and_escaped() {
        let body = encode_body(
            &Method::POST,
            Some(FORM_URLENCODED),
            Some(&form_payload()),
            Vec::new(),
            false,
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(body.bytes, Bytes::from("a=hello+world&b=2&b=3%264"));
        assert!(body.content_type.is_none());
        assert!(!body.gzip);
    }

    #[test]
    fn test_form_round_trip() {
        let payload = Payload::form([
            ("name", "Åsa & Kalle"),
            ("q", "a+b=c"),
            ("tag", "x"),
            ("tag", "y z"),
        ]);
        let Payload::Form(data) = payload else {
            unreachable!()
        };
        let encoded = encode_form(&data);

        let mut decoded = FormData::new();
        for (k, v) in url::form_urlencoded::parse(encoded.as_bytes()) {
            decoded.entry(k.into_owned()).or_default().push(v.into_owned());
        }
        assert_eq!(decoded, data);
    }

    #[tokio::test]
    async fn test_json_payload_rejected_for_form() {
        let payload = Payload::json(&serde_json::json!({"a": 1})).unwrap();
        let err = encode_body(&Method::PUT, Some(FORM_URLENCODED), Some(&payload), Vec::new(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { payload: "json", .. }));
    }

    #[test]
    fn test_json_payload_encoding_error() {
        let mut data = std::collections::BTreeMap::new();
        data.insert(vec![1u8, 2], "sequence keys");
        let err = Payload::json(&data).unwrap_err();
        assert!(matches!(err, Error::Encoding(ref msg) if msg.contains("JSON")));
    }

    #[tokio::test]
    async fn test_json_encoding() {
        let value = serde_json::json!({"name": "kalamari", "tags": ["a", "b"], "n": 3});
        let payload = Payload::json(&value).unwrap();
        let body = encode_body(
            &Method::POST,
            Some("application/json; charset=utf-8"),
            Some(&payload),
            Vec::new(),
            false,
        )
        .await
        .unwrap()
        .unwrap();
        let decoded: Value = serde_json::from_slice(&body.bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[tokio::test]
    async fn test_form_payload_as_json() {
        let body = encode_body(&Method::POST, Some(JSON), Some(&form_payload()), Vec::new(), false)
            .await
            .unwrap()
            .unwrap();
        let decoded: Value = serde_json::from_slice(&body.bytes).unwrap();
        assert_eq!(decoded, serde_json::json!({"a": "hello world", "b": ["2", "3&4"]}));
    }

    #[tokio::test]
    async fn test_unknown_content_type_is_noop() {
        let body = encode_body(
            &Method::POST,
            Some("text/plain"),
            Some(&form_payload()),
            Vec::new(),
            true,
        )
        .await
        .unwrap();
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_gzip_applied_after_encoding() {
        let payload = Payload::form([("foo", "123")]);
        let body = encode_body(&Method::POST, Some(FORM_URLENCODED), Some(&payload), Vec::new(), true)
            .await
            .unwrap()
            .unwrap();
        assert!(body.gzip);

        let mut plain = String::new();
        GzDecoder::new(&body.bytes[..]).read_to_string(&mut plain).unwrap();
        assert_eq!(plain, "foo=123");
    }

    #[tokio::test]
    async fn test_multipart_rejects_multi_valued_fields() {
        let err = encode_body(
            &Method::POST,
            Some(MULTIPART_FORM_DATA),
            Some(&form_payload()),
            Vec::new(),
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { payload: "form", .. }));
    }

    #[tokio::test]
    async fn test_multipart_with_file() {
        let payload = Payload::multipart([("title", "report")]);
        let file = File::new("text/csv", "data", "data.csv", &b"a,b\n1,2\n"[..]);
        let body = encode_body(
            &Method::POST,
            Some(MULTIPART_FORM_DATA),
            Some(&payload),
            vec![file],
            false,
        )
        .await
        .unwrap()
        .unwrap();

        let content_type = body.content_type.unwrap();
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap();
        let text = String::from_utf8(body.bytes.to_vec()).unwrap();
        assert!(text.starts_with(&format!("--{}\r\n", boundary)));
        assert!(text.contains("name=\"title\"\r\n\r\nreport\r\n"));
        assert!(text.contains("name=\"data\"; filename=\"data.csv\"\r\nContent-Type: text/csv\r\n\r\na,b\n1,2\n\r\n"));
        assert!(text.ends_with(&format!("--{}--\r\n", boundary)));
    }
}
