// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Buffered multipart/form-data writer
//!
//! Parts are written into one in-memory buffer so the finished body can be
//! replayed by the transport after the source streams are gone.

use tokio::io::{AsyncRead, AsyncReadExt};

use super::content_type::MULTIPART_FORM_DATA;
use crate::error::Result;

/// Writes form fields and file parts into a single body buffer
#[derive(Debug)]
pub struct MultipartWriter {
    boundary: String,
    buf: Vec<u8>,
    parts: usize,
}

impl Default for MultipartWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartWriter {
    /// Create a writer with a random boundary
    pub fn new() -> Self {
        Self::with_boundary(random_boundary())
    }

    /// Create a writer with a fixed boundary
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            buf: Vec::new(),
            parts: 0,
        }
    }

    /// Boundary token separating the parts
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// `Content-Type` header value announcing the boundary
    pub fn content_type(&self) -> String {
        format!("{}; boundary={}", MULTIPART_FORM_DATA, self.boundary)
    }

    /// Number of parts written so far
    pub fn len(&self) -> usize {
        self.parts
    }

    /// Check if no part was written
    pub fn is_empty(&self) -> bool {
        self.parts == 0
    }

    /// Write a plain form field
    pub fn write_field(&mut self, name: &str, value: &str) {
        self.open_part(&[(
            "Content-Disposition",
            format!("form-data; name=\"{}\"", escape_quotes(name)),
        )]);
        self.buf.extend_from_slice(value.as_bytes());
    }

    /// Write a file part, streaming `reader` to its end
    pub async fn write_file<R>(
        &mut self,
        field_name: &str,
        file_name: &str,
        content_type: &str,
        reader: &mut R,
    ) -> Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.open_part(&[
            (
                "Content-Disposition",
                format!(
                    "form-data; name=\"{}\"; filename=\"{}\"",
                    escape_quotes(field_name),
                    escape_quotes(file_name)
                ),
            ),
            ("Content-Type", content_type.to_string()),
        ]);
        let copied = reader.read_to_end(&mut self.buf).await?;
        Ok(copied as u64)
    }

    /// Write the closing boundary and return the body
    pub fn finish(mut self) -> Vec<u8> {
        if self.parts > 0 {
            self.buf.extend_from_slice(b"\r\n");
        }
        self.buf.extend_from_slice(b"--");
        self.buf.extend_from_slice(self.boundary.as_bytes());
        self.buf.extend_from_slice(b"--\r\n");
        self.buf
    }

    fn open_part(&mut self, headers: &[(&str, String)]) {
        if self.parts > 0 {
            self.buf.extend_from_slice(b"\r\n");
        }
        self.buf.extend_from_slice(b"--");
        self.buf.extend_from_slice(self.boundary.as_bytes());
        self.buf.extend_from_slice(b"\r\n");
        for (name, value) in headers {
            self.buf.extend_from_slice(name.as_bytes());
            self.buf.extend_from_slice(b": ");
            self.buf.extend_from_slice(value.as_bytes());
            self.buf.extend_from_slice(b"\r\n");
        }
        self.buf.extend_from_slice(b"\r\n");
        self.parts += 1;
    }
}

fn random_boundary() -> String {
    format!("{:032x}{:08x}", rand::random::<u128>(), rand::random::<u32>())
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_field_and_file_layout() {
        let mut writer = MultipartWriter::with_boundary("XYZ");
        writer.write_field("name", "kalle");
        let mut file: &[u8] = b"line1\nline2";
        let copied = writer
            .write_file("upload", "notes.txt", "text/plain", &mut file)
            .await
            .unwrap();
        assert_eq!(copied, 11);
        assert_eq!(writer.len(), 2);

        let body = String::from_utf8(writer.finish()).unwrap();
        assert_eq!(
            body,
            "--XYZ\r\n\
             Content-Disposition: form-data; name=\"name\"\r\n\r\n\
             kalle\r\n\
             --XYZ\r\n\
             Content-Disposition: form-data; name=\"upload\"; filename=\"notes.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             line1\nline2\r\n\
             --XYZ--\r\n"
        );
    }

    #[test]
    fn test_empty_body() {
        let writer = MultipartWriter::with_boundary("b");
        assert!(writer.is_empty());
        assert_eq!(writer.finish(), b"--b--\r\n");
    }

    #[test]
    fn test_random_boundary() {
        let a = MultipartWriter::new();
        let b = MultipartWriter::new();
        assert_eq!(a.boundary().len(), 40);
        assert_ne!(a.boundary(), b.boundary());
        assert!(a.content_type().starts_with("multipart/form-data; boundary="));
    }

    #[test]
    fn test_quotes_escaped() {
        let mut writer = MultipartWriter::with_boundary("b");
        writer.write_field("a\"b", "v");
        let body = String::from_utf8(writer.finish()).unwrap();
        assert!(body.contains("name=\"a\\\"b\""));
    }
}
