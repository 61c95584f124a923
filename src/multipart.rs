//! Multipart/form-data encoding
//!
//! Hand-rolled rather than a generic encoder because the upload endpoint is
//! picky in non-standard ways: Content-Disposition name/filename values must
//! be double-quoted (with no escaping of embedded quotes), while the message
//! Content-Type's boundary parameter must NOT be quoted.

use std::time::{SystemTime, UNIX_EPOCH};

struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    body: Vec<u8>,
}

/// A multipart/form-data message. Parts serialize in insertion order.
pub struct Form {
    boundary: String,
    parts: Vec<Part>,
}

impl Form {
    /// Create a form with a generated boundary.
    pub fn new() -> Form {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        Form::with_boundary(&format!("----------------------------{nanos:024x}"))
    }

    /// Create a form with a caller-chosen boundary. Surrounding quote
    /// characters are stripped so they can never reach the wire.
    pub fn with_boundary(boundary: &str) -> Form {
        Form {
            boundary: boundary.trim_matches('"').to_string(),
            parts: Vec::new(),
        }
    }

    /// Add a file part. No per-part Content-Type is emitted; the service
    /// sniffs the content.
    pub fn add_bytes(&mut self, name: &str, filename: &str, body: Vec<u8>) {
        self.parts.push(Part {
            name: name.to_string(),
            filename: Some(filename.to_string()),
            content_type: None,
            body,
        });
    }

    /// Add a text part.
    pub fn add_text(&mut self, name: &str, value: &str) {
        self.parts.push(Part {
            name: name.to_string(),
            filename: None,
            content_type: Some("text/plain; charset=utf-8".to_string()),
            body: value.as_bytes().to_vec(),
        });
    }

    /// The message Content-Type header value, with an unquoted boundary
    /// parameter.
    pub fn content_type(&self) -> String {
        format!(
            "multipart/form-data; boundary={}",
            self.boundary.trim_matches('"')
        )
    }

    /// Serialize the message body.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());

            let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
            if let Some(filename) = &part.filename {
                disposition.push_str(&format!("; filename=\"{filename}\""));
            }
            out.extend_from_slice(disposition.as_bytes());
            out.extend_from_slice(b"\r\n");

            if let Some(content_type) = &part.content_type {
                out.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }

            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&part.body);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

impl Default for Form {
    fn default() -> Form {
        Form::new()
    }
}
