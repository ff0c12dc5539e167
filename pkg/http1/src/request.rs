use bytes::Bytes;

use crate::parser::{Field, Version};

/// A completely received request as handed to the upper layer: parsed
/// request line, the raw field list, the fields the connection recognizes
/// pulled out, and the fully read body.
#[derive(Debug)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub version: Version,
    pub fields: Vec<Field>,

    pub host: Option<String>,
    pub content_type: Option<String>,
    pub cookie: Option<String>,
    pub content_length: u64,

    pub body: Bytes,
}

impl Request {
    /// Finds the first field with the given name, case-insensitively.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
    }
}
