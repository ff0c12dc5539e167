use crate::body::{Body, EmptyBody};

pub struct ResponseField {
    pub name: String,
    pub value: String,
    /// Skipped fields stay in the list (their position is preserved for
    /// upper layers) but are left out of serialization.
    pub skip: bool,
}

/// An upper-layer response: status, fields in insertion order and a body.
/// Content-Length, Transfer-Encoding and Connection are appended by the
/// connection while framing unless the handler already set them.
pub struct Response {
    pub status: u16,
    fields: Vec<ResponseField>,
    body: Box<dyn Body>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            fields: Vec::new(),
            body: Box::new(EmptyBody),
        }
    }

    pub fn add_field<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.fields.push(ResponseField {
            name: name.into(),
            value: value.into(),
            skip: false,
        });
    }

    pub fn with_field<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.add_field(name, value);
        self
    }

    /// Marks every field with this name to be left out of the wire form.
    pub fn hide_field(&mut self, name: &str) {
        for field in &mut self.fields {
            if field.name.eq_ignore_ascii_case(name) {
                field.skip = true;
            }
        }
    }

    pub fn set_body(&mut self, body: Box<dyn Body>) {
        self.body = body;
    }

    pub fn with_body(mut self, body: Box<dyn Body>) -> Self {
        self.body = body;
        self
    }

    pub fn fields(&self) -> &[ResponseField] {
        &self.fields
    }

    pub(crate) fn has_field(&self, name: &str) -> bool {
        self.fields
            .iter()
            .any(|f| !f.skip && f.name.eq_ignore_ascii_case(name))
    }

    pub(crate) fn take_body(&mut self) -> Box<dyn Body> {
        std::mem::replace(&mut self.body, Box::new(EmptyBody))
    }
}
