use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::parser::{Field, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    None,
    Chunked,
    Unsupported,
}

/// The per-field results of running a request head through the dispatch
/// table, plus the keepalive decision seeded from the protocol version.
#[derive(Debug)]
pub(crate) struct RecognizedFields {
    pub keepalive: bool,
    pub transfer_encoding: TransferEncoding,
    pub content_length: Option<String>,
    pub host: Option<String>,
    pub cookie: Option<String>,
    pub content_type: Option<String>,
}

type FieldHandler = fn(&mut RecognizedFields, &str);

lazy_static! {
    /// Built once at startup and read-only afterwards; safely shared by
    /// every connection on every thread.
    static ref FIELD_HANDLERS: HashMap<&'static str, FieldHandler> = {
        let mut table: HashMap<&'static str, FieldHandler> = HashMap::new();
        table.insert("connection", connection);
        table.insert("transfer-encoding", transfer_encoding);
        table.insert("content-length", content_length);
        table.insert("host", host);
        table.insert("cookie", cookie);
        table.insert("content-type", content_type);
        table
    };
}

pub(crate) fn dispatch(fields: &[Field], version: Version) -> RecognizedFields {
    let mut out = RecognizedFields {
        keepalive: version.keepalive_default(),
        transfer_encoding: TransferEncoding::None,
        content_length: None,
        host: None,
        cookie: None,
        content_type: None,
    };

    for field in fields {
        let name = field.name.to_ascii_lowercase();
        if let Some(handler) = FIELD_HANDLERS.get(name.as_str()) {
            handler(&mut out, &field.value);
        }
    }

    out
}

/// Only a literal "close" disables keepalive; the value match is exact,
/// including case.
fn connection(out: &mut RecognizedFields, value: &str) {
    if value == "close" {
        out.keepalive = false;
    }
}

fn transfer_encoding(out: &mut RecognizedFields, value: &str) {
    out.transfer_encoding = if value == "chunked" {
        TransferEncoding::Chunked
    } else {
        TransferEncoding::Unsupported
    };
}

fn content_length(out: &mut RecognizedFields, value: &str) {
    out.content_length = Some(value.to_string());
}

fn host(out: &mut RecognizedFields, value: &str) {
    out.host = Some(value.to_string());
}

fn cookie(out: &mut RecognizedFields, value: &str) {
    out.cookie = Some(value.to_string());
}

fn content_type(out: &mut RecognizedFields, value: &str) {
    out.content_type = Some(value.to_string());
}
