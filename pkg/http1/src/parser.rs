use failure::Fail;

/// Outcome of a failed head parse. An unsupported protocol version is kept
/// apart from plain garbage so the connection can answer 505 instead of 400.
#[derive(Debug, Fail, PartialEq, Eq)]
pub enum HeadError {
    #[fail(display = "malformed request head")]
    Malformed,
    #[fail(display = "unsupported protocol version")]
    UnsupportedVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    /// HTTP/1.1 connections persist unless told otherwise; HTTP/1.0 ones
    /// close.
    pub fn keepalive_default(&self) -> bool {
        matches!(self, Version::Http11)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: Version,
}

/// Ok(None) means the buffer does not yet hold a complete line; the caller
/// reads more and retries. On success the number of consumed bytes is
/// returned alongside the parsed value.
pub fn parse_request_line(buf: &[u8]) -> Result<Option<(RequestLine, usize)>, HeadError> {
    let end = match find_crlf(buf) {
        Some(end) => end,
        None => return Ok(None),
    };
    let line = &buf[..end];

    let sp1 = line
        .iter()
        .position(|b| *b == b' ')
        .ok_or(HeadError::Malformed)?;
    let method = &line[..sp1];
    if method.is_empty() || !method.iter().all(|b| is_token_char(*b)) {
        return Err(HeadError::Malformed);
    }

    let rest = &line[sp1 + 1..];
    let sp2 = rest
        .iter()
        .position(|b| *b == b' ')
        .ok_or(HeadError::Malformed)?;
    let target = &rest[..sp2];
    if target.is_empty() || !target.iter().all(|b| (0x21..=0x7E).contains(b)) {
        return Err(HeadError::Malformed);
    }

    let version = parse_version(&rest[sp2 + 1..])?;

    Ok(Some((
        RequestLine {
            method: ascii_string(method),
            target: ascii_string(target),
            version,
        },
        end + 2,
    )))
}

fn parse_version(bytes: &[u8]) -> Result<Version, HeadError> {
    if bytes.len() != 8
        || &bytes[..5] != b"HTTP/"
        || !bytes[5].is_ascii_digit()
        || bytes[6] != b'.'
        || !bytes[7].is_ascii_digit()
    {
        return Err(HeadError::Malformed);
    }

    match &bytes[5..] {
        b"1.0" => Ok(Version::Http10),
        b"1.1" => Ok(Version::Http11),
        _ => Err(HeadError::UnsupportedVersion),
    }
}

/// Parses the next field line. Ok(Some((None, n))) is the empty line that
/// terminates the head.
pub fn parse_field_line(buf: &[u8]) -> Result<Option<(Option<Field>, usize)>, HeadError> {
    let end = match find_crlf(buf) {
        Some(end) => end,
        None => return Ok(None),
    };
    if end == 0 {
        return Ok(Some((None, 2)));
    }
    let line = &buf[..end];

    let colon = line
        .iter()
        .position(|b| *b == b':')
        .ok_or(HeadError::Malformed)?;
    let name = &line[..colon];
    if name.is_empty() || !name.iter().all(|b| is_token_char(*b)) {
        return Err(HeadError::Malformed);
    }

    let value = trim_ows(&line[colon + 1..]);
    if value
        .iter()
        .any(|b| (*b < 0x20 && *b != b'\t') || *b == 0x7F)
    {
        return Err(HeadError::Malformed);
    }

    let value = std::str::from_utf8(value)
        .map_err(|_| HeadError::Malformed)?
        .to_string();

    Ok(Some((
        Some(Field {
            name: ascii_string(name),
            value,
        }),
        end + 2,
    )))
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Strips optional whitespace (SP / HTAB) from both ends of a field value.
fn trim_ows(mut value: &[u8]) -> &[u8] {
    while let Some((&b, rest)) = value.split_first() {
        if b != b' ' && b != b'\t' {
            break;
        }
        value = rest;
    }
    while let Some((&b, rest)) = value.split_last() {
        if b != b' ' && b != b'\t' {
            break;
        }
        value = rest;
    }
    value
}

/// tchar of RFC 7230: the characters allowed in tokens such as methods and
/// field names.
fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// NOTE: Callers pass validated ASCII-only bytes.
fn ascii_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_line() {
        let (line, consumed) = parse_request_line(b"GET /x HTTP/1.1\r\nHost:")
            .unwrap()
            .unwrap();
        assert_eq!(line.method, "GET");
        assert_eq!(line.target, "/x");
        assert_eq!(line.version, Version::Http11);
        assert_eq!(consumed, 17);

        let (line, _) = parse_request_line(b"FANCY * HTTP/1.0\r\n").unwrap().unwrap();
        assert_eq!(line.method, "FANCY");
        assert_eq!(line.version, Version::Http10);
    }

    #[test]
    fn request_line_incomplete() {
        assert!(parse_request_line(b"GET / HTTP/1.1").unwrap().is_none());
        assert!(parse_request_line(b"").unwrap().is_none());
    }

    #[test]
    fn request_line_malformed() {
        assert_eq!(parse_request_line(b"GET /\r\n"), Err(HeadError::Malformed));
        assert_eq!(
            parse_request_line(b"GET  / HTTP/1.1\r\n"),
            Err(HeadError::Malformed)
        );
        assert_eq!(
            parse_request_line(b"G{}T / HTTP/1.1\r\n"),
            Err(HeadError::Malformed)
        );
        assert_eq!(
            parse_request_line(b"GET / http/1.1\r\n"),
            Err(HeadError::Malformed)
        );
    }

    #[test]
    fn unsupported_versions() {
        assert_eq!(
            parse_request_line(b"GET / HTTP/2.0\r\n"),
            Err(HeadError::UnsupportedVersion)
        );
        assert_eq!(
            parse_request_line(b"GET / HTTP/1.2\r\n"),
            Err(HeadError::UnsupportedVersion)
        );
        assert_eq!(
            parse_request_line(b"GET / HTTP/0.9\r\n"),
            Err(HeadError::UnsupportedVersion)
        );
    }

    #[test]
    fn field_lines() {
        let (field, consumed) = parse_field_line(b"Host: example.com\r\n\r\n")
            .unwrap()
            .unwrap();
        let field = field.unwrap();
        assert_eq!(field.name, "Host");
        assert_eq!(field.value, "example.com");
        assert_eq!(consumed, 19);

        // Optional whitespace around the value is trimmed.
        let (field, _) = parse_field_line(b"X:  padded \t\r\n").unwrap().unwrap();
        assert_eq!(field.unwrap().value, "padded");

        // The empty line terminates the head.
        let (end, consumed) = parse_field_line(b"\r\nGET").unwrap().unwrap();
        assert!(end.is_none());
        assert_eq!(consumed, 2);
    }

    #[test]
    fn field_line_malformed() {
        assert_eq!(parse_field_line(b"no colon\r\n"), Err(HeadError::Malformed));
        assert_eq!(
            parse_field_line(b"Bad Name: x\r\n"),
            Err(HeadError::Malformed)
        );
        assert_eq!(
            parse_field_line(b"X: a\x01b\r\n"),
            Err(HeadError::Malformed)
        );
    }
}
