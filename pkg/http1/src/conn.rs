use std::sync::Arc;
use std::time::Duration;

use async_std::future::timeout;
use bytes::{Bytes, BytesMut};
use log::{debug, warn};

use crate::chunked::ChunkedWriter;
use crate::errors::*;
use crate::fields::{dispatch, TransferEncoding};
use crate::io::{Readable, Writeable};
use crate::parser::{parse_field_line, parse_request_line, Field, HeadError, RequestLine, Version};
use crate::request::Request;
use crate::response::Response;
use crate::server::RequestHandler;
use crate::status::write_status_line;

#[derive(Debug, Clone)]
pub struct ConnOptions {
    /// Initial size of the request head buffer.
    pub header_buffer_size: usize,
    /// Size of the buffers the head grows into when a line does not fit.
    pub large_header_buffer_size: usize,
    /// How many large buffers one request head may consume before 431.
    pub large_header_buffers: usize,
    /// Largest accepted Content-Length; anything above answers 413.
    pub max_body_size: usize,

    pub idle_timeout: Duration,
    pub header_read_timeout: Duration,
    pub body_read_timeout: Duration,
    pub send_timeout: Duration,
}

impl Default for ConnOptions {
    fn default() -> Self {
        Self {
            header_buffer_size: 2048,
            large_header_buffer_size: 8192,
            large_header_buffers: 4,
            max_body_size: 8 * 1024 * 1024,
            idle_timeout: Duration::from_secs(180),
            header_read_timeout: Duration::from_secs(30),
            body_read_timeout: Duration::from_secs(30),
            send_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    Idle,
    ReadHeader,
    ReadBody,
    RequestReady,
    Send,
    Close,
}

enum Served {
    Keepalive,
    Close,
}

/// One client connection. Drives the socket through
/// idle -> read-header -> read-body -> request-ready -> send and back to
/// idle (keepalive) or close. All suspension happens at reads, writes and
/// their timeouts; everything else runs straight through on the driving
/// task.
pub struct Connection {
    options: ConnOptions,
    handler: Arc<dyn RequestHandler>,
    state: ConnState,

    /// Unparsed input bytes. After a request completes this may already
    /// hold the start of the next pipelined request.
    buf: BytesMut,
    /// Logical capacity of 'buf'; reads stop at this boundary.
    buf_cap: usize,
    large_buffers_used: usize,

    keepalive: bool,
    chunked: bool,
    head_sent: bool,
}

impl Connection {
    pub fn new(options: ConnOptions, handler: Arc<dyn RequestHandler>) -> Self {
        let header_buffer_size = options.header_buffer_size;
        Self {
            options,
            handler,
            state: ConnState::Idle,
            buf: BytesMut::with_capacity(header_buffer_size),
            buf_cap: header_buffer_size,
            large_buffers_used: 0,
            keepalive: false,
            chunked: false,
            head_sent: false,
        }
    }

    /// Runs the connection until it closes. Orderly closes (including ones
    /// that answered with an error status) return Ok; Err carries transport
    /// failures.
    pub async fn serve(
        mut self,
        mut reader: Box<dyn Readable>,
        mut writer: Box<dyn Writeable>,
    ) -> Result<()> {
        loop {
            match self.serve_request(&mut reader, &mut writer).await? {
                Served::Keepalive => self.reset(),
                Served::Close => {
                    self.set_state(ConnState::Close);
                    return Ok(());
                }
            }
        }
    }

    async fn serve_request(
        &mut self,
        reader: &mut Box<dyn Readable>,
        writer: &mut Box<dyn Writeable>,
    ) -> Result<Served> {
        // Head phase: consume buffered bytes, read more when they run out,
        // growing into large header buffers as needed.
        let mut line: Option<RequestLine> = None;
        let mut fields: Vec<Field> = Vec::new();

        loop {
            match self.parse_some(&mut line, &mut fields) {
                Ok(true) => break,
                Ok(false) => {}
                Err(HeadError::Malformed) => return self.request_error(writer, 400).await,
                Err(HeadError::UnsupportedVersion) => {
                    return self.request_error(writer, 505).await
                }
            }

            if self.buf.len() == self.buf_cap && !self.promote_buffer() {
                return self.request_error(writer, 431).await;
            }

            let idle = line.is_none() && fields.is_empty() && self.buf.is_empty();
            self.set_state(if idle {
                ConnState::Idle
            } else {
                ConnState::ReadHeader
            });
            let wait = if idle {
                self.options.idle_timeout
            } else {
                self.options.header_read_timeout
            };

            match self.read_some(reader, wait).await? {
                None => {
                    debug!("timeout while reading request head");
                    return Ok(Served::Close);
                }
                Some(0) => {
                    if line.is_some() || !fields.is_empty() || !self.buf.is_empty() {
                        debug!("connection closed mid-head");
                    }
                    return Ok(Served::Close);
                }
                Some(_) => {}
            }
        }

        let line = match line {
            Some(line) => line,
            None => unreachable!("head complete without a request line"),
        };
        let version = line.version;

        let recognized = dispatch(&fields, version);
        self.keepalive = recognized.keepalive;

        // Body intake. Chunked request bodies are not supported: the client
        // must retry with a Content-Length. Other encodings are not
        // implemented at all.
        match recognized.transfer_encoding {
            TransferEncoding::Chunked => return self.request_error(writer, 411).await,
            TransferEncoding::Unsupported => return self.request_error(writer, 501).await,
            TransferEncoding::None => {}
        }

        let content_length: u64 = match recognized.content_length.as_deref() {
            None => 0,
            Some(raw) => match raw.parse() {
                Ok(v) => v,
                Err(_) => return self.request_error(writer, 400).await,
            },
        };
        if content_length > self.options.max_body_size as u64 {
            return self.request_error(writer, 413).await;
        }

        // A zero Content-Length and an absent one are the same thing here.
        let body = if content_length == 0 {
            Bytes::new()
        } else {
            match self.read_body(reader, content_length as usize).await? {
                Some(body) => body,
                None => return Ok(Served::Close),
            }
        };

        self.set_state(ConnState::RequestReady);
        let request = Request {
            method: line.method,
            target: line.target,
            version,
            fields,
            host: recognized.host,
            content_type: recognized.content_type,
            cookie: recognized.cookie,
            content_length,
            body,
        };

        let mut response = self.handler.handle_request(request).await;
        self.send_response(writer, version, &mut response).await?;

        if self.keepalive {
            Ok(Served::Keepalive)
        } else {
            Ok(Served::Close)
        }
    }

    /// Consumes as much of the request head as is buffered. Returns true
    /// once the terminating empty line has been seen.
    fn parse_some(
        &mut self,
        line: &mut Option<RequestLine>,
        fields: &mut Vec<Field>,
    ) -> std::result::Result<bool, HeadError> {
        if line.is_none() {
            match parse_request_line(&self.buf)? {
                Some((parsed, consumed)) => {
                    let _ = self.buf.split_to(consumed);
                    *line = Some(parsed);
                }
                None => return Ok(false),
            }
        }

        loop {
            match parse_field_line(&self.buf)? {
                Some((Some(field), consumed)) => {
                    let _ = self.buf.split_to(consumed);
                    fields.push(field);
                }
                Some((None, consumed)) => {
                    let _ = self.buf.split_to(consumed);
                    return Ok(true);
                }
                None => return Ok(false),
            }
        }
    }

    /// Replaces the full head buffer with a large one, carrying the
    /// residual partial line over. Returns false when the limits are
    /// exhausted and the request must be rejected with 431: either the
    /// residual already fills a large buffer, or this head has used up its
    /// allowance of large buffers.
    fn promote_buffer(&mut self) -> bool {
        if self.buf.len() >= self.options.large_header_buffer_size {
            return false;
        }
        if self.large_buffers_used >= self.options.large_header_buffers {
            return false;
        }

        let mut next = BytesMut::with_capacity(self.options.large_header_buffer_size);
        next.extend_from_slice(&self.buf);
        self.buf = next;
        self.buf_cap = self.options.large_header_buffer_size;
        self.large_buffers_used += 1;
        debug!(
            "request head grew into large buffer {}/{}",
            self.large_buffers_used, self.options.large_header_buffers
        );
        true
    }

    /// Reads once into the head buffer. Ok(None) is a timeout.
    async fn read_some(
        &mut self,
        reader: &mut Box<dyn Readable>,
        wait: Duration,
    ) -> Result<Option<usize>> {
        let old_len = self.buf.len();
        self.buf.resize(self.buf_cap, 0);

        match timeout(wait, reader.read(&mut self.buf[old_len..])).await {
            Ok(Ok(n)) => {
                self.buf.truncate(old_len + n);
                Ok(Some(n))
            }
            Ok(Err(e)) => {
                self.buf.truncate(old_len);
                Err(e)
            }
            Err(_) => {
                self.buf.truncate(old_len);
                Ok(None)
            }
        }
    }

    /// Fills a buffer of exactly Content-Length bytes, starting with
    /// whatever was read past the head. The body timer re-arms on every
    /// read. Ok(None) means the connection is beyond saving (timeout or
    /// EOF mid-body) and must close without a response.
    async fn read_body(
        &mut self,
        reader: &mut Box<dyn Readable>,
        length: usize,
    ) -> Result<Option<Bytes>> {
        self.set_state(ConnState::ReadBody);

        let mut body = BytesMut::with_capacity(length);
        let buffered = std::cmp::min(length, self.buf.len());
        body.extend_from_slice(&self.buf.split_to(buffered));

        while body.len() < length {
            let old_len = body.len();
            body.resize(length, 0);

            match timeout(
                self.options.body_read_timeout,
                reader.read(&mut body[old_len..]),
            )
            .await
            {
                Ok(Ok(0)) => {
                    debug!("connection closed mid-body");
                    return Ok(None);
                }
                Ok(Ok(n)) => body.truncate(old_len + n),
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    debug!("timeout while reading request body");
                    return Ok(None);
                }
            }
        }

        Ok(Some(body.freeze()))
    }

    async fn send_response(
        &mut self,
        writer: &mut Box<dyn Writeable>,
        version: Version,
        response: &mut Response,
    ) -> Result<()> {
        self.set_state(ConnState::Send);

        let mut body = response.take_body();
        let body_len = body.len();
        let explicit_length = response.has_field("Content-Length");

        self.chunked = false;
        if body_len.is_none() && !explicit_length {
            if version == Version::Http11 {
                self.chunked = true;
            } else {
                // An HTTP/1.0 client gets the body delimited by the close.
                self.keepalive = false;
            }
        }

        let mut head = Vec::with_capacity(256);
        write_status_line(&mut head, response.status);
        for field in response.fields() {
            if field.skip {
                continue;
            }
            head.extend_from_slice(field.name.as_bytes());
            head.extend_from_slice(b": ");
            head.extend_from_slice(field.value.as_bytes());
            head.extend_from_slice(b"\r\n");
        }
        if !explicit_length {
            if let Some(len) = body_len {
                head.extend_from_slice(format!("Content-Length: {}\r\n", len).as_bytes());
            }
        }
        if self.chunked {
            head.extend_from_slice(b"Transfer-Encoding: chunked\r\n");
        }
        if self.keepalive != version.keepalive_default() {
            head.extend_from_slice(if self.keepalive {
                b"Connection: keep-alive\r\n".as_ref()
            } else {
                b"Connection: close\r\n".as_ref()
            });
        }

        // With chunked framing the head stays open; the first chunk prefix
        // carries the blank line.
        if !self.chunked {
            head.extend_from_slice(b"\r\n");
        }
        self.write_all(writer, &head).await?;
        self.head_sent = true;

        let mut buf = vec![0u8; 8192];
        if self.chunked {
            let mut chunks = ChunkedWriter::new(writer, self.options.send_timeout);
            loop {
                let n = body.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                chunks.write_chunk(&buf[..n]).await?;
            }
            chunks.finish().await?;
        } else {
            loop {
                let n = body.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                self.write_all(writer, &buf[..n]).await?;
            }
        }

        writer.flush().await?;
        Ok(())
    }

    /// Error funnel: every parse, semantic and resource failure lands
    /// here. If the response head has not gone out yet a minimal response
    /// carries the status; either way the connection closes afterwards.
    async fn request_error(
        &mut self,
        writer: &mut Box<dyn Writeable>,
        status: u16,
    ) -> Result<Served> {
        warn!("request error {}", status);
        self.keepalive = false;

        if !self.head_sent {
            let mut head = Vec::with_capacity(96);
            write_status_line(&mut head, status);
            head.extend_from_slice(b"Content-Length: 0\r\nConnection: close\r\n\r\n");
            self.write_all(writer, &head).await?;
            self.head_sent = true;
        }

        Ok(Served::Close)
    }

    async fn write_all(&self, writer: &mut Box<dyn Writeable>, data: &[u8]) -> Result<()> {
        match timeout(self.options.send_timeout, writer.write_all(data)).await {
            Ok(result) => result,
            Err(_) => Err(err_msg("send timeout")),
        }
    }

    /// Keepalive turnaround: per-request state goes away, promoted header
    /// buffers are released, and pipelined residual bytes move to the start
    /// of a fresh buffer.
    fn reset(&mut self) {
        self.chunked = false;
        self.head_sent = false;
        self.large_buffers_used = 0;

        self.buf_cap = std::cmp::max(self.options.header_buffer_size, self.buf.len());
        let mut next = BytesMut::with_capacity(self.buf_cap);
        next.extend_from_slice(&self.buf);
        self.buf = next;

        self.set_state(ConnState::Idle);
    }

    fn set_state(&mut self, state: ConnState) {
        if self.state != state {
            debug!("connection {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{FullBody, UnsizedBody};
    use crate::pipe::pipe;
    use crate::server::{handler_fn, RequestHandler};

    fn small_options() -> ConnOptions {
        ConnOptions {
            idle_timeout: Duration::from_secs(2),
            header_read_timeout: Duration::from_secs(2),
            body_read_timeout: Duration::from_secs(2),
            send_timeout: Duration::from_secs(2),
            ..ConnOptions::default()
        }
    }

    fn echo_handler() -> Arc<dyn RequestHandler> {
        Arc::new(handler_fn(|req: Request| async move {
            let mut res = Response::new(200);
            res.add_field("X-Target", req.target.clone());
            res.set_body(FullBody::new(
                format!(
                    "echo:{}:{}:{}",
                    req.method,
                    req.target,
                    String::from_utf8_lossy(&req.body)
                )
                .into_bytes(),
            ));
            res
        }))
    }

    fn unsized_handler() -> Arc<dyn RequestHandler> {
        Arc::new(handler_fn(|_req: Request| async move {
            Response::new(200).with_body(UnsizedBody::new(&b"hello"[..]))
        }))
    }

    /// Writes 'input' as one client, lets the connection run to completion
    /// and returns its result along with everything the server sent back.
    async fn run_conn(
        options: ConnOptions,
        handler: Arc<dyn RequestHandler>,
        input: &[u8],
    ) -> (Result<()>, Vec<u8>) {
        let (mut client_w, server_r) = pipe();
        let (server_w, mut client_r) = pipe();

        let conn = Connection::new(options, handler);
        let task =
            async_std::task::spawn(conn.serve(Box::new(server_r), Box::new(server_w)));

        // The connection may close before consuming everything we send.
        let _ = client_w.write_all(input).await;
        drop(client_w);

        let result = task.await;

        let mut out = Vec::new();
        loop {
            let mut buf = [0u8; 1024];
            let n = client_r.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }

        (result, out)
    }

    fn count(haystack: &[u8], needle: &str) -> usize {
        if haystack.len() < needle.len() {
            return 0;
        }
        (0..=haystack.len() - needle.len())
            .filter(|i| &haystack[*i..*i + needle.len()] == needle.as_bytes())
            .count()
    }

    #[async_std::test]
    async fn keepalive_is_the_default_for_http11() {
        let (result, out) = run_conn(
            small_options(),
            echo_handler(),
            b"GET /a HTTP/1.1\r\nHost: x\r\n\r\nGET /b HTTP/1.1\r\nHost: x\r\n\r\n",
        )
        .await;

        result.unwrap();
        // Both requests served on one connection, in order, with no
        // explicit Connection field.
        assert_eq!(count(&out, "HTTP/1.1 200 OK\r\n"), 2);
        assert_eq!(count(&out, "Connection:"), 0);
        let a = out.windows(7).position(|w| w == b"echo:GE").unwrap();
        assert!(count(&out[a..], "echo:GET:/a:") == 1);
        assert!(count(&out, "echo:GET:/b:") == 1);
        assert!(
            out.windows(12).position(|w| w == b"echo:GET:/a:").unwrap()
                < out.windows(12).position(|w| w == b"echo:GET:/b:").unwrap()
        );
    }

    #[async_std::test]
    async fn pipelined_post_then_get() {
        let (result, out) = run_conn(
            small_options(),
            echo_handler(),
            b"POST /p HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nhelloGET /g HTTP/1.1\r\nHost: x\r\n\r\n",
        )
        .await;

        result.unwrap();
        assert_eq!(count(&out, "HTTP/1.1 200 OK\r\n"), 2);
        assert_eq!(count(&out, "echo:POST:/p:hello"), 1);
        assert_eq!(count(&out, "echo:GET:/g:"), 1);
    }

    #[async_std::test]
    async fn connection_close_ends_the_connection() {
        let (result, out) = run_conn(
            small_options(),
            echo_handler(),
            b"GET /a HTTP/1.1\r\nConnection: close\r\n\r\nGET /b HTTP/1.1\r\n\r\n",
        )
        .await;

        result.unwrap();
        // Only the first request is served; the explicit close differs from
        // the HTTP/1.1 default so it is echoed in the response.
        assert_eq!(count(&out, "HTTP/1.1 200 OK\r\n"), 1);
        assert_eq!(count(&out, "Connection: close\r\n"), 1);
        assert_eq!(count(&out, "echo:GET:/b:"), 0);
    }

    #[async_std::test]
    async fn connection_close_match_is_case_sensitive() {
        let (result, out) = run_conn(
            small_options(),
            echo_handler(),
            b"GET /a HTTP/1.1\r\nConnection: Close\r\n\r\nGET /b HTTP/1.1\r\n\r\n",
        )
        .await;

        result.unwrap();
        // "Close" is not "close": the connection stays open.
        assert_eq!(count(&out, "HTTP/1.1 200 OK\r\n"), 2);
        assert_eq!(count(&out, "Connection:"), 0);
    }

    #[async_std::test]
    async fn http10_closes_by_default() {
        let (result, out) = run_conn(
            small_options(),
            echo_handler(),
            b"GET /a HTTP/1.0\r\n\r\nGET /b HTTP/1.0\r\n\r\n",
        )
        .await;

        result.unwrap();
        // Close is the version default, so no Connection field is emitted
        // and the second request is never served.
        assert_eq!(count(&out, "HTTP/1.1 200 OK\r\n"), 1);
        assert_eq!(count(&out, "Connection:"), 0);
    }

    #[async_std::test]
    async fn chunked_response_for_http11() {
        let (result, out) = run_conn(
            small_options(),
            unsized_handler(),
            b"GET / HTTP/1.1\r\nHost: x\r\n\r\n",
        )
        .await;

        result.unwrap();
        assert_eq!(count(&out, "Transfer-Encoding: chunked\r\n"), 1);
        assert_eq!(count(&out, "Content-Length:"), 0);
        // Head without blank line, then the chunk and the terminator.
        assert_eq!(count(&out, "chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n"), 1);
    }

    #[async_std::test]
    async fn unsized_response_for_http10_closes_instead() {
        let (result, out) = run_conn(
            small_options(),
            unsized_handler(),
            b"GET / HTTP/1.0\r\n\r\n",
        )
        .await;

        result.unwrap();
        assert_eq!(count(&out, "Transfer-Encoding:"), 0);
        assert_eq!(count(&out, "Content-Length:"), 0);
        // Body runs to the close.
        assert!(out.ends_with(b"\r\n\r\nhello"));
    }

    #[async_std::test]
    async fn oversized_body_is_rejected() {
        let options = ConnOptions {
            max_body_size: 0,
            ..small_options()
        };
        let (result, out) = run_conn(
            options,
            echo_handler(),
            b"POST / HTTP/1.1\r\nContent-Length: 1\r\n\r\nX",
        )
        .await;

        result.unwrap();
        assert!(out.starts_with(b"HTTP/1.1 413 Payload Too Large\r\n"));
        assert_eq!(count(&out, "Connection: close\r\n"), 1);
    }

    #[async_std::test]
    async fn unsupported_transfer_encodings() {
        let (result, out) = run_conn(
            small_options(),
            echo_handler(),
            b"POST / HTTP/1.1\r\nTransfer-Encoding: gzip\r\n\r\n",
        )
        .await;
        result.unwrap();
        assert!(out.starts_with(b"HTTP/1.1 501 Not Implemented\r\n"));

        let (result, out) = run_conn(
            small_options(),
            echo_handler(),
            b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n0\r\n\r\n",
        )
        .await;
        result.unwrap();
        assert!(out.starts_with(b"HTTP/1.1 411 Length Required\r\n"));
    }

    #[async_std::test]
    async fn invalid_content_length() {
        let (result, out) = run_conn(
            small_options(),
            echo_handler(),
            b"POST / HTTP/1.1\r\nContent-Length: abc\r\n\r\n",
        )
        .await;
        result.unwrap();
        assert!(out.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
    }

    #[async_std::test]
    async fn malformed_request_line() {
        let (result, out) = run_conn(small_options(), echo_handler(), b"GARBAGE\r\n\r\n").await;
        result.unwrap();
        assert!(out.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
    }

    #[async_std::test]
    async fn unsupported_version() {
        let (result, out) = run_conn(
            small_options(),
            echo_handler(),
            b"GET / HTTP/2.0\r\n\r\n",
        )
        .await;
        result.unwrap();
        assert!(out.starts_with(b"HTTP/1.1 505 HTTP Version Not Supported\r\n"));
    }

    #[async_std::test]
    async fn large_field_grows_then_overflows() {
        let options = ConnOptions {
            header_buffer_size: 64,
            large_header_buffer_size: 256,
            large_header_buffers: 4,
            ..small_options()
        };

        // Longer than the initial buffer but within a large one.
        let mut ok_request = b"GET / HTTP/1.1\r\nX-Pad: ".to_vec();
        ok_request.extend(std::iter::repeat(b'a').take(100));
        ok_request.extend_from_slice(b"\r\n\r\n");
        let (result, out) = run_conn(options.clone(), echo_handler(), &ok_request).await;
        result.unwrap();
        assert!(out.starts_with(b"HTTP/1.1 200 OK\r\n"));

        // Too long for a large buffer.
        let mut bad_request = b"GET / HTTP/1.1\r\nX-Pad: ".to_vec();
        bad_request.extend(std::iter::repeat(b'a').take(400));
        bad_request.extend_from_slice(b"\r\n\r\n");
        let (result, out) = run_conn(options, echo_handler(), &bad_request).await;
        result.unwrap();
        assert!(out.starts_with(b"HTTP/1.1 431 Request Header Fields Too Large\r\n"));
    }

    #[async_std::test]
    async fn no_large_buffers_allowed() {
        let options = ConnOptions {
            header_buffer_size: 32,
            large_header_buffer_size: 256,
            large_header_buffers: 0,
            ..small_options()
        };

        let mut request = b"GET / HTTP/1.1\r\nX-Pad: ".to_vec();
        request.extend(std::iter::repeat(b'a').take(64));
        request.extend_from_slice(b"\r\n\r\n");
        let (result, out) = run_conn(options, echo_handler(), &request).await;
        result.unwrap();
        assert!(out.starts_with(b"HTTP/1.1 431 Request Header Fields Too Large\r\n"));
    }

    #[async_std::test]
    async fn unknown_status_renders_numeric_only() {
        let handler = Arc::new(handler_fn(|_req: Request| async move {
            Response::new(799)
        }));
        let (result, out) = run_conn(
            small_options(),
            handler,
            b"GET / HTTP/1.1\r\nHost: x\r\n\r\n",
        )
        .await;
        result.unwrap();
        assert!(out.starts_with(b"HTTP/1.1 799\r\nContent-Length: 0\r\n"));
    }

    #[async_std::test]
    async fn header_read_timeout_closes_without_response() {
        let options = ConnOptions {
            header_read_timeout: Duration::from_millis(50),
            ..small_options()
        };

        let (mut client_w, server_r) = pipe();
        let (server_w, mut client_r) = pipe();
        let conn = Connection::new(options, echo_handler());
        let task =
            async_std::task::spawn(conn.serve(Box::new(server_r), Box::new(server_w)));

        // A partial head and then silence. The writer stays open so only
        // the timer can end the connection.
        client_w.write_all(b"GET / HT").await.unwrap();
        task.await.unwrap();

        let mut buf = [0u8; 64];
        assert_eq!(client_r.read(&mut buf).await.unwrap(), 0);
    }
}
