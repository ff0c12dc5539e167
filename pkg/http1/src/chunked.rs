use std::time::Duration;

use async_std::future::timeout;

use crate::errors::*;
use crate::io::Writeable;

/// Frames body buffers as RFC 7230 chunks. The response head is written
/// without its terminating blank line: the CRLF leading every chunk prefix
/// closes whatever preceded it, and the terminator closes the last chunk,
/// the zero chunk and the (empty) trailer section in one piece.
pub(crate) struct ChunkedWriter<'a, W: Writeable + ?Sized> {
    writer: &'a mut W,
    send_timeout: Duration,
}

impl<'a, W: Writeable + ?Sized> ChunkedWriter<'a, W> {
    pub fn new(writer: &'a mut W, send_timeout: Duration) -> Self {
        Self {
            writer,
            send_timeout,
        }
    }

    pub async fn write_chunk(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let prefix = format!("\r\n{:x}\r\n", data.len());
        self.write_all(prefix.as_bytes()).await?;
        self.write_all(data).await
    }

    pub async fn finish(&mut self) -> Result<()> {
        self.write_all(b"\r\n0\r\n\r\n").await
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match timeout(self.send_timeout, self.writer.write_all(data)).await {
            Ok(result) => result,
            Err(_) => Err(err_msg("send timeout")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Readable;
    use crate::pipe::pipe;

    #[async_std::test]
    async fn framing() {
        let (mut w, mut r) = pipe();

        let collect = async_std::task::spawn(async move {
            let mut out = Vec::new();
            loop {
                let mut buf = [0u8; 64];
                let n = r.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                out.extend_from_slice(&buf[..n]);
            }
            out
        });

        {
            let mut chunks = ChunkedWriter::new(&mut w, Duration::from_secs(1));
            chunks.write_chunk(b"hello").await.unwrap();
            chunks.write_chunk(b"").await.unwrap();
            chunks.write_chunk(b"world!").await.unwrap();
            chunks.finish().await.unwrap();
        }
        drop(w);

        let out = collect.await;
        assert_eq!(&out, b"\r\n5\r\nhello\r\n6\r\nworld!\r\n0\r\n\r\n");
    }
}
