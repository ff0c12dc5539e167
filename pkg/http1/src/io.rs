use async_std::net::TcpStream;
use async_trait::async_trait;
use futures::io::{AsyncReadExt, AsyncWriteExt};

use crate::errors::*;

/// Byte source half of a connection. The event engine driving readiness is
/// whatever async executor polls the returned futures.
#[async_trait]
pub trait Readable: Send {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    async fn read_exact(&mut self, mut buf: &mut [u8]) -> Result<()> {
        while !buf.is_empty() {
            let n = self.read(buf).await?;
            if n == 0 {
                return Err(err_msg("unexpected end of stream"));
            }
            buf = &mut buf[n..];
        }
        Ok(())
    }
}

/// Byte sink half of a connection.
#[async_trait]
pub trait Writeable: Send {
    async fn write(&mut self, buf: &[u8]) -> Result<usize>;

    async fn flush(&mut self) -> Result<()>;

    async fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let n = self.write(buf).await?;
            if n == 0 {
                return Err(err_msg("stream closed while writing"));
            }
            buf = &buf[n..];
        }
        Ok(())
    }
}

#[async_trait]
impl<R: Readable + ?Sized> Readable for Box<R> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.as_mut().read(buf).await
    }
}

#[async_trait]
impl<W: Writeable + ?Sized> Writeable for Box<W> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.as_mut().write(buf).await
    }

    async fn flush(&mut self) -> Result<()> {
        self.as_mut().flush().await
    }
}

#[async_trait]
impl Readable for TcpStream {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = AsyncReadExt::read(self, buf).await?;
        Ok(n)
    }
}

#[async_trait]
impl Writeable for TcpStream {
    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let n = AsyncWriteExt::write(self, buf).await?;
        Ok(n)
    }

    async fn flush(&mut self) -> Result<()> {
        AsyncWriteExt::flush(self).await?;
        Ok(())
    }
}
