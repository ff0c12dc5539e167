use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::*;

/// A response payload handed over by the upper layer and drained buffer by
/// buffer into the connection.
#[async_trait]
pub trait Body: Send {
    /// The exact payload size when it is known up front. Returning None
    /// makes the connection fall back to chunked framing (HTTP/1.1) or a
    /// close-delimited body (HTTP/1.0).
    fn len(&self) -> Option<usize>;

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

pub struct EmptyBody;

#[async_trait]
impl Body for EmptyBody {
    fn len(&self) -> Option<usize> {
        Some(0)
    }

    async fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Ok(0)
    }
}

/// A fully buffered payload of known size.
pub struct FullBody {
    data: Bytes,
    offset: usize,
}

impl FullBody {
    pub fn new<B: Into<Bytes>>(data: B) -> Box<dyn Body> {
        Box::new(Self {
            data: data.into(),
            offset: 0,
        })
    }
}

#[async_trait]
impl Body for FullBody {
    fn len(&self) -> Option<usize> {
        Some(self.data.len())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = std::cmp::min(buf.len(), self.data.len() - self.offset);
        buf[..n].copy_from_slice(&self.data[self.offset..self.offset + n]);
        self.offset += n;
        Ok(n)
    }
}

/// A buffered payload that does not declare its size, as produced by
/// handlers that stream output of unknown length.
pub struct UnsizedBody {
    inner: FullBody,
}

impl UnsizedBody {
    pub fn new<B: Into<Bytes>>(data: B) -> Box<dyn Body> {
        Box::new(Self {
            inner: FullBody {
                data: data.into(),
                offset: 0,
            },
        })
    }
}

#[async_trait]
impl Body for UnsizedBody {
    fn len(&self) -> Option<usize> {
        None
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.read(buf).await
    }
}
