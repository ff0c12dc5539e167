use async_std::channel;
use async_trait::async_trait;

use crate::errors::*;
use crate::io::{Readable, Writeable};

/// Creates an in-memory unidirectional byte stream. Data written to the
/// writer becomes readable in order; dropping the writer delivers EOF after
/// all buffered data has been read. Two pairs make a full duplex
/// connection, which is how the connection tests run without sockets.
pub fn pipe() -> (PipeWriter, PipeReader) {
    let (sender, receiver) = channel::unbounded();
    (
        PipeWriter { sender },
        PipeReader {
            receiver,
            pending: Vec::new(),
            offset: 0,
        },
    )
}

pub struct PipeWriter {
    sender: channel::Sender<Vec<u8>>,
}

#[async_trait]
impl Writeable for PipeWriter {
    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.sender
            .send(buf.to_vec())
            .await
            .map_err(|_| err_msg("pipe reader closed"))?;
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

pub struct PipeReader {
    receiver: channel::Receiver<Vec<u8>>,
    pending: Vec<u8>,
    offset: usize,
}

#[async_trait]
impl Readable for PipeReader {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.offset == self.pending.len() {
            match self.receiver.recv().await {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.offset = 0;
                }
                // All writers are gone.
                Err(_) => return Ok(0),
            }
        }

        let n = std::cmp::min(buf.len(), self.pending.len() - self.offset);
        buf[..n].copy_from_slice(&self.pending[self.offset..self.offset + n]);
        self.offset += n;
        Ok(n)
    }
}
