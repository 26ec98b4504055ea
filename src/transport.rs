//! Transport trait for inbound byte sources

use std::net::SocketAddr;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tracing::trace;

use crate::{ReceiverError, Result};

/// A single inbound stream of bytes.
///
/// Chunk boundaries carry no meaning. A chunk may hold part of a frame,
/// several frames, or both.
#[async_trait::async_trait]
pub trait Transport: Send + 'static {
    /// Read the next chunk of bytes into `buf`.
    ///
    /// Returns:
    /// - `Ok(n)` with `n > 0` - `n` bytes were written to the front of `buf`
    /// - `Ok(0)` - the peer closed the stream
    /// - `Err(e)` - the read failed and the stream is unusable
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Address of the connected peer.
    fn peer_addr(&self) -> SocketAddr;
}

/// An accepted TCP connection.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TcpTransport {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self { stream, peer }
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let read = self
            .stream
            .read(buf)
            .await
            .map_err(|e| {
                ReceiverError::transport_failed(format!("reading from {}", self.peer), e)
            })?;
        trace!(peer = %self.peer, bytes = read, "Read chunk");
        Ok(read)
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}
