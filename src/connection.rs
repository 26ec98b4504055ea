//! Listening socket and spawned-session handle
//!
//! The receiver accepts exactly one client. The listener is consumed by
//! [`Listener::accept_one`], so a second connection is never accepted.

use futures::{Stream, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::driver::DriverChannels;
use crate::render::RenderEvent;
use crate::session::SessionSummary;
use crate::transport::TcpTransport;
use crate::{ReceiverError, Result};

/// A bound listening socket waiting for its single client.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind `address` with address reuse enabled.
    ///
    /// Must be called inside a tokio runtime.
    pub fn bind(address: SocketAddr) -> Result<Self> {
        let bind_err = |source| ReceiverError::Bind { address, source };

        let socket = if address.is_ipv4() { TcpSocket::new_v4() } else { TcpSocket::new_v6() };
        let socket = socket.map_err(bind_err)?;
        socket.set_reuseaddr(true).map_err(bind_err)?;
        #[cfg(unix)]
        socket.set_reuseport(true).map_err(bind_err)?;
        socket.bind(address).map_err(bind_err)?;
        let inner = socket.listen(1).map_err(bind_err)?;
        let local_addr = inner.local_addr().map_err(bind_err)?;

        info!("Listening on {}", local_addr);
        Ok(Self { inner, local_addr })
    }

    /// Address actually bound, with the real port when 0 was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for one client and stop listening.
    pub async fn accept_one(self) -> Result<TcpTransport> {
        let (stream, peer) =
            self.inner.accept().await.map_err(|source| ReceiverError::Accept { source })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle on {}: {}", peer, e);
        }
        info!("Accepted connection from {}", peer);
        Ok(TcpTransport::new(stream, peer))
    }
}

/// Handle to a session running on its own task.
pub struct ReceiverHandle {
    events: watch::Receiver<Option<Arc<RenderEvent>>>,
    peer: SocketAddr,
    cancel: CancellationToken,
    task: Option<JoinHandle<Option<SessionSummary>>>,
}

impl ReceiverHandle {
    /// Wrap the channels of a session spawned with [`Driver::spawn`](crate::driver::Driver::spawn).
    pub fn from_channels(channels: DriverChannels, peer: SocketAddr) -> Self {
        let DriverChannels { events, cancel, task } = channels;
        Self { events, peer, cancel, task: Some(task) }
    }

    /// Stream of render events, newest first when the observer lags.
    ///
    /// Ends when the session ends.
    pub fn updates(&self) -> impl Stream<Item = Arc<RenderEvent>> + 'static {
        WatchStream::new(self.events.clone()).filter_map(|opt| async move { opt })
    }

    /// Most recent render event.
    pub fn latest(&self) -> Option<Arc<RenderEvent>> {
        self.events.borrow().clone()
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Stop the session without waiting for the peer.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Wait for the session to end. `None` if it was cancelled.
    pub async fn finished(mut self) -> Option<SessionSummary> {
        let task = self.task.take()?;
        task.await.ok().flatten()
    }
}

impl Drop for ReceiverHandle {
    fn drop(&mut self) {
        debug!("Dropping receiver handle");
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Transport;
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn bind_reports_the_assigned_port() {
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        assert_ne!(listener.local_addr().port(), 0);

        let client = TcpStream::connect(listener.local_addr()).await.unwrap();
        let transport = listener.accept_one().await.unwrap();
        assert_eq!(transport.peer_addr(), client.local_addr().unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn port_can_be_rebound_while_listening() {
        let first = Listener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let second = Listener::bind(first.local_addr()).expect("address and port are reusable");
        assert_eq!(second.local_addr(), first.local_addr());
    }
}
