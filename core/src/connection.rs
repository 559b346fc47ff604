//! Byte transports underneath client sessions

use std::cell::{Cell, RefCell};
use std::io;
use std::net::SocketAddr;
use std::rc::Rc;
use std::task::{Context, Poll};
use tokio::net::TcpStream;

/// Non-blocking byte transport owned by a session.
///
/// The event loop polls read readiness and drains with `try_read`; replies
/// are pushed with `send`, which never waits for the peer.
pub trait Transport {
    /// Register interest in readability and report whether it is ready now
    fn poll_read_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>>;

    /// Read whatever is available without waiting
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write as much of `data` as the transport accepts right now
    fn send(&self, data: &[u8]) -> io::Result<usize>;

    fn peer_addr(&self) -> Option<SocketAddr>;
}

impl Transport for TcpStream {
    fn poll_read_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        TcpStream::poll_read_ready(self, cx)
    }

    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        TcpStream::try_read(self, buf)
    }

    fn send(&self, data: &[u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < data.len() {
            match self.try_write(&data[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if written == 0 => return Err(e),
                Err(_) => break,
            }
        }
        Ok(written)
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        TcpStream::peer_addr(self).ok()
    }
}

/// In-memory transport that records everything sent through it.
///
/// Clones share the same output buffer, so a caller can keep one handle
/// while the session owns the other. It never becomes readable.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    output: Rc<RefCell<Vec<u8>>>,
    broken: Rc<Cell<bool>>,
    peer: Option<SocketAddr>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport reporting the given peer address
    pub fn with_peer(peer: SocketAddr) -> Self {
        Self {
            peer: Some(peer),
            ..Self::default()
        }
    }

    /// Make every later send fail as if the peer reset the connection
    pub fn break_pipe(&self) {
        self.broken.set(true);
    }

    /// Drain the recorded output as CRLF-terminated lines, terminators removed
    pub fn take_lines(&self) -> Vec<String> {
        let bytes = std::mem::take(&mut *self.output.borrow_mut());
        String::from_utf8_lossy(&bytes)
            .split_terminator("\r\n")
            .map(str::to_string)
            .collect()
    }

    /// Drain the recorded output verbatim
    pub fn take_output(&self) -> String {
        let bytes = std::mem::take(&mut *self.output.borrow_mut());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Transport for MemoryTransport {
    fn poll_read_ready(&self, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Pending
    }

    fn try_read(&self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::ErrorKind::WouldBlock.into())
    }

    fn send(&self, data: &[u8]) -> io::Result<usize> {
        if self.broken.get() {
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        self.output.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}
