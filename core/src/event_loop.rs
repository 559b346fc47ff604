//! Single-task readiness loop
//!
//! One task owns the listener and the [`Server`]. Each iteration waits until
//! the listener or any session is readable, accepts at most one connection,
//! then services every readable session in accept order with one
//! non-blocking read each. Nothing else runs concurrently with dispatch.

use crate::client::ClientId;
use crate::config::Config;
use crate::server::{Server, DEFAULT_QUIT_REASON};
use crate::utils::network::discover_host_address;
use crate::{Error, Result};
use std::future::poll_fn;
use std::io;
use std::net::SocketAddr;
use std::task::Poll;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How often the liveness sweep wakes an otherwise idle loop
const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// What became ready during one wait
#[derive(Default)]
struct Readiness {
    accepted: Option<(TcpStream, SocketAddr)>,
    readable: Vec<ClientId>,
}

/// The server's event loop
pub struct EventLoop {
    listener: TcpListener,
    server: Server,
    shutdown: CancellationToken,
    read_buf: Vec<u8>,
    sweep_enabled: bool,
}

impl EventLoop {
    /// Bind the listening socket and build the server.
    ///
    /// The advertised host comes from `server.host` or, when unset, from
    /// interface discovery. Both bind and discovery failures are fatal.
    pub async fn bind(
        config: Config,
        port: u16,
        password: String,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let host = match &config.server.host {
            Some(host) => host.clone(),
            None => discover_host_address()?.to_string(),
        };

        let bind_address = config.connection.bind_address.as_str();
        let listener = TcpListener::bind((bind_address, port)).await.map_err(|e| {
            Error::Startup(format!("Failed to bind {}:{}: {}", bind_address, port, e))
        })?;

        info!("Advertising host {}", host);
        Ok(Self::new(listener, Server::new(config, password, host), shutdown))
    }

    /// Assemble a loop from an already bound listener
    pub fn new(listener: TcpListener, server: Server, shutdown: CancellationToken) -> Self {
        let read_buf = vec![0u8; server.config().connection.read_buffer_size];
        let sweep_enabled = server.config().connection.ping_frequency.is_some();
        Self {
            listener,
            server,
            shutdown,
            read_buf,
            sweep_enabled,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut Server {
        &mut self.server
    }

    /// Run until the shutdown token is cancelled.
    ///
    /// Cancellation is checked at the top of each iteration; an iteration in
    /// progress always completes. Open sessions are released when the loop
    /// is dropped.
    pub async fn run(&mut self) -> Result<()> {
        info!("Listening on {}", self.local_addr()?);

        loop {
            if self.shutdown.is_cancelled() {
                info!("Shutdown requested, leaving event loop");
                return Ok(());
            }

            let readiness = tokio::select! {
                _ = self.shutdown.cancelled() => continue,
                readiness = wait_ready(&self.listener, &self.server) => readiness,
                _ = sweep_tick(self.sweep_enabled) => Readiness::default(),
            };

            if let Some((stream, addr)) = readiness.accepted {
                debug!("Accepted connection from {}", addr);
                self.server.accept(Box::new(stream));
            }

            for id in readiness.readable {
                self.service(id);
            }

            self.server.reap_failed_sessions();
            self.server.sweep_liveness(Instant::now());
        }
    }

    /// One non-blocking read from a readable session
    fn service(&mut self, id: ClientId) {
        let result = match self.server.client(id) {
            Some(client) => client.transport().try_read(&mut self.read_buf),
            None => return,
        };

        match result {
            Ok(0) => self.server.disconnect(id, DEFAULT_QUIT_REASON),
            Ok(n) => self.server.receive(id, &self.read_buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                debug!("Read from {} failed: {}", id, e);
                self.server.disconnect(id, DEFAULT_QUIT_REASON);
            }
        }
    }
}

/// Wait until the listener has a connection or any session is readable
async fn wait_ready(listener: &TcpListener, server: &Server) -> Readiness {
    poll_fn(|cx| {
        let mut readiness = Readiness::default();
        let mut woke = false;

        match listener.poll_accept(cx) {
            Poll::Ready(Ok(conn)) => {
                readiness.accepted = Some(conn);
                woke = true;
            }
            Poll::Ready(Err(e)) => {
                warn!("Accept failed: {}", e);
                woke = true;
            }
            Poll::Pending => {}
        }

        for client in server.clients() {
            if client.transport().poll_read_ready(cx).is_ready() {
                readiness.readable.push(client.id());
            }
        }

        if woke || !readiness.readable.is_empty() {
            Poll::Ready(readiness)
        } else {
            Poll::Pending
        }
    })
    .await
}

async fn sweep_tick(enabled: bool) {
    if enabled {
        tokio::time::sleep(SWEEP_INTERVAL).await;
    } else {
        std::future::pending::<()>().await;
    }
}
