//! Client session management

use crate::buffer::{ConnectionTiming, RecvQueue};
use crate::connection::Transport;
use crate::message::Prefix;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;

/// Identifier of a connected session, assigned in accept order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// All live sessions, iterated in accept order
pub type ClientRegistry = BTreeMap<ClientId, Client>;

/// Exact-match nickname lookup
pub fn find_by_nick(clients: &ClientRegistry, nick: &str) -> Option<ClientId> {
    clients
        .values()
        .find(|c| c.nickname() == Some(nick))
        .map(Client::id)
}

/// Registration progress of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Connected, password not yet accepted
    Connected,
    /// Password accepted, nickname and/or username still missing
    Authenticated,
    /// Welcome burst sent
    Registered,
}

/// A connected client session.
///
/// The session exclusively owns its transport; dropping the session closes
/// the connection.
pub struct Client {
    id: ClientId,
    transport: Box<dyn Transport>,
    /// Peer address, if the transport knows it
    remote_addr: Option<SocketAddr>,
    state: ClientState,
    nickname: Option<String>,
    username: Option<String>,
    /// Hostname and servername as given in USER
    hostname: Option<String>,
    servername: Option<String>,
    realname: Option<String>,
    /// Away message, when away
    away: Option<String>,
    /// Global operator flag
    operator: bool,
    /// Names of joined channels, in join order
    channels: Vec<String>,
    recvq: RecvQueue,
    timing: ConnectionTiming,
    /// Set when a write fails; the event loop then drops the session
    write_failed: Cell<bool>,
}

impl Client {
    pub fn new(id: ClientId, transport: Box<dyn Transport>, max_recvq: usize) -> Self {
        let remote_addr = transport.peer_addr();
        Self {
            id,
            transport,
            remote_addr,
            state: ClientState::Connected,
            nickname: None,
            username: None,
            hostname: None,
            servername: None,
            realname: None,
            away: None,
            operator: false,
            channels: Vec::new(),
            recvq: RecvQueue::new(max_recvq),
            timing: ConnectionTiming::new(Instant::now()),
            write_failed: Cell::new(false),
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn has_password(&self) -> bool {
        self.state != ClientState::Connected
    }

    /// Record that the connection password was accepted
    pub fn accept_password(&mut self) {
        if self.state == ClientState::Connected {
            self.state = ClientState::Authenticated;
        }
    }

    pub fn is_registered(&self) -> bool {
        self.state == ClientState::Registered
    }

    /// Password, nickname and username all present, welcome not yet sent
    pub fn ready_to_register(&self) -> bool {
        self.state == ClientState::Authenticated
            && self.nickname.is_some()
            && self.username.is_some()
    }

    pub fn mark_registered(&mut self) {
        self.state = ClientState::Registered;
    }

    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    /// Nickname, or `*` while none is set
    pub fn nick_or_star(&self) -> &str {
        self.nickname.as_deref().unwrap_or("*")
    }

    pub fn set_nickname(&mut self, nickname: String) {
        self.nickname = Some(nickname);
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn servername(&self) -> Option<&str> {
        self.servername.as_deref()
    }

    pub fn realname(&self) -> Option<&str> {
        self.realname.as_deref()
    }

    /// Record the identity fields carried by USER
    pub fn set_user(
        &mut self,
        username: String,
        hostname: String,
        servername: String,
        realname: String,
    ) {
        self.username = Some(username);
        self.hostname = Some(hostname);
        self.servername = Some(servername);
        self.realname = Some(realname);
    }

    pub fn away_message(&self) -> Option<&str> {
        self.away.as_deref()
    }

    pub fn is_away(&self) -> bool {
        self.away.is_some()
    }

    pub fn set_away(&mut self, message: Option<String>) {
        self.away = message;
    }

    pub fn is_operator(&self) -> bool {
        self.operator
    }

    pub fn set_operator(&mut self, operator: bool) {
        self.operator = operator;
    }

    /// Full `nick!user@host` prefix using the given host
    pub fn prefix(&self, host: &str) -> Prefix {
        Prefix::User {
            nick: self.nick_or_star().to_string(),
            user: self.username.clone(),
            host: Some(host.to_string()),
        }
    }

    /// Bare nickname prefix
    pub fn nick_prefix(&self) -> Prefix {
        Prefix::nick(self.nick_or_star())
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn is_in_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }

    /// Remember a joined channel
    pub fn join_channel(&mut self, channel: &str) {
        if !self.is_in_channel(channel) {
            self.channels.push(channel.to_string());
        }
    }

    /// Forget a channel
    pub fn part_channel(&mut self, channel: &str) {
        self.channels.retain(|c| c != channel);
    }

    /// Write a framed line to the transport.
    ///
    /// Never waits: output the peer cannot take right now is dropped. A hard
    /// write error marks the session for removal.
    pub fn send(&self, line: &str) {
        match self.transport.send(line.as_bytes()) {
            Ok(n) if n < line.len() => {
                tracing::debug!("Short write to {}: {}/{} bytes", self.id, n, line.len());
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                tracing::debug!("Send buffer full for {}, dropping line", self.id);
            }
            Err(e) => {
                tracing::debug!("Write to {} failed: {}", self.id, e);
                self.write_failed.set(true);
            }
        }
    }

    pub fn has_write_failed(&self) -> bool {
        self.write_failed.get()
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Buffer received bytes and return the lines they complete
    pub fn receive(&mut self, data: &[u8]) -> Vec<String> {
        self.recvq.append(data);
        self.recvq.extract_lines()
    }

    /// Unterminated input exceeded the receive queue limit
    pub fn recvq_overflowing(&self) -> bool {
        self.recvq.is_overflowing()
    }

    pub fn timing(&self) -> &ConnectionTiming {
        &self.timing
    }

    pub fn timing_mut(&mut self) -> &mut ConnectionTiming {
        &mut self.timing
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("remote_addr", &self.remote_addr)
            .field("state", &self.state)
            .field("nickname", &self.nickname)
            .field("username", &self.username)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}
