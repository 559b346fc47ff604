//! Session registry and command dispatch
//!
//! [`Server`] owns every session and channel. The event loop feeds it
//! accepted transports and received bytes; everything else happens through
//! the command handlers in the submodules.

mod channel_commands;
mod connection_commands;
mod messaging;
mod registration;

use crate::channel::Channel;
use crate::client::{find_by_nick, Client, ClientId, ClientRegistry};
use crate::config::Config;
use crate::connection::Transport;
use crate::message::{frame, relay, Message};
use crate::module::{Module, ModuleContext, ModuleManager};
use crate::numeric::NumericReply;
use crate::Result;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

type CommandHandler = fn(&mut Server, ClientId, &Message);

/// A built-in command
#[derive(Clone, Copy)]
struct CoreCommand {
    handler: CommandHandler,
    /// Rejected with ERR_NOTREGISTERED before registration completes
    requires_registration: bool,
}

/// Channel modes advertised in RPL_MYINFO
pub const CHANNEL_MODES: &str = "iklotv";

/// Reason sent with a quit notice when the peer goes away silently
pub const DEFAULT_QUIT_REASON: &str = "Leaving";

/// Central server state
pub struct Server {
    config: Config,
    password: String,
    /// Advertised host used in `nick!user@host` prefixes
    host: String,
    clients: ClientRegistry,
    channels: HashMap<String, Channel>,
    commands: HashMap<&'static str, CoreCommand>,
    modules: ModuleManager,
    next_client_id: u64,
}

impl Server {
    /// Create a server with the given connection password and advertised host
    pub fn new(config: Config, password: impl Into<String>, host: impl Into<String>) -> Self {
        let mut server = Self {
            config,
            password: password.into(),
            host: host.into(),
            clients: ClientRegistry::new(),
            channels: HashMap::new(),
            commands: HashMap::new(),
            modules: ModuleManager::new(),
            next_client_id: 0,
        };
        server.register_core_commands();
        server
    }

    fn register_core_commands(&mut self) {
        let table: [(&'static str, CommandHandler, bool); 14] = [
            ("CAP", Server::handle_cap, false),
            ("PASS", Server::handle_pass, false),
            ("NICK", Server::handle_nick, false),
            ("USER", Server::handle_user, false),
            ("PING", Server::handle_ping, false),
            ("PONG", Server::handle_pong, false),
            ("QUIT", Server::handle_quit, false),
            ("JOIN", Server::handle_join, true),
            ("PART", Server::handle_part, true),
            ("PRIVMSG", Server::handle_privmsg, true),
            ("TOPIC", Server::handle_topic, true),
            ("MODE", Server::handle_mode, true),
            ("KICK", Server::handle_kick, true),
            ("INVITE", Server::handle_invite, true),
        ];

        for (name, handler, requires_registration) in table {
            self.commands.insert(
                name,
                CoreCommand {
                    handler,
                    requires_registration,
                },
            );
        }
    }

    /// Load an optional module. Its keywords may not shadow built-in commands.
    pub fn load_module(&mut self, module: Box<dyn Module>) -> Result<()> {
        let reserved: Vec<&str> = self.commands.keys().copied().collect();
        self.modules.load(module, &reserved)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn server_name(&self) -> &str {
        &self.config.server.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn has_client(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Sessions in accept order
    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    /// Session ids in accept order
    pub fn client_ids(&self) -> Vec<ClientId> {
        self.clients.keys().copied().collect()
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Exact-match nickname lookup
    pub fn find_client_by_nick(&self, nick: &str) -> Option<ClientId> {
        find_by_nick(&self.clients, nick)
    }

    /// Take ownership of a freshly accepted transport
    pub fn accept(&mut self, transport: Box<dyn Transport>) -> ClientId {
        let id = ClientId(self.next_client_id);
        self.next_client_id += 1;

        let client = Client::new(id, transport, self.config.connection.max_recvq);
        info!("Client {} connected from {:?}", id, client.remote_addr());
        self.clients.insert(id, client);
        id
    }

    /// Feed bytes read from a session and dispatch every line they complete.
    ///
    /// Dispatch stops as soon as a line causes the session to be removed.
    pub fn receive(&mut self, id: ClientId, data: &[u8]) {
        let lines = match self.clients.get_mut(&id) {
            Some(client) => client.receive(data),
            None => return,
        };

        for line in lines {
            if !self.has_client(id) {
                return;
            }
            self.handle_line(id, &line);
        }

        if self.clients.get(&id).is_some_and(Client::recvq_overflowing) {
            warn!("Client {} exceeded the receive queue limit", id);
            self.disconnect(id, "Excess Flood");
        }
    }

    /// Tokenize and dispatch one line from a session
    pub fn handle_line(&mut self, id: ClientId, line: &str) {
        let Some(message) = Message::parse(line) else {
            return;
        };
        let Some(client) = self.clients.get_mut(&id) else {
            return;
        };
        client.timing_mut().update_activity(Instant::now());
        let registered = client.is_registered();

        debug!("{} -> {}", id, line);

        if let Some(command) = self.commands.get(message.command.as_str()).copied() {
            if command.requires_registration && !registered {
                self.send_numeric(id, NumericReply::not_registered);
                return;
            }
            (command.handler)(self, id, &message);
            return;
        }

        if self.modules.handles(&message.command) {
            self.dispatch_to_module(id, &message);
            return;
        }

        self.send_numeric(id, |server, nick| {
            NumericReply::unknown_command(server, nick, &message.command)
        });
    }

    fn dispatch_to_module(&mut self, id: ClientId, message: &Message) {
        let Some(client) = self.clients.get(&id) else {
            return;
        };
        let ctx = ModuleContext {
            server_name: &self.config.server.name,
        };

        match self.modules.dispatch(client, message, &ctx) {
            Some(Ok(lines)) => {
                for line in lines {
                    client.send(&line);
                }
            }
            Some(Err(e)) => warn!("Module failed on {} from {}: {}", message.command, id, e),
            None => {}
        }
    }

    /// Remove a session: leave every channel, tell the remaining members,
    /// destroy channels left empty, then drop the session and its transport.
    pub fn disconnect(&mut self, id: ClientId, reason: &str) {
        let Some(client) = self.clients.remove(&id) else {
            return;
        };

        let quit = relay(&client.prefix(&self.host), "QUIT", &[], Some(reason));
        for name in client.channels() {
            let Some(channel) = self.channels.get_mut(name) else {
                continue;
            };
            channel.remove_member(id);
            if channel.is_empty() {
                self.channels.remove(name);
                info!("Channel {} destroyed", name);
            } else {
                channel.broadcast(&self.clients, &quit);
            }
        }

        info!(
            "Client {} ({}) disconnected: {}",
            id,
            client.nick_or_star(),
            reason
        );
    }

    /// Disconnect every session whose transport reported a write error
    pub fn reap_failed_sessions(&mut self) {
        let failed: Vec<ClientId> = self
            .clients
            .values()
            .filter(|c| c.has_write_failed())
            .map(Client::id)
            .collect();

        for id in failed {
            self.disconnect(id, "Write error");
        }
    }

    /// Probe idle sessions and drop those whose probe went unanswered.
    ///
    /// A no-op unless `connection.ping_frequency` is configured.
    pub fn sweep_liveness(&mut self, now: Instant) {
        let Some(frequency) = self.config.connection.ping_frequency else {
            return;
        };
        let frequency = Duration::from_secs(frequency);
        let timeout = Duration::from_secs(self.config.connection.ping_timeout);

        let mut expired = Vec::new();
        for (id, client) in self.clients.iter_mut() {
            if !client.is_registered() {
                continue;
            }
            if client.timing().is_timed_out(now, timeout) {
                expired.push(*id);
            } else if client.timing().should_send_ping(now, frequency) {
                client.send(&frame(&format!("PING :{}", self.config.server.name)));
                client.timing_mut().record_ping_sent(now);
            }
        }

        for id in expired {
            self.disconnect(id, "Ping timeout");
        }
    }

    /// Write a framed line to one session
    fn send_to(&self, id: ClientId, line: &str) {
        if let Some(client) = self.clients.get(&id) {
            client.send(line);
        }
    }

    /// Build a reply from the server name and the session's nickname, then send it
    fn send_numeric<F>(&self, id: ClientId, build: F)
    where
        F: FnOnce(&str, &str) -> String,
    {
        if let Some(client) = self.clients.get(&id) {
            client.send(&build(&self.config.server.name, client.nick_or_star()));
        }
    }

    /// Drop a member from a channel on both sides, destroying the channel if
    /// it empties
    fn leave_channel(&mut self, id: ClientId, name: &str) {
        if let Some(client) = self.clients.get_mut(&id) {
            client.part_channel(name);
        }
        let Some(channel) = self.channels.get_mut(name) else {
            return;
        };
        channel.remove_member(id);
        if channel.is_empty() {
            self.channels.remove(name);
            info!("Channel {} destroyed", name);
        }
    }
}
