//! PASS, NICK and USER, plus the welcome burst

use super::{Server, CHANNEL_MODES};
use crate::client::ClientId;
use crate::message::{relay, strip_trailing, Message};
use crate::numeric::NumericReply;
use crate::utils::string::is_valid_nickname;
use tracing::info;

impl Server {
    pub(super) fn handle_pass(&mut self, id: ClientId, message: &Message) {
        let Some(client) = self.clients.get(&id) else {
            return;
        };

        if client.has_password() {
            self.send_numeric(id, NumericReply::already_registered);
            return;
        }

        let Some(password) = message.param(0) else {
            self.send_numeric(id, |s, n| NumericReply::need_more_params(s, n, "PASS"));
            return;
        };

        if strip_trailing(password) != self.password {
            self.send_numeric(id, NumericReply::password_mismatch);
            self.disconnect(id, "Password incorrect");
            return;
        }

        if let Some(client) = self.clients.get_mut(&id) {
            client.accept_password();
        }
        self.complete_registration(id);
    }

    pub(super) fn handle_nick(&mut self, id: ClientId, message: &Message) {
        let Some(client) = self.clients.get(&id) else {
            return;
        };

        if !client.has_password() {
            self.send_numeric(id, NumericReply::not_registered);
            self.disconnect(id, "Registration without password");
            return;
        }

        let Some(nick) = message.param(0).map(strip_trailing) else {
            self.send_numeric(id, NumericReply::no_nickname_given);
            return;
        };

        if !is_valid_nickname(nick) {
            self.send_numeric(id, |s, n| NumericReply::erroneous_nickname(s, n, nick));
            return;
        }

        if self.find_client_by_nick(nick).is_some_and(|owner| owner != id) {
            self.send_numeric(id, |s, n| NumericReply::nickname_in_use(s, n, nick));
            return;
        }

        let Some(client) = self.clients.get_mut(&id) else {
            return;
        };
        let old_prefix = client.prefix(&self.host);
        client.set_nickname(nick.to_string());

        if client.is_registered() {
            let notice = relay(&old_prefix, "NICK", &[], Some(nick));
            info!("{} is now known as {}", old_prefix, nick);
            let client = &self.clients[&id];
            if client.channels().is_empty() {
                client.send(&notice);
            }
            for name in client.channels() {
                if let Some(channel) = self.channels.get(name) {
                    channel.broadcast(&self.clients, &notice);
                }
            }
            return;
        }

        self.complete_registration(id);
    }

    pub(super) fn handle_user(&mut self, id: ClientId, message: &Message) {
        let Some(client) = self.clients.get(&id) else {
            return;
        };

        if !client.has_password() {
            self.send_numeric(id, NumericReply::not_registered);
            self.disconnect(id, "Registration without password");
            return;
        }

        if client.username().is_some() {
            self.send_numeric(id, NumericReply::already_registered);
            return;
        }

        if message.arg_count() < 5 {
            self.send_numeric(id, |s, n| NumericReply::need_more_params(s, n, "USER"));
            return;
        }

        let realname = &message.params[3];
        if !realname.starts_with(':') {
            self.send_numeric(id, NumericReply::invalid_username);
            return;
        }

        let realname = strip_trailing(realname).to_string();
        if let Some(client) = self.clients.get_mut(&id) {
            client.set_user(
                message.params[0].clone(),
                message.params[1].clone(),
                message.params[2].clone(),
                realname,
            );
        }
        self.complete_registration(id);
    }

    /// Send the welcome burst once password, nickname and username are all in
    fn complete_registration(&mut self, id: ClientId) {
        let Some(client) = self.clients.get_mut(&id) else {
            return;
        };
        if !client.ready_to_register() {
            return;
        }
        client.mark_registered();

        let client = &self.clients[&id];
        let server = self.config.server.name.as_str();
        let nick = client.nick_or_star();
        let mask = client.prefix(&self.host).to_string();

        client.send(&NumericReply::welcome(server, nick, &mask));
        client.send(&NumericReply::your_host(server, nick, &self.config.server.version));
        client.send(&NumericReply::created(server, nick, &self.config.server.created));
        client.send(&NumericReply::my_info(
            server,
            nick,
            &self.config.server.version,
            CHANNEL_MODES,
        ));
        client.send(&NumericReply::motd_start(server, nick));
        for line in &self.config.server.motd {
            client.send(&NumericReply::motd_line(server, nick, line));
        }
        client.send(&NumericReply::motd_end(server, nick));

        info!("Client {} registered as {}", id, mask);
    }
}
