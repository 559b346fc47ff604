//! JOIN, PART, TOPIC, MODE, KICK and INVITE

use super::Server;
use crate::channel::{Channel, ChannelMode};
use crate::client::{find_by_nick, ClientId};
use crate::message::{relay, strip_trailing, Message};
use crate::numeric::NumericReply;
use crate::utils::string::is_valid_channel_name;
use tracing::{debug, info};

/// Why a channel command is refused before it touches channel state
enum ChannelCheck {
    NoSuchChannel,
    NotOnChannel,
    NotOperator,
}

impl Server {
    /// Confirm the channel exists, the client is on it and, if required, is
    /// an operator there. Sends the matching error on failure.
    fn check_channel_access(&self, id: ClientId, name: &str, need_operator: bool) -> bool {
        let failure = match self.channels.get(name) {
            None => Some(ChannelCheck::NoSuchChannel),
            Some(channel) if !channel.is_member(id) => Some(ChannelCheck::NotOnChannel),
            Some(channel) if need_operator && !channel.is_operator(id) => {
                Some(ChannelCheck::NotOperator)
            }
            Some(_) => None,
        };

        match failure {
            None => true,
            Some(ChannelCheck::NoSuchChannel) => {
                self.send_numeric(id, |s, n| NumericReply::no_such_channel(s, n, name));
                false
            }
            Some(ChannelCheck::NotOnChannel) => {
                self.send_numeric(id, |s, n| NumericReply::not_on_channel(s, n, name));
                false
            }
            Some(ChannelCheck::NotOperator) => {
                self.send_numeric(id, |s, n| NumericReply::chanop_privs_needed(s, n, name));
                false
            }
        }
    }

    pub(super) fn handle_join(&mut self, id: ClientId, message: &Message) {
        let Some(targets) = message.param(0) else {
            self.send_numeric(id, |s, n| NumericReply::need_more_params(s, n, "JOIN"));
            return;
        };
        let keys: Vec<&str> = message
            .param(1)
            .map(|k| k.split(',').collect())
            .unwrap_or_default();

        for (index, name) in targets.split(',').enumerate() {
            if !self.has_client(id) {
                return;
            }
            self.join_channel(id, name, keys.get(index).copied());
        }
    }

    fn join_channel(&mut self, id: ClientId, name: &str, key: Option<&str>) {
        if !is_valid_channel_name(name, self.config.server.max_channel_name_length) {
            self.send_numeric(id, |s, n| NumericReply::bad_channel_mask(s, n, name));
            return;
        }

        match self.channels.get(name) {
            Some(channel) => {
                if channel.is_member(id) {
                    self.send_numeric(id, |s, n| NumericReply::user_on_channel(s, n, n, name));
                    return;
                }
                if !channel.check_key(key) {
                    self.send_numeric(id, |s, n| NumericReply::bad_channel_key(s, n, name));
                    return;
                }
                if channel.is_full() {
                    self.send_numeric(id, |s, n| NumericReply::channel_is_full(s, n, name));
                    return;
                }
                if channel.has_mode(ChannelMode::InviteOnly) && !channel.is_invited(id) {
                    self.send_numeric(id, |s, n| NumericReply::invite_only_channel(s, n, name));
                    return;
                }
                if let Some(channel) = self.channels.get_mut(name) {
                    channel.add_member(id);
                }
            }
            None => {
                let mut channel = Channel::new(name);
                if let Some(key) = key {
                    channel.set_key(Some(key));
                }
                channel.add_member(id);
                channel.set_operator(id, true);
                self.channels.insert(name.to_string(), channel);
                info!("Channel {} created by {}", name, id);
            }
        }

        let Some(client) = self.clients.get_mut(&id) else {
            return;
        };
        client.join_channel(name);

        let client = &self.clients[&id];
        let channel = &self.channels[name];
        let server = self.config.server.name.as_str();
        let nick = client.nick_or_star();

        channel.broadcast(
            &self.clients,
            &relay(&client.prefix(&self.host), "JOIN", &[], Some(name)),
        );

        if let Some(topic) = channel.topic().filter(|t| !t.text.is_empty()) {
            client.send(&NumericReply::topic(server, nick, name, &topic.text));
            client.send(&NumericReply::topic_who_time(
                server,
                nick,
                name,
                &topic.set_by,
                topic.set_at.timestamp(),
            ));
        }
        client.send(&NumericReply::name_reply(
            server,
            nick,
            name,
            &channel.names(&self.clients),
        ));
        client.send(&NumericReply::end_of_names(server, nick, name));
    }

    pub(super) fn handle_part(&mut self, id: ClientId, message: &Message) {
        let Some(targets) = message.param(0) else {
            self.send_numeric(id, |s, n| NumericReply::need_more_params(s, n, "PART"));
            return;
        };
        let reason = message.param(1).map(strip_trailing);

        for name in targets.split(',') {
            if !self.check_channel_access(id, name, false) {
                continue;
            }

            let client = &self.clients[&id];
            let notice = relay(&client.prefix(&self.host), "PART", &[name], reason);
            self.channels[name].broadcast(&self.clients, &notice);
            self.leave_channel(id, name);
        }
    }

    pub(super) fn handle_topic(&mut self, id: ClientId, message: &Message) {
        let Some(name) = message.param(0) else {
            self.send_numeric(id, |s, n| NumericReply::need_more_params(s, n, "TOPIC"));
            return;
        };

        if !self.check_channel_access(id, name, false) {
            return;
        }

        if message.params.len() == 1 {
            let client = &self.clients[&id];
            let server = self.config.server.name.as_str();
            let nick = client.nick_or_star();
            match self.channels[name].topic().filter(|t| !t.text.is_empty()) {
                Some(topic) => {
                    client.send(&NumericReply::topic(server, nick, name, &topic.text));
                    client.send(&NumericReply::topic_who_time(
                        server,
                        nick,
                        name,
                        &topic.set_by,
                        topic.set_at.timestamp(),
                    ));
                }
                None => client.send(&NumericReply::no_topic(server, nick, name)),
            }
            return;
        }

        let channel = &self.channels[name];
        if channel.has_mode(ChannelMode::TopicProtected) && !channel.is_operator(id) {
            self.send_numeric(id, |s, n| NumericReply::chanop_privs_needed(s, n, name));
            return;
        }

        let joined = message.params[1..].join(" ");
        let text = strip_trailing(&joined);
        let client = &self.clients[&id];
        let setter = client.nick_or_star().to_string();
        let prefix = client.prefix(&self.host);

        let max_length = self.config.server.max_topic_length;
        let Some(channel) = self.channels.get_mut(name) else {
            return;
        };
        channel.set_topic(text, &setter, max_length);

        let stored = channel.topic().map(|t| t.text.clone()).unwrap_or_default();
        let notice = relay(&prefix, "TOPIC", &[name], Some(&stored));
        self.channels[name].broadcast(&self.clients, &notice);
    }

    pub(super) fn handle_mode(&mut self, id: ClientId, message: &Message) {
        if message.arg_count() < 3 {
            self.send_numeric(id, |s, n| NumericReply::need_more_params(s, n, "MODE"));
            return;
        }
        let name = message.params[0].as_str();

        if !self.check_channel_access(id, name, true) {
            return;
        }

        let modestring = message.params[1].as_str();
        let mut mode_args = message.params[2..].iter().map(String::as_str);
        let server = self.config.server.name.as_str();
        let nick = self.clients[&id].nick_or_star().to_string();
        let Some(channel) = self.channels.get_mut(name) else {
            return;
        };

        let mut adding = true;
        let mut written_sign = None;
        let mut applied = String::new();
        let mut applied_args: Vec<String> = Vec::new();
        let mut error = None;

        for c in modestring.chars() {
            match c {
                '+' => {
                    adding = true;
                    continue;
                }
                '-' => {
                    adding = false;
                    continue;
                }
                _ => {}
            }

            let result = match ChannelMode::from_char(c) {
                Some(mode @ (ChannelMode::InviteOnly | ChannelMode::TopicProtected)) => {
                    channel.set_mode(mode, adding);
                    Ok(None)
                }
                Some(ChannelMode::Keyed) if adding => match mode_args.next() {
                    None => Err(NumericReply::need_more_params(server, &nick, "MODE")),
                    Some(key) => {
                        if channel.set_key(Some(key)) {
                            Ok(Some(key.to_string()))
                        } else {
                            Err(NumericReply::invalid_mode_param(
                                server,
                                &nick,
                                name,
                                'k',
                                key,
                                "Invalid key",
                            ))
                        }
                    }
                },
                Some(ChannelMode::Keyed) => {
                    channel.set_key(None);
                    Ok(None)
                }
                Some(ChannelMode::Limited) if adding => match mode_args.next() {
                    None => Err(NumericReply::need_more_params(server, &nick, "MODE")),
                    Some(raw) => match raw.parse::<usize>() {
                        Ok(limit) if limit > 0 => {
                            channel.set_limit(Some(limit));
                            Ok(Some(limit.to_string()))
                        }
                        _ => Err(NumericReply::invalid_mode_param(
                            server,
                            &nick,
                            name,
                            'l',
                            raw,
                            "Invalid limit",
                        )),
                    },
                },
                Some(ChannelMode::Limited) => {
                    channel.set_limit(None);
                    Ok(None)
                }
                None if c == 'o' || c == 'v' => match mode_args.next() {
                    None => Err(NumericReply::need_more_params(server, &nick, "MODE")),
                    Some(target) => match find_by_nick(&self.clients, target) {
                        Some(target_id) if channel.is_member(target_id) => {
                            if c == 'o' {
                                channel.set_operator(target_id, adding);
                            } else {
                                channel.set_voice(target_id, adding);
                            }
                            Ok(Some(target.to_string()))
                        }
                        _ => Err(NumericReply::no_such_nick(server, &nick, target)),
                    },
                },
                None => Err(NumericReply::unknown_mode(server, &nick, c)),
            };

            match result {
                Ok(arg) => {
                    if written_sign != Some(adding) {
                        applied.push(if adding { '+' } else { '-' });
                        written_sign = Some(adding);
                    }
                    applied.push(c);
                    applied_args.extend(arg);
                }
                Err(reply) => {
                    error = Some(reply);
                    break;
                }
            }
        }

        if let Some(reply) = error {
            self.send_to(id, &reply);
            return;
        }
        if applied.is_empty() {
            return;
        }

        debug!("{} set mode {} {} on {}", nick, applied, applied_args.join(" "), name);
        let mut params = vec![name, applied.as_str()];
        params.extend(applied_args.iter().map(String::as_str));
        let notice = relay(&self.clients[&id].prefix(&self.host), "MODE", &params, None);
        self.channels[name].broadcast(&self.clients, &notice);
    }

    pub(super) fn handle_kick(&mut self, id: ClientId, message: &Message) {
        if message.arg_count() < 3 {
            self.send_numeric(id, |s, n| NumericReply::need_more_params(s, n, "KICK"));
            return;
        }
        let name = message.params[0].as_str();
        let target = message.params[1].as_str();

        if !self.check_channel_access(id, name, true) {
            return;
        }

        let target_id = match self.find_client_by_nick(target) {
            Some(target_id) if self.channels[name].is_member(target_id) => target_id,
            _ => {
                self.send_numeric(id, |s, n| NumericReply::no_such_nick(s, n, target));
                return;
            }
        };

        let client = &self.clients[&id];
        let reason = message
            .param(2)
            .map(strip_trailing)
            .unwrap_or_else(|| client.nick_or_star());
        let notice = relay(&client.prefix(&self.host), "KICK", &[name, target], Some(reason));
        self.channels[name].broadcast(&self.clients, &notice);

        info!("{} kicked {} from {}", id, target_id, name);
        self.leave_channel(target_id, name);
    }

    pub(super) fn handle_invite(&mut self, id: ClientId, message: &Message) {
        if message.arg_count() < 3 {
            self.send_numeric(id, |s, n| NumericReply::need_more_params(s, n, "INVITE"));
            return;
        }
        let target = message.params[0].as_str();
        let name = message.params[1].as_str();

        let need_operator = self
            .channels
            .get(name)
            .is_some_and(|c| c.has_mode(ChannelMode::InviteOnly));
        if !self.check_channel_access(id, name, need_operator) {
            return;
        }

        let Some(target_id) = self.find_client_by_nick(target) else {
            self.send_numeric(id, |s, n| NumericReply::no_such_nick(s, n, target));
            return;
        };

        if self.channels[name].is_member(target_id) {
            self.send_numeric(id, |s, n| NumericReply::user_on_channel(s, n, target, name));
            return;
        }

        if let Some(channel) = self.channels.get_mut(name) {
            channel.invite(target_id);
        }

        let client = &self.clients[&id];
        let inviting = NumericReply::inviting(
            &self.config.server.name,
            client.nick_or_star(),
            target,
            name,
        );
        self.channels[name].broadcast(&self.clients, &inviting);

        let notice = relay(&client.prefix(&self.host), "INVITE", &[target], Some(name));
        self.send_to(target_id, &notice);
    }
}
