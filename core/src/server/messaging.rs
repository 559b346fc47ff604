//! PRIVMSG relay

use super::Server;
use crate::client::ClientId;
use crate::message::{relay, strip_trailing, Message};
use crate::numeric::NumericReply;

impl Server {
    pub(super) fn handle_privmsg(&mut self, id: ClientId, message: &Message) {
        if message.arg_count() != 3 {
            self.send_numeric(id, |s, n| NumericReply::need_more_params(s, n, "PRIVMSG"));
            return;
        }
        let target = message.params[0].as_str();
        let text = strip_trailing(&message.params[1]);

        if text.is_empty() {
            self.send_numeric(id, NumericReply::no_text_to_send);
            return;
        }

        let line = relay(&self.clients[&id].nick_prefix(), "PRIVMSG", &[target], Some(text));

        if target.starts_with('#') {
            match self.channels.get(target) {
                None => {
                    self.send_numeric(id, |s, n| NumericReply::no_such_nick(s, n, target));
                }
                Some(channel) if !channel.is_member(id) => {
                    self.send_numeric(id, |s, n| NumericReply::not_on_channel(s, n, target));
                }
                Some(channel) => channel.broadcast_except(&self.clients, &line, Some(id)),
            }
            return;
        }

        match self.find_client_by_nick(target) {
            Some(recipient) => self.send_to(recipient, &line),
            None => self.send_numeric(id, |s, n| NumericReply::no_such_nick(s, n, target)),
        }
    }
}
