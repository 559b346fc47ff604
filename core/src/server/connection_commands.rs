//! CAP, PING, PONG and QUIT

use super::{Server, DEFAULT_QUIT_REASON};
use crate::client::ClientId;
use crate::message::{frame, strip_trailing, Message};
use crate::numeric::NumericReply;
use std::time::Instant;

impl Server {
    /// Capability negotiation stub: nothing is offered, every request is refused
    pub(super) fn handle_cap(&mut self, id: ClientId, message: &Message) {
        let Some(subcommand) = message.param(0) else {
            self.send_numeric(id, |s, n| NumericReply::need_more_params(s, n, "CAP"));
            return;
        };

        let server = self.config.server.name.as_str();
        let reply = match subcommand.to_ascii_uppercase().as_str() {
            "LS" => Some(format!(":{} CAP * LS :", server)),
            "LIST" => Some(format!(":{} CAP * LIST :", server)),
            "REQ" => {
                let requested = message.param(1).map(strip_trailing).unwrap_or_default();
                Some(format!(":{} CAP * NAK :{}", server, requested))
            }
            "END" => None,
            _ => {
                self.send_numeric(id, |s, n| NumericReply::invalid_cap_command(s, n, subcommand));
                return;
            }
        };

        if let Some(reply) = reply {
            self.send_to(id, &frame(&reply));
        }
    }

    pub(super) fn handle_ping(&mut self, id: ClientId, message: &Message) {
        let Some(payload) = message.param(0) else {
            self.send_numeric(id, |s, n| NumericReply::need_more_params(s, n, "PING"));
            return;
        };

        let server = self.config.server.name.as_str();
        let pong = frame(&format!(
            ":{} PONG {} :{}",
            server,
            server,
            strip_trailing(payload)
        ));
        self.send_to(id, &pong);
    }

    pub(super) fn handle_pong(&mut self, id: ClientId, _message: &Message) {
        if let Some(client) = self.clients.get_mut(&id) {
            client.timing_mut().record_pong_received(Instant::now());
        }
    }

    pub(super) fn handle_quit(&mut self, id: ClientId, message: &Message) {
        let reason = message
            .param(0)
            .map(strip_trailing)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_QUIT_REASON);
        self.disconnect(id, reason);
    }
}
