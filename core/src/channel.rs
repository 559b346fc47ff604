//! Channel state: membership, privileges and modes

use crate::client::{ClientId, ClientRegistry};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Longest channel key accepted, in bytes
pub const MAX_KEY_LENGTH: usize = 64;

/// Channel-wide mode flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    /// `i`: joining requires an invitation
    InviteOnly,
    /// `t`: only operators may change the topic
    TopicProtected,
    /// `k`: joining requires the key
    Keyed,
    /// `l`: membership is capped
    Limited,
}

impl ChannelMode {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'i' => Some(ChannelMode::InviteOnly),
            't' => Some(ChannelMode::TopicProtected),
            'k' => Some(ChannelMode::Keyed),
            'l' => Some(ChannelMode::Limited),
            _ => None,
        }
    }
}

/// Channel topic with setter bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub text: String,
    pub set_by: String,
    pub set_at: DateTime<Utc>,
}

/// An IRC channel.
///
/// Members are kept in join order. The operator, voice and invitation sets
/// hold client ids only; removing a member clears it from the operator and
/// voice sets and consumes any invitation.
#[derive(Debug, Clone)]
pub struct Channel {
    name: String,
    members: Vec<ClientId>,
    operators: HashSet<ClientId>,
    voiced: HashSet<ClientId>,
    invited: HashSet<ClientId>,
    modes: HashSet<ChannelMode>,
    /// Present exactly while `Keyed` is set
    key: Option<String>,
    /// Present exactly while `Limited` is set
    limit: Option<usize>,
    /// `None` when never set; an empty text is a cleared topic
    topic: Option<Topic>,
    created_at: DateTime<Utc>,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            operators: HashSet::new(),
            voiced: HashSet::new(),
            invited: HashSet::new(),
            modes: HashSet::new(),
            key: None,
            limit: None,
            topic: None,
            created_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Add a member; returns false if already present
    pub fn add_member(&mut self, id: ClientId) -> bool {
        if self.is_member(id) {
            return false;
        }
        self.members.push(id);
        true
    }

    /// Remove a member along with its privileges and invitation
    pub fn remove_member(&mut self, id: ClientId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| *m != id);
        self.operators.remove(&id);
        self.voiced.remove(&id);
        self.invited.remove(&id);
        self.members.len() != before
    }

    pub fn is_member(&self, id: ClientId) -> bool {
        self.members.contains(&id)
    }

    pub fn members(&self) -> &[ClientId] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Grant or revoke operator status; ignored for non-members
    pub fn set_operator(&mut self, id: ClientId, operator: bool) {
        if operator && self.is_member(id) {
            self.operators.insert(id);
        } else if !operator {
            self.operators.remove(&id);
        }
    }

    pub fn is_operator(&self, id: ClientId) -> bool {
        self.operators.contains(&id)
    }

    /// Grant or revoke voice; ignored for non-members
    pub fn set_voice(&mut self, id: ClientId, voice: bool) {
        if voice && self.is_member(id) {
            self.voiced.insert(id);
        } else if !voice {
            self.voiced.remove(&id);
        }
    }

    pub fn is_voiced(&self, id: ClientId) -> bool {
        self.voiced.contains(&id)
    }

    pub fn invite(&mut self, id: ClientId) {
        self.invited.insert(id);
    }

    pub fn is_invited(&self, id: ClientId) -> bool {
        self.invited.contains(&id)
    }

    pub fn has_mode(&self, mode: ChannelMode) -> bool {
        self.modes.contains(&mode)
    }

    /// Toggle a flag mode (`i` or `t`). Key and limit go through their setters.
    pub fn set_mode(&mut self, mode: ChannelMode, enabled: bool) {
        match mode {
            ChannelMode::Keyed | ChannelMode::Limited => {}
            _ if enabled => {
                self.modes.insert(mode);
            }
            _ => {
                self.modes.remove(&mode);
            }
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Set or clear the key. Keys must be 1 to 64 bytes; returns false and
    /// leaves the channel untouched otherwise.
    pub fn set_key(&mut self, key: Option<&str>) -> bool {
        match key {
            Some(key) if key.is_empty() || key.len() > MAX_KEY_LENGTH => false,
            Some(key) => {
                self.key = Some(key.to_string());
                self.modes.insert(ChannelMode::Keyed);
                true
            }
            None => {
                self.key = None;
                self.modes.remove(&ChannelMode::Keyed);
                true
            }
        }
    }

    /// Whether a join attempt with `provided` passes the key check
    pub fn check_key(&self, provided: Option<&str>) -> bool {
        match &self.key {
            Some(key) => provided == Some(key.as_str()),
            None => true,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Set or clear the member cap; a cap of zero clears it
    pub fn set_limit(&mut self, limit: Option<usize>) {
        match limit {
            Some(limit) if limit > 0 => {
                self.limit = Some(limit);
                self.modes.insert(ChannelMode::Limited);
            }
            _ => {
                self.limit = None;
                self.modes.remove(&ChannelMode::Limited);
            }
        }
    }

    pub fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.members.len() >= limit)
    }

    pub fn topic(&self) -> Option<&Topic> {
        self.topic.as_ref()
    }

    /// Replace the topic, truncating to `max_length` bytes on a char boundary
    pub fn set_topic(&mut self, text: &str, set_by: &str, max_length: usize) {
        let mut end = text.len().min(max_length);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        self.topic = Some(Topic {
            text: text[..end].to_string(),
            set_by: set_by.to_string(),
            set_at: Utc::now(),
        });
    }

    /// Space-separated member nicknames, operators prefixed with `@` and
    /// voiced members with `+`
    pub fn names(&self, clients: &ClientRegistry) -> String {
        self.members
            .iter()
            .filter_map(|id| {
                let client = clients.get(id)?;
                let marker = if self.is_operator(*id) {
                    "@"
                } else if self.is_voiced(*id) {
                    "+"
                } else {
                    ""
                };
                Some(format!("{}{}", marker, client.nick_or_star()))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Write a line to every member in join order
    pub fn broadcast(&self, clients: &ClientRegistry, line: &str) {
        self.broadcast_except(clients, line, None);
    }

    /// Write a line to every member except `skip`
    pub fn broadcast_except(&self, clients: &ClientRegistry, line: &str, skip: Option<ClientId>) {
        for id in &self.members {
            if Some(*id) == skip {
                continue;
            }
            if let Some(client) = clients.get(id) {
                client.send(line);
            }
        }
    }
}
