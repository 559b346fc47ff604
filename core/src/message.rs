//! IRC line tokenizing and outbound line framing

use std::fmt;

/// Longest payload a single outbound line may carry, excluding CRLF
pub const MAX_LINE_LENGTH: usize = 510;

/// Truncate a payload to [`MAX_LINE_LENGTH`] bytes and terminate it with CRLF.
///
/// Truncation never splits a UTF-8 sequence.
pub fn frame(payload: &str) -> String {
    let mut end = payload.len().min(MAX_LINE_LENGTH);
    while !payload.is_char_boundary(end) {
        end -= 1;
    }
    let mut line = String::with_capacity(end + 2);
    line.push_str(&payload[..end]);
    line.push_str("\r\n");
    line
}

/// Remove the trailing-parameter marker from an argument, if present
pub fn strip_trailing(arg: &str) -> &str {
    arg.strip_prefix(':').unwrap_or(arg)
}

/// Message source prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prefix {
    /// Server name
    Server(String),
    /// User prefix; user and host are omitted when unknown
    User {
        nick: String,
        user: Option<String>,
        host: Option<String>,
    },
}

impl Prefix {
    /// Bare nickname prefix
    pub fn nick(nick: &str) -> Self {
        Prefix::User {
            nick: nick.to_string(),
            user: None,
            host: None,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Server(name) => write!(f, "{}", name),
            Prefix::User { nick, user, host } => {
                write!(f, "{}", nick)?;
                if let Some(user) = user {
                    write!(f, "!{}", user)?;
                }
                if let Some(host) = host {
                    write!(f, "@{}", host)?;
                }
                Ok(())
            }
        }
    }
}

/// An inbound command line split into its keyword and raw arguments.
///
/// Arguments are whitespace-separated tokens. The first token that begins
/// with `:` swallows the remainder of the line and keeps its marker; each
/// command decides whether to strip it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Command keyword, compared case-sensitively
    pub command: String,
    /// Raw arguments following the keyword
    pub params: Vec<String>,
}

impl Message {
    /// Tokenize a line. Returns `None` for blank lines.
    ///
    /// A leading `:source` token sent by a client is discarded.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = tokenize(line);
        if tokens.first().is_some_and(|t| t.starts_with(':')) {
            tokens.remove(0);
        }
        if tokens.is_empty() {
            return None;
        }
        let command = tokens.remove(0);
        Some(Self {
            command,
            params: tokens,
        })
    }

    /// Number of tokens including the keyword
    pub fn arg_count(&self) -> usize {
        self.params.len() + 1
    }

    /// Argument at `index`, not counting the keyword
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = line.trim_start_matches(' ');

    while !rest.is_empty() {
        if rest.starts_with(':') && !tokens.is_empty() {
            tokens.push(rest.to_string());
            break;
        }
        match rest.find(' ') {
            Some(end) => {
                tokens.push(rest[..end].to_string());
                rest = rest[end..].trim_start_matches(' ');
            }
            None => {
                tokens.push(rest.to_string());
                break;
            }
        }
    }

    tokens
}

/// Build a framed line relayed on behalf of a source.
///
/// `trailing`, when given, is appended as the final `:`-marked parameter.
pub fn relay(prefix: &Prefix, command: &str, params: &[&str], trailing: Option<&str>) -> String {
    let mut payload = format!(":{} {}", prefix, command);
    for param in params {
        payload.push(' ');
        payload.push_str(param);
    }
    if let Some(trailing) = trailing {
        payload.push_str(" :");
        payload.push_str(trailing);
    }
    frame(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_message() {
        let msg = Message::parse("NICK alice").unwrap();
        assert_eq!(msg.command, "NICK");
        assert_eq!(msg.params, vec!["alice"]);
        assert_eq!(msg.arg_count(), 2);
    }

    #[test]
    fn test_parse_keeps_trailing_marker() {
        let msg = Message::parse("USER alice 0 * :Alice Liddell").unwrap();
        assert_eq!(msg.params, vec!["alice", "0", "*", ":Alice Liddell"]);
        assert_eq!(strip_trailing(&msg.params[3]), "Alice Liddell");
    }

    #[test]
    fn test_parse_trailing_keeps_inner_spacing() {
        let msg = Message::parse("PRIVMSG #test :hello   there ").unwrap();
        assert_eq!(msg.param(1), Some(":hello   there "));
    }

    #[test]
    fn test_parse_collapses_repeated_spaces() {
        let msg = Message::parse("  JOIN    #test   key").unwrap();
        assert_eq!(msg.command, "JOIN");
        assert_eq!(msg.params, vec!["#test", "key"]);
    }

    #[test]
    fn test_parse_discards_client_prefix() {
        let msg = Message::parse(":alice PRIVMSG bob :hi").unwrap();
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["bob", ":hi"]);
    }

    #[test]
    fn test_parse_blank() {
        assert!(Message::parse("").is_none());
        assert!(Message::parse("   ").is_none());
        assert!(Message::parse(":alice").is_none());
    }

    #[test]
    fn test_keyword_case_is_preserved() {
        let msg = Message::parse("join #test").unwrap();
        assert_eq!(msg.command, "join");
    }

    #[test]
    fn test_frame_appends_crlf() {
        assert_eq!(frame("PING :x"), "PING :x\r\n");
    }

    #[test]
    fn test_frame_truncates_long_payload() {
        let long = "a".repeat(600);
        let framed = frame(&long);
        assert_eq!(framed.len(), MAX_LINE_LENGTH + 2);
        assert!(framed.ends_with("\r\n"));
        assert!(!framed[..MAX_LINE_LENGTH].contains('\r'));
    }

    #[test]
    fn test_frame_truncates_on_char_boundary() {
        let long = format!("{}é", "a".repeat(509));
        let framed = frame(&long);
        assert_eq!(framed, format!("{}\r\n", "a".repeat(509)));
    }

    #[test]
    fn test_prefix_display() {
        let full = Prefix::User {
            nick: "alice".to_string(),
            user: Some("al".to_string()),
            host: Some("10.0.0.1".to_string()),
        };
        assert_eq!(full.to_string(), "alice!al@10.0.0.1");
        assert_eq!(Prefix::nick("bob").to_string(), "bob");
        assert_eq!(Prefix::Server("irc.test".to_string()).to_string(), "irc.test");
    }

    #[test]
    fn test_relay() {
        let line = relay(&Prefix::nick("alice"), "PRIVMSG", &["#test"], Some("hello"));
        assert_eq!(line, ":alice PRIVMSG #test :hello\r\n");

        let line = relay(&Prefix::nick("alice"), "MODE", &["#test", "+i"], None);
        assert_eq!(line, ":alice MODE #test +i\r\n");
    }
}
