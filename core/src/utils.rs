//! Utility functions for the relay server

/// String utilities
pub mod string {
    /// Characters allowed in nicknames besides ASCII letters and digits
    const NICK_SPECIALS: &str = "[]\\^_{|}";

    /// Longest nickname accepted
    pub const MAX_NICKNAME_LENGTH: usize = 9;

    /// Check if a string is a valid IRC nickname.
    ///
    /// One to nine characters; the first is a letter or special, the rest are
    /// letters, digits or specials.
    pub fn is_valid_nickname(nick: &str) -> bool {
        let mut chars = nick.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => return false,
        };
        if nick.len() > MAX_NICKNAME_LENGTH {
            return false;
        }

        if !first.is_ascii_alphabetic() && !NICK_SPECIALS.contains(first) {
            return false;
        }

        chars.all(|c| c.is_ascii_alphanumeric() || NICK_SPECIALS.contains(c))
    }

    /// Check if a string is a valid channel name: `#` followed by at least one
    /// character, no spaces, commas, colons or control characters
    pub fn is_valid_channel_name(name: &str, max_length: usize) -> bool {
        if name.len() < 2 || name.len() > max_length || !name.starts_with('#') {
            return false;
        }

        name.chars().all(|c| !c.is_control() && c != ' ' && c != ',' && c != ':')
    }
}

/// Network utilities
pub mod network {
    use crate::{Error, Result};
    use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

    /// Check if an IP address is usable as an advertised address
    pub fn is_routable_ip(ip: IpAddr) -> bool {
        !ip.is_loopback() && !ip.is_unspecified()
    }

    /// Discover the address of the outbound network interface.
    ///
    /// Connecting a UDP socket only selects a route; no packet is sent.
    pub fn discover_host_address() -> Result<IpAddr> {
        let probe = SocketAddr::from((Ipv4Addr::new(192, 0, 2, 1), 9));
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .map_err(|e| Error::Startup(format!("Interface discovery failed: {}", e)))?;
        socket
            .connect(probe)
            .map_err(|e| Error::Startup(format!("Interface discovery failed: {}", e)))?;
        let local = socket
            .local_addr()
            .map_err(|e| Error::Startup(format!("Interface discovery failed: {}", e)))?;

        if !is_routable_ip(local.ip()) {
            return Err(Error::Startup(format!(
                "Interface discovery found no usable address (got {})",
                local.ip()
            )));
        }

        Ok(local.ip())
    }
}
