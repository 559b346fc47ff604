//! Receive framing and connection liveness tracking
//!
//! [`RecvQueue`] accumulates bytes from non-blocking reads and hands back
//! complete lines. [`ConnectionTiming`] records the activity and probe
//! timestamps the liveness sweep works from.

use std::time::{Duration, Instant};

/// Receive queue - reassembles LF-delimited lines from partial reads
#[derive(Debug)]
pub struct RecvQueue {
    /// Bytes received but not yet terminated by LF
    buffer: Vec<u8>,
    /// Maximum unterminated bytes tolerated
    max_size: usize,
}

impl RecvQueue {
    /// Create a new receive queue with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_size,
        }
    }

    /// Append raw bytes to the receive buffer
    pub fn append(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Extract every complete line, leaving any partial tail buffered.
    ///
    /// Lines are split on LF; one trailing CR is stripped. Invalid UTF-8 is
    /// replaced rather than rejected.
    pub fn extract_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
            lines.push(String::from_utf8_lossy(&raw).into_owned());
        }

        lines
    }

    /// Whether the unterminated tail has grown past the limit
    pub fn is_overflowing(&self) -> bool {
        self.buffer.len() > self.max_size
    }
}

/// Connection timing information for the liveness sweep
#[derive(Debug, Clone)]
pub struct ConnectionTiming {
    /// Last time a line was received from this connection
    pub last_activity: Instant,
    /// When the outstanding probe was sent, if one is pending
    pub ping_sent: Option<Instant>,
}

impl ConnectionTiming {
    pub fn new(now: Instant) -> Self {
        Self {
            last_activity: now,
            ping_sent: None,
        }
    }

    /// Update last activity timestamp
    pub fn update_activity(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Record that a probe was sent
    pub fn record_ping_sent(&mut self, now: Instant) {
        self.ping_sent = Some(now);
    }

    /// Record a PONG, clearing any outstanding probe
    pub fn record_pong_received(&mut self, now: Instant) {
        self.ping_sent = None;
        self.update_activity(now);
    }

    pub fn probe_outstanding(&self) -> bool {
        self.ping_sent.is_some()
    }

    /// Idle long enough to deserve a probe, and none pending
    pub fn should_send_ping(&self, now: Instant, frequency: Duration) -> bool {
        !self.probe_outstanding() && now.saturating_duration_since(self.last_activity) >= frequency
    }

    /// Outstanding probe left unanswered for at least `timeout`
    pub fn is_timed_out(&self, now: Instant, timeout: Duration) -> bool {
        match self.ping_sent {
            Some(sent) => now.saturating_duration_since(sent) >= timeout,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recvq_basic() {
        let mut recvq = RecvQueue::new(1000);

        recvq.append(b"NICK test\r\n");
        let lines = recvq.extract_lines();
        assert_eq!(lines, vec!["NICK test"]);
        assert!(recvq.extract_lines().is_empty());
    }

    #[test]
    fn test_recvq_partial() {
        let mut recvq = RecvQueue::new(1000);

        recvq.append(b"NICK te");
        assert!(recvq.extract_lines().is_empty());

        recvq.append(b"st\r\nUSER a");
        assert_eq!(recvq.extract_lines(), vec!["NICK test"]);

        recvq.append(b" 0 * :A\n");
        assert_eq!(recvq.extract_lines(), vec!["USER a 0 * :A"]);
    }

    #[test]
    fn test_recvq_bare_lf_and_empty_lines() {
        let mut recvq = RecvQueue::new(1000);

        recvq.append(b"PING a\n\r\nPING b\n");
        assert_eq!(recvq.extract_lines(), vec!["PING a", "", "PING b"]);
    }

    #[test]
    fn test_recvq_only_one_cr_stripped() {
        let mut recvq = RecvQueue::new(1000);

        recvq.append(b"PING a\r\r\n");
        assert_eq!(recvq.extract_lines(), vec!["PING a\r"]);
    }

    #[test]
    fn test_recvq_invalid_utf8_is_replaced() {
        let mut recvq = RecvQueue::new(1000);

        recvq.append(b"PRIVMSG #x :\xff\n");
        let lines = recvq.extract_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("PRIVMSG #x :"));
    }

    #[test]
    fn test_recvq_overflow() {
        let mut recvq = RecvQueue::new(8);

        recvq.append(b"0123456789");
        assert!(recvq.extract_lines().is_empty());
        assert!(recvq.is_overflowing());

        let mut recvq = RecvQueue::new(8);
        recvq.append(b"0123456789\n");
        assert_eq!(recvq.extract_lines().len(), 1);
        assert!(!recvq.is_overflowing());
    }

    #[test]
    fn test_connection_timing() {
        let start = Instant::now();
        let mut timing = ConnectionTiming::new(start);
        let frequency = Duration::from_secs(60);
        let timeout = Duration::from_secs(120);

        assert!(!timing.should_send_ping(start, frequency));
        assert!(timing.should_send_ping(start + frequency, frequency));

        timing.record_ping_sent(start + frequency);
        assert!(timing.probe_outstanding());
        assert!(!timing.should_send_ping(start + frequency * 2, frequency));
        assert!(!timing.is_timed_out(start + frequency + Duration::from_secs(1), timeout));
        assert!(timing.is_timed_out(start + frequency + timeout, timeout));

        timing.record_pong_received(start + frequency * 2);
        assert!(!timing.probe_outstanding());
        assert!(!timing.is_timed_out(start + frequency * 10, timeout));
    }
}
