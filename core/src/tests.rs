//! Tests for the server's session lifecycle

#[cfg(test)]
mod tests {
    use crate::{ClientId, Config, MemoryTransport, Message, Module, ModuleContext, Server};
    use std::time::{Duration, Instant};

    fn server_with(config: Config) -> Server {
        Server::new(config, "secret", "10.0.0.1")
    }

    fn register(server: &mut Server, nick: &str) -> (ClientId, MemoryTransport) {
        let transport = MemoryTransport::new();
        let id = server.accept(Box::new(transport.clone()));
        server.receive(
            id,
            format!("PASS secret\r\nNICK {}\r\nUSER {} 0 * :{}\r\n", nick, nick, nick).as_bytes(),
        );
        assert!(server.client(id).unwrap().is_registered());
        transport.take_lines();
        (id, transport)
    }

    #[test]
    fn test_ids_follow_accept_order() {
        let mut server = server_with(Config::default());
        let a = server.accept(Box::new(MemoryTransport::new()));
        let b = server.accept(Box::new(MemoryTransport::new()));
        let c = server.accept(Box::new(MemoryTransport::new()));
        assert!(a < b && b < c);
        assert_eq!(server.client_ids(), vec![a, b, c]);
    }

    #[test]
    fn test_lines_after_quit_are_not_dispatched() {
        let mut server = server_with(Config::default());
        let (alice, _alice_out) = register(&mut server, "alice");
        let (bob, bob_out) = register(&mut server, "bob");

        server.receive(alice, b"QUIT :bye\r\nPRIVMSG bob :ghost\r\n");
        assert!(!server.has_client(alice));
        assert!(server.has_client(bob));
        assert!(bob_out.take_lines().is_empty());
    }

    #[test]
    fn test_failed_password_stops_dispatch() {
        let mut server = server_with(Config::default());
        let transport = MemoryTransport::new();
        let id = server.accept(Box::new(transport.clone()));

        server.receive(id, b"PASS wrong\r\nPASS secret\r\nNICK alice\r\n");
        assert!(!server.has_client(id));
        let lines = transport.take_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(" 464 "));
    }

    #[test]
    fn test_recvq_overflow_disconnects() {
        let mut config = Config::default();
        config.connection.max_recvq = 16;
        let mut server = server_with(config);
        let id = server.accept(Box::new(MemoryTransport::new()));

        server.receive(id, b"PING :this line never ends");
        assert!(!server.has_client(id));
    }

    #[test]
    fn test_liveness_sweep_disabled_by_default() {
        let mut server = server_with(Config::default());
        let (alice, out) = register(&mut server, "alice");

        server.sweep_liveness(Instant::now() + Duration::from_secs(3600));
        assert!(server.has_client(alice));
        assert!(out.take_lines().is_empty());
    }

    #[test]
    fn test_liveness_sweep_probes_then_drops() {
        let mut config = Config::default();
        config.connection.ping_frequency = Some(60);
        config.connection.ping_timeout = 30;
        let mut server = server_with(config);
        let (alice, alice_out) = register(&mut server, "alice");
        let (bob, bob_out) = register(&mut server, "bob");
        server.receive(alice, b"JOIN #room\r\n");
        server.receive(bob, b"JOIN #room\r\n");
        alice_out.take_lines();
        bob_out.take_lines();

        let start = Instant::now();
        server.sweep_liveness(start + Duration::from_secs(61));
        assert_eq!(alice_out.take_lines(), vec!["PING :relayircd"]);
        assert_eq!(bob_out.take_lines(), vec!["PING :relayircd"]);

        server.receive(bob, b"PONG :relayircd\r\n");
        server.sweep_liveness(start + Duration::from_secs(95));

        assert!(!server.has_client(alice));
        assert!(server.has_client(bob));
        let lines = bob_out.take_lines();
        assert_eq!(
            lines,
            vec!["PING :relayircd", ":alice!alice@10.0.0.1 QUIT :Ping timeout"]
        );
    }

    #[test]
    fn test_unregistered_sessions_are_not_probed() {
        let mut config = Config::default();
        config.connection.ping_frequency = Some(1);
        let mut server = server_with(config);
        let transport = MemoryTransport::new();
        let id = server.accept(Box::new(transport.clone()));

        server.sweep_liveness(Instant::now() + Duration::from_secs(600));
        assert!(server.has_client(id));
        assert!(transport.take_lines().is_empty());
    }

    #[test]
    fn test_write_failure_disconnects() {
        let mut server = server_with(Config::default());
        let (alice, alice_out) = register(&mut server, "alice");
        let (bob, bob_out) = register(&mut server, "bob");
        server.receive(alice, b"JOIN #room\r\n");
        server.receive(bob, b"JOIN #room\r\n");
        alice_out.take_lines();

        bob_out.break_pipe();
        server.receive(alice, b"PRIVMSG #room :anyone?\r\n");
        assert!(server.has_client(bob));

        server.reap_failed_sessions();
        assert!(!server.has_client(bob));
        assert_eq!(
            alice_out.take_lines(),
            vec![":bob!bob@10.0.0.1 QUIT :Write error"]
        );
        assert_eq!(server.channel("#room").unwrap().member_count(), 1);
    }

    struct ShadowModule;

    impl Module for ShadowModule {
        fn name(&self) -> &str {
            "shadow"
        }

        fn version(&self) -> &str {
            "0.0"
        }

        fn commands(&self) -> &[&'static str] {
            &["JOIN"]
        }

        fn handle_command(
            &mut self,
            _client: &crate::Client,
            _message: &Message,
            _ctx: &ModuleContext<'_>,
        ) -> crate::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_module_cannot_shadow_core_command() {
        let mut server = server_with(Config::default());
        assert!(server.load_module(Box::new(ShadowModule)).is_err());
    }
}
