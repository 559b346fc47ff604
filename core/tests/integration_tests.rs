//! Integration tests for the event loop over real TCP connections

use relayircd_core::*;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

/// Run `script` against a live event loop, then shut the loop down
async fn with_server<F, Fut>(script: F)
where
    F: FnOnce(SocketAddr) -> Fut,
    Fut: Future<Output = ()>,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = Config::default();
    config.server.name = "irc.test".to_string();
    let shutdown = CancellationToken::new();
    let mut event_loop = EventLoop::new(
        listener,
        Server::new(config, "secret", "127.0.0.1"),
        shutdown.clone(),
    );

    let (result, ()) = tokio::join!(event_loop.run(), async {
        script(addr).await;
        shutdown.cancel();
    });
    assert!(result.is_ok());
}

struct TestClient {
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, writer) = stream.into_split();
        Self {
            reader: BufReader::new(read).lines(),
            writer,
        }
    }

    async fn write_raw(&mut self, data: &str) {
        self.writer.write_all(data.as_bytes()).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn send(&mut self, line: &str) {
        self.write_raw(&format!("{}\r\n", line)).await;
    }

    async fn expect_line(&mut self) -> String {
        timeout(WAIT, self.reader.next_line())
            .await
            .expect("timed out waiting for a line")
            .expect("read failed")
            .expect("connection closed")
    }

    async fn expect_closed(&mut self) {
        let result = timeout(WAIT, self.reader.next_line())
            .await
            .expect("timed out waiting for close");
        assert!(matches!(result, Ok(None) | Err(_)));
    }

    /// Register and consume the welcome burst, returning its first line
    async fn register(addr: SocketAddr, nick: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client.send("PASS secret").await;
        client.send(&format!("NICK {}", nick)).await;
        client.send(&format!("USER {} 0 * :{}", nick, nick)).await;

        let welcome = client.expect_line().await;
        assert!(welcome.starts_with(&format!(":irc.test 001 {} ", nick)));
        for _ in 0..6 {
            client.expect_line().await;
        }
        client
    }
}

#[tokio::test]
async fn test_registration_over_tcp() {
    with_server(|addr| async move {
        let mut alice = TestClient::connect(addr).await;
        alice
            .write_raw("PASS secret\r\nNICK alice\r\nUSER alice 0 * :Alice\r\n")
            .await;

        assert_eq!(
            alice.expect_line().await,
            ":irc.test 001 alice :Welcome to the Internet Relay Network alice!alice@127.0.0.1"
        );
        let mut last = String::new();
        for _ in 0..6 {
            last = alice.expect_line().await;
        }
        assert_eq!(last, ":irc.test 376 alice :End of /MOTD command");
    })
    .await;
}

#[tokio::test]
async fn test_split_writes_are_reassembled() {
    with_server(|addr| async move {
        let mut client = TestClient::connect(addr).await;
        client.write_raw("PASS sec").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.write_raw("ret\r\nPI").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.write_raw("NG :hello\n").await;

        assert_eq!(client.expect_line().await, ":irc.test PONG irc.test :hello");
    })
    .await;
}

#[tokio::test]
async fn test_channel_message_over_tcp() {
    with_server(|addr| async move {
        let mut alice = TestClient::register(addr, "alice").await;
        alice.send("JOIN #test").await;
        assert_eq!(alice.expect_line().await, ":alice!alice@127.0.0.1 JOIN :#test");
        alice.expect_line().await;
        alice.expect_line().await;

        let mut bob = TestClient::register(addr, "bob").await;
        bob.send("JOIN #test").await;
        assert_eq!(bob.expect_line().await, ":bob!bob@127.0.0.1 JOIN :#test");
        assert_eq!(bob.expect_line().await, ":irc.test 353 bob = #test :@alice bob");
        bob.expect_line().await;
        assert_eq!(alice.expect_line().await, ":bob!bob@127.0.0.1 JOIN :#test");

        alice.send("PRIVMSG #test :hello").await;
        assert_eq!(bob.expect_line().await, ":alice PRIVMSG #test :hello");
    })
    .await;
}

#[tokio::test]
async fn test_peer_close_sends_quit_notice() {
    with_server(|addr| async move {
        let mut alice = TestClient::register(addr, "alice").await;
        alice.send("JOIN #test").await;
        for _ in 0..3 {
            alice.expect_line().await;
        }

        let mut bob = TestClient::register(addr, "bob").await;
        bob.send("JOIN #test").await;
        for _ in 0..3 {
            bob.expect_line().await;
        }

        drop(alice);
        assert_eq!(
            bob.expect_line().await,
            ":alice!alice@127.0.0.1 QUIT :Leaving"
        );
    })
    .await;
}

#[tokio::test]
async fn test_wrong_password_closes_connection() {
    with_server(|addr| async move {
        let mut client = TestClient::connect(addr).await;
        client.send("PASS nope").await;
        assert_eq!(client.expect_line().await, ":irc.test 464 * :Password incorrect");
        client.expect_closed().await;
    })
    .await;
}

#[tokio::test]
async fn test_quit_closes_connection() {
    with_server(|addr| async move {
        let mut alice = TestClient::register(addr, "alice").await;
        alice.send("QUIT :done").await;
        alice.expect_closed().await;

        // The nickname is free again
        TestClient::register(addr, "alice").await;
    })
    .await;
}

#[tokio::test]
async fn test_cancellation_stops_idle_loop() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let shutdown = CancellationToken::new();
    let mut event_loop = EventLoop::new(
        listener,
        Server::new(Config::default(), "secret", "127.0.0.1"),
        shutdown.clone(),
    );
    assert!(event_loop.local_addr().unwrap().port() > 0);

    shutdown.cancel();
    let result = timeout(WAIT, event_loop.run()).await.unwrap();
    assert!(result.is_ok());
    assert_eq!(event_loop.server().client_count(), 0);
}
