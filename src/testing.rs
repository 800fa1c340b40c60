//! In-memory host stub for tests.

use std::time::Duration;

use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};
use tokio::time::timeout;

use crate::identifiers::WindowId;
use crate::protocol::Envelope;
use crate::protocol::command::{WINDOW_CREATE, WINDOW_CREATE_RESPONSE};
use crate::shell::{Session, Window, WindowOptions};
use crate::transport::Channel;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// The host end of an in-memory channel.
pub(crate) struct HostStub {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl HostStub {
    /// Creates a connected channel and its host end.
    pub(crate) fn pair() -> (Channel, Self) {
        let (local, remote) = tokio::io::duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(local);
        let (remote_reader, remote_writer) = tokio::io::split(remote);

        let stub = Self {
            lines: BufReader::new(remote_reader).lines(),
            writer: remote_writer,
        };
        (Channel::new(reader, writer), stub)
    }

    /// Receives the next command sent by the session.
    pub(crate) async fn recv(&mut self) -> Envelope {
        let line = timeout(RECV_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for a command")
            .expect("stub read failed")
            .expect("session closed the channel");
        Envelope::decode(line.as_bytes()).expect("session sent a malformed line")
    }

    /// Asserts that nothing arrives for a short while.
    pub(crate) async fn expect_silence(&mut self) {
        let next = timeout(Duration::from_millis(100), self.lines.next_line()).await;
        assert!(next.is_err(), "unexpected command: {next:?}");
    }

    /// Sends a command to the session.
    pub(crate) async fn send(&mut self, command_id: &str, body: &str) {
        let line = Envelope::new(command_id, body.as_bytes().to_vec())
            .and_then(|envelope| envelope.encode())
            .expect("stub command encodes");
        self.send_raw(line.as_bytes()).await;
    }

    /// Writes one raw line, adding the delimiter.
    pub(crate) async fn send_raw(&mut self, line: &[u8]) {
        self.writer.write_all(line).await.expect("stub write failed");
        self.writer.write_all(b"\n").await.expect("stub write failed");
        self.writer.flush().await.expect("stub flush failed");
    }

    /// Answers one `window_create` with `window_id`, echoing its request ID.
    pub(crate) async fn create_window(&mut self, session: &Session, window_id: i64) -> Window {
        let creating = tokio::spawn({
            let session = session.clone();
            async move { session.create_window(&WindowOptions::new()).await }
        });

        let request = self.recv().await;
        assert_eq!(request.command_id(), WINDOW_CREATE);
        let value: serde_json::Value =
            serde_json::from_slice(request.body()).expect("create body is JSON");
        let reply = serde_json::json!({
            "WindowID": window_id,
            "RequestID": value["RequestID"],
        });
        self.send(WINDOW_CREATE_RESPONSE, &reply.to_string()).await;

        let window = creating
            .await
            .expect("create task panicked")
            .expect("create should succeed");
        assert_eq!(window.id(), WindowId::new(window_id));
        window
    }
}

/// A session wired to a host stub.
pub(crate) fn connected_session() -> (Session, HostStub) {
    let (channel, stub) = HostStub::pair();
    (Session::from_channel(channel), stub)
}

/// A session with one open window.
pub(crate) async fn open_window(window_id: i64) -> (Window, HostStub) {
    let (session, mut stub) = connected_session();
    let window = stub.create_window(&session, window_id).await;
    (window, stub)
}
