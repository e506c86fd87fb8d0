//! A receiver running on loopback with its output captured.

use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use snmp_trapd::receiver::StatsHandle;
use snmp_trapd::{EventEmitter, ReceiverState, ReceiverStats, Result, TrapReceiver};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);
const NO_REPLY_WAIT: Duration = Duration::from_millis(200);

/// In-memory event sink shared with the test.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<serde_json::Value> {
        self.contents()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct RunningReceiver {
    pub addr: SocketAddr,
    pub out: SharedBuf,
    pub state: watch::Receiver<ReceiverState>,
    stats: StatsHandle,
    client: UdpSocket,
    shutdown: CancellationToken,
    task: JoinHandle<Result<ReceiverStats>>,
}

impl RunningReceiver {
    /// Start a receiver on `127.0.0.1:0` accepting `communities`.
    pub async fn start(communities: &[&str]) -> Self {
        Self::start_with(communities, |b| b).await
    }

    /// Start with extra builder settings.
    pub async fn start_with(
        communities: &[&str],
        configure: impl FnOnce(snmp_trapd::TrapReceiverBuilder) -> snmp_trapd::TrapReceiverBuilder,
    ) -> Self {
        let out = SharedBuf::default();
        let builder = TrapReceiver::builder()
            .bind("127.0.0.1:0".parse().unwrap())
            .communities(communities)
            .emitter(EventEmitter::new(out.clone()));
        let receiver = configure(builder).build().await.unwrap();

        let addr = receiver.local_addr();
        let state = receiver.state();
        let stats = receiver.stats_handle();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(receiver.run(shutdown.clone()));

        let mut listening = state.clone();
        tokio::time::timeout(
            WAIT_TIMEOUT,
            listening.wait_for(|s| *s == ReceiverState::Listening),
        )
        .await
        .expect("receiver did not start listening")
        .unwrap();

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        Self {
            addr,
            out,
            state,
            stats,
            client,
            shutdown,
            task,
        }
    }

    /// The address datagrams are sent from.
    pub fn client_addr(&self) -> SocketAddr {
        self.client.local_addr().unwrap()
    }

    pub async fn send(&self, datagram: &[u8]) {
        self.client.send_to(datagram, self.addr).await.unwrap();
    }

    /// Fail if anything arrives at the sending socket within `NO_REPLY_WAIT`.
    pub async fn assert_no_reply(&self) {
        let mut buf = [0u8; 1500];
        let reply = tokio::time::timeout(NO_REPLY_WAIT, self.client.recv_from(&mut buf)).await;
        assert!(reply.is_err(), "receiver replied: {:?}", reply);
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats.snapshot()
    }

    /// Wait until `n` datagrams have been fully handled, whatever the outcome.
    pub async fn wait_handled(&self, n: u64) {
        let handled = |s: ReceiverStats| s.emitted + s.auth_rejected + s.decode_failed + s.emit_failed;
        tokio::time::timeout(WAIT_TIMEOUT, async {
            while handled(self.stats()) < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {} datagrams: {:?}", n, self.stats()));
    }

    /// Cancel the receiver and return its final counters.
    pub async fn stop(self) -> (ReceiverStats, ReceiverState) {
        self.shutdown.cancel();
        let stats = tokio::time::timeout(WAIT_TIMEOUT, self.task)
            .await
            .expect("receiver did not stop")
            .unwrap()
            .unwrap();
        let state = *self.state.borrow();
        (stats, state)
    }
}
