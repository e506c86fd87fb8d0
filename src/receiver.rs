//! UDP trap receive loop.
//!
//! ```text
//! Starting --build()--> Listening --cancel--> ShuttingDown --drain--> Stopped
//!                           |
//!                           +-- per datagram, on a worker:
//!                               Decoding -> Validating -> Normalizing -> Emitting
//! ```
//!
//! The loop only reads. Each datagram is copied out of the receive buffer and
//! handed to a worker; at most `workers` datagrams are in flight, and when
//! all workers are busy the loop stops reading so the kernel buffer absorbs
//! the burst. A failure in any stage drops that datagram and nothing else.
//! Nothing is ever sent back to a trap source.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::{Semaphore, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::ber::tag;
use crate::community::CommunityValidator;
use crate::emit::EventEmitter;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::event::TrapEvent;
use crate::message::TrapMessage;
use crate::util::bind_udp_socket;

/// Standard trap port.
pub const DEFAULT_PORT: u16 = 162;
/// Default worker pool size.
pub const DEFAULT_WORKERS: usize = 4;
/// Largest UDP payload.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 65535;
/// Smallest message size every SNMP implementation must accept (RFC 3417).
pub const MIN_MAX_MESSAGE_SIZE: usize = 484;
/// Pipelines slower than this are logged.
pub const DEFAULT_SLOW_DECODE_THRESHOLD: Duration = Duration::from_millis(50);

const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(10);
const MAX_RECV_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Pause before reading again after `failures` consecutive receive errors.
/// The first retry is immediate, then the pause doubles up to a second.
fn recv_error_backoff(failures: u32) -> Duration {
    if failures <= 1 {
        return Duration::ZERO;
    }
    RECV_ERROR_BACKOFF
        .saturating_mul(1 << (failures - 2).min(16))
        .min(MAX_RECV_ERROR_BACKOFF)
}

/// Lifecycle of a [`TrapReceiver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Starting,
    Listening,
    ShuttingDown,
    Stopped,
}

/// Pipeline stage a datagram was in, reported when it is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decoding,
    Validating,
    Normalizing,
    Emitting,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::Decoding => "decoding",
            Stage::Validating => "validating",
            Stage::Normalizing => "normalizing",
            Stage::Emitting => "emitting",
        }
    }
}

/// Counter snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Datagrams read from the socket.
    pub received: u64,
    /// Events written to the output.
    pub emitted: u64,
    /// Datagrams with a community not in the accepted set.
    pub auth_rejected: u64,
    /// Datagrams that did not decode to a complete trap.
    pub decode_failed: u64,
    /// Events that could not be written.
    pub emit_failed: u64,
    /// Socket receive errors.
    pub recv_errors: u64,
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    emitted: AtomicU64,
    auth_rejected: AtomicU64,
    decode_failed: AtomicU64,
    emit_failed: AtomicU64,
    recv_errors: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ReceiverStats {
        ReceiverStats {
            received: self.received.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
            auth_rejected: self.auth_rejected.load(Ordering::Relaxed),
            decode_failed: self.decode_failed.load(Ordering::Relaxed),
            emit_failed: self.emit_failed.load(Ordering::Relaxed),
            recv_errors: self.recv_errors.load(Ordering::Relaxed),
        }
    }
}

/// Read-only view of a receiver's counters, usable while it runs.
#[derive(Debug, Clone)]
pub struct StatsHandle(Arc<Counters>);

impl StatsHandle {
    pub fn snapshot(&self) -> ReceiverStats {
        self.0.snapshot()
    }
}

/// Immutable receiver settings.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    pub bind_addr: SocketAddr,
    pub workers: usize,
    pub max_message_size: usize,
    pub recv_buffer_size: Option<usize>,
    pub slow_decode_threshold: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            workers: DEFAULT_WORKERS,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            recv_buffer_size: None,
            slow_decode_threshold: DEFAULT_SLOW_DECODE_THRESHOLD,
        }
    }
}

/// Everything a worker needs, shared across all of them.
struct Pipeline {
    validator: CommunityValidator,
    emitter: EventEmitter,
    counters: Arc<Counters>,
    slow_threshold: Duration,
}

impl Pipeline {
    fn handle(&self, data: Bytes, source: SocketAddr) {
        let started = Instant::now();
        let len = data.len();

        match self.process(data, source) {
            Ok(event) => {
                Counters::bump(&self.counters.emitted);
                tracing::trace!(
                    snmp.source = %source,
                    snmp.trap_oid = %event.trap_oid,
                    snmp.binds = event.binds.len(),
                    "trap emitted"
                );
            }
            Err((stage, err)) => self.record_failure(stage, &err, source),
        }

        let elapsed = started.elapsed();
        if elapsed > self.slow_threshold {
            tracing::warn!(
                snmp.source = %source,
                snmp.bytes = len,
                elapsed_ms = elapsed.as_millis() as u64,
                "slow trap pipeline"
            );
        }
    }

    fn process(
        &self,
        data: Bytes,
        source: SocketAddr,
    ) -> std::result::Result<TrapEvent, (Stage, Error)> {
        let msg = TrapMessage::decode(data, source).map_err(|e| (Stage::Decoding, e))?;

        if !self.validator.validate(&msg.community) {
            return Err((Stage::Validating, Error::AuthRejected { peer: source }));
        }

        let event = TrapEvent::normalize(&msg).map_err(|e| (Stage::Normalizing, e))?;

        self.emitter
            .emit(&event)
            .map_err(|e| (Stage::Emitting, e))?;
        Ok(event)
    }

    fn record_failure(&self, stage: Stage, err: &Error, source: SocketAddr) {
        match err {
            Error::AuthRejected { .. } => {
                Counters::bump(&self.counters.auth_rejected);
                tracing::warn!(snmp.source = %source, "trap rejected: unknown community");
            }
            Error::OutputWrite { .. } => {
                Counters::bump(&self.counters.emit_failed);
                tracing::error!(snmp.source = %source, error = %err, "failed to write trap event");
            }
            Error::Decode { kind, .. } => {
                Counters::bump(&self.counters.decode_failed);
                match kind {
                    DecodeErrorKind::UnexpectedPduType(t) => tracing::debug!(
                        snmp.source = %source,
                        snmp.stage = stage.as_str(),
                        snmp.pdu_type = tag::pdu::name(*t),
                        "dropping non-trap PDU"
                    ),
                    _ => tracing::debug!(
                        snmp.source = %source,
                        snmp.stage = stage.as_str(),
                        error.kind = kind.label(),
                        error = %err,
                        "dropping undecodable datagram"
                    ),
                }
            }
            _ => {
                Counters::bump(&self.counters.decode_failed);
                tracing::debug!(
                    snmp.source = %source,
                    snmp.stage = stage.as_str(),
                    error = %err,
                    "dropping datagram"
                );
            }
        }
    }
}

/// SNMP trap receiver.
///
/// ```rust,no_run
/// use snmp_trapd::TrapReceiver;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> snmp_trapd::Result<()> {
/// let receiver = TrapReceiver::builder()
///     .bind("0.0.0.0:162".parse().unwrap())
///     .community("public")
///     .build()
///     .await?;
///
/// let shutdown = CancellationToken::new();
/// let stats = receiver.run(shutdown).await?;
/// println!("{} traps emitted", stats.emitted);
/// # Ok(())
/// # }
/// ```
pub struct TrapReceiver {
    socket: UdpSocket,
    local_addr: SocketAddr,
    config: ReceiverConfig,
    pipeline: Arc<Pipeline>,
    state: watch::Sender<ReceiverState>,
}

impl TrapReceiver {
    /// Create a builder.
    pub fn builder() -> TrapReceiverBuilder {
        TrapReceiverBuilder::new()
    }

    /// The bound address. Useful after binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The settings the receiver was built with.
    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// Watch lifecycle transitions.
    pub fn state(&self) -> watch::Receiver<ReceiverState> {
        self.state.subscribe()
    }

    /// Handle for reading counters while the receiver runs.
    pub fn stats_handle(&self) -> StatsHandle {
        StatsHandle(Arc::clone(&self.pipeline.counters))
    }

    /// Receive traps until `shutdown` is cancelled.
    ///
    /// In-flight datagrams are finished before this returns. Per-datagram
    /// failures and socket receive errors never end the loop.
    pub async fn run(self, shutdown: CancellationToken) -> Result<ReceiverStats> {
        let TrapReceiver {
            socket,
            local_addr,
            config,
            pipeline,
            state,
        } = self;
        let counters = Arc::clone(&pipeline.counters);

        state.send_replace(ReceiverState::Listening);
        tracing::info!(
            snmp.local_addr = %local_addr,
            workers = config.workers,
            "listening for traps"
        );

        let tracker = TaskTracker::new();
        let permits = Arc::new(Semaphore::new(config.workers));
        // One spare byte so oversized datagrams are detected, not truncated
        let mut buf = vec![0u8; config.max_message_size + 1];
        let mut recv_failures: u32 = 0;

        loop {
            let permit = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let (len, source) = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                result = socket.recv_from(&mut buf) => match result {
                    Ok(received) => received,
                    Err(e) => {
                        // ICMP port-unreachable and friends surface here
                        Counters::bump(&counters.recv_errors);
                        recv_failures = recv_failures.saturating_add(1);
                        if recv_failures == 1 {
                            tracing::error!(error = %e, "trap socket recv error");
                        } else {
                            tracing::debug!(
                                error = %e,
                                consecutive = recv_failures,
                                "trap socket recv error"
                            );
                        }
                        tokio::select! {
                            biased;
                            _ = shutdown.cancelled() => break,
                            _ = tokio::time::sleep(recv_error_backoff(recv_failures)) => {}
                        }
                        continue;
                    }
                },
            };

            if recv_failures > 1 {
                tracing::warn!(errors = recv_failures, "trap socket recovered");
            }
            recv_failures = 0;

            Counters::bump(&counters.received);
            tracing::trace!(snmp.source = %source, snmp.bytes = len, "received datagram");

            if len > config.max_message_size {
                Counters::bump(&counters.decode_failed);
                tracing::debug!(
                    snmp.source = %source,
                    snmp.max_message_size = config.max_message_size,
                    "dropping oversized datagram"
                );
                continue;
            }

            let data = Bytes::copy_from_slice(&buf[..len]);
            let pipeline = Arc::clone(&pipeline);
            // Emitting is a blocking write, so workers run on the blocking pool
            tracker.spawn_blocking(move || {
                let _permit = permit;
                pipeline.handle(data, source);
            });
        }

        state.send_replace(ReceiverState::ShuttingDown);
        tracing::info!(in_flight = tracker.len(), "shutting down trap receiver");

        tracker.close();
        tracker.wait().await;
        drop(socket);

        let stats = counters.snapshot();
        state.send_replace(ReceiverState::Stopped);
        tracing::info!(
            received = stats.received,
            emitted = stats.emitted,
            auth_rejected = stats.auth_rejected,
            decode_failed = stats.decode_failed,
            emit_failed = stats.emit_failed,
            recv_errors = stats.recv_errors,
            "trap receiver stopped"
        );
        Ok(stats)
    }
}

impl std::fmt::Debug for TrapReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrapReceiver")
            .field("local_addr", &self.local_addr)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`TrapReceiver`].
pub struct TrapReceiverBuilder {
    config: ReceiverConfig,
    communities: Vec<Bytes>,
    emitter: Option<EventEmitter>,
}

impl TrapReceiverBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ReceiverConfig::default(),
            communities: Vec::new(),
            emitter: None,
        }
    }

    /// Set the listening address (default: `0.0.0.0:162`).
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    /// Add an accepted community.
    pub fn community(mut self, community: impl AsRef<[u8]>) -> Self {
        self.communities
            .push(Bytes::copy_from_slice(community.as_ref()));
        self
    }

    /// Add several accepted communities.
    pub fn communities<I, C>(mut self, communities: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        self.communities.extend(
            communities
                .into_iter()
                .map(|c| Bytes::copy_from_slice(c.as_ref())),
        );
        self
    }

    /// Set the event sink (default: stdout).
    pub fn emitter(mut self, emitter: EventEmitter) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Maximum datagrams processed concurrently (default: 4).
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Largest datagram accepted (default: 65535). Larger ones are dropped.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// Request a socket receive buffer size.
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.config.recv_buffer_size = Some(size);
        self
    }

    /// Log pipelines slower than this (default: 50ms).
    pub fn slow_decode_threshold(mut self, threshold: Duration) -> Self {
        self.config.slow_decode_threshold = threshold;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.communities.is_empty() || self.communities.iter().any(|c| c.is_empty()) {
            return Err(Error::config("at least one non-empty community is required"));
        }
        if self.config.workers == 0 {
            return Err(Error::config("workers must be at least 1"));
        }
        if !(MIN_MAX_MESSAGE_SIZE..=DEFAULT_MAX_MESSAGE_SIZE).contains(&self.config.max_message_size)
        {
            return Err(Error::config(format!(
                "max_message_size must be between {} and {}, got {}",
                MIN_MAX_MESSAGE_SIZE, DEFAULT_MAX_MESSAGE_SIZE, self.config.max_message_size
            )));
        }
        Ok(())
    }

    /// Validate settings and bind the socket.
    pub async fn build(self) -> Result<TrapReceiver> {
        self.validate()?;
        tracing::debug!(snmp.bind_addr = %self.config.bind_addr, "building trap receiver");

        let bind_addr = self.config.bind_addr;
        let socket = bind_udp_socket(bind_addr, self.config.recv_buffer_size)?;
        let local_addr = socket
            .local_addr()
            .map_err(|source| Error::Bind {
                addr: bind_addr,
                source,
            })?;

        tracing::debug!(snmp.local_addr = %local_addr, "trap socket bound");

        let pipeline = Arc::new(Pipeline {
            validator: CommunityValidator::new(&self.communities),
            emitter: self.emitter.unwrap_or_default(),
            counters: Arc::new(Counters::default()),
            slow_threshold: self.config.slow_decode_threshold,
        });

        let (state, _) = watch::channel(ReceiverState::Starting);

        Ok(TrapReceiver {
            socket,
            local_addr,
            config: self.config,
            pipeline,
            state,
        })
    }
}

impl Default for TrapReceiverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
