//! WebSocket connection manager and event loop.
//!
//! This module owns the socket lifecycle: connect, send, receive-dispatch,
//! close, and the observable [`ConnectionState`] transitions. Inbound frames
//! are delivered verbatim to the caller's event channel; decoding is offered
//! separately by the [`protocol`](crate::protocol) module.
//!
//! # Event Loop
//!
//! Each established connection spawns a tokio task that handles:
//!
//! - Incoming text frames (emitted as [`ConnectionEvent::Message`])
//! - Outgoing frames and close requests from the [`Connection`] handle
//! - Teardown: peer close, transport failure, caller-initiated close
//!
//! # Invariants
//!
//! - At most one active connection attempt or established connection per
//!   manager instance; a second `connect` is rejected with `InvalidState`.
//! - All state transitions go through one mutex; the event loop's termination
//!   is the single place an established connection reaches `Disconnected`,
//!   so `Closed` is emitted exactly once and state never regresses.
//! - An epoch counter invalidates superseded connect attempts: closing while
//!   `Connecting` suppresses the late `Opened`/`FailedToConnect`.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::protocol::Command;

use super::ConnectionState;

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for the WebSocket handshake.
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a graceful close waits for the peer's acknowledgement.
const CLOSE_GRACE: Duration = Duration::from_secs(3);

/// Close code for a caller-initiated graceful close.
const NORMAL_CLOSURE: u16 = 1000;

/// Close code when the manager itself is going away.
const GOING_AWAY: u16 = 1001;

/// Close code when the peer closed without sending a status.
const NO_STATUS_RECEIVED: u16 = 1005;

/// Close code for a discovered (non-negotiated) transport failure.
const ABNORMAL_CLOSURE: u16 = 1006;

// ============================================================================
// Types
// ============================================================================

/// Client-side WebSocket stream.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of the split WebSocket stream.
type WsSink = SplitSink<WsStream, Message>;

/// Receiver half of the event channel handed to the caller.
pub type EventReceiver = mpsc::UnboundedReceiver<ConnectionEvent>;

// ============================================================================
// ConnectionEvent
// ============================================================================

/// An inbound text frame, delivered verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Strictly increasing per connection, starting at 0; resets on
    /// reconnection.
    pub seq: u64,
    /// When the frame was received.
    pub timestamp: SystemTime,
    /// The frame's text, untouched.
    pub payload: String,
}

/// A lifecycle or message event emitted by the [`Connection`].
///
/// The connection is the sole producer; events arrive on the channel in the
/// order they occurred on the transport. `Opened`, `FailedToConnect` and
/// `Closed` are terminal: after one of them the triggering `connect` or
/// `close` is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// The handshake succeeded; the connection is established.
    Opened,
    /// A text frame arrived.
    Message(InboundMessage),
    /// The connection ended, gracefully or not.
    Closed {
        /// WebSocket close code (1000 for a caller-initiated close).
        code: u16,
        /// Close reason or failure description.
        reason: String,
    },
    /// A connect attempt failed before the connection was established.
    FailedToConnect {
        /// Description of the handshake/DNS/timeout failure.
        reason: String,
    },
}

// ============================================================================
// LinkCommand
// ============================================================================

/// Requests from the [`Connection`] handle to the event loop.
enum LinkCommand {
    /// Write a text frame and report the outcome.
    Send {
        frame: String,
        done_tx: oneshot::Sender<Result<()>>,
    },
    /// Close gracefully with code 1000 and the given reason.
    Close {
        reason: String,
        done_tx: oneshot::Sender<()>,
    },
}

/// Why the event loop stopped.
enum Teardown {
    /// Caller-initiated graceful close.
    Local {
        reason: String,
        done_tx: oneshot::Sender<()>,
    },
    /// The peer sent a close frame.
    Remote(Option<CloseFrame>),
    /// Transport error or unannounced stream end.
    Error(String),
    /// Every `Connection` handle was dropped.
    Abandoned,
}

// ============================================================================
// Inner
// ============================================================================

/// Shared mutable state; every transition happens under this lock.
#[derive(Default)]
struct Inner {
    /// Current lifecycle state.
    state: ConnectionState,
    /// Bumped whenever an attempt is started or aborted. The event loop and
    /// late handshake outcomes compare against it before acting.
    epoch: u64,
    /// Channel to the event loop of the established connection, if any.
    link: Option<LinkHandle>,
}

/// Handle to a live event loop.
struct LinkHandle {
    /// Commands into the event loop.
    command_tx: mpsc::UnboundedSender<LinkCommand>,
    /// The loop task itself; detached on teardown.
    _task: JoinHandle<()>,
}

// ============================================================================
// Connection
// ============================================================================

/// Connection manager for the robot server.
///
/// Owns one WebSocket at a time and presents a race-free
/// connected/not-connected contract. Cloning yields another handle to the
/// same connection.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync`. `connect`, `send` and `close` may be called
/// from any task; transitions are serialized internally, so concurrent calls
/// cannot produce an invalid state pair.
///
/// # Example
///
/// ```no_run
/// use versy_client::{Command, Connection, Endpoint, Result};
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let endpoint: Endpoint = "192.168.1.10:8000".parse()?;
///     let (conn, mut events) = Connection::new();
///
///     conn.connect(&endpoint).await?;
///     conn.send(&Command::FindMarker { marker_id: 7 }).await?;
///
///     while let Some(event) = events.recv().await {
///         println!("{event:?}");
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Connection {
    /// Shared state; the single point of mutation.
    inner: Arc<Mutex<Inner>>,
    /// Event channel to the caller.
    events: mpsc::UnboundedSender<ConnectionEvent>,
    /// Handshake deadline for `connect`.
    handshake_timeout: Duration,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("handshake_timeout", &self.handshake_timeout)
            .finish()
    }
}

impl Connection {
    /// Creates a new, disconnected manager and its event channel.
    ///
    /// The receiver is the caller's single subscription point; it is safe to
    /// consume from any task.
    #[must_use]
    pub fn new() -> (Self, EventReceiver) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let connection = Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            events: events_tx,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        };
        (connection, events_rx)
    }

    /// Overrides the handshake timeout (default 10 s).
    #[inline]
    #[must_use]
    pub fn with_handshake_timeout(mut self, handshake_timeout: Duration) -> Self {
        self.handshake_timeout = handshake_timeout;
        self
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    /// Returns `true` while the connection is established.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Connects to the robot server at `ws://{endpoint}/ws`.
    ///
    /// Valid only while `Disconnected`. Suspends until the handshake
    /// resolves: on success the state is `Connected` and one
    /// [`ConnectionEvent::Opened`] is emitted; on failure the state is back
    /// to `Disconnected` and one [`ConnectionEvent::FailedToConnect`] is
    /// emitted.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if not `Disconnected`; no side effect, the
    ///   existing attempt or connection is untouched
    /// - [`Error::FailedToConnect`] on DNS/refused/handshake/timeout failure
    /// - [`Error::ConnectionClosed`] if a concurrent `close` aborted this
    ///   attempt (the `Closed` event was already delivered)
    pub async fn connect(&self, endpoint: &Endpoint) -> Result<()> {
        let epoch = {
            let mut inner = self.inner.lock();
            if inner.state != ConnectionState::Disconnected {
                return Err(Error::invalid_state("connect", inner.state));
            }
            inner.state = ConnectionState::Connecting;
            inner.epoch += 1;
            inner.epoch
        };

        let url = endpoint.ws_url();
        debug!(%url, "connecting");

        let handshake = timeout(self.handshake_timeout, connect_async(url.as_str())).await;

        let ws_stream = match handshake {
            Ok(Ok((ws_stream, _response))) => ws_stream,
            Ok(Err(e)) => return self.fail_attempt(epoch, e.to_string()),
            Err(_) => {
                return self.fail_attempt(
                    epoch,
                    format!(
                        "handshake timed out after {}ms",
                        self.handshake_timeout.as_millis()
                    ),
                );
            }
        };

        let mut inner = self.inner.lock();
        if inner.epoch != epoch || inner.state != ConnectionState::Connecting {
            // close() aborted this attempt and already announced Closed; the
            // late socket is discarded without a second terminal event.
            drop(inner);
            tokio::spawn(async move {
                let mut ws_stream = ws_stream;
                let _ = ws_stream.close(None).await;
            });
            return Err(Error::ConnectionClosed);
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();

        inner.state = ConnectionState::Connected;
        // Opened goes out before the read loop exists, so no Message can
        // precede it on the event channel.
        let _ = self.events.send(ConnectionEvent::Opened);

        let task = tokio::spawn(run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&self.inner),
            self.events.clone(),
            epoch,
        ));
        inner.link = Some(LinkHandle {
            command_tx,
            _task: task,
        });

        debug!(%endpoint, "connected");
        Ok(())
    }

    /// Encodes a command and writes it as one text frame.
    ///
    /// Valid only while `Connected`. Suspends until the write completes. A
    /// write failure is surfaced as [`Error::SendFailed`] without any state
    /// transition: the read loop's own failure detection is the authority on
    /// teardown, so two code paths never race over the same transition.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if not `Connected`; no frame is sent
    /// - [`Error::SendFailed`] if the transport write fails
    /// - [`Error::ConnectionClosed`] if the connection tore down mid-send
    pub async fn send(&self, command: &Command) -> Result<()> {
        let command_tx = {
            let inner = self.inner.lock();
            if inner.state != ConnectionState::Connected {
                return Err(Error::invalid_state("send", inner.state));
            }
            inner
                .link
                .as_ref()
                .ok_or(Error::ConnectionClosed)?
                .command_tx
                .clone()
        };

        let frame = command.encode()?;
        trace!(%frame, "sending command");

        let (done_tx, done_rx) = oneshot::channel();
        command_tx
            .send(LinkCommand::Send { frame, done_tx })
            .map_err(|_| Error::ConnectionClosed)?;

        done_rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Closes the connection gracefully with code 1000 and the given reason.
    ///
    /// Valid in `Connecting` or `Connected`.
    ///
    /// - From `Connecting`: aborts the in-flight handshake; one
    ///   [`ConnectionEvent::Closed`] is emitted and the attempt's late
    ///   outcome is suppressed.
    /// - From `Connected`: passes through `Closing`, requests a graceful
    ///   socket closure, and suspends until teardown is confirmed. Exactly
    ///   one `Closed` is emitted even if an unsolicited transport failure
    ///   races this call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] in `Disconnected` or `Closing`.
    pub async fn close(&self, reason: &str) -> Result<()> {
        let command_tx = {
            let mut inner = self.inner.lock();
            match inner.state {
                ConnectionState::Connecting => {
                    // No socket exists yet; abort the attempt and invalidate
                    // whatever the handshake eventually resolves to.
                    inner.epoch += 1;
                    inner.state = ConnectionState::Disconnected;
                    let _ = self.events.send(ConnectionEvent::Closed {
                        code: NORMAL_CLOSURE,
                        reason: reason.to_string(),
                    });
                    debug!(reason, "connect attempt aborted");
                    return Ok(());
                }
                ConnectionState::Connected => {
                    // Grab the link before transitioning so a missing link
                    // errors out without stranding the state in Closing.
                    let command_tx = inner
                        .link
                        .as_ref()
                        .ok_or(Error::ConnectionClosed)?
                        .command_tx
                        .clone();
                    inner.state = ConnectionState::Closing;
                    command_tx
                }
                state => return Err(Error::invalid_state("close", state)),
            }
        };

        let (done_tx, done_rx) = oneshot::channel();
        if command_tx
            .send(LinkCommand::Close {
                reason: reason.to_string(),
                done_tx,
            })
            .is_err()
        {
            // The read loop is already tearing down and owns the Closed
            // event; nothing more to do here.
            return Ok(());
        }

        // Teardown confirmation. The oneshot errs if an unsolicited failure
        // beat the close command; either way one Closed has been emitted.
        let _ = done_rx.await;
        Ok(())
    }

    /// Disposes of the connection: best-effort graceful close.
    ///
    /// After this returns the read-loop task has finished its teardown (the
    /// `Closed` event, if any, is already on the channel) and no background
    /// task outlives the manager.
    pub async fn shutdown(&self) {
        if self.state().is_active() {
            let _ = self.close("client shutdown").await;
        }
    }

    /// Resolves a failed handshake attempt under the lock.
    ///
    /// Emits `FailedToConnect` only if this attempt is still the current
    /// one; an aborted attempt already had its terminal event.
    fn fail_attempt(&self, epoch: u64, reason: String) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.epoch == epoch && inner.state == ConnectionState::Connecting {
            inner.state = ConnectionState::Disconnected;
            warn!(%reason, "connect failed");
            let _ = self.events.send(ConnectionEvent::FailedToConnect {
                reason: reason.clone(),
            });
            Err(Error::failed_to_connect(reason))
        } else {
            Err(Error::ConnectionClosed)
        }
    }
}

// ============================================================================
// Event Loop
// ============================================================================

/// Socket I/O loop for one established connection.
///
/// Sole owner of the socket halves. Terminates on peer close, transport
/// error, caller close, or abandonment, then performs the one and only
/// transition to `Disconnected` for this connection.
async fn run_event_loop(
    ws_stream: WsStream,
    mut command_rx: mpsc::UnboundedReceiver<LinkCommand>,
    inner: Arc<Mutex<Inner>>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    epoch: u64,
) {
    let (mut ws_write, mut ws_read) = ws_stream.split();
    let mut seq: u64 = 0;

    let teardown = loop {
        tokio::select! {
            frame = ws_read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    trace!(seq, len = text.len(), "text frame received");
                    let message = InboundMessage {
                        seq,
                        timestamp: SystemTime::now(),
                        payload: text.to_string(),
                    };
                    seq += 1;
                    let _ = events.send(ConnectionEvent::Message(message));
                }

                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "close frame from peer");
                    break Teardown::Remote(frame);
                }

                Some(Err(e)) => {
                    warn!(error = %e, "transport error");
                    break Teardown::Error(e.to_string());
                }

                None => {
                    debug!("transport stream ended");
                    break Teardown::Error("connection reset".to_string());
                }

                // Ignore Binary, Ping, Pong
                _ => {}
            },

            command = command_rx.recv() => match command {
                Some(LinkCommand::Send { frame, done_tx }) => {
                    let result = write_frame(&mut ws_write, frame).await;
                    let _ = done_tx.send(result);
                }

                Some(LinkCommand::Close { reason, done_tx }) => {
                    request_close(&mut ws_write, &reason).await;
                    drain_until_ack(&mut ws_read, &events, &mut seq).await;
                    break Teardown::Local { reason, done_tx };
                }

                None => {
                    debug!("all connection handles dropped");
                    break Teardown::Abandoned;
                }
            },
        }
    };

    let mut done_tx = None;
    let (code, reason) = match teardown {
        Teardown::Local { reason, done_tx: tx } => {
            done_tx = Some(tx);
            (NORMAL_CLOSURE, reason)
        }
        Teardown::Remote(Some(frame)) => (u16::from(frame.code), frame.reason.to_string()),
        Teardown::Remote(None) => (NO_STATUS_RECEIVED, String::new()),
        Teardown::Error(reason) => (ABNORMAL_CLOSURE, reason),
        Teardown::Abandoned => (GOING_AWAY, "connection manager dropped".to_string()),
    };

    // Single transition point. The epoch guard means a superseded loop can
    // neither regress state nor emit a duplicate Closed. Closed goes out
    // under the same lock that flips the state: once a caller observes
    // `Disconnected`, the event is already on the channel, so a reconnect's
    // `Opened` can never overtake it (unbounded send, never blocks).
    let current = {
        let mut inner = inner.lock();
        if inner.epoch == epoch {
            inner.state = ConnectionState::Disconnected;
            inner.link = None;
            let _ = events.send(ConnectionEvent::Closed { code, reason });
            true
        } else {
            false
        }
    };

    if !current {
        debug!("event loop superseded, no terminal event");
        return;
    }

    if let Some(done_tx) = done_tx {
        let _ = done_tx.send(());
    }

    debug!("event loop terminated");
}

/// Writes one text frame, mapping transport errors to [`Error::SendFailed`].
///
/// A failed write does not break the loop: the read side observes the same
/// dead socket and owns the teardown transition.
async fn write_frame(ws_write: &mut WsSink, frame: String) -> Result<()> {
    ws_write.send(Message::Text(frame.into())).await.map_err(|e| {
        warn!(error = %e, "frame write failed");
        Error::send_failed(e.to_string())
    })
}

/// Sends a close frame with code 1000 and the caller's reason.
async fn request_close(ws_write: &mut WsSink, reason: &str) {
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: reason.to_string().into(),
    };
    if let Err(e) = ws_write.send(Message::Close(Some(frame))).await {
        debug!(error = %e, "close frame not delivered");
    }
}

/// Drains the read half until the peer acknowledges the close, the stream
/// ends, or the grace period lapses.
///
/// Text frames that arrive while closing are still dispatched: the close is
/// negotiated, not instant, and the peer may flush pending responses first.
async fn drain_until_ack(
    ws_read: &mut futures_util::stream::SplitStream<WsStream>,
    events: &mpsc::UnboundedSender<ConnectionEvent>,
    seq: &mut u64,
) {
    let _ = timeout(CLOSE_GRACE, async {
        while let Some(frame) = ws_read.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    let message = InboundMessage {
                        seq: *seq,
                        timestamp: SystemTime::now(),
                        payload: text.to_string(),
                    };
                    *seq += 1;
                    let _ = events.send(ConnectionEvent::Message(message));
                }
                Ok(Message::Close(_)) | Err(_) => break,
                _ => {}
            }
        }
    })
    .await;
}

// ============================================================================
// Tests
// ============================================================================
