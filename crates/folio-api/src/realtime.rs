//! Realtime change channel with auto-reconnect.
//!
//! Connects to the data API's realtime websocket, subscribes to one or more
//! tables, and streams parsed row-change messages through a
//! [`tokio::sync::broadcast`] channel. Handles reconnection with exponential
//! backoff + jitter automatically.
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_api::realtime::{RealtimeHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let url = Url::parse("wss://data.example.com/realtime/v1")?;
//! let tables = vec!["projects".to_owned(), "tech_stack".to_owned()];
//!
//! let handle = RealtimeHandle::connect(url, tables, ReconnectConfig::default(), cancel, None);
//! let mut rx = handle.subscribe();
//!
//! while let Ok(msg) = rx.recv().await {
//!     println!("{} on {}", msg.event_type, msg.table);
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Broadcast channel capacity ───────────────────────────────────────

const MESSAGE_CHANNEL_CAPACITY: usize = 1024;

// ── RealtimeMessage ──────────────────────────────────────────────────

/// Row-level change kind reported by the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    #[serde(rename = "INSERT", alias = "insert", alias = "Insert")]
    Insert,
    #[serde(rename = "UPDATE", alias = "update", alias = "Update")]
    Update,
    #[serde(rename = "DELETE", alias = "delete", alias = "Delete")]
    Delete,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// A row-change notification, exactly as the channel delivers it.
///
/// Rows stay as raw JSON here; `folio-core` decodes them into typed
/// resources and treats undecodable rows as no-ops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeMessage {
    pub event_type: ChangeType,

    /// Table the change happened in, e.g. `"projects"`.
    pub table: String,

    /// Row after the change (insert / update).
    #[serde(default)]
    pub new_record: Option<serde_json::Value>,

    /// Row before the change (update / delete). Often only the primary key.
    #[serde(default)]
    pub old_record: Option<serde_json::Value>,

    /// Server commit time, RFC 3339.
    #[serde(default)]
    pub commit_timestamp: Option<String>,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for realtime reconnection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── ChannelState ─────────────────────────────────────────────────────

/// Observable lifecycle of the background connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Closed,
}

// ── RealtimeHandle ───────────────────────────────────────────────────

/// Handle to a running realtime channel.
///
/// Call [`shutdown`](Self::shutdown) (or cancel the token passed to
/// [`connect`](Self::connect)) to tear down the background task.
pub struct RealtimeHandle {
    message_rx: broadcast::Receiver<Arc<RealtimeMessage>>,
    state_rx: watch::Receiver<ChannelState>,
    cancel: CancellationToken,
}

impl RealtimeHandle {
    /// Spawn the connect/subscribe/reconnect loop for `tables`.
    ///
    /// Returns immediately; the first connection attempt happens on the
    /// background task. Must be called from within a tokio runtime.
    pub fn connect(
        url: Url,
        tables: Vec<String>,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
        token: Option<SecretString>,
    ) -> Self {
        let (message_tx, message_rx) = broadcast::channel(MESSAGE_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let link = Link {
                url,
                tables,
                token,
                message_tx,
                state_tx,
            };
            realtime_loop(link, reconnect, task_cancel).await;
        });

        Self {
            message_rx,
            state_rx,
            cancel,
        }
    }

    /// Get a new broadcast receiver for the message stream.
    ///
    /// If a consumer falls behind, it receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RealtimeMessage>> {
        self.message_rx.resubscribe()
    }

    /// Observe connection state transitions.
    pub fn state(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

struct Link {
    url: Url,
    tables: Vec<String>,
    token: Option<SecretString>,
    message_tx: broadcast::Sender<Arc<RealtimeMessage>>,
    state_tx: watch::Sender<ChannelState>,
}

/// Main loop: connect → subscribe → read → on error, backoff → reconnect.
async fn realtime_loop(link: Link, reconnect: ReconnectConfig, cancel: CancellationToken) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&link, &cancel) => {
                match result {
                    // Clean disconnect (server close frame or stream ended).
                    Ok(()) => {
                        if cancel.is_cancelled() {
                            break;
                        }
                        tracing::info!("realtime channel disconnected cleanly, reconnecting");
                        attempt = 1;
                        let _ = link.state_tx.send(ChannelState::Reconnecting { attempt });

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(reconnect.initial_delay) => {}
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "realtime channel error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "realtime reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            attempt,
                            "waiting before reconnect"
                        );
                        attempt += 1;
                        let _ = link.state_tx.send(ChannelState::Reconnecting { attempt });

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
        }
    }

    let _ = link.state_tx.send(ChannelState::Closed);
    tracing::debug!("realtime loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Subscription request sent once per table right after the handshake.
fn subscribe_frame(table: &str) -> String {
    serde_json::json!({ "type": "subscribe", "table": table }).to_string()
}

/// Establish a single connection, subscribe, and read until it drops.
async fn connect_and_read(link: &Link, cancel: &CancellationToken) -> Result<(), Error> {
    tracing::info!(url = %link.url, "connecting to realtime channel");

    let uri: tungstenite::http::Uri = link
        .url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::RealtimeConnect(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    if let Some(ref token) = link.token {
        request = request.with_header("Authorization", format!("Bearer {}", token.expose_secret()));
    }

    let (stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::RealtimeConnect(e.to_string()))?;

    let (mut write, mut read) = stream.split();

    for table in &link.tables {
        write
            .send(tungstenite::Message::text(subscribe_frame(table)))
            .await
            .map_err(|e| Error::RealtimeConnect(e.to_string()))?;
    }

    tracing::info!(tables = ?link.tables, "realtime channel connected");
    let _ = link.state_tx.send(ChannelState::Connected);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        parse_and_broadcast(&text, &link.message_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite answers pings automatically
                        tracing::trace!("realtime ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "realtime close frame received"
                            );
                        } else {
                            tracing::info!("realtime close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::RealtimeConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("realtime stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

// ── Message parsing ──────────────────────────────────────────────────

/// Parse a text frame and broadcast every change message found inside.
///
/// A frame holds either one message object or an array of them. Anything
/// else (acks, heartbeats, malformed JSON) is skipped.
fn parse_and_broadcast(text: &str, message_tx: &broadcast::Sender<Arc<RealtimeMessage>>) {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse realtime frame");
            return;
        }
    };

    let items = match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };

    for item in items {
        match serde_json::from_value::<RealtimeMessage>(item) {
            Ok(msg) => {
                // Send errors only mean nobody is listening right now.
                let _ = message_tx.send(Arc::new(msg));
            }
            Err(e) => {
                tracing::trace!(error = %e, "skipping non-change realtime frame");
            }
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 +- 0.25)`
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(30)).unwrap_or(30);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
