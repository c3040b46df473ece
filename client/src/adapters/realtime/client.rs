//! Realtime websocket client
//!
//! Each subscription owns one websocket connection and one channel. A
//! background task forwards decoded row changes to the subscriber, sends
//! heartbeats, and leaves the channel when the subscription is closed.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use super::protocol::{self, Frame, EVENT_CLOSE, EVENT_ERROR};
use crate::config::Config;
use crate::domain::ports::{ChangeEvent, ChangeFeed, ChangeTable, Subscription, SubscriptionHandle};
use crate::error::{DomainError, RealtimeError};

/// Interval between Phoenix heartbeats
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

const PROTOCOL_VERSION: &str = "1.0.0";
const EVENT_BUFFER: usize = 64;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// `ChangeFeed` over the backend's realtime websocket
#[derive(Debug, Clone)]
pub struct RealtimeClient {
    endpoint: Url,
    access_token: String,
}

impl RealtimeClient {
    pub fn new(config: &Config) -> Result<Self, RealtimeError> {
        Ok(Self {
            endpoint: websocket_endpoint(&config.backend_url, &config.anon_key)?,
            access_token: config.access_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn open(
        &self,
        topic: &str,
        tables: &[ChangeTable],
    ) -> Result<Subscription, RealtimeError> {
        let (mut socket, _) = tokio_tungstenite::connect_async(self.endpoint.as_str()).await?;

        let topic = protocol::channel_topic(topic);
        let join = Frame::join(&topic, tables, &self.access_token, 1);
        socket.send(Message::Text(join.encode()?)).await?;
        tracing::debug!("Joined {}", topic);

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (close_tx, close_rx) = oneshot::channel();
        tokio::spawn(run_channel(socket, topic, events_tx, close_rx));

        let handle = SubscriptionHandle::new(move || {
            let _ = close_tx.send(());
        });
        Ok(Subscription::new(events_rx, handle))
    }
}

/// Build `ws(s)://host/realtime/v1/websocket?apikey=..&vsn=1.0.0` from the REST base URL
pub fn websocket_endpoint(backend_url: &str, anon_key: &str) -> Result<Url, RealtimeError> {
    let mut url = Url::parse(backend_url).map_err(|e| RealtimeError::Endpoint(e.to_string()))?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(RealtimeError::Endpoint(format!(
                "Unsupported scheme: {}",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| RealtimeError::Endpoint(format!("Cannot use scheme {}", scheme)))?;
    url.set_path("/realtime/v1/websocket");
    url.query_pairs_mut()
        .clear()
        .append_pair("apikey", anon_key)
        .append_pair("vsn", PROTOCOL_VERSION);
    Ok(url)
}

async fn run_channel(
    socket: Socket,
    topic: String,
    events: mpsc::Sender<ChangeEvent>,
    mut close: oneshot::Receiver<()>,
) {
    let (mut sink, mut stream) = socket.split();
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;
    let mut next_ref: u64 = 2;

    loop {
        tokio::select! {
            _ = &mut close => {
                let leave = Frame::leave(&topic, next_ref);
                if let Ok(text) = leave.encode() {
                    let _ = sink.send(Message::Text(text)).await;
                }
                let _ = sink.close().await;
                tracing::debug!("Left {}", topic);
                break;
            }
            _ = heartbeat.tick() => {
                let frame = Frame::heartbeat(next_ref);
                next_ref += 1;
                let sent = match frame.encode() {
                    Ok(text) => sink.send(Message::Text(text)).await.map_err(RealtimeError::from),
                    Err(e) => Err(e),
                };
                if let Err(e) = sent {
                    tracing::warn!("Heartbeat on {} failed: {}", topic, e);
                    break;
                }
            }
            message = stream.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        if !forward(&topic, &text, &events).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::warn!("Realtime connection for {} closed by server", topic);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("Realtime connection for {} failed: {}", topic, e);
                        break;
                    }
                }
            }
        }
    }
}

/// Handle one text frame. Returns false when the channel should stop.
async fn forward(topic: &str, text: &str, events: &mpsc::Sender<ChangeEvent>) -> bool {
    let frame = match Frame::decode(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("Ignoring undecodable realtime frame: {}", e);
            return true;
        }
    };
    if frame.topic != topic {
        return true;
    }

    if let Some(reason) = frame.reply_error() {
        tracing::warn!("Channel {} rejected: {}", topic, reason);
        return false;
    }
    if frame.event == EVENT_ERROR || frame.event == EVENT_CLOSE {
        tracing::warn!("Channel {} ended with {}", topic, frame.event);
        return false;
    }

    match protocol::decode_change(&frame) {
        Ok(Some(event)) => events.send(event).await.is_ok(),
        Ok(None) => true,
        Err(e) => {
            tracing::warn!("Dropping change on {}: {}", topic, e);
            true
        }
    }
}

#[async_trait]
impl ChangeFeed for RealtimeClient {
    async fn subscribe(
        &self,
        topic: &str,
        tables: &[ChangeTable],
    ) -> Result<Subscription, DomainError> {
        Ok(self.open(topic, tables).await?)
    }
}
