//! WebSocket transport over tokio-tungstenite.
//!
//! Each connection is split into independent reader and writer tasks that
//! talk to the rest of the client through the `Link` channels.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::api::Endpoints;
use crate::transport::{Link, Transport, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WebSocketTransport {
    endpoints: Endpoints,
}

impl WebSocketTransport {
    pub fn new(endpoints: Endpoints) -> Self {
        Self { endpoints }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self, room: &str) -> Result<Link, TransportError> {
        let url = self.endpoints.room_socket(room);
        info!("Connecting to {}", url);

        let (socket, _) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        info!("WebSocket open for room {}", room);

        let (write_half, read_half) = socket.split();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        spawn_writer(write_half, outbound_rx, inbound_tx.downgrade());
        spawn_reader(read_half, inbound_tx);

        Ok(Link {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

/// Forward outbound frames to the socket. Sends a close frame once the
/// client drops its sender.
///
/// A write error is reported on the inbound stream. The handle is weak so
/// the reader alone decides when the inbound stream ends.
fn spawn_writer(
    mut write_half: SplitSink<WsStream, WsMessage>,
    mut outbound: mpsc::UnboundedReceiver<String>,
    inbound: mpsc::WeakUnboundedSender<Result<String, TransportError>>,
) {
    tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if let Err(e) = write_half.send(WsMessage::Text(text.into())).await {
                warn!("WebSocket write failed: {}", e);
                if let Some(inbound) = inbound.upgrade() {
                    let _ = inbound.send(Err(TransportError::Io(e.to_string())));
                }
                return;
            }
        }
        debug!("Outbound channel closed, closing socket");
        let _ = write_half.close().await;
    });
}

/// Forward text frames from the socket. The inbound channel is dropped when
/// the socket closes, which the client reads as a close.
fn spawn_reader(
    mut read_half: SplitStream<WsStream>,
    inbound: mpsc::UnboundedSender<Result<String, TransportError>>,
) {
    tokio::spawn(async move {
        while let Some(next) = read_half.next().await {
            let text = match next {
                Ok(WsMessage::Text(payload)) => payload.as_str().to_owned(),
                Ok(WsMessage::Binary(payload)) => match String::from_utf8(payload.to_vec()) {
                    Ok(text) => text,
                    Err(_) => {
                        warn!("Dropping non-UTF-8 binary frame ({} bytes)", payload.len());
                        continue;
                    }
                },
                Ok(WsMessage::Close(frame)) => {
                    debug!("Peer closed socket: {:?}", frame);
                    return;
                }
                Ok(_) => continue,
                Err(e) => {
                    let _ = inbound.send(Err(TransportError::Io(e.to_string())));
                    return;
                }
            };

            if inbound.send(Ok(text)).is_err() {
                // Client went away.
                return;
            }
        }
    });
}
