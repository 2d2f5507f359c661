use crate::domain::{JoinRequest, MotionReport};
use crate::interface_adapters::protocol::{ChatPayload, ClientMessage, ServerMessage};

use futures_util::{SinkExt, StreamExt};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

// Inbound server messages queued for the driving loop.
const INBOUND_CAPACITY: usize = 256;

#[derive(Debug)]
pub enum ClientError {
    Connect(tokio_tungstenite::tungstenite::Error),
    // The writer task is gone; the socket is closed or closing.
    Closed,
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Connect(e) => write!(f, "failed to connect to relay: {e}"),
            ClientError::Closed => write!(f, "relay connection closed"),
        }
    }
}

impl std::error::Error for ClientError {}

/// Outbound half of a relay connection.
///
/// Join and chat messages are queued with backpressure. State reports use a
/// non-blocking enqueue and are dropped when the queue is full, since the next
/// frame's report supersedes them.
pub struct RelayClient {
    outbound_tx: mpsc::Sender<ClientMessage>,
    dropped_reports: Arc<AtomicU64>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl RelayClient {
    pub async fn connect(
        url: &str,
        outbound_capacity: usize,
    ) -> Result<(Self, mpsc::Receiver<ServerMessage>), ClientError> {
        let (stream, _response) = connect_async(url).await.map_err(ClientError::Connect)?;
        let (mut sink, mut source) = stream.split();

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<ClientMessage>(outbound_capacity.max(1));
        let (inbound_tx, inbound_rx) = mpsc::channel::<ServerMessage>(INBOUND_CAPACITY);

        let writer = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let text = match serde_json::to_string(&msg) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "failed to serialize client message");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    warn!(error = %e, "relay send failed");
                    break;
                }
            }
            let _ = sink.close().await;
            debug!("relay writer exiting");
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!(error = %e, "relay recv failed");
                        break;
                    }
                };
                match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(msg) => {
                        if inbound_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, bytes = text.len(), "failed to parse server message");
                    }
                }
            }
            debug!("relay reader exiting");
        });

        Ok((
            Self {
                outbound_tx,
                dropped_reports: Arc::new(AtomicU64::new(0)),
                writer,
                reader,
            },
            inbound_rx,
        ))
    }

    pub async fn join(&self, request: JoinRequest) -> Result<(), ClientError> {
        self.send(ClientMessage::Join(Some(request.into()))).await
    }

    pub async fn chat(&self, text: String) -> Result<(), ClientError> {
        self.send(ClientMessage::Chat(Some(ChatPayload { text: Some(text) })))
            .await
    }

    /// Queues a state report. Returns false when it was dropped.
    pub fn report(&self, report: MotionReport) -> Result<bool, ClientError> {
        match self
            .outbound_tx
            .try_send(ClientMessage::StateUpdate(report.into()))
        {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_msg)) => {
                self.dropped_reports.fetch_add(1, Ordering::Relaxed);
                Ok(false)
            }
            Err(mpsc::error::TrySendError::Closed(_msg)) => Err(ClientError::Closed),
        }
    }

    pub fn dropped_reports(&self) -> u64 {
        self.dropped_reports.load(Ordering::Relaxed)
    }

    /// Flushes queued messages, then closes the socket.
    pub async fn close(self) {
        let RelayClient {
            outbound_tx,
            writer,
            reader,
            ..
        } = self;
        drop(outbound_tx);
        let _ = writer.await;
        reader.abort();
    }

    async fn send(&self, msg: ClientMessage) -> Result<(), ClientError> {
        self.outbound_tx
            .send(msg)
            .await
            .map_err(|_| ClientError::Closed)
    }
}
