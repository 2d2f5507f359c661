use crate::domain::PlayerId;
use crate::interface_adapters::protocol::{ClientMessage, InitDto, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::next_player_id;
use crate::use_cases::{Attachment, RelayBroadcast, RelayEvent};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    RelayClosed,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    // The connection identity doubles as the player id once joined.
    let player_id = next_player_id();
    let span = info_span!("conn", conn_id = player_id.0);

    async move {
        let mut ctx = match bootstrap_connection(&mut socket, &state, player_id).await {
            Ok(ctx) => ctx,
            Err(e) => {
                error!(error = ?e, "failed to bootstrap connection");
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: close_code::ERROR,
                        reason: "bootstrap failed".into(),
                    })))
                    .await;
                let _ = socket.close().await;
                return;
            }
        };

        info!("client connected");

        // Main Client Loop
        if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
            warn!(error = ?e, "client loop exited with error");
        }
    }
    .instrument(span)
    .await
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    pub player_id: PlayerId,
    pub events_tx: mpsc::Sender<RelayEvent>,
    pub updates: broadcast::Receiver<RelayBroadcast>,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,
    pub dropped_reports: u64,
    // Count resync snapshots sent to this client after lagging.
    pub resync_count: u64,

    pub last_events_full_log: Instant,
    pub last_lag_log: Instant,
    pub last_invalid_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

async fn request_attachment(
    events_tx: &mpsc::Sender<RelayEvent>,
    player_id: PlayerId,
    resync: bool,
) -> Result<Attachment, NetError> {
    let (reply, reply_rx) = oneshot::channel();
    let event = if resync {
        RelayEvent::Resync { player_id, reply }
    } else {
        RelayEvent::Connect { player_id, reply }
    };
    events_tx
        .send(event)
        .await
        .map_err(|_| NetError::RelayClosed)?;
    reply_rx.await.map_err(|_| NetError::RelayClosed)
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
    player_id: PlayerId,
) -> Result<ConnCtx, NetError> {
    // The relay subscribes us to fan-out at the same point it takes the snapshot.
    let Attachment { init, updates } =
        request_attachment(&state.events_tx, player_id, false).await?;

    // Send Initial State
    // Tell the client "this is who you are", who is already driving and which cars exist.
    let init_msg = ServerMessage::Init(InitDto::from(&init));
    let bytes_out = match send_message(socket, &init_msg).await {
        Ok(bytes) => bytes as u64,
        Err(e) => {
            // Compensate so the relay never keeps a connection that never started.
            state
                .events_tx
                .send(RelayEvent::Disconnect { player_id })
                .await
                .map_err(|_| NetError::RelayClosed)?; // RelayClosed takes precedence
            return Err(e);
        }
    };
    debug!(players = init.players.len(), "init sent");

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        player_id,
        events_tx: state.events_tx.clone(),
        updates,

        msgs_in: 0,
        msgs_out: 1,
        bytes_in: 0,
        bytes_out,

        invalid_json: 0,
        dropped_reports: 0,
        resync_count: 0,

        last_events_full_log: now,
        last_lag_log: now,
        last_invalid_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, ctx).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing fan-out from the relay
            update = ctx.updates.recv() => {
                match update {
                    Ok(msg) => match forward_broadcast(&msg, socket, ctx).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut ctx.last_lag_log) {
                            warn!(missed = n, "relay updates lagged; resyncing");
                        }
                        match resync(socket, ctx).await {
                            Ok(LoopControl::Continue) => false,
                            Ok(LoopControl::Disconnect) => true,
                            Err(e) => {
                                fatal = Some(e);
                                true
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::RelayClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(ctx).await {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    let player_id = ctx.player_id;
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(payload)) => {
                        let request = payload.unwrap_or_default().into();
                        forward_event(ctx, RelayEvent::Join { player_id, request }).await
                    }
                    Ok(ClientMessage::StateUpdate(payload)) => {
                        // Per-frame reports may be dropped under load; the next one supersedes.
                        let event = RelayEvent::StateUpdate {
                            player_id,
                            report: payload.into(),
                        };
                        match ctx.events_tx.try_send(event) {
                            Ok(()) => Ok(LoopControl::Continue),
                            Err(mpsc::error::TrySendError::Full(_evt)) => {
                                ctx.dropped_reports += 1;
                                if should_log(&mut ctx.last_events_full_log) {
                                    warn!(%player_id, "relay event channel full; dropping state report");
                                }
                                Ok(LoopControl::Continue)
                            }
                            Err(mpsc::error::TrySendError::Closed(_evt)) => {
                                Err(NetError::RelayClosed)
                            }
                        }
                    }
                    Ok(ClientMessage::Chat(payload)) => {
                        let text = payload.and_then(|p| p.text).unwrap_or_default();
                        forward_event(ctx, RelayEvent::Chat { player_id, text }).await
                    }
                    Err(parse_err) => {
                        // Malformed frames are tolerated; they are counted and skipped.
                        ctx.invalid_json += 1;
                        if should_log(&mut ctx.last_invalid_log) {
                            warn!(
                                %player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }
                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(%player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(%player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_event(ctx: &ConnCtx, event: RelayEvent) -> Result<LoopControl, NetError> {
    ctx.events_tx
        .send(event)
        .await
        .map_err(|_| NetError::RelayClosed)?;
    Ok(LoopControl::Continue)
}

async fn forward_broadcast(
    msg: &RelayBroadcast,
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
) -> LoopControl {
    match send_message(socket, &ServerMessage::from(msg)).await {
        Ok(bytes) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send relay update");
            LoopControl::Disconnect
        }
    }
}

async fn resync(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<LoopControl, NetError> {
    // Resync strategy: take a fresh snapshot and subscription, then replay it as `init`.
    let Attachment { init, updates } =
        request_attachment(&ctx.events_tx, ctx.player_id, true).await?;
    ctx.updates = updates;
    ctx.resync_count += 1;

    match send_message(socket, &ServerMessage::Init(InitDto::from(&init))).await {
        Ok(bytes) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
            debug!(
                bytes,
                count = ctx.resync_count,
                "sent resync snapshot"
            );
            Ok(LoopControl::Continue)
        }
        Err(err) => {
            warn!(error = ?err, "failed to send resync snapshot");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn disconnect_cleanup(ctx: &ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;
    ctx.events_tx
        .send(RelayEvent::Disconnect { player_id })
        .await
        .map_err(|_| NetError::RelayClosed)?;

    debug!(
        %player_id,
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        dropped_reports = ctx.dropped_reports,
        resync_count = ctx.resync_count,
        "connection stats"
    );
    info!(%player_id, "client disconnected");
    Ok(())
}
