// Framework bootstrap for the headless driving client.

use crate::domain::{
    DrivingTuning, LocalPhysicsSimulator, ObstacleField, ObstacleTuning, PlayerId, PlayerSession,
};
use crate::frameworks::config::{self, ClientConfig};
use crate::frameworks::runtime::init_runtime;
use crate::interface_adapters::clients::relay::{ClientError, RelayClient};
use crate::interface_adapters::console::{ClientCommand, parse_command};
use crate::interface_adapters::protocol::{InitView, ProtocolError, ServerMessage};
use crate::use_cases::{DrivingSession, JoinedAs};

use std::io::Result;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

enum LoopControl {
    Continue,
    Quit,
}

pub async fn run_with_config() -> Result<()> {
    init_runtime("racer_client");
    run(config::client_config()).await
}

pub async fn run(cfg: ClientConfig) -> Result<()> {
    let (client, mut inbound) = RelayClient::connect(&cfg.server_url, config::CLIENT_OUTBOUND_CAPACITY)
        .await
        .map_err(|e| {
            tracing::error!(url = %cfg.server_url, error = %e, "failed to connect");
            std::io::Error::other(e)
        })?;
    info!(url = %cfg.server_url, "connected to relay");

    let obstacles = ObstacleField::generate(cfg.obstacle_seed, ObstacleTuning::default());
    debug!(count = obstacles.len(), seed = cfg.obstacle_seed, "obstacles placed");
    let simulator = LocalPhysicsSimulator::new(DrivingTuning::default(), obstacles);
    let mut driving = DrivingSession::new(simulator, cfg.report_policy);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut join_sent = false;

    let mut frames = tokio::time::interval(config::FRAME_INTERVAL);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_frame = Instant::now();
    let mut last_hud = Instant::now();

    loop {
        let control = tokio::select! {
            _ = frames.tick() => {
                let now = Instant::now();
                let dt = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;

                if let Some(report) = driving.advance(now, dt) {
                    match client.report(report) {
                        Ok(true) => {}
                        Ok(false) => debug!(dropped = client.dropped_reports(), "outbound queue full; report dropped"),
                        Err(e) => {
                            warn!(error = %e, "relay connection lost");
                            break;
                        }
                    }
                }

                if now.duration_since(last_hud) >= config::HUD_LOG_INTERVAL {
                    last_hud = now;
                    if let Some(hud) = driving.hud() {
                        info!(
                            kmh = hud.speed_kmh,
                            gear = hud.gear,
                            nitro = hud.nitro_percent,
                            mode = ?driving.mode(),
                            remotes = driving.remote().len(),
                            "hud"
                        );
                    }
                }
                LoopControl::Continue
            }

            msg = inbound.recv() => {
                let Some(msg) = msg else {
                    info!("relay closed the connection");
                    break;
                };
                match handle_server_message(&mut driving, msg) {
                    Ok(Some(_id)) if cfg.autojoin && !join_sent => {
                        join_sent = true;
                        let request = driving.join_request(cfg.name.clone(), cfg.car_id.clone(), cfg.color.clone());
                        if client.join(request).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = ?e, "ignoring malformed server message"),
                }
                LoopControl::Continue
            }

            line = stdin.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => match parse_command(&line) {
                        Ok(command) => {
                            if matches!(command, ClientCommand::Join { .. }) {
                                join_sent = true;
                            }
                            match run_command(&mut driving, &client, command).await {
                                Ok(control) => control,
                                Err(e) => {
                                    warn!(error = %e, "relay connection lost");
                                    break;
                                }
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "unrecognized console input");
                            LoopControl::Continue
                        }
                    },
                    Ok(None) => {
                        debug!("stdin closed; console input disabled");
                        stdin_open = false;
                        LoopControl::Continue
                    }
                    Err(e) => {
                        warn!(error = %e, "stdin read failed; console input disabled");
                        stdin_open = false;
                        LoopControl::Continue
                    }
                }
            }
        };

        if let LoopControl::Quit = control {
            break;
        }
    }

    driving.disconnect();
    let dropped = client.dropped_reports();
    client.close().await;
    info!(dropped_reports = dropped, "client stopped");
    Ok(())
}

/// Applies one server message. Returns the local identity when the message was `init`.
fn handle_server_message(
    driving: &mut DrivingSession,
    msg: ServerMessage,
) -> std::result::Result<Option<PlayerId>, ProtocolError> {
    match msg {
        ServerMessage::Init(dto) => {
            let view = InitView::try_from(dto)?;
            info!(
                id = %view.id,
                players = view.players.len(),
                cars = view.catalog.len(),
                "init received"
            );
            driving.on_init(view.id, &view.players, view.catalog);
            return Ok(Some(view.id));
        }
        ServerMessage::PlayerJoined(dto) => {
            let session = PlayerSession::try_from(dto)?;
            match driving.on_player_joined(&session) {
                JoinedAs::Local => info!(
                    name = %session.name,
                    car_id = %session.car_id,
                    "joined race"
                ),
                JoinedAs::Remote => info!(
                    player_id = %session.id,
                    name = %session.name,
                    "player joined"
                ),
            }
        }
        ServerMessage::StateSync(dto) => {
            let session = PlayerSession::try_from(dto)?;
            driving.on_state_sync(&session);
        }
        ServerMessage::PlayerLeft(id) => {
            let id: PlayerId = id.parse()?;
            driving.on_player_left(id);
            info!(player_id = %id, "player left");
        }
        ServerMessage::ChatMessage(chat) => {
            info!(from = %chat.name, text = %chat.text, "chat");
        }
    }
    Ok(None)
}

async fn run_command(
    driving: &mut DrivingSession,
    client: &RelayClient,
    command: ClientCommand,
) -> std::result::Result<LoopControl, ClientError> {
    match command {
        ClientCommand::Press(control) => driving.set_control(control, true),
        ClientCommand::Release(control) => driving.set_control(control, false),
        ClientCommand::Mode(mode) => {
            driving.set_mode(mode);
            info!(?mode, "control mode changed");
        }
        ClientCommand::Chat(text) => {
            if let Some(text) = driving.prepare_chat(&text) {
                client.chat(text).await?;
            }
        }
        ClientCommand::Join {
            name,
            car_id,
            color,
        } => {
            let request = driving.join_request(name, car_id, color);
            client.join(request).await?;
        }
        ClientCommand::Quit => return Ok(LoopControl::Quit),
    }
    Ok(LoopControl::Continue)
}
