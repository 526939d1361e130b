use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use onuw_engine::{GameError, GameHandle, PlayerId, Recipient};
use thiserror::Error;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::message::{ClientMessage, ServerEvent, ServerMessage};
use crate::models::room::RoomError;
use crate::services::{game_service, room_service};
use crate::state::AppState;

const HOST: PlayerId = 0;

#[derive(Debug, Error)]
enum SessionError {
    #[error(transparent)]
    Room(#[from] RoomError),
    #[error(transparent)]
    Game(#[from] GameError),
}

pub async fn handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

pub async fn handle_socket(ws: WebSocket, state: AppState) {
    info!("new websocket connection");
    let (mut sender, mut receiver) = ws.split();
    let (out, mut out_rx) = mpsc::unbounded_channel::<ServerMessage>();

    let send_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    warn!("failed to encode message: {}", e);
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(text)).await {
                warn!("failed to send message: {}", e);
                break;
            }
        }
    });

    let mut session = Session::new(state, out);
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => session.handle(msg).await,
                Err(e) => {
                    debug!("malformed client message: {}", e);
                    session.reply(ServerEvent::Error {
                        message: format!("Malformed message: {}", e),
                    });
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!(seat = ?session.seat, "websocket closed");
    drop(session);
    send_task.abort();
}

/// One connected browser. Knows its room and seat once it has created or
/// joined one.
struct Session {
    state: AppState,
    out: mpsc::UnboundedSender<ServerMessage>,
    seat: Option<(String, PlayerId)>,
    forward: Option<JoinHandle<()>>,
}

impl Session {
    fn new(state: AppState, out: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Session {
            state,
            out,
            seat: None,
            forward: None,
        }
    }

    fn reply(&self, event: ServerEvent) {
        if self.out.send(ServerMessage::new(event)).is_err() {
            debug!("socket writer gone");
        }
    }

    async fn handle(&mut self, msg: ClientMessage) {
        if let Err(e) = self.dispatch(msg).await {
            debug!(seat = ?self.seat, "request refused: {}", e);
            self.reply(ServerEvent::Error {
                message: e.to_string(),
            });
        }
    }

    async fn dispatch(&mut self, msg: ClientMessage) -> Result<(), SessionError> {
        match msg {
            ClientMessage::Create { name } => {
                self.ensure_unseated()?;
                let room_id = room_service::create_room(&self.state, name).await?;
                self.attach(&room_id, HOST).await;
                self.reply(ServerEvent::Created {
                    room_id,
                    player: HOST,
                });
            }
            ClientMessage::Join { room_id, name } => {
                self.ensure_unseated()?;
                let (player, players) =
                    room_service::join_room(&self.state, &room_id, name.clone()).await?;
                self.state
                    .send_to_room(&room_id, Recipient::All, ServerEvent::PlayerJoined { player, name })
                    .await;
                self.attach(&room_id, player).await;
                self.reply(ServerEvent::Joined {
                    room_id,
                    player,
                    players,
                });
            }
            ClientMessage::SetupStart => {
                let room_id = self.host_room()?;
                let players = room_service::start_setup(&self.state, &room_id).await?;
                self.state
                    .send_to_room(&room_id, Recipient::All, ServerEvent::SetupStarted { players })
                    .await;
            }
            ClientMessage::SetupInfo {
                role_add,
                role_sub,
                role_seconds,
                talk_seconds,
            } => {
                let room_id = self.host_room()?;
                let room = room_service::update_setup(
                    &self.state,
                    &room_id,
                    role_add,
                    role_sub,
                    role_seconds,
                    talk_seconds,
                )
                .await?;
                let update = ServerEvent::SetupUpdated {
                    roles: room.role_list(),
                    role_seconds: room.role_seconds,
                    talk_seconds: room.talk_seconds,
                };
                self.state
                    .send_to_room(&room_id, Recipient::All, update)
                    .await;
            }
            ClientMessage::SetupDone => {
                let room_id = self.host_room()?;
                let setup = room_service::finalize(&self.state, &room_id).await?;
                self.state
                    .send_to_room(
                        &room_id,
                        Recipient::All,
                        ServerEvent::SetupFinal {
                            setup: setup.clone(),
                        },
                    )
                    .await;
                game_service::start_game(self.state.clone(), room_id, setup).await?;
            }
            ClientMessage::Pick { token, indices } => {
                let (game, player) = self.game().await?;
                if !game.submit_selection(token, indices).await? {
                    debug!(player, %token, "selection not taken");
                }
            }
            ClientMessage::Ready => {
                let (game, player) = self.game().await?;
                game.submit_readiness(player)?;
            }
            ClientMessage::Vote { target } => {
                let (game, player) = self.game().await?;
                game.submit_vote(player, target)?;
            }
        }
        Ok(())
    }

    fn ensure_unseated(&self) -> Result<(), RoomError> {
        match self.seat {
            Some(_) => Err(RoomError::AlreadyInRoom),
            None => Ok(()),
        }
    }

    fn host_room(&self) -> Result<String, RoomError> {
        match &self.seat {
            Some((room_id, HOST)) => Ok(room_id.clone()),
            Some(_) => Err(RoomError::NotHost),
            None => Err(RoomError::NotInRoom),
        }
    }

    async fn game(&self) -> Result<(GameHandle, PlayerId), RoomError> {
        let (room_id, player) = self.seat.as_ref().ok_or(RoomError::NotInRoom)?;
        let game = self.state.game(room_id).await.ok_or(RoomError::NoGame)?;
        Ok((game, *player))
    }

    /// Take the seat and start relaying the room's messages addressed to it.
    async fn attach(&mut self, room_id: &str, player: PlayerId) {
        let mut rx = self
            .state
            .get_or_create_room_channel(room_id)
            .await
            .subscribe();
        let out = self.out.clone();
        let room = room_id.to_string();
        self.forward = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => {
                        if envelope.to.includes(player) && out.send(envelope.message).is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(room_id = %room, player, skipped, "socket fell behind its room");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
        self.seat = Some((room_id.to_string(), player));
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(forward) = self.forward.take() {
            forward.abort();
        }
    }
}
