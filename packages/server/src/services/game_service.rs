use onuw_engine::{EventSink, Game, GameError, GameHandle};
use tracing::{info, warn};

use crate::models::message::{Envelope, ServerEvent, ServerMessage};
use crate::models::room::GameSetup;
use crate::services::room_service;
use crate::state::AppState;

/// Deal a finalized room and run its game in the background. Engine events
/// are relayed onto the room channel as they happen; the night begins after
/// the configured start delay.
pub async fn start_game(
    state: AppState,
    room_id: String,
    setup: GameSetup,
) -> Result<GameHandle, GameError> {
    let config = state
        .config
        .game_config(setup.role_seconds, setup.talk_seconds);
    let tx = state.get_or_create_room_channel(&room_id).await;
    let (events, mut rx) = EventSink::channel();
    let game = Game::new(setup.roles, setup.names, config, events)?;
    let handle = game.handle();
    state
        .games
        .lock()
        .await
        .insert(room_id.clone(), handle.clone());

    let relay_room = room_id.clone();
    tokio::spawn(async move {
        while let Some(out) = rx.recv().await {
            let envelope = Envelope {
                to: out.to,
                message: ServerMessage::new(ServerEvent::Game(out.event)),
            };
            if tx.send(envelope).is_err() {
                warn!(room_id = %relay_room, "game event with nobody listening");
            }
        }
    });

    let delay = state.config.start_delay;
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        info!(room_id = %room_id, "game starting");
        let outcome = game.play().await;
        info!(room_id = %room_id, winners = ?outcome.winners, "game finished");
        room_service::close_room(&state, &room_id).await;
    });

    Ok(handle)
}
