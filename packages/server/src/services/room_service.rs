use onuw_engine::{PlayerId, Role};
use std::collections::HashMap;
use tracing::info;

use crate::{
    models::room::{generate_room_id, GameSetup, Room, RoomError, ROOM_ID_ATTEMPTS},
    state::AppState,
};

/// Open a room with `host` in seat 0.
pub async fn create_room(state: &AppState, host: String) -> Result<String, RoomError> {
    let mut rooms = state.rooms.lock().await;
    let room_id = {
        let mut rng = rand::thread_rng();
        (0..ROOM_ID_ATTEMPTS)
            .map(|_| generate_room_id(&mut rng))
            .find(|id| !rooms.contains_key(id))
    }
    .ok_or(RoomError::NoFreeId)?;

    let room = Room::new(
        room_id.clone(),
        host,
        state.config.role_seconds,
        state.config.talk_seconds,
    );
    rooms.insert(room_id.clone(), room);
    info!(room_id = %room_id, "room created");
    Ok(room_id)
}

/// Returns the new seat and the full roster.
pub async fn join_room(
    state: &AppState,
    room_id: &str,
    name: String,
) -> Result<(PlayerId, Vec<String>), RoomError> {
    let mut rooms = state.rooms.lock().await;
    let room = rooms.get_mut(room_id).ok_or(RoomError::NotFound)?;
    let player = room.add_player(name)?;
    info!(room_id, player, "player joined");
    Ok((player, room.players.clone()))
}

pub async fn start_setup(state: &AppState, room_id: &str) -> Result<Vec<String>, RoomError> {
    let mut rooms = state.rooms.lock().await;
    let room = rooms.get_mut(room_id).ok_or(RoomError::NotFound)?;
    room.start_setup()?;
    Ok(room.players.clone())
}

pub async fn update_setup(
    state: &AppState,
    room_id: &str,
    role_add: Option<Role>,
    role_sub: Option<Role>,
    role_seconds: Option<u64>,
    talk_seconds: Option<u64>,
) -> Result<Room, RoomError> {
    let mut rooms = state.rooms.lock().await;
    let room = rooms.get_mut(room_id).ok_or(RoomError::NotFound)?;
    if let Some(role) = role_add {
        room.add_role(&state.catalog, role)?;
    }
    if let Some(role) = role_sub {
        room.remove_role(role)?;
    }
    room.set_times(role_seconds, talk_seconds);
    Ok(room.clone())
}

pub async fn finalize(state: &AppState, room_id: &str) -> Result<GameSetup, RoomError> {
    let mut rooms = state.rooms.lock().await;
    let room = rooms.get_mut(room_id).ok_or(RoomError::NotFound)?;
    room.finalize(&state.catalog)
}

/// Forget a room once its game is over. Sockets still seated there get
/// their last messages and then see the channel close.
pub async fn close_room(state: &AppState, room_id: &str) {
    state.rooms.lock().await.remove(room_id);
    state.channel.lock().await.remove(room_id);
    state.games.lock().await.remove(room_id);
    info!(room_id, "room closed");
}

pub async fn get_rooms(state: &AppState) -> HashMap<String, Room> {
    state.rooms.lock().await.clone()
}

pub async fn get_room_info(state: &AppState, room_id: &str) -> Option<Room> {
    state.rooms.lock().await.get(room_id).cloned()
}
