//! Lobby and WebSocket transport for the werewolf engine. Players gather in
//! a room, the host picks the roles, and the room's sockets are bridged to a
//! running game.

pub mod app;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
