use onuw_engine::{GameHandle, Recipient, RoleCatalog};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::models::config::ServerConfig;
use crate::models::message::{Envelope, ServerEvent, ServerMessage};
use crate::models::room::Room;

const ROOM_CHANNEL_CAPACITY: usize = 1000;

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<Mutex<HashMap<String, Room>>>,
    /// Running games, keyed by room id.
    pub games: Arc<Mutex<HashMap<String, GameHandle>>>,
    pub channel: Arc<Mutex<HashMap<String, broadcast::Sender<Envelope>>>>,
    pub catalog: Arc<RoleCatalog>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        AppState {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            games: Arc::new(Mutex::new(HashMap::new())),
            channel: Arc::new(Mutex::new(HashMap::new())),
            catalog: Arc::new(RoleCatalog::standard()),
            config: Arc::new(config),
        }
    }

    pub async fn get_or_create_room_channel(&self, room_id: &str) -> broadcast::Sender<Envelope> {
        let mut channels = self.channel.lock().await;
        if let Some(channel) = channels.get(room_id) {
            channel.clone()
        } else {
            let (tx, _) = broadcast::channel(ROOM_CHANNEL_CAPACITY);
            channels.insert(room_id.to_string(), tx.clone());
            tx
        }
    }

    pub async fn send_to_room(&self, room_id: &str, to: Recipient, event: ServerEvent) {
        let tx = self.get_or_create_room_channel(room_id).await;
        let envelope = Envelope {
            to,
            message: ServerMessage::new(event),
        };
        if tx.send(envelope).is_err() {
            debug!(room_id, "nobody listening in room");
        }
    }

    pub async fn game(&self, room_id: &str) -> Option<GameHandle> {
        self.games.lock().await.get(room_id).cloned()
    }
}
