use onuw_engine::{GameEvent, PlayerId, Recipient, Role, Token};
use serde::{Deserialize, Serialize};

use super::room::GameSetup;

/// What a browser may send over the socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Create {
        name: String,
    },
    Join {
        room_id: String,
        name: String,
    },
    SetupStart,
    SetupInfo {
        #[serde(default)]
        role_add: Option<Role>,
        #[serde(default)]
        role_sub: Option<Role>,
        #[serde(default)]
        role_seconds: Option<u64>,
        #[serde(default)]
        talk_seconds: Option<u64>,
    },
    SetupDone,
    Pick {
        token: Token,
        indices: Vec<usize>,
    },
    Ready,
    Vote {
        target: PlayerId,
    },
}

/// What the server tells a socket. Only ever encoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Created {
        room_id: String,
        player: PlayerId,
    },
    Joined {
        room_id: String,
        player: PlayerId,
        players: Vec<String>,
    },
    PlayerJoined {
        player: PlayerId,
        name: String,
    },
    SetupStarted {
        players: Vec<String>,
    },
    SetupUpdated {
        roles: Vec<Role>,
        role_seconds: u64,
        talk_seconds: u64,
    },
    SetupFinal {
        setup: GameSetup,
    },
    Game(GameEvent),
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerMessage {
    #[serde(flatten)]
    pub event: ServerEvent,
    pub timestamp: String,
}

impl ServerMessage {
    pub fn new(event: ServerEvent) -> Self {
        ServerMessage {
            event,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl From<ServerEvent> for ServerMessage {
    fn from(event: ServerEvent) -> Self {
        ServerMessage::new(event)
    }
}

/// A message on a room's broadcast channel, with the seat it is meant for.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub to: Recipient,
    pub message: ServerMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn setup_info_fields_are_optional() {
        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "setup_info", "role_add": "Seer"})).unwrap();
        assert_eq!(
            msg,
            ClientMessage::SetupInfo {
                role_add: Some(Role::Seer),
                role_sub: None,
                role_seconds: None,
                talk_seconds: None,
            }
        );
    }

    #[test]
    fn unit_messages_parse_from_bare_type() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ready"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ready);
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"shout"}"#).is_err());
    }

    #[test]
    fn game_events_nest_under_the_game_type() {
        let msg = ServerMessage::new(ServerEvent::Game(GameEvent::Dealt {
            role: Role::Tanner,
        }));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "game");
        assert_eq!(value["event"], "dealt");
        assert_eq!(value["role"], "Tanner");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn player_prompts_keep_banned_seats_and_token() {
        let token = Token::new();
        let banned = [(1, "You may not select yourself".to_string())]
            .into_iter()
            .collect();
        let msg = ServerMessage::new(ServerEvent::Game(GameEvent::PromptPlayers {
            token,
            count: 1,
            banned,
        }));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["event"], "prompt_players");
        assert_eq!(value["token"], token.to_string());
        assert_eq!(value["banned"]["1"], "You may not select yourself");
    }
}
