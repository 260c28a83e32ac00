//! JSON wire protocol between clients and the relay server.
//!
//! Every frame is a JSON object carrying a `type` discriminator. Game actions
//! travel inside a `game_message` envelope whose `data` the server never
//! inspects, which is why the envelopes hold a raw [`serde_json::Value`] and
//! only the client decodes it into a [`GameAction`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::RelayError;
use crate::turn::Seat;
use crate::INVITE_CODE_LEN;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
    pub avatar: String,
}

impl PlayerInfo {
    pub fn new(name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: avatar.into(),
        }
    }
}

/// A game action produced by the player it describes and consumed by the
/// opponent only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameAction {
    DiceRoll {
        player: Seat,
        value: u8,
    },
    #[serde(alias = "move")]
    MoveComplete {
        player: Seat,
        position: u8,
        #[serde(default, alias = "moveCount")]
        move_count: u32,
    },
    TurnChange {
        current_player: Seat,
    },
    Reset,
    GameEnd {
        winner: Seat,
    },
}

impl GameAction {
    pub fn to_value(&self) -> Result<Value, RelayError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: Value) -> Result<Self, RelayError> {
        Ok(serde_json::from_value(value)?)
    }
}

fn default_host_name() -> String {
    "Host".to_string()
}

fn default_guest_name() -> String {
    "Guest".to_string()
}

fn default_host_avatar() -> String {
    "🙂".to_string()
}

fn default_guest_avatar() -> String {
    "😎".to_string()
}

/// Messages from a client to the relay server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateSession {
        #[serde(default = "default_host_name")]
        player_name: String,
        #[serde(default = "default_host_avatar")]
        player_avatar: String,
    },
    JoinSession {
        invite_code: String,
        #[serde(default = "default_guest_name")]
        player_name: String,
        #[serde(default = "default_guest_avatar")]
        player_avatar: String,
    },
    GameMessage {
        session_id: Uuid,
        data: Value,
    },
    Ping,
}

impl ClientMessage {
    pub fn create_session(info: PlayerInfo) -> Self {
        ClientMessage::CreateSession {
            player_name: info.name,
            player_avatar: info.avatar,
        }
    }

    pub fn join_session(invite_code: impl Into<String>, info: PlayerInfo) -> Self {
        ClientMessage::JoinSession {
            invite_code: invite_code.into(),
            player_name: info.name,
            player_avatar: info.avatar,
        }
    }

    pub fn game_action(session_id: Uuid, action: &GameAction) -> Result<Self, RelayError> {
        Ok(ClientMessage::GameMessage {
            session_id,
            data: action.to_value()?,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, RelayError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Messages from the relay server to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    SessionCreated {
        session_id: Uuid,
        invite_code: String,
    },
    PlayerJoined {
        guest_info: PlayerInfo,
    },
    SessionJoined {
        session_id: Uuid,
        host_info: PlayerInfo,
    },
    GameReady {
        session_id: Uuid,
    },
    GameMessage {
        session_id: Uuid,
        data: Value,
    },
    PlayerDisconnected {
        session_id: Uuid,
    },
    Error {
        message: String,
    },
    Pong,
}

impl ServerMessage {
    pub fn error(err: &RelayError) -> Self {
        ServerMessage::Error {
            message: err.to_string(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, RelayError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Invite code for a session: the first eight hex digits of its id, uppercased.
pub fn invite_code_for(session_id: &Uuid) -> String {
    session_id
        .simple()
        .to_string()
        .chars()
        .take(INVITE_CODE_LEN)
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Canonical form of a code typed by a player.
pub fn normalize_invite_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invite_code_shape() {
        let id = Uuid::new_v4();
        let code = invite_code_for(&id);
        assert_eq!(code.len(), INVITE_CODE_LEN);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert!(id.to_string().to_ascii_uppercase().starts_with(&code));
    }

    #[test]
    fn test_invite_code_is_deterministic() {
        let id = Uuid::parse_str("3f2a9c1b-0000-4000-8000-000000000000").unwrap();
        assert_eq!(invite_code_for(&id), "3F2A9C1B");
        assert_eq!(invite_code_for(&id), invite_code_for(&id));
    }

    #[test]
    fn test_normalize_invite_code() {
        assert_eq!(normalize_invite_code("  3f2a9c1b\n"), "3F2A9C1B");
    }

    #[test]
    fn test_game_action_wire_shape() {
        let action = GameAction::MoveComplete {
            player: Seat::Host,
            position: 14,
            move_count: 1,
        };
        assert_eq!(
            action.to_value().unwrap(),
            json!({"type": "move_complete", "player": 0, "position": 14, "move_count": 1})
        );
        assert_eq!(
            GameAction::Reset.to_value().unwrap(),
            json!({"type": "reset"})
        );
        assert_eq!(
            GameAction::TurnChange {
                current_player: Seat::Guest
            }
            .to_value()
            .unwrap(),
            json!({"type": "turn_change", "current_player": 1})
        );
    }

    #[test]
    fn test_legacy_move_tag_is_accepted() {
        let action = GameAction::from_value(json!({"type": "move", "player": 1, "position": 6}))
            .unwrap();
        assert_eq!(
            action,
            GameAction::MoveComplete {
                player: Seat::Guest,
                position: 6,
                move_count: 0
            }
        );

        let action = GameAction::from_value(
            json!({"type": "move_complete", "player": 1, "position": 6, "moveCount": 3}),
        )
        .unwrap();
        assert!(matches!(action, GameAction::MoveComplete { move_count: 3, .. }));
    }

    #[test]
    fn test_game_action_rejects_bad_seat() {
        let err = GameAction::from_value(json!({"type": "dice_roll", "player": 2, "value": 3}))
            .unwrap_err();
        assert!(matches!(err, RelayError::MalformedMessage(_)));
    }

    #[test]
    fn test_client_message_defaults() {
        let msg = ClientMessage::from_json(r#"{"type":"create_session"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateSession {
                player_name: "Host".to_string(),
                player_avatar: "🙂".to_string(),
            }
        );

        let msg = ClientMessage::from_json(r#"{"type":"join_session","invite_code":"ab12cd34"}"#)
            .unwrap();
        match msg {
            ClientMessage::JoinSession {
                invite_code,
                player_name,
                player_avatar,
            } => {
                assert_eq!(invite_code, "ab12cd34");
                assert_eq!(player_name, "Guest");
                assert_eq!(player_avatar, "😎");
            }
            _ => panic!("Wrong message type after parsing"),
        }
    }

    #[test]
    fn test_malformed_client_messages() {
        for text in [
            "not json",
            r#"{"type":"launch_rockets"}"#,
            r#"{"type":"join_session"}"#,
            r#"{"type":"game_message","session_id":"nope","data":{}}"#,
            r#"{"player_name":"Alice"}"#,
        ] {
            let err = ClientMessage::from_json(text).unwrap_err();
            assert!(
                matches!(err, RelayError::MalformedMessage(_)),
                "{} should be malformed",
                text
            );
        }
    }

    #[test]
    fn test_ping_pong_shape() {
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"ping"}"#).unwrap(),
            ClientMessage::Ping
        );
        assert_eq!(ServerMessage::Pong.to_json().unwrap(), r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_server_error_message() {
        let msg = ServerMessage::error(&RelayError::SessionFull);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "error", "message": "Session full"})
        );
    }

    #[test]
    fn test_game_envelope_keeps_payload() {
        let session_id = Uuid::new_v4();
        let action = GameAction::DiceRoll {
            player: Seat::Guest,
            value: 6,
        };
        let msg = ClientMessage::game_action(session_id, &action).unwrap();
        let parsed = ClientMessage::from_json(&msg.to_json().unwrap()).unwrap();
        match parsed {
            ClientMessage::GameMessage {
                session_id: id,
                data,
            } => {
                assert_eq!(id, session_id);
                assert_eq!(GameAction::from_value(data).unwrap(), action);
            }
            _ => panic!("Wrong message type after parsing"),
        }
    }
}
