use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Animation, Board, ClientMessage, PlayerInfo, Seat, ServerMessage};
use uuid::Uuid;

use crate::error::ClientError;
use crate::input::Command;
use crate::sync::{GameSync, MatchSummary};

/// What the player asked to do when starting the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Host,
    Join(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lobby {
    Connecting,
    WaitingForGuest { invite_code: String },
    Joining,
    Playing,
    PeerLeft,
}

/// Lobby and game state of one client, driven by server messages and local
/// commands on a single task.
pub struct ClientSession {
    intent: Intent,
    player: PlayerInfo,
    lobby: Lobby,
    session_id: Option<Uuid>,
    opponent: Option<PlayerInfo>,
    board: Board,
    sync: Option<GameSync>,
    rng: StdRng,
}

impl ClientSession {
    pub fn new(intent: Intent, player: PlayerInfo, board: Board) -> Self {
        Self::with_rng(intent, player, board, StdRng::from_entropy())
    }

    pub fn with_rng(intent: Intent, player: PlayerInfo, board: Board, rng: StdRng) -> Self {
        Self {
            intent,
            player,
            lobby: Lobby::Connecting,
            session_id: None,
            opponent: None,
            board,
            sync: None,
            rng,
        }
    }

    pub fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn opponent(&self) -> Option<&PlayerInfo> {
        self.opponent.as_ref()
    }

    pub fn game(&self) -> Option<&GameSync> {
        self.sync.as_ref()
    }

    pub fn local_seat(&self) -> Seat {
        match self.intent {
            Intent::Host => Seat::Host,
            Intent::Join(_) => Seat::Guest,
        }
    }

    /// First message to send once the connection is up.
    pub fn opening_message(&mut self) -> ClientMessage {
        match &self.intent {
            Intent::Host => ClientMessage::create_session(self.player.clone()),
            Intent::Join(code) => {
                self.lobby = Lobby::Joining;
                ClientMessage::join_session(code.clone(), self.player.clone())
            }
        }
    }

    pub fn handle_server_message(&mut self, message: ServerMessage) -> Result<(), ClientError> {
        match message {
            ServerMessage::SessionCreated {
                session_id,
                invite_code,
            } => {
                info!("Session created, invite code: {}", invite_code);
                self.session_id = Some(session_id);
                self.lobby = Lobby::WaitingForGuest { invite_code };
            }
            ServerMessage::PlayerJoined { guest_info } => {
                info!("{} {} joined your game", guest_info.avatar, guest_info.name);
                self.opponent = Some(guest_info);
            }
            ServerMessage::SessionJoined {
                session_id,
                host_info,
            } => {
                info!("Joined {} {}'s game", host_info.avatar, host_info.name);
                self.session_id = Some(session_id);
                self.opponent = Some(host_info);
            }
            ServerMessage::GameReady { session_id } => {
                self.session_id = Some(session_id);
                self.lobby = Lobby::Playing;
                info!("Game ready, you are {}", self.local_seat());
                self.sync = Some(GameSync::new(self.local_seat(), self.board.clone()));
            }
            ServerMessage::GameMessage { session_id, data } => {
                if self.session_id != Some(session_id) {
                    warn!("Game message for foreign session {}", session_id);
                    return Ok(());
                }
                match self.sync.as_mut() {
                    Some(sync) => {
                        if let Err(e) = sync.apply_payload(data) {
                            warn!("Unreadable game message: {}", e);
                        }
                    }
                    None => warn!("Game message before the game started"),
                }
            }
            ServerMessage::PlayerDisconnected { .. } => {
                self.lobby = Lobby::PeerLeft;
                if let Some(sync) = self.sync.as_mut() {
                    sync.peer_disconnected();
                } else {
                    info!("Opponent disconnected");
                }
            }
            ServerMessage::Error { message } => {
                if self.lobby == Lobby::Playing {
                    warn!("Server error: {}", message);
                } else {
                    return Err(ClientError::Rejected(message));
                }
            }
            ServerMessage::Pong => debug!("Pong"),
        }
        Ok(())
    }

    /// Applies a local command and returns the messages to send.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<ClientMessage>, ClientError> {
        if command == Command::Ping {
            return Ok(vec![ClientMessage::Ping]);
        }
        if command == Command::Help {
            info!("{}", Command::help());
            return Ok(Vec::new());
        }

        let (Some(sync), Some(session_id)) = (self.sync.as_mut(), self.session_id) else {
            info!("The game has not started yet");
            return Ok(Vec::new());
        };

        let actions = match command {
            Command::Roll => sync.roll(&mut self.rng),
            Command::Move => sync.move_token(),
            Command::Reset => sync.reset(),
            Command::Status => {
                let turn = sync.turn();
                info!(
                    "{} | positions {:?} | {:?}",
                    sync.status(),
                    turn.positions(),
                    turn.phase()
                );
                Vec::new()
            }
            Command::Ping | Command::Help | Command::Quit => Vec::new(),
        };

        actions
            .iter()
            .map(|action| ClientMessage::game_action(session_id, action).map_err(ClientError::from))
            .collect()
    }

    /// True while a dice or token animation is pending.
    pub fn animation_pending(&self) -> bool {
        self.sync
            .as_ref()
            .is_some_and(|sync| sync.turn().in_flight().is_some())
    }

    pub fn settle(&mut self) -> Option<Animation> {
        self.sync.as_mut().and_then(GameSync::settle)
    }

    pub fn take_finished_match(&mut self) -> Option<MatchSummary> {
        self.sync.as_mut().and_then(GameSync::take_finished_match)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::GameAction;

    fn host_session() -> ClientSession {
        ClientSession::with_rng(
            Intent::Host,
            PlayerInfo::new("Alice", "🙂"),
            Board::standard().unwrap(),
            StdRng::seed_from_u64(1),
        )
    }

    fn start(session: &mut ClientSession) -> Uuid {
        let session_id = Uuid::new_v4();
        session
            .handle_server_message(ServerMessage::GameReady { session_id })
            .unwrap();
        session_id
    }

    #[test]
    fn test_opening_messages() {
        let mut host = host_session();
        assert_eq!(
            host.opening_message(),
            ClientMessage::create_session(PlayerInfo::new("Alice", "🙂"))
        );

        let mut guest = ClientSession::new(
            Intent::Join("ab12cd34".to_string()),
            PlayerInfo::new("Bob", "😎"),
            Board::standard().unwrap(),
        );
        assert_eq!(
            guest.opening_message(),
            ClientMessage::join_session("ab12cd34", PlayerInfo::new("Bob", "😎"))
        );
        assert_eq!(guest.lobby(), &Lobby::Joining);
        assert_eq!(guest.local_seat(), Seat::Guest);
    }

    #[test]
    fn test_host_lobby_flow() {
        let mut host = host_session();
        let session_id = Uuid::new_v4();

        host.handle_server_message(ServerMessage::SessionCreated {
            session_id,
            invite_code: "AB12CD34".to_string(),
        })
        .unwrap();
        assert_eq!(
            host.lobby(),
            &Lobby::WaitingForGuest {
                invite_code: "AB12CD34".to_string()
            }
        );

        host.handle_server_message(ServerMessage::PlayerJoined {
            guest_info: PlayerInfo::new("Bob", "😎"),
        })
        .unwrap();
        host.handle_server_message(ServerMessage::GameReady { session_id })
            .unwrap();

        assert_eq!(host.lobby(), &Lobby::Playing);
        assert_eq!(host.opponent().unwrap().name, "Bob");
        assert_eq!(host.game().unwrap().local_seat(), Seat::Host);
    }

    #[test]
    fn test_lobby_error_is_fatal() {
        let mut guest = ClientSession::new(
            Intent::Join("NOPE0000".to_string()),
            PlayerInfo::new("Bob", "😎"),
            Board::standard().unwrap(),
        );
        let err = guest
            .handle_server_message(ServerMessage::Error {
                message: "Session not found".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ClientError::Rejected(ref m) if m == "Session not found"));
    }

    #[test]
    fn test_commands_wrap_actions_in_envelopes() {
        let mut host = host_session();
        let session_id = start(&mut host);

        let messages = host.handle_command(Command::Roll).unwrap();
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            ClientMessage::GameMessage {
                session_id: id,
                data,
            } => {
                assert_eq!(*id, session_id);
                assert_eq!(data["type"], "dice_roll");
                assert_eq!(data["player"], 0);
            }
            other => panic!("Expected a game message, got {:?}", other),
        }

        // Dice still rolling.
        assert!(host.animation_pending());
        assert!(host.handle_command(Command::Move).unwrap().is_empty());

        assert_eq!(host.settle(), Some(Animation::Dice));
        assert_eq!(host.handle_command(Command::Move).unwrap().len(), 2);
    }

    #[test]
    fn test_commands_before_game_are_ignored() {
        let mut host = host_session();
        assert!(host.handle_command(Command::Roll).unwrap().is_empty());
        assert_eq!(
            host.handle_command(Command::Ping).unwrap(),
            vec![ClientMessage::Ping]
        );
    }

    #[test]
    fn test_remote_game_message_is_mirrored() {
        let mut guest = ClientSession::new(
            Intent::Join("AB12CD34".to_string()),
            PlayerInfo::new("Bob", "😎"),
            Board::standard().unwrap(),
        );
        let session_id = start(&mut guest);

        guest
            .handle_server_message(ServerMessage::GameMessage {
                session_id,
                data: json!({"type": "move_complete", "player": 0, "position": 14, "move_count": 1}),
            })
            .unwrap();
        guest
            .handle_server_message(ServerMessage::GameMessage {
                session_id: Uuid::new_v4(),
                data: json!({"type": "turn_change", "current_player": 1}),
            })
            .unwrap();

        let turn = guest.game().unwrap().turn();
        assert_eq!(turn.positions(), [14, 0]);
        assert_eq!(turn.current_player(), Seat::Host);
    }

    #[test]
    fn test_finished_match_is_reported_once() {
        let mut guest = ClientSession::new(
            Intent::Join("AB12CD34".to_string()),
            PlayerInfo::new("Bob", "😎"),
            Board::standard().unwrap(),
        );
        let session_id = start(&mut guest);
        let end = ClientMessage::game_action(session_id, &GameAction::GameEnd { winner: Seat::Host })
            .unwrap();
        let ClientMessage::GameMessage { data, .. } = end else {
            panic!("Expected a game message");
        };

        guest
            .handle_server_message(ServerMessage::GameMessage { session_id, data })
            .unwrap();

        let summary = guest.take_finished_match().unwrap();
        assert!(!summary.won);
        assert!(guest.take_finished_match().is_none());
    }

    #[test]
    fn test_peer_disconnect() {
        let mut host = host_session();
        let session_id = start(&mut host);
        host.handle_server_message(ServerMessage::PlayerDisconnected { session_id })
            .unwrap();

        assert_eq!(host.lobby(), &Lobby::PeerLeft);
        assert!(!host.game().unwrap().is_peer_connected());
        assert!(host.handle_command(Command::Roll).unwrap().is_empty());
    }
}
