use mineroom_core::{
    ActionKind, Coord, Coord2, Difficulty, ErrorKind, GameConfig, GameError, Millis, Room,
    RoomStatus, Session, SessionStatus, coords_from_wire,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub width: u32,
    pub height: u32,
    pub mine_count: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl CreateSessionRequest {
    pub fn new(width: u32, height: u32, mine_count: u32) -> Self {
        Self {
            width,
            height,
            mine_count,
            difficulty: Difficulty::Custom,
            room_id: None,
            user_id: None,
        }
    }

    /// Request filled in from a named difficulty, `None` for `CUSTOM`.
    pub fn preset(difficulty: Difficulty) -> Option<Self> {
        let config = GameConfig::from_difficulty(difficulty)?;
        Some(Self {
            difficulty,
            ..Self::new(
                config.width.into(),
                config.height.into(),
                config.mines.into(),
            )
        })
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn config(&self) -> Result<GameConfig, GameError> {
        GameConfig::new(self.width, self.height, self.mine_count, self.difficulty)
    }
}

/// One player action. `action` is kept as text: `CLICK`, `FLAG`, `UNFLAG` or `TOGGLE_FLAG`, in any case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAction {
    pub row: u32,
    pub col: u32,
    pub action: String,
}

impl PlayerAction {
    pub fn new(kind: ActionKind, row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            action: kind.as_str().into(),
        }
    }

    pub fn kind(&self) -> Option<ActionKind> {
        ActionKind::parse(&self.action)
    }

    pub fn coords(&self) -> Option<Coord2> {
        coords_from_wire(self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchActionRequest {
    pub actions: Vec<PlayerAction>,
}

/// Player-facing state of a session. The board never carries a mine that has not been revealed while the game
/// is still running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub room_id: Option<String>,
    pub width: Coord,
    pub height: Coord,
    pub mine_count: u16,
    pub difficulty: Difficulty,
    pub status: SessionStatus,
    pub elapsed_ms: Millis,
    pub start_time: Millis,
    pub players: Vec<String>,
    pub current_player_id: Option<String>,
    pub revealed_count: u16,
    pub mines_left: i32,
    /// Rows of cells: `-1` mine, `0..=8` count, `-2` hidden, `-3` flagged.
    pub board: Vec<Vec<i8>>,
}

impl SessionView {
    pub fn from_session(session: &Session, now: Millis) -> Self {
        let config = session.config();
        let board = session
            .redacted_board()
            .rows()
            .into_iter()
            .map(|row| row.to_vec())
            .collect();

        Self {
            session_id: session.id().into(),
            room_id: session.room_id().map(String::from),
            width: config.width,
            height: config.height,
            mine_count: config.mines,
            difficulty: config.difficulty,
            status: session.status(),
            elapsed_ms: session.elapsed(now),
            start_time: session.started_at(),
            players: session.players().to_vec(),
            current_player_id: session.current_player().map(String::from),
            revealed_count: session.revealed_count(),
            mines_left: session.mines_left() as i32,
            board,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<i8> {
        self.board.get(row)?.get(col).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchView {
    pub session: SessionView,
    pub applied: usize,
    pub skipped: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub room_name: String,
    pub max_players: u8,
    pub host_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub room_id: String,
    pub room_name: String,
    pub host_id: String,
    /// Display name of the host, filled in by whoever knows the users.
    #[serde(default)]
    pub host_name: Option<String>,
    pub player_ids: Vec<String>,
    pub max_players: u8,
    pub current_player_count: usize,
    pub current_game_id: Option<String>,
    pub status: RoomStatus,
    pub created_at: Millis,
}

impl From<&Room> for RoomView {
    fn from(room: &Room) -> Self {
        Self {
            room_id: room.id().into(),
            room_name: room.name().into(),
            host_id: room.host_id().into(),
            host_name: None,
            player_ids: room.members().to_vec(),
            max_players: room.max_players(),
            current_player_count: room.members().len(),
            current_game_id: room.bound_session().map(String::from),
            status: room.status(),
            created_at: room.created_at(),
        }
    }
}

/// Tagged error as handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorBody {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<GameError> for ErrorBody {
    fn from(err: GameError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode, encode};
    use mineroom_core::{Board, FLAGGED, HIDDEN, MINE};

    fn session() -> Session {
        let board = Board::from_mine_coords((5, 5), &[(0, 0), (4, 4)]).unwrap();
        Session::with_board("GAME_view", board, Difficulty::Custom, 1_000)
            .with_players(vec!["alice".into()], None)
    }

    #[test]
    fn view_redacts_running_game() {
        let mut session = session();
        session.toggle_flag((4, 4)).unwrap();
        session.reveal((0, 1), 1_000).unwrap();

        let view = SessionView::from_session(&session, 4_000);

        assert_eq!(view.cell(0, 0), Some(HIDDEN));
        assert_eq!(view.cell(0, 1), Some(1));
        assert_eq!(view.cell(4, 4), Some(FLAGGED));
        assert_eq!(view.elapsed_ms, 3_000);
        assert_eq!(view.mines_left, 1);
        assert_eq!(view.current_player_id.as_deref(), Some("alice"));
        assert!(view.board.iter().flatten().all(|&cell| cell != MINE));
    }

    #[test]
    fn view_shows_everything_when_over() {
        let mut session = session();
        session.reveal((0, 0), 2_000).unwrap();

        let view = SessionView::from_session(&session, 9_000);

        assert_eq!(view.status, SessionStatus::Lost);
        assert_eq!(view.cell(4, 4), Some(MINE));
        assert_eq!(view.cell(2, 2), Some(0));
        assert_eq!(view.elapsed_ms, 1_000);
    }

    #[test]
    fn view_serializes_with_wire_names() {
        let view = SessionView::from_session(&session(), 1_000);

        let json = encode(&view).unwrap();

        assert!(json.contains("\"sessionId\":\"GAME_view\""));
        assert!(json.contains("\"status\":\"PLAYING\""));
        assert!(json.contains("\"difficulty\":\"CUSTOM\""));
        assert!(json.contains("[-2,-2,-2,-2,-2]"));
        assert_eq!(decode::<SessionView>(&json), Some(view));
    }

    #[test]
    fn create_request_defaults_optional_fields() {
        let request: CreateSessionRequest =
            decode(r#"{"width":9,"height":9,"mineCount":10}"#).unwrap();

        assert_eq!(request, CreateSessionRequest::new(9, 9, 10));
        assert_eq!(request.config().unwrap().mines, 10);
    }

    #[test]
    fn create_request_config_validates() {
        let request = CreateSessionRequest::new(5, 5, 25);
        assert_eq!(
            request.config(),
            Err(GameError::InvalidMineCount { max: 24 })
        );
    }

    #[test]
    fn preset_request_uses_difficulty_geometry() {
        let request = CreateSessionRequest::preset(Difficulty::Hard).unwrap();
        assert_eq!((request.width, request.height, request.mine_count), (30, 16, 99));
        assert_eq!(request.difficulty, Difficulty::Hard);
        assert_eq!(CreateSessionRequest::preset(Difficulty::Custom), None);
    }

    #[test]
    fn player_action_parses_kind_and_coords() {
        let action: PlayerAction = decode(r#"{"row":1,"col":2,"action":"click"}"#).unwrap();
        assert_eq!(action.kind(), Some(ActionKind::Reveal));
        assert_eq!(action.coords(), Some((1, 2)));

        let bogus = PlayerAction {
            row: 1000,
            col: 0,
            action: "DIG".into(),
        };
        assert_eq!(bogus.kind(), None);
        assert_eq!(bogus.coords(), None);
    }

    #[test]
    fn room_view_mirrors_room() {
        let mut room = Room::new("ROOM_abc", "friends", "alice", 3, 42).unwrap();
        room.join("bob").unwrap();
        room.bind_session("GAME_1").unwrap();

        let view = RoomView::from(&room);

        assert_eq!(view.player_ids, ["alice", "bob"]);
        assert_eq!(view.current_player_count, 2);
        assert_eq!(view.current_game_id.as_deref(), Some("GAME_1"));
        assert_eq!(view.status, RoomStatus::Playing);
        assert!(encode(&view).unwrap().contains("\"status\":\"PLAYING\""));
    }

    #[test]
    fn error_body_carries_kind() {
        let body = ErrorBody::from(GameError::RoomFull);
        assert_eq!(body.kind, ErrorKind::Conflict);
        assert_eq!(body.message, "Room is full");
        assert!(encode(&body).unwrap().contains("\"kind\":\"CONFLICT\""));
    }
}
