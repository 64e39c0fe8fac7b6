use alloc::string::String;
use alloc::vec::Vec;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Redacted value of a cell that is neither revealed nor flagged.
pub const HIDDEN: i8 = -2;
/// Redacted value of a flagged, unrevealed cell.
pub const FLAGGED: i8 = -3;

/// Valid transitions:
/// - Playing -> Paused -> Playing
/// - Playing -> Won | Lost
/// - Playing | Paused -> Surrendered
/// - any -> Playing (restart)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Playing,
    Paused,
    Won,
    Lost,
    Surrendered,
}

impl SessionStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost | Self::Surrendered)
    }

    pub const fn as_str(self) -> &'static str {
        use SessionStatus::*;
        match self {
            Playing => "PLAYING",
            Paused => "PAUSED",
            Won => "WON",
            Lost => "LOST",
            Surrendered => "SURRENDERED",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Reveal the cell, `CLICK` on the wire.
    #[serde(rename = "CLICK")]
    Reveal,
    Flag,
    Unflag,
    ToggleFlag,
}

impl ActionKind {
    pub fn parse(value: &str) -> Option<Self> {
        use ActionKind::*;
        [Reveal, Flag, Unflag, ToggleFlag]
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
    }

    pub const fn as_str(self) -> &'static str {
        use ActionKind::*;
        match self {
            Reveal => "CLICK",
            Flag => "FLAG",
            Unflag => "UNFLAG",
            ToggleFlag => "TOGGLE_FLAG",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub coords: Coord2,
}

impl Action {
    pub const fn new(kind: ActionKind, coords: Coord2) -> Self {
        Self { kind, coords }
    }

    pub const fn reveal(coords: Coord2) -> Self {
        Self::new(ActionKind::Reveal, coords)
    }
}

/// What a batch did: how many actions changed the board and which ones were dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub applied: usize,
    pub skipped: Vec<usize>,
}

/// One game from creation to deletion. Fields are private: every change goes through the transition methods
/// below, which keep the reveal and flag grids consistent with the counters and the status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SessionRecord")]
pub struct Session {
    id: String,
    room_id: Option<String>,
    config: GameConfig,
    board: Board,
    revealed: Array2<bool>,
    flagged: Array2<bool>,
    revealed_count: CellCount,
    flagged_count: CellCount,
    status: SessionStatus,
    players: Vec<String>,
    current_player: Option<String>,
    started_at: Millis,
    paused_total: Millis,
    paused_at: Option<Millis>,
    ended_at: Option<Millis>,
}

/// Stored form of a [`Session`], only turned into one when grids, counters and status agree.
#[derive(Deserialize)]
struct SessionRecord {
    id: String,
    room_id: Option<String>,
    config: GameConfig,
    board: Board,
    revealed: Array2<bool>,
    flagged: Array2<bool>,
    revealed_count: CellCount,
    flagged_count: CellCount,
    status: SessionStatus,
    players: Vec<String>,
    current_player: Option<String>,
    started_at: Millis,
    paused_total: Millis,
    paused_at: Option<Millis>,
    ended_at: Option<Millis>,
}

impl SessionRecord {
    fn is_consistent(&self) -> bool {
        let count = |grid: &Array2<bool>| grid.iter().filter(|&&set| set).count();
        let dim = self.board.cells().dim();

        self.board.is_consistent()
            && self.config.size().to_nd_index() == [dim.0, dim.1]
            && self.config.mines == self.board.mine_count()
            && self.revealed.dim() == dim
            && self.flagged.dim() == dim
            && count(&self.revealed) == usize::from(self.revealed_count)
            && count(&self.flagged) == usize::from(self.flagged_count)
            && self
                .revealed
                .iter()
                .zip(self.flagged.iter())
                .all(|(&revealed, &flagged)| !(revealed && flagged))
            && self.paused_at.is_some() == (self.status == SessionStatus::Paused)
            && self.ended_at.is_some() == self.status.is_terminal()
            && self
                .current_player
                .as_ref()
                .is_none_or(|current| self.players.contains(current))
    }
}

impl TryFrom<SessionRecord> for Session {
    type Error = GameError;

    fn try_from(record: SessionRecord) -> Result<Self> {
        if !record.is_consistent() {
            return Err(GameError::CorruptSession);
        }

        let SessionRecord {
            id,
            room_id,
            config,
            board,
            revealed,
            flagged,
            revealed_count,
            flagged_count,
            status,
            players,
            current_player,
            started_at,
            paused_total,
            paused_at,
            ended_at,
        } = record;
        Ok(Self {
            id,
            room_id,
            config,
            board,
            revealed,
            flagged,
            revealed_count,
            flagged_count,
            status,
            players,
            current_player,
            started_at,
            paused_total,
            paused_at,
            ended_at,
        })
    }
}

impl Session {
    /// New game on a freshly generated board.
    pub fn new(id: impl Into<String>, config: GameConfig, seed: u64, now: Millis) -> Self {
        let board = RandomBoardGenerator::new(seed).generate(config);
        Self::with_board(id, board, config.difficulty, now)
    }

    /// New game on a given board, mostly useful to pin the layout.
    pub fn with_board(
        id: impl Into<String>,
        board: Board,
        difficulty: Difficulty,
        now: Millis,
    ) -> Self {
        let size = board.size();
        let config = GameConfig::new_unchecked(size.1, size.0, board.mine_count(), difficulty);
        Self {
            id: id.into(),
            room_id: None,
            config,
            revealed: Array2::default(size.to_nd_index()),
            flagged: Array2::default(size.to_nd_index()),
            board,
            revealed_count: 0,
            flagged_count: 0,
            status: SessionStatus::Playing,
            players: Vec::new(),
            current_player: None,
            started_at: now,
            paused_total: 0,
            paused_at: None,
            ended_at: None,
        }
    }

    pub fn in_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    /// Registers the roster. The current player is `current` when it is on the roster, otherwise the first
    /// player.
    pub fn with_players(mut self, players: Vec<String>, current: Option<&str>) -> Self {
        self.current_player = current
            .filter(|current| players.iter().any(|player| player == current))
            .map(String::from)
            .or_else(|| players.first().cloned());
        self.players = players;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn size(&self) -> Coord2 {
        self.board.size()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn current_player(&self) -> Option<&str> {
        self.current_player.as_deref()
    }

    pub fn started_at(&self) -> Millis {
        self.started_at
    }

    pub fn paused_total(&self) -> Millis {
        self.paused_total
    }

    pub fn paused_at(&self) -> Option<Millis> {
        self.paused_at
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count
    }

    pub fn mines_left(&self) -> isize {
        (self.board.mine_count() as isize) - (self.flagged_count as isize)
    }

    pub fn is_revealed(&self, coords: Coord2) -> bool {
        self.revealed[coords.to_nd_index()]
    }

    pub fn is_flagged(&self, coords: Coord2) -> bool {
        self.flagged[coords.to_nd_index()]
    }

    /// Active play time as of `now`, frozen while paused and after the game ended.
    pub fn elapsed(&self, now: Millis) -> Millis {
        clock::elapsed(
            self.started_at,
            self.paused_total,
            self.paused_at,
            self.ended_at.unwrap_or(now),
            self.status == SessionStatus::Paused,
        )
    }

    /// What a player may see of a cell: the true value once revealed or once the game is over, a sentinel
    /// otherwise.
    pub fn redacted_cell(&self, coords: Coord2) -> i8 {
        if self.is_revealed(coords) || self.is_terminal() {
            self.board[coords]
        } else if self.is_flagged(coords) {
            FLAGGED
        } else {
            HIDDEN
        }
    }

    pub fn redacted_board(&self) -> Array2<i8> {
        let (rows, cols) = self.size();
        Array2::from_shape_fn((rows.into(), cols.into()), |(row, col)| {
            self.redacted_cell((row as Coord, col as Coord))
        })
    }

    pub fn reveal(&mut self, coords: Coord2, now: Millis) -> Result<RevealOutcome> {
        let coords = self.board.validate_coords(coords)?;
        self.check_playing()?;

        if self.is_revealed(coords) || self.is_flagged(coords) {
            return Ok(RevealOutcome::NoChange);
        }

        self.mark_revealed(coords);

        if self.board.contains_mine(coords) {
            log::debug!("session {}: mine hit at {:?}", self.id, coords);
            self.end_game(SessionStatus::Lost, now);
            return Ok(RevealOutcome::HitMine);
        }

        if self.board[coords] == 0 {
            self.flood_fill(coords);
        }

        if self.revealed_count == self.board.safe_cell_count() {
            self.end_game(SessionStatus::Won, now);
            Ok(RevealOutcome::Won)
        } else {
            Ok(RevealOutcome::Revealed)
        }
    }

    /// Opens the zero region around `origin` and its bordering ring, using an explicit stack.
    fn flood_fill(&mut self, origin: Coord2) {
        let mut to_visit: Vec<Coord2> = Vec::from([origin]);

        while let Some(zero_coords) = to_visit.pop() {
            for pos in self.board.iter_neighbors(zero_coords) {
                if self.is_revealed(pos) || self.is_flagged(pos) {
                    continue;
                }

                self.mark_revealed(pos);
                if self.board[pos] == 0 {
                    to_visit.push(pos);
                }
            }
        }
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.board.validate_coords(coords)?;
        let flagged = !self.is_flagged(coords);
        self.set_flag(coords, flagged)
    }

    /// Puts or removes a flag, no change when the cell already is in that state or is revealed.
    pub fn set_flag(&mut self, coords: Coord2, flagged: bool) -> Result<MarkOutcome> {
        let coords = self.board.validate_coords(coords)?;
        self.check_playing()?;

        if self.is_revealed(coords) || self.is_flagged(coords) == flagged {
            return Ok(MarkOutcome::NoChange);
        }

        self.flagged[coords.to_nd_index()] = flagged;
        if flagged {
            self.flagged_count += 1;
        } else {
            self.flagged_count -= 1;
        }
        Ok(MarkOutcome::Changed)
    }

    /// Applies one player action, rejecting actions that would not change anything.
    pub fn apply(&mut self, action: Action, now: Millis) -> Result<()> {
        use ActionKind::*;

        let changed = match action.kind {
            Reveal => self.reveal(action.coords, now)?.has_update(),
            Flag => self.set_flag(action.coords, true)?.has_update(),
            Unflag => self.set_flag(action.coords, false)?.has_update(),
            ToggleFlag => self.toggle_flag(action.coords)?.has_update(),
        };

        if changed {
            Ok(())
        } else {
            Err(GameError::NoEffect)
        }
    }

    /// Applies actions in order, skipping the ones that fail so one stale target does not abort a compound
    /// gesture. The batch as a whole still requires a running game.
    pub fn apply_batch(&mut self, actions: &[Action], now: Millis) -> Result<BatchReport> {
        self.check_playing()?;

        let mut report = BatchReport::default();
        for (index, &action) in actions.iter().enumerate() {
            match self.apply(action, now) {
                Ok(()) => report.applied += 1,
                Err(err) => {
                    log::warn!(
                        "session {}: batch action {} {:?} skipped: {}",
                        self.id,
                        index,
                        action,
                        err
                    );
                    report.skipped.push(index);
                }
            }
        }
        Ok(report)
    }

    pub fn pause(&mut self, now: Millis) -> Result<()> {
        self.check_playing()?;
        self.paused_at = Some(now);
        self.status = SessionStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self, now: Millis) -> Result<()> {
        if self.status != SessionStatus::Paused {
            return Err(GameError::NotPaused);
        }
        self.bank_pause(now);
        self.status = SessionStatus::Playing;
        Ok(())
    }

    /// Gives up: every mine is revealed, the rest of the board stays as it was.
    pub fn surrender(&mut self, now: Millis) -> Result<()> {
        if self.is_terminal() {
            return Err(GameError::AlreadyEnded);
        }
        self.bank_pause(now);

        let mines: Vec<Coord2> = self.board.iter_mines().collect();
        for coords in mines {
            if self.is_revealed(coords) {
                continue;
            }
            if self.is_flagged(coords) {
                self.flagged[coords.to_nd_index()] = false;
                self.flagged_count -= 1;
            }
            self.mark_revealed(coords);
        }

        self.end_game(SessionStatus::Surrendered, now);
        Ok(())
    }

    /// Starts over on a new board with the same geometry. Id, room and roster survive, the first player
    /// becomes current again.
    pub fn restart(&mut self, seed: u64, now: Millis) {
        let board = RandomBoardGenerator::new(seed).generate(self.config);
        let size = board.size();

        self.board = board;
        self.revealed = Array2::default(size.to_nd_index());
        self.flagged = Array2::default(size.to_nd_index());
        self.revealed_count = 0;
        self.flagged_count = 0;
        self.status = SessionStatus::Playing;
        self.current_player = self.players.first().cloned();
        self.started_at = now;
        self.paused_total = 0;
        self.paused_at = None;
        self.ended_at = None;
    }

    fn mark_revealed(&mut self, coords: Coord2) {
        self.revealed[coords.to_nd_index()] = true;
        self.revealed_count += 1;
    }

    fn bank_pause(&mut self, now: Millis) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += now.saturating_sub(paused_at);
        }
    }

    fn end_game(&mut self, status: SessionStatus, now: Millis) {
        debug_assert!(status.is_terminal());
        log::debug!("session {}: {:?} -> {:?}", self.id, self.status, status);
        self.status = status;
        self.ended_at = Some(now);
    }

    fn check_playing(&self) -> Result<()> {
        match self.status {
            SessionStatus::Playing => Ok(()),
            SessionStatus::Paused => Err(GameError::Paused),
            _ => Err(GameError::AlreadyEnded),
        }
    }
}
