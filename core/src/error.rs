use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification every error in the system maps onto.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed input, never worth retrying as-is.
    Validation,
    NotFound,
    /// The entity is in a state that does not allow the operation.
    Conflict,
    /// Programming or infrastructure fault, not user-correctable.
    Internal,
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board size must be between {min} and {max} on each side")]
    InvalidSize { min: u8, max: u8 },
    #[error("Mine count must be between 1 and {max}")]
    InvalidMineCount { max: u16 },
    #[error("Game is paused")]
    Paused,
    #[error("Game is not paused")]
    NotPaused,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
    #[error("Action had no effect")]
    NoEffect,
    #[error("Room name must not be blank")]
    BlankRoomName,
    #[error("Room capacity must be between {min} and {max}")]
    InvalidCapacity { min: u8, max: u8 },
    #[error("Room is full")]
    RoomFull,
    #[error("Room is not waiting for players")]
    RoomNotWaiting,
    #[error("Player is already in the room")]
    AlreadyMember,
    #[error("Player is not in the room")]
    NotMember,
    #[error("Room already has a game")]
    RoomAlreadyBound,
    #[error("Stored session is inconsistent")]
    CorruptSession,
}

impl GameError {
    pub const fn kind(self) -> ErrorKind {
        use GameError::*;
        match self {
            InvalidCoords
            | InvalidSize { .. }
            | InvalidMineCount { .. }
            | BlankRoomName
            | InvalidCapacity { .. }
            | AlreadyMember
            | NotMember => ErrorKind::Validation,
            Paused | NotPaused | AlreadyEnded | NoEffect | RoomFull | RoomNotWaiting
            | RoomAlreadyBound => ErrorKind::Conflict,
            CorruptSession => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = core::result::Result<T, GameError>;
