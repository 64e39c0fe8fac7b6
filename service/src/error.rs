use mineroom_core::{ErrorKind, GameError};
use mineroom_protocol::ErrorBody;
use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Session {0} not found")]
    SessionNotFound(String),
    #[error("Room {0} not found")]
    RoomNotFound(String),
    #[error("Unknown user {0}")]
    UnknownUser(String),
    #[error("Invalid token")]
    InvalidToken,
    #[error("Unsupported action {0:?}")]
    UnknownAction(String),
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        use ServiceError::*;
        match self {
            Game(err) => err.kind(),
            SessionNotFound(_) | RoomNotFound(_) => ErrorKind::NotFound,
            UnknownUser(_) | InvalidToken | UnknownAction(_) => ErrorKind::Validation,
            Store(_) | Config(_) => ErrorKind::Internal,
        }
    }
}

impl From<&ServiceError> for ErrorBody {
    fn from(err: &ServiceError) -> Self {
        ErrorBody::new(err.kind(), err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(ServiceError::from(GameError::InvalidCoords).kind(), ErrorKind::Validation);
        assert_eq!(ServiceError::from(GameError::NotPaused).kind(), ErrorKind::Conflict);
        assert_eq!(ServiceError::RoomNotFound("ROOM_x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(ServiceError::UnknownAction("DIG".into()).kind(), ErrorKind::Validation);
        let io = std::io::Error::other("disk gone");
        assert_eq!(ServiceError::from(StoreError::from(io)).kind(), ErrorKind::Internal);
    }

    #[test]
    fn body_keeps_message() {
        let body = ErrorBody::from(&ServiceError::SessionNotFound("GAME_1".into()));
        assert_eq!(body.kind, ErrorKind::NotFound);
        assert_eq!(body.message, "Session GAME_1 not found");
    }
}
