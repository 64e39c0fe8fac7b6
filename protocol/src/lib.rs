pub mod codec;
pub mod message;

pub use codec::{decode, encode};
pub use message::*;
pub use mineroom_core::{ActionKind, Difficulty, ErrorKind, RoomStatus, SessionStatus};
pub use mineroom_core::{FLAGGED, HIDDEN, MINE};
