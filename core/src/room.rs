use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

pub const MIN_PLAYERS: u8 = 2;
pub const MAX_PLAYERS: u8 = 10;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    #[default]
    Waiting,
    Playing,
}

/// What happened to the room after a member left.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left,
    HostTransferred(String),
    /// Last member gone, the room should be dropped.
    Emptied,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    id: String,
    name: String,
    host_id: String,
    members: Vec<String>,
    max_players: u8,
    status: RoomStatus,
    bound_session: Option<String>,
    created_at: Millis,
}

impl Room {
    /// Opens a room with the host as its only member.
    pub fn new(
        id: impl Into<String>,
        name: &str,
        host_id: impl Into<String>,
        max_players: u8,
        created_at: Millis,
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::BlankRoomName);
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&max_players) {
            return Err(GameError::InvalidCapacity {
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
            });
        }

        let host_id = host_id.into();
        Ok(Self {
            id: id.into(),
            name: name.into(),
            members: Vec::from([host_id.clone()]),
            host_id,
            max_players,
            status: RoomStatus::Waiting,
            bound_session: None,
            created_at,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// Members in join order.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn max_players(&self) -> u8 {
        self.max_players
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn bound_session(&self) -> Option<&str> {
        self.bound_session.as_deref()
    }

    pub fn created_at(&self) -> Millis {
        self.created_at
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= usize::from(self.max_players)
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|member| member == user_id)
    }

    /// Capacity and status checks that come before anything is known about the joining user.
    pub fn check_open(&self) -> Result<()> {
        if self.is_full() {
            return Err(GameError::RoomFull);
        }
        if self.status != RoomStatus::Waiting {
            return Err(GameError::RoomNotWaiting);
        }
        Ok(())
    }

    pub fn join(&mut self, user_id: impl Into<String>) -> Result<()> {
        self.check_open()?;
        let user_id = user_id.into();
        if self.is_member(&user_id) {
            return Err(GameError::AlreadyMember);
        }
        self.members.push(user_id);
        Ok(())
    }

    /// Removes a member. A departing host hands over to the earliest remaining member.
    pub fn leave(&mut self, user_id: &str) -> Result<LeaveOutcome> {
        let index = self
            .members
            .iter()
            .position(|member| member == user_id)
            .ok_or(GameError::NotMember)?;
        self.members.remove(index);

        let Some(first) = self.members.first() else {
            return Ok(LeaveOutcome::Emptied);
        };
        if self.host_id == user_id {
            self.host_id = first.clone();
            return Ok(LeaveOutcome::HostTransferred(self.host_id.clone()));
        }
        Ok(LeaveOutcome::Left)
    }

    pub fn check_unbound(&self) -> Result<()> {
        match self.bound_session {
            Some(_) => Err(GameError::RoomAlreadyBound),
            None => Ok(()),
        }
    }

    pub fn bind_session(&mut self, session_id: impl Into<String>) -> Result<()> {
        self.check_unbound()?;
        self.bound_session = Some(session_id.into());
        self.status = RoomStatus::Playing;
        Ok(())
    }
}
