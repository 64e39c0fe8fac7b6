use std::sync::Arc;

use mineroom_core::{Clock, LeaveOutcome, Room};
use mineroom_protocol::{CreateRoomRequest, RoomView};

use crate::ids::{IdSource, ROOM_PREFIX};
use crate::*;

/// Membership and lifecycle of rooms. Every mutation of one room runs under that room's write lock.
pub struct RoomCoordinator {
    store: Arc<dyn Store<Room>>,
    locks: KeyedLocks,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    ids: Arc<IdSource>,
}

impl RoomCoordinator {
    pub fn new(
        store: Arc<dyn Store<Room>>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        ids: Arc<IdSource>,
    ) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
            identity,
            clock,
            ids,
        }
    }

    pub fn create_room(&self, request: &CreateRoomRequest) -> Result<RoomView> {
        if !self.identity.contains(&request.host_id) {
            return Err(ServiceError::UnknownUser(request.host_id.clone()));
        }

        let id = self.ids.next_unused(ROOM_PREFIX, self.store.as_ref())?;
        let room = Room::new(
            id.as_str(),
            &request.room_name,
            request.host_id.as_str(),
            request.max_players,
            self.clock.now(),
        )?;
        self.locks.write(&id, || self.store.put(&id, &room))?;

        log::info!("room {} ({:?}) opened by {}", id, room.name(), room.host_id());
        Ok(self.view(&room))
    }

    pub fn get_room(&self, room_id: &str) -> Result<RoomView> {
        self.locks
            .read(room_id, || self.load(room_id))
            .map(|room| self.view(&room))
    }

    /// Every room, ordered by id. Rooms deleted while listing are left out.
    pub fn list_rooms(&self) -> Result<Vec<RoomView>> {
        let mut views = Vec::new();
        for id in self.store.ids()? {
            let room = self.locks.read(&id, || self.store.get(&id))?;
            views.extend(room.as_ref().map(|room| self.view(room)));
        }
        Ok(views)
    }

    /// Capacity and status are checked before the user is looked up, so a full room reports full even to
    /// an unknown user.
    pub fn join(&self, room_id: &str, user_id: &str) -> Result<RoomView> {
        let view = self.with_room_mut(room_id, |room| {
            room.check_open()?;
            if !self.identity.contains(user_id) {
                return Err(ServiceError::UnknownUser(user_id.into()));
            }
            room.join(user_id)?;
            Ok(self.view(room))
        })?;
        log::info!("{} joined room {}", user_id, room_id);
        Ok(view)
    }

    /// Removes a member. Returns `None` when the room was emptied and deleted.
    pub fn leave(&self, room_id: &str, user_id: &str) -> Result<Option<RoomView>> {
        let view = self.locks.write(room_id, || -> Result<_> {
            let mut room = self.load(room_id)?;
            match room.leave(user_id)? {
                LeaveOutcome::Emptied => {
                    self.store.delete(room_id)?;
                    log::info!("room {} closed, last member {} left", room_id, user_id);
                    return Ok(None);
                }
                LeaveOutcome::HostTransferred(host) => {
                    log::info!("room {}: host passed from {} to {}", room_id, user_id, host);
                }
                LeaveOutcome::Left => log::info!("{} left room {}", user_id, room_id),
            }
            self.store.put(room_id, &room)?;
            Ok(Some(self.view(&room)))
        })?;
        Ok(view)
    }

    pub fn bind_session(&self, room_id: &str, session_id: &str) -> Result<RoomView> {
        self.with_room_mut(room_id, |room| {
            room.bind_session(session_id)?;
            log::info!("room {} bound to session {}", room_id, session_id);
            Ok(self.view(room))
        })
    }

    pub fn delete_room(&self, room_id: &str) -> Result<()> {
        let deleted = self.locks.write(room_id, || self.store.delete(room_id))?;
        if !deleted {
            return Err(ServiceError::RoomNotFound(room_id.into()));
        }
        log::info!("room {} deleted", room_id);
        Ok(())
    }

    /// Loads the room, runs `f` on it and persists it if `f` succeeded, all under the room's write lock.
    pub(crate) fn with_room_mut<R>(
        &self,
        room_id: &str,
        f: impl FnOnce(&mut Room) -> Result<R>,
    ) -> Result<R> {
        self.locks.write(room_id, || {
            let mut room = self.load(room_id)?;
            let result = f(&mut room)?;
            self.store.put(room_id, &room)?;
            Ok(result)
        })
    }

    fn view(&self, room: &Room) -> RoomView {
        RoomView {
            host_name: self.identity.display_name(room.host_id()),
            ..RoomView::from(room)
        }
    }

    fn load(&self, room_id: &str) -> Result<Room> {
        self.store
            .get(room_id)?
            .ok_or_else(|| ServiceError::RoomNotFound(room_id.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserConfig;
    use mineroom_core::{ErrorKind, GameError, ManualClock, RoomStatus};

    fn coordinator() -> RoomCoordinator {
        let mut alice = UserConfig::new("alice");
        alice.name = Some("Alice".into());
        let identity = StaticIdentityProvider::from_users(&[
            alice,
            UserConfig::new("bob"),
            UserConfig::new("carol"),
        ]);
        RoomCoordinator::new(
            Arc::new(MemoryStore::new()),
            Arc::new(identity),
            Arc::new(ManualClock::new(500)),
            Arc::new(IdSource::new(3)),
        )
    }

    fn open(rooms: &RoomCoordinator, max_players: u8) -> RoomView {
        rooms
            .create_room(&CreateRoomRequest {
                room_name: "lobby".into(),
                max_players,
                host_id: "alice".into(),
            })
            .unwrap()
    }

    #[test]
    fn create_requires_known_host() {
        let rooms = coordinator();
        let err = rooms
            .create_room(&CreateRoomRequest {
                room_name: "lobby".into(),
                max_players: 4,
                host_id: "mallory".into(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let room = open(&rooms, 4);
        assert!(room.room_id.starts_with("ROOM_"));
        assert_eq!(room.player_ids, ["alice"]);
        assert_eq!(room.host_name.as_deref(), Some("Alice"));
        assert_eq!(room.created_at, 500);
        assert_eq!(rooms.get_room(&room.room_id).unwrap(), room);
    }

    #[test]
    fn full_room_reports_conflict() {
        let rooms = coordinator();
        let room = open(&rooms, 2);

        rooms.join(&room.room_id, "bob").unwrap();
        let err = rooms.join(&room.room_id, "carol").unwrap_err();

        assert!(matches!(err, ServiceError::Game(GameError::RoomFull)));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(rooms.get_room(&room.room_id).unwrap().player_ids, ["alice", "bob"]);
    }

    #[test]
    fn join_rejects_unknown_and_duplicate_users() {
        let rooms = coordinator();
        let room = open(&rooms, 4);

        assert!(matches!(
            rooms.join(&room.room_id, "mallory"),
            Err(ServiceError::UnknownUser(_))
        ));
        assert_eq!(
            rooms.join(&room.room_id, "alice").unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            rooms.join("ROOM_missing", "bob").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn host_leaving_hands_over() {
        let rooms = coordinator();
        let room = open(&rooms, 2);
        rooms.join(&room.room_id, "bob").unwrap();

        let view = rooms.leave(&room.room_id, "alice").unwrap().unwrap();

        assert_eq!(view.host_id, "bob");
        assert_eq!(view.host_name, None);
        assert_eq!(view.player_ids, ["bob"]);
        assert_eq!(view.status, RoomStatus::Waiting);
    }

    #[test]
    fn last_leave_deletes_room() {
        let rooms = coordinator();
        let room = open(&rooms, 2);

        assert_eq!(rooms.leave(&room.room_id, "alice").unwrap(), None);
        assert!(matches!(
            rooms.get_room(&room.room_id),
            Err(ServiceError::RoomNotFound(_))
        ));
        assert!(rooms.list_rooms().unwrap().is_empty());
    }

    #[test]
    fn missing_rooms_leave_no_lock_slots() {
        let rooms = coordinator();
        for index in 0..200 {
            let id = format!("ROOM_missing{index}");
            assert!(matches!(rooms.get_room(&id), Err(ServiceError::RoomNotFound(_))));
            assert!(rooms.join(&id, "bob").is_err());
        }
        assert!(rooms.locks.is_empty());
    }

    #[test]
    fn bind_is_once_only() {
        let rooms = coordinator();
        let room = open(&rooms, 2);

        let bound = rooms.bind_session(&room.room_id, "GAME_1").unwrap();
        assert_eq!(bound.status, RoomStatus::Playing);
        assert_eq!(
            rooms.bind_session(&room.room_id, "GAME_2").unwrap_err().kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            rooms.get_room(&room.room_id).unwrap().current_game_id.as_deref(),
            Some("GAME_1")
        );
    }

    #[test]
    fn list_and_delete() {
        let rooms = coordinator();
        let first = open(&rooms, 2);
        let second = open(&rooms, 3);

        let mut listed: Vec<_> = rooms.list_rooms().unwrap().into_iter().map(|r| r.room_id).collect();
        listed.sort();
        let mut expected = vec![first.room_id.clone(), second.room_id.clone()];
        expected.sort();
        assert_eq!(listed, expected);

        rooms.delete_room(&first.room_id).unwrap();
        assert!(matches!(
            rooms.delete_room(&first.room_id),
            Err(ServiceError::RoomNotFound(_))
        ));
        assert_eq!(rooms.list_rooms().unwrap(), [second]);
    }
}
