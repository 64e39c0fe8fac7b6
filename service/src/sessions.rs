use std::sync::Arc;

use mineroom_core::{Action, Clock, GameConfig, GameError, Millis, Session};
use mineroom_protocol::{BatchActionRequest, BatchView, CreateSessionRequest, PlayerAction, SessionView};

use crate::ids::{IdSource, SESSION_PREFIX};
use crate::rooms::RoomCoordinator;
use crate::*;

/// Creates sessions and drives them through their state machine. Each call loads the session, applies one
/// transition and stores it back, all under the session's write lock.
pub struct SessionOrchestrator {
    store: Arc<dyn Store<Session>>,
    locks: KeyedLocks,
    clock: Arc<dyn Clock>,
    ids: Arc<IdSource>,
}

/// Turns a wire action into a core one. Unknown kinds and coordinates that cannot name a cell are rejected
/// before any lock is taken.
pub fn parse_action(action: &PlayerAction) -> Result<Action> {
    let kind = action
        .kind()
        .ok_or_else(|| ServiceError::UnknownAction(action.action.clone()))?;
    let coords = action.coords().ok_or(GameError::InvalidCoords)?;
    Ok(Action::new(kind, coords))
}

impl SessionOrchestrator {
    pub fn new(store: Arc<dyn Store<Session>>, clock: Arc<dyn Clock>, ids: Arc<IdSource>) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
            clock,
            ids,
        }
    }

    /// Solo game: the requesting user, if any, is the only player.
    pub fn create_session(&self, request: &CreateSessionRequest) -> Result<SessionView> {
        let config = request.config()?;
        let players = request.user_id.iter().cloned().collect();
        let session = self.build(config, players, request.user_id.as_deref())?;
        self.insert(session)
    }

    /// Game for a room's roster. Does not touch the room itself, see [`Self::create_session_in_room`].
    pub fn create_session_for_room(
        &self,
        room_id: &str,
        request: &CreateSessionRequest,
        member_ids: &[String],
    ) -> Result<SessionView> {
        let config = request.config()?;
        let session = self
            .build(config, member_ids.to_vec(), request.user_id.as_deref())?
            .in_room(room_id);
        self.insert(session)
    }

    /// Creates a game for the room and binds it in one step. Only a member may start it. The room lock is
    /// taken first and held until the bound room is stored, so two concurrent starts cannot both bind.
    pub fn create_session_in_room(
        &self,
        rooms: &RoomCoordinator,
        room_id: &str,
        request: &CreateSessionRequest,
    ) -> Result<SessionView> {
        let config = request.config()?;
        rooms.with_room_mut(room_id, |room| {
            if !request.user_id.as_deref().is_some_and(|user| room.is_member(user)) {
                return Err(GameError::NotMember.into());
            }
            room.check_unbound()?;
            let session = self
                .build(config, room.members().to_vec(), request.user_id.as_deref())?
                .in_room(room_id);
            let view = self.insert(session)?;
            room.bind_session(view.session_id.as_str())?;
            Ok(view)
        })
    }

    pub fn get_view(&self, session_id: &str) -> Result<SessionView> {
        self.locks.read(session_id, || {
            let session = self.load(session_id)?;
            Ok(SessionView::from_session(&session, self.clock.now()))
        })
    }

    pub fn apply_action(&self, session_id: &str, action: &PlayerAction) -> Result<SessionView> {
        let action = parse_action(action)?;
        self.mutate(session_id, |session, now| Ok(session.apply(action, now)?))
            .map(|((), view)| view)
    }

    /// Runs every action in order under one lock hold. Actions that cannot be parsed or that fail are
    /// skipped and reported by index, the batch as a whole only fails if the game is not running.
    pub fn apply_batch(&self, session_id: &str, request: &BatchActionRequest) -> Result<BatchView> {
        let mut actions = Vec::with_capacity(request.actions.len());
        let mut origin = Vec::with_capacity(request.actions.len());
        let mut skipped = Vec::new();
        for (index, action) in request.actions.iter().enumerate() {
            match parse_action(action) {
                Ok(action) => {
                    actions.push(action);
                    origin.push(index);
                }
                Err(err) => {
                    log::warn!("session {session_id}: batch action {index} rejected: {err}");
                    skipped.push(index);
                }
            }
        }

        let (report, session) = self.mutate(session_id, |session, now| {
            Ok(session.apply_batch(&actions, now)?)
        })?;

        skipped.extend(report.skipped.iter().map(|&index| origin[index]));
        skipped.sort_unstable();
        Ok(BatchView {
            session,
            applied: report.applied,
            skipped,
        })
    }

    pub fn pause(&self, session_id: &str) -> Result<SessionView> {
        self.transition(session_id, "paused", |session, now| session.pause(now))
    }

    pub fn resume(&self, session_id: &str) -> Result<SessionView> {
        self.transition(session_id, "resumed", |session, now| session.resume(now))
    }

    pub fn surrender(&self, session_id: &str) -> Result<SessionView> {
        self.transition(session_id, "surrendered", |session, now| {
            session.surrender(now)
        })
    }

    /// New board, same id, geometry, room and roster.
    pub fn restart(&self, session_id: &str) -> Result<SessionView> {
        let seed = self.ids.next_seed();
        self.transition(session_id, "restarted", |session, now| {
            session.restart(seed, now);
            Ok(())
        })
    }

    pub fn delete_session(&self, session_id: &str) -> Result<()> {
        let deleted = self
            .locks
            .write(session_id, || self.store.delete(session_id))?;
        if !deleted {
            return Err(ServiceError::SessionNotFound(session_id.into()));
        }
        log::info!("session {session_id} deleted");
        Ok(())
    }

    fn build(
        &self,
        config: GameConfig,
        players: Vec<String>,
        current: Option<&str>,
    ) -> Result<Session> {
        let id = self.ids.next_unused(SESSION_PREFIX, self.store.as_ref())?;
        Ok(Session::new(id, config, self.ids.next_seed(), self.clock.now())
            .with_players(players, current))
    }

    fn insert(&self, session: Session) -> Result<SessionView> {
        let id = session.id().to_owned();
        let view = self.locks.write(&id, || -> Result<_> {
            self.store.put(&id, &session)?;
            Ok(SessionView::from_session(&session, self.clock.now()))
        })?;

        let config = session.config();
        log::info!(
            "session {} created: {}x{} with {} mines ({})",
            id,
            config.width,
            config.height,
            config.mines,
            config.difficulty.as_str()
        );
        Ok(view)
    }

    fn transition(
        &self,
        session_id: &str,
        label: &str,
        f: impl FnOnce(&mut Session, Millis) -> mineroom_core::Result<()>,
    ) -> Result<SessionView> {
        let ((), view) = self.mutate(session_id, |session, now| Ok(f(session, now)?))?;
        log::debug!("session {session_id} {label}");
        Ok(view)
    }

    fn mutate<R>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut Session, Millis) -> Result<R>,
    ) -> Result<(R, SessionView)> {
        self.locks.write(session_id, || {
            let mut session = self.load(session_id)?;
            let was_terminal = session.is_terminal();
            let now = self.clock.now();

            let result = f(&mut session, now)?;
            self.store.put(session_id, &session)?;

            if session.is_terminal() && !was_terminal {
                log::info!("session {} ended: {}", session_id, session.status().as_str());
            }
            Ok((result, SessionView::from_session(&session, now)))
        })
    }

    fn load(&self, session_id: &str) -> Result<Session> {
        self.store
            .get(session_id)?
            .ok_or_else(|| ServiceError::SessionNotFound(session_id.into()))
    }
}
