use std::sync::Arc;

use mineroom_core::Clock;
use mineroom_protocol::{CreateSessionRequest, SessionView};

use crate::clock::SystemClock;
use crate::ids::IdSource;
use crate::*;

/// Everything a transport needs, wired from one configuration.
pub struct GameHub {
    rooms: RoomCoordinator,
    sessions: SessionOrchestrator,
    identity: Arc<dyn IdentityProvider>,
}

impl GameHub {
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let identity = StaticIdentityProvider::from_users(&config.users);
        Self::with_parts(config, Arc::new(SystemClock), Arc::new(identity))
    }

    pub fn with_parts(
        config: &ServiceConfig,
        clock: Arc<dyn Clock>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(|| clock.now());
        let ids = Arc::new(IdSource::new(seed));
        log::debug!("hub starting with {:?} store", config.store);

        Ok(Self {
            rooms: RoomCoordinator::new(
                open_store(&config.store, "rooms")?,
                identity.clone(),
                clock.clone(),
                ids.clone(),
            ),
            sessions: SessionOrchestrator::new(open_store(&config.store, "sessions")?, clock, ids),
            identity,
        })
    }

    pub fn rooms(&self) -> &RoomCoordinator {
        &self.rooms
    }

    pub fn sessions(&self) -> &SessionOrchestrator {
        &self.sessions
    }

    pub fn authenticate(&self, token: &str) -> Result<String> {
        self.identity.validate(token).ok_or(ServiceError::InvalidToken)
    }

    /// Starts a game, bound to `request.room_id` when one is given.
    pub fn start_game(&self, request: &CreateSessionRequest) -> Result<SessionView> {
        match &request.room_id {
            Some(room_id) => self
                .sessions
                .create_session_in_room(&self.rooms, room_id, request),
            None => self.sessions.create_session(request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserConfig;

    #[test]
    fn authenticate_maps_tokens() {
        let config = ServiceConfig::default()
            .with_users([UserConfig::new("alice").with_token("t-alice")]);
        let hub = GameHub::from_config(&config).unwrap();

        assert_eq!(hub.authenticate("t-alice").unwrap(), "alice");
        assert!(matches!(
            hub.authenticate("nope"),
            Err(ServiceError::InvalidToken)
        ));
    }

    #[test]
    fn start_game_without_room_is_solo() {
        let hub = GameHub::from_config(&ServiceConfig::default()).unwrap();
        let view = hub
            .start_game(&CreateSessionRequest::new(9, 9, 10).with_user("alice"))
            .unwrap();
        assert_eq!(view.room_id, None);
        assert_eq!(view.players, ["alice"]);
    }
}
