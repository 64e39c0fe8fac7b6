use std::sync::{Mutex, PoisonError};

use rand::prelude::*;

use crate::store::{Store, StoreError};

pub const SESSION_PREFIX: &str = "GAME_";
pub const ROOM_PREFIX: &str = "ROOM_";
pub const ID_LEN: usize = 10;

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Seeded source of entity ids and board seeds, shared by the coordinators.
#[derive(Debug)]
pub struct IdSource {
    rng: Mutex<SmallRng>,
}

impl IdSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }

    /// `prefix` followed by `ID_LEN` alphanumeric characters.
    pub fn next_id(&self, prefix: &str) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut id = String::with_capacity(prefix.len() + ID_LEN);
        id.push_str(prefix);
        id.extend((0..ID_LEN).map(|_| {
            let index = rng.random_range(0..ID_ALPHABET.len());
            char::from(ID_ALPHABET[index])
        }));
        id
    }

    /// Like [`Self::next_id`], skipping ids already present in `store`. A fixed seed replays the same
    /// sequence after a restart, which would otherwise overwrite persisted entities.
    pub fn next_unused<T>(&self, prefix: &str, store: &dyn Store<T>) -> Result<String, StoreError> {
        loop {
            let id = self.next_id(prefix);
            if store.get(&id)?.is_none() {
                return Ok(id);
            }
            log::debug!("id {id} already taken, drawing again");
        }
    }

    pub fn next_seed(&self) -> u64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random()
    }
}
