use std::sync::{Arc, Mutex, PoisonError, RwLock};

use hashbrown::HashMap;

/// One reader/writer lock per entity id.
///
/// Writers on the same id run one at a time, readers share. Ids are independent, so holding one never blocks
/// another. A slot lives only while some caller holds or waits on it, so ids that name nothing leave no
/// trace. A panicking writer poisons its slot; the guarded data lives in the store and is only replaced
/// after a successful mutation, so poison is ignored.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&self, id: &str) -> Arc<RwLock<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get(id) {
            return Arc::clone(slot);
        }
        let slot = Arc::new(RwLock::new(()));
        slots.insert(id.to_owned(), Arc::clone(&slot));
        slot
    }

    /// Drops the slot once nobody but the table and this caller holds it. New holders clone out of the
    /// table under the same mutex, so the count cannot grow behind our back.
    fn release(&self, id: &str, slot: Arc<RwLock<()>>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&slot) == 2 {
            slots.remove(id);
        }
    }

    /// Runs `f` with exclusive access to `id`.
    pub fn write<R>(&self, id: &str, f: impl FnOnce() -> R) -> R {
        let slot = self.acquire(id);
        let result = {
            let _guard = slot.write().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(id, slot);
        result
    }

    /// Runs `f` with shared access to `id`.
    pub fn read<R>(&self, id: &str, f: impl FnOnce() -> R) -> R {
        let slot = self.acquire(id);
        let result = {
            let _guard = slot.read().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(id, slot);
        result
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn writers_on_one_id_never_overlap() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (locks, inside, max_seen) = (locks.clone(), inside.clone(), max_seen.clone());
                thread::spawn(move || {
                    for _ in 0..20 {
                        locks.write("GAME_a", || {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(now, Ordering::SeqCst);
                            thread::yield_now();
                            inside.fetch_sub(1, Ordering::SeqCst);
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn different_ids_do_not_block() {
        let locks = Arc::new(KeyedLocks::new());
        let other = locks.clone();

        locks.write("ROOM_a", || {
            // would deadlock if ROOM_b shared the slot
            let handle = thread::spawn(move || other.write("ROOM_b", || 7));
            assert_eq!(handle.join().unwrap(), 7);
        });
    }

    #[test]
    fn readers_share() {
        let locks = Arc::new(KeyedLocks::new());
        let other = locks.clone();

        locks.read("GAME_a", || {
            let handle = thread::spawn(move || other.read("GAME_a", || 1));
            thread::sleep(Duration::from_millis(1));
            assert_eq!(handle.join().unwrap(), 1);
        });
    }

    #[test]
    fn idle_slots_are_released() {
        let locks = KeyedLocks::new();
        for index in 0..100 {
            locks.write(&format!("GAME_{index}"), || ());
            locks.read(&format!("ROOM_{index}"), || ());
        }
        assert!(locks.is_empty());
    }

    #[test]
    fn slot_survives_while_contended() {
        let locks = Arc::new(KeyedLocks::new());
        let other = locks.clone();

        let waiter = locks.write("GAME_a", || {
            let waiter = thread::spawn(move || other.write("GAME_a", || other.len()));
            thread::sleep(Duration::from_millis(20));
            assert_eq!(locks.len(), 1);
            waiter
        });

        assert_eq!(waiter.join().unwrap(), 1);
        assert!(locks.is_empty());
    }
}
