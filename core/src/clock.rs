use core::sync::atomic::{AtomicU64, Ordering};

use crate::Millis;

/// Source of the current time, injected wherever timestamps are taken.
pub trait Clock: Send + Sync {
    fn now(&self) -> Millis;
}

/// Active play time between `start` and the reference instant, minus every banked pause.
///
/// While paused the reference is the moment the pause began, so the value stays frozen until resume banks the
/// pause into `accumulated_paused`. Pausing and resuming at the same instant leaves the result unchanged.
pub fn elapsed(
    start: Millis,
    accumulated_paused: Millis,
    last_pause: Option<Millis>,
    now: Millis,
    is_paused: bool,
) -> Millis {
    let reference = match last_pause {
        Some(paused_at) if is_paused => paused_at,
        _ => now,
    };
    reference
        .saturating_sub(start)
        .saturating_sub(accumulated_paused)
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub const fn new(start: Millis) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn advance(&self, by: Millis) {
        self.now.fetch_add(by, Ordering::SeqCst);
    }

    pub fn set(&self, to: Millis) {
        self.now.store(to, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}
