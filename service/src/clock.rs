use mineroom_core::{Clock, Millis};
use web_time::{SystemTime, UNIX_EPOCH};

/// Wall clock in milliseconds since the Unix epoch.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|since| since.as_millis().try_into().unwrap_or(Millis::MAX))
            .unwrap_or_default()
    }
}
