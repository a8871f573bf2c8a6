use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Per-adapter source of strictly increasing nonces.
///
/// Exchanges treat the nonce as a replay guard that must only ever grow per
/// credential. Values are derived from the wall clock at microsecond
/// resolution but lower-bounded by an atomic counter, so concurrent callers
/// on the same adapter can never observe a duplicate or a step backwards
/// even when they race within one clock tick.
pub struct NonceFactory {
    last: AtomicU64,
}

impl NonceFactory {
    pub fn new() -> Self {
        NonceFactory {
            last: AtomicU64::new(0),
        }
    }

    /// Returns the next nonce: `max(now_us, previous + 1)`.
    pub fn next(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);

        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

impl Default for NonceFactory {
    fn default() -> Self {
        Self::new()
    }
}
