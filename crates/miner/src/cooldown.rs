//! Spot cooldown ledger.
//!
//! Exhausted or repeatedly blocked spots are keyed by their 2-D coordinates
//! and excluded from discovery until their cooldown passes. Entries are
//! checked lazily: nothing sweeps the map, an expired entry simply stops
//! matching and gets overwritten the next time the same spot is exhausted.

use prospector_core::SpotKey;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Tracks which spots are resting and until when.
#[derive(Debug, Default)]
pub struct CooldownLedger {
    entries: HashMap<SpotKey, Instant>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a spot on cooldown for `duration` from now.
    /// Re-placing a key replaces its expiry.
    pub fn place(&mut self, key: SpotKey, duration: Duration) {
        self.entries.insert(key, Instant::now() + duration);
    }

    /// Whether a spot is still resting. A spot exactly at its expiry
    /// instant is available again.
    pub fn is_cooling(&self, key: &SpotKey) -> bool {
        match self.entries.get(key) {
            Some(until) => Instant::now() < *until,
            None => false,
        }
    }

    /// Entries still live at this instant.
    pub fn live(&self) -> usize {
        let now = Instant::now();
        self.entries.values().filter(|until| now < **until).count()
    }

    /// Total keys held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    const COOLDOWN: Duration = Duration::from_secs(1200);

    #[tokio::test(start_paused = true)]
    async fn unknown_key_is_not_cooling() {
        let ledger = CooldownLedger::new();
        assert!(!ledger.is_cooling(&SpotKey { x: 1, y: 2 }));
        assert!(ledger.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cooling_until_exact_expiry() {
        let mut ledger = CooldownLedger::new();
        let key = SpotKey { x: 2561, y: 505 };
        ledger.place(key, COOLDOWN);

        assert!(ledger.is_cooling(&key));

        // One tick short of the full cooldown: still resting.
        advance(COOLDOWN - Duration::from_millis(1)).await;
        assert!(ledger.is_cooling(&key));

        // Exactly at expiry: available again.
        advance(Duration::from_millis(1)).await;
        assert!(!ledger.is_cooling(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_a_key_extends_its_rest() {
        let mut ledger = CooldownLedger::new();
        let key = SpotKey { x: 10, y: 10 };

        ledger.place(key, Duration::from_secs(10));
        advance(Duration::from_secs(8)).await;
        ledger.place(key, Duration::from_secs(10));

        // Past the first expiry but not the second.
        advance(Duration::from_secs(5)).await;
        assert!(ledger.is_cooling(&key));

        advance(Duration::from_secs(5)).await;
        assert!(!ledger.is_cooling(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn live_counts_only_unexpired() {
        let mut ledger = CooldownLedger::new();
        ledger.place(SpotKey { x: 1, y: 1 }, Duration::from_secs(10));
        ledger.place(SpotKey { x: 2, y: 2 }, Duration::from_secs(100));

        advance(Duration::from_secs(50)).await;
        assert_eq!(ledger.live(), 1);
        assert_eq!(ledger.len(), 2);
    }
}
