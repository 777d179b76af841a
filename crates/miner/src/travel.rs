//! Rune-cycle travel between gathering areas.
//!
//! Areas are visited by recalling through runebook slots with a fixed
//! stride. The cycle wraps when the stride runs past the last slot, so a
//! long session keeps circling the same set of areas while their spots
//! come off cooldown.

use prospector_config::{AppConfig, TravelConfig};
use prospector_core::{GameHost, HostError};
use tracing::{debug, info};

/// Walks runebook slots: first, first+step, ... wrapping past `max`.
#[derive(Debug)]
pub struct RuneCycle {
    next: u8,
    first: u8,
    step: u8,
    max: u8,
}

impl RuneCycle {
    pub fn new(travel: &TravelConfig) -> Self {
        Self {
            next: travel.first_slot,
            first: travel.first_slot,
            step: travel.slot_step,
            max: travel.max_slot,
        }
    }

    /// The slot to recall to now, advancing the cycle for next time.
    pub fn advance(&mut self) -> u8 {
        let slot = self.next;
        let stepped = self.next.saturating_add(self.step);
        self.next = if stepped > self.max { self.first } else { stepped };
        slot
    }
}

/// Recall to the next rune in the cycle.
///
/// Returns `false` when no runebook is configured; the session then keeps
/// working its current area instead of traveling.
pub(crate) async fn recall_next(
    host: &dyn GameHost,
    config: &AppConfig,
    cycle: &mut RuneCycle,
) -> Result<bool, HostError> {
    let Some(runebook) = config.travel.runebook else {
        debug!("No runebook configured, staying put");
        return Ok(false);
    };

    let slot = cycle.advance();
    info!(slot, "Recalling to next gathering area");
    host.recall(runebook, slot).await?;
    tokio::time::sleep(config.timing.recall_settle()).await;
    Ok(true)
}
