//! Resource discovery — scan filtering and nearest-first ordering.
//!
//! A discovery scan returns every static tile in the window; this module
//! reduces that to minable, off-cooldown candidates and hands them out
//! nearest-first. The order is recomputed against the player's CURRENT
//! position on every pull, so the walk is a greedy chain from wherever the
//! last spot left us, not a fixed tour planned up front.

use prospector_config::MiningConfig;
use prospector_core::{OreSpot, Position, StaticTile};
use std::collections::HashSet;

use crate::cooldown::CooldownLedger;

/// Minable candidates produced by one area scan.
#[derive(Debug, Default)]
pub struct CandidateSet {
    spots: Vec<OreSpot>,
    skipped_cooling: usize,
}

impl CandidateSet {
    /// Filter raw scan tiles down to candidates.
    ///
    /// Drops tiles whose graphic is not a configured resource static, tiles
    /// on cooldown, and duplicate keys (several minable statics can share a
    /// column; they are the same vein).
    pub fn from_scan(
        tiles: Vec<StaticTile>,
        mining: &MiningConfig,
        cooldowns: &CooldownLedger,
    ) -> Self {
        let mut spots = Vec::new();
        let mut skipped_cooling = 0;
        let mut seen = HashSet::new();

        for tile in tiles {
            if !mining.resource_statics.contains(&tile.graphic) {
                continue;
            }
            let spot = OreSpot::from(tile);
            if !seen.insert(spot.key()) {
                continue;
            }
            if cooldowns.is_cooling(&spot.key()) {
                skipped_cooling += 1;
                continue;
            }
            spots.push(spot);
        }

        Self {
            spots,
            skipped_cooling,
        }
    }

    /// Remove and return the candidate nearest to `from`.
    ///
    /// Ties break toward the earlier scan entry; the comparison is on exact
    /// squared distance, so equal distances never flap on float rounding.
    pub fn pull_nearest(&mut self, from: Position) -> Option<OreSpot> {
        if self.spots.is_empty() {
            return None;
        }
        let mut best = 0;
        let mut best_d = self.spots[0].position.distance_sq(&from);
        for (i, spot) in self.spots.iter().enumerate().skip(1) {
            let d = spot.position.distance_sq(&from);
            if d < best_d {
                best = i;
                best_d = d;
            }
        }
        Some(self.spots.remove(best))
    }

    /// Drop candidates that have been placed on cooldown since the scan.
    /// A depleted vein can knock out same-vein entries mid-pass.
    pub fn prune_cooling(&mut self, cooldowns: &CooldownLedger) {
        self.spots.retain(|s| !cooldowns.is_cooling(&s.key()));
    }

    /// Tiles dropped from the last scan because they were resting.
    pub fn skipped_cooling(&self) -> usize {
        self.skipped_cooling
    }

    pub fn len(&self) -> usize {
        self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tile(x: i32, y: i32, graphic: u16) -> StaticTile {
        StaticTile {
            position: Position::new(x, y, 0),
            graphic,
        }
    }

    fn mining_config() -> MiningConfig {
        MiningConfig::default()
    }

    #[tokio::test(start_paused = true)]
    async fn scan_keeps_only_resource_statics() {
        let tiles = vec![
            tile(10, 10, 0x053E), // small rock
            tile(11, 10, 0x0001), // not minable
            tile(12, 10, 0x0459), // mountain face
        ];
        let set = CandidateSet::from_scan(tiles, &mining_config(), &CooldownLedger::new());
        assert_eq!(set.len(), 2);
        assert_eq!(set.skipped_cooling(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn scan_excludes_cooling_spots() {
        let mut cooldowns = CooldownLedger::new();
        cooldowns.place(
            prospector_core::SpotKey { x: 10, y: 10 },
            Duration::from_secs(1200),
        );

        let tiles = vec![tile(10, 10, 0x053E), tile(20, 20, 0x053E)];
        let set = CandidateSet::from_scan(tiles, &mining_config(), &cooldowns);
        assert_eq!(set.len(), 1);
        assert_eq!(set.skipped_cooling(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn scan_dedupes_same_column() {
        // Two minable statics in one column are one vein.
        let tiles = vec![tile(10, 10, 0x053E), tile(10, 10, 0x0459)];
        let set = CandidateSet::from_scan(tiles, &mining_config(), &CooldownLedger::new());
        assert_eq!(set.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pulls_follow_the_player_not_the_initial_order() {
        // From (0,0) the nearest is A(5,0). Standing AT A, C(8,0) is nearer
        // than B(-6,0), so a greedy chain gives A, C, B even though the
        // initial distances order them A, B, C.
        let tiles = vec![
            tile(5, 0, 0x053E),  // A
            tile(-6, 0, 0x053E), // B
            tile(8, 0, 0x053E),  // C
        ];
        let mut set = CandidateSet::from_scan(tiles, &mining_config(), &CooldownLedger::new());

        let mut at = Position::new(0, 0, 0);
        let mut order = Vec::new();
        while let Some(spot) = set.pull_nearest(at) {
            order.push((spot.position.x, spot.position.y));
            at = spot.position;
        }
        assert_eq!(order, vec![(5, 0), (8, 0), (-6, 0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn pull_distance_is_nondecreasing_from_each_stop() {
        let tiles = vec![
            tile(3, 4, 0x053E),
            tile(-2, 1, 0x053E),
            tile(9, -9, 0x053E),
            tile(1, 1, 0x053E),
            tile(7, 2, 0x053E),
        ];
        let mut set = CandidateSet::from_scan(tiles, &mining_config(), &CooldownLedger::new());

        let at = Position::new(0, 0, 0);
        let mut last = -1_i64;
        // Without moving, successive pulls come back in expanding rings.
        while let Some(spot) = set.pull_nearest(at) {
            let d = spot.position.distance_sq(&at);
            assert!(d >= last, "pull order regressed: {d} < {last}");
            last = d;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn prune_drops_newly_cooling_spots() {
        let tiles = vec![tile(1, 1, 0x053E), tile(2, 2, 0x053E)];
        let mut set = CandidateSet::from_scan(tiles, &mining_config(), &CooldownLedger::new());
        assert_eq!(set.len(), 2);

        let mut cooldowns = CooldownLedger::new();
        cooldowns.place(
            prospector_core::SpotKey { x: 2, y: 2 },
            Duration::from_secs(1200),
        );
        set.prune_cooling(&cooldowns);
        assert_eq!(set.len(), 1);
    }
}
