//! GameHost trait — the abstraction over the game automation host.
//!
//! The controller does not own any game protocol; everything it does in the
//! world goes through a host-provided API surface. This trait models that
//! boundary so the control logic can run against a live bridge or an
//! in-memory simulation without knowing which.
//!
//! Action outcomes are deliberately NOT return values: a `targeted_use` call
//! returning `Ok` means the host accepted the action, and the in-world
//! result is observed afterwards through journal polling, exactly as the
//! real host behaves.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::HostError;
use crate::world::{GraphicId, Position, ScanArea, Serial, StaticTile};

/// One read of the player's position and load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatus {
    /// Where the player currently stands.
    pub position: Position,

    /// Carried weight in stones.
    pub weight: u32,

    /// Maximum carriable weight in stones.
    pub max_weight: u32,

    /// Whether the player is mounted (blocks extraction on most hosts).
    pub mounted: bool,

    /// Serial of the player's backpack container.
    pub backpack: Serial,
}

impl PlayerStatus {
    /// True when the player can no longer move under its own load.
    pub fn overloaded(&self) -> bool {
        self.weight >= self.max_weight
    }
}

/// Snapshot of an item as the host reports it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub serial: Serial,
    pub graphic: GraphicId,

    /// Stack size.
    pub amount: u32,

    /// Total weight of the stack in stones.
    pub weight: u32,
}

/// Host-reported standing of a mobile toward the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notoriety {
    Innocent,
    Ally,
    Attackable,
    Criminal,
    Enemy,
    Murderer,
    Invulnerable,
}

impl Notoriety {
    /// Standings the controller treats as a threat worth interrupting for.
    pub fn is_hostile(&self) -> bool {
        matches!(
            self,
            Notoriety::Criminal | Notoriety::Enemy | Notoriety::Murderer
        )
    }
}

/// Snapshot of a mobile (creature, NPC, or another player).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobileSnapshot {
    pub serial: Serial,

    /// Body graphic.
    pub body: GraphicId,

    pub name: String,
    pub position: Position,
    pub notoriety: Notoriety,

    /// Whether the host classifies the body as humanoid.
    pub human: bool,

    /// Whether the mobile is on the host's active friend registry.
    pub friendly: bool,
}

/// Which hand slot to inspect or equip into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

/// Bounds on a single pathing request.
///
/// The host keeps retrying internally until arrival or timeout; the
/// controller never issues an unbounded walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathPolicy {
    /// Give up after this long even if the host is still making progress.
    pub timeout: Duration,

    /// Arriving within this many tiles of the destination counts as success.
    pub arrive_within: i32,
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(35),
            arrive_within: 1,
        }
    }
}

impl PathPolicy {
    pub fn exact(timeout: Duration) -> Self {
        Self {
            timeout,
            arrive_within: 0,
        }
    }
}

/// The host API boundary the controller consumes.
///
/// Implementations: a live scripting-host bridge, or `SimHost` for tests
/// and the `simulate` command. Every call is awaited with a bounded wait;
/// the trait exposes no subscription or callback surface because the real
/// host has none — polling is the only synchronization mechanism.
#[async_trait]
pub trait GameHost: Send + Sync {
    // --- Player state ---

    /// Current position, weight, mount state, and backpack serial.
    async fn player_status(&self) -> Result<PlayerStatus, HostError>;

    /// Real (unmodified) value of a named skill.
    async fn skill_value(&self, skill: &str) -> Result<f64, HostError>;

    /// Dismount if mounted. No-op when on foot.
    async fn dismount(&self) -> Result<(), HostError>;

    // --- World queries ---

    /// All static tiles inside the scan window, with graphic and elevation.
    async fn scan_statics(&self, area: ScanArea) -> Result<Vec<StaticTile>, HostError>;

    // --- Movement ---

    /// Path toward `dest` under the given policy. Returns `true` on arrival
    /// (within tolerance); the player may have partially moved on `false`.
    async fn walk_to(&self, dest: Position, policy: PathPolicy) -> Result<bool, HostError>;

    // --- Actions ---

    /// Use `item` targeted at a static tile. Outcome arrives via the journal.
    async fn targeted_use(&self, item: Serial, tile: StaticTile) -> Result<(), HostError>;

    /// Launch an independent named behavior, fire-and-forget.
    async fn run_script(&self, name: &str) -> Result<(), HostError>;

    /// Recall travel via a runebook slot.
    async fn recall(&self, runebook: Serial, slot: u8) -> Result<(), HostError>;

    // --- Journal ---

    /// Whether recent event text contains `needle`. Non-destructive;
    /// matches accumulate until `clear_journal`.
    async fn journal_contains(&self, needle: &str) -> Result<bool, HostError>;

    /// Discard accumulated event text.
    async fn clear_journal(&self) -> Result<(), HostError>;

    // --- Inventory ---

    /// Items directly inside `container`. A mobile serial is accepted and
    /// resolves to that mobile's pack.
    async fn container_items(&self, container: Serial) -> Result<Vec<ItemSnapshot>, HostError>;

    /// Move a stack (or `amount` of it) into another container.
    async fn move_item(&self, item: Serial, to: Serial, amount: u32) -> Result<(), HostError>;

    /// Drop a stack (or `amount` of it) on the ground at the player's feet.
    async fn drop_at_feet(&self, item: Serial, amount: u32) -> Result<(), HostError>;

    // --- Equipment ---

    /// The item held in the given hand, if any.
    async fn item_in_hand(&self, hand: Hand) -> Result<Option<ItemSnapshot>, HostError>;

    /// Equip an item from the backpack.
    async fn equip(&self, item: Serial) -> Result<(), HostError>;

    // --- Mobiles ---

    /// Look a mobile up by serial. `None` when out of range or gone.
    async fn find_mobile(&self, serial: Serial) -> Result<Option<MobileSnapshot>, HostError>;

    /// All mobiles within `range` tiles of the player, excluding the player.
    async fn mobiles_in_range(&self, range: i32) -> Result<Vec<MobileSnapshot>, HostError>;

    /// Immovable ground items of a given graphic within `range` tiles of the
    /// player. Used to find lootable corpse containers.
    async fn ground_items(&self, range: i32, graphic: GraphicId)
        -> Result<Vec<ItemSnapshot>, HostError>;

    /// Order an owned pet to follow the player.
    async fn command_follow(&self, pet: Serial) -> Result<(), HostError>;
}
