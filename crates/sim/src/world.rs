//! World construction — a small deterministic patch of terrain.
//!
//! `SimWorld` builds the starting state: where the player stands, which
//! veins hold how much ore, where the carrier grazes, and what each rune
//! slot teleports to. `build` freezes it into a [`SimHost`].

use prospector_config::AppConfig;
use prospector_core::{
    GraphicId, ItemSnapshot, MobileSnapshot, Notoriety, Position, Serial, StaticTile,
};
use std::collections::HashMap;

use crate::host::SimHost;

/// Raw ore graphic minted by successful swings.
pub const ORE_GRAPHIC: GraphicId = 0x19B9;
/// Ingot graphic the smelter script produces.
pub const INGOT_GRAPHIC: GraphicId = 0x1BF2;
/// Ore units added per successful swing.
pub const ORE_PER_SWING: u32 = 2;
/// Stones added to the player per successful swing.
pub const ORE_WEIGHT_PER_SWING: u32 = 12;

pub(crate) const BACKPACK: Serial = 0x4000_0001;
pub(crate) const CARRIER: Serial = 0x4100_0001;
pub(crate) const CORPSE_GRAPHIC: GraphicId = 0x2006;

pub(crate) const SURVEY_GLASS_GRAPHIC: GraphicId = 0x0FB4;
pub(crate) const HOSTILE_BODY: GraphicId = 0x0027;
const PICKAXE_GRAPHIC: GraphicId = 0x0E85;
const PACK_HORSE_BODY: GraphicId = 0x0123;
const VEIN_GRAPHIC: GraphicId = 0x053E;

/// A finite ore deposit under a rock tile.
pub(crate) struct Vein {
    pub(crate) tile: StaticTile,
    pub(crate) remaining: u32,
}

pub(crate) struct SimState {
    pub(crate) position: Position,
    pub(crate) weight: u32,
    pub(crate) max_weight: u32,
    pub(crate) mounted: bool,
    pub(crate) skills: HashMap<String, f64>,
    pub(crate) veins: Vec<Vein>,
    pub(crate) journal: Vec<String>,
    pub(crate) containers: HashMap<Serial, Vec<ItemSnapshot>>,
    pub(crate) mobiles: Vec<MobileSnapshot>,
    pub(crate) ground: Vec<(Position, ItemSnapshot)>,
    pub(crate) runes: HashMap<u8, Position>,
    pub(crate) ambush: Option<(u64, String)>,
    pub(crate) total_swings: u64,
    pub(crate) next_serial: Serial,
    pub(crate) left_hand: Option<ItemSnapshot>,
    pub(crate) right_hand: Option<ItemSnapshot>,
    pub(crate) scripts_run: Vec<String>,
}

impl SimState {
    pub(crate) fn mint_serial(&mut self) -> Serial {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }
}

/// Builder for a simulated world.
pub struct SimWorld {
    state: SimState,
}

impl SimWorld {
    pub fn new() -> Self {
        let mut skills = HashMap::new();
        skills.insert("Mining".to_string(), 100.0);
        let mut containers = HashMap::new();
        containers.insert(BACKPACK, Vec::new());

        Self {
            state: SimState {
                position: Position::new(0, 0, 0),
                weight: 50,
                max_weight: 1000,
                mounted: false,
                skills,
                veins: Vec::new(),
                journal: Vec::new(),
                containers,
                mobiles: Vec::new(),
                ground: Vec::new(),
                runes: HashMap::new(),
                ambush: None,
                total_swings: 0,
                next_serial: 0x000A_0000,
                left_hand: None,
                right_hand: None,
                scripts_run: Vec::new(),
            },
        }
    }

    pub fn player_at(mut self, x: i32, y: i32) -> Self {
        self.state.position = Position::new(x, y, 0);
        self
    }

    pub fn player_capacity(mut self, max_weight: u32) -> Self {
        self.state.max_weight = max_weight;
        self
    }

    pub fn mounted(mut self) -> Self {
        self.state.mounted = true;
        self
    }

    pub fn skill(mut self, name: &str, value: f64) -> Self {
        self.state.skills.insert(name.to_string(), value);
        self
    }

    /// A pickaxe in the right hand, ready to swing.
    pub fn pickaxe(mut self) -> Self {
        let serial = self.state.mint_serial();
        self.state.right_hand = Some(ItemSnapshot {
            serial,
            graphic: PICKAXE_GRAPHIC,
            amount: 1,
            weight: 11,
        });
        self
    }

    /// A spare pickaxe in the backpack.
    pub fn spare_pickaxe(mut self) -> Self {
        let serial = self.state.mint_serial();
        self.state
            .containers
            .entry(BACKPACK)
            .or_default()
            .push(ItemSnapshot {
                serial,
                graphic: PICKAXE_GRAPHIC,
                amount: 1,
                weight: 11,
            });
        self
    }

    /// A prospector's glass in the backpack.
    pub fn survey_glass(mut self) -> Self {
        let serial = self.state.mint_serial();
        self.state
            .containers
            .entry(BACKPACK)
            .or_default()
            .push(ItemSnapshot {
                serial,
                graphic: SURVEY_GLASS_GRAPHIC,
                amount: 1,
                weight: 1,
            });
        self
    }

    /// A rock tile holding this many successful swings of ore.
    pub fn vein(mut self, x: i32, y: i32, yields: u32) -> Self {
        self.state.veins.push(Vein {
            tile: StaticTile {
                position: Position::new(x, y, 0),
                graphic: VEIN_GRAPHIC,
            },
            remaining: yields,
        });
        self
    }

    /// A pack horse with an empty pack.
    pub fn carrier_at(mut self, x: i32, y: i32) -> Self {
        self.state.mobiles.push(MobileSnapshot {
            serial: CARRIER,
            body: PACK_HORSE_BODY,
            name: "a pack horse".into(),
            position: Position::new(x, y, 0),
            notoriety: Notoriety::Innocent,
            human: false,
            friendly: true,
        });
        self.state.containers.insert(CARRIER, Vec::new());
        self
    }

    /// Register a rune slot destination.
    pub fn rune(mut self, slot: u8, x: i32, y: i32) -> Self {
        self.state.runes.insert(slot, Position::new(x, y, 0));
        self
    }

    /// A hostile already on the field when the session starts.
    pub fn hostile_at(mut self, name: &str, x: i32, y: i32) -> Self {
        let serial = self.state.mint_serial();
        self.state.mobiles.push(MobileSnapshot {
            serial,
            body: HOSTILE_BODY,
            name: name.to_string(),
            position: Position::new(x, y, 0),
            notoriety: Notoriety::Murderer,
            human: false,
            friendly: false,
        });
        self
    }

    /// Spawn a hostile next to the player after this many swings.
    pub fn ambush_after(mut self, swings: u64, name: &str) -> Self {
        self.state.ambush = Some((swings, name.to_string()));
        self
    }

    pub fn build(self) -> SimHost {
        SimHost::from_state(self.state)
    }

    /// The canned scenario behind `prospector simulate`: two rune
    /// anchors with a handful of veins each, a pack horse, a low carry
    /// capacity so the offload machinery gets exercised, and one ambush.
    pub fn demo() -> Self {
        Self::new()
            .player_at(100, 100)
            .player_capacity(150)
            .pickaxe()
            .spare_pickaxe()
            .survey_glass()
            .carrier_at(98, 100)
            .vein(103, 100, 3)
            .vein(104, 102, 2)
            .vein(97, 96, 4)
            .rune(5, 100, 100)
            .rune(11, 300, 300)
            .vein(303, 300, 3)
            .vein(299, 297, 2)
            .ambush_after(4, "a mongbat")
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Session config tuned for simulated time: the same loop logic with the
/// waits shrunk to keep a run snappy.
pub fn sim_session_config() -> AppConfig {
    let mut config = AppConfig::default();

    // A low reserve so small simulated packs still trigger offloads.
    config.mining.offload_reserve = 60;
    config.mining.offload_margin = 20;

    config.timing.outcome_timeout_ms = 200;
    config.timing.poll_interval_ms = 10;
    config.timing.attempt_pause_ms = 10;
    config.timing.post_swing_ms = 5;
    config.timing.drag_delay_ms = 5;
    config.timing.equip_settle_ms = 5;
    config.timing.approach_settle_ms = 5;
    config.timing.recall_settle_ms = 10;
    config.timing.survey_settle_ms = 5;
    config.timing.dismount_settle_ms = 5;
    config.timing.cycle_pause_ms = 10;
    config.carrier.follow_wait_secs = 1;

    config
}
