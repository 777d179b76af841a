//! The simulated host — a `GameHost` over in-memory world state.
//!
//! Everything a real host does asynchronously over a wire happens here
//! against a single `RwLock`. Walks teleport, recalls look up rune
//! anchors, and extraction writes the same journal phrases a live host
//! would, so the controller cannot tell the difference.

use async_trait::async_trait;
use prospector_core::{
    GameHost, GraphicId, Hand, HostError, ItemSnapshot, MobileSnapshot, PathPolicy, PlayerStatus,
    Position, ScanArea, Serial, StaticTile,
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::world::{
    SimState, BACKPACK, CARRIER, CORPSE_GRAPHIC, HOSTILE_BODY, INGOT_GRAPHIC, ORE_GRAPHIC,
    ORE_PER_SWING, ORE_WEIGHT_PER_SWING, SURVEY_GLASS_GRAPHIC,
};

// Journal phrases the live host emits; the controller matches on these.
const PHRASE_SUCCESS: &str = "You dig some iron ore and put it in your backpack.";
const PHRASE_DEPLETED: &str = "There is no metal here to mine.";
const PHRASE_BLOCKED: &str = "You can not mine there.";
const PHRASE_MOUNTED: &str = "You can't dig while riding or flying.";
const PHRASE_TRACES: &str = "You find traces of iron ore.";

pub struct SimHost {
    state: RwLock<SimState>,
}

impl SimHost {
    pub(crate) fn from_state(state: SimState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    // ── Introspection for tests and reporting ──

    /// Ore swings still left in the ground, across every vein.
    pub async fn remaining_ore(&self) -> u32 {
        self.state.read().await.veins.iter().map(|v| v.remaining).sum()
    }

    pub async fn carrier_cargo(&self) -> Vec<ItemSnapshot> {
        self.state
            .read()
            .await
            .containers
            .get(&CARRIER)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn backpack_cargo(&self) -> Vec<ItemSnapshot> {
        self.state
            .read()
            .await
            .containers
            .get(&BACKPACK)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn scripts_run(&self) -> Vec<String> {
        self.state.read().await.scripts_run.clone()
    }

    pub async fn swings(&self) -> u64 {
        self.state.read().await.total_swings
    }

    pub async fn player_position(&self) -> Position {
        self.state.read().await.position
    }
}

#[async_trait]
impl GameHost for SimHost {
    async fn player_status(&self) -> Result<PlayerStatus, HostError> {
        let s = self.state.read().await;
        Ok(PlayerStatus {
            position: s.position,
            weight: s.weight,
            max_weight: s.max_weight,
            mounted: s.mounted,
            backpack: BACKPACK,
        })
    }

    async fn skill_value(&self, skill: &str) -> Result<f64, HostError> {
        Ok(self
            .state
            .read()
            .await
            .skills
            .get(skill)
            .copied()
            .unwrap_or(0.0))
    }

    async fn dismount(&self) -> Result<(), HostError> {
        self.state.write().await.mounted = false;
        Ok(())
    }

    async fn scan_statics(&self, area: ScanArea) -> Result<Vec<StaticTile>, HostError> {
        let s = self.state.read().await;
        // Dry veins still scan as rock; only the journal tells them apart.
        Ok(s.veins
            .iter()
            .map(|v| v.tile)
            .filter(|t| area.contains(&t.position))
            .collect())
    }

    async fn walk_to(&self, dest: Position, _policy: PathPolicy) -> Result<bool, HostError> {
        // Simulated terrain has no obstacles; every path resolves.
        self.state.write().await.position = dest;
        Ok(true)
    }

    async fn targeted_use(&self, item: Serial, tile: StaticTile) -> Result<(), HostError> {
        let mut s = self.state.write().await;

        let used_graphic = s
            .containers
            .values()
            .flatten()
            .chain(s.left_hand.iter())
            .chain(s.right_hand.iter())
            .find(|i| i.serial == item)
            .map(|i| i.graphic);
        if used_graphic == Some(SURVEY_GLASS_GRAPHIC) {
            s.journal.push(PHRASE_TRACES.to_string());
            return Ok(());
        }

        if s.mounted {
            s.journal.push(PHRASE_MOUNTED.to_string());
            return Ok(());
        }

        s.total_swings += 1;
        if let Some((at, name)) = s.ambush.clone()
            && s.total_swings == at
        {
            debug!(name = %name, "Ambush springs");
            let serial = s.mint_serial();
            let beside = s.position.offset(1, 1);
            s.mobiles.push(MobileSnapshot {
                serial,
                body: HOSTILE_BODY,
                name,
                position: beside,
                notoriety: prospector_core::Notoriety::Murderer,
                human: false,
                friendly: false,
            });
            s.ambush = None;
        }

        let Some(vein) = s
            .veins
            .iter_mut()
            .find(|v| v.tile.position == tile.position)
        else {
            s.journal.push(PHRASE_BLOCKED.to_string());
            return Ok(());
        };

        if vein.remaining == 0 {
            s.journal.push(PHRASE_DEPLETED.to_string());
            return Ok(());
        }
        vein.remaining -= 1;

        let serial = s.mint_serial();
        let pack = s.containers.entry(BACKPACK).or_default();
        if let Some(stack) = pack.iter_mut().find(|i| i.graphic == ORE_GRAPHIC) {
            stack.amount += ORE_PER_SWING;
            stack.weight += ORE_WEIGHT_PER_SWING;
        } else {
            pack.push(ItemSnapshot {
                serial,
                graphic: ORE_GRAPHIC,
                amount: ORE_PER_SWING,
                weight: ORE_WEIGHT_PER_SWING,
            });
        }
        s.weight += ORE_WEIGHT_PER_SWING;
        s.journal.push(PHRASE_SUCCESS.to_string());
        Ok(())
    }

    async fn run_script(&self, name: &str) -> Result<(), HostError> {
        let mut s = self.state.write().await;
        s.scripts_run.push(name.to_string());

        if name.contains("Attack") {
            // The responder fells the nearest hostile and leaves a corpse.
            let player = s.position;
            let victim = s
                .mobiles
                .iter()
                .filter(|m| m.notoriety.is_hostile())
                .min_by_key(|m| player.distance_sq(&m.position))
                .map(|m| (m.serial, m.position));
            if let Some((serial, position)) = victim {
                s.mobiles.retain(|m| m.serial != serial);
                let corpse = s.mint_serial();
                s.ground.push((
                    position,
                    ItemSnapshot {
                        serial: corpse,
                        graphic: CORPSE_GRAPHIC,
                        amount: 1,
                        weight: 0,
                    },
                ));
                s.containers.insert(corpse, Vec::new());
            }
        } else if name.contains("smelter") {
            // Ore in the backpack becomes ingots at a stone apiece.
            let mut shed = 0;
            if let Some(pack) = s.containers.get_mut(&BACKPACK) {
                for stack in pack.iter_mut().filter(|i| i.graphic == ORE_GRAPHIC) {
                    let new_weight = stack.amount;
                    shed += stack.weight.saturating_sub(new_weight);
                    stack.graphic = INGOT_GRAPHIC;
                    stack.weight = new_weight;
                }
            }
            s.weight = s.weight.saturating_sub(shed);
        }
        Ok(())
    }

    async fn recall(&self, _runebook: Serial, slot: u8) -> Result<(), HostError> {
        let mut s = self.state.write().await;
        let Some(anchor) = s.runes.get(&slot).copied() else {
            return Err(HostError::Rejected(format!("no rune in slot {slot}")));
        };
        s.position = anchor;
        Ok(())
    }

    async fn journal_contains(&self, needle: &str) -> Result<bool, HostError> {
        let s = self.state.read().await;
        Ok(s.journal.iter().any(|line| line.contains(needle)))
    }

    async fn clear_journal(&self) -> Result<(), HostError> {
        self.state.write().await.journal.clear();
        Ok(())
    }

    async fn container_items(&self, container: Serial) -> Result<Vec<ItemSnapshot>, HostError> {
        let s = self.state.read().await;
        Ok(s.containers.get(&container).cloned().unwrap_or_default())
    }

    async fn move_item(&self, item: Serial, to: Serial, _amount: u32) -> Result<(), HostError> {
        let mut s = self.state.write().await;

        let mut moved = None;
        let mut from_backpack = false;
        for (owner, items) in s.containers.iter_mut() {
            if let Some(idx) = items.iter().position(|i| i.serial == item) {
                moved = Some(items.remove(idx));
                from_backpack = *owner == BACKPACK;
                break;
            }
        }
        let Some(stack) = moved else {
            return Err(HostError::MissingEntity(item));
        };

        if from_backpack {
            s.weight = s.weight.saturating_sub(stack.weight);
        }
        if to == BACKPACK {
            s.weight += stack.weight;
        }
        s.containers.entry(to).or_default().push(stack);
        Ok(())
    }

    async fn drop_at_feet(&self, item: Serial, _amount: u32) -> Result<(), HostError> {
        let mut s = self.state.write().await;

        let pack = s.containers.entry(BACKPACK).or_default();
        let Some(idx) = pack.iter().position(|i| i.serial == item) else {
            return Err(HostError::MissingEntity(item));
        };
        let stack = pack.remove(idx);
        s.weight = s.weight.saturating_sub(stack.weight);
        let here = s.position;
        s.ground.push((here, stack));
        Ok(())
    }

    async fn item_in_hand(&self, hand: Hand) -> Result<Option<ItemSnapshot>, HostError> {
        let s = self.state.read().await;
        Ok(match hand {
            Hand::Left => s.left_hand,
            Hand::Right => s.right_hand,
        })
    }

    async fn equip(&self, item: Serial) -> Result<(), HostError> {
        let mut s = self.state.write().await;

        let pack = s.containers.entry(BACKPACK).or_default();
        let Some(idx) = pack.iter().position(|i| i.serial == item) else {
            return Err(HostError::MissingEntity(item));
        };
        let taken = pack.remove(idx);
        if let Some(old) = s.right_hand.replace(taken) {
            s.containers.entry(BACKPACK).or_default().push(old);
        }
        Ok(())
    }

    async fn find_mobile(&self, serial: Serial) -> Result<Option<MobileSnapshot>, HostError> {
        let s = self.state.read().await;
        Ok(s.mobiles.iter().find(|m| m.serial == serial).cloned())
    }

    async fn mobiles_in_range(&self, range: i32) -> Result<Vec<MobileSnapshot>, HostError> {
        let s = self.state.read().await;
        Ok(s.mobiles
            .iter()
            .filter(|m| s.position.tile_range(&m.position) <= range)
            .cloned()
            .collect())
    }

    async fn ground_items(
        &self,
        range: i32,
        graphic: GraphicId,
    ) -> Result<Vec<ItemSnapshot>, HostError> {
        let s = self.state.read().await;
        Ok(s.ground
            .iter()
            .filter(|(pos, item)| item.graphic == graphic && s.position.tile_range(pos) <= range)
            .map(|(_, item)| *item)
            .collect())
    }

    async fn command_follow(&self, pet: Serial) -> Result<(), HostError> {
        let mut s = self.state.write().await;
        // Simulated pets are obedient; the carrier walks right up.
        let beside = s.position.offset(1, 0);
        if let Some(m) = s.mobiles.iter_mut().find(|m| m.serial == pet) {
            m.position = beside;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SimWorld;

    fn vein_tile(x: i32, y: i32) -> StaticTile {
        StaticTile {
            position: Position::new(x, y, 0),
            graphic: 0x053E,
        }
    }

    async fn wielded(host: &SimHost) -> Serial {
        host.item_in_hand(Hand::Right).await.unwrap().unwrap().serial
    }

    #[tokio::test]
    async fn veins_yield_then_run_dry() {
        let host = SimWorld::new().pickaxe().vein(2, 0, 2).build();
        let pick = wielded(&host).await;

        for _ in 0..2 {
            host.clear_journal().await.unwrap();
            host.targeted_use(pick, vein_tile(2, 0)).await.unwrap();
            assert!(host.journal_contains("You dig some").await.unwrap());
        }

        host.clear_journal().await.unwrap();
        host.targeted_use(pick, vein_tile(2, 0)).await.unwrap();
        assert!(host
            .journal_contains("There is no metal here to mine.")
            .await
            .unwrap());

        let ore: u32 = host
            .backpack_cargo()
            .await
            .iter()
            .filter(|i| i.graphic == ORE_GRAPHIC)
            .map(|i| i.amount)
            .sum();
        assert_eq!(ore, 2 * ORE_PER_SWING);
        assert_eq!(host.remaining_ore().await, 0);
    }

    #[tokio::test]
    async fn digging_adds_carried_weight() {
        let host = SimWorld::new().pickaxe().vein(2, 0, 1).build();
        let pick = wielded(&host).await;
        let before = host.player_status().await.unwrap().weight;

        host.targeted_use(pick, vein_tile(2, 0)).await.unwrap();

        let after = host.player_status().await.unwrap().weight;
        assert_eq!(after, before + ORE_WEIGHT_PER_SWING);
    }

    #[tokio::test]
    async fn the_survey_glass_reports_traces() {
        let host = SimWorld::new().pickaxe().survey_glass().vein(2, 0, 1).build();
        let glass = host
            .backpack_cargo()
            .await
            .iter()
            .find(|i| i.graphic == SURVEY_GLASS_GRAPHIC)
            .unwrap()
            .serial;

        host.targeted_use(glass, vein_tile(2, 0)).await.unwrap();

        assert!(host.journal_contains("You find traces of").await.unwrap());
        // No swing consumed, no ore minted.
        assert_eq!(host.remaining_ore().await, 1);
        assert_eq!(host.swings().await, 0);
    }

    #[tokio::test]
    async fn the_attack_script_fells_one_hostile() {
        let host = SimWorld::new().hostile_at("a mongbat", 2, 1).build();

        host.run_script("pvm_AttackGrey.py").await.unwrap();

        assert!(host.mobiles_in_range(10).await.unwrap().is_empty());
        let corpses = host.ground_items(5, CORPSE_GRAPHIC).await.unwrap();
        assert_eq!(corpses.len(), 1);
    }

    #[tokio::test]
    async fn the_smelter_script_transmutes_ore() {
        let host = SimWorld::new().pickaxe().vein(2, 0, 2).build();
        let pick = wielded(&host).await;
        for _ in 0..2 {
            host.targeted_use(pick, vein_tile(2, 0)).await.unwrap();
        }
        let heavy = host.player_status().await.unwrap().weight;

        host.run_script("auto_smelter.py").await.unwrap();

        let pack = host.backpack_cargo().await;
        assert!(pack.iter().any(|i| i.graphic == INGOT_GRAPHIC));
        assert!(!pack.iter().any(|i| i.graphic == ORE_GRAPHIC));
        assert!(host.player_status().await.unwrap().weight < heavy);
    }

    #[tokio::test]
    async fn recall_teleports_to_the_anchor() {
        let host = SimWorld::new().rune(5, 300, 300).build();

        host.recall(0x0007_0000, 5).await.unwrap();
        assert_eq!(host.player_position().await, Position::new(300, 300, 0));

        let missing = host.recall(0x0007_0000, 23).await;
        assert!(matches!(missing, Err(HostError::Rejected(_))));
    }

    #[tokio::test]
    async fn the_ambush_springs_on_schedule() {
        let host = SimWorld::new()
            .pickaxe()
            .vein(2, 0, 5)
            .ambush_after(2, "a mongbat")
            .build();
        let pick = wielded(&host).await;

        host.targeted_use(pick, vein_tile(2, 0)).await.unwrap();
        assert!(host.mobiles_in_range(10).await.unwrap().is_empty());

        host.targeted_use(pick, vein_tile(2, 0)).await.unwrap();
        let nearby = host.mobiles_in_range(10).await.unwrap();
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].name, "a mongbat");
    }
}
