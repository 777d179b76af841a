//! Shared test fixtures — a scriptable in-memory host.
//!
//! `MockHost` answers the whole host surface from plain state behind a
//! mutex and lets tests script the parts that matter: what each extraction
//! swing produces, whether walks arrive, and when hostiles die. Mutating
//! calls are recorded by name so tests can assert on what the controller
//! actually did.

use async_trait::async_trait;
use prospector_config::AppConfig;
use prospector_core::{
    EventBus, GameHost, GraphicId, Hand, HostError, ItemSnapshot, MobileSnapshot, PathPolicy,
    PlayerStatus, Position, ScanArea, Serial, SessionEvent, StaticTile,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::cooldown::CooldownLedger;
use crate::session::SessionContext;
use crate::stats::SessionStats;

pub(crate) const BACKPACK: Serial = 0x4000_0001;

/// What the next extraction swing produces.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Swing {
    /// Success phrase; ore lands in the backpack and weight goes up.
    Yield,
    /// Depletion phrase.
    Deplete,
    /// Tool-worn phrase; both hands are emptied.
    WearTool,
    /// Blocked phrase.
    Block,
    /// Mounted-refusal phrase.
    RideRefusal,
    /// No phrase at all; the outcome poll times out.
    Silence,
}

struct HostState {
    position: Position,
    weight: u32,
    max_weight: u32,
    mounted: bool,
    skills: HashMap<String, f64>,
    statics: Vec<StaticTile>,
    journal: Vec<String>,
    swings: VecDeque<Swing>,
    left_hand: Option<ItemSnapshot>,
    right_hand: Option<ItemSnapshot>,
    containers: HashMap<Serial, Vec<ItemSnapshot>>,
    mobiles: Vec<MobileSnapshot>,
    ground: Vec<(Position, ItemSnapshot)>,
    walk_script: VecDeque<bool>,
    follow_closes_gap: bool,
    runs_until_clear: u32,
    calls: Vec<String>,
}

pub(crate) struct MockHost {
    state: Mutex<HostState>,
}

impl MockHost {
    pub(crate) fn new(position: Position) -> Self {
        let mut skills = HashMap::new();
        skills.insert("Mining".to_string(), 100.0);
        let mut containers = HashMap::new();
        containers.insert(BACKPACK, Vec::new());

        Self {
            state: Mutex::new(HostState {
                position,
                weight: 100,
                max_weight: 1000,
                mounted: false,
                skills,
                statics: Vec::new(),
                journal: Vec::new(),
                swings: VecDeque::new(),
                left_hand: None,
                right_hand: None,
                containers,
                mobiles: Vec::new(),
                ground: Vec::new(),
                walk_script: VecDeque::new(),
                follow_closes_gap: false,
                runs_until_clear: 1,
                calls: Vec::new(),
            }),
        }
    }

    // ── Scenario setup ──

    pub(crate) fn set_weight(&self, weight: u32, max_weight: u32) {
        let mut s = self.state.lock().unwrap();
        s.weight = weight;
        s.max_weight = max_weight;
    }

    pub(crate) fn set_skill(&self, name: &str, value: f64) {
        self.state
            .lock()
            .unwrap()
            .skills
            .insert(name.to_string(), value);
    }

    pub(crate) fn set_mounted(&self, mounted: bool) {
        self.state.lock().unwrap().mounted = mounted;
    }

    pub(crate) fn hold(&self, hand: Hand, item: ItemSnapshot) {
        let mut s = self.state.lock().unwrap();
        match hand {
            Hand::Left => s.left_hand = Some(item),
            Hand::Right => s.right_hand = Some(item),
        }
    }

    pub(crate) fn put_in_backpack(&self, item: ItemSnapshot) {
        let mut s = self.state.lock().unwrap();
        s.containers.entry(BACKPACK).or_default().push(item);
    }

    pub(crate) fn add_static(&self, x: i32, y: i32, graphic: GraphicId) {
        self.state.lock().unwrap().statics.push(StaticTile {
            position: Position::new(x, y, 0),
            graphic,
        });
    }

    pub(crate) fn add_mobile(&self, mobile: MobileSnapshot) {
        self.state.lock().unwrap().mobiles.push(mobile);
    }

    pub(crate) fn add_carrier(
        &self,
        serial: Serial,
        body: GraphicId,
        position: Position,
        load: Vec<ItemSnapshot>,
    ) {
        let mut s = self.state.lock().unwrap();
        s.mobiles.push(MobileSnapshot {
            serial,
            body,
            name: "a pack horse".into(),
            position,
            notoriety: prospector_core::Notoriety::Innocent,
            human: false,
            friendly: true,
        });
        s.containers.insert(serial, load);
    }

    pub(crate) fn add_corpse(&self, serial: Serial, position: Position, contents: Vec<ItemSnapshot>) {
        let mut s = self.state.lock().unwrap();
        s.ground.push((
            position,
            ItemSnapshot {
                serial,
                graphic: 0x2006,
                amount: 1,
                weight: 0,
            },
        ));
        s.containers.insert(serial, contents);
    }

    pub(crate) fn script_swings(&self, swings: impl IntoIterator<Item = Swing>) {
        self.state.lock().unwrap().swings.extend(swings);
    }

    pub(crate) fn script_walks(&self, results: Vec<bool>) {
        self.state.lock().unwrap().walk_script.extend(results);
    }

    pub(crate) fn follow_closes_gap(&self, yes: bool) {
        self.state.lock().unwrap().follow_closes_gap = yes;
    }

    /// Hostiles die after this many `run_script` calls (default 1).
    pub(crate) fn set_runs_until_clear(&self, runs: u32) {
        self.state.lock().unwrap().runs_until_clear = runs;
    }

    pub(crate) fn journal_push(&self, line: &str) {
        self.state.lock().unwrap().journal.push(line.to_string());
    }

    // ── Assertions ──

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn calls_named(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| *c == name)
            .count()
    }

    pub(crate) fn container(&self, serial: Serial) -> Vec<ItemSnapshot> {
        self.state
            .lock()
            .unwrap()
            .containers
            .get(&serial)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn backpack_items(&self) -> Vec<ItemSnapshot> {
        self.container(BACKPACK)
    }

    pub(crate) fn position(&self) -> Position {
        self.state.lock().unwrap().position
    }

    pub(crate) fn weight(&self) -> u32 {
        self.state.lock().unwrap().weight
    }
}

#[async_trait]
impl GameHost for MockHost {
    async fn player_status(&self) -> Result<PlayerStatus, HostError> {
        let s = self.state.lock().unwrap();
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
            .lock()
            .unwrap()
            .skills
            .get(skill)
            .copied()
            .unwrap_or(0.0))
    }

    async fn dismount(&self) -> Result<(), HostError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push("dismount".into());
        s.mounted = false;
        Ok(())
    }

    async fn scan_statics(&self, area: ScanArea) -> Result<Vec<StaticTile>, HostError> {
        let s = self.state.lock().unwrap();
        Ok(s.statics
            .iter()
            .filter(|t| area.contains(&t.position))
            .copied()
            .collect())
    }

    async fn walk_to(&self, dest: Position, _policy: PathPolicy) -> Result<bool, HostError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push("walk_to".into());
        let arrived = s.walk_script.pop_front().unwrap_or(true);
        if arrived {
            s.position = dest;
        }
        Ok(arrived)
    }

    async fn targeted_use(&self, item: Serial, _tile: StaticTile) -> Result<(), HostError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push("targeted_use".into());

        // A survey tool reports traces instead of consuming a swing.
        let used_graphic = s
            .containers
            .values()
            .flatten()
            .chain(s.left_hand.iter())
            .chain(s.right_hand.iter())
            .find(|i| i.serial == item)
            .map(|i| i.graphic);
        if used_graphic == Some(0x0FB4) {
            s.journal.push("You find traces of a rich vein!".into());
            return Ok(());
        }

        match s.swings.pop_front().unwrap_or(Swing::Silence) {
            Swing::Yield => {
                s.journal
                    .push("You dig some iron ore and put it in your backpack.".into());
                let pack = s.containers.entry(BACKPACK).or_default();
                if let Some(stack) = pack.iter_mut().find(|i| i.graphic == 0x19B9) {
                    stack.amount += 5;
                    stack.weight += 10;
                } else {
                    pack.push(ItemSnapshot {
                        serial: 0x000A_0E0E,
                        graphic: 0x19B9,
                        amount: 5,
                        weight: 10,
                    });
                }
                s.weight += 10;
            }
            Swing::Deplete => s.journal.push("There is no metal here to mine.".into()),
            Swing::WearTool => {
                s.journal.push("You have worn out your tool!".into());
                s.left_hand = None;
                s.right_hand = None;
            }
            Swing::Block => s.journal.push("You can not mine there.".into()),
            Swing::RideRefusal => s
                .journal
                .push("You can't dig while riding or flying.".into()),
            Swing::Silence => {}
        }
        Ok(())
    }

    async fn run_script(&self, name: &str) -> Result<(), HostError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(format!("run_script:{name}"));
        if s.runs_until_clear > 0 {
            s.runs_until_clear -= 1;
            if s.runs_until_clear == 0 {
                s.mobiles.retain(|m| !m.notoriety.is_hostile());
            }
        }
        Ok(())
    }

    async fn recall(&self, _runebook: Serial, slot: u8) -> Result<(), HostError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(format!("recall:{slot}"));
        Ok(())
    }

    async fn journal_contains(&self, needle: &str) -> Result<bool, HostError> {
        let s = self.state.lock().unwrap();
        Ok(s.journal.iter().any(|line| line.contains(needle)))
    }

    async fn clear_journal(&self) -> Result<(), HostError> {
        self.state.lock().unwrap().journal.clear();
        Ok(())
    }

    async fn container_items(&self, container: Serial) -> Result<Vec<ItemSnapshot>, HostError> {
        let s = self.state.lock().unwrap();
        Ok(s.containers.get(&container).cloned().unwrap_or_default())
    }

    async fn move_item(&self, item: Serial, to: Serial, _amount: u32) -> Result<(), HostError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push("move_item".into());

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
        let mut s = self.state.lock().unwrap();
        s.calls.push("drop_at_feet".into());

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
        let s = self.state.lock().unwrap();
        Ok(match hand {
            Hand::Left => s.left_hand,
            Hand::Right => s.right_hand,
        })
    }

    async fn equip(&self, item: Serial) -> Result<(), HostError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push("equip".into());

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
        let s = self.state.lock().unwrap();
        Ok(s.mobiles.iter().find(|m| m.serial == serial).cloned())
    }

    async fn mobiles_in_range(&self, range: i32) -> Result<Vec<MobileSnapshot>, HostError> {
        let s = self.state.lock().unwrap();
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
        let s = self.state.lock().unwrap();
        Ok(s.ground
            .iter()
            .filter(|(pos, item)| item.graphic == graphic && s.position.tile_range(pos) <= range)
            .map(|(_, item)| *item)
            .collect())
    }

    async fn command_follow(&self, pet: Serial) -> Result<(), HostError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push("command_follow".into());
        if s.follow_closes_gap {
            let beside = s.position.offset(1, 0);
            if let Some(m) = s.mobiles.iter_mut().find(|m| m.serial == pet) {
                m.position = beside;
            }
        }
        Ok(())
    }
}

// ── Context construction ──

pub(crate) fn test_context(host: Arc<MockHost>) -> SessionContext {
    test_context_with(host, AppConfig::default())
}

pub(crate) fn test_context_with(host: Arc<MockHost>, config: AppConfig) -> SessionContext {
    let carrier = config.carrier.serial;
    SessionContext {
        host,
        config,
        events: Arc::new(EventBus::default()),
        hooks: Vec::new(),
        stop: Arc::new(AtomicBool::new(false)),
        cooldowns: CooldownLedger::new(),
        carrier,
        alerted: HashSet::new(),
        stats: SessionStats::default(),
        session_id: "test-session".into(),
    }
}

/// Collect everything currently buffered on an event receiver.
pub(crate) fn drain_events(rx: &mut broadcast::Receiver<Arc<SessionEvent>>) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push((*event).clone());
    }
    out
}
