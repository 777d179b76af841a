//! Configuration loading, validation, and management for Prospector.
//!
//! Loads configuration from `~/.prospector/config.toml`. Every value has a
//! default, so a missing file yields a fully working configuration; the
//! defaults mirror a long-serving field setup. Validates all settings at
//! startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use prospector_core::world::{GraphicId, Serial};

/// The root configuration structure.
///
/// Maps directly to `~/.prospector/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Resource identification and extraction limits
    #[serde(default)]
    pub mining: MiningConfig,

    /// Pauses, timeouts, and poll intervals
    #[serde(default)]
    pub timing: TimingConfig,

    /// Companion carrier (pack animal) offload settings
    #[serde(default)]
    pub carrier: CarrierConfig,

    /// Runebook travel between mining areas
    #[serde(default)]
    pub travel: TravelConfig,

    /// Hostile-response settings
    #[serde(default)]
    pub combat: CombatConfig,

    /// Stranger alerting
    #[serde(default)]
    pub alerts: AlertConfig,

    /// Helper-script hooks fired at phase boundaries
    #[serde(default)]
    pub hooks: HookConfig,

    /// TCP reachability probe defaults
    #[serde(default)]
    pub probe: ProbeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Name of the gathering skill checked at session start.
    #[serde(default = "default_skill_name")]
    pub skill_name: String,

    /// Minimum real skill value required to start a session.
    #[serde(default = "default_skill_minimum")]
    pub skill_minimum: f64,

    /// Half-width of the square scan window, in tiles.
    #[serde(default = "default_scan_radius")]
    pub scan_radius: i32,

    /// Static graphics that can be extracted from (rocks, mountainsides,
    /// cave walls).
    #[serde(default = "default_resource_statics")]
    pub resource_statics: Vec<GraphicId>,

    /// Graphic of the raw resource the extraction yields.
    #[serde(default = "default_ore_graphic")]
    pub ore_graphic: GraphicId,

    /// Refined-form graphics, offloaded along with the raw resource.
    #[serde(default = "default_ingot_graphics")]
    pub ingot_graphics: Vec<GraphicId>,

    /// By-product graphics (gems, granite, sand variants).
    #[serde(default = "default_byproduct_graphics")]
    pub byproduct_graphics: Vec<GraphicId>,

    /// Item graphics usable as extraction tools, in preference order.
    #[serde(default = "default_tool_graphics")]
    pub tool_graphics: Vec<GraphicId>,

    /// Whether to prospect each spot before the first extraction attempt.
    #[serde(default = "default_true")]
    pub prospecting: bool,

    /// Graphic of the prospecting tool.
    #[serde(default = "default_prospect_tool")]
    pub prospect_tool: GraphicId,

    /// Consecutive no-yield attempts at one spot before giving up on it.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Consecutive blocked outcomes at one spot before treating it
    /// as depleted.
    #[serde(default = "default_blocked_streak_limit")]
    pub blocked_streak_limit: u32,

    /// How long a depleted spot stays excluded from discovery, in seconds.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Destination offsets tried in order when approaching a spot.
    #[serde(default = "default_spot_offsets")]
    pub approach_offsets: Vec<(i32, i32)>,

    /// Offload threshold: carried weight at max_weight minus this reserve.
    #[serde(default = "default_offload_reserve")]
    pub offload_reserve: u32,

    /// Trigger the offload early when within this margin of the threshold.
    #[serde(default = "default_offload_margin")]
    pub offload_margin: u32,

    /// Also trigger an offload every this many attempts at a spot.
    #[serde(default = "default_offload_every_attempts")]
    pub offload_every_attempts: u32,

    /// Within this margin of max weight the player counts as immobile and
    /// sheds cargo on the ground.
    #[serde(default = "default_critical_margin")]
    pub critical_margin: u32,

    /// After a failed offload, mining resumes only below max weight minus
    /// this margin.
    #[serde(default = "default_resume_margin")]
    pub resume_margin: u32,
}

fn default_skill_name() -> String {
    "Mining".into()
}
fn default_skill_minimum() -> f64 {
    40.0
}
fn default_scan_radius() -> i32 {
    30
}
fn default_resource_statics() -> Vec<GraphicId> {
    let mut ids = vec![
        // Small rocks
        0x053E, 0x053B, 0x0540, 0x0541, 0x0542, 0x0543, 0x0544, 0x0545, 0x0546, 0x0547, 0x0548,
        0x0549,
        // Mountain tiles
        0x0459, 0x045A, 0x045B, 0x045C,
    ];
    // Cave walls
    ids.extend(0x1771..=0x1780);
    ids
}
fn default_ore_graphic() -> GraphicId {
    0x19B9
}
fn default_ingot_graphics() -> Vec<GraphicId> {
    vec![0x1BF2, 0x1BEF]
}
fn default_byproduct_graphics() -> Vec<GraphicId> {
    (0x3192..=0x3198).collect()
}
fn default_tool_graphics() -> Vec<GraphicId> {
    vec![0x0E85, 0x0F39, 0x0E86, 0x0F43, 0x0F44, 0x0F45]
}
fn default_prospect_tool() -> GraphicId {
    0x0FB4
}
fn default_max_attempts() -> u32 {
    20
}
fn default_blocked_streak_limit() -> u32 {
    3
}
fn default_cooldown_secs() -> u64 {
    1200
}
fn default_spot_offsets() -> Vec<(i32, i32)> {
    vec![(0, 1), (1, 0), (-1, 0), (0, -1)]
}
fn default_offload_reserve() -> u32 {
    400
}
fn default_offload_margin() -> u32 {
    40
}
fn default_offload_every_attempts() -> u32 {
    8
}
fn default_critical_margin() -> u32 {
    10
}
fn default_resume_margin() -> u32 {
    20
}
fn default_true() -> bool {
    true
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            skill_name: default_skill_name(),
            skill_minimum: default_skill_minimum(),
            scan_radius: default_scan_radius(),
            resource_statics: default_resource_statics(),
            ore_graphic: default_ore_graphic(),
            ingot_graphics: default_ingot_graphics(),
            byproduct_graphics: default_byproduct_graphics(),
            tool_graphics: default_tool_graphics(),
            prospecting: true,
            prospect_tool: default_prospect_tool(),
            max_attempts: default_max_attempts(),
            blocked_streak_limit: default_blocked_streak_limit(),
            cooldown_secs: default_cooldown_secs(),
            approach_offsets: default_spot_offsets(),
            offload_reserve: default_offload_reserve(),
            offload_margin: default_offload_margin(),
            offload_every_attempts: default_offload_every_attempts(),
            critical_margin: default_critical_margin(),
            resume_margin: default_resume_margin(),
        }
    }
}

impl MiningConfig {
    /// Cooldown applied to a depleted spot.
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// All graphics counted as carryable resources (raw, refined,
    /// by-product).
    pub fn resource_graphics(&self) -> Vec<GraphicId> {
        let mut ids = vec![self.ore_graphic];
        ids.extend(&self.ingot_graphics);
        ids.extend(&self.byproduct_graphics);
        ids
    }

    /// Carried weight at which an offload is triggered.
    pub fn offload_threshold(&self, max_weight: u32) -> u32 {
        max_weight
            .saturating_sub(self.offload_reserve)
            .saturating_sub(self.offload_margin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// How long to poll the journal for an extraction outcome, in ms.
    #[serde(default = "default_outcome_timeout_ms")]
    pub outcome_timeout_ms: u64,

    /// Pause between journal polls, in ms.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Pause after a successful extraction before the next attempt, in ms.
    #[serde(default = "default_attempt_pause_ms")]
    pub attempt_pause_ms: u64,

    /// Settle time after issuing the extraction action, in ms.
    #[serde(default = "default_post_swing_ms")]
    pub post_swing_ms: u64,

    /// Pause between item drags, in ms.
    #[serde(default = "default_drag_delay_ms")]
    pub drag_delay_ms: u64,

    /// Settle time after equipping a tool, in ms.
    #[serde(default = "default_equip_settle_ms")]
    pub equip_settle_ms: u64,

    /// Settle time after arriving at a destination, in ms.
    #[serde(default = "default_approach_settle_ms")]
    pub approach_settle_ms: u64,

    /// Settle time after a recall lands, in ms.
    #[serde(default = "default_recall_settle_ms")]
    pub recall_settle_ms: u64,

    /// Settle time after a survey action before reading its result, in ms.
    #[serde(default = "default_survey_settle_ms")]
    pub survey_settle_ms: u64,

    /// Settle time after dismounting, in ms.
    #[serde(default = "default_dismount_settle_ms")]
    pub dismount_settle_ms: u64,

    /// Pause between travel cycles, in ms.
    #[serde(default = "default_cycle_pause_ms")]
    pub cycle_pause_ms: u64,

    /// Upper bound on a single pathing request, in seconds.
    #[serde(default = "default_path_timeout_secs")]
    pub path_timeout_secs: u64,
}

fn default_outcome_timeout_ms() -> u64 {
    5000
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_attempt_pause_ms() -> u64 {
    300
}
fn default_post_swing_ms() -> u64 {
    200
}
fn default_drag_delay_ms() -> u64 {
    300
}
fn default_equip_settle_ms() -> u64 {
    600
}
fn default_approach_settle_ms() -> u64 {
    800
}
fn default_recall_settle_ms() -> u64 {
    3000
}
fn default_survey_settle_ms() -> u64 {
    500
}
fn default_dismount_settle_ms() -> u64 {
    800
}
fn default_cycle_pause_ms() -> u64 {
    100
}
fn default_path_timeout_secs() -> u64 {
    35
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            outcome_timeout_ms: default_outcome_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            attempt_pause_ms: default_attempt_pause_ms(),
            post_swing_ms: default_post_swing_ms(),
            drag_delay_ms: default_drag_delay_ms(),
            equip_settle_ms: default_equip_settle_ms(),
            approach_settle_ms: default_approach_settle_ms(),
            recall_settle_ms: default_recall_settle_ms(),
            survey_settle_ms: default_survey_settle_ms(),
            dismount_settle_ms: default_dismount_settle_ms(),
            cycle_pause_ms: default_cycle_pause_ms(),
            path_timeout_secs: default_path_timeout_secs(),
        }
    }
}

impl TimingConfig {
    pub fn outcome_timeout(&self) -> Duration {
        Duration::from_millis(self.outcome_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn attempt_pause(&self) -> Duration {
        Duration::from_millis(self.attempt_pause_ms)
    }

    pub fn post_swing(&self) -> Duration {
        Duration::from_millis(self.post_swing_ms)
    }

    pub fn drag_delay(&self) -> Duration {
        Duration::from_millis(self.drag_delay_ms)
    }

    pub fn equip_settle(&self) -> Duration {
        Duration::from_millis(self.equip_settle_ms)
    }

    pub fn approach_settle(&self) -> Duration {
        Duration::from_millis(self.approach_settle_ms)
    }

    pub fn recall_settle(&self) -> Duration {
        Duration::from_millis(self.recall_settle_ms)
    }

    pub fn survey_settle(&self) -> Duration {
        Duration::from_millis(self.survey_settle_ms)
    }

    pub fn dismount_settle(&self) -> Duration {
        Duration::from_millis(self.dismount_settle_ms)
    }

    pub fn cycle_pause(&self) -> Duration {
        Duration::from_millis(self.cycle_pause_ms)
    }

    pub fn path_timeout(&self) -> Duration {
        Duration::from_secs(self.path_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierConfig {
    /// Whether a companion carrier is in use at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Known serial of the carrier. When unset (or stale) the nearest
    /// pack animal within `search_range` is adopted instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<Serial>,

    /// Body graphics recognized as pack animals during fallback search.
    #[serde(default = "default_pack_bodies")]
    pub pack_animal_bodies: Vec<GraphicId>,

    /// How far to look for the carrier, in tiles.
    #[serde(default = "default_search_range")]
    pub search_range: i32,

    /// Tile range at which items can be transferred.
    #[serde(default = "default_transfer_range")]
    pub transfer_range: i32,

    /// Assumed carrier pack capacity, in stones.
    #[serde(default = "default_carrier_capacity")]
    pub capacity: u32,

    /// Minimum estimated remaining capacity required to attempt an offload.
    #[serde(default = "default_required_capacity")]
    pub required_capacity: u32,

    /// Destination offsets around the carrier tried in order when the
    /// direct path fails.
    #[serde(default = "default_carrier_offsets")]
    pub approach_offsets: Vec<(i32, i32)>,

    /// How long to wait for the carrier to come to an immobile player,
    /// in seconds.
    #[serde(default = "default_follow_wait_secs")]
    pub follow_wait_secs: u64,
}

fn default_pack_bodies() -> Vec<GraphicId> {
    // Pack horse, pack llama, the beetle, and the common rideables.
    vec![
        0x0123, 0x0124, 0x0317, 0x0318, 0x0319, 0x031F, 0x0320, 0x0321, 0x0322, 0x0323, 0x00E2,
        0x00CC, 0x00E4,
    ]
}
fn default_search_range() -> i32 {
    15
}
fn default_transfer_range() -> i32 {
    2
}
fn default_carrier_capacity() -> u32 {
    400
}
fn default_required_capacity() -> u32 {
    10
}
fn default_carrier_offsets() -> Vec<(i32, i32)> {
    vec![
        (0, 1),
        (1, 0),
        (0, -1),
        (-1, 0),
        (1, 1),
        (1, -1),
        (-1, 1),
        (-1, -1),
    ]
}
fn default_follow_wait_secs() -> u64 {
    5
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            serial: None,
            pack_animal_bodies: default_pack_bodies(),
            search_range: default_search_range(),
            transfer_range: default_transfer_range(),
            capacity: default_carrier_capacity(),
            required_capacity: default_required_capacity(),
            approach_offsets: default_carrier_offsets(),
            follow_wait_secs: default_follow_wait_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelConfig {
    /// Serial of the runebook cycled through between areas. When unset,
    /// the session keeps rescanning the current area instead of recalling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runebook: Option<Serial>,

    /// First runebook slot used.
    #[serde(default = "default_first_slot")]
    pub first_slot: u8,

    /// Slot increment between recalls.
    #[serde(default = "default_slot_step")]
    pub slot_step: u8,

    /// Past this slot the cycle wraps back to `first_slot`.
    #[serde(default = "default_max_slot")]
    pub max_slot: u8,
}

fn default_first_slot() -> u8 {
    5
}
fn default_slot_step() -> u8 {
    6
}
fn default_max_slot() -> u8 {
    95
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            runebook: None,
            first_slot: default_first_slot(),
            slot_step: default_slot_step(),
            max_slot: default_max_slot(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    /// Whether to interrupt gathering for hostiles at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Name of the combat responder launched fire-and-forget.
    #[serde(default = "default_responder_script")]
    pub responder_script: String,

    /// Tile range scanned for hostiles.
    #[serde(default = "default_detect_range")]
    pub detect_range: i32,

    /// Re-launch the responder if the threat persists this long, in ms.
    #[serde(default = "default_retrigger_ms")]
    pub retrigger_ms: u64,

    /// Tile range searched for lootable corpses after combat.
    #[serde(default = "default_loot_range")]
    pub loot_range: i32,

    /// Corpse container graphic.
    #[serde(default = "default_corpse_graphic")]
    pub corpse_graphic: GraphicId,
}

fn default_responder_script() -> String {
    "pvm_AttackGrey.py".into()
}
fn default_detect_range() -> i32 {
    10
}
fn default_retrigger_ms() -> u64 {
    2500
}
fn default_loot_range() -> i32 {
    2
}
fn default_corpse_graphic() -> GraphicId {
    0x2006
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            responder_script: default_responder_script(),
            detect_range: default_detect_range(),
            retrigger_ms: default_retrigger_ms(),
            loot_range: default_loot_range(),
            corpse_graphic: default_corpse_graphic(),
        }
    }
}

impl CombatConfig {
    pub fn retrigger(&self) -> Duration {
        Duration::from_millis(self.retrigger_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Whether to raise events when unknown humanoids come into view.
    #[serde(default)]
    pub enabled: bool,

    /// Tile range watched for strangers.
    #[serde(default = "default_alert_range")]
    pub range: i32,
}

fn default_alert_range() -> i32 {
    18
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            range: default_alert_range(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    /// Whether the smelting helper fires at phase boundaries.
    #[serde(default = "default_true")]
    pub smelter_enabled: bool,

    /// Name of the smelting helper launched fire-and-forget.
    #[serde(default = "default_smelter_script")]
    pub smelter_script: String,

    /// The helper only fires when the carrier is within this many tiles.
    #[serde(default = "default_carrier_max_distance")]
    pub carrier_max_distance: i32,
}

fn default_smelter_script() -> String {
    "auto_smelter.py".into()
}
fn default_carrier_max_distance() -> i32 {
    18
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            smelter_enabled: true,
            smelter_script: default_smelter_script(),
            carrier_max_distance: default_carrier_max_distance(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// TCP port probed by default.
    #[serde(default = "default_probe_port")]
    pub port: u16,

    /// Connection timeout in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_probe_port() -> u16 {
    5200
}
fn default_probe_timeout_secs() -> u64 {
    3
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: default_probe_port(),
            timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.prospector/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Directory holding the config file.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".prospector")
    }

    /// Cross-field sanity checks, run on every successful load.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mining.scan_radius <= 0 {
            return Err(ConfigError::ValidationError(
                "mining.scan_radius must be positive".into(),
            ));
        }
        if self.mining.resource_statics.is_empty() {
            return Err(ConfigError::ValidationError(
                "mining.resource_statics must not be empty".into(),
            ));
        }
        if self.mining.tool_graphics.is_empty() {
            return Err(ConfigError::ValidationError(
                "mining.tool_graphics must not be empty".into(),
            ));
        }
        if self.mining.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "mining.max_attempts must be at least 1".into(),
            ));
        }
        if self.mining.blocked_streak_limit == 0 {
            return Err(ConfigError::ValidationError(
                "mining.blocked_streak_limit must be at least 1".into(),
            ));
        }
        if self.timing.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "timing.poll_interval_ms must be positive".into(),
            ));
        }
        if self.timing.poll_interval_ms > self.timing.outcome_timeout_ms {
            return Err(ConfigError::ValidationError(
                "timing.poll_interval_ms must not exceed timing.outcome_timeout_ms".into(),
            ));
        }
        if self.carrier.transfer_range < 1 {
            return Err(ConfigError::ValidationError(
                "carrier.transfer_range must be at least 1".into(),
            ));
        }
        if self.carrier.search_range < self.carrier.transfer_range {
            return Err(ConfigError::ValidationError(
                "carrier.search_range must not be below carrier.transfer_range".into(),
            ));
        }
        if self.carrier.required_capacity > self.carrier.capacity {
            return Err(ConfigError::ValidationError(
                "carrier.required_capacity must not exceed carrier.capacity".into(),
            ));
        }
        if self.travel.slot_step == 0 {
            return Err(ConfigError::ValidationError(
                "travel.slot_step must be positive".into(),
            ));
        }
        if self.travel.first_slot > self.travel.max_slot {
            return Err(ConfigError::ValidationError(
                "travel.first_slot must not exceed travel.max_slot".into(),
            ));
        }
        if self.probe.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "probe.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mining: MiningConfig::default(),
            timing: TimingConfig::default(),
            carrier: CarrierConfig::default(),
            travel: TravelConfig::default(),
            combat: CombatConfig::default(),
            alerts: AlertConfig::default(),
            hooks: HookConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
