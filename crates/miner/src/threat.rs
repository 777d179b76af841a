//! Combat interruption and stranger awareness.
//!
//! Mining halts the moment a hostile shows up in detection range. A
//! host-side responder script does the actual fighting; this module owns
//! the watch loop around it: re-triggering the responder when it stalls,
//! closing distance to hostiles that keep away, and looting resource
//! stacks off nearby corpses once the field is clear.

use chrono::Utc;
use prospector_core::{HostError, MobileSnapshot, Notoriety, PathPolicy, Position, SessionEvent};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::session::SessionContext;

/// Deal with any hostile in detection range, then resume.
///
/// Returns `Ok(true)` when combat actually happened, `Ok(false)` when the
/// area was already clear or combat handling is disabled. When `resume_at`
/// is set, walks back toward the interrupted destination after the fight.
pub(crate) async fn check_threats(
    ctx: &mut SessionContext,
    resume_at: Option<Position>,
) -> Result<bool, HostError> {
    if !ctx.config.combat.enabled {
        return Ok(false);
    }

    let Some(hostile) = nearest_hostile(ctx).await? else {
        return Ok(false);
    };

    info!(name = %hostile.name, serial = hostile.serial, "Hostile nearby, fighting it off");
    ctx.stats.combats += 1;
    ctx.publish(SessionEvent::CombatStarted {
        hostile: hostile.name.clone(),
        serial: hostile.serial,
        timestamp: Utc::now(),
    });

    fight_until_clear(ctx).await?;
    loot_corpses(ctx).await?;
    ctx.publish(SessionEvent::ThreatCleared {
        timestamp: Utc::now(),
    });

    if let Some(dest) = resume_at {
        let policy = PathPolicy {
            timeout: ctx.config.timing.path_timeout(),
            arrive_within: 1,
        };
        if let Err(e) = ctx.host.walk_to(dest, policy).await {
            warn!(error = %e, "Failed to walk back after combat");
        }
    }
    Ok(true)
}

async fn nearest_hostile(ctx: &SessionContext) -> Result<Option<MobileSnapshot>, HostError> {
    let status = ctx.host.player_status().await?;
    let mut best: Option<(i64, MobileSnapshot)> = None;
    for mobile in ctx
        .host
        .mobiles_in_range(ctx.config.combat.detect_range)
        .await?
    {
        if !mobile.notoriety.is_hostile() {
            continue;
        }
        let d = status.position.distance_sq(&mobile.position);
        if best.as_ref().is_none_or(|(bd, _)| d < *bd) {
            best = Some((d, mobile));
        }
    }
    Ok(best.map(|(_, m)| m))
}

/// Run the responder script and poll until no hostile remains.
///
/// The responder is re-triggered whenever it sits idle past the
/// configured window, and the player closes to melee range on hostiles
/// that hang back.
async fn fight_until_clear(ctx: &SessionContext) -> Result<(), HostError> {
    let script = ctx.config.combat.responder_script.clone();
    let retrigger = ctx.config.combat.retrigger();

    ctx.host.run_script(&script).await?;
    let mut last_trigger = Instant::now();

    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let Some(enemy) = nearest_hostile(ctx).await? else {
            debug!("No hostiles left in range");
            return Ok(());
        };

        let status = ctx.host.player_status().await?;
        if status.position.tile_range(&enemy.position) > 1 {
            // The responder only swings at melee range.
            let policy = PathPolicy {
                timeout: ctx.config.timing.path_timeout(),
                arrive_within: 1,
            };
            if let Err(e) = ctx.host.walk_to(enemy.position.offset(0, -1), policy).await {
                warn!(error = %e, "Failed to close on the hostile");
            }
        }

        if last_trigger.elapsed() >= retrigger {
            debug!(script = %script, "Responder idle too long, re-triggering");
            ctx.host.run_script(&script).await?;
            last_trigger = Instant::now();
        }
    }
}

/// Pull resource stacks out of corpse containers near the player.
/// Everything else stays on the corpse.
async fn loot_corpses(ctx: &mut SessionContext) -> Result<(), HostError> {
    let loot_range = ctx.config.combat.loot_range;
    let corpse_graphic = ctx.config.combat.corpse_graphic;
    let resources = ctx.config.mining.resource_graphics();
    let drag_delay = ctx.config.timing.drag_delay();

    let corpses = ctx.host.ground_items(loot_range, corpse_graphic).await?;
    if corpses.is_empty() {
        return Ok(());
    }

    let backpack = ctx.host.player_status().await?.backpack;
    for corpse in corpses {
        for item in ctx.host.container_items(corpse.serial).await? {
            if !resources.contains(&item.graphic) {
                continue;
            }
            debug!(serial = format_args!("{:#010x}", item.serial), "Looting a resource stack");
            if let Err(e) = ctx.host.move_item(item.serial, backpack, item.amount).await {
                warn!(error = %e, "Failed to loot stack");
                continue;
            }
            tokio::time::sleep(drag_delay).await;
        }
    }
    Ok(())
}

/// Announce unknown humanoids and invulnerable mobiles, once per serial.
///
/// Purely an awareness feature. Nothing is said or done in-world; the
/// sighting goes to the log and the event bus.
pub(crate) async fn stranger_watch(ctx: &mut SessionContext) -> Result<(), HostError> {
    if !ctx.config.alerts.enabled {
        return Ok(());
    }

    for mobile in ctx.host.mobiles_in_range(ctx.config.alerts.range).await? {
        if !(mobile.human || mobile.notoriety == Notoriety::Invulnerable) {
            continue;
        }
        if mobile.friendly {
            continue;
        }
        if !ctx.alerted.insert(mobile.serial) {
            continue;
        }
        warn!(name = %mobile.name, serial = mobile.serial, "Stranger sighted");
        ctx.stats.strangers_sighted += 1;
        ctx.publish(SessionEvent::StrangerSighted {
            name: mobile.name.clone(),
            serial: mobile.serial,
            timestamp: Utc::now(),
        });
    }
    Ok(())
}
