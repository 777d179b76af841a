//! Carrier offload — locating the pack animal and handing cargo over.
//!
//! The carrier is a companion creature with its own pack. Offloading walks
//! up to it (or calls it over when the player is too heavy to walk), checks
//! its remaining capacity, and moves resource stacks across one drag at a
//! time. Every failure mode here is survivable: the caller decides whether
//! gathering can continue at the current weight.

use chrono::Utc;
use prospector_core::{
    HostError, ItemSnapshot, MobileSnapshot, PathPolicy, Serial, SessionEvent, SessionPhase,
};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::session::SessionContext;

/// How an offload attempt resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OffloadResult {
    /// Cargo moved over (the count may be zero when the pack held none).
    Completed { stacks_moved: usize },

    /// No carrier enabled, configured, or found in range.
    NoCarrier,

    /// The carrier's pack cannot take the required minimum.
    CarrierFull,

    /// The carrier exists but could not be brought into transfer range.
    Unreachable,
}

/// Shed carried weight: ground-drop under critical load, then offload to
/// the carrier.
///
/// The ground drop comes first: an overloaded player cannot start the
/// walk at all.
pub(crate) async fn shed_weight(ctx: &mut SessionContext) -> Result<OffloadResult, HostError> {
    let status = ctx.host.player_status().await?;
    let critical = status
        .max_weight
        .saturating_sub(ctx.config.mining.critical_margin);
    if status.weight >= critical {
        drop_resource_stack(ctx).await?;
    }

    if !ctx.config.carrier.enabled {
        debug!("No carrier in use");
        return Ok(OffloadResult::NoCarrier);
    }

    let Some(carrier) = locate_carrier(ctx).await? else {
        warn!("No carrier within search range");
        ctx.publish(SessionEvent::CarrierUnreachable {
            reason: "not found".into(),
            timestamp: Utc::now(),
        });
        return Ok(OffloadResult::NoCarrier);
    };

    let required = ctx.config.carrier.required_capacity as i64;
    let remaining = remaining_capacity(ctx, carrier.serial).await?;
    if remaining < required {
        warn!(remaining, required, "Carrier pack too full to take more");
        ctx.publish(SessionEvent::CarrierUnreachable {
            reason: "pack full".into(),
            timestamp: Utc::now(),
        });
        return Ok(OffloadResult::CarrierFull);
    }

    if !approach_carrier(ctx, &carrier).await? {
        warn!(serial = carrier.serial, "Could not reach the carrier");
        ctx.publish(SessionEvent::CarrierUnreachable {
            reason: "unreachable".into(),
            timestamp: Utc::now(),
        });
        return Ok(OffloadResult::Unreachable);
    }

    let stacks_moved = transfer_cargo(ctx, carrier.serial).await?;
    ctx.stats.offloads += 1;
    ctx.stats.stacks_offloaded += stacks_moved as u64;
    ctx.publish(SessionEvent::OffloadCompleted {
        items_moved: stacks_moved,
        timestamp: Utc::now(),
    });
    info!(stacks_moved, "Offload complete");
    ctx.run_hooks(SessionPhase::OffloadComplete).await;

    Ok(OffloadResult::Completed { stacks_moved })
}

/// Drop one resource stack at the player's feet.
async fn drop_resource_stack(ctx: &mut SessionContext) -> Result<(), HostError> {
    let resource_graphics = ctx.config.mining.resource_graphics();
    let status = ctx.host.player_status().await?;
    let pack = ctx.host.container_items(status.backpack).await?;

    let Some(stack) = pack
        .iter()
        .find(|i| resource_graphics.contains(&i.graphic))
    else {
        debug!("Critically heavy but nothing droppable in the pack");
        return Ok(());
    };

    warn!(
        serial = stack.serial,
        weight = stack.weight,
        "Critically heavy, dropping a stack where we stand"
    );
    ctx.host.drop_at_feet(stack.serial, stack.amount).await?;
    ctx.stats.ground_drops += 1;
    tokio::time::sleep(ctx.config.timing.drag_delay()).await;
    Ok(())
}

/// Find the carrier: the stored serial when it is still in range, otherwise
/// the nearest pack-animal body, which is then adopted for next time.
async fn locate_carrier(ctx: &mut SessionContext) -> Result<Option<MobileSnapshot>, HostError> {
    let search_range = ctx.config.carrier.search_range;
    let status = ctx.host.player_status().await?;

    if let Some(serial) = ctx.carrier.or(ctx.config.carrier.serial)
        && let Some(m) = ctx.host.find_mobile(serial).await?
        && status.position.tile_range(&m.position) <= search_range
    {
        return Ok(Some(m));
    }

    let bodies = &ctx.config.carrier.pack_animal_bodies;
    let mut best: Option<(i64, MobileSnapshot)> = None;
    for m in ctx.host.mobiles_in_range(search_range).await? {
        if !bodies.contains(&m.body) {
            continue;
        }
        let d = status.position.distance_sq(&m.position);
        if best.as_ref().is_none_or(|(bd, _)| d < *bd) {
            best = Some((d, m));
        }
    }

    match best {
        Some((_, m)) => {
            debug!(serial = m.serial, "Adopted nearby carrier");
            ctx.carrier = Some(m.serial);
            Ok(Some(m))
        }
        None => Ok(None),
    }
}

/// Weight the carrier's pack can still take, in stones. Negative when the
/// host reports more load than the configured capacity.
async fn remaining_capacity(ctx: &SessionContext, carrier: Serial) -> Result<i64, HostError> {
    let load: i64 = ctx
        .host
        .container_items(carrier)
        .await?
        .iter()
        .map(|i| i.weight as i64)
        .sum();
    Ok(ctx.config.carrier.capacity as i64 - load)
}

/// Get within transfer range of the carrier.
///
/// An overloaded player cannot walk, so the carrier is ordered to follow
/// and given a few seconds to close the gap first. After that: direct
/// path, then a ring of offsets around the carrier's tile.
async fn approach_carrier(
    ctx: &SessionContext,
    carrier: &MobileSnapshot,
) -> Result<bool, HostError> {
    let transfer_range = ctx.config.carrier.transfer_range;
    let status = ctx.host.player_status().await?;
    if status.position.tile_range(&carrier.position) <= transfer_range {
        return Ok(true);
    }

    if status.mounted {
        ctx.host.dismount().await?;
        tokio::time::sleep(ctx.config.timing.dismount_settle()).await;
    }

    if status.overloaded() {
        debug!("Too heavy to walk, calling the carrier over");
        ctx.host.command_follow(carrier.serial).await?;
        for _ in 0..ctx.config.carrier.follow_wait_secs {
            tokio::time::sleep(Duration::from_secs(1)).await;
            if let Some(m) = ctx.host.find_mobile(carrier.serial).await? {
                let status = ctx.host.player_status().await?;
                if status.position.tile_range(&m.position) <= transfer_range {
                    return Ok(true);
                }
            }
        }
        // Fall through and try walking anyway; a few stones over the limit
        // sometimes still shuffles.
    }

    let mut dests = vec![carrier.position];
    for (dx, dy) in &ctx.config.carrier.approach_offsets {
        dests.push(carrier.position.offset(*dx, *dy));
    }

    let policy = PathPolicy {
        timeout: ctx.config.timing.path_timeout(),
        arrive_within: 1,
    };

    for (i, dest) in dests.iter().enumerate() {
        match ctx.host.walk_to(*dest, policy).await {
            Ok(true) => {
                tokio::time::sleep(ctx.config.timing.approach_settle()).await;
                // The carrier may have wandered while we walked.
                let status = ctx.host.player_status().await?;
                if let Some(m) = ctx.host.find_mobile(carrier.serial).await?
                    && status.position.tile_range(&m.position) <= transfer_range
                {
                    return Ok(true);
                }
            }
            Ok(false) => {
                debug!(dest = %dest, attempt = i + 1, "Carrier approach fell short");
            }
            Err(e) => {
                warn!(dest = %dest, error = %e, "Carrier approach failed, trying next");
            }
        }
    }
    Ok(false)
}

/// Move resource stacks from the backpack into the carrier's pack, skipping
/// any stack heavier than the capacity left.
async fn transfer_cargo(ctx: &SessionContext, carrier: Serial) -> Result<usize, HostError> {
    let resource_graphics = ctx.config.mining.resource_graphics();
    let drag_delay = ctx.config.timing.drag_delay();

    let status = ctx.host.player_status().await?;
    let cargo: Vec<ItemSnapshot> = ctx
        .host
        .container_items(status.backpack)
        .await?
        .into_iter()
        .filter(|i| resource_graphics.contains(&i.graphic))
        .collect();

    let mut remaining = remaining_capacity(ctx, carrier).await?;
    let mut moved = 0;
    for item in cargo {
        if (item.weight as i64) > remaining {
            debug!(
                serial = item.serial,
                weight = item.weight,
                remaining,
                "Stack exceeds capacity left, keeping it"
            );
            continue;
        }
        match ctx.host.move_item(item.serial, carrier, item.amount).await {
            Ok(()) => {
                moved += 1;
                remaining -= item.weight as i64;
            }
            Err(e) => warn!(serial = item.serial, error = %e, "Failed to move stack"),
        }
        tokio::time::sleep(drag_delay).await;
    }

    let leftover = ctx
        .host
        .container_items(status.backpack)
        .await?
        .iter()
        .filter(|i| resource_graphics.contains(&i.graphic))
        .count();
    if leftover > 0 {
        debug!(leftover, "Stacks left in the pack after transfer");
    }

    Ok(moved)
}
