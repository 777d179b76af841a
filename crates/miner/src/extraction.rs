//! Per-spot extraction — the swing, poll, classify loop.
//!
//! Extraction outcomes never arrive as return values. The host accepts the
//! targeted use and the result lands in the journal some time later as one
//! of a handful of fixed phrases. `poll_outcome` turns that into a typed
//! outcome; `work_spot` drives the bounded attempt loop on top of it.

use chrono::Utc;
use prospector_config::TimingConfig;
use prospector_core::{
    GameHost, HostError, OreSpot, PathPolicy, Serial, SessionError, SessionEvent, SessionPhase,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::gear;
use crate::offload::{self, OffloadResult};
use crate::session::SessionContext;
use crate::threat;

// ── Journal phrases ──
//
// These are exact host strings. The success set matches by prefix because
// the tail names the resource pulled.

const DEPLETED_PHRASE: &str = "There is no metal here to mine.";
const MOUNTED_PHRASE: &str = "You can't dig while riding or flying.";
const TOOL_WORN_PHRASE: &str = "You have worn out your tool!";
const BLOCKED_PHRASES: [&str; 2] = ["You can not mine there.", "You have no line of sight"];
const SUCCESS_PHRASES: [&str; 4] = [
    "You loosen",
    "You dig some",
    "You receive",
    "You have received",
];
const SURVEY_PHRASE: &str = "You find traces of";

/// Classified result of a single extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// Resources were produced.
    Success,

    /// The spot has nothing left.
    Depleted,

    /// The wielded tool broke.
    ToolWorn,

    /// The spot cannot be worked from here (reach or line of sight).
    Blocked,

    /// The host refused because the player is mounted.
    Mounted,

    /// No recognizable phrase arrived before the deadline.
    TimedOut,
}

/// How a spot left the attempt loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotResolution {
    /// Exhausted, or outcome polling timed out (treated the same).
    Depleted,

    /// Too many blocked attempts in a row.
    Blocked,

    /// The attempt cap was hit without a terminal outcome.
    AttemptCap,

    /// Could not shed enough weight to keep going.
    Overloaded,

    /// The stop flag was raised mid-spot.
    Stopped,
}

/// Poll the journal until an outcome phrase shows up or the deadline passes.
///
/// Classification precedence matters when phrases overlap in one window: a
/// refusal or depletion beats a stale success line from the previous swing.
pub(crate) async fn poll_outcome(
    host: &dyn GameHost,
    timing: &TimingConfig,
) -> Result<ExtractionOutcome, HostError> {
    let deadline = Instant::now() + timing.outcome_timeout();

    loop {
        if host.journal_contains(MOUNTED_PHRASE).await? {
            return Ok(ExtractionOutcome::Mounted);
        }
        if host.journal_contains(DEPLETED_PHRASE).await? {
            return Ok(ExtractionOutcome::Depleted);
        }
        if host.journal_contains(TOOL_WORN_PHRASE).await? {
            return Ok(ExtractionOutcome::ToolWorn);
        }
        for phrase in BLOCKED_PHRASES {
            if host.journal_contains(phrase).await? {
                return Ok(ExtractionOutcome::Blocked);
            }
        }
        for phrase in SUCCESS_PHRASES {
            if host.journal_contains(phrase).await? {
                return Ok(ExtractionOutcome::Success);
            }
        }

        if Instant::now() >= deadline {
            return Ok(ExtractionOutcome::TimedOut);
        }
        tokio::time::sleep(timing.poll_interval()).await;
    }
}

/// Walk up to the spot, trying each approach offset in order.
///
/// Returns whether any destination was reached. Extraction proceeds either
/// way: an unworkable angle shows up as a blocked outcome and the streak
/// limit handles it.
pub(crate) async fn approach_spot(
    ctx: &mut SessionContext,
    spot: &OreSpot,
) -> Result<bool, HostError> {
    let status = ctx.host.player_status().await?;
    if status.position.tile_range(&spot.position) <= 1 {
        return Ok(true);
    }

    let offsets = ctx.config.mining.approach_offsets.clone();
    let policy = PathPolicy {
        timeout: ctx.config.timing.path_timeout(),
        arrive_within: 1,
    };

    for (i, (dx, dy)) in offsets.iter().enumerate() {
        threat::check_threats(ctx, None).await?;

        let dest = spot.position.offset(*dx, *dy);
        debug!(dest = %dest, attempt = i + 1, "Walking to spot");
        match ctx.host.walk_to(dest, policy).await {
            Ok(true) => {
                tokio::time::sleep(ctx.config.timing.approach_settle()).await;
                return Ok(true);
            }
            Ok(false) => continue,
            Err(e) => {
                warn!(dest = %dest, error = %e, "Pathing request failed, trying next offset");
                continue;
            }
        }
    }

    warn!(spot = %spot.position, "No approach offset reached the spot");
    Ok(false)
}

/// Survey the spot once before working it. Best-effort: a missing survey
/// tool is skipped, never fatal.
async fn survey_spot(ctx: &SessionContext, spot: &OreSpot) -> Result<(), HostError> {
    if !ctx.config.mining.prospecting {
        return Ok(());
    }
    let Some(tool) = gear::survey_tool(ctx.host.as_ref(), &ctx.config).await? else {
        debug!("No survey tool carried, skipping survey");
        return Ok(());
    };

    ctx.host.clear_journal().await?;
    ctx.host.targeted_use(tool.serial, spot.tile()).await?;
    tokio::time::sleep(ctx.config.timing.survey_settle()).await;

    if ctx.host.journal_contains(SURVEY_PHRASE).await? {
        info!(spot = %spot.position, "Survey shows a richer vein");
    }
    Ok(())
}

/// One swing: clear the journal, use the tool on the tile, classify.
async fn swing(
    ctx: &SessionContext,
    spot: &OreSpot,
    tool: Serial,
) -> Result<ExtractionOutcome, HostError> {
    ctx.host.clear_journal().await?;
    ctx.host.targeted_use(tool, spot.tile()).await?;
    tokio::time::sleep(ctx.config.timing.post_swing()).await;
    poll_outcome(ctx.host.as_ref(), &ctx.config.timing).await
}

/// Work one spot until it resolves.
///
/// Two counters bound the loop. `swings` counts every attempt at this spot
/// and drives the periodic offload trigger; `dry` counts consecutive
/// attempts that produced nothing and enforces the attempt cap. A yield
/// resets `dry` (and the blocked streak) because the spot is clearly still
/// paying out.
///
/// Cooldown placement: depletion and a blocked streak rest the spot; an
/// attempt cap or an unshakable overload abandons it without resting, so
/// the next scan may try it again under better conditions.
pub(crate) async fn work_spot(
    ctx: &mut SessionContext,
    spot: &OreSpot,
) -> Result<SpotResolution, SessionError> {
    let max_attempts = ctx.config.mining.max_attempts;
    let streak_limit = ctx.config.mining.blocked_streak_limit;
    let cooldown = ctx.config.mining.cooldown();
    let offload_every = ctx.config.mining.offload_every_attempts;

    survey_spot(ctx, spot).await?;

    let mut swings: u32 = 0;
    let mut dry: u32 = 0;
    let mut blocked_streak: u32 = 0;

    loop {
        if ctx.stopped() {
            return Ok(SpotResolution::Stopped);
        }

        threat::check_threats(ctx, Some(spot.position)).await?;

        let status = ctx.host.player_status().await?;
        let threshold = ctx.config.mining.offload_threshold(status.max_weight);
        let periodic = offload_every > 0 && swings > 0 && swings % offload_every == 0;

        if status.weight >= threshold || periodic {
            let result = offload::shed_weight(ctx).await?;
            if !matches!(result, OffloadResult::Completed { .. }) {
                let status = ctx.host.player_status().await?;
                let resume_below = status
                    .max_weight
                    .saturating_sub(ctx.config.mining.resume_margin);
                if status.weight >= resume_below {
                    warn!(
                        weight = status.weight,
                        max = status.max_weight,
                        "Too heavy to keep mining, abandoning spot"
                    );
                    ctx.stats.spots_abandoned += 1;
                    ctx.publish(SessionEvent::SpotAbandoned {
                        spot: spot.key(),
                        reason: "overloaded".into(),
                        timestamp: Utc::now(),
                    });
                    return Ok(SpotResolution::Overloaded);
                }
            }
            // The carrier trip moved us; get back on the spot.
            approach_spot(ctx, spot).await?;
        }

        if status.mounted {
            ctx.host.dismount().await?;
            tokio::time::sleep(ctx.config.timing.dismount_settle()).await;
        }

        let tool = gear::ensure_tool(ctx.host.as_ref(), &ctx.config).await?;
        let outcome = swing(ctx, spot, tool).await?;
        swings += 1;
        ctx.stats.attempts += 1;

        match outcome {
            ExtractionOutcome::Success => {
                dry = 0;
                blocked_streak = 0;
                ctx.stats.successes += 1;
                ctx.publish(SessionEvent::ResourceExtracted {
                    spot: spot.key(),
                    timestamp: Utc::now(),
                });
                debug!(spot = %spot.position, swing = swings, "Extraction yielded");
                tokio::time::sleep(ctx.config.timing.attempt_pause()).await;
            }
            ExtractionOutcome::Depleted | ExtractionOutcome::TimedOut => {
                if outcome == ExtractionOutcome::TimedOut {
                    ctx.stats.outcome_timeouts += 1;
                    debug!("No outcome phrase before the deadline, treating spot as exhausted");
                }
                ctx.cooldowns.place(spot.key(), cooldown);
                ctx.stats.spots_depleted += 1;
                ctx.publish(SessionEvent::SpotDepleted {
                    spot: spot.key(),
                    attempts: swings,
                    timestamp: Utc::now(),
                });
                info!(spot = %spot.position, swings, "Spot exhausted, resting it");
                ctx.run_hooks(SessionPhase::SpotDepleted).await;
                return Ok(SpotResolution::Depleted);
            }
            ExtractionOutcome::ToolWorn => {
                dry += 1;
                info!("Tool wore out, will swap in a spare");
            }
            ExtractionOutcome::Blocked => {
                dry += 1;
                blocked_streak += 1;
                if blocked_streak >= streak_limit {
                    ctx.cooldowns.place(spot.key(), cooldown);
                    ctx.stats.spots_abandoned += 1;
                    ctx.publish(SessionEvent::SpotAbandoned {
                        spot: spot.key(),
                        reason: "blocked".into(),
                        timestamp: Utc::now(),
                    });
                    warn!(
                        spot = %spot.position,
                        streak = blocked_streak,
                        "Spot not workable from here, resting it"
                    );
                    return Ok(SpotResolution::Blocked);
                }
            }
            ExtractionOutcome::Mounted => {
                dry += 1;
                ctx.host.dismount().await?;
                tokio::time::sleep(ctx.config.timing.dismount_settle()).await;
            }
        }

        if dry >= max_attempts {
            ctx.stats.spots_abandoned += 1;
            ctx.publish(SessionEvent::SpotAbandoned {
                spot: spot.key(),
                reason: "attempt cap".into(),
                timestamp: Utc::now(),
            });
            warn!(spot = %spot.position, swings, "Attempt cap reached, abandoning spot");
            return Ok(SpotResolution::AttemptCap);
        }
    }
}
