//! The gathering session — preconditions, the travel cycle, and the
//! per-area work loop.
//!
//! A session runs until its stop handle flips, an optional cycle limit is
//! reached, or a fatal condition ends it (skill below minimum, no usable
//! tool left anywhere). Everything else is survivable and the loop moves
//! on: a failed recall keeps working the current area, a failed scan waits
//! out a pause, and a host error at one spot skips to the next.

use chrono::Utc;
use prospector_config::AppConfig;
use prospector_core::{
    EventBus, GameHost, HostError, HookError, OreSpot, ScanArea, Serial, SessionError,
    SessionEvent, SessionHook, SessionPhase,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cooldown::CooldownLedger;
use crate::discovery::CandidateSet;
use crate::extraction::{self, SpotResolution};
use crate::gear;
use crate::stats::{EndReason, SessionStats, SessionSummary};
use crate::threat;
use crate::travel::{self, RuneCycle};

/// Mutable session state threaded through every operation.
pub(crate) struct SessionContext {
    pub(crate) host: Arc<dyn GameHost>,
    pub(crate) config: AppConfig,
    pub(crate) events: Arc<EventBus>,
    pub(crate) hooks: Vec<Arc<dyn SessionHook>>,
    pub(crate) stop: Arc<AtomicBool>,
    pub(crate) cooldowns: CooldownLedger,
    /// Adopted carrier, pinned for the rest of the session once found.
    pub(crate) carrier: Option<Serial>,
    /// Serials already announced by the stranger watch.
    pub(crate) alerted: HashSet<Serial>,
    pub(crate) stats: SessionStats,
    pub(crate) session_id: String,
}

impl SessionContext {
    pub(crate) fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub(crate) fn publish(&self, event: SessionEvent) {
        self.events.publish(event);
    }

    /// Run every hook registered for a phase. Hook failures are logged
    /// and swallowed; helpers never take the session down.
    pub(crate) async fn run_hooks(&self, phase: SessionPhase) {
        for hook in &self.hooks {
            match hook.on_phase(phase, self.host.as_ref()).await {
                Ok(()) => {}
                Err(HookError::Skipped(reason)) => {
                    debug!(hook = hook.name(), reason = %reason, "Hook skipped");
                }
                Err(e) => {
                    warn!(hook = hook.name(), error = %e, "Hook failed");
                }
            }
        }
    }
}

/// A configured gathering session, ready to run.
pub struct GatheringSession {
    ctx: SessionContext,
    cycle: RuneCycle,
    max_cycles: Option<u64>,
}

impl GatheringSession {
    pub fn new(host: Arc<dyn GameHost>, config: AppConfig, events: Arc<EventBus>) -> Self {
        let cycle = RuneCycle::new(&config.travel);
        let carrier = config.carrier.serial;
        Self {
            ctx: SessionContext {
                host,
                config,
                events,
                hooks: Vec::new(),
                stop: Arc::new(AtomicBool::new(false)),
                cooldowns: CooldownLedger::new(),
                carrier,
                alerted: HashSet::new(),
                stats: SessionStats::default(),
                session_id: Uuid::new_v4().to_string(),
            },
            cycle,
            max_cycles: None,
        }
    }

    /// Register a phase hook.
    pub fn with_hook(mut self, hook: Arc<dyn SessionHook>) -> Self {
        self.ctx.hooks.push(hook);
        self
    }

    /// Cap the number of travel cycles, then end cleanly.
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    /// Handle that stops the session at its next yield point.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.ctx.stop.clone()
    }

    /// Run the session to completion.
    pub async fn run(mut self) -> Result<SessionSummary, SessionError> {
        let started_at = Utc::now();
        info!(session_id = %self.ctx.session_id, "Starting gathering session");

        self.check_preconditions().await?;

        self.ctx.publish(SessionEvent::SessionStarted {
            session_id: self.ctx.session_id.clone(),
            timestamp: Utc::now(),
        });
        self.ctx.run_hooks(SessionPhase::SessionStart).await;

        let outcome = self.gather().await;

        // End hooks and the end event fire even on a fatal error, so
        // observers always see the session close.
        self.ctx.run_hooks(SessionPhase::SessionEnd).await;
        self.ctx.publish(SessionEvent::SessionEnded {
            session_id: self.ctx.session_id.clone(),
            spots_mined: self.ctx.stats.spots_depleted,
            timestamp: Utc::now(),
        });

        let end_reason = outcome?;
        let summary = SessionSummary {
            session_id: self.ctx.session_id.clone(),
            started_at,
            ended_at: Utc::now(),
            end_reason,
            stats: self.ctx.stats.clone(),
        };
        info!(
            session_id = %summary.session_id,
            spots = summary.stats.spots_depleted,
            ore = summary.stats.successes,
            "Gathering session ended"
        );
        Ok(summary)
    }

    /// Fatal-before-start checks: skill floor and a usable tool.
    async fn check_preconditions(&mut self) -> Result<(), SessionError> {
        let skill = self.ctx.config.mining.skill_name.clone();
        let required = self.ctx.config.mining.skill_minimum;
        let actual = self.ctx.host.skill_value(&skill).await?;
        if actual < required {
            return Err(SessionError::SkillTooLow {
                skill,
                actual,
                required,
            });
        }
        gear::ensure_tool(self.ctx.host.as_ref(), &self.ctx.config).await?;
        Ok(())
    }

    async fn gather(&mut self) -> Result<EndReason, SessionError> {
        let mut cycles: u64 = 0;

        loop {
            if self.ctx.stopped() {
                return Ok(EndReason::Stopped);
            }
            if let Some(max) = self.max_cycles
                && cycles >= max
            {
                info!(cycles, "Cycle limit reached");
                return Ok(EndReason::CycleLimit);
            }
            cycles += 1;

            // Travel first, so each cycle scans fresh ground while the
            // previous area rests.
            match travel::recall_next(self.ctx.host.as_ref(), &self.ctx.config, &mut self.cycle)
                .await
            {
                Ok(true) => {
                    self.ctx.stats.recalls += 1;
                    // Recall can leave the tool unequipped.
                    gear::ensure_tool(self.ctx.host.as_ref(), &self.ctx.config).await?;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(error = %e, "Recall failed, staying in the current area");
                }
            }

            let mut candidates = match self.scan().await {
                Ok(set) => set,
                Err(e) => {
                    warn!(error = %e, "Discovery scan failed");
                    tokio::time::sleep(self.ctx.config.timing.cycle_pause()).await;
                    continue;
                }
            };
            if candidates.is_empty() {
                debug!("Nothing workable in this area right now");
            }

            loop {
                if self.ctx.stopped() {
                    return Ok(EndReason::Stopped);
                }

                let at = match self.ctx.host.player_status().await {
                    Ok(status) => status.position,
                    Err(e) => {
                        warn!(error = %e, "Lost player status, abandoning the area");
                        break;
                    }
                };
                let Some(spot) = candidates.pull_nearest(at) else {
                    break;
                };

                if let Err(e) = threat::stranger_watch(&mut self.ctx).await {
                    warn!(error = %e, "Stranger sweep failed");
                }

                match self.work_one(&spot).await {
                    Ok(SpotResolution::Stopped) => return Ok(EndReason::Stopped),
                    Ok(_) => {}
                    Err(fatal @ (SessionError::SkillTooLow { .. } | SessionError::NoUsableTool)) => {
                        return Err(fatal);
                    }
                    Err(SessionError::Host(e)) => {
                        warn!(spot = %spot.position, error = %e, "Host failure at spot, moving on");
                    }
                }

                // Spots rested while we worked drop out of the queue.
                candidates.prune_cooling(&self.ctx.cooldowns);
            }

            tokio::time::sleep(self.ctx.config.timing.cycle_pause()).await;
        }
    }

    async fn work_one(&mut self, spot: &OreSpot) -> Result<SpotResolution, SessionError> {
        if let Err(e) = threat::check_threats(&mut self.ctx, None).await {
            warn!(error = %e, "Threat sweep failed");
        }
        match extraction::approach_spot(&mut self.ctx, spot).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(spot = %spot.position, "Could not close in, working from here")
            }
            Err(e) => warn!(error = %e, "Approach failed, working from here"),
        }
        extraction::work_spot(&mut self.ctx, spot).await
    }

    async fn scan(&mut self) -> Result<CandidateSet, HostError> {
        let status = self.ctx.host.player_status().await?;
        let area = ScanArea::new(status.position, self.ctx.config.mining.scan_radius);
        let tiles = self.ctx.host.scan_statics(area).await?;

        let set = CandidateSet::from_scan(tiles, &self.ctx.config.mining, &self.ctx.cooldowns);
        self.ctx.stats.areas_scanned += 1;
        info!(
            candidates = set.len(),
            resting = set.skipped_cooling(),
            "Discovery scan complete"
        );
        self.ctx.publish(SessionEvent::AreaScanned {
            candidates: set.len(),
            on_cooldown: set.skipped_cooling(),
            timestamp: Utc::now(),
        });
        Ok(set)
    }
}
