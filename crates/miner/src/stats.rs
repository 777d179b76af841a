//! Session counters and the end-of-run summary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Counters accumulated over one gathering session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    /// Extraction swings issued.
    pub attempts: u64,

    /// Swings that yielded resources.
    pub successes: u64,

    /// Spots exhausted (journal depletion or outcome timeout).
    pub spots_depleted: u64,

    /// Spots given up on before exhaustion.
    pub spots_abandoned: u64,

    /// Completed carrier offloads.
    pub offloads: u64,

    /// Item stacks handed to the carrier.
    pub stacks_offloaded: u64,

    /// Resource stacks dropped on the ground under critical load.
    pub ground_drops: u64,

    /// Hostile encounters fought off.
    pub combats: u64,

    /// Unknown players or invulnerable mobiles announced.
    pub strangers_sighted: u64,

    /// Outcome polls that expired without a recognizable phrase.
    pub outcome_timeouts: u64,

    /// Discovery scans performed.
    pub areas_scanned: u64,

    /// Recall jumps taken.
    pub recalls: u64,
}

/// What ended the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The stop flag was raised.
    Stopped,

    /// The configured cycle limit was reached.
    CycleLimit,
}

/// Returned when a session ends without a fatal error.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub end_reason: EndReason,
    pub stats: SessionStats,
}

impl SessionSummary {
    /// Wall-clock session length in whole seconds.
    pub fn elapsed_secs(&self) -> i64 {
        (self.ended_at - self.started_at).num_seconds()
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        writeln!(
            f,
            "session {} ended after {}s ({})",
            self.session_id,
            self.elapsed_secs(),
            match self.end_reason {
                EndReason::Stopped => "stopped",
                EndReason::CycleLimit => "cycle limit",
            }
        )?;
        writeln!(
            f,
            "  spots: {} depleted, {} abandoned ({} scans, {} recalls)",
            s.spots_depleted, s.spots_abandoned, s.areas_scanned, s.recalls
        )?;
        writeln!(
            f,
            "  swings: {} ({} yielded, {} timed out)",
            s.attempts, s.successes, s.outcome_timeouts
        )?;
        writeln!(
            f,
            "  offloads: {} ({} stacks), ground drops: {}",
            s.offloads, s.stacks_offloaded, s.ground_drops
        )?;
        write!(
            f,
            "  combats: {}, strangers sighted: {}",
            s.combats, s.strangers_sighted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_display_covers_counters() {
        let started = Utc::now();
        let summary = SessionSummary {
            session_id: "4cbd2f0a".into(),
            started_at: started,
            ended_at: started + chrono::Duration::seconds(90),
            end_reason: EndReason::CycleLimit,
            stats: SessionStats {
                attempts: 42,
                successes: 37,
                spots_depleted: 5,
                spots_abandoned: 1,
                offloads: 2,
                stacks_offloaded: 11,
                ..SessionStats::default()
            },
        };

        let text = summary.to_string();
        assert!(text.contains("4cbd2f0a"));
        assert!(text.contains("90s"));
        assert!(text.contains("cycle limit"));
        assert!(text.contains("5 depleted, 1 abandoned"));
        assert!(text.contains("42 (37 yielded"));
    }

    #[test]
    fn summary_serializes_to_json() {
        let now = Utc::now();
        let summary = SessionSummary {
            session_id: "a1".into(),
            started_at: now,
            ended_at: now,
            end_reason: EndReason::Stopped,
            stats: SessionStats::default(),
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"end_reason\":\"stopped\""));
        assert!(json.contains("\"spots_depleted\":0"));
    }
}
