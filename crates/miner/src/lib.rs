//! Prospector's gathering loop controller.
//!
//! This crate drives a full gathering session against a [`GameHost`]:
//! scan the area for workable spots, walk to the nearest one, swing until
//! it gives out, hand the ore to the carrier, recall to the next rune,
//! and start over. Combat, strangers, worn tools, and overloads are
//! handled in-loop; phase hooks let helper scripts ride along.
//!
//! [`GameHost`]: prospector_core::GameHost

pub mod cooldown;
pub mod discovery;
pub mod extraction;
pub mod gear;
pub mod hooks;
pub mod offload;
pub mod session;
pub mod stats;
pub mod threat;
pub mod travel;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use extraction::{ExtractionOutcome, SpotResolution};
pub use hooks::ScriptHook;
pub use session::GatheringSession;
pub use stats::{EndReason, SessionStats, SessionSummary};
pub use travel::RuneCycle;
