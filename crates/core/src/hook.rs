//! Session hooks — helper behaviors invoked at phase boundaries.
//!
//! Helpers are not poked from inside the polling loops; the controller
//! calls out at a fixed set of boundaries and the helper lives behind
//! this trait. Hook failures are logged by the caller and never abort
//! the session.

use async_trait::async_trait;

use crate::error::HookError;
use crate::host::GameHost;

/// Phase boundaries at which hooks fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Preconditions passed, gathering is about to begin.
    SessionStart,

    /// A spot was exhausted and put on cooldown.
    SpotDepleted,

    /// An offload to the carrier finished.
    OffloadComplete,

    /// The session is ending (stop signal or fatal error already decided).
    SessionEnd,
}

/// A helper behavior attached to the gathering session.
#[async_trait]
pub trait SessionHook: Send + Sync {
    /// A short identifier used in logs.
    fn name(&self) -> &str;

    /// Called at each phase boundary. Implementations decide which phases
    /// they care about and return `Ok(())` for the rest.
    async fn on_phase(&self, phase: SessionPhase, host: &dyn GameHost) -> Result<(), HookError>;
}
