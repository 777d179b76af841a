//! Error types for the Prospector domain.
//!
//! Each bounded context carries its own enum; the top-level `Error` folds
//! them together for callers that cross contexts.

use thiserror::Error;

use crate::world::Serial;

/// The top-level error type for all Prospector operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Host errors ---
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    // --- Session errors ---
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // --- Hook errors ---
    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias over the top-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures crossing the host API boundary.
///
/// These are transport-level: the call itself failed, as opposed to the
/// action succeeding with an unfavorable in-world outcome.
#[derive(Debug, Clone, Error)]
pub enum HostError {
    #[error("Host transport failed: {0}")]
    Transport(String),

    #[error("No such entity: {0:#010x}")]
    MissingEntity(Serial),

    #[error("Action rejected by host: {0}")]
    Rejected(String),

    #[error("Host call timed out: {0}")]
    Timeout(String),
}

/// Failures that end or refuse a gathering session.
///
/// Everything else the controller absorbs locally; only the variants here
/// halt the loop.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Skill {skill:?} at {actual:.1}, below required minimum {required:.1}")]
    SkillTooLow {
        skill: String,
        actual: f64,
        required: f64,
    },

    #[error("No usable extraction tool in hands or backpack")]
    NoUsableTool,

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

/// Failures raised by phase-boundary hooks.
///
/// The session logs and suppresses these; they never abort gathering.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Hook {name:?} failed: {reason}")]
    Failed { name: String, reason: String },

    #[error("Hook precondition not met: {0}")]
    Skipped(String),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}
