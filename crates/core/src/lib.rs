//! # Prospector Core
//!
//! Domain types, traits, and error definitions for the Prospector gathering
//! controller. This crate owns the domain model that all other crates
//! implement against; it knows nothing about any concrete game host.
//!
//! ## Design Philosophy
//!
//! Every external capability is defined as a trait here. Implementations
//! live in their respective crates. This enables:
//! - Running the same controller against a live host or a simulation
//! - Easy testing with scripted host implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod hook;
pub mod host;
pub mod world;

// Re-export key types at crate root for ergonomics
pub use error::{Error, HookError, HostError, Result, SessionError};
pub use event::{EventBus, SessionEvent};
pub use hook::{SessionHook, SessionPhase};
pub use host::{
    GameHost, Hand, ItemSnapshot, MobileSnapshot, Notoriety, PathPolicy, PlayerStatus,
};
pub use world::{GraphicId, OreSpot, Position, ScanArea, Serial, SpotKey, StaticTile};
