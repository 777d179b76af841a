//! A deterministic in-memory game world for exercising Prospector.
//!
//! The simulator implements the full [`GameHost`] surface against plain
//! state: veins hold a fixed number of swings, walks teleport, rune slots
//! map to anchors, and helper scripts have scripted effects. Useful for
//! end-to-end session tests and for the `prospector simulate` command.
//!
//! [`GameHost`]: prospector_core::GameHost

pub mod host;
pub mod world;

pub use host::SimHost;
pub use world::{
    sim_session_config, SimWorld, INGOT_GRAPHIC, ORE_GRAPHIC, ORE_PER_SWING, ORE_WEIGHT_PER_SWING,
};
