//! World-space value types — positions, scan windows, and resource spots.
//!
//! Spots carry no identity beyond their coordinates: two spots at the same
//! `(x, y)` are the same spot, regardless of when they were discovered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Graphic identifier of a static tile, item, or mobile body,
/// exactly as the host reports it.
pub type GraphicId = u16;

/// Unique object identifier assigned by the host.
pub type Serial = u32;

/// A world coordinate. `z` is the elevation the host reports for the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i8,
}

impl Position {
    pub fn new(x: i32, y: i32, z: i8) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance in the XY plane.
    ///
    /// Used as a sort key for candidate ordering; exact integer comparison,
    /// no float rounding at equal distances.
    pub fn distance_sq(&self, other: &Position) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Euclidean distance in the XY plane.
    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.distance_sq(other) as f64).sqrt()
    }

    /// Tile range (Chebyshev distance) — the host's notion of "within N tiles".
    pub fn tile_range(&self, other: &Position) -> i32 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx.max(dy)
    }

    /// This position shifted by `(dx, dy)`, keeping elevation.
    pub fn offset(&self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy, self.z)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Positional identity of a resource spot. Elevation is excluded:
/// the host reports one minable static per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpotKey {
    pub x: i32,
    pub y: i32,
}

impl From<Position> for SpotKey {
    fn from(p: Position) -> Self {
        SpotKey { x: p.x, y: p.y }
    }
}

impl fmt::Display for SpotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// A static tile as returned by a spatial scan, before any filtering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticTile {
    pub position: Position,
    pub graphic: GraphicId,
}

/// A resource-bearing location discovered by a scan.
///
/// Created fresh each scan cycle and discarded once exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OreSpot {
    pub position: Position,
    pub graphic: GraphicId,
}

impl OreSpot {
    pub fn key(&self) -> SpotKey {
        self.position.into()
    }

    pub fn tile(&self) -> StaticTile {
        StaticTile {
            position: self.position,
            graphic: self.graphic,
        }
    }
}

impl From<StaticTile> for OreSpot {
    fn from(t: StaticTile) -> Self {
        OreSpot {
            position: t.position,
            graphic: t.graphic,
        }
    }
}

/// Square scan window centered on a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanArea {
    pub center: Position,
    pub radius: i32,
}

impl ScanArea {
    pub fn new(center: Position, radius: i32) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, p: &Position) -> bool {
        (p.x - self.center.x).abs() <= self.radius && (p.y - self.center.y).abs() <= self.radius
    }
}
