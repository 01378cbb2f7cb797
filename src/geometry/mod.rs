//! Ring slice geometry
//!
//! Partial cylinders, BSP subtraction, and the per-section mesh stores the
//! animation writes into.

pub mod arena;
pub mod csg;
pub mod cylinder;
pub mod mesh_data;
pub mod ring;

pub use arena::{MeshArena, MeshHandle, MeshTarget, SlotStats, Slots};
pub use csg::{CsgVertex, Plane, Polygon, Solid};
pub use cylinder::PartialCylinder;
pub use mesh_data::{Bounds, MeshData, Vertex};
pub use ring::{build_ring, GeometryError, GeometryResult, RingBuilder, RingParams, Segments, MAX_SEGMENTS};
