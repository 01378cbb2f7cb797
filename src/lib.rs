//! # donut3d
//!
//! Animated 3D donut charts. Each section is a hollow ring slice carved by CSG
//! subtraction and rebuilt every frame while a damped spring drives its sweep or
//! height toward the final value.
//!
//! ## Features
//! - Spring integrator with per-frame or delta-time stepping
//! - BSP based CSG for partial-cylinder ring slices
//! - Staggered section entrances with cancellable scheduling
//! - WebGPU rendering with an egui label overlay
//!
//! ## Example
//! ```rust,ignore
//! use donut3d::chart::{ChartSpec, DonutChart};
//! use donut3d::geometry::MeshArena;
//! use std::time::Duration;
//!
//! let mut chart = DonutChart::new(ChartSpec::demo())?;
//! let mut meshes = MeshArena::new();
//! chart.mount(Duration::ZERO);
//!
//! let mut now = Duration::ZERO;
//! while !chart.is_settled() {
//!     now += Duration::from_millis(16);
//!     chart.tick(now, &mut meshes);
//! }
//! println!("{} meshes installed", meshes.live());
//! ```

pub mod chart;
pub mod dynamics;
pub mod geometry;
pub mod math;
pub mod render;

pub use chart::{AnimationKind, ChartConfig, ChartError, ChartSpec, DonutChart, SectionSpec, SectionState};
pub use dynamics::{IntegrationMode, Spring, SpringConfig, SpringPreset};
pub use geometry::{build_ring, GeometryError, MeshArena, MeshData, MeshTarget, RingBuilder, RingParams};
pub use math::Transform;
