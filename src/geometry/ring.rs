use super::cylinder::PartialCylinder;
use super::mesh_data::MeshData;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use thiserror::Error;

/// Smallest sweep or height that still produces a visible slice.
pub const MIN_EXTENT: f32 = 1e-4;

/// The cutter is grown by this fraction of the ring size along its height, and by
/// `CUTTER_ANGLE_PAD` radians at both ends of its sweep, so that no cutter face
/// coincides with a face of the outer cylinder.
const CUTTER_PAD: f32 = 1e-3;
const CUTTER_ANGLE_PAD: f32 = 1e-3;

pub type GeometryResult<T> = Result<T, GeometryError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("degenerate ring: {0}")]
    Degenerate(&'static str),

    #[error("subtraction left no surface")]
    EmptyResult,
}

pub const MAX_SEGMENTS: u32 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Segments {
    pub radial: u32,
    pub height: u32,
}

impl Default for Segments {
    fn default() -> Self {
        Self {
            radial: 16,
            height: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingParams {
    pub outer_radius: f32,
    pub inner_radius: f32,
    pub height: f32,
    pub theta_start: f32,
    pub theta_length: f32,
}

impl RingParams {
    fn validate(&self) -> GeometryResult<()> {
        let all_finite = [
            self.outer_radius,
            self.inner_radius,
            self.height,
            self.theta_start,
            self.theta_length,
        ]
        .iter()
        .all(|v| v.is_finite());

        if !all_finite {
            return Err(GeometryError::Degenerate("non-finite parameter"));
        }
        if self.theta_length < MIN_EXTENT {
            return Err(GeometryError::Degenerate("zero-length arc"));
        }
        if self.height < MIN_EXTENT {
            return Err(GeometryError::Degenerate("zero height"));
        }
        if self.inner_radius <= 0.0 || self.inner_radius >= self.outer_radius {
            return Err(GeometryError::Degenerate("inner radius not inside outer radius"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RingBuilder {
    segments: Segments,
}

impl RingBuilder {
    pub fn new(segments: Segments) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> Segments {
        self.segments
    }

    pub fn build(&self, params: RingParams) -> GeometryResult<MeshData> {
        params.validate()?;

        let sweep = params.theta_length.min(TAU);
        let outer = PartialCylinder {
            radius: params.outer_radius,
            height: params.height,
            theta_start: params.theta_start,
            theta_length: sweep,
            radial_segments: self.segments.radial,
            height_segments: self.segments.height,
        };

        let pad = CUTTER_PAD * params.height.max(params.outer_radius);
        let inner = PartialCylinder {
            radius: params.inner_radius,
            height: params.height + 2.0 * pad,
            theta_start: params.theta_start - CUTTER_ANGLE_PAD,
            theta_length: (sweep + 2.0 * CUTTER_ANGLE_PAD).min(TAU),
            radial_segments: self.segments.radial,
            height_segments: 1,
        };

        let slice = outer.to_solid().subtract(&inner.to_solid());
        if slice.is_empty() {
            return Err(GeometryError::EmptyResult);
        }

        Ok(slice.to_mesh())
    }
}

pub fn build_ring(
    outer_radius: f32,
    inner_radius: f32,
    height: f32,
    theta_start: f32,
    theta_length: f32,
) -> GeometryResult<MeshData> {
    RingBuilder::default().build(RingParams {
        outer_radius,
        inner_radius,
        height,
        theta_start,
        theta_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn radial(p: [f32; 3]) -> f32 {
        (p[0] * p[0] + p[2] * p[2]).sqrt()
    }

    #[test]
    fn half_ring_has_expected_extent() {
        let mesh = build_ring(2.0, 1.0, 1.0, 0.0, PI).unwrap();
        let bounds = mesh.bounds().unwrap();

        assert_relative_eq!(bounds.max.x, 2.0, epsilon = 1e-4);
        assert!(bounds.min.x > -1e-3, "slice crosses theta = 0: {bounds:?}");
        assert_relative_eq!(bounds.min.z, -2.0, epsilon = 1e-4);
        assert_relative_eq!(bounds.max.z, 2.0, epsilon = 1e-4);
        assert_relative_eq!(bounds.min.y, -0.5, epsilon = 1e-4);
        assert_relative_eq!(bounds.max.y, 0.5, epsilon = 1e-4);

        let radii: Vec<f32> = mesh.vertices.iter().map(|v| radial(v.position)).collect();
        let max = radii.iter().cloned().fold(f32::MIN, f32::max);
        let min = radii.iter().cloned().fold(f32::MAX, f32::min);
        assert_relative_eq!(max, 2.0, epsilon = 1e-4);
        assert!(min > 0.99 && min <= 1.0 + 1e-4, "hollow core radius {min}");
    }

    #[test]
    fn half_ring_volume_close_to_annulus() {
        let mesh = build_ring(2.0, 1.0, 1.0, 0.0, PI).unwrap();
        let ideal = 0.5 * PI * (4.0 - 1.0);
        let volume = mesh.signed_volume();
        assert!((volume - ideal).abs() / ideal < 0.02, "volume {volume} vs {ideal}");
    }

    #[test]
    fn rebuild_is_idempotent() {
        let a = build_ring(2.0, 1.0, 0.7, 0.4, 1.3).unwrap();
        let b = build_ring(2.0, 1.0, 0.7, 0.4, 1.3).unwrap();
        assert_eq!(a.vertex_count(), b.vertex_count());
        assert_eq!(a.bounds(), b.bounds());
    }

    #[test]
    fn degenerate_inputs_are_reported() {
        assert_eq!(
            build_ring(2.0, 1.0, 1.0, 0.0, 0.0),
            Err(GeometryError::Degenerate("zero-length arc"))
        );
        assert_eq!(
            build_ring(2.0, 1.0, 0.0, 0.0, 1.0),
            Err(GeometryError::Degenerate("zero height"))
        );
        assert!(build_ring(1.0, 2.0, 1.0, 0.0, 1.0).is_err());
        assert!(build_ring(2.0, 1.0, f32::NAN, 0.0, 1.0).is_err());
        assert!(build_ring(2.0, 1.0, 1.0, 0.0, -0.5).is_err());
    }

    #[test]
    fn full_turn_is_a_closed_annulus() {
        let mesh = build_ring(2.0, 1.0, 1.0, 0.0, TAU).unwrap();
        let volume = mesh.signed_volume();
        let ideal = PI * 3.0;
        assert!((volume - ideal).abs() / ideal < 0.03, "volume {volume} vs {ideal}");
    }

    #[test]
    fn coarser_segments_produce_fewer_vertices() {
        let params = RingParams {
            outer_radius: 2.0,
            inner_radius: 1.0,
            height: 1.0,
            theta_start: 0.0,
            theta_length: 1.0,
        };
        let fine = RingBuilder::default().build(params).unwrap();
        let coarse = RingBuilder::new(Segments { radial: 4, height: 2 }).build(params).unwrap();
        assert!(coarse.vertex_count() < fine.vertex_count());
    }
}
