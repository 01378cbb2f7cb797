use super::csg::{CsgVertex, Polygon, Solid};
use glam::Vec3;
use std::f32::consts::TAU;

/// Sweeps at or above this are built as full revolutions without side walls.
const FULL_TURN_TOLERANCE: f32 = 1e-4;

/// A solid cylinder swept over part of a revolution, centered on the origin with
/// its axis along +Y.
///
/// Angles follow `x = r sin(theta)`, `z = r cos(theta)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialCylinder {
    pub radius: f32,
    pub height: f32,
    pub theta_start: f32,
    pub theta_length: f32,
    pub radial_segments: u32,
    pub height_segments: u32,
}

impl PartialCylinder {
    pub fn is_full_turn(&self) -> bool {
        self.theta_length >= TAU - FULL_TURN_TOLERANCE
    }

    fn point(&self, theta: f32, y: f32) -> Vec3 {
        Vec3::new(self.radius * theta.sin(), y, self.radius * theta.cos())
    }

    fn angle(&self, i: u32) -> f32 {
        self.theta_start + self.theta_length.min(TAU) * i as f32 / self.radial_segments as f32
    }

    pub fn to_solid(&self) -> Solid {
        let radial = self.radial_segments.max(1);
        let rows = self.height_segments.max(1);
        let cylinder = Self {
            radial_segments: radial,
            height_segments: rows,
            ..*self
        };

        let half = self.height / 2.0;
        let y_at = |row: u32| -half + self.height * row as f32 / rows as f32;
        let mut polygons = Vec::with_capacity(radial as usize * (rows as usize + 2) + 2);

        for i in 0..radial {
            let (ta, tb) = (cylinder.angle(i), cylinder.angle(i + 1));
            let (na, nb) = (Vec3::new(ta.sin(), 0.0, ta.cos()), Vec3::new(tb.sin(), 0.0, tb.cos()));

            for row in 0..rows {
                let (y0, y1) = (y_at(row), y_at(row + 1));
                polygons.extend(Polygon::new(vec![
                    CsgVertex::new(cylinder.point(ta, y0), na),
                    CsgVertex::new(cylinder.point(tb, y0), nb),
                    CsgVertex::new(cylinder.point(tb, y1), nb),
                    CsgVertex::new(cylinder.point(ta, y1), na),
                ]));
            }

            let top = Vec3::new(0.0, half, 0.0);
            polygons.extend(Polygon::new(vec![
                CsgVertex::new(top, Vec3::Y),
                CsgVertex::new(cylinder.point(ta, half), Vec3::Y),
                CsgVertex::new(cylinder.point(tb, half), Vec3::Y),
            ]));

            let bottom = Vec3::new(0.0, -half, 0.0);
            polygons.extend(Polygon::new(vec![
                CsgVertex::new(bottom, Vec3::NEG_Y),
                CsgVertex::new(cylinder.point(tb, -half), Vec3::NEG_Y),
                CsgVertex::new(cylinder.point(ta, -half), Vec3::NEG_Y),
            ]));
        }

        if !cylinder.is_full_turn() {
            let (start, end) = (cylinder.angle(0), cylinder.angle(radial));
            let start_normal = Vec3::new(-start.cos(), 0.0, start.sin());
            let end_normal = Vec3::new(end.cos(), 0.0, -end.sin());
            let (c0, c1) = (Vec3::new(0.0, -half, 0.0), Vec3::new(0.0, half, 0.0));

            polygons.extend(Polygon::new(vec![
                CsgVertex::new(c0, start_normal),
                CsgVertex::new(cylinder.point(start, -half), start_normal),
                CsgVertex::new(cylinder.point(start, half), start_normal),
                CsgVertex::new(c1, start_normal),
            ]));
            polygons.extend(Polygon::new(vec![
                CsgVertex::new(c0, end_normal),
                CsgVertex::new(c1, end_normal),
                CsgVertex::new(cylinder.point(end, half), end_normal),
                CsgVertex::new(cylinder.point(end, -half), end_normal),
            ]));
        }

        Solid::from_polygons(polygons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn wedge(theta_length: f32) -> PartialCylinder {
        PartialCylinder {
            radius: 2.0,
            height: 1.0,
            theta_start: 0.3,
            theta_length,
            radial_segments: 16,
            height_segments: 4,
        }
    }

    #[test]
    fn polygon_planes_agree_with_vertex_normals() {
        for solid in [wedge(PI / 3.0).to_solid(), wedge(1.5 * PI).to_solid()] {
            for polygon in solid.polygons() {
                let n = polygon.vertices[0].normal;
                assert!(polygon.plane.normal.dot(n) > 0.9, "inward face {:?}", polygon.plane);
            }
        }
    }

    #[test]
    fn half_turn_volume_matches_polygonal_area() {
        let mesh = wedge(PI).to_solid().to_mesh();
        // 16 triangles of apex angle pi/16 times the height.
        let expected = 16.0 * 0.5 * 4.0 * (PI / 16.0).sin();
        assert_relative_eq!(mesh.signed_volume(), expected, epsilon = 1e-3);
    }

    #[test]
    fn full_turn_has_no_walls() {
        let full = wedge(TAU).to_solid();
        let partial = wedge(PI).to_solid();
        assert_eq!(partial.polygons().len(), full.polygons().len() + 2);
    }
}
