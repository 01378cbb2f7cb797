//! BSP-tree constructive solid geometry over convex planar polygons.
//!
//! Solids are polygon soups with outward winding. Boolean operations build a BSP
//! tree per operand and clip each operand's polygons against the other tree.

use super::mesh_data::{MeshData, Vertex};
use glam::Vec3;

/// Thickness of a plane when classifying points against it.
const PLANE_EPSILON: f32 = 1e-5;

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsgVertex {
    pub pos: Vec3,
    pub normal: Vec3,
}

impl CsgVertex {
    pub fn new(pos: Vec3, normal: Vec3) -> Self {
        Self { pos, normal }
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
    }

    fn interpolate(&self, other: &Self, t: f32) -> Self {
        Self {
            pos: self.pos.lerp(other.pos, t),
            normal: self.normal.lerp(other.normal, t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub w: f32,
}

impl Plane {
    /// Plane through three points, `None` when they are collinear.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Option<Self> {
        let n = (b - a).cross(c - a);
        if !n.is_finite() || n.length_squared() < 1e-14 {
            return None;
        }
        let normal = n.normalize();
        Some(Self {
            normal,
            w: normal.dot(a),
        })
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn classify(&self, point: Vec3) -> u8 {
        let t = self.normal.dot(point) - self.w;
        if t < -PLANE_EPSILON {
            BACK
        } else if t > PLANE_EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }

    fn split_polygon(&self, polygon: &Polygon, out: &mut Split) {
        let types: Vec<u8> = polygon.vertices.iter().map(|v| self.classify(v.pos)).collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(polygon.plane.normal) > 0.0 {
                    out.coplanar_front.push(polygon.clone());
                } else {
                    out.coplanar_back.push(polygon.clone());
                }
            }
            FRONT => out.front.push(polygon.clone()),
            BACK => out.back.push(polygon.clone()),
            _ => {
                let count = polygon.vertices.len();
                let mut f = Vec::with_capacity(count + 1);
                let mut b = Vec::with_capacity(count + 1);

                for i in 0..count {
                    let j = (i + 1) % count;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (&polygon.vertices[i], &polygon.vertices[j]);

                    if ti != BACK {
                        f.push(*vi);
                    }
                    if ti != FRONT {
                        b.push(*vi);
                    }
                    if (ti | tj) == SPANNING {
                        let denom = self.normal.dot(vj.pos - vi.pos);
                        let t = (self.w - self.normal.dot(vi.pos)) / denom;
                        let v = vi.interpolate(vj, t);
                        f.push(v);
                        b.push(v);
                    }
                }

                if f.len() >= 3 {
                    out.front.push(Polygon::with_plane(f, polygon.plane));
                }
                if b.len() >= 3 {
                    out.back.push(Polygon::with_plane(b, polygon.plane));
                }
            }
        }
    }
}

#[derive(Default)]
struct Split {
    coplanar_front: Vec<Polygon>,
    coplanar_back: Vec<Polygon>,
    front: Vec<Polygon>,
    back: Vec<Polygon>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<CsgVertex>,
    pub plane: Plane,
}

impl Polygon {
    pub fn new(vertices: Vec<CsgVertex>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let plane = Plane::from_points(vertices[0].pos, vertices[1].pos, vertices[2].pos)?;
        Some(Self { vertices, plane })
    }

    fn with_plane(vertices: Vec<CsgVertex>, plane: Plane) -> Self {
        Self { vertices, plane }
    }

    fn flip(&mut self) {
        self.vertices.reverse();
        for v in &mut self.vertices {
            v.flip();
        }
        self.plane.flip();
    }
}

#[derive(Debug, Default, Clone)]
struct Node {
    plane: Option<Plane>,
    front: Option<Box<Node>>,
    back: Option<Box<Node>>,
    polygons: Vec<Polygon>,
}

impl Node {
    fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    fn invert(&mut self) {
        for polygon in &mut self.polygons {
            polygon.flip();
        }
        if let Some(plane) = &mut self.plane {
            plane.flip();
        }
        if let Some(front) = &mut self.front {
            front.invert();
        }
        if let Some(back) = &mut self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Removes the parts of `polygons` that lie inside this tree's solid.
    fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let Some(plane) = self.plane else {
            return polygons;
        };

        let mut split = Split::default();
        for polygon in &polygons {
            plane.split_polygon(polygon, &mut split);
        }

        let mut front = split.front;
        front.extend(split.coplanar_front);
        let mut back = split.back;
        back.extend(split.coplanar_back);

        let mut front = match &self.front {
            Some(node) => node.clip_polygons(front),
            None => front,
        };
        let back = match &self.back {
            Some(node) => node.clip_polygons(back),
            None => Vec::new(),
        };

        front.extend(back);
        front
    }

    fn clip_to(&mut self, bsp: &Node) {
        self.polygons = bsp.clip_polygons(std::mem::take(&mut self.polygons));
        if let Some(front) = &mut self.front {
            front.clip_to(bsp);
        }
        if let Some(back) = &mut self.back {
            back.clip_to(bsp);
        }
    }

    fn all_polygons(&self) -> Vec<Polygon> {
        let mut out = self.polygons.clone();
        if let Some(front) = &self.front {
            out.extend(front.all_polygons());
        }
        if let Some(back) = &self.back {
            out.extend(back.all_polygons());
        }
        out
    }

    fn build(&mut self, polygons: Vec<Polygon>) {
        let Some(first) = polygons.first() else {
            return;
        };
        let plane = *self.plane.get_or_insert(first.plane);

        let mut split = Split::default();
        for polygon in &polygons {
            plane.split_polygon(polygon, &mut split);
        }

        self.polygons.extend(split.coplanar_front);
        self.polygons.extend(split.coplanar_back);

        if !split.front.is_empty() {
            self.front.get_or_insert_with(Default::default).build(split.front);
        }
        if !split.back.is_empty() {
            self.back.get_or_insert_with(Default::default).build(split.back);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solid {
    polygons: Vec<Polygon>,
}

impl Solid {
    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn subtract(&self, other: &Solid) -> Solid {
        let mut a = Node::new(self.polygons.clone());
        let mut b = Node::new(other.polygons.clone());

        a.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(b.all_polygons());
        a.invert();

        Solid::from_polygons(a.all_polygons())
    }

    pub fn to_mesh(&self) -> MeshData {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for polygon in &self.polygons {
            let base = vertices.len() as u32;
            vertices.extend(polygon.vertices.iter().map(|v| Vertex::new(v.pos, v.normal)));
            for i in 1..polygon.vertices.len() as u32 - 1 {
                indices.extend_from_slice(&[base, base + i, base + i + 1]);
            }
        }

        MeshData { vertices, indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cuboid(min: Vec3, max: Vec3) -> Solid {
        let c = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
        let faces: [(Vec3, [Vec3; 4]); 6] = [
            (Vec3::NEG_X, [c(min.x, min.y, min.z), c(min.x, min.y, max.z), c(min.x, max.y, max.z), c(min.x, max.y, min.z)]),
            (Vec3::X, [c(max.x, min.y, min.z), c(max.x, max.y, min.z), c(max.x, max.y, max.z), c(max.x, min.y, max.z)]),
            (Vec3::NEG_Y, [c(min.x, min.y, min.z), c(max.x, min.y, min.z), c(max.x, min.y, max.z), c(min.x, min.y, max.z)]),
            (Vec3::Y, [c(min.x, max.y, min.z), c(min.x, max.y, max.z), c(max.x, max.y, max.z), c(max.x, max.y, min.z)]),
            (Vec3::NEG_Z, [c(min.x, min.y, min.z), c(min.x, max.y, min.z), c(max.x, max.y, min.z), c(max.x, min.y, min.z)]),
            (Vec3::Z, [c(min.x, min.y, max.z), c(max.x, min.y, max.z), c(max.x, max.y, max.z), c(min.x, max.y, max.z)]),
        ];
        let polygons = faces
            .iter()
            .filter_map(|(n, quad)| Polygon::new(quad.iter().map(|&p| CsgVertex::new(p, *n)).collect()))
            .collect();
        Solid::from_polygons(polygons)
    }

    #[test]
    fn cuboid_faces_point_outward() {
        let cube = cuboid(Vec3::ZERO, Vec3::ONE);
        assert_eq!(cube.polygons().len(), 6);
        for polygon in cube.polygons() {
            assert_relative_eq!(polygon.plane.normal.dot(polygon.vertices[0].normal), 1.0, epsilon = 1e-6);
        }
        assert_relative_eq!(cube.to_mesh().signed_volume(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn subtract_overlapping_corner() {
        let a = cuboid(Vec3::ZERO, Vec3::splat(2.0));
        let b = cuboid(Vec3::ONE, Vec3::splat(3.0));
        let mesh = a.subtract(&b).to_mesh();
        assert_relative_eq!(mesh.signed_volume(), 7.0, epsilon = 1e-3);

        let bounds = mesh.bounds().unwrap();
        assert_relative_eq!(bounds.min.x, 0.0);
        assert_relative_eq!(bounds.max.x, 2.0);
    }

    #[test]
    fn subtract_disjoint_keeps_original() {
        let a = cuboid(Vec3::ZERO, Vec3::ONE);
        let b = cuboid(Vec3::splat(5.0), Vec3::splat(6.0));
        let mesh = a.subtract(&b).to_mesh();
        assert_relative_eq!(mesh.signed_volume(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn subtract_enclosing_leaves_nothing() {
        let a = cuboid(Vec3::ONE, Vec3::splat(2.0));
        let b = cuboid(Vec3::ZERO, Vec3::splat(3.0));
        assert!(a.subtract(&b).is_empty());
    }

    #[test]
    fn collinear_points_have_no_plane() {
        assert!(Plane::from_points(Vec3::ZERO, Vec3::X, Vec3::X * 2.0).is_none());
    }
}
