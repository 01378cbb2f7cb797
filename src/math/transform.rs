use glam::{EulerRot, Mat4, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Rotation given as intrinsic X, then Y, then Z angles in radians.
    pub fn from_euler_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            rotation: Quat::from_euler(EulerRot::XYZ, x, y, z),
            ..Self::IDENTITY
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (point * self.scale) + self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn euler_y_quarter_turn_maps_z_to_x() {
        let t = Transform::from_euler_xyz(0.0, FRAC_PI_2, 0.0);
        let p = t.transform_point(Vec3::Z);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn matrix_agrees_with_transform_point() {
        let mut t = Transform::from_euler_xyz(0.3, -1.2, 0.1);
        t.position = Vec3::new(1.0, 2.0, 3.0);
        let p = Vec3::new(0.5, -0.25, 2.0);
        let a = t.transform_point(p);
        let b = t.to_matrix().transform_point3(p);
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
    }
}
