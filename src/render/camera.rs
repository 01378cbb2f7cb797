use crate::dynamics::{step_scaled, AnimationState, SpringConfig, SpringPreset};
use crate::math::Transform;
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_4};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// Orthographic camera whose frustum spans the viewport in pixels divided by `zoom`.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub zoom: f32,
    pub near: f32,
    pub far: f32,
    viewport: Viewport,
}

impl Camera {
    pub fn orthographic(viewport: Viewport, zoom: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            zoom,
            near: 0.1,
            far: 1000.0,
            viewport,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let half_w = self.viewport.width.max(1) as f32 / 2.0 / self.zoom;
        let half_h = self.viewport.height.max(1) as f32 / 2.0 / self.zoom;
        Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Pixel position of a world point, origin top left. `None` when the point falls
    /// outside the depth range.
    pub fn project(&self, world: Vec3) -> Option<[f32; 2]> {
        let clip = self.view_projection() * Vec4::new(world.x, world.y, world.z, 1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !(0.0..=1.0).contains(&ndc.z) {
            return None;
        }

        let x = (ndc.x + 1.0) / 2.0 * self.viewport.width as f32;
        let y = (1.0 - ndc.y) / 2.0 * self.viewport.height as f32;
        Some([x, y])
    }
}

/// Drag-to-rotate controls for the chart group.
///
/// Dragging adds angular velocity that decays by `damping` each frame. Once released,
/// the group springs back to its resting orientation when `snap` is set.
#[derive(Debug, Clone)]
pub struct PresentationControls {
    pub rest: Vec2,
    pub min_polar: f32,
    pub max_polar: f32,
    pub min_azimuth: f32,
    pub max_azimuth: f32,
    pub rotate_speed: f32,
    pub damping: f32,
    pub snap: Option<SpringConfig>,
    offset: Vec2,
    velocity: Vec2,
    dragging: bool,
}

impl Default for PresentationControls {
    fn default() -> Self {
        Self {
            rest: Vec2::new(FRAC_PI_3, -FRAC_PI_2),
            min_polar: -FRAC_PI_4,
            max_polar: FRAC_PI_4,
            min_azimuth: -FRAC_PI_2,
            max_azimuth: FRAC_PI_2,
            rotate_speed: 0.005,
            damping: 0.85,
            snap: Some(SpringConfig::from_preset(SpringPreset::Snappy)),
            offset: Vec2::ZERO,
            velocity: Vec2::ZERO,
            dragging: false,
        }
    }
}

impl PresentationControls {
    pub fn new(rest: Vec2) -> Self {
        Self {
            rest,
            ..Default::default()
        }
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Feeds a pointer movement in pixels. Ignored unless a drag is active.
    pub fn drag(&mut self, delta_x: f32, delta_y: f32) {
        if !self.dragging {
            return;
        }
        self.velocity.x += delta_y * self.rotate_speed;
        self.velocity.y += delta_x * self.rotate_speed;
    }

    pub fn update(&mut self) {
        match self.snap {
            Some(config) if !self.dragging => {
                let pitch = step_scaled(
                    AnimationState {
                        position: self.offset.x,
                        velocity: self.velocity.x,
                        target: 0.0,
                    },
                    0.0,
                    &config,
                    1.0,
                );
                let yaw = step_scaled(
                    AnimationState {
                        position: self.offset.y,
                        velocity: self.velocity.y,
                        target: 0.0,
                    },
                    0.0,
                    &config,
                    1.0,
                );
                self.offset = Vec2::new(pitch.position, yaw.position);
                self.velocity = Vec2::new(pitch.velocity, yaw.velocity);
            }
            _ => {
                self.offset += self.velocity;
                self.velocity *= self.damping;
            }
        }

        self.offset.x = self.offset.x.clamp(self.min_polar, self.max_polar);
        self.offset.y = self.offset.y.clamp(self.min_azimuth, self.max_azimuth);

        if self.velocity.length_squared() < 1e-8 {
            self.velocity = Vec2::ZERO;
        }
        if !self.dragging && self.snap.is_some() && self.offset.length_squared() < 1e-8 {
            self.offset = Vec2::ZERO;
        }
    }

    pub fn angles(&self) -> Vec2 {
        self.rest + self.offset
    }

    pub fn is_at_rest(&self) -> bool {
        self.offset == Vec2::ZERO && self.velocity == Vec2::ZERO
    }

    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.velocity = Vec2::ZERO;
        self.dragging = false;
    }

    pub fn transform(&self) -> Transform {
        let angles = self.angles();
        Transform::from_euler_xyz(angles.x, angles.y, 0.0)
    }
}
