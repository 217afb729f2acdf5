//! Orbiting perspective camera
//!
//! Right-drag orbits around a target point. Also owns the screen/world
//! conversions used for picking: projecting world points to CSS pixels and
//! casting rays from a pixel into the scene.

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

/// Canvas size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Zero-sized or NaN viewports can't be picked against
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn aspect(&self) -> f32 {
        if self.is_degenerate() {
            1.0
        } else {
            self.width / self.height
        }
    }

    /// Backbuffer size in device pixels, never below 1x1
    pub fn backbuffer_size(&self, pixel_ratio: f64) -> (u32, u32) {
        let scale = |css: f32| ((css as f64 * pixel_ratio) as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length
    pub direction: Vec3,
}

impl Ray {
    /// Where the ray crosses the plane `y = height`, if it does in front of
    /// the origin
    pub fn intersect_horizontal_plane(&self, height: f32) -> Option<Vec3> {
        if self.direction.y.abs() < 1e-6 {
            return None;
        }
        let t = (height - self.origin.y) / self.direction.y;
        (t > 0.0).then(|| self.origin + self.direction * t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    /// Rotation about +Y; 0 puts the eye on +Z
    pub yaw: f32,
    /// Elevation above the target's horizontal plane
    pub pitch: f32,
    pub distance: f32,
    /// Vertical field of view (radians)
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

const MIN_PITCH: f32 = 0.05;
const MAX_PITCH: f32 = 1.5;
const MIN_DISTANCE: f32 = 10.0;
const MAX_DISTANCE: f32 = 300.0;

impl Default for OrbitCamera {
    /// Eye at (0, 30, 70) looking at the origin
    fn default() -> Self {
        let offset = Vec3::new(0.0, 30.0, 70.0);
        Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: offset.y.atan2(offset.z),
            distance: offset.length(),
            fov_y: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.2,
            far: 5000.0,
        }
    }
}

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Horizontal forward direction (eye toward target, Y dropped)
    pub fn forward_flat(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vec3::new(-sin_yaw, 0.0, -cos_yaw)
    }

    pub fn set_aspect(&mut self, viewport: Viewport) {
        self.aspect = viewport.aspect();
    }

    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + delta_pitch).clamp(MIN_PITCH, MAX_PITCH);
    }

    /// Scale the orbit distance (wheel); >1 moves away
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        }
    }

    /// World point to CSS pixels (origin top-left). `None` behind the eye.
    pub fn project(&self, viewport: Viewport, point: Vec3) -> Option<Vec2> {
        if viewport.is_degenerate() {
            return None;
        }
        let clip = self.view_proj() * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.width,
            (1.0 - ndc.y) * 0.5 * viewport.height,
        ))
    }

    /// Ray from the eye through a CSS pixel
    pub fn ray_through(&self, viewport: Viewport, cursor: Vec2) -> Option<Ray> {
        if viewport.is_degenerate() || !cursor.is_finite() {
            return None;
        }
        let ndc = Vec2::new(
            cursor.x / viewport.width * 2.0 - 1.0,
            1.0 - cursor.y / viewport.height * 2.0,
        );
        let inverse = self.view_proj().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        let direction = (far - near).try_normalize()?;
        Some(Ray {
            origin: near,
            direction,
        })
    }
}
