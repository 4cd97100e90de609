#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    CAMERA_ALPHA, CAMERA_BETA, CAMERA_FOV, CAMERA_NAME, CAMERA_PANNING_SENSIBILITY, CAMERA_RADIUS,
    CAMERA_RADIUS_MAX, CAMERA_RADIUS_MIN, CAMERA_WHEEL_PRECISION, WHEEL_PIXELS_PER_UNIT,
};

/// A point in screen space (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point or offset in world space. `y` is height above the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Ground-plane difference `self - other` with the height component zeroed.
    #[must_use]
    pub fn planar_delta(self, other: Self) -> Self {
        Self { x: self.x - other.x, y: 0.0, z: self.z - other.z }
    }

    /// Translate in place by `delta`.
    pub fn add_assign(&mut self, delta: Self) {
        self.x += delta.x;
        self.y += delta.y;
        self.z += delta.z;
    }
}

/// Size of the render surface in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Arc-rotate camera orbiting `target`.
///
/// Rotation is locked: `alpha`/`beta` are carried in the graph but never
/// changed by input, so the view is always straight down with screen-up
/// pointing along world `+z`. Input moves the radius (zoom) and slides the
/// target across the ground (pan).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcCamera {
    pub name: String,
    pub alpha: f64,
    pub beta: f64,
    pub radius: f64,
    pub target: Vec3,
    pub lower_radius_limit: f64,
    pub upper_radius_limit: f64,
    pub wheel_precision: f64,
    pub panning_sensibility: f64,
    pub fov: f64,
}

impl Default for ArcCamera {
    fn default() -> Self {
        Self {
            name: CAMERA_NAME.to_owned(),
            alpha: CAMERA_ALPHA,
            beta: CAMERA_BETA,
            radius: CAMERA_RADIUS,
            target: Vec3::default(),
            lower_radius_limit: CAMERA_RADIUS_MIN,
            upper_radius_limit: CAMERA_RADIUS_MAX,
            wheel_precision: CAMERA_WHEEL_PRECISION,
            panning_sensibility: CAMERA_PANNING_SENSIBILITY,
            fov: CAMERA_FOV,
        }
    }
}

impl ArcCamera {
    /// World units covered by one screen pixel at the ground plane.
    #[must_use]
    pub fn world_per_pixel(&self, viewport: Viewport) -> f64 {
        if viewport.height <= 0.0 {
            return 0.0;
        }
        2.0 * self.radius * (self.fov / 2.0).tan() / viewport.height
    }

    /// Project a screen point onto the ground plane (`y = 0`).
    ///
    /// Returns `None` while the viewport has no area.
    #[must_use]
    pub fn screen_to_ground(&self, screen: Point, viewport: Viewport) -> Option<Vec3> {
        if viewport.is_empty() {
            return None;
        }
        let s = self.world_per_pixel(viewport);
        Some(Vec3 {
            x: self.target.x + (screen.x - viewport.width / 2.0) * s,
            y: 0.0,
            z: self.target.z - (screen.y - viewport.height / 2.0) * s,
        })
    }

    /// Project a ground-plane point to screen coordinates.
    #[must_use]
    pub fn ground_to_screen(&self, world: Vec3, viewport: Viewport) -> Point {
        let s = self.world_per_pixel(viewport);
        if s <= 0.0 {
            return Point::new(viewport.width / 2.0, viewport.height / 2.0);
        }
        Point {
            x: viewport.width / 2.0 + (world.x - self.target.x) / s,
            y: viewport.height / 2.0 - (world.z - self.target.z) / s,
        }
    }

    /// Zoom by a wheel delta in pixels (positive = away from the table).
    /// The radius stays inside the configured limits.
    pub fn zoom_by_wheel(&mut self, delta_y: f64) {
        let precision = if self.wheel_precision > 0.0 { self.wheel_precision } else { CAMERA_WHEEL_PRECISION };
        let next = self.radius + delta_y / (precision * WHEEL_PIXELS_PER_UNIT);
        self.radius = next.clamp(self.lower_radius_limit, self.upper_radius_limit);
    }

    /// Pan for a pointer drag of `(dx, dy)` pixels. At the default
    /// sensibility the ground under the pointer follows it exactly; a higher
    /// `panning_sensibility` pans slower.
    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64, viewport: Viewport) {
        let sensibility =
            if self.panning_sensibility > 0.0 { self.panning_sensibility } else { CAMERA_PANNING_SENSIBILITY };
        let s = self.world_per_pixel(viewport) * CAMERA_PANNING_SENSIBILITY / sensibility;
        self.target.x -= dx * s;
        self.target.z += dy * s;
    }
}
