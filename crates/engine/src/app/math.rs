use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

const PARALLEL_EPSILON: f32 = 1.0e-6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or `ZERO` for degenerate input.
    pub fn normalize_or_zero(self) -> Self {
        let length = self.length();
        if length <= f32::EPSILON || !length.is_finite() {
            return Self::ZERO;
        }
        self * (1.0 / length)
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Always unit length when built through `Ray::new`.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Plane in `dot(normal, p) + distance = 0` form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            distance: -normal.dot(point),
        }
    }

    /// Horizontal plane through the world origin.
    pub fn ground() -> Self {
        Self::from_normal_and_point(Vec3::UP, Vec3::ZERO)
    }

    /// Distance along `ray` to the plane, `None` when the ray is parallel to
    /// the plane or points away from it.
    pub fn raycast(&self, ray: &Ray) -> Option<f32> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let enter = -(self.normal.dot(ray.origin) + self.distance) / denom;
        (enter >= 0.0).then_some(enter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Slab test. Returns the entry distance, or 0 when the origin is inside.
    pub fn ray_intersection(&self, ray: &Ray) -> Option<f32> {
        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;
        let axes = [
            (ray.origin.x, ray.direction.x, self.min.x, self.max.x),
            (ray.origin.y, ray.direction.y, self.min.y, self.max.y),
            (ray.origin.z, ray.direction.z, self.min.z, self.max.z),
        ];
        for (origin, direction, min, max) in axes {
            if direction.abs() < PARALLEL_EPSILON {
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction;
            let mut t0 = (min - origin) * inv;
            let mut t1 = (max - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// Axis-aligned rectangle on the ground plane (world x/z).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavRect {
    pub min_x: f32,
    pub min_z: f32,
    pub max_x: f32,
    pub max_z: f32,
}

impl NavRect {
    pub fn from_center_size(center: Vec3, width: f32, depth: f32) -> Self {
        Self {
            min_x: center.x - width * 0.5,
            min_z: center.z - depth * 0.5,
            max_x: center.x + width * 0.5,
            max_z: center.z + depth * 0.5,
        }
    }

    /// Closest point of the rectangle to `point`, at height `floor_y`.
    pub fn closest_point(&self, point: Vec3, floor_y: f32) -> Vec3 {
        Vec3::new(
            point.x.clamp(self.min_x, self.max_x),
            floor_y,
            point.z.clamp(self.min_z, self.max_z),
        )
    }

    pub fn corners(&self, floor_y: f32) -> [Vec3; 4] {
        [
            Vec3::new(self.min_x, floor_y, self.min_z),
            Vec3::new(self.max_x, floor_y, self.min_z),
            Vec3::new(self.max_x, floor_y, self.max_z),
            Vec3::new(self.min_x, floor_y, self.max_z),
        ]
    }
}
