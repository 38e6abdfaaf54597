use glam::{IVec3, Vec3};

const AXIS_EPSILON: f32 = 1.0e-6;

/// Rotates the horizontal (x, z) part of `v` by `degrees` about the vertical axis.
pub fn rotate_about_vertical(v: Vec3, degrees: f32) -> Vec3 {
    let (sine, cosine) = degrees.to_radians().sin_cos();
    Vec3::new(cosine * v.x - sine * v.z, v.y, sine * v.x + cosine * v.z)
}

/// Keeps only the dominant horizontal component of `v` as a unit vector.
/// Ties go to z. Returns zero when `v` has no horizontal component.
pub fn snap_to_dominant_axis(v: Vec3) -> Vec3 {
    let snapped = if v.x.abs() > v.z.abs() {
        Vec3::new(v.x, 0.0, 0.0)
    } else {
        Vec3::new(0.0, 0.0, v.z)
    };
    if snapped.length_squared() <= AXIS_EPSILON * AXIS_EPSILON {
        return Vec3::ZERO;
    }
    snapped.normalize()
}

/// Unit direction for a pitch/yaw pair in degrees.
///
/// Yaw 0 faces +z and grows clockwise seen from above (yaw 90 faces -x).
/// Positive pitch looks down.
pub fn direction_from_angles(pitch: f32, yaw: f32) -> Vec3 {
    let (sin_yaw, cos_yaw) = yaw.to_radians().sin_cos();
    let (sin_pitch, cos_pitch) = pitch.to_radians().sin_cos();
    Vec3::new(-sin_yaw * cos_pitch, -sin_pitch, cos_yaw * cos_pitch)
}

/// Inverse of [`direction_from_angles`]; returns `(pitch, yaw)` with yaw in `[0, 360)`.
pub fn angles_from_direction(direction: Vec3) -> (f32, f32) {
    let horizontal = (direction.x * direction.x + direction.z * direction.z).sqrt();
    if horizontal <= AXIS_EPSILON {
        let pitch = if direction.y > 0.0 { -90.0 } else { 90.0 };
        return (pitch, 0.0);
    }

    let yaw = (-direction.x).atan2(direction.z).to_degrees().rem_euclid(360.0);
    let pitch = (-direction.y / horizontal).atan().to_degrees();
    (pitch, yaw)
}

/// Rounds an axis-aligned unit vector to its voxel step.
pub fn voxel_step(direction: Vec3) -> IVec3 {
    direction.round().as_ivec3()
}

/// Every voxel of the cube of side `2 * radius + 1` around `center`.
///
/// Order is x fastest, then z, then y from the bottom layer up.
#[derive(Debug, Clone)]
pub struct NeighborhoodScan {
    center: IVec3,
    radius: i32,
    offset: IVec3,
    remaining: usize,
}

impl NeighborhoodScan {
    pub fn new(center: IVec3, radius: i32) -> Self {
        let radius = radius.max(0);
        let side = (2 * radius + 1) as usize;
        Self {
            center,
            radius,
            offset: IVec3::splat(-radius),
            remaining: side * side * side,
        }
    }
}

impl Iterator for NeighborhoodScan {
    type Item = IVec3;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let current = self.center + self.offset;
        self.remaining -= 1;

        self.offset.x += 1;
        if self.offset.x > self.radius {
            self.offset.x = -self.radius;
            self.offset.z += 1;
        }
        if self.offset.z > self.radius {
            self.offset.z = -self.radius;
            self.offset.y += 1;
        }

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for NeighborhoodScan {}
