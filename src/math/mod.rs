//! Minimal vector math consumed by the geometric codecs
//!
//! The stream codecs only need a 3-component vector, a quaternion that
//! converts to and from a rotation matrix, and column access on a 4x4
//! affine matrix. These types carry exactly that surface; they are not a
//! general-purpose math library.

use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub};

/// A 3-component single-precision vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// The zero vector
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a vector from components
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean length
    #[inline]
    pub fn len_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Euclidean length
    #[inline]
    pub fn len(&self) -> f32 {
        self.len_squared().sqrt()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl MulAssign<f32> for Vec3 {
    #[inline]
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// A rotation quaternion `(x, y, z, w)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    /// X (i) component
    pub x: f32,
    /// Y (j) component
    pub y: f32,
    /// Z (k) component
    pub z: f32,
    /// Scalar component
    pub w: f32,
}

impl Quat {
    /// The identity rotation
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Create a quaternion from components
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Extract the orientation of an affine matrix (upper-left 3x3, assumed
    /// a pure rotation)
    pub fn from_matrix(m: &Mat4) -> Self {
        let trace = m.get(0, 0) + m.get(1, 1) + m.get(2, 2);
        if trace > 0.0 {
            let s = (trace + 1.0).sqrt();
            let w = 0.5 * s;
            let s = 0.5 / s;
            Quat::new(
                (m.get(2, 1) - m.get(1, 2)) * s,
                (m.get(0, 2) - m.get(2, 0)) * s,
                (m.get(1, 0) - m.get(0, 1)) * s,
                w,
            )
        } else if m.get(0, 0) >= m.get(1, 1) && m.get(0, 0) >= m.get(2, 2) {
            let s = (1.0 + m.get(0, 0) - m.get(1, 1) - m.get(2, 2)).sqrt();
            let x = 0.5 * s;
            let s = 0.5 / s;
            Quat::new(
                x,
                (m.get(0, 1) + m.get(1, 0)) * s,
                (m.get(0, 2) + m.get(2, 0)) * s,
                (m.get(2, 1) - m.get(1, 2)) * s,
            )
        } else if m.get(1, 1) >= m.get(2, 2) {
            let s = (1.0 + m.get(1, 1) - m.get(0, 0) - m.get(2, 2)).sqrt();
            let y = 0.5 * s;
            let s = 0.5 / s;
            Quat::new(
                (m.get(0, 1) + m.get(1, 0)) * s,
                y,
                (m.get(1, 2) + m.get(2, 1)) * s,
                (m.get(0, 2) - m.get(2, 0)) * s,
            )
        } else {
            let s = (1.0 + m.get(2, 2) - m.get(0, 0) - m.get(1, 1)).sqrt();
            let z = 0.5 * s;
            let s = 0.5 / s;
            Quat::new(
                (m.get(0, 2) + m.get(2, 0)) * s,
                (m.get(1, 2) + m.get(2, 1)) * s,
                z,
                (m.get(1, 0) - m.get(0, 1)) * s,
            )
        }
    }

    /// Scale to unit norm; leaves a degenerate (near-zero) quaternion as the
    /// identity
    pub fn normalize(&mut self) {
        let n = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if n > f32::EPSILON {
            let inv = 1.0 / n;
            self.x *= inv;
            self.y *= inv;
            self.z *= inv;
            self.w *= inv;
        } else {
            *self = Quat::IDENTITY;
        }
    }

    /// Build the rotation matrix of a unit quaternion (translation column
    /// zero)
    pub fn to_matrix(&self) -> Mat4 {
        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        let x2 = x + x;
        let y2 = y + y;
        let z2 = z + z;
        let xx = x * x2;
        let xy = x * y2;
        let xz = x * z2;
        let yy = y * y2;
        let yz = y * z2;
        let zz = z * z2;
        let wx = w * x2;
        let wy = w * y2;
        let wz = w * z2;

        let mut m = Mat4::IDENTITY;
        m.set(0, 0, 1.0 - (yy + zz));
        m.set(0, 1, xy - wz);
        m.set(0, 2, xz + wy);
        m.set(1, 0, xy + wz);
        m.set(1, 1, 1.0 - (xx + zz));
        m.set(1, 2, yz - wx);
        m.set(2, 0, xz - wy);
        m.set(2, 1, yz + wx);
        m.set(2, 2, 1.0 - (xx + yy));
        m
    }
}

/// A row-major 4x4 matrix; column vectors, so column 3 carries translation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    m: [f32; 16],
}

impl Mat4 {
    /// The identity matrix
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Element at `(row, col)`
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.m[row * 4 + col]
    }

    /// Set element at `(row, col)`
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.m[row * 4 + col] = value;
    }

    /// The first three rows of a column as a vector
    #[inline]
    pub fn column3(&self, col: usize) -> Vec3 {
        Vec3::new(self.get(0, col), self.get(1, col), self.get(2, col))
    }

    /// Store a vector into the first three rows of a column
    #[inline]
    pub fn set_column3(&mut self, col: usize, v: Vec3) {
        self.set(0, col, v.x);
        self.set(1, col, v.y);
        self.set(2, col, v.z);
    }

    /// Translation helper: identity rotation with the given translation
    /// column
    pub fn from_translation(t: Vec3) -> Self {
        let mut m = Mat4::IDENTITY;
        m.set_column3(3, t);
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    fn assert_quat_close(a: Quat, b: Quat) {
        // q and -q are the same rotation
        let direct = (a.x - b.x).abs() + (a.y - b.y).abs() + (a.z - b.z).abs() + (a.w - b.w).abs();
        let negated = (a.x + b.x).abs() + (a.y + b.y).abs() + (a.z + b.z).abs() + (a.w + b.w).abs();
        assert!(
            direct.min(negated) < 1e-5,
            "quaternions differ: {:?} vs {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_vec3_arithmetic() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, -2.0, 0.5);
        assert_eq!(a + b, Vec3::new(5.0, 0.0, 3.5));
        assert_eq!(a - b, Vec3::new(-3.0, 4.0, 2.5));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert!((Vec3::new(3.0, 4.0, 0.0).len() - 5.0).abs() < EPS);
    }

    #[test]
    fn test_quat_identity_round_trip() {
        let q = Quat::from_matrix(&Mat4::IDENTITY);
        assert_quat_close(q, Quat::IDENTITY);
        assert_eq!(Quat::IDENTITY.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_quat_matrix_round_trip() {
        // 90 degrees about Z
        let half = std::f32::consts::FRAC_PI_4;
        let q = Quat::new(0.0, 0.0, half.sin(), half.cos());
        let m = q.to_matrix();

        // rotates +X to +Y
        assert!((m.get(1, 0) - 1.0).abs() < EPS);
        assert!(m.get(0, 0).abs() < EPS);

        let back = Quat::from_matrix(&m);
        assert_quat_close(back, q);
    }

    #[test]
    fn test_quat_round_trip_dominant_axes() {
        // Exercise each branch of from_matrix with large-angle rotations
        let angles = [
            Quat::new(0.9, 0.1, 0.1, 0.1),
            Quat::new(0.1, 0.9, 0.1, 0.1),
            Quat::new(0.1, 0.1, 0.9, 0.1),
        ];
        for mut q in angles {
            q.normalize();
            let back = Quat::from_matrix(&q.to_matrix());
            assert_quat_close(back, q);
        }
    }

    #[test]
    fn test_normalize_degenerate() {
        let mut q = Quat::new(0.0, 0.0, 0.0, 0.0);
        q.normalize();
        assert_eq!(q, Quat::IDENTITY);
    }

    #[test]
    fn test_mat4_columns() {
        let mut m = Mat4::IDENTITY;
        m.set_column3(3, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m.column3(3), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m.get(3, 3), 1.0);
        assert_eq!(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)), m);
    }
}
