//! Quantized geometric codecs
//!
//! Lossy codecs for the vector quantities that dominate per-tick entity
//! state: unit direction vectors in two angular forms, magnitude-bounded
//! vectors, affine transforms as translation + three-component quaternion,
//! and positions delta-encoded against the stream's compression anchor.
//!
//! Every decoder mirrors its encoder's bit layout exactly; the documented
//! error bounds are what peers may rely on.

use crate::math::{Mat4, Quat, Vec3};
use crate::stream::bit_stream::{range_bits, BitStream};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Per-axis signed-int widths for the three quantized compressed-point tiers
const POINT_TIER_BITS: [usize; 3] = [16, 18, 20];

/// Directions closer to the poles than this write a zero azimuth
const AZIMUTH_EPSILON: f32 = 1e-5;

impl<B: AsRef<[u8]> + AsMut<[u8]>> BitStream<B> {
    /// Write a unit vector as two signed angles: azimuth at `bit_count + 1`
    /// bits and elevation at `bit_count` bits
    pub fn write_normal(&mut self, vec: Vec3, bit_count: usize) {
        let phi = vec.x.atan2(vec.y) / PI;
        let theta = vec.z.atan2((vec.x * vec.x + vec.y * vec.y).sqrt()) / FRAC_PI_2;

        self.write_signed_float(phi, bit_count + 1);
        self.write_signed_float(theta, bit_count);
    }

    /// Write a unit vector as a clamped z component (`z_bits`) plus an
    /// azimuth angle (`angle_bits`)
    ///
    /// Near-vertical directions (`|x|, |y| < 1e-5`) write a zero azimuth,
    /// since the angle no longer matters there.
    pub fn write_normal_zphi(&mut self, vec: Vec3, angle_bits: usize, z_bits: usize) {
        self.write_signed_float(vec.z.clamp(-1.0, 1.0), z_bits);

        if vec.x.abs() > AZIMUTH_EPSILON || vec.y.abs() > AZIMUTH_EPSILON {
            self.write_signed_float(vec.x.atan2(vec.y) / TAU, angle_bits);
        } else {
            self.write_signed_float(0.0, angle_bits);
        }
    }

    /// Write a vector with bounded magnitude
    ///
    /// Layout: a non-zero flag; if set, a below-`max_mag` flag selecting a
    /// `mag_bits` normalized magnitude or a raw float, then the direction in
    /// azimuth/elevation form. Vectors with `|v| <= min_mag` transmit as the
    /// single zero flag and decode to the zero vector.
    pub fn write_vector(
        &mut self,
        mut vec: Vec3,
        min_mag: f32,
        max_mag: f32,
        mag_bits: usize,
        angle_bits: usize,
        z_bits: usize,
    ) {
        let mag = vec.len();
        if self.write_flag(mag > min_mag) {
            if self.write_flag(mag < max_mag) {
                self.write_float(mag / max_mag, mag_bits);
            } else {
                self.write_f32(mag);
            }
            vec *= 1.0 / mag;
            self.write_normal_zphi(vec, angle_bits, z_bits);
        }
    }

    /// Write a point as three raw floats
    pub fn write_point(&mut self, p: Vec3) {
        self.write_f32(p.x);
        self.write_f32(p.y);
        self.write_f32(p.z);
    }

    /// Write an affine transform as its translation column (3 raw floats)
    /// and orientation quaternion (3 raw floats + w-sign flag)
    ///
    /// Transporting only `(x, y, z)` of the normalized quaternion halves the
    /// w component to one sign bit; the decoder recovers `|w|` from the
    /// unit-norm invariant.
    pub fn write_affine_transform(&mut self, matrix: &Mat4) {
        self.write_point(matrix.column3(3));

        let mut q = Quat::from_matrix(matrix);
        q.normalize();
        self.write_f32(q.x);
        self.write_f32(q.y);
        self.write_f32(q.z);
        self.write_flag(q.w < 0.0);
    }

    /// Write a point delta-encoded against the compression anchor
    ///
    /// A 2-bit tier selects per-axis signed-int widths of 16, 18, or 20 for
    /// anchor deltas quantized by `scale`, falling back to three raw floats
    /// of the absolute point when the delta exceeds the widest tier.
    pub fn write_compressed_point(&mut self, p: Vec3, scale: f32) {
        // Same number of bits on every axis
        let inv_scale = 1.0 / scale;
        let vec = p - self.compression_point();
        let dist = vec.len() * inv_scale;

        let tier: u32 = if dist < (1 << 15) as f32 {
            0
        } else if dist < (1 << 17) as f32 {
            1
        } else if dist < (1 << 19) as f32 {
            2
        } else {
            3
        };
        self.write_int(tier, 2);

        if tier != 3 {
            let bits = POINT_TIER_BITS[tier as usize];
            self.write_signed_int((vec.x * inv_scale) as i32, bits);
            self.write_signed_int((vec.y * inv_scale) as i32, bits);
            self.write_signed_int((vec.z * inv_scale) as i32, bits);
        } else {
            self.write_f32(p.x);
            self.write_f32(p.y);
            self.write_f32(p.z);
        }
    }

    /// Write a point delta-encoded with variable precision over radial
    /// distance bins; returns the number of payload bits used
    ///
    /// `dists` is a sorted ascending array of bin break distances and `err`
    /// the error budget at the innermost bin; angular widths are derived so
    /// the angular step at `dists[0]` stays within `err`. Magnitudes beyond
    /// the outermost bin fall back to a raw float.
    pub fn write_compressed_point_rp(&mut self, p: Vec3, dists: &[f32], err: f32) -> u32 {
        debug_assert!(!dists.is_empty());
        let num_dists = dists.len();

        let vec = p - self.compression_point();
        let len = vec.len();
        let dir = if err <= len {
            vec * (1.0 / len)
        } else {
            Vec3::new(0.0, 0.0, 1.0)
        };

        let z_bits = range_bits((1.0 + dists[0] * 2.0 / err) as u32);
        let angle_bits = range_bits((dists[0] * TAU / err) as u32);
        self.write_normal_zphi(dir, angle_bits, z_bits);
        let header_bits = angle_bits + z_bits;

        let mut bin = 0;
        while bin < num_dists {
            if dists[bin] > len {
                break;
            }
            bin += 1;
        }
        self.write_ranged_u32(bin as u32, 0, num_dists as u32);
        let bit_count = range_bits(num_dists as u32 + 1) + header_bits;

        if bin >= num_dists {
            self.write_f32(len);
            return (bit_count + 32) as u32;
        }

        let err_bin = if bin > 0 {
            dists[bin - 1] * err / dists[0]
        } else {
            err
        };
        let min_bin = if bin > 0 { dists[bin - 1] } else { 0.0 };
        let extra_bits = range_bits(((dists[bin] - min_bin) / err_bin) as u32);
        self.write_float((len - min_bin) / (dists[bin] - min_bin), extra_bits);
        (extra_bits + bit_count) as u32
    }
}

impl<B: AsRef<[u8]>> BitStream<B> {
    /// Read a unit vector written by [`write_normal`](BitStream::write_normal)
    pub fn read_normal(&mut self, bit_count: usize) -> Vec3 {
        let phi = self.read_signed_float(bit_count + 1) * PI;
        let theta = self.read_signed_float(bit_count) * FRAC_PI_2;

        Vec3::new(
            phi.sin() * theta.cos(),
            phi.cos() * theta.cos(),
            theta.sin(),
        )
    }

    /// Read a unit vector written by
    /// [`write_normal_zphi`](BitStream::write_normal_zphi)
    pub fn read_normal_zphi(&mut self, angle_bits: usize, z_bits: usize) -> Vec3 {
        let z = self.read_signed_float(z_bits);
        let angle = TAU * self.read_signed_float(angle_bits);

        // quantization can push z a hair past 1; keep the radicand sane
        let mult = 1.0 - z * z;
        let mult = if mult > 0.0 { mult.sqrt() } else { 0.0 };

        Vec3::new(mult * angle.sin(), mult * angle.cos(), z)
    }

    /// Read a vector written by [`write_vector`](BitStream::write_vector)
    pub fn read_vector(
        &mut self,
        max_mag: f32,
        mag_bits: usize,
        angle_bits: usize,
        z_bits: usize,
    ) -> Vec3 {
        if self.read_flag() {
            let mag = if self.read_flag() {
                self.read_float(mag_bits) * max_mag
            } else {
                self.read_f32()
            };
            self.read_normal_zphi(angle_bits, z_bits) * mag
        } else {
            Vec3::ZERO
        }
    }

    /// Read a point written by [`write_point`](BitStream::write_point)
    pub fn read_point(&mut self) -> Vec3 {
        Vec3::new(self.read_f32(), self.read_f32(), self.read_f32())
    }

    /// Read a transform written by
    /// [`write_affine_transform`](BitStream::write_affine_transform)
    pub fn read_affine_transform(&mut self) -> Mat4 {
        let pos = self.read_point();
        let x = self.read_f32();
        let y = self.read_f32();
        let z = self.read_f32();
        let mut w = (1.0 - (x * x + y * y + z * z).min(1.0)).sqrt();
        if self.read_flag() {
            w = -w;
        }

        let mut matrix = Quat::new(x, y, z, w).to_matrix();
        matrix.set_column3(3, pos);
        matrix
    }

    /// Read a point written by
    /// [`write_compressed_point`](BitStream::write_compressed_point)
    pub fn read_compressed_point(&mut self, scale: f32) -> Vec3 {
        let tier = self.read_int(2);

        if tier == 3 {
            Vec3::new(self.read_f32(), self.read_f32(), self.read_f32())
        } else {
            let bits = POINT_TIER_BITS[tier as usize];
            let x = self.read_signed_int(bits) as f32;
            let y = self.read_signed_int(bits) as f32;
            let z = self.read_signed_int(bits) as f32;
            self.compression_point() + Vec3::new(x, y, z) * scale
        }
    }

    /// Read a point written by
    /// [`write_compressed_point_rp`](BitStream::write_compressed_point_rp);
    /// returns the point and its decoded magnitude from the anchor
    pub fn read_compressed_point_rp(&mut self, dists: &[f32], err: f32) -> (Vec3, f32) {
        debug_assert!(!dists.is_empty());
        let num_dists = dists.len();

        let z_bits = range_bits((1.0 + dists[0] * 2.0 / err) as u32);
        let angle_bits = range_bits((dists[0] * TAU / err) as u32);
        let dir = self.read_normal_zphi(angle_bits, z_bits);

        let bin = self.read_ranged_u32(0, num_dists as u32) as usize;
        let mag = if bin >= num_dists {
            self.read_f32()
        } else {
            let err_bin = if bin > 0 {
                dists[bin - 1] * err / dists[0]
            } else {
                err
            };
            let min_bin = if bin > 0 { dists[bin - 1] } else { 0.0 };
            let extra_bits = range_bits(((dists[bin] - min_bin) / err_bin) as u32);
            (dists[bin] - min_bin) * self.read_float(extra_bits) + min_bin
        };

        (dir * mag + self.compression_point(), mag)
    }
}

/// Round-trip a unit vector through the 2-angle codec at `bit_count` bits,
/// yielding the vector a peer would decode
pub fn quantize_normal(vec: Vec3, bit_count: usize) -> Vec3 {
    let mut buf = [0u8; 16];
    let mut stream = BitStream::new(&mut buf[..]);
    stream.write_normal(vec, bit_count);
    stream.set_bit_position(0);
    stream.read_normal(bit_count)
}
