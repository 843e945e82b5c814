//! Lattice cell keys
//!
//! A `CellKey` identifies one unit cell on the brick lattice. The three
//! signed coordinates are bit-packed into a single biased `u64` (21 bits per
//! axis, x in the high bits) so the packed word doubles as the hash key and
//! the derived ordering is lexicographic by (x, y, z), which gives every
//! iteration over sorted keys a deterministic spatial order.

use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::fmt;

const AXIS_BITS: u32 = 21;
const AXIS_MASK: u64 = (1 << AXIS_BITS) - 1;
const BIAS: i64 = 1 << (AXIS_BITS - 1);

/// Supported coordinate range per axis (inclusive)
pub const KEY_COORD_MAX: i32 = (BIAS - 1) as i32;
/// Supported coordinate range per axis (inclusive)
pub const KEY_COORD_MIN: i32 = -BIAS as i32;

/// Packed (x, y, z) lattice coordinate.
///
/// Ordering is lexicographic by (x, y, z); equality and hashing operate on
/// the packed word directly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellKey(u64);

impl CellKey {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        debug_assert!((KEY_COORD_MIN..=KEY_COORD_MAX).contains(&x));
        debug_assert!((KEY_COORD_MIN..=KEY_COORD_MAX).contains(&y));
        debug_assert!((KEY_COORD_MIN..=KEY_COORD_MAX).contains(&z));
        let px = (x as i64 + BIAS) as u64 & AXIS_MASK;
        let py = (y as i64 + BIAS) as u64 & AXIS_MASK;
        let pz = (z as i64 + BIAS) as u64 & AXIS_MASK;
        CellKey((px << (2 * AXIS_BITS)) | (py << AXIS_BITS) | pz)
    }

    pub fn from_ivec3(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    pub fn x(self) -> i32 {
        (((self.0 >> (2 * AXIS_BITS)) & AXIS_MASK) as i64 - BIAS) as i32
    }

    pub fn y(self) -> i32 {
        (((self.0 >> AXIS_BITS) & AXIS_MASK) as i64 - BIAS) as i32
    }

    pub fn z(self) -> i32 {
        ((self.0 & AXIS_MASK) as i64 - BIAS) as i32
    }

    pub fn to_ivec3(self) -> IVec3 {
        IVec3::new(self.x(), self.y(), self.z())
    }

    /// The raw packed word (stable across runs, usable as an external id)
    pub fn packed(self) -> u64 {
        self.0
    }

    /// Key translated by the given per-axis offsets
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x() + dx, self.y() + dy, self.z() + dz)
    }
}

impl fmt::Debug for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellKey({},{},{})", self.x(), self.y(), self.z())
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x(), self.y(), self.z())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        for &(x, y, z) in &[
            (0, 0, 0),
            (1, 2, 3),
            (-1, -2, -3),
            (KEY_COORD_MAX, KEY_COORD_MIN, 0),
            (-511, 1023, -77),
        ] {
            let k = CellKey::new(x, y, z);
            assert_eq!((k.x(), k.y(), k.z()), (x, y, z));
        }
    }

    #[test]
    fn test_key_ordering_is_lexicographic() {
        let mut keys = vec![
            CellKey::new(1, 0, 0),
            CellKey::new(0, 1, 0),
            CellKey::new(0, 0, 1),
            CellKey::new(-1, 5, 5),
            CellKey::new(0, 0, 0),
        ];
        keys.sort();
        let coords: Vec<_> = keys.iter().map(|k| (k.x(), k.y(), k.z())).collect();
        assert_eq!(
            coords,
            vec![(-1, 5, 5), (0, 0, 0), (0, 0, 1), (0, 1, 0), (1, 0, 0)]
        );
    }

    #[test]
    fn test_key_offset() {
        let k = CellKey::new(4, -2, 9).offset(-5, 2, 1);
        assert_eq!((k.x(), k.y(), k.z()), (-1, 0, 10));
    }

    #[test]
    fn test_key_serde_transparent() {
        let k = CellKey::new(7, 8, 9);
        let json = serde_json::to_string(&k).expect("serialize key");
        let back: CellKey = serde_json::from_str(&json).expect("deserialize key");
        assert_eq!(k, back);
    }
}
