//! Fixed-layout geometric records decoded from foreign memory.
//!
//! The engine hands back byte offsets to little-endian, 4-byte aligned
//! records. Each reader copies the values out immediately; nothing here keeps
//! a view into foreign memory.

use serde::{Deserialize, Serialize};

use crate::engine::Offset;

/// Read a little-endian `f32` at a word-aligned byte offset.
pub(crate) fn read_f32(mem: &[u8], offset: Offset) -> f32 {
    f32::from_le_bytes(word(mem, offset))
}

/// Read a little-endian `i32` at a word-aligned byte offset.
pub(crate) fn read_i32(mem: &[u8], offset: Offset) -> i32 {
    i32::from_le_bytes(word(mem, offset))
}

fn word(mem: &[u8], offset: Offset) -> [u8; 4] {
    let at = offset as usize;
    debug_assert_eq!(at % 4, 0, "unaligned record offset {at:#x}");
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&mem[at..at + 4]);
    bytes
}

fn read_f32s<const N: usize>(mem: &[u8], offset: Offset) -> [f32; N] {
    std::array::from_fn(|i| read_f32(mem, offset + 4 * i as u32))
}

/// A floating point rectangle: `x0, y0, x1, y1`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub const SIZE: u32 = 16;

    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub(crate) fn read(mem: &[u8], offset: Offset) -> Self {
        let [x0, y0, x1, y1] = read_f32s(mem, offset);
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// True when `other` lies entirely inside this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }
}

/// An integer rectangle, as used for pixmap bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl IRect {
    pub const SIZE: u32 = 16;

    pub(crate) fn read(mem: &[u8], offset: Offset) -> Self {
        Self {
            x0: read_i32(mem, offset),
            y0: read_i32(mem, offset + 4),
            x1: read_i32(mem, offset + 8),
            y1: read_i32(mem, offset + 12),
        }
    }

    /// Horizontal extent; `0` for inverted boxes.
    pub fn width(&self) -> u32 {
        extent(self.x0, self.x1)
    }

    /// Vertical extent; `0` for inverted boxes.
    pub fn height(&self) -> u32 {
        extent(self.y0, self.y1)
    }
}

fn extent(lo: i32, hi: i32) -> u32 {
    (i64::from(hi) - i64::from(lo)).clamp(0, i64::from(u32::MAX)) as u32
}

/// A 2D affine transform `[a b c d e f]`.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const SIZE: u32 = 24;

    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self` followed by `other`.
    pub fn concat(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub(crate) fn read(mem: &[u8], offset: Offset) -> Self {
        let [a, b, c, d, e, f] = read_f32s(mem, offset);
        Self { a, b, c, d, e, f }
    }

    /// The six coefficients in entry-point argument order.
    pub fn to_array(&self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A quadrilateral given by its four corners.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quad {
    pub ul: (f32, f32),
    pub ur: (f32, f32),
    pub ll: (f32, f32),
    pub lr: (f32, f32),
}

impl Quad {
    pub const SIZE: u32 = 32;

    pub(crate) fn read(mem: &[u8], offset: Offset) -> Self {
        let [ulx, uly, urx, ury, llx, lly, lrx, lry] = read_f32s(mem, offset);
        Self {
            ul: (ulx, uly),
            ur: (urx, ury),
            ll: (llx, lly),
            lr: (lrx, lry),
        }
    }

    /// Smallest rectangle enclosing all four corners.
    pub fn bounds(&self) -> Rect {
        let xs = [self.ul.0, self.ur.0, self.ll.0, self.lr.0];
        let ys = [self.ul.1, self.ur.1, self.ll.1, self.lr.1];
        Rect {
            x0: xs.iter().copied().fold(f32::INFINITY, f32::min),
            y0: ys.iter().copied().fold(f32::INFINITY, f32::min),
            x1: xs.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            y1: ys.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        }
    }
}
