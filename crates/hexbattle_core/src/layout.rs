//! # Pixel Layout
//!
//! Pointy-top conversion between cube coordinates and 2-D positions.
//! Presentation consumes these; the simulation never does.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::hex::HexCoordinate;

const SQRT_3: f32 = 1.732_050_8;

/// A 2-D position or size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Point {
    /// Creates a point.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Forward and inverse basis matrices of a hex orientation.
struct Orientation {
    forward: [f32; 4],
    inverse: [f32; 4],
    start_angle: f32,
}

const POINTY: Orientation = Orientation {
    forward: [SQRT_3, SQRT_3 / 2.0, 0.0, 1.5],
    inverse: [SQRT_3 / 3.0, -1.0 / 3.0, 0.0, 2.0 / 3.0],
    start_angle: 0.5,
};

/// Where the grid sits on screen and how large a cell is.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Pixel position of the grid origin.
    pub origin: Point,
    /// Cell size along each axis.
    pub cell_size: Point,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            origin: Point::new(0.0, 0.0),
            cell_size: Point::new(1.0, 1.0),
        }
    }
}

impl Layout {
    /// Creates a layout.
    #[must_use]
    pub const fn new(origin: Point, cell_size: Point) -> Self {
        Self { origin, cell_size }
    }

    /// Center of `hex` in pixel space.
    #[must_use]
    pub fn hex_to_pixel(&self, hex: HexCoordinate) -> Point {
        let f = POINTY.forward;
        let q = hex.q() as f32;
        let r = hex.r() as f32;
        Point::new(
            (f[0] * q + f[1] * r) * self.cell_size.x + self.origin.x,
            (f[2] * q + f[3] * r) * self.cell_size.y + self.origin.y,
        )
    }

    /// The cell containing `point`, rounded to the nearest center.
    #[must_use]
    pub fn pixel_to_hex(&self, point: Point) -> HexCoordinate {
        let b = POINTY.inverse;
        let x = (point.x - self.origin.x) / self.cell_size.x;
        let y = (point.y - self.origin.y) / self.cell_size.y;
        let q = b[0] * x + b[1] * y;
        let r = b[2] * x + b[3] * y;
        cube_round(q, r, -q - r)
    }

    /// Offset of corner `corner` (0..6) from a cell center.
    #[must_use]
    pub fn corner_offset(&self, corner: u8) -> Point {
        let angle = 2.0 * PI * (POINTY.start_angle + f32::from(corner)) / 6.0;
        Point::new(self.cell_size.x * angle.cos(), self.cell_size.y * angle.sin())
    }

    /// The six corners of `hex` in pixel space.
    #[must_use]
    pub fn polygon_corners(&self, hex: HexCoordinate) -> [Point; 6] {
        let center = self.hex_to_pixel(hex);
        let mut corners = [Point::default(); 6];
        for (i, corner) in corners.iter_mut().enumerate() {
            let offset = self.corner_offset(i as u8);
            *corner = Point::new(center.x + offset.x, center.y + offset.y);
        }
        corners
    }
}

/// Rounds fractional cube components, fixing up the component with the
/// largest rounding error so the sum stays zero.
fn cube_round(fq: f32, fr: f32, fs: f32) -> HexCoordinate {
    let mut q = fq.round();
    let mut r = fr.round();
    let s = fs.round();

    let dq = (q - fq).abs();
    let dr = (r - fr).abs();
    let ds = (s - fs).abs();

    if dq > dr && dq > ds {
        q = -r - s;
    } else if dr > ds {
        r = -q - s;
    }
    HexCoordinate::axial(q as i32, r as i32)
}
