use crate::foundation::error::{ParchmentError, ParchmentResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Index of a composed frame (the number of draws performed before it).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// The frame after this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Pixel dimensions of the drawing surface. Fixed for the lifetime of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Largest supported edge length in pixels.
    pub const MAX_EDGE: u32 = u16::MAX as u32;

    /// Build a viewport, rejecting empty or oversized dimensions.
    pub fn new(width: u32, height: u32) -> ParchmentResult<Self> {
        if width == 0 || height == 0 {
            return Err(ParchmentError::validation(
                "viewport width and height must be > 0",
            ));
        }
        if width > Self::MAX_EDGE || height > Self::MAX_EDGE {
            return Err(ParchmentError::validation(format!(
                "viewport {width}x{height} exceeds {max}x{max}",
                max = Self::MAX_EDGE
            )));
        }
        Ok(Self { width, height })
    }

    /// Full-surface rectangle `[0,W]x[0,H]`.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Whether `r` lies entirely within the surface bounds.
    pub fn contains_rect(self, r: Rect) -> bool {
        let b = self.rect();
        r.x0 >= b.x0 && r.y0 >= b.y0 && r.x1 <= b.x1 && r.y1 <= b.y1
    }

    /// Number of pixels covered by the viewport.
    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
