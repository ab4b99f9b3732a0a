use crate::foundation::core::{Affine, Rect, Vec2, Viewport};

/// Where a repeating image paint lands on the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilePlacement {
    /// Maps image pixels to surface pixels. The image repeats beyond its bounds.
    pub transform: Affine,
    /// Surface-space area to fill. Always the full viewport.
    pub dst: Rect,
}

impl TilePlacement {
    /// Image-space rectangle that `transform` maps onto `dst`.
    pub fn src(&self) -> Rect {
        self.transform.inverse().transform_rect_bbox(self.dst)
    }
}

/// Cover `viewport` with a `tile` sized surface-space cell showing the whole
/// `image_size`, repeated and shifted by `offset`.
///
/// The offset is wrapped into one tile so long-running drift keeps its precision.
/// Returns `None` for sub-pixel or non-finite sizes.
pub fn cover(
    viewport: Viewport,
    image_size: Vec2,
    tile: Vec2,
    offset: Vec2,
) -> Option<TilePlacement> {
    let valid = |v: Vec2| v.x.is_finite() && v.y.is_finite() && v.x >= 1.0 && v.y >= 1.0;
    if !valid(image_size) || !valid(tile) {
        return None;
    }
    let offset = if offset.x.is_finite() && offset.y.is_finite() {
        offset
    } else {
        Vec2::ZERO
    };

    let shift = Vec2::new(offset.x.rem_euclid(tile.x), offset.y.rem_euclid(tile.y));
    let transform = Affine::translate(shift)
        * Affine::scale_non_uniform(tile.x / image_size.x, tile.y / image_size.y);
    Some(TilePlacement {
        transform,
        dst: viewport.rect(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/tiling.rs"]
mod tests;
