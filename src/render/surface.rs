use std::{path::Path, sync::Arc};

use anyhow::Context;

use crate::{
    assets::{decode::unpremultiply_rgba8_in_place, store::PreparedImage},
    config::model::BlendMode,
    foundation::{
        core::{Affine, Rect, Viewport},
        error::{ParchmentError, ParchmentResult},
    },
};

/// One image fill: `dst` on the surface is painted with the image mapped through
/// `transform`, repeating beyond the image bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawImage {
    /// Image pixel space to surface pixel space.
    pub transform: Affine,
    /// Destination rectangle in surface pixel space.
    pub dst: Rect,
    /// Layer opacity in `[0, 1]`.
    pub opacity: f32,
    /// Blend mode against existing surface pixels.
    pub blend: BlendMode,
}

/// A 2D immediate-mode drawing surface addressable by pixel dimensions.
///
/// Drawing has no failure mode: degenerate or out-of-bounds requests simply draw less.
pub trait DrawSurface {
    /// Surface dimensions.
    fn viewport(&self) -> Viewport;

    /// Fill the whole surface with a premultiplied color.
    fn clear(&mut self, premul: [u8; 4]);

    /// Paint `cmd.dst` with `image`.
    fn draw_image(&mut self, image: &PreparedImage, cmd: &DrawImage);

    /// Make everything drawn since the last clear visible. Called once per composite.
    fn flush(&mut self) {}
}

#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Convert to straight alpha in place. No-op when already straight.
    pub fn into_straight(mut self) -> Self {
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut self.data);
            self.premultiplied = false;
        }
        self
    }

    /// Write as a straight-alpha PNG, creating parent directories as needed.
    pub fn save_png(&self, path: &Path) -> ParchmentResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        let straight = self.clone().into_straight();
        image::save_buffer_with_format(
            path,
            &straight.data,
            straight.width,
            straight.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

/// Image paints kept alive across frames, keyed by the pixel buffer they were built from.
const PAINT_CACHE_LIMIT: usize = 16;

/// CPU surface backed by `vello_cpu`. Sampling is nearest-neighbor.
///
/// Draw calls are recorded into a render context and rasterized into the pixmap on
/// [`DrawSurface::flush`].
pub struct PixmapSurface {
    viewport: Viewport,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    paints: Vec<(Arc<Vec<u8>>, vello_cpu::Image)>,
}

impl std::fmt::Debug for PixmapSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixmapSurface")
            .field("viewport", &self.viewport)
            .field("cached_paints", &self.paints.len())
            .finish_non_exhaustive()
    }
}

impl PixmapSurface {
    pub fn new(viewport: Viewport) -> ParchmentResult<Self> {
        let (w, h) = pixmap_size(viewport.width, viewport.height)?;
        Ok(Self {
            viewport,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            paints: Vec::new(),
        })
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.viewport.width || y >= self.viewport.height {
            return None;
        }
        let i = ((y as usize) * (self.viewport.width as usize) + (x as usize)) * 4;
        let p = self.data().get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Raw premultiplied RGBA8 bytes, row-major, as of the last flush.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub fn readback(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.viewport.width,
            height: self.viewport.height,
            data: self.data().to_vec(),
            premultiplied: true,
        }
    }

    fn paint_for(&mut self, image: &PreparedImage) -> ParchmentResult<vello_cpu::Image> {
        if let Some((_, paint)) = self
            .paints
            .iter()
            .find(|(buf, _)| Arc::ptr_eq(buf, &image.rgba8_premul))
        {
            return Ok(paint.clone());
        }

        let pixmap = image_to_pixmap(image)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default()
                .with_extend(vello_cpu::peniko::Extend::Repeat)
                .with_quality(vello_cpu::peniko::ImageQuality::Low),
        };
        if self.paints.len() >= PAINT_CACHE_LIMIT {
            self.paints.remove(0);
        }
        self.paints.push((Arc::clone(&image.rgba8_premul), paint.clone()));
        Ok(paint)
    }
}

impl DrawSurface for PixmapSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn clear(&mut self, premul: [u8; 4]) {
        self.ctx.reset();
        for px in self.pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&premul);
        }

        let mut straight = premul;
        unpremultiply_rgba8_in_place(&mut straight);
        let [r, g, b, a] = straight;
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        self.ctx.fill_rect(&rect_to_cpu(self.viewport.rect()));
    }

    fn draw_image(&mut self, image: &PreparedImage, cmd: &DrawImage) {
        let Some(area) = fill_area(self.viewport, cmd) else {
            return;
        };
        let opacity = if cmd.opacity.is_finite() {
            cmd.opacity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if opacity <= 0.0 {
            return;
        }
        let paint = match self.paint_for(image) {
            Ok(paint) => paint,
            Err(err) => {
                tracing::warn!(error = %err, "image not drawable; skipped");
                return;
            }
        };

        self.ctx.set_transform(affine_to_cpu(cmd.transform));
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(paint);

        let mix = match cmd.blend {
            BlendMode::Normal => None,
            BlendMode::Screen => Some(vello_cpu::peniko::Mix::Screen),
            BlendMode::Multiply => Some(vello_cpu::peniko::Mix::Multiply),
        };
        if let Some(mix) = mix {
            self.ctx.push_blend_layer(vello_cpu::peniko::BlendMode::new(
                mix,
                vello_cpu::peniko::Compose::SrcOver,
            ));
        }
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        self.ctx.fill_rect(&rect_to_cpu(area));
        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
        if mix.is_some() {
            self.ctx.pop_layer();
        }
    }

    fn flush(&mut self) {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        self.ctx.reset();
    }
}

/// Image-space rectangle to fill so that its image covers `cmd.dst` clipped to the
/// surface. `None` when nothing would be drawn.
fn fill_area(viewport: Viewport, cmd: &DrawImage) -> Option<Rect> {
    let finite = |r: Rect| {
        r.x0.is_finite() && r.y0.is_finite() && r.x1.is_finite() && r.y1.is_finite()
    };
    let det = cmd.transform.determinant();
    if !finite(cmd.dst) || !cmd.transform.is_finite() || !det.is_finite() || det == 0.0 {
        return None;
    }
    let clip = cmd.dst.intersect(viewport.rect());
    if clip.width() <= 0.0 || clip.height() <= 0.0 {
        return None;
    }
    let area = cmd.transform.inverse().transform_rect_bbox(clip);
    finite(area).then_some(area)
}

fn pixmap_size(width: u32, height: u32) -> ParchmentResult<(u16, u16)> {
    let w = u16::try_from(width)
        .map_err(|_| ParchmentError::validation(format!("width {width} exceeds u16")))?;
    let h = u16::try_from(height)
        .map_err(|_| ParchmentError::validation(format!("height {height} exceeds u16")))?;
    Ok((w, h))
}

fn image_to_pixmap(image: &PreparedImage) -> ParchmentResult<vello_cpu::Pixmap> {
    image.check()?;
    let (w, h) = pixmap_size(image.width, image.height)?;

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(image.rgba8_premul.len() / 4);
    for px in image.rgba8_premul.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        });
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
