use crate::{
    assets::store::{LayerImageStore, PreparedImage},
    config::model::{BackgroundConfig, BlendMode, LayerFit, LayerRole},
    foundation::core::{FrameIndex, Rgba8Premul, Vec2, Viewport},
    render::{
        surface::{DrawImage, DrawSurface},
        tiling::{self, TilePlacement},
    },
};

/// One image layer owned by the compositor.
#[derive(Clone, Debug)]
pub struct Layer {
    pub role: LayerRole,
    pub fit: LayerFit,
    pub opacity: f32,
    pub blend: BlendMode,
    /// Parallax drift in pixels per composed frame.
    pub drift: Vec2,
    /// `None` until the image is available; the layer is skipped meanwhile.
    pub image: Option<PreparedImage>,
}

impl Layer {
    /// Where this layer's image lands at `frame`. `None` when the image is missing.
    pub fn placement(&self, viewport: Viewport, frame: FrameIndex) -> Option<TilePlacement> {
        let image = self.image.as_ref()?;

        let image_size = Vec2::new(f64::from(image.width), f64::from(image.height));
        let tile = match self.fit {
            LayerFit::Stretch => Vec2::new(f64::from(viewport.width), f64::from(viewport.height)),
            LayerFit::Tile => image_size,
        };
        let offset = self.drift * (frame.0 as f64);
        tiling::cover(viewport, image_size, tile, offset)
    }
}

/// What a single composite pass did, per layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawReport {
    /// Layers that were drawn, in draw order.
    pub drawn: Vec<LayerRole>,
    /// Configured layers skipped because their image is not available.
    pub skipped: Vec<LayerRole>,
}

/// Draws the layered background back-to-front onto a [`DrawSurface`].
///
/// Layers are drawn in [`LayerRole`] order regardless of configuration order: paper,
/// far dust, near dust, vignette, scanlines.
#[derive(Clone, Debug)]
pub struct Compositor {
    clear: Rgba8Premul,
    layers: Vec<Layer>,
    frame: FrameIndex,
}

impl Compositor {
    /// Build layers from `config`, taking ownership of whatever images `images` holds.
    pub fn new(config: &BackgroundConfig, mut images: LayerImageStore) -> Self {
        let mut layers: Vec<Layer> = config
            .layers
            .iter()
            .map(|l| Layer {
                role: l.role,
                fit: l.fit,
                opacity: l.opacity,
                blend: l.blend,
                drift: l.drift_px_per_frame,
                image: images.take(l.role).filter(|img| img.check().is_ok()),
            })
            .collect();
        layers.sort_by_key(|l| l.role);

        let [r, g, b, a] = config.clear_rgba;
        Self {
            clear: Rgba8Premul::from_straight_rgba(r, g, b, a),
            layers,
            frame: FrameIndex::default(),
        }
    }

    /// Layers in draw order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Frame that the next [`Compositor::draw`] will compose.
    pub fn frame(&self) -> FrameIndex {
        self.frame
    }

    /// Supply an image that was not available at construction.
    ///
    /// Returns `false` when no layer is configured for `role` or the image's buffer does
    /// not match its dimensions.
    pub fn attach_image(&mut self, role: LayerRole, image: PreparedImage) -> bool {
        if let Err(err) = image.check() {
            tracing::warn!(role = role.name(), error = %err, "rejected late layer image");
            return false;
        }
        match self.layers.iter_mut().find(|l| l.role == role) {
            Some(layer) => {
                layer.image = Some(image);
                true
            }
            None => false,
        }
    }

    /// Compose the current frame and advance the frame counter.
    pub fn draw(&mut self, surface: &mut dyn DrawSurface) -> DrawReport {
        let report = self.draw_frame(surface, self.frame);
        self.frame = self.frame.next();
        report
    }

    /// Compose a specific frame without touching the frame counter.
    pub fn draw_frame(&self, surface: &mut dyn DrawSurface, frame: FrameIndex) -> DrawReport {
        let viewport = surface.viewport();
        surface.clear(self.clear.to_array());

        let mut report = DrawReport::default();
        for layer in &self.layers {
            let Some(image) = &layer.image else {
                report.skipped.push(layer.role);
                continue;
            };
            if let Some(p) = layer.placement(viewport, frame) {
                surface.draw_image(
                    image,
                    &DrawImage {
                        transform: p.transform,
                        dst: p.dst,
                        opacity: layer.opacity,
                        blend: layer.blend,
                    },
                );
            }
            report.drawn.push(layer.role);
        }
        surface.flush();

        tracing::trace!(
            frame = frame.0,
            drawn = report.drawn.len(),
            skipped = report.skipped.len(),
            "composited background"
        );
        report
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
