use std::path::Path;

use crate::{
    assets::store::LayerImageStore,
    config::model::BackgroundConfig,
    foundation::{core::FrameIndex, error::ParchmentResult},
    render::{
        compositor::{Compositor, DrawReport},
        surface::{FrameRGBA, PixmapSurface},
    },
    schedule::{
        host::FrameHost,
        runner::{DrawTick, FrameScheduler, SchedulerStats},
    },
};

/// A ready-to-run background: compositor plus the CPU surface it draws on.
#[derive(Debug)]
pub struct Background {
    config: BackgroundConfig,
    compositor: Compositor,
    surface: PixmapSurface,
}

impl Background {
    /// Validate `config`, load its layer images from `asset_root`, and size the surface.
    ///
    /// Missing images do not fail construction; those layers stay blank.
    #[tracing::instrument(skip_all, fields(w = config.viewport.width, h = config.viewport.height))]
    pub fn load(config: BackgroundConfig, asset_root: &Path) -> ParchmentResult<Self> {
        config.validate()?;
        let images = LayerImageStore::prepare(&config, asset_root);
        tracing::info!(
            ready = images.len(),
            configured = config.layers.len(),
            "layer images prepared"
        );
        Self::with_images(config, images)
    }

    /// Build from already prepared images. Only the viewport is checked.
    pub fn with_images(
        config: BackgroundConfig,
        images: LayerImageStore,
    ) -> ParchmentResult<Self> {
        let surface = PixmapSurface::new(config.viewport)?;
        let compositor = Compositor::new(&config, images);
        Ok(Self {
            config,
            compositor,
            surface,
        })
    }

    pub fn config(&self) -> &BackgroundConfig {
        &self.config
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn compositor_mut(&mut self) -> &mut Compositor {
        &mut self.compositor
    }

    pub fn surface(&self) -> &PixmapSurface {
        &self.surface
    }

    /// Compose `frame` and read it back.
    pub fn render_frame(&mut self, frame: FrameIndex) -> FrameRGBA {
        self.compositor.draw_frame(&mut self.surface, frame);
        self.surface.readback()
    }

    /// Compose the next frame in sequence.
    pub fn draw_next(&mut self) -> DrawReport {
        self.compositor.draw(&mut self.surface)
    }

    /// Run the paced loop: every due draw composes the next frame, then hands the
    /// surface to `present`.
    pub fn run<H, P>(
        &mut self,
        scheduler: &mut FrameScheduler,
        host: &mut H,
        mut present: P,
    ) -> ParchmentResult<SchedulerStats>
    where
        H: FrameHost + ?Sized,
        P: FnMut(DrawTick, &PixmapSurface) -> ParchmentResult<()>,
    {
        scheduler.run(host, |tick| {
            self.compositor.draw(&mut self.surface);
            present(tick, &self.surface)
        })
    }
}
