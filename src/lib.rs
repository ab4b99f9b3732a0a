//! Parchment renders an animated aged-paper background.
//!
//! A static paper texture is overlaid with two parallax dust layers, a vignette and
//! scanlines, recomposited on a frame loop whose pace is smoothed against jitter.
//!
//! # Pipeline overview
//!
//! 1. **Prepare**: `BackgroundConfig + asset root -> LayerImageStore` (all IO happens here)
//! 2. **Compose**: `Compositor` draws layers back-to-front onto a [`DrawSurface`]
//! 3. **Pace**: `FrameScheduler` turns host frame callbacks into draws via an
//!    exponential moving average of frame intervals
//!
//! Hosts plug in through [`FrameHost`]; [`TimerHost`] is the fixed-interval fallback
//! for environments without a refresh callback.
//!
//! Composing and pacing never fail: a layer whose image is unavailable is left out of
//! the frame. Errors are confined to setup (config parsing, validation, file IO).
#![forbid(unsafe_code)]

mod assets;
mod config;
mod foundation;
mod pipeline;
mod render;
mod schedule;

pub use assets::decode::decode_image;
pub use assets::store::{LayerImageStore, PreparedImage, normalize_rel_path};
pub use config::model::{
    BackgroundConfig, BlendMode, LayerConfig, LayerFit, LayerRole, SchedulerConfig,
};
pub use foundation::core::{Affine, FrameIndex, Point, Rect, Rgba8Premul, Vec2, Viewport};
pub use foundation::error::{ParchmentError, ParchmentResult};
pub use pipeline::Background;
pub use render::compositor::{Compositor, DrawReport, Layer};
pub use render::surface::{DrawImage, DrawSurface, FrameRGBA, PixmapSurface};
pub use render::tiling::{TilePlacement, cover};
pub use schedule::host::{CancelToken, Clock, FnHost, FrameHost, SystemClock, TimerHost};
pub use schedule::runner::{DrawTick, FrameScheduler, SchedulerStats};
pub use schedule::smoothing::FrameSmoother;
