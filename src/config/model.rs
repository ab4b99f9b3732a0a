use std::path::Path;

use anyhow::Context;

use crate::foundation::{
    core::{Vec2, Viewport},
    error::{ParchmentError, ParchmentResult},
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Complete description of an animated background.
///
/// A config is a pure data model that can be built in code or loaded from JSON
/// (see [`BackgroundConfig::from_json_path`]). Layer sources are paths relative to an
/// asset root chosen by the caller; the CLI uses the config file's directory.
pub struct BackgroundConfig {
    /// Drawing surface dimensions, read once at startup.
    pub viewport: Viewport,
    /// Straight-alpha RGBA8 color the surface is cleared to before each draw.
    #[serde(default = "default_clear_rgba")]
    pub clear_rgba: [u8; 4],
    /// Layer table. Draw order is fixed by [`LayerRole`], not by position here.
    pub layers: Vec<LayerConfig>,
    /// Frame pacing parameters.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One image layer of the background.
pub struct LayerConfig {
    /// Which slot of the composite this layer fills.
    pub role: LayerRole,
    /// Image path relative to the asset root.
    pub source: String,
    /// How the image covers the surface.
    #[serde(default)]
    pub fit: LayerFit,
    /// Layer opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Pixel blend mode against what is already on the surface.
    #[serde(default)]
    pub blend: BlendMode,
    /// Parallax drift in pixels per composed frame.
    #[serde(default)]
    pub drift_px_per_frame: Vec2,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
/// Layer slot. Declaration order is the back-to-front draw order.
pub enum LayerRole {
    /// Base paper texture.
    Paper,
    /// Slow, distant dust.
    DustFar,
    /// Faster, nearer dust.
    DustNear,
    /// Darkened edges overlay.
    Vignette,
    /// CRT-like horizontal lines overlay.
    Scanlines,
}

impl LayerRole {
    /// All roles in draw order.
    pub const ALL: [LayerRole; 5] = [
        LayerRole::Paper,
        LayerRole::DustFar,
        LayerRole::DustNear,
        LayerRole::Vignette,
        LayerRole::Scanlines,
    ];

    /// Stable lowercase name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Paper => "paper",
            Self::DustFar => "dust_far",
            Self::DustNear => "dust_near",
            Self::Vignette => "vignette",
            Self::Scanlines => "scanlines",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// How a layer image covers the surface.
pub enum LayerFit {
    /// Scale the image to the full surface.
    #[default]
    Stretch,
    /// Repeat the image at its native size.
    Tile,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Blend mode used when drawing a layer.
pub enum BlendMode {
    /// Source-over.
    #[default]
    Normal,
    /// Lightens: `s + d - s*d`.
    Screen,
    /// Darkens: `s*d` plus the uncovered parts of each side.
    Multiply,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Frame pacing parameters.
pub struct SchedulerConfig {
    /// Window of the exponential moving average, in samples.
    #[serde(default = "default_filter_strength")]
    pub filter_strength: f64,
    /// Smoothed frame time (ms) that must be exceeded before a draw.
    #[serde(default = "default_threshold_ms")]
    pub threshold_ms: f64,
    /// Interval of the timer fallback when the host has no refresh callback.
    #[serde(default = "default_fallback_interval_ms")]
    pub fallback_interval_ms: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            filter_strength: default_filter_strength(),
            threshold_ms: default_threshold_ms(),
            fallback_interval_ms: default_fallback_interval_ms(),
        }
    }
}

impl SchedulerConfig {
    /// Validate pacing parameters.
    pub fn validate(&self) -> ParchmentResult<()> {
        if !self.filter_strength.is_finite() || self.filter_strength < 1.0 {
            return Err(ParchmentError::validation(
                "scheduler.filter_strength must be finite and >= 1",
            ));
        }
        if !self.threshold_ms.is_finite() || self.threshold_ms <= 0.0 {
            return Err(ParchmentError::validation(
                "scheduler.threshold_ms must be finite and > 0",
            ));
        }
        if !self.fallback_interval_ms.is_finite() || self.fallback_interval_ms <= 0.0 {
            return Err(ParchmentError::validation(
                "scheduler.fallback_interval_ms must be finite and > 0",
            ));
        }
        Ok(())
    }
}

fn default_clear_rgba() -> [u8; 4] {
    [0, 0, 0, 255]
}

fn default_opacity() -> f32 {
    1.0
}

fn default_filter_strength() -> f64 {
    20.0
}

fn default_threshold_ms() -> f64 {
    1.0
}

fn default_fallback_interval_ms() -> f64 {
    33.0
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        fn layer(
            role: LayerRole,
            source: &str,
            fit: LayerFit,
            opacity: f32,
            blend: BlendMode,
            drift: Vec2,
        ) -> LayerConfig {
            LayerConfig {
                role,
                source: source.to_string(),
                fit,
                opacity,
                blend,
                drift_px_per_frame: drift,
            }
        }

        Self {
            viewport: Viewport {
                width: 1280,
                height: 720,
            },
            clear_rgba: default_clear_rgba(),
            layers: vec![
                layer(
                    LayerRole::Paper,
                    "img/old-paper.jpg",
                    LayerFit::Stretch,
                    1.0,
                    BlendMode::Normal,
                    Vec2::ZERO,
                ),
                layer(
                    LayerRole::DustFar,
                    "img/dust-far.jpg",
                    LayerFit::Tile,
                    0.35,
                    BlendMode::Screen,
                    Vec2::new(0.15, 0.05),
                ),
                layer(
                    LayerRole::DustNear,
                    "img/dust-near.jpg",
                    LayerFit::Tile,
                    0.5,
                    BlendMode::Screen,
                    Vec2::new(0.4, 0.12),
                ),
                layer(
                    LayerRole::Vignette,
                    "img/vignette.png",
                    LayerFit::Stretch,
                    0.85,
                    BlendMode::Normal,
                    Vec2::ZERO,
                ),
                layer(
                    LayerRole::Scanlines,
                    "img/scanlines.png",
                    LayerFit::Stretch,
                    0.3,
                    BlendMode::Multiply,
                    Vec2::ZERO,
                ),
            ],
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl BackgroundConfig {
    /// Parse a config from JSON text. Does not validate.
    pub fn from_json_str(json: &str) -> ParchmentResult<Self> {
        serde_json::from_str(json).map_err(|e| ParchmentError::serde(e.to_string()))
    }

    /// Read and parse a config file, then validate it.
    pub fn from_json_path(path: &Path) -> ParchmentResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg = Self::from_json_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> ParchmentResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ParchmentError::serde(e.to_string()))
    }

    /// Look up the layer configured for `role`.
    pub fn layer(&self, role: LayerRole) -> Option<&LayerConfig> {
        self.layers.iter().find(|l| l.role == role)
    }

    /// Validate viewport, layers and scheduler parameters.
    pub fn validate(&self) -> ParchmentResult<()> {
        Viewport::new(self.viewport.width, self.viewport.height)?;

        let mut seen = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            if seen.contains(&layer.role) {
                return Err(ParchmentError::validation(format!(
                    "layer role '{}' is configured more than once",
                    layer.role.name()
                )));
            }
            seen.push(layer.role);

            if layer.source.trim().is_empty() {
                return Err(ParchmentError::validation(format!(
                    "layer '{}' source must be non-empty",
                    layer.role.name()
                )));
            }
            if !layer.opacity.is_finite() || !(0.0..=1.0).contains(&layer.opacity) {
                return Err(ParchmentError::validation(format!(
                    "layer '{}' opacity must be in [0, 1]",
                    layer.role.name()
                )));
            }
            let d = layer.drift_px_per_frame;
            if !d.x.is_finite() || !d.y.is_finite() {
                return Err(ParchmentError::validation(format!(
                    "layer '{}' drift must be finite",
                    layer.role.name()
                )));
            }
        }

        self.scheduler.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/model.rs"]
mod tests;
