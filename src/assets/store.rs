use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::{
    assets::decode as assets_decode,
    config::model::{BackgroundConfig, LayerRole},
    foundation::{
        core::Viewport,
        error::{ParchmentError, ParchmentResult},
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Prepared raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Build an image from premultiplied RGBA8 bytes, checking the buffer size.
    pub fn from_premul_rgba8(
        width: u32,
        height: u32,
        rgba8_premul: Vec<u8>,
    ) -> ParchmentResult<Self> {
        let image = Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        };
        image.check()?;
        Ok(image)
    }

    /// Verify dimensions and buffer length agree.
    ///
    /// Fields are public, so an image built by hand may be inconsistent; surfaces and
    /// the compositor refuse such images instead of reading past the buffer.
    pub fn check(&self) -> ParchmentResult<()> {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return Err(ParchmentError::asset(format!(
                "image {width}x{height} has no pixels"
            )));
        }
        if width > Viewport::MAX_EDGE || height > Viewport::MAX_EDGE {
            return Err(ParchmentError::asset(format!(
                "image {width}x{height} exceeds {max}x{max}",
                max = Viewport::MAX_EDGE
            )));
        }
        let expected = (width as usize) * (height as usize) * 4;
        if self.rgba8_premul.len() != expected {
            return Err(ParchmentError::asset(format!(
                "expected {width}x{height} rgba8 buffer of {expected} bytes, got {}",
                self.rgba8_premul.len()
            )));
        }
        Ok(())
    }

    /// Single-color image, handy for placeholders and tests.
    pub fn solid(width: u32, height: u32, premul: [u8; 4]) -> ParchmentResult<Self> {
        let n = (width as usize) * (height as usize);
        Self::from_premul_rgba8(width, height, premul.repeat(n))
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = self.rgba8_premul.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }
}

#[derive(Clone, Debug, Default)]
/// Decoded layer images keyed by role.
///
/// A role without an entry is a layer whose image is not available; the compositor
/// skips it.
pub struct LayerImageStore {
    root: PathBuf,
    images: BTreeMap<LayerRole, PreparedImage>,
}

impl LayerImageStore {
    /// Empty store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            images: BTreeMap::new(),
        }
    }

    /// Read and decode every layer source in `config`, relative to `root`.
    ///
    /// Front-loads IO so drawing stays IO-free. Unreadable or undecodable files are
    /// logged and left out rather than failing the whole background.
    #[tracing::instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn prepare(config: &BackgroundConfig, root: impl AsRef<Path>) -> Self {
        let mut out = Self::new(root.as_ref());
        for layer in &config.layers {
            match out.load(&layer.source) {
                Ok(image) => {
                    tracing::debug!(
                        role = layer.role.name(),
                        width = image.width,
                        height = image.height,
                        "layer image ready"
                    );
                    out.images.insert(layer.role, image);
                }
                Err(err) => {
                    tracing::warn!(
                        role = layer.role.name(),
                        source = %layer.source,
                        error = %err,
                        "layer image unavailable; layer will be skipped"
                    );
                }
            }
        }
        out
    }

    /// Asset root used to resolve relative sources.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Image prepared for `role`, if any.
    pub fn get(&self, role: LayerRole) -> Option<&PreparedImage> {
        self.images.get(&role)
    }

    /// Insert or replace the image for `role`.
    pub fn insert(&mut self, role: LayerRole, image: PreparedImage) {
        self.images.insert(role, image);
    }

    /// Remove and return the image for `role`.
    pub fn take(&mut self, role: LayerRole) -> Option<PreparedImage> {
        self.images.remove(&role)
    }

    /// Number of roles with a prepared image.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// True when no image could be prepared.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn load(&self, source: &str) -> ParchmentResult<PreparedImage> {
        let path = self.resolve(source)?;
        let bytes =
            std::fs::read(&path).with_context(|| format!("read asset '{}'", path.display()))?;
        assets_decode::decode_image(&bytes)
            .map_err(|e| ParchmentError::asset(format!("decode '{}': {e}", path.display())))
    }

    fn resolve(&self, source: &str) -> ParchmentResult<PathBuf> {
        let rel = normalize_rel_path(source)?;
        Ok(self.root.join(rel))
    }
}

/// Normalize a relative asset path: forward slashes, no `.` segments, no escaping `..`,
/// no absolute paths.
pub fn normalize_rel_path(source: &str) -> ParchmentResult<String> {
    let s = source.trim().replace('\\', "/");
    if s.is_empty() {
        return Err(ParchmentError::validation("asset source must be non-empty"));
    }
    if s.starts_with('/') || s.contains(':') {
        return Err(ParchmentError::validation(format!(
            "asset source must be a relative path: '{source}'"
        )));
    }

    let mut parts: Vec<&str> = Vec::new();
    for seg in s.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(ParchmentError::validation(format!(
                        "asset source escapes the asset root: '{source}'"
                    )));
                }
            }
            _ => parts.push(seg),
        }
    }
    if parts.is_empty() {
        return Err(ParchmentError::validation(format!(
            "asset source resolves to nothing: '{source}'"
        )));
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
