use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{
    foundation::core::ImageRef,
    foundation::error::{TrailError, TrailResult},
    foundation::math::premultiply_rgba8_in_place,
};

/// Decoded image, premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = &self.rgba8_premul[i..i + 4];
        [px[0], px[1], px[2], px[3]]
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> TrailResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(TrailError::validation("image has zero size"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Preload progress after each image, successful or not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct LoadProgress {
    pub loaded: usize,
    pub total: usize,
    /// `round(loaded / total * 100)`.
    pub percent: u8,
}

impl LoadProgress {
    fn new(loaded: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            ((loaded as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            loaded,
            total,
            percent,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.loaded >= self.total
    }
}

/// Decoded images keyed by reference. References that failed to load are
/// remembered so renderers can draw a placeholder instead.
#[derive(Clone, Debug, Default)]
pub struct ImageStore {
    images: HashMap<ImageRef, PreparedImage>,
    missing: HashSet<ImageRef>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image_ref: ImageRef, image: PreparedImage) {
        self.missing.remove(&image_ref);
        self.images.insert(image_ref, image);
    }

    pub fn get(&self, image_ref: &ImageRef) -> Option<&PreparedImage> {
        self.images.get(image_ref)
    }

    pub fn is_missing(&self, image_ref: &ImageRef) -> bool {
        self.missing.contains(image_ref)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Loads every reference relative to `root` (or inline, for `data:`
    /// references), reporting progress after each one. A failure counts toward progress and is logged; it never
    /// aborts the preload.
    #[tracing::instrument(skip(refs, on_progress), fields(total = refs.len()))]
    pub fn preload(
        refs: &[ImageRef],
        root: &Path,
        mut on_progress: impl FnMut(LoadProgress),
    ) -> Self {
        let mut store = Self::new();
        let total = refs.len();
        for (i, r) in refs.iter().enumerate() {
            if store.get(r).is_none() && !store.is_missing(r) {
                match load_ref(r, root) {
                    Ok(img) => store.insert(r.clone(), img),
                    Err(err) => {
                        tracing::warn!(image = %r, error = %err, "image failed to load");
                        store.missing.insert(r.clone());
                    }
                }
            }
            on_progress(LoadProgress::new(i + 1, total));
        }
        store
    }
}

/// Payload bytes of a base64 `data:image/...` reference.
pub fn decode_data_url(image_ref: &ImageRef) -> TrailResult<Vec<u8>> {
    let s = image_ref.as_str();
    let rest = s
        .strip_prefix("data:")
        .ok_or_else(|| TrailError::validation("not a data: reference"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| TrailError::validation("data: reference has no payload"))?;
    let mut parts = header.split(';');
    let media_type = parts.next().unwrap_or_default();
    if !media_type.is_empty() && !media_type.starts_with("image/") {
        return Err(TrailError::validation(format!(
            "data: reference is '{media_type}', not an image"
        )));
    }
    if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(TrailError::validation(
            "only base64 data: references are supported",
        ));
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .context("decode base64 data: payload")?;
    Ok(bytes)
}

pub fn resolve_image_path(image_ref: &ImageRef, root: &Path) -> TrailResult<PathBuf> {
    let s = image_ref.as_str();
    if s.is_empty() {
        return Err(TrailError::validation("empty image reference"));
    }
    if s.contains("://") || s.starts_with("data:") {
        return Err(TrailError::validation(format!(
            "only local image files can be loaded (got '{s}')"
        )));
    }
    let p = Path::new(s);
    Ok(if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    })
}

fn load_ref(image_ref: &ImageRef, root: &Path) -> TrailResult<PreparedImage> {
    if image_ref.as_str().starts_with("data:") {
        return decode_image(&decode_data_url(image_ref)?);
    }
    let path = resolve_image_path(image_ref, root)?;
    let bytes =
        std::fs::read(&path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
