use crate::{
    assets::store::{ImageStore, PreparedImage},
    foundation::core::{Canvas, Point, Vec2},
    foundation::error::{TrailError, TrailResult},
    render::composite::{PremulRgba8, over},
    render::timeline::SlotSnapshot,
};

/// Rendered frame, premultiplied RGBA8, row-major.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRGBA {
    pub fn pixel(&self, x: u32, y: u32) -> PremulRgba8 {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub background: PremulRgba8,
    /// Every trail image is drawn at this height; width follows its aspect ratio.
    pub image_height: f64,
    pub border_px: f64,
    pub border_rgba: PremulRgba8,
    pub corner_radius_px: f64,
    /// Card drawn for images that are missing from the store.
    pub placeholder_rgba: PremulRgba8,
    pub placeholder_aspect: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            background: [255, 255, 255, 255],
            image_height: 192.0,
            border_px: 2.0,
            border_rgba: [0, 0, 0, 255],
            corner_radius_px: 12.0,
            placeholder_rgba: [23, 23, 23, 255],
            placeholder_aspect: 0.75,
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> TrailResult<()> {
        if !self.image_height.is_finite() || self.image_height <= 0.0 {
            return Err(TrailError::validation("image_height must be > 0"));
        }
        if !self.placeholder_aspect.is_finite() || self.placeholder_aspect <= 0.0 {
            return Err(TrailError::validation("placeholder_aspect must be > 0"));
        }
        if self.border_px < 0.0 || self.corner_radius_px < 0.0 {
            return Err(TrailError::validation(
                "border_px and corner_radius_px must be >= 0",
            ));
        }
        Ok(())
    }
}

/// Composites `scene` (already in paint order) over the background.
#[tracing::instrument(skip(scene, store, settings), fields(slots = scene.len()))]
pub fn render_scene(
    canvas: Canvas,
    scene: &[SlotSnapshot],
    store: &ImageStore,
    settings: &RenderSettings,
) -> TrailResult<FrameRGBA> {
    settings.validate()?;
    let len = (canvas.width as usize)
        .checked_mul(canvas.height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| TrailError::render("canvas too large"))?;

    let mut frame = FrameRGBA {
        width: canvas.width,
        height: canvas.height,
        data: settings.background.repeat(len / 4),
    };
    for snap in scene {
        draw_slot(&mut frame, snap, store.get(&snap.image), settings);
    }
    Ok(frame)
}

struct Card<'a> {
    image: Option<&'a PreparedImage>,
    w: f64,
    h: f64,
    radius: f64,
    border: f64,
}

impl Card<'_> {
    /// Colour at element-local `(x, y)`, or `None` outside the rounded rect.
    fn shade(&self, x: f64, y: f64, settings: &RenderSettings) -> Option<PremulRgba8> {
        if x < 0.0 || y < 0.0 || x >= self.w || y >= self.h {
            return None;
        }
        let r = self.radius;
        let cx = x.clamp(r, self.w - r);
        let cy = y.clamp(r, self.h - r);
        let corner_dist = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
        if corner_dist > r {
            return None;
        }

        let b = self.border;
        let in_border = x < b
            || y < b
            || x >= self.w - b
            || y >= self.h - b
            || (corner_dist > 0.0 && corner_dist > r - b);
        if in_border {
            return Some(settings.border_rgba);
        }

        Some(match self.image {
            Some(img) => {
                let sx = ((x / self.w) * f64::from(img.width)).floor() as u32;
                let sy = ((y / self.h) * f64::from(img.height)).floor() as u32;
                img.pixel(sx.min(img.width - 1), sy.min(img.height - 1))
            }
            None => settings.placeholder_rgba,
        })
    }
}

fn draw_slot(
    frame: &mut FrameRGBA,
    snap: &SlotSnapshot,
    image: Option<&PreparedImage>,
    settings: &RenderSettings,
) {
    let h = settings.image_height;
    let w = h * image.map_or(settings.placeholder_aspect, PreparedImage::aspect);
    let card = Card {
        image,
        w,
        h,
        radius: settings.corner_radius_px.min(w * 0.5).min(h * 0.5),
        border: settings.border_px,
    };

    let affine = snap.transform.to_affine(snap.anchor, Vec2::new(w, h));
    if affine.determinant().abs() < 1e-12 {
        return;
    }
    let inv = affine.inverse();

    let corners = [
        affine * Point::new(0.0, 0.0),
        affine * Point::new(w, 0.0),
        affine * Point::new(0.0, h),
        affine * Point::new(w, h),
    ];
    let (mut x0, mut y0, mut x1, mut y1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for c in corners {
        x0 = x0.min(c.x);
        y0 = y0.min(c.y);
        x1 = x1.max(c.x);
        y1 = y1.max(c.y);
    }
    let x0 = x0.floor().max(0.0) as u32;
    let y0 = y0.floor().max(0.0) as u32;
    let x1 = (x1.ceil().max(0.0) as u32).min(frame.width);
    let y1 = (y1.ceil().max(0.0) as u32).min(frame.height);

    let opacity = snap.opacity as f32;
    for py in y0..y1 {
        for px in x0..x1 {
            let local = inv * Point::new(f64::from(px) + 0.5, f64::from(py) + 0.5);
            let Some(src) = card.shade(local.x, local.y, settings) else {
                continue;
            };
            let i = ((py as usize) * (frame.width as usize) + (px as usize)) * 4;
            let dst = [
                frame.data[i],
                frame.data[i + 1],
                frame.data[i + 2],
                frame.data[i + 3],
            ];
            frame.data[i..i + 4].copy_from_slice(&over(dst, src, opacity));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
