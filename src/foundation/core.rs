use crate::foundation::error::{TrailError, TrailResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Milliseconds on the host's virtual clock.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TimeMs(pub u64);

impl TimeMs {
    pub const ZERO: Self = Self(0);

    pub fn after(self, delta_ms: u64) -> Self {
        Self(self.0.saturating_add(delta_ms))
    }

    pub fn since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> TrailResult<Self> {
        if width == 0 || height == 0 {
            return Err(TrailError::validation("Canvas dimensions must be > 0"));
        }
        Ok(Self { width, height })
    }

    pub fn contains(self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < f64::from(self.width) && p.y < f64::from(self.height)
    }
}

/// Opaque handle to a displayable image (a path or URL, as supplied by the host).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One pointer-move sample in surface coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub t_ms: u64,
}

impl PointerSample {
    pub fn new(x: f64, y: f64, t_ms: u64) -> Self {
        Self { x, y, t_ms }
    }

    pub fn point(self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn time(self) -> TimeMs {
        TimeMs(self.t_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
