use crate::{
    animation::ease::Ease,
    foundation::core::{Affine, Point, TimeMs, Vec2},
};

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

/// The animatable part of a slot's geometry. Placement (anchor point, paint
/// order) is never animated.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SlotTransform {
    /// Translation as a fraction of the element size, like CSS `translate(-50%, -50%)`.
    pub offset: Vec2,
    pub scale: f64,
    pub rotation_deg: f64,
}

impl Default for SlotTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            rotation_deg: 0.0,
        }
    }
}

impl Lerp for SlotTransform {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            offset: <Vec2 as Lerp>::lerp(&a.offset, &b.offset, t),
            scale: a.scale + (b.scale - a.scale) * t,
            rotation_deg: a.rotation_deg + (b.rotation_deg - a.rotation_deg) * t,
        }
    }
}

impl SlotTransform {
    /// Maps element-local coordinates (`0..size`) onto the surface for an
    /// element whose top-left corner is placed at `anchor`. Scale and rotation
    /// pivot on the element centre.
    pub fn to_affine(self, anchor: Point, size: Vec2) -> Affine {
        let half = size * 0.5;
        let shift = Vec2::new(self.offset.x * size.x, self.offset.y * size.y);

        // T(anchor + half + shift) * S(scale) * R(rot) * T(-half)
        Affine::translate(anchor.to_vec2() + half + shift)
            * Affine::scale(self.scale)
            * Affine::rotate(self.rotation_deg.to_radians())
            * Affine::translate(-half)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tween<T> {
    pub from: T,
    pub to: T,
}

impl<T: Lerp> Tween<T> {
    pub fn new(from: T, to: T) -> Self {
        Self { from, to }
    }

    pub fn at(&self, eased: f64) -> T {
        T::lerp(&self.from, &self.to, eased)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationPhase {
    Entrance,
    Exit,
}

/// A declarative property transition for one slot's render target.
///
/// The trail core only ever emits these; how they are painted is up to the
/// [`Animator`](crate::Animator) that receives them.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationRequest {
    pub slot: usize,
    pub phase: AnimationPhase,
    pub start: TimeMs,
    pub duration_ms: u64,
    pub ease: Ease,
    pub opacity: Tween<f64>,
    /// `None` leaves the transform where the previous request put it.
    pub transform: Option<Tween<SlotTransform>>,
}

impl AnimationRequest {
    pub fn end(&self) -> TimeMs {
        self.start.after(self.duration_ms)
    }

    /// Eased progress in `[0, 1]`; holds at the endpoints outside the active window.
    pub fn progress(&self, at: TimeMs) -> f64 {
        if at <= self.start {
            return if self.duration_ms == 0 && at == self.start {
                1.0
            } else {
                0.0
            };
        }
        if self.duration_ms == 0 || at >= self.end() {
            return 1.0;
        }
        let t = (at.since(self.start) as f64) / (self.duration_ms as f64);
        self.ease.apply(t)
    }

    pub fn sample_opacity(&self, at: TimeMs) -> f64 {
        self.opacity.at(self.progress(at)).clamp(0.0, 1.0)
    }

    pub fn sample_transform(&self, at: TimeMs) -> Option<SlotTransform> {
        let p = self.progress(at);
        self.transform.as_ref().map(|tw| tw.at(p))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/request.rs"]
mod tests;
