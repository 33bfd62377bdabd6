use std::collections::BTreeMap;

use crate::{
    animation::animator::Animator,
    animation::request::{AnimationRequest, SlotTransform},
    foundation::core::{ImageRef, Point, TimeMs},
};

/// What one slot looks like at a given instant.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SlotSnapshot {
    pub slot: usize,
    pub image: ImageRef,
    /// Placement point; the transform's offset decides how the image sits on it.
    pub anchor: Point,
    pub stack_order: u64,
    pub opacity: f64,
    pub transform: SlotTransform,
}

#[derive(Clone, Debug)]
enum TrackEvent {
    Place {
        at: TimeMs,
        image: ImageRef,
        position: Point,
        stack_order: u64,
    },
    Animate(AnimationRequest),
    Rebind(TimeMs, ImageRef),
    Cancel(TimeMs),
    Release(TimeMs),
}

impl TrackEvent {
    fn at(&self) -> TimeMs {
        match self {
            Self::Place { at, .. }
            | Self::Rebind(at, _)
            | Self::Cancel(at)
            | Self::Release(at) => *at,
            Self::Animate(req) => req.start,
        }
    }
}

/// An [`Animator`] that remembers everything and can be sampled at any time
/// afterwards. Sampling is read-only, so frames can be produced in parallel.
#[derive(Clone, Debug, Default)]
pub struct SceneTimeline {
    tracks: BTreeMap<usize, Vec<TrackEvent>>,
    end: TimeMs,
}

struct Placed<'a> {
    image: &'a ImageRef,
    position: Point,
    stack_order: u64,
}

// Value currently driving a property: a running tween, or a value frozen by
// a cancellation.
enum Driver<'a, T> {
    Held(T),
    Tween(&'a AnimationRequest),
}

impl SceneTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time at which the last recorded animation finishes.
    pub fn end(&self) -> TimeMs {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    fn track(&mut self, slot: usize) -> &mut Vec<TrackEvent> {
        self.tracks.entry(slot).or_default()
    }

    fn push(&mut self, slot: usize, ev: TrackEvent) {
        self.end = self.end.max(ev.at());
        if let TrackEvent::Animate(req) = &ev {
            self.end = self.end.max(req.end());
        }
        self.track(slot).push(ev);
    }

    /// Visible slots at `at`, in paint order (lowest stack order first).
    pub fn sample(&self, at: TimeMs) -> Vec<SlotSnapshot> {
        let mut out: Vec<SlotSnapshot> = self
            .tracks
            .iter()
            .filter_map(|(&slot, events)| sample_track(slot, events, at))
            .filter(|s| s.opacity > 0.0)
            .collect();
        out.sort_by_key(|s| (s.stack_order, s.slot));
        out
    }
}

fn sample_track(slot: usize, events: &[TrackEvent], at: TimeMs) -> Option<SlotSnapshot> {
    let mut placed: Option<Placed<'_>> = None;
    let mut opacity: Driver<'_, f64> = Driver::Held(0.0);
    let mut transform: Driver<'_, SlotTransform> = Driver::Held(SlotTransform::default());

    let current_opacity = |d: &Driver<'_, f64>, t: TimeMs| match d {
        Driver::Held(v) => *v,
        Driver::Tween(req) => req.sample_opacity(t),
    };
    let current_transform = |d: &Driver<'_, SlotTransform>, t: TimeMs| match d {
        Driver::Held(v) => *v,
        Driver::Tween(req) => req.sample_transform(t).unwrap_or_default(),
    };

    for ev in events.iter().take_while(|ev| ev.at() <= at) {
        match ev {
            TrackEvent::Place {
                image,
                position,
                stack_order,
                ..
            } => {
                placed = Some(Placed {
                    image,
                    position: *position,
                    stack_order: *stack_order,
                });
            }
            TrackEvent::Animate(req) => {
                opacity = Driver::Tween(req);
                if req.transform.is_some() {
                    transform = Driver::Tween(req);
                }
            }
            TrackEvent::Rebind(_, image) => {
                if let Some(p) = placed.as_mut() {
                    p.image = image;
                }
            }
            TrackEvent::Cancel(t) => {
                opacity = Driver::Held(current_opacity(&opacity, *t));
                transform = Driver::Held(current_transform(&transform, *t));
            }
            TrackEvent::Release(_) => {
                placed = None;
                opacity = Driver::Held(0.0);
            }
        }
    }

    let placed = placed?;
    Some(SlotSnapshot {
        slot,
        image: placed.image.clone(),
        anchor: placed.position,
        stack_order: placed.stack_order,
        opacity: current_opacity(&opacity, at),
        transform: current_transform(&transform, at),
    })
}

impl Animator for SceneTimeline {
    fn place(
        &mut self,
        at: TimeMs,
        slot: usize,
        image: &ImageRef,
        position: Point,
        stack_order: u64,
    ) {
        self.push(
            slot,
            TrackEvent::Place {
                at,
                image: image.clone(),
                position,
                stack_order,
            },
        );
    }

    fn animate(&mut self, request: &AnimationRequest) {
        self.push(request.slot, TrackEvent::Animate(request.clone()));
    }

    fn rebind(&mut self, at: TimeMs, slot: usize, image: &ImageRef) {
        self.push(slot, TrackEvent::Rebind(at, image.clone()));
    }

    fn cancel(&mut self, at: TimeMs, slot: usize) {
        self.push(slot, TrackEvent::Cancel(at));
    }

    fn release(&mut self, at: TimeMs, slot: usize) {
        self.push(slot, TrackEvent::Release(at));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/timeline.rs"]
mod tests;
