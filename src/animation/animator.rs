use crate::{
    animation::request::AnimationRequest,
    foundation::core::{ImageRef, Point, TimeMs},
};

/// The rendering collaborator.
///
/// The trail engine owns no pixels. It tells the animator where a slot's
/// render target goes, in which paint order, and which property transitions
/// to run on it. Everything else (layout, painting, compositing) stays on the
/// other side of this trait.
pub trait Animator {
    /// Whether the render target for `slot` currently exists. Triggers that
    /// resolve to a missing target are dropped.
    fn has_target(&self, _slot: usize) -> bool {
        true
    }

    /// Instantaneous geometry update: no animation.
    fn place(
        &mut self,
        at: TimeMs,
        slot: usize,
        image: &ImageRef,
        position: Point,
        stack_order: u64,
    );

    fn animate(&mut self, request: &AnimationRequest);

    /// Stop anything still running on `slot`'s target.
    fn cancel(&mut self, at: TimeMs, slot: usize);

    /// The image sequence changed under a live slot. The target swaps its
    /// content in place; geometry and running animations are untouched.
    fn rebind(&mut self, at: TimeMs, slot: usize, image: &ImageRef);

    /// The slot was removed from the pool; its target should disappear.
    fn release(&mut self, _at: TimeMs, _slot: usize) {}
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AnimatorCommand {
    Place {
        at: TimeMs,
        slot: usize,
        image: ImageRef,
        position: Point,
        stack_order: u64,
    },
    Animate(AnimationRequest),
    Rebind {
        at: TimeMs,
        slot: usize,
        image: ImageRef,
    },
    Cancel {
        at: TimeMs,
        slot: usize,
    },
    Release {
        at: TimeMs,
        slot: usize,
    },
}

impl AnimatorCommand {
    pub fn at(&self) -> TimeMs {
        match self {
            Self::Place { at, .. }
            | Self::Rebind { at, .. }
            | Self::Cancel { at, .. }
            | Self::Release { at, .. } => *at,
            Self::Animate(req) => req.start,
        }
    }

    pub fn slot(&self) -> usize {
        match self {
            Self::Place { slot, .. }
            | Self::Rebind { slot, .. }
            | Self::Cancel { slot, .. }
            | Self::Release { slot, .. } => *slot,
            Self::Animate(req) => req.slot,
        }
    }
}

/// Keeps every command it receives, in order. Useful for logs and tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingAnimator {
    pub commands: Vec<AnimatorCommand>,
    /// Slots reported as unmounted by [`Animator::has_target`].
    pub missing_targets: Vec<usize>,
}

impl RecordingAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> impl Iterator<Item = &AnimationRequest> {
        self.commands.iter().filter_map(|c| match c {
            AnimatorCommand::Animate(req) => Some(req),
            _ => None,
        })
    }

    pub fn placements(&self) -> impl Iterator<Item = &AnimatorCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, AnimatorCommand::Place { .. }))
    }
}

impl Animator for RecordingAnimator {
    fn has_target(&self, slot: usize) -> bool {
        !self.missing_targets.contains(&slot)
    }

    fn place(
        &mut self,
        at: TimeMs,
        slot: usize,
        image: &ImageRef,
        position: Point,
        stack_order: u64,
    ) {
        self.commands.push(AnimatorCommand::Place {
            at,
            slot,
            image: image.clone(),
            position,
            stack_order,
        });
    }

    fn animate(&mut self, request: &AnimationRequest) {
        self.commands.push(AnimatorCommand::Animate(request.clone()));
    }

    fn rebind(&mut self, at: TimeMs, slot: usize, image: &ImageRef) {
        self.commands.push(AnimatorCommand::Rebind {
            at,
            slot,
            image: image.clone(),
        });
    }

    fn cancel(&mut self, at: TimeMs, slot: usize) {
        self.commands.push(AnimatorCommand::Cancel { at, slot });
    }

    fn release(&mut self, at: TimeMs, slot: usize) {
        self.commands.push(AnimatorCommand::Release { at, slot });
    }
}
