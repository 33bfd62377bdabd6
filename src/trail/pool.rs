use crate::{
    animation::animator::Animator,
    animation::request::{AnimationPhase, AnimationRequest, SlotTransform, Tween},
    foundation::core::{ImageRef, Point, TimeMs, Vec2},
    schedule::timers::{TimerQueue, TimerToken},
    trail::config::{RotationSettle, TrailConfig},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    #[default]
    Idle,
    Entering,
    Visible,
    Exiting,
}

impl AnimationState {
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SlotTaskKind {
    Settle,
    ExitStart,
    ExitDone,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SlotTask {
    pub slot: usize,
    pub kind: SlotTaskKind,
}

/// Outstanding timers for one slot. `exit` covers both the dwell timer and,
/// once the fade has started, the fade-completion timer.
#[derive(Clone, Copy, Debug, Default)]
struct PendingTimers {
    settle: Option<TimerToken>,
    exit: Option<TimerToken>,
}

impl PendingTimers {
    fn forget(&mut self, token: TimerToken) {
        if self.settle == Some(token) {
            self.settle = None;
        }
        if self.exit == Some(token) {
            self.exit = None;
        }
    }
}

/// A reusable render target bound to one image index.
#[derive(Clone, Debug)]
pub struct Slot {
    index: usize,
    bound_image: ImageRef,
    position: Point,
    stack_order: u64,
    state: AnimationState,
    pending: PendingTimers,
}

impl Slot {
    fn new(index: usize, image: ImageRef) -> Self {
        Self {
            index,
            bound_image: image,
            position: Point::ORIGIN,
            stack_order: 0,
            state: AnimationState::Idle,
            pending: PendingTimers::default(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn bound_image(&self) -> &ImageRef {
        &self.bound_image
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn stack_order(&self) -> u64 {
        self.stack_order
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    fn has_pending(&self) -> bool {
        self.pending.settle.is_some() || self.pending.exit.is_some()
    }
}

/// Rotation bias for a slot: even indices start rotated one way, odd the other.
pub fn rotation_sign(index: usize) -> f64 {
    if index % 2 == 0 { -1.0 } else { 1.0 }
}

/// Fixed-size pool of slots, one per image, plus the timers driving them.
#[derive(Debug, Default)]
pub struct SlotPool {
    slots: Vec<Slot>,
    timers: TimerQueue<SlotTask>,
}

impl SlotPool {
    pub fn new(images: &[ImageRef]) -> Self {
        Self {
            slots: images
                .iter()
                .enumerate()
                .map(|(i, img)| Slot::new(i, img.clone()))
                .collect(),
            timers: TimerQueue::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// `None` when the pool is empty or `index` is past the end. Callers treat
    /// that as "nothing to do", not as an error.
    pub fn resolve_slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Pending timer count across all slots.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Rebinds the pool to a new image sequence. Surviving slots keep their
    /// state and switch to the image now at their index right away; slots
    /// past the new end are cancelled and dropped; new slots start idle.
    pub fn resize<A: Animator>(&mut self, images: &[ImageRef], at: TimeMs, animator: &mut A) {
        if images.len() < self.slots.len() {
            for index in images.len()..self.slots.len() {
                self.cancel_pending(index, at, animator);
                animator.release(at, index);
            }
            self.slots.truncate(images.len());
        }
        for (slot, img) in self.slots.iter_mut().zip(images) {
            if slot.bound_image != *img {
                slot.bound_image = img.clone();
                animator.rebind(at, slot.index, img);
            }
        }
        let start = self.slots.len();
        self.slots.extend(
            images[start..]
                .iter()
                .enumerate()
                .map(|(i, img)| Slot::new(start + i, img.clone())),
        );
    }

    /// Moves the slot and raises it in paint order. Not animated.
    pub fn apply_placement<A: Animator>(
        &mut self,
        index: usize,
        position: Point,
        stack_order: u64,
        at: TimeMs,
        animator: &mut A,
    ) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        slot.position = position;
        slot.stack_order = stack_order;
        animator.place(at, index, &slot.bound_image, position, stack_order);
    }

    /// Cancels every outstanding timer and animation on the slot.
    pub fn cancel_pending<A: Animator>(&mut self, index: usize, at: TimeMs, animator: &mut A) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        let was_busy = slot.state.is_active() || slot.has_pending();
        for token in [slot.pending.settle.take(), slot.pending.exit.take()]
            .into_iter()
            .flatten()
        {
            self.timers.cancel(token);
        }
        if was_busy {
            tracing::trace!(slot = index, state = ?slot.state, "preempting active slot");
            animator.cancel(at, index);
        }
    }

    /// Starts the entrance: fade in, grow from `entrance_scale`, and rotate
    /// out of `rotation_deg` (signed by slot parity).
    pub fn run_entrance<A: Animator>(
        &mut self,
        index: usize,
        rotation_deg: f64,
        at: TimeMs,
        config: &TrailConfig,
        animator: &mut A,
    ) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if matches!(slot.state, AnimationState::Entering | AnimationState::Visible) {
            tracing::debug!(slot = index, "entrance on a slot that was not cancelled first");
        }

        let start_rot = rotation_sign(index) * rotation_deg;
        let end_rot = match config.rotation_settle {
            RotationSettle::Mirror => -start_rot,
            RotationSettle::Upright => 0.0,
        };
        let request = AnimationRequest {
            slot: index,
            phase: AnimationPhase::Entrance,
            start: at,
            duration_ms: config.entrance_ms,
            ease: config.entrance_ease,
            opacity: Tween::new(0.0, 1.0),
            transform: Some(Tween::new(
                SlotTransform {
                    offset: Vec2::new(-0.5, -0.25),
                    scale: config.entrance_scale,
                    rotation_deg: start_rot,
                },
                SlotTransform {
                    offset: Vec2::new(-0.5, -0.5),
                    scale: 1.0,
                    rotation_deg: end_rot,
                },
            )),
        };

        slot.state = AnimationState::Entering;
        animator.animate(&request);
        let token = self.timers.schedule(
            at.after(config.entrance_ms),
            SlotTask {
                slot: index,
                kind: SlotTaskKind::Settle,
            },
        );
        slot.pending.settle = Some(token);
    }

    /// Arms the dwell timer that will start the exit fade at `due`.
    pub fn schedule_exit(&mut self, index: usize, due: TimeMs) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if let Some(old) = slot.pending.exit.take() {
            self.timers.cancel(old);
        }
        let token = self.timers.schedule(
            due,
            SlotTask {
                slot: index,
                kind: SlotTaskKind::ExitStart,
            },
        );
        slot.pending.exit = Some(token);
    }

    /// Fades the slot out, starting at `at`. Idle or already exiting slots are left alone.
    pub fn run_exit<A: Animator>(
        &mut self,
        index: usize,
        at: TimeMs,
        config: &TrailConfig,
        animator: &mut A,
    ) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if !matches!(slot.state, AnimationState::Entering | AnimationState::Visible) {
            return;
        }
        if let Some(settle) = slot.pending.settle.take() {
            self.timers.cancel(settle);
        }

        slot.state = AnimationState::Exiting;
        animator.animate(&AnimationRequest {
            slot: index,
            phase: AnimationPhase::Exit,
            start: at,
            duration_ms: config.exit_ms,
            ease: config.exit_ease,
            opacity: Tween::new(1.0, 0.0),
            transform: None,
        });
        let token = self.timers.schedule(
            at.after(config.exit_ms),
            SlotTask {
                slot: index,
                kind: SlotTaskKind::ExitDone,
            },
        );
        slot.pending.exit = Some(token);
    }

    pub(crate) fn settle(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index)
            && slot.state == AnimationState::Entering
        {
            slot.state = AnimationState::Visible;
        }
    }

    pub(crate) fn finish_exit(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index)
            && slot.state == AnimationState::Exiting
        {
            slot.state = AnimationState::Idle;
        }
    }

    pub(crate) fn next_due(&mut self) -> Option<TimeMs> {
        self.timers.next_due()
    }

    /// Pops the next task due at or before `now` and detaches its token from the slot.
    pub(crate) fn pop_due(&mut self, now: TimeMs) -> Option<(TimeMs, SlotTask)> {
        let (due, token, task) = self.timers.pop_due(now)?;
        if let Some(slot) = self.slots.get_mut(task.slot) {
            slot.pending.forget(token);
        }
        Some((due, task))
    }

    /// Cancels everything on every slot; used on unmount.
    pub fn cancel_all<A: Animator>(&mut self, at: TimeMs, animator: &mut A) {
        for index in 0..self.slots.len() {
            self.cancel_pending(index, at, animator);
            self.slots[index].state = AnimationState::Idle;
        }
        self.timers.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trail/pool.rs"]
mod tests;
