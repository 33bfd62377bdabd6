use crate::{
    animation::animator::Animator,
    foundation::core::{ImageRef, Point, PointerSample, TimeMs},
    foundation::error::TrailResult,
    foundation::math::Rng64,
    trail::config::TrailConfig,
    trail::pool::{SlotPool, SlotTaskKind},
};

/// Per-surface trail bookkeeping: where the last trigger happened and how
/// many triggers have fired so far.
///
/// `trigger_count` is a `u64` that only ever increments. At one trigger per
/// pixel of pointer travel it would take longer than any session to wrap;
/// it wraps rather than panics if it ever does.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrailState {
    pub last_trigger_position: Point,
    pub trigger_count: u64,
}

impl Default for TrailState {
    fn default() -> Self {
        Self {
            last_trigger_position: Point::ORIGIN,
            trigger_count: 0,
        }
    }
}

/// What a fired trigger did.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Trigger {
    /// Zero-based trigger number; doubles as the stack order.
    pub seq: u64,
    pub slot: usize,
    pub image: ImageRef,
    pub position: Point,
    /// Unsigned magnitude drawn from `[0, rotation_range)`.
    pub rotation_deg: f64,
    pub at: TimeMs,
}

/// Turns pointer-move samples into trail triggers and drives the slot pool.
///
/// Everything runs on the caller's thread. `on_pointer_move` does a distance
/// check and at most one trigger; deferred work (settling, the dwell timer,
/// the exit fade) is queued and runs from [`TrailEngine::advance_to`].
#[derive(Debug)]
pub struct TrailEngine<A: Animator> {
    config: TrailConfig,
    images: Vec<ImageRef>,
    pool: SlotPool,
    state: TrailState,
    rng: Rng64,
    animator: A,
    now: TimeMs,
    dropped: u64,
}

impl<A: Animator> TrailEngine<A> {
    pub fn new(config: TrailConfig, images: Vec<ImageRef>, animator: A) -> TrailResult<Self> {
        config.validate()?;
        Ok(Self {
            pool: SlotPool::new(&images),
            rng: Rng64::new(config.seed),
            config,
            images,
            state: TrailState::default(),
            animator,
            now: TimeMs::ZERO,
            dropped: 0,
        })
    }

    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    pub fn state(&self) -> TrailState {
        self.state
    }

    pub fn trigger_count(&self) -> u64 {
        self.state.trigger_count
    }

    pub fn last_trigger_position(&self) -> Point {
        self.state.last_trigger_position
    }

    /// Triggers dropped because their render target was missing.
    pub fn dropped_triggers(&self) -> u64 {
        self.dropped
    }

    pub fn now(&self) -> TimeMs {
        self.now
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn pool(&self) -> &SlotPool {
        &self.pool
    }

    pub fn animator(&self) -> &A {
        &self.animator
    }

    /// Replaces the image sequence. The pool resizes to match; trail state
    /// (counter, last position) carries over.
    pub fn set_images(&mut self, images: Vec<ImageRef>) {
        if images == self.images {
            return;
        }
        tracing::debug!(from = self.images.len(), to = images.len(), "image sequence replaced");
        self.pool.resize(&images, self.now, &mut self.animator);
        self.images = images;
    }

    /// Runs every deferred task due at or before `now`, each with the clock
    /// set to its own due time. The clock never moves backwards.
    pub fn advance_to(&mut self, now: TimeMs) {
        while let Some((due, task)) = self.pool.pop_due(now) {
            self.now = self.now.max(due);
            match task.kind {
                SlotTaskKind::Settle => self.pool.settle(task.slot),
                SlotTaskKind::ExitStart => {
                    self.pool
                        .run_exit(task.slot, due, &self.config, &mut self.animator)
                }
                SlotTaskKind::ExitDone => self.pool.finish_exit(task.slot),
            }
        }
        self.now = self.now.max(now);
    }

    /// Earliest pending deferred task, if any.
    pub fn next_deadline(&mut self) -> Option<TimeMs> {
        self.pool.next_due()
    }

    /// Advances the clock to the sample's timestamp, then handles the move.
    pub fn handle_sample(&mut self, sample: PointerSample) -> Option<Trigger> {
        self.advance_to(sample.time());
        self.on_pointer_move(sample.x, sample.y)
    }

    /// Distance-throttled trigger check at the current clock time.
    pub fn on_pointer_move(&mut self, x: f64, y: f64) -> Option<Trigger> {
        if self.images.is_empty() {
            return None;
        }
        if !x.is_finite() || !y.is_finite() {
            tracing::trace!(x, y, "ignoring non-finite pointer sample");
            return None;
        }

        let p = Point::new(x, y);
        if p.distance(self.state.last_trigger_position) < self.config.render_image_buffer {
            return None;
        }
        self.state.last_trigger_position = p;
        self.fire_trigger()
    }

    /// Spawns the next image at the last trigger position.
    pub fn fire_trigger(&mut self) -> Option<Trigger> {
        let n = self.pool.len();
        if n == 0 {
            return None;
        }
        let seq = self.state.trigger_count;
        let slot = (seq % n as u64) as usize;
        let at = self.now;
        let position = self.state.last_trigger_position;

        if !self.animator.has_target(slot) {
            self.dropped += 1;
            tracing::debug!(slot, seq, "render target missing; trigger dropped");
            return None;
        }
        let image = self.pool.resolve_slot(slot)?.bound_image().clone();

        self.pool
            .apply_placement(slot, position, seq, at, &mut self.animator);
        let rotation_deg = self.rng.next_below(self.config.rotation_range);
        self.pool.cancel_pending(slot, at, &mut self.animator);
        self.pool
            .run_entrance(slot, rotation_deg, at, &self.config, &mut self.animator);
        self.pool.schedule_exit(slot, at.after(self.config.dwell_ms));

        self.state.trigger_count = seq.wrapping_add(1);
        tracing::trace!(seq, slot, x = position.x, y = position.y, "trail trigger");

        Some(Trigger {
            seq,
            slot,
            image,
            position,
            rotation_deg,
            at,
        })
    }

    /// Tears the surface down: every pending timer on every slot is cancelled
    /// and the animator is handed back.
    pub fn unmount(mut self) -> A {
        let pending = self.pool.pending_timers();
        self.pool.cancel_all(self.now, &mut self.animator);
        tracing::debug!(pending, triggers = self.state.trigger_count, "trail unmounted");
        self.animator
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trail/engine.rs"]
mod tests;
