//! trailfx renders a trail of images that pop up and fade out along a
//! pointer's path.
//!
//! The trail is triggered by distance, not time: every time the pointer has
//! travelled at least `render_image_buffer` units since the last spawn, the
//! next image in round-robin order is placed under it, fades and scales in
//! with a small random tilt, dwells, and fades out again.
//!
//! # Pieces
//!
//! - [`TrailEngine`] takes pointer samples, applies the distance threshold and
//!   drives the [`SlotPool`].
//! - [`SlotPool`] holds one reusable slot per image with its own
//!   idle → entering → visible → exiting state machine and cancellable timers.
//! - [`Animator`] is the seam to whatever paints: the engine only issues
//!   placements and declarative [`AnimationRequest`]s.
//! - [`SceneTimeline`] + [`render_scene`] are a CPU reference painter used by
//!   the `trailfx` CLI to turn a recorded [`Session`] into PNG frames.
//!
//! Everything is single-threaded and runs on a virtual millisecond clock that
//! the host advances ([`TrailEngine::advance_to`]), which keeps timing exact
//! and replayable.
#![forbid(unsafe_code)]

mod animation;
mod assets;
mod foundation;
mod render;
mod schedule;
mod session;
mod trail;

pub use animation::animator::{Animator, AnimatorCommand, RecordingAnimator};
pub use animation::ease::Ease;
pub use animation::request::{AnimationPhase, AnimationRequest, Lerp, SlotTransform, Tween};
pub use assets::store::{
    ImageStore, LoadProgress, PreparedImage, decode_data_url, decode_image, resolve_image_path,
};
pub use foundation::core::{Affine, Canvas, ImageRef, Point, PointerSample, Rect, TimeMs, Vec2};
pub use foundation::error::{TrailError, TrailResult};
pub use foundation::math::Rng64;
pub use render::cpu::{FrameRGBA, RenderSettings, render_scene};
pub use render::timeline::{SceneTimeline, SlotSnapshot};
pub use schedule::timers::{TimerQueue, TimerToken};
pub use session::{ImageUpdate, ReplayReport, Session};
pub use trail::config::{RotationSettle, TrailConfig};
pub use trail::engine::{TrailEngine, TrailState, Trigger};
pub use trail::pool::{AnimationState, Slot, SlotPool, rotation_sign};
