use crate::{
    animation::ease::Ease,
    foundation::error::{TrailError, TrailResult},
};

/// Where an entering image's rotation comes to rest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationSettle {
    /// Swing from the starting angle to its mirror image (`-r` to `+r`).
    #[default]
    Mirror,
    /// Come to rest upright at 0 degrees.
    Upright,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrailConfig {
    /// Minimum pointer travel between two triggers, in surface units.
    #[serde(alias = "renderImageBuffer")]
    pub render_image_buffer: f64,
    /// Upper bound (exclusive) of the random entrance rotation, in degrees.
    #[serde(alias = "rotationRange")]
    pub rotation_range: f64,
    /// Time from a trigger to the start of its exit fade.
    pub dwell_ms: u64,
    pub entrance_ms: u64,
    pub exit_ms: u64,
    pub entrance_ease: Ease,
    pub exit_ease: Ease,
    /// Scale an image starts its entrance at.
    pub entrance_scale: f64,
    pub rotation_settle: RotationSettle,
    pub seed: u64,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            render_image_buffer: 50.0,
            rotation_range: 25.0,
            dwell_ms: 5000,
            entrance_ms: 300,
            exit_ms: 500,
            entrance_ease: Ease::STANDARD,
            exit_ease: Ease::Linear,
            entrance_scale: 0.5,
            rotation_settle: RotationSettle::Mirror,
            seed: 0,
        }
    }
}

impl TrailConfig {
    pub fn validate(&self) -> TrailResult<()> {
        if !self.render_image_buffer.is_finite() || self.render_image_buffer <= 0.0 {
            return Err(TrailError::validation(format!(
                "render_image_buffer must be a finite number > 0 (got {})",
                self.render_image_buffer
            )));
        }
        if !self.rotation_range.is_finite() || self.rotation_range < 0.0 {
            return Err(TrailError::validation(format!(
                "rotation_range must be a finite number >= 0 (got {})",
                self.rotation_range
            )));
        }
        if self.dwell_ms == 0 {
            return Err(TrailError::validation("dwell_ms must be > 0"));
        }
        if self.entrance_ms == 0 {
            return Err(TrailError::validation("entrance_ms must be > 0"));
        }
        if self.exit_ms == 0 {
            return Err(TrailError::validation("exit_ms must be > 0"));
        }
        if !self.entrance_scale.is_finite() || self.entrance_scale <= 0.0 {
            return Err(TrailError::validation("entrance_scale must be a finite number > 0"));
        }
        if !self.entrance_ease.is_valid() || !self.exit_ease.is_valid() {
            return Err(TrailError::validation(
                "cubic-bezier control x values must lie within [0, 1]",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trail/config.rs"]
mod tests;
