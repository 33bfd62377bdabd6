use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;

use crate::{
    animation::animator::Animator,
    foundation::core::{Canvas, ImageRef, PointerSample, TimeMs},
    foundation::error::{TrailError, TrailResult},
    trail::config::TrailConfig,
    trail::engine::{TrailEngine, Trigger},
};

/// The host re-supplying the full image sequence at `at_ms`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageUpdate {
    pub at_ms: u64,
    pub images: Vec<ImageRef>,
}

/// A recorded pointer session over one mounted trail surface.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub canvas: Canvas,
    #[serde(default)]
    pub config: TrailConfig,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub samples: Vec<PointerSample>,
    #[serde(default)]
    pub updates: Vec<ImageUpdate>,
    /// When the surface unmounts. Defaults to the last event plus one full
    /// dwell and exit, so every trail image has finished.
    #[serde(default)]
    pub end_ms: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct ReplayReport {
    pub triggers: Vec<Trigger>,
    pub dropped: u64,
    pub end: TimeMs,
}

impl Session {
    pub fn from_path(path: &Path) -> TrailResult<Self> {
        let f = File::open(path).with_context(|| format!("open session '{}'", path.display()))?;
        let session: Session = serde_json::from_reader(BufReader::new(f))?;
        session.validate()?;
        Ok(session)
    }

    pub fn validate(&self) -> TrailResult<()> {
        Canvas::new(self.canvas.width, self.canvas.height)?;
        self.config.validate()?;
        if !self.samples.windows(2).all(|w| w[0].t_ms <= w[1].t_ms) {
            return Err(TrailError::validation("samples must be sorted by t_ms"));
        }
        if !self.updates.windows(2).all(|w| w[0].at_ms <= w[1].at_ms) {
            return Err(TrailError::validation("updates must be sorted by at_ms"));
        }
        if let Some(end) = self.end_ms
            && end < self.last_event_ms()
        {
            return Err(TrailError::validation(
                "end_ms must not precede the last sample or update",
            ));
        }
        Ok(())
    }

    fn last_event_ms(&self) -> u64 {
        let s = self.samples.last().map_or(0, |s| s.t_ms);
        let u = self.updates.last().map_or(0, |u| u.at_ms);
        s.max(u)
    }

    pub fn end_time(&self) -> TimeMs {
        match self.end_ms {
            Some(end) => TimeMs(end),
            None => TimeMs(self.last_event_ms())
                .after(self.config.dwell_ms)
                .after(self.config.exit_ms),
        }
    }

    /// Drives a fresh engine through the session and unmounts it at the end.
    /// Image updates are applied before samples with the same timestamp.
    #[tracing::instrument(skip_all, fields(samples = self.samples.len(), updates = self.updates.len()))]
    pub fn replay<A: Animator>(&self, animator: A) -> TrailResult<(A, ReplayReport)> {
        self.validate()?;
        let mut engine = TrailEngine::new(self.config.clone(), self.images.clone(), animator)?;
        let mut report = ReplayReport::default();

        let mut updates = self.updates.iter().peekable();
        for sample in &self.samples {
            while let Some(u) = updates.next_if(|u| u.at_ms <= sample.t_ms) {
                engine.advance_to(TimeMs(u.at_ms));
                engine.set_images(u.images.clone());
            }
            // The surface only hears pointer moves over itself.
            if !self.canvas.contains(sample.point()) {
                engine.advance_to(sample.time());
                continue;
            }
            if let Some(t) = engine.handle_sample(*sample) {
                report.triggers.push(t);
            }
        }
        for u in updates {
            engine.advance_to(TimeMs(u.at_ms));
            engine.set_images(u.images.clone());
        }

        let end = self.end_time();
        engine.advance_to(end);
        report.dropped = engine.dropped_triggers();
        report.end = end;
        tracing::info!(
            triggers = report.triggers.len(),
            dropped = report.dropped,
            end_ms = end.0,
            "session replayed"
        );
        Ok((engine.unmount(), report))
    }
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;
