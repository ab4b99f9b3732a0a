use crate::{
    config::model::SchedulerConfig,
    foundation::error::{ParchmentError, ParchmentResult},
};

/// Exponential moving average of frame intervals that gates draws.
///
/// Each tick moves the estimate `1/filter_strength` of the way toward the observed
/// interval. Once the estimate exceeds `threshold_ms` a draw is due and the estimate
/// restarts from zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSmoother {
    filter_strength: f64,
    threshold_ms: f64,
    frame_time_ms: f64,
}

impl FrameSmoother {
    pub fn new(filter_strength: f64, threshold_ms: f64) -> ParchmentResult<Self> {
        if !filter_strength.is_finite() || filter_strength < 1.0 {
            return Err(ParchmentError::validation(
                "filter_strength must be finite and >= 1",
            ));
        }
        if !threshold_ms.is_finite() || threshold_ms <= 0.0 {
            return Err(ParchmentError::validation(
                "threshold_ms must be finite and > 0",
            ));
        }
        Ok(Self {
            filter_strength,
            threshold_ms,
            frame_time_ms: 0.0,
        })
    }

    pub fn from_config(cfg: &SchedulerConfig) -> ParchmentResult<Self> {
        Self::new(cfg.filter_strength, cfg.threshold_ms)
    }

    /// Current smoothed frame time in milliseconds.
    pub fn frame_time_ms(&self) -> f64 {
        self.frame_time_ms
    }

    pub fn filter_strength(&self) -> f64 {
        self.filter_strength
    }

    pub fn threshold_ms(&self) -> f64 {
        self.threshold_ms
    }

    /// Fold in one measured interval. Returns `true` when a draw is due.
    pub fn observe(&mut self, interval_ms: f64) -> bool {
        // Clocks can step backwards; never let that drag the estimate negative.
        let interval_ms = if interval_ms.is_finite() {
            interval_ms.max(0.0)
        } else {
            0.0
        };

        self.frame_time_ms += (interval_ms - self.frame_time_ms) / self.filter_strength;
        if self.frame_time_ms > self.threshold_ms {
            self.frame_time_ms = 0.0;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.frame_time_ms = 0.0;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/smoothing.rs"]
mod tests;
