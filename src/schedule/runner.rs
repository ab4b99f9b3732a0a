use crate::{
    config::model::SchedulerConfig,
    foundation::{core::FrameIndex, error::ParchmentResult},
    schedule::{
        host::{CancelToken, FrameHost},
        smoothing::FrameSmoother,
    },
};

/// Counters reported by [`FrameScheduler::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Frame callbacks received.
    pub ticks: u64,
    /// Ticks that triggered a draw.
    pub draws: u64,
}

/// Passed to the draw callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawTick {
    /// Zero-based index of this draw.
    pub draw: FrameIndex,
    /// Host timestamp of the tick that triggered it.
    pub timestamp_ms: f64,
    /// Raw interval since the previous tick.
    pub interval_ms: f64,
}

/// Paces draws off the host's frame callbacks.
///
/// Owns all timing state: last timestamp, smoothed frame time and counters. One request
/// is in flight at a time; cancellation via [`CancelToken`] takes effect before the next
/// draw.
#[derive(Debug)]
pub struct FrameScheduler {
    smoother: FrameSmoother,
    last_timestamp_ms: Option<f64>,
    stats: SchedulerStats,
    cancel: CancelToken,
}

impl FrameScheduler {
    pub fn new(cfg: &SchedulerConfig) -> ParchmentResult<Self> {
        cfg.validate()?;
        Ok(Self::with_smoother(FrameSmoother::from_config(cfg)?))
    }

    pub fn with_smoother(smoother: FrameSmoother) -> Self {
        Self {
            smoother,
            last_timestamp_ms: None,
            stats: SchedulerStats::default(),
            cancel: CancelToken::new(),
        }
    }

    /// Token that stops [`FrameScheduler::run`]; clones may be moved to other threads.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn smoother(&self) -> &FrameSmoother {
        &self.smoother
    }

    /// Process one frame callback. Returns the draw to perform, if one is due.
    ///
    /// The first tick without a prior timestamp measures a zero interval.
    pub fn tick(&mut self, timestamp_ms: f64) -> Option<DrawTick> {
        let interval_ms = match self.last_timestamp_ms {
            Some(last) => timestamp_ms - last,
            None => 0.0,
        };
        self.last_timestamp_ms = Some(timestamp_ms);
        self.stats.ticks += 1;

        if !self.smoother.observe(interval_ms) {
            return None;
        }
        let draw = FrameIndex(self.stats.draws);
        self.stats.draws += 1;
        Some(DrawTick {
            draw,
            timestamp_ms,
            interval_ms,
        })
    }

    /// Drive `on_draw` from `host` until cancelled or the host stops.
    ///
    /// An error from `on_draw` stops the loop and is returned.
    #[tracing::instrument(skip_all)]
    pub fn run<H, F>(&mut self, host: &mut H, mut on_draw: F) -> ParchmentResult<SchedulerStats>
    where
        H: FrameHost + ?Sized,
        F: FnMut(DrawTick) -> ParchmentResult<()>,
    {
        if self.last_timestamp_ms.is_none() {
            self.last_timestamp_ms = Some(host.now_ms());
        }

        while !self.cancel.is_cancelled() {
            let Some(timestamp_ms) = host.request_frame() else {
                tracing::debug!("host stopped producing frames");
                break;
            };
            // Cancelled while the request was pending: the tick must not draw.
            if self.cancel.is_cancelled() {
                break;
            }
            if let Some(tick) = self.tick(timestamp_ms) {
                tracing::debug!(
                    draw = tick.draw.0,
                    interval_ms = tick.interval_ms,
                    "draw due"
                );
                on_draw(tick)?;
            }
        }

        if self.cancel.is_cancelled() {
            host.cancel_frame();
        }
        tracing::debug!(
            ticks = self.stats.ticks,
            draws = self.stats.draws,
            "frame loop finished"
        );
        Ok(self.stats)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/runner.rs"]
mod tests;
