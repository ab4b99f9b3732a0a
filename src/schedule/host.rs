use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use crate::foundation::error::{ParchmentError, ParchmentResult};

/// Cooperative cancellation flag shared between the run loop and whoever stops it.
///
/// Clones share state; cancelling any clone cancels all of them.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The host environment's animation-frame primitives.
///
/// This is the single injection point for "call me on the next refresh" and its
/// cancellation. Environment-specific fallbacks (see [`TimerHost`]) implement it as
/// adapters; the scheduler never probes for capabilities itself.
pub trait FrameHost {
    /// Current host time in milliseconds, on the same clock as frame timestamps.
    fn now_ms(&self) -> f64;

    /// Wait for the next frame and return its timestamp in milliseconds.
    ///
    /// `None` means the host has stopped producing frames.
    fn request_frame(&mut self) -> Option<f64>;

    /// Drop any pending request. Later calls to [`FrameHost::request_frame`] return `None`.
    fn cancel_frame(&mut self);
}

/// Time source for adapters that pace frames themselves.
pub trait Clock {
    fn now_ms(&self) -> f64;
    fn sleep_ms(&self, ms: f64);
}

/// Wall clock measured from construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn sleep_ms(&self, ms: f64) {
        if ms.is_finite() && ms > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(ms / 1000.0));
        }
    }
}

/// Fixed-interval timer standing in for a native refresh callback.
///
/// Delays are compensated: a request waits `max(0, interval - (now - last_target))`, so
/// time spent drawing between requests is subtracted from the next wait and the loop
/// holds roughly `1000 / interval` frames per second.
#[derive(Debug)]
pub struct TimerHost<C: Clock = SystemClock> {
    clock: C,
    interval_ms: f64,
    last_target_ms: Option<f64>,
    cancelled: bool,
}

impl TimerHost<SystemClock> {
    /// Timer host on the wall clock.
    pub fn new(interval_ms: f64) -> ParchmentResult<Self> {
        Self::with_clock(SystemClock::default(), interval_ms)
    }
}

impl<C: Clock> TimerHost<C> {
    pub fn with_clock(clock: C, interval_ms: f64) -> ParchmentResult<Self> {
        if !interval_ms.is_finite() || interval_ms <= 0.0 {
            return Err(ParchmentError::validation(
                "timer interval must be finite and > 0",
            ));
        }
        Ok(Self {
            clock,
            interval_ms,
            last_target_ms: None,
            cancelled: false,
        })
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Delay the next request would wait, given the current time.
    fn delay_at(&self, now_ms: f64) -> f64 {
        match self.last_target_ms {
            Some(last) => (self.interval_ms - (now_ms - last)).max(0.0),
            None => 0.0,
        }
    }
}

impl<C: Clock> FrameHost for TimerHost<C> {
    fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    fn request_frame(&mut self) -> Option<f64> {
        if self.cancelled {
            return None;
        }
        let now = self.clock.now_ms();
        let delay = self.delay_at(now);
        let target = now + delay;
        self.last_target_ms = Some(target);
        if delay > 0.0 {
            self.clock.sleep_ms(delay);
        }
        Some(target)
    }

    fn cancel_frame(&mut self) {
        self.cancelled = true;
    }
}

/// Adapter that builds a [`FrameHost`] from the host's own primitives.
pub struct FnHost<N, R, X> {
    now: N,
    request: R,
    cancel: X,
}

impl<N, R, X> FnHost<N, R, X>
where
    N: Fn() -> f64,
    R: FnMut() -> Option<f64>,
    X: FnMut(),
{
    pub fn new(now: N, request: R, cancel: X) -> Self {
        Self {
            now,
            request,
            cancel,
        }
    }
}

impl<N, R, X> FrameHost for FnHost<N, R, X>
where
    N: Fn() -> f64,
    R: FnMut() -> Option<f64>,
    X: FnMut(),
{
    fn now_ms(&self) -> f64 {
        (self.now)()
    }

    fn request_frame(&mut self) -> Option<f64> {
        (self.request)()
    }

    fn cancel_frame(&mut self) {
        (self.cancel)()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/host.rs"]
mod tests;
