//! Cooperative cancellation and progress reporting for a single encode call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Cooperative stop signal polled by encoders between rows and blocks.
pub trait Stop: Send + Sync {
    /// True once the caller wants the encode abandoned.
    fn should_stop(&self) -> bool;

    /// `Err(Error::Cancelled)` once stopped.
    fn check(&self) -> Result<()> {
        if self.should_stop() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A stop signal that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unstoppable;

impl Stop for Unstoppable {
    #[inline]
    fn should_stop(&self) -> bool {
        false
    }
}

impl Stop for AtomicBool {
    #[inline]
    fn should_stop(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: Stop + ?Sized> Stop for Arc<T> {
    fn should_stop(&self) -> bool {
        (**self).should_stop()
    }
}

/// Per-call side channels: a stop signal and an optional progress callback.
///
/// Progress is reported as a fraction in `0.0..=1.0`, never decreasing
/// within one call, and at most roughly once per `1000 * log2(pixels)`
/// pixels so small rows do not pay for a callback each.
pub struct EncodeContext<'a> {
    stop: &'a dyn Stop,
    progress: Option<&'a mut (dyn FnMut(f32) + 'a)>,
    step: f64,
    pending: f64,
    last: f32,
}

impl<'a> EncodeContext<'a> {
    /// No cancellation, no progress.
    pub fn new() -> Self {
        Self {
            stop: &Unstoppable,
            progress: None,
            step: 1.0,
            pending: 0.0,
            last: 0.0,
        }
    }

    /// Poll `stop` at every checkpoint.
    pub fn with_stop(mut self, stop: &'a dyn Stop) -> Self {
        self.stop = stop;
        self
    }

    /// Report progress through `callback`.
    pub fn with_progress(mut self, callback: &'a mut (dyn FnMut(f32) + 'a)) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Fail with [`Error::Cancelled`] if the stop signal fired.
    #[inline]
    pub(crate) fn check(&self) -> Result<()> {
        self.stop.check()
    }

    /// Reset pacing for an image of `pixels` pixels.
    pub(crate) fn begin(&mut self, pixels: u64) {
        let pixels = pixels.max(1) as f64;
        self.step = (1000.0 * pixels.log2()).max(1.0);
        self.pending = 0.0;
        self.last = 0.0;
    }

    /// Account for `pixels` more pixels done, reporting `fraction` when a step is crossed.
    pub(crate) fn advance(&mut self, pixels: u64, fraction: f32) {
        if self.progress.is_none() {
            return;
        }
        self.pending += pixels as f64;
        if self.pending >= self.step {
            self.pending %= self.step;
            self.report(fraction);
        }
    }

    /// Report completion.
    pub(crate) fn finish(&mut self) {
        self.report(1.0);
    }

    fn report(&mut self, fraction: f32) {
        let fraction = fraction.clamp(self.last, 1.0);
        if let Some(callback) = self.progress.as_deref_mut() {
            self.last = fraction;
            callback(fraction);
        }
    }
}

impl Default for EncodeContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}
