//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (monotonic millisecond clock)
//! - Frame scheduling (requestAnimationFrame on web, manual stepping native)
//! - Storage (LocalStorage on web)

use std::cell::RefCell;
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Opaque id of a scheduled frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Monotonic time source in milliseconds
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Requests one future frame callback at a time
///
/// The callback itself is wired up by the platform; the game only keeps the
/// handle so it can cancel a frame that must not run.
pub trait FrameScheduler {
    /// Ask for the next frame; `None` if the platform refused
    fn request_frame(&mut self) -> Option<FrameHandle>;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Clock advanced by hand (headless runs and tests)
#[derive(Debug, Clone, Default)]
pub struct SteppedClock {
    now: Rc<RefCell<f64>>,
}

impl SteppedClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(RefCell::new(start_ms)),
        }
    }

    /// Move time forward and return the new timestamp
    pub fn advance(&self, delta_ms: f64) -> f64 {
        let mut now = self.now.borrow_mut();
        *now += delta_ms.max(0.0);
        *now
    }
}

impl Clock for SteppedClock {
    fn now_ms(&self) -> f64 {
        *self.now.borrow()
    }
}

#[derive(Debug, Default)]
struct FrameQueue {
    next_id: u64,
    pending: Option<FrameHandle>,
    requested: u64,
    cancelled: Vec<FrameHandle>,
}

/// Scheduler whose frames are fired by the caller
///
/// Clones share one queue, so a driver can poll what the game requested.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<FrameQueue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame currently waiting to fire
    pub fn pending(&self) -> Option<FrameHandle> {
        self.queue.borrow().pending
    }

    /// Consume the pending frame, as the platform would when firing it
    pub fn take_pending(&self) -> Option<FrameHandle> {
        self.queue.borrow_mut().pending.take()
    }

    /// Total frames ever requested
    pub fn requested_count(&self) -> u64 {
        self.queue.borrow().requested
    }

    pub fn cancelled(&self) -> Vec<FrameHandle> {
        self.queue.borrow().cancelled.clone()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        let mut queue = self.queue.borrow_mut();
        queue.next_id += 1;
        queue.requested += 1;
        let handle = FrameHandle(queue.next_id);
        queue.pending = Some(handle);
        Some(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut queue = self.queue.borrow_mut();
        if queue.pending == Some(handle) {
            queue.pending = None;
        }
        queue.cancelled.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_scheduler_cancel_clears_pending() {
        let mut scheduler = ManualScheduler::new();
        let observer = scheduler.clone();

        let handle = scheduler.request_frame().unwrap();
        assert_eq!(observer.pending(), Some(handle));

        scheduler.cancel_frame(handle);
        assert_eq!(observer.pending(), None);
        assert_eq!(observer.cancelled(), vec![handle]);
    }

    #[test]
    fn test_stepped_clock_only_moves_forward() {
        let clock = SteppedClock::new(100.0);
        assert_eq!(clock.advance(16.0), 116.0);
        assert_eq!(clock.advance(-50.0), 116.0);
        assert_eq!(clock.now_ms(), 116.0);
    }
}
