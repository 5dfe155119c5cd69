use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

/// Opaque handle to a scheduled refresh callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// Per-display-refresh scheduling.
///
/// A requested frame fires once, on the next refresh after the request. A
/// cancelled handle never fires.
pub trait FrameClock {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Host-driven refresh clock.
///
/// The host calls [`RefreshClock::advance`] once per display refresh and
/// dispatches every returned handle. Handles requested while dispatching fire
/// on the following refresh.
#[derive(Debug, Default)]
pub struct RefreshClock {
    next_id: u64,
    pending: BTreeSet<FrameHandle>,
    refreshes: u64,
}

impl RefreshClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every handle due on this refresh, in request order.
    pub fn advance(&mut self) -> Vec<FrameHandle> {
        self.refreshes += 1;
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    /// Number of scheduled, not yet fired handles.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of refreshes driven so far.
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }
}

impl FrameClock for RefreshClock {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending.insert(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.remove(&handle);
    }
}

/// Rolling window of refresh intervals, for the viewer HUD.
#[derive(Debug)]
pub struct RefreshTimer {
    window: VecDeque<Duration>,
    capacity: usize,
}

impl RefreshTimer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(dt);
    }

    pub fn count(&self) -> usize {
        self.window.len()
    }

    pub fn average(&self) -> Duration {
        if self.window.is_empty() {
            return Duration::ZERO;
        }
        self.window.iter().sum::<Duration>() / self.window.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.window.iter().copied().max().unwrap_or(Duration::ZERO)
    }

    /// Refreshes per second implied by the average interval.
    pub fn rate_hz(&self) -> f64 {
        let avg = self.average().as_secs_f64();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }
}
