use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic microsecond clock plus the bounded busy-wait used for pulse widths.
pub trait TimeInterface: Send + Sync {
    fn now_micros(&self) -> u64;
    fn delay_micros(&self, micros: u32);
}

impl<T: TimeInterface + ?Sized> TimeInterface for Arc<T> {
    fn now_micros(&self) -> u64 {
        (**self).now_micros()
    }

    fn delay_micros(&self, micros: u32) {
        (**self).delay_micros(micros)
    }
}

/// Wall-clock time measured from process start.
#[derive(Debug, Clone)]
pub struct StdTime {
    origin: Instant,
}

impl StdTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeInterface for StdTime {
    fn now_micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }

    /// Spins instead of sleeping: pulse widths are a few microseconds, far
    /// below scheduler granularity.
    fn delay_micros(&self, micros: u32) {
        let deadline = Instant::now() + Duration::from_micros(micros as u64);
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }
}

/// Manually advanced clock. Clones share the same time source.
#[derive(Debug, Clone, Default)]
pub struct SimTime {
    now: Arc<AtomicU64>,
}

impl SimTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, micros: u64) {
        self.now.fetch_add(micros, Ordering::SeqCst);
    }

    pub fn set(&self, micros: u64) {
        self.now.store(micros, Ordering::SeqCst);
    }
}

impl TimeInterface for SimTime {
    fn now_micros(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn delay_micros(&self, micros: u32) {
        self.advance(micros as u64);
    }
}
