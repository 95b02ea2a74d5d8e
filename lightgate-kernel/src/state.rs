use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide "light is green" flag.
///
/// The status monitor is the only writer, HTTP handlers only read. Last
/// writer wins; a read may lag a write by one poll interval.
#[derive(Debug, Clone, Default)]
pub struct Readiness(Arc<AtomicBool>);

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Stores the new value and returns the previous one.
    pub fn set(&self, ready: bool) -> bool {
        self.0.swap(ready, Ordering::AcqRel)
    }
}
