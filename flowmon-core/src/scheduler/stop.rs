use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// The host simulation's global stop signal.
///
/// Cloning the signal gives another handle on the same flag. Once
/// toggled the signal stays set: the [`Scheduler`] fires no further
/// event.
///
/// [`Scheduler`]: super::Scheduler
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

/// use total ordering so a toggle from another thread (e.g. a signal
/// handler) is observed by the next scheduler step.
const ORDERING: Ordering = Ordering::SeqCst;

impl StopSignal {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.0.load(ORDERING)
    }

    /// set the stop signal
    #[inline]
    pub fn toggle(&self) {
        self.0.store(true, ORDERING)
    }
}
