use std::sync::Arc;

/// Progress events published during algorithm execution.
///
/// Phases bracket whole algorithms; tasks bracket counted loops inside an
/// `exec` body. Events are cooperative UI updates, never correctness-relevant.
#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: String },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement { amount: u64 },
    TaskFinish,

    Message(String),
}

pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Fans progress events out to an optional callback.
///
/// Cloning is cheap and shares the callback, which is how child algorithms
/// report through their parent's channel.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        Self {
            callback: Some(Arc::new(callback)),
        }
    }

    pub fn from_shared(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// Scoped helper that reports one counted loop: emits `TaskStart` on
/// construction, `TaskIncrement` per step, and `TaskFinish` when finished or
/// dropped.
pub struct ProgressTracker<'a> {
    reporter: &'a ProgressReporter,
    finished: bool,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(reporter: &'a ProgressReporter, total_steps: u64) -> Self {
        reporter.report(Progress::TaskStart { total_steps });
        Self {
            reporter,
            finished: false,
        }
    }

    /// Reports one completed step. Safe to call from parallel workers.
    pub fn step(&self) {
        self.reporter.report(Progress::TaskIncrement { amount: 1 });
    }

    pub fn increment(&self, amount: u64) {
        self.reporter.report(Progress::TaskIncrement { amount });
    }

    pub fn finish(mut self) {
        self.finished = true;
        self.reporter.report(Progress::TaskFinish);
    }
}

impl Drop for ProgressTracker<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.reporter.report(Progress::TaskFinish);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collector() -> (ProgressReporter, Arc<Mutex<Vec<Progress>>>) {
        let events: Arc<Mutex<Vec<Progress>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let reporter = ProgressReporter::with_callback(move |event| {
            sink.lock().unwrap().push(event);
        });
        (reporter, events)
    }

    #[test]
    fn reporting_without_a_callback_is_a_no_op() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::Message("ignored".to_string()));
    }

    #[test]
    fn events_reach_the_callback_in_order() {
        let (reporter, events) = collector();
        reporter.report(Progress::PhaseStart {
            name: "Scale".to_string(),
        });
        reporter.report(Progress::PhaseFinish);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Progress::PhaseStart { name } if name == "Scale"));
        assert!(matches!(events[1], Progress::PhaseFinish));
    }

    #[test]
    fn tracker_brackets_a_counted_loop() {
        let (reporter, events) = collector();
        {
            let tracker = ProgressTracker::new(&reporter, 3);
            tracker.step();
            tracker.step();
            tracker.increment(1);
            tracker.finish();
        }

        let events = events.lock().unwrap();
        assert!(matches!(events[0], Progress::TaskStart { total_steps: 3 }));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, Progress::TaskIncrement { .. }))
                .count(),
            3
        );
        assert!(matches!(events.last(), Some(Progress::TaskFinish)));
    }

    #[test]
    fn tracker_finishes_on_drop() {
        let (reporter, events) = collector();
        {
            let _tracker = ProgressTracker::new(&reporter, 10);
        }
        let events = events.lock().unwrap();
        assert!(matches!(events.last(), Some(Progress::TaskFinish)));
    }

    #[test]
    fn clones_share_one_callback() {
        let (reporter, events) = collector();
        let clone = reporter.clone();
        clone.report(Progress::Message("from clone".to_string()));
        assert_eq!(events.lock().unwrap().len(), 1);
    }
}
