//! Progress reporting for batch cover resolution.

/// Emitted each time one item of a batch settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub operation: &'static str,
    /// Items settled so far, including this one.
    pub current: u64,
    pub total: u64,
    pub message: Option<String>,
}

/// Receiver for progress updates (a progress bar, a log line).
/// Closures taking a `ProgressEvent` implement it directly.
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: ProgressEvent);
}

impl<F> ProgressHandler for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards every event.
pub struct NoopProgress;

impl ProgressHandler for NoopProgress {
    fn on_progress(&self, _event: ProgressEvent) {}
}

/// Send an event to `handler` if there is one.
pub fn emit_progress(
    handler: Option<&dyn ProgressHandler>,
    operation: &'static str,
    current: u64,
    total: u64,
    message: Option<&str>,
) {
    if let Some(h) = handler {
        h.on_progress(ProgressEvent {
            operation,
            current,
            total,
            message: message.map(String::from),
        });
    }
}
