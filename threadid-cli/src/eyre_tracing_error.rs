//! Stamps every [`eyre::Report`] with the thread it was created on and the [`SpanTrace`] active there.
use std::fmt;

use eyre::{DefaultHandler, EyreHandler};
use threadid_api::ThreadId;
use tracing_error::{SpanTrace, SpanTraceStatus};

/// The thread a report was created on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Origin {
    id: ThreadId,
    name: Option<String>,
}

impl Origin {
    fn current() -> Self {
        Self {
            id: threadid_std::thread::current_thread_id(),
            name: std::thread::current().name().map(str::to_owned),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({name})", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// An [`EyreHandler`] that delegates to [`DefaultHandler`] and appends the report's [`Origin`] and, when one was
/// captured, its [`SpanTrace`] to the debug output.
pub struct ReportHandler {
    inner: Box<dyn EyreHandler>,
    origin: Origin,
    spans: SpanTrace,
}

impl ReportHandler {
    /// Provides a hook to install the handler via [`eyre::set_hook`].
    pub fn default_with(error: &(dyn std::error::Error + 'static)) -> Box<dyn EyreHandler> {
        Box::new(ReportHandler {
            inner: DefaultHandler::default_with(error),
            origin: Origin::current(),
            spans: SpanTrace::capture(),
        })
    }
}

impl EyreHandler for ReportHandler {
    fn debug(
        &self,
        error: &(dyn std::error::Error + 'static),
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        self.inner.debug(error, f)?;
        write!(f, "\n\nThread:\n    {}", self.origin)?;
        if self.spans.status() == SpanTraceStatus::CAPTURED {
            write!(f, "\n\nSpans:\n{}", self.spans)?;
        }
        Ok(())
    }

    fn display(
        &self,
        error: &(dyn std::error::Error + 'static),
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        self.inner.display(error, f)
    }

    fn track_caller(&mut self, location: &'static std::panic::Location<'static>) {
        self.inner.track_caller(location);
    }
}
