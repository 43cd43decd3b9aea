//! Download progress on the terminal.
//!
//! The bar advances once per finished committer. Log lines are written with
//! the bar suspended so the two never interleave.

use std::io::{self, Write};

use indicatif::ProgressBar;

use gitavatar_core::{Event, EventSink, TracingSink};

/// Advances `bar` as committers finish; every other event goes to `tracing`.
pub struct ProgressSink {
    bar: ProgressBar,
    fallback: TracingSink,
}

impl ProgressSink {
    pub fn new(bar: ProgressBar) -> Self {
        Self {
            bar,
            fallback: TracingSink,
        }
    }
}

impl EventSink for ProgressSink {
    fn record(&self, event: &Event<'_>) {
        match event {
            Event::FetchStarted { committer, .. } => {
                self.fallback.record(event);
                self.bar.set_message(committer.name().to_string());
            }
            Event::Saved { .. } | Event::NotFound { .. } | Event::Failed { .. } => {
                self.fallback.record(event);
                self.bar.inc(1);
            }
            _ => self.fallback.record(event),
        }
    }
}

/// stderr writer for the tracing subscriber that hides `bar` while a line is
/// written.
pub struct LogWriter {
    bar: ProgressBar,
}

impl LogWriter {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bar.suspend(|| io::stderr().write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.bar.suspend(|| io::stderr().write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}
