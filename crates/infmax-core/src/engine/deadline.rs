//! Wall-clock budget for one optimization call.

use std::time::{Duration, Instant};

use crate::engine::errors::ImError;

/// Start time plus an optional limit. Checked between greedy rounds and
/// sampling batches; a running batch is never interrupted.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    pub fn start(limit: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    pub fn unbounded() -> Self {
        Self::start(None)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn check(&self) -> Result<(), ImError> {
        match self.limit {
            Some(limit) if self.start.elapsed() >= limit => Err(ImError::DeadlineExceeded {
                elapsed: self.start.elapsed(),
            }),
            _ => Ok(()),
        }
    }
}
