//! Batch execution options.

use std::time::Duration;

/// Concurrency used when the caller does not ask for one.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Hard ceiling on members in flight at once.
pub const MAX_CONCURRENCY: usize = 10;

/// How a batch is executed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    /// Dispatch members in concurrent chunks instead of one by one.
    pub parallel: bool,
    max_concurrency: usize,
    /// Stop dispatching after the first orchestration-level member failure.
    pub fail_fast: bool,
    /// Job-level deadline; checked between chunks.
    pub timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_concurrency: DEFAULT_CONCURRENCY,
            fail_fast: false,
            timeout: None,
        }
    }
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Sets the chunk size, clamped into `1..=MAX_CONCURRENCY`.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Members dispatched together: `max_concurrency` in parallel mode, one otherwise.
    pub fn chunk_size(&self) -> usize {
        if self.parallel {
            self.max_concurrency
        } else {
            1
        }
    }
}
