/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Bounded retry counters.

/// Outcome of recording a failure against a [`RetryBudget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Still within budget; carries the failure count so far.
    Retry(u32),
    /// The failure count now exceeds the budget.
    Exhausted,
}

impl RetryOutcome {
    /// Returns true for [`RetryOutcome::Exhausted`].
    #[must_use]
    pub const fn is_exhausted(self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// Counts failures against a maximum.
///
/// With a maximum of `n`, the first `n` failures are retried and failure
/// `n + 1` exhausts the budget. The counter only goes back to zero through
/// [`reset`](Self::reset); a later success does not clear it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    attempts: u32,
    max: u32,
}

impl RetryBudget {
    /// Creates a budget allowing `max` retries.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { attempts: 0, max }
    }

    /// Records one failure.
    pub fn record(&mut self) -> RetryOutcome {
        self.attempts = self.attempts.saturating_add(1);
        if self.attempts > self.max {
            RetryOutcome::Exhausted
        } else {
            RetryOutcome::Retry(self.attempts)
        }
    }

    /// Returns the failures recorded so far.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the configured maximum.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Clears the failure count.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
