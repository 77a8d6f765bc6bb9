//! One-shot developer credit
//!
//! The credit line is visible until the grace deadline passes. Once it has
//! been observed as expired it stays suppressed for the rest of the
//! process lifetime.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CreditBanner {
    text: String,
    deadline: Instant,
    expired: bool,
}

impl CreditBanner {
    pub fn new(text: impl Into<String>, started: Instant, grace: Duration) -> Self {
        let text = text.into();
        Self {
            expired: grace.is_zero() || text.trim().is_empty(),
            text,
            deadline: started + grace,
        }
    }

    /// Credit text if still inside the grace window
    pub fn current(&mut self, now: Instant) -> Option<&str> {
        if !self.expired && now >= self.deadline {
            self.expired = true;
        }
        (!self.expired).then_some(self.text.as_str())
    }
}
