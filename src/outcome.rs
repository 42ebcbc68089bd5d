//! Result of a validation pass: the human-readable messages and the verdict.
//!
//! Every validator in the crate returns an [`Outcome`] instead of an error.
//! Callers fold child outcomes into their own with [`Outcome::absorb`], so a
//! failure deep in the descriptor never stops sibling checks from running.

use serde::Serialize;

/// Accumulated validation messages plus an overall pass/fail verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use]
pub struct Outcome {
    pub messages: Vec<String>,
    pub passed: bool,
}

impl Default for Outcome {
    fn default() -> Self {
        Self::pass()
    }
}

impl Outcome {
    /// An outcome with no messages that has passed.
    pub fn pass() -> Self {
        Self {
            messages: Vec::new(),
            passed: true,
        }
    }

    /// An outcome that has failed with a single message.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
            passed: false,
        }
    }

    /// Records a failure message and flips the verdict.
    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
        self.passed = false;
    }

    /// Appends another outcome's messages; the verdict is the conjunction.
    pub fn absorb(&mut self, other: Outcome) {
        self.messages.extend(other.messages);
        self.passed &= other.passed;
    }

    pub fn is_ok(&self) -> bool {
        self.passed
    }
}

impl FromIterator<Outcome> for Outcome {
    fn from_iter<I: IntoIterator<Item = Outcome>>(iter: I) -> Self {
        let mut acc = Outcome::pass();
        for o in iter {
            acc.absorb(o);
        }
        acc
    }
}
