//! Screen presentation models.
//!
//! Each screen owns its in-flight registry and a [`ScreenState`] status line,
//! and is driven by the console through the bridge.
//!
//! [`ScreenState`]: sims_domain::ScreenState

mod diagnostics;
mod meals;
mod session;

pub use diagnostics::DiagnosticsScreen;
pub use meals::{ActionOutcome, MealsScreen};
pub use session::{SessionAction, SessionScreen};

/// Asks the user to approve a destructive action.
pub trait Confirmation: Send + Sync {
    /// Returns true when the user accepts `prompt`.
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// A confirmation answered before the command was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answered(pub bool);

impl Confirmation for Answered {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
