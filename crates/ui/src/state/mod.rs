//! UI state snapshots.

mod diagnostics_state;
mod meals_state;

pub use diagnostics_state::DiagnosticsState;
pub use meals_state::MealsState;
