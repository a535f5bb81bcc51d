//! SIMS UI - Screens and console bridge
//!
//! This crate provides the presentation models behind the SIMS console: the
//! identity test screen, the meal CRUD screen and the diagnostic screen,
//! plus the command/update protocol the console talks to them through.

pub mod bridge;
pub mod console;
pub mod screens;
pub mod state;
pub mod table;

#[cfg(test)]
mod test_support;

pub use bridge::{FormField, Screens, UiCommand, UiUpdate, run_dispatcher};
pub use console::{ConsoleInput, HELP, parse_line, session_menu};
pub use screens::{
    ActionOutcome, Answered, Confirmation, DiagnosticsScreen, MealsScreen, SessionAction,
    SessionScreen,
};
pub use state::{DiagnosticsState, MealsState};
pub use table::{MealRow, meal_rows, render_meals};
