//! UI Bridge Module
//!
//! Defines the communication protocol between the console thread and the
//! async Tokio runtime. The console sends [`UiCommand`]s; the dispatcher
//! runs each one against the screens on its own task and answers with
//! [`UiUpdate`]s, so distinct operations overlap.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use sims_application::{Probe, ProbeReport};
use sims_domain::{DomainError, MealCategory, MealForm, MealId, ScreenState};
use tokio::sync::mpsc;
use tracing::debug;

use crate::screens::{
    ActionOutcome, Answered, DiagnosticsScreen, MealsScreen, SessionAction, SessionScreen,
};

/// Commands sent from the console to the async runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    /// Run one of the numbered session actions.
    Session(SessionAction),

    /// Run a diagnostic probe.
    Probe(Probe),

    /// Reload the meal list.
    ListMeals,

    /// Open an empty meal form.
    StartCreate,

    /// Copy a loaded meal into the form.
    StartEdit { id: MealId },

    /// Drop the current edit.
    CancelEdit,

    /// Fill the form and send it: a create when `id` is `None`, otherwise
    /// an update of that meal.
    SaveMeal {
        id: Option<MealId>,
        fields: Vec<(FormField, String)>,
    },

    /// Delete a meal; `confirmed` is the user's answer to the prompt.
    DeleteMeal { id: MealId, confirmed: bool },
}

/// Updates sent from the async runtime to the console.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    /// Info message from the session screen.
    SessionMessage(String),

    /// A probe finished.
    ProbeFinished { probe: Probe, report: ProbeReport },

    /// New status line of the meal screen.
    MealsStatus(ScreenState),

    /// The meal list as a text table.
    MealsTable(String),

    /// Current form contents.
    Form(MealForm),

    /// The operation was already running; nothing was sent.
    Suppressed { operation: String },

    /// Show an error message.
    Error { title: String, message: String },
}

impl fmt::Display for UiUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionMessage(message) => f.write_str(message),
            Self::ProbeFinished { probe, report } => {
                write!(f, "[{probe}]\n{}", report.to_pretty_json())
            }
            Self::MealsStatus(status) => match status.message() {
                Some(message) => f.write_str(message),
                None if status.is_loading() => f.write_str("Loading..."),
                None => Ok(()),
            },
            Self::MealsTable(table) => f.write_str(table.trim_end()),
            Self::Form(form) => write!(
                f,
                "{} | name: {} | category: {} | price: {} | origin: {} | description: {}",
                form.editing
                    .map_or_else(|| "new meal".to_string(), |id| format!("editing {id}")),
                form.name,
                form.category.wire_name(),
                form.price,
                form.origin,
                form.description,
            ),
            Self::Suppressed { operation } => write!(f, "{operation} already in progress"),
            Self::Error { title, message } => write!(f, "{title}: {message}"),
        }
    }
}

/// Editable fields of the meal form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    /// `nom`
    Name,
    /// `typeRepas`
    Category,
    /// `prix`
    Price,
    /// `relation`
    Origin,
    /// `description`
    Description,
}

impl FormField {
    /// Writes `value` into `form`.
    ///
    /// # Errors
    ///
    /// Returns an error if a category value is not one of the known ones.
    pub fn apply(self, form: &mut MealForm, value: &str) -> Result<(), DomainError> {
        match self {
            Self::Name => form.name = value.to_string(),
            Self::Category => form.category = value.parse::<MealCategory>()?,
            Self::Price => form.price = value.to_string(),
            Self::Origin => form.origin = value.to_string(),
            Self::Description => form.description = value.to_string(),
        }
        Ok(())
    }
}

impl FromStr for FormField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" | "nom" => Ok(Self::Name),
            "category" | "type" | "typerepas" => Ok(Self::Category),
            "price" | "prix" => Ok(Self::Price),
            "origin" | "relation" => Ok(Self::Origin),
            "description" => Ok(Self::Description),
            other => Err(DomainError::InvalidField {
                field: "form field",
                message: format!("unknown field {other:?}"),
            }),
        }
    }
}

/// The three screens driven by the console.
#[derive(Debug)]
pub struct Screens {
    /// Identity test screen.
    pub session: SessionScreen,
    /// Meal CRUD screen.
    pub meals: MealsScreen,
    /// Diagnostic screen.
    pub diagnostics: DiagnosticsScreen,
}

impl Screens {
    /// Runs `command` and returns the updates it produced.
    pub async fn handle(&self, command: UiCommand) -> Vec<UiUpdate> {
        match command {
            UiCommand::Session(action) => {
                vec![UiUpdate::SessionMessage(self.session.perform(action).await)]
            }
            UiCommand::Probe(probe) => match self.diagnostics.run(probe).await {
                Some(report) => vec![UiUpdate::ProbeFinished { probe, report }],
                None => vec![UiUpdate::Suppressed {
                    operation: format!("probe {probe}"),
                }],
            },
            UiCommand::ListMeals => {
                let outcome = self.meals.load().await;
                self.meals_updates(outcome, "list")
            }
            UiCommand::StartCreate => {
                self.meals.start_create();
                vec![UiUpdate::Form(self.meals.form())]
            }
            UiCommand::StartEdit { id } => self.start_edit(id),
            UiCommand::CancelEdit => {
                self.meals.cancel_edit();
                vec![UiUpdate::Form(self.meals.form())]
            }
            UiCommand::SaveMeal { id, fields } => self.save(id, &fields).await,
            UiCommand::DeleteMeal { id, confirmed } => {
                let outcome = self.meals.delete(id, &Answered(confirmed)).await;
                self.meals_updates(outcome, &format!("delete {id}"))
            }
        }
    }

    fn start_edit(&self, id: MealId) -> Vec<UiUpdate> {
        if self.meals.start_edit(id) {
            vec![UiUpdate::Form(self.meals.form())]
        } else {
            vec![UiUpdate::Error {
                title: "Edit".to_string(),
                message: format!("meal {id} is not in the list; run `meals list` first"),
            }]
        }
    }

    async fn save(&self, id: Option<MealId>, fields: &[(FormField, String)]) -> Vec<UiUpdate> {
        match id {
            Some(id) => {
                if !self.meals.start_edit(id) {
                    return self.start_edit(id);
                }
            }
            None => self.meals.start_create(),
        }

        let mut rejected = None;
        self.meals.edit_form(|form| {
            for (field, value) in fields {
                if let Err(e) = field.apply(form, value) {
                    rejected = Some(e);
                    return;
                }
            }
        });
        if let Some(e) = rejected {
            return vec![UiUpdate::Error {
                title: "Form".to_string(),
                message: e.to_string(),
            }];
        }

        let outcome = self.meals.submit().await;
        let mut updates = self.meals_updates(outcome, if id.is_some() { "update" } else { "create" });
        if outcome == ActionOutcome::Failed {
            updates.push(UiUpdate::Form(self.meals.form()));
        }
        updates
    }

    fn meals_updates(&self, outcome: ActionOutcome, operation: &str) -> Vec<UiUpdate> {
        match outcome {
            ActionOutcome::Suppressed => vec![UiUpdate::Suppressed {
                operation: operation.to_string(),
            }],
            ActionOutcome::Completed => vec![
                UiUpdate::MealsTable(self.meals.render()),
                UiUpdate::MealsStatus(self.meals.status()),
            ],
            ActionOutcome::Failed | ActionOutcome::Cancelled => {
                vec![UiUpdate::MealsStatus(self.meals.status())]
            }
        }
    }
}

/// Runs commands until the command channel closes.
///
/// Each command gets its own task; updates are forwarded as they come.
pub async fn run_dispatcher(
    screens: Arc<Screens>,
    mut cmd_rx: mpsc::UnboundedReceiver<UiCommand>,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
) {
    while let Some(command) = cmd_rx.recv().await {
        debug!(?command, "Dispatching");
        let screens = Arc::clone(&screens);
        let update_tx = update_tx.clone();
        tokio::spawn(async move {
            for update in screens.handle(command).await {
                if update_tx.send(update).is_err() {
                    break;
                }
            }
        });
    }
    debug!("Command channel closed");
}
