//! Meal CRUD screen.
//!
//! Every successful create, update or delete is followed by exactly one full
//! list reload before the success message is shown. A failed mutation leaves
//! the list as it was.

use parking_lot::Mutex;
use sims_application::{InFlight, MealsClient, OperationKey, ResourceError};
use sims_domain::{Meal, MealForm, MealId, ScreenState};
use tracing::{debug, info, warn};

use super::Confirmation;
use crate::state::MealsState;

/// How a screen action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The call succeeded.
    Completed,
    /// Validation or the call failed; the status line says why.
    Failed,
    /// The same operation was already in flight; nothing was sent.
    Suppressed,
    /// The user declined the confirmation.
    Cancelled,
}

/// Presentation model of the meal screen.
#[derive(Debug)]
pub struct MealsScreen {
    client: MealsClient,
    in_flight: InFlight,
    state: Mutex<MealsState>,
}

impl MealsScreen {
    /// Creates an empty screen over `client`.
    #[must_use]
    pub fn new(client: MealsClient) -> Self {
        Self {
            client,
            in_flight: InFlight::new(),
            state: Mutex::new(MealsState::default()),
        }
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> MealsState {
        self.state.lock().clone()
    }

    /// Current status line.
    #[must_use]
    pub fn status(&self) -> ScreenState {
        self.state.lock().status.clone()
    }

    /// Loaded records.
    #[must_use]
    pub fn meals(&self) -> Vec<Meal> {
        self.state.lock().meals.clone()
    }

    /// Current form contents.
    #[must_use]
    pub fn form(&self) -> MealForm {
        self.state.lock().form.clone()
    }

    /// Text table of the loaded records.
    #[must_use]
    pub fn render(&self) -> String {
        self.state.lock().render()
    }

    /// Operations currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> Vec<OperationKey> {
        self.in_flight.active()
    }

    /// Opens an empty form for a new record.
    pub fn start_create(&self) {
        self.state.lock().reset_form();
    }

    /// Copies a loaded record into the form. Returns false if `id` is not
    /// in the list.
    pub fn start_edit(&self, id: MealId) -> bool {
        let mut state = self.state.lock();
        let Some(form) = state.find(id).map(MealForm::edit) else {
            return false;
        };
        state.form = form;
        true
    }

    /// Drops the edit and resets the form.
    pub fn cancel_edit(&self) {
        self.state.lock().reset_form();
    }

    /// Changes form fields in place.
    pub fn edit_form(&self, change: impl FnOnce(&mut MealForm)) {
        change(&mut self.state.lock().form);
    }

    /// Reloads the list.
    pub async fn load(&self) -> ActionOutcome {
        let Some(_guard) = self.in_flight.try_begin(OperationKey::List) else {
            debug!("List already loading");
            return ActionOutcome::Suppressed;
        };
        self.set_status(ScreenState::loading());
        match self.reload().await {
            Ok(count) => {
                self.set_status(ScreenState::success(format!("{count} meals loaded")));
                ActionOutcome::Completed
            }
            Err(e) => {
                self.set_status(failure("Load", &e));
                ActionOutcome::Failed
            }
        }
    }

    /// Sends the form: an update while editing, a create otherwise.
    pub async fn submit(&self) -> ActionOutcome {
        let form = self.form();
        let action = if form.is_editing() { "Update" } else { "Create" };
        match form.to_meal() {
            Ok(meal) if form.is_editing() => self.update(&meal).await,
            Ok(meal) => self.create(&meal).await,
            Err(e) => {
                self.set_status(failure(action, &ResourceError::Invalid(e)));
                ActionOutcome::Failed
            }
        }
    }

    /// Creates `meal`, then reloads the list.
    pub async fn create(&self, meal: &Meal) -> ActionOutcome {
        let Some(_guard) = self.in_flight.try_begin(OperationKey::Create) else {
            return ActionOutcome::Suppressed;
        };
        self.set_status(ScreenState::loading());
        match self.client.create(meal).await {
            Ok(created) => {
                info!(id = ?created.and_then(|m| m.id), "Meal created");
                self.after_mutation("Meal created").await
            }
            Err(e) => self.mutation_failed("Create", &e),
        }
    }

    /// Replaces the stored record with `meal`, then reloads the list.
    pub async fn update(&self, meal: &Meal) -> ActionOutcome {
        let Some(_guard) = self.in_flight.try_begin(OperationKey::Update) else {
            return ActionOutcome::Suppressed;
        };
        self.set_status(ScreenState::loading());
        match self.client.update(meal).await {
            Ok(_) => {
                info!(id = ?meal.id, "Meal updated");
                self.after_mutation("Meal updated").await
            }
            Err(e) => self.mutation_failed("Update", &e),
        }
    }

    /// Deletes the record `id` once `confirmation` approves, then reloads
    /// the list.
    ///
    /// A delete of the same id still in flight is suppressed without asking.
    pub async fn delete(&self, id: MealId, confirmation: &dyn Confirmation) -> ActionOutcome {
        let Some(_guard) = self.in_flight.try_begin(OperationKey::delete(id)) else {
            debug!(%id, "Delete already in flight");
            return ActionOutcome::Suppressed;
        };
        if !confirmation.confirm(&format!("Delete meal {id}?")) {
            self.set_status(ScreenState::Idle);
            return ActionOutcome::Cancelled;
        }
        self.set_status(ScreenState::loading());
        match self.client.delete(id).await {
            Ok(()) => {
                info!(%id, "Meal deleted");
                self.after_mutation("Meal deleted").await
            }
            Err(e) => self.mutation_failed("Delete", &e),
        }
    }

    async fn reload(&self) -> Result<usize, ResourceError> {
        let meals = self.client.list().await?;
        let count = meals.len();
        self.state.lock().apply_list(meals);
        Ok(count)
    }

    async fn after_mutation(&self, message: &str) -> ActionOutcome {
        self.state.lock().reset_form();
        match self.reload().await {
            Ok(_) => {
                self.set_status(ScreenState::success(message));
                ActionOutcome::Completed
            }
            Err(e) => {
                warn!(error = %e, "Reload after change failed");
                self.set_status(failure("Load", &e));
                ActionOutcome::Failed
            }
        }
    }

    fn mutation_failed(&self, action: &str, error: &ResourceError) -> ActionOutcome {
        warn!(action, error = %error, "Meal change rejected");
        self.set_status(failure(action, error));
        ActionOutcome::Failed
    }

    fn set_status(&self, status: ScreenState) {
        self.state.lock().status = status;
    }
}

fn failure(action: &str, error: &ResourceError) -> ScreenState {
    ScreenState::Error {
        status: error.failure_status(),
        message: format!("{action} failed: {error}"),
    }
}
