//! UI state for the meal screen.

use sims_domain::{Meal, MealForm, MealId, ScreenState};

use crate::table::render_meals;

/// Everything the meal screen shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealsState {
    /// Records from the last successful list reload.
    pub meals: Vec<Meal>,
    /// Create/edit form.
    pub form: MealForm,
    /// Status line.
    pub status: ScreenState,
}

impl MealsState {
    /// Replaces the records with a fresh list.
    ///
    /// Applying the same list twice leaves the state unchanged.
    pub fn apply_list(&mut self, meals: Vec<Meal>) {
        self.meals = meals;
    }

    /// Looks up a loaded record.
    #[must_use]
    pub fn find(&self, id: MealId) -> Option<&Meal> {
        self.meals.iter().find(|meal| meal.id == Some(id))
    }

    /// Clears the form back to a new record.
    pub fn reset_form(&mut self) {
        self.form = MealForm::default();
    }

    /// Text table of the loaded records.
    #[must_use]
    pub fn render(&self) -> String {
        render_meals(&self.meals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sims_domain::MealCategory;

    #[test]
    fn test_apply_same_list_twice() {
        let list = vec![Meal::new("Soupe", MealCategory::Starter, 4.5).with_id(MealId(1))];
        let mut state = MealsState::default();

        state.apply_list(list.clone());
        let once = state.clone();
        state.apply_list(list);

        assert_eq!(state, once);
        assert_eq!(state.render(), once.render());
    }

    #[test]
    fn test_find_and_reset() {
        let mut state = MealsState::default();
        state.apply_list(vec![
            Meal::new("Tarte", MealCategory::Dessert, 3.0).with_id(MealId(4)),
        ]);
        state.form = MealForm::edit(&state.meals[0]);

        assert_eq!(state.find(MealId(4)).map(|m| m.name.as_str()), Some("Tarte"));
        assert!(state.find(MealId(5)).is_none());

        state.reset_form();
        assert_eq!(state.form, MealForm::default());
    }
}
