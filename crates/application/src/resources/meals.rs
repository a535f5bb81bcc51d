//! The `repas` resource.

use sims_domain::{DomainResult, Meal, MealId};

use super::{Resource, ResourceClient};

/// CRUD client for meals.
pub type MealsClient = ResourceClient<Meal>;

impl Resource for Meal {
    const PATH: &'static str = "/api/repas";
    const NAME: &'static str = "meal";

    type Id = MealId;

    fn id(&self) -> Option<MealId> {
        self.id
    }

    fn without_id(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }

    fn validate(&self) -> DomainResult<()> {
        Self::validate(self)
    }
}
