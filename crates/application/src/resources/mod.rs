//! Typed CRUD access to REST resources.

mod client;
mod meals;

pub use client::{Resource, ResourceClient, ResourceError};
pub use meals::MealsClient;
