//! The meal (`repas`) resource.
//!
//! Field names on the wire follow the remote API (`nom`, `typeRepas`,
//! `prix`, `relation`, `idUser`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DomainError, DomainResult};

/// Owner id sent when the form does not say otherwise.
pub const DEFAULT_OWNER_ID: i64 = 1;

/// Server-assigned meal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MealId(pub i64);

impl fmt::Display for MealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MealId {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        s.trim().parse().map(Self).map_err(|_| DomainError::InvalidField {
            field: "id",
            message: format!("{s:?} is not a number"),
        })
    }
}

/// Meal category, one of a fixed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MealCategory {
    /// Starter.
    #[serde(rename = "entrée", alias = "starter")]
    Starter,
    /// Main course.
    #[default]
    #[serde(rename = "plat principal", alias = "main")]
    Main,
    /// Dessert.
    #[serde(rename = "dessert")]
    Dessert,
    /// Drink.
    #[serde(rename = "boisson", alias = "drink")]
    Drink,
}

impl MealCategory {
    /// All categories in display order.
    pub const ALL: [Self; 4] = [Self::Starter, Self::Main, Self::Dessert, Self::Drink];

    /// The value sent to and received from the API.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Starter => "entrée",
            Self::Main => "plat principal",
            Self::Dessert => "dessert",
            Self::Drink => "boisson",
        }
    }

    /// Short English label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Main => "main",
            Self::Dessert => "dessert",
            Self::Drink => "drink",
        }
    }
}

impl fmt::Display for MealCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for MealCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.wire_name() == wanted || c.label() == wanted)
            .ok_or(DomainError::UnknownCategory(wanted))
    }
}

/// A meal record as exchanged with the API.
///
/// `id` is absent on create and present on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MealId>,
    /// Display name.
    #[serde(rename = "nom")]
    pub name: String,
    /// Category.
    #[serde(rename = "typeRepas", default)]
    pub category: MealCategory,
    /// Price in euros.
    #[serde(rename = "prix", deserialize_with = "price_from_number_or_string")]
    pub price: f64,
    /// Origin tag, e.g. "italian".
    #[serde(rename = "relation", default, deserialize_with = "string_or_null")]
    pub origin: String,
    /// Free-text description.
    #[serde(default, deserialize_with = "string_or_null")]
    pub description: String,
    /// Owning user id.
    #[serde(rename = "idUser", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
}

impl Meal {
    /// Creates a meal without an id, ready to be posted.
    #[must_use]
    pub fn new(name: impl Into<String>, category: MealCategory, price: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            category,
            price,
            origin: String::new(),
            description: String::new(),
            owner_id: Some(DEFAULT_OWNER_ID),
        }
    }

    /// Sets the server id.
    #[must_use]
    pub const fn with_id(mut self, id: MealId) -> Self {
        self.id = Some(id);
        self
    }

    /// Checks the fields the API requires.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the price is not a finite number.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::MissingField("name"));
        }
        if !self.price.is_finite() {
            return Err(DomainError::InvalidField {
                field: "price",
                message: "must be a number".to_string(),
            });
        }
        Ok(())
    }
}

/// Editable form backing the create/update screen.
///
/// Holds the price as raw text so a half-typed value can be shown back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealForm {
    /// Id of the meal being edited; `None` while creating.
    pub editing: Option<MealId>,
    /// Name input.
    pub name: String,
    /// Category selection.
    pub category: MealCategory,
    /// Price input.
    pub price: String,
    /// Origin input.
    pub origin: String,
    /// Description input.
    pub description: String,
    /// Owner id carried through edits.
    pub owner_id: i64,
}

impl Default for MealForm {
    fn default() -> Self {
        Self {
            editing: None,
            name: String::new(),
            category: MealCategory::default(),
            price: String::new(),
            origin: String::new(),
            description: String::new(),
            owner_id: DEFAULT_OWNER_ID,
        }
    }
}

impl MealForm {
    /// Fills the form from an existing record for editing.
    #[must_use]
    pub fn edit(meal: &Meal) -> Self {
        Self {
            editing: meal.id,
            name: meal.name.clone(),
            category: meal.category,
            price: meal.price.to_string(),
            origin: meal.origin.clone(),
            description: meal.description.clone(),
            owner_id: meal.owner_id.unwrap_or(DEFAULT_OWNER_ID),
        }
    }

    /// Returns true while editing an existing record.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Converts the form into a validated record.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the price does not parse.
    pub fn to_meal(&self) -> DomainResult<Meal> {
        let price_input = self.price.trim();
        if price_input.is_empty() {
            return Err(DomainError::MissingField("price"));
        }
        let price = parse_price(price_input).ok_or_else(|| DomainError::InvalidField {
            field: "price",
            message: format!("{price_input:?} is not a number"),
        })?;

        let meal = Meal {
            id: self.editing,
            name: self.name.trim().to_string(),
            category: self.category,
            price,
            origin: self.origin.trim().to_string(),
            description: self.description.trim().to_string(),
            owner_id: Some(self.owner_id),
        };
        meal.validate()?;
        Ok(meal)
    }
}

/// Parses a price, accepting a decimal comma.
fn parse_price(input: &str) -> Option<f64> {
    input
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
}

fn price_from_number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => parse_price(s.trim())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid price {s:?}"))),
    }
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
