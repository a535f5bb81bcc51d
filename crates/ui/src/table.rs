//! Plain-text rendering of the meal list.

use std::fmt::Write;

use sims_domain::Meal;

const HEADERS: [&str; 6] = ["ID", "Name", "Category", "Price", "Origin", "Description"];

/// Row of display cells for one meal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealRow {
    /// Cells in header order.
    pub cells: [String; 6],
}

impl MealRow {
    /// Builds the display cells for `meal`.
    #[must_use]
    pub fn from_meal(meal: &Meal) -> Self {
        Self {
            cells: [
                meal.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                meal.name.clone(),
                meal.category.label().to_string(),
                format!("{:.2}", meal.price),
                meal.origin.clone(),
                meal.description.clone(),
            ],
        }
    }
}

/// Builds rows for `meals`, in list order.
#[must_use]
pub fn meal_rows(meals: &[Meal]) -> Vec<MealRow> {
    meals.iter().map(MealRow::from_meal).collect()
}

/// Renders `meals` as an aligned text table.
///
/// The output depends only on the records, so rendering the same list twice
/// yields the same text.
#[must_use]
pub fn render_meals(meals: &[Meal]) -> String {
    if meals.is_empty() {
        return "No meals.\n".to_string();
    }
    let rows = meal_rows(meals);

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in &rows {
        push_line(&mut out, &row.cells, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize; 6]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join(" | ");
    let _ = writeln!(out, "{}", line.trim_end());
}
