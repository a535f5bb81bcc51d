//! Console line parsing.
//!
//! Turns one line typed at the prompt into bridge commands. Deletes come
//! back as [`ConsoleInput::ConfirmDelete`] so the prompt can ask before the
//! command is sent.

use sims_application::Probe;
use sims_domain::MealId;

use crate::bridge::{FormField, UiCommand};
use crate::screens::SessionAction;

/// Help shown by `help`.
pub const HELP: &str = "\
Commands:
  session                      list the session actions
  session <1-10>               run a session action
  probe <token|user|admin|createuser|all>
  meals list                   reload the meal list
  meals new                    open an empty form
  meals create k=v ...         create a meal (nom, type, prix, relation, description)
  meals edit <id> [k=v ...]    edit a loaded meal; with fields, send the update
  meals cancel                 drop the current edit
  meals delete <id>            delete a meal (asks first)
  help                         show this help
  quit | exit                  leave";

/// What a console line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    /// Blank line.
    Empty,
    /// Print [`HELP`].
    Help,
    /// Print the session action menu.
    SessionMenu,
    /// Leave the console.
    Quit,
    /// Send these commands.
    Commands(Vec<UiCommand>),
    /// Ask before deleting this meal.
    ConfirmDelete(MealId),
}

/// Numbered menu of the session screen.
#[must_use]
pub fn session_menu() -> String {
    SessionAction::ALL
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses one console line.
///
/// # Errors
///
/// Returns a message for the user when the line is not understood.
pub fn parse_line(line: &str) -> Result<ConsoleInput, String> {
    let words = split_words(line)?;
    let words: Vec<&str> = words.iter().map(String::as_str).collect();
    match words.as_slice() {
        [] => Ok(ConsoleInput::Empty),
        ["help" | "?"] => Ok(ConsoleInput::Help),
        ["quit" | "exit"] => Ok(ConsoleInput::Quit),
        ["session"] => Ok(ConsoleInput::SessionMenu),
        ["session", number] => number
            .parse::<SessionAction>()
            .map(|action| single(UiCommand::Session(action)))
            .map_err(|e| e.to_string()),
        ["probe", "all"] => Ok(ConsoleInput::Commands(
            Probe::ALL.into_iter().map(UiCommand::Probe).collect(),
        )),
        ["probe", name] => name
            .parse::<Probe>()
            .map(|probe| single(UiCommand::Probe(probe)))
            .map_err(|e| e.to_string()),
        ["meals", rest @ ..] => parse_meals(rest),
        [other, ..] => Err(format!("unknown command {other:?}; try `help`")),
    }
}

fn parse_meals(words: &[&str]) -> Result<ConsoleInput, String> {
    match words {
        ["list"] => Ok(single(UiCommand::ListMeals)),
        ["new"] => Ok(single(UiCommand::StartCreate)),
        ["cancel"] => Ok(single(UiCommand::CancelEdit)),
        ["create", fields @ ..] => Ok(single(UiCommand::SaveMeal {
            id: None,
            fields: parse_fields(fields)?,
        })),
        ["edit", id] => Ok(single(UiCommand::StartEdit { id: parse_id(id)? })),
        ["edit", id, fields @ ..] => Ok(single(UiCommand::SaveMeal {
            id: Some(parse_id(id)?),
            fields: parse_fields(fields)?,
        })),
        ["delete", id] => Ok(ConsoleInput::ConfirmDelete(parse_id(id)?)),
        _ => Err("usage: meals list|new|create|edit|cancel|delete; try `help`".to_string()),
    }
}

fn single(command: UiCommand) -> ConsoleInput {
    ConsoleInput::Commands(vec![command])
}

fn parse_id(word: &str) -> Result<MealId, String> {
    word.parse::<MealId>()
        .map_err(|_| format!("{word:?} is not a meal id"))
}

fn parse_fields(words: &[&str]) -> Result<Vec<(FormField, String)>, String> {
    words
        .iter()
        .map(|word| {
            let (key, value) = word
                .split_once('=')
                .ok_or_else(|| format!("expected field=value, got {word:?}"))?;
            let field = key.parse::<FormField>().map_err(|e| e.to_string())?;
            Ok((field, value.to_string()))
        })
        .collect()
}

/// Splits on whitespace; double quotes group words.
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    words.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if quoted {
        return Err("unterminated quote".to_string());
    }
    if started {
        words.push(current);
    }
    Ok(words)
}
