//! Response validation and status-message extraction.
//!
//! Both stages work on the raw `serde_json::Value` returned by the API so
//! that each kind of shape violation maps to its own `SchemaError`.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{json_type, SchemaError};

/// Review verdict of a homework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    pub const ALL: [HomeworkStatus; 3] = [Self::Approved, Self::Reviewing, Self::Rejected];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Reviewing => "reviewing",
            Self::Rejected => "rejected",
        }
    }

    /// Human-readable verdict text.
    pub fn verdict(self) -> &'static str {
        match self {
            Self::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Self::Reviewing => "Работа взята на проверку ревьюером.",
            Self::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl FromStr for HomeworkStatus {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| SchemaError::UnknownStatus(Some(s.to_string())))
    }
}

impl fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated homework record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Homework {
    pub name: String,
    pub status: HomeworkStatus,
}

impl Homework {
    pub fn from_value(record: &Value) -> Result<Self, SchemaError> {
        let name = match record.get("homework_name") {
            None | Some(Value::Null) => return Err(SchemaError::MissingKey("homework_name")),
            Some(Value::String(name)) if name.is_empty() => {
                return Err(SchemaError::EmptyValue("homework_name"))
            }
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(SchemaError::UnexpectedType {
                    expected: "string",
                    found: json_type(other),
                })
            }
        };

        let status = match record.get("status") {
            Some(Value::String(s)) => s.parse()?,
            Some(Value::Null) | None => return Err(SchemaError::UnknownStatus(None)),
            Some(other) => return Err(SchemaError::UnknownStatus(Some(other.to_string()))),
        };

        Ok(Self { name, status })
    }

    pub fn message(&self) -> String {
        format!(
            "Изменился статус проверки работы \"{}\".{}",
            self.name,
            self.status.verdict()
        )
    }
}

/// Confirm the response shape and return the `homeworks` array.
pub fn check_response(response: &Value) -> Result<&[Value], SchemaError> {
    let object = response.as_object().ok_or(SchemaError::UnexpectedType {
        expected: "object",
        found: json_type(response),
    })?;
    let homeworks = object
        .get("homeworks")
        .ok_or(SchemaError::MissingKey("homeworks"))?;
    match homeworks {
        Value::Array(items) => Ok(items.as_slice()),
        other => Err(SchemaError::UnexpectedType {
            expected: "array",
            found: json_type(other),
        }),
    }
}

/// Build the notification text for one homework record.
pub fn parse_status(record: &Value) -> Result<String, SchemaError> {
    Homework::from_value(record).map(|homework| homework.message())
}

/// Server-reported timestamp for the next query window, if usable.
///
/// Negative values are rejected since the cursor is never below 0.
pub fn current_date(response: &Value) -> Option<i64> {
    response
        .get("current_date")?
        .as_i64()
        .filter(|date| *date >= 0)
}
