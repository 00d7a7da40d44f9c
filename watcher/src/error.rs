//! Failure kinds of a single polling cycle.
//!
//! Display texts are in Russian because they are relayed to the chat as-is.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The remote response violates the documented shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Получен неожиданный тип: {found} (ожидался {expected})")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Отсутствует ключ {0}")]
    MissingKey(&'static str),
    #[error("Пустое значение ключа {0}")]
    EmptyValue(&'static str),
    #[error("Неожиданный статус домашней работы: \"{}\"", .0.as_deref().unwrap_or("<нет>"))]
    UnknownStatus(Option<String>),
    #[error("Ответ API не является корректным JSON: {0}")]
    MalformedBody(String),
}

/// Why the API answered but refused to give usable data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFailure {
    Status(u16),
    Indicator { key: String, value: String },
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "Код ответа API: {}", code),
            Self::Indicator { key, value } => {
                write!(f, "Ключ: {}. Значение ключа: {}", key, value)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error(
        "Ошибка запроса к API: {chain}. Эндпоинт API: {endpoint}, from_date: {from_date}",
        chain = error_chain(.source.as_ref())
    )]
    Transport {
        endpoint: String,
        from_date: i64,
        #[source]
        source: BoxError,
    },
    #[error("Эндпоинт API {endpoint} недоступен. {reason}. from_date: {from_date}")]
    RemoteService {
        endpoint: String,
        from_date: i64,
        reason: RemoteFailure,
    },
    #[error("Ответ API не соответствует документации. {0}")]
    Schema(#[from] SchemaError),
}

impl PollError {
    /// The single text sent to the chat for any failed cycle.
    pub fn diagnostic(&self) -> String {
        format!("Ошибка в работе бота: {}", self)
    }
}

/// Render an error with every `source()` below it, joined by `: `.
///
/// reqwest keeps the actual cause (refused connection, DNS, timeout) out of
/// its own Display.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

/// JSON type name used in schema error messages.
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
