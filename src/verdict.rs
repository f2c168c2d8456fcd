use std::{fmt, str::FromStr};

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("В ответе API нет ключа {0}")]
    MissingField(&'static str),
    #[error("Появился новый недокументированный статус домашней работы: {0}")]
    UnknownVerdict(String),
}

/// Review outcome reported by the status API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Reviewing,
    Rejected,
}

impl Verdict {
    pub fn text(&self) -> &'static str {
        match self {
            Verdict::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Verdict::Reviewing => "Работа взята на проверку ревьюером.",
            Verdict::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl FromStr for Verdict {
    type Err = StatusError;

    fn from_str(status: &str) -> Result<Self, Self::Err> {
        match status {
            "approved" => Ok(Verdict::Approved),
            "reviewing" => Ok(Verdict::Reviewing),
            "rejected" => Ok(Verdict::Rejected),
            other => Err(StatusError::UnknownVerdict(other.to_string())),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Builds the status-change notification for a single homework record.
pub fn parse_status(homework: &Map<String, Value>) -> Result<String, StatusError> {
    let homework_name = homework
        .get("homework_name")
        .and_then(Value::as_str)
        .ok_or(StatusError::MissingField("homework_name"))?;
    let status = match homework.get("status") {
        Some(Value::String(status)) => status.as_str(),
        Some(other) => return Err(StatusError::UnknownVerdict(other.to_string())),
        None => return Err(StatusError::MissingField("status")),
    };
    let verdict: Verdict = status.parse()?;

    Ok(format!(
        "Изменился статус проверки работы \"{homework_name}\". {verdict}"
    ))
}
