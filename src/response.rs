use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResponseError {
    #[error("Структура данных ответа от API не соответствует ожиданиям")]
    NotAnObject,
    #[error("Отсутствует ожидаемый ключ homeworks в ответе API")]
    MissingHomeworks,
    #[error("Структура данных под ключом homeworks не соответствует ожиданиям")]
    HomeworksNotList,
    #[error("Запись о домашней работе не является объектом")]
    RecordNotObject,
}

/// Result of a structurally valid response
#[derive(Debug, PartialEq)]
pub enum Checked<'a> {
    /// Most recent homework, the API lists newest first
    Latest(&'a Map<String, Value>),
    /// Nothing changed within the query window
    Empty,
}

pub fn check_response(response: &Value) -> Result<Checked<'_>, ResponseError> {
    let response = response.as_object().ok_or(ResponseError::NotAnObject)?;
    let homeworks = response
        .get("homeworks")
        .ok_or(ResponseError::MissingHomeworks)?
        .as_array()
        .ok_or(ResponseError::HomeworksNotList)?;

    match homeworks.first() {
        None => Ok(Checked::Empty),
        Some(Value::Object(latest)) => Ok(Checked::Latest(latest)),
        Some(_) => Err(ResponseError::RecordNotObject),
    }
}

/// Server-side timestamp of the response, used to advance the poll cursor.
pub fn reported_timestamp(response: &Value) -> Option<i64> {
    response.get("current_date").and_then(Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_homework_is_current() {
        let response = json!({
            "homeworks": [
                {"homework_name": "newest", "status": "reviewing"},
                {"homework_name": "older", "status": "approved"},
            ],
            "current_date": 1700000000,
        });
        match check_response(&response).unwrap() {
            Checked::Latest(homework) => assert_eq!(homework["homework_name"], "newest"),
            Checked::Empty => panic!("expected a homework"),
        }
    }

    #[test]
    fn test_empty_homeworks_is_not_an_error() {
        let response = json!({"homeworks": [], "current_date": 1700000000});
        assert_eq!(check_response(&response), Ok(Checked::Empty));
    }

    #[test]
    fn test_missing_homeworks_key() {
        let response = json!({"current_date": 1700000000});
        assert_eq!(
            check_response(&response),
            Err(ResponseError::MissingHomeworks)
        );
    }

    #[test]
    fn test_response_not_an_object() {
        let response = json!([{"homework_name": "hw1", "status": "approved"}]);
        assert_eq!(check_response(&response), Err(ResponseError::NotAnObject));
    }

    #[test]
    fn test_homeworks_not_a_list() {
        let response = json!({"homeworks": {"homework_name": "hw1"}});
        assert_eq!(
            check_response(&response),
            Err(ResponseError::HomeworksNotList)
        );
    }

    #[test]
    fn test_homework_record_not_an_object() {
        let response = json!({"homeworks": ["hw1"]});
        assert_eq!(
            check_response(&response),
            Err(ResponseError::RecordNotObject)
        );
    }

    #[test]
    fn test_reported_timestamp() {
        assert_eq!(
            reported_timestamp(&json!({"homeworks": [], "current_date": 1700000000})),
            Some(1700000000)
        );
        assert_eq!(reported_timestamp(&json!({"homeworks": []})), None);
        assert_eq!(
            reported_timestamp(&json!({"current_date": "yesterday"})),
            None
        );
    }
}
