use std::{error::Error as _, time::Duration};

use log::debug;
use serde_json::Value;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Ошибка запроса к основному API адресу {endpoint}: {message}")]
    Connection { endpoint: String, message: String },
    #[error("Эндпоинт {endpoint} недоступен. Код ответа API: {status}")]
    Status { endpoint: String, status: u16 },
    #[error("Ответ API не удалось разобрать как JSON: {0}")]
    Decode(String),
}

/// Source of homework status responses
pub trait StatusSource {
    fn fetch(&self, from_date: i64) -> Result<Value, ApiError>;
}

/// Client for the Practicum homework statuses API
pub struct PracticumClient {
    agent: ureq::Agent,
    endpoint: Url,
    token: String,
}

impl PracticumClient {
    pub fn new(endpoint: Url, token: String, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        PracticumClient {
            agent,
            endpoint,
            token,
        }
    }
}

/// Describes a transport failure without the request URL, which carries
/// the per-cycle `from_date` and would make every fault text unique.
fn transport_message(transport: &ureq::Transport) -> String {
    let mut message = transport.kind().to_string();
    if let Some(detail) = transport.message() {
        message.push_str(&format!(": {detail}"));
    }
    if let Some(source) = transport.source() {
        message.push_str(&format!(": {source}"));
    }
    message
}

impl StatusSource for PracticumClient {
    fn fetch(&self, from_date: i64) -> Result<Value, ApiError> {
        let endpoint = self.endpoint.as_str();
        debug!("Requesting homework statuses from {endpoint} since {from_date}");
        let resp = self
            .agent
            .get(endpoint)
            .set("Authorization", &format!("OAuth {}", self.token))
            .query("from_date", &from_date.to_string())
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(status, _) => ApiError::Status {
                    endpoint: endpoint.to_string(),
                    status,
                },
                ureq::Error::Transport(transport) => ApiError::Connection {
                    endpoint: endpoint.to_string(),
                    message: transport_message(&transport),
                },
            })?;

        if resp.status() != 200 {
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: resp.status(),
            });
        }

        resp.into_json::<Value>()
            .map_err(|err| ApiError::Decode(err.to_string()))
    }
}
