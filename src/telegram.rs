use std::time::Duration;

use log::debug;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Telegram отклонил сообщение (код {status}): {description}")]
    Protocol { status: u16, description: String },
    #[error("Сбой при отправке сообщения в Telegram: {0}")]
    Transport(String),
}

/// Delivers text to a fixed destination
pub trait Notifier {
    fn deliver(&self, message: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API client bound to a single chat
pub struct TelegramBot {
    agent: ureq::Agent,
    api_base: Url,
    token: String,
    chat_id: String,
}

impl TelegramBot {
    pub fn new(api_base: Url, token: String, chat_id: String, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        TelegramBot {
            agent,
            api_base,
            token,
            chat_id,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.as_str().trim_end_matches('/'),
            self.token,
            method
        )
    }
}

fn protocol_error(status: u16, resp: ureq::Response) -> DeliveryError {
    let description = resp
        .into_json::<TelegramReply>()
        .ok()
        .and_then(|reply| reply.description)
        .unwrap_or_else(|| "no description".to_string());
    DeliveryError::Protocol {
        status,
        description,
    }
}

impl Notifier for TelegramBot {
    fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        let resp = self
            .agent
            .post(&self.method_url("sendMessage"))
            .send_json(json!({
                "chat_id": self.chat_id,
                "text": message,
            }))
            .map_err(|err| match err {
                ureq::Error::Status(status, resp) => protocol_error(status, resp),
                // The token is part of the URL, keep it out of error text
                ureq::Error::Transport(transport) => {
                    DeliveryError::Transport(transport.kind().to_string())
                }
            })?;

        let status = resp.status();
        let reply = resp
            .into_json::<TelegramReply>()
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;
        if !reply.ok {
            return Err(DeliveryError::Protocol {
                status,
                description: reply
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        debug!("Message delivered to Telegram chat {}", self.chat_id);
        Ok(())
    }
}
