use anyhow::{bail, Context, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Value};

use crate::config::AuditConfig;
use crate::http::json_body;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub user_text: String,
    pub image_data_url: Option<String>,
}

/// A chat-style language model that answers with one text completion.
pub trait ChatModel: Send + Sync {
    fn complete(&self, request: &ChatRequest) -> Result<String>;
}

pub struct OpenAiChat {
    api_base: String,
    api_key: String,
    http: HttpClient,
}

impl OpenAiChat {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            http: HttpClient::new(),
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(&config.openai_api_base, &config.openai_api_key)
    }
}

impl ChatModel for OpenAiChat {
    fn complete(&self, request: &ChatRequest) -> Result<String> {
        let endpoint = format!("{}/chat/completions", self.api_base);
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&chat_payload(request))
            .send()
            .with_context(|| format!("OpenAI request failed ({endpoint})"))?;
        let parsed = json_body("OpenAI", response)?;
        extract_message_text(&parsed)
    }
}

fn chat_payload(request: &ChatRequest) -> Value {
    let user_content = match &request.image_data_url {
        Some(data_url) => json!([
            {"type": "text", "text": request.user_text},
            {"type": "image_url", "image_url": {"url": data_url}},
        ]),
        None => Value::String(request.user_text.clone()),
    };
    json!({
        "model": request.model,
        "messages": [
            {"role": "system", "content": request.system},
            {"role": "user", "content": user_content},
        ],
    })
}

fn extract_message_text(response: &Value) -> Result<String> {
    let content = response
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"));

    let text = match content {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<&str>>()
            .join("\n"),
        _ => String::new(),
    };
    if text.trim().is_empty() {
        bail!("OpenAI response contained no message content");
    }
    Ok(text)
}
