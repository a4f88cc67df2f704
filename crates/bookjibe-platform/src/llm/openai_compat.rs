//! OpenAI-compatible LLM adapter.
//!
//! Works with OpenAI, DeepSeek, and any provider using the
//! OpenAI chat completions API format.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use bookjibe_core::ports::*;
use bookjibe_types::{
    config::LlmConfig,
    turn::{Role, Turn},
    BookError, Result,
};

/// Provider that speaks the OpenAI chat completions protocol.
pub struct OpenAiCompatProvider {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

impl OpenAiCompatProvider {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let base_url = config
            .api_base
            .clone()
            .unwrap_or_else(|| config.provider.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();
        if base_url.is_empty() {
            return Err(BookError::Config(format!(
                "{} provider needs OPENAI_API_BASE",
                config.provider.label()
            )));
        }
        log::debug!("LLM provider {} at {}", config.provider.label(), base_url);
        Ok(Self {
            client: Client::new(),
            config,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn build_request_body(&self, req: &ChatRequest) -> Value {
        let mut messages = Vec::with_capacity(req.messages.len() + 1);
        if !req.system.is_empty() {
            messages.push(json!({ "role": "system", "content": req.system }));
        }
        messages.extend(req.messages.iter().map(turn_to_json));

        json!({
            "model": req.model,
            "messages": messages,
            "max_tokens": req.max_tokens,
            "temperature": req.temperature,
        })
    }
}

#[async_trait(?Send)]
impl LlmPort for OpenAiCompatProvider {
    async fn chat_completion(&self, req: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&req);
        log::debug!("POST {} ({} messages)", url, req.messages.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BookError::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            log::warn!("LLM request failed with HTTP {}", status);
            return Err(BookError::Generation(format!("HTTP {}: {}", status, text)));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| BookError::Generation(e.to_string()))?;
        parse_chat_response(&raw)
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/v1/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| BookError::Generation(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BookError::Generation(format!("HTTP {}", response.status())));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| BookError::Generation(e.to_string()))?;

        Ok(parse_model_list(&data))
    }
}

// ─── API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// ─── Serialization helpers ───────────────────────────────────

fn turn_to_json(turn: &Turn) -> Value {
    let role = match turn.role {
        Role::Human => "user",
        Role::Assistant => "assistant",
    };
    json!({
        "role": role,
        "content": turn.text,
    })
}

pub(crate) fn parse_chat_response(raw: &str) -> Result<ChatResponse> {
    let data: ApiResponse =
        serde_json::from_str(raw).map_err(|e| BookError::Generation(e.to_string()))?;

    let choice = data
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BookError::Generation("No choices in response".to_string()))?;

    let usage = data.usage.map(|u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });
    if let Some(ref u) = usage {
        log::debug!("Token usage: {} prompt, {} completion", u.prompt_tokens, u.completion_tokens);
    }

    Ok(ChatResponse {
        text: choice.message.content.unwrap_or_default(),
        usage,
    })
}

pub(crate) fn parse_model_list(data: &Value) -> Vec<String> {
    let mut models: Vec<String> = data["data"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|m| m["id"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    models.sort();
    models
}
