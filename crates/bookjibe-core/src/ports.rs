//! Port traits: the boundary between the writer and the outside world.
//!
//! These traits are defined here in `bookjibe-core` (pure Rust).
//! Implementations live in `bookjibe-platform`.
//! The core never imports platform code; it only depends on these traits.

use async_trait::async_trait;
use bookjibe_types::{turn::Turn, Result};

// ─── LLM Port ────────────────────────────────────────────────

/// Request to send to an LLM
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Rendered system prompt
    pub system: String,
    /// Conversation so far, ending with the new human turn
    pub messages: Vec<Turn>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Complete (non-streaming) response from an LLM
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait(?Send)]
pub trait LlmPort {
    /// Non-streaming chat completion
    async fn chat_completion(&self, req: ChatRequest) -> Result<ChatResponse>;

    /// List available models for this provider
    async fn list_models(&self) -> Result<Vec<String>>;
}

// ─── Prompt Port ─────────────────────────────────────────────

/// A folder of plain-text prompt fragments.
#[async_trait(?Send)]
pub trait PromptPort {
    /// Names of the fragments ending with `suffix`, sorted
    async fn list_prompts(&self, suffix: &str) -> Result<Vec<String>>;

    /// Read a whole fragment. `PromptNotFound` if it does not exist.
    async fn load_prompt(&self, name: &str) -> Result<String>;

    /// Create or replace a fragment
    async fn store_prompt(&self, name: &str, text: &str) -> Result<()>;
}

// ─── Storage Port ────────────────────────────────────────────

/// Byte-valued key/value store holding session tokens between commands.
#[async_trait(?Send)]
pub trait StoragePort {
    /// `None` when the key was never written or has been deleted
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Create or overwrite
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Deleting a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;

    /// Keys starting with `prefix`, sorted
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Short backend label for log lines
    fn backend_name(&self) -> &str;
}
