use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{BookError, Result};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookjibeConfig {
    pub llm: LlmConfig,
    pub folders: FolderConfig,
    pub language: Language,
}

impl Default for BookjibeConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            folders: FolderConfig::default(),
            language: Language::En,
        }
    }
}

impl BookjibeConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Unset keys keep their
    /// defaults; set keys that do not parse are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get("BOOKJIBE_LLM_PROVIDER") {
            config.llm.provider = provider.parse()?;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            config.llm.model = model;
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            config.llm.api_key = key;
        }
        config.llm.api_base = get("OPENAI_API_BASE");
        if let Some(t) = get("BOOKJIBE_TEMPERATURE") {
            config.llm.temperature = parse_value("BOOKJIBE_TEMPERATURE", &t)?;
        }
        if let Some(m) = get("BOOKJIBE_MAX_TOKENS") {
            config.llm.max_tokens = parse_value("BOOKJIBE_MAX_TOKENS", &m)?;
        }

        if let Some(dir) = get("BOOKJIBE_PROMPT_FOLDER").or_else(|| get("BOOKJIBE_PROMPT_INIT_FOLDER")) {
            config.folders.prompts = PathBuf::from(dir);
        }
        if let Some(dir) = get("BOOKJIBE_PROMPT_GENERATOR_FOLDER") {
            config.folders.prompt_generator = PathBuf::from(dir);
        }
        if let Some(dir) = get("BOOKJIBE_TEMPORARY_FOLDER") {
            config.folders.temporary = PathBuf::from(dir);
        }
        if let Some(dir) = get("BOOKJIBE_STATE_FOLDER") {
            config.folders.state = PathBuf::from(dir);
        }
        if let Some(lang) = get("BOOKJIBE_LANGUAGE") {
            config.language = lang.parse()?;
        }

        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| BookError::Config(format!("{}: cannot parse {:?}", key, raw)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: String,
    pub api_base: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            model: "gpt-3.5-turbo".to_string(),
            api_key: String::new(),
            api_base: None,
            max_tokens: 4096,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmProvider {
    OpenAI,
    DeepSeek,
    Custom,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &str {
        match self {
            LlmProvider::OpenAI => "https://api.openai.com",
            LlmProvider::DeepSeek => "https://api.deepseek.com",
            LlmProvider::Custom => "",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::DeepSeek => "DeepSeek",
            LlmProvider::Custom => "Custom",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = BookError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "deepseek" => Ok(LlmProvider::DeepSeek),
            "custom" => Ok(LlmProvider::Custom),
            other => Err(BookError::Config(format!("unknown LLM provider {:?}", other))),
        }
    }
}

/// Where prompt fragments, drafts and session state live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderConfig {
    /// Story starters (`*prompt.txt`); generated prompts are stored here too.
    pub prompts: PathBuf,
    /// Fragments used by the one-shot prompt generator.
    pub prompt_generator: PathBuf,
    /// Draft logs of chapter candidates.
    pub temporary: PathBuf,
    /// Stored session tokens.
    pub state: PathBuf,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            prompts: PathBuf::from("prompts"),
            prompt_generator: PathBuf::from("prompts/generator"),
            temporary: PathBuf::from("tmp"),
            state: PathBuf::from(".bookjibe"),
        }
    }
}

/// Language used for the fixed instructions sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fr,
}

impl Language {
    pub fn chapter_instruction(&self, chapter: u32) -> String {
        match self {
            Language::En => format!("Write chapter {} of the story.", chapter),
            Language::Fr => format!("Ecris le chapitre {} de l'histoire.", chapter),
        }
    }

    pub fn agreement_phrase(&self) -> &'static str {
        match self {
            Language::En => "I agree. Write only the final version of the prompt.",
            Language::Fr => "Je suis d'accord. Ecris uniquement la version finale du prompt.",
        }
    }
}

impl FromStr for Language {
    type Err = BookError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "fr" | "french" | "francais" | "français" => Ok(Language::Fr),
            other => Err(BookError::Config(format!("unsupported language {:?}", other))),
        }
    }
}
