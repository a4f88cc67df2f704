use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::turn::Turn;
use crate::{BookError, Result};

pub const SESSION_FORMAT_VERSION: u32 = 1;

const CONTEXT_PLACEHOLDER: &str = "{context}";

/// The static prompt a session is written against.
///
/// `system` may carry a `{context}` placeholder that is filled with the
/// context documents of each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: String,
    pub system: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            id: "openai-functions-agent".to_string(),
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn render(&self, context: &[String]) -> String {
        let context = context.join("\n\n");
        if self.system.contains(CONTEXT_PLACEHOLDER) {
            self.system.replace(CONTEXT_PLACEHOLDER, &context).trim_end().to_string()
        } else if context.is_empty() {
            self.system.clone()
        } else {
            format!("{}\n\n{}", self.system, context)
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.\n\n{context}";

/// One writing session: the template in use plus the full transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub version: u32,
    pub id: String,
    pub template: PromptTemplate,
    pub turns: Vec<Turn>,
    pub created_at: String,
    pub updated_at: String,
}

impl Session {
    pub fn new(template: PromptTemplate) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: SESSION_FORMAT_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            template,
            turns: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// Encode the whole session as an opaque, URL-safe token.
    pub fn to_token(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn from_token(token: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| BookError::Session(e.to_string()))?;
        let session: Session =
            serde_json::from_slice(&bytes).map_err(|e| BookError::Session(e.to_string()))?;
        if session.version != SESSION_FORMAT_VERSION {
            return Err(BookError::Session(format!(
                "unsupported session format version {}",
                session.version
            )));
        }
        Ok(session)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(PromptTemplate::default())
    }
}
