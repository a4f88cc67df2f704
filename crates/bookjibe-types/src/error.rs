use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookError {
    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Could not parse imported book: {0}")]
    ImportParse(String),

    #[error("Chapter numbers start at 1, got {0}")]
    InvalidChapter(u32),

    #[error("Chapter {0} is already part of the book")]
    DuplicateChapter(u32),

    #[error("Section {0} is already part of the book")]
    DuplicateSection(String),

    #[error("Invalid version choice: {0}")]
    InvalidChoice(u8),

    #[error("Invalid session token: {0}")]
    Session(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Filesystem error: {path}: {message}")]
    Io { path: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BookError {
    pub fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        BookError::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BookError {
    fn from(e: serde_json::Error) -> Self {
        BookError::Serialization(e.to_string())
    }
}
