//! Prompt fragments stored as plain UTF-8 files in one folder.
//!
//! Names are bare file names; anything that would escape the folder is
//! treated as missing.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bookjibe_core::ports::PromptPort;
use bookjibe_types::{BookError, Result};

/// Suffix of the files offered as story starters
pub const STORY_PROMPT_SUFFIX: &str = "prompt.txt";

pub struct FsPromptLibrary {
    root: PathBuf,
}

impl FsPromptLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, name: &str) -> Option<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        valid.then(|| self.root.join(name))
    }
}

#[async_trait(?Send)]
impl PromptPort for FsPromptLibrary {
    async fn list_prompts(&self, suffix: &str) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Prompt folder {} does not exist", self.root.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(BookError::io(&self.root, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BookError::io(&self.root, e))?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(suffix) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn load_prompt(&self, name: &str) -> Result<String> {
        let path = self
            .path_for(name)
            .ok_or_else(|| BookError::PromptNotFound(name.to_string()))?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BookError::PromptNotFound(path.display().to_string()))
            }
            Err(e) => Err(BookError::io(&path, e)),
        }
    }

    async fn store_prompt(&self, name: &str, text: &str) -> Result<()> {
        let path = self
            .path_for(name)
            .ok_or_else(|| BookError::Storage(format!("invalid prompt name {:?}", name)))?;
        std::fs::create_dir_all(&self.root).map_err(|e| BookError::io(&self.root, e))?;
        std::fs::write(&path, text).map_err(|e| BookError::io(&path, e))?;
        log::info!("Prompt stored at {}", path.display());
        Ok(())
    }
}
