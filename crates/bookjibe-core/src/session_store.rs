//! Keeps session tokens in a `StoragePort` between interactions.
//!
//! Keys are namespaced: session "default" is stored under "session:default".

use std::rc::Rc;

use bookjibe_types::{session::Session, BookError, Result};

use crate::ports::StoragePort;

const SESSION_PREFIX: &str = "session:";

pub struct SessionStore {
    storage: Rc<dyn StoragePort>,
}

impl SessionStore {
    pub fn new(storage: Rc<dyn StoragePort>) -> Self {
        Self { storage }
    }

    fn key(name: &str) -> String {
        format!("{}{}", SESSION_PREFIX, name)
    }

    pub async fn save(&self, name: &str, session: &Session) -> Result<()> {
        let token = session.to_token()?;
        self.storage.set(&Self::key(name), token.as_bytes()).await?;
        log::debug!(
            "Session {} saved to {} ({} turns)",
            name,
            self.storage.backend_name(),
            session.turns.len()
        );
        Ok(())
    }

    pub async fn load(&self, name: &str) -> Result<Option<Session>> {
        let Some(bytes) = self.storage.get(&Self::key(name)).await? else {
            return Ok(None);
        };
        let token = String::from_utf8(bytes).map_err(|e| BookError::Session(e.to_string()))?;
        Session::from_token(&token).map(Some)
    }

    pub async fn clear(&self, name: &str) -> Result<()> {
        self.storage.delete(&Self::key(name)).await
    }

    /// Names of every stored session
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .storage
            .list_keys(SESSION_PREFIX)
            .await?
            .into_iter()
            .filter_map(|k| k.strip_prefix(SESSION_PREFIX).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}
