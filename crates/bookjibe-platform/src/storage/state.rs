//! Session storage for the command-line app.
//!
//! Every command runs in its own process, so the session has to reach the
//! state folder. There is no in-memory fallback here.

use std::path::Path;
use std::rc::Rc;

use bookjibe_core::ports::StoragePort;
use bookjibe_types::{BookError, Result};

use super::FileStorage;

/// Open the file store under `state_dir`, or fail with `BookError::Storage`.
pub fn open_state_storage(state_dir: &Path) -> Result<Rc<dyn StoragePort>> {
    let files = FileStorage::open(state_dir).map_err(|e| {
        BookError::Storage(format!(
            "cannot open state folder {}: {}",
            state_dir.display(),
            e
        ))
    })?;
    log::debug!("Session storage: files in {}", state_dir.display());
    Ok(Rc::new(files))
}
