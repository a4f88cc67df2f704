//! File storage backend.
//! One file per key inside a folder; survives restarts.
//!
//! Keys are percent-encoded into file names:
//!   "session:default" → "session%3Adefault.val"

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bookjibe_core::ports::StoragePort;
use bookjibe_types::{BookError, Result};

const VALUE_EXTENSION: &str = ".val";

pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (or create) the storage folder.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| BookError::io(&dir, e))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{}", encode_key(key), VALUE_EXTENSION))
    }
}

#[async_trait(?Send)]
impl StoragePort for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BookError::Storage(format!("{}: {}", path.display(), e))),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        // readers never see a partially written value
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, value)
            .and_then(|_| std::fs::rename(&tmp, &path))
            .map_err(|e| BookError::Storage(format!("{}: {}", path.display(), e)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BookError::Storage(format!("{}: {}", path.display(), e))),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| BookError::Storage(format!("{}: {}", self.dir.display(), e)))?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| BookError::Storage(format!("{}: {}", self.dir.display(), e)))?;
            let name = entry.file_name();
            let Some(encoded) = name.to_str().and_then(|n| n.strip_suffix(VALUE_EXTENSION)) else {
                continue;
            };
            if let Some(key) = decode_key(encoded) {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

fn decode_key(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = encoded.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
