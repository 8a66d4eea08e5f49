//! Template PDFs read from disk and cached as base64.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{debug, warn};

use crate::error::PacketFormError;

/// One template file with a process-lifetime cache of its encoded bytes.
#[derive(Debug)]
pub struct TemplateStore {
    path: PathBuf,
    cache: OnceLock<String>,
}

impl TemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The template as base64, or `None` when the file does not exist.
    ///
    /// Existence is checked on every call, so a deleted template reads as
    /// missing even after it was cached. The first successful read is kept.
    pub fn load_base64(&self) -> Result<Option<String>, PacketFormError> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "template file not found");
            return Ok(None);
        }
        if let Some(cached) = self.cache.get() {
            return Ok(Some(cached.clone()));
        }

        let bytes = fs::read(&self.path)?;
        debug!(path = %self.path.display(), len = bytes.len(), "loaded template");
        let encoded = self.cache.get_or_init(|| STANDARD.encode(bytes));
        Ok(Some(encoded.clone()))
    }

    /// Raw template bytes, decoded from the cache.
    pub fn load_bytes(&self) -> Result<Option<Vec<u8>>, PacketFormError> {
        match self.load_base64()? {
            Some(encoded) => Ok(Some(STANDARD.decode(encoded)?)),
            None => Ok(None),
        }
    }
}
