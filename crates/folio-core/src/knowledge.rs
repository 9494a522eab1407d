//! Ordered keyword → response table backing the local responder.
//!
//! Declaration order is the tie-break when several keywords occur in the same
//! query, so entries are kept in a `Vec` and never re-sorted.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};

const EMBEDDED: &str = include_str!("../data/knowledge.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub keyword: String,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
    #[serde(rename = "default")]
    default_response: String,
}

impl KnowledgeBase {
    pub fn new(entries: Vec<KnowledgeEntry>, default_response: impl Into<String>) -> Result<Self> {
        let mut kb = Self {
            entries,
            default_response: default_response.into(),
        };
        kb.normalize()?;
        Ok(kb)
    }

    /// The table shipped with the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut kb: KnowledgeBase = serde_json::from_str(json)?;
        kb.normalize()?;
        Ok(kb)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| FolioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    fn normalize(&mut self) -> Result<()> {
        for entry in &mut self.entries {
            let keyword = entry.keyword.trim().to_lowercase();
            if keyword.is_empty() {
                return Err(FolioError::Config(
                    "knowledge base keywords must not be empty".to_string(),
                ));
            }
            entry.keyword = keyword;
        }
        Ok(())
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn default_response(&self) -> &str {
        &self.default_response
    }

    /// Response for the first keyword (in declaration order) contained in
    /// the lower-cased query, or the default response.
    pub fn lookup(&self, query: &str) -> &str {
        let lowered = query.to_lowercase();
        self.entries
            .iter()
            .find(|entry| lowered.contains(&entry.keyword))
            .map(|entry| entry.response.as_str())
            .unwrap_or(&self.default_response)
    }
}
