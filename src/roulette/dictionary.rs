use crate::models::DictionaryData;
use anyhow::{Context, Result};
use rust_embed::RustEmbed;
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(RustEmbed)]
#[folder = "resources/"]
struct Asset;

const DICTIONARY_FILE: &str = "dictionary/similar_words.json";

static GLOBAL: OnceLock<DistractorDictionary> = OnceLock::new();

/// Similar-looking alternatives for known tokens, plus a filler pool used
/// when a token has no entry or too few of them. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct DistractorDictionary {
    similar: HashMap<String, Vec<String>>,
    generic_pool: Vec<String>,
}

impl DistractorDictionary {
    pub fn new(similar: HashMap<String, Vec<String>>, generic_pool: Vec<String>) -> Self {
        Self { similar, generic_pool }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let data: DictionaryData =
            serde_json::from_str(raw).context("Malformed distractor dictionary")?;
        tracing::debug!(
            name = %data.name,
            entries = data.similar_words.len(),
            pool = data.generic_pool.len(),
            "parsed distractor dictionary"
        );
        Ok(Self::new(data.similar_words, data.generic_pool))
    }

    pub fn load_embedded() -> Result<Self> {
        let file = Asset::get(DICTIONARY_FILE).context(format!(
            "Could not find embedded dictionary file: {}",
            DICTIONARY_FILE
        ))?;
        let raw = std::str::from_utf8(file.data.as_ref())?;
        Self::from_json(raw)
    }

    /// The process-wide dictionary, parsed from the embedded resource on
    /// first use.
    pub fn global() -> Result<&'static Self> {
        if let Some(dictionary) = GLOBAL.get() {
            return Ok(dictionary);
        }
        let loaded = Self::load_embedded()?;
        Ok(GLOBAL.get_or_init(|| loaded))
    }

    /// Candidates for an already-normalized key.
    pub fn similar_to(&self, key: &str) -> Option<&[String]> {
        self.similar.get(key).map(Vec::as_slice)
    }

    pub fn generic_pool(&self) -> &[String] {
        &self.generic_pool
    }

    pub fn len(&self) -> usize {
        self.similar.len()
    }

    pub fn is_empty(&self) -> bool {
        self.similar.is_empty()
    }
}
