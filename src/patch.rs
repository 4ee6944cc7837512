//! Curated corrections layered over extracted data.
//!
//! A patch file is JSON keyed by character:
//!
//! ```json
//! { "畑": { "tree": [{"label": "音読み", "children": [{"label": "無し"}]}] },
//!   "込": { "onyomi": {"慣用音": {"表外": [{"pron": "コム"}]}} } }
//! ```
//!
//! `tree` replaces the normalized reading tree before extraction; `onyomi` is
//! appended to the extracted profile afterwards.

use crate::error::{Error, Result};
use crate::hierarchy::HierarchyNode;
use crate::profile::KanjiReadingProfile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<Vec<HierarchyNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onyomi: Option<KanjiReadingProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchOverlay {
    entries: BTreeMap<String, PatchEntry>,
}

impl PatchOverlay {
    pub fn from_json_str(json: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| Error::Json {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents, path)
    }

    pub fn insert(&mut self, character: impl Into<String>, entry: PatchEntry) {
        self.entries.insert(character.into(), entry);
    }

    /// Replacement reading tree for `character`, if any.
    pub fn tree(&self, character: &str) -> Option<&[HierarchyNode]> {
        self.entries.get(character)?.tree.as_deref()
    }

    pub fn onyomi(&self, character: &str) -> Option<&KanjiReadingProfile> {
        self.entries.get(character)?.onyomi.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
