//! Per-character escape hatch for on'yomi blocks whose markup the general
//! parser cannot recover (merged or missing bullet levels, stray notes).
//!
//! The table is plain data: a YAML document embedded in the binary that can be
//! replaced by a file on disk, so it can be audited and extended without
//! touching the parser.

use crate::error::{Error, Result};
use crate::hierarchy::HierarchyNode;
use crate::normalize::ON_MARKER;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const BUILTIN_OVERRIDES: &str = include_str!("../data/overrides.yaml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Override {
    /// Keep only the children at these positions, in this order.
    KeepChildren(Vec<usize>),
    /// Replace the block with these child lines.
    Replace(Vec<String>),
}

impl Override {
    pub fn apply(&self, block: &HierarchyNode) -> HierarchyNode {
        match self {
            Override::KeepChildren(indices) => HierarchyNode::with_children(
                block.label.clone(),
                indices
                    .iter()
                    .filter_map(|&i| block.children.get(i).cloned())
                    .collect(),
            ),
            Override::Replace(lines) => HierarchyNode::with_children(
                ON_MARKER,
                lines.iter().map(HierarchyNode::new).collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideTable {
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    entries: BTreeMap<String, Override>,
}

impl OverrideTable {
    /// The table shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_OVERRIDES, Path::new("<builtin overrides>"))
    }

    pub fn from_yaml_str(yaml: &str, origin: &Path) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|source| Error::Yaml {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents, path)
    }

    /// Load `path` if given, otherwise the built-in table.
    pub fn load_or_builtin(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    pub fn get(&self, character: &str) -> Option<&Override> {
        self.entries.get(character)
    }

    pub fn insert(&mut self, character: impl Into<String>, fix: Override) {
        self.entries.insert(character.into(), fix);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The block to parse for `character`: overridden if the table has an entry.
    pub fn resolve(&self, character: &str, block: &HierarchyNode) -> HierarchyNode {
        match self.get(character) {
            Some(fix) => {
                debug!(character, "applying on'yomi override");
                fix.apply(block)
            }
            None => block.clone(),
        }
    }
}
