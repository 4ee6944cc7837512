//! Run configuration, read from YAML. Every field has a default, so an empty
//! file (or no file at all) is a valid configuration.

use crate::error::{Error, Result};
use crate::grouping::GroupingOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_CANDIDATES: [&str; 2] = ["onyomi.yaml", "config/onyomi.yaml"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: PathBuf,
    pub reference: Option<PathBuf>,
    pub patch: Option<PathBuf>,
    /// Replaces the built-in override table.
    pub overrides: Option<PathBuf>,
    pub grouping: GroupingOptions,
    /// Suffix variant glyphs with their provenance mark in reference keys.
    pub variant_marks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cache: PathBuf::from("wiki_cache.tsv"),
            reference: None,
            patch: None,
            overrides: None,
            grouping: GroupingOptions::default(),
            variant_marks: true,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str, origin: &Path) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(yaml).map_err(|source| Error::Yaml {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents, path)
    }

    /// Use `explicit` if given, else the first candidate file under the
    /// current directory, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        Self::discover_in(Path::new("."), explicit)
    }

    pub fn discover_in(base: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::ConfigNotFound(path.display().to_string()));
            }
            return Self::load(path);
        }
        match CONFIG_CANDIDATES
            .iter()
            .map(|candidate| base.join(candidate))
            .find(|p| p.exists())
        {
            Some(path) => Self::load(&path),
            None => Ok(Config::default()),
        }
    }
}
