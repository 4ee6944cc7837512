//! Reference reading list: the authoritative on'yomi and example words per
//! character, together with the glyph variants that share an entry.

use crate::error::{Error, Result};
use crate::normalize::ON_MARKER;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Which list a glyph variant comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    #[serde(rename = "常用")]
    Common,
    #[serde(rename = "表外")]
    OutsideList,
    #[serde(rename = "人名")]
    Name,
    #[serde(rename = "異体")]
    Variant,
}

impl Provenance {
    /// Suffix appended to the glyph in output keys.
    pub fn mark(self) -> &'static str {
        match self {
            Provenance::Common => "",
            Provenance::OutsideList => "+",
            Provenance::Name => "*",
            Provenance::Variant => ":",
        }
    }
}

/// Glyph variants in document order; the canonical glyph comes first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variants(pub Vec<(String, Provenance)>);

impl Variants {
    pub fn glyphs(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(glyph, _)| glyph.as_str())
    }
}

impl Serialize for Variants {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (glyph, provenance) in &self.0 {
            map.serialize_entry(glyph, provenance)?;
        }
        map.end()
    }
}

struct VariantsVisitor;

impl<'de> Visitor<'de> for VariantsVisitor {
    type Value = Variants;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map from glyph to provenance tag")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Variants, A::Error> {
        let mut variants = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((glyph, provenance)) = access.next_entry::<String, Provenance>()? {
            variants.push((glyph, provenance));
        }
        Ok(Variants(variants))
    }
}

impl<'de> Deserialize<'de> for Variants {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(VariantsVisitor)
    }
}

/// `pron → example words`
pub type ReadingWords = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub kanji_dict: Variants,
    /// Reading class (`音読み`, `訓読み`) to readings and their words.
    #[serde(default)]
    pub yomi: BTreeMap<String, ReadingWords>,
}

impl ReferenceEntry {
    pub fn onyomi(&self) -> Option<&ReadingWords> {
        self.yomi.get(ON_MARKER)
    }

    /// Output key: every variant glyph joined, each followed by its mark when
    /// `add_marks` is set.
    pub fn key(&self, add_marks: bool) -> String {
        self.kanji_dict
            .0
            .iter()
            .map(|(glyph, provenance)| {
                if add_marks {
                    format!("{glyph}{}", provenance.mark())
                } else {
                    glyph.clone()
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceData {
    entries: BTreeMap<String, ReferenceEntry>,
}

impl ReferenceData {
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

    pub fn insert(&mut self, character: impl Into<String>, entry: ReferenceEntry) {
        self.entries.insert(character.into(), entry);
    }

    pub fn get(&self, character: &str) -> Option<&ReferenceEntry> {
        self.entries.get(character)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReferenceEntry)> {
        self.entries.iter().map(|(c, e)| (c.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
