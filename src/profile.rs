//! Typed on'yomi profile of a single (sub-)character.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// The four strata of on'yomi, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReadingType {
    #[serde(rename = "呉音")]
    GoOn,
    #[serde(rename = "漢音")]
    KanOn,
    #[serde(rename = "宋唐音")]
    SouTouOn,
    #[serde(rename = "慣用音")]
    KanYouOn,
}

// Legacy labels seen in Wiktionary pages. 古音 → 慣用音 is kept as found in the
// source data even though the two are not the same stratum.
static READING_TYPE_SYNONYMS: Lazy<HashMap<&'static str, ReadingType>> = Lazy::new(|| {
    HashMap::from([
        ("呉音", ReadingType::GoOn),
        ("漢音", ReadingType::KanOn),
        ("宋唐音", ReadingType::SouTouOn),
        ("慣用音", ReadingType::KanYouOn),
        ("宋音", ReadingType::SouTouOn),
        ("唐音", ReadingType::SouTouOn),
        ("唐宋音", ReadingType::SouTouOn),
        ("唐音唐宋音", ReadingType::SouTouOn),
        ("新漢音", ReadingType::KanOn),
        ("特殊な慣用音", ReadingType::KanYouOn),
        ("古音", ReadingType::KanYouOn),
    ])
});

impl ReadingType {
    pub const ALL: [ReadingType; 4] = [
        ReadingType::GoOn,
        ReadingType::KanOn,
        ReadingType::SouTouOn,
        ReadingType::KanYouOn,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ReadingType::GoOn => "呉音",
            ReadingType::KanOn => "漢音",
            ReadingType::SouTouOn => "宋唐音",
            ReadingType::KanYouOn => "慣用音",
        }
    }

    /// Map a label found in markup (canonical or legacy) to its reading type.
    pub fn from_label(label: &str) -> Option<ReadingType> {
        READING_TYPE_SYNONYMS.get(label.trim()).copied()
    }
}

impl fmt::Display for ReadingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a reading is on the official list (表内) or not (表外).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "表内")]
    Standard,
    #[serde(rename = "表外")]
    NonStandard,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Standard => "表内",
            Category::NonStandard => "表外",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingEntry {
    pub pron: String,
    /// Historical kana spellings, at most three.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub old_pron: Vec<String>,
    /// Example words, attached during reconciliation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<String>,
}

impl ReadingEntry {
    pub fn new(pron: impl Into<String>) -> Self {
        ReadingEntry {
            pron: pron.into(),
            old_pron: Vec::new(),
            words: Vec::new(),
        }
    }

    pub fn with_old(mut self, old: impl Into<String>) -> Self {
        self.old_pron.push(old.into());
        self
    }
}

/// `ReadingType → Category → entries`, both levels in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KanjiReadingProfile {
    readings: BTreeMap<ReadingType, BTreeMap<Category, Vec<ReadingEntry>>>,
}

impl KanjiReadingProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no bucket holds an entry.
    pub fn is_empty(&self) -> bool {
        self.readings
            .values()
            .all(|buckets| buckets.values().all(Vec::is_empty))
    }

    pub fn entries(&self, reading_type: ReadingType, category: Category) -> &[ReadingEntry] {
        self.readings
            .get(&reading_type)
            .and_then(|buckets| buckets.get(&category))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append an entry, returning false if an identical one is already there.
    pub fn push(&mut self, reading_type: ReadingType, category: Category, entry: ReadingEntry) -> bool {
        let bucket = self
            .readings
            .entry(reading_type)
            .or_default()
            .entry(category)
            .or_default();
        if bucket.contains(&entry) {
            return false;
        }
        bucket.push(entry);
        true
    }

    pub fn bucket_mut(&mut self, reading_type: ReadingType, category: Category) -> &mut Vec<ReadingEntry> {
        self.readings
            .entry(reading_type)
            .or_default()
            .entry(category)
            .or_default()
    }

    /// Every `(type, category, entry)` triple in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (ReadingType, Category, &ReadingEntry)> {
        self.readings.iter().flat_map(|(&reading_type, buckets)| {
            buckets.iter().flat_map(move |(&category, entries)| {
                entries.iter().map(move |entry| (reading_type, category, entry))
            })
        })
    }

    /// Drop empty buckets and empty reading types.
    pub fn prune(&mut self) {
        for buckets in self.readings.values_mut() {
            buckets.retain(|_, entries| !entries.is_empty());
        }
        self.readings.retain(|_, buckets| !buckets.is_empty());
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_labels_map_to_themselves() {
        for reading_type in ReadingType::ALL {
            assert_eq!(ReadingType::from_label(reading_type.label()), Some(reading_type));
        }
    }

    #[test]
    fn legacy_labels_are_normalized() {
        assert_eq!(ReadingType::from_label("唐音"), Some(ReadingType::SouTouOn));
        assert_eq!(ReadingType::from_label("宋音"), Some(ReadingType::SouTouOn));
        assert_eq!(ReadingType::from_label("新漢音"), Some(ReadingType::KanOn));
        assert_eq!(ReadingType::from_label("古音"), Some(ReadingType::KanYouOn));
        assert_eq!(ReadingType::from_label(" 特殊な慣用音 "), Some(ReadingType::KanYouOn));
    }

    #[test]
    fn unknown_label_is_none() {
        assert_eq!(ReadingType::from_label("音読み"), None);
    }

    #[test]
    fn push_skips_identical_entries() {
        let mut profile = KanjiReadingProfile::new();
        assert!(profile.push(ReadingType::GoOn, Category::Standard, ReadingEntry::new("ロク")));
        assert!(!profile.push(ReadingType::GoOn, Category::Standard, ReadingEntry::new("ロク")));
        assert_eq!(profile.len(), 1);
    }

    #[test]
    fn empty_buckets_count_as_empty() {
        let mut profile = KanjiReadingProfile::new();
        profile.bucket_mut(ReadingType::KanOn, Category::NonStandard);
        assert!(profile.is_empty());
        profile.prune();
        assert_eq!(profile, KanjiReadingProfile::new());
    }

    #[test]
    fn serializes_with_japanese_labels() {
        let mut profile = KanjiReadingProfile::new();
        profile.push(ReadingType::GoOn, Category::Standard, ReadingEntry::new("ロク"));
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(json, r#"{"呉音":{"表内":[{"pron":"ロク"}]}}"#);
    }

    #[test]
    fn iter_follows_canonical_order() {
        let mut profile = KanjiReadingProfile::new();
        profile.push(ReadingType::KanYouOn, Category::Standard, ReadingEntry::new("ア"));
        profile.push(ReadingType::GoOn, Category::NonStandard, ReadingEntry::new("イ"));
        profile.push(ReadingType::GoOn, Category::Standard, ReadingEntry::new("ウ"));
        let order: Vec<&str> = profile.iter().map(|(_, _, e)| e.pron.as_str()).collect();
        assert_eq!(order, vec!["ウ", "イ", "ア"]);
    }
}
