//! Reconciles extracted profiles with curated patches and the reference list.

use crate::patch::PatchOverlay;
use crate::profile::{Category, KanjiReadingProfile, ReadingEntry, ReadingType};
use crate::reference::{ReadingWords, ReferenceData};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Keys under which one glyph's sub-character profiles may be stored.
const SUB_CHARACTER_SUFFIXES: [&str; 4] = ["", "1", "2", "3"];

/// Readings the reference lists but extraction never found land here.
const CATCH_ALL: ReadingType = ReadingType::KanYouOn;

fn base_character(key: &str) -> &str {
    key.trim_end_matches(|c: char| c.is_ascii_digit())
}

fn merge_into(target: &mut KanjiReadingProfile, other: &KanjiReadingProfile) {
    for (reading_type, category, entry) in other.iter() {
        target.push(reading_type, category, entry.clone());
    }
}

/// Append each profile's patch entries, keyed by base character.
pub fn apply_patch(profiles: &mut BTreeMap<String, KanjiReadingProfile>, patch: &PatchOverlay) {
    for (key, profile) in profiles.iter_mut() {
        if let Some(extra) = patch.onyomi(base_character(key)) {
            debug!(character = %key, "applying on'yomi patch");
            merge_into(profile, extra);
        }
    }
}

/// Union of the profiles of every variant glyph, canonical glyph first.
///
/// Out-of-list entries that repeat a standard pronunciation of the same type
/// are dropped from the union.
pub fn union_variants<'a>(
    profiles: &BTreeMap<String, KanjiReadingProfile>,
    variants: impl IntoIterator<Item = &'a str>,
) -> KanjiReadingProfile {
    let mut union: Option<KanjiReadingProfile> = None;

    for glyph in variants {
        for suffix in SUB_CHARACTER_SUFFIXES {
            let Some(profile) = profiles.get(&format!("{glyph}{suffix}")) else {
                continue;
            };
            match union.as_mut() {
                None => union = Some(profile.clone()),
                Some(seed) if seed == profile => {}
                Some(seed) => merge_into(seed, profile),
            }
        }
    }

    let mut union = union.unwrap_or_default();
    for reading_type in ReadingType::ALL {
        let standard: BTreeSet<String> = union
            .entries(reading_type, Category::Standard)
            .iter()
            .map(|e| e.pron.clone())
            .collect();
        if standard.is_empty() {
            continue;
        }
        union
            .bucket_mut(reading_type, Category::NonStandard)
            .retain(|e| !standard.contains(&e.pron));
    }
    union.prune();
    union
}

/// Reclassify `profile` against the reference readings.
///
/// Each reference reading is consumed by the first entry that matches it,
/// standard entries before out-of-list ones and in reading-type order. That
/// entry becomes standard and carries the reference's example words; every
/// other entry becomes out-of-list. Reference readings left unconsumed are
/// added as standard 慣用音.
pub fn reconcile(profile: &KanjiReadingProfile, reference: &ReadingWords) -> KanjiReadingProfile {
    let mut result = KanjiReadingProfile::new();
    let mut unconsumed: BTreeMap<&str, &Vec<String>> =
        reference.iter().map(|(pron, words)| (pron.as_str(), words)).collect();

    for category in [Category::Standard, Category::NonStandard] {
        for reading_type in ReadingType::ALL {
            for entry in profile.entries(reading_type, category) {
                match unconsumed.remove(entry.pron.as_str()) {
                    Some(words) => {
                        let mut entry = entry.clone();
                        entry.words = words.clone();
                        result.push(reading_type, Category::Standard, entry);
                    }
                    None => {
                        result.push(reading_type, Category::NonStandard, entry.clone());
                    }
                }
            }
        }
    }

    for (pron, words) in unconsumed {
        debug!(pron, "injecting reference reading");
        let mut entry = ReadingEntry::new(pron);
        entry.words = words.clone();
        result.push(CATCH_ALL, Category::Standard, entry);
    }

    result
}

/// One reconciled profile per reference character, keyed by its joined
/// variant glyphs.
pub fn merge_with_reference(
    profiles: &BTreeMap<String, KanjiReadingProfile>,
    reference: &ReferenceData,
    add_marks: bool,
) -> BTreeMap<String, KanjiReadingProfile> {
    reference
        .iter()
        .map(|(_, entry)| {
            let union = union_variants(profiles, entry.kanji_dict.glyphs());
            let profile = match entry.onyomi() {
                Some(onyomi) => reconcile(&union, onyomi),
                None => union,
            };
            (entry.key(add_marks), profile)
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::PatchEntry;
    use crate::profile::Category::{NonStandard, Standard};
    use crate::profile::ReadingType::{GoOn, KanOn, KanYouOn};
    use crate::reference::{Provenance, ReferenceEntry, Variants};

    fn profile(readings: &[(ReadingType, Category, &str)]) -> KanjiReadingProfile {
        let mut profile = KanjiReadingProfile::new();
        for &(t, c, pron) in readings {
            profile.push(t, c, ReadingEntry::new(pron));
        }
        profile
    }

    fn words(pairs: &[(&str, &[&str])]) -> ReadingWords {
        pairs
            .iter()
            .map(|(pron, ws)| (pron.to_string(), ws.iter().map(|w| w.to_string()).collect()))
            .collect()
    }

    fn prons(profile: &KanjiReadingProfile, t: ReadingType, c: Category) -> Vec<&str> {
        profile.entries(t, c).iter().map(|e| e.pron.as_str()).collect()
    }

    // ─────────────────────────────────────────────────────────────
    // Patches
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn patch_applies_to_sub_characters() {
        let mut profiles = BTreeMap::from([
            ("楽1".to_string(), profile(&[(GoOn, Standard, "ガク")])),
            ("楽2".to_string(), profile(&[(GoOn, Standard, "ラク")])),
        ]);
        let mut patch = PatchOverlay::default();
        patch.insert(
            "楽",
            PatchEntry {
                onyomi: Some(profile(&[(KanYouOn, NonStandard, "ゴウ"), (GoOn, Standard, "ガク")])),
                ..Default::default()
            },
        );
        apply_patch(&mut profiles, &patch);
        assert_eq!(prons(&profiles["楽1"], GoOn, Standard), vec!["ガク"]);
        assert_eq!(prons(&profiles["楽1"], KanYouOn, NonStandard), vec!["ゴウ"]);
        assert_eq!(prons(&profiles["楽2"], GoOn, Standard), vec!["ラク", "ガク"]);
    }

    // ─────────────────────────────────────────────────────────────
    // Variant union
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn union_collects_all_variants_and_suffixes() {
        let profiles = BTreeMap::from([
            ("亜".to_string(), profile(&[(GoOn, Standard, "ア")])),
            ("亞1".to_string(), profile(&[(KanOn, Standard, "ア")])),
            ("亞2".to_string(), profile(&[(GoOn, NonStandard, "ア"), (GoOn, NonStandard, "エ")])),
        ]);
        let union = union_variants(&profiles, ["亜", "亞"]);
        assert_eq!(prons(&union, GoOn, Standard), vec!["ア"]);
        assert_eq!(prons(&union, KanOn, Standard), vec!["ア"]);
        assert_eq!(prons(&union, GoOn, NonStandard), vec!["エ"]);
    }

    #[test]
    fn identical_variant_profiles_are_not_duplicated() {
        let p = profile(&[(GoOn, Standard, "ア")]);
        let profiles = BTreeMap::from([("亜".to_string(), p.clone()), ("亞".to_string(), p.clone())]);
        assert_eq!(union_variants(&profiles, ["亜", "亞"]), p);
    }

    #[test]
    fn union_of_nothing_is_empty() {
        let profiles = BTreeMap::new();
        assert!(union_variants(&profiles, ["亜"]).is_empty());
    }

    // ─────────────────────────────────────────────────────────────
    // Reconciliation
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn reference_decides_the_category() {
        let extracted = profile(&[(GoOn, Standard, "ギョウ"), (KanOn, NonStandard, "コウ"), (KanOn, Standard, "カウ")]);
        let result = reconcile(&extracted, &words(&[("ギョウ", &["行列"]), ("コウ", &["行動"])]));

        assert_eq!(prons(&result, GoOn, Standard), vec!["ギョウ"]);
        assert_eq!(result.entries(GoOn, Standard)[0].words, vec!["行列"]);
        assert_eq!(prons(&result, KanOn, Standard), vec!["コウ"]);
        assert_eq!(prons(&result, KanOn, NonStandard), vec!["カウ"]);
    }

    #[test]
    fn shared_reading_is_consumed_by_the_first_type() {
        let extracted = profile(&[(GoOn, Standard, "カ"), (KanOn, Standard, "カ")]);
        let result = reconcile(&extracted, &words(&[("カ", &["火事"])]));
        assert_eq!(prons(&result, GoOn, Standard), vec!["カ"]);
        assert_eq!(result.entries(GoOn, Standard)[0].words, vec!["火事"]);
        assert!(result.entries(KanOn, Standard).is_empty());
        assert_eq!(prons(&result, KanOn, NonStandard), vec!["カ"]);
        assert!(result.entries(KanOn, NonStandard)[0].words.is_empty());
        assert!(result.entries(KanYouOn, Standard).is_empty());
    }

    #[test]
    fn standard_entries_consume_before_out_of_list_ones() {
        let extracted = profile(&[(GoOn, NonStandard, "コウ"), (KanOn, Standard, "コウ")]);
        let result = reconcile(&extracted, &words(&[("コウ", &[])]));
        assert_eq!(prons(&result, KanOn, Standard), vec!["コウ"]);
        assert_eq!(prons(&result, GoOn, NonStandard), vec!["コウ"]);
        assert!(result.entries(GoOn, Standard).is_empty());
    }

    #[test]
    fn unmatched_reference_readings_are_injected() {
        let extracted = profile(&[(GoOn, Standard, "ア")]);
        let result = reconcile(&extracted, &words(&[("ア", &[]), ("アク", &["悪事"])]));
        assert_eq!(prons(&result, KanYouOn, Standard), vec!["アク"]);
        assert_eq!(result.entries(KanYouOn, Standard)[0].words, vec!["悪事"]);
    }

    #[test]
    fn non_standard_entries_survive_once_reference_is_consumed() {
        let extracted = profile(&[(GoOn, Standard, "ア"), (KanOn, NonStandard, "イ")]);
        let result = reconcile(&extracted, &words(&[("ア", &[])]));
        assert_eq!(prons(&result, KanOn, NonStandard), vec!["イ"]);
    }

    // ─────────────────────────────────────────────────────────────
    // Reference merge
    // ─────────────────────────────────────────────────────────────

    fn reference() -> ReferenceData {
        let mut data = ReferenceData::default();
        data.insert(
            "亜",
            ReferenceEntry {
                kanji_dict: Variants(vec![
                    ("亜".to_string(), Provenance::Common),
                    ("亞".to_string(), Provenance::Variant),
                ]),
                yomi: BTreeMap::from([("音読み".to_string(), words(&[("ア", &["亜流"])]))]),
            },
        );
        data.insert(
            "丑",
            ReferenceEntry {
                kanji_dict: Variants(vec![("丑".to_string(), Provenance::Name)]),
                yomi: BTreeMap::from([("音読み".to_string(), words(&[("チュウ", &[])]))]),
            },
        );
        data
    }

    #[test]
    fn merges_variants_under_marked_keys() {
        let profiles = BTreeMap::from([
            ("亜".to_string(), profile(&[(GoOn, Standard, "ア")])),
            ("亞".to_string(), profile(&[(KanOn, Standard, "ア"), (KanOn, Standard, "エ")])),
        ]);
        let merged = merge_with_reference(&profiles, &reference(), true);
        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["丑*", "亜亞:"]);

        let aa = &merged["亜亞:"];
        assert_eq!(prons(aa, GoOn, Standard), vec!["ア"]);
        assert_eq!(prons(aa, KanOn, Standard), vec!["ア"]);
        assert_eq!(prons(aa, KanOn, NonStandard), vec!["エ"]);
    }

    #[test]
    fn reference_only_characters_get_their_readings() {
        let merged = merge_with_reference(&BTreeMap::new(), &reference(), false);
        assert_eq!(prons(&merged["丑"], KanYouOn, Standard), vec!["チュウ"]);
    }
}
