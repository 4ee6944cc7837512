//! Whole-set orchestration: markup → profiles → reconciled profiles → rows.
//!
//! Per-character work never fails. Anything worth a second look is recorded in
//! [`Diagnostics`] instead.

use crate::config::Config;
use crate::error::Result;
use crate::extract::extract_onyomi;
use crate::grouping::{group_profiles, table_rows, GroupingOptions, TableRow};
use crate::hierarchy::{build_hierarchy, HierarchyNode};
use crate::normalize::normalize;
use crate::overrides::OverrideTable;
use crate::patch::PatchOverlay;
use crate::profile::{KanjiReadingProfile, ReadingType};
use crate::reconcile::{apply_patch, merge_with_reference};
use crate::reference::ReferenceData;
use crate::sections::split_sections;
use crate::selector::select_pronunciation;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedToken {
    pub character: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// How often each reading type was labelled.
    pub label_counts: BTreeMap<ReadingType, usize>,
    pub unknown_labels: BTreeMap<String, usize>,
    /// Value tokens and lines that could not be parsed.
    pub dropped_tokens: Vec<DroppedToken>,
    /// Characters whose page has no reading section.
    pub missing_section: Vec<String>,
    /// (Sub-)characters whose extracted profile holds no entry.
    pub empty_profiles: Vec<String>,
}

impl Diagnostics {
    pub fn count_label(&mut self, reading_type: ReadingType) {
        *self.label_counts.entry(reading_type).or_default() += 1;
    }

    pub fn unknown_label(&mut self, label: &str) {
        *self.unknown_labels.entry(label.to_string()).or_default() += 1;
    }

    pub fn dropped(&mut self, character: &str, text: &str) {
        self.dropped_tokens.push(DroppedToken {
            character: character.to_string(),
            text: text.to_string(),
        });
    }
}

#[derive(Debug, Default)]
pub struct Stats {
    pub pages_processed: usize,
    pub profiles_extracted: usize,
    pub profiles_reconciled: usize,
    pub groups: usize,
    pub rows_written: usize,
    pub elapsed: Duration,
}

pub struct Pipeline {
    overrides: OverrideTable,
    patch: PatchOverlay,
    reference: Option<ReferenceData>,
    options: GroupingOptions,
    variant_marks: bool,
}

impl Pipeline {
    pub fn new(overrides: OverrideTable) -> Self {
        Pipeline {
            overrides,
            patch: PatchOverlay::default(),
            reference: None,
            options: GroupingOptions::default(),
            variant_marks: true,
        }
    }

    /// Load every auxiliary file the configuration names.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut pipeline = Pipeline::new(OverrideTable::load_or_builtin(config.overrides.as_ref())?)
            .with_options(config.grouping)
            .with_variant_marks(config.variant_marks);
        if let Some(path) = &config.patch {
            pipeline = pipeline.with_patch(PatchOverlay::load(path)?);
        }
        if let Some(path) = &config.reference {
            pipeline = pipeline.with_reference(ReferenceData::load(path)?);
        }
        Ok(pipeline)
    }

    pub fn with_patch(mut self, patch: PatchOverlay) -> Self {
        self.patch = patch;
        self
    }

    pub fn with_reference(mut self, reference: ReferenceData) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_options(mut self, options: GroupingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_variant_marks(mut self, variant_marks: bool) -> Self {
        self.variant_marks = variant_marks;
        self
    }

    /// The normalized reading tree of one page, or `None` if it has no
    /// reading section. A patch tree takes precedence over the markup.
    pub fn reading_tree(&self, character: &str, markup: &str) -> Option<Vec<HierarchyNode>> {
        if let Some(tree) = self.patch.tree(character) {
            return Some(tree.to_vec());
        }
        let sections = split_sections(markup);
        let section = select_pronunciation(&sections)?;
        Some(normalize(build_hierarchy(&section.lines)))
    }

    /// Extract the profiles of one page.
    pub fn extract_character(
        &self,
        character: &str,
        markup: &str,
        diagnostics: &mut Diagnostics,
    ) -> BTreeMap<String, KanjiReadingProfile> {
        let Some(forest) = self.reading_tree(character, markup) else {
            warn!(character, "no pronunciation section");
            diagnostics.missing_section.push(character.to_string());
            return BTreeMap::new();
        };

        let profiles = extract_onyomi(character, &forest, &self.overrides, diagnostics);
        for (key, profile) in &profiles {
            if profile.is_empty() {
                diagnostics.empty_profiles.push(key.clone());
            }
        }
        profiles
    }

    pub fn extract_all<'a>(
        &self,
        pages: impl IntoIterator<Item = (&'a str, &'a str)>,
        diagnostics: &mut Diagnostics,
    ) -> BTreeMap<String, KanjiReadingProfile> {
        let mut profiles = BTreeMap::new();
        let mut pages_processed = 0usize;
        for (character, markup) in pages {
            profiles.extend(self.extract_character(character, markup, diagnostics));
            pages_processed += 1;
        }
        info!(
            pages = pages_processed,
            profiles = profiles.len(),
            missing = diagnostics.missing_section.len(),
            "extraction finished"
        );
        profiles
    }

    /// Apply the patch overlay, then reconcile with the reference list if one
    /// is loaded.
    pub fn reconcile(&self, mut profiles: BTreeMap<String, KanjiReadingProfile>) -> BTreeMap<String, KanjiReadingProfile> {
        apply_patch(&mut profiles, &self.patch);
        let Some(reference) = &self.reference else {
            return profiles;
        };
        let merged = merge_with_reference(&profiles, reference, self.variant_marks);
        info!(characters = merged.len(), "reconciled with reference list");
        merged
    }

    pub fn rows(&self, profiles: &BTreeMap<String, KanjiReadingProfile>) -> Vec<TableRow> {
        let groups = group_profiles(profiles, &self.options);
        let rows = table_rows(&groups, self.options.duplicate_by_pronunciation);
        info!(groups = groups.len(), rows = rows.len(), "grouping finished");
        rows
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::PatchEntry;
    use crate::profile::Category;

    const ROKU: &str = "==漢字==\n{{pron|jpn}}\n===発音===\n* 音読み\n** [[呉音]] : [[ロク]]\n** [[漢音]] : [[リク]]\n* 訓読み\n*: [[ころす|ころ-す]]";

    fn pipeline() -> Pipeline {
        Pipeline::new(OverrideTable::default())
    }

    #[test]
    fn page_without_reading_section_is_diagnosed() {
        let mut diagnostics = Diagnostics::default();
        let profiles = pipeline().extract_character("字", "==漢字==\n* 部首", &mut diagnostics);
        assert!(profiles.is_empty());
        assert_eq!(diagnostics.missing_section, vec!["字"]);
    }

    #[test]
    fn empty_profile_is_diagnosed() {
        let mut diagnostics = Diagnostics::default();
        let markup = "===発音===\n* 音読み\n** 無し\n* 訓読み: はたけ";
        let profiles = pipeline().extract_character("畑", markup, &mut diagnostics);
        assert!(profiles["畑"].is_empty());
        assert_eq!(diagnostics.empty_profiles, vec!["畑"]);
    }

    #[test]
    fn absence_note_sibling_is_folded_quietly() {
        let mut diagnostics = Diagnostics::default();
        let markup = "===発音===\n* 音読み\n* なし\n* 訓読み: はたけ";
        let profiles = pipeline().extract_character("畑", markup, &mut diagnostics);
        assert!(profiles["畑"].is_empty());
        assert!(diagnostics.dropped_tokens.is_empty());
        assert_eq!(diagnostics.empty_profiles, vec!["畑"]);
    }

    #[test]
    fn patch_tree_replaces_markup() {
        let mut patch = PatchOverlay::default();
        patch.insert(
            "戮",
            PatchEntry {
                tree: Some(vec![HierarchyNode::with_children(
                    "音読み",
                    vec![HierarchyNode::new("[[慣用音]] : [[リュウ]]")],
                )]),
                ..Default::default()
            },
        );
        let mut diagnostics = Diagnostics::default();
        let profiles = pipeline().with_patch(patch).extract_character("戮", ROKU, &mut diagnostics);
        let profile = &profiles["戮"];
        assert_eq!(profile.len(), 1);
        assert_eq!(profile.entries(ReadingType::KanYouOn, Category::Standard)[0].pron, "リュウ");
    }

    #[test]
    fn extract_all_collects_every_page() {
        let mut diagnostics = Diagnostics::default();
        let pages = [("戮", ROKU), ("字", "no sections")];
        let profiles = pipeline().extract_all(pages, &mut diagnostics);
        assert_eq!(profiles.keys().collect::<Vec<_>>(), vec!["戮"]);
        assert_eq!(diagnostics.label_counts.get(&ReadingType::GoOn), Some(&1));
        assert_eq!(diagnostics.label_counts.get(&ReadingType::KanOn), Some(&1));
    }

    #[test]
    fn reconcile_without_reference_only_patches() {
        let mut diagnostics = Diagnostics::default();
        let p = pipeline();
        let profiles = p.extract_all([("戮", ROKU)], &mut diagnostics);
        assert_eq!(p.reconcile(profiles.clone()), profiles);
    }
}
