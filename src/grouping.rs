//! Groups characters that share the same reading set and renders each group
//! into table columns.

use crate::profile::{Category, KanjiReadingProfile, ReadingType};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Per reading type, the sorted distinct pronunciations of a profile.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SortKey(pub Vec<Vec<String>>);

/// Build the grouping key of `profile` over the types in `order`.
pub fn sort_key(profile: &KanjiReadingProfile, merge_non_standard: bool, order: &[ReadingType]) -> SortKey {
    SortKey(
        order
            .iter()
            .map(|&reading_type| {
                let mut prons: BTreeSet<&str> = profile
                    .entries(reading_type, Category::Standard)
                    .iter()
                    .map(|e| e.pron.as_str())
                    .collect();
                if merge_non_standard {
                    prons.extend(
                        profile
                            .entries(reading_type, Category::NonStandard)
                            .iter()
                            .map(|e| e.pron.as_str()),
                    );
                }
                prons.into_iter().map(str::to_string).collect()
            })
            .collect(),
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingOptions {
    /// Treat out-of-list readings as standard, both in the key and in the columns.
    pub merge_non_standard: bool,
    /// Keep out-of-list current readings apart but file all old spellings as standard.
    pub show_non_standard: bool,
    /// Emit one table row per standard pronunciation of each group.
    pub duplicate_by_pronunciation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variant {
    Current,
    Old,
}

/// One output column: `呉音`, `呉音_表外`, `呉音_old`, `呉音_表外_old`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnKey {
    pub reading_type: ReadingType,
    pub category: Category,
    pub variant: Variant,
}

impl ColumnKey {
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reading_type.label())?;
        if self.category == Category::NonStandard {
            write!(f, "_{}", self.category.label())?;
        }
        if self.variant == Variant::Old {
            f.write_str("_old")?;
        }
        Ok(())
    }
}

impl Serialize for ColumnKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub index: usize,
    pub sort_key: SortKey,
    pub members: Vec<String>,
    pub merged: BTreeMap<ColumnKey, Vec<String>>,
    pub pronunciations: Vec<String>,
}

fn effective_category(category: Category, variant: Variant, options: &GroupingOptions) -> Category {
    if options.merge_non_standard {
        Category::Standard
    } else if options.show_non_standard && variant == Variant::Old {
        Category::Standard
    } else {
        category
    }
}

fn merge_members(
    members: &[String],
    profiles: &BTreeMap<String, KanjiReadingProfile>,
    options: &GroupingOptions,
) -> (BTreeMap<ColumnKey, Vec<String>>, Vec<String>) {
    let mut columns: BTreeMap<ColumnKey, BTreeMap<String, Vec<String>>> = BTreeMap::new();
    let mut pronunciations: BTreeSet<String> = BTreeSet::new();

    let mut add = |key: ColumnKey, pron: &str, member: &str| {
        let owners = columns.entry(key).or_default().entry(pron.to_string()).or_default();
        if !owners.iter().any(|m| m == member) {
            owners.push(member.to_string());
        }
    };

    for member in members {
        let Some(profile) = profiles.get(member) else {
            continue;
        };
        for (reading_type, category, entry) in profile.iter() {
            let current = effective_category(category, Variant::Current, options);
            add(
                ColumnKey { reading_type, category: current, variant: Variant::Current },
                &entry.pron,
                member,
            );
            if current == Category::Standard {
                pronunciations.insert(entry.pron.clone());
            }

            let old_category = effective_category(category, Variant::Old, options);
            for old in &entry.old_pron {
                add(
                    ColumnKey { reading_type, category: old_category, variant: Variant::Old },
                    old,
                    member,
                );
            }
        }
    }

    let single_member = members.len() == 1;
    let merged = columns
        .into_iter()
        .map(|(key, by_pron)| {
            let plain = single_member || key.variant == Variant::Old || key.category == Category::Standard;
            let values = if plain {
                by_pron.into_keys().collect()
            } else {
                by_pron
                    .into_iter()
                    .map(|(pron, owners)| format!("{pron}({})", owners.join("、")))
                    .collect()
            };
            (key, values)
        })
        .collect();

    (merged, pronunciations.into_iter().collect())
}

/// Partition the non-empty profiles by sort key, in sort-key order.
pub fn group_profiles(profiles: &BTreeMap<String, KanjiReadingProfile>, options: &GroupingOptions) -> Vec<Group> {
    let mut buckets: BTreeMap<SortKey, Vec<String>> = BTreeMap::new();
    for (character, profile) in profiles {
        if profile.is_empty() {
            continue;
        }
        let key = sort_key(profile, options.merge_non_standard, &ReadingType::ALL);
        buckets.entry(key).or_default().push(character.clone());
    }

    buckets
        .into_iter()
        .enumerate()
        .map(|(i, (sort_key, members))| {
            let (merged, pronunciations) = merge_members(&members, profiles, options);
            Group {
                index: i + 1,
                sort_key,
                members,
                merged,
                pronunciations,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub index: usize,
    pub sort_key: SortKey,
    pub members: Vec<String>,
    pub merged: BTreeMap<ColumnKey, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    pub primary: bool,
}

impl TableRow {
    fn from_group(group: &Group, pronunciation: Option<String>) -> Self {
        TableRow {
            index: group.index,
            sort_key: group.sort_key.clone(),
            members: group.members.clone(),
            merged: group.merged.clone(),
            pronunciation,
            primary: false,
        }
    }
}

/// Lay groups out as table rows.
///
/// With `duplicate_by_pronunciation`, each group is repeated once per standard
/// pronunciation and rows are ordered by `(pronunciation, index)`; the first
/// row of each group in that order is its primary row. Groups with no standard
/// pronunciation produce no rows in that mode.
pub fn table_rows(groups: &[Group], duplicate_by_pronunciation: bool) -> Vec<TableRow> {
    if !duplicate_by_pronunciation {
        let mut rows: Vec<TableRow> = groups
            .iter()
            .map(|group| TableRow {
                primary: true,
                ..TableRow::from_group(group, None)
            })
            .collect();
        rows.sort_by_key(|row| row.index);
        return rows;
    }

    let mut keyed: Vec<(&str, &Group)> = groups
        .iter()
        .flat_map(|group| group.pronunciations.iter().map(move |p| (p.as_str(), group)))
        .collect();
    keyed.sort_by(|a, b| (a.0, a.1.index).cmp(&(b.0, b.1.index)));

    let mut seen: BTreeSet<usize> = BTreeSet::new();
    keyed
        .into_iter()
        .map(|(pron, group)| TableRow {
            primary: seen.insert(group.index),
            ..TableRow::from_group(group, Some(pron.to_string()))
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
