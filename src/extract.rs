//! Reading extraction: turns normalized on'yomi blocks into typed profiles.
//!
//! Each child of an 音読み block is one `label(s) : value value ...` line. The
//! line is cleaned by a fixed regex pipeline, split on the first `:`, and every
//! value token is parsed as `main(extra)(extra)(extra)`.

use crate::hierarchy::HierarchyNode;
use crate::kana::to_katakana_reading;
use crate::normalize::{is_absence_note, ON_MARKER};
use crate::overrides::OverrideTable;
use crate::pipeline::Diagnostics;
use crate::profile::{Category, KanjiReadingProfile, ReadingEntry, ReadingType};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

const NON_STANDARD_MARKERS: [&str; 2] = ["表外", "常用外"];
const NO_READING: &str = "無し";
const MAX_OLD_PRONS: usize = 3;

lazy_static! {
    static ref BRACKETS: Regex = Regex::new(r"[\[\]]").unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"、|・|　+|,|'").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    // Footnotes, link prefixes and editorial templates
    static ref REF_PAIRED: Regex = Regex::new(r"<ref.*?</ref>").unwrap();
    static ref REF_SELF_CLOSING: Regex = Regex::new(r"<ref.*?/>").unwrap();
    static ref KANJI_INDEX_LINK: Regex = Regex::new(r"Wiktionary:漢字索引\s*音訓\s*[^|]*\|").unwrap();
    static ref WIKIPEDIA_LINK: Regex = Regex::new(r":wikipedia:ja:[^|]*\|").unwrap();
    static ref CITATION_NEEDED: Regex = Regex::new(r"\{\{要出典\}\}").unwrap();

    // Value-side annotations
    static ref EXAMPLE_NOTE: Regex = Regex::new(r"\(例:[^)]+\)").unwrap();
    static ref TRAILING_EXAMPLE: Regex = Regex::new(r"\s+例．.*$").unwrap();
    static ref NON_STANDARD_NOTE: Regex = Regex::new(r"\(\s*表外:.*\)").unwrap();
    static ref NON_STANDARD_TAG: Regex = Regex::new(r"\(表外[^)]*\)").unwrap();
    static ref ON_TEMPLATE: Regex = Regex::new(r"\{\{音\|([^}]*)\}\}").unwrap();
    static ref HIRAGANA_LINK_TARGET: Regex = Regex::new(r"[ぁ-ゖ]*\|([^\s*])").unwrap();

    // `x(a b)` → `x(a)(b)`, `x(a b c)` → `x(a)(b)(c)`
    static ref PAIRED_EXTRAS: Regex =
        Regex::new(r"([^\s()]*)\((\s*[^\s()]*)\s+([^\s()]*)\)").unwrap();
    static ref TRIPLE_EXTRAS: Regex =
        Regex::new(r"([^\s()]*)\(\s*([^\s()]*)\s+([^\s()]*)\s+([^\s()]*)\)").unwrap();
    static ref ANNOTATED_EXTRA: Regex = Regex::new(r"\(([^:]+):[^)]+\)").unwrap();

    static ref VALUE_TOKEN: Regex = Regex::new(
        r"^(?P<main>[^(]*)(?:\((?P<extra1>[^)]*)\))?(?:\((?P<extra2>[^)]*)\))?(?:\((?P<extra3>[^)]*)\))?$"
    )
    .unwrap();
}

/// Clean one reading line down to `labels : tokens`.
pub fn normalize_text(label: &str) -> String {
    let text = BRACKETS.replace_all(label, "");
    let text = text.replace('（', "(").replace('）', ")").replace('：', ":");
    let text = SEPARATORS.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");

    let text = REF_PAIRED.replace_all(&text, "");
    let text = REF_SELF_CLOSING.replace_all(&text, "");
    let text = KANJI_INDEX_LINK.replace_all(&text, "");
    let text = WIKIPEDIA_LINK.replace_all(&text, "");
    let text = CITATION_NEEDED.replace_all(&text, "");

    let text = EXAMPLE_NOTE.replace_all(&text, "");
    let text = TRAILING_EXAMPLE.replace_all(&text, "");
    let text = NON_STANDARD_NOTE.replace_all(&text, "(表外)");
    let text = NON_STANDARD_TAG.replace_all(&text, "(表外)");
    let text = ON_TEMPLATE.replace_all(&text, "${1}");
    let text = HIRAGANA_LINK_TARGET.replace_all(&text, "${1}");

    let text = PAIRED_EXTRAS.replace_all(&text, "${1}(${2})(${3})");
    let text = TRIPLE_EXTRAS.replace_all(&text, "${1}(${2})(${3})(${4})");
    let text = ANNOTATED_EXTRA.replace_all(&text, "(${1})");

    if text.trim() == NO_READING {
        return String::new();
    }
    text.into_owned()
}

/// What one part of a value token turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPart {
    Pron(String),
    NonStandardMarker,
    Unparsed(String),
}

impl TokenPart {
    pub fn classify(part: &str) -> TokenPart {
        if NON_STANDARD_MARKERS.contains(&part) {
            return TokenPart::NonStandardMarker;
        }
        match to_katakana_reading(part) {
            Some(pron) => TokenPart::Pron(pron),
            None => TokenPart::Unparsed(part.to_string()),
        }
    }
}

/// A value token split into its main part and up to three parenthesized extras.
/// Empty parts are left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueToken {
    pub main: Option<TokenPart>,
    pub extras: Vec<TokenPart>,
}

impl ValueToken {
    fn is_non_standard(&self) -> bool {
        self.main
            .iter()
            .chain(&self.extras)
            .any(|part| *part == TokenPart::NonStandardMarker)
    }

    fn extra_prons(&self) -> impl Iterator<Item = &str> {
        self.extras.iter().filter_map(|part| match part {
            TokenPart::Pron(p) => Some(p.as_str()),
            _ => None,
        })
    }

    fn unparsed(&self) -> impl Iterator<Item = &str> {
        self.main.iter().chain(&self.extras).filter_map(|part| match part {
            TokenPart::Unparsed(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

pub fn parse_value_token(token: &str) -> Option<ValueToken> {
    let caps = VALUE_TOKEN.captures(token)?;
    let part = |name: &str| {
        caps.name(name)
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
            .map(TokenPart::classify)
    };
    Some(ValueToken {
        main: part("main"),
        extras: ["extra1", "extra2", "extra3"]
            .iter()
            .filter_map(|name| part(name))
            .collect(),
    })
}

/// Parse the value side of one line into categorized entries, in source order.
pub fn parse_value_tokens(
    character: &str,
    values: &str,
    diagnostics: &mut Diagnostics,
) -> Vec<(Category, ReadingEntry)> {
    let mut entries: Vec<(Category, ReadingEntry)> = Vec::new();

    for raw in values.split_whitespace() {
        let Some(token) = parse_value_token(raw) else {
            debug!(character, token = raw, "dropping malformed value token");
            diagnostics.dropped(character, raw);
            continue;
        };
        for text in token.unparsed() {
            debug!(character, token = raw, part = text, "unparsed token part");
            diagnostics.dropped(character, text);
        }

        let non_standard = token.is_non_standard();
        let category = if non_standard {
            Category::NonStandard
        } else {
            Category::Standard
        };

        if let Some(TokenPart::Pron(pron)) = &token.main {
            let mut entry = ReadingEntry::new(pron.clone());
            entry.old_pron = token.extra_prons().take(MAX_OLD_PRONS).map(str::to_string).collect();
            entries.push((category, entry));
            continue;
        }

        if matches!(token.main, Some(TokenPart::Unparsed(_))) {
            continue;
        }

        // No main reading: the token annotates the entry before it.
        let has_extras = token.extra_prons().next().is_some();
        match entries.last_mut() {
            Some((previous_category, previous)) if has_extras || non_standard => {
                for old in token.extra_prons() {
                    if previous.old_pron.len() < MAX_OLD_PRONS && !previous.old_pron.iter().any(|o| o == old) {
                        previous.old_pron.push(old.to_string());
                    }
                }
                if non_standard {
                    *previous_category = Category::NonStandard;
                }
            }
            _ if has_extras || non_standard => {
                debug!(character, token = raw, "annotation with no reading before it");
                diagnostics.dropped(character, raw);
            }
            _ => {}
        }
    }

    entries
}

fn extract_block(character: &str, block: &HierarchyNode, diagnostics: &mut Diagnostics) -> KanjiReadingProfile {
    let mut profile = KanjiReadingProfile::new();

    for child in &block.children {
        let text = normalize_text(&child.label);
        if text.trim().is_empty() {
            continue;
        }
        let Some((labels, values)) = text.split_once(':') else {
            if is_absence_note(&child.label) {
                continue;
            }
            debug!(character, line = %child.label, "reading line has no label separator");
            diagnostics.dropped(character, &child.label);
            continue;
        };

        let mut reading_types = Vec::new();
        for label in labels.split_whitespace() {
            match ReadingType::from_label(label) {
                Some(reading_type) => {
                    diagnostics.count_label(reading_type);
                    reading_types.push(reading_type);
                }
                None => {
                    debug!(character, label, "unknown reading-type label");
                    diagnostics.unknown_label(label);
                }
            }
        }

        let entries = parse_value_tokens(character, values, diagnostics);
        for reading_type in reading_types {
            for (category, entry) in &entries {
                profile.push(reading_type, *category, entry.clone());
            }
        }
    }

    profile.prune();
    profile
}

/// Extract one profile per on'yomi block of `forest`.
///
/// A single block is keyed by `character`; several blocks get `character1`,
/// `character2`, ... in document order. A forest without blocks yields nothing.
pub fn extract_onyomi(
    character: &str,
    forest: &[HierarchyNode],
    overrides: &OverrideTable,
    diagnostics: &mut Diagnostics,
) -> BTreeMap<String, KanjiReadingProfile> {
    let blocks: Vec<&HierarchyNode> = forest
        .iter()
        .filter(|node| node.label.contains(ON_MARKER))
        .collect();
    let numbered = blocks.len() > 1;

    blocks
        .into_iter()
        .enumerate()
        .map(|(index, block)| {
            let key = if numbered {
                format!("{character}{}", index + 1)
            } else {
                character.to_string()
            };
            let block = overrides.resolve(character, block);
            (key, extract_block(character, &block, diagnostics))
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
