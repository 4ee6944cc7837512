//! Locates the section of a page that holds the kanji's readings.
//!
//! Header names are inconsistent across pages, so three passes run in order of
//! decreasing confidence and the first hit wins. The later passes accept the
//! occasional false positive in exchange for recovering otherwise lost pages.

use crate::sections::{Section, SectionTree};

/// Marker shared by 音読み and 訓読み.
const READING_MARKER: &str = "読み";

const PASSES: [&str; 3] = ["pron", READING_MARKER, "発音"];

/// Returns the reading section, or `None` when no pass matches.
pub fn select_pronunciation(tree: &SectionTree) -> Option<&Section> {
    PASSES.iter().find_map(|marker| {
        tree.titled()
            .find(|(title, section)| {
                title.contains(marker) && section.content().contains(READING_MARKER)
            })
            .map(|(_, section)| section)
    })
}
