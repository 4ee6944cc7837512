//! Kanji on'yomi extraction from Japanese Wiktionary wikitext.
//!
//! A page goes through [`sections`] → [`selector`] → [`hierarchy`] →
//! [`normalize`] → [`extract`], producing a [`KanjiReadingProfile`] per
//! (sub-)character. Profiles are then patched and reconciled with a reference
//! list ([`reconcile`]) and grouped by shared reading sets ([`grouping`]).
//! [`pipeline::Pipeline`] wires the stages together.

pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod grouping;
pub mod hierarchy;
pub mod kana;
pub mod normalize;
pub mod overrides;
pub mod patch;
pub mod pipeline;
pub mod profile;
pub mod reconcile;
pub mod reference;
pub mod sections;
pub mod selector;

pub use cache::WikiCache;
pub use config::Config;
pub use error::{Error, Result};
pub use grouping::{ColumnKey, Group, GroupingOptions, SortKey, TableRow};
pub use hierarchy::HierarchyNode;
pub use overrides::{Override, OverrideTable};
pub use patch::PatchOverlay;
pub use pipeline::{Diagnostics, Pipeline, Stats};
pub use profile::{Category, KanjiReadingProfile, ReadingEntry, ReadingType};
pub use reference::ReferenceData;
pub use sections::{Section, SectionTree};
