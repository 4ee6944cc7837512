//! Reader for the wiki cache: one page per line, `char<TAB>ja<TAB>zh1<TAB>zh2`,
//! with newlines inside markup escaped as `\n` / `\r`.

use crate::error::{Error, Result};
use bzip2::read::BzDecoder;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheEntry {
    /// Japanese Wiktionary markup, the only column extraction reads.
    pub ja: String,
    /// Remaining columns (Chinese Wiktionary markup), kept as found.
    pub others: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WikiCache {
    entries: BTreeMap<String, CacheEntry>,
}

fn unescape(field: &str) -> String {
    field.replace("\\n", "\n").replace("\\r", "\r")
}

impl WikiCache {
    /// Load a cache file; a `.bz2` suffix selects the bzip2 decoder.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if path.to_string_lossy().ends_with(".bz2") {
            Box::new(BufReader::with_capacity(256 * 1024, BzDecoder::new(file)))
        } else {
            Box::new(BufReader::with_capacity(256 * 1024, file))
        };
        let cache = Self::from_reader(reader)?;
        info!(path = %path.display(), pages = cache.len(), "loaded wiki cache");
        Ok(cache)
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let key = fields.next().unwrap_or_default();
            let Some(ja) = fields.next() else {
                return Err(Error::MalformedCacheLine { line: index + 1 });
            };
            entries.insert(
                key.trim().to_string(),
                CacheEntry {
                    ja: unescape(ja),
                    others: fields.map(unescape).collect(),
                },
            );
        }
        Ok(WikiCache { entries })
    }

    pub fn get(&self, character: &str) -> Option<&CacheEntry> {
        self.entries.get(character)
    }

    /// `(character, japanese markup)` pairs in codepoint order.
    pub fn pages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, e)| (c.as_str(), e.ja.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
