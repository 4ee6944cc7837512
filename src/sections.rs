//! Splits a page of wikitext into header-titled sections.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref HTML_COMMENT: Regex = Regex::new(r"\s*<!--[^->]*-->\s*").unwrap();
}

/// Lines under one header, with the header's nesting level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub level: usize,
    pub lines: Vec<String>,
}

impl Section {
    /// All lines concatenated, used for keyword probes.
    pub fn content(&self) -> String {
        self.lines.concat()
    }
}

/// Sections of one page in document order. The untitled bucket (title `None`)
/// holds whatever precedes the first header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionTree {
    sections: Vec<(Option<String>, Section)>,
}

impl SectionTree {
    pub fn get(&self, title: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|(t, _)| t.as_deref() == Some(title))
            .map(|(_, section)| section)
    }

    pub fn preamble(&self) -> Option<&Section> {
        self.sections
            .iter()
            .find(|(t, _)| t.is_none())
            .map(|(_, section)| section)
    }

    /// Titled sections in document order.
    pub fn titled(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections
            .iter()
            .filter_map(|(title, section)| title.as_deref().map(|t| (t, section)))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn bucket(&mut self, title: Option<String>, level: usize) -> &mut Section {
        let index = match self.sections.iter().position(|(t, _)| *t == title) {
            Some(index) => index,
            None => {
                self.sections.push((title, Section { level, lines: Vec::new() }));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index].1
    }
}

/// Parse a header line such as `==={{pron|jpn}}===` into `(title, level)`.
fn parse_header(line: &str) -> Option<(String, usize)> {
    if !(line.starts_with('=') && line.ends_with('=')) {
        return None;
    }
    let leading = line.chars().take_while(|&c| c == '=').count();
    let trailing = line.chars().rev().take_while(|&c| c == '=').count();
    let title = line.trim_matches('=').trim().to_string();
    // A line made only of `=` is counted once, not twice.
    let level = if title.is_empty() && leading == line.chars().count() {
        leading / 2
    } else {
        (leading + trailing) / 2
    };
    Some((title, level))
}

/// Split one character's markup into sections keyed by header title.
///
/// Blank lines are dropped, HTML comments stripped, and every other line is
/// kept in order under the most recent header.
pub fn split_sections(markup: &str) -> SectionTree {
    let normalized: String = markup.nfc().collect();
    let mut tree = SectionTree::default();
    let mut current: Option<String> = None;

    for raw in normalized.lines() {
        let line = HTML_COMMENT.replace_all(raw.trim(), "");
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((title, level)) = parse_header(line) {
            tree.bucket(Some(title.clone()), level);
            current = Some(title);
            continue;
        }

        tree.bucket(current.clone(), 0).lines.push(line.to_string());
    }

    tree
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "=={{ja}}==\n\
        [[Category:{{ja}}|りく]]\n\
        \n\
        ==={{pron|jpn}}===\n\
        * 音読み\n\
        ** [[呉音]] : [[ロク]]\n\
        ** [[漢音]] : [[リク]]\n\
        * 訓読み\n\
        *: [[ころす|ころ-す]]、[[けずる|けず-る]]\n\
        \n\
        ==={{prov}}===\n\
        * [[刑戮]]\n\
        ----\n";

    #[test]
    fn splits_by_header() {
        let tree = split_sections(PAGE);
        assert_eq!(tree.len(), 3);

        let ja = tree.get("{{ja}}").unwrap();
        assert_eq!(ja.level, 2);
        assert_eq!(ja.lines, vec!["[[Category:{{ja}}|りく]]"]);

        let pron = tree.get("{{pron|jpn}}").unwrap();
        assert_eq!(pron.level, 3);
        assert_eq!(pron.lines.len(), 5);
        assert_eq!(pron.lines[0], "* 音読み");

        let prov = tree.get("{{prov}}").unwrap();
        assert_eq!(prov.lines, vec!["* [[刑戮]]", "----"]);
    }

    #[test]
    fn lines_before_first_header_go_to_preamble() {
        let tree = split_sections("stray line\n==A==\nbody");
        assert_eq!(tree.preamble().unwrap().lines, vec!["stray line"]);
        assert_eq!(tree.get("A").unwrap().lines, vec!["body"]);
    }

    #[test]
    fn no_header_degenerates_to_single_bucket() {
        let tree = split_sections("one\ntwo\n\nthree");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.preamble().unwrap().lines, vec!["one", "two", "three"]);
        assert_eq!(tree.titled().count(), 0);
    }

    #[test]
    fn html_comments_are_removed() {
        let tree = split_sections("==A==\n* 音読み <!-- note -->\n<!-- only a comment -->");
        assert_eq!(tree.get("A").unwrap().lines, vec!["* 音読み"]);
    }

    #[test]
    fn repeated_header_appends() {
        let tree = split_sections("==A==\none\n===A===\ntwo");
        let section = tree.get("A").unwrap();
        assert_eq!(section.level, 2);
        assert_eq!(section.lines, vec!["one", "two"]);
    }

    #[test]
    fn header_level_from_delimiter_runs() {
        assert_eq!(parse_header("==== 読み ===="), Some(("読み".to_string(), 4)));
        assert_eq!(parse_header("== x ="), Some(("x".to_string(), 1)));
        assert_eq!(parse_header("* not a header"), None);
    }

    #[test]
    fn combining_marks_are_composed() {
        // か + combining dakuten → が
        let tree = split_sections("==A==\nか\u{3099}");
        assert_eq!(tree.get("A").unwrap().lines, vec!["が"]);
    }
}
