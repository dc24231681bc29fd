//! Positional text search over document pages
//!
//! Matches are case-insensitive substrings of a page's concatenated glyph
//! text. Each result carries the document-space box spanning its glyphs, so
//! it can be highlighted after any zoom.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::backend::DocumentBackend;
use super::types::{Glyph, Rect};

/// How many matches a page may contribute
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    #[default]
    FirstPerPage,
    All,
}

/// A located match
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub page: usize,
    /// Text as it appears on the page
    pub text: String,
    /// Document-space box from the first to the last matched glyph
    pub rect: Rect,
}

/// Lowercased page text with a glyph index for every char
struct FoldedText {
    text: String,
    /// `owners[i]` is the glyph that produced the i-th char of `text`
    owners: Vec<usize>,
    /// Byte offset of the i-th char of `text`
    offsets: Vec<usize>,
}

impl FoldedText {
    fn new(glyphs: &[Glyph]) -> Self {
        let mut text = String::with_capacity(glyphs.len());
        let mut owners = Vec::with_capacity(glyphs.len());
        let mut offsets = Vec::with_capacity(glyphs.len());
        for (idx, glyph) in glyphs.iter().enumerate() {
            for c in glyph.c.to_lowercase() {
                offsets.push(text.len());
                owners.push(idx);
                text.push(c);
            }
        }
        Self {
            text,
            owners,
            offsets,
        }
    }

    /// Glyph index range `first..=last` covered by a byte range of `text`
    fn glyph_span(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        let first_char = self.offsets.partition_point(|&o| o < start);
        let last_char = self.offsets.partition_point(|&o| o < end).checked_sub(1)?;
        Some((*self.owners.get(first_char)?, *self.owners.get(last_char)?))
    }
}

/// Search results for the last query plus a cyclic cursor
#[derive(Clone, Debug, Default)]
pub struct SearchEngine {
    query: String,
    results: Vec<SearchResult>,
    cursor: Option<usize>,
    policy: MatchPolicy,
}

impl SearchEngine {
    #[must_use]
    pub fn new(policy: MatchPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Run a fresh search, replacing previous results and resetting the cursor.
    ///
    /// Returns no results for an empty query or when no document is open.
    /// A page whose text cannot be extracted is skipped.
    pub fn search(&mut self, doc: Option<&dyn DocumentBackend>, query: &str) -> &[SearchResult] {
        self.results.clear();
        self.cursor = None;
        self.query = query.to_string();

        let Some(doc) = doc else {
            return &self.results;
        };
        if query.is_empty() {
            return &self.results;
        }

        let needle = query.to_lowercase();
        for page in 0..doc.page_count() {
            let glyphs = match doc.page_text(page) {
                Ok(glyphs) => glyphs,
                Err(e) => {
                    warn!("Skipping page {page} in search: {e}");
                    continue;
                }
            };
            self.results
                .extend(find_in_page(page, &glyphs, &needle, self.policy));
        }

        debug!(
            "Search for '{}' found {} results",
            query,
            self.results.len()
        );
        &self.results
    }

    /// Advance to the next result, wrapping to the first
    pub fn next(&mut self) -> Option<&SearchResult> {
        let len = self.results.len();
        if len == 0 {
            return None;
        }
        let idx = self.cursor.map_or(0, |c| (c + 1) % len);
        self.cursor = Some(idx);
        self.results.get(idx)
    }

    /// Step back to the previous result; from "before first" this is the last
    pub fn previous(&mut self) -> Option<&SearchResult> {
        let len = self.results.len();
        if len == 0 {
            return None;
        }
        let idx = self.cursor.map_or(len - 1, |c| (c + len - 1) % len);
        self.cursor = Some(idx);
        self.results.get(idx)
    }

    #[must_use]
    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    #[must_use]
    pub fn current(&self) -> Option<&SearchResult> {
        self.cursor.and_then(|c| self.results.get(c))
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Results located on `page`
    pub fn results_on_page(&self, page: usize) -> impl Iterator<Item = &SearchResult> {
        self.results.iter().filter(move |r| r.page == page)
    }

    /// "i/n" for the current result, "No results found" after an empty search
    #[must_use]
    pub fn status(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }
        if self.results.is_empty() {
            return Some("No results found".to_string());
        }
        let shown = self.cursor.map_or(0, |c| c + 1);
        Some(format!("{shown}/{}", self.results.len()))
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
        self.cursor = None;
    }
}

fn find_in_page(
    page: usize,
    glyphs: &[Glyph],
    needle: &str,
    policy: MatchPolicy,
) -> Vec<SearchResult> {
    let folded = FoldedText::new(glyphs);
    let mut found = Vec::new();
    let mut from = 0;

    while let Some(pos) = folded.text[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();
        if let Some((first, last)) = folded.glyph_span(start, end) {
            let matched = &glyphs[first..=last];
            let rect = matched
                .iter()
                .skip(1)
                .fold(matched[0].bounds, |acc, g| acc.union(&g.bounds));
            found.push(SearchResult {
                page,
                text: matched.iter().map(|g| g.c).collect(),
                rect,
            });
        }
        if policy == MatchPolicy::FirstPerPage {
            break;
        }
        from = end;
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeDocument;

    fn doc_with_foo_on_2_and_4() -> FakeDocument {
        FakeDocument::uniform(5)
            .with_text(0, "nothing here")
            .with_text(1, "still nothing")
            .with_text(2, "a Foo walks")
            .with_text(3, "")
            .with_text(4, "foo and FOO")
    }

    #[test]
    fn empty_query_returns_nothing() {
        let doc = doc_with_foo_on_2_and_4();
        let mut engine = SearchEngine::default();
        assert!(engine.search(Some(&doc), "").is_empty());
        assert_eq!(engine.cursor(), None);
        assert!(engine.next().is_none());
        assert!(engine.previous().is_none());
    }

    #[test]
    fn no_document_returns_nothing() {
        let mut engine = SearchEngine::default();
        assert!(engine.search(None, "foo").is_empty());
    }

    #[test]
    fn one_match_per_page_in_page_order() {
        let doc = doc_with_foo_on_2_and_4();
        let mut engine = SearchEngine::default();
        let results = engine.search(Some(&doc), "foo");
        let pages: Vec<usize> = results.iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![2, 4]);
        assert_eq!(results[0].text, "Foo");
    }

    #[test]
    fn next_cycles_and_previous_wraps_backward() {
        let doc = doc_with_foo_on_2_and_4();
        let mut engine = SearchEngine::default();
        engine.search(Some(&doc), "foo");

        let pages: Vec<usize> = (0..5).filter_map(|_| engine.next().map(|r| r.page)).collect();
        assert_eq!(pages, vec![2, 4, 2, 4, 2]);

        engine.search(Some(&doc), "foo");
        assert_eq!(engine.cursor(), None);
        assert_eq!(engine.previous().map(|r| r.page), Some(4));
        assert_eq!(engine.previous().map(|r| r.page), Some(2));
        assert_eq!(engine.previous().map(|r| r.page), Some(4));
    }

    #[test]
    fn all_matches_policy_reports_each_occurrence() {
        let doc = doc_with_foo_on_2_and_4();
        let mut engine = SearchEngine::new(MatchPolicy::All);
        let texts: Vec<(usize, String)> = engine
            .search(Some(&doc), "foo")
            .iter()
            .map(|r| (r.page, r.text.clone()))
            .collect();
        assert_eq!(
            texts,
            vec![
                (2, "Foo".to_string()),
                (4, "foo".to_string()),
                (4, "FOO".to_string())
            ]
        );
    }

    #[test]
    fn rect_spans_first_to_last_glyph() {
        let glyphs: Vec<Glyph> = "xabcx"
            .chars()
            .enumerate()
            .map(|(i, c)| Glyph::new(c, Rect::new(i as f32 * 10.0, 100.0, 8.0, 12.0)))
            .collect();
        let found = find_in_page(0, &glyphs, "abc", MatchPolicy::FirstPerPage);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rect, Rect::new(10.0, 100.0, 28.0, 12.0));
    }

    #[test]
    fn case_folding_that_changes_length_maps_back_to_glyphs() {
        // 'İ' lowercases to two chars
        let glyphs: Vec<Glyph> = "İstanbul"
            .chars()
            .enumerate()
            .map(|(i, c)| Glyph::new(c, Rect::new(i as f32 * 10.0, 0.0, 10.0, 10.0)))
            .collect();
        let found = find_in_page(0, &glyphs, "tan", MatchPolicy::FirstPerPage);
        assert_eq!(found[0].text, "tan");
        assert_eq!(found[0].rect.x, 20.0);
    }

    #[test]
    fn new_search_replaces_results() {
        let doc = doc_with_foo_on_2_and_4();
        let mut engine = SearchEngine::default();
        engine.search(Some(&doc), "foo");
        engine.next();
        assert_eq!(engine.status().as_deref(), Some("1/2"));

        engine.search(Some(&doc), "walks");
        assert_eq!(engine.results().len(), 1);
        assert_eq!(engine.cursor(), None);

        engine.search(Some(&doc), "zebra");
        assert_eq!(engine.status().as_deref(), Some("No results found"));
    }

    #[test]
    fn unreadable_page_is_skipped() {
        let doc = doc_with_foo_on_2_and_4().with_unreadable_text(2);
        let mut engine = SearchEngine::default();
        let pages: Vec<usize> = engine.search(Some(&doc), "foo").iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![4]);
    }
}
