//! Mapping structural blocks onto pages of the rendered PDF
//!
//! The markdown outline and the rendered PDF share no identifiers, so the
//! mapping is approximate: a block's normalized prefix is looked up as a
//! substring of each page, falling back to word overlap.

use std::collections::{BTreeMap, HashSet};

use crate::text::{collapse_whitespace, head_chars};
use crate::types::DocumentStructure;

/// Characters of block text used for matching
pub const MATCH_PREFIX_CHARS: usize = 200;

/// Page assigned when nothing matches
pub const DEFAULT_PAGE: u32 = 1;

fn normalize(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

/// Block index to 1-based page number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMap {
    pages: BTreeMap<usize, u32>,
}

impl PageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every block gets the default page
    pub fn uniform(structure: &DocumentStructure) -> Self {
        let mut map = Self::new();
        for block in &structure.blocks {
            map.insert(block.index, DEFAULT_PAGE);
        }
        for heading in &structure.headings {
            map.insert(heading.index, DEFAULT_PAGE);
        }
        map
    }

    pub fn insert(&mut self, index: usize, page: u32) {
        self.pages.insert(index, page);
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        self.pages.get(&index).copied()
    }

    /// Page of `index`, or the default page when unmapped
    pub fn page_of(&self, index: usize) -> u32 {
        self.get(index).unwrap_or(DEFAULT_PAGE)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.pages.iter().map(|(index, page)| (*index, *page))
    }
}

struct NormalizedPage {
    text: String,
    words: HashSet<String>,
}

/// Matches block text against the per-page text of a PDF
pub struct PageMapper {
    pages: Vec<NormalizedPage>,
}

impl PageMapper {
    /// `pages[0]` is page 1
    pub fn new(pages: &[String]) -> Self {
        let pages = pages
            .iter()
            .map(|page| {
                let text = normalize(page);
                let words = text.split(' ').filter(|w| !w.is_empty()).map(str::to_string).collect();
                NormalizedPage { text, words }
            })
            .collect();
        Self { pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page for one block's text; `None` when the text is blank.
    ///
    /// The first page containing the normalized prefix wins. Otherwise the
    /// page sharing the most words wins, ties going to the earlier page,
    /// and page 1 when no page shares a word.
    pub fn map_text(&self, content: &str) -> Option<u32> {
        let normalized = normalize(content);
        let prefix = head_chars(&normalized, MATCH_PREFIX_CHARS);
        if prefix.is_empty() {
            return None;
        }

        if let Some(pos) = self.pages.iter().position(|page| page.text.contains(prefix)) {
            return Some(pos as u32 + 1);
        }

        let words: HashSet<&str> = prefix.split(' ').filter(|w| !w.is_empty()).collect();
        let mut best = (0usize, DEFAULT_PAGE);
        for (pos, page) in self.pages.iter().enumerate() {
            let score = words.iter().filter(|w| page.words.contains(**w)).count();
            if score > best.0 {
                best = (score, pos as u32 + 1);
            }
        }
        Some(best.1)
    }

    /// Map every content block, then give each heading the page of the
    /// nearest following mapped block (page 1 if none follows).
    pub fn map_structure(&self, structure: &DocumentStructure) -> PageMap {
        let mut map = PageMap::new();
        for block in &structure.blocks {
            if let Some(page) = self.map_text(&block.content) {
                map.insert(block.index, page);
            }
        }

        let content_pages: Vec<(usize, u32)> = map.iter().collect();
        for heading in &structure.headings {
            let page = content_pages
                .iter()
                .find(|(index, _)| *index > heading.index)
                .map(|(_, page)| *page)
                .unwrap_or(DEFAULT_PAGE);
            map.insert(heading.index, page);
        }

        tracing::debug!(
            pages = self.pages.len(),
            mapped = map.len(),
            "Mapped structure to pages"
        );
        map
    }
}
