//! In-memory channel catalog
//!
//! Holds the loaded channels sorted by name, a per-category count index and
//! the browsing cursor (active category, search query, page). Indices are
//! recomputed eagerly on every load.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{Channel, ALL_CATEGORIES, RENAMED_ALL_GROUP};
use crate::playlist::ParseOutcome;

pub const DEFAULT_PAGE_SIZE: usize = 12;

/// One page of the filtered view
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub items: Vec<&'a Channel>,
    /// 1-based page number the items belong to
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    channels: Vec<Channel>,
    counts: BTreeMap<String, usize>,
    category: String,
    query: String,
    page: usize,
    page_size: usize,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Catalog {
    pub fn new(page_size: usize) -> Self {
        let mut catalog = Self {
            channels: Vec::new(),
            counts: BTreeMap::new(),
            category: ALL_CATEGORIES.to_string(),
            query: String::new(),
            page: 1,
            page_size,
        };
        catalog.rebuild_index();
        catalog
    }

    /// Replace the backing sequence.
    ///
    /// Drops records missing a name or link, renames a playlist group that
    /// clashes with the "All" sentinel, sorts by name and resets the cursor
    /// to the "All" category, empty query and page 1.
    pub fn load(&mut self, channels: Vec<Channel>) {
        let before = channels.len();
        let mut channels: Vec<Channel> = channels
            .into_iter()
            .filter(Channel::is_playable)
            .map(|mut c| {
                if c.category == ALL_CATEGORIES {
                    debug!("Renaming group {:?} of {} to {:?}", ALL_CATEGORIES, c.name, RENAMED_ALL_GROUP);
                    c.category = RENAMED_ALL_GROUP.to_string();
                }
                c
            })
            .collect();
        channels.sort_by(|a, b| compare_names(&a.name, &b.name));

        if channels.len() != before {
            debug!("Dropped {} channels without name or link", before - channels.len());
        }

        self.channels = channels;
        self.rebuild_index();
        self.category = ALL_CATEGORIES.to_string();
        self.query.clear();
        self.page = 1;
    }

    /// Concatenate the channels of several parsed playlists and load them
    pub fn load_outcomes<I>(&mut self, outcomes: I)
    where
        I: IntoIterator<Item = ParseOutcome>,
    {
        let channels = outcomes.into_iter().flat_map(|o| o.channels).collect();
        self.load(channels);
    }

    fn rebuild_index(&mut self) {
        self.counts.clear();
        for channel in &self.channels {
            *self.counts.entry(channel.category.clone()).or_insert(0) += 1;
        }
        self.counts.insert(ALL_CATEGORIES.to_string(), self.channels.len());
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Channels in `category`, or every channel for the "All" sentinel
    pub fn by_category(&self, category: &str) -> Vec<&Channel> {
        if category == ALL_CATEGORIES {
            self.channels.iter().collect()
        } else {
            self.channels.iter().filter(|c| c.category == category).collect()
        }
    }

    /// Case-insensitive match on name or category within the active category.
    ///
    /// An empty query returns the active category view unchanged.
    pub fn search(&self, query: &str) -> Vec<&Channel> {
        let query = query.trim().to_lowercase();
        let view = self.by_category(&self.category);
        if query.is_empty() {
            return view;
        }
        view.into_iter()
            .filter(|c| c.name.to_lowercase().contains(&query) || c.category.to_lowercase().contains(&query))
            .collect()
    }

    /// Channels per category, with the total under "All"
    pub fn category_counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    /// "All" followed by every category present, sorted
    pub fn categories(&self) -> Vec<&str> {
        let mut categories = vec![ALL_CATEGORIES];
        categories.extend(self.counts.keys().map(String::as_str).filter(|c| *c != ALL_CATEGORIES));
        categories
    }

    pub fn active_category(&self) -> &str {
        &self.category
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page_number(&self) -> usize {
        self.page
    }

    pub fn select_category(&mut self, category: &str) {
        self.category = category.to_string();
        self.page = 1;
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Active category narrowed by the current query
    pub fn current_view(&self) -> Vec<&Channel> {
        self.search(&self.query)
    }

    /// Slice of the current view. Page 0 is treated as page 1; pages past
    /// the end are empty.
    pub fn page(&self, page_size: usize, page: usize) -> Page<'_> {
        paginate(self.current_view(), page_size, page)
    }

    /// Page under the stored cursor
    pub fn current_page(&self) -> Page<'_> {
        self.page(self.page_size, self.page)
    }
}

/// Case-insensitive name ordering, falling back to a plain comparison so
/// the order is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub fn paginate<'a>(items: Vec<&'a Channel>, page_size: usize, page: usize) -> Page<'a> {
    let page = page.max(1);
    let total_items = items.len();
    if page_size == 0 {
        return Page { items: Vec::new(), page, total_pages: 0, total_items };
    }

    let total_pages = total_items.div_ceil(page_size);
    let start = (page - 1).saturating_mul(page_size);
    let items = items.into_iter().skip(start).take(page_size).collect();

    Page { items, page, total_pages, total_items }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
