use serde::{Deserialize, Serialize};

use crate::model::SortOrder;

/// Active category tab of a list page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Filter {
    #[default]
    All,
    Tag(String),
}

impl Filter {
    /// `"all"` (any case) and blank strings select every category
    pub fn from_tag(tag: &str) -> Self {
        let trimmed = tag.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Filter::All
        } else {
            Filter::Tag(trimmed.to_string())
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Filter::All => None,
            Filter::Tag(tag) => Some(tag),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }
}

/// What a list page should currently show.
///
/// `page` is always at least 1 and snaps back to 1 whenever the committed
/// search text, the filter or the sort changes. Paging never touches the
/// search or the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    page: u32,
    page_size: u32,
    search_raw: String,
    search_debounced: String,
    filter: Filter,
    sort_by: Option<String>,
    sort_order: Option<SortOrder>,
}

impl QueryState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            search_raw: String::new(),
            search_debounced: String::new(),
            filter: Filter::All,
            sort_by: None,
            sort_order: None,
        }
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = Some(order);
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn search_raw(&self) -> &str {
        &self.search_raw
    }

    pub fn search(&self) -> &str {
        &self.search_debounced
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    pub fn sort_order(&self) -> Option<SortOrder> {
        self.sort_order
    }

    /// Echo the text as typed; nothing is committed yet
    pub fn set_search_raw(&mut self, raw: &str) {
        self.search_raw = raw.to_string();
    }

    /// Commit the trimmed text. Returns true when the committed search changed.
    pub fn commit_search(&mut self, raw: &str) -> bool {
        let trimmed = raw.trim();
        if trimmed == self.search_debounced {
            return false;
        }
        self.search_debounced = trimmed.to_string();
        self.page = 1;
        true
    }

    /// Select a tab. The page always returns to 1; returns true when anything changed.
    pub fn set_filter(&mut self, filter: Filter) -> bool {
        let changed = filter != self.filter || self.page != 1;
        self.filter = filter;
        self.page = 1;
        changed
    }

    pub fn set_sort(&mut self, sort_by: Option<String>, order: Option<SortOrder>) -> bool {
        if sort_by == self.sort_by && order == self.sort_order {
            return false;
        }
        self.sort_by = sort_by;
        self.sort_order = order;
        self.page = 1;
        true
    }

    /// Move to `page` when it lies in `1..=total_pages`; out-of-range requests are rejected
    pub fn set_page(&mut self, page: u32, total_pages: u32) -> bool {
        if page < 1 || page > total_pages.max(1) || page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    /// Pull the page back inside a result set that shrank
    pub fn clamp_page(&mut self, total_pages: u32) -> bool {
        let last = total_pages.max(1);
        if self.page <= last {
            return false;
        }
        self.page = last;
        true
    }

    pub fn reset_page(&mut self) -> bool {
        let changed = self.page != 1;
        self.page = 1;
        changed
    }
}
