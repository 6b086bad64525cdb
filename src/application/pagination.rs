//! Numbered feed pagination.

use serde::Serialize;

/// Posts per feed page.
pub const PAGE_SIZE: u32 = 10;

/// A 1-based page request, parsed from the `page` query parameter.
///
/// Requests never fail to parse: absent, blank or non-numeric values fall
/// back to the first page, and page numbers past the end of a feed simply
/// produce an empty page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: u32,
}

impl PageRequest {
    pub fn first() -> Self {
        Self { number: 1 }
    }

    /// Clamp to the valid range; page zero means page one.
    pub fn new(number: u32) -> Self {
        Self {
            number: number.max(1),
        }
    }

    pub fn from_param(param: Option<&str>) -> Self {
        let number = param
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(1);
        Self::new(number)
    }

    pub fn number(self) -> u32 {
        self.number
    }

    pub fn limit(self) -> u32 {
        PAGE_SIZE
    }

    pub fn offset(self) -> u64 {
        u64::from(self.number - 1) * u64::from(PAGE_SIZE)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// One page of a feed plus the totals needed to render pager controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedPage<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> FeedPage<T> {
    /// Assemble a page from the rows fetched for `request` and the filter's
    /// total row count.
    pub fn assemble(items: Vec<T>, total_items: u64, request: PageRequest) -> Self {
        let total_pages = total_items.div_ceil(u64::from(PAGE_SIZE));
        let number = request.number();
        Self {
            items,
            number,
            total_items,
            total_pages,
            has_next: u64::from(number) < total_pages,
            has_previous: number > 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
