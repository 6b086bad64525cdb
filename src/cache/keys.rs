//! Keys addressing stored pages.

/// Identifies one cached page of a cacheable route: the route path plus the
/// page number the request resolved to.
///
/// The resolved number is used, not the raw query string, so `/`, `/?page=1`
/// and `/?page=oops` all share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub path: String,
    pub page: u32,
}

impl PageKey {
    pub fn new(path: impl Into<String>, page: u32) -> Self {
        Self {
            path: path.into(),
            page,
        }
    }
}
