//! Typed wrappers over the REST endpoints, grouped by resource.
//!
//! Every wrapper is an inherent method on [`ApiClient`](crate::http::ApiClient) and
//! propagates [`ApiError`](crate::error::ApiError) unchanged.

mod auth;
mod cards;
mod folders;
mod sets;

pub use cards::CARD_PAGE_SIZE;

use crate::http::ApiRequest;

/// Folder id sent in card routes, which ignore it.
pub(crate) const ANY_FOLDER: i64 = 0;

/// Pagination and search for folder listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    /// Number of rows to skip.
    pub skip: u32,
    /// Maximum rows to return.
    pub limit: u32,
    /// Case-insensitive name filter; empty means unfiltered.
    pub search: String,
}

impl ListParams {
    /// First page of `limit` rows.
    #[must_use]
    pub fn page(skip: u32, limit: u32) -> Self {
        Self {
            skip,
            limit,
            search: String::new(),
        }
    }

    /// Attach a search string.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    fn apply(&self, request: ApiRequest) -> ApiRequest {
        let request = request
            .query("skip", self.skip)
            .query("limit", self.limit);
        let search = self.search.trim();
        if search.is_empty() {
            request
        } else {
            request.query("search", search)
        }
    }
}

/// Pagination, search, and tag filters for set listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetListParams {
    /// Pagination and search.
    pub list: ListParams,
    /// Tag names; a set must carry all of them.
    pub tags: Vec<String>,
}

impl SetListParams {
    /// Set listing without tag filters.
    #[must_use]
    pub fn new(list: ListParams) -> Self {
        Self {
            list,
            tags: Vec::new(),
        }
    }

    fn apply(&self, request: ApiRequest) -> ApiRequest {
        self.tags
            .iter()
            .fold(self.list.apply(request), |request, tag| {
                request.query("tags", tag)
            })
    }
}
