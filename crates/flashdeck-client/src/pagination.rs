//! Offset-paginated list state.
//!
//! # Design
//! - `has_more` is true while the last page came back full.
//! - Only one load runs at a time; extra load-more calls are ignored.
//! - A reset bumps a generation so responses for the old query are discarded.

/// Request slot handed out by [`PagedList::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    /// Rows to skip.
    pub skip: u32,
    /// Page size.
    pub limit: u32,
    generation: u64,
}

/// Accumulated pages of a remote list.
#[derive(Debug, Clone)]
pub struct PagedList<T> {
    items: Vec<T>,
    page_size: u32,
    has_more: bool,
    loading: bool,
    generation: u64,
}

impl<T> PagedList<T> {
    /// Empty list that will request pages of `page_size` rows.
    #[must_use]
    pub const fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            page_size,
            has_more: true,
            loading: false,
            generation: 0,
        }
    }

    /// Loaded rows in display order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Whether another page may exist.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a page request is outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Configured page size.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Claim the next page.
    ///
    /// With `reset` the list is emptied and page zero is always claimed, superseding
    /// any outstanding request. Without it, `None` is returned while a load is running
    /// or after a short page.
    pub fn begin(&mut self, reset: bool) -> Option<PageTicket> {
        if reset {
            self.generation += 1;
            self.items.clear();
            self.has_more = true;
        } else if self.loading || !self.has_more {
            return None;
        }
        self.loading = true;
        Some(PageTicket {
            skip: u32::try_from(self.items.len()).unwrap_or(u32::MAX),
            limit: self.page_size,
            generation: self.generation,
        })
    }

    /// Append a fetched page. Returns `false` when the ticket was superseded.
    pub fn finish(&mut self, ticket: PageTicket, batch: Vec<T>) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.loading = false;
        self.has_more = batch.len() == self.page_size as usize;
        self.items.extend(batch);
        true
    }

    /// Release a ticket whose request failed; the page may be retried.
    pub fn fail(&mut self, ticket: PageTicket) {
        if ticket.generation == self.generation {
            self.loading = false;
        }
    }

    /// Empty the list without scheduling a reload.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.items.clear();
        self.has_more = false;
        self.loading = false;
    }

    /// Insert a freshly created row at the top.
    pub fn prepend(&mut self, item: T) {
        self.items.insert(0, item);
    }

    /// Replace the first row matching `predicate`. Returns `false` when absent.
    pub fn replace_where(&mut self, predicate: impl Fn(&T) -> bool, item: T) -> bool {
        match self.items.iter_mut().find(|row| predicate(row)) {
            Some(row) => {
                *row = item;
                true
            }
            None => false,
        }
    }

    /// Remove and return the first row matching `predicate`.
    pub fn remove_where(&mut self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        let index = self.items.iter().position(predicate)?;
        Some(self.items.remove(index))
    }

    /// Mutable access to the first row matching `predicate`.
    pub fn find_mut(&mut self, predicate: impl Fn(&T) -> bool) -> Option<&mut T> {
        self.items.iter_mut().find(|row| predicate(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_pages_keep_has_more_and_short_page_stops() {
        let mut list = PagedList::new(2);
        let first = list.begin(false).expect("first page");
        assert_eq!((first.skip, first.limit), (0, 2));
        assert!(list.begin(false).is_none(), "load already running");
        assert!(list.finish(first, vec![1, 2]));
        assert!(list.has_more());

        let second = list.begin(false).expect("second page");
        assert_eq!(second.skip, 2);
        list.finish(second, vec![3]);
        assert!(!list.has_more());
        assert!(list.begin(false).is_none(), "exhausted");
        assert_eq!(list.items(), &[1, 2, 3]);
    }

    #[test]
    fn reset_discards_stale_responses() {
        let mut list = PagedList::new(2);
        let stale = list.begin(false).expect("page");
        let fresh = list.begin(true).expect("reset always claims");
        assert!(!list.finish(stale, vec![9, 9]));
        assert!(list.is_loading());
        assert!(list.finish(fresh, vec![1]));
        assert_eq!(list.items(), &[1]);
    }

    #[test]
    fn failure_releases_the_slot() {
        let mut list: PagedList<u8> = PagedList::new(5);
        let ticket = list.begin(false).expect("page");
        list.fail(ticket);
        assert!(!list.is_loading());
        assert!(list.begin(false).is_some());
    }

    #[test]
    fn row_helpers_edit_in_place() {
        let mut list = PagedList::new(10);
        let ticket = list.begin(false).expect("page");
        list.finish(ticket, vec![(1, "a"), (2, "b")]);
        list.prepend((3, "c"));
        assert!(list.replace_where(|row| row.0 == 2, (2, "B")));
        assert_eq!(list.remove_where(|row| row.0 == 1), Some((1, "a")));
        assert_eq!(list.items(), &[(3, "c"), (2, "B")]);
        list.clear();
        assert!(list.items().is_empty());
        assert!(!list.has_more());
    }
}
