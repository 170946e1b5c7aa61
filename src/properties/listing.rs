//! State of a paginated search/listing view.
//!
//! The view owns the query (page, sort, kind, filters) and the last result.
//! Each fetch is tagged with a generation number; a response that arrives
//! after a newer fetch started is dropped instead of overwriting fresher data.

use log::{debug, warn};

use super::filter::{ListingKind, SearchFilters, SearchQuery, Sort};
use super::types::{Property, SearchResponse, SearchStats};
use super::PropertiesClient;
use crate::error::Error;
use crate::favorites::FavoritesClient;

/// Message shown when a search fails without a server detail
pub const LOAD_FAILED: &str = "Failed to load properties";

/// What the listing area should display
#[derive(Debug, Clone, PartialEq)]
pub enum ViewStatus {
    /// Nothing requested yet
    Idle,
    /// First load, nothing to show yet
    Loading,
    /// A refetch is running; previous items stay visible, dimmed
    Refreshing,
    Loaded,
    /// The search matched nothing
    Empty,
    Failed(String),
}

/// Outcome of [`SearchView::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The result is now displayed
    Stored,
    /// The ticket was superseded or its query no longer matches; nothing changed
    Stale,
    /// The result has fewer pages than the requested page. The view moved to
    /// the last page and kept its previous items; fetch again to fill it.
    PageClamped,
}

/// Identifies one fetch started by [`SearchView::begin_fetch`]
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    generation: u64,
    /// The query to send
    pub query: SearchQuery,
}

/// A search/listing view
#[derive(Debug, Clone)]
pub struct SearchView {
    query: SearchQuery,
    items: Vec<Property>,
    stats: SearchStats,
    total: u64,
    total_pages: u32,
    status: ViewStatus,
    generation: u64,
}

impl SearchView {
    pub fn new(kind: Option<ListingKind>, page_size: u32) -> Self {
        Self {
            query: SearchQuery {
                page_size: page_size.max(1),
                ..SearchQuery::new(kind)
            },
            items: Vec::new(),
            stats: SearchStats::default(),
            total: 0,
            total_pages: 1,
            status: ViewStatus::Idle,
            generation: 0,
        }
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn items(&self) -> &[Property] {
        &self.items
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page(&self) -> u32 {
        self.query.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    /// Whether existing items should be drawn dimmed
    pub fn is_dimmed(&self) -> bool {
        self.status == ViewStatus::Refreshing
    }

    /// Replace the filters; goes back to the first page
    pub fn set_filters(&mut self, filters: SearchFilters) {
        self.query.filters = filters;
        self.query.page = 1;
    }

    /// Change the ordering; goes back to the first page
    pub fn set_sort(&mut self, sort: Sort) {
        self.query.sort = sort;
        self.query.page = 1;
    }

    /// Switch between sale and rent; goes back to the first page
    pub fn set_kind(&mut self, kind: Option<ListingKind>) {
        self.query.kind = kind;
        self.query.page = 1;
    }

    /// Jump to a page, clamped to `[1, total_pages]`. Returns whether the
    /// page changed.
    pub fn go_to_page(&mut self, page: u32) -> bool {
        let clamped = page.clamp(1, self.total_pages.max(1));
        let changed = clamped != self.query.page;
        self.query.page = clamped;
        changed
    }

    /// Advance one page; stays put on the last page
    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.query.page.saturating_add(1))
    }

    /// Go back one page; stays put on the first page
    pub fn prev_page(&mut self) -> bool {
        self.go_to_page(self.query.page.saturating_sub(1))
    }

    /// Start a fetch for the current query
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.status = if self.items.is_empty() {
            ViewStatus::Loading
        } else {
            ViewStatus::Refreshing
        };
        FetchTicket {
            generation: self.generation,
            query: self.query.clone(),
        }
    }

    /// Store the outcome of a fetch.
    ///
    /// Results for an older fetch, or for a query that has changed since the
    /// fetch began, are dropped.
    pub fn apply(&mut self, ticket: FetchTicket, result: Result<SearchResponse, Error>) -> Applied {
        if ticket.generation != self.generation || ticket.query != self.query {
            debug!(
                "Dropping stale search response (generation {}, current {})",
                ticket.generation, self.generation
            );
            return Applied::Stale;
        }

        match result {
            Ok(response) => {
                self.total = response.total;
                self.total_pages = response.total_pages.max(1);
                self.stats = response.stats;

                if self.query.page > self.total_pages {
                    debug!(
                        "Page {} is past the last page, moving to {}",
                        self.query.page, self.total_pages
                    );
                    self.query.page = self.total_pages;
                    self.status = if self.items.is_empty() {
                        ViewStatus::Loading
                    } else {
                        ViewStatus::Refreshing
                    };
                    return Applied::PageClamped;
                }

                self.items = response.data;
                self.status = if self.items.is_empty() {
                    ViewStatus::Empty
                } else {
                    ViewStatus::Loaded
                };
            }
            Err(err) => {
                warn!("Search failed: {}", err);
                let message = match &err {
                    Error::Api { status, detail } if (400..500).contains(status) => detail.clone(),
                    Error::Unauthorized(detail) => detail.clone(),
                    _ => LOAD_FAILED.to_string(),
                };
                self.status = ViewStatus::Failed(message);
            }
        }
        Applied::Stored
    }

    /// Fetch the current query and apply the result. When the result pulls
    /// the page back, the new page is fetched as well.
    pub async fn refresh(&mut self, client: &PropertiesClient) -> &ViewStatus {
        loop {
            let ticket = self.begin_fetch();
            let result = client.search(&ticket.query).await;
            if self.apply(ticket, result) != Applied::PageClamped {
                break;
            }
        }
        &self.status
    }

    /// Flip the favorite flag of a listed property.
    ///
    /// The flag changes immediately and is reverted if the server rejects
    /// the change. Returns the new flag.
    pub async fn toggle_favorite(&mut self, favorites: &FavoritesClient, id: i64) -> Result<bool, Error> {
        let index = self
            .items
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::general(format!("Property {} is not listed", id)))?;

        let previous = self.items[index].is_favorited;
        let target = !self.items[index].favorited();
        self.items[index].is_favorited = Some(target);

        match favorites.set_favorite(id, target).await {
            Ok(()) => Ok(target),
            Err(err) => {
                warn!("Failed to toggle favorite for {}: {}", id, err);
                if let Some(item) = self.items.iter_mut().find(|p| p.id == id) {
                    item.is_favorited = previous;
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::SortField;

    fn response(page: u32, total_pages: u32, ids: &[i64]) -> SearchResponse {
        SearchResponse {
            page,
            page_size: 12,
            total: ids.len() as u64,
            total_pages,
            stats: SearchStats::default(),
            data: ids
                .iter()
                .map(|id| {
                    serde_json::from_value(serde_json::json!({
                        "id": id, "title": format!("Listing {}", id), "owner_id": 1
                    }))
                    .unwrap()
                })
                .collect(),
        }
    }

    #[test]
    fn pages_are_clamped() {
        let mut view = SearchView::new(Some(ListingKind::Sale), 12);
        assert!(!view.prev_page());
        assert_eq!(view.page(), 1);

        let ticket = view.begin_fetch();
        view.apply(ticket, Ok(response(1, 3, &[1, 2])));

        assert!(view.next_page());
        assert!(view.next_page());
        assert!(!view.next_page());
        assert_eq!(view.page(), 3);

        assert!(view.go_to_page(0));
        assert_eq!(view.page(), 1);
        view.go_to_page(99);
        assert_eq!(view.page(), 3);
    }

    #[test]
    fn query_changes_reset_to_first_page() {
        let mut view = SearchView::new(None, 12);
        let ticket = view.begin_fetch();
        view.apply(ticket, Ok(response(1, 5, &[1])));
        view.go_to_page(4);

        view.set_sort(Sort::ascending(SortField::Price));
        assert_eq!(view.page(), 1);

        view.go_to_page(3);
        view.set_filters(SearchFilters::new().with_city("Amman"));
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn refetch_dims_previous_items() {
        let mut view = SearchView::new(None, 12);
        let first = view.begin_fetch();
        assert_eq!(view.status(), &ViewStatus::Loading);
        view.apply(first, Ok(response(1, 1, &[1, 2, 3])));

        let _second = view.begin_fetch();
        assert!(view.is_dimmed());
        assert_eq!(view.items().len(), 3);
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut view = SearchView::new(None, 12);
        let stale = view.begin_fetch();
        let fresh = view.begin_fetch();

        assert_eq!(view.apply(fresh, Ok(response(1, 1, &[10]))), Applied::Stored);
        assert_eq!(view.apply(stale, Ok(response(1, 1, &[99, 98]))), Applied::Stale);
        assert_eq!(view.items()[0].id, 10);
    }

    #[test]
    fn response_for_replaced_query_is_dropped() {
        let mut view = SearchView::new(None, 12);
        view.set_filters(SearchFilters::new().with_city("Irbid"));
        let irbid = view.begin_fetch();

        view.set_filters(SearchFilters::new().with_city("Amman"));
        assert_eq!(view.apply(irbid, Ok(response(1, 1, &[77]))), Applied::Stale);
        assert!(view.items().is_empty());
        assert_eq!(view.status(), &ViewStatus::Loading);

        let amman = view.begin_fetch();
        view.go_to_page(1);
        view.set_sort(Sort::ascending(SortField::Price));
        assert_eq!(view.apply(amman, Ok(response(1, 1, &[5]))), Applied::Stale);
    }

    #[test]
    fn empty_and_failed_states() {
        let mut view = SearchView::new(None, 12);
        let ticket = view.begin_fetch();
        view.apply(ticket, Ok(response(1, 0, &[])));
        assert_eq!(view.status(), &ViewStatus::Empty);
        assert_eq!(view.total_pages(), 1);

        let ticket = view.begin_fetch();
        view.apply(
            ticket,
            Err(Error::Api {
                status: 422,
                detail: "page_size too large".to_string(),
            }),
        );
        assert_eq!(
            view.status(),
            &ViewStatus::Failed("page_size too large".to_string())
        );

        let ticket = view.begin_fetch();
        view.apply(ticket, Err(Error::general("connection reset")));
        assert_eq!(view.status(), &ViewStatus::Failed(LOAD_FAILED.to_string()));
    }

    #[test]
    fn shrinking_result_pulls_page_back() {
        let mut view = SearchView::new(None, 12);
        let ticket = view.begin_fetch();
        view.apply(ticket, Ok(response(1, 4, &[1])));
        view.go_to_page(4);

        let ticket = view.begin_fetch();
        assert_eq!(view.apply(ticket, Ok(response(4, 2, &[]))), Applied::PageClamped);
        assert_eq!(view.page(), 2);
        assert_eq!(view.total_pages(), 2);
        assert_eq!(view.status(), &ViewStatus::Refreshing);
        assert_eq!(view.items()[0].id, 1);

        let ticket = view.begin_fetch();
        assert_eq!(ticket.query.page, 2);
        assert_eq!(view.apply(ticket, Ok(response(2, 2, &[13, 14]))), Applied::Stored);
        assert_eq!(view.status(), &ViewStatus::Loaded);
        assert_eq!(view.items().len(), 2);
    }
}
