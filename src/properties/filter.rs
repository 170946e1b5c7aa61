//! Search filters and query parameter composition

use std::fmt;
use std::str::FromStr;

use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::Error;

/// Name of a single search constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Query,
    City,
    MinPrice,
    MaxPrice,
    MinRent,
    MaxRent,
    BedroomsMin,
    BedroomsMax,
    AreaMin,
    AreaMax,
    PropertyType,
    Furnished,
    FloorMin,
    FloorMax,
    AgeMin,
    AgeMax,
}

impl FilterKey {
    /// Every key, in the order parameters are emitted
    pub const ALL: [FilterKey; 16] = [
        FilterKey::Query,
        FilterKey::City,
        FilterKey::MinPrice,
        FilterKey::MaxPrice,
        FilterKey::MinRent,
        FilterKey::MaxRent,
        FilterKey::BedroomsMin,
        FilterKey::BedroomsMax,
        FilterKey::AreaMin,
        FilterKey::AreaMax,
        FilterKey::PropertyType,
        FilterKey::Furnished,
        FilterKey::FloorMin,
        FilterKey::FloorMax,
        FilterKey::AgeMin,
        FilterKey::AgeMax,
    ];

    /// Query parameter name
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::Query => "q",
            FilterKey::City => "city",
            FilterKey::MinPrice => "min_price",
            FilterKey::MaxPrice => "max_price",
            FilterKey::MinRent => "min_rent",
            FilterKey::MaxRent => "max_rent",
            FilterKey::BedroomsMin => "bedrooms_min",
            FilterKey::BedroomsMax => "bedrooms_max",
            FilterKey::AreaMin => "area_min",
            FilterKey::AreaMax => "area_max",
            FilterKey::PropertyType => "property_type",
            FilterKey::Furnished => "furnished",
            FilterKey::FloorMin => "floor_min",
            FilterKey::FloorMax => "floor_max",
            FilterKey::AgeMin => "age_min",
            FilterKey::AgeMax => "age_max",
        }
    }
}

/// Sparse set of optional search constraints.
///
/// Only keys that hold a value become query parameters. Blank strings count
/// as unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub q: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rent: Option<f64>,
    pub max_rent: Option<f64>,
    pub bedrooms_min: Option<u32>,
    pub bedrooms_max: Option<u32>,
    pub area_min: Option<f64>,
    pub area_max: Option<f64>,
    pub property_type: Option<String>,
    pub furnished: Option<bool>,
    pub floor_min: Option<i32>,
    pub floor_max: Option<i32>,
    pub age_min: Option<u32>,
    pub age_max: Option<u32>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text query
    pub fn with_query(mut self, q: &str) -> Self {
        self.q = Some(q.to_string());
        self
    }

    /// Restrict to a city
    pub fn with_city(mut self, city: &str) -> Self {
        self.city = Some(city.to_string());
        self
    }

    /// Restrict to a property type
    pub fn with_property_type(mut self, property_type: &str) -> Self {
        self.property_type = Some(property_type.to_string());
        self
    }

    /// Restrict the sale price range
    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    /// Restrict the rent range
    pub fn with_rent_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_rent = min;
        self.max_rent = max;
        self
    }

    /// Restrict the number of bedrooms
    pub fn with_bedrooms(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.bedrooms_min = min;
        self.bedrooms_max = max;
        self
    }

    /// Restrict the area in square meters
    pub fn with_area(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.area_min = min;
        self.area_max = max;
        self
    }

    /// Restrict the floor
    pub fn with_floor(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.floor_min = min;
        self.floor_max = max;
        self
    }

    /// Restrict the building age in years
    pub fn with_age(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.age_min = min;
        self.age_max = max;
        self
    }

    /// Require furnished or unfurnished
    pub fn with_furnished(mut self, furnished: bool) -> Self {
        self.furnished = Some(furnished);
        self
    }

    /// Remove one constraint
    pub fn clear(&mut self, key: FilterKey) {
        match key {
            FilterKey::Query => self.q = None,
            FilterKey::City => self.city = None,
            FilterKey::MinPrice => self.min_price = None,
            FilterKey::MaxPrice => self.max_price = None,
            FilterKey::MinRent => self.min_rent = None,
            FilterKey::MaxRent => self.max_rent = None,
            FilterKey::BedroomsMin => self.bedrooms_min = None,
            FilterKey::BedroomsMax => self.bedrooms_max = None,
            FilterKey::AreaMin => self.area_min = None,
            FilterKey::AreaMax => self.area_max = None,
            FilterKey::PropertyType => self.property_type = None,
            FilterKey::Furnished => self.furnished = None,
            FilterKey::FloorMin => self.floor_min = None,
            FilterKey::FloorMax => self.floor_max = None,
            FilterKey::AgeMin => self.age_min = None,
            FilterKey::AgeMax => self.age_max = None,
        }
    }

    /// Remove every constraint
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The value sent for a key, if it is defined
    pub fn value(&self, key: FilterKey) -> Option<String> {
        match key {
            FilterKey::Query => text(&self.q),
            FilterKey::City => text(&self.city),
            FilterKey::MinPrice => self.min_price.map(|v| v.to_string()),
            FilterKey::MaxPrice => self.max_price.map(|v| v.to_string()),
            FilterKey::MinRent => self.min_rent.map(|v| v.to_string()),
            FilterKey::MaxRent => self.max_rent.map(|v| v.to_string()),
            FilterKey::BedroomsMin => self.bedrooms_min.map(|v| v.to_string()),
            FilterKey::BedroomsMax => self.bedrooms_max.map(|v| v.to_string()),
            FilterKey::AreaMin => self.area_min.map(|v| v.to_string()),
            FilterKey::AreaMax => self.area_max.map(|v| v.to_string()),
            FilterKey::PropertyType => text(&self.property_type),
            FilterKey::Furnished => self.furnished.map(|v| v.to_string()),
            FilterKey::FloorMin => self.floor_min.map(|v| v.to_string()),
            FilterKey::FloorMax => self.floor_max.map(|v| v.to_string()),
            FilterKey::AgeMin => self.age_min.map(|v| v.to_string()),
            FilterKey::AgeMax => self.age_max.map(|v| v.to_string()),
        }
    }

    /// Defined constraints as query parameters
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        FilterKey::ALL
            .iter()
            .filter_map(|key| self.value(*key).map(|value| (key.as_str(), value)))
            .collect()
    }

    /// Whether no constraint is defined
    pub fn is_empty(&self) -> bool {
        FilterKey::ALL.iter().all(|key| self.value(*key).is_none())
    }

    /// Number of defined constraints
    pub fn active_count(&self) -> usize {
        FilterKey::ALL
            .iter()
            .filter(|key| self.value(**key).is_some())
            .count()
    }
}

fn text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Column results can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Price,
    AreaSqm,
    Bedrooms,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Price => "price",
            SortField::AreaSqm => "area_sqm",
            SortField::Bedrooms => "bedrooms",
        }
    }
}

/// Result ordering, sent as `sort=<field>` or `sort=-<field>` for descending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub descending: bool,
}

impl Sort {
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            descending: true,
        }
    }
}

impl Default for Sort {
    /// Newest first
    fn default() -> Self {
        Self::descending(SortField::Id)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field.as_str())
        } else {
            f.write_str(self.field.as_str())
        }
    }
}

impl FromStr for Sort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, s),
        };
        let field = match name {
            "id" => SortField::Id,
            "price" => SortField::Price,
            "area_sqm" => SortField::AreaSqm,
            "bedrooms" => SortField::Bedrooms,
            other => return Err(Error::validation(format!("Unknown sort key: {}", other))),
        };
        Ok(Self { field, descending })
    }
}

/// Which market a listing view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Sale,
    Rent,
}

impl ListingKind {
    fn param(&self) -> (&'static str, String) {
        match self {
            ListingKind::Sale => ("is_for_sale", "true".to_string()),
            ListingKind::Rent => ("is_for_rent", "true".to_string()),
        }
    }
}

/// Everything needed for one `GET /properties/search` call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    pub sort: Sort,
    pub kind: Option<ListingKind>,
    pub filters: SearchFilters,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: Sort::default(),
            kind: None,
            filters: SearchFilters::default(),
        }
    }
}

impl SearchQuery {
    pub fn new(kind: Option<ListingKind>) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Query parameters: paging and sort first, then the listing kind, then
    /// each defined filter.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.max(1).to_string()),
            ("page_size", self.page_size.to_string()),
            ("sort", self.sort.to_string()),
        ];
        if let Some(kind) = self.kind {
            params.push(kind.param());
        }
        params.extend(self.filters.to_params());
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn empty_filters_send_nothing() {
        let filters = SearchFilters::new()
            .with_query("   ")
            .with_city("")
            .with_price_range(None, None);
        assert!(filters.is_empty());
        assert!(filters.to_params().is_empty());
    }

    #[test]
    fn only_defined_keys_are_sent() {
        let cases = vec![
            SearchFilters::new().with_city("Amman"),
            SearchFilters::new().with_price_range(Some(50_000.0), None),
            SearchFilters::new().with_bedrooms(Some(2), Some(4)).with_furnished(false),
            SearchFilters::new()
                .with_query("balcony")
                .with_property_type("Villa")
                .with_area(None, Some(300.0))
                .with_floor(Some(-1), Some(3))
                .with_age(Some(0), Some(10))
                .with_rent_range(Some(300.0), Some(700.0)),
        ];

        for filters in cases {
            let expected: HashSet<&str> = FilterKey::ALL
                .iter()
                .filter(|k| filters.value(**k).is_some())
                .map(|k| k.as_str())
                .collect();
            let sent: HashSet<&str> = filters.to_params().into_iter().map(|(k, _)| k).collect();
            assert_eq!(sent, expected);
            assert_eq!(sent.len(), filters.active_count());
        }
    }

    #[test]
    fn clearing_removes_the_key() {
        let mut filters = SearchFilters::new().with_city("Irbid").with_furnished(true);
        filters.clear(FilterKey::City);
        assert_eq!(filters.to_params(), vec![("furnished", "true".to_string())]);
        filters.reset();
        assert!(filters.is_empty());
    }

    #[test]
    fn whole_numbers_have_no_fraction() {
        let filters = SearchFilters::new().with_price_range(Some(100_000.0), Some(150_500.5));
        assert_eq!(
            filters.to_params(),
            vec![
                ("min_price", "100000".to_string()),
                ("max_price", "150500.5".to_string())
            ]
        );
    }

    #[test]
    fn sort_round_trips_through_strings() {
        assert_eq!(Sort::default().to_string(), "-id");
        assert_eq!("price".parse::<Sort>().unwrap(), Sort::ascending(SortField::Price));
        assert_eq!(
            "-area_sqm".parse::<Sort>().unwrap(),
            Sort::descending(SortField::AreaSqm)
        );
        assert!("title".parse::<Sort>().is_err());
    }

    #[test]
    fn query_params_include_paging_kind_and_filters() {
        let query = SearchQuery {
            page: 2,
            filters: SearchFilters::new().with_city("Amman"),
            ..SearchQuery::new(Some(ListingKind::Rent))
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("page", "2".to_string()),
                ("page_size", "12".to_string()),
                ("sort", "-id".to_string()),
                ("is_for_rent", "true".to_string()),
                ("city", "Amman".to_string()),
            ]
        );
    }
}
