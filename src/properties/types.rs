//! Types for property listings

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A property listing as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_for_sale: bool,
    /// Sale price in JOD
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub is_for_rent: bool,
    /// Monthly rent in JOD
    #[serde(default)]
    pub rent_price: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(default)]
    pub area_sqm: Option<f64>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub furnished: Option<bool>,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub building_age: Option<u32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub owner_id: i64,
    #[serde(default)]
    pub is_favorited: Option<bool>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default, alias = "coverImage")]
    pub cover_image: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Property {
    /// Whether the current user has saved this property
    pub fn favorited(&self) -> bool {
        self.is_favorited.unwrap_or(false)
    }
}

/// An image attached to a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyImage {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub is_cover: bool,
}

/// Aggregates for sale listings matching a search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleStats {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub avg_price: Option<f64>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
}

/// Aggregates for rental listings matching a search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RentStats {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub avg_rent: Option<f64>,
    #[serde(default)]
    pub min_rent: Option<f64>,
    #[serde(default)]
    pub max_rent: Option<f64>,
}

/// Aggregate statistics over a search result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    #[serde(default)]
    pub sale: SaleStats,
    #[serde(default)]
    pub rent: RentStats,
}

/// One page of `GET /properties/search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
    #[serde(default)]
    pub stats: SearchStats,
    #[serde(default)]
    pub data: Vec<Property>,
}

/// Count and average price for one market segment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentStats {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub avg_price: Option<f64>,
}

/// Marketplace-wide numbers from `GET /properties/statistics`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketStatistics {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub sale: SegmentStats,
    #[serde(default)]
    pub rent: SegmentStats,
    #[serde(default)]
    pub neighborhoods: u64,
}

/// Body of `POST /properties`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewProperty {
    pub title: String,
    pub description: Option<String>,
    pub is_for_sale: bool,
    pub price: Option<f64>,
    pub is_for_rent: bool,
    pub rent_price: Option<f64>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub area_sqm: Option<f64>,
    pub property_type: Option<String>,
    pub furnished: bool,
    pub floor: Option<i32>,
    pub building_age: Option<u32>,
}

impl NewProperty {
    /// Check the listing before it is sent
    pub fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("Title is required"));
        }
        validate_listing_kind(
            self.is_for_sale,
            self.price,
            self.is_for_rent,
            self.rent_price,
        )
    }
}

/// Body of `PATCH /properties/{id}`. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_for_sale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_for_rent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_sqm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub furnished: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl PropertyPatch {
    /// Whether the patch changes what the listing is offered as, or for how much
    pub fn touches_listing_kind(&self) -> bool {
        self.is_for_sale.is_some()
            || self.is_for_rent.is_some()
            || self.price.is_some()
            || self.rent_price.is_some()
    }

    /// Check the patch against the listing it will be applied to
    pub fn validate_against(&self, current: &Property) -> Result<(), Error> {
        validate_listing_kind(
            self.is_for_sale.unwrap_or(current.is_for_sale),
            self.price.or(current.price),
            self.is_for_rent.unwrap_or(current.is_for_rent),
            self.rent_price.or(current.rent_price),
        )
    }
}

fn validate_listing_kind(
    is_for_sale: bool,
    price: Option<f64>,
    is_for_rent: bool,
    rent_price: Option<f64>,
) -> Result<(), Error> {
    if !is_for_sale && !is_for_rent {
        return Err(Error::validation(
            "Please select at least one option: For Sale or For Rent",
        ));
    }
    if is_for_sale && !is_positive(price) {
        return Err(Error::validation("Please enter a sale price"));
    }
    if is_for_rent && !is_positive(rent_price) {
        return Err(Error::validation("Please enter a rent price"));
    }
    Ok(())
}

fn is_positive(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v > 0.0)
}
