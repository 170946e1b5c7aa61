//! Price prediction

mod wizard;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::auth::SessionStore;
use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::Fetch;
use crate::properties::Property;

pub use wizard::*;

/// Amman neighborhoods offered by the valuation form, sorted
pub const AMMAN_NEIGHBORHOODS: [&str; 43] = [
    "7th Circle",
    "Abdoun",
    "Abu Nseir",
    "Al Ashrafyeh",
    "Al Bayader",
    "Al Bnayyat",
    "Al Jandaweel",
    "Al Kamaliya",
    "Al Kursi",
    "Al Muqabalain",
    "Al Qwaismeh",
    "Al Rabiah",
    "Al Rawnaq",
    "Al Ridwan",
    "Al Urdon Street",
    "Al Yadudah",
    "Dabouq",
    "Daheit Al Rasheed",
    "Daheit Al Yasmeen",
    "Dahiet Al-Nakheel",
    "Dahiet Al-Rawda",
    "Deir Ghbar",
    "Gardens",
    "Hai Nazzal",
    "Jabal Al Hussain",
    "Jabal Al Nuzha",
    "Jabal Al Zohor",
    "Jabal Al-Lweibdeh",
    "Jabal Al-Taj",
    "Jabal Amman",
    "Jubaiha",
    "Khalda",
    "Marj El Hamam",
    "Mecca St",
    "Medina St",
    "Shafa Badran",
    "Shmaisani",
    "Sweifieh",
    "Sweileh",
    "Tabarboor",
    "Tla Ali",
    "Um Uthaiena",
    "University District",
];

/// Kind of building being valued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    Apartment,
    House,
    Townhouse,
    Villa,
    Farm,
}

impl PropertyType {
    pub const ALL: [PropertyType; 5] = [
        PropertyType::Apartment,
        PropertyType::House,
        PropertyType::Townhouse,
        PropertyType::Villa,
        PropertyType::Farm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "Apartment",
            PropertyType::House => "House",
            PropertyType::Townhouse => "Townhouse",
            PropertyType::Villa => "Villa",
            PropertyType::Farm => "Farm",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation(format!("Unknown property type: {}", s)))
    }
}

/// Body of `POST /ml/price/predict`.
///
/// Apartments carry `floor`; every other type carries `total_floors`. Build
/// it through [`ValuationForm::to_request`] or
/// [`ValuationRequest::for_property`] to keep that rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationRequest {
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area_sqm: f64,
    pub property_type: PropertyType,
    pub furnished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_floors: Option<i32>,
    pub building_age: u32,
    pub city: String,
    pub neighborhood: String,
}

impl ValuationRequest {
    /// Request a price check for an existing listing.
    ///
    /// The listing must name its neighborhood and have a positive area.
    pub fn for_property(property: &Property) -> Result<Self, Error> {
        let neighborhood = property
            .neighborhood
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::validation("Neighborhood information is required for price analysis"))?;

        let area_sqm = property
            .area_sqm
            .filter(|a| *a > 0.0)
            .ok_or_else(|| Error::validation("Property area is required for price analysis"))?;

        let property_type = property
            .property_type
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(PropertyType::Apartment);

        let level = property.floor.unwrap_or(0);
        let (floor, total_floors) = shape_floors(property_type, level, level);

        Ok(Self {
            bedrooms: property.bedrooms.unwrap_or(0),
            bathrooms: property.bathrooms.unwrap_or(0),
            area_sqm,
            property_type,
            furnished: property.furnished.unwrap_or(false),
            floor,
            total_floors,
            building_age: property.building_age.unwrap_or(0),
            city: property
                .city
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CITY.to_string()),
            neighborhood: neighborhood.to_string(),
        })
    }
}

pub(crate) fn shape_floors(property_type: PropertyType, floor: i32, total_floors: i32) -> (Option<i32>, Option<i32>) {
    if property_type == PropertyType::Apartment {
        (Some(floor), None)
    } else {
        (None, Some(total_floors))
    }
}

/// Response of `POST /ml/price/predict`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ValuationResponse {
    /// Estimated price in Jordanian dinars
    pub price_jod: f64,
}

/// Client for the price prediction endpoint
#[derive(Clone)]
pub struct ValuationClient {
    url: String,
    client: Client,
    session: SessionStore,
    options: ClientOptions,
}

impl ValuationClient {
    /// Create a new ValuationClient
    pub(crate) fn new(url: &str, client: Client, session: SessionStore, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            client,
            session,
            options,
        }
    }

    /// Ask the model for a price estimate
    pub async fn predict(&self, request: &ValuationRequest) -> Result<ValuationResponse, Error> {
        let url = format!("{}/ml/price/predict", self.url);

        Fetch::post(&self.client, &url)
            .header("X-Client-Info", &self.options.client_info)
            .timeout(self.options.request_timeout)
            .session(&self.session)
            .json(request)?
            .execute::<ValuationResponse>()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(value: serde_json::Value) -> Property {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn neighborhoods_are_sorted() {
        let mut sorted = AMMAN_NEIGHBORHOODS.to_vec();
        sorted.sort();
        assert_eq!(sorted, AMMAN_NEIGHBORHOODS.to_vec());
    }

    #[test]
    fn property_type_parses_case_insensitively() {
        assert_eq!("villa".parse::<PropertyType>().unwrap(), PropertyType::Villa);
        assert!("castle".parse::<PropertyType>().is_err());
    }

    #[test]
    fn listing_without_neighborhood_cannot_be_valued() {
        let property = listing(serde_json::json!({
            "id": 1, "title": "x", "owner_id": 1, "area_sqm": 120.0
        }));
        assert!(matches!(
            ValuationRequest::for_property(&property),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn listing_request_follows_floor_rule() {
        let property = listing(serde_json::json!({
            "id": 1, "title": "x", "owner_id": 1, "area_sqm": 400.0,
            "neighborhood": "Dabouq", "property_type": "Villa", "floor": 3
        }));
        let request = ValuationRequest::for_property(&property).unwrap();
        assert_eq!(request.floor, None);
        assert_eq!(request.total_floors, Some(3));
        assert_eq!(request.city, "Amman");

        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("floor").is_none());
        assert_eq!(body["property_type"], "Villa");
    }
}
