//! Card view model for property listings

use super::types::Property;

/// Stock photos used when a listing has no images
pub const FALLBACK_IMAGES: [&str; 5] = [
    "https://images.unsplash.com/photo-1505693416388-ac5ce068fe85?q=80&w=1600&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1502672260266-1c1ef2d93688?q=80&w=1600&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1430285561322-7808604715df?q=80&w=1600&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1560448204-e02f11c3d0e2?q=80&w=1600&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1502005229762-cf1b2da7c52f?q=80&w=1600&auto=format&fit=crop",
];

/// What a listing card shows
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyCard {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    /// Rent for rentals, sale price otherwise
    pub display_price: f64,
    pub listing_label: &'static str,
    pub is_favorited: bool,
}

impl From<&Property> for PropertyCard {
    fn from(p: &Property) -> Self {
        let images = if !p.image_urls.is_empty() {
            p.image_urls.clone()
        } else if let Some(cover) = p.cover_image.as_ref().filter(|c| !c.is_empty()) {
            vec![cover.clone()]
        } else {
            let index = p.id.rem_euclid(FALLBACK_IMAGES.len() as i64) as usize;
            vec![FALLBACK_IMAGES[index].to_string()]
        };

        let mut tags = Vec::new();
        if p.is_for_sale {
            tags.push("For sale".to_string());
        }
        if p.is_for_rent {
            tags.push("For rent".to_string());
        }
        tags.extend(p.city.iter().filter(|c| !c.is_empty()).cloned());
        tags.extend(p.neighborhood.iter().filter(|n| !n.is_empty()).cloned());
        if let Some(bedrooms) = p.bedrooms {
            tags.push(format!("{} BR", bedrooms));
        }
        if let Some(area) = p.area_sqm {
            tags.push(format!("{} m²", area));
        }

        let display_price = if p.is_for_rent {
            p.rent_price.unwrap_or(0.0)
        } else {
            p.price.unwrap_or(0.0)
        };

        let listing_label = if p.is_for_sale {
            "For Sale • Owner"
        } else if p.is_for_rent {
            "For Rent • Owner"
        } else {
            "Owner"
        };

        Self {
            id: p.id,
            title: p.title.clone(),
            description: p.description.clone().unwrap_or_default(),
            images,
            tags,
            display_price,
            listing_label,
            is_favorited: p.favorited(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property() -> Property {
        serde_json::from_value(serde_json::json!({
            "id": 7,
            "title": "Garden villa",
            "owner_id": 2,
            "is_for_rent": true,
            "rent_price": 900.0,
            "price": 250000.0,
            "city": "Amman",
            "neighborhood": "Dabouq",
            "bedrooms": 4,
            "area_sqm": 320.0
        }))
        .unwrap()
    }

    #[test]
    fn rental_card_shows_rent_and_tags() {
        let card = PropertyCard::from(&property());
        assert_eq!(card.display_price, 900.0);
        assert_eq!(card.listing_label, "For Rent • Owner");
        assert_eq!(
            card.tags,
            vec!["For rent", "Amman", "Dabouq", "4 BR", "320 m²"]
        );
    }

    #[test]
    fn fallback_image_depends_on_id() {
        let card = PropertyCard::from(&property());
        assert_eq!(card.images, vec![FALLBACK_IMAGES[2].to_string()]);
    }
}
