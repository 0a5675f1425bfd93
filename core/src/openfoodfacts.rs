use serde::Deserialize;

use crate::models::FoodCandidate;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub products: Vec<ProductData>,
}

#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    pub status: i32,
    pub product: Option<ProductData>,
}

#[derive(Debug, Deserialize)]
pub struct ProductData {
    pub product_name: Option<String>,
    pub nutriments: Option<Nutriments>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
pub struct Nutriments {
    #[serde(rename = "energy-kcal_100g")]
    pub energy_kcal_100g: Option<f64>,
    pub proteins_100g: Option<f64>,
    pub carbohydrates_100g: Option<f64>,
    pub fat_100g: Option<f64>,
}

/// Map an `OpenFoodFacts` product to a per-100g candidate. Products with
/// no usable name or no calorie figure are dropped; missing macros read
/// as 0.
#[must_use]
pub fn product_to_candidate(p: ProductData) -> Option<FoodCandidate> {
    let name = p.product_name.filter(|n| !n.trim().is_empty())?;
    let nutriments = p.nutriments?;
    let calories = nutriments.energy_kcal_100g?;

    Some(FoodCandidate {
        name,
        calories,
        protein: nutriments.proteins_100g.unwrap_or(0.0),
        carbs: nutriments.carbohydrates_100g.unwrap_or(0.0),
        fat: nutriments.fat_100g.unwrap_or(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_product() -> ProductData {
        ProductData {
            product_name: Some("Nutella".to_string()),
            nutriments: Some(Nutriments {
                energy_kcal_100g: Some(539.0),
                proteins_100g: Some(6.3),
                carbohydrates_100g: Some(57.5),
                fat_100g: Some(30.9),
            }),
        }
    }

    #[test]
    fn test_product_to_candidate_complete() {
        let candidate = product_to_candidate(full_product()).unwrap();
        assert_eq!(candidate.name, "Nutella");
        assert_eq!(candidate.calories, 539.0);
        assert_eq!(candidate.protein, 6.3);
        assert_eq!(candidate.carbs, 57.5);
        assert_eq!(candidate.fat, 30.9);
    }

    #[test]
    fn test_product_to_candidate_missing_name() {
        let mut p = full_product();
        p.product_name = None;
        assert!(product_to_candidate(p).is_none());

        let mut p2 = full_product();
        p2.product_name = Some("  ".to_string());
        assert!(product_to_candidate(p2).is_none());
    }

    #[test]
    fn test_product_to_candidate_missing_calories() {
        let mut p = full_product();
        p.nutriments.as_mut().unwrap().energy_kcal_100g = None;
        assert!(product_to_candidate(p).is_none());

        let mut p2 = full_product();
        p2.nutriments = None;
        assert!(product_to_candidate(p2).is_none());
    }

    #[test]
    fn test_product_to_candidate_missing_macros_default_to_zero() {
        let p = ProductData {
            product_name: Some("Plain Oats".to_string()),
            nutriments: Some(Nutriments {
                energy_kcal_100g: Some(389.0),
                proteins_100g: None,
                carbohydrates_100g: None,
                fat_100g: None,
            }),
        };
        let candidate = product_to_candidate(p).unwrap();
        assert_eq!(candidate.calories, 389.0);
        assert_eq!(candidate.protein, 0.0);
        assert_eq!(candidate.carbs, 0.0);
        assert_eq!(candidate.fat, 0.0);
    }
}
