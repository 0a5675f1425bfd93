use anyhow::{Context, Result};

use tally_core::models::FoodCandidate;
use tally_core::openfoodfacts::{ProductResponse, SearchResponse, product_to_candidate};
use tally_core::service::NutritionLookup;

const SEARCH_URL: &str = "https://world.openfoodfacts.org/cgi/search.pl";
const PRODUCT_URL: &str = "https://world.openfoodfacts.org/api/v0/product";

pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    rt: tokio::runtime::Handle,
}

impl OpenFoodFactsClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "tally-cli/{} (fitness tracker)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(10))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            rt: tokio::runtime::Handle::current(),
        }
    }

    pub async fn search_async(&self, query: &str) -> Result<Vec<FoodCandidate>> {
        let resp = self
            .client
            .get(SEARCH_URL)
            .query(&[("search_terms", query), ("json", "1"), ("page_size", "10")])
            .send()
            .await
            .context("Failed to reach OpenFoodFacts API")?;

        let data: SearchResponse = resp
            .json()
            .await
            .context("Failed to parse OpenFoodFacts search response")?;

        Ok(data
            .products
            .into_iter()
            .filter_map(product_to_candidate)
            .collect())
    }

    pub async fn lookup_barcode_async(&self, barcode: &str) -> Result<Option<FoodCandidate>> {
        let url = format!("{PRODUCT_URL}/{barcode}.json");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach OpenFoodFacts API")?;

        let data: ProductResponse = resp
            .json()
            .await
            .context("Failed to parse OpenFoodFacts barcode response")?;

        if data.status != 1 {
            return Ok(None);
        }

        Ok(data.product.and_then(product_to_candidate))
    }
}

impl NutritionLookup for OpenFoodFactsClient {
    fn search(&self, query: &str) -> Result<Vec<FoodCandidate>> {
        self.rt.block_on(self.search_async(query))
    }

    fn lookup_barcode(&self, barcode: &str) -> Result<Option<FoodCandidate>> {
        self.rt.block_on(self.lookup_barcode_async(barcode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Integration tests (hit the real OpenFoodFacts API) ---

    #[tokio::test]
    #[ignore = "hits OpenFoodFacts API"]
    async fn test_lookup_barcode_known_product() {
        let client = OpenFoodFactsClient::new();
        let result = client.lookup_barcode_async("3017620422003").await.unwrap();
        let candidate = result.expect("Nutella should exist in OpenFoodFacts");
        assert!(candidate.name.to_lowercase().contains("nutella"));
        assert!(candidate.calories > 0.0);
    }

    #[tokio::test]
    #[ignore = "hits OpenFoodFacts API"]
    async fn test_lookup_barcode_not_found() {
        let client = OpenFoodFactsClient::new();
        let result = client.lookup_barcode_async("0000000000000").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    #[ignore = "hits OpenFoodFacts API"]
    async fn test_search_returns_results() {
        let client = OpenFoodFactsClient::new();
        let results = client.search_async("nutella").await.unwrap();
        assert!(!results.is_empty());
        for candidate in &results {
            assert!(!candidate.name.is_empty());
            assert!(candidate.calories > 0.0);
        }
    }
}
