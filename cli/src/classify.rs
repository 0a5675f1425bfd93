use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use tally_core::models::FoodCandidate;
use tally_core::service::MealClassifier;

/// Client for the meal-photo classification proxy. The proxy wraps a
/// generative-AI vision call and answers in the same shape as a nutrition
/// lookup: a per-100g estimate, or status 0 when it can't tell.
pub struct VisionClient {
    client: reqwest::Client,
    rt: tokio::runtime::Handle,
    endpoint: String,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    image: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyResponse {
    pub status: i32,
    pub estimate: Option<FoodCandidate>,
}

impl VisionClient {
    pub fn new(endpoint: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "tally-cli/{} (fitness tracker)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            rt: tokio::runtime::Handle::current(),
            endpoint: endpoint.to_string(),
        }
    }

    pub async fn classify_async(&self, image: &[u8]) -> Result<Option<FoodCandidate>> {
        let encoded = BASE64.encode(image);
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { image: &encoded })
            .send()
            .await
            .context("Failed to reach the meal classifier")?;

        let data: ClassifyResponse = resp
            .json()
            .await
            .context("Failed to parse classifier response")?;

        if data.status != 1 {
            return Ok(None);
        }
        Ok(data.estimate.filter(|c| !c.name.trim().is_empty()))
    }
}

impl MealClassifier for VisionClient {
    fn classify(&self, image: &[u8]) -> Result<Option<FoodCandidate>> {
        self.rt.block_on(self.classify_async(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_response_with_estimate() {
        let json = r#"{
            "status": 1,
            "estimate": {"name": "Spaghetti Bolognese", "calories": 158, "protein": 8.2, "carbs": 20.3, "fat": 5.6}
        }"#;
        let resp: ClassifyResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.status, 1);
        let estimate = resp.estimate.unwrap();
        assert_eq!(estimate.name, "Spaghetti Bolognese");
        assert_eq!(estimate.calories, 158.0);
    }

    #[test]
    fn test_classify_response_not_found() {
        let json = r#"{"status": 0, "estimate": null}"#;
        let resp: ClassifyResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.status, 0);
        assert!(resp.estimate.is_none());
    }

    #[test]
    fn test_classify_response_missing_macros_default_to_zero() {
        let json = r#"{"status": 1, "estimate": {"name": "Soup", "calories": 45}}"#;
        let resp: ClassifyResponse = serde_json::from_str(json).unwrap();
        let estimate = resp.estimate.unwrap();
        assert_eq!(estimate.protein, 0.0);
        assert_eq!(estimate.carbs, 0.0);
        assert_eq!(estimate.fat, 0.0);
    }
}
