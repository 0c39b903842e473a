use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::Sex;

/// Demographic lookups keyed by first name.
/// The three calls are independent; any of them may fail on its own.
#[async_trait]
pub trait EnrichmentGateway: Send + Sync {
    async fn age(&self, name: &str) -> AppResult<Option<i32>>;

    async fn nationality(&self, name: &str) -> AppResult<Option<String>>;

    async fn sex(&self, name: &str) -> AppResult<Option<Sex>>;
}

#[derive(Debug, Deserialize)]
struct AgeResponse {
    age: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct NationalityResponse {
    #[serde(default)]
    country: Vec<CountryProbability>,
}

#[derive(Debug, Deserialize)]
struct CountryProbability {
    country_id: String,
    #[serde(default)]
    probability: f64,
}

#[derive(Debug, Deserialize)]
struct SexResponse {
    gender: Option<String>,
}

/// Enrichment over the agify / nationalize / genderize HTTP APIs
pub struct HttpEnrichmentGateway {
    client: Client,
    age_url: Url,
    nationality_url: Url,
    sex_url: Url,
}

impl HttpEnrichmentGateway {
    pub fn new(
        age_url: Url,
        nationality_url: Url,
        sex_url: Url,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            age_url,
            nationality_url,
            sex_url,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            config.age_api_url.clone(),
            config.nationality_api_url.clone(),
            config.sex_api_url.clone(),
            config.enrichment_timeout,
        )
    }

    /// GET `base?name=<name>` and decode the JSON body
    async fn lookup<T: DeserializeOwned>(&self, base: &Url, name: &str) -> AppResult<T> {
        let mut url = base.clone();
        url.query_pairs_mut().append_pair("name", name);
        tracing::debug!(url = %url, "Requesting enrichment lookup");

        let response = self.client.get(url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(AppError::Enrichment(format!(
                "unexpected status code: {}",
                response.status()
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl EnrichmentGateway for HttpEnrichmentGateway {
    async fn age(&self, name: &str) -> AppResult<Option<i32>> {
        let body: AgeResponse = self.lookup(&self.age_url, name).await?;
        Ok(body.age)
    }

    async fn nationality(&self, name: &str) -> AppResult<Option<String>> {
        let body: NationalityResponse = self.lookup(&self.nationality_url, name).await?;

        Ok(body
            .country
            .into_iter()
            .filter(|c| !c.country_id.is_empty())
            .max_by(|a, b| a.probability.total_cmp(&b.probability))
            .map(|c| c.country_id))
    }

    async fn sex(&self, name: &str) -> AppResult<Option<Sex>> {
        let body: SexResponse = self.lookup(&self.sex_url, name).await?;
        Ok(body.gender.and_then(|g| g.parse().ok()))
    }
}
