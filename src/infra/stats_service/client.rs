use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::FetchError;
use crate::fetch::{HttpClient, fetch_json};
use crate::model::{
    ComparisonResult, CountryStatRecord, PandemicSummary, Prediction, TimelineRecord,
};
use crate::services::stats_api::StatsApi;

/// [`StatsApi`] over HTTP, rooted at `base_url`.
pub struct HttpStatsApi<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> HttpStatsApi<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET");
        fetch_json(&self.client, &url).await
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, FetchError> {
        Ok(self.get::<Vec<T>>(path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl<C: HttpClient> StatsApi for HttpStatsApi<C> {
    async fn list_pandemics(&self) -> Result<Vec<PandemicSummary>, FetchError> {
        self.get_list("/api/pandemics").await
    }

    async fn stats_by_pandemic(
        &self,
        pandemic_id: i64,
    ) -> Result<Vec<CountryStatRecord>, FetchError> {
        self.get_list(&format!("/api/stats/by-pandemic/{pandemic_id}"))
            .await
    }

    async fn timeline(
        &self,
        pandemic_id: i64,
        region_id: i64,
    ) -> Result<Vec<TimelineRecord>, FetchError> {
        self.get_list(&format!("/api/stats/timeline/{pandemic_id}/{region_id}"))
            .await
    }

    async fn compare(
        &self,
        first_id: i64,
        second_id: i64,
        region_id: i64,
    ) -> Result<Option<ComparisonResult>, FetchError> {
        self.get(&format!(
            "/api/stats/compare/{first_id}/{second_id}/{region_id}"
        ))
        .await
    }

    async fn predictions(&self) -> Result<Vec<Prediction>, FetchError> {
        self.get_list("/api/predictions").await
    }
}
