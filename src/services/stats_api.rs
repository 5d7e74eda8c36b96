//! Trait for the remote pandemic statistics service.

use crate::error::FetchError;
use crate::model::{
    ComparisonResult, CountryStatRecord, PandemicSummary, Prediction, TimelineRecord,
};

/// Abstraction over the statistics service.
///
/// Implementations report transport and status failures; they do not judge
/// whether an empty payload is acceptable. A `null` or empty body comes back
/// as an empty list or `None`.
#[async_trait::async_trait]
pub trait StatsApi: Send + Sync {
    /// `GET /api/pandemics`
    async fn list_pandemics(&self) -> Result<Vec<PandemicSummary>, FetchError>;

    /// `GET /api/stats/by-pandemic/{pandemic_id}`
    async fn stats_by_pandemic(
        &self,
        pandemic_id: i64,
    ) -> Result<Vec<CountryStatRecord>, FetchError>;

    /// `GET /api/stats/timeline/{pandemic_id}/{region_id}`
    async fn timeline(
        &self,
        pandemic_id: i64,
        region_id: i64,
    ) -> Result<Vec<TimelineRecord>, FetchError>;

    /// `GET /api/stats/compare/{first_id}/{second_id}/{region_id}`
    async fn compare(
        &self,
        first_id: i64,
        second_id: i64,
        region_id: i64,
    ) -> Result<Option<ComparisonResult>, FetchError>;

    /// `GET /api/predictions`
    async fn predictions(&self) -> Result<Vec<Prediction>, FetchError>;
}
