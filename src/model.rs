//! Wire and display types for pandemic statistics.
//!
//! Wire types mirror the JSON the statistics service returns (camelCase,
//! nullable totals). Display types are what the dashboard stores after
//! normalization.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserializes a nullable number, treating `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Number of regions touched by a pandemic.
///
/// The service reports a count; older payloads carried the region names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AffectedRegions {
    Count(u64),
    Names(Vec<String>),
}

impl Default for AffectedRegions {
    fn default() -> Self {
        AffectedRegions::Count(0)
    }
}

impl AffectedRegions {
    pub fn len(&self) -> usize {
        match self {
            AffectedRegions::Count(n) => *n as usize,
            AffectedRegions::Names(names) => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One entry of `GET /api/pandemics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PandemicSummary {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_cases: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_deaths: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mortality_rate: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub affected_regions: AffectedRegions,
}

/// Longitude/latitude pair, serialized as `[lon, lat]` for map widgets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinates {
    pub const ORIGIN: Coordinates = Coordinates { lon: 0.0, lat: 0.0 };

    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        [c.lon, c.lat]
    }
}

/// A geographic unit the dashboard can focus on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub continent_name: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// One entry of `GET /api/stats/by-pandemic/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryStatRecord {
    pub region: String,
    #[serde(default)]
    pub region_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cases: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub deaths: i64,
    #[serde(default)]
    pub recovered: Option<i64>,
    #[serde(default)]
    pub date: Option<String>,
}

/// A country row augmented with map coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryStat {
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<i64>,
    pub cases: i64,
    pub deaths: i64,
    pub recovered: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub coords: Coordinates,
}

impl CountryStat {
    pub fn from_record(record: CountryStatRecord, coords: Coordinates) -> Self {
        Self {
            region: record.region,
            region_id: record.region_id,
            cases: record.cases,
            deaths: record.deaths,
            recovered: record.recovered,
            date: record.date,
            coords,
        }
    }

    /// Deaths per hundred cases; 0 when there are no cases.
    pub fn mortality_rate(&self) -> f64 {
        mortality_rate(self.deaths, self.cases)
    }
}

/// Deaths divided by cases, as a percentage. Returns 0 for non-positive cases.
pub fn mortality_rate(deaths: i64, cases: i64) -> f64 {
    if cases <= 0 {
        return 0.0;
    }
    deaths as f64 * 100.0 / cases as f64
}

/// One entry of `GET /api/stats/timeline/{pandemicId}/{regionId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRecord {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cases: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub deaths: i64,
    #[serde(default)]
    pub recovered: Option<i64>,
}

/// A timeline entry whose date is already formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub date: String,
    pub cases: i64,
    pub deaths: i64,
    pub recovered: Option<i64>,
}

/// Peak statistics of one pandemic within the compared region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaxStats {
    #[serde(default)]
    pub cases: Option<i64>,
    #[serde(default)]
    pub deaths: Option<i64>,
    #[serde(default)]
    pub recovered: Option<i64>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonMetrics {
    #[serde(default)]
    pub death_ratio: Option<f64>,
    #[serde(default)]
    pub mortality_rate1: Option<f64>,
    #[serde(default)]
    pub mortality_rate2: Option<f64>,
    #[serde(default)]
    pub case_ratio: Option<f64>,
}

/// The region a comparison was computed for.
///
/// The service sends the region name; the simple comparison fetch swaps it
/// for the full selected [`Region`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComparisonRegion {
    Detailed(Region),
    Name(String),
}

/// Payload of `GET /api/stats/compare/{a}/{b}/{region}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    #[serde(default)]
    pub pandemic1: Option<String>,
    #[serde(default)]
    pub pandemic2: Option<String>,
    #[serde(default)]
    pub pandemic1_id: Option<i64>,
    #[serde(default)]
    pub pandemic2_id: Option<i64>,
    #[serde(default)]
    pub pandemic1_max_stats: Option<MaxStats>,
    #[serde(default)]
    pub pandemic2_max_stats: Option<MaxStats>,
    #[serde(default)]
    pub comparison_metrics: Option<ComparisonMetrics>,
    #[serde(default)]
    pub region: Option<ComparisonRegion>,
}

impl ComparisonResult {
    /// `true` for the `{}` the service returns when the region or either
    /// pandemic is unknown.
    pub fn is_empty(&self) -> bool {
        *self == ComparisonResult::default()
    }
}

/// One entry of `GET /api/predictions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub prediction_date: Option<String>,
    #[serde(default)]
    pub region_id: Option<i64>,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub continent_name: Option<String>,
    #[serde(default)]
    pub predicted_cases: Option<i64>,
    #[serde(default)]
    pub predicted_deaths: Option<i64>,
    #[serde(default)]
    pub predicted_recovered: Option<i64>,
    #[serde(default)]
    pub model_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pandemic_summary_accepts_null_totals_and_region_count() {
        let json = r#"{"id":3,"name":"H1N1","totalCases":null,"totalDeaths":12,
            "mortalityRate":0,"affectedRegions":41}"#;
        let p: PandemicSummary = serde_json::from_str(json).unwrap();
        assert_eq!(p.total_cases, 0);
        assert_eq!(p.total_deaths, 12);
        assert_eq!(p.affected_regions, AffectedRegions::Count(41));
    }

    #[test]
    fn test_affected_regions_as_names() {
        let json = r#"{"id":1,"name":"SARS","affectedRegions":["China","Canada"]}"#;
        let p: PandemicSummary = serde_json::from_str(json).unwrap();
        assert_eq!(p.affected_regions.len(), 2);
    }

    #[test]
    fn test_empty_comparison_payload() {
        let c: ComparisonResult = serde_json::from_str("{}").unwrap();
        assert!(c.is_empty());

        let c: ComparisonResult = serde_json::from_str(r#"{"region":"France"}"#).unwrap();
        assert!(!c.is_empty());
        assert_eq!(c.region, Some(ComparisonRegion::Name("France".into())));
    }

    #[test]
    fn test_coordinates_serialize_as_pair() {
        let c = Coordinates::new(2.2137, 46.2276);
        assert_eq!(serde_json::to_string(&c).unwrap(), "[2.2137,46.2276]");
    }

    #[test]
    fn test_mortality_rate() {
        assert_eq!(mortality_rate(10, 0), 0.0);
        assert_eq!(mortality_rate(5, 100), 5.0);
        assert!((mortality_rate(774, 8096) - 9.56).abs() < 0.01);
    }
}
