//! Pure derivations from raw result slots to display-ready aggregates.
//!
//! None of these functions touch the network or the store. The dashboard
//! memoizes the comparison-based ones with [`Memo`], keyed on the comparison
//! slot's version.

use serde::Serialize;
use std::sync::Arc;

use crate::charts::{
    CASES_COLOR, ChartData, DEATHS_COLOR, Dataset, MORTALITY_PALETTE, RECOVERED_COLOR,
};
use crate::format::{DateFormatter, to_fixed};
use crate::geo::CoordinateTable;
use crate::model::{
    ComparisonMetrics, ComparisonResult, CountryStat, CountryStatRecord, MaxStats,
    TimelinePoint, TimelineRecord,
};

/// Rows shown in the compact country bar chart.
pub const TOP_COUNTRIES: usize = 10;

pub const DEFAULT_FIRST_NAME: &str = "SARS";
pub const DEFAULT_SECOND_NAME: &str = "COVID";

/// One of the two summary rows built from a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PandemicStatRow {
    pub id: u8,
    pub name: String,
    pub total_cases: i64,
    pub total_deaths: i64,
    pub mortality_rate: f64,
    pub affected_regions: Vec<String>,
    pub recovered: i64,
    pub max_date: String,
}

fn stat_row(
    id: u8,
    name: Option<&str>,
    default_name: &str,
    stats: Option<&MaxStats>,
    mortality_rate: Option<f64>,
    dates: &DateFormatter,
) -> PandemicStatRow {
    PandemicStatRow {
        id,
        name: name
            .filter(|n| !n.is_empty())
            .unwrap_or(default_name)
            .to_string(),
        total_cases: stats.and_then(|s| s.cases).unwrap_or(0),
        total_deaths: stats.and_then(|s| s.deaths).unwrap_or(0),
        mortality_rate: mortality_rate.unwrap_or(0.0),
        affected_regions: Vec::new(),
        recovered: stats.and_then(|s| s.recovered).unwrap_or(0),
        max_date: dates.long(stats.and_then(|s| s.date.as_deref())),
    }
}

/// Exactly two rows (ids 1 and 2) when a comparison is loaded, else none.
pub fn pandemic_stats(
    comparison: Option<&ComparisonResult>,
    dates: &DateFormatter,
) -> Vec<PandemicStatRow> {
    let Some(c) = comparison else {
        return Vec::new();
    };
    let metrics = c.comparison_metrics.as_ref();
    let rate = |pick: fn(&ComparisonMetrics) -> Option<f64>| metrics.and_then(pick);

    vec![
        stat_row(
            1,
            c.pandemic1.as_deref(),
            DEFAULT_FIRST_NAME,
            c.pandemic1_max_stats.as_ref(),
            rate(|m| m.mortality_rate1),
            dates,
        ),
        stat_row(
            2,
            c.pandemic2.as_deref(),
            DEFAULT_SECOND_NAME,
            c.pandemic2_max_stats.as_ref(),
            rate(|m| m.mortality_rate2),
            dates,
        ),
    ]
}

/// Three parallel series (cases, deaths, recovered) labeled by pandemic.
pub fn cases_deaths_data(stats: &[PandemicStatRow]) -> ChartData {
    if stats.is_empty() {
        return ChartData::default();
    }

    let series = |label: &str, color: &str, pick: fn(&PandemicStatRow) -> i64| Dataset {
        label: Some(label.to_string()),
        data: stats.iter().map(|s| pick(s) as f64).collect(),
        background_color: color.into(),
        hover_background_color: None,
    };

    ChartData {
        labels: stats.iter().map(|s| s.name.clone()).collect(),
        datasets: vec![
            series("Total cases", CASES_COLOR, |s| s.total_cases),
            series("Total deaths", DEATHS_COLOR, |s| s.total_deaths),
            series("Recovered", RECOVERED_COLOR, |s| s.recovered),
        ],
    }
}

/// Single mortality series; labels embed the rate to two decimals.
pub fn mortality_data(stats: &[PandemicStatRow]) -> ChartData {
    if stats.is_empty() {
        return ChartData::default();
    }

    ChartData {
        labels: stats
            .iter()
            .map(|s| format!("{} ({}%)", s.name, to_fixed(s.mortality_rate, 2)))
            .collect(),
        datasets: vec![Dataset {
            label: None,
            data: stats.iter().map(|s| s.mortality_rate).collect(),
            background_color: (&MORTALITY_PALETTE[..]).into(),
            hover_background_color: Some((&MORTALITY_PALETTE[..]).into()),
        }],
    }
}

/// Full and compact country views derived from one by-pandemic response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryViews {
    /// Every row with positive cases, in response order.
    pub all: Vec<CountryStat>,
    /// The first [`TOP_COUNTRIES`] rows of `all`.
    pub top: Vec<CountryStat>,
}

pub fn country_views(records: Vec<CountryStatRecord>, coords: &CoordinateTable) -> CountryViews {
    let all: Vec<CountryStat> = records
        .into_iter()
        .filter(|r| r.cases > 0)
        .map(|r| {
            let at = coords.lookup(&r.region);
            CountryStat::from_record(r, at)
        })
        .collect();
    let top = all.iter().take(TOP_COUNTRIES).cloned().collect();
    CountryViews { all, top }
}

/// Timeline records with dates reformatted for display, order preserved.
pub fn timeline_points(records: Vec<TimelineRecord>, dates: &DateFormatter) -> Vec<TimelinePoint> {
    records
        .into_iter()
        .map(|r| TimelinePoint {
            date: dates.short(r.date.as_deref()),
            cases: r.cases,
            deaths: r.deaths,
            recovered: r.recovered,
        })
        .collect()
}

/// A cached value tagged with the input version it was computed from.
#[derive(Debug)]
pub struct Memo<T> {
    cached: Option<(u64, Arc<T>)>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self { cached: None }
    }
}

impl<T> Memo<T> {
    /// Returns the cached value if it was computed at `version`, otherwise
    /// recomputes it with `compute`.
    pub fn get_or_compute(&mut self, version: u64, compute: impl FnOnce() -> T) -> Arc<T> {
        match &self.cached {
            Some((v, value)) if *v == version => Arc::clone(value),
            _ => {
                let value = Arc::new(compute());
                self.cached = Some((version, Arc::clone(&value)));
                value
            }
        }
    }
}
