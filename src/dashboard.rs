//! Fetch orchestration over the shared [`Store`].
//!
//! Every fetch follows the same protocol: raise its loading flags (and clear
//! the error slot when the operation does so), issue one request, then either
//! replace its result slot wholesale or record the failure and reset the
//! slot. Loading flags drop on every exit path. Operations whose required
//! selection is missing return before touching any state.
//!
//! Failures never propagate to the caller; they land in the single error
//! slot, last write wins.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, warn};

use crate::charts::{BarOptions, ChartData, DoughnutOptions};
use crate::derive::{self, Memo, PandemicStatRow};
use crate::error::FetchError;
use crate::format::DateFormatter;
use crate::geo::CoordinateTable;
use crate::model::{ComparisonRegion, ComparisonResult, PandemicSummary, Region};
use crate::regions::RegionCatalog;
use crate::services::stats_api::StatsApi;
use crate::store::{DashboardState, Flag, Store};

/// The two pandemics every comparison juxtaposes.
///
/// The full comparison resolves ids by name from the loaded pandemic list;
/// the simple one uses the ids directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonPair {
    pub first_name: String,
    pub second_name: String,
    pub first_id: i64,
    pub second_id: i64,
}

impl Default for ComparisonPair {
    fn default() -> Self {
        Self {
            first_name: derive::DEFAULT_FIRST_NAME.to_string(),
            second_name: derive::DEFAULT_SECOND_NAME.to_string(),
            first_id: 1,
            second_id: 2,
        }
    }
}

/// Injectable data and formatting the dashboard works with.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub regions: RegionCatalog,
    pub coordinates: CoordinateTable,
    pub dates: DateFormatter,
    pub unspecified_continent: String,
    pub comparison: ComparisonPair,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            regions: RegionCatalog::builtin(),
            coordinates: CoordinateTable::builtin(),
            dates: DateFormatter::default(),
            unspecified_continent: "unspecified".to_string(),
            comparison: ComparisonPair::default(),
        }
    }
}

/// The fetch operations, used for flags, messages, and request sequencing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Pandemics,
    Regions,
    PandemicData,
    Timeline,
    Comparison,
    ComparisonSimple,
    Predictions,
}

const OPERATION_COUNT: usize = 7;

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Pandemics => "pandemics",
            Operation::Regions => "regions",
            Operation::PandemicData => "pandemic_data",
            Operation::Timeline => "timeline",
            Operation::Comparison => "comparison",
            Operation::ComparisonSimple => "comparison_simple",
            Operation::Predictions => "predictions",
        }
    }

    /// Prefix of the error message shown when this operation fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::Pandemics => "Error while loading pandemics",
            Operation::Regions => "Error while loading regions",
            Operation::PandemicData | Operation::ComparisonSimple => "Error while loading data",
            Operation::Timeline => "Error while loading the timeline",
            Operation::Comparison => "Error while loading comparison data",
            Operation::Predictions => "Error while loading prediction data",
        }
    }

    fn flags(self) -> &'static [Flag] {
        match self {
            Operation::Pandemics => &[Flag::Pandemics, Flag::Global],
            Operation::Regions => &[Flag::Regions, Flag::Global],
            Operation::PandemicData => &[Flag::PandemicData],
            Operation::Timeline => &[Flag::TimelineData],
            Operation::Comparison => &[Flag::ComparisonData],
            Operation::ComparisonSimple | Operation::Predictions => &[Flag::Global],
        }
    }

    /// Whether the operation clears the error slot before its request.
    fn clears_error(self) -> bool {
        matches!(
            self,
            Operation::PandemicData | Operation::ComparisonSimple | Operation::Predictions
        )
    }
}

/// Issued/completed request counters for one operation kind.
#[derive(Debug, Default)]
struct RequestSequence {
    issued: AtomicU64,
    completed: AtomicU64,
}

#[derive(Debug, Default)]
struct DerivedViews {
    stats: Memo<Vec<PandemicStatRow>>,
    cases_deaths: Memo<ChartData>,
    mortality: Memo<ChartData>,
}

/// Aborts the region watcher when dropped.
pub struct RegionWatch(JoinHandle<()>);

impl RegionWatch {
    pub fn abort(&self) {
        self.0.abort();
    }
}

impl Drop for RegionWatch {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Orchestrates the statistics fetches and exposes derived views.
///
/// Cloning is cheap; clones share the same store, settings, and caches.
pub struct Dashboard<A> {
    api: Arc<A>,
    store: Store,
    settings: Arc<DashboardSettings>,
    external_region: bool,
    derived: Arc<Mutex<DerivedViews>>,
    sequences: Arc<[RequestSequence; OPERATION_COUNT]>,
}

impl<A> Clone for Dashboard<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            store: self.store.clone(),
            settings: Arc::clone(&self.settings),
            external_region: self.external_region,
            derived: Arc::clone(&self.derived),
            sequences: Arc::clone(&self.sequences),
        }
    }
}

impl<A: StatsApi> Dashboard<A> {
    /// Creates a dashboard. `initial_region` is an externally supplied
    /// selection; without one the first predefined region is selected.
    pub fn new(api: A, settings: DashboardSettings, initial_region: Option<Region>) -> Self {
        let external_region = initial_region.is_some();
        let region = initial_region.or_else(|| settings.regions.first().cloned());
        let store = Store::new(region);
        let regions = settings.regions.normalized(&settings.unspecified_continent);
        store.update(|s| s.regions = regions);

        Self {
            api: Arc::new(api),
            store,
            settings: Arc::new(settings),
            external_region,
            derived: Arc::new(Mutex::new(DerivedViews::default())),
            sequences: Arc::new(Default::default()),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> DashboardState {
        self.store.snapshot()
    }

    // -- selection ----------------------------------------------------------

    /// Sets the selected pandemic. Nothing is refetched automatically.
    pub fn select_pandemic(&self, pandemic: Option<PandemicSummary>) {
        self.store.set_selected_pandemic(pandemic);
    }

    /// Selects a pandemic from the loaded list. Returns `false` if unknown.
    pub fn select_pandemic_by_id(&self, id: i64) -> bool {
        let found = self
            .store
            .view(|s| s.pandemics.iter().find(|p| p.id == id).cloned());
        let known = found.is_some();
        if known {
            self.select_pandemic(found);
        }
        known
    }

    /// Sets the selected region and wakes the region watcher.
    pub fn select_region(&self, region: Region) {
        self.store.set_selected_region(Some(region));
    }

    /// Selects a region from the loaded list (or the catalog before regions
    /// are loaded). Returns `false` if unknown.
    pub fn select_region_by_id(&self, id: i64) -> bool {
        let found = self
            .store
            .view(|s| s.regions.iter().find(|r| r.id == id).cloned())
            .or_else(|| self.settings.regions.find(id).cloned());
        match found {
            Some(region) => {
                self.select_region(region);
                true
            }
            None => false,
        }
    }

    // -- protocol -----------------------------------------------------------

    fn begin(&self, op: Operation) -> u64 {
        self.store.update(|s| {
            for flag in op.flags() {
                s.loading.set(*flag, true);
            }
            if op.clears_error() {
                s.error = None;
            }
        });
        self.sequences[op as usize].issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Runs one request under the shared protocol.
    ///
    /// `apply` stores a successful result; `reset` empties the slot after a
    /// failure. Both run under the same write as the flag reset.
    async fn run<T, Fut>(
        &self,
        op: Operation,
        request: Fut,
        apply: impl FnOnce(&mut DashboardState, T),
        reset: impl FnOnce(&mut DashboardState),
    ) -> bool
    where
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let ticket = self.begin(op);
        let outcome = request.await;

        let newest = self.sequences[op as usize]
            .completed
            .fetch_max(ticket, Ordering::SeqCst);
        if newest > ticket {
            warn!(
                operation = op.name(),
                ticket, newest, "Response arrived after a newer request completed; applying it"
            );
        }

        let ok = outcome.is_ok();
        self.store.update(|s| {
            match outcome {
                Ok(value) => apply(s, value),
                Err(err) => {
                    error!(operation = op.name(), error = %err, "Fetch failed");
                    s.error = Some(format!("{}: {}", op.failure_message(), err));
                    reset(s);
                }
            }
            for flag in op.flags() {
                s.loading.set(*flag, false);
            }
        });
        ok
    }

    // -- operations ---------------------------------------------------------

    /// Loads the pandemic list and selects the first entry if nothing is
    /// selected yet. An empty list is a valid result.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_pandemics(&self) {
        let ok = self
            .run(
                Operation::Pandemics,
                self.api.list_pandemics(),
                |s, pandemics| {
                    if s.selected_pandemic.is_none() {
                        s.selected_pandemic = pandemics.first().cloned();
                    }
                    s.pandemics = pandemics;
                },
                |s| s.pandemics.clear(),
            )
            .await;
        if ok {
            info!(count = self.store.view(|s| s.pandemics.len()), "Pandemics loaded");
        }
    }

    /// Loads the predefined region catalog. No network request is made.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_regions(&self) {
        let regions = self
            .settings
            .regions
            .normalized(&self.settings.unspecified_continent);
        let external = self.external_region;

        self.run(
            Operation::Regions,
            async move { Ok::<_, FetchError>(regions) },
            |s, regions| {
                if !external && s.selected_region.is_none() {
                    s.selected_region = regions.first().cloned();
                }
                s.regions = regions;
            },
            |s| s.regions.clear(),
        )
        .await;
        debug!(count = self.store.view(|s| s.regions.len()), "Regions loaded");
    }

    /// Loads per-country statistics for the selected pandemic.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_pandemic_data(&self) {
        let Some(pandemic) = self.store.selected_pandemic() else {
            debug!("No pandemic selected; skipping country stats");
            return;
        };

        let request = async {
            let records = self.api.stats_by_pandemic(pandemic.id).await?;
            if records.is_empty() {
                return Err(FetchError::empty("country statistics"));
            }
            Ok::<_, FetchError>(derive::country_views(records, &self.settings.coordinates))
        };

        let ok = self
            .run(
                Operation::PandemicData,
                request,
                |s, views| {
                    s.all_countries = views.all;
                    s.countries = views.top;
                },
                |s| {
                    s.countries.clear();
                    s.all_countries.clear();
                },
            )
            .await;
        if ok {
            info!(
                pandemic_id = pandemic.id,
                countries = self.store.view(|s| s.all_countries.len()),
                "Country stats loaded"
            );
        }
    }

    /// Loads the timeline of the selected pandemic in the selected region.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_timeline_data(&self) {
        let selection = self
            .store
            .view(|s| Some((s.selected_pandemic.clone()?, s.selected_region.clone()?)));
        let Some((pandemic, region)) = selection else {
            debug!("Pandemic or region missing; skipping timeline");
            return;
        };

        let request = async {
            let records = self.api.timeline(pandemic.id, region.id).await?;
            if records.is_empty() {
                return Err(FetchError::empty("timeline data"));
            }
            Ok::<_, FetchError>(derive::timeline_points(records, &self.settings.dates))
        };

        let ok = self
            .run(
                Operation::Timeline,
                request,
                |s, points| s.timeline = points,
                |s| s.timeline.clear(),
            )
            .await;
        if ok {
            info!(
                pandemic_id = pandemic.id,
                region_id = region.id,
                points = self.store.view(|s| s.timeline.len()),
                "Timeline loaded"
            );
        }
    }

    /// Resolves the comparison pair by name within the loaded pandemic list,
    /// then loads their comparison in the selected region.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_comparison_data(&self) {
        let Some(region) = self.store.selected_region() else {
            debug!("No region selected; skipping comparison");
            return;
        };
        let pair = &self.settings.comparison;

        let request = async {
            let pandemics = self.store.pandemics();
            let first_id = resolve_pandemic(&pandemics, &pair.first_name)?;
            let second_id = resolve_pandemic(&pandemics, &pair.second_name)?;

            let response = self.api.compare(first_id, second_id, region.id).await;
            let mut comparison = require_comparison(response?)?;
            comparison.pandemic1_id = Some(first_id);
            comparison.pandemic2_id = Some(second_id);
            Ok::<_, FetchError>(comparison)
        };

        let ok = self
            .run(
                Operation::Comparison,
                request,
                |s, comparison| s.set_comparison(Some(comparison)),
                |s| s.set_comparison(None),
            )
            .await;
        if ok {
            info!(region_id = region.id, "Comparison loaded");
        }
    }

    /// Loads the comparison for the configured pandemic ids directly. The
    /// result's region is replaced by the full selected region.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_comparison_data_simple(&self) {
        let Some(region) = self.store.selected_region() else {
            debug!("No region selected; skipping comparison");
            return;
        };
        let pair = &self.settings.comparison;

        let request = async {
            let response = self
                .api
                .compare(pair.first_id, pair.second_id, region.id)
                .await;
            let mut comparison = require_comparison(response?)?;
            comparison.region = Some(ComparisonRegion::Detailed(region.clone()));
            Ok::<_, FetchError>(comparison)
        };

        let ok = self
            .run(
                Operation::ComparisonSimple,
                request,
                |s, comparison| s.set_comparison(Some(comparison)),
                |s| s.set_comparison(None),
            )
            .await;
        if ok {
            info!(region_id = region.id, "Comparison loaded");
        }
    }

    /// Loads model predictions. An empty list is a failure.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_predictions(&self) {
        let request = async {
            let predictions = self.api.predictions().await?;
            if predictions.is_empty() {
                return Err(FetchError::empty("prediction data"));
            }
            Ok::<_, FetchError>(predictions)
        };

        let ok = self
            .run(
                Operation::Predictions,
                request,
                |s, predictions| s.predictions = predictions,
                |s| s.predictions.clear(),
            )
            .await;
        if ok {
            info!(
                count = self.store.view(|s| s.predictions.len()),
                "Predictions loaded"
            );
        }
    }

    /// Initial load when an external region was supplied.
    pub async fn mount(&self) {
        if self.external_region {
            self.fetch_comparison_data_simple().await;
        }
    }

    // -- derived views ------------------------------------------------------

    fn lock_derived(&self) -> MutexGuard<'_, DerivedViews> {
        self.derived.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_stats<R>(
        &self,
        f: impl FnOnce(&mut DerivedViews, u64, Arc<Vec<PandemicStatRow>>) -> R,
    ) -> R {
        let mut views = self.lock_derived();
        let dates = &self.settings.dates;
        let (version, stats) = self.store.view(|s| {
            let stats = views.stats.get_or_compute(s.comparison_version, || {
                derive::pandemic_stats(s.comparison.as_ref(), dates)
            });
            (s.comparison_version, stats)
        });
        f(&mut views, version, stats)
    }

    /// The two summary rows of the active comparison (empty without one).
    pub fn pandemic_stats(&self) -> Arc<Vec<PandemicStatRow>> {
        self.with_stats(|_, _, stats| stats)
    }

    pub fn cases_deaths_data(&self) -> Arc<ChartData> {
        self.with_stats(|views, version, stats| {
            views
                .cases_deaths
                .get_or_compute(version, || derive::cases_deaths_data(&stats))
        })
    }

    pub fn mortality_data(&self) -> Arc<ChartData> {
        self.with_stats(|views, version, stats| {
            views
                .mortality
                .get_or_compute(version, || derive::mortality_data(&stats))
        })
    }

    pub fn bar_options(&self) -> BarOptions {
        BarOptions::default()
    }

    pub fn doughnut_options(&self) -> DoughnutOptions {
        DoughnutOptions::default()
    }
}

impl<A: StatsApi + 'static> Dashboard<A> {
    /// Spawns a task that runs [`Dashboard::fetch_comparison_data_simple`]
    /// whenever the selected region changes. Each refetch runs on its own
    /// task, so a pending one never delays the next. Dropping the returned
    /// handle stops watching.
    pub fn spawn_region_watch(&self) -> RegionWatch {
        let mut changes = self.store.subscribe_region();
        let dashboard = self.clone();

        let handle = tokio::spawn(
            async move {
                while changes.changed().await.is_ok() {
                    let region_id = changes.borrow_and_update().as_ref().map(|r| r.id);
                    debug!(?region_id, "Selected region changed");
                    let dashboard = dashboard.clone();
                    tokio::spawn(async move { dashboard.fetch_comparison_data_simple().await });
                }
            }
            .instrument(tracing::info_span!("region_watch")),
        );
        RegionWatch(handle)
    }
}

/// Finds the first pandemic whose name contains `name`.
fn resolve_pandemic(pandemics: &[PandemicSummary], name: &str) -> Result<i64, FetchError> {
    pandemics
        .iter()
        .find(|p| p.name.contains(name))
        .map(|p| p.id)
        .ok_or_else(|| FetchError::unresolved(name))
}

fn require_comparison(response: Option<ComparisonResult>) -> Result<ComparisonResult, FetchError> {
    response
        .filter(|c| !c.is_empty())
        .ok_or_else(|| FetchError::empty("comparison data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pandemic(id: i64, name: &str) -> PandemicSummary {
        PandemicSummary {
            id,
            name: name.to_string(),
            total_cases: 0,
            total_deaths: 0,
            mortality_rate: 0.0,
            affected_regions: Default::default(),
        }
    }

    #[test]
    fn test_resolve_pandemic_by_substring() {
        let list = vec![pandemic(4, "SARS-CoV-1"), pandemic(9, "COVID-19")];
        assert_eq!(resolve_pandemic(&list, "SARS").unwrap(), 4);
        assert_eq!(resolve_pandemic(&list, "COVID").unwrap(), 9);
        assert!(matches!(
            resolve_pandemic(&list, "H1N1"),
            Err(FetchError::Unresolved { .. })
        ));
    }

    #[test]
    fn test_require_comparison_rejects_absent_and_empty() {
        assert!(matches!(
            require_comparison(None),
            Err(FetchError::EmptyResult { .. })
        ));
        assert!(matches!(
            require_comparison(Some(ComparisonResult::default())),
            Err(FetchError::EmptyResult { .. })
        ));
        let filled = ComparisonResult {
            pandemic1: Some("SARS".into()),
            ..ComparisonResult::default()
        };
        assert!(require_comparison(Some(filled)).is_ok());
    }

    #[test]
    fn test_operation_flags_and_error_clearing() {
        assert_eq!(
            Operation::Pandemics.flags(),
            &[Flag::Pandemics, Flag::Global]
        );
        assert_eq!(Operation::Comparison.flags(), &[Flag::ComparisonData]);
        assert!(Operation::PandemicData.clears_error());
        assert!(Operation::ComparisonSimple.clears_error());
        assert!(!Operation::Timeline.clears_error());
        assert!(!Operation::Comparison.clears_error());
        assert!(!Operation::Pandemics.clears_error());
    }
}
