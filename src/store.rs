//! Single source of truth for dashboard state.
//!
//! [`Store`] is a cheap cloneable handle. The orchestrator mutates it from the
//! completion of each operation; consumers read owned snapshots. The lock is
//! never held across an await point.

use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;

use crate::model::{
    ComparisonResult, CountryStat, PandemicSummary, Prediction, Region, TimelinePoint,
};

/// Independent per-operation loading flags. All start lowered and are raised
/// only while an operation is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFlags {
    pub pandemics: bool,
    pub regions: bool,
    pub pandemic_data: bool,
    pub timeline_data: bool,
    pub comparison_data: bool,
    /// Shared by the list fetches, the simple comparison and predictions.
    /// Starts `false`, not raised in anticipation of a first load.
    pub global: bool,
}

/// Names one loading flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Pandemics,
    Regions,
    PandemicData,
    TimelineData,
    ComparisonData,
    Global,
}

impl LoadingFlags {
    pub fn set(&mut self, flag: Flag, value: bool) {
        let slot = match flag {
            Flag::Pandemics => &mut self.pandemics,
            Flag::Regions => &mut self.regions,
            Flag::PandemicData => &mut self.pandemic_data,
            Flag::TimelineData => &mut self.timeline_data,
            Flag::ComparisonData => &mut self.comparison_data,
            Flag::Global => &mut self.global,
        };
        *slot = value;
    }

    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Pandemics => self.pandemics,
            Flag::Regions => self.regions,
            Flag::PandemicData => self.pandemic_data,
            Flag::TimelineData => self.timeline_data,
            Flag::ComparisonData => self.comparison_data,
            Flag::Global => self.global,
        }
    }

    pub fn any(&self) -> bool {
        self.pandemics
            || self.regions
            || self.pandemic_data
            || self.timeline_data
            || self.comparison_data
            || self.global
    }
}

/// Everything a consumer can observe.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub pandemics: Vec<PandemicSummary>,
    pub regions: Vec<Region>,
    pub selected_pandemic: Option<PandemicSummary>,
    pub selected_region: Option<Region>,
    /// Compact country view (at most ten rows).
    pub countries: Vec<CountryStat>,
    pub all_countries: Vec<CountryStat>,
    pub timeline: Vec<TimelinePoint>,
    pub comparison: Option<ComparisonResult>,
    pub predictions: Vec<Prediction>,
    pub loading: LoadingFlags,
    pub error: Option<String>,
    /// Bumped on every write of `comparison`.
    #[serde(skip)]
    pub comparison_version: u64,
}

impl DashboardState {
    pub fn set_comparison(&mut self, comparison: Option<ComparisonResult>) {
        self.comparison = comparison;
        self.comparison_version += 1;
    }
}

/// Shared handle over [`DashboardState`].
#[derive(Clone)]
pub struct Store {
    state: Arc<RwLock<DashboardState>>,
    region_tx: Arc<watch::Sender<Option<Region>>>,
}

impl Store {
    pub fn new(initial_region: Option<Region>) -> Self {
        let state = DashboardState {
            selected_region: initial_region.clone(),
            ..DashboardState::default()
        };
        let (region_tx, _) = watch::channel(initial_region);
        Self {
            state: Arc::new(RwLock::new(state)),
            region_tx: Arc::new(region_tx),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, DashboardState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DashboardState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `f` under the write lock.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> R {
        f(&mut self.write())
    }

    /// Reads through `f` under the read lock.
    pub fn view<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        f(&self.read())
    }

    pub fn snapshot(&self) -> DashboardState {
        self.read().clone()
    }

    pub fn pandemics(&self) -> Vec<PandemicSummary> {
        self.view(|s| s.pandemics.clone())
    }

    pub fn regions(&self) -> Vec<Region> {
        self.view(|s| s.regions.clone())
    }

    pub fn selected_pandemic(&self) -> Option<PandemicSummary> {
        self.view(|s| s.selected_pandemic.clone())
    }

    pub fn selected_region(&self) -> Option<Region> {
        self.view(|s| s.selected_region.clone())
    }

    pub fn countries(&self) -> Vec<CountryStat> {
        self.view(|s| s.countries.clone())
    }

    pub fn all_countries(&self) -> Vec<CountryStat> {
        self.view(|s| s.all_countries.clone())
    }

    pub fn timeline(&self) -> Vec<TimelinePoint> {
        self.view(|s| s.timeline.clone())
    }

    pub fn comparison(&self) -> Option<ComparisonResult> {
        self.view(|s| s.comparison.clone())
    }

    pub fn predictions(&self) -> Vec<Prediction> {
        self.view(|s| s.predictions.clone())
    }

    pub fn loading(&self) -> LoadingFlags {
        self.view(|s| s.loading)
    }

    pub fn error(&self) -> Option<String> {
        self.view(|s| s.error.clone())
    }

    pub fn set_selected_pandemic(&self, pandemic: Option<PandemicSummary>) {
        self.update(|s| s.selected_pandemic = pandemic);
    }

    /// Stores the region and notifies region watchers, even when the value is
    /// unchanged.
    pub fn set_selected_region(&self, region: Option<Region>) {
        self.update(|s| s.selected_region = region.clone());
        self.region_tx.send_replace(region);
    }

    /// A receiver that wakes on every [`Store::set_selected_region`].
    pub fn subscribe_region(&self) -> watch::Receiver<Option<Region>> {
        self.region_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: i64) -> Region {
        Region {
            id,
            name: format!("R{id}"),
            continent_name: None,
            coordinates: None,
        }
    }

    #[test]
    fn test_flags_are_independent() {
        let mut flags = LoadingFlags::default();
        flags.set(Flag::TimelineData, true);
        assert!(flags.get(Flag::TimelineData));
        assert!(!flags.get(Flag::Global));
        assert!(!flags.get(Flag::PandemicData));
        assert!(flags.any());
        flags.set(Flag::TimelineData, false);
        assert!(!flags.any());
    }

    #[test]
    fn test_new_store_is_not_loading() {
        let store = Store::new(None);
        assert_eq!(store.loading(), LoadingFlags::default());
        assert!(!store.loading().global);
        assert!(!store.loading().any());
    }

    #[test]
    fn test_comparison_version_bumps_on_every_write() {
        let store = Store::new(None);
        let v0 = store.view(|s| s.comparison_version);
        store.update(|s| s.set_comparison(None));
        store.update(|s| s.set_comparison(Some(ComparisonResult::default())));
        assert_eq!(store.view(|s| s.comparison_version), v0 + 2);
    }

    #[tokio::test]
    async fn test_region_change_notifies_subscribers() {
        let store = Store::new(Some(region(1)));
        let mut rx = store.subscribe_region();
        assert_eq!(store.selected_region(), Some(region(1)));

        store.set_selected_region(Some(region(2)));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(region(2)));
        assert_eq!(store.selected_region(), Some(region(2)));
    }
}
