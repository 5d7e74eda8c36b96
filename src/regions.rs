//! The predefined set of regions the dashboard can focus on.

use anyhow::{Context, Result, bail};
use std::collections::HashSet;

use crate::model::{Coordinates, Region};

/// Static, ordered region list. Ids are unique.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    regions: Vec<Region>,
}

impl RegionCatalog {
    /// Builds a catalog, rejecting duplicate ids.
    pub fn new(regions: Vec<Region>) -> Result<Self> {
        let mut seen = HashSet::new();
        for region in &regions {
            if !seen.insert(region.id) {
                bail!("duplicate region id {} ('{}')", region.id, region.name);
            }
        }
        Ok(Self { regions })
    }

    /// Loads a JSON array of regions from `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read region catalog '{path}'"))?;
        let regions: Vec<Region> = serde_json::from_str(&content)
            .with_context(|| format!("invalid region catalog '{path}'"))?;
        Self::new(regions)
    }

    pub fn builtin() -> Self {
        let regions = [
            (1, "France", "Europe", 2.2137, 46.2276),
            (2, "USA", "North America", -95.7129, 37.0902),
            (3, "China", "Asia", 104.1954, 35.8617),
            (4, "India", "Asia", 78.9629, 20.5937),
            (5, "Brazil", "South America", -51.9253, -14.235),
            (6, "Germany", "Europe", 10.4515, 51.1657),
            (7, "UK", "Europe", -3.436, 55.3781),
            (8, "Italy", "Europe", 12.5674, 41.8719),
            (9, "Spain", "Europe", -3.7492, 40.4637),
            (10, "Russia", "Europe", 105.3188, 61.524),
            (11, "Japan", "Asia", 138.2529, 36.2048),
            (12, "Australia", "Oceania", 133.7751, -25.2744),
        ]
        .into_iter()
        .map(|(id, name, continent, lon, lat)| Region {
            id,
            name: name.to_string(),
            continent_name: Some(continent.to_string()),
            coordinates: Some(Coordinates::new(lon, lat)),
        })
        .collect();
        Self { regions }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn first(&self) -> Option<&Region> {
        self.regions.first()
    }

    pub fn find(&self, id: i64) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Copies of all regions with a missing continent replaced by `fallback`.
    pub fn normalized(&self, fallback: &str) -> Vec<Region> {
        self.regions
            .iter()
            .map(|r| Region {
                continent_name: Some(
                    r.continent_name
                        .clone()
                        .unwrap_or_else(|| fallback.to_string()),
                ),
                ..r.clone()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: i64, name: &str, continent: Option<&str>) -> Region {
        Region {
            id,
            name: name.to_string(),
            continent_name: continent.map(str::to_string),
            coordinates: None,
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = RegionCatalog::new(vec![region(1, "A", None), region(1, "B", None)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_normalized_fills_missing_continent() {
        let catalog =
            RegionCatalog::new(vec![region(1, "A", None), region(2, "B", Some("Asia"))]).unwrap();
        let regions = catalog.normalized("unspecified");
        assert_eq!(regions[0].continent_name.as_deref(), Some("unspecified"));
        assert_eq!(regions[1].continent_name.as_deref(), Some("Asia"));
    }

    #[test]
    fn test_builtin_is_ordered_and_unique() {
        let catalog = RegionCatalog::builtin();
        assert_eq!(catalog.first().map(|r| r.name.as_str()), Some("France"));
        assert!(RegionCatalog::new(catalog.regions().to_vec()).is_ok());
        assert_eq!(catalog.find(11).map(|r| r.name.as_str()), Some("Japan"));
    }
}
