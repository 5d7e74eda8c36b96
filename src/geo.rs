//! Region name → map coordinate lookup.

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::model::Coordinates;

/// Maps region names to `[lon, lat]` map positions.
///
/// Stored as a plain JSON object on disk:
/// ```json
/// {
///   "France": [2.2137, 46.2276],
///   "Japan": [138.2529, 36.2048]
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoordinateTable {
    entries: HashMap<String, Coordinates>,
}

impl CoordinateTable {
    /// Loads the table from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read coordinate table '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("invalid coordinate table '{path}'"))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: HashMap<String, Coordinates> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    /// The built-in table covering the countries the service tracks most.
    pub fn builtin() -> Self {
        let entries = [
            ("France", 2.2137, 46.2276),
            ("USA", -95.7129, 37.0902),
            ("India", 78.9629, 20.5937),
            ("Brazil", -51.9253, -14.235),
            ("Russia", 105.3188, 61.524),
            ("Germany", 10.4515, 51.1657),
            ("UK", -3.436, 55.3781),
            ("Italy", 12.5674, 41.8719),
            ("Spain", -3.7492, 40.4637),
            ("China", 104.1954, 35.8617),
            ("Japan", 138.2529, 36.2048),
            ("Australia", 133.7751, -25.2744),
        ]
        .into_iter()
        .map(|(name, lon, lat)| (name.to_string(), Coordinates::new(lon, lat)))
        .collect();
        Self { entries }
    }

    pub fn get(&self, region: &str) -> Option<Coordinates> {
        self.entries.get(region).copied()
    }

    /// Coordinates for `region`, or [`Coordinates::ORIGIN`] when unmapped.
    pub fn lookup(&self, region: &str) -> Coordinates {
        self.get(region).unwrap_or(Coordinates::ORIGIN)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let table = CoordinateTable::builtin();
        assert_eq!(table.lookup("France"), Coordinates::new(2.2137, 46.2276));
        assert_eq!(table.len(), 12);
    }

    #[test]
    fn test_unknown_region_falls_back_to_origin() {
        let table = CoordinateTable::builtin();
        assert_eq!(table.lookup("Atlantis"), Coordinates::ORIGIN);
        assert!(table.get("Atlantis").is_none());
    }

    #[test]
    fn test_from_json() {
        let table = CoordinateTable::from_json(r#"{"Peru": [-75.0152, -9.19]}"#).unwrap();
        assert_eq!(table.lookup("Peru"), Coordinates::new(-75.0152, -9.19));
        assert_eq!(table.lookup("France"), Coordinates::ORIGIN);
    }

    #[test]
    fn test_from_json_rejects_bad_shape() {
        assert!(CoordinateTable::from_json(r#"{"Peru": "nowhere"}"#).is_err());
    }
}
