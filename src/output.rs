//! Output formatting and persistence for dashboard data.
//!
//! Supports pretty JSON on stdout and CSV append.

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::debug;

use crate::model::CountryStat;

/// Flat CSV shape of a [`CountryStat`].
#[derive(Debug, Serialize)]
pub struct CountryCsvRow<'a> {
    pub region: &'a str,
    pub region_id: Option<i64>,
    pub cases: i64,
    pub deaths: i64,
    pub recovered: Option<i64>,
    pub mortality_rate: f64,
    pub lon: f64,
    pub lat: f64,
}

impl<'a> From<&'a CountryStat> for CountryCsvRow<'a> {
    fn from(c: &'a CountryStat) -> Self {
        Self {
            region: &c.region,
            region_id: c.region_id,
            cases: c.cases,
            deaths: c.deaths,
            recovered: c.recovered,
            mortality_rate: c.mortality_rate(),
            lon: c.coords.lon,
            lat: c.coords.lat,
        }
    }
}

/// Writes `value` to stdout as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends `rows` to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = rows.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Appends country rows in their flat CSV shape.
pub fn append_countries(path: &str, countries: &[CountryStat]) -> Result<()> {
    let rows: Vec<CountryCsvRow<'_>> = countries.iter().map(CountryCsvRow::from).collect();
    append_records(path, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, TimelinePoint};
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn country(region: &str, cases: i64) -> CountryStat {
        CountryStat {
            region: region.to_string(),
            region_id: Some(1),
            cases,
            deaths: cases / 4,
            recovered: None,
            date: None,
            coords: Coordinates::new(2.2137, 46.2276),
        }
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&country("France", 100)).unwrap();
    }

    #[test]
    fn test_append_countries_creates_file() {
        let path = temp_path("pandemic_compare_test_create.csv");
        let _ = fs::remove_file(&path); // clean up any prior run

        append_countries(&path, &[country("France", 100)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines[0],
            "region,region_id,cases,deaths,recovered,mortality_rate,lon,lat"
        );
        assert_eq!(lines[1], "France,1,100,25,,25.0,2.2137,46.2276");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_records_writes_header_once() {
        let path = temp_path("pandemic_compare_test_header.csv");
        let _ = fs::remove_file(&path);

        let point = TimelinePoint {
            date: "01/03/2020".to_string(),
            cases: 3,
            deaths: 0,
            recovered: Some(1),
        };
        append_records(&path, &[point.clone()]).unwrap();
        append_records(&path, &[point.clone(), point]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        // Header line should appear exactly once
        let header_count = content.lines().filter(|l| l.starts_with("date")).count();
        assert_eq!(header_count, 1);
        // 1 header + 3 data rows
        assert_eq!(content.lines().count(), 4);

        fs::remove_file(&path).unwrap();
    }
}
