//! Chart-ready data and static chart configuration.
//!
//! Everything here serializes to the JSON shape chart widgets consume
//! (`labels` + `datasets`, camelCase option keys). Formatter callbacks the
//! widgets invoke are exposed as plain methods on the option types.

use serde::Serialize;

use crate::format::{bar_tooltip_label, doughnut_tooltip_label, tick_label};

pub const CASES_COLOR: &str = "#42A5F5";
pub const DEATHS_COLOR: &str = "#FF6384";
pub const RECOVERED_COLOR: &str = "#4BC0C0";
pub const MORTALITY_PALETTE: [&str; 2] = ["#FF6384", "#36A2EB"];

/// Either one color for the whole series or one per data point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Single(String),
    PerPoint(Vec<String>),
}

impl From<&str> for ColorSpec {
    fn from(color: &str) -> Self {
        ColorSpec::Single(color.to_string())
    }
}

impl From<&[&str]> for ColorSpec {
    fn from(colors: &[&str]) -> Self {
        ColorSpec::PerPoint(colors.iter().map(|c| c.to_string()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<f64>,
    pub background_color: ColorSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover_background_color: Option<ColorSpec>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.datasets.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub position: LegendPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    pub begin_at_zero: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scales {
    pub y: Axis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plugins {
    pub legend: Legend,
}

/// Options for the cases/deaths/recovered bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarOptions {
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
    pub scales: Scales,
    pub plugins: Plugins,
}

impl Default for BarOptions {
    fn default() -> Self {
        Self {
            responsive: true,
            maintain_aspect_ratio: false,
            scales: Scales {
                y: Axis {
                    begin_at_zero: true,
                },
            },
            plugins: Plugins {
                legend: Legend {
                    position: LegendPosition::Top,
                },
            },
        }
    }
}

impl BarOptions {
    /// Y axis tick text.
    pub fn tick(&self, value: f64) -> String {
        tick_label(value)
    }

    pub fn tooltip(&self, dataset_label: Option<&str>, raw: f64) -> String {
        bar_tooltip_label(dataset_label, raw)
    }
}

/// Options for the mortality doughnut chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoughnutOptions {
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
    pub cutout: String,
    pub plugins: Plugins,
}

impl Default for DoughnutOptions {
    fn default() -> Self {
        Self {
            responsive: true,
            maintain_aspect_ratio: false,
            cutout: "70%".to_string(),
            plugins: Plugins {
                legend: Legend {
                    position: LegendPosition::Bottom,
                },
            },
        }
    }
}

impl DoughnutOptions {
    pub fn tooltip(&self, label: &str, raw: f64) -> String {
        doughnut_tooltip_label(label, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bar_options_shape() {
        let value = serde_json::to_value(BarOptions::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "responsive": true,
                "maintainAspectRatio": false,
                "scales": { "y": { "beginAtZero": true } },
                "plugins": { "legend": { "position": "top" } }
            })
        );
    }

    #[test]
    fn test_doughnut_options_shape() {
        let value = serde_json::to_value(DoughnutOptions::default()).unwrap();
        assert_eq!(value["cutout"], "70%");
        assert_eq!(value["plugins"]["legend"]["position"], "bottom");
    }

    #[test]
    fn test_option_callbacks() {
        let bar = BarOptions::default();
        assert_eq!(bar.tick(1_500_000.0), "1.5 M");
        assert_eq!(bar.tooltip(Some("Total cases"), 8096.0), "Total cases: 8\u{202f}096");
        assert_eq!(DoughnutOptions::default().tooltip("COVID", 0.98), "COVID: 0.98%");
    }

    #[test]
    fn test_color_spec_serialization() {
        let single = serde_json::to_value(ColorSpec::from(CASES_COLOR)).unwrap();
        assert_eq!(single, json!("#42A5F5"));
        let many = serde_json::to_value(ColorSpec::from(&MORTALITY_PALETTE[..])).unwrap();
        assert_eq!(many, json!(["#FF6384", "#36A2EB"]));
    }
}
