pub mod charts;
pub mod config;
pub mod dashboard;
pub mod derive;
pub mod error;
pub mod fetch;
pub mod format;
pub mod geo;
pub mod infra;
pub mod model;
pub mod output;
pub mod regions;
pub mod services;
pub mod store;
