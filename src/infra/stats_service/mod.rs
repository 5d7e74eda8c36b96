mod client;

pub use client::HttpStatsApi;
