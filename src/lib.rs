//! Street network classification and heuristic traffic estimation for a city.
//!
//! The street graph comes from OpenStreetMap (Overpass API or a local PBF
//! extract). Intersections are bucketed by degree, streets by type, signals
//! are counted from OSM tags and estimated from complex intersections, and a
//! congestion level is derived from the local time. Results end up in a
//! [`StatisticsRecord`], rendered as a text report and a Leaflet map.

pub mod config;
mod error;
pub mod graph;
pub mod intersections;
pub mod map;
pub mod menu;
pub mod osm;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod signals;
pub mod streets;
pub mod traffic;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use graph::StreetGraph;
pub use pipeline::{ArtifactSink, FileSink, RunOutcome, TrafficExtractor};
pub use report::StatisticsRecord;
