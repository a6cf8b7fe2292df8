//! Street network and tag sources backed by OpenStreetMap data.

mod overpass;
mod pbf;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::graph::StreetGraph;

pub use overpass::OverpassClient;
pub use pbf::PbfExtracts;

/// A `key=value` OSM tag used to look features up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsmTag {
    pub key: &'static str,
    pub value: &'static str,
}

pub const TRAFFIC_SIGNALS: OsmTag = OsmTag {
    key: "highway",
    value: "traffic_signals",
};

/// Which ways make it into the street graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    /// Roads open to motor vehicles.
    #[default]
    Drive,
    /// Every `highway=*` way.
    All,
}

const DRIVABLE: [&str; 16] = [
    "motorway",
    "motorway_link",
    "trunk",
    "trunk_link",
    "primary",
    "primary_link",
    "secondary",
    "secondary_link",
    "tertiary",
    "tertiary_link",
    "unclassified",
    "residential",
    "living_street",
    "road",
    "busway",
    "service",
];

impl NetworkMode {
    /// Whether a way with this `highway` value belongs to the network.
    pub fn accepts(self, highway: &str) -> bool {
        match self {
            NetworkMode::Drive => highway
                .split(';')
                .any(|value| DRIVABLE.contains(&value.trim())),
            NetworkMode::All => !highway.is_empty(),
        }
    }

    /// Overpass QL filter selecting the same ways as [`NetworkMode::accepts`].
    pub fn overpass_filter(self) -> String {
        match self {
            NetworkMode::Drive => format!(r#"["highway"~"^({})$"]"#, DRIVABLE.join("|")),
            NetworkMode::All => r#"["highway"]"#.to_string(),
        }
    }
}

/// Supplies the street network of a place.
pub trait GraphProvider {
    /// # Errors
    ///
    /// Returns an error when the network cannot be obtained; the analysis
    /// cannot proceed without it.
    fn fetch_graph(&self, place: &str, mode: NetworkMode) -> Result<StreetGraph>;
}

/// Counts OSM features carrying a tag within a place.
pub trait SignalProvider {
    /// # Errors
    ///
    /// Returns an error when the source is unreachable or the place unknown.
    fn count_tagged(&self, place: &str, tag: OsmTag) -> Result<usize>;
}
