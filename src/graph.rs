use std::collections::HashMap;

use geo::Point;
use geo::prelude::*;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::{Error, Result};

pub type OsmNodeId = i64;

pub const UNCLASSIFIED: &str = "unclassified";
pub const UNNAMED: &str = "unnamed";

/// Name values that mean "no name" in exported OSM data.
const NAME_SENTINELS: [&str; 3] = ["nan", "none", "null"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Intersection {
    pub id: OsmNodeId,
    pub lat: f64,
    pub lon: f64,
}

/// A tag value as found in the source data: missing, a single value, or a
/// list of candidates (OSM `a;b` multi-values, merged ways).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RawTag {
    #[default]
    Missing,
    Single(String),
    List(Vec<String>),
}

impl RawTag {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None => RawTag::Missing,
            Some(v) if v.contains(';') => {
                RawTag::List(v.split(';').map(|s| s.trim().to_string()).collect())
            }
            Some(v) => RawTag::Single(v.trim().to_string()),
        }
    }

    /// First usable value, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            RawTag::Missing => None,
            RawTag::Single(v) => Some(v.as_str()).filter(|v| !v.is_empty()),
            RawTag::List(values) => values.iter().map(String::as_str).find(|v| !v.is_empty()),
        }
    }
}

/// Street segment between two intersections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreetSegment {
    pub id: u64,
    /// OSM way the segment was cut from, when known.
    pub way_id: Option<i64>,
    pub highway: RawTag,
    pub name: Option<String>,
    pub length_meters: Option<f64>,
}

impl StreetSegment {
    /// Raw highway category, `unclassified` when nothing usable is tagged.
    pub fn category(&self) -> &str {
        self.highway.first().unwrap_or(UNCLASSIFIED)
    }

    /// The street name, or `None` for missing, empty and sentinel values.
    pub fn name(&self) -> Option<&str> {
        let name = self.name.as_deref()?;
        if name.is_empty()
            || NAME_SENTINELS
                .iter()
                .any(|sentinel| name.eq_ignore_ascii_case(sentinel))
        {
            None
        } else {
            Some(name)
        }
    }

    pub fn display_name(&self) -> &str {
        self.name().unwrap_or(UNNAMED)
    }

    pub fn is_named(&self) -> bool {
        self.name().is_some()
    }

    /// Length in meters; zero when absent, negative or not a number.
    pub fn length(&self) -> f64 {
        match self.length_meters {
            Some(len) if len.is_finite() && len > 0.0 => len,
            _ => 0.0,
        }
    }
}

/// An OSM way as delivered by a data source, before it is cut into segments.
#[derive(Debug, Clone, Default)]
pub struct RawWay {
    pub id: i64,
    pub refs: Vec<OsmNodeId>,
    pub highway: RawTag,
    pub name: Option<String>,
}

/// Undirected street network. Immutable once built.
pub struct StreetGraph {
    pub graph: UnGraph<Intersection, StreetSegment>,
}

impl StreetGraph {
    /// Builds a graph from explicit intersections and `(from, to, segment)`
    /// triples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] if a segment references an intersection
    /// that is not part of the graph.
    pub fn from_parts(
        intersections: impl IntoIterator<Item = Intersection>,
        segments: impl IntoIterator<Item = (OsmNodeId, OsmNodeId, StreetSegment)>,
    ) -> Result<Self> {
        let mut graph = UnGraph::default();
        let mut osm_id_map = HashMap::new();

        for node in intersections {
            let idx = graph.add_node(node);
            if osm_id_map.insert(node.id, idx).is_some() {
                return Err(Error::InvalidData(format!(
                    "Duplicate intersection id {}",
                    node.id
                )));
            }
        }

        for (from, to, segment) in segments {
            let (Some(&a), Some(&b)) = (osm_id_map.get(&from), osm_id_map.get(&to)) else {
                return Err(Error::InvalidData(format!(
                    "Segment {} references unknown intersection ({from} -> {to})",
                    segment.id
                )));
            };
            graph.add_edge(a, b, segment);
        }

        Ok(Self { graph })
    }

    /// Builds a graph from OSM ways, keeping only junctions and way ends as
    /// intersections. Shape points in between are folded into the segment
    /// length.
    pub fn from_ways(coords: &HashMap<OsmNodeId, (f64, f64)>, ways: Vec<RawWay>) -> Self {
        let mut usage: HashMap<OsmNodeId, usize> = HashMap::new();
        for way in &ways {
            for id in &way.refs {
                *usage.entry(*id).or_default() += 1;
            }
        }

        let mut graph = UnGraph::default();
        let mut osm_id_map: HashMap<OsmNodeId, NodeIndex> = HashMap::new();
        let mut next_segment_id = 0_u64;
        let mut dropped_refs = 0_usize;

        for way in ways {
            let refs: Vec<(OsmNodeId, (f64, f64))> = way
                .refs
                .iter()
                .filter_map(|id| coords.get(id).map(|&c| (*id, c)))
                .collect();
            dropped_refs += way.refs.len() - refs.len();
            if refs.len() < 2 {
                continue;
            }

            let last = refs.len() - 1;
            let mut start = refs[0];
            let mut length = 0.0;

            for (i, window) in refs.windows(2).enumerate() {
                let (_, (lat_a, lon_a)) = window[0];
                let (id_b, (lat_b, lon_b)) = window[1];
                length += Point::new(lon_a, lat_a).haversine_distance(&Point::new(lon_b, lat_b));

                let is_junction = i + 1 == last || usage.get(&id_b).copied().unwrap_or(0) > 1;
                if !is_junction {
                    continue;
                }

                let idx_a = *osm_id_map.entry(start.0).or_insert_with(|| {
                    graph.add_node(Intersection {
                        id: start.0,
                        lat: start.1.0,
                        lon: start.1.1,
                    })
                });
                let idx_b = *osm_id_map.entry(id_b).or_insert_with(|| {
                    graph.add_node(Intersection {
                        id: id_b,
                        lat: lat_b,
                        lon: lon_b,
                    })
                });

                graph.add_edge(
                    idx_a,
                    idx_b,
                    StreetSegment {
                        id: next_segment_id,
                        way_id: Some(way.id),
                        highway: way.highway.clone(),
                        name: way.name.clone(),
                        length_meters: Some(length),
                    },
                );
                next_segment_id += 1;
                start = window[1];
                length = 0.0;
            }
        }

        if dropped_refs > 0 {
            tracing::warn!("{dropped_refs} way node references had no coordinates and were skipped");
        }
        tracing::debug!(
            "Graph built: {} intersections, {} segments",
            graph.node_count(),
            graph.edge_count()
        );

        Self { graph }
    }

    pub fn intersection_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn segment_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Degree of every intersection, indexed by `NodeIndex::index()`.
    /// Self-loops count twice.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.graph.node_count()];
        for edge in self.graph.edge_references() {
            degrees[edge.source().index()] += 1;
            degrees[edge.target().index()] += 1;
        }
        degrees
    }

    pub fn degree(&self, node: NodeIndex) -> usize {
        self.graph
            .edges(node)
            .map(|edge| if edge.source() == edge.target() { 2 } else { 1 })
            .sum()
    }

    pub fn intersections(&self) -> impl Iterator<Item = &Intersection> {
        self.graph.node_weights()
    }

    pub fn segments(&self) -> impl Iterator<Item = &StreetSegment> {
        self.graph.edge_weights()
    }

    /// Mean position of all intersections as `(lat, lon)`.
    pub fn center(&self) -> Option<(f64, f64)> {
        let n = self.intersection_count();
        if n == 0 {
            return None;
        }
        let (lat, lon) = self
            .intersections()
            .fold((0.0, 0.0), |(lat, lon), node| (lat + node.lat, lon + node.lon));
        Some((lat / n as f64, lon / n as f64))
    }
}
