use std::collections::HashMap;
use std::path::{Path, PathBuf};

use osmpbf::{Element, ElementReader};

use super::{GraphProvider, NetworkMode, OsmTag, SignalProvider};
use crate::config::CityConfig;
use crate::graph::{RawTag, RawWay, StreetGraph};
use crate::{Error, Result};

/// Local `.osm.pbf` extracts, one per city.
pub struct PbfExtracts {
    extracts: HashMap<String, PathBuf>,
}

impl PbfExtracts {
    pub fn new(cities: &[CityConfig]) -> Self {
        let extracts = cities
            .iter()
            .filter_map(|city| city.pbf.clone().map(|path| (city.name.clone(), path)))
            .collect();
        Self { extracts }
    }

    fn extract_for(&self, place: &str) -> Result<&Path> {
        let path = self
            .extracts
            .get(place)
            .ok_or_else(|| Error::DataUnavailable(format!("No PBF extract configured for '{place}'")))?;
        if !path.exists() {
            return Err(Error::DataUnavailable(format!(
                "PBF extract not found: {}",
                path.display()
            )));
        }
        Ok(path)
    }
}

fn read_network(path: &Path, mode: NetworkMode) -> Result<StreetGraph> {
    tracing::info!("Parsing OSM PBF: {}", path.display());

    // PASS 1: Nodes
    let mut coords = HashMap::new();
    let reader = ElementReader::from_path(path)?;
    reader.for_each(|element| match element {
        Element::Node(node) => {
            coords.insert(node.id(), (node.lat(), node.lon()));
        }
        Element::DenseNode(node) => {
            coords.insert(node.id(), (node.lat(), node.lon()));
        }
        _ => {}
    })?;

    tracing::info!("Loaded {} nodes. Collecting ways...", coords.len());

    // PASS 2: Ways
    let mut ways = Vec::new();
    let reader = ElementReader::from_path(path)?;
    reader.for_each(|element| {
        if let Element::Way(way) = element {
            let tags: HashMap<&str, &str> = way.tags().collect();
            let highway = tags.get("highway").copied();
            if !highway.is_some_and(|h| mode.accepts(h)) {
                return;
            }
            ways.push(RawWay {
                id: way.id(),
                refs: way.refs().collect(),
                highway: RawTag::parse(highway),
                name: tags.get("name").map(|name| name.to_string()),
            });
        }
    })?;

    if ways.is_empty() {
        return Err(Error::DataUnavailable(format!(
            "No streets found in {}",
            path.display()
        )));
    }

    let graph = StreetGraph::from_ways(&coords, ways);
    tracing::info!(
        "Graph built: {} intersections, {} segments",
        graph.intersection_count(),
        graph.segment_count()
    );
    Ok(graph)
}

fn has_tag<'a>(mut tags: impl Iterator<Item = (&'a str, &'a str)>, tag: OsmTag) -> bool {
    tags.any(|(k, v)| k == tag.key && v == tag.value)
}

fn count_tag(path: &Path, tag: OsmTag) -> Result<usize> {
    let reader = ElementReader::from_path(path)?;
    let count = reader.par_map_reduce(
        |element| match element {
            Element::Node(node) => usize::from(has_tag(node.tags(), tag)),
            Element::DenseNode(node) => usize::from(has_tag(node.tags(), tag)),
            Element::Way(way) => usize::from(has_tag(way.tags(), tag)),
            Element::Relation(_) => 0,
        },
        || 0,
        |a, b| a + b,
    )?;
    Ok(count)
}

impl GraphProvider for PbfExtracts {
    fn fetch_graph(&self, place: &str, mode: NetworkMode) -> Result<StreetGraph> {
        read_network(self.extract_for(place)?, mode)
    }
}

impl SignalProvider for PbfExtracts {
    fn count_tagged(&self, place: &str, tag: OsmTag) -> Result<usize> {
        count_tag(self.extract_for(place)?, tag)
    }
}
