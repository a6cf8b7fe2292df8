use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use super::{GraphProvider, NetworkMode, OsmTag, SignalProvider};
use crate::graph::{OsmNodeId, RawTag, RawWay, StreetGraph};
use crate::{Error, Result};

/// Overpass API client resolving places by their administrative boundary name.
pub struct OverpassClient {
    client: Client,
    url: String,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OverpassElement {
    Node {
        id: OsmNodeId,
        lat: f64,
        lon: f64,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<OsmNodeId>,
        #[serde(default)]
        tags: HashMap<String, String>,
    },
    Count {
        #[serde(default)]
        tags: HashMap<String, String>,
    },
    #[serde(other)]
    Other,
}

impl OverpassClient {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            timeout_secs,
        })
    }

    fn run_query(&self, query: &str) -> Result<OverpassResponse> {
        tracing::debug!("Overpass query:\n{query}");
        let response = self
            .client
            .post(&self.url)
            .form(&[("data", query)])
            .send()?
            .error_for_status()?;
        Ok(response.json::<OverpassResponse>()?)
    }
}

/// Overpass statements binding `.searchArea` to the boundary of `place`.
///
/// `"Cali, Colombia"` looks up the boundary relation named "Cali" inside the
/// country named "Colombia"; a bare name matches any administrative boundary.
/// Area filters only apply to node/way/relation queries, so the city is
/// selected as a relation and converted with `map_to_area`.
fn area_statement(place: &str) -> String {
    let mut parts = place.split(',').map(str::trim).filter(|p| !p.is_empty());
    let city = escape(parts.next().unwrap_or(place));
    let relation = match parts.last() {
        Some(country) => format!(
            "area[\"name\"=\"{}\"][\"admin_level\"=\"2\"]->.country;\n\
             rel[\"name\"=\"{city}\"][\"boundary\"=\"administrative\"](area.country);",
            escape(country)
        ),
        None => format!("rel[\"name\"=\"{city}\"][\"boundary\"=\"administrative\"];"),
    };
    format!("{relation}\nmap_to_area->.searchArea;")
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn network_query(place: &str, mode: NetworkMode, timeout_secs: u64) -> String {
    format!(
        "[out:json][timeout:{timeout_secs}];\n{}\nway{}(area.searchArea);\nout body;\n>;\nout skel qt;",
        area_statement(place),
        mode.overpass_filter()
    )
}

fn count_query(place: &str, tag: OsmTag, timeout_secs: u64) -> String {
    format!(
        "[out:json][timeout:{timeout_secs}];\n{}\nnwr[\"{}\"=\"{}\"](area.searchArea);\nout count;",
        area_statement(place),
        tag.key,
        tag.value
    )
}

/// Splits a response into node coordinates and the ways accepted by `mode`.
fn parse_network(
    response: OverpassResponse,
    mode: NetworkMode,
) -> (HashMap<OsmNodeId, (f64, f64)>, Vec<RawWay>) {
    let mut coords = HashMap::new();
    let mut ways = Vec::new();

    for element in response.elements {
        match element {
            OverpassElement::Node { id, lat, lon } => {
                coords.insert(id, (lat, lon));
            }
            OverpassElement::Way { id, nodes, tags } => {
                let highway = tags.get("highway").map(String::as_str);
                if !highway.is_some_and(|h| mode.accepts(h)) {
                    continue;
                }
                ways.push(RawWay {
                    id,
                    refs: nodes,
                    highway: RawTag::parse(highway),
                    name: tags.get("name").cloned(),
                });
            }
            OverpassElement::Count { .. } | OverpassElement::Other => {}
        }
    }

    (coords, ways)
}

fn parse_count(response: &OverpassResponse) -> Result<usize> {
    response
        .elements
        .iter()
        .find_map(|element| match element {
            OverpassElement::Count { tags } => tags.get("total"),
            _ => None,
        })
        .ok_or_else(|| Error::InvalidData("Overpass response has no count element".to_string()))?
        .parse::<usize>()
        .map_err(|e| Error::InvalidData(format!("Invalid Overpass count: {e}")))
}

impl GraphProvider for OverpassClient {
    fn fetch_graph(&self, place: &str, mode: NetworkMode) -> Result<StreetGraph> {
        tracing::info!("Downloading {mode:?} network for {place} from {}", self.url);
        let response = self.run_query(&network_query(place, mode, self.timeout_secs))?;
        let (coords, ways) = parse_network(response, mode);
        if ways.is_empty() {
            return Err(Error::DataUnavailable(format!(
                "No streets found for '{place}'"
            )));
        }
        tracing::info!("Loaded {} ways and {} nodes", ways.len(), coords.len());
        Ok(StreetGraph::from_ways(&coords, ways))
    }
}

impl SignalProvider for OverpassClient {
    fn count_tagged(&self, place: &str, tag: OsmTag) -> Result<usize> {
        let response = self.run_query(&count_query(place, tag, self.timeout_secs))?;
        parse_count(&response)
    }
}
