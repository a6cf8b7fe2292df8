use std::cell::RefCell;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use traffic_extractor::graph::{Intersection, OsmNodeId, RawTag, StreetSegment};
use traffic_extractor::osm::{GraphProvider, NetworkMode, OsmTag, SignalProvider, TRAFFIC_SIGNALS};
use traffic_extractor::signals::SignalSource;
use traffic_extractor::traffic::{FixedClock, TrafficTier};
use traffic_extractor::{AppConfig, ArtifactSink, Error, Result, StreetGraph, TrafficExtractor};

/// Two avenues crossing at node 0, a side street forming a T at node 1, and a
/// dead end with an untagged, unnamed segment.
fn city_graph() -> StreetGraph {
    let coords: [(OsmNodeId, f64, f64); 7] = [
        (0, 3.4500, -76.5300),
        (1, 3.4510, -76.5300),
        (2, 3.4490, -76.5300),
        (3, 3.4500, -76.5290),
        (4, 3.4500, -76.5310),
        (5, 3.4510, -76.5290),
        (6, 3.4520, -76.5300),
    ];
    let segment = |id: u64, highway: RawTag, name: Option<&str>, length: Option<f64>| StreetSegment {
        id,
        way_id: None,
        highway,
        name: name.map(str::to_string),
        length_meters: length,
    };
    let primary = || RawTag::Single("primary".to_string());

    StreetGraph::from_parts(
        coords.map(|(id, lat, lon)| Intersection { id, lat, lon }),
        [
            (0, 1, segment(0, primary(), Some("Avenida 6N"), Some(111.0))),
            (0, 2, segment(1, primary(), Some("Avenida 6N"), Some(111.0))),
            (0, 3, segment(2, RawTag::Single("secondary".to_string()), Some("Calle 15"), Some(111.0))),
            (0, 4, segment(3, RawTag::Single("secondary".to_string()), Some("Calle 15"), Some(111.0))),
            (1, 5, segment(4, RawTag::Single("residential".to_string()), Some("nan"), Some(111.0))),
            (1, 6, segment(5, RawTag::List(vec![]), None, None)),
        ],
    )
    .unwrap()
}

struct StaticGraph;

impl GraphProvider for StaticGraph {
    fn fetch_graph(&self, _place: &str, mode: NetworkMode) -> Result<StreetGraph> {
        assert_eq!(mode, NetworkMode::Drive);
        Ok(city_graph())
    }
}

struct NoGraph;

impl GraphProvider for NoGraph {
    fn fetch_graph(&self, place: &str, _mode: NetworkMode) -> Result<StreetGraph> {
        Err(Error::InvalidData(format!("boundary for {place} not found")))
    }
}

struct TaggedSignals(usize);

impl SignalProvider for TaggedSignals {
    fn count_tagged(&self, _place: &str, tag: OsmTag) -> Result<usize> {
        assert_eq!(tag, TRAFFIC_SIGNALS);
        Ok(self.0)
    }
}

struct UnreachableSignals;

impl SignalProvider for UnreachableSignals {
    fn count_tagged(&self, _place: &str, _tag: OsmTag) -> Result<usize> {
        Err(Error::DataUnavailable("overpass timed out".to_string()))
    }
}

#[derive(Default)]
struct MemorySink {
    files: RefCell<Vec<(String, String)>>,
    fail: bool,
}

impl ArtifactSink for MemorySink {
    fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        if self.fail {
            return Err(Error::Sink {
                path: PathBuf::from(file_name),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.files
            .borrow_mut()
            .push((file_name.to_string(), contents.to_string()));
        Ok(PathBuf::from("/memory").join(file_name))
    }
}

fn wednesday_morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 15)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap()
}

fn config() -> AppConfig {
    AppConfig {
        map_stride: 1,
        ..AppConfig::default()
    }
}

#[test]
fn full_run_produces_record_report_and_map() {
    let config = config();
    let sink = MemorySink::default();
    let clock = FixedClock(wednesday_morning());

    let outcome = TrafficExtractor {
        city: "Cali, Colombia",
        config: &config,
        graphs: &StaticGraph,
        signals: &TaggedSignals(4),
        clock: &clock,
        sink: &sink,
    }
    .run()
    .unwrap();

    let record = &outcome.record;
    assert_eq!(record.intersections, 7);
    assert_eq!(record.street_segments, 6);
    assert_eq!(record.intersection_classes.complex, 1);
    assert_eq!(record.intersection_classes.t_junction, 1);
    assert_eq!(record.intersection_classes.simple, 5);
    assert_eq!(record.intersection_classes.total(), record.intersections);
    assert_eq!(record.named_streets, 4);
    assert_eq!(record.total_length_km, 0.6);
    assert_eq!(
        record.street_types.iter().map(|c| c.count).sum::<usize>(),
        record.street_segments
    );
    assert_eq!(record.street_types[0].label, "Primary");
    assert!(record.street_types.iter().any(|c| c.label == "Unclassified" && c.count == 1));

    assert_eq!(record.signals.confirmed, 4);
    assert_eq!(record.signals.estimated, 0);
    assert_eq!(record.signals.source, SignalSource::Tagged);
    assert_eq!(record.traffic.tier, TrafficTier::High);

    let files = sink.files.borrow();
    let names: Vec<_> = files.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        ["report_traffic_20240515_083000.txt", "traffic_map_20240515_083000.html"]
    );
    assert_eq!(files[0].1, outcome.report_text);
    assert!(outcome.report_text.contains("City: CALI, COLOMBIA"));
    assert!(outcome.map_html.as_deref().unwrap().contains(r#""color":"red","radius":4"#));
    assert_eq!(
        outcome.report_path,
        Some(PathBuf::from("/memory/report_traffic_20240515_083000.txt"))
    );
}

#[test]
fn unreachable_signal_source_degrades() {
    let config = config();
    let sink = MemorySink::default();
    let clock = FixedClock(wednesday_morning());

    let outcome = TrafficExtractor {
        city: "Cali, Colombia",
        config: &config,
        graphs: &StaticGraph,
        signals: &UnreachableSignals,
        clock: &clock,
        sink: &sink,
    }
    .run()
    .unwrap();

    let signals = outcome.record.signals;
    assert_eq!(signals.confirmed, 0);
    assert_eq!(signals.total, signals.estimated);
    assert_eq!(signals.source, SignalSource::IntersectionsOnly);
    assert!(outcome.report_text.contains("• Signals confirmed in OSM: 0"));
}

#[test]
fn missing_graph_aborts_the_run() {
    let config = config();
    let sink = MemorySink::default();
    let clock = FixedClock(wednesday_morning());

    let result = TrafficExtractor {
        city: "Atlantis",
        config: &config,
        graphs: &NoGraph,
        signals: &TaggedSignals(0),
        clock: &clock,
        sink: &sink,
    }
    .run();

    assert!(matches!(result, Err(Error::DataUnavailable(msg)) if msg.contains("Atlantis")));
    assert!(sink.files.borrow().is_empty());
}

#[test]
fn sink_failure_is_not_fatal() {
    let config = config();
    let sink = MemorySink {
        fail: true,
        ..MemorySink::default()
    };
    let clock = FixedClock(wednesday_morning());

    let outcome = TrafficExtractor {
        city: "Cali, Colombia",
        config: &config,
        graphs: &StaticGraph,
        signals: &TaggedSignals(4),
        clock: &clock,
        sink: &sink,
    }
    .run()
    .unwrap();

    assert!(outcome.report_path.is_none());
    assert!(outcome.map_path.is_none());
    assert!(outcome.map_html.is_some());
    assert_eq!(outcome.record.intersections, 7);
}
