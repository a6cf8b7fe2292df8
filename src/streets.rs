//! Street type distribution, named streets and network length.

use std::borrow::Cow;
use std::collections::HashMap;

use itertools::Itertools;
use lazy_static::lazy_static;
use serde::Serialize;

use crate::graph::StreetGraph;

lazy_static! {
    /// Display labels for the common OSM `highway` values.
    static ref CATEGORY_LABELS: HashMap<&'static str, &'static str> = HashMap::from([
        ("residential", "Residential"),
        ("tertiary", "Tertiary"),
        ("secondary", "Secondary"),
        ("primary", "Primary"),
        ("trunk", "Trunk"),
        ("unclassified", "Unclassified"),
        ("primary_link", "Primary link"),
        ("secondary_link", "Secondary link"),
        ("tertiary_link", "Tertiary link"),
        ("trunk_link", "Trunk link"),
        ("service", "Service"),
        ("living_street", "Living street"),
        ("pedestrian", "Pedestrian"),
        ("footway", "Footway"),
        ("cycleway", "Cycleway"),
        ("track", "Track"),
        ("path", "Path"),
        ("steps", "Steps"),
        ("motorway", "Motorway"),
        ("motorway_link", "Motorway link"),
    ]);
}

/// Display label for a raw category; unknown values are title-cased.
pub fn category_label(raw: &str) -> Cow<'static, str> {
    match CATEGORY_LABELS.get(raw) {
        Some(&label) => Cow::Borrowed(label),
        None => Cow::Owned(title_case(raw)),
    }
}

/// Upper-cases the first letter of every alphabetic run, lower-cases the rest.
fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for c in raw.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// Segment count per street type, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreetTypeDistribution {
    entries: Vec<CategoryCount>,
    index: HashMap<String, usize>,
}

impl StreetTypeDistribution {
    pub fn increment(&mut self, label: &str) {
        match self.index.get(label) {
            Some(&i) => self.entries[i].count += 1,
            None => {
                self.index.insert(label.to_string(), self.entries.len());
                self.entries.push(CategoryCount {
                    label: label.to_string(),
                    count: 1,
                });
            }
        }
    }

    pub fn get(&self, label: &str) -> usize {
        self.index.get(label).map_or(0, |&i| self.entries[i].count)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Entries by descending count; equal counts keep first-seen order.
    pub fn ranked(&self) -> Vec<&CategoryCount> {
        self.entries
            .iter()
            .sorted_by(|a, b| b.count.cmp(&a.count))
            .collect()
    }

    pub fn top(&self, n: usize) -> Vec<CategoryCount> {
        self.ranked().into_iter().take(n).cloned().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreetSummary {
    pub distribution: StreetTypeDistribution,
    pub named_segments: usize,
    pub total_length_meters: f64,
}

impl StreetSummary {
    /// Total length in kilometers, rounded to one decimal.
    pub fn total_length_km(&self) -> f64 {
        (self.total_length_meters / 100.0).round() / 10.0
    }
}

pub fn aggregate_streets(graph: &StreetGraph) -> StreetSummary {
    let mut summary = StreetSummary::default();

    for segment in graph.segments() {
        summary
            .distribution
            .increment(&category_label(segment.category()));

        if segment.is_named() {
            summary.named_segments += 1;
        }
        summary.total_length_meters += segment.length();
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{node, segment};
    use crate::graph::{RawTag, StreetSegment};

    #[test]
    fn known_categories_use_table_labels() {
        assert_eq!(category_label("primary"), "Primary");
        assert_eq!(category_label("motorway_link"), "Motorway link");
        assert_eq!(category_label("unclassified"), "Unclassified");
        assert_eq!(CATEGORY_LABELS.len(), 20);
    }

    #[test]
    fn unknown_categories_are_title_cased() {
        assert_eq!(category_label("busway"), "Busway");
        assert_eq!(category_label("bus_guideway"), "Bus_Guideway");
        assert_eq!(category_label("ROAD"), "Road");
        assert_eq!(category_label(""), "");
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let mut dist = StreetTypeDistribution::default();
        for label in ["Service", "Primary", "Residential", "Primary", "Service", "Trunk"] {
            dist.increment(label);
        }
        let ranked: Vec<_> = dist.ranked().into_iter().map(|e| (e.label.as_str(), e.count)).collect();
        assert_eq!(
            ranked,
            [("Service", 2), ("Primary", 2), ("Residential", 1), ("Trunk", 1)]
        );
        assert_eq!(dist.top(2).len(), 2);
        assert_eq!(dist.top(10).len(), 4);
        assert_eq!(dist.get("Trunk"), 1);
        assert_eq!(dist.get("Motorway"), 0);
    }

    #[test]
    fn aggregates_counts_names_and_length() {
        let empty_tag = StreetSegment {
            id: 4,
            highway: RawTag::List(vec![]),
            ..Default::default()
        };
        let graph = StreetGraph::from_parts(
            (0..4).map(node),
            [
                (0, 1, segment(0, "primary", Some("Calle 5"), 1200.0)),
                (1, 2, segment(1, "residential", Some("nan"), 300.0)),
                (2, 3, segment(2, "residential;service", Some("Carrera 10"), -5.0)),
                (3, 0, segment(3, "busway", None, 549.0)),
                (0, 2, empty_tag),
            ],
        )
        .unwrap();

        let summary = aggregate_streets(&graph);

        assert_eq!(summary.distribution.get("Residential"), 2);
        assert_eq!(summary.distribution.get("Primary"), 1);
        assert_eq!(summary.distribution.get("Busway"), 1);
        assert_eq!(summary.distribution.get("Unclassified"), 1);
        assert_eq!(summary.distribution.total(), graph.segment_count());
        assert_eq!(summary.named_segments, 2);
        assert_eq!(summary.total_length_meters, 2049.0);
        assert_eq!(summary.total_length_km(), 2.0);
    }

    #[test]
    fn unnamed_untagged_segment_only_counts_as_unclassified() {
        let graph = StreetGraph::from_parts(
            (0..2).map(node),
            [(
                0,
                1,
                StreetSegment {
                    highway: RawTag::List(vec![]),
                    ..Default::default()
                },
            )],
        )
        .unwrap();

        let summary = aggregate_streets(&graph);
        assert_eq!(summary.distribution.get("Unclassified"), 1);
        assert_eq!(summary.named_segments, 0);
        assert_eq!(summary.total_length_meters, 0.0);
    }
}
