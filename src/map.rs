//! Leaflet map of sampled intersections, colored by complexity.

use serde::Serialize;

use crate::graph::StreetGraph;
use crate::intersections::IntersectionClass;
use crate::report::{StatisticsRecord, thousands};
use crate::{Error, Result};

const ZOOM_START: u8 = 11;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub degree: usize,
    pub color: &'static str,
    pub radius: u8,
}

pub fn marker_style(class: IntersectionClass) -> (&'static str, u8) {
    match class {
        IntersectionClass::Complex => ("red", 4),
        IntersectionClass::TJunction => ("orange", 2),
        IntersectionClass::Simple => ("blue", 1),
    }
}

/// Every `stride`-th intersection, in graph order, starting with the first.
pub fn sample_markers(graph: &StreetGraph, stride: usize) -> Vec<Marker> {
    let degrees = graph.degrees();
    graph
        .intersections()
        .zip(degrees)
        .step_by(stride.max(1))
        .map(|(node, degree)| {
            let (color, radius) = marker_style(IntersectionClass::from_degree(degree));
            Marker {
                lat: node.lat,
                lon: node.lon,
                degree,
                color,
                radius,
            }
        })
        .collect()
}

pub fn map_file_name(record: &StatisticsRecord) -> String {
    format!("traffic_map_{}.html", record.timestamp())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Renders a standalone HTML page.
///
/// # Errors
///
/// Returns [`Error::InvalidData`] when the graph has no intersections to
/// center the map on.
pub fn render_map(graph: &StreetGraph, record: &StatisticsRecord, stride: usize) -> Result<String> {
    let (center_lat, center_lon) = graph
        .center()
        .ok_or_else(|| Error::InvalidData("No intersections to plot".to_string()))?;
    let markers = sample_markers(graph, stride);
    // Keep "</script>" sequences out of the inline script.
    let markers_json = serde_json::to_string(&markers)?.replace("</", "<\\/");
    let city = escape_html(&record.city);

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Traffic analysis - {city}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<div style="position: fixed; top: 10px; left: 60px; width: 300px;
            background-color: white; border: 2px solid grey; z-index: 9999;
            font-size: 12px; padding: 10px">
<h4>Traffic analysis - {city}</h4>
<b>Intersections:</b> {intersections}<br>
<b>Streets:</b> {streets}<br>
<b>Signals:</b> {signals}<br>
<b>Traffic:</b> {traffic}<br>
<br>
<span style="color: red">&#9679;</span> Complex intersection<br>
<span style="color: orange">&#9679;</span> T-junction<br>
<span style="color: blue">&#9679;</span> Simple intersection
</div>
<script>
var map = L.map("map").setView([{center_lat}, {center_lon}], {zoom});
L.tileLayer("https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
  attribution: "&copy; OpenStreetMap contributors"
}}).addTo(map);
var markers = {markers_json};
markers.forEach(function (m) {{
  L.circleMarker([m.lat, m.lon], {{ radius: m.radius, color: m.color, fill: true }})
    .bindPopup("Intersection: " + m.degree + " connections")
    .addTo(map);
}});
</script>
</body>
</html>
"#,
        intersections = thousands(record.intersections),
        streets = thousands(record.named_streets),
        signals = thousands(record.signals.total),
        traffic = record.traffic.tier.label(),
        zoom = ZOOM_START,
    ))
}
