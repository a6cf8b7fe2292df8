//! Statistics record assembly and text rendering.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::intersections::{IntersectionClass, IntersectionClassCounts};
use crate::signals::SignalEstimate;
use crate::streets::{CategoryCount, StreetSummary};
use crate::traffic::TrafficEstimate;

const RULE_WIDTH: usize = 80;

/// Everything one analysis run produced.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsRecord {
    pub city: String,
    pub generated_at: NaiveDateTime,
    pub intersections: usize,
    pub street_segments: usize,
    pub intersection_classes: IntersectionClassCounts,
    pub named_streets: usize,
    pub total_length_km: f64,
    /// Most common street types, ranked.
    pub street_types: Vec<CategoryCount>,
    pub signals: SignalEstimate,
    pub traffic: TrafficEstimate,
}

/// Inputs of [`StatisticsRecord::assemble`].
pub struct RecordParts<'a> {
    pub city: &'a str,
    pub generated_at: NaiveDateTime,
    pub intersections: usize,
    pub street_segments: usize,
    pub classes: IntersectionClassCounts,
    pub streets: &'a StreetSummary,
    pub signals: SignalEstimate,
    pub traffic: TrafficEstimate,
    pub top_n: usize,
}

impl StatisticsRecord {
    pub fn assemble(parts: RecordParts<'_>) -> Self {
        Self {
            city: parts.city.to_string(),
            generated_at: parts.generated_at,
            intersections: parts.intersections,
            street_segments: parts.street_segments,
            intersection_classes: parts.classes,
            named_streets: parts.streets.named_segments,
            total_length_km: parts.streets.total_length_km(),
            street_types: parts.streets.distribution.top(parts.top_n),
            signals: parts.signals,
            traffic: parts.traffic,
        }
    }

    pub fn timestamp(&self) -> String {
        self.generated_at.format("%Y%m%d_%H%M%S").to_string()
    }
}

pub fn report_file_name(record: &StatisticsRecord) -> String {
    format!("report_traffic_{}.txt", record.timestamp())
}

/// Formats an integer with `,` thousands separators.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Renders the full text report.
pub fn render_report(record: &StatisticsRecord) -> String {
    record.to_string()
}

impl fmt::Display for StatisticsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        let date = self.generated_at.format("%Y-%m-%d %H:%M:%S");
        let classes = &self.intersection_classes;
        let signals = &self.signals;
        let traffic = &self.traffic;

        writeln!(f, "{rule}")?;
        writeln!(f, "    TRAFFIC ANALYSIS REPORT")?;
        writeln!(f, "    City: {}", self.city.to_uppercase())?;
        writeln!(f, "    Date: {date}")?;
        writeln!(f, "{rule}\n")?;

        writeln!(f, "DATA SOURCES:")?;
        writeln!(f, "• OpenStreetMap (OSM)")?;
        writeln!(f, "• Street network graph analysis")?;
        writeln!(f, "• Traffic estimation heuristics\n")?;

        writeln!(f, "GENERAL CITY INFORMATION:")?;
        writeln!(f, "• Total intersections: {}", thousands(self.intersections))?;
        writeln!(f, "• Total street segments: {}", thousands(self.street_segments))?;
        writeln!(f, "• Streets with an identified name: {}", thousands(self.named_streets))?;
        writeln!(f, "• Total road network length: {:.1} km\n", self.total_length_km)?;

        writeln!(f, "INTERSECTION ANALYSIS:")?;
        for class in IntersectionClass::ALL {
            writeln!(f, "• {}: {}", class.label(), thousands(classes.get(class)))?;
        }
        writeln!(f)?;

        writeln!(f, "STREET TYPES IDENTIFIED:")?;
        if self.street_types.is_empty() {
            writeln!(f, "• None")?;
        }
        for entry in &self.street_types {
            writeln!(f, "• {}: {} segments", entry.label, thousands(entry.count))?;
        }
        writeln!(f)?;

        writeln!(f, "TRAFFIC SIGNAL ANALYSIS:")?;
        writeln!(f, "• Signals confirmed in OSM: {}", thousands(signals.confirmed))?;
        writeln!(f, "• Additional estimated signals: {}", thousands(signals.estimated))?;
        writeln!(f, "• Total estimated signals: {}\n", thousands(signals.total))?;

        writeln!(f, "CURRENT TRAFFIC ANALYSIS:")?;
        writeln!(f, "• Analysis time: {}", self.generated_at.format("%H:%M"))?;
        writeln!(f, "• Period of day: {}", traffic.period.label())?;
        writeln!(f, "• Day type: {}", traffic.day_kind.label())?;
        writeln!(f, "• Traffic level: {}", traffic.tier.label())?;
        writeln!(f, "• Numeric factor: {:.2}\n", traffic.score)?;

        writeln!(f, "METHODOLOGY:")?;
        writeln!(f, "• Road network extracted from OpenStreetMap")?;
        writeln!(f, "• Intersections analyzed by connectivity degree")?;
        writeln!(f, "• Signals identified from OSM tags plus an intersection-based estimate")?;
        writeln!(f, "• Traffic estimated from hourly and weekly patterns\n")?;

        writeln!(f, "LIMITATIONS:")?;
        writeln!(f, "• Traffic is estimated, not measured in real time")?;
        writeln!(f, "• OSM data quality varies by region")?;
        writeln!(f, "• Signal counts are partially estimated")?;
        writeln!(f, "• Special events and incidents are not included\n")?;

        writeln!(f, "RECOMMENDATIONS:")?;
        writeln!(f, "• Data is most accurate in well-mapped urban areas")?;
        writeln!(f, "• For real-time traffic, use official traffic APIs")?;
        writeln!(f, "• Verify estimated signals through direct observation")?;
        writeln!(f, "• Refresh the analysis periodically\n")?;

        writeln!(f, "{rule}")?;
        writeln!(f, "URBAN TRAFFIC ANALYSIS SYSTEM")?;
        writeln!(f, "OpenStreetMap | petgraph | Leaflet")?;
        writeln!(f, "Generated: {date}")?;
        writeln!(f, "{rule}")
    }
}

/// Short console summary listing the leading street types.
pub struct Summary<'a> {
    pub record: &'a StatisticsRecord,
    pub top_n: usize,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record;
        writeln!(f, "SUMMARY – {}", record.city)?;
        writeln!(f, "   • Intersections analyzed: {}", thousands(record.intersections))?;
        writeln!(f, "   • Named streets: {}", thousands(record.named_streets))?;
        writeln!(f, "   • Total length: {:.1} km", record.total_length_km)?;
        writeln!(f, "   • Main street types:")?;
        for entry in record.street_types.iter().take(self.top_n) {
            writeln!(f, "     - {}: {}", entry.label, thousands(entry.count))?;
        }
        writeln!(f, "   • Total signals: {}", thousands(record.signals.total))?;
        writeln!(f, "   • Traffic level: {}", record.traffic.tier.label())
    }
}
