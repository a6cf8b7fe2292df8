//! One analysis run: fetch, analyze, report, map.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::graph::StreetGraph;
use crate::intersections::{IntersectionClassCounts, classify_intersections};
use crate::map::{map_file_name, render_map};
use crate::osm::{GraphProvider, SignalProvider, TRAFFIC_SIGNALS};
use crate::report::{RecordParts, StatisticsRecord, Summary, render_report, report_file_name};
use crate::signals::estimate_signals;
use crate::streets::{StreetSummary, aggregate_streets};
use crate::traffic::{Clock, estimate_traffic_at};
use crate::{Error, Result};

/// Destination for rendered artifacts.
pub trait ArtifactSink {
    /// # Errors
    ///
    /// Returns [`Error::Sink`] if the artifact cannot be stored.
    fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf>;
}

/// Writes artifacts into a directory, creating it if needed.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for FileSink {
    fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.join(file_name);
        std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::write(&path, contents))
            .map_err(|source| Error::Sink {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Results of the graph-only stages.
#[derive(Debug, Clone)]
pub struct GraphAnalysis {
    pub classes: IntersectionClassCounts,
    pub streets: StreetSummary,
}

/// Classifies intersections and aggregates streets concurrently; both stages
/// only read the graph.
pub fn analyze_graph(graph: &StreetGraph) -> GraphAnalysis {
    std::thread::scope(|scope| {
        let streets = scope.spawn(|| aggregate_streets(graph));
        let classes = classify_intersections(graph);
        let streets = match streets.join() {
            Ok(streets) => streets,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        GraphAnalysis { classes, streets }
    })
}

pub struct RunOutcome {
    pub record: StatisticsRecord,
    pub report_text: String,
    /// `None` when the graph had nothing to plot.
    pub map_html: Option<String>,
    /// `None` when the report could not be written.
    pub report_path: Option<PathBuf>,
    /// `None` when the map could not be rendered or written.
    pub map_path: Option<PathBuf>,
}

impl RunOutcome {
    /// Writes the console result of a run. In `json` mode only the record is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns an error if `out` cannot be written to.
    pub fn write_console(&self, out: &mut impl Write, top_n: usize, json: bool) -> Result<()> {
        if json {
            serde_json::to_writer_pretty(&mut *out, &self.record)?;
            writeln!(out)?;
            return Ok(());
        }

        writeln!(
            out,
            "\n{}",
            Summary {
                record: &self.record,
                top_n,
            }
        )?;
        match &self.report_path {
            Some(path) => writeln!(out, "Report saved to: {}", path.display())?,
            None => writeln!(out, "Report could not be saved")?,
        }
        match &self.map_path {
            Some(path) => writeln!(out, "Map saved to: {}", path.display())?,
            None => writeln!(out, "Map could not be created")?,
        }
        writeln!(out, "\nANALYSIS SUCCESSFUL FOR {}", self.record.city.to_uppercase())?;
        Ok(())
    }
}

/// Runs the whole analysis for one city.
pub struct TrafficExtractor<'a> {
    pub city: &'a str,
    pub config: &'a AppConfig,
    pub graphs: &'a dyn GraphProvider,
    pub signals: &'a dyn SignalProvider,
    pub clock: &'a dyn Clock,
    pub sink: &'a dyn ArtifactSink,
}

impl TrafficExtractor<'_> {
    /// # Errors
    ///
    /// Returns an error only when the street network cannot be obtained.
    /// Signal lookups and artifact writes degrade instead of failing.
    pub fn run(&self) -> Result<RunOutcome> {
        info!("Downloading street network of {}...", self.city);
        let graph = self
            .graphs
            .fetch_graph(self.city, self.config.network_mode)
            .map_err(|e| match e {
                Error::DataUnavailable(msg) => Error::DataUnavailable(msg),
                other => Error::DataUnavailable(other.to_string()),
            })?;
        info!(
            "Street network loaded: {} intersections, {} segments",
            graph.intersection_count(),
            graph.segment_count()
        );

        let record = self.analyze(&graph);
        let report_text = render_report(&record);

        let report_path = self.store(&report_file_name(&record), &report_text);

        let map_html = match render_map(&graph, &record, self.config.map_stride) {
            Ok(html) => Some(html),
            Err(e) => {
                warn!("Map not created: {e}");
                None
            }
        };
        let map_path = map_html
            .as_deref()
            .and_then(|html| self.store(&map_file_name(&record), html));

        Ok(RunOutcome {
            record,
            report_text,
            map_html,
            report_path,
            map_path,
        })
    }

    /// Builds the statistics record for an already loaded graph.
    pub fn analyze(&self, graph: &StreetGraph) -> StatisticsRecord {
        info!("Analyzing intersections and streets...");
        let GraphAnalysis { classes, streets } = analyze_graph(graph);
        info!(
            "Intersections: {} simple, {} T-junctions, {} complex",
            classes.simple, classes.t_junction, classes.complex
        );
        info!(
            "Streets: {} named, {:.1} km total",
            streets.named_segments,
            streets.total_length_km()
        );

        info!("Looking up tagged traffic signals...");
        let confirmed = match self.signals.count_tagged(self.city, TRAFFIC_SIGNALS) {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("Signal lookup failed, estimating from intersections only: {e}");
                None
            }
        };
        let signals = estimate_signals(confirmed, classes.complex);
        info!(
            "Signals: {} confirmed, {} estimated, {} total",
            signals.confirmed, signals.estimated, signals.total
        );

        let generated_at = self.clock.now();
        let traffic = estimate_traffic_at(generated_at);
        info!(
            "Traffic: {} / {} -> {} ({:.2})",
            traffic.period.label(),
            traffic.day_kind.label(),
            traffic.tier.label(),
            traffic.score
        );

        StatisticsRecord::assemble(RecordParts {
            city: self.city,
            generated_at,
            intersections: graph.intersection_count(),
            street_segments: graph.segment_count(),
            classes,
            streets: &streets,
            signals,
            traffic,
            top_n: self.config.report_top_n,
        })
    }

    fn store(&self, file_name: &str, contents: &str) -> Option<PathBuf> {
        match self.sink.write(file_name, contents) {
            Ok(path) => {
                info!("Saved {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }
}
