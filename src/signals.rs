use serde::Serialize;

/// Share of complex intersections assumed signalized on top of tagged signals.
pub const ADDITIONAL_SIGNAL_RATIO: f64 = 0.3;
/// Share of complex intersections assumed signalized when no tag data exists.
pub const FALLBACK_SIGNAL_RATIO: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    /// Tagged signals plus an estimate for untagged complex intersections.
    Tagged,
    /// Tag data unavailable; complex intersections only.
    IntersectionsOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalEstimate {
    pub confirmed: usize,
    pub estimated: usize,
    pub total: usize,
    pub source: SignalSource,
}

/// Combines the tagged signal count (`None` when the tag source failed) with
/// a heuristic over complex intersections.
pub fn estimate_signals(confirmed: Option<usize>, complex_intersections: usize) -> SignalEstimate {
    let (confirmed, estimated, source) = match confirmed {
        Some(confirmed) => {
            // The cap never binds since 0.3 × complex ≤ complex. Kept until the
            // intended bound is known.
            let estimated =
                complex_intersections.min(scaled(complex_intersections, ADDITIONAL_SIGNAL_RATIO));
            (confirmed, estimated, SignalSource::Tagged)
        }
        None => (
            0,
            scaled(complex_intersections, FALLBACK_SIGNAL_RATIO),
            SignalSource::IntersectionsOnly,
        ),
    };

    SignalEstimate {
        confirmed,
        estimated,
        total: confirmed + estimated,
        source,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn scaled(count: usize, ratio: f64) -> usize {
    (count as f64 * ratio).floor() as usize
}
