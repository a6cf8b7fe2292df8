use serde::Serialize;

use crate::graph::StreetGraph;

/// Complexity class of an intersection, by number of connected segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntersectionClass {
    /// Two connections or fewer: dead ends and plain street continuations.
    Simple,
    TJunction,
    /// Four connections or more.
    Complex,
}

impl IntersectionClass {
    pub const ALL: [IntersectionClass; 3] = [
        IntersectionClass::Simple,
        IntersectionClass::TJunction,
        IntersectionClass::Complex,
    ];

    pub fn from_degree(degree: usize) -> Self {
        match degree {
            0..=2 => IntersectionClass::Simple,
            3 => IntersectionClass::TJunction,
            _ => IntersectionClass::Complex,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IntersectionClass::Simple => "Simple intersections (≤2 connections)",
            IntersectionClass::TJunction => "T-junctions (3 connections)",
            IntersectionClass::Complex => "Complex intersections (≥4 connections)",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntersectionClassCounts {
    pub simple: usize,
    pub t_junction: usize,
    pub complex: usize,
}

impl IntersectionClassCounts {
    pub fn from_degrees(degrees: impl IntoIterator<Item = usize>) -> Self {
        let mut counts = Self::default();
        for degree in degrees {
            counts.record(IntersectionClass::from_degree(degree));
        }
        counts
    }

    fn record(&mut self, class: IntersectionClass) {
        match class {
            IntersectionClass::Simple => self.simple += 1,
            IntersectionClass::TJunction => self.t_junction += 1,
            IntersectionClass::Complex => self.complex += 1,
        }
    }

    pub fn get(&self, class: IntersectionClass) -> usize {
        match class {
            IntersectionClass::Simple => self.simple,
            IntersectionClass::TJunction => self.t_junction,
            IntersectionClass::Complex => self.complex,
        }
    }

    pub fn total(&self) -> usize {
        self.simple + self.t_junction + self.complex
    }
}

pub fn classify_intersections(graph: &StreetGraph) -> IntersectionClassCounts {
    IntersectionClassCounts::from_degrees(graph.degrees())
}
