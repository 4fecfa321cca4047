//! Health aggregation over pod and node status records
//!
//! Pure computation: count how many records satisfy a health predicate and
//! classify the healthy/total ratio into one of three color bands.
//!
//! | ratio           | color   |
//! |-----------------|---------|
//! | `< 0.5`         | fatal   |
//! | `0.5 ..< 0.8`   | warn    |
//! | `>= 0.8`        | healthy |
//!
//! An empty record list (`total == 0`) is classified as healthy: there is
//! nothing failing to report.

use k8s_openapi::api::core::v1::{Node, Pod};

/// Status value marking a condition as satisfied
pub const CONDITION_STATUS_TRUE: &str = "True";

/// Three-tier classification of a healthy/total ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthColor {
    Fatal,
    Warn,
    Healthy,
}

impl HealthColor {
    /// Badge color name rendered by shields.io
    pub fn badge_color(self) -> &'static str {
        match self {
            HealthColor::Fatal => "red",
            HealthColor::Warn => "yellow",
            HealthColor::Healthy => "blue",
        }
    }
}

/// Result of aggregating one list of records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregation {
    pub healthy: usize,
    pub total: usize,
    pub color: HealthColor,
}

/// Classify `healthy` out of `total`
///
/// Bands are lower-bound inclusive. Integer cross-multiplication keeps the
/// 0.5 and 0.8 boundaries exact.
pub fn classify(healthy: usize, total: usize) -> HealthColor {
    if total == 0 {
        return HealthColor::Healthy;
    }

    let healthy = healthy as u128;
    let total = total as u128;

    if healthy * 10 < total * 5 {
        HealthColor::Fatal
    } else if healthy * 10 < total * 8 {
        HealthColor::Warn
    } else {
        HealthColor::Healthy
    }
}

/// Count the records satisfying `is_healthy` and classify the ratio
pub fn aggregate<'a, T, I, F>(records: I, is_healthy: F) -> Aggregation
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> bool,
{
    let (healthy, total) = records
        .into_iter()
        .fold((0usize, 0usize), |(healthy, total), record| {
            (healthy + usize::from(is_healthy(record)), total + 1)
        });

    Aggregation {
        healthy,
        total,
        color: classify(healthy, total),
    }
}

/// Pod health rule: the pod's phase is one of the accepted phases
#[derive(Debug, Clone, PartialEq)]
pub struct PodHealth {
    accepted_phases: Vec<String>,
}

impl PodHealth {
    pub fn new<S: Into<String>>(accepted_phases: impl IntoIterator<Item = S>) -> Self {
        Self {
            accepted_phases: accepted_phases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn accepted_phases(&self) -> &[String] {
        &self.accepted_phases
    }

    /// A pod without a reported phase is not healthy
    pub fn is_healthy(&self, pod: &Pod) -> bool {
        pod.status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .is_some_and(|phase| self.accepted_phases.iter().any(|p| p == phase))
    }
}

/// Node health rule: the LAST entry of `status.conditions` has status "True"
///
/// The kubelet conventionally reports the aggregate `Ready` condition last,
/// and this rule relies on that ordering rather than looking the condition up
/// by type. A node with no conditions is not healthy.
pub fn is_node_healthy(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| conditions.last())
        .is_some_and(|condition| condition.status == CONDITION_STATUS_TRUE)
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
