//! Tracer bounds.
//!
//! `max_iterations` and `max_depth` are the only cancellation mechanism the
//! tracers have, so every caller-supplied value passes through [`TraceSettings`]
//! before it reaches them.

use serde::Deserialize;

/// Defaults and hard caps for the topology tracers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceSettings {
    /// Rounds of bidirectional search when the caller gives none.
    pub default_max_iterations: usize,
    /// Tree depth when the caller gives none.
    pub default_max_depth: usize,
    /// Largest accepted `max_iterations`.
    pub max_iterations_cap: usize,
    /// Largest accepted `max_depth`.
    pub max_depth_cap: usize,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            default_max_iterations: 10,
            default_max_depth: 10,
            max_iterations_cap: 50,
            max_depth_cap: 64,
        }
    }
}

impl TraceSettings {
    /// Resolves a requested iteration budget to `1..=max_iterations_cap`.
    #[must_use]
    pub fn iterations(&self, requested: Option<i64>) -> usize {
        clamp(requested, self.default_max_iterations, self.max_iterations_cap)
    }

    /// Resolves a requested depth to `1..=max_depth_cap`.
    #[must_use]
    pub fn depth(&self, requested: Option<i64>) -> usize {
        clamp(requested, self.default_max_depth, self.max_depth_cap)
    }

    pub(super) fn apply_file(&mut self, file: &ConfigFileTrace) {
        if let Some(v) = file.default_max_iterations {
            self.default_max_iterations = v;
        }
        if let Some(v) = file.default_max_depth {
            self.default_max_depth = v;
        }
        if let Some(v) = file.max_iterations_cap {
            self.max_iterations_cap = v.max(1);
        }
        if let Some(v) = file.max_depth_cap {
            self.max_depth_cap = v.max(1);
        }
    }
}

fn clamp(requested: Option<i64>, default: usize, cap: usize) -> usize {
    let cap = cap.max(1);
    requested.map_or(default, |v| usize::try_from(v).unwrap_or(0)).clamp(1, cap)
}

/// `[trace]` section of the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileTrace {
    /// Default iteration budget.
    pub default_max_iterations: Option<usize>,
    /// Default tree depth.
    pub default_max_depth: Option<usize>,
    /// Iteration cap.
    pub max_iterations_cap: Option<usize>,
    /// Depth cap.
    pub max_depth_cap: Option<usize>,
}
