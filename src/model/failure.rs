//! Failure scenario model.
//!
//! Failure events are injected into generated scripts as
//! `Simulator.Schedule` calls that flip device attributes at trigger time.

use std::path::Path;

use super::error::ModelError;
use super::id::{LinkId, NodeId};
use super::network::NetworkModel;
use serde::{Deserialize, Serialize};

/// The failure kinds the script generator can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    LinkDown,
    LinkUp,
    /// Reduced data rate and/or extra delay on a link.
    LinkDegraded,
    /// Attach a RateErrorModel with the configured error rate.
    LinkErrorRate,
    /// Repeated down/up cycles.
    LinkFlapping,
    NodeDown,
    NodeUp,
}

impl FailureKind {
    pub fn targets_link(&self) -> bool {
        !matches!(self, FailureKind::NodeDown | FailureKind::NodeUp)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::LinkDown => "LINK DOWN",
            FailureKind::LinkUp => "LINK UP",
            FailureKind::LinkDegraded => "LINK DEGRADED",
            FailureKind::LinkErrorRate => "LINK ERROR RATE",
            FailureKind::LinkFlapping => "LINK FLAPPING",
            FailureKind::NodeDown => "NODE DOWN",
            FailureKind::NodeUp => "NODE UP",
        }
    }
}

/// What a failure event acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureTarget {
    Link(LinkId),
    Node(NodeId),
}

/// Kind-specific parameters. Only the fields a kind reads are consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureParams {
    #[serde(default)]
    pub new_data_rate: Option<String>,
    #[serde(default)]
    pub new_delay: Option<String>,
    #[serde(default = "default_error_rate")]
    pub error_rate: f64,
    #[serde(default = "default_up_s")]
    pub up_s: f64,
    #[serde(default = "default_down_s")]
    pub down_s: f64,
    #[serde(default = "default_cycles")]
    pub cycles: u32,
}

fn default_error_rate() -> f64 {
    0.001
}

fn default_up_s() -> f64 {
    5.0
}

fn default_down_s() -> f64 {
    2.0
}

fn default_cycles() -> u32 {
    3
}

impl Default for FailureParams {
    fn default() -> Self {
        FailureParams {
            new_data_rate: None,
            new_delay: None,
            error_rate: default_error_rate(),
            up_s: default_up_s(),
            down_s: default_down_s(),
            cycles: default_cycles(),
        }
    }
}

/// A single scheduled failure event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureEvent {
    pub name: String,
    pub kind: FailureKind,
    pub target: FailureTarget,
    /// Trigger time in simulation seconds.
    pub at_s: f64,
    /// When set, a recovery action is scheduled `duration_s` later.
    #[serde(default)]
    pub duration_s: Option<f64>,
    #[serde(default)]
    pub params: FailureParams,
}

impl FailureEvent {
    pub fn recovery_time_s(&self) -> Option<f64> {
        self.duration_s.map(|d| self.at_s + d)
    }
}

/// A named, ordered collection of failure events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailureScenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub events: Vec<FailureEvent>,
}

impl FailureScenario {
    /// Events ordered by trigger time.
    pub fn sorted_events(&self) -> Vec<&FailureEvent> {
        let mut events: Vec<&FailureEvent> = self.events.iter().collect();
        events.sort_by(|a, b| a.at_s.total_cmp(&b.at_s));
        events
    }

    /// Check every event against the topology and the simulation window.
    pub fn validate(&self, network: &NetworkModel, duration_s: f64) -> Result<(), ModelError> {
        for event in &self.events {
            let known = match event.target {
                FailureTarget::Link(id) => network.link(id).is_some(),
                FailureTarget::Node(id) => network.node(id).is_some(),
            };
            if !known {
                return Err(ModelError::UnknownFailureTarget(event.name.clone()));
            }
            if event.at_s >= duration_s {
                return Err(ModelError::EventPastEnd {
                    event: event.name.clone(),
                    at_s: event.at_s,
                    duration_s,
                });
            }
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw).map_err(|source| ModelError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
