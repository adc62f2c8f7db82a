//! Per-flow statistics scraped from the simulation console output.
//!
//! Generated scripts end with a `SIMULATION RESULTS` section printing one
//! block per monitored flow. This parser is tolerant: blocks with missing
//! lines keep their defaults, unrelated console noise is ignored.

use serde::{Deserialize, Serialize};

/// Statistics for one monitored flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowStats {
    pub flow_id: u32,
    pub protocol: String,
    /// `address:port` of the sender.
    pub source: String,
    /// `address:port` of the receiver.
    pub target: String,
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub lost_packets: u64,
    pub throughput_mbps: f64,
    pub mean_delay_ms: f64,
    pub mean_jitter_ms: f64,
}

impl FlowStats {
    pub fn packet_loss_percent(&self) -> f64 {
        if self.tx_packets == 0 {
            return 0.0;
        }
        self.lost_packets as f64 / self.tx_packets as f64 * 100.0
    }
}

/// Aggregate view over all flows of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub flows: Vec<FlowStats>,
    pub total_tx_packets: u64,
    pub total_rx_packets: u64,
    pub total_lost_packets: u64,
}

impl SimulationSummary {
    pub fn from_flows(flows: Vec<FlowStats>) -> Self {
        let total_tx_packets = flows.iter().map(|f| f.tx_packets).sum();
        let total_rx_packets = flows.iter().map(|f| f.rx_packets).sum();
        let total_lost_packets = flows.iter().map(|f| f.lost_packets).sum();
        SimulationSummary {
            flows,
            total_tx_packets,
            total_rx_packets,
            total_lost_packets,
        }
    }

    pub fn loss_percent(&self) -> f64 {
        if self.total_tx_packets == 0 {
            return 0.0;
        }
        self.total_lost_packets as f64 / self.total_tx_packets as f64 * 100.0
    }
}

/// Extract per-flow blocks from a run's console output.
pub fn parse_console_stats(console: &str) -> Vec<FlowStats> {
    let mut flows = Vec::new();
    let mut in_results = false;
    let mut current: Option<FlowStats> = None;

    for line in console.lines() {
        let line = line.trim();
        if line == "SIMULATION RESULTS" {
            in_results = true;
            continue;
        }
        if !in_results {
            continue;
        }
        if let Some(header) = parse_flow_header(line) {
            if let Some(done) = current.take() {
                flows.push(done);
            }
            current = Some(header);
            continue;
        }
        let Some(flow) = current.as_mut() else {
            continue;
        };
        if let Some((src, dst)) = parse_address_line(line) {
            flow.source = src;
            flow.target = dst;
        } else if let Some(v) = field_value(line, "Tx Packets:") {
            flow.tx_packets = v.parse().unwrap_or(0);
        } else if let Some(v) = field_value(line, "Rx Packets:") {
            flow.rx_packets = v.parse().unwrap_or(0);
        } else if let Some(v) = field_value(line, "Tx Bytes:") {
            flow.tx_bytes = v.parse().unwrap_or(0);
        } else if let Some(v) = field_value(line, "Rx Bytes:") {
            flow.rx_bytes = v.parse().unwrap_or(0);
        } else if let Some(v) = field_value(line, "Lost Packets:") {
            flow.lost_packets = v.parse().unwrap_or(0);
        } else if let Some(v) = field_value(line, "Throughput:") {
            flow.throughput_mbps = parse_unit_number(v);
        } else if let Some(v) = field_value(line, "Mean Delay:") {
            flow.mean_delay_ms = parse_unit_number(v);
        } else if let Some(v) = field_value(line, "Mean Jitter:") {
            flow.mean_jitter_ms = parse_unit_number(v);
        }
    }
    if let Some(done) = current.take() {
        flows.push(done);
    }
    flows
}

/// `Flow 3 (UDP)` -> a fresh block.
fn parse_flow_header(line: &str) -> Option<FlowStats> {
    let rest = line.strip_prefix("Flow ")?;
    let (id, proto) = rest.split_once(' ')?;
    let flow_id = id.parse().ok()?;
    let protocol = proto.trim_start_matches('(').trim_end_matches(')').to_string();
    if protocol.is_empty() {
        return None;
    }
    Some(FlowStats {
        flow_id,
        protocol,
        ..FlowStats::default()
    })
}

/// `10.1.1.1:49153 -> 10.1.2.2:9000`
fn parse_address_line(line: &str) -> Option<(String, String)> {
    let (src, dst) = line.split_once("->")?;
    let src = src.trim();
    let dst = dst.trim();
    if !src.contains(':') || !dst.contains(':') {
        return None;
    }
    Some((src.to_string(), dst.to_string()))
}

fn field_value<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.strip_prefix(prefix).map(str::trim)
}

/// First whitespace-separated token as a number, unit suffix dropped.
fn parse_unit_number(value: &str) -> f64 {
    value
        .split_whitespace()
        .next()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0.0)
}
