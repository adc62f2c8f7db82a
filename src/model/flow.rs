//! 流量配置
//!
//! 定义流量流与仿真配置（对应 ns-3 应用层）。

use std::path::Path;

use super::error::ModelError;
use super::id::{FlowId, NodeId};
use serde::{Deserialize, Serialize};

/// 传输协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficProtocol {
    #[default]
    Udp,
    Tcp,
}

impl TrafficProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficProtocol::Udp => "UDP",
            TrafficProtocol::Tcp => "TCP",
        }
    }

    /// IP 协议号（FlowMonitor 口径）
    pub fn number(&self) -> u8 {
        match self {
            TrafficProtocol::Udp => 17,
            TrafficProtocol::Tcp => 6,
        }
    }
}

/// 应用类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficApp {
    /// UDP Echo 请求/响应
    #[default]
    Echo,
    /// 恒定速率开关流
    OnOff,
    /// TCP 批量传输
    Bulk,
}

/// 一条流量流：源/目的节点、协议、应用与时序参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficFlow {
    pub id: FlowId,
    #[serde(default)]
    pub name: String,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub protocol: TrafficProtocol,
    #[serde(default)]
    pub app: TrafficApp,
    #[serde(default = "default_start")]
    pub start_s: f64,
    #[serde(default = "default_stop")]
    pub stop_s: f64,
    #[serde(default = "default_data_rate")]
    pub data_rate: String,
    #[serde(default = "default_packet_size")]
    pub packet_size: u32,
    #[serde(default = "default_echo_packets")]
    pub echo_packets: u32,
    #[serde(default = "default_echo_interval")]
    pub echo_interval_s: f64,
}

fn default_start() -> f64 {
    1.0
}

fn default_stop() -> f64 {
    9.0
}

fn default_data_rate() -> String {
    "500kb/s".to_string()
}

fn default_packet_size() -> u32 {
    1024
}

fn default_echo_packets() -> u32 {
    10
}

fn default_echo_interval() -> f64 {
    1.0
}

impl TrafficFlow {
    pub fn new(id: FlowId, source: NodeId, target: NodeId) -> Self {
        TrafficFlow {
            id,
            name: format!("flow_{}", id.0),
            source,
            target,
            protocol: TrafficProtocol::default(),
            app: TrafficApp::default(),
            start_s: default_start(),
            stop_s: default_stop(),
            data_rate: default_data_rate(),
            packet_size: default_packet_size(),
            echo_packets: default_echo_packets(),
            echo_interval_s: default_echo_interval(),
        }
    }
}

/// 仿真配置：时长、流量流与跟踪开关
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_duration")]
    pub duration_s: f64,
    #[serde(default)]
    pub flows: Vec<TrafficFlow>,
    #[serde(default)]
    pub enable_pcap: bool,
    #[serde(default = "default_on")]
    pub enable_ascii_trace: bool,
    #[serde(default = "default_on")]
    pub enable_flow_monitor: bool,
    #[serde(default = "default_seed")]
    pub random_seed: u64,
}

fn default_duration() -> f64 {
    10.0
}

fn default_on() -> bool {
    true
}

fn default_seed() -> u64 {
    1
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            duration_s: default_duration(),
            flows: Vec::new(),
            enable_pcap: false,
            enable_ascii_trace: true,
            enable_flow_monitor: true,
            random_seed: default_seed(),
        }
    }
}

impl SimulationConfig {
    /// 添加流量流，分配下一个可用 id
    pub fn add_flow(&mut self, source: NodeId, target: NodeId) -> &mut TrafficFlow {
        let id = FlowId(self.flows.iter().map(|f| f.id.0 + 1).max().unwrap_or(0));
        self.flows.push(TrafficFlow::new(id, source, target));
        self.flows.last_mut().expect("flow just pushed")
    }

    pub fn remove_flow(&mut self, id: FlowId) {
        self.flows.retain(|f| f.id != id);
    }

    pub fn flow(&self, id: FlowId) -> Option<&TrafficFlow> {
        self.flows.iter().find(|f| f.id == id)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw).map_err(|source| ModelError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}
