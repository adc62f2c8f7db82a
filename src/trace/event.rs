//! 包事件
//!
//! 跟踪文件中的单条包级事件，时间统一为纳秒。

use serde::{Deserialize, Serialize};

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEventKind {
    Tx,
    Rx,
    Enqueue,
    Dequeue,
    Drop,
}

impl TraceEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceEventKind::Tx => "TX",
            TraceEventKind::Rx => "RX",
            TraceEventKind::Enqueue => "ENQ",
            TraceEventKind::Dequeue => "DEQ",
            TraceEventKind::Drop => "DROP",
        }
    }
}

/// 一条包级跟踪事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketEvent {
    /// 事件时刻（纳秒）
    pub time_ns: u64,
    pub kind: TraceEventKind,
    /// 事件发生的节点索引
    pub node: u64,
    /// 节点上的设备索引
    pub device: u32,
    /// 包大小（字节）
    pub size: u32,
    /// 发送端节点索引（未知时为 None）
    #[serde(default)]
    pub source: Option<u64>,
    /// 接收端节点索引（未知时为 None）
    #[serde(default)]
    pub target: Option<u64>,
    #[serde(default)]
    pub link_id: String,
    #[serde(default)]
    pub protocol: String,
}

impl PacketEvent {
    pub fn time_s(&self) -> f64 {
        self.time_ns as f64 / 1e9
    }

    pub fn time_ms(&self) -> f64 {
        self.time_ns as f64 / 1e6
    }
}
