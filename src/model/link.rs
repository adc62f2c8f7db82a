//! 链路模型
//!
//! 定义两个端口之间的网络链路。

use super::id::{LinkId, NodeId};
use serde::{Deserialize, Serialize};

/// 信道类型
///
/// 交换机互联必须用 CSMA（P2P 设备不支持 SendFrom 桥接）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    #[default]
    PointToPoint,
    Csma,
}

/// 链路端点：节点 + 端口号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub node: NodeId,
    pub port: u32,
}

/// 网络链路
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkModel {
    pub id: LinkId,
    #[serde(default)]
    pub channel: ChannelKind,
    pub a: Endpoint,
    pub b: Endpoint,
    #[serde(default = "default_data_rate")]
    pub data_rate: String,
    #[serde(default = "default_delay")]
    pub delay: String,
}

fn default_data_rate() -> String {
    "100Mbps".to_string()
}

fn default_delay() -> String {
    "2ms".to_string()
}

impl LinkModel {
    pub fn new(id: LinkId, channel: ChannelKind, a: Endpoint, b: Endpoint) -> Self {
        LinkModel {
            id,
            channel,
            a,
            b,
            data_rate: default_data_rate(),
            delay: default_delay(),
        }
    }

    pub fn name(&self) -> String {
        format!("link_{}", self.id.0)
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.a.node == node || self.b.node == node
    }

    /// 给定一端节点，返回对端
    pub fn peer_of(&self, node: NodeId) -> Option<Endpoint> {
        if self.a.node == node {
            Some(self.b)
        } else if self.b.node == node {
            Some(self.a)
        } else {
            None
        }
    }

    /// 节点在本链路上的端点
    pub fn endpoint_of(&self, node: NodeId) -> Option<Endpoint> {
        if self.a.node == node {
            Some(self.a)
        } else if self.b.node == node {
            Some(self.b)
        } else {
            None
        }
    }

    /// 两条端点是否与给定端点对相同（忽略方向）
    pub fn joins(&self, x: Endpoint, y: Endpoint) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}
