//! 节点模型
//!
//! 定义网络节点（主机、路由器、交换机、无线站点/AP）。

use super::id::{LinkId, NodeId};
use super::port::{PortConfig, PortKind};
use super::route::{RouteEntry, RoutingMode};
use serde::{Deserialize, Serialize};

/// 节点类型
///
/// ns-3 中所有节点都是通用 Node；类型决定默认端口配置、
/// 协议栈安装方式（交换机走 BridgeHelper）以及编辑器图标。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Host,
    Router,
    Switch,
    Station,
    AccessPoint,
}

impl NodeKind {
    /// 默认端口数量与端口类型
    pub fn default_ports(&self) -> (u32, PortKind) {
        match self {
            NodeKind::Host => (1, PortKind::GigabitEthernet),
            NodeKind::Router => (4, PortKind::GigabitEthernet),
            NodeKind::Switch => (8, PortKind::GigabitEthernet),
            NodeKind::Station => (1, PortKind::Wireless),
            // 1 个无线口 + 1 个有线上联口
            NodeKind::AccessPoint => (2, PortKind::Wireless),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Host => "host",
            NodeKind::Router => "router",
            NodeKind::Switch => "switch",
            NodeKind::Station => "station",
            NodeKind::AccessPoint => "access_point",
        }
    }

    /// 交换机不安装 IP 协议栈、端口不配地址
    pub fn is_switch(&self) -> bool {
        matches!(self, NodeKind::Switch)
    }
}

/// 画布坐标（仅持久化，逻辑上不参与仿真）
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// 网络节点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeModel {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    #[serde(default)]
    pub position: Position,
    pub ports: Vec<PortConfig>,

    #[serde(default)]
    pub routing_mode: RoutingMode,
    #[serde(default)]
    pub routing_table: Vec<RouteEntry>,
    #[serde(default)]
    pub default_gateway: Option<String>,

    /// 交换机网段基址（如 "192.168.1.0"）；设置后接入主机按序取址
    #[serde(default)]
    pub subnet_base: Option<String>,
    #[serde(default = "default_subnet_mask")]
    pub subnet_mask: String,

    #[serde(default)]
    pub description: String,
}

fn default_subnet_mask() -> String {
    "255.255.255.0".to_string()
}

impl NodeModel {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        let (count, port_kind) = kind.default_ports();
        let ports = (0..count).map(|n| PortConfig::new(n, port_kind)).collect();
        NodeModel {
            id,
            kind,
            name: format!("{}_{}", kind.label(), id.0),
            position: Position::default(),
            ports,
            routing_mode: RoutingMode::Auto,
            routing_table: Vec::new(),
            default_gateway: None,
            subnet_base: None,
            subnet_mask: default_subnet_mask(),
            description: String::new(),
        }
    }

    /// 追加一个新端口
    pub fn add_port(&mut self, kind: PortKind) -> &PortConfig {
        let number = self.ports.iter().map(|p| p.number + 1).max().unwrap_or(0);
        self.ports.push(PortConfig::new(number, kind));
        self.ports.last().expect("port just pushed")
    }

    pub fn port(&self, number: u32) -> Option<&PortConfig> {
        self.ports.iter().find(|p| p.number == number)
    }

    pub fn port_mut(&mut self, number: u32) -> Option<&mut PortConfig> {
        self.ports.iter_mut().find(|p| p.number == number)
    }

    /// 第一个启用且空闲的端口号
    pub fn free_port(&self) -> Option<u32> {
        self.ports.iter().find(|p| p.is_available()).map(|p| p.number)
    }

    /// 绑定到指定链路的端口
    pub fn port_for_link(&self, link: LinkId) -> Option<&PortConfig> {
        self.ports.iter().find(|p| p.connected_link == Some(link))
    }

    pub fn port_for_link_mut(&mut self, link: LinkId) -> Option<&mut PortConfig> {
        self.ports.iter_mut().find(|p| p.connected_link == Some(link))
    }

    /// 启用的静态路由（按 metric 排序）
    pub fn active_routes(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routing_table.iter().filter(|r| r.enabled)
    }

    pub fn has_default_route(&self) -> bool {
        self.active_routes().any(|r| r.is_default_route())
    }

    /// 设置/替换默认网关路由
    pub fn set_default_gateway(&mut self, gateway: impl Into<String>, interface: u32) {
        let gateway = gateway.into();
        self.routing_table.retain(|r| !r.is_default_route());
        if !gateway.is_empty() {
            self.routing_table.push(RouteEntry::default_route(gateway.clone(), interface));
            self.default_gateway = Some(gateway);
        } else {
            self.default_gateway = None;
        }
    }
}
