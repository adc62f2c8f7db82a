//! 端口配置
//!
//! 定义网络设备上的物理/逻辑端口。

use super::id::LinkId;
use serde::{Deserialize, Serialize};

/// 端口类型（决定默认速率与命名前缀）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    Ethernet,
    FastEthernet,
    GigabitEthernet,
    TenGigabit,
    Serial,
    Fiber,
    Wireless,
}

impl PortKind {
    /// 默认链路速率（ns-3 DataRate 字符串）
    pub fn default_speed(&self) -> &'static str {
        match self {
            PortKind::Ethernet => "10Mbps",
            PortKind::FastEthernet => "100Mbps",
            PortKind::GigabitEthernet => "1Gbps",
            PortKind::TenGigabit => "10Gbps",
            PortKind::Serial => "1.544Mbps",
            PortKind::Fiber => "10Gbps",
            PortKind::Wireless => "54Mbps",
        }
    }

    /// 端口命名前缀（eth0 / gi0 / se0 等）
    pub fn name_prefix(&self) -> &'static str {
        match self {
            PortKind::Ethernet => "eth",
            PortKind::FastEthernet => "fa",
            PortKind::GigabitEthernet => "gi",
            PortKind::TenGigabit => "te",
            PortKind::Serial => "se",
            PortKind::Fiber => "fi",
            PortKind::Wireless => "wlan",
        }
    }
}

/// 端口配置：物理层参数 + 网络层地址 + 链路绑定。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortConfig {
    pub number: u32,
    pub name: String,
    pub kind: PortKind,
    pub speed: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_mtu")]
    pub mtu: u32,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default = "default_netmask")]
    pub netmask: String,
    #[serde(default)]
    pub connected_link: Option<LinkId>,
}

fn default_true() -> bool {
    true
}

fn default_mtu() -> u32 {
    1500
}

fn default_netmask() -> String {
    "255.255.255.0".to_string()
}

impl PortConfig {
    pub fn new(number: u32, kind: PortKind) -> Self {
        PortConfig {
            number,
            name: format!("{}{}", kind.name_prefix(), number),
            kind,
            speed: kind.default_speed().to_string(),
            enabled: true,
            mtu: default_mtu(),
            ip_address: None,
            netmask: default_netmask(),
            connected_link: None,
        }
    }

    /// 端口是否已接入链路
    pub fn is_connected(&self) -> bool {
        self.connected_link.is_some()
    }

    /// 可否用于新链路（启用且空闲）
    pub fn is_available(&self) -> bool {
        self.enabled && !self.is_connected()
    }
}
