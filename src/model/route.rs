//! 路由表项
//!
//! 定义静态路由条目及其前缀匹配。

use serde::{Deserialize, Serialize};

/// 节点的路由配置模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// GlobalRoutingHelper 自动最短路径
    #[default]
    Auto,
    /// 仅使用用户配置的静态路由
    Manual,
}

/// 一条静态路由
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    pub destination: String,
    pub prefix_length: u8,
    pub gateway: String,
    #[serde(default)]
    pub interface: u32,
    #[serde(default = "default_metric")]
    pub metric: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_metric() -> u32 {
    1
}

fn default_enabled() -> bool {
    true
}

/// 把点分十进制 IPv4 地址解析为 u32。
pub(crate) fn parse_ipv4(s: &str) -> Option<u32> {
    let mut parts = s.split('.');
    let mut addr: u32 = 0;
    for _ in 0..4 {
        let octet: u32 = parts.next()?.parse().ok()?;
        if octet > 255 {
            return None;
        }
        addr = (addr << 8) | octet;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(addr)
}

/// 前缀长度对应的掩码值
fn mask_bits(prefix_length: u8) -> u32 {
    if prefix_length == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix_length.min(32)))
    }
}

impl RouteEntry {
    pub fn new(destination: impl Into<String>, prefix_length: u8, gateway: impl Into<String>) -> Self {
        RouteEntry {
            destination: destination.into(),
            prefix_length,
            gateway: gateway.into(),
            interface: 0,
            metric: default_metric(),
            enabled: true,
        }
    }

    /// 默认路由（0.0.0.0/0 经网关）
    pub fn default_route(gateway: impl Into<String>, interface: u32) -> Self {
        RouteEntry {
            destination: "0.0.0.0".to_string(),
            prefix_length: 0,
            gateway: gateway.into(),
            interface,
            metric: default_metric(),
            enabled: true,
        }
    }

    /// 前缀长度转点分十进制掩码
    pub fn netmask(&self) -> String {
        let bits = mask_bits(self.prefix_length);
        format!(
            "{}.{}.{}.{}",
            (bits >> 24) & 0xFF,
            (bits >> 16) & 0xFF,
            (bits >> 8) & 0xFF,
            bits & 0xFF
        )
    }

    /// CIDR 表示
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.destination, self.prefix_length)
    }

    pub fn is_default_route(&self) -> bool {
        self.destination == "0.0.0.0" && self.prefix_length == 0
    }

    /// 直连路由（无网关，ns-3 在分配地址时自动添加）
    pub fn is_direct(&self) -> bool {
        self.gateway == "0.0.0.0" || self.gateway.is_empty()
    }

    /// 目标地址是否落在本条路由的网段内
    pub fn matches(&self, ip: &str) -> bool {
        let (Some(ip), Some(dest)) = (parse_ipv4(ip), parse_ipv4(&self.destination)) else {
            return false;
        };
        let mask = mask_bits(self.prefix_length);
        (ip & mask) == (dest & mask)
    }
}
