//! 网络拓扑模型
//!
//! 整个拓扑的根结构：节点、链路、端口绑定与地址自动分配。
//! 节点/链路使用 BTreeMap，保证脚本生成时的确定性遍历顺序。

use std::collections::BTreeMap;
use std::path::Path;

use super::error::ModelError;
use super::id::{LinkId, NodeId};
use super::link::{ChannelKind, Endpoint, LinkModel};
use super::node::{NodeKind, NodeModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const TOPOLOGY_SCHEMA_VERSION: u32 = 1;

/// 网络拓扑
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkModel {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub nodes: BTreeMap<NodeId, NodeModel>,
    pub links: BTreeMap<LinkId, LinkModel>,
    /// 仿真时长（秒）
    #[serde(default = "default_duration")]
    pub duration_s: f64,

    // 运行期计数器，从现有内容恢复，不持久化
    #[serde(skip)]
    next_node_id: u64,
    #[serde(skip)]
    next_link_id: u64,
}

fn default_schema_version() -> u32 {
    TOPOLOGY_SCHEMA_VERSION
}

fn default_duration() -> f64 {
    10.0
}

impl Default for NetworkModel {
    fn default() -> Self {
        NetworkModel {
            schema_version: TOPOLOGY_SCHEMA_VERSION,
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            duration_s: default_duration(),
            next_node_id: 0,
            next_link_id: 0,
        }
    }
}

impl NetworkModel {
    /// 添加节点，分配下一个可用 id 并创建默认端口
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        self.nodes.insert(id, NodeModel::new(id, kind));
        debug!(node = %id, kind = kind.label(), "添加节点");
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeModel> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeModel> {
        self.nodes.get_mut(&id)
    }

    pub fn link(&self, id: LinkId) -> Option<&LinkModel> {
        self.links.get(&id)
    }

    pub fn link_mut(&mut self, id: LinkId) -> Option<&mut LinkModel> {
        self.links.get_mut(&id)
    }

    /// 删除节点并级联删除其所有链路
    pub fn remove_node(&mut self, id: NodeId) -> Result<NodeModel, ModelError> {
        if !self.nodes.contains_key(&id) {
            return Err(ModelError::UnknownNode(id));
        }
        let attached: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| l.touches(id))
            .map(|l| l.id)
            .collect();
        for link in attached {
            self.remove_link(link)?;
        }
        Ok(self.nodes.remove(&id).expect("presence checked above"))
    }

    /// 在两个节点之间建链。
    ///
    /// 端口缺省时自动选取两端第一个空闲端口；随后绑定端口并分配 IP。
    pub fn add_link(
        &mut self,
        source: NodeId,
        target: NodeId,
        channel: ChannelKind,
    ) -> Result<LinkId, ModelError> {
        let source_port = self
            .nodes
            .get(&source)
            .ok_or(ModelError::UnknownNode(source))?
            .free_port()
            .ok_or(ModelError::NoFreePort(source))?;
        let target_port = self
            .nodes
            .get(&target)
            .ok_or(ModelError::UnknownNode(target))?
            .free_port()
            .ok_or(ModelError::NoFreePort(target))?;
        self.add_link_on_ports(
            Endpoint { node: source, port: source_port },
            Endpoint { node: target, port: target_port },
            channel,
        )
    }

    /// 在指定端口之间建链
    pub fn add_link_on_ports(
        &mut self,
        a: Endpoint,
        b: Endpoint,
        channel: ChannelKind,
    ) -> Result<LinkId, ModelError> {
        for ep in [a, b] {
            let node = self.nodes.get(&ep.node).ok_or(ModelError::UnknownNode(ep.node))?;
            let port = node
                .port(ep.port)
                .ok_or(ModelError::UnknownPort { node: ep.node, port: ep.port })?;
            if port.is_connected() {
                return Err(ModelError::PortInUse { node: ep.node, port: ep.port });
            }
        }
        if self.links.values().any(|l| l.joins(a, b)) {
            return Err(ModelError::DuplicateLink);
        }

        let id = LinkId(self.next_link_id);
        self.next_link_id += 1;
        self.links.insert(id, LinkModel::new(id, channel, a, b));

        for ep in [a, b] {
            let port = self
                .nodes
                .get_mut(&ep.node)
                .and_then(|n| n.port_mut(ep.port))
                .expect("endpoint validated above");
            port.connected_link = Some(id);
        }

        self.assign_link_addresses(id);
        debug!(link = %id, a = %a.node, b = %b.node, "添加链路");
        Ok(id)
    }

    /// 删除链路并解除端口绑定、清除地址
    pub fn remove_link(&mut self, id: LinkId) -> Result<LinkModel, ModelError> {
        let link = self.links.remove(&id).ok_or(ModelError::UnknownLink(id))?;
        for ep in [link.a, link.b] {
            if let Some(port) = self.nodes.get_mut(&ep.node).and_then(|n| n.port_mut(ep.port)) {
                port.connected_link = None;
                port.ip_address = None;
            }
        }
        Ok(link)
    }

    /// 建链后的地址分配。
    ///
    /// 规则：
    /// 1. 一端是配置了网段基址的交换机 → 对端主机取该网段下一个空闲地址
    /// 2. 交换机端口（二层设备）不配地址
    /// 3. 其余情况按 10.0.<n>.1/2 顺序开新点对点网段
    fn assign_link_addresses(&mut self, id: LinkId) {
        let Some(link) = self.links.get(&id) else { return };
        let (a, b) = (link.a, link.b);
        let a_switch = self.nodes.get(&a.node).is_some_and(|n| n.kind.is_switch());
        let b_switch = self.nodes.get(&b.node).is_some_and(|n| n.kind.is_switch());

        match (a_switch, b_switch) {
            (true, true) => {}
            (true, false) | (false, true) => {
                let (switch, host) = if a_switch { (a, b) } else { (b, a) };
                let subnet = self
                    .nodes
                    .get(&switch.node)
                    .and_then(|n| n.subnet_base.clone().map(|base| (base, n.subnet_mask.clone())));
                if let Some((base, mask)) = subnet {
                    let octet = self.next_host_octet(switch.node, &base);
                    if let Some(addr) = subnet_host_address(&base, octet) {
                        if let Some(port) =
                            self.nodes.get_mut(&host.node).and_then(|n| n.port_mut(host.port))
                        {
                            port.ip_address = Some(addr);
                            port.netmask = mask;
                        }
                    }
                }
            }
            (false, false) => {
                let subnet = self.next_p2p_subnet();
                for (ep, host) in [(a, 1u8), (b, 2u8)] {
                    if let Some(port) = self.nodes.get_mut(&ep.node).and_then(|n| n.port_mut(ep.port)) {
                        port.ip_address = Some(format!("10.0.{subnet}.{host}"));
                        port.netmask = "255.255.255.0".to_string();
                    }
                }
            }
        }
    }

    /// 交换机网段中下一个空闲主机号（跳过 .0，占用号取最大值 +1）
    fn next_host_octet(&self, switch: NodeId, base: &str) -> u8 {
        let prefix = match base.rsplit_once('.') {
            Some((head, _)) => format!("{head}."),
            None => return 1,
        };
        let mut max_used = 0u8;
        for link in self.links.values() {
            let Some(peer) = link.peer_of(switch) else { continue };
            let Some(port) = self
                .nodes
                .get(&peer.node)
                .and_then(|n| n.port(peer.port))
            else {
                continue;
            };
            if let Some(octet) = port
                .ip_address
                .as_deref()
                .and_then(|ip| ip.strip_prefix(&prefix))
                .and_then(|rest| rest.parse::<u8>().ok())
            {
                max_used = max_used.max(octet);
            }
        }
        max_used.saturating_add(1).max(1)
    }

    /// 下一个未使用的 10.0.<n>.0 点对点网段号
    fn next_p2p_subnet(&self) -> u32 {
        let mut max_used = 0u32;
        for node in self.nodes.values() {
            for port in &node.ports {
                if let Some(n) = port
                    .ip_address
                    .as_deref()
                    .and_then(|ip| ip.strip_prefix("10.0."))
                    .and_then(|rest| rest.split('.').next())
                    .and_then(|n| n.parse::<u32>().ok())
                {
                    max_used = max_used.max(n);
                }
            }
        }
        max_used + 1
    }

    /// 修改交换机网段基址后，为其后面的所有主机重新编址
    pub fn reassign_switch_subnet(&mut self, switch: NodeId) -> Result<(), ModelError> {
        let node = self.nodes.get(&switch).ok_or(ModelError::UnknownNode(switch))?;
        if !node.kind.is_switch() {
            return Ok(());
        }
        let Some((base, mask)) = node.subnet_base.clone().map(|b| (b, node.subnet_mask.clone()))
        else {
            return Ok(());
        };

        let peers: Vec<Endpoint> = self
            .links
            .values()
            .filter_map(|l| l.peer_of(switch))
            .collect();
        let mut octet = 1u8;
        for peer in peers {
            let is_switch = self.nodes.get(&peer.node).is_some_and(|n| n.kind.is_switch());
            if is_switch {
                continue;
            }
            if let Some(addr) = subnet_host_address(&base, octet) {
                if let Some(port) = self.nodes.get_mut(&peer.node).and_then(|n| n.port_mut(peer.port)) {
                    port.ip_address = Some(addr);
                    port.netmask = mask.clone();
                    octet = octet.saturating_add(1);
                }
            }
        }
        Ok(())
    }

    /// 校验交叉引用并恢复 id 计数器（加载后调用）。
    pub fn validate(&mut self) -> Result<(), ModelError> {
        if self.schema_version > TOPOLOGY_SCHEMA_VERSION {
            return Err(ModelError::SchemaVersion(self.schema_version));
        }
        for link in self.links.values() {
            for ep in [link.a, link.b] {
                let node = self.nodes.get(&ep.node).ok_or(ModelError::UnknownNode(ep.node))?;
                let port = node.port(ep.port).ok_or(ModelError::DanglingPort {
                    link: link.id,
                    node: ep.node,
                    port: ep.port,
                })?;
                if port.connected_link != Some(link.id) {
                    return Err(ModelError::BindingMismatch {
                        link: link.id,
                        node: ep.node,
                        port: ep.port,
                    });
                }
            }
        }
        for node in self.nodes.values() {
            for port in &node.ports {
                if let Some(link) = port.connected_link {
                    let model = self.links.get(&link).ok_or(ModelError::UnknownLink(link))?;
                    if model.endpoint_of(node.id).map(|ep| ep.port) != Some(port.number) {
                        return Err(ModelError::BindingMismatch {
                            link,
                            node: node.id,
                            port: port.number,
                        });
                    }
                }
            }
        }
        self.next_node_id = self.nodes.keys().map(|id| id.0 + 1).max().unwrap_or(0);
        self.next_link_id = self.links.keys().map(|id| id.0 + 1).max().unwrap_or(0);
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let mut model: NetworkModel = serde_json::from_str(raw)?;
        model.validate()?;
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let raw = self.to_json()?;
        std::fs::write(path, raw).map_err(|source| ModelError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), nodes = self.nodes.len(), links = self.links.len(), "拓扑已保存");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_json(&raw)?;
        info!(path = %path.display(), nodes = model.nodes.len(), links = model.links.len(), "拓扑已加载");
        Ok(model)
    }

    /// 节点 id → 生成脚本中的顺序下标
    pub fn node_indices(&self) -> BTreeMap<NodeId, usize> {
        self.nodes.keys().enumerate().map(|(idx, id)| (*id, idx)).collect()
    }
}

/// 在网段基址上取第 `octet` 个主机地址
fn subnet_host_address(base: &str, octet: u8) -> Option<String> {
    let (head, _) = base.rsplit_once('.')?;
    if octet == 0 || octet == 255 {
        return None;
    }
    Some(format!("{head}.{octet}"))
}
