//! 网络拓扑数据模型
//!
//! 节点、端口、链路、路由、流量与故障场景的纯数据层，
//! 供脚本生成器与项目存储使用。JSON 序列化即存盘格式。

mod error;
mod failure;
mod flow;
mod id;
mod link;
mod network;
mod node;
mod port;
mod route;

pub use error::ModelError;
pub use failure::{FailureEvent, FailureKind, FailureParams, FailureScenario, FailureTarget};
pub use flow::{SimulationConfig, TrafficApp, TrafficFlow, TrafficProtocol};
pub use id::{FlowId, LinkId, NodeId};
pub use link::{ChannelKind, Endpoint, LinkModel};
pub use network::{NetworkModel, TOPOLOGY_SCHEMA_VERSION};
pub use node::{NodeKind, NodeModel, Position};
pub use port::{PortConfig, PortKind};
pub use route::{RouteEntry, RoutingMode};
