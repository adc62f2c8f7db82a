//! ns-3 Python script generation.
//!
//! Turns a topology plus a simulation config into a self-contained
//! cppyy-based ns-3 script. The script is sectioned (nodes, channels,
//! stack, addresses, routing, applications, failures, tracing, run) and
//! ends with a `SIMULATION RESULTS` console section that
//! [`crate::trace::parse_console_stats`] understands.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::model::{
    ChannelKind, FailureKind, FailureScenario, FailureTarget, LinkId, ModelError, NetworkModel,
    NodeId, RoutingMode, SimulationConfig, TrafficApp, TrafficFlow, TrafficProtocol,
};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("topology has no nodes")]
    EmptyTopology,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Knobs that do not live in the topology or simulation config.
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    /// Directory the running script writes traces and captures into.
    pub output_dir: String,
    /// Timestamp stamped into the header. `None` means "now".
    pub generated_at: Option<String>,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        ScriptOptions {
            output_dir: "results".to_string(),
            generated_at: None,
        }
    }
}

#[derive(Debug)]
pub struct GeneratedScript {
    pub code: String,
    /// Flows or events that were skipped, one message each.
    pub warnings: Vec<String>,
}

/// One installed channel: endpoint node/device indices plus the kind
/// actually used (switch endpoints force CSMA).
struct LinkPlan {
    id: LinkId,
    var: usize,
    name: String,
    csma: bool,
    a: EndpointPlan,
    b: EndpointPlan,
    data_rate: String,
    delay: String,
}

struct EndpointPlan {
    node: NodeId,
    node_idx: usize,
    device_idx: usize,
    is_switch: bool,
    ip: Option<(String, String)>,
}

pub struct ScriptGenerator<'a> {
    network: &'a NetworkModel,
    config: &'a SimulationConfig,
    failures: Option<&'a FailureScenario>,
    options: ScriptOptions,
}

impl<'a> ScriptGenerator<'a> {
    pub fn new(network: &'a NetworkModel, config: &'a SimulationConfig) -> Self {
        ScriptGenerator {
            network,
            config,
            failures: None,
            options: ScriptOptions::default(),
        }
    }

    pub fn with_failures(mut self, failures: &'a FailureScenario) -> Self {
        self.failures = Some(failures);
        self
    }

    pub fn with_options(mut self, options: ScriptOptions) -> Self {
        self.options = options;
        self
    }

    pub fn generate(&self) -> Result<GeneratedScript, GenError> {
        if self.network.nodes.is_empty() {
            return Err(GenError::EmptyTopology);
        }
        if let Some(failures) = self.failures {
            failures.validate(self.network, self.config.duration_s)?;
        }

        let indices = self.network.node_indices();
        let plans = self.plan_links(&indices);
        let mut warnings = Vec::new();
        let mut s = String::new();

        self.emit_header(&mut s);
        self.emit_nodes(&mut s, &indices);
        self.emit_channels(&mut s, &plans);
        self.emit_stack_and_bridges(&mut s, &indices, &plans);
        self.emit_addresses(&mut s, &plans);
        self.emit_routing(&mut s, &indices);
        self.emit_applications(&mut s, &indices, &mut warnings);
        self.emit_failures(&mut s, &indices, &plans, &mut warnings);
        self.emit_tracing(&mut s, &plans);
        self.emit_run(&mut s);

        info!(
            nodes = self.network.nodes.len(),
            links = self.network.links.len(),
            flows = self.config.flows.len(),
            "🐍 脚本生成完成"
        );
        Ok(GeneratedScript { code: s, warnings })
    }

    /// Generate and write the script in one go.
    pub fn write_to(&self, path: &Path) -> Result<GeneratedScript, GenError> {
        let script = self.generate()?;
        std::fs::write(path, &script.code).map_err(|source| GenError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(script)
    }

    fn plan_links(&self, indices: &BTreeMap<NodeId, usize>) -> Vec<LinkPlan> {
        let mut device_count: BTreeMap<NodeId, usize> = BTreeMap::new();
        let mut plans = Vec::new();
        for (var, link) in self.network.links.values().enumerate() {
            let mut endpoint = |ep: crate::model::Endpoint| {
                let node = self.network.node(ep.node);
                let device_idx = {
                    let count = device_count.entry(ep.node).or_insert(0);
                    let idx = *count;
                    *count += 1;
                    idx
                };
                EndpointPlan {
                    node: ep.node,
                    node_idx: indices.get(&ep.node).copied().unwrap_or(0),
                    device_idx,
                    is_switch: node.is_some_and(|n| n.kind.is_switch()),
                    ip: node.and_then(|n| n.port(ep.port)).and_then(|p| {
                        p.ip_address.clone().map(|ip| (ip, p.netmask.clone()))
                    }),
                }
            };
            let a = endpoint(link.a);
            let b = endpoint(link.b);
            let csma = link.channel == ChannelKind::Csma || a.is_switch || b.is_switch;
            plans.push(LinkPlan {
                id: link.id,
                var,
                name: link.name(),
                csma,
                a,
                b,
                data_rate: link.data_rate.clone(),
                delay: link.delay.clone(),
            });
        }
        plans
    }

    fn emit_header(&self, s: &mut String) {
        let stamp = match &self.options.generated_at {
            Some(at) => at.clone(),
            None => chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        s.push_str("#!/usr/bin/env python3\n");
        s.push_str("# ns-3 simulation script (auto-generated, do not edit)\n");
        writeln!(s, "# generated: {stamp}").unwrap();
        writeln!(
            s,
            "# nodes: {}, links: {}, flows: {}",
            self.network.nodes.len(),
            self.network.links.len(),
            self.config.flows.len()
        )
        .unwrap();
        s.push_str("\nfrom ns import ns\n");
    }

    fn emit_nodes(&self, s: &mut String, indices: &BTreeMap<NodeId, usize>) {
        s.push_str("\n# ---- Nodes ----\n");
        s.push_str("nodes = ns.NodeContainer()\n");
        writeln!(s, "nodes.Create({})", self.network.nodes.len()).unwrap();
        for node in self.network.nodes.values() {
            let idx = indices[&node.id];
            writeln!(s, "n_{idx} = nodes.Get({idx})  # {} ({})", node.name, node.kind.label())
                .unwrap();
        }
    }

    fn emit_channels(&self, s: &mut String, plans: &[LinkPlan]) {
        if plans.is_empty() {
            return;
        }
        s.push_str("\n# ---- Channels ----\n");
        for plan in plans {
            let k = plan.var;
            writeln!(s, "# {}: n_{} <-> n_{}", plan.name, plan.a.node_idx, plan.b.node_idx)
                .unwrap();
            if plan.csma {
                writeln!(s, "csma_{k} = ns.CsmaHelper()").unwrap();
                writeln!(
                    s,
                    "csma_{k}.SetChannelAttribute(\"DataRate\", ns.StringValue(\"{}\"))",
                    plan.data_rate
                )
                .unwrap();
                writeln!(
                    s,
                    "csma_{k}.SetChannelAttribute(\"Delay\", ns.StringValue(\"{}\"))",
                    plan.delay
                )
                .unwrap();
            } else {
                writeln!(s, "p2p_{k} = ns.PointToPointHelper()").unwrap();
                writeln!(
                    s,
                    "p2p_{k}.SetDeviceAttribute(\"DataRate\", ns.StringValue(\"{}\"))",
                    plan.data_rate
                )
                .unwrap();
                writeln!(
                    s,
                    "p2p_{k}.SetChannelAttribute(\"Delay\", ns.StringValue(\"{}\"))",
                    plan.delay
                )
                .unwrap();
            }
            writeln!(s, "pair_{k} = ns.NodeContainer()").unwrap();
            writeln!(s, "pair_{k}.Add(n_{})", plan.a.node_idx).unwrap();
            writeln!(s, "pair_{k}.Add(n_{})", plan.b.node_idx).unwrap();
            let helper = if plan.csma { "csma" } else { "p2p" };
            writeln!(s, "devs_{k} = {helper}_{k}.Install(pair_{k})").unwrap();
        }
    }

    fn emit_stack_and_bridges(
        &self,
        s: &mut String,
        indices: &BTreeMap<NodeId, usize>,
        plans: &[LinkPlan],
    ) {
        s.push_str("\n# ---- Internet stack ----\n");
        s.push_str("stack = ns.InternetStackHelper()\n");
        s.push_str("stack.Install(nodes)\n");

        for node in self.network.nodes.values().filter(|n| n.kind.is_switch()) {
            let idx = indices[&node.id];
            let ports: Vec<String> = plans
                .iter()
                .flat_map(|p| [(p.var, &p.a), (p.var, &p.b)])
                .filter(|(_, ep)| ep.node == node.id)
                .map(|(k, ep)| {
                    let slot = if plans[k].a.node == ep.node && plans[k].a.device_idx == ep.device_idx
                    {
                        0
                    } else {
                        1
                    };
                    format!("devs_{k}.Get({slot})")
                })
                .collect();
            if ports.is_empty() {
                continue;
            }
            writeln!(s, "# bridge on {} ({} ports)", node.name, ports.len()).unwrap();
            writeln!(s, "bridge_ports_{idx} = ns.NetDeviceContainer()").unwrap();
            for port in &ports {
                writeln!(s, "bridge_ports_{idx}.Add({port})").unwrap();
            }
            writeln!(s, "bridge_{idx} = ns.BridgeHelper()").unwrap();
            writeln!(s, "bridge_{idx}.Install(n_{idx}, bridge_ports_{idx})").unwrap();
        }
    }

    fn emit_addresses(&self, s: &mut String, plans: &[LinkPlan]) {
        if plans.is_empty() {
            return;
        }
        s.push_str("\n# ---- IP addresses ----\n");
        s.push_str(
            "def assign_address(node, device, address, netmask):\n\
             \x20   ipv4 = node.GetObject[ns.Ipv4]()\n\
             \x20   interface = ipv4.AddInterface(device)\n\
             \x20   ipv4.AddAddress(interface, ns.Ipv4InterfaceAddress(\n\
             \x20       ns.Ipv4Address(address), ns.Ipv4Mask(netmask)))\n\
             \x20   ipv4.SetUp(interface)\n",
        );
        let mut auto_subnet = 0u32;

        // unaddressed hosts behind one switch share a single auto subnet
        let mut in_segment: BTreeSet<(usize, usize)> = BTreeSet::new();
        for node in self.network.nodes.values().filter(|n| n.kind.is_switch()) {
            let members: Vec<(usize, usize)> = plans
                .iter()
                .flat_map(|p| [(p.var, 0usize, &p.a, &p.b), (p.var, 1usize, &p.b, &p.a)])
                .filter(|(_, _, ep, peer)| {
                    peer.node == node.id && !ep.is_switch && ep.ip.is_none()
                })
                .map(|(var, slot, _, _)| (var, slot))
                .collect();
            if members.is_empty() {
                continue;
            }
            auto_subnet += 1;
            writeln!(s, "# shared segment behind {}", node.name).unwrap();
            writeln!(s, "addr_{auto_subnet} = ns.Ipv4AddressHelper()").unwrap();
            writeln!(
                s,
                "addr_{auto_subnet}.SetBase(ns.Ipv4Address(\"10.1.{auto_subnet}.0\"), ns.Ipv4Mask(\"255.255.255.0\"))"
            )
            .unwrap();
            writeln!(s, "auto_{auto_subnet} = ns.NetDeviceContainer()").unwrap();
            for (var, slot) in &members {
                writeln!(s, "auto_{auto_subnet}.Add(devs_{var}.Get({slot}))").unwrap();
                in_segment.insert((*var, *slot));
            }
            writeln!(s, "addr_{auto_subnet}.Assign(auto_{auto_subnet})").unwrap();
        }

        for plan in plans {
            let mut auto_devices = Vec::new();
            for (slot, ep) in [(0, &plan.a), (1, &plan.b)] {
                if ep.is_switch {
                    continue; // layer-2 port, no address
                }
                match &ep.ip {
                    Some((ip, mask)) => {
                        writeln!(
                            s,
                            "assign_address(n_{}, devs_{}.Get({slot}), \"{ip}\", \"{mask}\")",
                            ep.node_idx, plan.var
                        )
                        .unwrap();
                    }
                    None if in_segment.contains(&(plan.var, slot)) => {}
                    None => auto_devices.push(slot),
                }
            }
            if !auto_devices.is_empty() {
                auto_subnet += 1;
                writeln!(s, "addr_{auto_subnet} = ns.Ipv4AddressHelper()").unwrap();
                writeln!(
                    s,
                    "addr_{auto_subnet}.SetBase(ns.Ipv4Address(\"10.1.{auto_subnet}.0\"), ns.Ipv4Mask(\"255.255.255.0\"))"
                )
                .unwrap();
                writeln!(s, "auto_{auto_subnet} = ns.NetDeviceContainer()").unwrap();
                for slot in &auto_devices {
                    writeln!(s, "auto_{auto_subnet}.Add(devs_{}.Get({slot}))", plan.var).unwrap();
                }
                writeln!(s, "addr_{auto_subnet}.Assign(auto_{auto_subnet})").unwrap();
            }
        }
    }

    fn emit_routing(&self, s: &mut String, indices: &BTreeMap<NodeId, usize>) {
        s.push_str("\n# ---- Routing ----\n");
        let has_switch = self.network.nodes.values().any(|n| n.kind.is_switch());
        // Global routing does not understand bridged segments; behind a
        // switch, hosts with a configured gateway get a static default route
        // even in Auto mode.
        let static_nodes: Vec<_> = self
            .network
            .nodes
            .values()
            .filter(|n| {
                let manual = n.routing_mode == RoutingMode::Manual
                    && (n.active_routes().next().is_some() || n.default_gateway.is_some());
                manual || (has_switch && n.default_gateway.is_some())
            })
            .collect();

        if !has_switch && static_nodes.is_empty() {
            s.push_str("ns.Ipv4GlobalRoutingHelper.PopulateRoutingTables()\n");
            return;
        }
        if static_nodes.is_empty() {
            s.push_str("# bridged topology without static routes, direct delivery only\n");
            return;
        }
        s.push_str("static_routing = ns.Ipv4StaticRoutingHelper()\n");
        for node in static_nodes {
            let idx = indices[&node.id];
            writeln!(s, "# routes for {}", node.name).unwrap();
            writeln!(
                s,
                "sr_{idx} = static_routing.GetStaticRouting(n_{idx}.GetObject[ns.Ipv4]())"
            )
            .unwrap();
            if let Some(gateway) = &node.default_gateway {
                let interface = node
                    .routing_table
                    .iter()
                    .find(|r| r.is_default_route())
                    .map(|r| r.interface)
                    .unwrap_or(1);
                writeln!(
                    s,
                    "sr_{idx}.SetDefaultRoute(ns.Ipv4Address(\"{gateway}\"), {interface})"
                )
                .unwrap();
            }
            if node.routing_mode != RoutingMode::Manual {
                continue; // gateway fallback only, the table stays automatic
            }
            for route in node.active_routes() {
                if route.is_default_route() {
                    continue;
                }
                writeln!(
                    s,
                    "sr_{idx}.AddNetworkRouteTo(ns.Ipv4Address(\"{}\"), ns.Ipv4Mask(\"{}\"), ns.Ipv4Address(\"{}\"), {}, {})",
                    route.destination,
                    route.netmask(),
                    route.gateway,
                    route.interface,
                    route.metric
                )
                .unwrap();
            }
        }
    }

    fn emit_applications(
        &self,
        s: &mut String,
        indices: &BTreeMap<NodeId, usize>,
        warnings: &mut Vec<String>,
    ) {
        s.push_str("\n# ---- Applications ----\n");
        if self.config.flows.is_empty() {
            s.push_str("# no traffic flows configured\n");
            return;
        }
        for (idx, flow) in self.config.flows.iter().enumerate() {
            let port = 9000 + idx as u32;
            match self.check_flow(flow) {
                Err(reason) => {
                    warn!(flow = %flow.id, reason, "跳过无效流量流");
                    writeln!(s, "# skipped {}: {reason}", flow.name).unwrap();
                    warnings.push(format!("skipped {}: {reason}", flow.name));
                }
                Ok(target_ip) => {
                    let src = indices[&flow.source];
                    let dst = indices[&flow.target];
                    writeln!(
                        s,
                        "# {}: n_{src} -> n_{dst} ({} {})",
                        flow.name,
                        flow.protocol.as_str(),
                        app_label(flow.app)
                    )
                    .unwrap();
                    match flow.app {
                        TrafficApp::Echo => {
                            self.emit_echo_flow(s, flow, idx, port, src, dst, &target_ip)
                        }
                        TrafficApp::OnOff | TrafficApp::Bulk => {
                            self.emit_sink_flow(s, flow, idx, port, src, dst, &target_ip)
                        }
                    }
                }
            }
        }
    }

    fn emit_echo_flow(
        &self,
        s: &mut String,
        flow: &TrafficFlow,
        idx: usize,
        port: u32,
        src: usize,
        dst: usize,
        target_ip: &str,
    ) {
        writeln!(s, "echo_server_{idx} = ns.UdpEchoServerHelper({port})").unwrap();
        writeln!(s, "server_apps_{idx} = echo_server_{idx}.Install(n_{dst})").unwrap();
        writeln!(s, "server_apps_{idx}.Start(ns.Seconds(0.0))").unwrap();
        writeln!(s, "server_apps_{idx}.Stop(ns.Seconds({}))", self.config.duration_s).unwrap();
        writeln!(
            s,
            "echo_client_{idx} = ns.UdpEchoClientHelper(ns.Ipv4Address(\"{target_ip}\").ConvertTo(), {port})"
        )
        .unwrap();
        writeln!(
            s,
            "echo_client_{idx}.SetAttribute(\"MaxPackets\", ns.UintegerValue({}))",
            flow.echo_packets
        )
        .unwrap();
        writeln!(
            s,
            "echo_client_{idx}.SetAttribute(\"Interval\", ns.TimeValue(ns.Seconds({})))",
            flow.echo_interval_s
        )
        .unwrap();
        writeln!(
            s,
            "echo_client_{idx}.SetAttribute(\"PacketSize\", ns.UintegerValue({}))",
            flow.packet_size
        )
        .unwrap();
        writeln!(s, "client_apps_{idx} = echo_client_{idx}.Install(n_{src})").unwrap();
        writeln!(s, "client_apps_{idx}.Start(ns.Seconds({}))", flow.start_s).unwrap();
        writeln!(s, "client_apps_{idx}.Stop(ns.Seconds({}))", flow.stop_s).unwrap();
    }

    fn emit_sink_flow(
        &self,
        s: &mut String,
        flow: &TrafficFlow,
        idx: usize,
        port: u32,
        src: usize,
        dst: usize,
        target_ip: &str,
    ) {
        let factory = match flow.protocol {
            TrafficProtocol::Udp => "ns3::UdpSocketFactory",
            TrafficProtocol::Tcp => "ns3::TcpSocketFactory",
        };
        writeln!(
            s,
            "sink_{idx} = ns.PacketSinkHelper(\"{factory}\", ns.InetSocketAddress(ns.Ipv4Address.GetAny(), {port}).ConvertTo())"
        )
        .unwrap();
        writeln!(s, "sink_apps_{idx} = sink_{idx}.Install(n_{dst})").unwrap();
        writeln!(s, "sink_apps_{idx}.Start(ns.Seconds(0.0))").unwrap();
        writeln!(s, "sink_apps_{idx}.Stop(ns.Seconds({}))", self.config.duration_s).unwrap();
        match flow.app {
            TrafficApp::OnOff => {
                writeln!(
                    s,
                    "onoff_{idx} = ns.OnOffHelper(\"{factory}\", ns.InetSocketAddress(ns.Ipv4Address(\"{target_ip}\"), {port}).ConvertTo())"
                )
                .unwrap();
                writeln!(
                    s,
                    "onoff_{idx}.SetAttribute(\"DataRate\", ns.StringValue(\"{}\"))",
                    flow.data_rate
                )
                .unwrap();
                writeln!(
                    s,
                    "onoff_{idx}.SetAttribute(\"PacketSize\", ns.UintegerValue({}))",
                    flow.packet_size
                )
                .unwrap();
                writeln!(s, "source_apps_{idx} = onoff_{idx}.Install(n_{src})").unwrap();
            }
            TrafficApp::Bulk => {
                writeln!(
                    s,
                    "bulk_{idx} = ns.BulkSendHelper(\"ns3::TcpSocketFactory\", ns.InetSocketAddress(ns.Ipv4Address(\"{target_ip}\"), {port}).ConvertTo())"
                )
                .unwrap();
                writeln!(s, "bulk_{idx}.SetAttribute(\"MaxBytes\", ns.UintegerValue(0))").unwrap();
                writeln!(
                    s,
                    "bulk_{idx}.SetAttribute(\"SendSize\", ns.UintegerValue({}))",
                    flow.packet_size
                )
                .unwrap();
                writeln!(s, "source_apps_{idx} = bulk_{idx}.Install(n_{src})").unwrap();
            }
            TrafficApp::Echo => unreachable!("echo handled separately"),
        }
        writeln!(s, "source_apps_{idx}.Start(ns.Seconds({}))", flow.start_s).unwrap();
        writeln!(s, "source_apps_{idx}.Stop(ns.Seconds({}))", flow.stop_s).unwrap();
    }

    /// Returns the target address, or the reason the flow cannot run.
    fn check_flow(&self, flow: &TrafficFlow) -> Result<String, &'static str> {
        if self.network.node(flow.source).is_none() {
            return Err("unknown source node");
        }
        let Some(target) = self.network.node(flow.target) else {
            return Err("unknown target node");
        };
        if flow.source == flow.target {
            return Err("source and target are the same node");
        }
        if flow.start_s >= flow.stop_s {
            return Err("start time is not before stop time");
        }
        if flow.app == TrafficApp::Bulk && flow.protocol != TrafficProtocol::Tcp {
            return Err("bulk transfer requires TCP");
        }
        target
            .ports
            .iter()
            .find_map(|p| if p.enabled { p.ip_address.clone() } else { None })
            .ok_or("target node has no IP address")
    }

    fn emit_failures(
        &self,
        s: &mut String,
        indices: &BTreeMap<NodeId, usize>,
        plans: &[LinkPlan],
        warnings: &mut Vec<String>,
    ) {
        let Some(failures) = self.failures else { return };
        if failures.events.is_empty() {
            return;
        }
        s.push_str("\n# ---- Failure injection ----\n");
        for (k, event) in failures.sorted_events().into_iter().enumerate() {
            writeln!(
                s,
                "# {}: {} at {}s",
                event.name,
                event.kind.label(),
                event.at_s
            )
            .unwrap();
            match event.target {
                FailureTarget::Link(link) => {
                    let Some(plan) = plans.iter().find(|p| p.id == link) else {
                        warnings.push(format!("skipped failure '{}': link not planned", event.name));
                        continue;
                    };
                    self.emit_link_failure(s, k, event, plan);
                }
                FailureTarget::Node(node) => {
                    let idx = indices.get(&node).copied().unwrap_or(0);
                    self.emit_node_failure(s, k, event, node, idx, plans);
                }
            }
        }
    }

    fn emit_link_failure(
        &self,
        s: &mut String,
        k: usize,
        event: &crate::model::FailureEvent,
        plan: &LinkPlan,
    ) {
        let devs = plan.var;
        match event.kind {
            FailureKind::LinkDown | FailureKind::LinkUp => {
                let enable = event.kind == FailureKind::LinkUp;
                writeln!(s, "def failure_event_{k}_trigger():").unwrap();
                writeln!(s, "    print(\"FAILURE|{}|{}|trigger\")", event.at_s, event.name).unwrap();
                emit_receive_enable(s, devs, enable);
                writeln!(s, "ns.Simulator.Schedule(ns.Seconds({}), failure_event_{k}_trigger)", event.at_s)
                    .unwrap();
                if let Some(recover_at) = event.recovery_time_s() {
                    writeln!(s, "def failure_event_{k}_recover():").unwrap();
                    writeln!(s, "    print(\"FAILURE|{recover_at}|{}|recover\")", event.name).unwrap();
                    emit_receive_enable(s, devs, !enable);
                    writeln!(
                        s,
                        "ns.Simulator.Schedule(ns.Seconds({recover_at}), failure_event_{k}_recover)"
                    )
                    .unwrap();
                }
            }
            FailureKind::LinkDegraded => {
                let rate = event.params.new_data_rate.as_deref().unwrap_or("1Mbps");
                writeln!(s, "def failure_event_{k}_trigger():").unwrap();
                writeln!(s, "    print(\"FAILURE|{}|{}|trigger\")", event.at_s, event.name).unwrap();
                for slot in [0, 1] {
                    writeln!(
                        s,
                        "    devs_{devs}.Get({slot}).SetAttribute(\"DataRate\", ns.StringValue(\"{rate}\"))"
                    )
                    .unwrap();
                }
                if let Some(delay) = &event.params.new_delay {
                    writeln!(
                        s,
                        "    devs_{devs}.Get(0).GetChannel().SetAttribute(\"Delay\", ns.StringValue(\"{delay}\"))"
                    )
                    .unwrap();
                }
                writeln!(s, "ns.Simulator.Schedule(ns.Seconds({}), failure_event_{k}_trigger)", event.at_s)
                    .unwrap();
                if let Some(recover_at) = event.recovery_time_s() {
                    writeln!(s, "def failure_event_{k}_recover():").unwrap();
                    writeln!(s, "    print(\"FAILURE|{recover_at}|{}|recover\")", event.name).unwrap();
                    for slot in [0, 1] {
                        writeln!(
                            s,
                            "    devs_{devs}.Get({slot}).SetAttribute(\"DataRate\", ns.StringValue(\"{}\"))",
                            plan.data_rate
                        )
                        .unwrap();
                    }
                    writeln!(
                        s,
                        "    devs_{devs}.Get(0).GetChannel().SetAttribute(\"Delay\", ns.StringValue(\"{}\"))",
                        plan.delay
                    )
                    .unwrap();
                    writeln!(
                        s,
                        "ns.Simulator.Schedule(ns.Seconds({recover_at}), failure_event_{k}_recover)"
                    )
                    .unwrap();
                }
            }
            FailureKind::LinkErrorRate => {
                writeln!(s, "def failure_event_{k}_trigger():").unwrap();
                writeln!(s, "    print(\"FAILURE|{}|{}|trigger\")", event.at_s, event.name).unwrap();
                emit_error_model(s, devs, event.params.error_rate);
                writeln!(s, "ns.Simulator.Schedule(ns.Seconds({}), failure_event_{k}_trigger)", event.at_s)
                    .unwrap();
                if let Some(recover_at) = event.recovery_time_s() {
                    writeln!(s, "def failure_event_{k}_recover():").unwrap();
                    writeln!(s, "    print(\"FAILURE|{recover_at}|{}|recover\")", event.name).unwrap();
                    emit_error_model(s, devs, 0.0);
                    writeln!(
                        s,
                        "ns.Simulator.Schedule(ns.Seconds({recover_at}), failure_event_{k}_recover)"
                    )
                    .unwrap();
                }
            }
            FailureKind::LinkFlapping => {
                let down_s = event.params.down_s;
                let period = event.params.down_s + event.params.up_s;
                writeln!(s, "def failure_event_{k}_down():").unwrap();
                writeln!(s, "    print(\"FAILURE|flap|{}|down\")", event.name).unwrap();
                emit_receive_enable(s, devs, false);
                writeln!(s, "def failure_event_{k}_up():").unwrap();
                writeln!(s, "    print(\"FAILURE|flap|{}|up\")", event.name).unwrap();
                emit_receive_enable(s, devs, true);
                writeln!(s, "for cycle in range({}):", event.params.cycles).unwrap();
                writeln!(s, "    base = {} + cycle * {period}", event.at_s).unwrap();
                writeln!(s, "    ns.Simulator.Schedule(ns.Seconds(base), failure_event_{k}_down)").unwrap();
                writeln!(
                    s,
                    "    ns.Simulator.Schedule(ns.Seconds(base + {down_s}), failure_event_{k}_up)"
                )
                .unwrap();
            }
            FailureKind::NodeDown | FailureKind::NodeUp => {
                unreachable!("node failures routed to emit_node_failure")
            }
        }
    }

    fn emit_node_failure(
        &self,
        s: &mut String,
        k: usize,
        event: &crate::model::FailureEvent,
        node: NodeId,
        _idx: usize,
        plans: &[LinkPlan],
    ) {
        let enable = event.kind == FailureKind::NodeUp;
        let devices: Vec<(usize, usize)> = plans
            .iter()
            .flat_map(|p| [(p.var, 0usize, &p.a), (p.var, 1usize, &p.b)])
            .filter(|(_, _, ep)| ep.node == node)
            .map(|(var, slot, _)| (var, slot))
            .collect();
        writeln!(s, "def failure_event_{k}_trigger():").unwrap();
        writeln!(s, "    print(\"FAILURE|{}|{}|trigger\")", event.at_s, event.name).unwrap();
        if devices.is_empty() {
            s.push_str("    pass  # isolated node, nothing to disable\n");
        }
        for (var, slot) in &devices {
            writeln!(
                s,
                "    devs_{var}.Get({slot}).SetAttribute(\"ReceiveEnable\", ns.BooleanValue({}))",
                py_bool(enable)
            )
            .unwrap();
        }
        writeln!(s, "ns.Simulator.Schedule(ns.Seconds({}), failure_event_{k}_trigger)", event.at_s)
            .unwrap();
        if let Some(recover_at) = event.recovery_time_s() {
            writeln!(s, "def failure_event_{k}_recover():").unwrap();
            writeln!(s, "    print(\"FAILURE|{recover_at}|{}|recover\")", event.name).unwrap();
            if devices.is_empty() {
                s.push_str("    pass\n");
            }
            for (var, slot) in &devices {
                writeln!(
                    s,
                    "    devs_{var}.Get({slot}).SetAttribute(\"ReceiveEnable\", ns.BooleanValue({}))",
                    py_bool(!enable)
                )
                .unwrap();
            }
            writeln!(s, "ns.Simulator.Schedule(ns.Seconds({recover_at}), failure_event_{k}_recover)")
                .unwrap();
        }
    }

    fn emit_tracing(&self, s: &mut String, plans: &[LinkPlan]) {
        s.push_str("\n# ---- Tracing ----\n");
        s.push_str(
            "def pkt_event(event, node, device, link, proto):\n\
             \x20   def _cb(packet):\n\
             \x20       now = ns.Simulator.Now().GetNanoSeconds()\n\
             \x20       print(f\"PKT|{now}|{event}|{node}|{device}|{packet.GetSize()}|-1|-1|{link}|{proto}\")\n\
             \x20   return _cb\n",
        );
        for plan in plans {
            let device_type = if plan.csma {
                "ns3::CsmaNetDevice"
            } else {
                "ns3::PointToPointNetDevice"
            };
            let proto = if plan.csma { "csma" } else { "ppp" };
            for ep in [&plan.a, &plan.b] {
                let (node, dev) = (ep.node_idx, ep.device_idx);
                for (hook, event) in [
                    ("MacTx", "TX"),
                    ("MacRx", "RX"),
                    ("PhyRxDrop", "DROP"),
                    ("TxQueue/Enqueue", "ENQ"),
                    ("TxQueue/Dequeue", "DEQ"),
                ] {
                    writeln!(
                        s,
                        "ns.Config.ConnectWithoutContext(\"/NodeList/{node}/DeviceList/{dev}/${device_type}/{hook}\", pkt_event(\"{event}\", {node}, {dev}, \"{}\", \"{proto}\"))",
                        plan.name
                    )
                    .unwrap();
                }
            }
        }

        let out = &self.options.output_dir;
        let first_p2p = plans.iter().find(|p| !p.csma).map(|p| p.var);
        let first_csma = plans.iter().find(|p| p.csma).map(|p| p.var);
        if self.config.enable_ascii_trace && (first_p2p.is_some() || first_csma.is_some()) {
            s.push_str("ascii_helper = ns.AsciiTraceHelper()\n");
            writeln!(s, "ascii_stream = ascii_helper.CreateFileStream(\"{out}/trace.tr\")").unwrap();
            if let Some(k) = first_p2p {
                writeln!(s, "p2p_{k}.EnableAsciiAll(ascii_stream)").unwrap();
            }
            if let Some(k) = first_csma {
                writeln!(s, "csma_{k}.EnableAsciiAll(ascii_stream)").unwrap();
            }
        }
        if self.config.enable_pcap {
            if let Some(k) = first_p2p {
                writeln!(s, "p2p_{k}.EnablePcapAll(\"{out}/capture\")").unwrap();
            }
            if let Some(k) = first_csma {
                writeln!(s, "csma_{k}.EnablePcapAll(\"{out}/capture\")").unwrap();
            }
        }
        if self.config.enable_flow_monitor {
            s.push_str("flowmon_helper = ns.FlowMonitorHelper()\n");
            s.push_str("monitor = flowmon_helper.InstallAll()\n");
        }
    }

    fn emit_run(&self, s: &mut String) {
        s.push_str("\n# ---- Run ----\n");
        writeln!(s, "ns.RngSeedManager.SetSeed({})", self.config.random_seed).unwrap();
        writeln!(s, "ns.Simulator.Stop(ns.Seconds({}))", self.config.duration_s).unwrap();
        s.push_str("print(\"SIMULATION START\")\n");
        s.push_str("ns.Simulator.Run()\n");
        if self.config.enable_flow_monitor {
            s.push_str(RESULTS_EPILOGUE);
            writeln!(
                s,
                "monitor.SerializeToXmlFile(\"{}/flowmon.xml\", True, True)",
                self.options.output_dir
            )
            .unwrap();
        }
        s.push_str("ns.Simulator.Destroy()\n");
        s.push_str("print(\"SIMULATION DONE\")\n");
    }
}

/// Console section consumed by the flow statistics parser. Keep the field
/// labels in sync with `trace::parse_console_stats`.
const RESULTS_EPILOGUE: &str = r#"
monitor.CheckForLostPackets()
classifier = flowmon_helper.GetClassifier()
print("=" * 50)
print("SIMULATION RESULTS")
print("=" * 50)
print("")
print("Flow Statistics:")
print("")
for flow_id, flow_stats in monitor.GetFlowStats():
    t = classifier.FindFlow(flow_id)
    proto = {6: "TCP", 17: "UDP"}.get(t.protocol, str(t.protocol))
    span = flow_stats.timeLastRxPacket.GetSeconds() - flow_stats.timeFirstTxPacket.GetSeconds()
    throughput = flow_stats.rxBytes * 8.0 / span / 1e6 if span > 0 else 0.0
    delay = flow_stats.delaySum.GetSeconds() / flow_stats.rxPackets * 1e3 if flow_stats.rxPackets > 0 else 0.0
    jitter = flow_stats.jitterSum.GetSeconds() / (flow_stats.rxPackets - 1) * 1e3 if flow_stats.rxPackets > 1 else 0.0
    print(f"Flow {flow_id} ({proto})")
    print(f"  {t.sourceAddress}:{t.sourcePort} -> {t.destinationAddress}:{t.destinationPort}")
    print(f"  Tx Packets:   {flow_stats.txPackets}")
    print(f"  Rx Packets:   {flow_stats.rxPackets}")
    print(f"  Tx Bytes:     {flow_stats.txBytes}")
    print(f"  Rx Bytes:     {flow_stats.rxBytes}")
    print(f"  Lost Packets: {flow_stats.lostPackets}")
    print(f"  Throughput:   {throughput:.3f} Mbps")
    print(f"  Mean Delay:   {delay:.3f} ms")
    print(f"  Mean Jitter:  {jitter:.3f} ms")
    print("")
"#;

fn emit_receive_enable(s: &mut String, devs: usize, enable: bool) {
    for slot in [0, 1] {
        writeln!(
            s,
            "    devs_{devs}.Get({slot}).SetAttribute(\"ReceiveEnable\", ns.BooleanValue({}))",
            py_bool(enable)
        )
        .unwrap();
    }
}

fn emit_error_model(s: &mut String, devs: usize, rate: f64) {
    writeln!(s, "    em = ns.RateErrorModel()").unwrap();
    writeln!(s, "    em.SetAttribute(\"ErrorRate\", ns.DoubleValue({rate}))").unwrap();
    writeln!(s, "    em.SetAttribute(\"ErrorUnit\", ns.StringValue(\"ERROR_UNIT_PACKET\"))").unwrap();
    for slot in [0, 1] {
        writeln!(
            s,
            "    devs_{devs}.Get({slot}).SetAttribute(\"ReceiveErrorModel\", ns.PointerValue(em))"
        )
        .unwrap();
    }
}

fn py_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn app_label(app: TrafficApp) -> &'static str {
    match app {
        TrafficApp::Echo => "echo",
        TrafficApp::OnOff => "onoff",
        TrafficApp::Bulk => "bulk",
    }
}
