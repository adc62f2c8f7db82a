use crate::generator::{GenError, ScriptGenerator, ScriptOptions};
use crate::model::{
    ChannelKind, FailureEvent, FailureKind, FailureParams, FailureScenario, FailureTarget,
    NetworkModel, NodeId, NodeKind, SimulationConfig, TrafficApp, TrafficProtocol,
};

fn pinned_options() -> ScriptOptions {
    ScriptOptions {
        output_dir: "results".to_string(),
        generated_at: Some("2026-01-01 00:00:00".to_string()),
    }
}

fn two_host_net() -> (NetworkModel, NodeId, NodeId) {
    let mut net = NetworkModel::default();
    let a = net.add_node(NodeKind::Host);
    let b = net.add_node(NodeKind::Host);
    net.add_link(a, b, ChannelKind::PointToPoint).expect("link");
    (net, a, b)
}

#[test]
fn p2p_script_has_all_sections() {
    let (net, a, b) = two_host_net();
    let mut config = SimulationConfig::default();
    config.add_flow(a, b);

    let script = ScriptGenerator::new(&net, &config)
        .with_options(pinned_options())
        .generate()
        .expect("generate");
    let code = &script.code;

    assert!(script.warnings.is_empty(), "warnings: {:?}", script.warnings);
    assert!(code.contains("# generated: 2026-01-01 00:00:00"));
    assert!(code.contains("from ns import ns"));
    assert!(code.contains("nodes.Create(2)"));
    assert!(code.contains("p2p_0 = ns.PointToPointHelper()"));
    assert!(code.contains("assign_address(n_0, devs_0.Get(0), \"10.0.1.1\", \"255.255.255.0\")"));
    assert!(code.contains("assign_address(n_1, devs_0.Get(1), \"10.0.1.2\", \"255.255.255.0\")"));
    assert!(code.contains("ns.Ipv4GlobalRoutingHelper.PopulateRoutingTables()"));
    assert!(code.contains("echo_server_0 = ns.UdpEchoServerHelper(9000)"));
    assert!(code.contains("ns.Ipv4Address(\"10.0.1.2\").ConvertTo(), 9000"));
    assert!(code.contains("ns.Simulator.Stop(ns.Seconds(10))"));
    assert!(code.contains("SIMULATION RESULTS"));
    assert!(code.contains("ns.Simulator.Destroy()"));
}

#[test]
fn switch_endpoints_force_csma_and_bridge() {
    let mut net = NetworkModel::default();
    let sw = net.add_node(NodeKind::Switch);
    net.node_mut(sw).expect("switch").subnet_base = Some("192.168.1.0".to_string());
    let h1 = net.add_node(NodeKind::Host);
    let h2 = net.add_node(NodeKind::Host);
    // stored as point-to-point, but the switch end must force CSMA
    net.add_link(h1, sw, ChannelKind::PointToPoint).expect("h1-sw");
    net.add_link(h2, sw, ChannelKind::Csma).expect("h2-sw");

    let config = SimulationConfig::default();
    let script = ScriptGenerator::new(&net, &config)
        .with_options(pinned_options())
        .generate()
        .expect("generate");
    let code = &script.code;

    assert!(code.contains("csma_0 = ns.CsmaHelper()"));
    assert!(code.contains("csma_1 = ns.CsmaHelper()"));
    assert!(!code.contains("PointToPointHelper"));
    assert!(code.contains("bridge_0 = ns.BridgeHelper()"));
    // bridged topology: global routing is unsafe
    assert!(!code.contains("PopulateRoutingTables"));
    // switch ports stay unaddressed
    assert!(code.contains("\"192.168.1.1\""));
    assert!(code.contains("\"192.168.1.2\""));
}

#[test]
fn hosts_behind_a_switch_share_one_auto_subnet() {
    let mut net = NetworkModel::default();
    // no subnet_base: the model leaves these hosts unaddressed
    let sw = net.add_node(NodeKind::Switch);
    let h1 = net.add_node(NodeKind::Host);
    let h2 = net.add_node(NodeKind::Host);
    net.add_link(h1, sw, ChannelKind::Csma).expect("h1-sw");
    net.add_link(h2, sw, ChannelKind::Csma).expect("h2-sw");

    let config = SimulationConfig::default();
    let script = ScriptGenerator::new(&net, &config)
        .with_options(pinned_options())
        .generate()
        .expect("generate");
    let code = &script.code;

    assert!(code.contains(
        "addr_1.SetBase(ns.Ipv4Address(\"10.1.1.0\"), ns.Ipv4Mask(\"255.255.255.0\"))"
    ));
    assert!(!code.contains("10.1.2.0"), "one segment must not open a second subnet");
    // the host-side device of each link lands in the shared container
    assert!(code.contains("auto_1.Add(devs_0.Get(0))"));
    assert!(code.contains("auto_1.Add(devs_1.Get(0))"));
    assert!(code.contains("addr_1.Assign(auto_1)"));
}

#[test]
fn gateway_fallback_behind_switch_emits_default_route() {
    let mut net = NetworkModel::default();
    let sw = net.add_node(NodeKind::Switch);
    net.node_mut(sw).expect("switch").subnet_base = Some("192.168.1.0".to_string());
    let h1 = net.add_node(NodeKind::Host);
    net.add_link(h1, sw, ChannelKind::Csma).expect("h1-sw");
    // routing mode stays Auto, only the gateway is configured
    net.node_mut(h1).expect("host").default_gateway = Some("192.168.1.254".to_string());

    let config = SimulationConfig::default();
    let script = ScriptGenerator::new(&net, &config)
        .with_options(pinned_options())
        .generate()
        .expect("generate");
    let code = &script.code;

    assert!(code.contains("static_routing = ns.Ipv4StaticRoutingHelper()"));
    assert!(code.contains("sr_1.SetDefaultRoute(ns.Ipv4Address(\"192.168.1.254\"), 1)"));
    assert!(!code.contains("AddNetworkRouteTo"), "auto mode must not dump a manual table");
    assert!(!code.contains("PopulateRoutingTables"));
}

#[test]
fn invalid_flows_are_skipped_with_warnings() {
    let (net, a, _) = two_host_net();
    let mut config = SimulationConfig::default();
    config.add_flow(a, a); // self flow
    {
        let flow = config.add_flow(a, NodeId(1));
        flow.app = TrafficApp::Bulk;
        flow.protocol = TrafficProtocol::Udp;
    }

    let script = ScriptGenerator::new(&net, &config)
        .with_options(pinned_options())
        .generate()
        .expect("generate");

    assert_eq!(script.warnings.len(), 2);
    assert!(script.code.contains("# skipped flow_0: source and target are the same node"));
    assert!(script.code.contains("# skipped flow_1: bulk transfer requires TCP"));
    assert!(!script.code.contains("UdpEchoServerHelper"));
}

#[test]
fn manual_routes_emit_static_routing() {
    let mut net = NetworkModel::default();
    let a = net.add_node(NodeKind::Host);
    let r = net.add_node(NodeKind::Router);
    net.add_link(a, r, ChannelKind::PointToPoint).expect("link");
    {
        let node = net.node_mut(a).expect("host");
        node.routing_mode = crate::model::RoutingMode::Manual;
        node.set_default_gateway("10.0.1.2", 1);
        node.routing_table.push(crate::model::RouteEntry::new("172.16.0.0", 16, "10.0.1.2"));
    }

    let config = SimulationConfig::default();
    let script = ScriptGenerator::new(&net, &config)
        .with_options(pinned_options())
        .generate()
        .expect("generate");
    let code = &script.code;

    assert!(code.contains("static_routing = ns.Ipv4StaticRoutingHelper()"));
    assert!(code.contains("sr_0.SetDefaultRoute(ns.Ipv4Address(\"10.0.1.2\"), 1)"));
    assert!(code.contains(
        "sr_0.AddNetworkRouteTo(ns.Ipv4Address(\"172.16.0.0\"), ns.Ipv4Mask(\"255.255.0.0\"), ns.Ipv4Address(\"10.0.1.2\"), 0, 1)"
    ));
    assert!(!code.contains("PopulateRoutingTables"));
}

#[test]
fn link_down_failure_schedules_trigger_and_recovery() {
    let (mut net, a, b) = two_host_net();
    let link = net.links.keys().next().copied().expect("link id");
    net.duration_s = 10.0;
    let _ = (a, b);

    let scenario = FailureScenario {
        name: "outage".to_string(),
        events: vec![FailureEvent {
            name: "cut".to_string(),
            kind: FailureKind::LinkDown,
            target: FailureTarget::Link(link),
            at_s: 3.0,
            duration_s: Some(2.0),
            params: FailureParams::default(),
        }],
    };
    let config = SimulationConfig::default();
    let script = ScriptGenerator::new(&net, &config)
        .with_failures(&scenario)
        .with_options(pinned_options())
        .generate()
        .expect("generate");
    let code = &script.code;

    assert!(code.contains("def failure_event_0_trigger():"));
    assert!(code.contains("def failure_event_0_recover():"));
    assert!(code.contains("SetAttribute(\"ReceiveEnable\", ns.BooleanValue(False))"));
    assert!(code.contains("SetAttribute(\"ReceiveEnable\", ns.BooleanValue(True))"));
    assert!(code.contains("ns.Simulator.Schedule(ns.Seconds(3), failure_event_0_trigger)"));
    assert!(code.contains("ns.Simulator.Schedule(ns.Seconds(5), failure_event_0_recover)"));
}

#[test]
fn flapping_failure_expands_to_cycles() {
    let (mut net, _, _) = two_host_net();
    let link = net.links.keys().next().copied().expect("link id");
    net.duration_s = 30.0;

    let scenario = FailureScenario {
        name: String::new(),
        events: vec![FailureEvent {
            name: "flap".to_string(),
            kind: FailureKind::LinkFlapping,
            target: FailureTarget::Link(link),
            at_s: 2.0,
            duration_s: None,
            params: FailureParams {
                cycles: 4,
                ..FailureParams::default()
            },
        }],
    };
    let mut config = SimulationConfig::default();
    config.duration_s = 30.0;
    let script = ScriptGenerator::new(&net, &config)
        .with_failures(&scenario)
        .with_options(pinned_options())
        .generate()
        .expect("generate");
    let code = &script.code;

    assert!(code.contains("def failure_event_0_down():"));
    assert!(code.contains("def failure_event_0_up():"));
    assert!(code.contains("for cycle in range(4):"));
    assert!(code.contains("base = 2 + cycle * 7"));
}

#[test]
fn failure_validation_failures_abort_generation() {
    let (net, _, _) = two_host_net();
    let scenario = FailureScenario {
        name: String::new(),
        events: vec![FailureEvent {
            name: "late".to_string(),
            kind: FailureKind::LinkDown,
            target: FailureTarget::Link(net.links.keys().next().copied().expect("link")),
            at_s: 99.0,
            duration_s: None,
            params: FailureParams::default(),
        }],
    };
    let config = SimulationConfig::default();
    let err = ScriptGenerator::new(&net, &config)
        .with_failures(&scenario)
        .generate()
        .expect_err("event past end");
    assert!(matches!(err, GenError::Model(_)));
}

#[test]
fn empty_topology_is_an_error() {
    let net = NetworkModel::default();
    let config = SimulationConfig::default();
    let err = ScriptGenerator::new(&net, &config).generate().expect_err("no nodes");
    assert!(matches!(err, GenError::EmptyTopology));
}

#[test]
fn trace_toggles_control_emitted_hooks() {
    let (net, _, _) = two_host_net();
    let mut config = SimulationConfig::default();
    config.enable_pcap = true;
    config.enable_ascii_trace = false;
    config.enable_flow_monitor = false;

    let script = ScriptGenerator::new(&net, &config)
        .with_options(pinned_options())
        .generate()
        .expect("generate");
    let code = &script.code;

    assert!(code.contains("p2p_0.EnablePcapAll(\"results/capture\")"));
    assert!(!code.contains("EnableAsciiAll"));
    assert!(!code.contains("FlowMonitorHelper"));
    assert!(!code.contains("SIMULATION RESULTS"));
    // packet hooks stay on regardless
    assert!(code.contains("pkt_event(\"TX\", 0, 0, \"link_0\", \"ppp\")"));
}
