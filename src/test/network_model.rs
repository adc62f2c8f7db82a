use crate::model::{ChannelKind, Endpoint, ModelError, NetworkModel, NodeKind};

#[test]
fn nodes_get_default_ports_and_names() {
    let mut net = NetworkModel::default();
    let host = net.add_node(NodeKind::Host);
    let router = net.add_node(NodeKind::Router);
    let switch = net.add_node(NodeKind::Switch);

    let host = net.node(host).expect("host");
    assert_eq!(host.name, "host_0");
    assert_eq!(host.ports.len(), 1);
    assert_eq!(host.ports[0].name, "gi0");
    assert_eq!(host.ports[0].speed, "1Gbps");

    assert_eq!(net.node(router).expect("router").ports.len(), 4);
    assert_eq!(net.node(switch).expect("switch").ports.len(), 8);
}

#[test]
fn p2p_link_assigns_fresh_subnet_per_link() {
    let mut net = NetworkModel::default();
    let a = net.add_node(NodeKind::Host);
    let b = net.add_node(NodeKind::Router);
    let c = net.add_node(NodeKind::Host);

    net.add_link(a, b, ChannelKind::PointToPoint).expect("link a-b");
    net.add_link(c, b, ChannelKind::PointToPoint).expect("link c-b");

    let ip = |node, port: u32| {
        net.node(node)
            .and_then(|n| n.port(port))
            .and_then(|p| p.ip_address.clone())
    };
    assert_eq!(ip(a, 0).as_deref(), Some("10.0.1.1"));
    assert_eq!(ip(b, 0).as_deref(), Some("10.0.1.2"));
    assert_eq!(ip(c, 0).as_deref(), Some("10.0.2.1"));
    assert_eq!(ip(b, 1).as_deref(), Some("10.0.2.2"));
}

#[test]
fn switch_subnet_hands_out_sequential_host_addresses() {
    let mut net = NetworkModel::default();
    let sw = net.add_node(NodeKind::Switch);
    net.node_mut(sw).expect("switch").subnet_base = Some("192.168.1.0".to_string());
    let h1 = net.add_node(NodeKind::Host);
    let h2 = net.add_node(NodeKind::Host);

    net.add_link(sw, h1, ChannelKind::Csma).expect("link sw-h1");
    net.add_link(sw, h2, ChannelKind::Csma).expect("link sw-h2");

    let h1_ip = net.node(h1).and_then(|n| n.port(0)).and_then(|p| p.ip_address.clone());
    let h2_ip = net.node(h2).and_then(|n| n.port(0)).and_then(|p| p.ip_address.clone());
    assert_eq!(h1_ip.as_deref(), Some("192.168.1.1"));
    assert_eq!(h2_ip.as_deref(), Some("192.168.1.2"));

    // switch ports are layer-2, never addressed
    for port in &net.node(sw).expect("switch").ports {
        assert!(port.ip_address.is_none());
    }
}

#[test]
fn switch_to_switch_link_gets_no_addresses() {
    let mut net = NetworkModel::default();
    let s1 = net.add_node(NodeKind::Switch);
    let s2 = net.add_node(NodeKind::Switch);
    net.add_link(s1, s2, ChannelKind::Csma).expect("trunk");

    for node in [s1, s2] {
        for port in &net.node(node).expect("switch").ports {
            assert!(port.ip_address.is_none());
        }
    }
}

#[test]
fn connecting_a_busy_port_is_rejected() {
    let mut net = NetworkModel::default();
    let a = net.add_node(NodeKind::Host);
    let b = net.add_node(NodeKind::Router);
    let c = net.add_node(NodeKind::Router);
    net.add_link(a, b, ChannelKind::PointToPoint).expect("first link");

    let err = net
        .add_link_on_ports(
            Endpoint { node: a, port: 0 },
            Endpoint { node: c, port: 0 },
            ChannelKind::PointToPoint,
        )
        .expect_err("port 0 on a is taken");
    assert!(matches!(err, ModelError::PortInUse { .. }));
}

#[test]
fn single_port_host_runs_out_of_free_ports() {
    let mut net = NetworkModel::default();
    let a = net.add_node(NodeKind::Host);
    let b = net.add_node(NodeKind::Router);
    let c = net.add_node(NodeKind::Router);
    net.add_link(a, b, ChannelKind::PointToPoint).expect("first link");

    let err = net.add_link(a, c, ChannelKind::PointToPoint).expect_err("no free port");
    assert!(matches!(err, ModelError::NoFreePort(id) if id == a));
}

#[test]
fn removing_a_node_cascades_to_its_links() {
    let mut net = NetworkModel::default();
    let a = net.add_node(NodeKind::Host);
    let r = net.add_node(NodeKind::Router);
    let b = net.add_node(NodeKind::Host);
    net.add_link(a, r, ChannelKind::PointToPoint).expect("a-r");
    net.add_link(b, r, ChannelKind::PointToPoint).expect("b-r");
    assert_eq!(net.links.len(), 2);

    net.remove_node(r).expect("remove router");
    assert!(net.links.is_empty());

    // surviving endpoints are unbound and de-addressed
    let port = net.node(a).and_then(|n| n.port(0)).expect("port");
    assert!(port.connected_link.is_none());
    assert!(port.ip_address.is_none());
}

#[test]
fn reassign_switch_subnet_renumbers_attached_hosts() {
    let mut net = NetworkModel::default();
    let sw = net.add_node(NodeKind::Switch);
    net.node_mut(sw).expect("switch").subnet_base = Some("10.10.0.0".to_string());
    let h1 = net.add_node(NodeKind::Host);
    let h2 = net.add_node(NodeKind::Host);
    net.add_link(sw, h1, ChannelKind::Csma).expect("sw-h1");
    net.add_link(sw, h2, ChannelKind::Csma).expect("sw-h2");

    net.node_mut(sw).expect("switch").subnet_base = Some("172.16.5.0".to_string());
    net.reassign_switch_subnet(sw).expect("reassign");

    let h1_ip = net.node(h1).and_then(|n| n.port(0)).and_then(|p| p.ip_address.clone());
    let h2_ip = net.node(h2).and_then(|n| n.port(0)).and_then(|p| p.ip_address.clone());
    assert_eq!(h1_ip.as_deref(), Some("172.16.5.1"));
    assert_eq!(h2_ip.as_deref(), Some("172.16.5.2"));
}

#[test]
fn id_counters_recover_after_reload() {
    let mut net = NetworkModel::default();
    let a = net.add_node(NodeKind::Host);
    let b = net.add_node(NodeKind::Host);
    net.add_link(a, b, ChannelKind::PointToPoint).expect("link");

    let json = net.to_json().expect("serialize");
    let mut reloaded = NetworkModel::from_json(&json).expect("reload");

    let c = reloaded.add_node(NodeKind::Host);
    assert_eq!(c.0, 2, "new node id continues after the loaded ones");
}
