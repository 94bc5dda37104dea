// Copyright (c) 2025 - Cowboy AI, Inc.
//! Structural Properties of the Synthesized Topology
//!
//! Assertions over the emitted templates, the form the provisioning engine
//! actually consumes.

mod fixtures;

use fixtures::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

use cloud_topology::domain::{Ipv4Cidr, Peer, ResourceType, SubnetGroup, SubnetMask, SubnetType};
use cloud_topology::template::logical_id;
use cloud_topology::topology::{DATABASE_POLICY, WEB_POLICY};
use cloud_topology::{
    declare_network, declare_servers, synthesize, CloudAssembly, Template, TopologyConfig,
    TopologyError,
};

fn network_template(assembly: &CloudAssembly) -> &Template {
    assembly.stack(NETWORK_STACK).expect("network stack").template()
}

fn server_template(assembly: &CloudAssembly) -> &Template {
    assembly.stack(SERVER_STACK).expect("server stack").template()
}

/// Resolve an `Fn::ImportValue` to the network-stack resource it exports
fn imported_resource<'a>(network: &'a Template, import: &Value) -> &'a cloud_topology::template::Resource {
    let name = import["Fn::ImportValue"].as_str().expect("import");
    let output = network
        .outputs()
        .values()
        .find(|o| o.export_name() == Some(name))
        .expect("export");
    let id = output.value()["Ref"].as_str().expect("ref");
    network.resource(id).expect("exported resource")
}

#[test_case(1 ; "one zone")]
#[test_case(2 ; "two zones")]
#[test_case(3 ; "three zones")]
#[test_case(6 ; "six zones")]
fn test_subnets_per_zone(azs: usize) {
    let assembly = synth(&config_with_azs(azs));
    let subnets = network_template(&assembly).resources_of_type(ResourceType::Subnet);

    let public = subnets
        .iter()
        .filter(|(_, s)| s.get("MapPublicIpOnLaunch") == Some(&json!(true)))
        .count();
    let private = subnets.len() - public;

    assert_eq!(public, azs);
    assert_eq!(private, azs);
}

#[test_case(1 ; "one zone")]
#[test_case(3 ; "three zones")]
fn test_instance_count_matches_public_subnets(azs: usize) {
    let assembly = synth(&config_with_azs(azs));
    let network = network_template(&assembly);
    let servers = server_template(&assembly);

    let instances = servers.resources_of_type(ResourceType::Instance);
    assert_eq!(instances.len(), azs);

    for (_, instance) in instances {
        let subnet = imported_resource(network, instance.get("SubnetId").unwrap());
        assert_eq!(subnet.get("MapPublicIpOnLaunch"), Some(&json!(true)));
    }
}

#[test]
fn test_instances_fill_distinct_zones() {
    let assembly = synth(&config_with_azs(3));
    let zones: Vec<Value> = server_template(&assembly)
        .resources_of_type(ResourceType::Instance)
        .iter()
        .map(|(_, i)| i.get("AvailabilityZone").unwrap()["Fn::Select"][0].clone())
        .collect();
    assert_eq!(zones, vec![json!(0), json!(1), json!(2)]);
}

#[test]
fn test_database_ingress_only_from_web_policy() {
    let assembly = synth(&default_config());
    let servers = server_template(&assembly);

    let db_group = logical_id(&[DATABASE_POLICY, "Resource"]);
    let web_group = logical_id(&[WEB_POLICY, "Resource"]);

    let db_resource = servers.resource(&db_group).unwrap();
    assert!(db_resource.get("SecurityGroupIngress").is_none());

    let rules: Vec<_> = servers
        .resources_of_type(ResourceType::SecurityGroupIngress)
        .into_iter()
        .filter(|(_, r)| r.get("GroupId") == Some(&json!({ "Fn::GetAtt": [db_group, "GroupId"] })))
        .collect();
    assert_eq!(rules.len(), 1);

    let (_, rule) = rules[0];
    assert_eq!(
        rule.get("SourceSecurityGroupId"),
        Some(&json!({ "Fn::GetAtt": [web_group, "GroupId"] }))
    );
    assert!(rule.get("CidrIp").is_none());
    assert_eq!(rule.get("FromPort"), Some(&json!(3306)));
    assert_eq!(rule.get("ToPort"), Some(&json!(3306)));
}

#[test]
fn test_database_ingress_declared_from_web_policy() {
    let config = default_config();
    let network = declare_network(&config.network).unwrap();
    let servers = declare_servers(&network, &config.servers).unwrap();

    let sources: Vec<&Peer> = servers
        .database_policy
        .ingress_rules()
        .iter()
        .map(|r| &r.peer)
        .collect();
    assert_eq!(sources, vec![&Peer::policy(WEB_POLICY)]);
}

#[test]
fn test_web_policy_open_on_port_80() {
    let assembly = synth(&default_config());
    let web = server_template(&assembly)
        .resource(&logical_id(&[WEB_POLICY, "Resource"]))
        .unwrap();

    let ingress = web.get("SecurityGroupIngress").unwrap().as_array().unwrap();
    assert!(ingress.iter().any(|rule| {
        rule["CidrIp"] == "0.0.0.0/0"
            && rule["IpProtocol"] == "tcp"
            && rule["FromPort"] == 80
            && rule["ToPort"] == 80
    }));
}

#[test_case(2 ; "two zones")]
#[test_case(4 ; "four zones")]
fn test_database_only_in_private_subnets(azs: usize) {
    let assembly = synth(&config_with_azs(azs));
    let network = network_template(&assembly);
    let servers = server_template(&assembly);

    let (_, group) = servers.resources_of_type(ResourceType::DbSubnetGroup)[0];
    let subnet_ids = group.get("SubnetIds").unwrap().as_array().unwrap();
    assert_eq!(subnet_ids.len(), azs);

    for import in subnet_ids {
        let subnet = imported_resource(network, import);
        assert_eq!(subnet.get("MapPublicIpOnLaunch"), Some(&json!(false)));
    }
}

#[test]
fn test_database_wiring() {
    let assembly = synth(&default_config());
    let servers = server_template(&assembly);
    let (_, db) = servers.resources_of_type(ResourceType::DbInstance)[0];

    assert_eq!(
        db.get("VPCSecurityGroups"),
        Some(&json!([{ "Fn::GetAtt": [logical_id(&[DATABASE_POLICY, "Resource"]), "GroupId"] }]))
    );
    assert_eq!(db.get("StorageType"), Some(&json!("gp2")));
    assert_eq!(db.deletion_policy(), Some("Snapshot"));
}

#[test]
fn test_postgres_opens_its_own_port() {
    let assembly = synth(&postgres_config());
    let (_, rule) = server_template(&assembly).resources_of_type(ResourceType::SecurityGroupIngress)[0];
    assert_eq!(rule.get("FromPort"), Some(&json!(5432)));

    let (_, db) = server_template(&assembly).resources_of_type(ResourceType::DbInstance)[0];
    assert_eq!(db.get("Engine"), Some(&json!("postgres")));
    assert_eq!(db.get("EngineVersion"), Some(&json!("15.4")));
}

#[test]
fn test_identical_parameters_identical_templates() {
    let first = synthesize(&default_config()).unwrap();
    let second = synthesize(&default_config()).unwrap();

    assert_ne!(first.run().id, second.run().id);
    for (a, b) in first.stacks().iter().zip(second.stacks()) {
        assert_eq!(a.template().to_json_pretty().unwrap(), b.template().to_json_pretty().unwrap());
    }
    assert_eq!(synth(&default_config()), synth(&default_config()));
}

#[test]
fn test_every_import_is_exported() {
    let assembly = synth(&config_with_azs(3));
    let exports = network_template(&assembly).export_names();
    let imports = server_template(&assembly).imported_values();

    assert!(!imports.is_empty());
    for import in &imports {
        assert!(exports.contains(import), "{} is not exported", import);
    }
}

#[test]
fn test_manifest_orders_network_first() {
    let assembly = synth(&default_config());
    let manifest = assembly.manifest();

    assert_eq!(manifest.stack_order(), vec![NETWORK_STACK, SERVER_STACK]);
    assert_eq!(
        manifest.artifacts[SERVER_STACK].dependencies,
        vec![NETWORK_STACK.to_string()]
    );
    assert!(manifest.artifacts[NETWORK_STACK].dependencies.is_empty());
}

#[test]
fn test_templates_are_self_contained() {
    for config in [default_config(), config_with_azs(5), postgres_config(), mixed_mask_config()] {
        let assembly = synth(&config);
        for stack in assembly.stacks() {
            assert_eq!(stack.template().dangling_references(), Vec::<String>::new());
        }
    }
}

#[test]
fn test_custom_stack_names_flow_into_exports() {
    let mut config = default_config();
    config.network_stack_name = "Net".to_string();
    config.server_stack_name = "Web".to_string();

    let assembly = synth(&config);
    assert_eq!(assembly.manifest().stack_order(), vec!["Net", "Web"]);
    assert!(assembly
        .stack("Web")
        .unwrap()
        .template()
        .imported_values()
        .iter()
        .all(|name| name.starts_with("Net:")));
}

#[test_case(
    |c: &mut TopologyConfig| c.network.max_azs = 0,
    TopologyError::InvalidAzCount(0) ; "zero zones"
)]
#[test_case(
    |c: &mut TopologyConfig| c.network.max_azs = 7,
    TopologyError::InvalidAzCount(7) ; "too many zones"
)]
#[test_case(
    |c: &mut TopologyConfig| c.network.cidr = Ipv4Cidr::new("10.0.0.0/8").unwrap(),
    TopologyError::InvalidPrefixLength(8) ; "network too wide"
)]
#[test_case(
    |c: &mut TopologyConfig| c.network.subnet_groups = vec![
        SubnetGroup::default_of(SubnetType::Private)
    ],
    TopologyError::MissingPublicSubnets ; "private without public"
)]
#[test_case(
    |c: &mut TopologyConfig| c.network.subnet_groups = vec![
        SubnetGroup::default_of(SubnetType::Public),
        SubnetGroup::default_of(SubnetType::Public),
    ],
    TopologyError::DuplicateSubnetGroup("Public".to_string()) ; "duplicate group"
)]
fn test_invalid_parameters_rejected(mutate: fn(&mut TopologyConfig), expected: TopologyError) {
    let mut config = default_config();
    mutate(&mut config);
    assert_eq!(synthesize(&config).unwrap_err(), expected);
}

#[test]
fn test_address_space_exhaustion_rejected() {
    let mut config = config_with_azs(6);
    config.network.cidr = Ipv4Cidr::new("10.0.0.0/24").unwrap();
    config.network = config
        .network
        .with_uniform_mask(SubnetMask::new(26).unwrap())
        .unwrap();

    assert!(matches!(
        synthesize(&config),
        Err(TopologyError::AddressSpaceExhausted {
            required: 768,
            available: 256,
            ..
        })
    ));
}
