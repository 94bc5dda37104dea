// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Topology Synthesis
//!
//! For every generated configuration within the valid parameter space:
//! declaration succeeds, counts follow the zone count, the database stays
//! private and reachable only from the web policy, cross-stack references
//! resolve, and synthesis is deterministic.

use proptest::prelude::*;
use serde_json::json;

use cloud_topology::domain::{
    DatabaseEngine, InstanceClass, InstanceSize, InstanceType, Peer, ResourceType, SubnetMask,
};
use cloud_topology::topology::WEB_POLICY;
use cloud_topology::{declare_network, declare_servers, synthesize_run, TopologyConfig};

use crate::fixtures::{fixed_run, NETWORK_STACK, SERVER_STACK};

// ============================================================================
// Strategies
// ============================================================================

fn instance_type_strategy() -> impl Strategy<Value = InstanceType> {
    let class = prop_oneof![
        Just(InstanceClass::Burstable2),
        Just(InstanceClass::Burstable3),
        Just(InstanceClass::Standard5),
        Just(InstanceClass::Compute5),
    ];
    let size = prop_oneof![
        Just(InstanceSize::Micro),
        Just(InstanceSize::Small),
        Just(InstanceSize::Large),
    ];
    (class, size).prop_map(|(class, size)| InstanceType::of(class, size))
}

fn engine_strategy() -> impl Strategy<Value = DatabaseEngine> {
    prop_oneof![
        Just("5.7").prop_map(|v| DatabaseEngine::mysql(v).unwrap()),
        Just("8.0.35").prop_map(|v| DatabaseEngine::mysql(v).unwrap()),
        Just("14").prop_map(|v| DatabaseEngine::postgres(v).unwrap()),
        Just("16.1").prop_map(|v| DatabaseEngine::postgres(v).unwrap()),
    ]
}

/// Valid configurations: every combination fits a /16 network
fn config_strategy() -> impl Strategy<Value = TopologyConfig> {
    (
        1usize..=6,
        20u8..=28,
        prop::option::of(1usize..=6),
        prop_oneof![Just(80u16), Just(443), Just(8080)],
        instance_type_strategy(),
        engine_strategy(),
    )
        .prop_map(|(azs, mask, nat, web_port, instance_type, engine)| {
            let mut config = TopologyConfig::default();
            config.network.max_azs = azs;
            config.network.nat_gateways = nat;
            config.network = config
                .network
                .with_uniform_mask(SubnetMask::new(mask).unwrap())
                .unwrap();
            config.servers.web_port = web_port;
            config.servers.instance_type = instance_type;
            config.servers.database.engine = engine;
            config
        })
}

// ============================================================================
// Declaration Properties
// ============================================================================

proptest! {
    /// Property: one public and one private subnet per zone
    #[test]
    fn prop_subnets_follow_zone_count(config in config_strategy()) {
        let network = declare_network(&config.network).unwrap();

        prop_assert_eq!(network.public_subnets().len(), config.network.max_azs);
        prop_assert_eq!(network.private_subnets().len(), config.network.max_azs);
        prop_assert!(network.nat_gateways() >= 1);
        prop_assert!(network.nat_gateways() <= config.network.max_azs);
    }

    /// Property: one web server per public subnet
    #[test]
    fn prop_instances_match_public_subnets(config in config_strategy()) {
        let network = declare_network(&config.network).unwrap();
        let servers = declare_servers(&network, &config.servers).unwrap();

        prop_assert_eq!(servers.instances.len(), network.public_subnets().len());
        for instance in &servers.instances {
            prop_assert!(network.subnet(&instance.subnet).unwrap().is_public());
        }
    }

    /// Property: database ingress only from the web policy on the engine port
    #[test]
    fn prop_database_reachable_only_from_web(config in config_strategy()) {
        let network = declare_network(&config.network).unwrap();
        let servers = declare_servers(&network, &config.servers).unwrap();
        let port = config.servers.database.engine.port();

        let db_policy = &servers.database_policy;
        prop_assert!(db_policy.permits_tcp(&Peer::policy(WEB_POLICY), port));
        prop_assert!(!db_policy.permits_tcp(&Peer::any_ipv4(), port));
        prop_assert!(db_policy.ingress_rules().iter().all(|r| r.peer == Peer::policy(WEB_POLICY)));

        prop_assert!(servers.web_policy.permits_tcp(&Peer::any_ipv4(), config.servers.web_port));
    }

    /// Property: database subnets are exactly the private subnets
    #[test]
    fn prop_database_in_private_subnets(config in config_strategy()) {
        let network = declare_network(&config.network).unwrap();
        let servers = declare_servers(&network, &config.servers).unwrap();

        let private: Vec<String> = network.private_subnets().iter().map(|s| s.name.clone()).collect();
        prop_assert_eq!(&servers.database.subnets, &private);
    }
}

// ============================================================================
// Synthesis Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: synthesis is deterministic for a fixed run
    #[test]
    fn prop_synthesis_deterministic(config in config_strategy()) {
        let first = synthesize_run(&config, fixed_run()).unwrap();
        let second = synthesize_run(&config, fixed_run()).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: every import resolves, the network stack deploys first
    #[test]
    fn prop_cross_stack_references_resolve(config in config_strategy()) {
        let assembly = synthesize_run(&config, fixed_run()).unwrap();
        let network = assembly.stack(NETWORK_STACK).unwrap().template();
        let server = assembly.stack(SERVER_STACK).unwrap().template();

        let exports = network.export_names();
        for import in server.imported_values() {
            prop_assert!(exports.contains(&import));
        }
        let manifest = assembly.manifest();
        prop_assert_eq!(manifest.stack_order(), vec![NETWORK_STACK, SERVER_STACK]);
        prop_assert!(network.dangling_references().is_empty());
        prop_assert!(server.dangling_references().is_empty());
    }

    /// Property: rendered counts follow the zone count
    #[test]
    fn prop_rendered_counts(config in config_strategy()) {
        let assembly = synthesize_run(&config, fixed_run()).unwrap();
        let azs = config.network.max_azs;
        let network = assembly.stack(NETWORK_STACK).unwrap().template();
        let server = assembly.stack(SERVER_STACK).unwrap().template();

        prop_assert_eq!(network.resources_of_type(ResourceType::Subnet).len(), 2 * azs);
        prop_assert_eq!(network.resources_of_type(ResourceType::Route).len(), 2 * azs);
        prop_assert_eq!(server.resources_of_type(ResourceType::Instance).len(), azs);
        prop_assert_eq!(server.resources_of_type(ResourceType::DbInstance).len(), 1);

        for (_, instance) in server.resources_of_type(ResourceType::Instance) {
            prop_assert_eq!(
                instance.get("InstanceType").unwrap(),
                &json!(config.servers.instance_type.to_string())
            );
        }
    }
}
