// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Value Objects
//!
//! Construction either validates or rejects; accepted values render back to
//! the text they were parsed from.

use proptest::prelude::*;
use std::net::Ipv4Addr;

use cloud_topology::domain::{Ipv4Cidr, Port, SubnetMask};
use cloud_topology::template::logical_id;
use cloud_topology::TopologyError;

proptest! {
    /// Property: a block is accepted iff no host bits are set
    #[test]
    fn prop_cidr_host_bits(raw in any::<u32>(), prefix in 0u8..=32) {
        let address = Ipv4Addr::from(raw);
        let host_mask = u32::MAX.checked_shr(u32::from(prefix)).unwrap_or(0);
        let result = Ipv4Cidr::from_parts(address, prefix);

        if raw & host_mask == 0 {
            let cidr = result.unwrap();
            prop_assert_eq!(cidr.to_string().parse::<Ipv4Cidr>().unwrap(), cidr);
        } else {
            prop_assert!(matches!(result, Err(TopologyError::InvalidCidr(_))));
        }
    }

    /// Property: subnet masks outside /16-/28 are rejected
    #[test]
    fn prop_subnet_mask_bounds(prefix in 0u8..=32) {
        let accepted = SubnetMask::new(prefix).is_ok();
        prop_assert_eq!(accepted, (16..=28).contains(&prefix));
    }

    /// Property: port ranges need 1 <= from <= to
    #[test]
    fn prop_port_ranges(from in 0u16..=1024, to in 0u16..=1024) {
        let result = Port::range(cloud_topology::domain::Protocol::Tcp, from, to);
        prop_assert_eq!(result.is_ok(), from >= 1 && from <= to);
        if let Ok(port) = result {
            prop_assert!(port.contains(from));
            prop_assert!(port.contains(to));
        }
    }

    /// Property: logical ids are alphanumeric, deterministic and path-sensitive
    #[test]
    fn prop_logical_ids(a in "[A-Za-z][A-Za-z0-9 :/-]{0,20}", b in "[A-Za-z][A-Za-z0-9]{0,20}") {
        let id = logical_id(&[a.as_str(), b.as_str()]);
        prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        prop_assert_eq!(&id, &logical_id(&[a.as_str(), b.as_str()]));
        prop_assert_ne!(id, logical_id(&[a.as_str(), b.as_str(), "Child"]));
    }
}
