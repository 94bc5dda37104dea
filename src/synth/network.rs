// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network stack rendering
//!
//! Resource layout for a declared [`NetworkTopology`]:
//!
//! - VPC with DNS support and hostnames
//! - per subnet: subnet, route table, association, default route
//! - NAT gateway plus elastic IP in the first `nat_gateways` public subnets
//! - internet gateway and its attachment
//! - one exported output per identifier the server stack consumes
//!
//! Zones are picked with `Fn::GetAZs` and address blocks with `Fn::Cidr`, so
//! the engine resolves both at deploy time.

use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::ResourceType;
use crate::errors::{TopologyError, TopologyResult};
use crate::synth::StackBuilder;
use crate::template::{logical_id, Intrinsic, Output, Resource, Template};
use crate::topology::{NetworkTopology, Subnet};

const ANY_IPV4: &str = "0.0.0.0/0";

/// Identifiers the network stack exports for the server stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkExports {
    stack_name: String,
    vpc: String,
    subnets: IndexMap<String, String>,
}

impl NetworkExports {
    /// Export name of the `Ref` of `logical_id`
    pub fn export_name(&self, logical_id: &str) -> String {
        format!("{}:{}", self.stack_name, output_id(logical_id))
    }

    /// Import of the VPC id
    pub fn vpc_id(&self) -> Value {
        Intrinsic::import_value(self.export_name(&self.vpc)).into()
    }

    /// Import of a subnet id, by subnet construct name
    pub fn subnet_id(&self, subnet: &str) -> TopologyResult<Value> {
        let id = self.subnets.get(subnet).ok_or_else(|| {
            TopologyError::Configuration(format!(
                "Subnet {} is not exported by {}",
                subnet, self.stack_name
            ))
        })?;
        Ok(Intrinsic::import_value(self.export_name(id)).into())
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }
}

fn output_id(logical_id: &str) -> String {
    format!("ExportsOutputRef{}", logical_id)
}

/// Render the network stack template
pub fn render(stack_name: &str, network: &NetworkTopology) -> TopologyResult<(Template, NetworkExports)> {
    let vpc_name = network.name();
    let mut stack = StackBuilder::new(
        stack_name,
        format!(
            "Virtual network {} spanning {} availability zones",
            vpc_name,
            network.az_count()
        ),
    );

    let vpc = stack.add(
        &[vpc_name, "Resource"],
        Resource::new(ResourceType::Vpc)
            .property("CidrBlock", network.cidr().to_string())
            .property("EnableDnsHostnames", true)
            .property("EnableDnsSupport", true)
            .property("InstanceTenancy", "default")
            .property("Tags", json!([stack.name_tag(&[vpc_name])])),
    )?;

    // Ids referenced before their resources are added
    let igw = logical_id(&[vpc_name, "IGW"]);
    let attachment = logical_id(&[vpc_name, "VPCGW"]);
    let nat_ids: IndexMap<&str, String> = network
        .nat_subnets()
        .into_iter()
        .map(|s| (s.name.as_str(), logical_id(&[vpc_name, s.name.as_str(), "NATGateway"])))
        .collect();

    let mut subnet_ids = IndexMap::new();
    for subnet in network.subnets() {
        let path = |leaf: &'static str| [vpc_name, subnet.name.as_str(), leaf];

        let subnet_id = stack.add(
            &path("Subnet"),
            Resource::new(ResourceType::Subnet)
                .property("AvailabilityZone", Intrinsic::availability_zone(subnet.zone_index))
                .property("CidrBlock", subnet_cidr(network, subnet))
                .property("MapPublicIpOnLaunch", subnet.is_public())
                .property("VpcId", Intrinsic::reference(&vpc))
                .property(
                    "Tags",
                    json!([
                        { "Key": "aws-cdk:subnet-name", "Value": subnet.group },
                        { "Key": "aws-cdk:subnet-type", "Value": subnet.subnet_type.as_str() },
                        stack.name_tag(&[vpc_name, subnet.name.as_str()]),
                    ]),
                ),
        )?;

        let route_table = stack.add(
            &path("RouteTable"),
            Resource::new(ResourceType::RouteTable)
                .property("VpcId", Intrinsic::reference(&vpc))
                .property("Tags", json!([stack.name_tag(&[vpc_name, subnet.name.as_str()])])),
        )?;

        let association = stack.add(
            &path("RouteTableAssociation"),
            Resource::new(ResourceType::SubnetRouteTableAssociation)
                .property("RouteTableId", Intrinsic::reference(&route_table))
                .property("SubnetId", Intrinsic::reference(&subnet_id)),
        )?;

        let route = Resource::new(ResourceType::Route)
            .property("RouteTableId", Intrinsic::reference(&route_table))
            .property("DestinationCidrBlock", ANY_IPV4);
        let route = if subnet.is_public() {
            route
                .property("GatewayId", Intrinsic::reference(&igw))
                .depends_on(&attachment)
        } else {
            let nat_subnet = network.nat_subnet_for_zone(subnet.zone_index).ok_or_else(|| {
                TopologyError::Configuration(format!("No NAT gateway serves {}", subnet.name))
            })?;
            let nat = nat_ids.get(nat_subnet.name.as_str()).ok_or_else(|| {
                TopologyError::Configuration(format!("No NAT gateway in {}", nat_subnet.name))
            })?;
            route.property("NatGatewayId", Intrinsic::reference(nat))
        };
        let default_route = stack.add(&path("DefaultRoute"), route)?;

        if let Some(nat_id) = nat_ids.get(subnet.name.as_str()) {
            let eip = stack.add(
                &path("EIP"),
                Resource::new(ResourceType::Eip)
                    .property("Domain", "vpc")
                    .property("Tags", json!([stack.name_tag(&[vpc_name, subnet.name.as_str()])])),
            )?;
            let nat = stack.add(
                &path("NATGateway"),
                Resource::new(ResourceType::NatGateway)
                    .property("AllocationId", Intrinsic::get_att(&eip, "AllocationId"))
                    .property("SubnetId", Intrinsic::reference(&subnet_id))
                    .property("Tags", json!([stack.name_tag(&[vpc_name, subnet.name.as_str()])]))
                    .depends_on(&default_route)
                    .depends_on(&association),
            )?;
            debug_assert_eq!(&nat, nat_id);
            debug!(subnet = %subnet.name, nat = %nat, "Rendered NAT gateway");
        }

        subnet_ids.insert(subnet.name.clone(), subnet_id);
    }

    stack.add(
        &[vpc_name, "IGW"],
        Resource::new(ResourceType::InternetGateway)
            .property("Tags", json!([stack.name_tag(&[vpc_name])])),
    )?;
    stack.add(
        &[vpc_name, "VPCGW"],
        Resource::new(ResourceType::VpcGatewayAttachment)
            .property("VpcId", Intrinsic::reference(&vpc))
            .property("InternetGatewayId", Intrinsic::reference(&igw)),
    )?;

    let exports = NetworkExports {
        stack_name: stack_name.to_string(),
        vpc,
        subnets: subnet_ids,
    };

    let exported = std::iter::once(exports.vpc.clone()).chain(exports.subnets.values().cloned());
    for id in exported {
        stack.template_mut().add_output(
            output_id(&id),
            Output::new(Intrinsic::reference(&id)).exported_as(exports.export_name(&id)),
        )?;
    }

    Ok((stack.finish(), exports))
}

/// Address block of `subnet`, carved by the engine
///
/// The network block is split into one equal slot per subnet, sized for the
/// widest group. A subnet narrower than its slot takes the slot's first block.
fn subnet_cidr(network: &NetworkTopology, subnet: &Subnet) -> Value {
    let slot_mask = network.slot_mask();
    let slot = Intrinsic::select(
        subnet.slot,
        Intrinsic::cidr(
            network.cidr().to_string(),
            network.subnets().len(),
            slot_mask.host_bits(),
        ),
    );

    if subnet.mask == slot_mask {
        return slot.into();
    }

    Intrinsic::select(0, Intrinsic::cidr(slot, 1, subnet.mask.host_bits())).into()
}
