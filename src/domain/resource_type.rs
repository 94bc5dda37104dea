// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provider Resource Type Taxonomy
//!
//! Defines the set of provider resource types the two topology units declare.
//! Each type knows its template type name and which high-level category it
//! belongs to, so rendered resources can be logged and counted by concern.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    // Network
    /// Virtual network
    Vpc,
    /// Subnet inside a virtual network
    Subnet,
    /// Route table
    RouteTable,
    /// Route table to subnet binding
    SubnetRouteTableAssociation,
    /// Single route entry
    Route,
    /// Internet gateway
    InternetGateway,
    /// Internet gateway to network binding
    VpcGatewayAttachment,
    /// Elastic IP
    Eip,
    /// NAT gateway
    NatGateway,

    // Security
    /// Security group
    SecurityGroup,
    /// Standalone inbound rule
    SecurityGroupIngress,
    /// Generated secret
    Secret,
    /// Secret to database binding
    SecretTargetAttachment,

    // Identity
    /// IAM role
    Role,
    /// IAM instance profile
    InstanceProfile,

    // Compute
    /// Compute instance
    Instance,

    // Database
    /// Database subnet group
    DbSubnetGroup,
    /// Managed database instance
    DbInstance,
}

impl ResourceType {
    /// Template type name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vpc => "AWS::EC2::VPC",
            Self::Subnet => "AWS::EC2::Subnet",
            Self::RouteTable => "AWS::EC2::RouteTable",
            Self::SubnetRouteTableAssociation => "AWS::EC2::SubnetRouteTableAssociation",
            Self::Route => "AWS::EC2::Route",
            Self::InternetGateway => "AWS::EC2::InternetGateway",
            Self::VpcGatewayAttachment => "AWS::EC2::VPCGatewayAttachment",
            Self::Eip => "AWS::EC2::EIP",
            Self::NatGateway => "AWS::EC2::NatGateway",
            Self::SecurityGroup => "AWS::EC2::SecurityGroup",
            Self::SecurityGroupIngress => "AWS::EC2::SecurityGroupIngress",
            Self::Secret => "AWS::SecretsManager::Secret",
            Self::SecretTargetAttachment => "AWS::SecretsManager::SecretTargetAttachment",
            Self::Role => "AWS::IAM::Role",
            Self::InstanceProfile => "AWS::IAM::InstanceProfile",
            Self::Instance => "AWS::EC2::Instance",
            Self::DbSubnetGroup => "AWS::RDS::DBSubnetGroup",
            Self::DbInstance => "AWS::RDS::DBInstance",
        }
    }

    /// Parse from a template type name
    pub fn from_type_name(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Every declared type, in declaration order
    pub const ALL: [ResourceType; 18] = [
        Self::Vpc,
        Self::Subnet,
        Self::RouteTable,
        Self::SubnetRouteTableAssociation,
        Self::Route,
        Self::InternetGateway,
        Self::VpcGatewayAttachment,
        Self::Eip,
        Self::NatGateway,
        Self::SecurityGroup,
        Self::SecurityGroupIngress,
        Self::Secret,
        Self::SecretTargetAttachment,
        Self::Role,
        Self::InstanceProfile,
        Self::Instance,
        Self::DbSubnetGroup,
        Self::DbInstance,
    ];

    /// Get the primary category for this resource type
    pub fn category(&self) -> ResourceCategory {
        match self {
            Self::Vpc
            | Self::Subnet
            | Self::RouteTable
            | Self::SubnetRouteTableAssociation
            | Self::Route
            | Self::InternetGateway
            | Self::VpcGatewayAttachment
            | Self::Eip
            | Self::NatGateway => ResourceCategory::Network,

            Self::SecurityGroup
            | Self::SecurityGroupIngress
            | Self::Secret
            | Self::SecretTargetAttachment => ResourceCategory::Security,

            Self::Role | Self::InstanceProfile => ResourceCategory::Identity,

            Self::Instance => ResourceCategory::Compute,

            Self::DbSubnetGroup | Self::DbInstance => ResourceCategory::Database,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resource category (high-level grouping)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    /// Networks, subnets, routing, gateways
    Network,
    /// Security groups, rules, secrets
    Security,
    /// Roles and instance profiles
    Identity,
    /// Compute instances
    Compute,
    /// Managed databases
    Database,
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "Network"),
            Self::Security => write!(f, "Security"),
            Self::Identity => write!(f, "Identity"),
            Self::Compute => write!(f, "Compute"),
            Self::Database => write!(f, "Database"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_round_trip() {
        for t in ResourceType::ALL {
            assert_eq!(ResourceType::from_type_name(t.as_str()), Some(t));
        }
        assert_eq!(ResourceType::from_type_name("AWS::S3::Bucket"), None);
    }

    #[test]
    fn test_resource_categories() {
        assert_eq!(ResourceType::Subnet.category(), ResourceCategory::Network);
        assert_eq!(ResourceType::SecurityGroup.category(), ResourceCategory::Security);
        assert_eq!(ResourceType::Instance.category(), ResourceCategory::Compute);
        assert_eq!(ResourceType::DbInstance.category(), ResourceCategory::Database);
        assert_eq!(ResourceType::Role.category(), ResourceCategory::Identity);
    }
}
