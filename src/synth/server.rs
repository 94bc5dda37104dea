// Copyright (c) 2025 - Cowboy AI, Inc.
//! Server stack rendering
//!
//! Security groups, web server instances and the managed database of a
//! declared [`ServerTopology`]. Network identifiers come from the network
//! stack through `Fn::ImportValue`, which is also what makes this stack
//! depend on it.

use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::{IngressRule, MachineImage, Peer, ResourceType};
use crate::errors::{TopologyError, TopologyResult};
use crate::synth::{NetworkExports, StackBuilder};
use crate::template::{logical_id, Intrinsic, Parameter, Resource, Template};
use crate::topology::{ComputeInstance, ManagedDatabase, NetworkTopology, SecurityPolicy, ServerTopology};

const ANY_IPV4: &str = "0.0.0.0/0";

/// Characters left out of generated database passwords
const PASSWORD_EXCLUDED: &str = " %+~`#$&*()|[]{}:;<>?!'/@\"\\";

const PASSWORD_LENGTH: u32 = 30;

/// Render the server stack template
pub fn render(
    stack_name: &str,
    network: &NetworkTopology,
    servers: &ServerTopology,
    exports: &NetworkExports,
) -> TopologyResult<Template> {
    let mut stack = StackBuilder::new(
        stack_name,
        format!(
            "{} web servers and a {} database in {}",
            servers.instances.len(),
            servers.database.engine,
            network.name()
        ),
    );

    let group_ids: IndexMap<&str, String> = servers
        .policies()
        .into_iter()
        .map(|p| (p.name(), logical_id(&[p.name(), "Resource"])))
        .collect();

    for policy in servers.policies() {
        render_security_group(&mut stack, policy, &group_ids, exports)?;
    }

    for instance in &servers.instances {
        render_instance(&mut stack, instance, &group_ids, exports)?;
    }

    render_database(&mut stack, &servers.database, &group_ids, exports)?;

    Ok(stack.finish())
}

fn group_id<'a>(group_ids: &'a IndexMap<&str, String>, policy: &str) -> TopologyResult<&'a String> {
    group_ids.get(policy).ok_or_else(|| {
        TopologyError::Configuration(format!("Unknown security policy {}", policy))
    })
}

/// Inline address-range rules live on the group; policy-sourced rules become
/// separate ingress resources so two groups can reference each other.
fn render_security_group(
    stack: &mut StackBuilder,
    policy: &SecurityPolicy,
    group_ids: &IndexMap<&str, String>,
    exports: &NetworkExports,
) -> TopologyResult<()> {
    let inline: Vec<Value> = policy
        .ingress_rules()
        .iter()
        .filter(|rule| rule.peer.is_any())
        .map(|rule| {
            let mut entry = port_fields(rule);
            entry.insert("CidrIp".to_string(), json!(ANY_IPV4));
            entry.insert("Description".to_string(), json!(rule.description));
            Value::Object(entry)
        })
        .collect();

    let egress = if policy.allows_all_outbound() {
        json!([{
            "CidrIp": ANY_IPV4,
            "Description": "Allow all outbound traffic by default",
            "IpProtocol": "-1"
        }])
    } else {
        // The engine adds an allow-all rule to a group without egress rules
        json!([{
            "CidrIp": "255.255.255.255/32",
            "Description": "Disallow all traffic",
            "FromPort": 252,
            "IpProtocol": "icmp",
            "ToPort": 86
        }])
    };

    let mut group = Resource::new(ResourceType::SecurityGroup)
        .property("GroupDescription", policy.description())
        .property("SecurityGroupEgress", egress);
    if !inline.is_empty() {
        group = group.property("SecurityGroupIngress", inline);
    }
    let group = group.property("VpcId", exports.vpc_id());

    let own_id = stack.add(&[policy.name(), "Resource"], group)?;

    for rule in policy.ingress_rules() {
        let Peer::Policy(source) = &rule.peer else {
            continue;
        };
        let source_id = group_id(group_ids, source)?;
        let leaf = format!("from {}{}:{}", stack.stack_name(), source, rule.port);

        let mut resource = Resource::new(ResourceType::SecurityGroupIngress);
        for (key, value) in port_fields(rule) {
            resource = resource.property(key, value);
        }
        let resource = resource
            .property("Description", rule.description.as_str())
            .property("GroupId", Intrinsic::get_att(&own_id, "GroupId"))
            .property("SourceSecurityGroupId", Intrinsic::get_att(source_id, "GroupId"));

        stack.add(&[policy.name(), leaf.as_str()], resource)?;
    }

    debug!(
        policy = %policy.name(),
        rules = policy.ingress_rules().len(),
        "Rendered security group"
    );
    Ok(())
}

/// `IpProtocol`, plus `FromPort`/`ToPort` unless the rule covers all traffic
fn port_fields(rule: &IngressRule) -> serde_json::Map<String, Value> {
    let mut fields = serde_json::Map::new();
    fields.insert("IpProtocol".to_string(), json!(rule.port.protocol().as_str()));
    if !rule.port.is_all_traffic() {
        fields.insert("FromPort".to_string(), json!(rule.port.from_port()));
        fields.insert("ToPort".to_string(), json!(rule.port.to_port()));
    }
    fields
}

fn render_instance(
    stack: &mut StackBuilder,
    instance: &ComputeInstance,
    group_ids: &IndexMap<&str, String>,
    exports: &NetworkExports,
) -> TopologyResult<()> {
    let name = instance.name.as_str();

    let image_id: Value = match &instance.machine_image {
        MachineImage::Generic(ami) => json!(ami),
        image => {
            let parameter_name = image.ssm_parameter().ok_or_else(|| {
                TopologyError::Configuration(format!("{} has no image parameter", name))
            })?;
            let parameter_id = logical_id(&["SsmParameterValue", parameter_name, "Parameter"]);
            stack
                .template_mut()
                .add_parameter(parameter_id.clone(), Parameter::ssm_image_id(parameter_name))?;
            Intrinsic::reference(parameter_id).into()
        }
    };

    let role = stack.add(
        &[name, "InstanceRole", "Resource"],
        Resource::new(ResourceType::Role)
            .property(
                "AssumeRolePolicyDocument",
                json!({
                    "Statement": [{
                        "Action": "sts:AssumeRole",
                        "Effect": "Allow",
                        "Principal": { "Service": "ec2.amazonaws.com" }
                    }],
                    "Version": "2012-10-17"
                }),
            )
            .property("Tags", json!([stack.name_tag(&[name])])),
    )?;

    let profile = stack.add(
        &[name, "InstanceProfile"],
        Resource::new(ResourceType::InstanceProfile)
            .property("Roles", json!([Intrinsic::reference(&role).to_value()])),
    )?;

    let security_group = group_id(group_ids, &instance.security_policy)?;
    stack.add(
        &[name, "Resource"],
        Resource::new(ResourceType::Instance)
            .property("AvailabilityZone", Intrinsic::availability_zone(instance.zone_index))
            .property("IamInstanceProfile", Intrinsic::reference(&profile))
            .property("ImageId", image_id)
            .property("InstanceType", instance.instance_type.to_string())
            .property(
                "SecurityGroupIds",
                json!([Intrinsic::get_att(security_group, "GroupId").to_value()]),
            )
            .property("SubnetId", exports.subnet_id(&instance.subnet)?)
            .property("Tags", json!([stack.name_tag(&[name])]))
            .property(
                "UserData",
                Intrinsic::base64(MachineImage::USER_DATA_PRELUDE),
            )
            .depends_on(&role),
    )?;

    debug!(instance = %name, subnet = %instance.subnet, "Rendered compute instance");
    Ok(())
}

fn render_database(
    stack: &mut StackBuilder,
    database: &ManagedDatabase,
    group_ids: &IndexMap<&str, String>,
    exports: &NetworkExports,
) -> TopologyResult<()> {
    let name = database.name.as_str();

    let subnet_ids = database
        .subnets
        .iter()
        .map(|subnet| exports.subnet_id(subnet))
        .collect::<TopologyResult<Vec<Value>>>()?;

    let subnet_group = stack.add(
        &[name, "SubnetGroup", "Default"],
        Resource::new(ResourceType::DbSubnetGroup)
            .property(
                "DBSubnetGroupDescription",
                format!("Subnet group for {} database", name),
            )
            .property("SubnetIds", subnet_ids),
    )?;

    let secret_template = json!({ "username": database.master_username }).to_string();
    let secret = stack.add(
        &[name, "Secret", "Resource"],
        Resource::new(ResourceType::Secret)
            .property(
                "Description",
                format!("Master credentials for {}/{}", stack.stack_name(), name),
            )
            .property(
                "GenerateSecretString",
                json!({
                    "ExcludeCharacters": PASSWORD_EXCLUDED,
                    "GenerateStringKey": "password",
                    "PasswordLength": PASSWORD_LENGTH,
                    "SecretStringTemplate": secret_template
                }),
            ),
    )?;

    let db_id = logical_id(&[name, "Resource"]);
    stack.add(
        &[name, "Secret", "Attachment", "Resource"],
        Resource::new(ResourceType::SecretTargetAttachment)
            .property("SecretId", Intrinsic::reference(&secret))
            .property("TargetId", Intrinsic::reference(&db_id))
            .property("TargetType", ResourceType::DbInstance.as_str()),
    )?;

    let security_groups = database
        .security_policies
        .iter()
        .map(|policy| {
            group_id(group_ids, policy).map(|id| Intrinsic::get_att(id, "GroupId").to_value())
        })
        .collect::<TopologyResult<Vec<Value>>>()?;

    let added = stack.add(
        &[name, "Resource"],
        Resource::new(ResourceType::DbInstance)
            .property("AllocatedStorage", database.allocated_storage_gb.to_string())
            .property("CopyTagsToSnapshot", true)
            .property("DBInstanceClass", database.instance_class.as_db_class())
            .property("DBSubnetGroupName", Intrinsic::reference(&subnet_group))
            .property("Engine", database.engine.kind().as_str())
            .property("EngineVersion", database.engine.version())
            .property("MasterUsername", resolve_secret(&secret, "username"))
            .property("MasterUserPassword", resolve_secret(&secret, "password"))
            .property("Port", database.port().to_string())
            .property("StorageType", "gp2")
            .property("VPCSecurityGroups", security_groups)
            .removal_policy(database.removal_policy),
    )?;
    debug_assert_eq!(added, db_id);

    debug!(database = %name, engine = %database.engine, "Rendered managed database");
    Ok(())
}

/// Dynamic reference to one key of a generated secret
fn resolve_secret(secret: &str, key: &str) -> Value {
    Intrinsic::join(
        "",
        vec![
            json!("{{resolve:secretsmanager:"),
            Intrinsic::reference(secret).into(),
            json!(format!(":SecretString:{}::}}}}", key)),
        ],
    )
    .into()
}
