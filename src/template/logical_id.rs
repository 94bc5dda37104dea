// Copyright (c) 2025 - Cowboy AI, Inc.
//! Logical id allocation
//!
//! A construct path such as `["MyVpc", "PublicSubnet1", "Subnet"]` becomes
//! `MyVpcPublicSubnet1Subnet` followed by eight uppercase hex digits of the
//! SHA-256 of the full path. The suffix keeps ids unique when two paths
//! collapse to the same readable prefix.

use sha2::{Digest, Sha256};

/// Path components left out of the readable prefix
const HIDDEN_COMPONENTS: [&str; 2] = ["Resource", "Default"];

/// Readable prefix limit, leaving room for the suffix within 255 characters
const MAX_HUMAN_LEN: usize = 240;

const HASH_LEN: usize = 8;

/// Derive the logical id of the resource at `path`
///
/// Single-component paths are returned unhashed (after dropping
/// non-alphanumerics), matching top-level parameters and outputs.
///
/// # Examples
///
/// ```rust
/// use cloud_topology::template::logical_id;
///
/// let id = logical_id(&["MyVpc", "Resource"]);
/// assert!(id.starts_with("MyVpc"));
/// assert_eq!(id.len(), "MyVpc".len() + 8);
/// assert_eq!(id, logical_id(&["MyVpc", "Resource"]));
/// ```
pub fn logical_id(path: &[&str]) -> String {
    if let [single] = path {
        return sanitize(single);
    }

    let human: String = path
        .iter()
        .filter(|component| !HIDDEN_COMPONENTS.contains(component))
        .map(|component| sanitize(component))
        .collect::<String>()
        .chars()
        .take(MAX_HUMAN_LEN)
        .collect();

    format!("{}{}", human, path_hash(path))
}

fn sanitize(component: &str) -> String {
    component
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn path_hash(path: &[&str]) -> String {
    let digest = Sha256::digest(path.join("/").as_bytes());
    hex::encode_upper(digest)[..HASH_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_components_dropped() {
        let id = logical_id(&["MyRDSInstance", "SubnetGroup", "Default"]);
        assert!(id.starts_with("MyRDSInstanceSubnetGroup"));
        assert_eq!(id.len(), "MyRDSInstanceSubnetGroup".len() + HASH_LEN);
    }

    #[test]
    fn test_suffix_is_uppercase_hex() {
        let id = logical_id(&["MyVpc", "IGW"]);
        let suffix = &id[id.len() - HASH_LEN..];
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_same_prefix_different_paths() {
        // Both read "MyVpc" once the hidden component is dropped
        let a = logical_id(&["MyVpc", "Resource"]);
        let b = logical_id(&["MyVpc", "Default"]);
        assert_ne!(a, b);
        assert_eq!(&a[..5], &b[..5]);
    }

    #[test]
    fn test_single_component() {
        assert_eq!(logical_id(&["Exports-Output"]), "ExportsOutput");
    }

    #[test]
    fn test_non_alphanumerics_removed() {
        let id = logical_id(&["RDSSecurityGroup", "from WebSg:3306"]);
        assert!(id.starts_with("RDSSecurityGroupfromWebSg3306"));
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
