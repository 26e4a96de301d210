//! Conversion of GitHub roles into product permission sets.
//!
//! GitHub reports a collaborator's access both as a role name and as
//! granular boolean permission flags. Canonical role names resolve
//! directly through the site-configured mapping table; custom role
//! names never fail the conversion, they degrade to the highest
//! canonical level implied by the flags. The conversion is pure:
//! identical inputs always yield an identical, order-independent set.

use std::collections::BTreeSet;

use serde::Deserialize;

/// Permissions a product grants on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProductPermission {
    /// Browse the project.
    User,
    /// Read source code.
    CodeViewer,
    /// Administer issues.
    IssueAdmin,
    /// Administer security hotspots.
    SecurityHotspotAdmin,
    /// Administer the project.
    Admin,
    /// Push analysis reports.
    Scan,
}

/// One row of the site-configured role mapping table.
///
/// Rows are loaded by the host application; the converter only uses
/// them as a lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionMapping {
    /// Hosting platform the row applies to, e.g. `github`.
    pub devops_platform: String,
    /// Canonical role name on the platform side.
    pub github_role: String,
    /// Product permission granted for that role.
    pub product_permission: ProductPermission,
}

impl PermissionMapping {
    /// Creates a mapping row for the GitHub platform.
    #[must_use]
    pub fn github(github_role: impl Into<String>, product_permission: ProductPermission) -> Self {
        Self {
            devops_platform: "github".to_owned(),
            github_role: github_role.into(),
            product_permission,
        }
    }
}

/// Granular boolean permission flags attached to a collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RepositoryPermissions {
    /// Full administrative access.
    #[serde(default)]
    pub admin: bool,
    /// Manage the repository without destructive actions.
    #[serde(default)]
    pub maintain: bool,
    /// Push to the repository.
    #[serde(default)]
    pub push: bool,
    /// Manage issues and pull requests.
    #[serde(default)]
    pub triage: bool,
    /// Read and clone the repository.
    #[serde(default)]
    pub pull: bool,
}

/// Product permissions for a role, resolving custom roles through the
/// granular permission flags.
///
/// A canonical role maps directly, independent of the flags; an
/// unrecognized role name falls back to the highest canonical level the
/// flags imply. `none`, or a custom role with no flags set, yields an
/// empty set.
#[must_use]
pub fn product_permissions_with_fallback(
    mapping: &[PermissionMapping],
    github_role: &str,
    repository_permissions: &RepositoryPermissions,
) -> BTreeSet<ProductPermission> {
    canonical_role(github_role)
        .or_else(|| highest_role_from_flags(repository_permissions))
        .map(|role| lookup(mapping, role))
        .unwrap_or_default()
}

/// Product permissions for a repository's default role.
///
/// Default roles are always canonical; an unrecognized name yields an
/// empty set.
#[must_use]
pub fn product_permissions_for_default_role(
    mapping: &[PermissionMapping],
    github_role: &str,
) -> BTreeSet<ProductPermission> {
    canonical_role(github_role)
        .map(|role| lookup(mapping, role))
        .unwrap_or_default()
}

/// Normalizes a role name to its canonical mapping-table spelling.
fn canonical_role(github_role: &str) -> Option<&'static str> {
    match github_role.to_ascii_lowercase().as_str() {
        "read" | "pull" => Some("read"),
        "triage" => Some("triage"),
        "write" | "push" => Some("write"),
        "maintain" => Some("maintain"),
        "admin" => Some("admin"),
        "none" => Some("none"),
        _ => None,
    }
}

/// Highest canonical role implied by the granular flags.
fn highest_role_from_flags(permissions: &RepositoryPermissions) -> Option<&'static str> {
    if permissions.admin {
        Some("admin")
    } else if permissions.maintain {
        Some("maintain")
    } else if permissions.push {
        Some("write")
    } else if permissions.triage {
        Some("triage")
    } else if permissions.pull {
        Some("read")
    } else {
        None
    }
}

fn lookup(mapping: &[PermissionMapping], github_role: &str) -> BTreeSet<ProductPermission> {
    mapping
        .iter()
        .filter(|row| {
            row.devops_platform.eq_ignore_ascii_case("github") && row.github_role == github_role
        })
        .map(|row| row.product_permission)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rstest::rstest;

    use super::{
        PermissionMapping, ProductPermission, RepositoryPermissions,
        product_permissions_for_default_role, product_permissions_with_fallback,
    };

    fn mapping_table() -> Vec<PermissionMapping> {
        vec![
            PermissionMapping::github("read", ProductPermission::User),
            PermissionMapping::github("read", ProductPermission::CodeViewer),
            PermissionMapping::github("triage", ProductPermission::User),
            PermissionMapping::github("triage", ProductPermission::CodeViewer),
            PermissionMapping::github("write", ProductPermission::User),
            PermissionMapping::github("write", ProductPermission::CodeViewer),
            PermissionMapping::github("write", ProductPermission::IssueAdmin),
            PermissionMapping::github("write", ProductPermission::SecurityHotspotAdmin),
            PermissionMapping::github("write", ProductPermission::Scan),
            PermissionMapping::github("maintain", ProductPermission::User),
            PermissionMapping::github("maintain", ProductPermission::Scan),
            PermissionMapping::github("admin", ProductPermission::User),
            PermissionMapping::github("admin", ProductPermission::Admin),
            PermissionMapping::github("admin", ProductPermission::Scan),
        ]
    }

    const WRITE_PERMS: RepositoryPermissions = RepositoryPermissions {
        admin: false,
        maintain: false,
        push: true,
        triage: false,
        pull: true,
    };

    #[rstest]
    #[case::alias_pull("pull", "read")]
    #[case::alias_push("push", "write")]
    #[case::same_spelling("maintain", "maintain")]
    fn role_aliases_resolve_to_the_same_set(#[case] alias: &str, #[case] canonical: &str) {
        let table = mapping_table();

        assert_eq!(
            product_permissions_for_default_role(&table, alias),
            product_permissions_for_default_role(&table, canonical)
        );
    }

    #[test]
    fn canonical_role_ignores_the_granular_flags() {
        let table = mapping_table();

        let from_role = product_permissions_with_fallback(&table, "read", &WRITE_PERMS);

        assert_eq!(from_role, product_permissions_for_default_role(&table, "read"));
    }

    #[test]
    fn custom_role_falls_back_to_the_highest_flag() {
        let table = mapping_table();

        let custom =
            product_permissions_with_fallback(&table, "custom_role_extending_write", &WRITE_PERMS);
        let canonical = product_permissions_with_fallback(
            &table,
            "write",
            &RepositoryPermissions::default(),
        );

        assert_eq!(custom, canonical);
        assert!(custom.contains(&ProductPermission::IssueAdmin));
    }

    #[test]
    fn admin_flag_outranks_every_other_flag() {
        let table = mapping_table();
        let all_flags = RepositoryPermissions {
            admin: true,
            maintain: true,
            push: true,
            triage: true,
            pull: true,
        };

        let converted = product_permissions_with_fallback(&table, "custom", &all_flags);

        assert_eq!(converted, product_permissions_for_default_role(&table, "admin"));
    }

    #[test]
    fn none_and_flagless_custom_roles_yield_empty_sets() {
        let table = mapping_table();

        assert_eq!(
            product_permissions_with_fallback(&table, "none", &WRITE_PERMS),
            BTreeSet::new()
        );
        assert_eq!(
            product_permissions_with_fallback(
                &table,
                "custom",
                &RepositoryPermissions::default()
            ),
            BTreeSet::new()
        );
    }

    #[test]
    fn rows_for_other_platforms_are_ignored() {
        let mut table = mapping_table();
        table.push(PermissionMapping {
            devops_platform: "gitlab".to_owned(),
            github_role: "read".to_owned(),
            product_permission: ProductPermission::Admin,
        });

        let converted = product_permissions_for_default_role(&table, "read");

        assert!(!converted.contains(&ProductPermission::Admin));
    }
}
