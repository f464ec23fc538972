//! Admin directory commands.
//!
//! # Usage
//!
//! ```bash
//! # List configured admins
//! thala-cli admin list --file admins.yaml
//!
//! # Check a single permission (exit status 1 if denied)
//! thala-cli admin check --file admins.yaml -e ops@thala.app -p view_audit_logs
//!
//! # Print the role table
//! thala-cli admin roles
//! ```

use std::io::Write;
use std::path::Path;

use thiserror::Error;

use thala_admin::config::{ConfigError, load_admin_directory};
use thala_core::{AdminDirectory, AdminPermission, AdminRole};

/// Errors that can occur during admin directory operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Directory file missing or malformed.
    #[error(transparent)]
    Directory(#[from] ConfigError),

    /// Unknown permission name.
    #[error("Invalid permission: {0}")]
    InvalidPermission(String),

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

fn load(file: &Path) -> Result<AdminDirectory, AdminError> {
    let directory = load_admin_directory(file)?;
    tracing::debug!(file = %file.display(), admins = directory.len(), "Admin directory loaded");
    Ok(directory)
}

/// Print every admin with role and permission count.
///
/// # Errors
///
/// Returns `AdminError` if the directory cannot be loaded.
pub fn list(file: &Path, out: &mut impl Write) -> Result<(), AdminError> {
    let directory = load(file)?;
    if directory.is_empty() {
        tracing::warn!("No admins configured");
    }
    for admin in directory.admins() {
        writeln!(
            out,
            "{:<40} {:<12} {:>2} permissions  {}",
            admin.email.as_str(),
            admin.role.as_str(),
            admin.permissions.len(),
            admin.name
        )?;
    }
    Ok(())
}

/// Check whether `email` holds `permission`.
///
/// Unknown emails hold no permissions.
///
/// # Errors
///
/// Returns `AdminError` if the directory cannot be loaded or the permission
/// name is unknown.
pub fn check(file: &Path, email: &str, permission: &str) -> Result<bool, AdminError> {
    let permission: AdminPermission = permission
        .parse()
        .map_err(|_| AdminError::InvalidPermission(permission.to_owned()))?;
    let directory = load(file)?;

    let granted = directory.has_permission(email, permission);
    if granted {
        tracing::info!("{email} has {permission}");
    } else if directory.is_authorized_admin(email) {
        tracing::warn!("{email} lacks {permission}");
    } else {
        tracing::warn!("{email} is not an admin");
    }
    Ok(granted)
}

/// Print the role → permission table.
///
/// # Errors
///
/// Returns `AdminError` if writing fails.
pub fn roles(out: &mut impl Write) -> Result<(), AdminError> {
    for role in AdminRole::ALL {
        writeln!(out, "{role} ({} permissions)", role.permissions().len())?;
        for permission in role.permissions() {
            writeln!(out, "  {permission}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn directory_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("thala-cli-{name}-{}.yaml", std::process::id()));
        std::fs::write(
            &path,
            "admins:\n  - email: ops@thala.app\n    name: Ops\n    role: moderator\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_check_permission() {
        let file = directory_file("check");
        assert!(check(&file, "ops@thala.app", "delete_videos").unwrap());
        assert!(!check(&file, "ops@thala.app", "manage_admins").unwrap());
        assert!(!check(&file, "stranger@thala.app", "view_users").unwrap());
        assert!(matches!(
            check(&file, "ops@thala.app", "launch_rockets"),
            Err(AdminError::InvalidPermission(_))
        ));
        std::fs::remove_file(file).ok();
    }

    #[test]
    fn test_list_and_roles_output() {
        let file = directory_file("list");
        let mut out = Vec::new();
        list(&file, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("ops@thala.app"));
        assert!(text.contains("moderator"));
        std::fs::remove_file(file).ok();

        let mut out = Vec::new();
        roles(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("viewer"));
        assert!(text.contains("  manage_admins"));
    }
}
