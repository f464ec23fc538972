//! Core types for Thala admin.
//!
//! This module provides type-safe wrappers for identities, roles and permissions.

pub mod email;
pub mod role;

pub use email::{Email, EmailError};
pub use role::{AdminPermission, AdminRole, ParseRoleError};
