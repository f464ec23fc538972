//! Thala Core - Shared admin types library.
//!
//! This crate provides the pieces shared by the Thala admin components:
//! - `admin` - Admin HTTP service (sessions, backend gateway, audit log)
//! - `cli` - Command-line tools for the admin directory and SQL console
//!
//! # Architecture
//!
//! The core crate contains only types and logic - no I/O, no HTTP clients,
//! no storage. Everything here can be unit tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Validated emails, admin roles and permissions
//! - [`permissions`] - The configured admin directory and permission checks
//! - [`audit`] - Audit log records
//! - [`guard`] - Authenticate/authorize chain run before handlers
//! - [`resource`] - Backend resource catalogue and moderation targets
//! - [`console`] - SQL console: admission, state machine, history, charts, export

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod audit;
pub mod console;
pub mod guard;
pub mod permissions;
pub mod resource;
pub mod types;

pub use audit::{AuditAction, AuditLogEntry, DetailValue, NewAuditEntry};
pub use guard::{GuardChain, GuardError, GuardRejection, Identity, with_auth, with_permission};
pub use permissions::{AdminDirectory, AdminEntry, AdminUser, DirectoryError};
pub use resource::{ModerationAction, ModerationTarget, Mutation, ResourceKind};
pub use types::*;
