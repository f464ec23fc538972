//! Request guards: authenticate → authorize → handle.
//!
//! A [`GuardChain`] is an ordered list of checks run before a handler. The
//! first step is always authentication (an identity must be present); the
//! following steps each require one permission from the [`AdminDirectory`].
//! The chain knows nothing about HTTP; the admin crate maps
//! [`GuardRejection`] to status codes.
//!
//! [`with_auth`] and [`with_permission`] are the entry points for the two
//! common chains. The admin service composes chains itself because it
//! audits forbidden callers between the check and the response.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::permissions::AdminDirectory;
use crate::types::{AdminPermission, Email};

/// The authenticated caller, as resolved from a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: Email,
    pub name: Option<String>,
}

impl Identity {
    #[must_use]
    pub const fn new(email: Email, name: Option<String>) -> Self {
        Self { email, name }
    }
}

/// Why a guard chain refused a request. Both outcomes are terminal.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    /// No identity was presented.
    #[error("Unauthorized")]
    Unauthenticated,
    /// The identity lacks a required permission.
    #[error("Forbidden: Insufficient permissions")]
    Forbidden(AdminPermission),
}

/// Outcome of running a handler behind a guard chain.
#[derive(thiserror::Error, Debug)]
pub enum GuardError<E> {
    /// The chain refused the request; the handler never ran.
    #[error(transparent)]
    Rejected(#[from] GuardRejection),
    /// The handler ran and failed.
    #[error("handler failed: {0}")]
    Handler(E),
}

/// One step after authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Require(AdminPermission),
}

/// Ordered guard chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardChain {
    steps: Vec<Step>,
}

impl GuardChain {
    /// A chain that only requires an authenticated identity.
    #[must_use]
    pub const fn authenticated() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a permission requirement.
    #[must_use]
    pub fn require(mut self, permission: AdminPermission) -> Self {
        self.steps.push(Step::Require(permission));
        self
    }

    /// Permissions this chain requires, in check order.
    pub fn required_permissions(&self) -> impl Iterator<Item = AdminPermission> + '_ {
        self.steps.iter().map(|Step::Require(p)| *p)
    }

    /// Run every check without invoking a handler.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's rejection.
    pub fn admit(
        &self,
        directory: &AdminDirectory,
        identity: Option<&Identity>,
    ) -> Result<(), GuardRejection> {
        let identity = identity.ok_or(GuardRejection::Unauthenticated)?;
        for step in &self.steps {
            match *step {
                Step::Require(permission) => {
                    if !directory.has_permission(identity.email.as_str(), permission) {
                        return Err(GuardRejection::Forbidden(permission));
                    }
                }
            }
        }
        Ok(())
    }

    /// Run the checks, then `handler` with the admitted identity.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Rejected` if a check fails (the handler is not
    /// called) or `GuardError::Handler` if the handler fails.
    pub async fn run<F, Fut, T, E>(
        &self,
        directory: &AdminDirectory,
        identity: Option<Identity>,
        handler: F,
    ) -> Result<T, GuardError<E>>
    where
        F: FnOnce(Identity) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.admit(directory, identity.as_ref())?;
        let identity = identity.ok_or(GuardRejection::Unauthenticated)?;
        handler(identity).await.map_err(GuardError::Handler)
    }
}

/// Run `handler` if an identity is present.
///
/// # Errors
///
/// See [`GuardChain::run`].
pub async fn with_auth<F, Fut, T, E>(
    directory: &AdminDirectory,
    identity: Option<Identity>,
    handler: F,
) -> Result<T, GuardError<E>>
where
    F: FnOnce(Identity) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    GuardChain::authenticated()
        .run(directory, identity, handler)
        .await
}

/// Run `handler` if an identity is present and holds `permission`.
///
/// ```
/// use thala_core::{AdminDirectory, AdminEntry, AdminPermission, AdminRole, Email};
/// use thala_core::{GuardError, GuardRejection, Identity, with_permission};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let email = Email::parse("viewer@thala.app").unwrap();
/// let directory = AdminDirectory::new([AdminEntry {
///     email: email.clone(),
///     name: "Viewer".to_string(),
///     role: AdminRole::Viewer,
/// }])
/// .unwrap();
///
/// let denied: Result<(), GuardError<String>> = with_permission(
///     &directory,
///     AdminPermission::DeleteUsers,
///     Some(Identity::new(email, None)),
///     |_| async { Ok(()) },
/// )
/// .await;
/// assert!(matches!(
///     denied,
///     Err(GuardError::Rejected(GuardRejection::Forbidden(AdminPermission::DeleteUsers)))
/// ));
/// # }
/// ```
///
/// # Errors
///
/// See [`GuardChain::run`].
pub async fn with_permission<F, Fut, T, E>(
    directory: &AdminDirectory,
    permission: AdminPermission,
    identity: Option<Identity>,
    handler: F,
) -> Result<T, GuardError<E>>
where
    F: FnOnce(Identity) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    GuardChain::authenticated()
        .require(permission)
        .run(directory, identity, handler)
        .await
}
