/// Authorization policy for owned resources
///
/// One decision point for every per-resource action:
///
/// ```text
/// ALLOW  if principal.role == Admin
/// ALLOW  if principal.id == resource owner
/// DENY   otherwise
/// ```
///
/// The policy performs no I/O. Handlers fetch the ownership fact from the
/// task store and pass it in.
///
/// Listing is not decided per resource: [`list_scope`] picks the filter the
/// query runs with, so a standard principal never sees rows it does not own.
///
/// # Example
///
/// ```
/// use taskward_shared::auth::authorization::{authorize, Action, Decision};
/// use taskward_shared::models::user::{Principal, Role};
/// use uuid::Uuid;
///
/// let alice = Principal { id: Uuid::new_v4(), username: "alice".into(), role: Role::Standard };
///
/// assert_eq!(authorize(&alice, alice.id, Action::Delete), Decision::Allow);
/// assert_eq!(authorize(&alice, Uuid::new_v4(), Action::Read), Decision::Deny);
/// ```

use uuid::Uuid;

use crate::models::user::Principal;

/// Action attempted on a single resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Update,
    Delete,
    ChangeStatus,

    /// Listing another principal's collection
    List,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::ChangeStatus => "change_status",
            Action::List => "list",
        }
    }
}

/// Outcome of a policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Row filter for collection queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Only resources owned by this principal
    Owner(Uuid),

    /// Unfiltered (admin only)
    All,
}

/// Error type for resource access checks
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthzError {
    /// Resource is missing or belongs to someone else; deliberately ambiguous
    #[error("Resource not found")]
    NotFoundOrForbidden,

    /// Resource is missing (only reported to admins)
    #[error("Resource does not exist")]
    NotFound,
}

impl AuthzError {
    /// Error reported to `principal` for a resource that is not there
    pub fn missing_for(principal: &Principal) -> Self {
        if principal.is_admin() {
            AuthzError::NotFound
        } else {
            AuthzError::NotFoundOrForbidden
        }
    }
}

/// Decides whether `principal` may perform `action` on a resource owned by
/// `resource_owner_id`
///
/// The rule is the same for every action.
pub fn authorize(principal: &Principal, resource_owner_id: Uuid, action: Action) -> Decision {
    let decision = if principal.is_admin() || principal.id == resource_owner_id {
        Decision::Allow
    } else {
        Decision::Deny
    };

    tracing::trace!(
        user_id = %principal.id,
        owner_id = %resource_owner_id,
        action = action.as_str(),
        allowed = decision.is_allowed(),
        "Authorization decision"
    );

    decision
}

/// Checks access to a resource that may not exist
///
/// `resource_owner_id` is `None` when the lookup found nothing. Standard
/// principals get `NotFoundOrForbidden` both for missing resources and for
/// resources they do not own, so they cannot probe for existence. Admins get
/// a plain `NotFound`.
pub fn check_access(
    principal: &Principal,
    resource_owner_id: Option<Uuid>,
    action: Action,
) -> Result<(), AuthzError> {
    match resource_owner_id {
        None => Err(AuthzError::missing_for(principal)),
        Some(owner_id) => match authorize(principal, owner_id, action) {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(AuthzError::NotFoundOrForbidden),
        },
    }
}

/// Chooses the filter for a collection listing
///
/// `want_all` is honoured only for admins; standard principals always get
/// their own view.
pub fn list_scope(principal: &Principal, want_all: bool) -> ListScope {
    if want_all && principal.is_admin() {
        ListScope::All
    } else {
        ListScope::Owner(principal.id)
    }
}
