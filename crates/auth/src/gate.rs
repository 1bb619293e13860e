//! Per-operation authorization gate.
//!
//! One gate is bound to one [`Policy`], i.e. one permission key. Evaluation
//! runs a tiny state machine: `Pending -> Granted | Denied`, terminal, no
//! retries. Every decision produces exactly one audit entry.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::Serialize;

use grantgate_core::UserId;

use crate::service::panic_message;
use crate::{AuthzError, PermissionKey, PermissionService, PrincipalContext};

/// Tracing target of decision audit entries.
pub const AUDIT_TARGET: &str = "grantgate::audit";

/// A named rule bound to exactly one permission key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Policy {
    name: String,
    permission: PermissionKey,
}

impl Policy {
    pub fn new(name: impl Into<String>, permission: PermissionKey) -> Self {
        Self {
            name: name.into(),
            permission,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn permission(&self) -> &PermissionKey {
        &self.permission
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// No credentials at all.
    Unauthenticated,
    /// Credentials without an identifier claim.
    MissingIdentity,
    /// Identifier claim present but unparseable.
    MalformedIdentity,
    /// No active grant (including store faults, which fail closed upstream).
    NotGranted,
    /// Evaluation itself faulted.
    Unexpected,
}

impl DenialKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DenialKind::Unauthenticated => "unauthenticated",
            DenialKind::MissingIdentity => "missing_identity",
            DenialKind::MalformedIdentity => "malformed_identity",
            DenialKind::NotGranted => "not_granted",
            DenialKind::Unexpected => "unexpected",
        }
    }

    /// Whether the caller should authenticate (again) rather than being told
    /// the operation is forbidden.
    pub fn requires_authentication(self) -> bool {
        matches!(
            self,
            DenialKind::Unauthenticated | DenialKind::MissingIdentity | DenialKind::MalformedIdentity
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Granted,
    Denied(DenialKind),
}

impl Decision {
    pub fn is_granted(self) -> bool {
        matches!(self, Decision::Granted)
    }
}

/// Evaluation state of a single decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Pending,
    Settled(Decision),
}

impl GateState {
    /// Move to a terminal state. A settled state never changes again.
    pub fn settle(self, decision: Decision) -> Self {
        match self {
            GateState::Pending => GateState::Settled(decision),
            settled @ GateState::Settled(_) => settled,
        }
    }

    pub fn decision(self) -> Option<Decision> {
        match self {
            GateState::Pending => None,
            GateState::Settled(d) => Some(d),
        }
    }
}

/// Gate consulting [`PermissionService`] for one policy.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    policy: Policy,
    service: Arc<PermissionService>,
}

impl AuthorizationGate {
    pub fn new(policy: Policy, service: Arc<PermissionService>) -> Self {
        Self { policy, service }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Decide whether `principal` may enter the protected operation.
    ///
    /// Never fails and never panics outward.
    pub async fn evaluate(&self, principal: &PrincipalContext) -> Decision {
        let mut state = GateState::Pending;

        let user_id = match principal {
            PrincipalContext::Anonymous => {
                state = state.settle(Decision::Denied(DenialKind::Unauthenticated));
                None
            }
            PrincipalContext::Unresolved(AuthzError::MalformedIdentity(_)) => {
                state = state.settle(Decision::Denied(DenialKind::MalformedIdentity));
                None
            }
            PrincipalContext::Unresolved(_) => {
                state = state.settle(Decision::Denied(DenialKind::MissingIdentity));
                None
            }
            PrincipalContext::Authenticated(p) => Some(p.user_id),
        };

        let mut fault = None;
        if let (GateState::Pending, Some(user_id)) = (state, user_id) {
            let check = AssertUnwindSafe(
                self.service
                    .check_permission(user_id, self.policy.permission()),
            )
            .catch_unwind()
            .await;

            state = match check {
                Ok(true) => state.settle(Decision::Granted),
                Ok(false) => state.settle(Decision::Denied(DenialKind::NotGranted)),
                Err(payload) => {
                    fault = Some(panic_message(payload.as_ref()));
                    state.settle(Decision::Denied(DenialKind::Unexpected))
                }
            };
        }

        let decision = state
            .decision()
            .unwrap_or(Decision::Denied(DenialKind::Unexpected));
        self.audit(user_id, decision, fault.as_deref());
        decision
    }

    fn audit(&self, user_id: Option<UserId>, decision: Decision, fault: Option<&str>) {
        let policy = self.policy.name();
        let permission = self.policy.permission().as_str();
        let user_id = user_id.map(|u| u.get());

        match decision {
            Decision::Granted => tracing::info!(
                target: AUDIT_TARGET,
                policy,
                permission,
                user_id,
                decision = "granted",
                "access granted"
            ),
            Decision::Denied(DenialKind::Unexpected) => tracing::error!(
                target: AUDIT_TARGET,
                policy,
                permission,
                user_id,
                decision = "denied",
                reason = DenialKind::Unexpected.as_str(),
                fault = fault.unwrap_or("unknown"),
                "authorization evaluation faulted; access denied"
            ),
            Decision::Denied(kind) => tracing::warn!(
                target: AUDIT_TARGET,
                policy,
                permission,
                user_id,
                decision = "denied",
                reason = kind.as_str(),
                "access denied"
            ),
        }
    }
}
