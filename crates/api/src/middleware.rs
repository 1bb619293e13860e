use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use grantgate_auth::{ClaimMapping, Claims, PrincipalContext, RequestPermissions, SnapshotLoader};

use crate::context::{RequestSnapshot, principal_of};

/// Token verification settings for [`identity_middleware`].
#[derive(Clone)]
pub struct IdentityState {
    key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    claims: ClaimMapping,
}

impl IdentityState {
    pub fn hs256(secret: &str, claims: ClaimMapping) -> Self {
        Self {
            key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(Validation::new(Algorithm::HS256)),
            claims,
        }
    }

    fn resolve(&self, headers: &HeaderMap) -> PrincipalContext {
        let Some(token) = extract_bearer(headers) else {
            return PrincipalContext::Anonymous;
        };

        match jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => PrincipalContext::from_claims(&data.claims, &self.claims),
            Err(e) => {
                tracing::warn!(error = %e, "bearer token rejected; treating request as anonymous");
                PrincipalContext::Anonymous
            }
        }
    }
}

/// Resolve the caller's [`PrincipalContext`] and attach it to the request.
///
/// Never rejects: authorization is the gates' job.
pub async fn identity_middleware(
    State(state): State<IdentityState>,
    mut req: Request,
    next: Next,
) -> Response {
    let principal = state.resolve(req.headers());
    req.extensions_mut().insert(principal);
    next.run(req).await
}

/// Load the request's permission snapshot once, at request entry.
pub async fn snapshot_middleware(
    State(loader): State<SnapshotLoader>,
    mut req: Request,
    next: Next,
) -> Response {
    let principal = principal_of(req.extensions());
    let permissions = Arc::new(RequestPermissions::new());
    permissions.load(&loader, &principal).await;

    req.extensions_mut().insert(RequestSnapshot::new(permissions));
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
