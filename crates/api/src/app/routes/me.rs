use std::sync::Arc;

use axum::{Json, extract::Extension};

use crate::app::{dto::SnapshotResponse, services::AppServices};
use crate::context::RequestSnapshot;

/// The caller's own permission set, as loaded at request entry.
///
/// Anonymous callers get an empty set rather than an error.
pub async fn permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(snapshot): Extension<RequestSnapshot>,
) -> Json<SnapshotResponse> {
    let snapshot = snapshot.snapshot();
    Json(SnapshotResponse::from_snapshot(&snapshot, &services.catalog))
}
