//! Audit logging middleware.
//!
//! Records every authenticated request with role, principal, method, path
//! and response status. Runs innermost (after auth has injected `AuthContext`).

use axum::extract::OriginalUri;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::ApiContext;
use crate::auth::AuthContext;
use crate::db::repository;

/// Write one audit row per request.
/// Accesses `ApiContext` and `AuthContext` from request extensions.
pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    // Nested routers see a stripped path; the original keeps the group prefix.
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let ctx = req.extensions().get::<ApiContext>().cloned();
    let caller = req
        .extensions()
        .get::<AuthContext>()
        .map(|a| (a.principal.role(), a.principal.audit_label()));

    let response = next.run(req).await;

    if let (Some(ctx), Some((role, principal))) = (ctx, caller) {
        let status = response.status().as_u16();
        let action = format!("{method} {path}");
        let written = ctx
            .core
            .open_db()
            .map_err(|e| e.to_string())
            .and_then(|conn| {
                repository::insert_audit_entry(&conn, role.as_str(), &principal, &action, status)
                    .map_err(|e| e.to_string())
            });
        if let Err(err) = written {
            tracing::warn!(error = %err, action = %action, "Failed to write audit entry");
        }
    }

    response
}
