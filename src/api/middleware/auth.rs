//! Bearer token authentication middleware.
//!
//! Every protected route group is wrapped with `require_role` for its
//! role. The gate resolves `Authorization: Bearer <token>` to a principal
//! and injects `AuthContext` into request extensions for downstream
//! handlers and the audit logger.

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth;
use crate::models::enums::Role;

/// Require a valid token issued for `role`.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_role(
    State(role): State<Role>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    match require_role_inner(role, req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_role_inner(
    role: Role,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let auth_ctx = {
        let conn = ctx.core.open_db()?;
        auth::authenticate(&conn, ctx.core.tokens(), ctx.core.admin(), role, header).map_err(
            |err| {
                tracing::debug!(role = %role, error = %err, "Request rejected by role gate");
                err
            },
        )?
    };

    req.extensions_mut().insert(auth_ctx);
    Ok(next.run(req).await)
}
