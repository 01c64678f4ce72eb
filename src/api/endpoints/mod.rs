//! API endpoint handlers.
//!
//! One module per route group. Handlers open a connection per request and
//! delegate to the service modules.

pub mod admin;
pub mod doctor;
pub mod health;
pub mod notifications;
pub mod nurse;
pub mod pharmacy;
pub mod user;

use crate::api::types::{success, ApiContext, ApiResult, TokenResponse};
use crate::auth::{self, Credentials};
use crate::models::enums::Role;

/// Shared body of every `POST .../login` route.
pub(crate) fn login(ctx: &ApiContext, role: Role, creds: &Credentials) -> ApiResult<TokenResponse> {
    let conn = ctx.core.open_db()?;
    let token = auth::issue_token(&conn, ctx.core.tokens(), ctx.core.admin(), role, creds)?;
    Ok(success(TokenResponse { token }))
}
