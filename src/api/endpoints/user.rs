//! Patient login. Patient accounts are created by the booking front end.

use axum::extract::State;

use crate::api::error::ApiJson;
use crate::api::types::{ApiContext, ApiResult, TokenResponse};
use crate::auth::Credentials;
use crate::models::enums::Role;

/// `POST /api/user/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    ApiJson(creds): ApiJson<Credentials>,
) -> ApiResult<TokenResponse> {
    super::login(&ctx, Role::Patient, &creds)
}
