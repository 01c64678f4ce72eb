//! Shared types for the API layer.

use std::sync::Arc;

use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core_state::CoreState;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

// Request bodies shared by several route groups.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRef {
    pub appointment_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRef {
    pub doc_id: Uuid,
}

// Response envelopes.

/// Success body: `{ "success": true, ...payload }`.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

pub fn success<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        data,
    })
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

pub fn message(message: &'static str) -> Json<Success<Message>> {
    success(Message { message })
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Handler return type for success-envelope routes.
pub type ApiResult<T> = Result<Json<Success<T>>, crate::api::error::ApiError>;
