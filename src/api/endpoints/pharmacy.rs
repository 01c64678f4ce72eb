//! Pharmacy endpoints: profile, open prescriptions, dispensing updates.

use axum::extract::State;
use axum::Extension;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::{self, PharmacyProfileUpdate};
use crate::api::error::{ApiError, ApiJson};
use crate::api::types::{message, success, ApiContext, ApiResult, Message, TokenResponse};
use crate::auth::{AuthContext, Credentials};
use crate::dispensing::{self, MedicineHistoryEntry, PharmacyDashboard, PrescriptionView};
use crate::models::enums::{DispensingStatus, Role};
use crate::models::Pharmacy;

fn current(auth: &AuthContext) -> Result<&Pharmacy, ApiError> {
    auth.pharmacy().ok_or(ApiError::Unauthorized)
}

/// `POST /api/pharmacy/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    ApiJson(creds): ApiJson<Credentials>,
) -> ApiResult<TokenResponse> {
    super::login(&ctx, Role::Pharmacy, &creds)
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub pharmacy: Pharmacy,
}

/// `GET /api/pharmacy/profile`
pub async fn profile(Extension(auth): Extension<AuthContext>) -> ApiResult<ProfileResponse> {
    let pharmacy = current(&auth)?.clone();
    Ok(success(ProfileResponse { pharmacy }))
}

/// `POST /api/pharmacy/update-profile`
pub async fn update_profile(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(update): ApiJson<PharmacyProfileUpdate>,
) -> ApiResult<Message> {
    let pharmacy = current(&auth)?;
    let conn = ctx.core.open_db()?;
    accounts::update_pharmacy_profile(&conn, &pharmacy.id, &update)?;
    Ok(message("Profile Updated Successfully"))
}

#[derive(Serialize)]
pub struct PrescriptionsResponse {
    pub prescriptions: Vec<PrescriptionView>,
}

/// `GET /api/pharmacy/prescriptions`: everything not yet dispensed.
pub async fn prescriptions(State(ctx): State<ApiContext>) -> ApiResult<PrescriptionsResponse> {
    let conn = ctx.core.open_db()?;
    let prescriptions = dispensing::open_prescriptions(&conn)?;
    Ok(success(PrescriptionsResponse { prescriptions }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub prescription_id: Uuid,
    pub status: DispensingStatus,
}

/// `POST /api/pharmacy/update-prescription` and `POST /api/pharmacy/update-dispensing`
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> ApiResult<Message> {
    let pharmacy = current(&auth)?;
    let mut conn = ctx.core.open_db()?;
    dispensing::update_prescription_status(
        &mut conn,
        &body.prescription_id,
        &pharmacy.id,
        body.status,
    )?;
    Ok(message("Prescription status updated"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub dashboard_data: PharmacyDashboard,
}

/// `GET /api/pharmacy/dashboard`
pub async fn dashboard(State(ctx): State<ApiContext>) -> ApiResult<DashboardResponse> {
    let conn = ctx.core.open_db()?;
    let dashboard_data = dispensing::pharmacy_dashboard(&conn)?;
    Ok(success(DashboardResponse { dashboard_data }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub medicine_history: Vec<MedicineHistoryEntry>,
}

/// `GET /api/pharmacy/patient-history`
pub async fn patient_history(State(ctx): State<ApiContext>) -> ApiResult<HistoryResponse> {
    let conn = ctx.core.open_db()?;
    let medicine_history = dispensing::patient_medicine_history(&conn)?;
    Ok(success(HistoryResponse { medicine_history }))
}
