//! Admin endpoints: account provisioning, appointment oversight, dashboard.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::{self, NewDoctor, NewNurse, NewPharmacy};
use crate::api::error::ApiJson;
use crate::api::types::{
    message, success, ApiContext, ApiResult, AppointmentRef, DoctorRef, Message, TokenResponse,
};
use crate::appointment::{self, AdminDashboard, AppointmentOverview, Requester};
use crate::auth::Credentials;
use crate::db::repository;
use crate::models::enums::Role;
use crate::models::{Doctor, Nurse, Pharmacy, Transition};

/// `POST /api/admin/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    ApiJson(creds): ApiJson<Credentials>,
) -> ApiResult<TokenResponse> {
    super::login(&ctx, Role::Admin, &creds)
}

// ── Doctors ─────────────────────────────────────────────────

/// `POST /api/admin/add-doctor`
pub async fn add_doctor(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<NewDoctor>,
) -> ApiResult<Message> {
    let conn = ctx.core.open_db()?;
    accounts::register_doctor(&conn, ctx.core.bcrypt_cost, input)?;
    Ok(message("Doctor Added"))
}

#[derive(Serialize)]
pub struct DoctorsResponse {
    pub doctors: Vec<Doctor>,
}

/// `GET /api/admin/all-doctors`
pub async fn all_doctors(State(ctx): State<ApiContext>) -> ApiResult<DoctorsResponse> {
    let conn = ctx.core.open_db()?;
    let doctors = repository::list_doctors(&conn)?;
    Ok(success(DoctorsResponse { doctors }))
}

/// `POST /api/admin/change-availability`
pub async fn change_availability(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<DoctorRef>,
) -> ApiResult<Message> {
    let conn = ctx.core.open_db()?;
    repository::toggle_doctor_availability(&conn, &body.doc_id)?;
    Ok(message("Availability Changed"))
}

// ── Appointments ────────────────────────────────────────────

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<AppointmentOverview>,
}

/// `GET /api/admin/appointments`
pub async fn appointments(State(ctx): State<ApiContext>) -> ApiResult<AppointmentsResponse> {
    let conn = ctx.core.open_db()?;
    let appointments = appointment::list_appointment_overviews(&conn)?;
    Ok(success(AppointmentsResponse { appointments }))
}

/// `POST /api/admin/cancel-appointment`
pub async fn cancel_appointment(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<AppointmentRef>,
) -> ApiResult<Message> {
    let mut conn = ctx.core.open_db()?;
    let outcome =
        appointment::cancel_appointment(&mut conn, &body.appointment_id, Requester::Admin)?;
    Ok(message(cancel_message(outcome)))
}

pub(crate) fn cancel_message(outcome: Transition) -> &'static str {
    match outcome {
        Transition::Applied => "Appointment Cancelled",
        Transition::AlreadyInState => "Appointment already cancelled",
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub dash_data: AdminDashboard,
}

/// `GET /api/admin/dashboard`
pub async fn dashboard(State(ctx): State<ApiContext>) -> ApiResult<DashboardResponse> {
    let conn = ctx.core.open_db()?;
    let dash_data = appointment::admin_dashboard(&conn)?;
    Ok(success(DashboardResponse { dash_data }))
}

// ── Pharmacies ──────────────────────────────────────────────

/// `POST /api/admin/add-pharmacy`
pub async fn add_pharmacy(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<NewPharmacy>,
) -> ApiResult<Message> {
    let conn = ctx.core.open_db()?;
    accounts::register_pharmacy(&conn, ctx.core.bcrypt_cost, input)?;
    Ok(message("Pharmacy Added"))
}

#[derive(Serialize)]
pub struct PharmaciesResponse {
    pub pharmacies: Vec<Pharmacy>,
}

/// `GET /api/admin/all-pharmacies`
pub async fn all_pharmacies(State(ctx): State<ApiContext>) -> ApiResult<PharmaciesResponse> {
    let conn = ctx.core.open_db()?;
    let pharmacies = repository::list_pharmacies(&conn)?;
    Ok(success(PharmaciesResponse { pharmacies }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyRef {
    pub pharmacy_id: Uuid,
}

/// `POST /api/admin/change-pharmacy-availability`
pub async fn change_pharmacy_availability(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<PharmacyRef>,
) -> ApiResult<Message> {
    let conn = ctx.core.open_db()?;
    repository::toggle_pharmacy_availability(&conn, &body.pharmacy_id)?;
    Ok(message("Pharmacy Availability Changed"))
}

// ── Nurses ──────────────────────────────────────────────────

/// `POST /api/admin/add-nurse`
pub async fn add_nurse(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<NewNurse>,
) -> ApiResult<Message> {
    let conn = ctx.core.open_db()?;
    accounts::register_nurse(&conn, ctx.core.bcrypt_cost, input)?;
    Ok(message("Nurse Added"))
}

#[derive(Serialize)]
pub struct NursesResponse {
    pub nurses: Vec<Nurse>,
}

/// `GET /api/admin/all-nurses`
pub async fn all_nurses(State(ctx): State<ApiContext>) -> ApiResult<NursesResponse> {
    let conn = ctx.core.open_db()?;
    let nurses = repository::list_nurses(&conn)?;
    Ok(success(NursesResponse { nurses }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NurseRef {
    pub nurse_id: Uuid,
}

/// `POST /api/admin/change-nurse-availability`
pub async fn change_nurse_availability(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<NurseRef>,
) -> ApiResult<Message> {
    let conn = ctx.core.open_db()?;
    repository::toggle_nurse_availability(&conn, &body.nurse_id)?;
    Ok(message("Nurse Availability Changed"))
}
