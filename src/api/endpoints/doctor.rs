//! Doctor endpoints: public listing, own appointments, diagnoses, calendar.

use axum::extract::State;
use axum::Extension;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::{self, DoctorProfileUpdate};
use crate::api::error::{ApiError, ApiJson};
use crate::api::types::{
    message, success, ApiContext, ApiResult, AppointmentRef, Message, TokenResponse,
};
use crate::appointment::{self, DoctorDashboard, Requester};
use crate::auth::{AuthContext, Credentials};
use crate::calendar::{self, CalendarEvent};
use crate::db::repository;
use crate::models::enums::Role;
use crate::models::{Appointment, Diagnosis, DiagnosisDraft, Doctor, DoctorListing, Transition};

fn current(auth: &AuthContext) -> Result<&Doctor, ApiError> {
    auth.doctor().ok_or(ApiError::Unauthorized)
}

#[derive(Serialize)]
pub struct ListingResponse {
    pub doctors: Vec<DoctorListing>,
}

/// `GET /api/doctor/list`: public, no credentials or emails.
pub async fn list(State(ctx): State<ApiContext>) -> ApiResult<ListingResponse> {
    let conn = ctx.core.open_db()?;
    let doctors = repository::list_doctors(&conn)?
        .into_iter()
        .map(DoctorListing::from)
        .collect();
    Ok(success(ListingResponse { doctors }))
}

/// `POST /api/doctor/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    ApiJson(creds): ApiJson<Credentials>,
) -> ApiResult<TokenResponse> {
    super::login(&ctx, Role::Doctor, &creds)
}

// ── Appointments ────────────────────────────────────────────

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<Appointment>,
}

/// `GET /api/doctor/appointments`
pub async fn appointments(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<AppointmentsResponse> {
    let doctor = current(&auth)?;
    let conn = ctx.core.open_db()?;
    let appointments = repository::list_appointments_for_doctor(&conn, &doctor.id)?;
    Ok(success(AppointmentsResponse { appointments }))
}

/// `POST /api/doctor/complete-appointment`
pub async fn complete_appointment(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(body): ApiJson<AppointmentRef>,
) -> ApiResult<Message> {
    let doctor = current(&auth)?;
    let mut conn = ctx.core.open_db()?;
    let outcome = appointment::complete_appointment(&mut conn, &body.appointment_id, &doctor.id)?;
    Ok(message(match outcome {
        Transition::Applied => "Appointment Completed",
        Transition::AlreadyInState => "Appointment already completed",
    }))
}

/// `POST /api/doctor/cancel-appointment`
pub async fn cancel_appointment(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(body): ApiJson<AppointmentRef>,
) -> ApiResult<Message> {
    let doctor = current(&auth)?;
    let mut conn = ctx.core.open_db()?;
    let outcome = appointment::cancel_appointment(
        &mut conn,
        &body.appointment_id,
        Requester::Doctor(doctor.id),
    )?;
    Ok(message(super::admin::cancel_message(outcome)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub dash_data: DoctorDashboard,
}

/// `GET /api/doctor/dashboard`
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<DashboardResponse> {
    let doctor = current(&auth)?;
    let conn = ctx.core.open_db()?;
    let dash_data = appointment::doctor_dashboard(&conn, &doctor.id)?;
    Ok(success(DashboardResponse { dash_data }))
}

// ── Profile ─────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub profile_data: Doctor,
}

/// `GET /api/doctor/profile`
pub async fn profile(Extension(auth): Extension<AuthContext>) -> ApiResult<ProfileResponse> {
    let profile_data = current(&auth)?.clone();
    Ok(success(ProfileResponse { profile_data }))
}

/// `POST /api/doctor/update-profile`
pub async fn update_profile(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(update): ApiJson<DoctorProfileUpdate>,
) -> ApiResult<Message> {
    let doctor = current(&auth)?;
    let conn = ctx.core.open_db()?;
    accounts::update_doctor_profile(&conn, &doctor.id, &update)?;
    Ok(message("Profile Updated"))
}

// ── Diagnoses ───────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiagnosisRequest {
    pub appointment_id: Uuid,
    #[serde(flatten)]
    pub draft: DiagnosisDraft,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiagnosisResponse {
    pub message: &'static str,
    pub diagnosis_id: Uuid,
}

/// `POST /api/doctor/create-diagnosis`
pub async fn create_diagnosis(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(body): ApiJson<CreateDiagnosisRequest>,
) -> ApiResult<CreateDiagnosisResponse> {
    let doctor = current(&auth)?;
    let mut conn = ctx.core.open_db()?;
    let diagnosis_id =
        appointment::create_diagnosis(&mut conn, &body.appointment_id, &doctor.id, body.draft)?;
    Ok(success(CreateDiagnosisResponse {
        message: "Diagnosis saved successfully",
        diagnosis_id,
    }))
}

#[derive(Serialize)]
pub struct DiagnosisResponse {
    pub diagnosis: Diagnosis,
}

/// `POST /api/doctor/get-diagnosis`
pub async fn get_diagnosis(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(body): ApiJson<AppointmentRef>,
) -> ApiResult<DiagnosisResponse> {
    let doctor = current(&auth)?;
    let conn = ctx.core.open_db()?;
    let diagnosis = appointment::diagnosis_for_appointment(&conn, &body.appointment_id, &doctor.id)?
        .ok_or_else(|| ApiError::NotFound("Diagnosis not found".into()))?;
    Ok(success(DiagnosisResponse { diagnosis }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRef {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub diagnoses: Vec<Diagnosis>,
}

/// `POST /api/doctor/diagnosis-history`: diagnoses of one of the caller's
/// patients, newest first.
pub async fn diagnosis_history(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(body): ApiJson<PatientRef>,
) -> ApiResult<HistoryResponse> {
    let doctor = current(&auth)?;
    let conn = ctx.core.open_db()?;
    let diagnoses = appointment::diagnosis_history(&conn, &doctor.id, &body.user_id)?;
    Ok(success(HistoryResponse { diagnoses }))
}

// ── Calendar ────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarResponse {
    pub calendar_events: Vec<CalendarEvent>,
}

/// `POST /api/doctor/calendar-events`
pub async fn calendar_events(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<CalendarResponse> {
    let doctor = current(&auth)?;
    let conn = ctx.core.open_db()?;
    let appointments = repository::list_appointments_for_doctor(&conn, &doctor.id)?;
    let calendar_events = calendar::calendar_events(&appointments, doctor.utc_offset_minutes);
    Ok(success(CalendarResponse { calendar_events }))
}
