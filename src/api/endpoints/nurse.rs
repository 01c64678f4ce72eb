//! Nurse endpoints: profile, dashboard and ward patient charts.
//!
//! Every `/patients/:id` route goes through the ward service, which rejects
//! patients assigned to another nurse.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::{self, NurseProfileUpdate};
use crate::api::error::{ApiError, ApiJson};
use crate::api::types::{
    message, success, ApiContext, ApiResult, Message, Success, TokenResponse,
};
use crate::auth::{AuthContext, Credentials};
use crate::db::repository;
use crate::models::enums::{Role, WardStatus};
use crate::models::{DoctorListing, Nurse, WardMedication, WardPatient};
use crate::ward::{
    self, LabReportInput, NewWardPatient, NurseDashboard, TaskInput, VitalsInput,
    WardPatientUpdate,
};

fn current(auth: &AuthContext) -> Result<&Nurse, ApiError> {
    auth.nurse().ok_or(ApiError::Unauthorized)
}

/// `POST /api/nurse/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    ApiJson(creds): ApiJson<Credentials>,
) -> ApiResult<TokenResponse> {
    super::login(&ctx, Role::Nurse, &creds)
}

// ── Profile ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProfileResponse {
    pub nurse: Nurse,
}

/// `GET /api/nurse/profile`
pub async fn profile(Extension(auth): Extension<AuthContext>) -> ApiResult<ProfileResponse> {
    let nurse = current(&auth)?.clone();
    Ok(success(ProfileResponse { nurse }))
}

#[derive(Serialize)]
pub struct ProfileUpdatedResponse {
    pub message: &'static str,
    pub nurse: Nurse,
}

/// `POST /api/nurse/update-profile`
pub async fn update_profile(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(update): ApiJson<NurseProfileUpdate>,
) -> ApiResult<ProfileUpdatedResponse> {
    let nurse = current(&auth)?.clone();
    let conn = ctx.core.open_db()?;
    let nurse = accounts::update_nurse_profile(&conn, nurse, update)?;
    Ok(success(ProfileUpdatedResponse {
        message: "Profile Updated Successfully",
        nurse,
    }))
}

/// `POST /api/nurse/change-availability`: toggles the caller's own flag.
pub async fn change_availability(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Message> {
    let nurse = current(&auth)?;
    let conn = ctx.core.open_db()?;
    repository::toggle_nurse_availability(&conn, &nurse.id)?;
    Ok(message("Availability Updated Successfully"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub dashboard_data: NurseDashboard,
}

/// `GET /api/nurse/dashboard`
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<DashboardResponse> {
    let nurse = current(&auth)?;
    let conn = ctx.core.open_db()?;
    let dashboard_data = ward::nurse_dashboard(&conn, &nurse.id)?;
    Ok(success(DashboardResponse { dashboard_data }))
}

#[derive(Serialize)]
pub struct DoctorsResponse {
    pub doctors: Vec<DoctorListing>,
}

/// `GET /api/nurse/doctors`: doctors a patient can be assigned to.
pub async fn doctors(State(ctx): State<ApiContext>) -> ApiResult<DoctorsResponse> {
    let conn = ctx.core.open_db()?;
    let doctors = repository::list_doctors(&conn)?
        .into_iter()
        .map(DoctorListing::from)
        .collect();
    Ok(success(DoctorsResponse { doctors }))
}

// ── Ward patients ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct PatientFilter {
    pub status: Option<WardStatus>,
}

#[derive(Serialize)]
pub struct PatientsResponse {
    pub patients: Vec<WardPatient>,
}

/// `GET /api/nurse/patients?status=`
pub async fn patients(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Query(filter): Query<PatientFilter>,
) -> ApiResult<PatientsResponse> {
    let nurse = current(&auth)?;
    let conn = ctx.core.open_db()?;
    let patients = repository::list_ward_patients_for_nurse(&conn, &nurse.id, filter.status)?;
    Ok(success(PatientsResponse { patients }))
}

#[derive(Serialize)]
pub struct PatientResponse {
    pub patient: WardPatient,
}

#[derive(Serialize)]
pub struct PatientChangedResponse {
    pub message: &'static str,
    pub patient: WardPatient,
}

fn changed(message: &'static str, patient: WardPatient) -> Json<Success<PatientChangedResponse>> {
    success(PatientChangedResponse { message, patient })
}

/// `POST /api/nurse/patients`
pub async fn add_patient(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(input): ApiJson<NewWardPatient>,
) -> ApiResult<PatientChangedResponse> {
    let nurse = current(&auth)?;
    let conn = ctx.core.open_db()?;
    let patient = ward::admit_patient(&conn, &nurse.id, input)?;
    Ok(changed("Patient added successfully", patient))
}

/// `GET /api/nurse/patients/:patient_id`
pub async fn patient_details(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(patient_id): Path<Uuid>,
) -> ApiResult<PatientResponse> {
    let nurse = current(&auth)?;
    let conn = ctx.core.open_db()?;
    let patient = ward::patient_for_nurse(&conn, &nurse.id, &patient_id)?;
    Ok(success(PatientResponse { patient }))
}

/// `PUT /api/nurse/patients/:patient_id`
pub async fn update_patient(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(patient_id): Path<Uuid>,
    ApiJson(update): ApiJson<WardPatientUpdate>,
) -> ApiResult<PatientChangedResponse> {
    let nurse = current(&auth)?;
    let mut conn = ctx.core.open_db()?;
    let patient = ward::update_patient(&mut conn, &nurse.id, &patient_id, update)?;
    Ok(changed("Patient updated successfully", patient))
}

/// `POST /api/nurse/patients/:patient_id/vitals`
pub async fn add_vitals(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(patient_id): Path<Uuid>,
    ApiJson(input): ApiJson<VitalsInput>,
) -> ApiResult<PatientChangedResponse> {
    let nurse = current(&auth)?;
    let mut conn = ctx.core.open_db()?;
    let patient = ward::record_vitals(&mut conn, &nurse.id, &patient_id, input)?;
    Ok(changed("Vital signs added successfully", patient))
}

/// `POST /api/nurse/patients/:patient_id/medications`
pub async fn add_medication(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(patient_id): Path<Uuid>,
    ApiJson(medication): ApiJson<WardMedication>,
) -> ApiResult<PatientChangedResponse> {
    let nurse = current(&auth)?;
    let mut conn = ctx.core.open_db()?;
    let patient = ward::add_medication(&mut conn, &nurse.id, &patient_id, medication)?;
    Ok(changed("Medication added successfully", patient))
}

/// `POST /api/nurse/patients/:patient_id/lab-reports`
pub async fn add_lab_report(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(patient_id): Path<Uuid>,
    ApiJson(input): ApiJson<LabReportInput>,
) -> ApiResult<PatientChangedResponse> {
    let nurse = current(&auth)?;
    let mut conn = ctx.core.open_db()?;
    let patient = ward::add_lab_report(&mut conn, &nurse.id, &patient_id, input)?;
    Ok(changed("Lab report added successfully", patient))
}

/// `POST /api/nurse/patients/:patient_id/lab-reports/:report_id/verify`
pub async fn verify_lab_report(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path((patient_id, report_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<PatientChangedResponse> {
    let nurse = current(&auth)?;
    let mut conn = ctx.core.open_db()?;
    let patient = ward::verify_lab_report(&mut conn, &nurse.id, &patient_id, &report_id)?;
    Ok(changed("Report verified successfully", patient))
}

#[derive(Deserialize)]
pub struct NoteBody {
    pub note: String,
}

/// `POST /api/nurse/patients/:patient_id/notes`
pub async fn add_note(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(patient_id): Path<Uuid>,
    ApiJson(body): ApiJson<NoteBody>,
) -> ApiResult<PatientChangedResponse> {
    let nurse = current(&auth)?;
    let mut conn = ctx.core.open_db()?;
    let patient = ward::add_note(&mut conn, &nurse.id, &patient_id, body.note)?;
    Ok(changed("Note added successfully", patient))
}

#[derive(Deserialize)]
pub struct RoundBody {
    #[serde(default)]
    pub notes: String,
}

/// `POST /api/nurse/patients/:patient_id/rounds`
pub async fn record_round(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(patient_id): Path<Uuid>,
    ApiJson(body): ApiJson<RoundBody>,
) -> ApiResult<PatientChangedResponse> {
    let nurse = current(&auth)?;
    let mut conn = ctx.core.open_db()?;
    let patient = ward::record_round(&mut conn, &nurse.id, &patient_id, body.notes)?;
    Ok(changed("Round visit recorded successfully", patient))
}

/// `POST /api/nurse/patients/:patient_id/tasks`
pub async fn add_task(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(patient_id): Path<Uuid>,
    ApiJson(input): ApiJson<TaskInput>,
) -> ApiResult<PatientChangedResponse> {
    let nurse = current(&auth)?;
    let mut conn = ctx.core.open_db()?;
    let patient = ward::add_task(&mut conn, &nurse.id, &patient_id, input)?;
    Ok(changed("Follow-up task added successfully", patient))
}

/// `POST /api/nurse/patients/:patient_id/tasks/:task_id/complete`
pub async fn complete_task(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path((patient_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<PatientChangedResponse> {
    let nurse = current(&auth)?;
    let mut conn = ctx.core.open_db()?;
    let patient = ward::complete_task(&mut conn, &nurse.id, &patient_id, &task_id)?;
    Ok(changed("Task marked as completed", patient))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignDoctorBody {
    pub doctor_id: Uuid,
}

/// `POST /api/nurse/patients/:patient_id/assign-doctor`
pub async fn assign_doctor(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(patient_id): Path<Uuid>,
    ApiJson(body): ApiJson<AssignDoctorBody>,
) -> ApiResult<PatientChangedResponse> {
    let nurse = current(&auth)?;
    let mut conn = ctx.core.open_db()?;
    let patient = ward::assign_doctor(&mut conn, &nurse.id, &patient_id, &body.doctor_id)?;
    Ok(changed("Doctor assigned successfully", patient))
}
