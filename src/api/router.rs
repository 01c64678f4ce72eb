//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Route groups are nested under `/api/<role>`.
//!
//! Layer stack (outermost → innermost):
//! 1. CORS → 2. `Extension(ApiContext)` → 3. Role gate → 4. Audit logger

use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::cors::CorsLayer;

use crate::api::endpoints::{admin, doctor, health, notifications, nurse, pharmacy, user};
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;
use crate::models::enums::Role;

/// Build the API router over shared state.
///
/// Middleware uses `Extension<ApiContext>` (injected as an outer layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

/// Routes reachable with a token of `role` only. Gate and audit are route
/// layers so unknown paths still fall through to 404.
fn protected(ctx: &ApiContext, role: Role, routes: Router<ApiContext>) -> Router {
    routes
        .with_state(ctx.clone())
        .route_layer(from_fn(middleware::audit::log_access))
        .route_layer(from_fn_with_state(role, middleware::auth::require_role))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let admin_routes = Router::new()
        .route("/login", post(admin::login))
        .with_state(ctx.clone())
        .merge(protected(
            &ctx,
            Role::Admin,
            Router::new()
                .route("/add-doctor", post(admin::add_doctor))
                // The admin panel posts this one.
                .route("/all-doctors", get(admin::all_doctors).post(admin::all_doctors))
                .route("/change-availability", post(admin::change_availability))
                .route("/appointments", get(admin::appointments))
                .route("/cancel-appointment", post(admin::cancel_appointment))
                .route("/dashboard", get(admin::dashboard))
                .route("/add-pharmacy", post(admin::add_pharmacy))
                .route("/all-pharmacies", get(admin::all_pharmacies))
                .route(
                    "/change-pharmacy-availability",
                    post(admin::change_pharmacy_availability),
                )
                .route("/add-nurse", post(admin::add_nurse))
                .route("/all-nurses", get(admin::all_nurses))
                .route(
                    "/change-nurse-availability",
                    post(admin::change_nurse_availability),
                ),
        ));

    let doctor_routes = Router::new()
        .route("/list", get(doctor::list))
        .route("/login", post(doctor::login))
        .with_state(ctx.clone())
        .merge(protected(
            &ctx,
            Role::Doctor,
            Router::new()
                .route("/appointments", get(doctor::appointments))
                .route("/complete-appointment", post(doctor::complete_appointment))
                .route("/cancel-appointment", post(doctor::cancel_appointment))
                .route("/dashboard", get(doctor::dashboard))
                .route("/profile", get(doctor::profile))
                .route("/update-profile", post(doctor::update_profile))
                .route("/create-diagnosis", post(doctor::create_diagnosis))
                .route("/get-diagnosis", post(doctor::get_diagnosis))
                .route("/diagnosis-history", post(doctor::diagnosis_history))
                .route(
                    "/calendar-events",
                    get(doctor::calendar_events).post(doctor::calendar_events),
                ),
        ));

    let pharmacy_routes = Router::new()
        .route("/login", post(pharmacy::login))
        .with_state(ctx.clone())
        .merge(protected(
            &ctx,
            Role::Pharmacy,
            Router::new()
                .route("/profile", get(pharmacy::profile))
                .route("/update-profile", post(pharmacy::update_profile))
                .route("/prescriptions", get(pharmacy::prescriptions))
                .route("/update-prescription", post(pharmacy::update_status))
                .route("/update-dispensing", post(pharmacy::update_status))
                .route("/dashboard", get(pharmacy::dashboard))
                .route("/patient-history", get(pharmacy::patient_history)),
        ));

    let nurse_routes = Router::new()
        .route("/login", post(nurse::login))
        .with_state(ctx.clone())
        .merge(protected(
            &ctx,
            Role::Nurse,
            Router::new()
                .route("/profile", get(nurse::profile))
                .route("/update-profile", post(nurse::update_profile))
                .route("/change-availability", post(nurse::change_availability))
                .route("/dashboard", get(nurse::dashboard))
                .route("/doctors", get(nurse::doctors))
                .route("/patients", get(nurse::patients).post(nurse::add_patient))
                .route(
                    "/patients/:patient_id",
                    get(nurse::patient_details).put(nurse::update_patient),
                )
                .route("/patients/:patient_id/vitals", post(nurse::add_vitals))
                .route("/patients/:patient_id/medications", post(nurse::add_medication))
                .route("/patients/:patient_id/lab-reports", post(nurse::add_lab_report))
                .route(
                    "/patients/:patient_id/lab-reports/:report_id/verify",
                    post(nurse::verify_lab_report),
                )
                .route("/patients/:patient_id/notes", post(nurse::add_note))
                .route("/patients/:patient_id/rounds", post(nurse::record_round))
                .route("/patients/:patient_id/tasks", post(nurse::add_task))
                .route(
                    "/patients/:patient_id/tasks/:task_id/complete",
                    post(nurse::complete_task),
                )
                .route(
                    "/patients/:patient_id/assign-doctor",
                    post(nurse::assign_doctor),
                ),
        ));

    let notification_routes = protected(
        &ctx,
        Role::Patient,
        Router::new()
            .route("/", get(notifications::list))
            .route("/mark-read", post(notifications::mark_read)),
    );

    let misc_routes = Router::new()
        .route("/health", get(health::check))
        .route("/user/login", post(user::login))
        .with_state(ctx.clone());

    Router::new()
        .nest("/api/admin", admin_routes)
        .nest("/api/doctor", doctor_routes)
        .nest("/api/pharmacy", pharmacy_routes)
        .nest("/api/nurse", nurse_routes)
        .nest("/api/notifications", notification_routes)
        .nest("/api", misc_routes)
        // Extension must wrap the role gate so middleware can extract ApiContext
        .layer(Extension(ctx))
        .layer(CorsLayer::permissive())
}
