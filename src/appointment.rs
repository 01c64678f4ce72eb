//! Appointment lifecycle: cancel, complete, attach a diagnosis.
//!
//! Each mutation loads the appointment, checks who is asking, applies the
//! state-machine transition on the model and writes every affected row in a
//! single immediate transaction. The slot ledger only changes on cancel.

use std::collections::HashSet;

use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::enums::{DispensingStatus, NotificationType, PaymentStatus};
use crate::models::*;

/// How many recent appointments the dashboards show.
const LATEST_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,
    #[error("Appointment belongs to another account")]
    Forbidden,
    #[error("Patient has no appointment with this doctor")]
    NotAPatient,
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("{0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for AppointmentError {
    fn from(err: rusqlite::Error) -> Self {
        AppointmentError::Database(err.into())
    }
}

/// Diagnosis attachment shares the appointment failure modes.
pub type DiagnosisError = AppointmentError;

/// Who is acting on an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    /// Bypasses ownership.
    Admin,
    Doctor(Uuid),
    Patient(Uuid),
}

impl Requester {
    fn may_act_on(&self, appt: &Appointment) -> bool {
        match self {
            Requester::Admin => true,
            Requester::Doctor(id) => appt.doc_id == *id,
            Requester::Patient(id) => appt.user_id == *id,
        }
    }
}

fn load_for(
    conn: &Connection,
    appointment_id: &Uuid,
    requester: Requester,
) -> Result<Appointment, AppointmentError> {
    let appt =
        repository::get_appointment(conn, appointment_id)?.ok_or(AppointmentError::NotFound)?;
    if !requester.may_act_on(&appt) {
        return Err(AppointmentError::Forbidden);
    }
    Ok(appt)
}

/// Cancel an appointment and free its slot. Cancelling twice is a no-op.
pub fn cancel_appointment(
    conn: &mut Connection,
    appointment_id: &Uuid,
    requester: Requester,
) -> Result<Transition, AppointmentError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut appt = load_for(&tx, appointment_id, requester)?;

    let outcome = appt.cancel()?;
    if outcome == Transition::Applied {
        repository::save_appointment_state(&tx, &appt)?;
        let mut ledger = repository::get_slot_ledger(&tx, &appt.doc_id)?;
        if !ledger.release(&appt.slot_date, &appt.slot_time) {
            tracing::warn!(
                appointment_id = %appt.id,
                doctor_id = %appt.doc_id,
                slot_date = %appt.slot_date,
                slot_time = %appt.slot_time,
                "Cancelled slot was not in the ledger"
            );
        }
        repository::save_slot_ledger(&tx, &appt.doc_id, &ledger)?;
    }
    tx.commit()?;

    tracing::info!(appointment_id = %appointment_id, ?requester, ?outcome, "Appointment cancelled");
    Ok(outcome)
}

/// Mark an appointment completed. The slot stays booked.
pub fn complete_appointment(
    conn: &mut Connection,
    appointment_id: &Uuid,
    doctor_id: &Uuid,
) -> Result<Transition, AppointmentError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut appt = load_for(&tx, appointment_id, Requester::Doctor(*doctor_id))?;

    let outcome = appt.complete()?;
    if outcome == Transition::Applied {
        repository::save_appointment_state(&tx, &appt)?;
    }
    tx.commit()?;

    tracing::info!(
        appointment_id = %appointment_id,
        doctor_id = %doctor_id,
        ?outcome,
        "Appointment completed"
    );
    Ok(outcome)
}

/// Record a diagnosis, complete the appointment and notify the patient.
pub fn create_diagnosis(
    conn: &mut Connection,
    appointment_id: &Uuid,
    doctor_id: &Uuid,
    draft: DiagnosisDraft,
) -> Result<Uuid, DiagnosisError> {
    if draft.diagnosis.trim().is_empty() || draft.prescription.trim().is_empty() {
        return Err(AppointmentError::Validation(
            "diagnosis and prescription are required".into(),
        ));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut appt = load_for(&tx, appointment_id, Requester::Doctor(*doctor_id))?;

    let diagnosis = Diagnosis {
        id: Uuid::new_v4(),
        appointment_id: appt.id,
        doc_id: appt.doc_id,
        user_id: appt.user_id,
        diagnosis: draft.diagnosis,
        prescription: draft.prescription,
        medicines: draft.medicines,
        tests: draft.tests,
        dispensing_status: DispensingStatus::Pending,
        follow_up_date: draft.follow_up_date,
        date: Utc::now(),
        medicine_history: MedicineHistory::default(),
    };

    appt.complete_with_diagnosis(diagnosis.id)?;
    repository::insert_diagnosis(&tx, &diagnosis)?;
    repository::save_appointment_state(&tx, &appt)?;
    repository::insert_notification(
        &tx,
        &Notification::new(
            appt.user_id,
            format!("Diagnosis for your appointment on {} is ready.", appt.slot_date),
            NotificationType::Diagnosis,
        ),
    )?;
    tx.commit()?;

    tracing::info!(
        appointment_id = %appointment_id,
        doctor_id = %doctor_id,
        diagnosis_id = %diagnosis.id,
        "Diagnosis created"
    );
    Ok(diagnosis.id)
}

/// The diagnosis attached to one of the doctor's appointments, if any.
pub fn diagnosis_for_appointment(
    conn: &Connection,
    appointment_id: &Uuid,
    doctor_id: &Uuid,
) -> Result<Option<Diagnosis>, AppointmentError> {
    let appt = load_for(conn, appointment_id, Requester::Doctor(*doctor_id))?;
    Ok(repository::get_diagnosis_by_appointment(conn, &appt.id)?)
}

/// A patient's diagnoses, newest first. Only doctors the patient has booked
/// with may read them.
pub fn diagnosis_history(
    conn: &Connection,
    doctor_id: &Uuid,
    user_id: &Uuid,
) -> Result<Vec<Diagnosis>, AppointmentError> {
    if !repository::doctor_has_patient(conn, doctor_id, user_id)? {
        return Err(AppointmentError::NotAPatient);
    }
    Ok(repository::list_diagnoses_for_user(conn, user_id)?)
}

// ── Listings and dashboards ─────────────────────────────────

/// An appointment with the dispensing state of its diagnosis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentOverview {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub diagnosis_status: DispensingStatus,
    pub medicines: Vec<Medicine>,
}

pub fn list_appointment_overviews(
    conn: &Connection,
) -> Result<Vec<AppointmentOverview>, DatabaseError> {
    repository::list_appointments(conn)?
        .into_iter()
        .map(|appointment| {
            let diagnosis = match appointment.diagnosis_id {
                Some(id) => repository::get_diagnosis(conn, &id)?,
                None => None,
            };
            let (diagnosis_status, medicines) = diagnosis
                .map(|d| (d.dispensing_status, d.medicines))
                .unwrap_or_default();
            Ok(AppointmentOverview {
                appointment,
                diagnosis_status,
                medicines,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub doctors: i64,
    pub appointments: i64,
    pub patients: i64,
    pub latest_appointments: Vec<Appointment>,
}

pub fn admin_dashboard(conn: &Connection) -> Result<AdminDashboard, DatabaseError> {
    let mut latest = repository::list_appointments(conn)?;
    latest.truncate(LATEST_LIMIT);
    Ok(AdminDashboard {
        doctors: repository::count_doctors(conn)?,
        appointments: repository::count_appointments(conn)?,
        patients: repository::count_users(conn)?,
        latest_appointments: latest,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDashboard {
    pub earnings: i64,
    pub appointments: usize,
    pub patients: usize,
    pub latest_appointments: Vec<Appointment>,
}

pub fn doctor_dashboard(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<DoctorDashboard, DatabaseError> {
    let mut appointments = repository::list_appointments_for_doctor(conn, doctor_id)?;
    let earnings = appointments
        .iter()
        .filter(|a| a.is_completed || a.payment_status == PaymentStatus::Completed)
        .map(|a| a.amount)
        .sum();
    let patients = appointments.iter().map(|a| a.user_id).collect::<HashSet<_>>().len();
    let count = appointments.len();
    appointments.truncate(LATEST_LIMIT);
    Ok(DoctorDashboard {
        earnings,
        appointments: count,
        patients,
        latest_appointments: appointments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::fixtures;

    struct World {
        conn: Connection,
        doc: Doctor,
        user: User,
        appt: Appointment,
    }

    fn world() -> World {
        let conn = open_memory_database().unwrap();
        let doc = fixtures::doctor(&conn, "grey@example.com");
        let user = fixtures::user(&conn, "ada@example.com");
        let appt = fixtures::booking(&conn, &doc, &user, "12_6_2025", "10:30 AM");
        World { conn, doc, user, appt }
    }

    fn draft() -> DiagnosisDraft {
        DiagnosisDraft {
            diagnosis: "Migraine".into(),
            prescription: "Ibuprofen as needed".into(),
            medicines: vec![Medicine {
                name: "Ibuprofen".into(),
                dosage: "400mg".into(),
                duration: "3 days".into(),
                timing: "with food".into(),
            }],
            ..Default::default()
        }
    }

    fn reload(w: &World) -> Appointment {
        repository::get_appointment(&w.conn, &w.appt.id).unwrap().unwrap()
    }

    #[test]
    fn cancel_frees_the_slot() {
        let mut w = world();
        let outcome =
            cancel_appointment(&mut w.conn, &w.appt.id, Requester::Doctor(w.doc.id)).unwrap();
        assert_eq!(outcome, Transition::Applied);
        assert!(reload(&w).cancelled);
        let ledger = repository::get_slot_ledger(&w.conn, &w.doc.id).unwrap();
        assert!(!ledger.is_booked("12_6_2025", "10:30 AM"));
        assert!(ledger.is_empty());
    }

    #[test]
    fn cancel_keeps_other_slots_on_the_date() {
        let mut w = world();
        fixtures::booking(&w.conn, &w.doc, &w.user, "12_6_2025", "11:00 AM");
        cancel_appointment(&mut w.conn, &w.appt.id, Requester::Admin).unwrap();
        let ledger = repository::get_slot_ledger(&w.conn, &w.doc.id).unwrap();
        assert_eq!(ledger.times("12_6_2025"), ["11:00 AM"]);
    }

    #[test]
    fn double_cancel_is_a_noop() {
        let mut w = world();
        cancel_appointment(&mut w.conn, &w.appt.id, Requester::Admin).unwrap();
        // Someone else books the freed slot; a second cancel must not release it.
        fixtures::booking(&w.conn, &w.doc, &w.user, "12_6_2025", "10:30 AM");
        let outcome = cancel_appointment(&mut w.conn, &w.appt.id, Requester::Admin).unwrap();
        assert_eq!(outcome, Transition::AlreadyInState);
        let ledger = repository::get_slot_ledger(&w.conn, &w.doc.id).unwrap();
        assert!(ledger.is_booked("12_6_2025", "10:30 AM"));
    }

    #[test]
    fn other_doctor_cannot_cancel() {
        let mut w = world();
        let other = fixtures::doctor(&w.conn, "house@example.com");
        let err =
            cancel_appointment(&mut w.conn, &w.appt.id, Requester::Doctor(other.id)).unwrap_err();
        assert!(matches!(err, AppointmentError::Forbidden));
        assert!(!reload(&w).cancelled);
        let ledger = repository::get_slot_ledger(&w.conn, &w.doc.id).unwrap();
        assert!(ledger.is_booked("12_6_2025", "10:30 AM"));
    }

    #[test]
    fn patient_may_cancel_own_booking_only() {
        let mut w = world();
        let stranger = fixtures::user(&w.conn, "bob@example.com");
        assert!(matches!(
            cancel_appointment(&mut w.conn, &w.appt.id, Requester::Patient(stranger.id)),
            Err(AppointmentError::Forbidden)
        ));
        cancel_appointment(&mut w.conn, &w.appt.id, Requester::Patient(w.user.id)).unwrap();
    }

    #[test]
    fn missing_appointment_not_found() {
        let mut w = world();
        let err = cancel_appointment(&mut w.conn, &Uuid::new_v4(), Requester::Admin).unwrap_err();
        assert!(matches!(err, AppointmentError::NotFound));
    }

    #[test]
    fn completed_cannot_be_cancelled() {
        let mut w = world();
        complete_appointment(&mut w.conn, &w.appt.id, &w.doc.id).unwrap();
        let err = cancel_appointment(&mut w.conn, &w.appt.id, Requester::Admin).unwrap_err();
        assert!(matches!(err, AppointmentError::InvalidTransition(_)));
        let stored = reload(&w);
        assert!(stored.is_completed && !stored.cancelled);
    }

    #[test]
    fn complete_leaves_ledger_and_is_idempotent() {
        let mut w = world();
        assert_eq!(
            complete_appointment(&mut w.conn, &w.appt.id, &w.doc.id).unwrap(),
            Transition::Applied
        );
        assert_eq!(
            complete_appointment(&mut w.conn, &w.appt.id, &w.doc.id).unwrap(),
            Transition::AlreadyInState
        );
        let ledger = repository::get_slot_ledger(&w.conn, &w.doc.id).unwrap();
        assert!(ledger.is_booked("12_6_2025", "10:30 AM"));
    }

    #[test]
    fn cancelled_cannot_be_completed() {
        let mut w = world();
        cancel_appointment(&mut w.conn, &w.appt.id, Requester::Admin).unwrap();
        let err = complete_appointment(&mut w.conn, &w.appt.id, &w.doc.id).unwrap_err();
        assert!(matches!(err, AppointmentError::InvalidTransition(_)));
    }

    #[test]
    fn diagnosis_completes_and_notifies() {
        let mut w = world();
        let id = create_diagnosis(&mut w.conn, &w.appt.id, &w.doc.id, draft()).unwrap();

        let stored = reload(&w);
        assert!(stored.is_completed && stored.diagnosis_created);
        assert_eq!(stored.diagnosis_id, Some(id));

        let diag = repository::get_diagnosis(&w.conn, &id).unwrap().unwrap();
        assert_eq!(diag.dispensing_status, DispensingStatus::Pending);
        assert_eq!(diag.user_id, w.user.id);

        let inbox = repository::list_notifications_for_user(&w.conn, &w.user.id).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationType::Diagnosis);
        assert_eq!(inbox[0].message, "Diagnosis for your appointment on 12_6_2025 is ready.");
    }

    #[test]
    fn diagnosis_for_missing_appointment_writes_nothing() {
        let mut w = world();
        let err = create_diagnosis(&mut w.conn, &Uuid::new_v4(), &w.doc.id, draft()).unwrap_err();
        assert!(matches!(err, AppointmentError::NotFound));
        assert!(repository::list_diagnoses(&w.conn, false).unwrap().is_empty());
        assert!(repository::list_notifications_for_user(&w.conn, &w.user.id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn diagnosis_history_limited_to_own_patients() {
        let mut w = world();
        create_diagnosis(&mut w.conn, &w.appt.id, &w.doc.id, draft()).unwrap();

        let history = diagnosis_history(&w.conn, &w.doc.id, &w.user.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].diagnosis, "Migraine");

        let stranger = fixtures::doctor(&w.conn, "house@example.com");
        assert!(matches!(
            diagnosis_history(&w.conn, &stranger.id, &w.user.id),
            Err(AppointmentError::NotAPatient)
        ));
    }

    #[test]
    fn second_diagnosis_rejected() {
        let mut w = world();
        create_diagnosis(&mut w.conn, &w.appt.id, &w.doc.id, draft()).unwrap();
        let err = create_diagnosis(&mut w.conn, &w.appt.id, &w.doc.id, draft()).unwrap_err();
        assert!(matches!(err, AppointmentError::InvalidTransition(_)));
        assert_eq!(repository::list_diagnoses(&w.conn, false).unwrap().len(), 1);
    }

    #[test]
    fn diagnosis_requires_text() {
        let mut w = world();
        let mut empty = draft();
        empty.prescription = "  ".into();
        assert!(matches!(
            create_diagnosis(&mut w.conn, &w.appt.id, &w.doc.id, empty),
            Err(AppointmentError::Validation(_))
        ));
    }

    #[test]
    fn diagnosis_rejected_for_cancelled_or_foreign() {
        let mut w = world();
        let other = fixtures::doctor(&w.conn, "house@example.com");
        assert!(matches!(
            create_diagnosis(&mut w.conn, &w.appt.id, &other.id, draft()),
            Err(AppointmentError::Forbidden)
        ));
        cancel_appointment(&mut w.conn, &w.appt.id, Requester::Admin).unwrap();
        assert!(matches!(
            create_diagnosis(&mut w.conn, &w.appt.id, &w.doc.id, draft()),
            Err(AppointmentError::InvalidTransition(_))
        ));
    }

    #[test]
    fn overview_defaults_to_pending() {
        let mut w = world();
        let second = fixtures::booking(&w.conn, &w.doc, &w.user, "13_6_2025", "10:30 AM");
        create_diagnosis(&mut w.conn, &second.id, &w.doc.id, draft()).unwrap();

        let overviews = list_appointment_overviews(&w.conn).unwrap();
        assert_eq!(overviews.len(), 2);
        let plain = overviews.iter().find(|o| o.appointment.id == w.appt.id).unwrap();
        assert_eq!(plain.diagnosis_status, DispensingStatus::Pending);
        assert!(plain.medicines.is_empty());
        let diagnosed = overviews.iter().find(|o| o.appointment.id == second.id).unwrap();
        assert_eq!(diagnosed.medicines[0].name, "Ibuprofen");
    }

    #[test]
    fn doctor_dashboard_counts() {
        let mut w = world();
        let bob = fixtures::user(&w.conn, "bob@example.com");
        let paid = fixtures::booking(&w.conn, &w.doc, &bob, "13_6_2025", "09:00 AM");
        fixtures::booking(&w.conn, &w.doc, &bob, "14_6_2025", "09:00 AM");
        complete_appointment(&mut w.conn, &w.appt.id, &w.doc.id).unwrap();
        repository::update_payment(
            &w.conn,
            &paid.id,
            PaymentStatus::Completed,
            crate::models::enums::PaymentMethod::Online,
        )
        .unwrap();

        let dash = doctor_dashboard(&w.conn, &w.doc.id).unwrap();
        assert_eq!(dash.earnings, 100);
        assert_eq!(dash.appointments, 3);
        assert_eq!(dash.patients, 2);
        assert_eq!(dash.latest_appointments.len(), 3);
    }

    #[test]
    fn admin_dashboard_counts() {
        let w = world();
        let dash = admin_dashboard(&w.conn).unwrap();
        assert_eq!((dash.doctors, dash.appointments, dash.patients), (1, 1, 1));
    }
}
