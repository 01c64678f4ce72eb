//! Pharmacy side of prescriptions: status updates, queues, history.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::enums::{DispensingStatus, NotificationType};
use crate::models::*;

const RECENT_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum DispensingError {
    #[error("Prescription not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for DispensingError {
    fn from(err: rusqlite::Error) -> Self {
        DispensingError::Database(err.into())
    }
}

fn status_message(status: DispensingStatus) -> &'static str {
    match status {
        DispensingStatus::Completed => "Your prescription has been accepted by the pharmacy",
        DispensingStatus::Cancelled => "Your prescription has been rejected by the pharmacy",
        DispensingStatus::Pending => {
            "Your prescription has been returned to pending by the pharmacy"
        }
    }
}

/// Set a prescription's dispensing status on behalf of a pharmacy.
///
/// Every call appends one history entry and one patient notification, even
/// when the status is unchanged.
pub fn update_prescription_status(
    conn: &mut Connection,
    diagnosis_id: &Uuid,
    pharmacy_id: &Uuid,
    status: DispensingStatus,
) -> Result<(), DispensingError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let diagnosis = repository::get_diagnosis(&tx, diagnosis_id)?.ok_or(DispensingError::NotFound)?;

    let now = Utc::now();
    repository::set_dispensing_status(&tx, diagnosis_id, status, &now)?;
    repository::insert_dispensing_record(
        &tx,
        pharmacy_id,
        &DispensingRecord {
            prescription_id: *diagnosis_id,
            status,
            dispensed_at: now,
        },
    )?;
    repository::insert_notification(
        &tx,
        &Notification::new(
            diagnosis.user_id,
            status_message(status),
            NotificationType::PrescriptionStatus,
        ),
    )?;
    tx.commit()?;

    tracing::info!(
        diagnosis_id = %diagnosis_id,
        pharmacy_id = %pharmacy_id,
        status = %status,
        "Prescription status updated"
    );
    Ok(())
}

/// Short-form names of the people behind a prescription.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyInfo {
    pub name: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionView {
    pub id: Uuid,
    pub user_data: PartyInfo,
    pub doc_data: PartyInfo,
    pub diagnosis: String,
    pub prescription: String,
    pub medicines: Vec<Medicine>,
    pub dispensing_status: DispensingStatus,
    pub date: DateTime<Utc>,
}

fn view(conn: &Connection, diagnosis: Diagnosis) -> Result<PrescriptionView, DatabaseError> {
    // Names come from the booking snapshots, not the live accounts.
    let appt = repository::get_appointment(conn, &diagnosis.appointment_id)?;
    let (user_data, doc_data) = match appt {
        Some(a) => (
            PartyInfo {
                name: a.user_data.name,
                image: a.user_data.image,
                speciality: None,
            },
            PartyInfo {
                name: a.doc_data.name,
                image: a.doc_data.image,
                speciality: Some(a.doc_data.speciality),
            },
        ),
        None => (
            PartyInfo {
                name: "N/A".into(),
                image: String::new(),
                speciality: None,
            },
            PartyInfo {
                name: "N/A".into(),
                image: String::new(),
                speciality: None,
            },
        ),
    };
    Ok(PrescriptionView {
        id: diagnosis.id,
        user_data,
        doc_data,
        diagnosis: diagnosis.diagnosis,
        prescription: diagnosis.prescription,
        medicines: diagnosis.medicines,
        dispensing_status: diagnosis.dispensing_status,
        date: diagnosis.date,
    })
}

/// Prescriptions still waiting on the pharmacy, newest first.
pub fn open_prescriptions(conn: &Connection) -> Result<Vec<PrescriptionView>, DatabaseError> {
    repository::list_diagnoses(conn, true)?
        .into_iter()
        .map(|d| view(conn, d))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyDashboard {
    pub pending_prescriptions: i64,
    pub completed_prescriptions: i64,
    pub recent_prescriptions: Vec<PrescriptionView>,
}

pub fn pharmacy_dashboard(conn: &Connection) -> Result<PharmacyDashboard, DatabaseError> {
    let mut recent = repository::list_diagnoses(conn, false)?;
    recent.truncate(RECENT_LIMIT);
    Ok(PharmacyDashboard {
        pending_prescriptions: repository::count_diagnoses_by_status(
            conn,
            DispensingStatus::Pending,
        )?,
        completed_prescriptions: repository::count_diagnoses_by_status(
            conn,
            DispensingStatus::Completed,
        )?,
        recent_prescriptions: recent
            .into_iter()
            .map(|d| view(conn, d))
            .collect::<Result<_, _>>()?,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineHistoryEntry {
    pub id: Uuid,
    pub patient_name: String,
    pub doctor_name: String,
    pub doctor_speciality: String,
    pub date: DateTime<Utc>,
    pub diagnosis: String,
    pub medicines: Vec<Medicine>,
    pub dispensing_status: DispensingStatus,
    pub dispensed_date: Option<DateTime<Utc>>,
    pub refills_remaining: u32,
}

/// Every prescription ever written, newest first.
pub fn patient_medicine_history(
    conn: &Connection,
) -> Result<Vec<MedicineHistoryEntry>, DatabaseError> {
    repository::list_diagnoses(conn, false)?
        .into_iter()
        .map(|d| {
            let appt = repository::get_appointment(conn, &d.appointment_id)?;
            let (patient_name, doctor_name, doctor_speciality) = match appt {
                Some(a) => (a.user_data.name, a.doc_data.name, a.doc_data.speciality),
                None => (
                    "Unknown Patient".into(),
                    "Unknown Doctor".into(),
                    "Specialist".into(),
                ),
            };
            Ok(MedicineHistoryEntry {
                id: d.id,
                patient_name,
                doctor_name,
                doctor_speciality,
                date: d.date,
                diagnosis: d.diagnosis,
                medicines: d.medicines,
                dispensing_status: d.dispensing_status,
                dispensed_date: d.medicine_history.dispensed_date,
                refills_remaining: d.medicine_history.refills_remaining,
            })
        })
        .collect()
}
