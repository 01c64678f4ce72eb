//! Nursing care of ward patients.
//!
//! A nurse only ever sees and edits the patients assigned to them. Chart
//! entries are appended to the patient and saved back inside one immediate
//! transaction, so concurrent edits to the same chart serialize.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::enums::{BloodType, Gender, WardStatus};
use crate::models::*;

const RECENT_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum CareError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Patient is not assigned to this nurse")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for CareError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.into())
    }
}

// ── Inputs ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWardPatient {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub contact_number: String,
    #[serde(default)]
    pub emergency_contact: EmergencyContact,
    #[serde(default)]
    pub address: WardAddress,
    #[serde(default)]
    pub medical_history: String,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub blood_type: BloodType,
    pub bed_number: Option<String>,
    pub ward_number: Option<String>,
    pub assigned_doctor: Option<Uuid>,
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardPatientUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub contact_number: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
    pub address: Option<WardAddress>,
    pub medical_history: Option<String>,
    pub allergies: Option<Vec<String>>,
    pub blood_type: Option<BloodType>,
    pub status: Option<WardStatus>,
    pub bed_number: Option<String>,
    pub ward_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsInput {
    pub date: Option<DateTime<Utc>>,
    pub temperature: Option<f64>,
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<u32>,
    pub respiratory_rate: Option<u32>,
    pub oxygen_saturation: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabReportInput {
    pub test_name: String,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
}

// ── Access ──────────────────────────────────────────────────

/// Load a patient the nurse is allowed to touch.
pub fn patient_for_nurse(
    conn: &Connection,
    nurse_id: &Uuid,
    patient_id: &Uuid,
) -> Result<WardPatient, CareError> {
    let patient =
        repository::get_ward_patient(conn, patient_id)?.ok_or(CareError::NotFound("Patient"))?;
    if patient.assigned_nurse != Some(*nurse_id) {
        return Err(CareError::Forbidden);
    }
    Ok(patient)
}

/// Load, apply `change`, stamp `updated_at`, save. One write transaction.
fn modify<F>(
    conn: &mut Connection,
    nurse_id: &Uuid,
    patient_id: &Uuid,
    change: F,
) -> Result<WardPatient, CareError>
where
    F: FnOnce(&mut WardPatient) -> Result<(), CareError>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut patient = patient_for_nurse(&tx, nurse_id, patient_id)?;
    change(&mut patient)?;
    patient.updated_at = Utc::now();
    repository::save_ward_patient(&tx, &patient)?;
    tx.commit()?;
    Ok(patient)
}

fn require_doctor(conn: &Connection, doctor_id: &Uuid) -> Result<(), CareError> {
    repository::get_doctor(conn, doctor_id)?
        .map(|_| ())
        .ok_or(CareError::NotFound("Doctor"))
}

fn require_text(value: &str, field: &str) -> Result<(), CareError> {
    if value.trim().is_empty() {
        return Err(CareError::Validation(format!("{field} is required")));
    }
    Ok(())
}

// ── Operations ──────────────────────────────────────────────

pub fn admit_patient(
    conn: &Connection,
    nurse_id: &Uuid,
    input: NewWardPatient,
) -> Result<WardPatient, CareError> {
    require_text(&input.name, "name")?;
    require_text(&input.contact_number, "contactNumber")?;
    if let Some(doc) = &input.assigned_doctor {
        require_doctor(conn, doc)?;
    }

    let now = Utc::now();
    let patient = WardPatient {
        id: Uuid::new_v4(),
        name: input.name,
        age: input.age,
        gender: input.gender,
        contact_number: input.contact_number,
        emergency_contact: input.emergency_contact,
        address: input.address,
        medical_history: input.medical_history,
        allergies: input.allergies,
        blood_type: input.blood_type,
        status: WardStatus::Admitted,
        admission_date: now,
        discharge_date: None,
        bed_number: input.bed_number,
        ward_number: input.ward_number,
        assigned_doctor: input.assigned_doctor,
        assigned_nurse: Some(*nurse_id),
        chart: Chart::default(),
        created_at: now,
        updated_at: now,
    };
    repository::insert_ward_patient(conn, &patient)?;
    tracing::info!(patient_id = %patient.id, nurse_id = %nurse_id, "Patient admitted");
    Ok(patient)
}

pub fn update_patient(
    conn: &mut Connection,
    nurse_id: &Uuid,
    patient_id: &Uuid,
    update: WardPatientUpdate,
) -> Result<WardPatient, CareError> {
    modify(conn, nurse_id, patient_id, |p| {
        if let Some(name) = update.name {
            require_text(&name, "name")?;
            p.name = name;
        }
        if let Some(age) = update.age {
            p.age = age;
        }
        if let Some(gender) = update.gender {
            p.gender = gender;
        }
        if let Some(contact) = update.contact_number {
            p.contact_number = contact;
        }
        if let Some(emergency) = update.emergency_contact {
            p.emergency_contact = emergency;
        }
        if let Some(address) = update.address {
            p.address = address;
        }
        if let Some(history) = update.medical_history {
            p.medical_history = history;
        }
        if let Some(allergies) = update.allergies {
            p.allergies = allergies;
        }
        if let Some(blood) = update.blood_type {
            p.blood_type = blood;
        }
        if let Some(bed) = update.bed_number {
            p.bed_number = Some(bed);
        }
        if let Some(ward) = update.ward_number {
            p.ward_number = Some(ward);
        }
        if let Some(status) = update.status {
            p.set_status(status);
        }
        Ok(())
    })
}

pub fn record_vitals(
    conn: &mut Connection,
    nurse_id: &Uuid,
    patient_id: &Uuid,
    input: VitalsInput,
) -> Result<WardPatient, CareError> {
    modify(conn, nurse_id, patient_id, |p| {
        p.chart.vital_signs.push(VitalSigns {
            date: input.date.unwrap_or_else(Utc::now),
            temperature: input.temperature,
            blood_pressure: input.blood_pressure,
            heart_rate: input.heart_rate,
            respiratory_rate: input.respiratory_rate,
            oxygen_saturation: input.oxygen_saturation,
            notes: input.notes,
        });
        Ok(())
    })
}

pub fn add_medication(
    conn: &mut Connection,
    nurse_id: &Uuid,
    patient_id: &Uuid,
    medication: WardMedication,
) -> Result<WardPatient, CareError> {
    require_text(&medication.name, "name")?;
    modify(conn, nurse_id, patient_id, |p| {
        p.chart.medications.push(medication);
        Ok(())
    })
}

pub fn add_lab_report(
    conn: &mut Connection,
    nurse_id: &Uuid,
    patient_id: &Uuid,
    input: LabReportInput,
) -> Result<WardPatient, CareError> {
    require_text(&input.test_name, "testName")?;
    modify(conn, nurse_id, patient_id, |p| {
        p.chart.lab_reports.push(LabReport {
            id: Uuid::new_v4(),
            test_name: input.test_name,
            date: input.date.or_else(|| Some(Utc::now())),
            results: input.results,
            verified: false,
            verified_by: None,
            verification_date: None,
        });
        Ok(())
    })
}

/// Sign off a lab report. Verifying twice keeps the first signature.
pub fn verify_lab_report(
    conn: &mut Connection,
    nurse_id: &Uuid,
    patient_id: &Uuid,
    report_id: &Uuid,
) -> Result<WardPatient, CareError> {
    modify(conn, nurse_id, patient_id, |p| {
        let report = p
            .chart
            .lab_reports
            .iter_mut()
            .find(|r| r.id == *report_id)
            .ok_or(CareError::NotFound("Report"))?;
        if !report.verified {
            report.verified = true;
            report.verified_by = Some(*nurse_id);
            report.verification_date = Some(Utc::now());
        }
        Ok(())
    })
}

pub fn add_note(
    conn: &mut Connection,
    nurse_id: &Uuid,
    patient_id: &Uuid,
    note: String,
) -> Result<WardPatient, CareError> {
    require_text(&note, "note")?;
    modify(conn, nurse_id, patient_id, |p| {
        p.chart.nurse_notes.push(NurseNote {
            date: Utc::now(),
            note,
            nurse_id: *nurse_id,
        });
        Ok(())
    })
}

pub fn record_round(
    conn: &mut Connection,
    nurse_id: &Uuid,
    patient_id: &Uuid,
    notes: String,
) -> Result<WardPatient, CareError> {
    modify(conn, nurse_id, patient_id, |p| {
        p.chart.round_visits.push(RoundVisit {
            date: Utc::now(),
            notes,
            performed_by: *nurse_id,
        });
        Ok(())
    })
}

pub fn add_task(
    conn: &mut Connection,
    nurse_id: &Uuid,
    patient_id: &Uuid,
    input: TaskInput,
) -> Result<WardPatient, CareError> {
    require_text(&input.description, "description")?;
    modify(conn, nurse_id, patient_id, |p| {
        p.chart.follow_up_tasks.push(FollowUpTask {
            id: Uuid::new_v4(),
            description: input.description,
            due_date: input.due_date,
            completed: false,
            completed_date: None,
            assigned_to: *nurse_id,
        });
        Ok(())
    })
}

pub fn complete_task(
    conn: &mut Connection,
    nurse_id: &Uuid,
    patient_id: &Uuid,
    task_id: &Uuid,
) -> Result<WardPatient, CareError> {
    modify(conn, nurse_id, patient_id, |p| {
        let task = p
            .chart
            .follow_up_tasks
            .iter_mut()
            .find(|t| t.id == *task_id)
            .ok_or(CareError::NotFound("Task"))?;
        if !task.completed {
            task.completed = true;
            task.completed_date = Some(Utc::now());
        }
        Ok(())
    })
}

pub fn assign_doctor(
    conn: &mut Connection,
    nurse_id: &Uuid,
    patient_id: &Uuid,
    doctor_id: &Uuid,
) -> Result<WardPatient, CareError> {
    require_doctor(conn, doctor_id)?;
    modify(conn, nurse_id, patient_id, |p| {
        p.assigned_doctor = Some(*doctor_id);
        Ok(())
    })
}

// ── Dashboard ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub id: Uuid,
    pub name: String,
    pub status: WardStatus,
    pub bed_number: Option<String>,
    pub ward_number: Option<String>,
    pub admission_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTask {
    pub patient_id: Uuid,
    pub patient_name: String,
    pub task_id: Uuid,
    pub task_description: String,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NurseDashboard {
    pub admitted_patients_count: usize,
    pub to_be_discharged: usize,
    pub follow_up_count: usize,
    pub checkup_count: usize,
    /// Patients with at least one open follow-up task.
    pub pending_follow_ups: usize,
    /// Patients with at least one unverified lab report.
    pub pending_reports: usize,
    pub recent_patients: Vec<PatientSummary>,
    pub pending_tasks: Vec<PendingTask>,
}

pub fn nurse_dashboard(
    conn: &Connection,
    nurse_id: &Uuid,
) -> Result<NurseDashboard, DatabaseError> {
    let patients = repository::list_ward_patients_for_nurse(conn, nurse_id, None)?;
    let with_status = |s: WardStatus| patients.iter().filter(|p| p.status == s).count();

    let mut pending_tasks: Vec<PendingTask> = patients
        .iter()
        .flat_map(|p| {
            p.chart
                .follow_up_tasks
                .iter()
                .filter(|t| !t.completed)
                .map(move |t| PendingTask {
                    patient_id: p.id,
                    patient_name: p.name.clone(),
                    task_id: t.id,
                    task_description: t.description.clone(),
                    due_date: t.due_date,
                })
        })
        .collect();
    // Soonest first; undated tasks last.
    pending_tasks.sort_by_key(|t| (t.due_date.is_none(), t.due_date));
    pending_tasks.truncate(RECENT_LIMIT);

    Ok(NurseDashboard {
        admitted_patients_count: with_status(WardStatus::Admitted),
        to_be_discharged: with_status(WardStatus::ToBeDischarged),
        follow_up_count: with_status(WardStatus::FollowUp),
        checkup_count: with_status(WardStatus::Checkup),
        pending_follow_ups: patients.iter().filter(|p| p.chart.has_pending_tasks()).count(),
        pending_reports: patients.iter().filter(|p| p.chart.has_unverified_reports()).count(),
        recent_patients: patients
            .iter()
            .take(RECENT_LIMIT)
            .map(|p| PatientSummary {
                id: p.id,
                name: p.name.clone(),
                status: p.status,
                bed_number: p.bed_number.clone(),
                ward_number: p.ward_number.clone(),
                admission_date: p.admission_date,
            })
            .collect(),
        pending_tasks,
    })
}
