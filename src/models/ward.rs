//! Ward patients under nursing care and their running clinical chart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{BloodType, Gender, WardStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardAddress {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    pub date: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<u32>,
    pub respiratory_rate: Option<u32>,
    pub oxygen_saturation: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabReport {
    pub id: Uuid,
    pub test_name: String,
    pub date: Option<DateTime<Utc>>,
    pub results: String,
    pub verified: bool,
    pub verified_by: Option<Uuid>,
    pub verification_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NurseNote {
    pub date: DateTime<Utc>,
    pub note: String,
    pub nurse_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundVisit {
    pub date: DateTime<Utc>,
    pub notes: String,
    pub performed_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpTask {
    pub id: Uuid,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub completed_date: Option<DateTime<Utc>>,
    pub assigned_to: Uuid,
}

/// Everything recorded against a patient during the stay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    #[serde(default)]
    pub vital_signs: Vec<VitalSigns>,
    #[serde(default)]
    pub medications: Vec<WardMedication>,
    #[serde(default)]
    pub lab_reports: Vec<LabReport>,
    #[serde(default)]
    pub nurse_notes: Vec<NurseNote>,
    #[serde(default)]
    pub round_visits: Vec<RoundVisit>,
    #[serde(default)]
    pub follow_up_tasks: Vec<FollowUpTask>,
}

impl Chart {
    pub fn has_pending_tasks(&self) -> bool {
        self.follow_up_tasks.iter().any(|t| !t.completed)
    }

    pub fn has_unverified_reports(&self) -> bool {
        self.lab_reports.iter().any(|r| !r.verified)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardPatient {
    pub id: Uuid,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub contact_number: String,
    pub emergency_contact: EmergencyContact,
    pub address: WardAddress,
    pub medical_history: String,
    pub allergies: Vec<String>,
    pub blood_type: BloodType,
    pub status: WardStatus,
    pub admission_date: DateTime<Utc>,
    pub discharge_date: Option<DateTime<Utc>>,
    pub bed_number: Option<String>,
    pub ward_number: Option<String>,
    pub assigned_doctor: Option<Uuid>,
    pub assigned_nurse: Option<Uuid>,
    #[serde(flatten)]
    pub chart: Chart,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WardPatient {
    /// Move to a new status. Discharging stamps the discharge date once.
    pub fn set_status(&mut self, status: WardStatus) {
        if status == WardStatus::Discharged && self.discharge_date.is_none() {
            self.discharge_date = Some(Utc::now());
        }
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient() -> WardPatient {
        let now = Utc::now();
        WardPatient {
            id: Uuid::new_v4(),
            name: "Ben".into(),
            age: 40,
            gender: Gender::Male,
            contact_number: "555-0100".into(),
            emergency_contact: EmergencyContact::default(),
            address: WardAddress::default(),
            medical_history: String::new(),
            allergies: vec![],
            blood_type: BloodType::Unknown,
            status: WardStatus::Admitted,
            admission_date: now,
            discharge_date: None,
            bed_number: None,
            ward_number: None,
            assigned_doctor: None,
            assigned_nurse: None,
            chart: Chart::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn discharge_stamps_date() {
        let mut p = patient();
        p.set_status(WardStatus::Discharged);
        assert!(p.discharge_date.is_some());
    }

    #[test]
    fn other_status_leaves_discharge_date() {
        let mut p = patient();
        p.set_status(WardStatus::FollowUp);
        assert!(p.discharge_date.is_none());
        assert_eq!(p.status, WardStatus::FollowUp);
    }

    #[test]
    fn chart_flattens_into_patient_json() {
        let json = serde_json::to_value(patient()).unwrap();
        assert!(json["vitalSigns"].is_array());
        assert!(json["followUpTasks"].is_array());
        assert!(json.get("chart").is_none());
    }
}
