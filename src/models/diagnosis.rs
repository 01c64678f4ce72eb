use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::DispensingStatus;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub timing: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabTest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineHistory {
    pub dispensed_date: Option<DateTime<Utc>>,
    pub last_refill_date: Option<DateTime<Utc>>,
    pub refills_remaining: u32,
    pub notes: Option<String>,
}

/// Clinical record attached 1:1 to a completed appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub doc_id: Uuid,
    pub user_id: Uuid,
    pub diagnosis: String,
    pub prescription: String,
    pub medicines: Vec<Medicine>,
    pub tests: Vec<LabTest>,
    pub dispensing_status: DispensingStatus,
    pub follow_up_date: Option<NaiveDate>,
    pub date: DateTime<Utc>,
    pub medicine_history: MedicineHistory,
}

/// Doctor-supplied content of a new diagnosis.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisDraft {
    pub diagnosis: String,
    pub prescription: String,
    #[serde(default)]
    pub medicines: Vec<Medicine>,
    #[serde(default)]
    pub tests: Vec<LabTest>,
    #[serde(default)]
    pub follow_up_date: Option<NaiveDate>,
}

/// One entry in a pharmacy's dispensing history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispensingRecord {
    pub prescription_id: Uuid,
    pub status: DispensingStatus,
    pub dispensed_at: DateTime<Utc>,
}
