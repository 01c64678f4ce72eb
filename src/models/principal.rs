use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Shift;
use super::slot_ledger::SlotLedger;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub image: String,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub fees: i64,
    pub address: Address,
    pub available: bool,
    /// Offset of the doctor's local time from UTC, used for calendar events.
    pub utc_offset_minutes: i32,
    pub slots_booked: SlotLedger,
    pub created_at: i64,
}

/// Public listing of a doctor: no credentials, no contact email.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorListing {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub fees: i64,
    pub address: Address,
    pub available: bool,
    pub slots_booked: SlotLedger,
}

impl From<Doctor> for DoctorListing {
    fn from(doc: Doctor) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            image: doc.image,
            speciality: doc.speciality,
            degree: doc.degree,
            experience: doc.experience,
            about: doc.about,
            fees: doc.fees,
            address: doc.address,
            available: doc.available,
            slots_booked: doc.slots_booked,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pharmacy {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub image: String,
    pub license: String,
    pub phone: String,
    pub address: Address,
    pub about: String,
    pub available: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nurse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub image: String,
    pub license_number: String,
    pub department: String,
    pub shift: Shift,
    pub specialization: String,
    pub experience: String,
    pub phone: String,
    pub address: Address,
    pub available: bool,
    pub assigned_doctors: Vec<Uuid>,
    pub created_at: i64,
}

/// A patient account. Accounts are created by the patient-facing module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub image: String,
    pub phone: String,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$2b$10$secret".into(),
            image: String::new(),
            phone: String::new(),
            created_at: 0,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "ada@example.com");
    }
}
