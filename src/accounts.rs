//! Staff accounts: admin registration and self-service profile edits.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{hash_password, AuthError};
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::enums::Shift;
use crate::models::*;

const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Account not found")]
    NotFound,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for AccountError {
    fn from(err: DatabaseError) -> Self {
        if err.is_unique_violation() {
            return AccountError::Conflict(
                "An account with this email or license already exists".into(),
            );
        }
        match err {
            DatabaseError::NotFound { .. } => AccountError::NotFound,
            other => AccountError::Database(other),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

fn require(fields: &[(&str, &str)]) -> Result<(), AccountError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AccountError::Validation(format!("Missing details: {}", missing.join(", "))))
    }
}

fn check_credentials(email: &str, password: &str) -> Result<(), AccountError> {
    if !is_valid_email(email) {
        return Err(AccountError::Validation("Please enter a valid email".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

// ── Registration ────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDoctor {
    pub name: String,
    pub email: String,
    pub password: String,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub fees: i64,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

pub fn register_doctor(
    conn: &Connection,
    bcrypt_cost: u32,
    input: NewDoctor,
) -> Result<Doctor, AccountError> {
    require(&[
        ("name", input.name.as_str()),
        ("email", input.email.as_str()),
        ("password", input.password.as_str()),
        ("speciality", input.speciality.as_str()),
        ("degree", input.degree.as_str()),
        ("experience", input.experience.as_str()),
        ("about", input.about.as_str()),
    ])?;
    let email = input.email.trim().to_string();
    check_credentials(&email, &input.password)?;
    if input.fees <= 0 {
        return Err(AccountError::Validation("fees must be positive".into()));
    }

    let doctor = Doctor {
        id: Uuid::new_v4(),
        name: input.name,
        email,
        password_hash: hash_password(&input.password, bcrypt_cost)?,
        image: input.image,
        speciality: input.speciality,
        degree: input.degree,
        experience: input.experience,
        about: input.about,
        fees: input.fees,
        address: input.address,
        available: true,
        utc_offset_minutes: input.utc_offset_minutes,
        slots_booked: SlotLedger::new(),
        created_at: Utc::now().timestamp_millis(),
    };
    repository::insert_doctor(conn, &doctor)?;
    tracing::info!(doctor_id = %doctor.id, "Doctor registered");
    Ok(doctor)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPharmacy {
    pub name: String,
    pub email: String,
    pub password: String,
    pub license: String,
    pub phone: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub image: String,
}

pub fn register_pharmacy(
    conn: &Connection,
    bcrypt_cost: u32,
    input: NewPharmacy,
) -> Result<Pharmacy, AccountError> {
    require(&[
        ("name", input.name.as_str()),
        ("email", input.email.as_str()),
        ("password", input.password.as_str()),
        ("license", input.license.as_str()),
        ("phone", input.phone.as_str()),
    ])?;
    let email = input.email.trim().to_string();
    check_credentials(&email, &input.password)?;

    let pharmacy = Pharmacy {
        id: Uuid::new_v4(),
        name: input.name,
        email,
        password_hash: hash_password(&input.password, bcrypt_cost)?,
        image: input.image,
        license: input.license,
        phone: input.phone,
        address: input.address,
        about: input.about,
        available: true,
        created_at: Utc::now().timestamp_millis(),
    };
    repository::insert_pharmacy(conn, &pharmacy)?;
    tracing::info!(pharmacy_id = %pharmacy.id, "Pharmacy registered");
    Ok(pharmacy)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNurse {
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: String,
    pub license_number: String,
    pub phone: String,
    #[serde(default = "default_shift")]
    pub shift: Shift,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub image: String,
}

fn default_shift() -> Shift {
    Shift::Morning
}

pub fn register_nurse(
    conn: &Connection,
    bcrypt_cost: u32,
    input: NewNurse,
) -> Result<Nurse, AccountError> {
    require(&[
        ("name", input.name.as_str()),
        ("email", input.email.as_str()),
        ("password", input.password.as_str()),
        ("department", input.department.as_str()),
        ("licenseNumber", input.license_number.as_str()),
        ("phone", input.phone.as_str()),
    ])?;
    let email = input.email.trim().to_string();
    check_credentials(&email, &input.password)?;

    let nurse = Nurse {
        id: Uuid::new_v4(),
        name: input.name,
        email,
        password_hash: hash_password(&input.password, bcrypt_cost)?,
        image: input.image,
        license_number: input.license_number,
        department: input.department,
        shift: input.shift,
        specialization: input.specialization,
        experience: input.experience,
        phone: input.phone,
        address: input.address,
        available: true,
        assigned_doctors: vec![],
        created_at: Utc::now().timestamp_millis(),
    };
    repository::insert_nurse(conn, &nurse)?;
    tracing::info!(nurse_id = %nurse.id, "Nurse registered");
    Ok(nurse)
}

// ── Profile edits ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfileUpdate {
    pub fees: i64,
    #[serde(default)]
    pub address: Address,
    pub available: bool,
}

pub fn update_doctor_profile(
    conn: &Connection,
    doctor_id: &Uuid,
    update: &DoctorProfileUpdate,
) -> Result<(), AccountError> {
    if update.fees <= 0 {
        return Err(AccountError::Validation("fees must be positive".into()));
    }
    repository::update_doctor_profile(
        conn,
        doctor_id,
        update.fees,
        &update.address,
        update.available,
    )?;
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyProfileUpdate {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub about: String,
}

pub fn update_pharmacy_profile(
    conn: &Connection,
    pharmacy_id: &Uuid,
    update: &PharmacyProfileUpdate,
) -> Result<(), AccountError> {
    require(&[("name", update.name.as_str()), ("phone", update.phone.as_str())])?;
    repository::update_pharmacy_profile(
        conn,
        pharmacy_id,
        &update.name,
        &update.phone,
        &update.address,
        &update.about,
    )?;
    Ok(())
}

/// Partial nurse profile edit; absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NurseProfileUpdate {
    pub name: Option<String>,
    pub image: Option<String>,
    pub department: Option<String>,
    pub shift: Option<Shift>,
    pub specialization: Option<String>,
    pub experience: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

pub fn update_nurse_profile(
    conn: &Connection,
    mut nurse: Nurse,
    update: NurseProfileUpdate,
) -> Result<Nurse, AccountError> {
    if let Some(name) = update.name {
        require(&[("name", name.as_str())])?;
        nurse.name = name;
    }
    if let Some(image) = update.image {
        nurse.image = image;
    }
    if let Some(department) = update.department {
        nurse.department = department;
    }
    if let Some(shift) = update.shift {
        nurse.shift = shift;
    }
    if let Some(specialization) = update.specialization {
        nurse.specialization = specialization;
    }
    if let Some(experience) = update.experience {
        nurse.experience = experience;
    }
    if let Some(phone) = update.phone {
        nurse.phone = phone;
    }
    if let Some(address) = update.address {
        nurse.address = address;
    }
    repository::update_nurse_profile(conn, &nurse)?;
    Ok(nurse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn new_doctor(email: &str) -> NewDoctor {
        NewDoctor {
            name: "Dr. Grey".into(),
            email: email.into(),
            password: "long-enough".into(),
            speciality: "Neurologist".into(),
            degree: "MD".into(),
            experience: "10 Years".into(),
            about: "Brains".into(),
            fees: 120,
            address: Address::default(),
            image: String::new(),
            utc_offset_minutes: 60,
        }
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("grey@seattle-grace.org"));
        assert!(!is_valid_email("grey@localhost"));
        assert!(!is_valid_email("grey seattle@x.org"));
        assert!(!is_valid_email("@x.org"));
    }

    #[test]
    fn doctor_registration_hashes_password() {
        let conn = open_memory_database().unwrap();
        let doc = register_doctor(&conn, 4, new_doctor("grey@example.com")).unwrap();
        assert_ne!(doc.password_hash, "long-enough");
        assert!(bcrypt::verify("long-enough", &doc.password_hash).unwrap());
        let stored = repository::get_doctor(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(stored.utc_offset_minutes, 60);
        assert!(stored.available);
    }

    #[test]
    fn weak_password_and_bad_email_rejected() {
        let conn = open_memory_database().unwrap();
        let mut weak = new_doctor("grey@example.com");
        weak.password = "short".into();
        assert!(matches!(register_doctor(&conn, 4, weak), Err(AccountError::Validation(_))));
        assert!(matches!(
            register_doctor(&conn, 4, new_doctor("not-an-email")),
            Err(AccountError::Validation(_))
        ));
    }

    #[test]
    fn duplicate_email_conflicts() {
        let conn = open_memory_database().unwrap();
        register_doctor(&conn, 4, new_doctor("grey@example.com")).unwrap();
        assert!(matches!(
            register_doctor(&conn, 4, new_doctor("grey@example.com")),
            Err(AccountError::Conflict(_))
        ));
    }

    #[test]
    fn missing_fields_listed() {
        let conn = open_memory_database().unwrap();
        let input = NewPharmacy {
            name: "Rx".into(),
            email: "rx@example.com".into(),
            password: "long-enough".into(),
            license: " ".into(),
            phone: String::new(),
            address: Address::default(),
            about: String::new(),
            image: String::new(),
        };
        let Err(AccountError::Validation(msg)) = register_pharmacy(&conn, 4, input) else {
            panic!("expected validation error");
        };
        assert!(msg.contains("license") && msg.contains("phone"));
    }

    #[test]
    fn nurse_partial_profile_update() {
        let conn = open_memory_database().unwrap();
        let nurse = register_nurse(
            &conn,
            4,
            NewNurse {
                name: "Joy".into(),
                email: "joy@example.com".into(),
                password: "long-enough".into(),
                department: "ER".into(),
                license_number: "RN-1".into(),
                phone: "555".into(),
                shift: Shift::Evening,
                specialization: String::new(),
                experience: String::new(),
                address: Address::default(),
                image: String::new(),
            },
        )
        .unwrap();
        let updated = update_nurse_profile(
            &conn,
            nurse,
            NurseProfileUpdate {
                shift: Some(Shift::Night),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.shift, Shift::Night);
        assert_eq!(updated.department, "ER");
    }

    #[test]
    fn doctor_profile_rejects_zero_fees() {
        let conn = open_memory_database().unwrap();
        let doc = register_doctor(&conn, 4, new_doctor("grey@example.com")).unwrap();
        let update = DoctorProfileUpdate {
            fees: 0,
            address: Address::default(),
            available: true,
        };
        assert!(update_doctor_profile(&conn, &doc.id, &update).is_err());
    }
}
