//! Appointment records and their lifecycle state machine.
//!
//! The stored flags (`cancelled`, `is_completed`, `diagnosis_created`) are
//! the persistence form; `AppointmentState` is derived from them and all
//! mutations go through the transition methods below so the flags can
//! never describe an impossible state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{PaymentMethod, PaymentStatus};
use super::principal::Address;

/// Patient details captured when the appointment was booked.
///
/// Snapshots are not kept in sync with the live account: later profile
/// edits do not show up here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSnapshot {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
}

/// Doctor details captured when the appointment was booked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSnapshot {
    pub name: String,
    #[serde(default)]
    pub speciality: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub fees: i64,
    #[serde(default)]
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub doc_id: Uuid,
    pub slot_date: String,
    pub slot_time: String,
    pub user_data: PatientSnapshot,
    pub doc_data: DoctorSnapshot,
    pub amount: i64,
    /// Booking time, milliseconds since the Unix epoch.
    pub date: i64,
    pub cancelled: bool,
    pub is_completed: bool,
    pub diagnosis_id: Option<Uuid>,
    pub diagnosis_created: bool,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AppointmentState {
    Active,
    Cancelled,
    Completed,
    CompletedWithDiagnosis,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} an appointment that is {from:?}")]
pub struct InvalidTransition {
    pub from: AppointmentState,
    pub action: &'static str,
}

/// Whether a transition changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    AlreadyInState,
}

impl Appointment {
    /// New active appointment for a booked slot.
    pub fn book(
        user_id: Uuid,
        doc_id: Uuid,
        slot_date: &str,
        slot_time: &str,
        user_data: PatientSnapshot,
        doc_data: DoctorSnapshot,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            doc_id,
            slot_date: slot_date.to_string(),
            slot_time: slot_time.to_string(),
            amount: doc_data.fees,
            user_data,
            doc_data,
            date: chrono::Utc::now().timestamp_millis(),
            cancelled: false,
            is_completed: false,
            diagnosis_id: None,
            diagnosis_created: false,
            payment_status: PaymentStatus::default(),
            payment_method: PaymentMethod::default(),
        }
    }

    pub fn state(&self) -> AppointmentState {
        match (self.cancelled, self.is_completed, self.diagnosis_id) {
            (true, _, _) => AppointmentState::Cancelled,
            (false, true, Some(_)) => AppointmentState::CompletedWithDiagnosis,
            (false, true, None) => AppointmentState::Completed,
            (false, false, _) => AppointmentState::Active,
        }
    }

    /// Active → Cancelled. Cancelling twice is a no-op.
    pub fn cancel(&mut self) -> Result<Transition, InvalidTransition> {
        match self.state() {
            AppointmentState::Active => {
                self.cancelled = true;
                Ok(Transition::Applied)
            }
            AppointmentState::Cancelled => Ok(Transition::AlreadyInState),
            from => Err(InvalidTransition { from, action: "cancel" }),
        }
    }

    /// Active → Completed. Completing twice is a no-op.
    pub fn complete(&mut self) -> Result<Transition, InvalidTransition> {
        match self.state() {
            AppointmentState::Active => {
                self.is_completed = true;
                Ok(Transition::Applied)
            }
            AppointmentState::Completed | AppointmentState::CompletedWithDiagnosis => {
                Ok(Transition::AlreadyInState)
            }
            from => Err(InvalidTransition { from, action: "complete" }),
        }
    }

    /// Active | Completed → CompletedWithDiagnosis, as one state change.
    pub fn complete_with_diagnosis(&mut self, diagnosis_id: Uuid) -> Result<(), InvalidTransition> {
        match self.state() {
            AppointmentState::Active | AppointmentState::Completed => {
                self.is_completed = true;
                self.diagnosis_created = true;
                self.diagnosis_id = Some(diagnosis_id);
                Ok(())
            }
            from => Err(InvalidTransition {
                from,
                action: "attach a diagnosis to",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> Appointment {
        Appointment::book(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "12_6_2025",
            "10:30 AM",
            PatientSnapshot {
                name: "Ada".into(),
                ..Default::default()
            },
            DoctorSnapshot {
                name: "Dr. Grey".into(),
                fees: 50,
                ..Default::default()
            },
        )
    }

    #[test]
    fn booking_takes_amount_from_doctor_fees() {
        let appt = active();
        assert_eq!(appt.amount, 50);
        assert_eq!(appt.state(), AppointmentState::Active);
        assert_eq!(appt.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut appt = active();
        assert_eq!(appt.cancel().unwrap(), Transition::Applied);
        assert_eq!(appt.cancel().unwrap(), Transition::AlreadyInState);
        assert_eq!(appt.state(), AppointmentState::Cancelled);
    }

    #[test]
    fn completed_cannot_be_cancelled() {
        let mut appt = active();
        appt.complete().unwrap();
        let err = appt.cancel().unwrap_err();
        assert_eq!(err.from, AppointmentState::Completed);
        assert!(!appt.cancelled);
    }

    #[test]
    fn cancelled_cannot_be_completed() {
        let mut appt = active();
        appt.cancel().unwrap();
        assert!(appt.complete().is_err());
        assert!(appt.complete_with_diagnosis(Uuid::new_v4()).is_err());
        assert!(!appt.is_completed);
    }

    #[test]
    fn diagnosis_completes_in_one_step() {
        let mut appt = active();
        let diag = Uuid::new_v4();
        appt.complete_with_diagnosis(diag).unwrap();
        assert!(appt.is_completed);
        assert!(appt.diagnosis_created);
        assert_eq!(appt.diagnosis_id, Some(diag));
        assert_eq!(appt.state(), AppointmentState::CompletedWithDiagnosis);
    }

    #[test]
    fn diagnosis_can_follow_plain_completion_once() {
        let mut appt = active();
        appt.complete().unwrap();
        appt.complete_with_diagnosis(Uuid::new_v4()).unwrap();
        assert!(appt.complete_with_diagnosis(Uuid::new_v4()).is_err());
    }

    #[test]
    fn never_cancelled_and_completed() {
        let mut appt = active();
        let _ = appt.complete();
        let _ = appt.cancel();
        let _ = appt.complete_with_diagnosis(Uuid::new_v4());
        assert!(!(appt.cancelled && appt.is_completed));
    }
}
