use crate::db::DatabaseError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the serde wire form.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(Role {
    Admin => "admin",
    Doctor => "doctor",
    Pharmacy => "pharmacy",
    Nurse => "nurse",
    Patient => "patient",
});

str_enum!(PaymentStatus {
    Pending => "Pending",
    Completed => "Completed",
    Failed => "Failed",
});

str_enum!(PaymentMethod {
    Cash => "CASH",
    Online => "ONLINE",
});

str_enum!(DispensingStatus {
    Pending => "pending",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(NotificationType {
    Appointment => "appointment",
    Diagnosis => "diagnosis",
    PrescriptionStatus => "prescription_status",
    General => "general",
});

str_enum!(Shift {
    Morning => "morning",
    Evening => "evening",
    Night => "night",
});

str_enum!(Gender {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

str_enum!(BloodType {
    APositive => "A+",
    ANegative => "A-",
    BPositive => "B+",
    BNegative => "B-",
    AbPositive => "AB+",
    AbNegative => "AB-",
    OPositive => "O+",
    ONegative => "O-",
    Unknown => "Unknown",
});

str_enum!(WardStatus {
    Admitted => "Admitted",
    Discharged => "Discharged",
    ToBeDischarged => "To Be Discharged",
    FollowUp => "Follow Up",
    Checkup => "Checkup",
});

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::Cash
    }
}

impl Default for DispensingStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for BloodType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl Default for WardStatus {
    fn default() -> Self {
        Self::Admitted
    }
}
