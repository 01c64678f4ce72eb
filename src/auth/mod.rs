//! Credential login and bearer-token authentication for every role.
//!
//! Admin credentials come from configuration; doctors, pharmacies, nurses
//! and patients are looked up by email and bcrypt-verified. Tokens carry the
//! role they were issued for, so a token is only ever accepted on routes of
//! that role.

pub mod password;
pub mod token;

use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::AdminCredentials;
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::models::{Doctor, Nurse, Pharmacy, User};

pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenIssuer, ADMIN_SUBJECT};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Authentication required")]
    Unauthorized,
    #[error("Token expired")]
    TokenExpired,
    #[error("Account no longer exists")]
    PrincipalNotFound,
    #[error("Credential service failure: {0}")]
    Upstream(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub enum Principal {
    /// Configuration-derived singleton.
    Admin { email: String },
    Doctor(Doctor),
    Pharmacy(Pharmacy),
    Nurse(Nurse),
    Patient(User),
}

impl Principal {
    pub fn role(&self) -> Role {
        match self {
            Principal::Admin { .. } => Role::Admin,
            Principal::Doctor(_) => Role::Doctor,
            Principal::Pharmacy(_) => Role::Pharmacy,
            Principal::Nurse(_) => Role::Nurse,
            Principal::Patient(_) => Role::Patient,
        }
    }

    /// Stored id, `None` for the admin.
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Principal::Admin { .. } => None,
            Principal::Doctor(d) => Some(d.id),
            Principal::Pharmacy(p) => Some(p.id),
            Principal::Nurse(n) => Some(n.id),
            Principal::Patient(u) => Some(u.id),
        }
    }

    /// Label used in the audit log.
    pub fn audit_label(&self) -> String {
        self.id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| ADMIN_SUBJECT.to_string())
    }
}

/// Attached to request extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
}

impl AuthContext {
    pub fn doctor(&self) -> Option<&Doctor> {
        match &self.principal {
            Principal::Doctor(d) => Some(d),
            _ => None,
        }
    }

    pub fn pharmacy(&self) -> Option<&Pharmacy> {
        match &self.principal {
            Principal::Pharmacy(p) => Some(p),
            _ => None,
        }
    }

    pub fn nurse(&self) -> Option<&Nurse> {
        match &self.principal {
            Principal::Nurse(n) => Some(n),
            _ => None,
        }
    }

    pub fn patient(&self) -> Option<&User> {
        match &self.principal {
            Principal::Patient(u) => Some(u),
            _ => None,
        }
    }
}

/// Validate credentials for `role` and sign a token.
pub fn issue_token(
    conn: &Connection,
    issuer: &TokenIssuer,
    admin: &AdminCredentials,
    role: Role,
    creds: &Credentials,
) -> Result<String, AuthError> {
    let email = creds.email.trim();
    if role == Role::Admin {
        // Both fields are compared so a mismatch on either looks identical.
        let email_ok = email == admin.email;
        let password_ok = creds.password == admin.password;
        if !(email_ok && password_ok) {
            return Err(AuthError::InvalidCredentials);
        }
        return issuer.issue(Role::Admin, ADMIN_SUBJECT);
    }

    let account = match role {
        Role::Doctor => {
            repository::get_doctor_by_email(conn, email)?.map(|d| (d.id, d.password_hash))
        }
        Role::Pharmacy => {
            repository::get_pharmacy_by_email(conn, email)?.map(|p| (p.id, p.password_hash))
        }
        Role::Nurse => {
            repository::get_nurse_by_email(conn, email)?.map(|n| (n.id, n.password_hash))
        }
        Role::Patient => {
            repository::get_user_by_email(conn, email)?.map(|u| (u.id, u.password_hash))
        }
        Role::Admin => None,
    };

    let verified = verify_password(&creds.password, account.as_ref().map(|(_, h)| h.as_str()))?;
    match account {
        Some((id, _)) if verified => {
            tracing::info!(role = %role, principal = %id, "Login succeeded");
            issuer.issue(role, &id.to_string())
        }
        _ => {
            tracing::info!(role = %role, "Login rejected");
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Resolve an `Authorization` header value into the caller for `role`.
pub fn authenticate(
    conn: &Connection,
    issuer: &TokenIssuer,
    admin: &AdminCredentials,
    role: Role,
    header: Option<&str>,
) -> Result<AuthContext, AuthError> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::Unauthorized)?;

    let claims = issuer.verify(token, role)?;

    let principal = match role {
        Role::Admin => {
            if claims.sub != ADMIN_SUBJECT {
                return Err(AuthError::Unauthorized);
            }
            Principal::Admin {
                email: admin.email.clone(),
            }
        }
        _ => {
            let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::Unauthorized)?;
            let found = match role {
                Role::Doctor => repository::get_doctor(conn, &id)?.map(Principal::Doctor),
                Role::Pharmacy => repository::get_pharmacy(conn, &id)?.map(Principal::Pharmacy),
                Role::Nurse => repository::get_nurse(conn, &id)?.map(Principal::Nurse),
                Role::Patient => repository::get_user(conn, &id)?.map(Principal::Patient),
                Role::Admin => None,
            };
            found.ok_or(AuthError::PrincipalNotFound)?
        }
    };

    Ok(AuthContext { principal })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::fixtures;

    fn setup() -> (Connection, TokenIssuer, AdminCredentials) {
        let conn = open_memory_database().unwrap();
        let issuer = TokenIssuer::new(b"0123456789abcdef0123456789abcdef", Duration::days(7));
        let admin = AdminCredentials {
            email: "admin@carepoint.test".into(),
            password: "admin-pass".into(),
        };
        (conn, issuer, admin)
    }

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn admin_login_round_trip() {
        let (conn, issuer, admin) = setup();
        let token = issue_token(
            &conn,
            &issuer,
            &admin,
            Role::Admin,
            &creds("admin@carepoint.test", "admin-pass"),
        )
        .unwrap();
        let header = format!("Bearer {token}");
        let ctx = authenticate(&conn, &issuer, &admin, Role::Admin, Some(&header)).unwrap();
        assert_eq!(ctx.principal.role(), Role::Admin);
        assert!(ctx.principal.id().is_none());
    }

    #[test]
    fn admin_wrong_password() {
        let (conn, issuer, admin) = setup();
        let err = issue_token(
            &conn,
            &issuer,
            &admin,
            Role::Admin,
            &creds("admin@carepoint.test", "nope"),
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn doctor_login_and_authenticate() {
        let (conn, issuer, admin) = setup();
        let doc = fixtures::doctor(&conn, "grey@example.com");
        let token = issue_token(
            &conn,
            &issuer,
            &admin,
            Role::Doctor,
            &creds("grey@example.com", "doctor-pass"),
        )
        .unwrap();
        let header = format!("Bearer {token}");
        let ctx = authenticate(&conn, &issuer, &admin, Role::Doctor, Some(&header)).unwrap();
        assert_eq!(ctx.doctor().map(|d| d.id), Some(doc.id));
    }

    #[test]
    fn unknown_email_and_wrong_password_look_alike() {
        let (conn, issuer, admin) = setup();
        fixtures::pharmacy(&conn, "rx@example.com");
        let ghost = creds("ghost@example.com", "x");
        let unknown = issue_token(&conn, &issuer, &admin, Role::Pharmacy, &ghost).unwrap_err();
        let bad = creds("rx@example.com", "x");
        let wrong = issue_token(&conn, &issuer, &admin, Role::Pharmacy, &bad).unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[test]
    fn nurse_token_rejected_on_doctor_role() {
        let (conn, issuer, admin) = setup();
        fixtures::nurse(&conn, "joy@example.com");
        let joy = creds("joy@example.com", "nurse-pass");
        let token = issue_token(&conn, &issuer, &admin, Role::Nurse, &joy).unwrap();
        let header = format!("Bearer {token}");
        assert!(matches!(
            authenticate(&conn, &issuer, &admin, Role::Doctor, Some(&header)),
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn deleted_principal_not_found() {
        let (conn, issuer, admin) = setup();
        let token = issuer.issue(Role::Patient, &Uuid::new_v4().to_string()).unwrap();
        let header = format!("Bearer {token}");
        assert!(matches!(
            authenticate(&conn, &issuer, &admin, Role::Patient, Some(&header)),
            Err(AuthError::PrincipalNotFound)
        ));
    }

    #[test]
    fn missing_or_malformed_header() {
        let (conn, issuer, admin) = setup();
        assert!(matches!(
            authenticate(&conn, &issuer, &admin, Role::Doctor, None),
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(
            authenticate(&conn, &issuer, &admin, Role::Doctor, Some("Token abc")),
            Err(AuthError::Unauthorized)
        ));
    }
}
