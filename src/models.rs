//! Core data models for the finance assistant

use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Role =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Professional,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Professional => "professional",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Student => "Student",
            Role::Professional => "Professional",
        };
        write!(f, "{}", s)
    }
}

//
// ================= Profile =================
//

/// Static account record. Loaded once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub account_id: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub display_name: String,
    pub role: Role,
    pub balance: f64,
    /// Monthly salary; professionals only.
    pub salary: Option<f64>,
}

impl UserProfile {
    pub fn student(account_id: &str, password: &str, display_name: &str, balance: f64) -> Self {
        Self {
            account_id: account_id.to_string(),
            password: password.to_string(),
            display_name: display_name.to_string(),
            role: Role::Student,
            balance,
            salary: None,
        }
    }

    pub fn professional(
        account_id: &str,
        password: &str,
        display_name: &str,
        balance: f64,
        salary: f64,
    ) -> Self {
        Self {
            account_id: account_id.to_string(),
            password: password.to_string(),
            display_name: display_name.to_string(),
            role: Role::Professional,
            balance,
            salary: Some(salary),
        }
    }

    /// Monthly amount the templates budget against: salary for
    /// professionals, a tenth of the balance for students.
    pub fn monthly_basis(&self) -> f64 {
        match (self.role, self.salary) {
            (Role::Professional, Some(salary)) => salary,
            _ => self.balance / 10.0,
        }
    }
}

//
// ================= Session =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Anonymous,
    Authenticated,
    LoggedOut,
}

/// One user's login state. `Authenticated` always carries a profile whose
/// role and account id match the session's own fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    state: SessionState,
    role: Option<Role>,
    account_id: Option<String>,
    profile: Option<UserProfile>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Anonymous,
            role: None,
            account_id: None,
            profile: None,
        }
    }

    pub(crate) fn authenticated(profile: UserProfile) -> Self {
        Self {
            state: SessionState::Authenticated,
            role: Some(profile.role),
            account_id: Some(profile.account_id.clone()),
            profile: Some(profile),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn logout(&mut self) {
        self.state = SessionState::LoggedOut;
        self.role = None;
        self.account_id = None;
        self.profile = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_anonymous() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.profile().is_none());
        assert!(session.role().is_none());
    }

    #[test]
    fn test_authenticated_session_binds_profile() {
        let profile = UserProfile::professional("PRO001", "pro123", "Rohan", 150000.0, 75000.0);
        let session = Session::authenticated(profile);

        assert!(session.is_authenticated());
        assert_eq!(session.role(), Some(Role::Professional));
        assert_eq!(session.account_id(), Some("PRO001"));
        assert_eq!(session.profile().map(|p| p.role), session.role());
    }

    #[test]
    fn test_logout_clears_everything() {
        let profile = UserProfile::student("STU001", "student123", "Aarav", 15000.0);
        let mut session = Session::authenticated(profile);
        session.logout();

        assert_eq!(session.state(), SessionState::LoggedOut);
        assert!(session.profile().is_none());
        assert!(session.account_id().is_none());
    }

    #[test]
    fn test_monthly_basis_by_role() {
        let student = UserProfile::student("S", "p", "S", 15000.0);
        let pro = UserProfile::professional("P", "p", "P", 150000.0, 75000.0);
        assert_eq!(student.monthly_basis(), 1500.0);
        assert_eq!(pro.monthly_basis(), 75000.0);
    }

    #[test]
    fn test_profile_serialization_omits_password() {
        let profile = UserProfile::student("STU001", "student123", "Aarav", 15000.0);
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("student123"));
        assert!(json.contains("\"role\":\"student\""));
    }
}
