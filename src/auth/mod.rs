//! Session/Auth gate
//!
//! Checks an account number and password against a read-only profile
//! directory and hands back an authenticated session.
//! Comparison is plaintext over static demo data.

use crate::error::AssistantError;
use crate::models::{Session, UserProfile};
use crate::Result;
use std::collections::HashMap;
use tracing::{info, warn};

/// Read-only profile lookup
pub trait ProfileDirectory: Send + Sync {
    fn lookup(&self, account_id: &str) -> Option<UserProfile>;
}

/// In-memory directory with separate student and professional tables.
/// Students are looked up first.
pub struct StaticDirectory {
    students: HashMap<String, UserProfile>,
    professionals: HashMap<String, UserProfile>,
}

impl StaticDirectory {
    pub fn new(students: Vec<UserProfile>, professionals: Vec<UserProfile>) -> Self {
        Self {
            students: students
                .into_iter()
                .map(|p| (p.account_id.clone(), p))
                .collect(),
            professionals: professionals
                .into_iter()
                .map(|p| (p.account_id.clone(), p))
                .collect(),
        }
    }

    /// Demo accounts for both front-ends.
    pub fn demo() -> Self {
        Self::new(
            vec![
                UserProfile::student("STU001", "student123", "Aarav Sharma", 15000.0),
                UserProfile::student("STU002", "student456", "Meera Iyer", 8200.0),
                UserProfile::student("STU123", "stu@123", "Student Demo", 12000.0),
            ],
            vec![
                UserProfile::professional("PRO001", "pro123", "Rohan Mehta", 150000.0, 75000.0),
                UserProfile::professional("PRO002", "pro456", "Kavya Nair", 240000.0, 120000.0),
                UserProfile::professional("PRO456", "pro@456", "Professional Demo", 90000.0, 55000.0),
            ],
        )
    }

    pub fn len(&self) -> usize {
        self.students.len() + self.professionals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StaticDirectory {
    fn default() -> Self {
        Self::demo()
    }
}

impl ProfileDirectory for StaticDirectory {
    fn lookup(&self, account_id: &str) -> Option<UserProfile> {
        self.students
            .get(account_id)
            .or_else(|| self.professionals.get(account_id))
            .cloned()
    }
}

/// Validate credentials and build a fresh authenticated session.
///
/// Unknown accounts and wrong passwords fail identically.
pub fn authenticate(
    directory: &dyn ProfileDirectory,
    account_id: &str,
    password: &str,
) -> Result<Session> {
    match directory.lookup(account_id) {
        Some(profile) if profile.password == password => {
            info!(role = %profile.role, "Login succeeded");
            Ok(Session::authenticated(profile))
        }
        _ => {
            warn!("Login rejected");
            Err(AssistantError::InvalidCredentials)
        }
    }
}

impl Session {
    /// Replace this session with an authenticated one. On failure the
    /// session is left exactly as it was.
    pub fn login(
        &mut self,
        directory: &dyn ProfileDirectory,
        account_id: &str,
        password: &str,
    ) -> Result<()> {
        *self = authenticate(directory, account_id, password)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::INVALID_CREDENTIALS_MESSAGE;
    use crate::models::{Role, SessionState};

    #[test]
    fn test_student_login_binds_profile() {
        let directory = StaticDirectory::demo();
        let session = authenticate(&directory, "STU001", "student123").unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.role(), Some(Role::Student));
        assert_eq!(session.profile().unwrap().balance, 15000.0);
    }

    #[test]
    fn test_professional_login_has_salary() {
        let directory = StaticDirectory::demo();
        let session = authenticate(&directory, "PRO001", "pro123").unwrap();

        assert_eq!(session.role(), Some(Role::Professional));
        assert_eq!(session.profile().unwrap().salary, Some(75000.0));
    }

    #[test]
    fn test_wrong_password_leaves_session_unchanged() {
        let directory = StaticDirectory::demo();
        let mut session = Session::new();

        let err = session.login(&directory, "STU001", "wrong").unwrap_err();
        assert_eq!(err.to_string(), INVALID_CREDENTIALS_MESSAGE);
        assert_eq!(session, Session::new());

        session.login(&directory, "PRO001", "pro123").unwrap();
        let before = session.clone();
        assert!(session.login(&directory, "PRO001", "nope").is_err());
        assert_eq!(session, before);
    }

    #[test]
    fn test_every_failure_uses_the_same_error() {
        let directory = StaticDirectory::demo();
        let attempts = [
            ("STU001", "wrong"),
            ("NOPE99", "student123"),
            ("", ""),
            ("stu001", "student123"),
            (" STU001", "student123"),
            ("STU001", "student123 "),
            ("STU001", "STUDENT123"),
        ];

        for (id, pwd) in attempts {
            let err = authenticate(&directory, id, pwd).unwrap_err();
            assert!(matches!(err, AssistantError::InvalidCredentials));
            assert_eq!(err.to_string(), INVALID_CREDENTIALS_MESSAGE);
        }
    }

    #[test]
    fn test_student_table_takes_precedence() {
        let directory = StaticDirectory::new(
            vec![UserProfile::student("DUP1", "s", "Student", 100.0)],
            vec![UserProfile::professional("DUP1", "p", "Pro", 200.0, 50.0)],
        );

        let session = authenticate(&directory, "DUP1", "s").unwrap();
        assert_eq!(session.role(), Some(Role::Student));
        // The professional row is shadowed entirely.
        assert!(authenticate(&directory, "DUP1", "p").is_err());
    }

    #[test]
    fn test_logged_out_session_can_log_in_again() {
        let directory = StaticDirectory::demo();
        let mut session = authenticate(&directory, "STU123", "stu@123").unwrap();
        session.logout();
        assert_eq!(session.state(), SessionState::LoggedOut);

        session.login(&directory, "PRO456", "pro@456").unwrap();
        assert_eq!(session.role(), Some(Role::Professional));
    }

    #[test]
    fn test_demo_directory_size() {
        let directory = StaticDirectory::demo();
        assert_eq!(directory.len(), 6);
        assert!(!directory.is_empty());
    }
}
