//! Admin session gate for privileged dashboard views.
//!
//! A tab-scoped [`SessionStore`] carries two string values written by the
//! login step. [`check_admin`] only confirms they are present. This is a
//! client-side convenience and grants nothing: every privileged request is
//! authorized again by the server.

use std::collections::HashMap;
use std::sync::RwLock;

/// Session key holding the admin flag.
pub const KEY_IS_ADMIN: &str = "isAdmin";
/// Session key holding the signed-in admin's email.
pub const KEY_ADMIN_EMAIL: &str = "adminEmail";

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "admin-login.html";

/// Notice shown before redirecting to the login page.
pub const LOGIN_REQUIRED_NOTICE: &str = "Please login as admin";

/// Default admin allowlist used when none is configured.
pub const DEFAULT_ADMIN_EMAILS: &[&str] = &["admin@campus.com", "admin@example.com"];

/// Tab-scoped string storage (browser session storage or equivalent).
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-process session storage, lost when the owner is dropped.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.write() {
            values.remove(key);
        }
    }
}

/// The admin identity found in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub email: String,
}

/// Outcome of the gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Granted(AdminSession),
    Redirect {
        notice: &'static str,
        to: &'static str,
    },
}

fn login_redirect() -> Gate {
    Gate::Redirect {
        notice: LOGIN_REQUIRED_NOTICE,
        to: LOGIN_PATH,
    }
}

/// Confirm the session carries both admin values before rendering.
pub fn check_admin(store: &dyn SessionStore) -> Gate {
    let flag = store.get(KEY_IS_ADMIN).filter(|v| !v.is_empty());
    let email = store.get(KEY_ADMIN_EMAIL).filter(|v| !v.is_empty());

    match (flag, email) {
        (Some(_), Some(email)) => {
            tracing::debug!(admin_email = %email, "Admin session present");
            Gate::Granted(AdminSession { email })
        }
        _ => {
            tracing::info!("No admin session, redirecting to login");
            login_redirect()
        }
    }
}

/// Record a successful admin login in the session.
pub fn sign_in(store: &dyn SessionStore, email: &str) {
    store.set(KEY_IS_ADMIN, "true");
    store.set(KEY_ADMIN_EMAIL, email);
}

/// Clear the admin session and return the login redirect.
pub fn sign_out(store: &dyn SessionStore) -> Gate {
    store.remove(KEY_IS_ADMIN);
    store.remove(KEY_ADMIN_EMAIL);
    login_redirect()
}

/// Case-insensitive membership test against an admin allowlist.
pub fn is_admin_email<S: AsRef<str>>(allowlist: &[S], email: &str) -> bool {
    let email = email.trim();
    allowlist
        .iter()
        .any(|candidate| candidate.as_ref().eq_ignore_ascii_case(email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn empty_session_redirects() {
        let store = MemorySessionStore::new();
        assert_matches!(
            check_admin(&store),
            Gate::Redirect { to: LOGIN_PATH, .. }
        );
    }

    #[test]
    fn flag_without_email_redirects() {
        let store = MemorySessionStore::new();
        store.set(KEY_IS_ADMIN, "true");
        assert_matches!(check_admin(&store), Gate::Redirect { .. });
    }

    #[test]
    fn sign_in_grants_and_sign_out_revokes() {
        let store = MemorySessionStore::new();
        sign_in(&store, "admin@campus.com");
        assert_eq!(
            check_admin(&store),
            Gate::Granted(AdminSession {
                email: "admin@campus.com".into()
            })
        );

        assert_matches!(sign_out(&store), Gate::Redirect { .. });
        assert!(store.get(KEY_IS_ADMIN).is_none());
        assert!(store.get(KEY_ADMIN_EMAIL).is_none());
        assert_matches!(check_admin(&store), Gate::Redirect { .. });
    }

    #[test]
    fn allowlist_is_case_insensitive() {
        assert!(is_admin_email(DEFAULT_ADMIN_EMAILS, "Admin@Campus.com"));
        assert!(!is_admin_email(DEFAULT_ADMIN_EMAILS, "student@campus.com"));
    }
}
