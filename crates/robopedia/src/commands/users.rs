use crate::auth::verify_password;
use crate::model::{User, UserStatus};
use crate::store::cache::EntityStore;
use crate::store::StorageBackend;
use chrono::Utc;
use tracing::{debug, warn};

/// Checks an email/password pair. On success the user's `lastLogin` is updated
/// and the refreshed record returned.
///
/// Unknown emails, wrong passwords and inactive accounts all yield `None` without
/// saying which check failed.
pub fn authenticate<B: StorageBackend>(
    store: &mut EntityStore<User>,
    backend: &B,
    email: &str,
    password: &str,
) -> Option<User> {
    let email = email.trim().to_lowercase();
    let mut user = store.get_by_key(backend, &email)?;

    if !verify_password(&user.password, password) {
        debug!("Rejected login for {}: wrong password", email);
        return None;
    }
    if user.status != UserStatus::Active {
        debug!("Rejected login for {}: account is {:?}", email, user.status);
        return None;
    }

    user.last_login = Some(Utc::now());
    store.replace(backend, user.clone());
    if !store.flush(backend) {
        warn!("Login time of {} could not be saved", email);
    }
    Some(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{create, update};
    use crate::model::UserPatch;
    use crate::store::mem_backend::MemBackend;
    use crate::test_utils::user_draft;

    fn setup() -> (MemBackend, EntityStore<User>, String) {
        let backend = MemBackend::new();
        let mut store = EntityStore::<User>::new(Vec::new());
        let id = create::run(&mut store, &backend, user_draft("ada@example.com"))
            .unwrap()
            .affected
            .remove(0)
            .id;
        (backend, store, id)
    }

    #[test]
    fn correct_password_logs_in() {
        let (backend, mut store, _) = setup();
        let user = authenticate(&mut store, &backend, " ADA@example.com", "secret").unwrap();
        assert!(user.last_login.is_some());
    }

    #[test]
    fn wrong_password_or_unknown_email_fails() {
        let (backend, mut store, _) = setup();
        assert!(authenticate(&mut store, &backend, "ada@example.com", "nope").is_none());
        assert!(authenticate(&mut store, &backend, "bob@example.com", "secret").is_none());
    }

    #[test]
    fn inactive_users_cannot_log_in() {
        let (backend, mut store, id) = setup();
        let patch = UserPatch {
            status: Some(UserStatus::Inactive),
            ..Default::default()
        };
        update::run(&mut store, &backend, &id, patch).unwrap();
        assert!(authenticate(&mut store, &backend, "ada@example.com", "secret").is_none());
    }

    #[test]
    fn login_survives_failed_save() {
        let (backend, mut store, _) = setup();
        backend.set_simulate_write_error(true);
        assert!(authenticate(&mut store, &backend, "ada@example.com", "secret").is_some());
    }
}
