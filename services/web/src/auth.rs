//! Account registration, login and session handling

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use std::sync::{Arc, OnceLock};
use tracing::{error, info, warn};

use crate::{
    error::{ServiceError, ServiceResult},
    models::{NewUser, Session, SessionToken, User},
    rate_limiter::RateLimiter,
    repositories::UserStore,
    session::SessionStore,
    validation::{validate_password, validate_username},
};

fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, password_hash: &str) -> ServiceResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| ServiceError::Internal(format!("Failed to parse password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Hash verified when the username is unknown, so both failure paths cost the same
fn dummy_hash() -> &'static str {
    DUMMY_HASH.get_or_init(|| {
        hash_password("not-a-real-password").unwrap_or_else(|e| {
            error!("Failed to build dummy hash: {}", e);
            String::new()
        })
    })
}

/// Run password hashing off the async workers
async fn blocking<T, F>(f: F) -> ServiceResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Internal(format!("Password task failed: {}", e)))?
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    rate_limiter: RateLimiter,
    dummy_hash: &'static str,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            users,
            sessions,
            rate_limiter,
            dummy_hash: dummy_hash(),
        }
    }

    /// Create an account with a freshly salted password hash
    pub async fn register(&self, username: &str, raw_password: &str) -> ServiceResult<User> {
        let username = username.trim();
        validate_username(username).map_err(ServiceError::Validation)?;
        validate_password(raw_password).map_err(ServiceError::Validation)?;

        let password = raw_password.to_string();
        let password_hash = blocking(move || hash_password(&password)).await?;

        let new_user = NewUser {
            username: username.to_string(),
            password_hash,
        };

        match self.users.create_user(&new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, "Registered user {}", user.username);
                Ok(user)
            }
            Err(e) if e.is_unique_violation() => {
                info!("Registration rejected, username taken: {}", username);
                Err(ServiceError::DuplicateUsername)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Verify credentials and open a session
    ///
    /// Unknown usernames and wrong passwords both yield
    /// [`ServiceError::InvalidCredentials`].
    pub async fn login(&self, username: &str, raw_password: &str) -> ServiceResult<Session> {
        let username = username.trim();
        let throttle_key = username.to_lowercase();

        if !self.rate_limiter.is_allowed(&throttle_key).await {
            warn!("Login throttled for {}", username);
            return Err(ServiceError::TooManyAttempts);
        }

        let user = self.users.find_by_username(username).await?;

        let password = raw_password.to_string();
        let stored_hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.to_string());
        let verified = blocking(move || verify_password(&password, &stored_hash)).await?;

        let user = match user {
            Some(user) if verified => user,
            _ => {
                self.rate_limiter.record_failure(&throttle_key).await;
                info!("Failed login for {}", username);
                return Err(ServiceError::InvalidCredentials);
            }
        };

        self.rate_limiter.reset(&throttle_key).await;
        let session = self.sessions.create(user.id).await?;
        info!(user_id = %user.id, "User logged in");

        Ok(session)
    }

    /// Destroy a session; calling it twice is harmless
    pub async fn logout(&self, session: &Session) -> ServiceResult<()> {
        self.sessions.destroy(&session.token).await?;
        info!(user_id = %session.user_id, "User logged out");
        Ok(())
    }

    /// Resolve a cookie token into a live session
    pub async fn resolve_session(&self, token: &SessionToken) -> ServiceResult<Option<Session>> {
        Ok(self.sessions.get(token).await?)
    }

    /// The user behind a session, if any
    pub async fn current_identity(&self, session: Option<&Session>) -> ServiceResult<Option<User>> {
        match session {
            Some(session) => Ok(self.users.find_by_id(session.user_id).await?),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rate_limiter::RateLimiterConfig, repositories::MemoryUserStore,
        session::MemorySessionStore,
    };
    use std::time::Duration;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemorySessionStore::new(Duration::from_secs(60))),
            RateLimiter::new(RateLimiterConfig {
                max_failures: 3,
                window: Duration::from_secs(60),
                lockout: Duration::from_secs(60),
            }),
        )
    }

    #[tokio::test]
    async fn test_register_twice_fails_with_duplicate() {
        let auth = service();
        let user = auth.register("alice", "pw123").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "pw123");
        assert!(user.password_hash.starts_with("$argon2"));

        let err = auth.register("alice", "other").await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateUsername));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let auth = service();
        assert!(matches!(
            auth.register("a b", "pw123").await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            auth.register("alice", "").await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_and_current_identity() {
        let auth = service();
        let user = auth.register("alice", "pw123").await.unwrap();

        let session = auth.login("alice", "pw123").await.unwrap();
        assert_eq!(session.user_id, user.id);

        let resolved = auth.resolve_session(&session.token).await.unwrap().unwrap();
        let identity = auth.current_identity(Some(&resolved)).await.unwrap().unwrap();
        assert_eq!(identity.username, "alice");

        assert!(auth.current_identity(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let auth = service();
        auth.register("alice", "pw123").await.unwrap();

        let wrong_password = auth.login("alice", "nope").await.unwrap_err();
        let unknown_user = auth.login("mallory", "pw123").await.unwrap_err();

        assert!(matches!(wrong_password, ServiceError::InvalidCredentials));
        assert!(matches!(unknown_user, ServiceError::InvalidCredentials));
        assert_eq!(wrong_password.user_message(), unknown_user.user_message());
    }

    #[test]
    fn test_dummy_hash_ready_after_construction() {
        let auth = service();
        assert!(DUMMY_HASH.get().is_some());
        assert!(auth.dummy_hash.starts_with("$argon2"));
        assert!(!verify_password("pw123", auth.dummy_hash).unwrap());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let auth = service();
        auth.register("alice", "pw123").await.unwrap();
        let session = auth.login("alice", "pw123").await.unwrap();

        auth.logout(&session).await.unwrap();
        auth.logout(&session).await.unwrap();
        assert!(auth.resolve_session(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_repeated_failures_throttle_login() {
        let auth = service();
        auth.register("alice", "pw123").await.unwrap();

        for _ in 0..3 {
            assert!(matches!(
                auth.login("alice", "wrong").await,
                Err(ServiceError::InvalidCredentials)
            ));
        }

        // Even the right password is refused while locked out
        assert!(matches!(
            auth.login("Alice", "pw123").await,
            Err(ServiceError::TooManyAttempts)
        ));
    }
}
