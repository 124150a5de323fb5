//! Code lifecycle: submit, view, list and delete generated QR codes
//!
//! A submission moves through validation, the gateway call and persistence.
//! Nothing is written unless the gateway produced an image, so a failed
//! submission never leaves a partial record behind.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ServiceError, ServiceResult},
    gateway::{GatewayError, QrGateway},
    models::{GeneratedCode, ImagePayload, NewCode, Session},
    repositories::{CodeStore, UserStore},
    validation::validate_source_url,
};

/// Code lifecycle service
#[derive(Clone)]
pub struct CodeService {
    codes: Arc<dyn CodeStore>,
    users: Arc<dyn UserStore>,
    gateway: Arc<dyn QrGateway>,
    gateway_deadline: Duration,
}

impl CodeService {
    pub fn new(
        codes: Arc<dyn CodeStore>,
        users: Arc<dyn UserStore>,
        gateway: Arc<dyn QrGateway>,
        gateway_deadline: Duration,
    ) -> Self {
        Self {
            codes,
            users,
            gateway,
            gateway_deadline,
        }
    }

    /// Generate and store a QR code for `source_url`, owned by the session's user
    pub async fn submit(
        &self,
        session: Option<&Session>,
        source_url: &str,
    ) -> ServiceResult<GeneratedCode> {
        let session = session.ok_or(ServiceError::AuthRequired)?;
        let owner = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or(ServiceError::AuthRequired)?;

        let source_url = validate_source_url(source_url).map_err(ServiceError::Validation)?;

        let image_payload = self.call_gateway(&source_url).await.map_err(|e| {
            warn!(user_id = %owner.id, "QR generation failed: {}", e);
            ServiceError::GenerationFailed(e)
        })?;

        let code = self
            .codes
            .create_code(NewCode {
                owner_id: owner.id,
                source_url,
                image_payload,
            })
            .await?;

        info!(code_id = %code.id, user_id = %owner.id, "QR code saved");
        Ok(code)
    }

    /// Run the gateway on its own task under the configured deadline
    async fn call_gateway(&self, source_url: &str) -> Result<ImagePayload, GatewayError> {
        let gateway = Arc::clone(&self.gateway);
        let url = source_url.to_string();
        let mut task = tokio::spawn(async move { gateway.generate(&url).await });

        match tokio::time::timeout(self.gateway_deadline, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(GatewayError::Aborted(join_err.to_string())),
            Err(_) => {
                task.abort();
                Err(GatewayError::Timeout)
            }
        }
    }

    /// Fetch a code by id
    ///
    /// Results are viewable by anyone holding the id, signed in or not.
    pub async fn get(
        &self,
        _session: Option<&Session>,
        code_id: Uuid,
    ) -> ServiceResult<GeneratedCode> {
        self.codes
            .find_by_id(code_id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Codes owned by the session's user, oldest first
    pub async fn list_mine(&self, session: Option<&Session>) -> ServiceResult<Vec<GeneratedCode>> {
        let session = session.ok_or(ServiceError::AuthRequired)?;
        Ok(self.codes.list_by_owner(session.user_id).await?)
    }

    /// Delete a code owned by the session's user
    ///
    /// Codes belonging to someone else are reported as missing and left alone.
    pub async fn delete(&self, session: Option<&Session>, code_id: Uuid) -> ServiceResult<()> {
        let session = session.ok_or(ServiceError::AuthRequired)?;

        let code = self
            .codes
            .find_by_id(code_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if code.owner_id != session.user_id {
            warn!(
                code_id = %code_id,
                user_id = %session.user_id,
                "Refused to delete a code owned by another user"
            );
            return Err(ServiceError::NotFound);
        }

        if !self.codes.delete_by_id(code_id).await? {
            return Err(ServiceError::NotFound);
        }

        info!(code_id = %code_id, user_id = %session.user_id, "QR code deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{NewUser, SessionToken},
        repositories::{MemoryCodeStore, MemoryUserStore},
    };
    use async_trait::async_trait;
    use chrono::Utc;

    enum Behaviour {
        Png,
        Status(u16),
        Hang,
        Panic,
    }

    struct StubGateway(Behaviour);

    #[async_trait]
    impl QrGateway for StubGateway {
        async fn generate(&self, _source_url: &str) -> Result<ImagePayload, GatewayError> {
            match &self.0 {
                Behaviour::Png => Ok(ImagePayload::encode("image/png", b"\x89PNG")),
                Behaviour::Status(code) => Err(GatewayError::Status(*code)),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(GatewayError::Timeout)
                }
                Behaviour::Panic => panic!("gateway blew up"),
            }
        }
    }

    struct Fixture {
        service: CodeService,
        codes: MemoryCodeStore,
        users: MemoryUserStore,
    }

    fn fixture(behaviour: Behaviour) -> Fixture {
        let codes = MemoryCodeStore::new();
        let users = MemoryUserStore::new();
        let service = CodeService::new(
            Arc::new(codes.clone()),
            Arc::new(users.clone()),
            Arc::new(StubGateway(behaviour)),
            Duration::from_millis(200),
        );
        Fixture {
            service,
            codes,
            users,
        }
    }

    async fn session_for(users: &MemoryUserStore, username: &str) -> Session {
        let user = users
            .create_user(&NewUser {
                username: username.to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        Session {
            token: SessionToken::generate(),
            user_id: user.id,
            expires_at: Utc::now() + chrono::Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn test_submit_then_get_round_trip() {
        let f = fixture(Behaviour::Png);
        let session = session_for(&f.users, "alice").await;

        let code = f
            .service
            .submit(Some(&session), "https://example.com")
            .await
            .unwrap();
        assert_eq!(code.owner_id, session.user_id);

        let fetched = f.service.get(None, code.id).await.unwrap();
        assert_eq!(fetched.source_url, "https://example.com");
        assert!(!fetched.image_payload.is_empty());
    }

    #[tokio::test]
    async fn test_submit_without_session_persists_nothing() {
        let f = fixture(Behaviour::Png);
        let err = f
            .service
            .submit(None, "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AuthRequired));
        assert!(f.codes.is_empty().await);
    }

    #[tokio::test]
    async fn test_submit_rejects_bad_urls() {
        let f = fixture(Behaviour::Png);
        let session = session_for(&f.users, "alice").await;

        for url in ["", "   ", "invalid-url"] {
            let err = f.service.submit(Some(&session), url).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{url:?}");
        }
        assert!(f.codes.is_empty().await);
    }

    #[tokio::test]
    async fn test_gateway_error_persists_nothing() {
        let f = fixture(Behaviour::Status(500));
        let session = session_for(&f.users, "alice").await;

        let err = f
            .service
            .submit(Some(&session), "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::GenerationFailed(GatewayError::Status(500))
        ));
        assert!(f.codes.is_empty().await);
    }

    #[tokio::test]
    async fn test_hanging_gateway_hits_deadline() {
        let f = fixture(Behaviour::Hang);
        let session = session_for(&f.users, "alice").await;

        let err = f
            .service
            .submit(Some(&session), "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::GenerationFailed(GatewayError::Timeout)
        ));
        assert!(f.codes.is_empty().await);
    }

    #[tokio::test]
    async fn test_panicking_gateway_is_contained() {
        let f = fixture(Behaviour::Panic);
        let session = session_for(&f.users, "alice").await;

        let err = f
            .service
            .submit(Some(&session), "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::GenerationFailed(GatewayError::Aborted(_))
        ));
        assert!(f.codes.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_mine_is_scoped_to_owner() {
        let f = fixture(Behaviour::Png);
        let alice = session_for(&f.users, "alice").await;
        let bob = session_for(&f.users, "bob").await;

        f.service
            .submit(Some(&alice), "https://alice.example")
            .await
            .unwrap();
        f.service
            .submit(Some(&bob), "https://bob.example")
            .await
            .unwrap();

        let mine = f.service.list_mine(Some(&alice)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert!(mine.iter().all(|c| c.owner_id == alice.user_id));

        assert!(matches!(
            f.service.list_mine(None).await,
            Err(ServiceError::AuthRequired)
        ));
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let f = fixture(Behaviour::Png);
        assert!(matches!(
            f.service.get(None, Uuid::new_v4()).await,
            Err(ServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_enforces_ownership() {
        let f = fixture(Behaviour::Png);
        let alice = session_for(&f.users, "alice").await;
        let bob = session_for(&f.users, "bob").await;

        let code = f
            .service
            .submit(Some(&alice), "https://example.com")
            .await
            .unwrap();

        assert!(matches!(
            f.service.delete(Some(&bob), code.id).await,
            Err(ServiceError::NotFound)
        ));
        assert_eq!(f.codes.len().await, 1);

        assert!(matches!(
            f.service.delete(None, code.id).await,
            Err(ServiceError::AuthRequired)
        ));

        f.service.delete(Some(&alice), code.id).await.unwrap();
        assert!(f.codes.is_empty().await);

        assert!(matches!(
            f.service.delete(Some(&alice), code.id).await,
            Err(ServiceError::NotFound)
        ));
    }
}
