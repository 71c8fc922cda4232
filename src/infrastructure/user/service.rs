//! Account registration, activation and login

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{error, info};

use super::password::PasswordHasher;
use crate::domain::permission::MOVIES_READ;
use crate::domain::token::validate_token_plaintext;
use crate::domain::user::{validate_email, validate_password_plaintext, validate_user};
use crate::domain::{
    DomainError, IssuedToken, NewUser, PermissionRepository, Scope, User, UserRepository,
    Validator,
};
use crate::infrastructure::background::BackgroundTasks;
use crate::infrastructure::concurrency::ConcurrencyGuard;
use crate::infrastructure::mailer::{Mailer, USER_WELCOME_TEMPLATE};
use crate::infrastructure::storage::{with_deadline, DEFAULT_STORE_TIMEOUT};
use crate::infrastructure::token::TokenAuthenticator;

/// Lifetimes of the tokens handed out by the user service
#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    pub activation: chrono::Duration,
    pub authentication: chrono::Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            activation: chrono::Duration::days(3),
            authentication: chrono::Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    permissions: Arc<dyn PermissionRepository>,
    authenticator: TokenAuthenticator,
    guard: ConcurrencyGuard,
    hasher: Arc<dyn PasswordHasher>,
    mailer: Arc<dyn Mailer>,
    background: BackgroundTasks,
    ttls: TokenTtls,
    store_timeout: Duration,
}

impl UserService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserRepository>,
        permissions: Arc<dyn PermissionRepository>,
        authenticator: TokenAuthenticator,
        guard: ConcurrencyGuard,
        hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn Mailer>,
        background: BackgroundTasks,
        ttls: TokenTtls,
    ) -> Self {
        Self {
            users,
            permissions,
            authenticator,
            guard,
            hasher,
            mailer,
            background,
            ttls,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Create an inactive account and mail it an activation token
    ///
    /// New accounts are granted `movies:read`. The mail goes out in a
    /// background task; a delivery failure is logged and does not fail the
    /// registration.
    pub async fn register(&self, request: RegisterUserRequest) -> Result<User, DomainError> {
        let mut v = Validator::new();
        validate_user(&mut v, &request.name, &request.email, &request.password);
        v.into_result()?;

        let password_hash = self.hasher.hash(&request.password)?;

        let user = with_deadline(
            self.store_timeout,
            "insert_user",
            self.users.insert(NewUser {
                name: request.name,
                email: request.email,
                password_hash,
            }),
        )
        .await?;

        with_deadline(
            self.store_timeout,
            "add_permissions",
            self.permissions
                .add_for_user(user.id(), vec![MOVIES_READ.to_string()]),
        )
        .await?;

        let token = self
            .authenticator
            .issue(user.id(), self.ttls.activation, Scope::Activation)
            .await?;

        let mailer = self.mailer.clone();
        let recipient = user.email().to_string();
        let data = json!({
            "activationToken": token.plaintext(),
            "userID": user.id(),
        });
        self.background
            .spawn(async move {
                if let Err(e) = mailer.send(&recipient, USER_WELCOME_TEMPLATE, data).await {
                    error!(error = %e, "Failed to send welcome mail");
                }
            })
            .await;

        info!(user_id = %user.id(), "Registered user");
        Ok(user)
    }

    /// Activate the account owning an activation token
    ///
    /// Every activation token of that account is revoked afterwards.
    pub async fn activate(&self, token_plaintext: &str) -> Result<User, DomainError> {
        let mut v = Validator::new();
        validate_token_plaintext(&mut v, token_plaintext);
        v.into_result()?;

        let mut user = self
            .authenticator
            .authenticate(token_plaintext, Scope::Activation)
            .await
            .map_err(|e| match e {
                DomainError::InvalidCredential => {
                    DomainError::invalid_field("token", "invalid or expired activation token")
                }
                other => other,
            })?;

        let expected = user.version();
        user.activate();
        self.guard
            .commit_if_version_matches(&*self.users, &mut user, expected)
            .await?;

        self.authenticator
            .invalidate(user.id(), Scope::Activation)
            .await?;

        info!(user_id = %user.id(), "Activated user");
        Ok(user)
    }

    /// Exchange email and password for an authentication token
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, DomainError> {
        let mut v = Validator::new();
        validate_email(&mut v, email);
        validate_password_plaintext(&mut v, password);
        v.into_result()?;

        let user = with_deadline(self.store_timeout, "get_user_by_email", self.users.get_by_email(email))
            .await?
            .ok_or(DomainError::InvalidCredential)?;

        if !self.hasher.verify(password, user.password_hash()) {
            return Err(DomainError::InvalidCredential);
        }

        self.authenticator
            .issue(user.id(), self.ttls.authentication, Scope::Authentication)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ManualClock;
    use crate::infrastructure::mailer::tests::RecordingMailer;
    use crate::infrastructure::storage::{InMemoryStore, Repositories};
    use crate::infrastructure::user::Argon2Hasher;

    struct Fixture {
        service: UserService,
        repos: Repositories,
        mailer: RecordingMailer,
        background: BackgroundTasks,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::default());
        let repos = Repositories::in_memory(InMemoryStore::new(clock.clone()));
        let authenticator = TokenAuthenticator::new(repos.users.clone(), repos.tokens.clone(), clock);
        let mailer = RecordingMailer::default();
        let background = BackgroundTasks::new();

        let service = UserService::new(
            repos.users.clone(),
            repos.permissions.clone(),
            authenticator,
            ConcurrencyGuard::default(),
            Arc::new(Argon2Hasher::new()),
            Arc::new(mailer.clone()),
            background.clone(),
            TokenTtls::default(),
        );

        Fixture {
            service,
            repos,
            mailer,
            background,
        }
    }

    fn alice() -> RegisterUserRequest {
        RegisterUserRequest {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password: "pa55word".into(),
        }
    }

    async fn activation_token(f: &Fixture) -> String {
        f.background.wait().await;
        let sent = f.mailer.sent.lock().await;
        let (_, template, data) = sent.last().unwrap();
        assert_eq!(template, USER_WELCOME_TEMPLATE);
        data["activationToken"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_register_grants_read_and_mails_token() {
        let f = fixture();
        let user = f.service.register(alice()).await.unwrap();

        assert!(!user.is_activated());
        let perms = f.repos.permissions.get_all_for_user(user.id()).await.unwrap();
        assert!(perms.includes(MOVIES_READ));

        let token = activation_token(&f).await;
        assert_eq!(token.len(), 26);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let f = fixture();
        let result = f
            .service
            .register(RegisterUserRequest {
                name: String::new(),
                email: "bad".into(),
                password: "pa55word".into(),
            })
            .await;

        match result {
            Err(DomainError::Validation { errors }) => {
                assert!(errors.contains_key("name"));
                assert!(errors.contains_key("email"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let f = fixture();
        f.service.register(alice()).await.unwrap();

        let result = f.service.register(alice()).await;
        assert!(matches!(result, Err(DomainError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_activate_is_single_use() {
        let f = fixture();
        f.service.register(alice()).await.unwrap();
        let token = activation_token(&f).await;

        let user = f.service.activate(&token).await.unwrap();
        assert!(user.is_activated());
        assert_eq!(user.version(), 2);

        match f.service.activate(&token).await {
            Err(DomainError::Validation { errors }) => {
                assert_eq!(
                    errors.get("token").map(String::as_str),
                    Some("invalid or expired activation token")
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login() {
        let f = fixture();
        let user = f.service.register(alice()).await.unwrap();

        let token = f.service.login("alice@example.com", "pa55word").await.unwrap();
        assert_eq!(token.record().user_id, user.id());
        assert_eq!(token.record().scope, Scope::Authentication);
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let f = fixture();
        f.service.register(alice()).await.unwrap();

        let wrong_password = f.service.login("alice@example.com", "wrong-pass").await.unwrap_err();
        let unknown_email = f.service.login("bob@example.com", "pa55word").await.unwrap_err();

        assert!(matches!(wrong_password, DomainError::InvalidCredential));
        assert!(matches!(unknown_email, DomainError::InvalidCredential));
    }
}
