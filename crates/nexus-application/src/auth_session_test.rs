use super::*;
use async_trait::async_trait;
use nexus_core::ApiError;
use nexus_core::auth::TokenRefresh;
use nexus_core::user::Role;
use nexus_infrastructure::{FileCredentialStore, InMemoryCredentialStore};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

// Mock AuthApi returning scripted replies
#[derive(Default)]
struct MockAuthApi {
    auth: Mutex<Option<Result<AuthResponse>>>,
    refresh: Mutex<Option<Result<TokenRefresh>>>,
    profile: Mutex<Option<Result<UserProfile>>>,
    password: Mutex<Option<Result<()>>>,
    calls: AtomicUsize,
}

impl MockAuthApi {
    fn reply<T: Clone>(&self, slot: &Mutex<Option<Result<T>>>) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        slot.lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(NexusError::network("no scripted reply")))
    }

    fn script_auth(&self, reply: Result<AuthResponse>) {
        *self.auth.lock().unwrap() = Some(reply);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, _credentials: &LoginCredentials) -> Result<AuthResponse> {
        self.reply(&self.auth)
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<AuthResponse> {
        self.reply(&self.auth)
    }

    async fn refresh_token(&self, _refresh: &str) -> Result<TokenRefresh> {
        self.reply(&self.refresh)
    }

    async fn get_profile(&self) -> Result<UserProfile> {
        self.reply(&self.profile)
    }

    async fn update_profile(&self, _update: &ProfileUpdate) -> Result<UserProfile> {
        self.reply(&self.profile)
    }

    async fn change_password(&self, _payload: &PasswordChange) -> Result<()> {
        self.reply(&self.password)
    }
}

// Credential store that can be switched into a failing mode
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryCredentialStore,
    failing: AtomicBool,
    read_failure: Mutex<Option<NexusError>>,
}

impl FlakyStore {
    fn fail_reads(&self, err: Option<NexusError>) {
        *self.read_failure.lock().unwrap() = err;
    }

    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(NexusError::storage("disk full"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CredentialStore for FlakyStore {
    async fn read(&self, slot: CredentialSlot) -> Result<Option<String>> {
        if let Some(err) = self.read_failure.lock().unwrap().clone() {
            return Err(err);
        }
        self.inner.read(slot).await
    }

    async fn write(&self, slot: CredentialSlot, value: &str) -> Result<()> {
        self.check()?;
        self.inner.write(slot, value).await
    }

    async fn remove(&self, slot: CredentialSlot) -> Result<()> {
        self.check()?;
        self.inner.remove(slot).await
    }

    async fn write_all(&self, entries: &[(CredentialSlot, String)]) -> Result<()> {
        self.check()?;
        self.inner.write_all(entries).await
    }

    async fn clear_all(&self) -> Result<()> {
        self.check()?;
        self.inner.clear_all().await
    }
}

fn user(id: &str, first_name: &str) -> UserProfile {
    UserProfile {
        id: id.into(),
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        email: format!("{}@example.com", first_name.to_lowercase()),
        role: Role::Sales,
        username: None,
        is_active: Some(true),
        created_at: None,
    }
}

fn auth_response(id: &str, first_name: &str, token: &str) -> AuthResponse {
    AuthResponse {
        user: user(id, first_name),
        access: format!("access-{}", token),
        refresh: format!("refresh-{}", token),
    }
}

fn credentials() -> LoginCredentials {
    LoginCredentials::new("ada@example.com", "correct-horse")
}

struct Fixture {
    api: Arc<MockAuthApi>,
    store: Arc<FlakyStore>,
    tokens: TokenCell,
    session: AuthSession,
}

fn fixture() -> Fixture {
    let api = Arc::new(MockAuthApi::default());
    let store = Arc::new(FlakyStore::default());
    let tokens = TokenCell::new();
    let session = AuthSession::new(api.clone(), store.clone(), tokens.clone());
    Fixture {
        api,
        store,
        tokens,
        session,
    }
}

async fn logged_in() -> Fixture {
    let fx = fixture();
    fx.api.script_auth(Ok(auth_response("u1", "Ada", "1")));
    fx.session.login(&credentials()).await.unwrap();
    fx
}

#[tokio::test]
async fn test_login_populates_state_tokens_and_slots() {
    let fx = logged_in().await;

    let snapshot = fx.session.snapshot().await;
    assert!(snapshot.is_authenticated);
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.user.unwrap().first_name, "Ada");
    assert_eq!(fx.tokens.access().as_deref(), Some("access-1"));

    assert_eq!(fx.store.inner.len().await, 3);
    let persisted_user = fx.store.read(CredentialSlot::User).await.unwrap().unwrap();
    let persisted_user: UserProfile = serde_json::from_str(&persisted_user).unwrap();
    assert_eq!(persisted_user.id, "u1".into());
}

#[tokio::test]
async fn test_failed_login_keeps_prior_session() {
    let fx = logged_in().await;

    fx.api.script_auth(Err(NexusError::Api(ApiError::with_detail(
        Some(401),
        "Invalid credentials",
    ))));
    let err = fx.session.login(&credentials()).await.unwrap_err();
    assert!(err.is_api());

    let snapshot = fx.session.snapshot().await;
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.user.unwrap().first_name, "Ada");
    assert_eq!(snapshot.access_token.as_deref(), Some("access-1"));
    assert_eq!(snapshot.error.as_deref(), Some("Invalid credentials"));
    assert!(!snapshot.is_loading);
}

#[tokio::test]
async fn test_network_failure_uses_fallback_message() {
    let fx = fixture();
    fx.api.script_auth(Err(NexusError::network("connection refused")));

    assert!(fx.session.login(&credentials()).await.is_err());

    let snapshot = fx.session.snapshot().await;
    assert!(!snapshot.is_authenticated);
    assert_eq!(snapshot.error.as_deref(), Some(LOGIN_FAILED));
    assert!(fx.store.inner.is_empty().await);
}

#[tokio::test]
async fn test_invalid_credentials_never_reach_the_server() {
    let fx = fixture();

    let err = fx
        .session
        .login(&LoginCredentials::new("ada@example.com", ""))
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(fx.api.calls(), 0);
    assert_eq!(fx.session.error().await, None);
}

#[tokio::test]
async fn test_register_password_mismatch_is_local() {
    let fx = fixture();
    let request = RegisterRequest {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        password: "analytical".to_string(),
        password2: "analytica1".to_string(),
        username: None,
        role: None,
    };

    assert!(fx.session.register(&request).await.unwrap_err().is_validation());
    assert_eq!(fx.api.calls(), 0);
}

#[tokio::test]
async fn test_storage_failure_leaves_session_untouched() {
    let fx = fixture();
    fx.store.fail(true);
    fx.api.script_auth(Ok(auth_response("u1", "Ada", "1")));

    let err = fx.session.login(&credentials()).await.unwrap_err();
    assert!(matches!(err, NexusError::Storage(_)));

    let snapshot = fx.session.snapshot().await;
    assert!(!snapshot.is_authenticated);
    assert_eq!(snapshot.user, None);
    assert_eq!(fx.tokens.access(), None);
    assert_eq!(snapshot.error.as_deref(), Some(LOGIN_FAILED));
}

#[tokio::test]
async fn test_login_then_logout_clears_everything() {
    let fx = logged_in().await;

    fx.session.logout().await;

    let snapshot = fx.session.snapshot().await;
    assert!(!snapshot.is_authenticated);
    assert_eq!(snapshot.user, None);
    assert_eq!(snapshot.access_token, None);
    assert_eq!(snapshot.refresh_token, None);
    assert!(fx.store.inner.is_empty().await);
}

#[tokio::test]
async fn test_logout_is_idempotent_and_survives_storage_errors() {
    let fx = logged_in().await;

    fx.session.logout().await;
    fx.session.logout().await;
    assert!(!fx.session.is_authenticated().await);

    let fx = logged_in().await;
    fx.store.fail(true);
    fx.session.logout().await;
    assert!(!fx.session.is_authenticated().await);
    assert_eq!(fx.tokens.access(), None);
}

#[tokio::test]
async fn test_init_restores_complete_session() {
    let fx = logged_in().await;
    fx.session.dispose().await;
    assert!(!fx.session.is_authenticated().await);

    let snapshot = fx.session.init().await.unwrap();
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(fx.tokens.access().as_deref(), Some("access-1"));
}

#[tokio::test]
async fn test_init_with_partial_session_clears_fragments() {
    let fx = fixture();
    fx.store
        .write(CredentialSlot::AccessToken, "orphan-token")
        .await
        .unwrap();
    fx.store
        .write(CredentialSlot::RefreshToken, "orphan-refresh")
        .await
        .unwrap();

    let snapshot = fx.session.init().await.unwrap();
    assert!(!snapshot.is_authenticated);
    assert_eq!(snapshot.access_token, None);
    assert!(fx.store.inner.is_empty().await);
}

#[tokio::test]
async fn test_init_with_unreadable_user_clears_fragments() {
    let fx = fixture();
    fx.store
        .write(CredentialSlot::AccessToken, "token")
        .await
        .unwrap();
    fx.store.write(CredentialSlot::User, "{not json").await.unwrap();

    let snapshot = fx.session.init().await.unwrap();
    assert!(!snapshot.is_authenticated);
    assert!(fx.store.inner.is_empty().await);
}

#[tokio::test]
async fn test_init_with_unparseable_storage_starts_anonymous() {
    let fx = logged_in().await;
    fx.session.dispose().await;
    fx.store
        .fail_reads(Some(NexusError::serialization("TOML", "invalid array")));

    let snapshot = fx.session.init().await.unwrap();
    assert!(!snapshot.is_authenticated);
    assert!(fx.tokens.access().is_none());
    assert!(fx.store.inner.is_empty().await);
}

#[tokio::test]
async fn test_init_propagates_io_errors() {
    let fx = logged_in().await;
    fx.session.dispose().await;
    fx.store.fail_reads(Some(NexusError::io("permission denied")));

    let err = fx.session.init().await.unwrap_err();
    assert!(matches!(err, NexusError::Io { .. }));
    assert_eq!(fx.store.inner.len().await, 3);
}

#[tokio::test]
async fn test_init_recovers_from_corrupt_credentials_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("credentials.toml");
    std::fs::write(&path, "access_token = \"a1\"\nuser = [broken").unwrap();

    let store = Arc::new(FileCredentialStore::new(path.clone()));
    let session = AuthSession::new(Arc::new(MockAuthApi::default()), store, TokenCell::new());

    let snapshot = session.init().await.unwrap();
    assert!(!snapshot.is_authenticated);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_update_profile_replaces_user_only() {
    let fx = logged_in().await;
    *fx.api.profile.lock().unwrap() = Some(Ok(user("u1", "Augusta")));

    let updated = fx
        .session
        .update_profile(&ProfileUpdate {
            first_name: Some("Augusta".to_string()),
            ..ProfileUpdate::default()
        })
        .await
        .unwrap();

    assert_eq!(updated.first_name, "Augusta");
    assert_eq!(fx.session.user().await.unwrap().first_name, "Augusta");
    assert_eq!(fx.tokens.access().as_deref(), Some("access-1"));
    let persisted = fx.store.read(CredentialSlot::User).await.unwrap().unwrap();
    assert!(persisted.contains("Augusta"));
}

#[tokio::test]
async fn test_failed_profile_update_keeps_user() {
    let fx = logged_in().await;
    let mut rejection = ApiError::default();
    rejection
        .fields
        .insert("email".to_string(), vec!["Enter a valid email address.".to_string()]);
    *fx.api.profile.lock().unwrap() = Some(Err(NexusError::Api(rejection)));

    let result = fx
        .session
        .update_profile(&ProfileUpdate {
            email: Some("nope".to_string()),
            ..ProfileUpdate::default()
        })
        .await;

    assert!(result.is_err());
    assert_eq!(fx.session.user().await.unwrap().first_name, "Ada");
    assert_eq!(
        fx.session.error().await.as_deref(),
        Some("email: Enter a valid email address.")
    );
}

#[tokio::test]
async fn test_profile_update_requires_session() {
    let fx = fixture();
    let err = fx
        .session
        .update_profile(&ProfileUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, NexusError::NotAuthenticated));
    assert_eq!(fx.api.calls(), 0);
}

#[tokio::test]
async fn test_change_password_success_clears_error() {
    let fx = logged_in().await;
    *fx.api.password.lock().unwrap() = Some(Err(NexusError::network("timeout")));
    let payload = PasswordChange {
        current_password: "correct-horse".to_string(),
        new_password: "battery-staple".to_string(),
        confirm_password: "battery-staple".to_string(),
    };

    assert!(fx.session.change_password(&payload).await.is_err());
    assert_eq!(fx.session.error().await.as_deref(), Some(PASSWORD_CHANGE_FAILED));

    *fx.api.password.lock().unwrap() = Some(Ok(()));
    fx.session.change_password(&payload).await.unwrap();
    assert_eq!(fx.session.error().await, None);
    assert!(fx.session.is_authenticated().await);
}

#[tokio::test]
async fn test_refresh_persists_new_access_token() {
    let fx = logged_in().await;
    *fx.api.refresh.lock().unwrap() = Some(Ok(TokenRefresh {
        access: "access-2".to_string(),
        refresh: None,
    }));

    let access = fx.session.refresh_access_token().await.unwrap();
    assert_eq!(access, "access-2");
    assert_eq!(fx.tokens.access().as_deref(), Some("access-2"));
    assert_eq!(fx.tokens.refresh().as_deref(), Some("refresh-1"));
    assert_eq!(
        fx.store.read(CredentialSlot::AccessToken).await.unwrap().as_deref(),
        Some("access-2")
    );
}

#[tokio::test]
async fn test_rejected_refresh_ends_session() {
    let fx = logged_in().await;
    *fx.api.refresh.lock().unwrap() = Some(Err(NexusError::Api(ApiError::with_detail(
        Some(401),
        "Token is invalid or expired",
    ))));

    let err = fx.session.refresh_access_token().await.unwrap_err();
    assert!(matches!(err, NexusError::SessionExpired));
    assert!(!fx.session.is_authenticated().await);
    assert!(fx.store.inner.is_empty().await);
}

#[tokio::test]
async fn test_persist_tokens_writes_rotated_access_token() {
    let fx = logged_in().await;
    fx.tokens.rotate("access-from-http".to_string(), None);

    fx.session.persist_tokens().await.unwrap();
    assert_eq!(
        fx.store.read(CredentialSlot::AccessToken).await.unwrap().as_deref(),
        Some("access-from-http")
    );
}

#[tokio::test]
async fn test_clear_error() {
    let fx = fixture();
    fx.api.script_auth(Err(NexusError::network("down")));
    let _ = fx.session.login(&credentials()).await;
    assert!(fx.session.error().await.is_some());

    fx.session.clear_error().await;
    assert_eq!(fx.session.error().await, None);
}
