use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use care_types::{AuthToken, Identity, NewUser, Role, Session};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::api::DataClient;
use crate::cache::decode_value;
use crate::error::{ApiError, ApiResult};
use crate::http::{Access, ApiClient};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Google,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
        }
    }
}

/// Result of a successful sign-in.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SignedIn {
    pub token: AuthToken,
    #[serde(alias = "user")]
    pub identity: Identity,
}

/// The identity provider. Implementations own credential handling; the
/// session store only sees identities and tokens.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Identity for the current token, `None` when signed out.
    async fn current_identity(&self) -> ApiResult<Option<Identity>>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> ApiResult<SignedIn>;

    async fn sign_in_with_provider(&self, provider: Provider) -> ApiResult<SignedIn>;

    async fn sign_out(&self) -> ApiResult<()>;

    /// Renames the signed-in user and returns the updated identity.
    async fn update_profile(&self, display_name: &str) -> ApiResult<Identity>;
}

/// Authenticator backed by the PlanetCare API's `/auth` endpoints.
#[derive(Clone)]
pub struct RestAuthenticator {
    api: ApiClient,
}

impl RestAuthenticator {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Authenticator for RestAuthenticator {
    async fn current_identity(&self) -> ApiResult<Option<Identity>> {
        if self.api.token().is_none() {
            return Ok(None);
        }
        match self.api.get(&["auth", "me"], Access::Secure).await {
            Ok(body) => decode_value(&body).map(Some),
            Err(ApiError::AuthRequired { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> ApiResult<SignedIn> {
        let body = json!({ "email": email, "password": password });
        let response = self.api.post(&["auth", "login"], &body, Access::Public).await?;
        decode_value(&response)
    }

    async fn sign_in_with_provider(&self, provider: Provider) -> ApiResult<SignedIn> {
        let response = self
            .api
            .post(&["auth", "provider", provider.as_str()], &json!({}), Access::Public)
            .await?;
        decode_value(&response)
    }

    async fn sign_out(&self) -> ApiResult<()> {
        match self
            .api
            .post(&["auth", "logout"], &json!({}), Access::Secure)
            .await
        {
            Ok(_) | Err(ApiError::AuthRequired { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn update_profile(&self, display_name: &str) -> ApiResult<Identity> {
        let body = json!({ "displayName": display_name });
        let response = self.api.patch(&["auth", "me"], &body, Access::Secure).await?;
        decode_value(&response)
    }
}

/// Where the session token outlives a page load.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<AuthToken>;

    fn save(&self, token: &AuthToken);

    fn clear(&self);
}

/// Keeps the token for as long as the value lives. Used by tests and by
/// server rendering, where there is nothing to persist.
#[derive(Default)]
pub struct MemoryTokens {
    token: Mutex<Option<AuthToken>>,
}

impl TokenStore for MemoryTokens {
    fn load(&self) -> Option<AuthToken> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, token: &AuthToken) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
    }

    fn clear(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    /// True while the provider is resolving who is signed in.
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            identity: None,
            loading: true,
        }
    }
}

type SessionListener = Arc<dyn Fn(&SessionState) + Send + Sync>;

/// Tracks the signed-in identity and keeps the API token and cache in step with it.
#[derive(Clone)]
pub struct SessionStore {
    auth: Arc<dyn Authenticator>,
    data: DataClient,
    tokens: Arc<dyn TokenStore>,
    state: Arc<Mutex<SessionState>>,
    listeners: Arc<Mutex<Vec<SessionListener>>>,
}

impl SessionStore {
    pub fn new(auth: Arc<dyn Authenticator>, data: DataClient) -> Self {
        Self {
            auth,
            data,
            tokens: Arc::new(MemoryTokens::default()),
            state: Arc::new(Mutex::new(SessionState::default())),
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Persists tokens in `tokens` instead of memory.
    pub fn with_tokens(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn session(&self, role: Option<Role>) -> Session {
        Session {
            identity: self.state().identity,
            role,
        }
    }

    pub fn on_change<L>(&self, listener: L)
    where
        L: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    fn update(&self, apply: impl FnOnce(&mut SessionState)) {
        let snapshot = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            apply(&mut state);
            state.clone()
        };
        let listeners: Vec<SessionListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    /// Resolves the identity behind the saved token, if any. Always ends
    /// with `loading == false`.
    ///
    /// A token the backend rejects is forgotten. One that could not be
    /// checked, e.g. while offline, is kept for the next attempt.
    pub async fn restore(&self) -> Option<Identity> {
        self.update(|s| s.loading = true);
        if self.data.api().token().is_none() {
            if let Some(saved) = self.tokens.load() {
                debug!("restoring saved session token");
                self.data.api().set_token(Some(saved));
            }
        }
        let identity = match self.auth.current_identity().await {
            Ok(None) => {
                self.data.api().set_token(None);
                self.tokens.clear();
                None
            }
            Ok(identity) => identity,
            Err(error) => {
                warn!(%error, "could not restore session");
                None
            }
        };
        let resolved = identity.clone();
        self.update(move |s| {
            s.identity = resolved;
            s.loading = false;
        });
        identity
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> ApiResult<Identity> {
        self.update(|s| s.loading = true);
        let result = self.auth.sign_in_with_password(email, password).await;
        self.finish_sign_in(result, false).await
    }

    /// Provider sign-ins may create the account, so the user is registered with the backend.
    pub async fn sign_in_with_provider(&self, provider: Provider) -> ApiResult<Identity> {
        self.update(|s| s.loading = true);
        let result = self.auth.sign_in_with_provider(provider).await;
        self.finish_sign_in(result, true).await
    }

    async fn finish_sign_in(&self, result: ApiResult<SignedIn>, register: bool) -> ApiResult<Identity> {
        let signedIn = match result {
            Ok(signedIn) => signedIn,
            Err(error) => {
                warn!(%error, "sign-in failed");
                self.update(|s| s.loading = false);
                return Err(error);
            }
        };

        self.tokens.save(&signedIn.token);
        self.data.api().set_token(Some(signedIn.token));
        let identity = signedIn.identity;

        if register {
            let newUser = NewUser {
                name: identity.name_or_handle(),
                email: identity.email.clone(),
                photo: identity.photo_url.clone(),
                role: Role::Donor,
                created_at: Utc::now().to_rfc3339(),
            };
            if let Err(error) = self.data.register_user(&newUser).await {
                warn!(%error, email = %identity.email, "could not register user record");
            }
        }

        info!(email = %identity.email, "signed in");
        let current = identity.clone();
        self.update(move |s| {
            s.identity = Some(current);
            s.loading = false;
        });
        Ok(identity)
    }

    /// Changes the display name shown across the app. A blank name is
    /// rejected before anything is sent.
    pub async fn update_display_name(&self, name: &str) -> ApiResult<Identity> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::ValidationFailure {
                status: 422,
                message: "Please enter your name".into(),
                field_errors: BTreeMap::from([("displayName".to_string(), "required".to_string())]),
                body: None,
            });
        }
        let identity = self.auth.update_profile(name).await?;
        info!(email = %identity.email, "profile updated");
        let current = identity.clone();
        self.update(move |s| s.identity = Some(current));
        Ok(identity)
    }

    /// Drops the token and every cached entry so the next user starts clean.
    pub async fn sign_out(&self) {
        if let Err(error) = self.auth.sign_out().await {
            warn!(%error, "provider sign-out failed; clearing local session anyway");
        }
        self.data.api().set_token(None);
        self.tokens.clear();
        self.data.cache().clear();
        info!("signed out");
        self.update(|s| {
            s.identity = None;
            s.loading = false;
        });
    }
}
