#![allow(non_snake_case)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use care_client::session::{
    Authenticator, MemoryTokens, Provider, RestAuthenticator, SessionStore, SignedIn, TokenStore,
};
use care_client::{keys, ApiClient, ApiConfig, ApiError, ApiResult, DataClient, QueryClient, QueryStatus};
use care_types::{AuthToken, Identity};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// In-memory identity provider.
struct FakeAuth {
    identity: Identity,
    reject: bool,
    signOuts: AtomicUsize,
}

impl FakeAuth {
    fn new(email: &str) -> Self {
        Self {
            identity: Identity {
                email: email.into(),
                display_name: Some("Rin Lee".into()),
                photo_url: Some("https://img.example/rin.png".into()),
            },
            reject: false,
            signOuts: AtomicUsize::new(0),
        }
    }

    fn signed_in(&self) -> ApiResult<SignedIn> {
        if self.reject {
            return Err(ApiError::from_status(401, Some(json!({"message": "Wrong password"}))));
        }
        Ok(SignedIn {
            token: AuthToken("tok-1".into()),
            identity: self.identity.clone(),
        })
    }
}

#[async_trait]
impl Authenticator for FakeAuth {
    async fn current_identity(&self) -> ApiResult<Option<Identity>> {
        Ok(None)
    }

    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> ApiResult<SignedIn> {
        self.signed_in()
    }

    async fn sign_in_with_provider(&self, _provider: Provider) -> ApiResult<SignedIn> {
        self.signed_in()
    }

    async fn sign_out(&self) -> ApiResult<()> {
        self.signOuts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_profile(&self, display_name: &str) -> ApiResult<Identity> {
        Ok(Identity {
            display_name: Some(display_name.into()),
            ..self.identity.clone()
        })
    }
}

fn store(server: &MockServer, auth: Arc<FakeAuth>) -> (SessionStore, DataClient) {
    let data = DataClient::new(
        ApiClient::new(&ApiConfig::new(server.uri())),
        QueryClient::new(),
    );
    (SessionStore::new(auth, data.clone()), data)
}

#[tokio::test]
async fn provider_sign_in_registers_the_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_partial_json(json!({
            "name": "Rin Lee",
            "email": "rin@planet.care",
            "role": "donor"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
        .expect(1)
        .mount(&server)
        .await;

    let (session, data) = store(&server, Arc::new(FakeAuth::new("rin@planet.care")));
    let identity = session.sign_in_with_provider(Provider::Google).await.unwrap();

    assert_eq!(identity.email, "rin@planet.care");
    assert_eq!(data.api().token(), Some(AuthToken("tok-1".into())));
    let state = session.state();
    assert!(!state.loading);
    assert_eq!(state.identity, Some(identity));
}

#[tokio::test]
async fn password_sign_in_does_not_register() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (session, _) = store(&server, Arc::new(FakeAuth::new("rin@planet.care")));
    session
        .sign_in_with_password("rin@planet.care", "hunter2")
        .await
        .unwrap();
    assert!(session.state().identity.is_some());
}

#[tokio::test]
async fn failed_registration_does_not_block_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (session, _) = store(&server, Arc::new(FakeAuth::new("rin@planet.care")));
    let result = session.sign_in_with_provider(Provider::Google).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn rejected_sign_in_leaves_session_signed_out() {
    let server = MockServer::start().await;
    let mut auth = FakeAuth::new("rin@planet.care");
    auth.reject = true;
    let (session, data) = store(&server, Arc::new(auth));

    let error = session
        .sign_in_with_password("rin@planet.care", "wrong")
        .await
        .unwrap_err();

    assert_eq!(error.user_message(), "Wrong password");
    assert!(data.api().token().is_none());
    let state = session.state();
    assert!(state.identity.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn sign_out_clears_token_and_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let auth = Arc::new(FakeAuth::new("rin@planet.care"));
    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokens::default());
    let (session, data) = store(&server, auth.clone());
    let session = session.with_tokens(tokens.clone());
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    session.on_change(move |state| {
        sink.lock().unwrap().push(state.identity.is_some());
    });

    session.sign_in_with_provider(Provider::Google).await.unwrap();
    assert_eq!(tokens.load(), Some(AuthToken("tok-1".into())));
    data.cache()
        .set_data(&keys::my_donations("rin@planet.care"), json!([{"amount": 5}]));

    session.sign_out().await;

    assert_eq!(auth.signOuts.load(Ordering::SeqCst), 1);
    assert!(data.api().token().is_none());
    assert!(tokens.load().is_none());
    let cached = data.cache().snapshot(&keys::my_donations("rin@planet.care"));
    assert_eq!(cached.status, QueryStatus::Idle);
    assert!(cached.data.is_none());
    assert!(session.state().identity.is_none());
    assert_eq!(changes.lock().unwrap().last(), Some(&false));
}

#[tokio::test]
async fn restore_without_token_skips_the_backend() {
    let server = MockServer::start().await;
    let api = ApiClient::new(&ApiConfig::new(server.uri()));
    let data = DataClient::new(api.clone(), QueryClient::new());
    let session = SessionStore::new(Arc::new(RestAuthenticator::new(api)), data);

    assert!(session.state().loading);
    assert!(session.restore().await.is_none());
    assert!(!session.state().loading);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn restore_resolves_identity_from_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer tok-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "ada@planet.care",
            "displayName": "Ada",
            "photoURL": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&ApiConfig::new(server.uri()));
    api.set_token(Some(AuthToken("tok-7".into())));
    let data = DataClient::new(api.clone(), QueryClient::new());
    let session = SessionStore::new(Arc::new(RestAuthenticator::new(api)), data);

    let identity = session.restore().await.unwrap();
    assert_eq!(identity.display_name.as_deref(), Some("Ada"));
    assert_eq!(session.session(None).email(), Some("ada@planet.care"));
}

#[tokio::test]
async fn expired_token_restores_as_signed_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokens::default());
    tokens.save(&AuthToken("expired".into()));
    let api = ApiClient::new(&ApiConfig::new(server.uri()));
    let data = DataClient::new(api.clone(), QueryClient::new());
    let session = SessionStore::new(Arc::new(RestAuthenticator::new(api.clone())), data)
        .with_tokens(tokens.clone());

    assert!(session.restore().await.is_none());
    assert!(api.token().is_none());
    assert!(tokens.load().is_none());
}

/// Fresh client stack sharing `tokens`, wired the way the app wires it on page load.
fn rest_store(server: &MockServer, tokens: &Arc<dyn TokenStore>) -> (SessionStore, ApiClient) {
    let api = ApiClient::new(&ApiConfig::new(server.uri()));
    let data = DataClient::new(api.clone(), QueryClient::new());
    let session = SessionStore::new(Arc::new(RestAuthenticator::new(api.clone())), data)
        .with_tokens(Arc::clone(tokens));
    (session, api)
}

#[tokio::test]
async fn session_survives_a_reload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "ada@planet.care", "password": "s3cret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-9",
            "user": {"email": "ada@planet.care", "displayName": "Ada"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer tok-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "ada@planet.care",
            "displayName": "Ada"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokens::default());
    let (before, _) = rest_store(&server, &tokens);
    let identity = before
        .sign_in_with_password("ada@planet.care", "s3cret")
        .await
        .unwrap();
    assert_eq!(identity.display_name.as_deref(), Some("Ada"));
    drop(before);

    let (after, api) = rest_store(&server, &tokens);
    assert!(api.token().is_none());
    let restored = after.restore().await;

    assert_eq!(restored, Some(identity));
    assert_eq!(api.token(), Some(AuthToken("tok-9".into())));
    assert!(!after.state().loading);
}

#[tokio::test]
async fn rejected_password_surfaces_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokens::default());
    let (session, api) = rest_store(&server, &tokens);
    let error = session
        .sign_in_with_password("ada@planet.care", "nope")
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::AuthRequired { .. }));
    assert!(api.token().is_none());
    assert!(tokens.load().is_none());
}

#[tokio::test]
async fn provider_sign_in_decodes_identity_and_registers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/provider/google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "g-1",
            "identity": {
                "email": "kai@planet.care",
                "displayName": "Kai",
                "photoURL": "https://img.example/kai.png"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_partial_json(json!({
            "email": "kai@planet.care",
            "photo": "https://img.example/kai.png"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
        .expect(1)
        .mount(&server)
        .await;

    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokens::default());
    let (session, api) = rest_store(&server, &tokens);
    let identity = session.sign_in_with_provider(Provider::Google).await.unwrap();

    assert_eq!(identity.photo_url.as_deref(), Some("https://img.example/kai.png"));
    assert_eq!(api.token(), Some(AuthToken("g-1".into())));
    assert_eq!(tokens.load(), Some(AuthToken("g-1".into())));
}

#[tokio::test]
async fn malformed_sign_in_payload_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokens::default());
    let (session, _) = rest_store(&server, &tokens);
    let error = session
        .sign_in_with_password("ada@planet.care", "s3cret")
        .await
        .unwrap_err();
    assert!(matches!(error, ApiError::Parse(_)));
    assert!(session.state().identity.is_none());
}

#[tokio::test]
async fn renaming_updates_the_session_identity() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer tok-3"))
        .and(body_json(json!({"displayName": "Ada K."})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "ada@planet.care",
            "displayName": "Ada K."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokens::default());
    let (session, api) = rest_store(&server, &tokens);
    api.set_token(Some(AuthToken("tok-3".into())));

    let identity = session.update_display_name("  Ada K. ").await.unwrap();

    assert_eq!(identity.display_name.as_deref(), Some("Ada K."));
    assert_eq!(session.state().identity, Some(identity));
}

#[tokio::test]
async fn blank_display_name_is_rejected_locally() {
    let server = MockServer::start().await;
    let (session, _) = store(&server, Arc::new(FakeAuth::new("rin@planet.care")));
    session.sign_in_with_password("rin@planet.care", "pw").await.unwrap();

    let error = session.update_display_name("   ").await.unwrap_err();

    assert!(matches!(error, ApiError::ValidationFailure { status: 422, .. }));
    assert_eq!(error.user_message(), "Please enter your name");
    assert_eq!(
        session.state().identity.and_then(|i| i.display_name).as_deref(),
        Some("Rin Lee")
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}
