use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    routing::{delete, get, post, put},
};
use chirpy_auth::access_token::AccessTokenCodec;
use chirpy_models::store::{ChirpStore, RefreshTokenStore, UserStore};
use chirpy_web::{
    chirp::{ChirpApi, ChirpPost, ChirpQuery, ChirpService, parse_id},
    ctx::{
        Ctx,
        resolver::{auth_header, mw_ctx_resolver},
    },
    mw_auth::mw_require_auth,
    prelude::Result as WebResult,
    session::SessionService,
    user::{LoginResponse, RefreshResponse, UserApi, UserCredentials},
    webhook::PolkaWebhook,
};
use tokio::task::JoinHandle;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::info;

use crate::{config::Platform, prelude::*};

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionService,
    pub chirps: ChirpService,
    pub webhooks: PolkaWebhook,
    pub users: Arc<dyn UserStore>,
    pub platform: Platform,
}

impl AppState {
    /// Wires every service to one backing store.
    pub fn new<S>(store: S, codec: AccessTokenCodec, polka_key: &str, platform: Platform) -> Self
    where
        S: UserStore + RefreshTokenStore + ChirpStore + 'static,
    {
        let store = Arc::new(store);
        let users: Arc<dyn UserStore> = store.clone();
        Self {
            sessions: SessionService::new(users.clone(), store.clone(), codec),
            chirps: ChirpService::new(store),
            webhooks: PolkaWebhook::new(users.clone(), polka_key),
            users,
            platform,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/users", put(update_user))
        .route("/api/chirps", post(create_chirp))
        .route("/api/chirps/{id}", delete(delete_chirp))
        .route_layer(middleware::from_fn(mw_require_auth));

    let public_routes = Router::new()
        .route("/api/healthz", get(healthz))
        .route("/api/users", post(create_user))
        .route("/api/login", post(login))
        .route("/api/refresh", post(refresh))
        .route("/api/revoke", post(revoke))
        .route("/api/chirps", get(list_chirps))
        .route("/api/chirps/{id}", get(get_chirp))
        .route("/api/polka/webhooks", post(polka_webhook))
        .route("/admin/reset", post(reset));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            mw_ctx_resolver,
        ))
        .with_state(state)
}

pub async fn setup_api(state: AppState, addr: SocketAddr) -> Result<JoinHandle<Result<()>>> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await?;
        Ok(())
    });

    Ok(handle)
}

async fn healthz() -> &'static str {
    "OK"
}

async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserCredentials>,
) -> WebResult<(StatusCode, Json<UserApi>)> {
    let user = state.sessions.register(&payload.email, &payload.password)?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn update_user(
    State(state): State<AppState>,
    ctx: Ctx,
    Json(payload): Json<UserCredentials>,
) -> WebResult<Json<UserApi>> {
    let user = state
        .sessions
        .update_credentials(&ctx.user_id, &payload.email, &payload.password)?;
    Ok(Json(user.into()))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserCredentials>,
) -> WebResult<Json<LoginResponse>> {
    let session = state.sessions.login(&payload.email, &payload.password)?;
    Ok(Json(session.into()))
}

async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> WebResult<Json<RefreshResponse>> {
    let token = state.sessions.refresh(auth_header(&headers))?;
    Ok(Json(RefreshResponse { token }))
}

async fn revoke(State(state): State<AppState>, headers: HeaderMap) -> WebResult<StatusCode> {
    state.sessions.revoke(auth_header(&headers))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_chirp(
    State(state): State<AppState>,
    ctx: Ctx,
    Json(payload): Json<ChirpPost>,
) -> WebResult<(StatusCode, Json<ChirpApi>)> {
    let chirp = state.chirps.create(&ctx, &payload.body)?;
    Ok((StatusCode::CREATED, Json(chirp.into())))
}

async fn list_chirps(
    State(state): State<AppState>,
    Query(query): Query<ChirpQuery>,
) -> WebResult<Json<Vec<ChirpApi>>> {
    let chirps = state.chirps.list(&query)?;
    Ok(Json(chirps.into_iter().map(ChirpApi::from).collect()))
}

async fn get_chirp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Json<ChirpApi>> {
    let chirp = state.chirps.get(&parse_id(&id)?)?;
    Ok(Json(chirp.into()))
}

async fn delete_chirp(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(id): Path<String>,
) -> WebResult<StatusCode> {
    state.chirps.delete(&ctx, &parse_id(&id)?)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn polka_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> WebResult<StatusCode> {
    state.webhooks.handle(auth_header(&headers), &body)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reset(State(state): State<AppState>) -> WebResult<StatusCode> {
    if state.platform != Platform::Dev {
        return Err(chirpy_web::error::Error::ApiForbidden);
    }
    let deleted = state.users.delete_all_users()?;
    info!("Reset deleted {deleted} user(s)");
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, Response, header},
    };
    use chirpy_models::memory::MemoryStore;
    use chrono::{TimeDelta, Utc};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;

    const POLKA_KEY: &str = "polka-test-key";

    struct TestApp {
        app: Router,
        store: MemoryStore,
    }

    impl TestApp {
        fn new(platform: Platform) -> Self {
            let store = MemoryStore::new();
            let state = AppState::new(
                store.clone(),
                AccessTokenCodec::new("router-test-secret"),
                POLKA_KEY,
                platform,
            );
            Self {
                app: router(state),
                store,
            }
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            auth: Option<&str>,
            body: Option<Value>,
        ) -> Response<Body> {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(auth) = auth {
                request = request.header(header::AUTHORIZATION, auth);
            }
            let request = match body {
                Some(body) => request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string())),
                None => request.body(Body::empty()),
            }
            .unwrap();

            self.app.clone().oneshot(request).await.unwrap()
        }

        async fn register_and_login(&self, email: &str, password: &str) -> Value {
            let credentials = json!({ "email": email, "password": password });
            let response = self
                .send(Method::POST, "/api/users", None, Some(credentials.clone()))
                .await;
            assert_eq!(response.status(), StatusCode::CREATED);

            let response = self
                .send(Method::POST, "/api/login", None, Some(credentials))
                .await;
            assert_eq!(response.status(), StatusCode::OK);
            body_json(response).await
        }
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn bearer(value: &Value) -> String {
        format!("Bearer {}", value.as_str().unwrap())
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let app = TestApp::new(Platform::Prod);
        let response = app.send(Method::GET, "/api/healthz", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_hides_password_hash() {
        let app = TestApp::new(Platform::Prod);
        let response = app
            .send(
                Method::POST,
                "/api/users",
                None,
                Some(json!({ "email": "a@b.com", "password": "p1" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["email"], "a@b.com");
        assert_eq!(body["is_chirpy_red"], false);
        assert!(body.get("hashed_password").is_none());
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn login_refresh_revoke() {
        let app = TestApp::new(Platform::Prod);
        let login = app.register_and_login("a@b.com", "p1").await;
        assert!(login["token"].is_string());
        let refresh = bearer(&login["refresh_token"]);

        let response = app
            .send(Method::POST, "/api/refresh", Some(&refresh), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["token"].is_string());

        let response = app
            .send(Method::POST, "/api/revoke", Some(&refresh), None)
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .send(Method::POST, "/api/revoke", Some(&refresh), None)
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .send(Method::POST, "/api/refresh", Some(&refresh), None)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let app = TestApp::new(Platform::Prod);
        app.register_and_login("a@b.com", "p1").await;

        let wrong = app
            .send(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "email": "a@b.com", "password": "p2" })),
            )
            .await;
        let unknown = app
            .send(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "email": "x@b.com", "password": "p1" })),
            )
            .await;

        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(wrong).await, body_json(unknown).await);
    }

    #[tokio::test]
    async fn protected_routes_need_access_token() {
        let app = TestApp::new(Platform::Prod);
        let login = app.register_and_login("a@b.com", "p1").await;
        let chirp = json!({ "body": "hello" });

        let response = app
            .send(Method::POST, "/api/chirps", None, Some(chirp.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let refresh = bearer(&login["refresh_token"]);
        let response = app
            .send(Method::POST, "/api/chirps", Some(&refresh), Some(chirp.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let access = bearer(&login["token"]);
        let response = app
            .send(Method::POST, "/api/chirps", Some(&access), Some(chirp))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn update_user_changes_login() {
        let app = TestApp::new(Platform::Prod);
        let login = app.register_and_login("a@b.com", "p1").await;
        let access = bearer(&login["token"]);

        let response = app
            .send(
                Method::PUT,
                "/api/users",
                Some(&access),
                Some(json!({ "email": "new@b.com", "password": "p2" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["email"], "new@b.com");

        let response = app
            .send(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "email": "new@b.com", "password": "p2" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn chirp_lifecycle() {
        let app = TestApp::new(Platform::Prod);
        let alice = app.register_and_login("alice@b.com", "p1").await;
        let bob = app.register_and_login("bob@b.com", "p1").await;
        let alice_auth = bearer(&alice["token"]);
        let bob_auth = bearer(&bob["token"]);

        let response = app
            .send(
                Method::POST,
                "/api/chirps",
                Some(&alice_auth),
                Some(json!({
                    "body": "I hear Mastodon is better than Chirpy. sharbert I need to migrate"
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let chirp = body_json(response).await;
        assert_eq!(
            chirp["body"],
            "I hear Mastodon is better than Chirpy. **** I need to migrate"
        );
        assert_eq!(chirp["user_id"], alice["id"]);
        let uri = format!("/api/chirps/{}", chirp["id"].as_str().unwrap());

        let response = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.send(Method::DELETE, &uri, Some(&bob_auth), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .send(Method::DELETE, &uri, Some(&alice_auth), None)
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chirp_validation() {
        let app = TestApp::new(Platform::Prod);
        let login = app.register_and_login("a@b.com", "p1").await;
        let access = bearer(&login["token"]);

        let response = app
            .send(
                Method::POST,
                "/api/chirps",
                Some(&access),
                Some(json!({ "body": "x".repeat(141) })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        for uri in [
            "/api/chirps?sort=sideways",
            "/api/chirps?author_id=nope",
            "/api/chirps/not-a-uuid",
        ] {
            let response = app.send(Method::GET, uri, None, None).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }

        let uri = format!("/api/chirps/{}", Uuid::new_v4());
        let response = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_chirps_sorted_and_filtered() {
        let app = TestApp::new(Platform::Prod);
        let alice = app.register_and_login("alice@b.com", "p1").await;
        let bob = app.register_and_login("bob@b.com", "p1").await;

        for (login, body) in [(&alice, "one"), (&bob, "two"), (&alice, "three")] {
            let response = app
                .send(
                    Method::POST,
                    "/api/chirps",
                    Some(&bearer(&login["token"])),
                    Some(json!({ "body": body })),
                )
                .await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let bodies = |value: Value| -> Vec<String> {
            value
                .as_array()
                .unwrap()
                .iter()
                .map(|c| c["body"].as_str().unwrap().to_string())
                .collect()
        };

        let response = app.send(Method::GET, "/api/chirps", None, None).await;
        assert_eq!(bodies(body_json(response).await), ["one", "two", "three"]);

        let response = app
            .send(Method::GET, "/api/chirps?sort=desc", None, None)
            .await;
        assert_eq!(bodies(body_json(response).await), ["three", "two", "one"]);

        let uri = format!("/api/chirps?author_id={}", alice["id"].as_str().unwrap());
        let response = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(bodies(body_json(response).await), ["one", "three"]);
    }

    #[tokio::test]
    async fn polka_webhook_upgrades_user() {
        let app = TestApp::new(Platform::Prod);
        let login = app.register_and_login("a@b.com", "p1").await;
        let event = json!({
            "event": "user.upgraded",
            "data": { "user_id": login["id"] }
        });

        let response = app
            .send(
                Method::POST,
                "/api/polka/webhooks",
                Some("ApiKey wrong-key"),
                Some(event.clone()),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let auth = format!("ApiKey {POLKA_KEY}");
        let response = app
            .send(
                Method::POST,
                "/api/polka/webhooks",
                Some(&auth),
                Some(event),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let id = Uuid::parse_str(login["id"].as_str().unwrap()).unwrap();
        assert!(app.store.user_by_id(&id).unwrap().is_chirpy_red);

        let response = app
            .send(
                Method::POST,
                "/api/polka/webhooks",
                Some(&auth),
                Some(json!({
                    "event": "user.upgraded",
                    "data": { "user_id": Uuid::new_v4() }
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn polka_webhook_rejects_missing_key_before_reading_body() {
        let app = TestApp::new(Platform::Prod);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/polka/webhooks")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let auth = format!("ApiKey {POLKA_KEY}");
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/polka/webhooks")
            .header(header::AUTHORIZATION, auth)
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reset_only_in_dev() {
        let prod = TestApp::new(Platform::Prod);
        prod.register_and_login("a@b.com", "p1").await;
        let response = prod.send(Method::POST, "/admin/reset", None, None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let dev = TestApp::new(Platform::Dev);
        dev.register_and_login("a@b.com", "p1").await;
        let response = dev.send(Method::POST, "/admin/reset", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(dev.store.user_by_email("a@b.com").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn expired_access_token_is_rejected() {
        let store = MemoryStore::new();
        let codec = AccessTokenCodec::new("router-test-secret");
        let state = AppState::new(store.clone(), codec.clone(), POLKA_KEY, Platform::Prod);
        let app = TestApp {
            app: router(state),
            store,
        };
        let login = app.register_and_login("a@b.com", "p1").await;
        let id = Uuid::parse_str(login["id"].as_str().unwrap()).unwrap();

        let issued = Utc::now() - TimeDelta::hours(2);
        let stale = codec.issue_at(id, TimeDelta::hours(1), issued).unwrap();
        let response = app
            .send(
                Method::POST,
                "/api/chirps",
                Some(&format!("Bearer {stale}")),
                Some(json!({ "body": "late" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
